use fxhash::FxHashMap;
use jiff::{Timestamp, civil};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::{debug, warn};

use crate::{
    config::OptimizerConfig,
    problem::{
        appointment::{Appointment, AppointmentId, ResourceId},
        period::Period,
    },
    solver::{
        RouteLimits, SolveContext,
        construction::construct,
        local_search::{improve, ruin},
        routing_node::{NodeGraph, build_nodes},
        travel_matrix::TravelMatrix,
        working_solution::WorkingSolution,
    },
};

/// Seed for the perturbation rng. Fixed so identical inputs solve to
/// identical schedules; re-running an unchanged plan must be a no-op.
const PERTURBATION_SEED: u64 = 0x5EED_F1E1D;

/// Visits removed per ruin-and-recreate round.
const RUIN_SIZE: usize = 3;

/// What one appointment received from a period solve.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodAssignment {
    /// Service start in absolute minutes since midnight.
    pub start_minute: i64,
    /// Exactly the appointment's required resource count, sorted.
    pub resources: Vec<ResourceId>,
}

/// Solves one half-day period: builds the routing model and searches it
/// under a wall-clock budget, then extracts only fully-routed appointments.
pub struct PeriodRouter<'a> {
    config: &'a OptimizerConfig,
}

impl<'a> PeriodRouter<'a> {
    pub fn new(config: &'a OptimizerConfig) -> Self {
        PeriodRouter { config }
    }

    pub fn solve(
        &self,
        appointments: &[Appointment],
        day: civil::Date,
        period: Period,
        pool: &[ResourceId],
    ) -> FxHashMap<AppointmentId, PeriodAssignment> {
        if pool.is_empty() {
            return FxHashMap::default();
        }

        let graph = build_nodes(appointments, day, period, pool);
        if graph.nodes.is_empty() {
            return FxHashMap::default();
        }

        let matrix = TravelMatrix::build(self.config.depot, &graph.nodes, self.config.speed_kmh);
        let ctx = SolveContext {
            nodes: &graph.nodes,
            groups: &graph.groups,
            matrix: &matrix,
            limits: RouteLimits {
                period_duration: period.duration(),
                max_waiting: self.config.max_waiting,
            },
            skip_penalty: self.config.skip_penalty,
            sync_tolerance: self.config.sync_tolerance,
        };

        let deadline = Timestamp::now()
            .saturating_add(self.config.solver_budget)
            .expect("solver budget deadline is within the representable timestamp range");

        let mut solution = WorkingSolution::new(pool.len(), graph.nodes.len());
        if !construct(&mut solution, &ctx, deadline) {
            warn!(
                %day,
                period = %period.kind(),
                "no solution within the solver budget"
            );
            return FxHashMap::default();
        }
        improve(&mut solution, &ctx, deadline);

        // Ruin-and-recreate rounds for as long as the budget allows.
        let mut best_cost = solution.cost(&ctx);
        let mut rng = SmallRng::seed_from_u64(PERTURBATION_SEED);
        for _ in 0..self.config.max_perturbations {
            if Timestamp::now() >= deadline {
                break;
            }

            let mut candidate = solution.clone();
            ruin(&mut candidate, &ctx, &mut rng, RUIN_SIZE);
            if !construct(&mut candidate, &ctx, deadline) {
                break;
            }
            improve(&mut candidate, &ctx, deadline);

            let cost = candidate.cost(&ctx);
            if cost < best_cost {
                solution = candidate;
                best_cost = cost;
            }
        }

        debug!(
            %day,
            period = %period.kind(),
            cost = best_cost,
            unassigned = solution.unassigned_count(),
            "period solved"
        );

        extract(appointments, &graph, &solution, pool, period)
    }
}

struct Extracted {
    start: i64,
    resources: Vec<ResourceId>,
    visited_copies: usize,
}

/// Aggregates routed copies per appointment. Over-assigned resource sets
/// are clamped to the required count first; appointments with unrouted
/// copies are dropped afterwards, whole.
fn extract(
    appointments: &[Appointment],
    graph: &NodeGraph,
    solution: &WorkingSolution,
    pool: &[ResourceId],
    period: Period,
) -> FxHashMap<AppointmentId, PeriodAssignment> {
    let mut accumulated: FxHashMap<usize, Extracted> = FxHashMap::default();

    for route in solution.routes() {
        let resource = pool[route.vehicle().get()];
        for position in 0..route.len() {
            let node = &graph.nodes[route.node_at(position)];
            if node.fixed {
                // Pinned appointments route as constraints only; they are
                // never written back.
                continue;
            }

            let entry = accumulated
                .entry(node.appointment)
                .or_insert_with(|| Extracted {
                    start: route.start_at(position),
                    resources: Vec::new(),
                    visited_copies: 0,
                });
            entry.start = entry.start.min(route.start_at(position));
            entry.resources.push(resource);
            entry.visited_copies += 1;
        }
    }

    let mut result = FxHashMap::default();
    for (index, mut extracted) in accumulated {
        let appointment = &appointments[index];
        let required = appointment.required_resources.max(1);

        extracted.resources.sort();
        extracted.resources.dedup();
        if extracted.resources.len() > required {
            extracted.resources.truncate(required);
        }

        if extracted.visited_copies < graph.copies[index] {
            debug!(
                appointment = appointment.id.get(),
                "incomplete multi-resource group, dropped"
            );
            continue;
        }

        result.insert(
            appointment.id,
            PeriodAssignment {
                start_minute: period.start() + extracted.start,
                resources: extracted.resources,
            },
        );
    }

    result
}
