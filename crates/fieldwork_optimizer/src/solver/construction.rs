use std::collections::BTreeSet;

use jiff::Timestamp;

use crate::solver::{
    SolveContext,
    insertion::{Insertion, best_insertion},
    route::VehicleIdx,
    routing_node::NodeIdx,
    working_solution::WorkingSolution,
};

/// Common starts tried per synchronization group before giving up.
const MAX_SYNC_STARTS: usize = 32;

/// A fully planned placement of one multi-resource group: every copy on a
/// distinct vehicle, starts within the sync tolerance of each other.
struct GroupPlan {
    cost: i64,
    picks: Vec<(NodeIdx, Insertion)>,
}

enum Placement {
    Single(NodeIdx, Insertion),
    Group(GroupPlan),
}

/// Deterministic cheapest insertion over single nodes and whole groups.
/// Keeps inserting the globally cheapest unit until nothing fits anymore.
/// Returns `false` when the deadline cut construction short. The period
/// then yields no assignments at all.
pub fn construct(solution: &mut WorkingSolution, ctx: &SolveContext, deadline: Timestamp) -> bool {
    loop {
        if Timestamp::now() >= deadline {
            return false;
        }

        let mut best: Option<(i64, Placement)> = None;

        for node in solution.unassigned().collect::<Vec<_>>() {
            if ctx.node(node).is_grouped() {
                continue;
            }
            if let Some(insertion) = best_insertion(solution, node, None, ctx) {
                consider(&mut best, insertion.cost, Placement::Single(node, insertion));
            }
        }

        for (group, members) in ctx.groups.iter().enumerate() {
            if members.iter().any(|&member| solution.is_assigned(member)) {
                continue;
            }
            if let Some(plan) = plan_group(solution, group, ctx) {
                consider(&mut best, plan.cost, Placement::Group(plan));
            }
        }

        match best {
            Some((_, Placement::Single(node, insertion))) => {
                solution.insert(insertion.vehicle, insertion.position, node, None, ctx);
            }
            Some((_, Placement::Group(plan))) => {
                for (member, insertion) in plan.picks {
                    solution.insert(
                        insertion.vehicle,
                        insertion.position,
                        member,
                        Some(insertion.start),
                        ctx,
                    );
                }
            }
            None => return true,
        }
    }
}

fn consider(best: &mut Option<(i64, Placement)>, cost: i64, placement: Placement) {
    if best.as_ref().is_none_or(|(incumbent, _)| cost < *incumbent) {
        *best = Some((cost, placement));
    }
}

/// Plans one synchronization group: a common start time and K distinct
/// vehicles. Candidate starts are the earliest feasible starts observed
/// across free placements, walked in ascending order; the first start that
/// K vehicles can honor wins.
fn plan_group(solution: &WorkingSolution, group: usize, ctx: &SolveContext) -> Option<GroupPlan> {
    let members = &ctx.groups[group];
    let template = members[0];
    let node = ctx.node(template);

    let mut candidate_starts = BTreeSet::new();
    candidate_starts.insert(node.window.0);
    for &vehicle in &node.allowed {
        let route = solution.route(vehicle);
        for position in 0..=route.len() {
            if let Some((start, _)) = route.try_insert(position, template, None, ctx) {
                candidate_starts.insert(start);
            }
        }
    }

    for &start in candidate_starts.iter().take(MAX_SYNC_STARTS) {
        let mut options: Vec<Insertion> = Vec::new();

        for &vehicle in &node.allowed {
            if let Some(option) = best_forced_insertion(solution, vehicle, template, start, ctx) {
                options.push(option);
            }
        }

        if options.len() >= members.len() {
            options.sort_by_key(|option| (option.cost, option.vehicle));
            options.truncate(members.len());
            let cost = options.iter().map(|option| option.cost).sum();
            let picks = members.iter().copied().zip(options).collect();
            return Some(GroupPlan { cost, picks });
        }
    }

    None
}

/// Cheapest placement of `node` on one specific vehicle with its start
/// pinned to `start` (or within the sync tolerance after it).
fn best_forced_insertion(
    solution: &WorkingSolution,
    vehicle: VehicleIdx,
    node: NodeIdx,
    start: i64,
    ctx: &SolveContext,
) -> Option<Insertion> {
    let route = solution.route(vehicle);
    let mut best: Option<Insertion> = None;

    for offset in 0..=ctx.sync_tolerance {
        for position in 0..=route.len() {
            if let Some((realized, cost)) = route.try_insert(position, node, Some(start + offset), ctx)
                && best.is_none_or(|incumbent| cost < incumbent.cost)
            {
                best = Some(Insertion {
                    vehicle,
                    position,
                    start: realized,
                    cost,
                });
            }
        }
    }

    best
}
