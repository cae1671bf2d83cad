use std::collections::BTreeSet;

use jiff::civil;
use serde::Serialize;
use tracing::{debug, info};

use crate::{
    config::OptimizerConfig,
    problem::{
        appointment::{Appointment, AppointmentId, ResourceId},
        period::working_days_from,
    },
};

/// Which filter phase produced a replacement. Earlier phases mean less
/// disruption; the first phase with a non-empty result wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReplacementPhase {
    ExactTeam,
    SharedResource,
    RecommendedResource,
    SameHeadcount,
    Decomposition,
}

/// One freed technician re-routed onto substitute work.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplacementAssignment {
    pub resource: ResourceId,
    pub appointment_ids: Vec<AppointmentId>,
    pub phase: ReplacementPhase,
}

struct FreedResource {
    resource: ResourceId,
    available_from: civil::Date,
}

/// Finds substitute work for the technicians freed by one cancelled
/// appointment, within a bounded working-day lookahead.
pub struct ReplacementSelector<'a> {
    config: &'a OptimizerConfig,
}

impl<'a> ReplacementSelector<'a> {
    pub fn new(config: &'a OptimizerConfig) -> Self {
        ReplacementSelector { config }
    }

    pub fn select(
        &self,
        cancelled: &Appointment,
        pending: &[Appointment],
        today: civil::Date,
    ) -> Vec<ReplacementAssignment> {
        let available_from = cancelled
            .scheduled
            .map(|slot| slot.start.date())
            .unwrap_or(today);
        let freed: Vec<FreedResource> = {
            let unique: BTreeSet<ResourceId> =
                cancelled.assigned_resources.iter().copied().collect();
            unique
                .into_iter()
                .map(|resource| FreedResource {
                    resource,
                    available_from,
                })
                .collect()
        };
        if freed.is_empty() {
            return Vec::new();
        }

        let horizon = working_days_from(today, self.config.replacement_lookahead_days);
        let Some(&last_day) = horizon.last() else {
            return Vec::new();
        };
        let candidates: Vec<&Appointment> = pending
            .iter()
            .filter(|candidate| {
                candidate.id != cancelled.id
                    && candidate.scheduled.is_some_and(|slot| {
                        let day = slot.start.date();
                        today <= day && day <= last_day
                    })
            })
            .collect();
        if candidates.is_empty() {
            return Vec::new();
        }

        let phases = [
            ReplacementPhase::ExactTeam,
            ReplacementPhase::SharedResource,
            ReplacementPhase::RecommendedResource,
            ReplacementPhase::SameHeadcount,
        ];
        for phase in phases {
            let pool: Vec<&Appointment> = candidates
                .iter()
                .copied()
                .filter(|candidate| phase_filter(phase, cancelled, candidate))
                .collect();
            if pool.is_empty() {
                continue;
            }

            let assignments = assign_one_to_one(&freed, &pool, phase);
            if !assignments.is_empty() {
                info!(
                    cancelled = cancelled.id.get(),
                    ?phase,
                    assignments = assignments.len(),
                    "replacement found"
                );
                return assignments;
            }
            debug!(cancelled = cancelled.id.get(), ?phase, "phase came up empty");
        }

        let assignments = decompose(cancelled, &freed, &candidates);
        if !assignments.is_empty() {
            info!(
                cancelled = cancelled.id.get(),
                assignments = assignments.len(),
                "replacement by decomposition"
            );
        }
        assignments
    }
}

fn same_set(left: &[ResourceId], right: &[ResourceId]) -> bool {
    let left: BTreeSet<_> = left.iter().collect();
    let right: BTreeSet<_> = right.iter().collect();
    left == right
}

fn intersects(left: &[ResourceId], right: &[ResourceId]) -> bool {
    left.iter().any(|resource| right.contains(resource))
}

fn phase_filter(phase: ReplacementPhase, cancelled: &Appointment, candidate: &Appointment) -> bool {
    if candidate.duration != cancelled.duration {
        return false;
    }

    match phase {
        ReplacementPhase::ExactTeam => {
            same_set(&candidate.eligible_resources, &cancelled.assigned_resources)
        }
        ReplacementPhase::SharedResource => {
            candidate.required_resources == cancelled.required_resources
                && intersects(&candidate.eligible_resources, &cancelled.assigned_resources)
        }
        ReplacementPhase::RecommendedResource => {
            candidate.required_resources == cancelled.required_resources
                && intersects(
                    &candidate.eligible_resources,
                    &cancelled.recommended_resources,
                )
        }
        ReplacementPhase::SameHeadcount => {
            candidate.required_resources == cancelled.required_resources
        }
        ReplacementPhase::Decomposition => true,
    }
}

/// The assignment optimizer's only hard constraint: a technician can take
/// work scheduled on or after the day they became available. Team
/// similarity is what the phase filters encode, not a matching constraint.
fn tech_can_take(freed: &FreedResource, candidate: &Appointment) -> bool {
    candidate
        .scheduled
        .is_some_and(|slot| slot.start.date() >= freed.available_from)
}

/// Maximum-cardinality assignment of freed technicians to candidates, one
/// each way, via augmenting paths. Technicians walk their candidates in
/// descending merchandise-readiness order, realizing the secondary
/// objective deterministically.
fn assign_one_to_one(
    freed: &[FreedResource],
    candidates: &[&Appointment],
    phase: ReplacementPhase,
) -> Vec<ReplacementAssignment> {
    let mut preference: Vec<usize> = (0..candidates.len()).collect();
    preference.sort_by_key(|&index| {
        (
            -candidates[index].merchandise_readiness().bonus(),
            candidates[index].id,
        )
    });

    // matched[candidate] = technician index currently holding it.
    let mut matched: Vec<Option<usize>> = vec![None; candidates.len()];

    fn try_assign(
        tech: usize,
        freed: &[FreedResource],
        candidates: &[&Appointment],
        preference: &[usize],
        visited: &mut [bool],
        matched: &mut [Option<usize>],
    ) -> bool {
        for &candidate_index in preference {
            if visited[candidate_index]
                || !tech_can_take(&freed[tech], candidates[candidate_index])
            {
                continue;
            }
            visited[candidate_index] = true;

            let free_or_movable = match matched[candidate_index] {
                None => true,
                Some(holder) => {
                    try_assign(holder, freed, candidates, preference, visited, matched)
                }
            };
            if free_or_movable {
                matched[candidate_index] = Some(tech);
                return true;
            }
        }
        false
    }

    for tech in 0..freed.len() {
        let mut visited = vec![false; candidates.len()];
        try_assign(
            tech,
            freed,
            candidates,
            &preference,
            &mut visited,
            &mut matched,
        );
    }

    let mut assignments = Vec::new();
    for tech in 0..freed.len() {
        let taken: Vec<AppointmentId> = matched
            .iter()
            .enumerate()
            .filter(|(_, holder)| **holder == Some(tech))
            .map(|(candidate_index, _)| candidates[candidate_index].id)
            .collect();
        if !taken.is_empty() {
            assignments.push(ReplacementAssignment {
                resource: freed[tech].resource,
                appointment_ids: taken,
                phase,
            });
        }
    }
    assignments
}

/// Weight of goods readiness in the decomposition score.
const READINESS_WEIGHT: i64 = 2;
/// Bonus for a technician already associated with the candidate.
const ASSOCIATION_BONUS: i64 = 3;

/// Phase 5: each freed technician may take several shorter candidates as
/// long as their summed duration fits inside the cancelled appointment's
/// duration; every candidate is used at most once.
fn decompose(
    cancelled: &Appointment,
    freed: &[FreedResource],
    candidates: &[&Appointment],
) -> Vec<ReplacementAssignment> {
    let mut used: BTreeSet<AppointmentId> = BTreeSet::new();
    let mut assignments = Vec::new();

    for tech in freed {
        let mut pool: Vec<&Appointment> = candidates
            .iter()
            .copied()
            .filter(|candidate| {
                !used.contains(&candidate.id)
                    && candidate.duration <= cancelled.duration
                    && tech_can_take(tech, candidate)
            })
            .collect();
        pool.sort_by_key(|candidate| (-decomposition_score(tech, candidate), candidate.id));

        let mut remaining = cancelled.duration_minutes();
        let mut taken = Vec::new();
        for candidate in pool {
            if candidate.duration_minutes() <= remaining {
                remaining -= candidate.duration_minutes();
                used.insert(candidate.id);
                taken.push(candidate.id);
            }
        }

        if !taken.is_empty() {
            assignments.push(ReplacementAssignment {
                resource: tech.resource,
                appointment_ids: taken,
                phase: ReplacementPhase::Decomposition,
            });
        }
    }

    assignments
}

fn decomposition_score(tech: &FreedResource, candidate: &Appointment) -> i64 {
    let associated = candidate.eligible_resources.contains(&tech.resource)
        || candidate.assigned_resources.contains(&tech.resource)
        || candidate.recommended_resources.contains(&tech.resource);
    candidate.merchandise_readiness().bonus() * READINESS_WEIGHT
        + if associated { ASSOCIATION_BONUS } else { 0 }
}
