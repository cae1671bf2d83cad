use fxhash::FxHashSet;
use tracing::{debug, info};

use crate::problem::{
    appointment::{Appointment, AppointmentId, ResourceId},
    geopoint::GeoPoint,
};

/// Handles one resource becoming unavailable: appointments using it are
/// refilled by greedily stealing resources from strictly less critical
/// appointments, ranked by distance; what cannot be refilled is cancelled.
pub struct ReassignmentEngine;

impl ReassignmentEngine {
    /// Returns every appointment touched, deduplicated and sorted by id.
    /// That covers refilled and cancelled orphans as well as the preempted
    /// appointments their resources came from.
    pub fn reassign(appointments: &[Appointment], absent: ResourceId) -> Vec<Appointment> {
        let (mut orphaned, mut others): (Vec<Appointment>, Vec<Appointment>) = appointments
            .iter()
            .cloned()
            .partition(|appointment| appointment.assigned_resources.contains(&absent));

        let mut changed: FxHashSet<AppointmentId> = FxHashSet::default();

        for orphan in orphaned.iter_mut() {
            orphan.assigned_resources.retain(|&resource| resource != absent);

            let needed = orphan.required_resources.max(1);
            let mut chosen: Vec<ResourceId> = Vec::new();

            while chosen.len() < needed {
                let Some(best) = best_candidate(orphan, &chosen, absent, &others) else {
                    break;
                };

                for index in best.conflicts {
                    let victim = &mut others[index];
                    victim.cancel(format!(
                        "Cancelled: resource {} preempted by higher-criticality appointment {}",
                        best.resource, orphan.id
                    ));
                    changed.insert(victim.id);
                }
                chosen.push(best.resource);
            }

            if chosen.len() == needed {
                chosen.sort();
                orphan.assigned_resources = chosen;
                changed.insert(orphan.id);
                debug!(appointment = orphan.id.get(), "orphan refilled");
            } else {
                orphan.cancel(format!(
                    "Cancelled: no resources available to cover the absence of {absent}"
                ));
                changed.insert(orphan.id);
                debug!(appointment = orphan.id.get(), "orphan cancelled");
            }
        }

        let mut touched: Vec<Appointment> = orphaned
            .into_iter()
            .chain(others)
            .filter(|appointment| changed.contains(&appointment.id))
            .collect();
        touched.sort_by_key(|appointment| appointment.id);

        info!(absent = absent.get(), touched = touched.len(), "absence handled");
        touched
    }
}

struct Candidate {
    resource: ResourceId,
    /// Indices into `others` of the appointments this steal preempts.
    conflicts: Vec<usize>,
    /// Average distance to the conflicting appointments; zero when free.
    average_distance: f64,
}

/// The takeable candidate minimizing average conflict distance, ties
/// broken by resource id. A candidate is takeable only when the orphan's
/// criticality strictly exceeds every conflicting appointment's; a tie
/// blocks the steal.
fn best_candidate(
    orphan: &Appointment,
    chosen: &[ResourceId],
    absent: ResourceId,
    others: &[Appointment],
) -> Option<Candidate> {
    let orphan_position = orphan.position().ok();
    let mut best: Option<Candidate> = None;

    for &resource in &orphan.eligible_resources {
        if resource == absent || chosen.contains(&resource) {
            continue;
        }

        let conflicts: Vec<usize> = others
            .iter()
            .enumerate()
            .filter(|(_, other)| {
                other.assigned_resources.contains(&resource) && orphan.overlaps(other)
            })
            .map(|(index, _)| index)
            .collect();

        let takeable = conflicts
            .iter()
            .all(|&index| others[index].criticality < orphan.criticality);
        if !takeable {
            continue;
        }

        let average_distance = if conflicts.is_empty() {
            0.0
        } else {
            average_conflict_distance(orphan_position.as_ref(), &conflicts, others)
        };

        let better = match &best {
            None => true,
            Some(incumbent) => average_distance
                .total_cmp(&incumbent.average_distance)
                .then(resource.cmp(&incumbent.resource))
                .is_lt(),
        };
        if better {
            best = Some(Candidate {
                resource,
                conflicts,
                average_distance,
            });
        }
    }

    best
}

fn average_conflict_distance(
    orphan_position: Option<&GeoPoint>,
    conflicts: &[usize],
    others: &[Appointment],
) -> f64 {
    let Some(orphan_position) = orphan_position else {
        return f64::INFINITY;
    };

    let distances: Vec<f64> = conflicts
        .iter()
        .filter_map(|&index| others[index].position().ok())
        .map(|position| orphan_position.haversine_km(&position))
        .collect();

    if distances.is_empty() {
        return f64::INFINITY;
    }
    distances.iter().sum::<f64>() / distances.len() as f64
}
