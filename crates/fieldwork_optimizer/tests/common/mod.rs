#![allow(dead_code)]

use fieldwork_optimizer::{
    config::OptimizerConfig,
    problem::appointment::{Appointment, ResourceId, TimeSlot},
    schedule::delta::ScheduleDelta,
};
use jiff::{SignedDuration, civil::Date, civil::date};

/// Monday used as "today" throughout the scenario tests.
pub fn monday() -> Date {
    date(2025, 2, 17)
}

pub fn resource_ids(ids: &[i64]) -> Vec<ResourceId> {
    ids.iter().map(|&id| ResourceId::new(id)).collect()
}

/// Default tunables with a tight solver budget so scenarios stay fast.
pub fn quick_config() -> OptimizerConfig {
    OptimizerConfig {
        solver_budget: SignedDuration::from_secs(2),
        max_perturbations: 8,
        ..OptimizerConfig::default()
    }
}

/// Applies a horizon delta back onto the records, the way the persistence
/// collaborator would before the next run.
pub fn apply_delta(appointments: &mut [Appointment], delta: &ScheduleDelta) {
    for change in delta.iter() {
        if let Some(appointment) = appointments
            .iter_mut()
            .find(|appointment| appointment.id == change.id)
        {
            appointment.scheduled = Some(TimeSlot::new(change.start, change.end));
            appointment.assigned_resources = change.resources.clone();
        }
    }
}
