use jiff::civil;
use serde::{Deserialize, Serialize};

use crate::problem::appointment::{AppointmentId, ResourceId};

/// One appointment the optimizer actually changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentChange {
    pub id: AppointmentId,
    pub start: civil::DateTime,
    pub end: civil::DateTime,
    pub resources: Vec<ResourceId>,
}

/// The sole externally visible output of a horizon run: only appointments
/// whose (start, end, resource-set) triple differs from the input, never a
/// full schedule dump.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleDelta {
    changes: Vec<AppointmentChange>,
}

impl ScheduleDelta {
    pub fn push(&mut self, change: AppointmentChange) {
        self.changes.push(change);
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AppointmentChange> {
        self.changes.iter()
    }

    pub fn get(&self, id: AppointmentId) -> Option<&AppointmentChange> {
        self.changes.iter().find(|change| change.id == id)
    }
}
