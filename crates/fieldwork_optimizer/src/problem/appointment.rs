use std::collections::BTreeSet;

use jiff::{SignedDuration, civil};
use serde::{Deserialize, Serialize};

use crate::{define_id_newtype, error::ModelError, problem::geopoint::GeoPoint};

define_id_newtype!(AppointmentId);
define_id_newtype!(ResourceId);

/// A concrete scheduled interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start: civil::DateTime,
    pub end: civil::DateTime,
}

impl TimeSlot {
    pub fn new(start: civil::DateTime, end: civil::DateTime) -> Self {
        TimeSlot { start, end }
    }

    /// Strict interval overlap: touching endpoints do not overlap.
    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// The client's desired window. An absent bound means "unconstrained
/// within the optimization period".
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ClientWindow {
    pub start: Option<civil::DateTime>,
    pub end: Option<civil::DateTime>,
}

impl ClientWindow {
    /// Whether `day` lies inside the window. Only binds when both bounds
    /// are present, matching the upstream contract.
    pub fn covers_day(&self, day: civil::Date) -> bool {
        match (self.start, self.end) {
            (Some(start), Some(end)) => start.date() <= day && day <= end.date(),
            _ => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MerchandiseStatus {
    Delivered,
    Installed,
    Received,
    Ordered,
}

/// One goods order attached to an appointment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MerchandiseOrder {
    pub status: MerchandiseStatus,
    /// Confirmed arrival date for `Ordered` goods, when known.
    pub confirmed_arrival: Option<civil::Date>,
}

/// Readiness ordinal used as the replacement selector's secondary
/// objective. Higher is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MerchandiseReadiness {
    NotReady,
    ConfirmedBeforeDate,
    Received,
    Delivered,
    NoGoodsRequired,
}

impl MerchandiseReadiness {
    pub fn bonus(&self) -> i64 {
        match self {
            MerchandiseReadiness::NotReady => 0,
            MerchandiseReadiness::ConfirmedBeforeDate => 1,
            MerchandiseReadiness::Received => 2,
            MerchandiseReadiness::Delivered => 3,
            MerchandiseReadiness::NoGoodsRequired => 4,
        }
    }
}

/// A schedulable unit of field work, as normalized by the upstream
/// collaborator. Only `scheduled` and `assigned_resources` are ever written
/// back; everything else is read-only input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,

    /// Movable in time and resources, or pinned as-is.
    pub modifiable: bool,

    pub duration: SignedDuration,

    #[serde(default = "default_required_resources")]
    pub required_resources: usize,

    /// Raw `"lat, lon"` as delivered upstream; parsing it is a recoverable
    /// per-appointment failure.
    pub gps: String,

    /// The possible/recommended pool the optimizer may draw from.
    #[serde(default)]
    pub eligible_resources: Vec<ResourceId>,

    /// Current assignment. For non-modifiable appointments the first entry
    /// is the pinned resource.
    #[serde(default)]
    pub assigned_resources: Vec<ResourceId>,

    /// Technicians recommended upstream without being assigned.
    #[serde(default)]
    pub recommended_resources: Vec<ResourceId>,

    #[serde(default)]
    pub scheduled: Option<TimeSlot>,

    #[serde(default)]
    pub client_window: ClientWindow,

    #[serde(default)]
    pub criticality: i32,

    #[serde(default)]
    pub merchandise: Vec<MerchandiseOrder>,

    /// Human-readable reason attached when an engine cancels or preempts
    /// this appointment.
    #[serde(default)]
    pub alert: Option<String>,
}

fn default_required_resources() -> usize {
    1
}

impl Appointment {
    pub fn duration_minutes(&self) -> i64 {
        self.duration.as_mins()
    }

    pub fn position(&self) -> Result<GeoPoint, ModelError> {
        GeoPoint::parse(&self.gps)
    }

    /// The single resource a non-modifiable appointment is pinned to.
    pub fn pinned_resource(&self) -> Result<ResourceId, ModelError> {
        self.assigned_resources
            .first()
            .copied()
            .ok_or(ModelError::MissingPinnedResource(self.id.get()))
    }

    pub fn overlaps(&self, other: &Appointment) -> bool {
        match (&self.scheduled, &other.scheduled) {
            (Some(a), Some(b)) => a.overlaps(b),
            _ => false,
        }
    }

    /// Clears the schedule and assignment, recording why.
    pub fn cancel(&mut self, reason: String) {
        self.scheduled = None;
        self.assigned_resources.clear();
        self.alert = Some(reason);
    }

    /// Readiness of this appointment's goods relative to its scheduled
    /// date. `NoGoodsRequired` when no merchandise is attached at all.
    pub fn merchandise_readiness(&self) -> MerchandiseReadiness {
        if self.merchandise.is_empty() {
            return MerchandiseReadiness::NoGoodsRequired;
        }

        let all_delivered = self.merchandise.iter().all(|order| {
            matches!(
                order.status,
                MerchandiseStatus::Delivered | MerchandiseStatus::Installed
            )
        });
        if all_delivered {
            return MerchandiseReadiness::Delivered;
        }

        let all_received = self.merchandise.iter().all(|order| {
            matches!(
                order.status,
                MerchandiseStatus::Delivered
                    | MerchandiseStatus::Installed
                    | MerchandiseStatus::Received
            )
        });
        if all_received {
            return MerchandiseReadiness::Received;
        }

        let appointment_day = self.scheduled.map(|slot| slot.start.date());
        let all_confirmed_before = self.merchandise.iter().all(|order| {
            match (order.status, order.confirmed_arrival, appointment_day) {
                (MerchandiseStatus::Delivered | MerchandiseStatus::Installed, _, _) => true,
                (MerchandiseStatus::Received, _, _) => true,
                (MerchandiseStatus::Ordered, Some(arrival), Some(day)) => arrival < day,
                _ => false,
            }
        });
        if all_confirmed_before {
            return MerchandiseReadiness::ConfirmedBeforeDate;
        }

        MerchandiseReadiness::NotReady
    }
}

/// The run's resource pool: sorted, deduplicated union of every
/// appointment's eligible and assigned sets. Sorting keeps vehicle indices
/// stable across runs.
pub fn resource_pool(appointments: &[Appointment]) -> Vec<ResourceId> {
    let mut pool = BTreeSet::new();
    for appointment in appointments {
        pool.extend(appointment.eligible_resources.iter().copied());
        pool.extend(appointment.assigned_resources.iter().copied());
    }
    pool.into_iter().collect()
}

#[derive(Debug)]
pub struct AppointmentBuilder {
    appointment: Appointment,
}

impl Default for AppointmentBuilder {
    fn default() -> Self {
        AppointmentBuilder {
            appointment: Appointment {
                id: AppointmentId::new(0),
                modifiable: true,
                duration: SignedDuration::from_mins(60),
                required_resources: 1,
                gps: String::new(),
                eligible_resources: Vec::new(),
                assigned_resources: Vec::new(),
                recommended_resources: Vec::new(),
                scheduled: None,
                client_window: ClientWindow::default(),
                criticality: 0,
                merchandise: Vec::new(),
                alert: None,
            },
        }
    }
}

impl AppointmentBuilder {
    pub fn with_id(mut self, id: i64) -> Self {
        self.appointment.id = AppointmentId::new(id);
        self
    }

    pub fn with_modifiable(mut self, modifiable: bool) -> Self {
        self.appointment.modifiable = modifiable;
        self
    }

    pub fn with_duration_minutes(mut self, minutes: i64) -> Self {
        self.appointment.duration = SignedDuration::from_mins(minutes);
        self
    }

    pub fn with_required_resources(mut self, count: usize) -> Self {
        self.appointment.required_resources = count;
        self
    }

    pub fn with_gps(mut self, gps: &str) -> Self {
        self.appointment.gps = gps.to_owned();
        self
    }

    pub fn with_eligible(mut self, resources: &[i64]) -> Self {
        self.appointment.eligible_resources =
            resources.iter().map(|&id| ResourceId::new(id)).collect();
        self
    }

    pub fn with_assigned(mut self, resources: &[i64]) -> Self {
        self.appointment.assigned_resources =
            resources.iter().map(|&id| ResourceId::new(id)).collect();
        self
    }

    pub fn with_recommended(mut self, resources: &[i64]) -> Self {
        self.appointment.recommended_resources =
            resources.iter().map(|&id| ResourceId::new(id)).collect();
        self
    }

    pub fn with_scheduled(mut self, start: civil::DateTime, end: civil::DateTime) -> Self {
        self.appointment.scheduled = Some(TimeSlot::new(start, end));
        self
    }

    pub fn with_client_window(
        mut self,
        start: Option<civil::DateTime>,
        end: Option<civil::DateTime>,
    ) -> Self {
        self.appointment.client_window = ClientWindow { start, end };
        self
    }

    pub fn with_criticality(mut self, criticality: i32) -> Self {
        self.appointment.criticality = criticality;
        self
    }

    pub fn with_merchandise(mut self, merchandise: Vec<MerchandiseOrder>) -> Self {
        self.appointment.merchandise = merchandise;
        self
    }

    pub fn build(self) -> Appointment {
        self.appointment
    }
}
