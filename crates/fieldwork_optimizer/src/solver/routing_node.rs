use jiff::{SignedDuration, civil};
use smallvec::SmallVec;
use tracing::{debug, warn};

use crate::{
    define_index_newtype,
    problem::{
        appointment::{Appointment, ResourceId},
        clock::minutes_since_midnight,
        geopoint::GeoPoint,
        period::Period,
    },
    solver::route::VehicleIdx,
};

define_index_newtype!(NodeIdx, RoutingNode);

/// One visit the routing model may schedule: an (appointment, copy) pair.
/// Windows are service-start bounds relative to the period start, so a
/// scheduled visit always finishes inside its intersected window.
#[derive(Debug, Clone)]
pub struct RoutingNode {
    /// Index into the period's appointment slice.
    pub appointment: usize,
    pub copy: usize,
    pub position: GeoPoint,
    /// Service duration in minutes.
    pub service: i64,
    /// Earliest and latest allowed service start.
    pub window: (i64, i64),
    /// Vehicles (resource-pool indices) allowed to serve this node.
    pub allowed: SmallVec<[VehicleIdx; 4]>,
    /// Pinned, non-modifiable appointment.
    pub fixed: bool,
    /// Synchronization group for multi-resource appointments.
    pub group: Option<usize>,
}

impl RoutingNode {
    pub fn is_grouped(&self) -> bool {
        self.group.is_some()
    }

    pub fn allows(&self, vehicle: VehicleIdx) -> bool {
        self.allowed.contains(&vehicle)
    }
}

/// The routing model of one period: nodes plus the copy-groups that must
/// share a common start.
pub struct NodeGraph {
    pub nodes: Vec<RoutingNode>,
    pub groups: Vec<Vec<NodeIdx>>,
    /// Copies generated per appointment index; zero for skipped ones.
    pub copies: Vec<usize>,
}

/// Builds the period's routing nodes. Every failure here is a
/// per-appointment skip condition: GPS parse errors, empty window
/// intersections and empty eligible-vehicle sets drop the single
/// appointment, never the run.
pub fn build_nodes(
    appointments: &[Appointment],
    day: civil::Date,
    period: Period,
    pool: &[ResourceId],
) -> NodeGraph {
    let mut graph = NodeGraph {
        nodes: Vec::new(),
        groups: Vec::new(),
        copies: vec![0; appointments.len()],
    };

    for (index, appointment) in appointments.iter().enumerate() {
        let client_start = appointment.client_window.start;
        // The client's upper bound is exclusive: step back one minute.
        let client_end = appointment
            .client_window
            .end
            .map(|end| end.saturating_sub(SignedDuration::from_mins(1)));

        if let (Some(start), Some(end)) = (client_start, client_end)
            && !(start.date() <= day && day <= end.date())
        {
            continue;
        }

        let desired_lower = match client_start {
            Some(start) if start.date() == day => minutes_since_midnight(&start),
            _ => period.start(),
        };
        let desired_upper = match client_end {
            Some(end) if end.date() == day => minutes_since_midnight(&end),
            _ => period.end(),
        };

        let lower = desired_lower.max(period.start());
        let upper = desired_upper.min(period.end());
        if lower > upper {
            debug!(
                appointment = appointment.id.get(),
                "empty window intersection, skipping"
            );
            continue;
        }

        let service = appointment.duration_minutes();
        if service <= 0 {
            warn!(
                appointment = appointment.id.get(),
                "non-positive duration, skipping"
            );
            continue;
        }

        let position = match appointment.position() {
            Ok(position) => position,
            Err(error) => {
                warn!(appointment = appointment.id.get(), %error, "skipping");
                continue;
            }
        };

        let relative_lower = lower - period.start();
        let (window, allowed, copies) = if appointment.modifiable {
            let latest_start = upper - service - period.start();
            if latest_start < relative_lower {
                debug!(
                    appointment = appointment.id.get(),
                    "does not fit inside its window, skipping"
                );
                continue;
            }

            let allowed: SmallVec<[VehicleIdx; 4]> = pool
                .iter()
                .enumerate()
                .filter(|(_, resource)| appointment.eligible_resources.contains(resource))
                .map(|(vehicle, _)| VehicleIdx::new(vehicle))
                .collect();

            let copies = appointment.required_resources.max(1);
            ((relative_lower, latest_start), allowed, copies)
        } else {
            // Pinned: a one-minute-wide window at the intersection lower
            // bound, restricted to the single assigned resource.
            let pinned = match appointment.pinned_resource() {
                Ok(pinned) => pinned,
                Err(error) => {
                    warn!(appointment = appointment.id.get(), %error, "skipping");
                    continue;
                }
            };
            let allowed: SmallVec<[VehicleIdx; 4]> = pool
                .iter()
                .enumerate()
                .filter(|(_, resource)| **resource == pinned)
                .map(|(vehicle, _)| VehicleIdx::new(vehicle))
                .collect();

            ((relative_lower, relative_lower + 1), allowed, 1)
        };

        if allowed.is_empty() {
            debug!(
                appointment = appointment.id.get(),
                "no eligible resource in the pool, skipping"
            );
            continue;
        }
        if copies > allowed.len() {
            debug!(
                appointment = appointment.id.get(),
                required = copies,
                eligible = allowed.len(),
                "cannot staff the required resource count, skipping"
            );
            continue;
        }

        let group = (copies > 1).then(|| {
            graph.groups.push(Vec::with_capacity(copies));
            graph.groups.len() - 1
        });

        for copy in 0..copies {
            let node_index = NodeIdx::new(graph.nodes.len());
            graph.nodes.push(RoutingNode {
                appointment: index,
                copy,
                position,
                service,
                window,
                allowed: allowed.clone(),
                fixed: !appointment.modifiable,
                group,
            });
            if let Some(group) = group {
                graph.groups[group].push(node_index);
            }
        }
        graph.copies[index] = copies;
    }

    graph
}
