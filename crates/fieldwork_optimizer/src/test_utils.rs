use smallvec::SmallVec;

use crate::{
    problem::geopoint::GeoPoint,
    solver::{
        RouteLimits, SolveContext,
        route::VehicleIdx,
        routing_node::{NodeIdx, RoutingNode},
        travel_matrix::TravelMatrix,
    },
};

/// Depot shared by the solver unit tests.
pub(crate) fn test_depot() -> GeoPoint {
    GeoPoint::new(48.8566, 2.3522)
}

/// A routing node at the depot itself, so all travel times are zero and
/// the tests exercise pure time-window logic.
pub(crate) fn stationary_node(
    appointment: usize,
    service: i64,
    window: (i64, i64),
    vehicles: &[usize],
) -> RoutingNode {
    RoutingNode {
        appointment,
        copy: 0,
        position: test_depot(),
        service,
        window,
        allowed: vehicles.iter().map(|&v| VehicleIdx::new(v)).collect::<SmallVec<_>>(),
        fixed: false,
        group: None,
    }
}

/// Owns the model a `SolveContext` borrows from.
pub(crate) struct TestModel {
    pub nodes: Vec<RoutingNode>,
    pub groups: Vec<Vec<NodeIdx>>,
    pub matrix: TravelMatrix,
}

impl TestModel {
    pub fn new(nodes: Vec<RoutingNode>) -> Self {
        let matrix = TravelMatrix::build(test_depot(), &nodes, 50.0);
        TestModel {
            nodes,
            groups: Vec::new(),
            matrix,
        }
    }

    pub fn ctx(&self, period_duration: i64, max_waiting: i64) -> SolveContext<'_> {
        SolveContext {
            nodes: &self.nodes,
            groups: &self.groups,
            matrix: &self.matrix,
            limits: RouteLimits {
                period_duration,
                max_waiting,
            },
            skip_penalty: 10_000,
            sync_tolerance: 0,
        }
    }
}
