pub mod construction;
pub mod insertion;
pub mod local_search;
pub mod period_router;
pub mod route;
pub mod routing_node;
pub mod travel_matrix;
pub mod working_solution;

use crate::solver::{
    routing_node::{NodeIdx, RoutingNode},
    travel_matrix::TravelMatrix,
};

/// Per-route feasibility bounds, in minutes relative to the period start.
#[derive(Debug, Clone, Copy)]
pub struct RouteLimits {
    /// Total length of the period being solved.
    pub period_duration: i64,
    /// Maximum on-site waiting before a visit may begin.
    pub max_waiting: i64,
}

/// Everything a solve needs to evaluate and mutate routes. Built fresh per
/// period-solve call and discarded afterwards.
pub struct SolveContext<'a> {
    pub nodes: &'a [RoutingNode],
    pub groups: &'a [Vec<NodeIdx>],
    pub matrix: &'a TravelMatrix,
    pub limits: RouteLimits,
    pub skip_penalty: i64,
    /// Allowed spread between the starts of one group's copies.
    pub sync_tolerance: i64,
}

impl SolveContext<'_> {
    pub fn node(&self, index: NodeIdx) -> &RoutingNode {
        &self.nodes[index]
    }
}
