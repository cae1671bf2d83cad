use crate::solver::{
    SolveContext, route::VehicleIdx, routing_node::NodeIdx, working_solution::WorkingSolution,
};

/// One evaluated placement of a node: where, when, and at what cost.
#[derive(Debug, Clone, Copy)]
pub struct Insertion {
    pub vehicle: VehicleIdx,
    pub position: usize,
    /// Realized service start, relative to the period start.
    pub start: i64,
    /// Tour cost increase of taking this placement.
    pub cost: i64,
}

/// Cheapest feasible placement of `node` across its allowed vehicles.
/// Iteration order is fixed (vehicles as listed, positions front to back),
/// and only a strictly better cost replaces the incumbent, so the result
/// is deterministic.
pub fn best_insertion(
    solution: &WorkingSolution,
    node: NodeIdx,
    forced_start: Option<i64>,
    ctx: &SolveContext,
) -> Option<Insertion> {
    let mut best: Option<Insertion> = None;

    for &vehicle in &ctx.node(node).allowed {
        let route = solution.route(vehicle);
        for position in 0..=route.len() {
            if let Some((start, cost)) = route.try_insert(position, node, forced_start, ctx)
                && best.is_none_or(|incumbent| cost < incumbent.cost)
            {
                best = Some(Insertion {
                    vehicle,
                    position,
                    start,
                    cost,
                });
            }
        }
    }

    best
}
