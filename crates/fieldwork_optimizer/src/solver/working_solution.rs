use crate::solver::{
    SolveContext,
    route::{Route, VehicleIdx},
    routing_node::NodeIdx,
};

/// One route per resource plus the not-yet-routed node set. Skipped nodes
/// are legal (disjunction with penalty); the cost function charges them.
#[derive(Debug, Clone)]
pub struct WorkingSolution {
    routes: Vec<Route>,
    assigned: Vec<bool>,
}

impl WorkingSolution {
    pub fn new(vehicle_count: usize, node_count: usize) -> Self {
        WorkingSolution {
            routes: (0..vehicle_count)
                .map(|vehicle| Route::empty(VehicleIdx::new(vehicle)))
                .collect(),
            assigned: vec![false; node_count],
        }
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn route(&self, vehicle: VehicleIdx) -> &Route {
        &self.routes[vehicle]
    }

    pub fn vehicle_count(&self) -> usize {
        self.routes.len()
    }

    pub fn is_assigned(&self, node: NodeIdx) -> bool {
        self.assigned[node.get()]
    }

    /// Unrouted nodes in index order, keeping iteration deterministic.
    pub fn unassigned(&self) -> impl Iterator<Item = NodeIdx> + '_ {
        self.assigned
            .iter()
            .enumerate()
            .filter(|&(_, &assigned)| !assigned)
            .map(|(index, _)| NodeIdx::new(index))
    }

    pub fn unassigned_count(&self) -> usize {
        self.assigned.iter().filter(|&&assigned| !assigned).count()
    }

    pub fn insert(
        &mut self,
        vehicle: VehicleIdx,
        position: usize,
        node: NodeIdx,
        forced_start: Option<i64>,
        ctx: &SolveContext,
    ) {
        self.routes[vehicle].insert(position, node, forced_start, ctx);
        self.assigned[node.get()] = true;
    }

    /// Installs a validated visit sequence on one route, syncing the
    /// assigned set for whatever was added or dropped.
    pub fn replace_route(
        &mut self,
        vehicle: VehicleIdx,
        visits: Vec<NodeIdx>,
        locks: Vec<Option<i64>>,
        ctx: &SolveContext,
    ) {
        for &node in self.routes[vehicle].visits() {
            self.assigned[node.get()] = false;
        }
        for &node in &visits {
            self.assigned[node.get()] = true;
        }
        self.routes[vehicle].replace_visits(visits, locks, ctx);
    }

    pub fn position_of(&self, node: NodeIdx) -> Option<(VehicleIdx, usize)> {
        self.routes.iter().find_map(|route| {
            route
                .position_of(node)
                .map(|position| (route.vehicle(), position))
        })
    }

    /// Total objective: routed travel + service minutes, plus the skip
    /// penalty for every node left unvisited.
    pub fn cost(&self, ctx: &SolveContext) -> i64 {
        let routed: i64 = self.routes.iter().map(|route| route.cost(ctx)).sum();
        routed + ctx.skip_penalty * self.unassigned_count() as i64
    }
}
