use crate::{
    define_index_newtype,
    solver::{SolveContext, routing_node::NodeIdx},
};

define_index_newtype!(VehicleIdx, Route);

/// One resource's tour within a period. `starts` holds the realized service
/// start of each visit, minutes relative to the period start; `locks` pins
/// the starts of synchronized multi-resource copies so later edits cannot
/// drift them apart.
#[derive(Debug, Clone)]
pub struct Route {
    vehicle: VehicleIdx,
    visits: Vec<NodeIdx>,
    locks: Vec<Option<i64>>,
    starts: Vec<i64>,
}

impl Route {
    pub fn empty(vehicle: VehicleIdx) -> Self {
        Route {
            vehicle,
            visits: Vec::new(),
            locks: Vec::new(),
            starts: Vec::new(),
        }
    }

    pub fn vehicle(&self) -> VehicleIdx {
        self.vehicle
    }

    pub fn len(&self) -> usize {
        self.visits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visits.is_empty()
    }

    pub fn visits(&self) -> &[NodeIdx] {
        &self.visits
    }

    pub fn node_at(&self, position: usize) -> NodeIdx {
        self.visits[position]
    }

    pub fn start_at(&self, position: usize) -> i64 {
        self.starts[position]
    }

    pub fn is_locked(&self, position: usize) -> bool {
        self.locks[position].is_some()
    }

    pub fn position_of(&self, node: NodeIdx) -> Option<usize> {
        self.visits.iter().position(|&visit| visit == node)
    }

    /// Travel minutes of the full tour, depot to depot, plus service time.
    pub fn cost(&self, ctx: &SolveContext) -> i64 {
        sequence_cost(&self.visits, ctx)
    }

    /// Evaluates inserting `node` at `position`, optionally pinning its
    /// start. Returns the realized start and the tour cost increase, or
    /// `None` when any window or waiting bound would break.
    pub fn try_insert(
        &self,
        position: usize,
        node: NodeIdx,
        forced_start: Option<i64>,
        ctx: &SolveContext,
    ) -> Option<(i64, i64)> {
        let mut visits = self.visits.clone();
        let mut locks = self.locks.clone();
        visits.insert(position, node);
        locks.insert(position, forced_start);

        let starts = propagate(&visits, &locks, ctx)?;

        let previous = position.checked_sub(1).map(|p| visits[p]);
        let next = visits.get(position + 1).copied();
        let added = leg(previous, Some(node), ctx) + leg(Some(node), next, ctx)
            - leg(previous, next, ctx)
            + ctx.node(node).service;

        Some((starts[position], added))
    }

    /// Inserts `node` at `position`. Callers must have validated the move
    /// through [`Route::try_insert`] first.
    pub fn insert(
        &mut self,
        position: usize,
        node: NodeIdx,
        forced_start: Option<i64>,
        ctx: &SolveContext,
    ) {
        self.visits.insert(position, node);
        self.locks.insert(position, forced_start);
        self.resync(ctx);
    }

    /// Evaluates removing the visit at `position`. Removal can break a
    /// downstream waiting bound (everything after arrives earlier), so it
    /// validates like an insertion does. Returns the shortened sequence for
    /// [`Route::replace_visits`].
    pub fn try_remove(
        &self,
        position: usize,
        ctx: &SolveContext,
    ) -> Option<(Vec<NodeIdx>, Vec<Option<i64>>)> {
        let mut visits = self.visits.clone();
        let mut locks = self.locks.clone();
        visits.remove(position);
        locks.remove(position);
        propagate(&visits, &locks, ctx)?;
        Some((visits, locks))
    }

    /// Recomputes realized starts after a structural edit.
    fn resync(&mut self, ctx: &SolveContext) {
        self.starts = propagate(&self.visits, &self.locks, ctx)
            .unwrap_or_else(|| panic!("route for vehicle {} became infeasible", self.vehicle));
    }

    /// Replaces this route's visit sequence wholesale. The sequence must
    /// have been validated through [`propagate`] beforehand.
    pub fn replace_visits(&mut self, visits: Vec<NodeIdx>, locks: Vec<Option<i64>>, ctx: &SolveContext) {
        self.visits = visits;
        self.locks = locks;
        self.resync(ctx);
    }

    pub fn visits_and_locks(&self) -> (Vec<NodeIdx>, Vec<Option<i64>>) {
        (self.visits.clone(), self.locks.clone())
    }
}

/// Forward earliest-start propagation over a candidate visit sequence.
///
/// The depot departure is flexible, so the first leg carries no waiting
/// bound; every later visit may wait at most `max_waiting` minutes on site.
/// A locked visit must start exactly at its locked minute.
pub fn propagate(
    visits: &[NodeIdx],
    locks: &[Option<i64>],
    ctx: &SolveContext,
) -> Option<Vec<i64>> {
    let mut starts = Vec::with_capacity(visits.len());
    let mut previous: Option<NodeIdx> = None;
    let mut previous_departure = 0i64;

    for (position, &node_index) in visits.iter().enumerate() {
        let node = ctx.node(node_index);
        let (lower, upper) = node.window;

        let arrival = match previous {
            None => ctx.matrix.depot_to(node_index),
            Some(previous) => previous_departure + ctx.matrix.between(previous, node_index),
        };

        let mut start = arrival.max(lower);
        if let Some(locked) = locks[position] {
            if locked < start {
                return None;
            }
            start = locked;
        }

        if start > upper {
            return None;
        }
        if previous.is_some() && start - arrival > ctx.limits.max_waiting {
            return None;
        }

        starts.push(start);
        previous = Some(node_index);
        previous_departure = start + node.service;
    }

    Some(starts)
}

/// Travel + service cost of a visit sequence, depot to depot.
pub fn sequence_cost(visits: &[NodeIdx], ctx: &SolveContext) -> i64 {
    if visits.is_empty() {
        return 0;
    }

    let mut cost = ctx.matrix.depot_to(visits[0]);
    for pair in visits.windows(2) {
        cost += ctx.matrix.between(pair[0], pair[1]);
    }
    cost += ctx.matrix.to_depot(visits[visits.len() - 1]);
    cost += visits.iter().map(|&node| ctx.node(node).service).sum::<i64>();

    cost
}

fn leg(from: Option<NodeIdx>, to: Option<NodeIdx>, ctx: &SolveContext) -> i64 {
    match (from, to) {
        (None, None) => 0,
        (None, Some(to)) => ctx.matrix.depot_to(to),
        (Some(from), None) => ctx.matrix.to_depot(from),
        (Some(from), Some(to)) => ctx.matrix.between(from, to),
    }
}
