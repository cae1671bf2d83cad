use jiff::Timestamp;
use rand::{Rng, rngs::SmallRng};

use crate::solver::{
    SolveContext,
    route::{VehicleIdx, propagate, sequence_cost},
    routing_node::NodeIdx,
    working_solution::WorkingSolution,
};

type Sequence = (Vec<NodeIdx>, Vec<Option<i64>>);

/// A validated improvement: full replacement sequences for one or two
/// routes. Applying is then infallible.
struct Move {
    first: (VehicleIdx, Sequence),
    second: Option<(VehicleIdx, Sequence)>,
}

/// Best-improvement local search: relocate and swap, intra- and
/// inter-route, over unsynchronized nodes. Runs until no strictly
/// improving move remains or the deadline passes.
pub fn improve(solution: &mut WorkingSolution, ctx: &SolveContext, deadline: Timestamp) {
    loop {
        if Timestamp::now() >= deadline {
            return;
        }

        let mut best: Option<(i64, Move)> = None;

        find_relocates(solution, ctx, &mut best);
        find_swaps(solution, ctx, &mut best);

        match best {
            Some((delta, candidate)) if delta < 0 => apply(solution, candidate, ctx),
            _ => return,
        }
    }
}

fn consider(best: &mut Option<(i64, Move)>, delta: i64, candidate: impl FnOnce() -> Move) {
    if delta < 0 && best.as_ref().is_none_or(|(incumbent, _)| delta < *incumbent) {
        *best = Some((delta, candidate()));
    }
}

fn apply(solution: &mut WorkingSolution, candidate: Move, ctx: &SolveContext) {
    let (vehicle, (visits, locks)) = candidate.first;
    solution.replace_route(vehicle, visits, locks, ctx);
    if let Some((vehicle, (visits, locks))) = candidate.second {
        solution.replace_route(vehicle, visits, locks, ctx);
    }
}

fn find_relocates(solution: &WorkingSolution, ctx: &SolveContext, best: &mut Option<(i64, Move)>) {
    for source in 0..solution.vehicle_count() {
        let source = VehicleIdx::new(source);
        let source_route = solution.route(source);

        for from in 0..source_route.len() {
            if source_route.is_locked(from) {
                continue;
            }
            let node = source_route.node_at(from);
            let (mut removed_visits, mut removed_locks) = source_route.visits_and_locks();
            removed_visits.remove(from);
            removed_locks.remove(from);

            for &target in &ctx.node(node).allowed {
                if target == source {
                    // Intra-route: re-insert into the shortened sequence.
                    for to in 0..=removed_visits.len() {
                        if to == from {
                            continue;
                        }
                        let mut visits = removed_visits.clone();
                        let mut locks = removed_locks.clone();
                        visits.insert(to, node);
                        locks.insert(to, None);
                        if propagate(&visits, &locks, ctx).is_none() {
                            continue;
                        }
                        let delta = sequence_cost(&visits, ctx) - source_route.cost(ctx);
                        consider(best, delta, || Move {
                            first: (source, (visits.clone(), locks.clone())),
                            second: None,
                        });
                    }
                } else {
                    if propagate(&removed_visits, &removed_locks, ctx).is_none() {
                        continue;
                    }
                    let removed_delta = sequence_cost(&removed_visits, ctx) - source_route.cost(ctx);

                    let target_route = solution.route(target);
                    for to in 0..=target_route.len() {
                        let Some((_, added)) = target_route.try_insert(to, node, None, ctx) else {
                            continue;
                        };
                        let delta = removed_delta + added;
                        consider(best, delta, || {
                            let (mut visits, mut locks) = target_route.visits_and_locks();
                            visits.insert(to, node);
                            locks.insert(to, None);
                            Move {
                                first: (source, (removed_visits.clone(), removed_locks.clone())),
                                second: Some((target, (visits, locks))),
                            }
                        });
                    }
                }
            }
        }
    }
}

fn find_swaps(solution: &WorkingSolution, ctx: &SolveContext, best: &mut Option<(i64, Move)>) {
    for first in 0..solution.vehicle_count() {
        let first = VehicleIdx::new(first);
        let first_route = solution.route(first);

        // Intra-route swaps.
        for left in 0..first_route.len() {
            if first_route.is_locked(left) {
                continue;
            }
            for right in left + 1..first_route.len() {
                if first_route.is_locked(right) {
                    continue;
                }
                let (mut visits, locks) = first_route.visits_and_locks();
                visits.swap(left, right);
                if propagate(&visits, &locks, ctx).is_none() {
                    continue;
                }
                let delta = sequence_cost(&visits, ctx) - first_route.cost(ctx);
                consider(best, delta, || Move {
                    first: (first, (visits.clone(), locks.clone())),
                    second: None,
                });
            }
        }

        // Inter-route swaps, each unordered pair once.
        for second in first.get() + 1..solution.vehicle_count() {
            let second = VehicleIdx::new(second);
            let second_route = solution.route(second);

            for left in 0..first_route.len() {
                if first_route.is_locked(left) {
                    continue;
                }
                let left_node = first_route.node_at(left);
                if !ctx.node(left_node).allows(second) {
                    continue;
                }

                for right in 0..second_route.len() {
                    if second_route.is_locked(right) {
                        continue;
                    }
                    let right_node = second_route.node_at(right);
                    if !ctx.node(right_node).allows(first) {
                        continue;
                    }

                    let (mut first_visits, first_locks) = first_route.visits_and_locks();
                    let (mut second_visits, second_locks) = second_route.visits_and_locks();
                    first_visits[left] = right_node;
                    second_visits[right] = left_node;

                    if propagate(&first_visits, &first_locks, ctx).is_none()
                        || propagate(&second_visits, &second_locks, ctx).is_none()
                    {
                        continue;
                    }

                    let delta = sequence_cost(&first_visits, ctx) + sequence_cost(&second_visits, ctx)
                        - first_route.cost(ctx)
                        - second_route.cost(ctx);
                    consider(best, delta, || Move {
                        first: (first, (first_visits.clone(), first_locks.clone())),
                        second: Some((second, (second_visits.clone(), second_locks.clone()))),
                    });
                }
            }
        }
    }
}

/// Removes up to `count` random victims from the solution; a victim that
/// belongs to a synchronization group takes its whole group with it, or
/// stays put when any member's removal would break a downstream bound.
pub fn ruin(solution: &mut WorkingSolution, ctx: &SolveContext, rng: &mut SmallRng, count: usize) {
    for _ in 0..count {
        let occupied: Vec<(VehicleIdx, usize)> = solution
            .routes()
            .iter()
            .flat_map(|route| {
                (0..route.len()).map(move |position| (route.vehicle(), position))
            })
            .collect();
        if occupied.is_empty() {
            return;
        }

        let (vehicle, position) = occupied[rng.random_range(0..occupied.len())];
        let node = solution.route(vehicle).node_at(position);

        match ctx.node(node).group {
            Some(group) => {
                // Copies sit on distinct vehicles, so each affected route
                // loses exactly one visit; validate all before applying any.
                let mut replacements = Vec::new();
                let mut removable = true;
                for &member in &ctx.groups[group] {
                    let Some((member_vehicle, member_position)) = solution.position_of(member)
                    else {
                        continue;
                    };
                    match solution
                        .route(member_vehicle)
                        .try_remove(member_position, ctx)
                    {
                        Some((visits, locks)) => {
                            replacements.push((member_vehicle, member, visits, locks))
                        }
                        None => {
                            removable = false;
                            break;
                        }
                    }
                }
                if removable {
                    for (member_vehicle, _, visits, locks) in replacements {
                        solution.replace_route(member_vehicle, visits, locks, ctx);
                    }
                }
            }
            None => {
                if let Some((visits, locks)) = solution.route(vehicle).try_remove(position, ctx) {
                    solution.replace_route(vehicle, visits, locks, ctx);
                }
            }
        }
    }
}
