use rayon::prelude::*;

use crate::{
    problem::geopoint::GeoPoint,
    solver::routing_node::{NodeIdx, RoutingNode},
};

/// Dense travel-time matrix over {depot} ∪ nodes, whole minutes.
/// Row/column 0 is the depot; node `i` lives at offset `i + 1`.
pub struct TravelMatrix {
    minutes: Vec<i64>,
    size: usize,
}

impl TravelMatrix {
    pub fn build(depot: GeoPoint, nodes: &[RoutingNode], speed_kmh: f64) -> Self {
        let positions: Vec<GeoPoint> = std::iter::once(depot)
            .chain(nodes.iter().map(|node| node.position))
            .collect();
        let size = positions.len();

        let minutes = (0..size * size)
            .into_par_iter()
            .map(|cell| {
                let (from, to) = (cell / size, cell % size);
                positions[from].travel_minutes(&positions[to], speed_kmh)
            })
            .collect();

        TravelMatrix { minutes, size }
    }

    pub fn depot_to(&self, node: NodeIdx) -> i64 {
        self.get(0, node.get() + 1)
    }

    pub fn to_depot(&self, node: NodeIdx) -> i64 {
        self.get(node.get() + 1, 0)
    }

    pub fn between(&self, from: NodeIdx, to: NodeIdx) -> i64 {
        self.get(from.get() + 1, to.get() + 1)
    }

    fn get(&self, from: usize, to: usize) -> i64 {
        self.minutes[from * self.size + to]
    }
}

#[cfg(test)]
mod tests {
    use smallvec::SmallVec;

    use super::*;

    fn node_at(lat: f64, lon: f64) -> RoutingNode {
        RoutingNode {
            appointment: 0,
            copy: 0,
            position: GeoPoint::new(lat, lon),
            service: 30,
            window: (0, 240),
            allowed: SmallVec::new(),
            fixed: false,
            group: None,
        }
    }

    #[test]
    fn test_diagonal_is_zero_and_symmetric() {
        let depot = GeoPoint::new(48.8566, 2.3522);
        let nodes = vec![node_at(48.9, 2.4), node_at(48.7, 2.2)];
        let matrix = TravelMatrix::build(depot, &nodes, 50.0);

        let a = NodeIdx::new(0);
        let b = NodeIdx::new(1);
        assert_eq!(matrix.between(a, a), 0);
        assert_eq!(matrix.between(a, b), matrix.between(b, a));
        assert_eq!(matrix.depot_to(a), matrix.to_depot(a));
        assert!(matrix.depot_to(b) > 0);
    }
}
