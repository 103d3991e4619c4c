use crate::dsa::graph::Network;
use crate::error::Result;
use crate::routing::Routing;
use crate::routing::softmin::downhill_routing;

/// Demand independent baseline: equal split over every edge on a hop count
/// shortest path (ECMP).
pub fn shortest_path_ecmp(network:&Network) -> Result<Routing> {
    let unit = vec![1.0;network.edge_count()];
    downhill_routing(network, &unit, 0.0)
}
