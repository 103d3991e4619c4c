use crate::dsa::graph::Network;
use crate::error::{DdrError, Result};
use crate::linear_algebra::matrix::Matrix;
use crate::routing::Routing;

pub(crate) fn resolve(network:&Network,weights:&[f64],gamma:f64) -> Result<Routing> {
    if weights.len() != network.edge_count() {
        return Err(DdrError::routing(format!(
            "expected {} edge weights, got {}",network.edge_count(),weights.len()
        )))
    }
    if let Some((edge,w)) = weights.iter().enumerate().find(|(_,w)| !w.is_finite() || **w <= 0.0) {
        return Err(DdrError::routing(format!("weight {w} on edge {edge} must be finite and positive")))
    }
    downhill_routing(network, weights, gamma)
}

/// Splits traffic only over edges that lead strictly closer to the
/// destination, so no destination graph can loop.
///
/// Eligible for `u`: every edge `u -> v` with `dist(v) < dist(u)`, plus `u`'s
/// shortest path tree edge. All of them point to nodes Dijkstra settled
/// before `u`, and the tree edge keeps a node routable when its weight is
/// too small to show up in the distance.
///
/// Ratio of eligible edge `u -> v` is proportional to
/// `exp(-gamma * (w(e) + dist(v)))`. With `gamma = 0` the split is even,
/// which is plain ECMP when every weight is one. Nodes that cannot reach the
/// destination get no ratios.
pub(crate) fn downhill_routing(network:&Network,weights:&[f64],gamma:f64) -> Result<Routing> {
    let n = network.node_count();
    let edge_count = network.edge_count();
    let mut ratios = Matrix::zeros(n, edge_count);
    if edge_count == 0 {
        return Ok(Routing::from_ratios(n, edge_count, ratios))
    }
    for destination in 0..n {
        let paths = network.shortest_paths_to(destination, weights)?;
        let dist = &paths.dist;
        let row = ratios.row_mut(destination)?;
        for (node,tree_edge) in paths.next_hop.iter().enumerate() {
            let Some(tree_edge) = *tree_edge else {continue};
            let mut scores = Vec::with_capacity(network.out_edges(node).len());
            for &edge in network.out_edges(node) {
                let next = network.edges()[edge].target;
                if edge == tree_edge || dist[next] < dist[node] {
                    scores.push((edge,-gamma*(weights[edge] + dist[next])));
                }
            }
            let top = scores.iter().map(|(_,s)| *s).fold(f64::NEG_INFINITY, f64::max);
            let total:f64 = scores.iter().map(|(_,s)| (s - top).exp()).sum();
            for (edge,score) in scores {
                row[edge] = (score - top).exp()/total;
            }
        }
    }
    Ok(Routing::from_ratios(n, edge_count, ratios))
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::resolve;
    use crate::dsa::graph::Network;
    use crate::error::DdrError;
    use crate::routing::RATIO_TOLERANCE;
    use crate::routing::utilization::utilization;
    use crate::traffic::DemandMatrix;

    // full mesh on 4 nodes plus a 4 -> 0 spur
    fn mesh() -> Network {
        let mut net = Network::new("mesh", 5);
        for a in 0..4 {
            for b in a+1..4 {
                net.add_link(a, b, 10.0).unwrap();
            }
        }
        net.add_directed_link(4, 0, 10.0).unwrap();
        net
    }

    #[test]
    fn test_equal_paths_split_evenly() {
        // square 0-1-2-3-0, two equal paths from 0 to 2
        let mut net = Network::new("square", 4);
        for i in 0..4 {
            net.add_link(i, (i+1)%4, 1.0).unwrap();
        }
        let routing = resolve(&net, &vec![1.0;net.edge_count()], 1.0).unwrap();
        let from_zero:Vec<f64> = net.out_edges(0).iter().map(|e| routing.ratio(2, *e)).collect();
        assert_eq!(from_zero.len(),2);
        assert!((from_zero[0] - 0.5).abs() < 1e-12);
        assert!((from_zero[1] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_softmin_prefers_cheaper_edge() {
        // 0 -> 2 directly (w=3) or 0 -> 1 -> 2 (w=1+1)
        let mut net = Network::new("tri", 3);
        net.add_directed_link(0, 2, 1.0).unwrap();
        net.add_directed_link(0, 1, 1.0).unwrap();
        net.add_directed_link(1, 2, 1.0).unwrap();
        let routing = resolve(&net, &[3.0,1.0,1.0], 1.0).unwrap();
        // both edges are downhill: dist(0)=2, dist(1)=1, dist(2)=0
        let direct = routing.ratio(2, 0);
        let detour = routing.ratio(2, 1);
        let e = std::f64::consts::E;
        assert!((direct - 1.0/(1.0 + e)).abs() < 1e-12);
        assert!((detour - e/(1.0 + e)).abs() < 1e-12);
        assert_eq!(routing.ratio(2, 2),1.0);
    }

    #[test]
    fn test_unreachable_nodes_get_no_ratios() {
        let net = mesh();
        let routing = resolve(&net, &vec![1.0;net.edge_count()], 1.0).unwrap();
        // nothing reaches node 4
        for node in 0..4 {
            assert_eq!(routing.outgoing_mass(&net, node, 4),0.0);
        }
        assert!((routing.outgoing_mass(&net, 4, 2) - 1.0).abs() < RATIO_TOLERANCE);
    }

    #[test]
    fn test_rejects_bad_weights() {
        let net = mesh();
        let mut weights = vec![1.0;net.edge_count()];
        weights[3] = 0.0;
        assert!(matches!(resolve(&net, &weights, 1.0),Err(DdrError::InvalidRouting(_))));
        weights[3] = f64::INFINITY;
        assert!(resolve(&net, &weights, 1.0).is_err());
        assert!(resolve(&net, &[1.0], 1.0).is_err());
    }

    #[test]
    fn test_absorbed_weight_keeps_tree_edge() {
        // 0 - 1 - 2, dist(0) rounds to dist(1)
        let mut net = Network::new("line", 3);
        net.add_link(0, 1, 1.0).unwrap();
        net.add_link(1, 2, 1.0).unwrap();
        let routing = resolve(&net, &[1e-20,1.0,1.0,1.0], 1.0).unwrap();
        assert_eq!(routing.ratio(2, 0),1.0);
        assert_eq!(routing.ratio(2, 2),1.0);
        let demand = DemandMatrix::from_rows(&[[0.0,0.0,3.0],[0.0,0.0,0.0],[0.0,0.0,0.0]]).unwrap();
        assert_eq!(utilization(&net, &demand, &routing).unwrap().max,3.0);
    }

    proptest! {
        #[test]
        fn softmin_is_loop_free_and_normalized(
            weights in proptest::collection::vec(prop_oneof![1e-20f64..1e-12, 0.01f64..100.0], 13),
            gamma in 0.1f64..10.0,
        ) {
            let net = mesh();
            prop_assert_eq!(net.edge_count(),13);
            let routing = resolve(&net, &weights, gamma).unwrap();
            for destination in 0..4 {
                for node in (0..5).filter(|n| *n != destination) {
                    let mass = routing.outgoing_mass(&net, node, destination);
                    prop_assert!((mass - 1.0).abs() < RATIO_TOLERANCE);
                }
            }
            let mut rows = vec![vec![1.0;5];5];
            for (i,row) in rows.iter_mut().enumerate() {
                row[i] = 0.0;
                row[4] = 0.0;
            }
            let demand = DemandMatrix::from_rows(&rows).unwrap();
            prop_assert!(utilization(&net, &demand, &routing).is_ok());
        }
    }
}
