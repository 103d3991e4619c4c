use tracing::warn;

use crate::dsa::graph::Network;
use crate::error::{DdrError, Result};
use crate::linear_algebra::matrix::Matrix;
use crate::routing::{Normalization, RATIO_TOLERANCE, Routing};

// Checks or renormalizes explicit splitting ratios. Ratios on the
// destination's own outgoing edges are dropped, traffic there is delivered.
pub(crate) fn resolve(network:&Network,ratios:&[Vec<f64>],normalization:Normalization) -> Result<Routing> {
    let n = network.node_count();
    let edge_count = network.edge_count();
    if ratios.len() != n {
        return Err(DdrError::routing(format!("expected ratios for {n} destinations, got {}",ratios.len())))
    }
    if let Some((destination,row)) = ratios.iter().enumerate().find(|(_,row)| row.len() != edge_count) {
        return Err(DdrError::routing(format!(
            "destination {destination} has {} ratios, network has {edge_count} edges",row.len()
        )))
    }
    let mut resolved = Matrix::zeros(n, edge_count);
    if edge_count == 0 {
        return Ok(Routing::from_ratios(n, edge_count, resolved))
    }
    for (destination,row) in ratios.iter().enumerate() {
        let out = resolved.row_mut(destination)?;
        for node in (0..n).filter(|node| *node != destination) {
            let edges = network.out_edges(node);
            if edges.is_empty() {continue}
            let mut sum = 0.0;
            for &edge in edges {
                let ratio = row[edge];
                if !ratio.is_finite() || ratio < 0.0 {
                    return Err(DdrError::routing(format!(
                        "ratio {ratio} on edge {edge} toward {destination} is not a finite non-negative number"
                    )))
                }
                sum += ratio;
            }
            let off = (sum - 1.0).abs() > RATIO_TOLERANCE;
            match normalization {
                Normalization::Strict if off => {
                    return Err(DdrError::routing(format!(
                        "ratios at node {node} toward {destination} sum to {sum}, expected 1"
                    )))
                }
                Normalization::Strict => {
                    for &edge in edges {
                        out[edge] = row[edge];
                    }
                }
                Normalization::Lenient => {
                    if off {
                        warn!(node, destination, sum, "renormalizing splitting ratios");
                    }
                    for &edge in edges {
                        out[edge] = if sum > 0.0 {row[edge]/sum} else {1.0/edges.len() as f64};
                    }
                }
            }
        }
    }
    Ok(Routing::from_ratios(n, edge_count, resolved))
}

#[cfg(test)]
mod tests {
    use super::resolve;
    use crate::dsa::graph::Network;
    use crate::error::DdrError;
    use crate::routing::Normalization;

    // 0 -> 1 (e0), 0 -> 2 (e1), 1 -> 2 (e2)
    fn fork() -> Network {
        let mut net = Network::new("fork", 3);
        net.add_directed_link(0, 1, 1.0).unwrap();
        net.add_directed_link(0, 2, 1.0).unwrap();
        net.add_directed_link(1, 2, 1.0).unwrap();
        net
    }

    #[test]
    fn test_strict_accepts_valid() {
        let net = fork();
        let ratios = vec![vec![0.0,0.0,1.0],vec![1.0,0.0,0.7],vec![0.25,0.75,1.0]];
        let routing = resolve(&net, &ratios, Normalization::Strict).unwrap();
        assert_eq!(routing.ratio(2,1),0.75);
        assert!((routing.outgoing_mass(&net, 0, 2) - 1.0).abs() < 1e-12);
        // node 1 ratios toward destination 1 are dropped
        assert_eq!(routing.ratio(1,2),0.0);
    }

    #[test]
    fn test_strict_rejects_bad_sum() {
        let net = fork();
        let ratios = vec![vec![0.0,0.0,1.0],vec![1.0,0.0,0.0],vec![0.5,0.25,1.0]];
        let err = resolve(&net, &ratios, Normalization::Strict).unwrap_err();
        assert!(matches!(err,DdrError::InvalidRouting(_)));
    }

    #[test]
    fn test_lenient_renormalizes() {
        let net = fork();
        let ratios = vec![vec![0.0;3],vec![0.0,0.0,0.0],vec![1.0,3.0,0.5]];
        let routing = resolve(&net, &ratios, Normalization::Lenient).unwrap();
        assert_eq!(routing.ratio(2,0),0.25);
        assert_eq!(routing.ratio(2,1),0.75);
        assert_eq!(routing.ratio(2,2),1.0);
        // all zero splits evenly
        assert_eq!(routing.ratio(1,0),0.5);
        assert_eq!(routing.ratio(1,1),0.5);
    }

    #[test]
    fn test_rejects_negative_and_shape() {
        let net = fork();
        let negative = vec![vec![0.0;3],vec![1.0,0.0,0.0],vec![1.5,-0.5,1.0]];
        assert!(resolve(&net, &negative, Normalization::Lenient).is_err());
        assert!(resolve(&net, &vec![vec![0.0;3];2], Normalization::Lenient).is_err());
        assert!(resolve(&net, &vec![vec![0.0;2];3], Normalization::Lenient).is_err());
    }
}
