use serde::{Deserialize, Serialize};

use crate::dsa::dag::ForwardingGraph;
use crate::dsa::graph::Network;
use crate::error::{DdrError, Result};
use crate::routing::Routing;
use crate::traffic::DemandMatrix;

/// Load on every link for one (demand, routing) pair.
#[derive(Clone,Debug,PartialEq,Serialize,Deserialize)]
pub struct LinkUtilization {
    /// Maximum link utilization, zero for a network without links.
    pub max:f64,
    pub per_link:Vec<f64>,
    pub link_flow:Vec<f64>,
}

/// Total flow per edge, summed over destinations.
///
/// Each destination is handled on its own forwarding graph, the edges with a
/// positive ratio toward it. Traffic is pushed layer by layer in topological
/// order, so every node forwards its full inflow exactly once.
pub fn edge_flows(network:&Network,demand:&DemandMatrix,routing:&Routing) -> Result<Vec<f64>> {
    let n = network.node_count();
    if demand.node_count() != n {
        return Err(DdrError::config(format!(
            "demand covers {} nodes, network has {n}",demand.node_count()
        )))
    }
    if routing.node_count() != n || routing.edge_count() != network.edge_count() {
        return Err(DdrError::routing(format!(
            "routing is for {} nodes and {} edges, network has {n} and {}",
            routing.node_count(),routing.edge_count(),network.edge_count()
        )))
    }
    let mut flows = vec![0.0;network.edge_count()];
    for destination in 0..n {
        if demand.demand_toward(destination) <= 0.0 {continue}
        let ratios = routing.ratios_toward(destination);

        let mut forwarding = ForwardingGraph::with_nodes(n);
        for (edge,e) in network.edges().iter().enumerate() {
            if e.source != destination && ratios.get(edge).is_some_and(|r| *r > 0.0) {
                forwarding.push_pair(e.source, e.target);
            }
        }
        let layers = forwarding.topological_sort()
            .map_err(|(_,nodes)| DdrError::RoutingCycle { destination, nodes })?;

        let mut traffic:Vec<f64> = (0..n).map(|source| demand.get(source, destination).unwrap_or(0.0)).collect();
        for node in layers.into_iter().flatten() {
            let held = traffic[node];
            if node == destination || held <= 0.0 {continue}
            if routing.outgoing_mass(network, node, destination) <= 0.0 {
                return Err(DdrError::routing(format!(
                    "node {node} holds {held} toward {destination} but has no outgoing ratio"
                )))
            }
            for &edge in network.out_edges(node) {
                let ratio = ratios[edge];
                if ratio <= 0.0 {continue}
                let carried = held*ratio;
                flows[edge] += carried;
                traffic[network.edges()[edge].target] += carried;
            }
        }
    }
    Ok(flows)
}

pub fn utilization(network:&Network,demand:&DemandMatrix,routing:&Routing) -> Result<LinkUtilization> {
    let flows = edge_flows(network, demand, routing)?;
    let mut link_flow = vec![0.0;network.link_count()];
    for (edge,flow) in flows.iter().enumerate() {
        link_flow[network.edges()[edge].link] += flow;
    }
    let per_link:Vec<f64> = link_flow.iter().zip(network.links())
        .map(|(flow,link)| flow/link.capacity)
        .collect();
    let max = per_link.iter().copied().fold(0.0, f64::max);
    Ok(LinkUtilization { max, per_link, link_flow })
}
