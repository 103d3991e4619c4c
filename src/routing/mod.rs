//! Routing representations and their resolution into per destination
//! splitting ratios.
//!
//! A learner acts either with explicit splitting ratios or with one weight
//! per edge. Either way the [`RoutingScheme`] in use turns the action into
//! a [`Routing`]: for every destination, the fraction of a node's traffic
//! sent over each of its outgoing edges.

pub mod oblivious;
pub mod softmin;
pub mod splitting;
pub mod utilization;

use serde::{Deserialize, Serialize};

use crate::dsa::graph::{EdgeId, Network, NodeId};
use crate::error::{DdrError, Result};
use crate::linear_algebra::matrix::Matrix;

pub use utilization::{LinkUtilization, utilization};

/// Tolerance on splitting ratio sums.
pub const RATIO_TOLERANCE:f64 = 1e-6;

/// Destination splitting routing. Row `d` holds, per edge, the share of the
/// edge source's traffic toward `d` that the edge carries.
#[derive(Clone,Debug,PartialEq)]
pub struct Routing {
    node_count:usize,
    edge_count:usize,
    ratios:Matrix,
}

impl Routing {
    pub(crate) fn from_ratios(node_count:usize,edge_count:usize,ratios:Matrix) -> Self {
        debug_assert!(ratios.is_empty() || ratios.dimension() == (node_count,edge_count));
        Self { node_count, edge_count, ratios }
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn ratio(&self,destination:NodeId,edge:EdgeId) -> f64 {
        self.ratios.get(destination, edge).unwrap_or(0.0)
    }

    pub fn ratios_toward(&self,destination:NodeId) -> &[f64] {
        self.ratios.row(destination).unwrap_or(&[])
    }

    /// Sum of the ratios on `node`'s outgoing edges toward `destination`.
    pub fn outgoing_mass(&self,network:&Network,node:NodeId,destination:NodeId) -> f64 {
        network.out_edges(node).iter().map(|e| self.ratio(destination, *e)).sum()
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        (0..self.node_count).map(|d| {
            let row = self.ratios_toward(d);
            if row.is_empty() {vec![0.0;self.edge_count]} else {row.to_vec()}
        }).collect()
    }
}

/// Raw learner output.
#[derive(Clone,Debug,PartialEq,Serialize,Deserialize)]
#[serde(tag = "kind", content = "values", rename_all = "snake_case")]
pub enum Action {
    /// `ratios[destination][edge]`, applied at the edge's source node.
    Splitting(Vec<Vec<f64>>),
    /// One weight per edge.
    EdgeWeights(Vec<f64>),
}

impl Action {
    pub fn kind(&self) -> &'static str {
        match self {
            Action::Splitting(_) => "splitting",
            Action::EdgeWeights(_) => "edge_weights",
        }
    }
}

// what to do with splitting ratios whose per node sum is off 1
#[derive(Clone,Copy,Debug,Default,PartialEq,Eq,Serialize,Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalization {
    #[default]
    Strict,
    Lenient,
}

fn default_gamma() -> f64 {
    1.0
}

#[derive(Clone,Debug,PartialEq,Serialize,Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RoutingScheme {
    DestinationSplitting {
        #[serde(default)]
        normalization:Normalization,
    },
    Softmin {
        #[serde(default = "default_gamma")]
        gamma:f64,
    },
}

impl Default for RoutingScheme {
    fn default() -> Self {
        Self::DestinationSplitting { normalization: Normalization::Strict }
    }
}

impl RoutingScheme {
    pub fn softmin() -> Self {
        Self::Softmin { gamma: default_gamma() }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Self::DestinationSplitting{..} => Ok(()),
            Self::Softmin { gamma } => {
                if !gamma.is_finite() || *gamma <= 0.0 {
                    return Err(DdrError::config(format!("softmin gamma {gamma} must be finite and positive")))
                }
                Ok(())
            }
        }
    }

    /// Turns `action` into a loop checked, flow ready [`Routing`]. Pure.
    pub fn resolve(&self,action:&Action,network:&Network) -> Result<Routing> {
        match (self, action) {
            (Self::DestinationSplitting { normalization }, Action::Splitting(ratios)) => {
                splitting::resolve(network, ratios, *normalization)
            }
            (Self::Softmin { gamma }, Action::EdgeWeights(weights)) => {
                softmin::resolve(network, weights, *gamma)
            }
            (scheme, action) => Err(DdrError::routing(format!(
                "{} action given to {} routing", action.kind(), scheme.label()
            ))),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::DestinationSplitting{..} => "destination_splitting",
            Self::Softmin{..} => "softmin",
        }
    }
}
