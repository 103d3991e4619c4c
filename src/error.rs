use thiserror::Error;

use crate::dsa::graph::{GraphError, NodeId};
use crate::env::EnvState;
use crate::linear_algebra::matrix::MatrixError;

#[derive(Error,Debug)]
pub enum DdrError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("invalid routing: {0}")]
    InvalidRouting(String),
    #[error("routing toward destination {destination} loops through nodes {nodes:?}")]
    RoutingCycle{destination:NodeId,nodes:Vec<NodeId>},
    #[error("demand of {total_demand} cannot be routed within link capacities")]
    InfeasibleDemand{total_demand:f64},
    #[error("linear program solver failed: {0}")]
    Solver(String),
    #[error("environment is {0:?}, reset it before stepping")]
    NotReady(EnvState),
    #[error(transparent)]
    Matrix(#[from] MatrixError),
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T,DdrError>;

impl DdrError {
    pub(crate) fn config(reason:impl Into<String>) -> Self {
        Self::Configuration(reason.into())
    }
    pub(crate) fn routing(reason:impl Into<String>) -> Self {
        Self::InvalidRouting(reason.into())
    }
}
