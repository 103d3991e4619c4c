//! Data driven routing simulation.
//!
//! Demand matrices come from a [`traffic::GeneratorSpec`], a learner's
//! [`routing::Action`] is resolved into per destination splitting ratios,
//! and the resulting maximum link utilization is compared with the optimum
//! of a multi-commodity flow program. [`env::DdrEnv`] wraps all of it in a
//! reset/step cycle with reward `-(actual / optimal)`.

pub mod config;
pub mod dsa;
pub mod env;
pub mod error;
pub mod evaluation;
pub mod linear_algebra;
pub mod optimal;
pub mod routing;
pub mod traffic;

pub use config::EnvConfig;
pub use dsa::graph::Network;
pub use env::{DdrEnv, EnvState, Step, StepInfo};
pub use error::{DdrError, Result};
pub use optimal::{GoodLpSolver, LinearSolver, SolverOptions, optimal_utilization};
pub use routing::{Action, LinkUtilization, Routing, RoutingScheme, utilization};
pub use traffic::{DemandMatrix, DemandMemory, DemandModel, GeneratorSpec};
