//! Optimal (OPT) maximum link utilization.
//!
//! The classical multi-commodity flow program, one commodity per destination:
//!
//! ```text
//! minimize    u
//! subject to  sum_out f[e][d] - sum_in f[e][d] = demand(n, d)   for every d, every n != d
//!             sum_{e in link} sum_d f[e][d] <= capacity(link) * u   for every link
//!             f >= 0, 0 <= u (<= 1 when capacities are hard)
//! ```
//!
//! The program is built as a backend neutral [`LinearProgram`] and handed to
//! any [`LinearSolver`]; [`backend::GoodLpSolver`] is the default.

pub mod backend;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dsa::graph::Network;
use crate::error::{DdrError, Result};
use crate::traffic::DemandMatrix;

pub use backend::GoodLpSolver;

pub type VariableId = usize;

#[derive(Clone,Copy,Debug,PartialEq)]
pub struct Bounds {
    pub lower:f64,
    pub upper:Option<f64>,
}

#[derive(Clone,Copy,Debug,PartialEq,Eq)]
pub enum Relation {
    Equal,
    LessOrEqual,
}

#[derive(Clone,Debug,PartialEq)]
pub struct Row {
    pub terms:Vec<(VariableId,f64)>,
    pub relation:Relation,
    pub rhs:f64,
}

/// A minimization problem over bounded continuous variables.
#[derive(Clone,Debug,Default,PartialEq)]
pub struct LinearProgram {
    bounds:Vec<Bounds>,
    rows:Vec<Row>,
    objective:Vec<(VariableId,f64)>,
}

impl LinearProgram {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn add_variable(&mut self,lower:f64,upper:Option<f64>) -> VariableId {
        self.bounds.push(Bounds { lower, upper });
        self.bounds.len() - 1
    }
    pub fn add_row(&mut self,terms:Vec<(VariableId,f64)>,relation:Relation,rhs:f64) {
        debug_assert!(terms.iter().all(|(v,_)| *v < self.bounds.len()));
        self.rows.push(Row { terms, relation, rhs });
    }
    pub fn minimize(&mut self,objective:Vec<(VariableId,f64)>) {
        self.objective = objective;
    }
    pub fn bounds(&self) -> &[Bounds] {
        &self.bounds
    }
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }
    pub fn objective(&self) -> &[(VariableId,f64)] {
        &self.objective
    }
    pub fn variable_count(&self) -> usize {
        self.bounds.len()
    }
}

/// What a backend reports back.
#[derive(Clone,Copy,Debug,PartialEq)]
pub enum LpStatus {
    Optimal{objective:f64},
    Infeasible,
    Unbounded,
}

/// Any correct LP engine. `Err` is reserved for the engine itself failing,
/// infeasibility is a status.
pub trait LinearSolver {
    fn solve(&self,program:&LinearProgram) -> Result<LpStatus>;
}

impl<S:LinearSolver + ?Sized> LinearSolver for Box<S> {
    fn solve(&self,program:&LinearProgram) -> Result<LpStatus> {
        (**self).solve(program)
    }
}

#[derive(Clone,Copy,Debug,PartialEq,Serialize,Deserialize)]
pub struct SolverOptions {
    /// Bound utilization by one, demand that does not fit is infeasible.
    pub enforce_capacity:bool,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self { enforce_capacity: true }
    }
}

/// The formulated program and the id of its utilization variable.
pub struct MinMaxUtilization {
    pub program:LinearProgram,
    pub utilization:VariableId,
}

pub fn formulate(network:&Network,demand:&DemandMatrix,options:&SolverOptions) -> Result<MinMaxUtilization> {
    let n = network.node_count();
    if demand.node_count() != n {
        return Err(DdrError::config(format!(
            "demand covers {} nodes, network has {n}",demand.node_count()
        )))
    }
    let mut program = LinearProgram::new();
    let utilization = program.add_variable(0.0, options.enforce_capacity.then_some(1.0));
    // per link, every (variable, 1.0) that loads it
    let mut link_terms:Vec<Vec<(VariableId,f64)>> = vec![vec![];network.link_count()];

    for destination in (0..n).filter(|d| demand.demand_toward(*d) > 0.0) {
        let flow:Vec<VariableId> = (0..network.edge_count())
            .map(|_| program.add_variable(0.0, None))
            .collect();
        for (edge,e) in network.edges().iter().enumerate() {
            link_terms[e.link].push((flow[edge],1.0));
        }
        for node in (0..n).filter(|node| *node != destination) {
            let mut terms:Vec<(VariableId,f64)> = network.out_edges(node).iter().map(|e| (flow[*e],1.0)).collect();
            terms.extend(network.in_edges(node).iter().map(|e| (flow[*e],-1.0)));
            let rhs = demand.get(node, destination).unwrap_or(0.0);
            if terms.is_empty() {
                // an isolated node cannot send anything
                if rhs > 0.0 {
                    return Err(DdrError::InfeasibleDemand { total_demand: demand.total() })
                }
                continue
            }
            program.add_row(terms, Relation::Equal, rhs);
        }
    }
    for (link,mut terms) in link_terms.into_iter().enumerate() {
        if terms.is_empty() {continue}
        terms.push((utilization,-network.links()[link].capacity));
        program.add_row(terms, Relation::LessOrEqual, 0.0);
    }
    program.minimize(vec![(utilization,1.0)]);
    Ok(MinMaxUtilization { program, utilization })
}

pub fn interpret(status:LpStatus,total_demand:f64) -> Result<f64> {
    match status {
        LpStatus::Optimal { objective } => Ok(objective.max(0.0)),
        LpStatus::Infeasible => Err(DdrError::InfeasibleDemand { total_demand }),
        LpStatus::Unbounded => Err(DdrError::Solver("min-max utilization program reported unbounded".into())),
    }
}

/// Minimum achievable maximum link utilization for `demand`.
pub fn optimal_utilization<S:LinearSolver + ?Sized>(
    network:&Network,
    demand:&DemandMatrix,
    solver:&S,
    options:&SolverOptions,
) -> Result<f64> {
    let total_demand = demand.total();
    if demand.node_count() == network.node_count() && total_demand <= 0.0 {
        return Ok(0.0)
    }
    let formulated = formulate(network, demand, options)?;
    debug!(
        variables = formulated.program.variable_count(),
        rows = formulated.program.rows().len(),
        total_demand,
        "solving min-max utilization"
    );
    let status = solver.solve(&formulated.program)?;
    interpret(status, total_demand)
}
