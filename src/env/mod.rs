//! Environment core: the reset/step cycle a learning harness drives.
//!
//! Every step pulls one demand matrix into the bounded memory, resolves the
//! learner's action into a routing, and scores that routing on the oldest
//! matrix still in the window against the optimal routing for it.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::EnvConfig;
use crate::dsa::graph::Network;
use crate::error::{DdrError, Result};
use crate::optimal::{GoodLpSolver, LinearSolver, SolverOptions, optimal_utilization};
use crate::routing::oblivious::shortest_path_ecmp;
use crate::routing::{Action, Routing, RoutingScheme, utilization};
use crate::traffic::{DemandMatrix, DemandMemory, DemandSequence, GeneratorSpec};

#[derive(Clone,Copy,Debug,PartialEq,Eq)]
pub enum EnvState {
    Uninitialized,
    Ready,
    Stepping,
    Done,
}

/// Utilizations behind one reward.
#[derive(Clone,Copy,Debug,PartialEq,Serialize,Deserialize)]
pub struct StepInfo {
    pub utilization:f64,
    pub opt_utilization:f64,
    pub oblivious_utilization:f64,
}

#[derive(Clone,Debug)]
pub struct Step {
    pub observation:Vec<DemandMatrix>,
    pub reward:f64,
    pub done:bool,
    pub info:StepInfo,
}

/// `actual / optimal`, one when both vanish. `None` when only the optimum
/// does, which no correct solver reports.
pub fn utilization_ratio(actual:f64,optimal:f64) -> Option<f64> {
    if optimal > 0.0 {
        Some(actual/optimal)
    } else if actual <= 0.0 {
        Some(1.0)
    } else {
        None
    }
}

pub struct DdrEnv<S = GoodLpSolver> {
    network:Arc<Network>,
    generator:GeneratorSpec,
    sequence:Option<DemandSequence>,
    memory:DemandMemory,
    scheme:RoutingScheme,
    solver:S,
    options:SolverOptions,
    oblivious:Routing,
    state:EnvState,
}

impl DdrEnv<GoodLpSolver> {
    pub fn new(
        network:impl Into<Arc<Network>>,
        generator:GeneratorSpec,
        memory_length:usize,
        scheme:RoutingScheme,
    ) -> Result<Self> {
        let network = network.into();
        if memory_length == 0 {
            return Err(DdrError::config("memory length must be at least 1"))
        }
        generator.validate()?;
        scheme.validate()?;
        if generator.node_count() != network.node_count() {
            return Err(DdrError::config(format!(
                "generator produces {} node demand, network {} has {} nodes",
                generator.node_count(),network.name(),network.node_count()
            )))
        }
        let oblivious = shortest_path_ecmp(&network)?;
        Ok(Self {
            network,
            generator,
            sequence:None,
            memory:DemandMemory::new(memory_length),
            scheme,
            solver:GoodLpSolver,
            options:SolverOptions::default(),
            oblivious,
            state:EnvState::Uninitialized,
        })
    }

    pub fn from_config(network:impl Into<Arc<Network>>,config:&EnvConfig) -> Result<Self> {
        config.validate()?;
        let mut env = Self::new(network, config.generator.clone(), config.memory_length, config.routing.clone())?;
        env.options = config.solver;
        Ok(env)
    }
}

impl<S> DdrEnv<S> {
    /// Swaps the LP backend. Keeps the current state and window.
    pub fn with_solver<T:LinearSolver>(self,solver:T) -> DdrEnv<T> {
        DdrEnv {
            network:self.network,
            generator:self.generator,
            sequence:self.sequence,
            memory:self.memory,
            scheme:self.scheme,
            solver,
            options:self.options,
            oblivious:self.oblivious,
            state:self.state,
        }
    }

    pub fn with_options(mut self,options:SolverOptions) -> Self {
        self.options = options;
        self
    }

    pub fn state(&self) -> EnvState {
        self.state
    }

    pub fn memory(&self) -> &DemandMemory {
        &self.memory
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn shared_network(&self) -> Arc<Network> {
        Arc::clone(&self.network)
    }

    pub fn scheme(&self) -> &RoutingScheme {
        &self.scheme
    }

    pub fn oblivious_routing(&self) -> &Routing {
        &self.oblivious
    }

    /// The window as one flat `(len, N, N)` tensor, oldest first.
    pub fn observation(&self) -> Vec<f64> {
        self.memory.stacked()
    }
}

impl<S:LinearSolver> DdrEnv<S> {
    /// Starts a fresh demand sequence; the window holds exactly its first matrix.
    pub fn reset(&mut self) -> Result<Vec<DemandMatrix>> {
        let mut sequence = self.generator.build()?;
        let first = sequence.next()
            .ok_or_else(|| DdrError::config("demand sequence produced nothing on reset"))?;
        self.memory.reset_with(first);
        self.sequence = Some(sequence);
        self.state = EnvState::Ready;
        info!(
            network = self.network.name(),
            generator = self.generator.label(),
            routing = self.scheme.label(),
            memory_length = self.memory.capacity(),
            "environment reset"
        );
        Ok(self.memory.snapshot())
    }

    pub fn step(&mut self,action:&Action) -> Result<Step> {
        match self.state {
            EnvState::Ready | EnvState::Stepping => {}
            state => return Err(DdrError::NotReady(state)),
        }
        let routing = self.scheme.resolve(action, &self.network)?;

        let next = self.sequence.as_mut().and_then(|s| s.next());
        let done = next.is_none();
        let mut window = self.memory.clone();
        if let Some(matrix) = next {
            window.push(matrix);
        }
        let target = window.oldest()
            .ok_or_else(|| DdrError::config("demand memory is empty"))?;
        let info = self.score(target, &routing)?;
        let ratio = utilization_ratio(info.utilization, info.opt_utilization)
            .ok_or_else(|| DdrError::Solver(format!(
                "optimal utilization is zero while routing reaches {}",info.utilization
            )))?;
        let reward = -ratio;

        self.memory = window;
        if done {
            self.state = EnvState::Done;
            info!(network = self.network.name(), "demand sequence exhausted");
        } else {
            self.state = EnvState::Stepping;
        }
        debug!(
            reward,
            utilization = info.utilization,
            opt_utilization = info.opt_utilization,
            oblivious_utilization = info.oblivious_utilization,
            window = self.memory.len(),
            "step"
        );
        Ok(Step { observation: self.memory.snapshot(), reward, done, info })
    }

    fn score(&self,demand:&DemandMatrix,routing:&Routing) -> Result<StepInfo> {
        // infeasible demand takes precedence over routing errors
        let opt = optimal_utilization(&self.network, demand, &self.solver, &self.options)?;
        let actual = utilization(&self.network, demand, routing)?;
        let oblivious = utilization(&self.network, demand, &self.oblivious)?;
        Ok(StepInfo {
            utilization:actual.max,
            opt_utilization:opt,
            oblivious_utilization:oblivious.max,
        })
    }
}
