//! Episodic evaluation of a policy and the result records it produces.

pub mod log;
pub mod statistics;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::env::{DdrEnv, StepInfo, utilization_ratio};
use crate::error::{DdrError, Result};
use crate::optimal::LinearSolver;
use crate::routing::Action;
use crate::traffic::DemandMatrix;

pub use log::{ResultLog, read_records};
pub use statistics::Summary;

/// One evaluated demand sequence. Field names are what the analysis side reads.
#[derive(Clone,Debug,PartialEq,Serialize,Deserialize)]
pub struct EvaluationRecord {
    pub sequence_type:String,
    pub graphs:Vec<String>,
    pub utilisations:Vec<f64>,
    pub opt_utilisations:Vec<f64>,
    pub oblivious_utilisations:Vec<f64>,
}

impl EvaluationRecord {
    pub fn new(sequence_type:impl Into<String>,graphs:Vec<String>) -> Self {
        Self {
            sequence_type:sequence_type.into(),
            graphs,
            utilisations:vec![],
            opt_utilisations:vec![],
            oblivious_utilisations:vec![],
        }
    }

    pub fn push(&mut self,info:&StepInfo) {
        self.utilisations.push(info.utilization);
        self.opt_utilisations.push(info.opt_utilization);
        self.oblivious_utilisations.push(info.oblivious_utilization);
    }

    pub fn len(&self) -> usize {
        self.utilisations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utilisations.is_empty()
    }

    pub fn validate(&self) -> Result<()> {
        let len = self.utilisations.len();
        if self.opt_utilisations.len() != len || self.oblivious_utilisations.len() != len {
            return Err(DdrError::config(format!(
                "record '{}' has {} utilisations, {} optimal and {} oblivious",
                self.sequence_type,len,self.opt_utilisations.len(),self.oblivious_utilisations.len()
            )))
        }
        Ok(())
    }

    /// Policy utilization over optimal, per step.
    pub fn ratios(&self) -> Vec<f64> {
        ratios(&self.utilisations, &self.opt_utilisations)
    }

    pub fn oblivious_ratios(&self) -> Vec<f64> {
        ratios(&self.oblivious_utilisations, &self.opt_utilisations)
    }
}

// steps without a defined ratio are left out
fn ratios(values:&[f64],optimal:&[f64]) -> Vec<f64> {
    values.iter().zip(optimal)
        .filter_map(|(v,o)| utilization_ratio(*v, *o))
        .collect()
}

/// Resets `env` and runs `policy` for up to `steps` steps.
///
/// The step that reports exhaustion only rescores the final window and is
/// not recorded.
pub fn evaluate<S,P>(
    env:&mut DdrEnv<S>,
    mut policy:P,
    steps:usize,
    sequence_type:impl Into<String>,
) -> Result<EvaluationRecord>
where
    S:LinearSolver,
    P:FnMut(&[DemandMatrix]) -> Action,
{
    let mut record = EvaluationRecord::new(sequence_type, vec![env.network().name().to_string()]);
    let mut observation = env.reset()?;
    for _ in 0..steps {
        let action = policy(&observation);
        let step = env.step(&action)?;
        if step.done {break}
        record.push(&step.info);
        observation = step.observation;
    }
    let summary = Summary::of(&record.ratios());
    info!(
        sequence_type = %record.sequence_type,
        network = env.network().name(),
        steps = record.len(),
        mean_ratio = summary.map(|s| s.mean),
        "evaluation finished"
    );
    Ok(record)
}
