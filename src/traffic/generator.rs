use std::f64::consts::PI;

use rand::{Rng, SeedableRng, distr::{Distribution, Uniform}, rngs::StdRng};
use rand_distr::{Exp1, Normal};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DdrError, Result};
use crate::linear_algebra::matrix::Matrix;
use crate::traffic::demand::DemandMatrix;

/// A lazy, possibly infinite run of demand matrices.
pub type DemandSequence = Box<dyn Iterator<Item = DemandMatrix> + Send>;

fn one() -> f64 {
    1.0
}

#[derive(Clone,Debug,PartialEq,Serialize,Deserialize)]
pub struct LoadMode {
    pub mean:f64,
    pub std_dev:f64,
}

#[derive(Clone,Debug,PartialEq,Serialize,Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DemandModel {
    /// Every entry i.i.d. uniform in `[low, high]`.
    Uniform {
        seed:u64,
        #[serde(default)]
        low:f64,
        #[serde(default = "one")]
        high:f64,
    },
    /// `m_i * m_j / distance(i, j)`, scaled so the off-diagonal sums to `total_demand`.
    /// Masses are redrawn from Exp(1) each step unless fixed.
    Gravity {
        seed:u64,
        total_demand:f64,
        #[serde(default)]
        masses:Option<Vec<f64>>,
        #[serde(default)]
        distances:Option<Vec<Vec<f64>>>,
    },
    /// Base pattern times `1 + amplitude * sin(2 pi t / period)`.
    Cyclic {
        seed:u64,
        period:usize,
        amplitude:f64,
        #[serde(default)]
        base:Option<DemandMatrix>,
    },
    /// Each entry picks the high mode with `high_probability`, then draws
    /// from that mode's normal distribution, clamped at zero.
    Bimodal {
        seed:u64,
        high_probability:f64,
        low:LoadMode,
        high:LoadMode,
    },
    /// Plays back fixed matrices in order.
    Replay {
        matrices:Vec<DemandMatrix>,
        #[serde(default)]
        cycle:bool,
    },
}

/// Factory for demand sequences. Every [`GeneratorSpec::build`] starts a
/// fresh sequence from the same seed.
#[derive(Clone,Debug,PartialEq,Serialize,Deserialize)]
pub struct GeneratorSpec {
    pub shape:[usize;2],
    #[serde(default)]
    pub length:Option<usize>,
    #[serde(flatten)]
    pub model:DemandModel,
}

impl GeneratorSpec {
    pub fn new(node_count:usize,model:DemandModel) -> Self {
        Self { shape: [node_count,node_count], length: None, model }
    }

    pub fn with_length(mut self,length:usize) -> Self {
        self.length = Some(length);
        self
    }

    pub fn node_count(&self) -> usize {
        self.shape[0]
    }

    pub fn label(&self) -> &'static str {
        match self.model {
            DemandModel::Uniform{..} => "uniform",
            DemandModel::Gravity{..} => "gravity",
            DemandModel::Cyclic{..} => "cyclic",
            DemandModel::Bimodal{..} => "bimodal",
            DemandModel::Replay{..} => "replay",
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.build().map(|_| ())
    }

    pub fn build(&self) -> Result<DemandSequence> {
        let [rows,cols] = self.shape;
        if rows != cols {
            return Err(DdrError::config(format!("demand shape must be square, got {rows}x{cols}")))
        }
        if rows == 0 {
            return Err(DdrError::config("demand shape must have at least one node"))
        }
        let n = rows;
        let sequence:DemandSequence = match &self.model {
            DemandModel::Uniform { seed, low, high } => {
                if !low.is_finite() || !high.is_finite() || *low < 0.0 || low > high {
                    return Err(DdrError::config(format!("uniform range [{low}, {high}] must satisfy 0 <= low <= high")))
                }
                let distribution = Uniform::new_inclusive(*low, *high)
                    .map_err(|e| DdrError::config(format!("uniform range [{low}, {high}]: {e}")))?;
                Box::new(UniformSequence { n, rng: StdRng::seed_from_u64(*seed), distribution })
            }
            DemandModel::Gravity { seed, total_demand, masses, distances } => {
                if !total_demand.is_finite() || *total_demand < 0.0 {
                    return Err(DdrError::config(format!("gravity total demand {total_demand} must be finite and non-negative")))
                }
                let masses = match masses {
                    Some(m) => {
                        if m.len() != n || m.iter().any(|v| !v.is_finite() || *v < 0.0) {
                            return Err(DdrError::config(format!("gravity needs {n} finite non-negative masses")))
                        }
                        Some(m.clone())
                    }
                    None => None,
                };
                if *total_demand > 0.0 {
                    let senders = match &masses {
                        Some(m) => m.iter().filter(|v| **v > 0.0).count(),
                        None => n,
                    };
                    // the off-diagonal needs two positive masses to carry anything
                    if senders < 2 {
                        return Err(DdrError::config(format!(
                            "gravity total demand {total_demand} needs at least two nodes with positive mass"
                        )))
                    }
                }
                let distances = match distances {
                    Some(rows) => gravity_distances(rows, n)?,
                    None => Matrix::from_rows(&vec![vec![1.0;n];n])?,
                };
                Box::new(GravitySequence {
                    n, rng: StdRng::seed_from_u64(*seed), total_demand: *total_demand, masses, distances
                })
            }
            DemandModel::Cyclic { seed, period, amplitude, base } => {
                if *period == 0 {
                    return Err(DdrError::config("cyclic period must be at least 1"))
                }
                if !amplitude.is_finite() || !(0.0..=1.0).contains(amplitude) {
                    return Err(DdrError::config(format!("cyclic amplitude {amplitude} must be in [0, 1]")))
                }
                let base = match base {
                    Some(b) => {
                        if b.node_count() != n {
                            return Err(DdrError::config(format!("cyclic base is {0}x{0}, shape is {n}x{n}",b.node_count())))
                        }
                        b.clone()
                    }
                    None => {
                        let mut rng = StdRng::seed_from_u64(*seed);
                        let unit = Uniform::new_inclusive(0.0, 1.0)
                            .map_err(|e| DdrError::config(e.to_string()))?;
                        DemandMatrix::from_generated(Matrix::sample(n, n, &unit, &mut rng))
                    }
                };
                Box::new(CyclicSequence { base, period: *period, amplitude: *amplitude, step: 0 })
            }
            DemandModel::Bimodal { seed, high_probability, low, high } => {
                if !(0.0..=1.0).contains(high_probability) {
                    return Err(DdrError::config(format!("bimodal high probability {high_probability} must be in [0, 1]")))
                }
                let low = load_mode(low)?;
                let high = load_mode(high)?;
                Box::new(BimodalSequence {
                    n, rng: StdRng::seed_from_u64(*seed), high_probability: *high_probability, low, high
                })
            }
            DemandModel::Replay { matrices, cycle } => {
                if matrices.is_empty() {
                    return Err(DdrError::config("replay needs at least one matrix"))
                }
                if let Some(bad) = matrices.iter().find(|m| m.node_count() != n) {
                    return Err(DdrError::config(format!("replay matrix is {0}x{0}, shape is {n}x{n}",bad.node_count())))
                }
                if *cycle {
                    Box::new(matrices.clone().into_iter().cycle())
                } else {
                    Box::new(matrices.clone().into_iter())
                }
            }
        };
        debug!(kind = self.label(), nodes = n, length = ?self.length, "built demand sequence");
        Ok(match self.length {
            Some(length) => Box::new(sequence.take(length)),
            None => sequence,
        })
    }
}

fn gravity_distances(rows:&[Vec<f64>],n:usize) -> Result<Matrix> {
    let distances = Matrix::from_rows(rows)?;
    if distances.dimension() != (n,n) {
        return Err(DdrError::config(format!("gravity distances must be {n}x{n}")))
    }
    for (i,r) in distances.rows().enumerate() {
        for (j,d) in r.iter().enumerate() {
            if i != j && (!d.is_finite() || *d <= 0.0) {
                return Err(DdrError::config(format!("gravity distance ({i},{j}) = {d} must be finite and positive")))
            }
        }
    }
    Ok(distances)
}

fn load_mode(mode:&LoadMode) -> Result<Normal<f64>> {
    if !mode.mean.is_finite() {
        return Err(DdrError::config(format!("bimodal mean {} must be finite",mode.mean)))
    }
    if !(mode.std_dev.is_finite() && mode.std_dev >= 0.0) {
        return Err(DdrError::config(format!("bimodal std dev {} must be finite and non-negative",mode.std_dev)))
    }
    Normal::new(mode.mean, mode.std_dev)
        .map_err(|e| DdrError::config(format!("bimodal std dev {}: {e}",mode.std_dev)))
}

struct UniformSequence {
    n:usize,
    rng:StdRng,
    distribution:Uniform<f64>,
}

impl Iterator for UniformSequence {
    type Item = DemandMatrix;
    fn next(&mut self) -> Option<DemandMatrix> {
        let matrix = Matrix::sample(self.n, self.n, &self.distribution, &mut self.rng);
        Some(DemandMatrix::from_generated(matrix))
    }
}

struct GravitySequence {
    n:usize,
    rng:StdRng,
    total_demand:f64,
    masses:Option<Vec<f64>>,
    distances:Matrix,
}

impl Iterator for GravitySequence {
    type Item = DemandMatrix;
    fn next(&mut self) -> Option<DemandMatrix> {
        let n = self.n;
        let masses:Vec<f64> = match &self.masses {
            Some(m) => m.clone(),
            None => (0..n).map(|_| Exp1.sample(&mut self.rng)).collect(),
        };
        let distances = self.distances.elements();
        let mut matrix = Matrix::from_fn(n, n, |i,j| {
            if i == j {0.0} else {masses[i]*masses[j]/distances[i*n + j]}
        });
        let total = matrix.total();
        if total > 0.0 {
            matrix.scale(self.total_demand/total);
        }
        Some(DemandMatrix::from_generated(matrix))
    }
}

struct CyclicSequence {
    base:DemandMatrix,
    period:usize,
    amplitude:f64,
    step:usize,
}

impl Iterator for CyclicSequence {
    type Item = DemandMatrix;
    fn next(&mut self) -> Option<DemandMatrix> {
        let phase = 2.0*PI*(self.step % self.period) as f64/self.period as f64;
        let factor = (1.0 + self.amplitude*phase.sin()).max(0.0);
        self.step += 1;
        let mut matrix = self.base.as_matrix().clone();
        matrix.scale(factor);
        Some(DemandMatrix::from_generated(matrix))
    }
}

struct BimodalSequence {
    n:usize,
    rng:StdRng,
    high_probability:f64,
    low:Normal<f64>,
    high:Normal<f64>,
}

impl Iterator for BimodalSequence {
    type Item = DemandMatrix;
    fn next(&mut self) -> Option<DemandMatrix> {
        let matrix = Matrix::from_fn(self.n, self.n, |_,_| {
            let mode = if self.rng.random_bool(self.high_probability) {&self.high} else {&self.low};
            mode.sample(&mut self.rng).max(0.0)
        });
        Some(DemandMatrix::from_generated(matrix))
    }
}
