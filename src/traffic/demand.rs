use std::fmt::Display;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{DdrError, Result};
use crate::linear_algebra::matrix::Matrix;

/// Node pair traffic demand for one simulation step.
///
/// Square, zero diagonal, every entry finite and non-negative. Checked once
/// at construction, never mutated afterwards.
#[derive(Clone,Debug,PartialEq)]
pub struct DemandMatrix {
    inner:Matrix
}

impl DemandMatrix {
    pub fn new(matrix:Matrix) -> Result<Self> {
        let (row,col) = matrix.dimension();
        if row != col || matrix.is_empty() {
            return Err(DdrError::config(format!("demand matrix must be square and non-empty, got {row}x{col}")))
        }
        for (i,r) in matrix.rows().enumerate() {
            for (j,value) in r.iter().enumerate() {
                if !value.is_finite() || *value < 0.0 {
                    return Err(DdrError::config(format!("demand ({i},{j}) = {value} is not a finite non-negative number")))
                }
                if i == j && *value != 0.0 {
                    return Err(DdrError::config(format!("self demand at node {i} must be zero, got {value}")))
                }
            }
        }
        Ok(Self { inner: matrix })
    }

    pub fn from_rows<R:AsRef<[f64]>>(rows:&[R]) -> Result<Self> {
        Self::new(Matrix::from_rows(rows)?)
    }

    // generators only ever build square, non-negative matrices
    pub(crate) fn from_generated(mut matrix:Matrix) -> Self {
        let zeroed = matrix.fill_diagonal(0.0);
        debug_assert!(zeroed.is_ok());
        debug_assert!(matrix.elements().iter().all(|v| v.is_finite() && *v >= 0.0));
        Self { inner: matrix }
    }

    pub fn node_count(&self) -> usize {
        self.inner.dimension().0
    }

    pub fn get(&self,source:usize,destination:usize) -> Option<f64> {
        self.inner.get(source, destination).ok()
    }

    pub fn total(&self) -> f64 {
        self.inner.total()
    }

    /// Traffic entering the network toward `destination`, summed over sources.
    pub fn demand_toward(&self,destination:usize) -> f64 {
        self.inner.rows().filter_map(|r| r.get(destination)).sum()
    }

    pub fn as_matrix(&self) -> &Matrix {
        &self.inner
    }

    pub fn elements(&self) -> &[f64] {
        self.inner.elements()
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.inner.rows().map(|r| r.to_vec()).collect()
    }
}

impl Display for DemandMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.inner, f)
    }
}

impl Serialize for DemandMatrix {
    fn serialize<S:Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_rows().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DemandMatrix {
    fn deserialize<D:Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let rows = Vec::<Vec<f64>>::deserialize(deserializer)?;
        Self::from_rows(&rows).map_err(serde::de::Error::custom)
    }
}
