use std::borrow::Borrow;
use rand::{Rng, distr::Distribution};
use thiserror::Error;

#[derive(Error,Debug,Clone,PartialEq)]
pub enum MatrixError {
    #[error("Matrix size is:{matrix_size:?},but index at {accessed_index:?} was accessed")]
    IndexOutOfBounds{matrix_size:(usize,usize),accessed_index:(usize,usize)},
    #[error("Matrix have {row_count} rows ,but row at {accessed_row} was accessed")]
    RowOutOfBounds{row_count:usize,accessed_row:usize},
    #[error("This operation requires ({row},{col}) to be square, which isn't")]
    NonSquare{row:usize,col:usize},
    #[error("attempted to create {row}*{col} matrix from vector/iterator with length {len}")]
    SizeMisMatch{row:usize,col:usize,len:usize},
    #[error("row {row} has length {len}, expected {expected}")]
    RaggedRows{row:usize,len:usize,expected:usize},
}

type Result<T> = std::result::Result<T,MatrixError>;

pub(crate) trait AsVector {
    fn as_vector(&self) -> &[f64];
    fn iter(&self) -> impl Iterator<Item = f64> {
        self.as_vector().iter().map(|n| *n)
    }
    fn sum(&self) -> f64 {
        self.iter().sum()
    }
}

impl<T:AsRef<[f64]>> AsVector for T {
    fn as_vector(&self) -> &[f64] {
        self.as_ref()
    }
}

pub(crate) trait AsMutVector : AsVector {
    fn as_mut_vector(&mut self) -> &mut [f64];
    fn iter_mut(&mut self) -> impl Iterator<Item = &mut f64> {
        self.as_mut_vector().iter_mut()
    }
    fn scalar_mul_assign<B:Borrow<f64>>(&mut self,rhs:B) {
        for i in self.iter_mut() {
            *i *= rhs.borrow()
        }
    }
}

impl<T:AsMut<[f64]> + AsVector> AsMutVector for T {
    fn as_mut_vector(&mut self) -> &mut [f64] {
        self.as_mut()
    }
}

// A double precision matrix, row major order
// which means rows are stored continuously
#[derive(Clone,Debug,PartialEq)]
pub struct Matrix {
    row_count:usize,
    col_count:usize,
    //row*col must equal elements.len()
    elements:Vec<f64>
}

use std::fmt::Display;
impl Display for Matrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f,"[")?;
        for (i,elem) in self.elements.iter().enumerate() {
            write!(f,"{elem}")?;
            if i+1 == self.elements.len() {
                write!(f,"]")?;
            }else if (i+1)%self.col_count == 0 {
                write!(f,",\n")?;
            }else{
                write!(f,", ")?;
            }
        }
        if self.elements.is_empty() {
            write!(f,"]")?;
        }
        Ok(())
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self {
            row_count:0,
            col_count:0,
            elements:vec![]
        }
    }
}

impl AsRef<[f64]> for Matrix {
    fn as_ref(&self) -> &[f64] {
        &self.elements
    }
}

impl AsMut<[f64]> for Matrix {
    fn as_mut(&mut self) -> &mut [f64] {
        &mut self.elements
    }
}

impl Matrix {
    pub fn new_with_vec(v:Vec<f64>,row:usize,col:usize) -> Result<Self> {
        if row*col != v.len() {
            return Err(MatrixError::SizeMisMatch { row, col,len: v.len() })
        }
        if row*col == 0 {
            return Ok(Self::default())
        }
        Ok(Self { row_count: row, col_count: col, elements: v })
    }
    pub fn from_rows<R:AsRef<[f64]>>(rows:&[R]) -> Result<Self> {
        let row = rows.len();
        let col = rows.first().map(|r| r.as_ref().len()).unwrap_or(0);
        let mut elements = Vec::with_capacity(row*col);
        for (i,r) in rows.iter().enumerate() {
            let r = r.as_ref();
            if r.len() != col {
                return Err(MatrixError::RaggedRows { row: i, len: r.len(), expected: col })
            }
            elements.extend_from_slice(r);
        }
        Self::new_with_vec(elements, row, col)
    }
    pub fn get(&self,row:usize,col:usize) -> Result<f64> {
        debug_assert_eq!(self.row_count*self.col_count,self.elements.len());
        if row >= self.row_count || col >= self.col_count {
            return Err(self.out_of_bounds(row, col))
        }
        Ok(self.elements[row*self.col_count + col])
    }
    fn out_of_bounds(&self,row:usize,col:usize) -> MatrixError {
        MatrixError::IndexOutOfBounds {
            matrix_size: (self.row_count,self.col_count),
            accessed_index: (row,col)
        }
    }
    pub fn row(&self,row:usize) -> Result<&[f64]> {
        if row >= self.row_count {
            return Err(MatrixError::RowOutOfBounds { row_count: self.row_count, accessed_row: row })
        }
        let start = row*self.col_count;
        Ok(&self.elements[start..start + self.col_count])
    }
    pub fn row_mut(&mut self,row:usize) -> Result<&mut [f64]> {
        if row >= self.row_count {
            return Err(MatrixError::RowOutOfBounds { row_count: self.row_count, accessed_row: row })
        }
        let start = row*self.col_count;
        let end = start + self.col_count;
        Ok(&mut self.elements[start..end])
    }
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        // chunks panics on 0, an empty matrix has no rows anyway
        self.elements.chunks(self.col_count.max(1))
    }
    pub fn zeros(row:usize,col:usize) -> Self {
        if row*col == 0 {
            return Self::default()
        }
        Self {
            row_count:row,
            col_count:col,
            elements:vec![0.0;row*col]
        }
    }
    // entry (i, j) is f(i, j), filled in row major order
    pub fn from_fn<F:FnMut(usize,usize) -> f64>(row:usize,col:usize,mut f:F) -> Self {
        if row*col == 0 {
            return Self::default()
        }
        let elements:Vec<f64> = (0..row*col).map(|k| f(k/col, k%col)).collect();
        debug_assert_eq!(elements.len(),row*col);
        Self {
            row_count:row,
            col_count:col,
            elements
        }
    }
    // every entry drawn independently from `distribution`
    pub fn sample<D:Distribution<f64>,R:Rng + ?Sized>(row:usize,col:usize,distribution:&D,rng:&mut R) -> Self {
        Self::from_fn(row, col, |_,_| distribution.sample(rng))
    }
    pub fn fill_diagonal(&mut self,value:f64) -> Result<()> {
        if self.row_count != self.col_count {
            return Err(MatrixError::NonSquare { row: self.row_count, col: self.col_count })
        }
        for i in 0..self.row_count {
            self.elements[i*self.col_count + i] = value;
        }
        Ok(())
    }
    pub fn is_empty(&self) -> bool {
        self.col_count == 0 || self.row_count == 0 || self.elements.is_empty()
    }
    pub fn dimension(&self) -> (usize,usize) {
        if self.is_empty() {return (0,0)}
        (self.row_count,self.col_count)
    }
    pub fn elements(&self) -> &[f64] {
        &self.elements
    }
    pub fn total(&self) -> f64 {
        self.sum()
    }
    pub fn scale(&mut self,factor:f64) {
        self.scalar_mul_assign(factor)
    }
}
