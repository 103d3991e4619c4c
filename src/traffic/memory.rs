use std::collections::VecDeque;

use crate::traffic::demand::DemandMatrix;

// most recent demand matrices, oldest first, at most `capacity` of them
#[derive(Clone,Debug)]
pub struct DemandMemory {
    capacity:usize,
    window:VecDeque<DemandMatrix>,
}

impl DemandMemory {
    // capacity is validated by the caller, zero is bumped to one
    pub fn new(capacity:usize) -> Self {
        let capacity = capacity.max(1);
        Self { capacity, window: VecDeque::with_capacity(capacity) }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// Appends `matrix`, evicting and returning the oldest when full.
    pub fn push(&mut self,matrix:DemandMatrix) -> Option<DemandMatrix> {
        self.window.push_back(matrix);
        if self.window.len() > self.capacity {
            return self.window.pop_front()
        }
        None
    }

    pub fn reset_with(&mut self,matrix:DemandMatrix) {
        self.window.clear();
        self.window.push_back(matrix);
    }

    pub fn oldest(&self) -> Option<&DemandMatrix> {
        self.window.front()
    }

    pub fn latest(&self) -> Option<&DemandMatrix> {
        self.window.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DemandMatrix> {
        self.window.iter()
    }

    pub fn snapshot(&self) -> Vec<DemandMatrix> {
        self.window.iter().cloned().collect()
    }

    // flat (len, N, N) tensor, row major
    pub fn stacked(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.window.iter().map(|m| m.elements().len()).sum());
        for matrix in self.window.iter() {
            out.extend_from_slice(matrix.elements());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::DemandMemory;
    use crate::traffic::demand::DemandMatrix;

    fn dm(v:f64) -> DemandMatrix {
        DemandMatrix::from_rows(&[[0.0,v],[v,0.0]]).unwrap()
    }

    #[test]
    fn test_fifo_eviction() {
        let mut memory = DemandMemory::new(3);
        memory.reset_with(dm(0.0));
        for i in 1..=5 {
            let evicted = memory.push(dm(i as f64));
            assert!(memory.len() <= 3);
            if i >= 3 {
                assert_eq!(evicted,Some(dm((i - 3) as f64)));
            } else {
                assert!(evicted.is_none());
            }
        }
        assert_eq!(memory.oldest(),Some(&dm(3.0)));
        assert_eq!(memory.latest(),Some(&dm(5.0)));
        memory.reset_with(dm(9.0));
        assert_eq!(memory.len(),1);
    }

    #[test]
    fn test_stacked() {
        let mut memory = DemandMemory::new(2);
        memory.reset_with(dm(1.0));
        memory.push(dm(2.0));
        assert_eq!(memory.stacked(),vec![0.0,1.0,1.0,0.0,0.0,2.0,2.0,0.0]);
    }
}
