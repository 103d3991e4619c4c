use serde::{Deserialize, Serialize};

/// Spread of a run of utilization ratios.
#[derive(Clone,Copy,Debug,PartialEq,Serialize,Deserialize)]
pub struct Summary {
    pub count:usize,
    pub mean:f64,
    /// Population standard deviation.
    pub std_dev:f64,
    pub min:f64,
    pub max:f64,
}

impl Summary {
    /// `None` for an empty run.
    pub fn of(values:&[f64]) -> Option<Self> {
        if values.is_empty() {
            return None
        }
        let n = values.len() as f64;

        let mut sum = 0.0;
        let mut sum_sq = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for &v in values {
            sum += v;
            sum_sq += v.powi(2);
            min = min.min(v);
            max = max.max(v);
        }

        let mean = sum/n;
        // rounding can push the variance a hair below zero
        let variance = (sum_sq/n - mean.powi(2)).max(0.0);
        Some(Self { count: values.len(), mean, std_dev: variance.sqrt(), min, max })
    }
}

#[cfg(test)]
mod test {
    use super::Summary;

    #[test]
    fn test_summary() {
        let s = Summary::of(&[1.0,2.0,3.0,4.0]).unwrap();
        assert_eq!(s.count,4);
        assert_eq!(s.mean,2.5);
        assert!((s.std_dev - 1.25f64.sqrt()).abs() < 1e-12);
        assert_eq!((s.min,s.max),(1.0,4.0));
    }

    #[test]
    fn test_constant_and_empty() {
        let s = Summary::of(&[1.1;7]).unwrap();
        assert!(s.std_dev < 1e-7);
        assert!(Summary::of(&[]).is_none());
    }
}
