// Summary statistics over the visible raw window

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WindowStats {
    pub min: f64,
    pub max: f64,
    pub average: f64,
    pub variance: f64,
}

impl WindowStats {
    /// Population statistics of `values`. Empty input gives `+inf`/`-inf`
    /// extrema and `NaN` mean and variance; callers decide whether to show
    /// them.
    pub fn compute(values: &[f64]) -> Self {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;

        for &v in values {
            if v > max {
                max = v;
            }
            if v < min {
                min = v;
            }
            sum += v;
        }

        let count = values.len() as f64;
        let average = sum / count;
        let variance = values.iter().map(|v| (v - average).powi(2)).sum::<f64>() / count;

        Self {
            min,
            max,
            average,
            variance,
        }
    }
}
