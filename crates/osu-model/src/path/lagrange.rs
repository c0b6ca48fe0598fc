// Barycentric Lagrange interpolation over Chebyshev-Lobatto knots.

use crate::math::Vec2;

/// Polynomial curve through `values` at `knots`, evaluated in barycentric form.
#[derive(Debug, Clone, PartialEq)]
pub struct LagrangeCurve {
    knots: Vec<f64>,
    values: Vec<(f64, f64)>,
    weights: Vec<f64>,
}

impl LagrangeCurve {
    /// Samples `f` at `n` Chebyshev-Lobatto knots on `[0, 1]`.
    ///
    /// The knots include both interval ends, so the curve meets `f(0)` and `f(1)` exactly.
    pub fn chebyshev_lobatto(n: usize, f: impl Fn(f64) -> (f64, f64)) -> Self {
        let n = n.max(1);
        if n == 1 {
            return Self {
                knots: vec![0.0],
                values: vec![f(0.0)],
                weights: vec![1.0],
            };
        }
        let last = n - 1;
        let knots: Vec<f64> = (0..n)
            .map(|i| 0.5 - 0.5 * (std::f64::consts::PI * i as f64 / last as f64).cos())
            .collect();
        let values = knots.iter().map(|&t| f(t)).collect();
        let weights = (0..n)
            .map(|i| {
                let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
                let half = if i == 0 || i == last { 0.5 } else { 1.0 };
                sign * half
            })
            .collect();
        Self {
            knots,
            values,
            weights,
        }
    }

    pub fn knots(&self) -> &[f64] {
        &self.knots
    }

    pub fn evaluate(&self, t: f64) -> Vec2 {
        let (x, y) = self.evaluate_f64(t);
        Vec2::new(x as f32, y as f32)
    }

    fn evaluate_f64(&self, t: f64) -> (f64, f64) {
        if self.knots.len() == 1 {
            return self.values[0];
        }
        let mut numerator = (0.0, 0.0);
        let mut denominator = 0.0;
        for ((&knot, &value), &weight) in self.knots.iter().zip(&self.values).zip(&self.weights) {
            // the barycentric term is singular on a knot
            if t == knot {
                return value;
            }
            let term = weight / (t - knot);
            numerator.0 += term * value.0;
            numerator.1 += term * value.1;
            denominator += term;
        }
        (numerator.0 / denominator, numerator.1 / denominator)
    }
}
