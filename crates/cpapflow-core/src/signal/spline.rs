//! Interpolating cubic spline with not-a-knot end conditions
//!
//! The spline passes through every input point. At the second and
//! second-to-last knots the third derivative is continuous, so the first two
//! and last two intervals each share a single cubic. This is the same curve
//! as a degree-3 B-spline interpolant with default end conditions.
//!
//! The curve is stored as second derivatives `m[i]` at each knot; the
//! interior ones come from a tridiagonal solve after eliminating `m[0]` and
//! `m[n-1]` with the not-a-knot equations.

use crate::error::{AnalysisError, DataShortfall};

/// Minimum number of points for a cubic not-a-knot fit
pub const MIN_POINTS: usize = 4;

/// Fitted cubic spline
#[derive(Debug, Clone)]
pub struct CubicSpline {
    x: Vec<f64>,
    y: Vec<f64>,
    /// Second derivative at each knot
    m: Vec<f64>,
}

impl CubicSpline {
    /// Fit a spline through `(x, y)`
    ///
    /// `x` must be strictly increasing and hold at least [`MIN_POINTS`]
    /// values; `y` must have the same length as `x`.
    pub fn fit(x: &[f64], y: &[f64]) -> Result<Self, AnalysisError> {
        let n = x.len().min(y.len());
        if n < MIN_POINTS {
            return Err(DataShortfall::TooFewPoints {
                required: MIN_POINTS,
                actual: n,
            }
            .into());
        }
        if let Some(index) = (1..n).find(|&i| x[i] <= x[i - 1]) {
            return Err(AnalysisError::NonIncreasingTime { index });
        }

        let x = x[..n].to_vec();
        let y = y[..n].to_vec();
        let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
        let slope: Vec<f64> = (0..n - 1).map(|i| (y[i + 1] - y[i]) / h[i]).collect();

        // Unknowns m[1..=n-2]; k = n - 2 >= 2 rows
        let k = n - 2;
        let mut sub = vec![0.0; k];
        let mut diag = vec![0.0; k];
        let mut sup = vec![0.0; k];
        let mut rhs = vec![0.0; k];

        for r in 0..k {
            let i = r + 1;
            sub[r] = h[i - 1];
            diag[r] = 2.0 * (h[i - 1] + h[i]);
            sup[r] = h[i];
            rhs[r] = 6.0 * (slope[i] - slope[i - 1]);
        }

        // m[0] = ((h0 + h1) m[1] - h0 m[2]) / h1
        let (h0, h1) = (h[0], h[1]);
        diag[0] = (h0 + h1) * (h0 + 2.0 * h1) / h1;
        sup[0] = (h1 - h0) * (h1 + h0) / h1;
        sub[0] = 0.0;

        // m[n-1] = ((ha + hb) m[n-2] - hb m[n-3]) / ha
        let (ha, hb) = (h[n - 3], h[n - 2]);
        let last = k - 1;
        sub[last] = (ha - hb) * (ha + hb) / ha;
        diag[last] = (ha + hb) * (2.0 * ha + hb) / ha;
        sup[last] = 0.0;

        let interior = solve_tridiagonal(&sub, &diag, &sup, &rhs);

        let mut m = Vec::with_capacity(n);
        m.push(((h0 + h1) * interior[0] - h0 * interior[1]) / h1);
        m.extend_from_slice(&interior);
        m.push(((ha + hb) * interior[last] - hb * interior[last - 1]) / ha);

        Ok(Self { x, y, m })
    }

    /// Domain covered by the knots
    pub fn domain(&self) -> (f64, f64) {
        (self.x[0], self.x[self.x.len() - 1])
    }

    /// Evaluate the spline; points outside the domain use the end cubics
    pub fn eval(&self, xv: f64) -> f64 {
        let n = self.x.len();
        let seg = self
            .x
            .partition_point(|&knot| knot <= xv)
            .saturating_sub(1)
            .min(n - 2);

        let (x0, x1) = (self.x[seg], self.x[seg + 1]);
        let (y0, y1) = (self.y[seg], self.y[seg + 1]);
        let (m0, m1) = (self.m[seg], self.m[seg + 1]);
        let h = x1 - x0;
        let a = x1 - xv;
        let b = xv - x0;

        m0 * a.powi(3) / (6.0 * h)
            + m1 * b.powi(3) / (6.0 * h)
            + (y0 / h - m0 * h / 6.0) * a
            + (y1 / h - m1 * h / 6.0) * b
    }

    /// Evaluate at `count` evenly spaced points spanning the domain
    ///
    /// Returns the grid and the spline values on it.
    pub fn resample(&self, count: usize) -> (Vec<f64>, Vec<f64>) {
        let (lo, hi) = self.domain();
        let grid = linspace(lo, hi, count);
        let values = grid.iter().map(|&xv| self.eval(xv)).collect();
        (grid, values)
    }
}

/// `count` evenly spaced values from `start` to `stop` inclusive
pub fn linspace(start: f64, stop: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (count - 1) as f64;
            let mut grid: Vec<f64> = (0..count).map(|i| start + step * i as f64).collect();
            grid[count - 1] = stop;
            grid
        }
    }
}

/// Thomas algorithm for a tridiagonal system
///
/// `sub[0]` and `sup[len-1]` are ignored.
fn solve_tridiagonal(sub: &[f64], diag: &[f64], sup: &[f64], rhs: &[f64]) -> Vec<f64> {
    let len = diag.len();
    let mut c = vec![0.0; len];
    let mut d = vec![0.0; len];

    c[0] = sup[0] / diag[0];
    d[0] = rhs[0] / diag[0];
    for i in 1..len {
        let denom = diag[i] - sub[i] * c[i - 1];
        c[i] = if i + 1 < len { sup[i] / denom } else { 0.0 };
        d[i] = (rhs[i] - sub[i] * d[i - 1]) / denom;
    }

    let mut out = vec![0.0; len];
    out[len - 1] = d[len - 1];
    for i in (0..len - 1).rev() {
        out[i] = d[i] - c[i] * out[i + 1];
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_interpolates_knots() {
        let x = [0.0, 0.7, 1.5, 2.0, 3.1, 4.0];
        let y = [1.0, -0.5, 2.0, 0.3, 0.0, 1.2];
        let spline = CubicSpline::fit(&x, &y).unwrap();
        for (xi, yi) in x.iter().zip(y) {
            assert_abs_diff_eq!(spline.eval(*xi), yi, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_reproduces_cubic_exactly() {
        // Not-a-knot splines are exact for any cubic polynomial
        let f = |x: f64| 0.5 * x.powi(3) - 2.0 * x.powi(2) + x - 3.0;
        let x: Vec<f64> = vec![0.0, 0.4, 1.1, 1.9, 2.5, 3.8, 4.2];
        let y: Vec<f64> = x.iter().map(|&v| f(v)).collect();
        let spline = CubicSpline::fit(&x, &y).unwrap();

        for i in 0..=100 {
            let xv = 4.2 * i as f64 / 100.0;
            assert_abs_diff_eq!(spline.eval(xv), f(xv), epsilon = 1e-9);
        }
    }

    #[test]
    fn test_four_points_is_single_cubic() {
        let f = |x: f64| x.powi(3) - x;
        let x = [-1.0, 0.5, 2.0, 3.0];
        let y: Vec<f64> = x.iter().map(|&v| f(v)).collect();
        let spline = CubicSpline::fit(&x, &y).unwrap();
        assert_abs_diff_eq!(spline.eval(1.0), f(1.0), epsilon = 1e-9);
        assert_abs_diff_eq!(spline.eval(-0.25), f(-0.25), epsilon = 1e-9);
    }

    #[test]
    fn test_smooth_sine_resample() {
        let n = 2000;
        let x = linspace(0.0, 8.0 * std::f64::consts::PI, n);
        let y: Vec<f64> = x.iter().map(|v| v.sin()).collect();
        let spline = CubicSpline::fit(&x, &y).unwrap();

        let (grid, values) = spline.resample(97);
        assert_eq!(grid.len(), 97);
        assert_eq!(grid[0], 0.0);
        assert_eq!(grid[96], 8.0 * std::f64::consts::PI);
        for (g, v) in grid.iter().zip(values) {
            assert_abs_diff_eq!(v, g.sin(), epsilon = 1e-6);
        }
    }

    #[test]
    fn test_too_few_points() {
        let err = CubicSpline::fit(&[0.0, 1.0, 2.0], &[0.0, 1.0, 0.0]).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::InsufficientData(DataShortfall::TooFewPoints {
                required: 4,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_duplicate_time_rejected() {
        let err = CubicSpline::fit(&[0.0, 1.0, 1.0, 2.0, 3.0], &[0.0; 5]).unwrap_err();
        assert!(matches!(err, AnalysisError::NonIncreasingTime { index: 2 }));
    }

    #[test]
    fn test_linspace_edges() {
        assert!(linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(linspace(2.0, 5.0, 1), vec![2.0]);
        assert_eq!(linspace(0.0, 1.0, 5), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
    }
}
