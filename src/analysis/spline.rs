use ndarray::{Array1, Array2};

use crate::error::{AnalysisError, Result};

/// Least-squares natural cubic spline with a fixed number of degrees of freedom.
///
/// `df` excludes the intercept, so the basis has `df + 1` columns and `df - 1`
/// interior knots placed at evenly spaced quantiles of `x`. Beyond the boundary
/// knots the fit is linear.
#[derive(Debug, Clone, PartialEq)]
pub struct NaturalSpline {
    /// Knots in scaled `[0, 1]` coordinates, boundaries included.
    knots: Vec<f64>,
    x_min: f64,
    x_span: f64,
    coefficients: Vec<f64>,
}

impl NaturalSpline {
    pub fn fit(xs: &[f64], ys: &[f64], df: usize) -> Result<Self> {
        if xs.len() != ys.len() {
            return Err(AnalysisError::computation(format!(
                "spline fit: {} x values but {} y values",
                xs.len(),
                ys.len()
            )));
        }
        if df == 0 {
            return Err(AnalysisError::computation("spline fit with zero degrees of freedom"));
        }

        let mut distinct: Vec<f64> = xs.to_vec();
        distinct.sort_by(f64::total_cmp);
        distinct.dedup();
        if distinct.len() < df + 1 {
            return Err(AnalysisError::computation(format!(
                "spline fit with {df} df needs at least {} distinct x values, got {}",
                df + 1,
                distinct.len()
            )));
        }

        let x_min = distinct[0];
        let x_span = distinct[distinct.len() - 1] - x_min;
        let scaled: Vec<f64> = xs.iter().map(|x| (x - x_min) / x_span).collect();

        let mut sorted = scaled.clone();
        sorted.sort_by(f64::total_cmp);
        let mut knots: Vec<f64> = (0..=df)
            .map(|i| quantile(&sorted, i as f64 / df as f64))
            .collect();
        knots.dedup();

        let p = knots.len();
        let mut design = Array2::<f64>::zeros((scaled.len(), p));
        for (row, &x) in scaled.iter().enumerate() {
            for (col, v) in basis(&knots, x).into_iter().enumerate() {
                design[[row, col]] = v;
            }
        }
        let y = Array1::from(ys.to_vec());

        let xtx = design.t().dot(&design);
        let xty = design.t().dot(&y);
        let coefficients = solve(xtx, xty)
            .ok_or_else(|| AnalysisError::computation("spline normal equations are singular"))?;

        Ok(Self {
            knots,
            x_min,
            x_span,
            coefficients: coefficients.to_vec(),
        })
    }

    pub fn predict(&self, x: f64) -> f64 {
        let scaled = (x - self.x_min) / self.x_span;
        basis(&self.knots, scaled)
            .iter()
            .zip(&self.coefficients)
            .map(|(b, c)| b * c)
            .sum()
    }

    /// `n` evenly spaced (x, ŷ) pairs across the fitted range.
    pub fn sample(&self, n: usize) -> Vec<(f64, f64)> {
        if n < 2 {
            return vec![(self.x_min, self.predict(self.x_min))];
        }
        (0..n)
            .map(|i| {
                let x = self.x_min + self.x_span * i as f64 / (n - 1) as f64;
                (x, self.predict(x))
            })
            .collect()
    }
}

/// Truncated-power natural spline basis: `1, x, N_3 .. N_K`.
fn basis(knots: &[f64], x: f64) -> Vec<f64> {
    let k = knots.len();
    let mut row = Vec::with_capacity(k);
    row.push(1.0);
    row.push(x);
    if k > 2 {
        let d_last = d(knots, k - 2, x);
        for j in 0..k - 2 {
            row.push(d(knots, j, x) - d_last);
        }
    }
    row
}

fn d(knots: &[f64], j: usize, x: f64) -> f64 {
    let last = knots[knots.len() - 1];
    let cube = |v: f64| v.max(0.0).powi(3);
    (cube(x - knots[j]) - cube(x - last)) / (last - knots[j])
}

/// Linear-interpolation quantile of sorted data.
pub(crate) fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Gaussian elimination with partial pivoting.
fn solve(mut a: Array2<f64>, mut b: Array1<f64>) -> Option<Array1<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| a[[i, col]].abs().total_cmp(&a[[j, col]].abs()))?;
        if a[[pivot, col]].abs() < 1e-12 {
            return None;
        }
        if pivot != col {
            for k in 0..n {
                a.swap([col, k], [pivot, k]);
            }
            b.swap(col, pivot);
        }
        for row in col + 1..n {
            let factor = a[[row, col]] / a[[col, col]];
            for k in col..n {
                a[[row, k]] -= factor * a[[col, k]];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = Array1::<f64>::zeros(n);
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[[row, k]] * x[k]).sum();
        x[row] = (b[row] - tail) / a[[row, row]];
    }
    Some(x)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn reproduces_a_straight_line() {
        let xs: Vec<f64> = (0..12).map(|i| 1967.0 + i as f64).collect();
        let ys: Vec<f64> = xs.iter().map(|x| 0.02 * (x - 1967.0) + 0.3).collect();
        let fit = NaturalSpline::fit(&xs, &ys, 3).unwrap();
        assert_relative_eq!(fit.predict(1972.5), 0.41, epsilon = 1e-8);
    }

    #[test]
    fn follows_a_non_monotonic_trend() {
        let xs: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let ys: Vec<f64> = xs.iter().map(|x| (x - 10.0).powi(2) / 100.0).collect();
        let fit = NaturalSpline::fit(&xs, &ys, 3).unwrap();
        let mid = fit.predict(10.0);
        assert!(mid < fit.predict(0.0));
        assert!(mid < fit.predict(19.0));
    }

    #[test]
    fn sample_spans_the_fitted_range() {
        let xs = [1.0, 2.0, 3.0, 4.0, 5.0];
        let ys = [0.1, 0.3, 0.2, 0.4, 0.5];
        let fit = NaturalSpline::fit(&xs, &ys, 3).unwrap();
        let pts = fit.sample(100);
        assert_eq!(pts.len(), 100);
        assert_relative_eq!(pts[0].0, 1.0);
        assert_relative_eq!(pts[99].0, 5.0);
    }

    #[test]
    fn too_few_distinct_points_is_error() {
        let xs = [1970.0, 1970.0, 1971.0];
        let ys = [0.2, 0.3, 0.4];
        assert!(matches!(
            NaturalSpline::fit(&xs, &ys, 3),
            Err(AnalysisError::Computation { .. })
        ));
    }

    #[test]
    fn quantile_interpolates() {
        let sorted = [0.0, 1.0, 2.0, 3.0];
        assert_relative_eq!(quantile(&sorted, 0.5), 1.5);
        assert_relative_eq!(quantile(&sorted, 1.0), 3.0);
    }
}
