use std::fmt;

use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::error::{AnalysisError, Result};

/// Which way the observed difference points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    PostLower,
    PostHigher,
    NoDifference,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::PostLower => f.write_str("post-era mean is lower"),
            Direction::PostHigher => f.write_str("post-era mean is higher"),
            Direction::NoDifference => f.write_str("means are identical"),
        }
    }
}

/// Result of a two-sided Welch two-sample t-test of `pre` against `post`.
///
/// The confidence interval is for `mean_pre - mean_post`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WelchTest {
    pub t: f64,
    pub df: f64,
    pub p_value: f64,
    pub confidence: f64,
    pub ci_low: f64,
    pub ci_high: f64,
    pub mean_pre: f64,
    pub mean_post: f64,
    pub n_pre: usize,
    pub n_post: usize,
}

impl WelchTest {
    /// Reject "no difference in means" at significance level `alpha`.
    pub fn rejects_null(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }

    pub fn direction(&self) -> Direction {
        if self.mean_post < self.mean_pre {
            Direction::PostLower
        } else if self.mean_post > self.mean_pre {
            Direction::PostHigher
        } else {
            Direction::NoDifference
        }
    }

    pub fn ci_excludes_zero(&self) -> bool {
        self.ci_low > 0.0 || self.ci_high < 0.0
    }
}

/// Sample mean and unbiased variance.
fn mean_var(sample: &[f64]) -> (f64, f64) {
    let n = sample.len() as f64;
    let mean = sample.iter().sum::<f64>() / n;
    let var = sample.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (mean, var)
}

/// Welch's unequal-variance t-test, two-sided.
pub fn welch_t_test(pre: &[f64], post: &[f64], confidence: f64) -> Result<WelchTest> {
    if pre.len() < 2 || post.len() < 2 {
        return Err(AnalysisError::computation(format!(
            "t-test needs at least 2 observations per sample, got {} and {}",
            pre.len(),
            post.len()
        )));
    }
    if !(confidence > 0.0 && confidence < 1.0) {
        return Err(AnalysisError::computation(format!(
            "confidence level {confidence} is outside (0, 1)"
        )));
    }

    let (mean_pre, var_pre) = mean_var(pre);
    let (mean_post, var_post) = mean_var(post);
    let se_pre = var_pre / pre.len() as f64;
    let se_post = var_post / post.len() as f64;
    let se2 = se_pre + se_post;
    if se2 <= 0.0 {
        return Err(AnalysisError::computation(
            "t-test undefined: both samples are constant",
        ));
    }
    let se = se2.sqrt();

    // Welch–Satterthwaite
    let df = se2.powi(2)
        / (se_pre.powi(2) / (pre.len() - 1) as f64 + se_post.powi(2) / (post.len() - 1) as f64);

    let diff = mean_pre - mean_post;
    let t = diff / se;

    let dist = StudentsT::new(0.0, 1.0, df)
        .map_err(|e| AnalysisError::computation(format!("t distribution with df={df}: {e}")))?;
    let p_value = (2.0 * dist.sf(t.abs())).min(1.0);
    let q = dist.inverse_cdf(0.5 + confidence / 2.0);

    Ok(WelchTest {
        t,
        df,
        p_value,
        confidence,
        ci_low: diff - q * se,
        ci_high: diff + q * se,
        mean_pre,
        mean_post,
        n_pre: pre.len(),
        n_post: post.len(),
    })
}
