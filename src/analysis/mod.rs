//! Numeric stages: group means, the trend smoother and the Welch test.

pub mod aggregate;
pub mod spline;
pub mod ttest;
