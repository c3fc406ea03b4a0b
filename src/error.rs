use std::collections::BTreeSet;

use thiserror::Error;

/// Error taxonomy for one analysis run. Every variant is fatal; nothing is retried.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// The input table could not be opened or parsed.
    #[error("failed to load {path}: {reason}")]
    Load { path: String, reason: String },

    /// Albums present in the data but missing from the year lookup.
    #[error("albums without a release year mapping: {}", join(.albums))]
    MappingGap { albums: BTreeSet<String> },

    /// A mean, fit or test is undefined for the data it was given.
    #[error("computation undefined: {reason}")]
    Computation { reason: String },

    #[error("failed to render chart: {reason}")]
    Render { reason: String },

    #[error("invalid configuration: {key} = {value}")]
    Config { key: String, value: String },

    /// The report could not be encoded as JSON.
    #[error("failed to serialize report: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, AnalysisError>;

impl AnalysisError {
    pub fn computation<S: Into<String>>(reason: S) -> Self {
        Self::Computation {
            reason: reason.into(),
        }
    }

    pub fn render<E: std::fmt::Display>(err: E) -> Self {
        Self::Render {
            reason: err.to_string(),
        }
    }
}

fn join(albums: &BTreeSet<String>) -> String {
    albums
        .iter()
        .map(|a| format!("'{a}'"))
        .collect::<Vec<_>>()
        .join(", ")
}
