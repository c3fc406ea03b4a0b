//! Energy analysis of Pink Floyd albums before and after Syd Barrett's departure.
//!
//! ```text
//!  load → enrich → filter/label → aggregate → visualize → t-test → report
//! ```
//!
//! Each stage lives in its own module and is wired together by [`pipeline::Pipeline`].

pub mod analysis;
pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod pipeline;
pub mod plot;
pub mod report;

pub use config::{AnalysisConfig, Era};
pub use error::{AnalysisError, Result};
pub use pipeline::Pipeline;
pub use report::Report;
