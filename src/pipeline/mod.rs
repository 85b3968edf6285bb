// Pipeline orchestration: runs the analysis stages in order.

pub mod analysis;

pub use analysis::{run, AnalysisOptions, AnalysisReport};
