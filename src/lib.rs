// docmine: exploratory text mining for folders of PDF reports
//
// This is the library root. Each module corresponds to one stage (or a
// group of stages) of the analysis pipeline.

pub mod cluster;
pub mod config;
pub mod corpus;
pub mod distance;
pub mod matrix;
pub mod output;
pub mod pipeline;
pub mod text;
pub mod topics;
