// Term/document frequency matrices and their weighting.

pub mod term_matrix;
pub mod weighting;
