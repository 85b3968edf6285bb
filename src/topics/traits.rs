// Topic modeler trait.
//
// The pipeline only needs "counts in, topic model out". Variational EM and
// collapsed Gibbs sampling both sit behind this trait.

use anyhow::Result;

use super::model::TopicModel;
use crate::matrix::term_matrix::DocumentTermMatrix;

/// Trait for fitting a topic model to a document-term count matrix.
pub trait TopicModeler {
    fn fit(&self, dtm: &DocumentTermMatrix) -> Result<TopicModel>;
}
