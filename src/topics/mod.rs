// Topic modeling: LDA fitted by variational EM or collapsed Gibbs sampling.

pub mod lda;
pub mod model;
pub mod special;
pub mod traits;
pub mod vem;

use lda::{GibbsLda, LdaMethod, LdaParams};
use traits::TopicModeler;
use vem::VemLda;

/// The fitter selected by `params.method`.
pub fn modeler(params: &LdaParams, progress: bool) -> Box<dyn TopicModeler> {
    match params.method {
        LdaMethod::Vem => Box::new(VemLda::new(params.clone()).with_progress(progress)),
        LdaMethod::Gibbs => Box::new(GibbsLda::new(params.clone()).with_progress(progress)),
    }
}
