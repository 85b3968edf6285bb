// Text normalization: the cleanup applied before counting terms.

pub mod normalize;
