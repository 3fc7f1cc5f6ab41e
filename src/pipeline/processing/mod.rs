// Pipeline processing: normalization, merging, and classification

pub mod normalize;
pub mod merge;
pub mod classify;
