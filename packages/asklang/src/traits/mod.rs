//! Collaborator traits.
//!
//! These are the seams the core depends on. Applications plug in a model,
//! a search backend and (for summarization) a page fetcher.

pub mod fetcher;
pub mod model;
pub mod searcher;
