//! Integration Tests Module
//!
//! End-to-end tests that run the fetch, normalise, detect and tally
//! pipeline against an in-memory data source.

pub mod block_analysis;
pub mod detection_fixtures;
pub mod normalisation;
