//! Unit Tests Module
//!
//! Property checks over the public extractor, engine and configuration APIs.

pub mod config;
pub mod heuristics;
pub mod source;
