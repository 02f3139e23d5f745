//! Bitcoin Wallet Fingerprinting
//!
//! Infers which wallet software most likely built a transaction from the
//! observable choices it makes: version, locktime, sequence numbers, script
//! types, signature encoding, ordering and change placement.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod detection;
pub mod errors;
pub mod heuristics;
pub mod normalise;
pub mod source;
pub mod types;
pub mod utils;
