//! credscore: multi-value categorical encoding and credit scoring
//!
//! A library for expanding delimiter-separated text columns into frozen
//! binary feature blocks, training a classifier on the encoded data, and
//! scoring raw records against the persisted bundle.

pub mod cli;
pub mod pipeline;
pub mod report;
pub mod utils;
