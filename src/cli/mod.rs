//! CLI module - argument parsing and command runners

pub mod args;
pub mod encode;
pub mod inspect;
pub mod score;
pub mod train;

pub use args::{derive_output_path, Cli, Commands, EncoderArgs, BUNDLE_ENV};
