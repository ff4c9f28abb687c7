//! Report module - summaries, prediction output and encoder export

pub mod encoder_export;
pub mod prediction;
pub mod summary;

pub use encoder_export::*;
pub use prediction::*;
pub use summary::*;
