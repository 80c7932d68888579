//! Parsing Strategy Module
//!
//! - Single document: [`crate::XmlFile`]
//! - Parallel batch: independent parser per input, spread over Rayon's pool

pub mod parallel;

pub use parallel::{parse_batch, write_batch};
