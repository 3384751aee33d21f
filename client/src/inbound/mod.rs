//! Driving adapters.
//!
//! - **cli**: clap command tree and the runner that calls the slices

pub mod cli;
