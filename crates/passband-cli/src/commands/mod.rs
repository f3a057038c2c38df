//! CLI command implementations.

pub mod config;
pub mod devices;
pub mod run;
