// src/lib.rs

#[macro_use]
pub mod macros;
#[macro_use]
pub mod log;

pub mod error;
pub mod config;
pub mod core;
pub mod model;

pub mod csv;
pub mod ingest;
pub mod normalize;
pub mod merge;
pub mod store;
pub mod file;
pub mod stages;
pub mod collect;

pub mod progress;
pub mod runner;
#[cfg(feature = "cli")]
pub mod cli;

pub use config::Taxonomy;
pub use error::{PipelineError, Result};
