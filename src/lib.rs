pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod consts;
pub mod core;
pub mod error;
pub mod executor;
pub mod graph;
pub mod sample;
pub mod template;

pub use error::{PipeError, Result};
