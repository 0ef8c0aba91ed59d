#![warn(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

//! Configuration for the duologue harness: the YAML agent roster and the
//! environment-sourced model settings.

mod llm;
mod schema;

use std::path::PathBuf;

use thiserror::Error;

pub use llm::{LlmConfig, ProviderKind};
pub use schema::{AgentDefinition, Config, DEFAULT_CONFIG_PATH};

/// Errors raised while assembling configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} not found in environment variables")]
    MissingSecret(&'static str),

    #[error("configuration file {path} not found")]
    NotFound { path: PathBuf },

    #[error("error parsing configuration: {0}")]
    Format(#[from] serde_yaml::Error),

    #[error("error reading configuration: {0}")]
    Io(#[from] std::io::Error),
}
