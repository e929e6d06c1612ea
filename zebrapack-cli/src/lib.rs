//! # zebrapack-cli
//!
//! CLI library for generating MessagePack encoders and schema descriptors
//! from an identities description.
//!
//! ## Architecture
//!
//! - [`config`] - Configuration management and TOML parsing
//! - [`loader`] - Identities JSON input and pass pipeline
//! - [`generator`] - Encoder generation and schema export
//! - [`writer`] - Staged output files committed after generation succeeds
//! - [`error`] - Error types and handling

pub mod config;
pub mod error;
pub mod generator;
pub mod loader;
pub mod writer;

pub use config::{Config, ConfigManager};
pub use error::{CliError, CliResult};
pub use generator::{fresh_schema_id, EncoderGenerator, GenerateOutput};
pub use loader::{load, LoadedInput};
pub use writer::{StagedFile, Written};
