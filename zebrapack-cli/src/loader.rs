//! Identities input loading.
//!
//! The front end that inspects source types hands over a JSON object
//! mapping each type name to its value shape. This module reads it and runs
//! the pass pipeline so the rest of the CLI sees a finalized table.
//!
//! Two tables come out. Generators read the printable one; the schema
//! extractor reads the resolved one, which still holds top-level aliases so
//! that extraction can refuse them.

use crate::error::{CliResult, LoadError};
use std::path::Path;
use tracing::{debug, info};
use zebrapack::passes::PrintableFilter;
use zebrapack::{Directives, Identities, PassPipeline};

/// Loaded and finalized identities.
#[derive(Debug, Clone)]
pub struct LoadedInput {
    /// Finalized table with only identities that have code to generate
    pub identities: Identities,

    /// Table after directives, size resolution and struct metadata, before
    /// non-printable identities were filtered out
    pub resolved: Identities,

    /// Identities in the input, before passes dropped any
    pub declared: usize,
}

impl LoadedInput {
    /// Number of identities the passes removed.
    pub fn dropped(&self) -> usize {
        self.declared - self.identities.len()
    }
}

/// Parse an identities document.
pub fn parse_identities(path: &Path, content: &str) -> CliResult<Identities> {
    let identities: Identities = serde_json::from_str(content)
        .map_err(|e| LoadError::invalid_json(path.to_path_buf(), e.to_string()))?;
    if identities.is_empty() {
        return Err(LoadError::Empty {
            path: path.to_path_buf(),
        }
        .into());
    }
    Ok(identities)
}

/// Read, parse and finalize an identities file.
pub fn load(path: &Path, directives: &Directives) -> CliResult<LoadedInput> {
    let content = std::fs::read_to_string(path).map_err(|e| LoadError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let raw = parse_identities(path, &content)?;
    let declared = raw.len();
    debug!(path = %path.display(), identities = declared, "identities parsed");

    let resolved = PassPipeline::resolving(directives).finalize_all(raw);
    let identities = PassPipeline::new()
        .with_pass(PrintableFilter)
        .finalize_all(resolved.clone());
    info!(
        path = %path.display(),
        kept = identities.len(),
        dropped = declared - identities.len(),
        "identities finalized"
    );
    Ok(LoadedInput {
        identities,
        resolved,
        declared,
    })
}
