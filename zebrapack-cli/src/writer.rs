//! Staged output for generated encoders.
//!
//! Generation streams straight into a `.partial` file next to the target
//! through a [`Printer`], so a failed write latches and stops the batch.
//! The target is replaced only by [`StagedFile::commit`]; a staged file that
//! is dropped uncommitted is removed and the previous output stays intact.

use crate::error::{CliResult, WriteError};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use zebrapack::Printer;

/// A generated file that reached its target path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Written {
    /// Target path
    pub path: PathBuf,

    /// Bytes written
    pub bytes: usize,
}

/// Output file being written under a staging name.
#[derive(Debug)]
pub struct StagedFile {
    target: PathBuf,
    printer: Printer<BufWriter<File>>,
    staging: StagingGuard,
}

impl StagedFile {
    /// Create the parent directories and open the staging file for `target`.
    pub fn create(target: &Path) -> CliResult<Self> {
        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| WriteError::CreateDir {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let staging = staging_path(target);
        let file = File::create(&staging).map_err(|e| WriteError::WriteFile {
            path: staging.clone(),
            source: e,
        })?;
        debug!(staging = %staging.display(), "staging output");
        Ok(Self {
            target: target.to_path_buf(),
            printer: Printer::new(BufWriter::new(file)),
            staging: StagingGuard {
                path: staging,
                armed: true,
            },
        })
    }

    /// Sink the generated code is printed into.
    pub fn printer(&mut self) -> &mut Printer<BufWriter<File>> {
        &mut self.printer
    }

    /// Flush the staged content and move it over the target.
    pub fn commit(self) -> CliResult<Written> {
        let Self {
            target,
            mut printer,
            mut staging,
        } = self;

        printer.flush().map_err(|e| WriteError::Sink {
            path: target.clone(),
            source: e,
        })?;
        let bytes = printer.written();
        drop(printer.into_inner());

        std::fs::rename(&staging.path, &target).map_err(|e| WriteError::WriteFile {
            path: target.clone(),
            source: e,
        })?;
        staging.armed = false;
        info!(path = %target.display(), bytes, "output written");
        Ok(Written {
            path: target,
            bytes,
        })
    }
}

/// Removes the staging file unless it was committed.
#[derive(Debug)]
struct StagingGuard {
    path: PathBuf,
    armed: bool,
}

impl Drop for StagingGuard {
    fn drop(&mut self) {
        if self.armed {
            debug!(staging = %self.path.display(), "discarding staged output");
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

/// `gen.rs` stages as `gen.rs.partial` in the same directory.
fn staging_path(target: &Path) -> PathBuf {
    let mut name = target.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    target.with_file_name(name)
}
