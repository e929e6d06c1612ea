//! Generation orchestration for the CLI.
//!
//! Ties a finalized Identities table to the core batch driver and the
//! schema exporter, applying the run's failure policy.

use crate::config::Config;
use crate::error::{CliResult, GenerateError};
use std::io::Write;
use tracing::{info, warn};
use uuid::Uuid;
use zebrapack::{
    extract, generate, Failure, GenerateReport, Identities, Printer, Schema, SchemaDest,
};

/// Output of a generation run.
#[derive(Debug, Clone)]
pub struct GenerateOutput {
    /// Generated Rust source
    pub content: String,

    /// Identities that produced code
    pub generated: Vec<String>,

    /// Identities that failed (only non-empty with `keep_going`)
    pub failures: Vec<Failure>,
}

/// Runs the core generators with CLI configuration.
#[derive(Debug, Clone)]
pub struct EncoderGenerator {
    config: Config,
    keep_going: bool,
}

impl EncoderGenerator {
    /// Create a generator for a configuration.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            keep_going: false,
        }
    }

    /// Write output even when some identities fail.
    pub fn with_keep_going(mut self, keep_going: bool) -> Self {
        self.keep_going = keep_going;
        self
    }

    /// Generate encoder source for every identity into a string.
    pub fn generate(&self, identities: &Identities) -> CliResult<GenerateOutput> {
        let mut out = Printer::new(Vec::new());
        let report = self.generate_into(identities, &mut out)?;
        Ok(GenerateOutput {
            content: String::from_utf8_lossy(&out.into_inner()).into_owned(),
            generated: report.generated,
            failures: report.failures,
        })
    }

    /// Stream encoder source for every identity into `out`.
    ///
    /// Without `keep_going` any failed identity turns the run into an error,
    /// and whatever was already printed should be discarded by the caller.
    pub fn generate_into<W: Write>(
        &self,
        identities: &Identities,
        out: &mut Printer<W>,
    ) -> CliResult<GenerateReport> {
        let gen_config = self.config.generator_config();
        let report = generate(identities, &gen_config, &self.config.methods(), out)
            .map_err(GenerateError::from)?;

        for failure in &report.failures {
            warn!(identity = %failure.name, error = %failure.error, "identity skipped");
        }
        if !report.is_clean() && !self.keep_going {
            return Err(GenerateError::Failed {
                names: report.failures.iter().map(|f| f.name.clone()).collect(),
            }
            .into());
        }

        info!(
            generated = report.generated.len(),
            failed = report.failures.len(),
            "generation finished"
        );
        Ok(report)
    }

    /// Schema destination configured for this run, if any.
    pub fn schema_dest(&self) -> Option<SchemaDest> {
        self.config.schema.dest.as_deref().map(SchemaDest::parse)
    }

    /// Build the schema descriptor, tagged with a fresh id when configured.
    pub fn schema(&self, identities: &Identities) -> CliResult<Schema> {
        let schema = extract(identities)?;
        Ok(if self.config.schema.genid {
            schema.with_id(fresh_schema_id())
        } else {
            schema
        })
    }
}

/// Draw a random positive schema id.
pub fn fresh_schema_id() -> i64 {
    let (high, _) = Uuid::new_v4().as_u64_pair();
    ((high >> 1) as i64).max(1)
}
