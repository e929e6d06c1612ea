//! Batch driver.
//!
//! Runs the enabled generators over a finalized Identities table and
//! assembles one output file. A failing identity is recorded and skipped;
//! the rest of the batch goes on. A failed output sink ends the batch.

use std::io::Write;

use tracing::{debug, warn};

use crate::config::GeneratorConfig;
use crate::error::{GenError, GenResult};
use crate::gen::{CodeGenerator, MarshalGen, Method, MsgsizeGen};
use crate::ir::Identities;
use crate::printer::Printer;

/// Header written at the top of every generated file.
pub const FILE_HEADER: &str = "// Code generated by zebrapack. DO NOT EDIT.";

/// One identity that could not be generated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// Identity name
    pub name: String,

    /// Why generation failed
    pub error: GenError,
}

/// Outcome of a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateReport {
    /// Identities with generated code, in table order
    pub generated: Vec<String>,

    /// Identities that failed
    pub failures: Vec<Failure>,
}

impl GenerateReport {
    /// Whether every identity generated.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Build the generators for the requested methods.
pub fn generators(config: &GeneratorConfig, methods: &[Method]) -> Vec<Box<dyn CodeGenerator>> {
    methods
        .iter()
        .map(|method| -> Box<dyn CodeGenerator> {
            match method {
                Method::Marshal => Box::new(MarshalGen::new(config.clone())),
                Method::Msgsize => Box::new(MsgsizeGen::new(config.clone())),
            }
        })
        .collect()
}

/// Generate code for every identity into `out`.
///
/// `identities` must already be finalized by the pass pipeline. Each
/// identity's impl blocks are written only once all generators succeed for
/// it, so a failure leaves no partial output behind.
pub fn generate<W: Write>(
    identities: &Identities,
    config: &GeneratorConfig,
    methods: &[Method],
    out: &mut Printer<W>,
) -> GenResult<GenerateReport> {
    let mut gens = generators(config, methods);
    let mut report = GenerateReport::default();

    out.print(FILE_HEADER)?;
    out.print("\n\n")?;
    let import = config.runtime_import();
    if !import.is_empty() {
        out.print(&import)?;
        out.print("\n")?;
    }

    for (name, elem) in identities.iter() {
        out.ok()?;
        match render_all(&mut gens, name, elem) {
            Ok(blocks) if blocks.is_empty() => {
                debug!(identity = %name, "nothing to generate");
            }
            Ok(blocks) => {
                for block in blocks {
                    out.print("\n")?;
                    out.print(&block)?;
                }
                report.generated.push(name.to_string());
            }
            Err(error) => {
                warn!(identity = %name, %error, "generation failed");
                report.failures.push(Failure {
                    name: name.to_string(),
                    error,
                });
            }
        }
    }
    out.flush()?;
    Ok(report)
}

/// Generate a whole file into a string.
pub fn generate_file(
    identities: &Identities,
    config: &GeneratorConfig,
    methods: &[Method],
) -> GenResult<(String, GenerateReport)> {
    let mut out = Printer::new(Vec::new());
    let report = generate(identities, config, methods, &mut out)?;
    let code = String::from_utf8_lossy(&out.into_inner()).into_owned();
    Ok((code, report))
}

fn render_all(
    gens: &mut [Box<dyn CodeGenerator>],
    name: &str,
    elem: &crate::ir::Elem,
) -> GenResult<Vec<String>> {
    let mut blocks = Vec::with_capacity(gens.len());
    for gen in gens.iter_mut() {
        if let Some(block) = gen.render(name, elem)? {
            blocks.push(block);
        }
    }
    Ok(blocks)
}
