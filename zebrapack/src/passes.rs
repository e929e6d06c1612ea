//! Pass pipeline.
//!
//! Passes run over each top-level identity before any generator or the
//! schema extractor sees it. A pass either returns the (possibly rewritten)
//! node or `None`, which silently excludes the identity from generation.
//! No pass reorders struct fields, and every pass is idempotent: running the
//! pipeline on its own output changes nothing.

use tracing::{trace, warn};

use crate::config::Directives;
use crate::ir::{Elem, Identities};

/// A transform over one top-level identity.
pub trait Pass {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Transform `elem`, or return `None` to drop the identity.
    fn apply(&self, name: &str, elem: Elem) -> Option<Elem>;
}

// =============================================================================
// Pipeline
// =============================================================================

/// Ordered list of passes.
#[derive(Default)]
pub struct PassPipeline {
    passes: Vec<Box<dyn Pass>>,
}

impl std::fmt::Debug for PassPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.passes.iter().map(|p| p.name()))
            .finish()
    }
}

impl PassPipeline {
    /// Create an empty pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard pipeline: [`PassPipeline::resolving`] followed by the
    /// printability filter.
    pub fn standard(directives: &Directives) -> Self {
        Self::resolving(directives).with_pass(PrintableFilter)
    }

    /// Directives, size resolution and struct metadata, without dropping
    /// identities that have nothing to generate.
    ///
    /// The schema extractor reads this table, so a top-level alias is still
    /// present for it to reject.
    pub fn resolving(directives: &Directives) -> Self {
        Self::new()
            .with_pass(IgnoreTypes::new(directives.ignore.iter().cloned()))
            .with_pass(TupleDirective::new(directives.tuple.iter().cloned()))
            .with_pass(ResolveArraySizes::new(
                directives
                    .constants
                    .iter()
                    .map(|(k, v)| (k.clone(), *v)),
            ))
            .with_pass(StructMetadata)
    }

    /// Append a pass.
    pub fn with_pass(mut self, pass: impl Pass + 'static) -> Self {
        self.passes.push(Box::new(pass));
        self
    }

    /// Names of the passes in order.
    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    /// Run every pass over one identity.
    pub fn finalize(&self, name: &str, elem: Elem) -> Option<Elem> {
        let mut elem = elem;
        for pass in &self.passes {
            match pass.apply(name, elem) {
                Some(next) => elem = next,
                None => {
                    trace!(identity = %name, pass = pass.name(), "identity excluded");
                    return None;
                }
            }
        }
        Some(elem)
    }

    /// Run the pipeline over a whole table, keeping only surviving identities.
    pub fn finalize_all(&self, identities: Identities) -> Identities {
        identities
            .into_iter()
            .filter_map(|(name, elem)| {
                let elem = self.finalize(&name, elem)?;
                Some((name, elem))
            })
            .collect()
    }
}

// =============================================================================
// Directive passes
// =============================================================================

/// Drops identities named by an ignore directive.
#[derive(Debug, Clone, Default)]
pub struct IgnoreTypes {
    names: Vec<String>,
}

impl IgnoreTypes {
    pub fn new(names: impl IntoIterator<Item = String>) -> Self {
        Self {
            names: names.into_iter().collect(),
        }
    }
}

impl Pass for IgnoreTypes {
    fn name(&self) -> &'static str {
        "ignore"
    }

    fn apply(&self, name: &str, elem: Elem) -> Option<Elem> {
        if self.names.iter().any(|n| n == name) {
            trace!(identity = %name, "ignored by directive");
            None
        } else {
            Some(elem)
        }
    }
}

/// Forces tuple encoding on structs named by a tuple directive.
///
/// Applies to the struct wherever it appears in the tree, so an inline
/// copy inside another struct encodes the same way as the top-level one.
#[derive(Debug, Clone, Default)]
pub struct TupleDirective {
    names: Vec<String>,
}

impl TupleDirective {
    pub fn new(names: impl IntoIterator<Item = String>) -> Self {
        Self {
            names: names.into_iter().collect(),
        }
    }
}

impl Pass for TupleDirective {
    fn name(&self) -> &'static str {
        "tuple"
    }

    fn apply(&self, _name: &str, mut elem: Elem) -> Option<Elem> {
        if self.names.is_empty() {
            return Some(elem);
        }
        elem.try_for_each_mut(&mut |e| {
            if let Elem::Struct(s) = e {
                if self.names.iter().any(|n| *n == s.name) {
                    s.as_tuple = true;
                }
            }
            true
        });
        Some(elem)
    }
}

// =============================================================================
// Finalizing passes
// =============================================================================

/// Resolves declared fixed-array sizes to integers.
///
/// A size is either an integer literal or the name of a known constant. An
/// identity containing an array whose size cannot be resolved is dropped.
#[derive(Debug, Clone, Default)]
pub struct ResolveArraySizes {
    constants: Vec<(String, usize)>,
}

impl ResolveArraySizes {
    pub fn new(constants: impl IntoIterator<Item = (String, usize)>) -> Self {
        Self {
            constants: constants.into_iter().collect(),
        }
    }

    fn resolve(&self, size: &str) -> Option<usize> {
        let size = size.trim();
        if let Ok(n) = size.parse::<usize>() {
            return Some(n);
        }
        self.constants
            .iter()
            .find(|(name, _)| name == size)
            .map(|(_, n)| *n)
    }
}

impl Pass for ResolveArraySizes {
    fn name(&self) -> &'static str {
        "array-sizes"
    }

    fn apply(&self, name: &str, mut elem: Elem) -> Option<Elem> {
        let mut unresolved = None;
        let ok = elem.try_for_each_mut(&mut |e| {
            if let Elem::Array(a) = e {
                match self.resolve(&a.size) {
                    Some(n) => a.size_resolved = Some(n),
                    None => {
                        unresolved = Some(a.size.clone());
                        return false;
                    }
                }
            }
            true
        });
        if ok {
            Some(elem)
        } else {
            warn!(
                identity = %name,
                size = %unresolved.unwrap_or_default(),
                "cannot resolve array size; skipping"
            );
            None
        }
    }
}

/// Computes `skip_count` and `has_omit_empty_tags` for every struct.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructMetadata;

impl Pass for StructMetadata {
    fn name(&self) -> &'static str {
        "struct-metadata"
    }

    fn apply(&self, _name: &str, mut elem: Elem) -> Option<Elem> {
        elem.try_for_each_mut(&mut |e| {
            if let Elem::Struct(s) = e {
                s.skip_count = s.fields.iter().filter(|f| f.skip).count();
                s.has_omit_empty_tags = s.fields.iter().any(|f| !f.skip && f.omit_empty);
            }
            true
        });
        Some(elem)
    }
}

/// Excludes identities with nothing to generate.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrintableFilter;

impl Pass for PrintableFilter {
    fn name(&self) -> &'static str {
        "printable"
    }

    fn apply(&self, name: &str, elem: Elem) -> Option<Elem> {
        if elem.is_printable() {
            Some(elem)
        } else {
            trace!(identity = %name, shape = elem.shape_name(), "not printable");
            None
        }
    }
}
