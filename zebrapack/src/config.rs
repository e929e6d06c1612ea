//! Generator configuration.
//!
//! Controls which map protocol structs use, where emitted code finds its
//! append primitives, and how emitted text is laid out.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Default path of the runtime primitive library emitted code calls.
pub const DEFAULT_RUNTIME_PATH: &str = "zebrapack_runtime::msgp";

/// Map protocol for non-tuple structs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    /// Integer zid keys, implicit omit-empty, type fingerprint under key -1
    #[default]
    Fast,

    /// Keys per the struct's key kind; omission only for tagged fields
    Msgp2,
}

impl Protocol {
    /// Whether this is the fixed-key-id protocol.
    pub fn is_fast(&self) -> bool {
        matches!(self, Protocol::Fast)
    }
}

/// Indentation style for emitted code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndentStyle {
    /// Four spaces (rustfmt default)
    #[default]
    Spaces4,

    /// Two spaces
    Spaces2,

    /// Tabs
    Tabs,
}

impl IndentStyle {
    /// Get the indentation string.
    pub fn as_str(&self) -> &'static str {
        match self {
            IndentStyle::Spaces4 => "    ",
            IndentStyle::Spaces2 => "  ",
            IndentStyle::Tabs => "\t",
        }
    }

    /// Create an indentation string for the given depth.
    pub fn indent(&self, depth: usize) -> String {
        self.as_str().repeat(depth)
    }
}

/// Generator configuration options.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Map protocol for non-tuple structs
    pub protocol: Protocol,

    /// Module path of the append primitives
    pub runtime_path: String,

    /// Merge consecutive constant emissions into one literal
    pub fuse: bool,

    /// Indentation style
    pub indent: IndentStyle,

    /// Whether to emit doc comments on generated functions
    pub generate_docs: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            protocol: Protocol::default(),
            runtime_path: DEFAULT_RUNTIME_PATH.to_string(),
            fuse: true,
            indent: IndentStyle::default(),
            generate_docs: true,
        }
    }
}

impl GeneratorConfig {
    /// Create a new generator config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the map protocol.
    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }

    /// Set the runtime module path.
    pub fn with_runtime_path(mut self, path: impl Into<String>) -> Self {
        self.runtime_path = path.into();
        self
    }

    /// Enable or disable constant fusion.
    pub fn with_fuse(mut self, fuse: bool) -> Self {
        self.fuse = fuse;
        self
    }

    /// Set the indentation style.
    pub fn with_indent(mut self, indent: IndentStyle) -> Self {
        self.indent = indent;
        self
    }

    /// Set whether to emit doc comments.
    pub fn with_generate_docs(mut self, generate: bool) -> Self {
        self.generate_docs = generate;
        self
    }

    /// `use` line that brings the runtime into scope as `msgp`.
    pub fn runtime_import(&self) -> String {
        let path = self.runtime_path.trim_end_matches("::");
        if path == "msgp" {
            // already in scope under that name
            String::new()
        } else if path.ends_with("::msgp") {
            format!("use {};", path)
        } else {
            format!("use {} as msgp;", path)
        }
    }
}

/// Directives applied by the pass pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Directives {
    /// Identities to exclude from generation
    pub ignore: Vec<String>,

    /// Structs to force into tuple encoding
    pub tuple: Vec<String>,

    /// Named constants used as array sizes
    pub constants: IndexMap<String, usize>,
}

impl Directives {
    /// Create empty directives.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ignore an identity.
    pub fn with_ignore(mut self, name: impl Into<String>) -> Self {
        self.ignore.push(name.into());
        self
    }

    /// Force a struct into tuple encoding.
    pub fn with_tuple(mut self, name: impl Into<String>) -> Self {
        self.tuple.push(name.into());
        self
    }

    /// Define an array-size constant.
    pub fn with_constant(mut self, name: impl Into<String>, value: usize) -> Self {
        self.constants.insert(name.into(), value);
        self
    }
}
