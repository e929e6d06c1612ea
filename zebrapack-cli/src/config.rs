//! Configuration management for the CLI.
//!
//! This module handles loading configuration from `zebrapack.toml` files
//! and merging with command-line arguments.

use crate::error::{CliResult, ConfigError};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use zebrapack::{Directives, GeneratorConfig, IndentStyle, Method, Protocol, DEFAULT_RUNTIME_PATH};

/// Default configuration filename.
pub const CONFIG_FILENAME: &str = "zebrapack.toml";

/// Main configuration structure.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Output configuration.
    pub output: OutputConfig,

    /// Generator settings.
    pub generator: GeneratorSection,

    /// Schema export settings.
    pub schema: SchemaConfig,

    /// Directives for the pass pipeline.
    pub directives: Directives,
}

/// Output configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output directory for generated files.
    pub dir: PathBuf,

    /// Output filename.
    pub file: String,
}

/// Generator settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneratorSection {
    /// Map protocol for non-tuple structs.
    pub protocol: Protocol,

    /// Module path of the runtime append primitives.
    pub runtime_path: String,

    /// Merge constant byte runs.
    pub fuse: bool,

    /// Indentation of emitted code.
    pub indent: IndentStyle,

    /// Emit doc comments on generated functions.
    pub generate_docs: bool,

    /// Emit `msgsize` alongside `marshal_msg`.
    pub msgsize: bool,
}

/// Schema export settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Where to write the schema descriptor; `-` is stdout.
    pub dest: Option<String>,

    /// Tag the descriptor with a freshly drawn schema id.
    pub genid: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./generated"),
            file: "zebrapack_gen.rs".to_string(),
        }
    }
}

impl Default for GeneratorSection {
    fn default() -> Self {
        Self {
            protocol: Protocol::default(),
            runtime_path: DEFAULT_RUNTIME_PATH.to_string(),
            fuse: true,
            indent: IndentStyle::default(),
            generate_docs: true,
            msgsize: true,
        }
    }
}

impl Config {
    /// Path of the generated source file.
    pub fn output_path(&self) -> PathBuf {
        self.output.dir.join(&self.output.file)
    }

    /// Core generator configuration.
    pub fn generator_config(&self) -> GeneratorConfig {
        GeneratorConfig::new()
            .with_protocol(self.generator.protocol)
            .with_runtime_path(self.generator.runtime_path.clone())
            .with_fuse(self.generator.fuse)
            .with_indent(self.generator.indent)
            .with_generate_docs(self.generator.generate_docs)
    }

    /// Methods to generate.
    pub fn methods(&self) -> Vec<Method> {
        let mut methods = vec![Method::Marshal];
        if self.generator.msgsize {
            methods.push(Method::Msgsize);
        }
        methods
    }
}

/// Configuration manager for loading and merging configs.
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration from a file path.
    ///
    /// If the path is None, attempts to load from the default location.
    /// If no config file exists, returns default configuration.
    pub fn load(path: Option<&Path>) -> CliResult<Config> {
        let config_path = path
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILENAME));

        if !config_path.exists() {
            tracing::debug!(path = %config_path.display(), "no config file, using defaults");
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&config_path).map_err(|e| ConfigError::Io {
            path: config_path.clone(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::invalid_toml(config_path.clone(), e.to_string()))?;

        if config.generator.runtime_path.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "generator.runtime_path",
                "must not be empty",
            )
            .into());
        }

        tracing::info!(path = %config_path.display(), "configuration loaded");
        Ok(config)
    }

    /// Merge CLI arguments into configuration.
    ///
    /// CLI arguments take precedence over config file values.
    pub fn merge_cli_args(mut config: Config, args: &CliArgs) -> Config {
        if let Some(ref output) = args.output {
            config.output.dir = output.clone();
        }

        if let Some(ref file) = args.output_file {
            config.output.file = file.clone();
        }

        if let Some(protocol) = args.protocol {
            config.generator.protocol = protocol;
        }

        if let Some(fuse) = args.fuse {
            config.generator.fuse = fuse;
        }

        if let Some(ref dest) = args.schema {
            config.schema.dest = Some(dest.clone());
        }

        if args.genid {
            config.schema.genid = true;
        }

        config
    }

    /// Generate default configuration file content with comments.
    pub fn default_config_content() -> &'static str {
        r#"# zebrapack configuration file

[output]
# Output directory for generated Rust files
dir = "./generated"

# Output file name
file = "zebrapack_gen.rs"

[generator]
# Map protocol for structs: "fast" (zid keys, type fingerprint, empty fields
# omitted) or "msgp2" (name keys, only omitempty-tagged fields omitted)
protocol = "fast"

# Module path of the append primitives the generated code calls
runtime_path = "zebrapack_runtime::msgp"

# Merge adjacent constant bytes into one write
fuse = true

# Indentation: "spaces4", "spaces2" or "tabs"
indent = "spaces4"

# Emit doc comments on generated functions
generate_docs = true

# Emit msgsize() alongside marshal_msg()
msgsize = true

[schema]
# Write a schema descriptor here ("-" for stdout); unset disables export
# dest = "schema.json"

# Tag the descriptor with a fresh random schema id
genid = false

[directives]
# Identities to leave out of generation
ignore = []

# Structs to encode as positional arrays
tuple = []

# Named constants used as fixed array sizes
[directives.constants]
# HashLen = 32
"#
    }
}

/// CLI arguments that can override configuration.
#[derive(Debug, Default)]
pub struct CliArgs {
    /// Output directory override.
    pub output: Option<PathBuf>,

    /// Output filename override.
    pub output_file: Option<String>,

    /// Protocol override.
    pub protocol: Option<Protocol>,

    /// Fusion override.
    pub fuse: Option<bool>,

    /// Schema destination override.
    pub schema: Option<String>,

    /// Draw a fresh schema id.
    pub genid: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.output.dir, PathBuf::from("./generated"));
        assert_eq!(config.output.file, "zebrapack_gen.rs");
        assert_eq!(config.generator.protocol, Protocol::Fast);
        assert_eq!(config.generator.runtime_path, DEFAULT_RUNTIME_PATH);
        assert!(config.generator.fuse);
        assert!(config.generator.msgsize);
        assert!(config.schema.dest.is_none());
        assert!(!config.schema.genid);
        assert!(config.directives.tuple.is_empty());
    }

    #[test]
    fn test_merge_cli_args_output() {
        let config = Config::default();
        let args = CliArgs {
            output: Some(PathBuf::from("./custom")),
            protocol: Some(Protocol::Msgp2),
            genid: true,
            ..Default::default()
        };

        let merged = ConfigManager::merge_cli_args(config, &args);
        assert_eq!(merged.output.dir, PathBuf::from("./custom"));
        assert_eq!(merged.generator.protocol, Protocol::Msgp2);
        assert!(merged.schema.genid);
    }

    #[test]
    fn test_merge_cli_args_preserves_unset() {
        let config = Config::default();
        let args = CliArgs::default();

        let merged = ConfigManager::merge_cli_args(config.clone(), &args);
        assert_eq!(merged.output.dir, config.output.dir);
        assert_eq!(merged.output.file, config.output.file);
        assert_eq!(merged.generator.protocol, config.generator.protocol);
    }

    #[test]
    fn test_parse_toml_config() {
        let toml = r#"
[output]
dir = "./src/gen"
file = "wire.rs"

[generator]
protocol = "msgp2"
runtime_path = "msgp"
fuse = false
indent = "tabs"
msgsize = false

[schema]
dest = "-"
genid = true

[directives]
tuple = ["Triple"]

[directives.constants]
HashLen = 32
"#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.output_path(), PathBuf::from("./src/gen/wire.rs"));
        assert_eq!(config.generator.protocol, Protocol::Msgp2);
        assert!(!config.generator.fuse);
        assert_eq!(config.generator.indent, IndentStyle::Tabs);
        assert!(config.generator.generate_docs);
        assert_eq!(config.methods(), vec![Method::Marshal]);
        assert_eq!(config.schema.dest.as_deref(), Some("-"));
        assert!(config.schema.genid);
        assert_eq!(config.directives.tuple, vec!["Triple".to_string()]);
        assert_eq!(config.directives.constants.get("HashLen"), Some(&32));
        assert_eq!(config.generator_config().runtime_import(), "");
    }

    #[test]
    fn test_default_content_parses_to_defaults() {
        let config: Config = toml::from_str(ConfigManager::default_config_content()).unwrap();
        let defaults = Config::default();
        assert_eq!(config.output_path(), defaults.output_path());
        assert_eq!(config.generator.protocol, defaults.generator.protocol);
        assert_eq!(config.generator.indent, defaults.generator.indent);
        assert_eq!(config.directives, defaults.directives);
    }
}
