//! Schema descriptor writer.

use std::fmt;
use std::io::Write;
use std::path::PathBuf;

use tracing::info;

use crate::error::SchemaError;

use super::Schema;

/// Where a schema descriptor goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaDest {
    /// Standard output
    Stdout,

    /// A file
    Path(PathBuf),
}

impl SchemaDest {
    /// Parse a destination argument; `-` means standard output.
    pub fn parse(arg: &str) -> Self {
        if arg == "-" {
            SchemaDest::Stdout
        } else {
            SchemaDest::Path(PathBuf::from(arg))
        }
    }
}

impl fmt::Display for SchemaDest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaDest::Stdout => f.write_str("<stdout>"),
            SchemaDest::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Write `schema` as pretty JSON to `dest`.
pub fn write_schema(schema: &Schema, dest: &SchemaDest) -> Result<(), SchemaError> {
    let mut json = schema.to_json()?;
    json.push('\n');
    let io_err = |source| SchemaError::Io {
        dest: dest.to_string(),
        source,
    };
    match dest {
        SchemaDest::Stdout => {
            let mut out = std::io::stdout().lock();
            out.write_all(json.as_bytes()).map_err(io_err)?;
            out.flush().map_err(io_err)?;
        }
        SchemaDest::Path(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(io_err)?;
            }
            std::fs::write(path, json).map_err(io_err)?;
        }
    }
    info!(dest = %dest, structs = schema.structs.len(), "schema written");
    Ok(())
}
