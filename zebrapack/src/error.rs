//! Error types for generation and schema export.

use thiserror::Error;

/// Result type alias for generation.
pub type GenResult<T> = Result<T, GenError>;

/// Error raised while generating code for one identity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenError {
    /// A field participating in an id-keyed encoding has no usable zid.
    #[error("struct '{struct_name}' field '{field}' is missing a zid (add `zid:\"N\"` with N >= 0)")]
    MissingZid { struct_name: String, field: String },

    /// Two live fields of one struct share a zid.
    #[error("struct '{struct_name}' uses zid {zid} for both '{first}' and '{second}'")]
    DuplicateZid {
        struct_name: String,
        zid: i64,
        first: String,
        second: String,
    },

    /// The output sink failed. Once latched, every later write reports this.
    #[error("output sink failed ({kind}): {message}")]
    Sink { kind: String, message: String },

    /// A name was looked up in the Identities table and not found.
    #[error("unknown identity '{name}'")]
    UnknownIdentity { name: String },

    /// A dynamic value does not have the shape the IR expects.
    #[error("value mismatch: expected {expected}, found {found}")]
    ValueMismatch { expected: String, found: String },

    /// An array reached a generator before its size was resolved.
    #[error("array size '{size}' is unresolved; finalize the identities first")]
    UnresolvedArraySize { size: String },

    /// A record value lacks a field the struct declares.
    #[error("value for struct '{struct_name}' has no field '{field}'")]
    MissingField { struct_name: String, field: String },
}

impl GenError {
    /// Create a missing-zid error.
    pub fn missing_zid(struct_name: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingZid {
            struct_name: struct_name.into(),
            field: field.into(),
        }
    }

    /// Create a sink error from an I/O failure.
    pub fn sink(err: &std::io::Error) -> Self {
        Self::Sink {
            kind: format!("{:?}", err.kind()),
            message: err.to_string(),
        }
    }

    /// Create a value-mismatch error.
    pub fn mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::ValueMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Whether the error came from the output sink rather than the input.
    ///
    /// A sink failure poisons the whole batch; anything else only affects
    /// the identity being generated.
    pub fn is_sink(&self) -> bool {
        matches!(self, GenError::Sink { .. })
    }
}

/// Error raised while extracting or writing a schema descriptor.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A top-level identity is not a struct.
    #[error("cannot export schema: identity '{name}' is a {shape}, only structs are supported")]
    UnsupportedShape { name: String, shape: &'static str },

    /// JSON serialization failed.
    #[error("failed to serialize schema: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Writing the descriptor failed.
    #[error("failed to write schema to {dest}: {source}")]
    Io {
        dest: String,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_zid_message_names_field() {
        let err = GenError::missing_zid("Point", "x");
        let msg = err.to_string();
        assert!(msg.contains("Point"));
        assert!(msg.contains("'x'"));
        assert!(!err.is_sink());
    }

    #[test]
    fn test_sink_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err = GenError::sink(&io);
        assert!(err.is_sink());
        assert!(err.to_string().contains("BrokenPipe"));
        assert!(err.to_string().contains("pipe closed"));
    }

    #[test]
    fn test_unsupported_shape_message() {
        let err = SchemaError::UnsupportedShape {
            name: "Ids".to_string(),
            shape: "slice",
        };
        assert_eq!(
            err.to_string(),
            "cannot export schema: identity 'Ids' is a slice, only structs are supported"
        );
    }
}
