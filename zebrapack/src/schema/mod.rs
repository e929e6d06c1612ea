//! Schema descriptor export.
//!
//! Projects the Identities table into a language-neutral description of
//! every struct: name, and per field the zid, flags and value type. The
//! descriptor is plain data; persisting and diffing it is up to the caller.

pub mod writer;

pub use writer::{write_schema, SchemaDest};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SchemaError;
use crate::ir::{Elem, Identities};

/// Language-neutral schema descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// Optional identifier for cross-build compatibility tagging
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_id: Option<i64>,

    /// Structs in table order
    pub structs: Vec<SchemaStruct>,
}

impl Schema {
    /// Tag the descriptor with a schema id.
    pub fn with_id(mut self, id: i64) -> Self {
        self.schema_id = Some(id);
        self
    }

    /// Look up a struct by name.
    pub fn find(&self, name: &str) -> Option<&SchemaStruct> {
        self.structs.iter().find(|s| s.name == name)
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, SchemaError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// One struct in the descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaStruct {
    pub name: String,
    pub fields: Vec<SchemaField>,
}

/// One field in the descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaField {
    pub zid: i64,
    pub name: String,
    #[serde(default)]
    pub omit_empty: bool,
    #[serde(default)]
    pub skip: bool,

    /// Value type; empty for skipped fields
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub type_name: String,
}

/// Build the descriptor for every identity.
///
/// Fails without producing anything if any identity is not a struct.
pub fn extract(identities: &Identities) -> Result<Schema, SchemaError> {
    let mut structs = Vec::with_capacity(identities.len());
    for (name, elem) in identities.iter() {
        let Elem::Struct(s) = elem else {
            return Err(SchemaError::UnsupportedShape {
                name: name.to_string(),
                shape: elem.shape_name(),
            });
        };
        let fields = s
            .fields
            .iter()
            .map(|f| SchemaField {
                zid: f.zid,
                name: f.name.clone(),
                omit_empty: f.omit_empty,
                skip: f.skip,
                type_name: if f.skip {
                    String::new()
                } else {
                    f.value.type_name()
                },
            })
            .collect();
        structs.push(SchemaStruct {
            name: s.name.clone(),
            fields,
        });
    }
    debug!(structs = structs.len(), "schema extracted");
    Ok(Schema {
        schema_id: None,
        structs,
    })
}
