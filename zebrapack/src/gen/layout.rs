//! Struct wire layout.
//!
//! Decides, once per struct and protocol, how the struct goes on the wire:
//! which header, which key bytes per field, and which fields are guarded by
//! a runtime emptiness check. Zid validation happens here so that every
//! consumer (encode generator, size generator, reference encoder) fails the
//! same way on the same input.

use std::collections::HashMap;

use crate::config::Protocol;
use crate::error::{GenError, GenResult};
use crate::ir::{Field, KeyKind, StructElem};
use crate::wire;

/// Encoding mode of a struct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructMode {
    /// Positional array; header count known at generation time
    Tuple,

    /// Zid-keyed map, every field omitted when empty, type fingerprint first
    Fast,

    /// Keyed map where tagged fields are omitted when empty
    OmitEmpty,

    /// Keyed map with a header count known at generation time
    Static,
}

impl StructMode {
    /// Whether the header count is only known at runtime.
    pub fn is_dynamic(&self) -> bool {
        matches!(self, StructMode::Fast | StructMode::OmitEmpty)
    }
}

/// One live field in wire order.
#[derive(Debug, Clone)]
pub struct FieldSlot<'a> {
    /// Declaration index, also the index into the emptiness flags
    pub index: usize,

    /// The field
    pub field: &'a Field,

    /// Encoded key; empty for tuple encoding
    pub key: Vec<u8>,

    /// Guarded by a runtime emptiness check
    pub conditional: bool,
}

/// Wire layout of one struct.
#[derive(Debug, Clone)]
pub struct StructLayout<'a> {
    /// Struct name
    pub name: &'a str,

    /// Encoding mode
    pub mode: StructMode,

    /// Encoded header when its count is static
    pub header: Option<Vec<u8>>,

    /// Encoded `-1: name` fingerprint entry under the fast protocol
    pub fingerprint: Option<Vec<u8>>,

    /// Keys are zids rather than names
    pub int_keys: bool,

    /// Number of fields the flags array covers (declared, including skipped)
    pub declared: usize,

    /// Number of live fields
    pub live: usize,

    /// Live fields in declaration order
    pub slots: Vec<FieldSlot<'a>>,
}

impl<'a> StructLayout<'a> {
    /// Plan the layout of `s` under `protocol`.
    pub fn plan(s: &'a StructElem, protocol: Protocol) -> GenResult<Self> {
        let live = s.live_count();
        let mode = if s.as_tuple {
            StructMode::Tuple
        } else if protocol.is_fast() {
            StructMode::Fast
        } else if s.has_omit_empty_tags {
            StructMode::OmitEmpty
        } else {
            StructMode::Static
        };

        let int_keys = match mode {
            StructMode::Tuple => false,
            StructMode::Fast => true,
            StructMode::OmitEmpty | StructMode::Static => s.key_kind == KeyKind::Int64,
        };
        if int_keys {
            validate_zids(s)?;
        }

        let header = match mode {
            StructMode::Tuple => Some(wire::encoded(|b| wire::append_array_header(b, live as u32))),
            StructMode::Static => Some(wire::encoded(|b| wire::append_map_header(b, live as u32))),
            StructMode::Fast | StructMode::OmitEmpty => None,
        };

        let fingerprint = match mode {
            StructMode::Fast => Some(wire::encoded(|b| {
                wire::append_negative_one_and_string_as_bytes(b, s.name.as_bytes())
            })),
            _ => None,
        };

        let slots = s
            .live_fields()
            .map(|(index, field)| {
                let key = match mode {
                    StructMode::Tuple => Vec::new(),
                    _ if int_keys => wire::encoded(|b| wire::append_int64(b, field.zid)),
                    _ => wire::encoded(|b| wire::append_string(b, &field.name)),
                };
                let conditional = match mode {
                    StructMode::Fast => true,
                    StructMode::OmitEmpty => field.omit_empty,
                    StructMode::Tuple | StructMode::Static => false,
                };
                FieldSlot {
                    index,
                    field,
                    key,
                    conditional,
                }
            })
            .collect();

        Ok(Self {
            name: &s.name,
            mode,
            header,
            fingerprint,
            int_keys,
            declared: s.fields.len(),
            live,
            slots,
        })
    }

    /// Map header count for a given number of fields in use.
    pub fn dynamic_count(&self, fields_in_use: u32) -> u32 {
        match self.mode {
            StructMode::Fast => fields_in_use + 1,
            _ => fields_in_use,
        }
    }

    /// Whether any field needs a runtime emptiness check.
    pub fn has_conditional(&self) -> bool {
        self.slots.iter().any(|slot| slot.conditional)
    }
}

/// Every live field must carry a non-negative zid, pairwise distinct.
fn validate_zids(s: &StructElem) -> GenResult<()> {
    let mut seen: HashMap<i64, &str> = HashMap::new();
    for (_, field) in s.live_fields() {
        if !field.has_zid() {
            return Err(GenError::missing_zid(&s.name, &field.name));
        }
        if let Some(first) = seen.insert(field.zid, &field.name) {
            return Err(GenError::DuplicateZid {
                struct_name: s.name.clone(),
                zid: field.zid,
                first: first.to_string(),
                second: field.name.clone(),
            });
        }
    }
    Ok(())
}
