//! Reference encoder.
//!
//! Interprets a finalized IR against a dynamic [`Value`] and produces the
//! exact bytes the emitted `marshal_msg` would. It plans structs with the
//! same [`StructLayout`], decides omission with the same [`Emptiness`]
//! rules and routes constants through the same [`FusionBuffer`], so it
//! doubles as an executable statement of the wire format.

use crate::config::{GeneratorConfig, Protocol};
use crate::error::{GenError, GenResult};
use crate::fuse::FusionBuffer;
use crate::gen::{Emptiness, StructLayout, StructMode};
use crate::ir::{ArrayElem, BaseElem, BaseKind, Elem, Identities, KeyKind, StructElem};
use crate::value::Value;
use crate::wire;

/// Evaluates encodings over a finalized Identities table.
#[derive(Debug, Clone)]
pub struct ReferenceEncoder<'a> {
    identities: &'a Identities,
    protocol: Protocol,
    fuse: bool,
}

impl<'a> ReferenceEncoder<'a> {
    /// Create an encoder using the protocol and fusion setting of `config`.
    pub fn new(identities: &'a Identities, config: &GeneratorConfig) -> Self {
        Self {
            identities,
            protocol: config.protocol,
            fuse: config.fuse,
        }
    }

    /// Encode `value` as the identity `name`.
    pub fn encode(&self, name: &str, value: &Value) -> GenResult<Vec<u8>> {
        let elem = self
            .identities
            .get(name)
            .ok_or_else(|| GenError::UnknownIdentity {
                name: name.to_string(),
            })?;
        self.encode_elem(elem, value)
    }

    /// Encode `value` as the shape `elem`.
    pub fn encode_elem(&self, elem: &Elem, value: &Value) -> GenResult<Vec<u8>> {
        let mut session = Session {
            out: Vec::new(),
            fuse: FusionBuffer::new(),
            enabled: self.fuse,
        };
        self.elem(&mut session, elem, value)?;
        session.flush();
        Ok(session.out)
    }

    fn elem(&self, s: &mut Session, elem: &Elem, value: &Value) -> GenResult<()> {
        match elem {
            Elem::Struct(st) => self.structure(s, st, value),
            Elem::Map(m) => {
                let Value::Map(entries) = value else {
                    return Err(mismatch("map", value));
                };
                s.dynamic(|b| wire::append_map_header(b, entries.len() as u32));
                for (k, v) in entries {
                    match (m.key, k) {
                        (KeyKind::String, Value::Str(k)) => s.dynamic(|b| wire::append_string(b, k)),
                        (KeyKind::Int64, Value::Int(k)) => s.dynamic(|b| wire::append_int64(b, *k)),
                        (KeyKind::String, other) => return Err(mismatch("string key", other)),
                        (KeyKind::Int64, other) => return Err(mismatch("int key", other)),
                    }
                    self.elem(s, &m.value, v)?;
                }
                Ok(())
            }
            Elem::Slice(sl) => {
                let Value::Array(items) = value else {
                    return Err(mismatch("array", value));
                };
                s.dynamic(|b| wire::append_array_header(b, items.len() as u32));
                for item in items {
                    self.elem(s, &sl.element, item)?;
                }
                Ok(())
            }
            Elem::Array(a) => self.array(s, a, value),
            Elem::Ptr(p) => match value {
                Value::Nil => {
                    s.constant(&wire::encoded(wire::append_nil));
                    Ok(())
                }
                other => self.elem(s, &p.pointee, other),
            },
            Elem::Base(b) => self.base(s, b, value),
        }
    }

    fn structure(&self, s: &mut Session, st: &StructElem, value: &Value) -> GenResult<()> {
        let Value::Record(fields) = value else {
            return Err(mismatch(&format!("record {}", st.name), value));
        };
        let layout = StructLayout::plan(st, self.protocol)?;

        let mut values = Vec::with_capacity(layout.slots.len());
        for slot in &layout.slots {
            let v = fields
                .get(&slot.field.name)
                .ok_or_else(|| GenError::MissingField {
                    struct_name: st.name.clone(),
                    field: slot.field.name.clone(),
                })?;
            let empty = slot.conditional && Emptiness::of(&slot.field.value).is_empty(v);
            values.push((v, empty));
        }

        match layout.mode {
            StructMode::Tuple | StructMode::Static => {
                if let Some(header) = &layout.header {
                    s.constant(header);
                }
            }
            StructMode::Fast | StructMode::OmitEmpty => {
                let in_use = values.iter().filter(|(_, empty)| !empty).count() as u32;
                let count = layout.dynamic_count(in_use);
                s.dynamic(|b| wire::append_map_header(b, count));
            }
        }
        if let Some(fingerprint) = &layout.fingerprint {
            s.constant(fingerprint);
        }
        for (slot, (v, empty)) in layout.slots.iter().zip(values) {
            if empty {
                continue;
            }
            s.constant(&slot.key);
            self.elem(s, &slot.field.value, v)?;
        }
        Ok(())
    }

    fn array(&self, s: &mut Session, a: &ArrayElem, value: &Value) -> GenResult<()> {
        let size = a.resolved_size()?;
        if a.is_byte_array() {
            let bytes = match value {
                Value::Bytes(bytes) => bytes.clone(),
                Value::Array(items) => items
                    .iter()
                    .map(|item| match item {
                        Value::Uint(n) => u8::try_from(*n).map_err(|_| mismatch("byte", item)),
                        other => Err(mismatch("byte", other)),
                    })
                    .collect::<GenResult<Vec<u8>>>()?,
                other => return Err(mismatch("byte array", other)),
            };
            if bytes.len() != size {
                return Err(GenError::mismatch(
                    format!("{} bytes", size),
                    format!("{} bytes", bytes.len()),
                ));
            }
            s.dynamic(|b| wire::append_bytes(b, &bytes));
            return Ok(());
        }
        let Value::Array(items) = value else {
            return Err(mismatch("array", value));
        };
        if items.len() != size {
            return Err(GenError::mismatch(
                format!("{} elements", size),
                format!("{} elements", items.len()),
            ));
        }
        s.constant(&wire::encoded(|b| wire::append_array_header(b, size as u32)));
        for item in items {
            self.elem(s, &a.element, item)?;
        }
        Ok(())
    }

    fn base(&self, s: &mut Session, b: &BaseElem, value: &Value) -> GenResult<()> {
        match (b.kind, value) {
            (BaseKind::Identifier, v) => {
                let name = b.type_name.as_deref().unwrap_or_default();
                let elem = self
                    .identities
                    .get(name)
                    .ok_or_else(|| GenError::UnknownIdentity {
                        name: name.to_string(),
                    })?;
                // the delegate writes its own bytes; nothing constant crosses the call
                s.flush();
                self.elem(s, elem, v)
            }
            (BaseKind::Interface, v) => {
                s.dynamic(|buf| append_dynamic(buf, v));
                Ok(())
            }
            (BaseKind::Extension, Value::Ext { typ, data }) => {
                s.dynamic(|buf| wire::append_ext(buf, *typ, data));
                Ok(())
            }
            (BaseKind::Bool, Value::Bool(v)) => {
                s.dynamic(|buf| wire::append_bool(buf, *v));
                Ok(())
            }
            (BaseKind::String, Value::Str(v)) => {
                s.dynamic(|buf| wire::append_string(buf, v));
                Ok(())
            }
            (BaseKind::Bytes, Value::Bytes(v)) => {
                s.dynamic(|buf| wire::append_bytes(buf, v));
                Ok(())
            }
            (BaseKind::Float32, Value::F32(v)) => {
                s.dynamic(|buf| wire::append_float32(buf, *v));
                Ok(())
            }
            (BaseKind::Float32, Value::F64(v)) => {
                s.dynamic(|buf| wire::append_float32(buf, *v as f32));
                Ok(())
            }
            (BaseKind::Float64, Value::F64(v)) => {
                s.dynamic(|buf| wire::append_float64(buf, *v));
                Ok(())
            }
            (BaseKind::Float64, Value::F32(v)) => {
                s.dynamic(|buf| wire::append_float64(buf, f64::from(*v)));
                Ok(())
            }
            (BaseKind::Time, Value::Time { secs, nanos }) => {
                s.dynamic(|buf| wire::append_time(buf, *secs, *nanos));
                Ok(())
            }
            (kind, Value::Int(v)) if kind.is_signed() => {
                s.dynamic(|buf| wire::append_int64(buf, *v));
                Ok(())
            }
            (kind, Value::Uint(v)) if kind.is_unsigned() => {
                s.dynamic(|buf| wire::append_uint64(buf, *v));
                Ok(())
            }
            (kind, other) => Err(mismatch(kind.schema_name(), other)),
        }
    }
}

/// Encode a value by inspecting its runtime kind.
pub fn append_dynamic(buf: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Nil => wire::append_nil(buf),
        Value::Bool(v) => wire::append_bool(buf, *v),
        Value::Int(v) => wire::append_int64(buf, *v),
        Value::Uint(v) => wire::append_uint64(buf, *v),
        Value::F32(v) => wire::append_float32(buf, *v),
        Value::F64(v) => wire::append_float64(buf, *v),
        Value::Str(v) => wire::append_string(buf, v),
        Value::Bytes(v) => wire::append_bytes(buf, v),
        Value::Time { secs, nanos } => wire::append_time(buf, *secs, *nanos),
        Value::Ext { typ, data } => wire::append_ext(buf, *typ, data),
        Value::Array(items) => {
            wire::append_array_header(buf, items.len() as u32);
            for item in items {
                append_dynamic(buf, item);
            }
        }
        Value::Map(entries) => {
            wire::append_map_header(buf, entries.len() as u32);
            for (k, v) in entries {
                append_dynamic(buf, k);
                append_dynamic(buf, v);
            }
        }
        Value::Record(fields) => {
            wire::append_map_header(buf, fields.len() as u32);
            for (k, v) in fields {
                wire::append_string(buf, k);
                append_dynamic(buf, v);
            }
        }
    }
}

fn mismatch(expected: &str, found: &Value) -> GenError {
    GenError::mismatch(expected, found.kind_name())
}

/// Output of one encode call.
struct Session {
    out: Vec<u8>,
    fuse: FusionBuffer,
    enabled: bool,
}

impl Session {
    fn constant(&mut self, bytes: &[u8]) {
        self.fuse.append(bytes);
        if !self.enabled {
            self.flush();
        }
    }

    fn flush(&mut self) {
        if let Some(bytes) = self.fuse.flush() {
            self.out.extend_from_slice(&bytes);
        }
    }

    fn dynamic<F: FnOnce(&mut Vec<u8>)>(&mut self, f: F) {
        self.flush();
        f(&mut self.out);
    }
}
