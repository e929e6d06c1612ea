//! Value-shape definitions.
//!
//! The IR is a closed set of six shapes. Every consumer matches on [`Elem`]
//! exhaustively, so a new shape is a compile error in every generator rather
//! than a silent fall-through.

use serde::{Deserialize, Serialize};

use crate::error::{GenError, GenResult};

/// Zid carried by a field that was declared without a numeric id.
pub const NO_ZID: i64 = -1;

fn no_zid() -> i64 {
    NO_ZID
}

/// A value shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Elem {
    /// Record with ordered fields
    Struct(StructElem),

    /// Runtime-sized map
    Map(MapElem),

    /// Runtime-sized sequence
    Slice(SliceElem),

    /// Fixed-size sequence
    Array(ArrayElem),

    /// Optional indirection; absence encodes as nil
    Ptr(PtrElem),

    /// Scalar, named type, interface or extension
    Base(BaseElem),
}

impl Elem {
    /// Create a base element of the given kind.
    pub fn base(kind: BaseKind) -> Self {
        Elem::Base(BaseElem::new(kind))
    }

    /// Create a reference to a named type that encodes itself.
    pub fn ident(name: impl Into<String>) -> Self {
        Elem::Base(BaseElem::new(BaseKind::Identifier).with_type_name(name))
    }

    /// Create a slice of `element`.
    pub fn slice(element: Elem) -> Self {
        Elem::Slice(SliceElem {
            element: Box::new(element),
        })
    }

    /// Create a map from `key` to `value`.
    pub fn map(key: KeyKind, value: Elem) -> Self {
        Elem::Map(MapElem {
            key,
            value: Box::new(value),
        })
    }

    /// Create a fixed array with a declared size expression.
    pub fn array(element: Elem, size: impl Into<String>) -> Self {
        Elem::Array(ArrayElem {
            element: Box::new(element),
            size: size.into(),
            size_resolved: None,
        })
    }

    /// Create an optional indirection to `pointee`.
    pub fn ptr(pointee: Elem) -> Self {
        Elem::Ptr(PtrElem {
            pointee: Box::new(pointee),
        })
    }

    /// Short lowercase name of the shape, used in diagnostics.
    pub fn shape_name(&self) -> &'static str {
        match self {
            Elem::Struct(_) => "struct",
            Elem::Map(_) => "map",
            Elem::Slice(_) => "slice",
            Elem::Array(_) => "array",
            Elem::Ptr(_) => "pointer",
            Elem::Base(_) => "base",
        }
    }

    /// Language-neutral type string recorded in schema descriptors.
    pub fn type_name(&self) -> String {
        match self {
            Elem::Struct(s) => s.name.clone(),
            Elem::Map(m) => format!("map[{}]{}", m.key.schema_name(), m.value.type_name()),
            Elem::Slice(s) => format!("[]{}", s.element.type_name()),
            Elem::Array(a) => {
                let size = match a.size_resolved {
                    Some(n) => n.to_string(),
                    None => a.size.clone(),
                };
                format!("[{}]{}", size, a.element.type_name())
            }
            Elem::Ptr(p) => format!("*{}", p.pointee.type_name()),
            Elem::Base(b) => match &b.type_name {
                Some(name) => name.clone(),
                None => b.kind.schema_name().to_string(),
            },
        }
    }

    /// Get the struct variant, if this is one.
    pub fn as_struct(&self) -> Option<&StructElem> {
        match self {
            Elem::Struct(s) => Some(s),
            _ => None,
        }
    }

    /// Whether a top-level identity of this shape can have an encoder of its own.
    ///
    /// A bare alias of another named type, an interface or an extension has
    /// nothing to generate: the aliased type already carries the encoder.
    pub fn is_printable(&self) -> bool {
        match self {
            Elem::Base(b) => !b.kind.is_delegated(),
            _ => true,
        }
    }

    /// Pre-order traversal that stops as soon as `f` returns `false`.
    ///
    /// Returns `false` if any call to `f` did.
    pub fn try_for_each_mut<F>(&mut self, f: &mut F) -> bool
    where
        F: FnMut(&mut Elem) -> bool,
    {
        if !f(self) {
            return false;
        }
        match self {
            Elem::Struct(s) => {
                for field in s.fields.iter_mut() {
                    if !field.value.try_for_each_mut(f) {
                        return false;
                    }
                }
                true
            }
            Elem::Map(m) => m.value.try_for_each_mut(f),
            Elem::Slice(s) => s.element.try_for_each_mut(f),
            Elem::Array(a) => a.element.try_for_each_mut(f),
            Elem::Ptr(p) => p.pointee.try_for_each_mut(f),
            Elem::Base(_) => true,
        }
    }
}

/// Record shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructElem {
    /// Declared type name; also the runtime type fingerprint
    pub name: String,

    /// Fields in declaration order. This order is the tuple wire layout.
    pub fields: Vec<Field>,

    /// Encode positionally as an array instead of a keyed map
    #[serde(default)]
    pub as_tuple: bool,

    /// Key written for each field under the plain map protocol
    #[serde(default)]
    pub key_kind: KeyKind,

    /// Number of skipped fields (computed by passes)
    #[serde(default)]
    pub skip_count: usize,

    /// Whether any live field is tagged omit-empty (computed by passes)
    #[serde(default)]
    pub has_omit_empty_tags: bool,
}

impl StructElem {
    /// Create a new struct with the given fields.
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            name: name.into(),
            fields,
            as_tuple: false,
            key_kind: KeyKind::default(),
            skip_count: 0,
            has_omit_empty_tags: false,
        }
    }

    /// Set tuple encoding.
    pub fn with_tuple(mut self, as_tuple: bool) -> Self {
        self.as_tuple = as_tuple;
        self
    }

    /// Set the key kind used by the plain map protocol.
    pub fn with_key_kind(mut self, key_kind: KeyKind) -> Self {
        self.key_kind = key_kind;
        self
    }

    /// Number of fields that appear on the wire when none are omitted.
    pub fn live_count(&self) -> usize {
        self.fields.len() - self.skip_count
    }

    /// Non-skipped fields with their declaration index.
    pub fn live_fields(&self) -> impl Iterator<Item = (usize, &Field)> {
        self.fields.iter().enumerate().filter(|(_, f)| !f.skip)
    }
}

impl From<StructElem> for Elem {
    fn from(s: StructElem) -> Self {
        Elem::Struct(s)
    }
}

/// A struct field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Stable numeric key; [`NO_ZID`] when the field has none
    #[serde(default = "no_zid")]
    pub zid: i64,

    /// Declared field name
    pub name: String,

    /// Omit from keyed encodings when empty
    #[serde(default)]
    pub omit_empty: bool,

    /// Never encoded
    #[serde(default)]
    pub skip: bool,

    /// Field value shape
    pub value: Elem,
}

impl Field {
    /// Create a field without a zid.
    pub fn new(name: impl Into<String>, value: Elem) -> Self {
        Self {
            zid: NO_ZID,
            name: name.into(),
            omit_empty: false,
            skip: false,
            value,
        }
    }

    /// Set the zid.
    pub fn with_zid(mut self, zid: i64) -> Self {
        self.zid = zid;
        self
    }

    /// Tag the field omit-empty.
    pub fn with_omit_empty(mut self, omit_empty: bool) -> Self {
        self.omit_empty = omit_empty;
        self
    }

    /// Mark the field skipped.
    pub fn skipped(mut self) -> Self {
        self.skip = true;
        self
    }

    /// Whether a usable numeric id was declared.
    pub fn has_zid(&self) -> bool {
        self.zid >= 0
    }
}

/// Key kind for keyed encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyKind {
    /// Integer keys (the field zid)
    Int64,

    /// String keys (the field name)
    #[default]
    String,
}

impl KeyKind {
    /// Suffix of the runtime append primitive for keys of this kind.
    pub fn base_name(&self) -> &'static str {
        match self {
            KeyKind::Int64 => "int64",
            KeyKind::String => "string",
        }
    }

    /// Type string used in schema descriptors.
    pub fn schema_name(&self) -> &'static str {
        self.base_name()
    }
}

/// Map shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapElem {
    /// Key kind
    #[serde(default)]
    pub key: KeyKind,

    /// Value shape
    pub value: Box<Elem>,
}

/// Slice shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliceElem {
    /// Element shape
    pub element: Box<Elem>,
}

/// Fixed-size array shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayElem {
    /// Element shape
    pub element: Box<Elem>,

    /// Declared size: an integer literal or the name of a constant
    pub size: String,

    /// Concrete size, filled in by passes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_resolved: Option<usize>,
}

impl ArrayElem {
    /// The concrete size, which passes must have filled in.
    pub fn resolved_size(&self) -> GenResult<usize> {
        self.size_resolved.ok_or_else(|| GenError::UnresolvedArraySize {
            size: self.size.clone(),
        })
    }

    /// Whether the array is encoded as one binary blob.
    pub fn is_byte_array(&self) -> bool {
        matches!(&*self.element, Elem::Base(b) if b.kind.is_single_byte())
    }
}

/// Optional indirection shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PtrElem {
    /// Shape behind the indirection
    pub pointee: Box<Elem>,
}

/// Base shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseElem {
    /// Underlying kind
    pub kind: BaseKind,

    /// Declared named type, for identifiers and named aliases
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,

    /// Convert to the underlying primitive before appending
    #[serde(default)]
    pub needs_conversion: bool,
}

impl BaseElem {
    /// Create a base element of the given kind.
    pub fn new(kind: BaseKind) -> Self {
        Self {
            kind,
            type_name: None,
            needs_conversion: false,
        }
    }

    /// Set the declared named type.
    pub fn with_type_name(mut self, name: impl Into<String>) -> Self {
        self.type_name = Some(name.into());
        self
    }

    /// Mark as a named alias that must be converted to its primitive.
    pub fn with_conversion(mut self) -> Self {
        self.needs_conversion = true;
        self
    }

    /// Name of the type the value is appended as.
    ///
    /// For identifiers this is the declared type; for everything else the
    /// primitive Rust type of the kind.
    pub fn underlying_name(&self) -> &str {
        match (self.kind, &self.type_name) {
            (BaseKind::Identifier, Some(name)) => name.as_str(),
            (kind, _) => kind.rust_type().unwrap_or_else(|| kind.base_name()),
        }
    }
}

impl From<BaseElem> for Elem {
    fn from(b: BaseElem) -> Self {
        Elem::Base(b)
    }
}

/// Kind of a base element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseKind {
    // ==========================================================================
    // Delegated kinds
    // ==========================================================================
    /// Named type implementing the encode contract itself
    Identifier,

    /// Dynamically typed value
    Interface,

    /// MessagePack extension value
    Extension,

    // ==========================================================================
    // Scalars
    // ==========================================================================
    Bytes,
    String,
    Float32,
    Float64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Byte,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Bool,
    Time,
}

impl BaseKind {
    /// Suffix of the runtime append primitive (`append_<base_name>`).
    pub fn base_name(&self) -> &'static str {
        match self {
            BaseKind::Identifier => "ident",
            BaseKind::Interface => "intf",
            BaseKind::Extension => "extension",
            BaseKind::Bytes => "bytes",
            BaseKind::String => "string",
            BaseKind::Float32 => "float32",
            BaseKind::Float64 => "float64",
            BaseKind::Uint => "uint",
            BaseKind::Uint8 => "uint8",
            BaseKind::Uint16 => "uint16",
            BaseKind::Uint32 => "uint32",
            BaseKind::Uint64 => "uint64",
            BaseKind::Byte => "byte",
            BaseKind::Int => "int",
            BaseKind::Int8 => "int8",
            BaseKind::Int16 => "int16",
            BaseKind::Int32 => "int32",
            BaseKind::Int64 => "int64",
            BaseKind::Bool => "bool",
            BaseKind::Time => "time",
        }
    }

    /// Type string used in schema descriptors.
    pub fn schema_name(&self) -> &'static str {
        match self {
            BaseKind::Identifier => "identifier",
            BaseKind::Interface => "interface",
            other => other.base_name(),
        }
    }

    /// Primitive Rust type of a scalar kind.
    pub fn rust_type(&self) -> Option<&'static str> {
        match self {
            BaseKind::Bytes => Some("Vec<u8>"),
            BaseKind::String => Some("String"),
            BaseKind::Float32 => Some("f32"),
            BaseKind::Float64 => Some("f64"),
            BaseKind::Uint | BaseKind::Uint64 => Some("u64"),
            BaseKind::Uint8 | BaseKind::Byte => Some("u8"),
            BaseKind::Uint16 => Some("u16"),
            BaseKind::Uint32 => Some("u32"),
            BaseKind::Int | BaseKind::Int64 => Some("i64"),
            BaseKind::Int8 => Some("i8"),
            BaseKind::Int16 => Some("i16"),
            BaseKind::Int32 => Some("i32"),
            BaseKind::Bool => Some("bool"),
            BaseKind::Identifier | BaseKind::Interface | BaseKind::Extension | BaseKind::Time => {
                None
            }
        }
    }

    /// Whether encoding is delegated to something that may fail.
    pub fn is_delegated(&self) -> bool {
        matches!(
            self,
            BaseKind::Identifier | BaseKind::Interface | BaseKind::Extension
        )
    }

    /// Whether a fixed array of this kind is written as one binary blob.
    pub fn is_single_byte(&self) -> bool {
        matches!(self, BaseKind::Byte | BaseKind::Uint8)
    }

    /// Whether the kind is a signed integer.
    pub fn is_signed(&self) -> bool {
        matches!(
            self,
            BaseKind::Int | BaseKind::Int8 | BaseKind::Int16 | BaseKind::Int32 | BaseKind::Int64
        )
    }

    /// Whether the kind is an unsigned integer.
    pub fn is_unsigned(&self) -> bool {
        matches!(
            self,
            BaseKind::Uint
                | BaseKind::Uint8
                | BaseKind::Uint16
                | BaseKind::Uint32
                | BaseKind::Uint64
                | BaseKind::Byte
        )
    }

    /// Whether the kind is a float.
    pub fn is_float(&self) -> bool {
        matches!(self, BaseKind::Float32 | BaseKind::Float64)
    }

    /// Whether values are passed to primitives by value rather than by reference.
    pub fn is_copy(&self) -> bool {
        self.is_signed() || self.is_unsigned() || self.is_float() || *self == BaseKind::Bool
    }
}
