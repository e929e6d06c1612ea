//! Emptiness rules for omit-empty fields.
//!
//! Shared by the encode generator, which turns them into runtime checks,
//! and the reference encoder, which evaluates them on dynamic values.

use crate::ir::{BaseKind, Elem, StructElem};
use crate::printer::CodeWriter;
use crate::value::Value;

use super::layout::{StructLayout, StructMode};
use super::{base_arg, Var};

/// How a value's emptiness is decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emptiness {
    /// Never considered empty
    Never,

    /// Numeric zero
    ZeroNumber,

    /// `false`
    False,

    /// Zero length (strings, bytes, slices, maps)
    EmptyLen,

    /// Absent pointer
    Absent,

    /// Zero timestamp
    ZeroTime,
}

impl Emptiness {
    /// Emptiness rule for a value shape.
    pub fn of(elem: &Elem) -> Self {
        match elem {
            Elem::Struct(_) | Elem::Array(_) => Emptiness::Never,
            Elem::Map(_) | Elem::Slice(_) => Emptiness::EmptyLen,
            Elem::Ptr(_) => Emptiness::Absent,
            Elem::Base(b) => match b.kind {
                BaseKind::Identifier | BaseKind::Interface | BaseKind::Extension => {
                    Emptiness::Never
                }
                BaseKind::Bool => Emptiness::False,
                BaseKind::String | BaseKind::Bytes => Emptiness::EmptyLen,
                BaseKind::Time => Emptiness::ZeroTime,
                _ => Emptiness::ZeroNumber,
            },
        }
    }

    /// Emitted boolean expression testing `var` for emptiness, or `None`
    /// when the value is never empty.
    pub fn condition(elem: &Elem, var: &Var) -> Option<String> {
        let rule = Emptiness::of(elem);
        let arg = match elem {
            Elem::Base(b) if b.needs_conversion || b.kind.is_copy() => base_arg(b, var),
            _ => var.expr().to_string(),
        };
        match rule {
            Emptiness::Never => None,
            Emptiness::ZeroNumber => {
                let zero = match elem {
                    Elem::Base(b) if b.kind.is_float() => "0.0",
                    _ => "0",
                };
                Some(format!("{} == {}", arg, zero))
            }
            Emptiness::False => Some(format!("!{}", arg)),
            Emptiness::EmptyLen => Some(format!("{}.is_empty()", arg)),
            Emptiness::Absent => Some(format!("{}.is_none()", var.expr())),
            Emptiness::ZeroTime => Some(format!("{}.is_zero()", var.expr())),
        }
    }

    /// Evaluate the rule on a dynamic value.
    ///
    /// A value of the wrong kind is reported as not empty; encoding it will
    /// then surface the mismatch.
    pub fn is_empty(&self, value: &Value) -> bool {
        match (self, value) {
            (Emptiness::Never, _) => false,
            (Emptiness::ZeroNumber, Value::Int(n)) => *n == 0,
            (Emptiness::ZeroNumber, Value::Uint(n)) => *n == 0,
            (Emptiness::ZeroNumber, Value::F32(n)) => *n == 0.0,
            (Emptiness::ZeroNumber, Value::F64(n)) => *n == 0.0,
            (Emptiness::False, Value::Bool(b)) => !*b,
            (Emptiness::EmptyLen, Value::Str(s)) => s.is_empty(),
            (Emptiness::EmptyLen, Value::Bytes(b)) => b.is_empty(),
            (Emptiness::EmptyLen, Value::Array(items)) => items.is_empty(),
            (Emptiness::EmptyLen, Value::Map(entries)) => entries.is_empty(),
            (Emptiness::Absent, Value::Nil) => true,
            (Emptiness::ZeroTime, Value::Time { secs, nanos }) => *secs == 0 && *nanos == 0,
            _ => false,
        }
    }
}

/// Emit the per-field emptiness computation for a struct.
///
/// Writes `flags[i] = <check>;` for every conditional field and decrements
/// `count`, which must already be declared and start at the live field count.
pub(crate) fn emit_checks(
    w: &mut CodeWriter,
    layout: &StructLayout<'_>,
    var: &Var,
    flags: &str,
    count: &str,
) {
    for slot in layout.slots.iter().filter(|slot| slot.conditional) {
        let field_var = var.field(&slot.field.name);
        match Emptiness::condition(&slot.field.value, &field_var) {
            Some(cond) => {
                w.line(format!("{}[{}] = {};", flags, slot.index, cond));
                w.open(format!("if {}[{}]", flags, slot.index));
                w.line(format!("{} -= 1;", count));
                w.close();
            }
            None => w.line(format!("{}[{}] = false;", flags, slot.index)),
        }
    }
}

/// Emit the `fields_not_empty` companion for a top-level struct.
pub(crate) fn emit_fields_not_empty(
    w: &mut CodeWriter,
    s: &StructElem,
    layout: &StructLayout<'_>,
    docs: bool,
) {
    debug_assert!(matches!(layout.mode, StructMode::Fast | StructMode::OmitEmpty));
    if docs {
        w.doc("Flags each empty field in `isempty` and returns how many fields are in use.");
    }
    w.open("pub fn fields_not_empty(&self, isempty: &mut [bool]) -> u32");
    w.line(format!("let mut fields_in_use: u32 = {};", s.live_count()));
    emit_checks(w, layout, &Var::place("self"), "isempty", "fields_in_use");
    w.line("fields_in_use");
    w.close();
}
