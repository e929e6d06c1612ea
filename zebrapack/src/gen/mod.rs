//! Code generators.
//!
//! Every generator is a recursive-descent visitor over one finalized
//! identity. The traversal skeleton lives in [`walk`]; a generator supplies
//! the per-shape emission by implementing [`ElemVisitor`], and renders a
//! whole identity through [`CodeGenerator`].

pub mod empty;
pub mod layout;
pub mod marshal;
pub mod size;

pub use empty::Emptiness;
pub use layout::{FieldSlot, StructLayout, StructMode};
pub use marshal::MarshalGen;
pub use size::MsgsizeGen;

use std::fmt;

use crate::error::GenResult;
use crate::ir::{ArrayElem, BaseElem, Elem, MapElem, PtrElem, SliceElem, StructElem};

/// Operation a generator emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// `marshal_msg`: append the encoding to a buffer
    Marshal,

    /// `msgsize`: upper bound of the encoded size
    Msgsize,
}

impl Method {
    /// Name of the emitted function.
    pub fn function_name(&self) -> &'static str {
        match self {
            Method::Marshal => "marshal_msg",
            Method::Msgsize => "msgsize",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.function_name())
    }
}

/// A generator for one [`Method`].
pub trait CodeGenerator {
    /// The method this generator emits.
    fn method(&self) -> Method;

    /// Render the impl block for one finalized identity.
    ///
    /// Returns `Ok(None)` when the identity has nothing to generate. On
    /// error nothing has been produced for the identity.
    fn render(&mut self, name: &str, elem: &Elem) -> GenResult<Option<String>>;
}

// =============================================================================
// Traversal
// =============================================================================

/// Per-shape emission callbacks.
pub trait ElemVisitor {
    fn visit_struct(&mut self, s: &StructElem, var: &Var) -> GenResult<()>;
    fn visit_map(&mut self, m: &MapElem, var: &Var) -> GenResult<()>;
    fn visit_slice(&mut self, s: &SliceElem, var: &Var) -> GenResult<()>;
    fn visit_array(&mut self, a: &ArrayElem, var: &Var) -> GenResult<()>;
    fn visit_ptr(&mut self, p: &PtrElem, var: &Var) -> GenResult<()>;
    fn visit_base(&mut self, b: &BaseElem, var: &Var) -> GenResult<()>;
}

/// Dispatch `elem` to the visitor callback for its shape.
pub fn walk<V: ElemVisitor + ?Sized>(visitor: &mut V, elem: &Elem, var: &Var) -> GenResult<()> {
    match elem {
        Elem::Struct(s) => visitor.visit_struct(s, var),
        Elem::Map(m) => visitor.visit_map(m, var),
        Elem::Slice(s) => visitor.visit_slice(s, var),
        Elem::Array(a) => visitor.visit_array(a, var),
        Elem::Ptr(p) => visitor.visit_ptr(p, var),
        Elem::Base(b) => visitor.visit_base(b, var),
    }
}

// =============================================================================
// Bindings
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Binding {
    /// The expression is a place of the value's type (`self.x`)
    Place,

    /// The expression is a reference to the value (`za0001`)
    Ref,
}

/// An expression in emitted code that denotes the value being encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Var {
    expr: String,
    binding: Binding,
}

impl Var {
    /// A place expression such as `self.x`.
    pub fn place(expr: impl Into<String>) -> Self {
        Self {
            expr: expr.into(),
            binding: Binding::Place,
        }
    }

    /// A binding that holds a reference, such as a loop variable.
    pub fn by_ref(expr: impl Into<String>) -> Self {
        Self {
            expr: expr.into(),
            binding: Binding::Ref,
        }
    }

    /// Binding for a top-level identity: struct fields hang off `self`,
    /// anything else is a newtype.
    pub fn receiver(elem: &Elem) -> Self {
        match elem {
            Elem::Struct(_) => Self::place("self"),
            _ => Self::place("self.0"),
        }
    }

    /// Expression usable as a method receiver.
    pub fn expr(&self) -> &str {
        &self.expr
    }

    /// Expression of the value itself, for `Copy` types.
    pub fn value(&self) -> String {
        match self.binding {
            Binding::Place => self.expr.clone(),
            Binding::Ref => format!("*{}", self.expr),
        }
    }

    /// Expression of a reference to the value.
    pub fn reference(&self) -> String {
        match self.binding {
            Binding::Place if self.expr == "self" => "self".to_string(),
            Binding::Place => format!("&{}", self.expr),
            Binding::Ref => self.expr.clone(),
        }
    }

    /// Place of a struct field of this value.
    pub fn field(&self, name: &str) -> Var {
        Var::place(format!("{}.{}", self.expr, name))
    }
}

/// Fresh local names for one generated function.
#[derive(Debug, Clone, Default)]
pub struct VarNames {
    next: usize,
}

impl VarNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start over, so every function numbers its locals from one.
    pub fn reset(&mut self) {
        self.next = 0;
    }

    /// Next numeric suffix.
    pub fn next_suffix(&mut self) -> String {
        self.next += 1;
        format!("{:04}", self.next)
    }

    /// Fresh name with the given prefix, such as `za0001`.
    pub fn fresh(&mut self, prefix: &str) -> String {
        format!("{}{}", prefix, self.next_suffix())
    }
}

// =============================================================================
// Shared rendering helpers
// =============================================================================

/// Render bytes as a Rust array literal body: `0x93, 0x01`.
pub fn byte_list(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("0x{:02x}", b))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Expression of a base value as the primitive its append function takes.
///
/// Values of named aliases are converted to the underlying primitive first.
pub(crate) fn base_arg(b: &BaseElem, var: &Var) -> String {
    let kind = b.kind;
    if kind.is_copy() {
        if b.needs_conversion {
            format!("{}::from({})", b.underlying_name(), var.value())
        } else {
            var.value()
        }
    } else if b.needs_conversion {
        match kind {
            crate::ir::BaseKind::String => format!("AsRef::<str>::as_ref({})", var.reference()),
            crate::ir::BaseKind::Bytes => format!("AsRef::<[u8]>::as_ref({})", var.reference()),
            _ => var.reference(),
        }
    } else {
        var.reference()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::BaseKind;

    #[test]
    fn test_var_place_and_ref() {
        let place = Var::place("self.x");
        assert_eq!(place.value(), "self.x");
        assert_eq!(place.reference(), "&self.x");
        let r = Var::by_ref("za0001");
        assert_eq!(r.value(), "*za0001");
        assert_eq!(r.reference(), "za0001");
        assert_eq!(r.field("y"), Var::place("za0001.y"));
    }

    #[test]
    fn test_receiver_binding() {
        let s = Elem::Struct(crate::ir::StructElem::new("S", vec![]));
        assert_eq!(Var::receiver(&s).field("a").expr(), "self.a");
        let ids = Elem::slice(Elem::base(BaseKind::Int64));
        assert_eq!(Var::receiver(&ids).expr(), "self.0");
    }

    #[test]
    fn test_var_names_are_sequential() {
        let mut names = VarNames::new();
        assert_eq!(names.fresh("za"), "za0001");
        assert_eq!(names.fresh("zp"), "zp0002");
        names.reset();
        assert_eq!(names.fresh("za"), "za0001");
    }

    #[test]
    fn test_byte_list() {
        assert_eq!(byte_list(&[0x93, 0x01, 0xff]), "0x93, 0x01, 0xff");
    }

    #[test]
    fn test_base_arg_conversion() {
        let plain = BaseElem::new(BaseKind::Int64);
        assert_eq!(base_arg(&plain, &Var::place("self.x")), "self.x");
        let alias = BaseElem::new(BaseKind::Float64)
            .with_type_name("Celsius")
            .with_conversion();
        assert_eq!(base_arg(&alias, &Var::by_ref("za0001")), "f64::from(*za0001)");
        let name = BaseElem::new(BaseKind::String)
            .with_type_name("Name")
            .with_conversion();
        assert_eq!(
            base_arg(&name, &Var::place("self.n")),
            "AsRef::<str>::as_ref(&self.n)"
        );
        let s = BaseElem::new(BaseKind::String);
        assert_eq!(base_arg(&s, &Var::place("self.n")), "&self.n");
    }
}
