//! Size estimator generator.
//!
//! Emits `msgsize(&self) -> usize`, an upper bound on the bytes
//! `marshal_msg` appends. Sizes known at generation time are folded into a
//! pending constant the same way the encode generator fuses literal bytes,
//! and the constant is flushed at every control-flow boundary.

use tracing::debug;

use crate::config::GeneratorConfig;
use crate::error::GenResult;
use crate::ir::{ArrayElem, BaseElem, BaseKind, Elem, KeyKind, MapElem, PtrElem, SliceElem, StructElem};
use crate::printer::CodeWriter;
use crate::wire;

use super::layout::{StructLayout, StructMode};
use super::{walk, CodeGenerator, ElemVisitor, Method, Var, VarNames};

/// Generator for `msgsize`.
#[derive(Debug, Clone)]
pub struct MsgsizeGen {
    config: GeneratorConfig,
    w: CodeWriter,
    names: VarNames,
    pending: usize,
    declared: bool,
}

/// Worst-case encoded size of a scalar kind, when it does not depend on the value.
pub fn fixed_size(kind: BaseKind) -> Option<usize> {
    match kind {
        BaseKind::Bool => Some(wire::BOOL_SIZE),
        BaseKind::Int8 | BaseKind::Uint8 | BaseKind::Byte => Some(wire::INT8_SIZE),
        BaseKind::Int16 | BaseKind::Uint16 => Some(wire::INT16_SIZE),
        BaseKind::Int32 | BaseKind::Uint32 => Some(wire::INT32_SIZE),
        BaseKind::Int | BaseKind::Int64 | BaseKind::Uint | BaseKind::Uint64 => {
            Some(wire::INT64_SIZE)
        }
        BaseKind::Float32 => Some(wire::FLOAT32_SIZE),
        BaseKind::Float64 => Some(wire::FLOAT64_SIZE),
        BaseKind::Time => Some(wire::TIME_SIZE),
        BaseKind::String
        | BaseKind::Bytes
        | BaseKind::Identifier
        | BaseKind::Interface
        | BaseKind::Extension => None,
    }
}

/// Size of a value shape when it is the same for every value.
pub fn static_size(elem: &Elem) -> Option<usize> {
    match elem {
        Elem::Base(b) => fixed_size(b.kind),
        Elem::Array(a) => {
            let n = a.size_resolved?;
            if a.is_byte_array() {
                Some(wire::BYTES_PREFIX_SIZE + n)
            } else {
                Some(wire::ARRAY_HEADER_SIZE + n * static_size(&a.element)?)
            }
        }
        Elem::Struct(_) | Elem::Map(_) | Elem::Slice(_) | Elem::Ptr(_) => None,
    }
}

impl MsgsizeGen {
    /// Create a generator with the given configuration.
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            w: CodeWriter::new(config.indent),
            config,
            names: VarNames::new(),
            pending: 0,
            declared: false,
        }
    }

    fn add_const(&mut self, n: usize) {
        self.pending += n;
    }

    fn add_expr(&mut self, expr: impl AsRef<str>) {
        let expr = expr.as_ref();
        let rhs = if self.pending > 0 {
            format!("{} + {}", self.pending, expr)
        } else {
            expr.to_string()
        };
        if self.declared {
            self.w.line(format!("s += {};", rhs));
        } else {
            self.w.line(format!("let mut s: usize = {};", rhs));
            self.declared = true;
        }
        self.pending = 0;
    }

    /// Flush the pending constant ahead of a control-flow boundary.
    fn flush(&mut self) {
        if !self.declared {
            self.w.line(format!("let mut s: usize = {};", self.pending));
            self.declared = true;
        } else if self.pending > 0 {
            self.w.line(format!("s += {};", self.pending));
        }
        self.pending = 0;
    }

    fn open(&mut self, header: impl AsRef<str>) {
        self.flush();
        self.w.open(header);
    }

    fn close(&mut self) {
        self.flush();
        self.w.close();
    }
}

impl ElemVisitor for MsgsizeGen {
    fn visit_struct(&mut self, s: &StructElem, var: &Var) -> GenResult<()> {
        let layout = StructLayout::plan(s, self.config.protocol)?;
        match layout.mode {
            StructMode::Tuple | StructMode::Static => {
                self.add_const(layout.header.as_ref().map_or(0, Vec::len));
            }
            StructMode::Fast | StructMode::OmitEmpty => self.add_const(wire::MAP_HEADER_SIZE),
        }
        if let Some(fingerprint) = &layout.fingerprint {
            self.add_const(fingerprint.len());
        }
        // every field counts: omission only shrinks the encoding
        for slot in &layout.slots {
            self.add_const(slot.key.len());
            walk(self, &slot.field.value, &var.field(&slot.field.name))?;
        }
        Ok(())
    }

    fn visit_map(&mut self, m: &MapElem, var: &Var) -> GenResult<()> {
        self.add_const(wire::MAP_HEADER_SIZE);
        let suffix = self.names.next_suffix();
        let (zk, zv) = (format!("zk{}", suffix), format!("zv{}", suffix));
        self.open(format!("for ({}, {}) in {}.iter()", zk, zv, var.expr()));
        match m.key {
            KeyKind::String => {
                self.add_const(wire::STRING_PREFIX_SIZE);
                self.add_expr(format!("{}.len()", zk));
            }
            KeyKind::Int64 => self.add_const(wire::INT64_SIZE),
        }
        walk(self, &m.value, &Var::by_ref(zv))?;
        self.close();
        Ok(())
    }

    fn visit_slice(&mut self, s: &SliceElem, var: &Var) -> GenResult<()> {
        self.add_const(wire::ARRAY_HEADER_SIZE);
        if let Some(n) = static_size(&s.element) {
            self.add_expr(format!("{}.len() * {}", var.expr(), n));
            return Ok(());
        }
        let za = self.names.fresh("za");
        self.open(format!("for {} in {}.iter()", za, var.expr()));
        walk(self, &s.element, &Var::by_ref(za))?;
        self.close();
        Ok(())
    }

    fn visit_array(&mut self, a: &ArrayElem, var: &Var) -> GenResult<()> {
        a.resolved_size()?;
        if let Some(n) = static_size(&Elem::Array(a.clone())) {
            self.add_const(n);
            return Ok(());
        }
        self.add_const(wire::ARRAY_HEADER_SIZE);
        let za = self.names.fresh("za");
        self.open(format!("for {} in {}.iter()", za, var.expr()));
        walk(self, &a.element, &Var::by_ref(za))?;
        self.close();
        Ok(())
    }

    fn visit_ptr(&mut self, p: &PtrElem, var: &Var) -> GenResult<()> {
        if let Some(n) = static_size(&p.pointee) {
            self.add_const(n.max(wire::NIL_SIZE));
            return Ok(());
        }
        let zp = self.names.fresh("zp");
        self.open(format!("if let Some({}) = {}", zp, var.reference()));
        walk(self, &p.pointee, &Var::by_ref(zp))?;
        self.flush();
        self.w.reopen("} else {");
        self.add_const(wire::NIL_SIZE);
        self.close();
        Ok(())
    }

    fn visit_base(&mut self, b: &BaseElem, var: &Var) -> GenResult<()> {
        if let Some(n) = fixed_size(b.kind) {
            self.add_const(n);
            return Ok(());
        }
        match b.kind {
            BaseKind::String | BaseKind::Bytes => {
                self.add_const(wire::STRING_PREFIX_SIZE);
                let len = if b.needs_conversion {
                    super::base_arg(b, var)
                } else {
                    var.expr().to_string()
                };
                self.add_expr(format!("{}.len()", len));
            }
            BaseKind::Identifier => self.add_expr(format!("{}.msgsize()", var.expr())),
            BaseKind::Interface => self.add_expr(format!("msgp::guess_size({})", var.reference())),
            BaseKind::Extension => {
                self.add_const(wire::EXTENSION_PREFIX_SIZE);
                self.add_expr(format!("{}.len()", var.expr()));
            }
            _ => {}
        }
        Ok(())
    }
}

impl CodeGenerator for MsgsizeGen {
    fn method(&self) -> Method {
        Method::Msgsize
    }

    fn render(&mut self, name: &str, elem: &Elem) -> GenResult<Option<String>> {
        if !elem.is_printable() {
            return Ok(None);
        }
        self.w = CodeWriter::new(self.config.indent);
        self.names.reset();
        self.pending = 0;
        self.declared = false;

        self.w.open(format!("impl {}", name));
        if self.config.generate_docs {
            self.w
                .doc("Upper bound on the number of bytes `marshal_msg` appends.");
        }
        self.w.open("pub fn msgsize(&self) -> usize");
        walk(self, elem, &Var::receiver(elem))?;
        if self.declared {
            if self.pending > 0 {
                self.w.line(format!("s += {};", self.pending));
            }
            self.w.line("s");
        } else {
            self.w.line(self.pending.to_string());
        }
        self.w.close();
        self.w.close();

        debug!(identity = %name, method = %Method::Msgsize, "generated");
        let w = std::mem::replace(&mut self.w, CodeWriter::new(self.config.indent));
        Ok(Some(w.finish()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Field;
    use crate::passes::{Pass, StructMetadata};

    fn render(elem: &Elem) -> String {
        let elem = StructMetadata.apply("T", elem.clone()).unwrap();
        MsgsizeGen::new(GeneratorConfig::default().with_generate_docs(false))
            .render("T", &elem)
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_static_struct_folds_to_constant() {
        let triple: Elem = StructElem::new(
            "Triple",
            vec![
                Field::new("a", Elem::base(BaseKind::Int)),
                Field::new("b", Elem::base(BaseKind::Int)),
                Field::new("c", Elem::base(BaseKind::Int)),
            ],
        )
        .with_tuple(true)
        .into();
        let code = render(&triple);
        // 1 header byte + 3 * 9
        assert!(code.contains("        28\n"));
        assert!(!code.contains("let mut s"));
    }

    #[test]
    fn test_fast_struct_counts_header_fingerprint_and_keys() {
        let point: Elem = StructElem::new(
            "Point",
            vec![
                Field::new("x", Elem::base(BaseKind::Int64)).with_zid(0),
                Field::new("y", Elem::base(BaseKind::Int64)).with_zid(1),
            ],
        )
        .into();
        let code = render(&point);
        // 5 + 8 + (1 + 9) * 2
        assert!(code.contains("        33\n"));
    }

    #[test]
    fn test_dynamic_parts() {
        let elem: Elem = StructElem::new(
            "Doc",
            vec![
                Field::new("title", Elem::base(BaseKind::String)).with_zid(0),
                Field::new("tags", Elem::slice(Elem::base(BaseKind::String))).with_zid(1),
            ],
        )
        .into();
        let code = render(&elem);
        assert!(code.contains("let mut s: usize = 17 + self.title.len();"));
        assert!(code.contains("s += 6;"));
        assert!(code.contains("for za0001 in self.tags.iter() {"));
        assert!(code.contains("s += 5 + za0001.len();"));
    }

    #[test]
    fn test_slice_of_fixed_elements_multiplies() {
        let code = render(&Elem::slice(Elem::base(BaseKind::Int32)));
        assert!(code.contains("let mut s: usize = 5 + self.0.len() * 5;"));
    }

    #[test]
    fn test_static_sizes() {
        let mut arr = Elem::array(Elem::base(BaseKind::Byte), "32");
        assert_eq!(static_size(&arr), None);
        if let Elem::Array(a) = &mut arr {
            a.size_resolved = Some(32);
        }
        assert_eq!(static_size(&arr), Some(37));
        assert_eq!(static_size(&Elem::base(BaseKind::Time)), Some(15));
        assert_eq!(static_size(&Elem::base(BaseKind::String)), None);
    }
}
