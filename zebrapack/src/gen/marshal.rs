//! Encode generator.
//!
//! Emits `marshal_msg(&self, b: Vec<u8>) -> Result<Vec<u8>, msgp::Error>`
//! for each printable identity. Bytes known at generation time go through a
//! [`FusionBuffer`] and are written as one `o.extend_from_slice(&[..])` per
//! run; everything else calls the runtime primitives through `msgp::`.

use tracing::debug;

use crate::config::GeneratorConfig;
use crate::error::GenResult;
use crate::fuse::FusionBuffer;
use crate::ir::{ArrayElem, BaseElem, BaseKind, Elem, KeyKind, MapElem, PtrElem, SliceElem, StructElem};
use crate::printer::CodeWriter;
use crate::wire;

use super::empty::{emit_checks, emit_fields_not_empty};
use super::layout::{StructLayout, StructMode};
use super::{base_arg, byte_list, walk, CodeGenerator, ElemVisitor, Method, Var, VarNames};

/// Generator for `marshal_msg`.
#[derive(Debug, Clone)]
pub struct MarshalGen {
    config: GeneratorConfig,
    w: CodeWriter,
    fuse: FusionBuffer,
    notes: Vec<String>,
    names: VarNames,
}

impl MarshalGen {
    /// Create a generator with the given configuration.
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            w: CodeWriter::new(config.indent),
            config,
            fuse: FusionBuffer::new(),
            notes: Vec::new(),
            names: VarNames::new(),
        }
    }

    /// Queue constant bytes, described by `note`.
    ///
    /// The note is written as a comment above the statement that finally
    /// writes the run, joined with the notes of the rest of the run.
    fn constant(&mut self, note: String, bytes: &[u8]) {
        self.notes.push(note);
        self.fuse.append(bytes);
        if !self.config.fuse {
            self.flush();
        }
    }

    /// Write out any queued constant bytes.
    fn flush(&mut self) {
        if let Some(bytes) = self.fuse.flush() {
            if !self.notes.is_empty() {
                self.w.comment(self.notes.join("; "));
            }
            self.w
                .line(format!("o.extend_from_slice(&[{}]);", byte_list(&bytes)));
        }
        self.notes.clear();
    }

    /// Emit a runtime-dependent statement.
    fn dynamic(&mut self, stmt: impl AsRef<str>) {
        self.flush();
        self.w.line(stmt);
    }

    /// Open a control-flow block.
    fn open(&mut self, header: impl AsRef<str>) {
        self.flush();
        self.w.open(header);
    }

    /// Switch to the next arm of a block, such as `} else {`.
    fn reopen(&mut self, text: &str) {
        self.flush();
        self.w.reopen(text);
    }

    /// Close a control-flow block.
    fn close(&mut self) {
        self.flush();
        self.w.close();
    }

    fn tuple(&mut self, layout: &StructLayout<'_>, var: &Var) -> GenResult<()> {
        if let Some(header) = &layout.header {
            self.constant(format!("array header, size {}", layout.live), header);
        }
        for slot in &layout.slots {
            walk(self, &slot.field.value, &var.field(&slot.field.name))?;
        }
        Ok(())
    }

    fn map_struct(&mut self, layout: &StructLayout<'_>, var: &Var, top: bool) -> GenResult<()> {
        let (flags, count) = if layout.mode.is_dynamic() {
            self.flush();
            self.w.blank();
            self.w.comment("honor the omitempty tags");
            if top {
                self.w.line(format!("let mut empty = [false; {}];", layout.declared));
                self.w
                    .line("let fields_in_use = self.fields_not_empty(&mut empty);");
                ("empty".to_string(), "fields_in_use".to_string())
            } else {
                let suffix = self.names.next_suffix();
                let flags = format!("empty{}", suffix);
                let count = format!("fields_in_use{}", suffix);
                self.w
                    .line(format!("let mut {} = [false; {}];", flags, layout.declared));
                self.w
                    .line(format!("let mut {}: u32 = {};", count, layout.live));
                emit_checks(&mut self.w, layout, var, &flags, &count);
                (flags, count)
            }
        } else {
            (String::new(), String::new())
        };

        match layout.mode {
            StructMode::Fast => {
                self.w.line(format!(
                    "msgp::append_map_header(&mut o, {} + 1);",
                    count
                ));
            }
            StructMode::OmitEmpty => {
                self.w
                    .line(format!("msgp::append_map_header(&mut o, {});", count));
            }
            StructMode::Static | StructMode::Tuple => {
                if let Some(header) = &layout.header {
                    self.constant(format!("map header, size {}", layout.live), header);
                }
            }
        }

        if let Some(fingerprint) = &layout.fingerprint {
            self.constant(
                format!("runtime struct type identification for '{}'", layout.name),
                fingerprint,
            );
        }

        for slot in &layout.slots {
            if slot.conditional {
                self.open(format!("if !{}[{}]", flags, slot.index));
            }
            let note = if layout.int_keys {
                format!("zid {} for {:?}", slot.field.zid, slot.field.name)
            } else {
                format!("string {:?}", slot.field.name)
            };
            self.constant(note, &slot.key);
            walk(self, &slot.field.value, &var.field(&slot.field.name))?;
            if slot.conditional {
                self.close();
            }
        }
        Ok(())
    }

    fn struct_body(&mut self, s: &StructElem, var: &Var, top: bool) -> GenResult<()> {
        let layout = StructLayout::plan(s, self.config.protocol)?;
        match layout.mode {
            StructMode::Tuple => self.tuple(&layout, var),
            _ => self.map_struct(&layout, var, top),
        }
    }
}

impl ElemVisitor for MarshalGen {
    fn visit_struct(&mut self, s: &StructElem, var: &Var) -> GenResult<()> {
        self.struct_body(s, var, false)
    }

    fn visit_map(&mut self, m: &MapElem, var: &Var) -> GenResult<()> {
        let suffix = self.names.next_suffix();
        let (zk, zv) = (format!("zk{}", suffix), format!("zv{}", suffix));
        self.dynamic(format!(
            "msgp::append_map_header(&mut o, {}.len() as u32);",
            var.expr()
        ));
        self.open(format!("for ({}, {}) in {}.iter()", zk, zv, var.expr()));
        match m.key {
            KeyKind::String => self.dynamic(format!("msgp::append_string(&mut o, {});", zk)),
            KeyKind::Int64 => self.dynamic(format!("msgp::append_int64(&mut o, *{});", zk)),
        }
        walk(self, &m.value, &Var::by_ref(zv))?;
        self.close();
        Ok(())
    }

    fn visit_slice(&mut self, s: &SliceElem, var: &Var) -> GenResult<()> {
        let za = self.names.fresh("za");
        self.dynamic(format!(
            "msgp::append_array_header(&mut o, {}.len() as u32);",
            var.expr()
        ));
        self.open(format!("for {} in {}.iter()", za, var.expr()));
        walk(self, &s.element, &Var::by_ref(za))?;
        self.close();
        Ok(())
    }

    fn visit_array(&mut self, a: &ArrayElem, var: &Var) -> GenResult<()> {
        let size = a.resolved_size()?;
        if a.is_byte_array() {
            self.dynamic(format!("msgp::append_bytes(&mut o, &{}[..]);", var.expr()));
            return Ok(());
        }
        self.constant(
            format!("array header, size {}", size),
            &wire::encoded(|b| wire::append_array_header(b, size as u32)),
        );
        let za = self.names.fresh("za");
        self.open(format!("for {} in {}.iter()", za, var.expr()));
        walk(self, &a.element, &Var::by_ref(za))?;
        self.close();
        Ok(())
    }

    fn visit_ptr(&mut self, p: &PtrElem, var: &Var) -> GenResult<()> {
        let zp = self.names.fresh("zp");
        self.open(format!("if let Some({}) = {}", zp, var.reference()));
        walk(self, &p.pointee, &Var::by_ref(zp))?;
        self.reopen("} else {");
        self.constant("nil".to_string(), &wire::encoded(wire::append_nil));
        self.close();
        Ok(())
    }

    fn visit_base(&mut self, b: &BaseElem, var: &Var) -> GenResult<()> {
        match b.kind {
            BaseKind::Identifier => {
                self.dynamic(format!("o = {}.marshal_msg(o)?;", var.expr()));
            }
            BaseKind::Interface | BaseKind::Extension => {
                self.dynamic(format!(
                    "msgp::append_{}(&mut o, {})?;",
                    b.kind.base_name(),
                    var.reference()
                ));
            }
            kind => {
                self.dynamic(format!(
                    "msgp::append_{}(&mut o, {});",
                    kind.base_name(),
                    base_arg(b, var)
                ));
            }
        }
        Ok(())
    }
}

impl CodeGenerator for MarshalGen {
    fn method(&self) -> Method {
        Method::Marshal
    }

    fn render(&mut self, name: &str, elem: &Elem) -> GenResult<Option<String>> {
        if !elem.is_printable() {
            return Ok(None);
        }
        self.w = CodeWriter::new(self.config.indent);
        self.fuse.clear();
        self.notes.clear();
        self.names.reset();

        let var = Var::receiver(elem);
        self.w.open(format!("impl {}", name));
        if self.config.generate_docs {
            self.w
                .doc("Appends the MessagePack encoding of `self` to `b`.");
        }
        self.w
            .open("pub fn marshal_msg(&self, b: Vec<u8>) -> Result<Vec<u8>, msgp::Error>");
        self.w
            .line("let mut o = msgp::require(b, self.msgsize());");

        let mut companion = None;
        match elem {
            Elem::Struct(s) => {
                let layout = StructLayout::plan(s, self.config.protocol)?;
                if layout.mode.is_dynamic() {
                    companion = Some(s);
                }
                self.struct_body(s, &var, true)?;
            }
            other => walk(self, other, &var)?,
        }

        self.flush();
        self.w.line("Ok(o)");
        self.w.close();

        if let Some(s) = companion {
            let layout = StructLayout::plan(s, self.config.protocol)?;
            self.w.blank();
            emit_fields_not_empty(&mut self.w, s, &layout, self.config.generate_docs);
        }
        self.w.close();

        debug!(identity = %name, method = %Method::Marshal, "generated");
        let w = std::mem::replace(&mut self.w, CodeWriter::new(self.config.indent));
        Ok(Some(w.finish()))
    }
}
