//! # zebrapack
//!
//! Synthesizes MessagePack encoders from a description of record types.
//!
//! The input is an [`Identities`] table: declared type names mapped to value
//! shapes ([`Elem`]). A [`PassPipeline`] finalizes the table, after which the
//! generators emit Rust source and the schema extractor produces a portable
//! descriptor of every struct.
//!
//! ## Protocols
//!
//! - **Tuple**: a struct encodes as an array of its live fields in
//!   declaration order. No keys.
//! - **Fast** (the default): a struct encodes as a map keyed by each field's
//!   zid. Every empty field is omitted, and the first entry, under key `-1`,
//!   carries the struct's type name as a fingerprint.
//! - **Msgp2**: a map keyed by field name (or zid, for `int64` key kind).
//!   Only fields tagged omit-empty are dropped when empty.
//!
//! ## Usage
//!
//! ```rust
//! use zebrapack::{
//!     generate_file, BaseKind, Directives, Elem, Field, GeneratorConfig, Identities, Method,
//!     PassPipeline, StructElem,
//! };
//!
//! let ids = Identities::new().with(
//!     "Point",
//!     StructElem::new(
//!         "Point",
//!         vec![
//!             Field::new("x", Elem::base(BaseKind::Int64)).with_zid(0),
//!             Field::new("y", Elem::base(BaseKind::Int64)).with_zid(1),
//!         ],
//!     ),
//! );
//! let ids = PassPipeline::standard(&Directives::default()).finalize_all(ids);
//! let (code, report) =
//!     generate_file(&ids, &GeneratorConfig::default(), &[Method::Marshal, Method::Msgsize])?;
//! assert!(report.is_clean());
//! assert!(code.contains("impl Point {"));
//! # Ok::<(), zebrapack::GenError>(())
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod fuse;
pub mod gen;
pub mod ir;
pub mod passes;
pub mod printer;
pub mod reference;
pub mod schema;
pub mod value;
pub mod wire;

pub use config::{Directives, GeneratorConfig, IndentStyle, Protocol, DEFAULT_RUNTIME_PATH};
pub use driver::{generate, generate_file, Failure, GenerateReport, FILE_HEADER};
pub use error::{GenError, GenResult, SchemaError};
pub use fuse::FusionBuffer;
pub use gen::{CodeGenerator, MarshalGen, Method, MsgsizeGen};
pub use ir::{
    ArrayElem, BaseElem, BaseKind, Elem, Field, Identities, KeyKind, MapElem, PtrElem, SliceElem,
    StructElem, NO_ZID,
};
pub use passes::{Pass, PassPipeline};
pub use printer::{CodeWriter, Printer};
pub use reference::ReferenceEncoder;
pub use schema::{extract, write_schema, Schema, SchemaDest, SchemaField, SchemaStruct};
pub use value::Value;
