//! Intermediate Representation (IR) module.
//!
//! This module defines the value-shape tree that describes how a record is
//! laid out on the wire. The IR is produced by an external front-end,
//! finalized by the [`passes`](crate::passes) pipeline, and then consumed
//! read-only by the generators and the schema extractor.

pub mod elem;
pub mod identities;

#[cfg(test)]
mod proptest;

pub use elem::{
    ArrayElem, BaseElem, BaseKind, Elem, Field, KeyKind, MapElem, PtrElem, SliceElem, StructElem,
    NO_ZID,
};
pub use identities::Identities;
