//! Snapshot tests for emitted encoder source.
//!
//! These tests use insta to capture and verify the exact generated code.
//! Run `cargo insta review` to review and accept snapshot changes.

use zebrapack::{
    generate_file, BaseKind, CodeGenerator, Directives, Elem, Field, GeneratorConfig, Identities,
    KeyKind, MarshalGen, Method, PassPipeline, Protocol, StructElem,
};

fn point() -> StructElem {
    StructElem::new(
        "Point",
        vec![
            Field::new("x", Elem::base(BaseKind::Int64)).with_zid(0),
            Field::new("y", Elem::base(BaseKind::Int64)).with_zid(1),
        ],
    )
}

fn finalize(ids: Identities, directives: &Directives) -> Identities {
    PassPipeline::standard(directives).finalize_all(ids)
}

// =============================================================================
// Fast protocol
// =============================================================================

#[test]
fn snapshot_point_fast_file() {
    let ids = finalize(
        Identities::new().with("Point", point()),
        &Directives::default(),
    );
    let (code, report) = generate_file(
        &ids,
        &GeneratorConfig::default(),
        &[Method::Marshal, Method::Msgsize],
    )
    .unwrap();
    assert!(report.is_clean());

    insta::assert_snapshot!("point_fast_file", code);
}

#[test]
fn snapshot_nested_inline_struct() {
    let line = StructElem::new(
        "Line",
        vec![
            Field::new("start", point().into()).with_zid(0),
            Field::new("label", Elem::base(BaseKind::String)).with_zid(1),
        ],
    );
    let ids = finalize(Identities::new().with("Line", line), &Directives::default());
    let code = MarshalGen::new(GeneratorConfig::default())
        .render("Line", ids.get("Line").unwrap())
        .unwrap()
        .unwrap();

    insta::assert_snapshot!("nested_inline_struct", code);
}

// =============================================================================
// Plain map protocol
// =============================================================================

#[test]
fn snapshot_omit_empty_string_keys() {
    let order = StructElem::new(
        "Order",
        vec![
            Field::new("id", Elem::base(BaseKind::Uint64)).with_zid(0),
            Field::new("note", Elem::base(BaseKind::String))
                .with_zid(1)
                .with_omit_empty(true),
            Field::new("items", Elem::slice(Elem::ident("Item"))).with_zid(2),
            Field::new(
                "attrs",
                Elem::map(KeyKind::String, Elem::base(BaseKind::String)),
            )
            .with_zid(3),
            Field::new("cache", Elem::base(BaseKind::Bool)).skipped(),
            Field::new("hash", Elem::array(Elem::base(BaseKind::Byte), "HashLen")).with_zid(5),
            Field::new("parent", Elem::ptr(Elem::base(BaseKind::Int64))).with_zid(6),
        ],
    );
    let ids = finalize(
        Identities::new().with("Order", order),
        &Directives::new().with_constant("HashLen", 4),
    );
    let code = MarshalGen::new(GeneratorConfig::default().with_protocol(Protocol::Msgp2))
        .render("Order", ids.get("Order").unwrap())
        .unwrap()
        .unwrap();

    insta::assert_snapshot!("omit_empty_string_keys", code);
}
