//! Property-based tests for the IR and the pass pipeline.

#[cfg(test)]
mod tests {
    use crate::config::Directives;
    use crate::ir::{BaseKind, Elem, Field, KeyKind, StructElem};
    use crate::passes::PassPipeline;
    use proptest::collection;
    use proptest::prelude::*;

    // ==========================================================================
    // Strategies
    // ==========================================================================

    fn arb_scalar_kind() -> impl Strategy<Value = BaseKind> {
        prop_oneof![
            3 => Just(BaseKind::Int64),
            2 => Just(BaseKind::String),
            1 => Just(BaseKind::Int8),
            1 => Just(BaseKind::Int32),
            1 => Just(BaseKind::Uint16),
            1 => Just(BaseKind::Uint64),
            1 => Just(BaseKind::Byte),
            1 => Just(BaseKind::Float32),
            1 => Just(BaseKind::Float64),
            1 => Just(BaseKind::Bool),
            1 => Just(BaseKind::Bytes),
            1 => Just(BaseKind::Time),
        ]
    }

    fn arb_leaf() -> impl Strategy<Value = Elem> {
        prop_oneof![
            4 => arb_scalar_kind().prop_map(Elem::base),
            1 => "[A-Z][a-z]{0,8}".prop_map(Elem::ident),
            1 => Just(Elem::base(BaseKind::Interface)),
        ]
    }

    fn arb_fields(value: BoxedStrategy<Elem>) -> impl Strategy<Value = Vec<Field>> {
        collection::vec(
            (value, -1i64..16, any::<bool>(), prop::bool::weighted(0.2)),
            0..6,
        )
        .prop_map(|raw| {
            raw.into_iter()
                .enumerate()
                .map(|(i, (value, zid, omit_empty, skip))| Field {
                    zid,
                    name: format!("f{}", i),
                    omit_empty,
                    skip,
                    value,
                })
                .collect()
        })
    }

    fn arb_elem() -> impl Strategy<Value = Elem> {
        arb_leaf().prop_recursive(3, 32, 5, |inner| {
            prop_oneof![
                inner.clone().prop_map(Elem::slice),
                (any::<bool>(), inner.clone()).prop_map(|(int, v)| {
                    let key = if int { KeyKind::Int64 } else { KeyKind::String };
                    Elem::map(key, v)
                }),
                (inner.clone(), 0usize..8).prop_map(|(e, n)| Elem::array(e, n.to_string())),
                inner.clone().prop_map(Elem::ptr),
                (arb_fields(inner.boxed()), any::<bool>()).prop_map(|(fields, tuple)| {
                    StructElem::new("Inner", fields).with_tuple(tuple).into()
                }),
            ]
        })
    }

    fn arb_struct() -> impl Strategy<Value = Elem> {
        (arb_fields(arb_elem().boxed()), any::<bool>()).prop_map(|(fields, tuple)| {
            StructElem::new("Top", fields).with_tuple(tuple).into()
        })
    }

    fn collect_structs(elem: &Elem, out: &mut Vec<StructElem>) {
        match elem {
            Elem::Struct(s) => {
                out.push(s.clone());
                for f in &s.fields {
                    collect_structs(&f.value, out);
                }
            }
            Elem::Map(m) => collect_structs(&m.value, out),
            Elem::Slice(s) => collect_structs(&s.element, out),
            Elem::Array(a) => collect_structs(&a.element, out),
            Elem::Ptr(p) => collect_structs(&p.pointee, out),
            Elem::Base(_) => {}
        }
    }

    // ==========================================================================
    // Properties
    // ==========================================================================

    proptest! {
        #[test]
        fn prop_json_roundtrip(elem in arb_elem()) {
            let json = serde_json::to_string(&elem).unwrap();
            let back: Elem = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(back, elem);
        }

        #[test]
        fn prop_pipeline_is_idempotent(elem in arb_struct()) {
            let pipeline = PassPipeline::standard(&Directives::default());
            if let Some(once) = pipeline.finalize("Top", elem) {
                let twice = pipeline.finalize("Top", once.clone());
                prop_assert_eq!(twice, Some(once));
            }
        }

        #[test]
        fn prop_metadata_matches_fields(elem in arb_struct()) {
            let pipeline = PassPipeline::standard(&Directives::default());
            let finalized = pipeline.finalize("Top", elem).unwrap();
            let mut structs = Vec::new();
            collect_structs(&finalized, &mut structs);
            for s in structs {
                let skipped = s.fields.iter().filter(|f| f.skip).count();
                prop_assert_eq!(s.skip_count, skipped);
                prop_assert_eq!(s.live_count() + skipped, s.fields.len());
                prop_assert_eq!(
                    s.has_omit_empty_tags,
                    s.fields.iter().any(|f| !f.skip && f.omit_empty)
                );
            }
        }

        #[test]
        fn prop_passes_never_reorder_fields(elem in arb_struct()) {
            let before: Vec<String> = elem
                .as_struct()
                .unwrap()
                .fields
                .iter()
                .map(|f| f.name.clone())
                .collect();
            let pipeline = PassPipeline::standard(&Directives::new().with_tuple("Top"));
            let finalized = pipeline.finalize("Top", elem).unwrap();
            let after: Vec<String> = finalized
                .as_struct()
                .unwrap()
                .fields
                .iter()
                .map(|f| f.name.clone())
                .collect();
            prop_assert_eq!(before, after);
        }

        #[test]
        fn prop_literal_array_sizes_resolve(elem in arb_elem()) {
            let pipeline = PassPipeline::standard(&Directives::default());
            if let Some(mut finalized) = pipeline.finalize("T", elem) {
                let all_resolved = finalized.try_for_each_mut(&mut |e| match e {
                    Elem::Array(a) => a.size_resolved == a.size.parse().ok(),
                    _ => true,
                });
                prop_assert!(all_resolved);
            }
        }
    }
}
