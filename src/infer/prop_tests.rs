//! Property-based tests for unification and generalization.

use proptest::prelude::*;

use crate::error::TypeError;
use crate::types::{RecordType, Type, TypeId, VarId};

use super::registry::Registry;

/// Variables every generated type may refer to.
const HOLES: u32 = 4;

fn registry_with_holes() -> Registry {
    let mut registry = Registry::new();
    for _ in 0..HOLES {
        registry.fresh_var_id();
    }
    registry
}

fn primitive_strategy() -> impl Strategy<Value = Type> {
    prop_oneof![
        Just(Type::Int),
        Just(Type::Float),
        Just(Type::Bool),
        Just(Type::String),
        Just(Type::Char),
        Just(Type::Unit),
    ]
}

fn compound(leaf: impl Strategy<Value = Type> + 'static) -> impl Strategy<Value = Type> {
    leaf.prop_recursive(3, 16, 3, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(arg, ret)| Type::func(arg, ret)),
            prop::collection::vec(inner.clone(), 2..4).prop_map(Type::Tuple),
            prop::collection::btree_map("[a-d]", inner.clone(), 0..3)
                .prop_map(|fields| Type::Record(RecordType::closed(fields))),
            (0u32..2, prop::collection::vec(inner, 0..2)).prop_map(|(id, args)| {
                let args = args
                    .into_iter()
                    .enumerate()
                    .map(|(i, t)| (format!("p{}", i), t))
                    .collect();
                Type::variant(TypeId(id), args)
            }),
        ]
    })
}

/// Types without variables.
fn closed_type_strategy() -> impl Strategy<Value = Type> {
    compound(primitive_strategy())
}

/// Types whose leaves may be one of the pre-allocated variables.
fn type_strategy() -> impl Strategy<Value = Type> {
    compound(prop_oneof![
        3 => primitive_strategy(),
        1 => (0..HOLES).prop_map(|n| Type::Var(VarId(n))),
    ])
}

fn labels_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set("[a-e]", 0..4).prop_map(|set| set.into_iter().collect())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_unify_reflexive(ty in type_strategy()) {
        let mut registry = registry_with_holes();
        prop_assert!(registry.unify(&ty, &ty).is_ok());
        prop_assert_eq!(registry.var_count(), HOLES as usize);
        for n in 0..HOLES {
            prop_assert!(registry.binding(VarId(n)).is_none());
        }
    }

    #[test]
    fn prop_unify_outcome_symmetric(a in type_strategy(), b in type_strategy()) {
        let mut left = registry_with_holes();
        let mut right = registry_with_holes();
        let forward = left.unify(&a, &b);
        let backward = right.unify(&b, &a);
        prop_assert_eq!(
            forward.is_err(),
            backward.is_err(),
            "unify({}, {}) = {:?} but reversed = {:?}", a, b, forward, backward
        );
    }

    #[test]
    fn prop_unified_types_share_shape(a in type_strategy(), b in type_strategy()) {
        let mut registry = registry_with_holes();
        if registry.unify(&a, &b).is_ok() {
            prop_assert!(registry.same_shape(&a, &b));
        }
    }

    #[test]
    fn prop_occurs_check(ty in type_strategy(), through_chain in any::<bool>()) {
        let mut registry = registry_with_holes();
        let var = VarId(0);
        let inner = if through_chain {
            registry.bind(VarId(1), Type::Var(var)).unwrap();
            Type::Var(VarId(1))
        } else {
            Type::Var(var)
        };
        let cyclic = Type::func(inner, ty);

        let result = registry.unify(&Type::Var(var), &cyclic);
        prop_assert!(matches!(result, Err(TypeError::Cyclic { .. })), "{:?}", result);
        prop_assert!(registry.binding(var).is_none());
    }

    #[test]
    fn prop_generalize_closed_round_trip(ty in closed_type_strategy()) {
        let mut registry = Registry::new();
        let scheme = registry.generalize(&ty);
        prop_assert!(scheme.vars.is_empty());
        prop_assert_eq!(&scheme.body, &ty);
        let instance = registry.instantiate(&scheme);
        prop_assert!(registry.same_shape(&instance, &ty));
    }

    #[test]
    fn prop_open_rows_with_distinct_tails_unify(
        mine in labels_strategy(),
        theirs in labels_strategy(),
    ) {
        let mut registry = Registry::new();
        let r1 = registry.fresh_var();
        let r2 = registry.fresh_var();
        let a = Type::record_open(mine.iter().map(|l| (l.clone(), Type::Int)), r1);
        let b = Type::record_open(theirs.iter().map(|l| (l.clone(), Type::Int)), r2);

        prop_assert!(registry.unify(&a, &b).is_ok());
        prop_assert!(registry.same_shape(&a, &b));
        let (fields, tail) = registry.flatten_record(&a);
        prop_assert!(tail.is_var());
        for label in mine.iter().chain(&theirs) {
            prop_assert!(fields.contains_key(label));
        }
    }

    #[test]
    fn prop_closed_rows_need_equal_labels(
        mine in labels_strategy(),
        theirs in labels_strategy(),
    ) {
        let mut registry = Registry::new();
        let a = Type::record(mine.iter().map(|l| (l.clone(), Type::Int)));
        let b = Type::record(theirs.iter().map(|l| (l.clone(), Type::Int)));
        prop_assert_eq!(registry.unify(&a, &b).is_ok(), mine == theirs);
    }
}
