use crate::support::{uri, Harness};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::BTreeSet;
use tern_modules::{ImportErrorKind, ImportScope, Value};

#[test]
fn second_import_is_served_from_the_registry() {
    let mut h = Harness::new();
    h.loader.add("file:///app/utils.js", "export const x = 1;");
    let location = uri("file:///app/utils.js");
    let scope = ImportScope::top_level();

    let first = h.cx.import("utils", &scope, &location).unwrap();
    assert_eq!(h.export(first, "x"), Some(Value::Int(1)));
    assert_eq!(h.cx.lookup("utils"), Some(first));

    let second = h.cx.import("utils", &scope, &location).unwrap();
    assert_eq!(second, first);
    assert_eq!(h.loader.reads(), 1);
    assert_eq!(h.evaluator.compiles(), 1);
    assert_eq!(h.evaluator.evaluations(), 1);
}

#[test]
fn cache_is_keyed_by_identifier_not_location() {
    let mut h = Harness::new();
    h.loader.add("file:///app/utils.js", "export x = 1;");
    let location = uri("file:///app/utils.js");
    let scope = ImportScope::top_level();

    let a = h.cx.import("a", &scope, &location).unwrap();
    let b = h.cx.import("b", &scope, &location).unwrap();

    assert_ne!(a, b);
    assert_eq!(h.cx.registry().len(), 2);
    assert_eq!(h.loader.reads_of("file:///app/utils.js"), 2);
}

#[test]
fn identifiers_are_case_sensitive() {
    let mut h = Harness::new();
    h.loader.add("file:///app/utils.js", "export x = 1;");
    let location = uri("file:///app/utils.js");
    let scope = ImportScope::top_level();

    let lower = h.cx.import("utils", &scope, &location).unwrap();
    let upper = h.cx.import("Utils", &scope, &location).unwrap();
    assert_ne!(lower, upper);
}

#[test]
fn empty_identifier_reaches_no_collaborator() {
    let mut h = Harness::new();
    let err = h
        .cx
        .import("", &ImportScope::top_level(), &uri("file:///app/utils.js"))
        .unwrap_err();

    assert_eq!(err.kind, ImportErrorKind::InvalidIdentifier);
    assert_eq!(h.loader.reads(), 0);
    assert_eq!(h.evaluator.compiles(), 0);
    assert!(h.cx.registry().is_empty());
}

#[test]
fn identifier_with_nul_is_rejected() {
    let mut h = Harness::new();
    let err = h
        .cx
        .import("a\0b", &ImportScope::top_level(), &uri("file:///app/a.js"))
        .unwrap_err();
    assert_eq!(err.kind, ImportErrorKind::InvalidIdentifier);
    assert_eq!(h.loader.reads(), 0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn each_identifier_is_instantiated_once(ids in prop::collection::vec("[a-e]{1,3}", 1..40)) {
        let mut h = Harness::new();
        h.loader.add("file:///app/m.js", "export x = 1;");
        let location = uri("file:///app/m.js");
        let scope = ImportScope::top_level();

        for id in &ids {
            let object = h.cx.import(id, &scope, &location).unwrap();
            prop_assert_eq!(h.cx.module(object).unwrap().id().as_str(), id.as_str());
        }

        let distinct: BTreeSet<&String> = ids.iter().collect();
        prop_assert_eq!(h.cx.registry().len(), distinct.len());
        prop_assert_eq!(h.evaluator.compiles(), distinct.len());
        prop_assert_eq!(h.loader.reads(), distinct.len());
        for id in distinct {
            prop_assert_eq!(h.evaluator.compiles_of(id), 1);
        }
    }
}
