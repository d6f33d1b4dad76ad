use crate::support::{uri, Harness};
use pretty_assertions::assert_eq;
use tern_modules::{HeapConfig, HeapObject, ImportScope, Record, RuntimeConfig, Value};

fn stress() -> RuntimeConfig {
    RuntimeConfig {
        heap: HeapConfig::stress(),
        ..RuntimeConfig::default()
    }
}

#[test]
fn registry_entry_follows_its_object_across_a_collection() {
    let mut h = Harness::new();
    h.loader.add("file:///app/utils.js", "export x = 1;");
    let location = uri("file:///app/utils.js");
    let scope = ImportScope::top_level();

    let before = h.cx.import("utils", &scope, &location).unwrap();
    let stats = h.cx.collect_garbage();
    assert_eq!(stats.survivors, 1);

    let after = h.cx.lookup("utils").unwrap();
    assert_ne!(after, before);
    assert!(h.cx.module(before).is_none());
    assert_eq!(h.export(after, "x"), Some(Value::Int(1)));

    // Still a cache hit, and it hands out the relocated reference.
    assert_eq!(h.cx.import("utils", &scope, &location).unwrap(), after);
    assert_eq!(h.loader.reads(), 1);
}

#[test]
fn interior_references_survive_relocation() {
    let mut h = Harness::new();
    h.loader
        .add("file:///app/data.js", "export data = record 7;\ncollect;");

    let module = h.import_uri("file:///app/data.js").unwrap();

    let Some(Value::Object(record)) = h.export(module, "data") else {
        panic!("`data` is not an object export");
    };
    let record = h.cx.object(record).and_then(HeapObject::as_record).unwrap();
    assert_eq!(record.get("value"), Some(&Value::Int(7)));
}

#[test]
fn unreachable_objects_are_freed() {
    let mut h = Harness::new();
    h.loader.add("file:///app/utils.js", "export x = 1;");
    h.import_uri("file:///app/utils.js").unwrap();
    h.cx.alloc(Record::new());
    h.cx.alloc(Record::new());
    assert_eq!(h.cx.heap_len(), 3);

    let stats = h.cx.collect_garbage();

    assert_eq!(stats.freed, 2);
    assert_eq!(h.cx.heap_len(), 1);
    assert!(h.cx.lookup("file:///app/utils.js").is_some());
}

#[test]
fn stress_collection_keeps_a_module_graph_intact() {
    let mut h = Harness::with_config(stress());
    h.loader.add(
        "file:///app/main.js",
        "import a from \"./a.js\";\nexport data = record 1;\nimport b from \"./lib/b.js\";\ncollect;",
    );
    h.loader.add(
        "file:///app/a.js",
        "export data = record 2;\nimport b from \"./lib/b.js\";",
    );
    h.loader.add("file:///app/lib/b.js", "collect;\nexport data = record 3;");

    let main = h.import_uri("file:///app/main.js").unwrap();
    h.cx.collect_garbage();
    let main_now = h.cx.lookup("file:///app/main.js").unwrap();
    assert_ne!(main, main_now);

    let a = h.cx.lookup("file:///app/a.js").unwrap();
    let b = h.cx.lookup("file:///app/lib/b.js").unwrap();
    assert_eq!(h.export(main_now, "a"), Some(Value::Object(a)));
    assert_eq!(h.export(main_now, "b"), Some(Value::Object(b)));
    assert_eq!(h.export(a, "b"), Some(Value::Object(b)));

    for (module, expected) in [(main_now, 1), (a, 2), (b, 3)] {
        let Some(Value::Object(record)) = h.export(module, "data") else {
            panic!("missing record export");
        };
        let record = h.cx.object(record).and_then(HeapObject::as_record).unwrap();
        assert_eq!(record.get("value"), Some(&Value::Int(expected)));
    }

    // Three modules, three records, nothing else left alive.
    assert_eq!(h.cx.heap_len(), 6);
    assert!(h.cx.heap_stats().collections >= 4);
    assert_eq!(h.cx.heap_stats().stale_references, 0);
    assert_eq!(h.evaluator.compiles(), 3);
}
