use crate::support::{id, uri, Harness, ScriptEvaluator};
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;
use tern_modules::{
    Context, ImportErrorKind, ImportScope, LoadError, ModuleUri, RuntimeConfig, Value,
};

fn search_path(roots: &[&str]) -> RuntimeConfig {
    RuntimeConfig {
        search_path: roots.iter().map(|root| uri(root)).collect(),
        ..RuntimeConfig::default()
    }
}

#[test]
fn relative_and_absolute_specifiers_share_an_entry() {
    let mut h = Harness::new();
    h.loader
        .add("file:///app/main.js", "import utils from \"./lib/utils.js\";");
    h.loader.add("file:///app/lib/utils.js", "export x = 1;");

    let main = h.import_uri("file:///app/main.js").unwrap();
    let via_main = h.export(main, "utils");

    let direct = h
        .cx
        .import_specifier("file:///app/lib/../lib/./utils.js", &ImportScope::top_level())
        .unwrap();

    assert_eq!(via_main, Some(Value::Object(direct)));
    assert_eq!(h.evaluator.compiles_of("file:///app/lib/utils.js"), 1);
}

#[test]
fn parent_relative_specifier() {
    let mut h = Harness::new();
    h.loader.add("file:///app/lib/deep/a.js", "export a = 1;");
    let scope = ImportScope::module(id("b"), Some(uri("file:///app/lib/other/b.js")));

    let a = h.cx.import_specifier("../deep/a.js", &scope).unwrap();

    assert_eq!(h.cx.lookup("file:///app/lib/deep/a.js"), Some(a));
}

#[test]
fn relative_specifier_uses_the_published_importer_location() {
    let mut h = Harness::new();
    h.loader.add("file:///app/main.js", "export m = 1;");
    h.loader.add("file:///app/dep.js", "export d = 1;");
    h.import_uri("file:///app/main.js").unwrap();

    let scope = ImportScope::module(id("file:///app/main.js"), None);
    let dep = h.cx.import_specifier("./dep.js", &scope).unwrap();

    assert_eq!(h.cx.lookup("file:///app/dep.js"), Some(dep));
}

#[test]
fn relative_specifier_without_importer_is_invalid() {
    let mut h = Harness::new();
    h.loader.add("file:///x.js", "export x = 1;");

    let err = h
        .cx
        .import_specifier("./x.js", &ImportScope::top_level())
        .unwrap_err();

    assert_eq!(err.kind, ImportErrorKind::InvalidIdentifier);
    assert!(err.message.contains("module path is unknown"), "{err}");
    assert_eq!(h.loader.reads(), 0);
}

#[test]
fn relative_specifier_from_opaque_location_is_invalid() {
    let mut h = Harness::new();
    let scope = ImportScope::module(id("inline"), Some(uri("data:text/javascript,1")));

    let err = h.cx.import_specifier("./x.js", &scope).unwrap_err();

    assert_eq!(err.kind, ImportErrorKind::InvalidIdentifier);
    assert_eq!(h.loader.reads(), 0);
}

#[test]
fn registered_relative_scheme_anchors_relative_specifiers() {
    let mut config = RuntimeConfig::default();
    config.relative_schemes.push("app".to_owned());
    let mut h = Harness::with_config(config);
    h.loader
        .add("app:///ui/main.js", "import dep from \"../shared/dep.js\";");
    h.loader.add("app:///shared/dep.js", "export d = 4;");

    let main = h
        .cx
        .import_specifier("app:///ui/main.js", &ImportScope::top_level())
        .unwrap();

    let dep = h.cx.lookup("app:///shared/dep.js").unwrap();
    assert_eq!(h.export(main, "dep"), Some(Value::Object(dep)));
    assert_eq!(h.export(dep, "d"), Some(Value::Int(4)));
}

#[test]
fn unregistered_scheme_cannot_anchor_relative_specifiers() {
    let mut h = Harness::new();
    h.loader.add("app:///shared/dep.js", "export d = 4;");
    let scope = ImportScope::module(id("main"), Some(uri("app:///ui/main.js")));

    let err = h
        .cx
        .import_specifier("../shared/dep.js", &scope)
        .unwrap_err();

    assert_eq!(err.kind, ImportErrorKind::InvalidIdentifier);
    assert!(err.message.contains("'app' modules"), "{err}");
    assert_eq!(h.loader.reads(), 0);
}

#[test]
fn empty_specifier_is_invalid() {
    let mut h = Harness::new();
    let err = h
        .cx
        .import_specifier("", &ImportScope::top_level())
        .unwrap_err();
    assert_eq!(err.kind, ImportErrorKind::InvalidIdentifier);
}

#[test]
fn bare_specifier_resolves_through_the_search_path() {
    let mut h = Harness::with_config(search_path(&["file:///lib/esm/", "file:///lib/core/"]));
    h.loader.add("file:///lib/core/gettext.js", "export domain = 1;");

    let gettext = h
        .cx
        .import_specifier("gettext", &ImportScope::top_level())
        .unwrap();

    assert_eq!(h.cx.internal_registry().lookup("gettext"), Some(gettext));
    assert_eq!(h.cx.lookup("gettext"), None);
    assert_eq!(h.export(gettext, "domain"), Some(Value::Int(1)));

    let again = h
        .cx
        .import_specifier("gettext", &ImportScope::top_level())
        .unwrap();
    assert_eq!(again, gettext);
    assert_eq!(h.loader.reads(), 1);
}

#[test]
fn earlier_search_roots_win() {
    let mut h = Harness::with_config(search_path(&["file:///lib/esm/", "file:///lib/core/"]));
    h.loader.add("file:///lib/esm/gi.js", "export from_esm = 1;");
    h.loader.add("file:///lib/core/gi.js", "export from_core = 1;");

    let gi = h.cx.import_specifier("gi", &ImportScope::top_level()).unwrap();

    assert_eq!(h.export(gi, "from_esm"), Some(Value::Int(1)));
    assert_eq!(h.export(gi, "from_core"), None);
    assert_eq!(h.loader.reads_of("file:///lib/core/gi.js"), 0);
}

#[test]
fn unknown_bare_specifier_lists_the_search_path() {
    let mut h = Harness::with_config(search_path(&["file:///lib/esm/", "file:///lib/core/"]));

    let err = h
        .cx
        .import_specifier("cairo", &ImportScope::top_level())
        .unwrap_err();

    assert_eq!(err.kind, ImportErrorKind::ModuleNotFound);
    assert!(err.message.contains("file:///lib/esm/cairo.js"), "{err}");
    assert!(err.message.contains("file:///lib/core/cairo.js"), "{err}");
    assert_eq!(h.loader.reads(), 0);
}

#[test]
fn location_outside_allowed_roots_is_denied_before_loading() {
    let mut h = Harness::with_config(RuntimeConfig {
        allowed_roots: vec![uri("file:///app")],
        ..RuntimeConfig::default()
    });
    h.loader.add("file:///etc/secret.js", "export s = 1;");

    let err = h
        .cx
        .import_specifier("file:///etc/secret.js", &ImportScope::top_level())
        .unwrap_err();
    assert_eq!(err.kind, ImportErrorKind::PermissionDenied);
    assert_eq!(err.location.as_deref(), Some("file:///etc/secret.js"));

    let scope = ImportScope::module(id("main"), Some(uri("file:///app/main.js")));
    let err = h
        .cx
        .import_specifier("../../etc/secret.js", &scope)
        .unwrap_err();
    assert_eq!(err.kind, ImportErrorKind::PermissionDenied);

    assert_eq!(h.loader.reads(), 0);
    assert_eq!(h.evaluator.compiles(), 0);
}

#[test]
fn bare_specifier_escaping_the_search_path_is_denied_before_probing() {
    let mut config = search_path(&["file:///lib/core/"]);
    config.allowed_roots = vec![uri("file:///app")];
    let mut h = Harness::with_config(config);
    h.loader.add("file:///etc/secret.js", "export s = 1;");

    let err = h
        .cx
        .import_specifier("x/../../../etc/secret", &ImportScope::top_level())
        .unwrap_err();

    assert_eq!(err.kind, ImportErrorKind::PermissionDenied);
    assert_eq!(err.location.as_deref(), Some("file:///etc/secret.js"));
    assert_eq!(h.loader.probes(), 0);
    assert_eq!(h.loader.reads(), 0);
}

#[test]
fn bare_specifier_with_nul_is_invalid_before_probing() {
    let mut h = Harness::with_config(search_path(&["file:///lib/core/"]));

    let err = h
        .cx
        .import_specifier("a\0b", &ImportScope::top_level())
        .unwrap_err();

    assert_eq!(err.kind, ImportErrorKind::InvalidIdentifier);
    assert_eq!(h.loader.probes(), 0);
}

#[test]
fn search_path_roots_are_implicitly_allowed() {
    let mut config = search_path(&["file:///lib/core/"]);
    config.allowed_roots = vec![uri("file:///app")];
    let mut h = Harness::with_config(config);
    h.loader.add("file:///lib/core/gettext.js", "export domain = 1;");

    assert!(h
        .cx
        .import_specifier("gettext", &ImportScope::top_level())
        .is_ok());
}

#[test]
fn unregistered_scheme_is_a_load_failure() {
    let mut cx = Context::new(ScriptEvaluator::default());

    let err = cx
        .import_specifier("https://example.com/mod.js", &ImportScope::top_level())
        .unwrap_err();

    assert_eq!(err.kind, ImportErrorKind::LoadFailure);
    assert!(matches!(
        err.load_error(),
        Some(LoadError::UnsupportedScheme(scheme)) if scheme == "https"
    ));
}

#[test]
fn modules_load_from_disk() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("lib")).unwrap();
    fs::write(
        dir.path().join("main.js"),
        "import util from \"./lib/util.js\";\nexport main = 1;\n",
    )
    .unwrap();
    fs::write(dir.path().join("lib/util.js"), "export util = 2;\n").unwrap();

    let root = ModuleUri::from_file_path(dir.path()).unwrap();
    let mut cx = Context::builder(ScriptEvaluator::default())
        .config(RuntimeConfig {
            allowed_roots: vec![root.clone()],
            ..RuntimeConfig::default()
        })
        .build();

    let main_uri = root.join("main.js").unwrap();
    let main = cx
        .import_specifier(main_uri.as_str(), &ImportScope::top_level())
        .unwrap();

    let util = cx.lookup(root.join("lib/util.js").unwrap().as_str()).unwrap();
    let module = cx.module(main).unwrap();
    assert_eq!(module.export("util"), Some(&Value::Object(util)));
    assert_eq!(
        cx.module(util).unwrap().export("util"),
        Some(&Value::Int(2))
    );
}
