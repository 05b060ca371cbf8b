//! End-to-end tests over real configuration files
//!
//! These drive the public API against temporary directories standing in
//! for the system, global and user locations.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use indexmap::IndexMap;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use strata_core::discovery::SearchPaths;
use strata_core::layer;
use strata_core::loader::{DocumentStore, YamlStore};
use strata_core::{CommandLineSource, Config, StaticArgs, Value};

/// Temporary stand-ins for the three file locations
struct Fixture {
    root: TempDir,
    paths: SearchPaths,
}

impl Fixture {
    fn new() -> Self {
        let root = TempDir::new().unwrap();
        for dir in ["admin", "global", "user"] {
            fs::create_dir_all(root.path().join(dir)).unwrap();
        }
        let admin = root.path().join("admin");
        let global = root.path().join("global");
        let user = root.path().join("user");
        let paths = SearchPaths::default()
            .with_admin_base("product")
            .with_system_dirs(vec![admin.clone()])
            .with_global_dirs(vec![global.clone()])
            .with_user_dirs(vec![user.clone()])
            .with_specific_dirs(vec![user, global, admin]);
        Self { root, paths }
    }

    fn write(&self, dir: &str, name: &str, content: &str) -> PathBuf {
        let path = self.root.path().join(dir).join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn config(&self) -> Config {
        self.config_with(StaticArgs::new())
    }

    fn config_with(&self, args: StaticArgs) -> Config {
        Config::builder("myscript")
            .with_search_paths(self.paths.clone())
            .with_command_line(args)
            .build()
    }
}

#[test]
fn test_precedence_chain_over_real_files() {
    let fixture = Fixture::new();
    fixture.write("admin", "product.conf", "color: admin\nroot-only: 1\n");
    fixture.write("global", "myscript.conf", "color: global\n");
    fixture.write("user", "myscript.conf", "color: user\n");

    let mut config = fixture.config();
    assert_eq!(config.get("color"), Some(Value::String("user".into())));
    assert_eq!(config.find_layer("color").as_deref(), Some(layer::USER));
    assert_eq!(config.get("root-only"), Some(Value::Integer(1)));

    let mut config = fixture.config_with(StaticArgs::new().with("color", "cli"));
    assert_eq!(config.get("color"), Some(Value::String("cli".into())));

    config.set("color", "code");
    assert_eq!(config.get("color"), Some(Value::String("code".into())));
    assert_eq!(config.find_layer("color").as_deref(), Some(layer::MODIFIED));
}

#[test]
fn test_second_level_merge_across_files() {
    let fixture = Fixture::new();
    fixture.write(
        "admin",
        "product.conf",
        "database:\n  host: sys-host\n  port: 5432\nserver:\n  tls:\n    cert: c1\n    key: k1\n",
    );
    fixture.write(
        "user",
        "myscript.conf",
        "database:\n  host: user-host\nserver:\n  tls:\n    cert: c2\n",
    );

    let mut config = fixture.config();
    let view = config.materialize();
    let map = view.as_mapping().unwrap();

    let database = map["database"].as_mapping().unwrap();
    assert_eq!(database["host"], Value::String("user-host".into()));
    assert_eq!(database["port"], Value::Integer(5432));

    // Depth stops at the second level: the nested tls tree is replaced
    // wholesale, so the admin-level key entry is gone
    let tls = map["server"].as_mapping().unwrap()["tls"].as_mapping().unwrap();
    assert_eq!(tls.len(), 1);
    assert_eq!(tls["cert"], Value::String("c2".into()));
}

#[test]
fn test_override_flag_keeps_only_explicit_file() {
    let fixture = Fixture::new();
    fixture.write("user", "myscript.conf", "kept: user\n");
    fixture.write("user", "special.yml", "explicit: yes-sir\n");

    let args = StaticArgs::new()
        .with("config-file", "special")
        .with("config-override", true);
    let mut config = fixture.config_with(args);

    let view = config.materialize();
    let map = view.as_mapping().unwrap();
    assert_eq!(map.get("kept"), None);
    assert_eq!(map["explicit"], Value::String("yes-sir".into()));

    // Without the flag the explicit file merges instead of replacing
    let args = StaticArgs::new().with("config-file", "special");
    let mut config = fixture.config_with(args);
    let view = config.materialize();
    let map = view.as_mapping().unwrap();
    assert_eq!(map["kept"], Value::String("user".into()));
    assert_eq!(map["explicit"], Value::String("yes-sir".into()));
}

#[test]
fn test_missing_files_yield_empty_layers() {
    let fixture = Fixture::new();
    let mut config = fixture.config();

    assert_eq!(config.get("anything"), None);
    assert_eq!(config.materialize(), Value::Mapping(IndexMap::new()));
    for name in layer::LAYER_ORDER {
        assert!(config.layer(name).is_some());
    }
}

#[test]
fn test_malformed_file_degrades_to_empty_layer() {
    let fixture = Fixture::new();
    fixture.write("admin", "product.conf", "color: admin\n");
    let broken = fixture.write("user", "myscript.yml", "value: *no_such_anchor\n");

    let mut config = fixture.config();

    // The broken layer is empty but keeps pointing at its file
    let user = config.layer(layer::USER).unwrap();
    assert!(user.content.is_empty());
    assert_eq!(user.source.as_deref(), Some(broken.to_str().unwrap()));

    // Other layers are unaffected
    assert_eq!(config.get("color"), Some(Value::String("admin".into())));
}

#[test]
fn test_reload_skips_unchanged_origins() {
    struct CountingStore {
        inner: YamlStore,
        parses: Rc<RefCell<usize>>,
    }

    impl DocumentStore for CountingStore {
        fn exists(&self, path: &Path) -> bool {
            self.inner.exists(path)
        }

        fn parse(&self, path: &Path) -> strata_core::Result<IndexMap<String, Value>> {
            *self.parses.borrow_mut() += 1;
            self.inner.parse(path)
        }
    }

    let fixture = Fixture::new();
    fixture.write("user", "myscript.conf", "color: user\n");

    let parses = Rc::new(RefCell::new(0));
    let store = CountingStore {
        inner: YamlStore,
        parses: Rc::clone(&parses),
    };
    let mut config = Config::builder("myscript")
        .with_search_paths(fixture.paths.clone())
        .with_document_store(store)
        .build();

    assert_eq!(*parses.borrow(), 1);

    config.reload(false);
    config.reload(false);
    assert_eq!(*parses.borrow(), 1);

    config.reload(true);
    assert_eq!(*parses.borrow(), 2);
}

#[test]
fn test_config_file_write_reloads_explicit_layer_only() {
    let fixture = Fixture::new();
    fixture.write("user", "special.yml", "answer: 42\n");
    let literal = fixture.write("global", "exact.yaml", "answer: 7\n");

    let mut config = fixture.config();
    assert_eq!(config.get("answer"), None);

    // Bare name goes through discovery
    config.set("config-file", "special");
    assert_eq!(config.get("answer"), Some(Value::Integer(42)));
    assert_eq!(
        config.find_layer("answer").as_deref(),
        Some(layer::SPECIFIC_FILE)
    );
    assert_eq!(
        config.find_layer("config-file").as_deref(),
        Some(layer::MODIFIED)
    );

    // The explicit layer survives a generic reload with the same origin
    config.reload(false);
    assert_eq!(config.get("answer"), Some(Value::Integer(42)));

    // A path naming an existing file is used verbatim
    config.set("config-file", literal.to_str().unwrap());
    assert_eq!(config.get("answer"), Some(Value::Integer(7)));
    assert_eq!(
        config.layer(layer::SPECIFIC_FILE).unwrap().source.as_deref(),
        Some(literal.to_str().unwrap())
    );
}

#[test]
fn test_log_level_applied_but_never_stored() {
    let fixture = Fixture::new();
    let mut config = fixture.config();

    config.set("log-level", 1);
    assert_eq!(log::max_level(), log::LevelFilter::Info);
    assert_eq!(config.get("log-level"), None);
    assert_eq!(config.find_layer("log-level"), None);
}

#[test]
fn test_discovery_prefers_directory_then_extension_order() {
    let fixture = Fixture::new();
    let near = fixture.root.path().join("near");
    let far = fixture.root.path().join("far");
    fs::create_dir_all(&near).unwrap();
    fs::create_dir_all(&far).unwrap();
    fs::write(near.join("myscript.yml"), "place: near-yml\n").unwrap();
    fs::write(far.join("myscript.conf"), "place: far-conf\n").unwrap();

    let paths = fixture
        .paths
        .clone()
        .with_user_dirs(vec![near.clone(), far.clone()]);
    let mut config = Config::builder("myscript")
        .with_search_paths(paths)
        .build();
    assert_eq!(config.get("place"), Some(Value::String("near-yml".into())));

    // Within one directory, the extension list decides
    fs::write(near.join("myscript.conf"), "place: near-conf\n").unwrap();
    config.reload(true);
    assert_eq!(config.get("place"), Some(Value::String("near-conf".into())));
}

#[test]
fn test_reload_preserves_memory_layers() {
    let fixture = Fixture::new();
    fixture.write("user", "myscript.conf", "color: user\n");

    let args = StaticArgs::new().with("from-cli", "yes");
    let mut config = fixture.config_with(args);
    config.set("from-code", 1);

    config.reload(true);

    assert_eq!(config.get("from-code"), Some(Value::Integer(1)));
    assert_eq!(config.get("from-cli"), Some(Value::String("yes".into())));
    assert_eq!(config.get("color"), Some(Value::String("user".into())));
}

#[test]
fn test_reset_restores_file_values() {
    let fixture = Fixture::new();
    fixture.write("user", "myscript.conf", "color: user\n");

    let mut config = fixture.config();
    config.set("color", "code");
    assert_eq!(config.get("color"), Some(Value::String("code".into())));

    config.reset();
    assert_eq!(config.get("color"), Some(Value::String("user".into())));
    assert_eq!(
        config.layer(layer::MODIFIED).unwrap().source.as_deref(),
        Some(layer::SOURCE_MODIFIED)
    );

    // Idempotent
    config.reset();
    assert_eq!(config.get("color"), Some(Value::String("user".into())));
}

#[test]
fn test_script_name_switch_repoints_layers() {
    let fixture = Fixture::new();
    fixture.write("user", "alpha.yml", "who: alpha\nalpha-only: true\n");
    fixture.write("user", "beta.yml", "who: beta\n");

    let mut config = Config::builder("alpha")
        .with_search_paths(fixture.paths.clone())
        .build();
    assert_eq!(config.get("who"), Some(Value::String("alpha".into())));

    config.set_script_name("beta");
    assert_eq!(config.get("who"), Some(Value::String("beta".into())));
    assert_eq!(config.get("alpha-only"), None);
}

#[test]
fn test_command_line_source_is_consulted_on_every_query() {
    #[derive(Clone)]
    struct SharedArgs(Rc<RefCell<IndexMap<String, Value>>>);

    impl CommandLineSource for SharedArgs {
        fn snapshot(&self) -> IndexMap<String, Value> {
            self.0.borrow().clone()
        }
    }

    let fixture = Fixture::new();
    let values = Rc::new(RefCell::new(IndexMap::new()));
    let mut config = Config::builder("myscript")
        .with_search_paths(fixture.paths.clone())
        .with_command_line(SharedArgs(Rc::clone(&values)))
        .build();

    assert_eq!(config.get("late"), None);

    values
        .borrow_mut()
        .insert("late".to_string(), Value::String("arrival".into()));
    assert_eq!(config.get("late"), Some(Value::String("arrival".into())));
    assert_eq!(
        config.find_layer("late").as_deref(),
        Some(layer::COMMAND_LINE)
    );
}
