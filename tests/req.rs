use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use safulate::{ErrorKind, Interpreter, ModuleError, ModuleLoader, Program, Version};

struct MapLoader {
    sources: HashMap<String, String>,
    loads: Rc<RefCell<usize>>,
}

impl MapLoader {
    fn new(entries: &[(&str, &str)]) -> (Self, Rc<RefCell<usize>>) {
        let loads = Rc::new(RefCell::new(0));
        let loader = MapLoader {
            sources: entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            loads: Rc::clone(&loads),
        };
        (loader, loads)
    }
}

impl ModuleLoader for MapLoader {
    fn load(&mut self, name_or_url: &str) -> Result<Program, ModuleError> {
        match self.sources.get(name_or_url) {
            Some(source) => {
                *self.loads.borrow_mut() += 1;
                safulate::parse(source).map_err(|e| ModuleError::InvalidModule(e.to_string()))
            }
            None => Err(ModuleError::NotFound),
        }
    }
}

const MATHY: &str = "pub answer = 42;\nfunc describe() { return f\"answer {answer}\"; }";

#[test]
fn req_binds_the_module_object() {
    let (loader, _) = MapLoader::new(&[("mathy", MATHY)]);
    let mut interp = Interpreter::new().with_loader(Box::new(loader));
    interp
        .run_source(
            "req mathy;\n\
             assert(mathy.answer == 42);\n\
             assert(mathy.describe() == \"answer 42\");",
        )
        .unwrap();
}

#[test]
fn req_alias_binds_under_the_alias() {
    let (loader, _) = MapLoader::new(&[("mathy", MATHY)]);
    let mut interp = Interpreter::new().with_loader(Box::new(loader));
    interp
        .run_source("req m @ mathy;\nassert(m.answer == 42);")
        .unwrap();
}

#[test]
fn url_sources_are_passed_to_the_loader() {
    let (loader, _) = MapLoader::new(&[("https://mods.example/mathy", MATHY)]);
    let mut interp = Interpreter::new().with_loader(Box::new(loader));
    interp
        .run_source("req web @ \"https://mods.example/mathy\";\nassert(web.answer == 42);")
        .unwrap();
}

#[test]
fn member_imports_bind_listed_names() {
    let (loader, _) = MapLoader::new(&[("mathy", MATHY)]);
    let mut interp = Interpreter::new().with_loader(Box::new(loader));
    interp
        .run_source(
            "req (answer, describe) @ mathy;\n\
             assert(answer == 42);\n\
             assert(describe() == \"answer 42\");",
        )
        .unwrap();
}

#[test]
fn modules_are_cached_by_source() {
    let (loader, loads) = MapLoader::new(&[("mathy", MATHY)]);
    let mut interp = Interpreter::new().with_loader(Box::new(loader));
    interp
        .run_source(
            "req mathy;\n\
             req again @ mathy;\n\
             req (answer) @ mathy;\n\
             assert(again.answer == 42);",
        )
        .unwrap();
    assert_eq!(*loads.borrow(), 1);
}

#[test]
fn missing_modules_are_import_errors() {
    let (loader, _) = MapLoader::new(&[]);
    let mut interp = Interpreter::new().with_loader(Box::new(loader));
    let err = interp.run_source("req nothing;").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Import);

    let mut interp = Interpreter::new();
    let err = interp.run_source("req nothing;").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Import);
}

#[test]
fn module_locals_stay_private_to_the_module() {
    let (loader, _) = MapLoader::new(&[("mod", "var hidden = 1;\npub shown = 2;")]);
    let mut interp = Interpreter::new().with_loader(Box::new(loader));
    interp
        .run_source(
            "req mod;\n\
             assert(mod.shown == 2);\n\
             try { mod.hidden; } catch { print(\"hidden\"); }",
        )
        .unwrap();
    assert_eq!(interp.output(), "hidden\n");
}

#[test]
fn exact_version_matches_by_prefix() {
    let mut interp = Interpreter::new().with_version(Version::new(&[1, 2, 3]));
    interp.run_source("req v1;").unwrap();
    interp.run_source("req v1.2;").unwrap();
    interp.run_source("req v1.2.3;").unwrap();
    let err = interp.run_source("req v1.3;").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Version);
}

#[test]
fn minimum_and_maximum_constraints() {
    let mut interp = Interpreter::new().with_version(Version::new(&[1, 2, 3]));
    interp.run_source("req +v1.0;").unwrap();
    interp.run_source("req +v1.2.3;").unwrap();
    interp.run_source("req -v2;").unwrap();
    interp.run_source("req -v1.2.3;").unwrap();

    let err = interp.run_source("req +v2;").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Version);
    let err = interp.run_source("req -v1.1;").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Version);
}

#[test]
fn ranges_are_inclusive() {
    let mut interp = Interpreter::new().with_version(Version::new(&[1, 2, 3]));
    interp.run_source("req v1.0 - v2.0;").unwrap();
    interp.run_source("req v1.2.3 - v1.2.3;").unwrap();
    let err = interp.run_source("req v1.3 - v2.0;").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Version);
}

#[test]
fn version_failures_name_both_versions() {
    let mut interp = Interpreter::new().with_version(Version::new(&[1, 2]));
    let err = interp.run_source("req +v3.0;").unwrap_err();
    assert!(err.message.contains("v1.2"));
    assert!(err.message.contains("v3.0"));
}
