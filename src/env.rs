use crate::config::{GlobalAccess, Globals};
use serde::Serialize;
use std::collections::BTreeMap;

const BUILTIN: &[&str] = &[
    "Array", "Boolean", "Date", "Error", "Function", "JSON", "Math", "Number", "Object",
    "RegExp", "String", "decodeURI", "encodeURI", "isFinite", "isNaN", "parseFloat", "parseInt",
    "undefined",
];

const ES6: &[&str] = &[
    "ArrayBuffer", "DataView", "Map", "Promise", "Proxy", "Reflect", "Set", "Symbol", "WeakMap",
    "WeakSet",
];

const BROWSER: &[&str] = &[
    "document", "fetch", "localStorage", "location", "navigator", "setInterval", "setTimeout",
    "window",
];

const NODE: &[&str] = &[
    "Buffer", "__dirname", "__filename", "clearImmediate", "global", "process", "setImmediate",
];

const COMMONJS: &[&str] = &["exports", "module", "require"];

const JEST: &[&str] = &[
    "afterAll", "afterEach", "beforeAll", "beforeEach", "describe", "expect", "it", "jest",
    "test",
];

/// Named environments and the globals each one predefines.
///
/// Plugin-provided environments are named `<plugin>/<env>`, e.g. `jest/globals`.
/// Custom ones can be registered under the same form.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EnvironmentRegistry {
    environments: BTreeMap<String, Globals>,
}

impl EnvironmentRegistry {
    /// A registry with no environments at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The environments every configuration can use without declaring them.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        for (name, globals) in [
            ("builtin", BUILTIN),
            ("es6", ES6),
            ("browser", BROWSER),
            ("node", NODE),
            ("commonjs", COMMONJS),
            ("jest", JEST),
            ("jest/globals", JEST),
        ] {
            registry.register(
                name,
                globals
                    .iter()
                    .map(|g| (g.to_string(), GlobalAccess::Readonly))
                    .collect(),
            );
        }
        // `exports = ...` is legal in CommonJS modules
        if let Some(commonjs) = registry.environments.get_mut("commonjs") {
            commonjs.insert("exports".to_string(), GlobalAccess::Writable);
        }
        registry
    }

    /// Add or replace an environment.
    pub fn register(&mut self, name: impl Into<String>, globals: Globals) {
        self.environments.insert(name.into(), globals);
    }

    pub fn get(&self, name: &str) -> Option<&Globals> {
        self.environments.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.environments.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_environments_present() {
        let registry = EnvironmentRegistry::builtin();
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(
            names,
            vec![
                "browser",
                "builtin",
                "commonjs",
                "es6",
                "jest",
                "jest/globals",
                "node"
            ]
        );
        assert_eq!(registry.get("jest/globals"), registry.get("jest"));
        assert_eq!(
            registry.get("browser").unwrap()["window"],
            GlobalAccess::Readonly
        );
        assert_eq!(
            registry.get("commonjs").unwrap()["exports"],
            GlobalAccess::Writable
        );
    }

    #[test]
    fn register_replaces_existing() {
        let mut registry = EnvironmentRegistry::builtin();
        let mut globals = Globals::new();
        globals.insert("cy".into(), GlobalAccess::Readonly);
        registry.register("browser", globals);
        let browser = registry.get("browser").unwrap();
        assert_eq!(browser.len(), 1);
        assert!(browser.contains_key("cy"));
    }

    #[test]
    fn plugin_scoped_names_register_like_any_other() {
        let mut registry = EnvironmentRegistry::builtin();
        let mut globals = Globals::new();
        globals.insert("cy".into(), GlobalAccess::Readonly);
        registry.register("cypress/globals", globals);
        assert!(registry.get("cypress/globals").unwrap().contains_key("cy"));
    }

    #[test]
    fn empty_registry_knows_nothing() {
        assert!(EnvironmentRegistry::empty().get("node").is_none());
    }
}
