use rulecascade::{
    ConfigurationDocument, EnvironmentRegistry, GlobalAccess, NamedRuleSet, OverrideBlock,
    PresetRegistry, ResolutionCache, ResolveError, Resolver, RuleSetting, RuleSource, Severity,
};
use serde_json::json;
use std::sync::Arc;
use std::thread;

fn setting(severity: Severity) -> RuleSetting {
    RuleSetting::new(severity)
}

/// extends = [preset1 (no-eval=error)], base = {no-var: error},
/// one override for `**/*.js` setting no-var off.
fn scenario() -> (Resolver, ConfigurationDocument) {
    let mut presets = PresetRegistry::new();
    presets.register(NamedRuleSet::new("preset1").rule("no-eval", setting(Severity::Error)));
    let resolver = Resolver::new(presets, EnvironmentRegistry::builtin());

    let mut doc = ConfigurationDocument {
        extends: vec!["preset1".into()],
        ..Default::default()
    };
    doc.rules.insert("no-var".into(), setting(Severity::Error));
    doc.overrides
        .push(OverrideBlock::for_files(["**/*.js"]).rule("no-var", setting(Severity::Off)));
    (resolver, doc)
}

#[test]
fn end_to_end_scenario() {
    let (resolver, doc) = scenario();

    let legacy = resolver.resolve(&doc, "legacy/app.js").unwrap();
    assert_eq!(legacy.rules().len(), 2);
    assert_eq!(legacy.severity("no-eval"), Severity::Error);
    assert_eq!(legacy.severity("no-var"), Severity::Off);

    let src = resolver.resolve(&doc, "src/app.ts").unwrap();
    assert_eq!(src.rules().len(), 2);
    assert_eq!(src.severity("no-eval"), Severity::Error);
    assert_eq!(src.severity("no-var"), Severity::Error);
}

#[test]
fn resolution_is_deterministic() {
    let (resolver, doc) = scenario();
    let first = resolver.resolve(&doc, "legacy/app.js").unwrap();
    for _ in 0..10 {
        let again = resolver.resolve(&doc, "legacy/app.js").unwrap();
        assert_eq!(first, again);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&again).unwrap()
        );
    }
}

#[test]
fn document_is_not_mutated() {
    let (resolver, doc) = scenario();
    let before = doc.clone();
    resolver.resolve(&doc, "legacy/app.js").unwrap();
    assert_eq!(doc, before);
}

#[test]
fn every_rule_traces_to_one_layer() {
    let (resolver, doc) = scenario();
    let resolved = resolver.resolve(&doc, "legacy/app.js").unwrap();
    assert_eq!(
        resolved.source("no-eval"),
        Some(&RuleSource::Preset("preset1".into()))
    );
    assert_eq!(resolved.source("no-var"), Some(&RuleSource::Override(0)));
    for (id, _) in resolved.rules() {
        assert!(resolved.source(id.as_str()).is_some());
    }
}

#[test]
fn unknown_rule_passes_through() {
    let mut doc = ConfigurationDocument::default();
    doc.rules.insert(
        "plugin:totally-unknown-rule".into(),
        RuleSetting::with_options(Severity::Error, vec![json!({"x": 1})]),
    );
    let resolved = Resolver::default().resolve(&doc, "a.js").unwrap();
    assert_eq!(
        resolved.rule("plugin:totally-unknown-rule"),
        Some(&RuleSetting::with_options(
            Severity::Error,
            vec![json!({"x": 1})]
        ))
    );
}

#[test]
fn cyclic_document_extends_fail_before_output() {
    let mut presets = PresetRegistry::new();
    presets.register(NamedRuleSet::new("A").extending("B"));
    presets.register(NamedRuleSet::new("B").extending("A"));
    let resolver = Resolver::new(presets, EnvironmentRegistry::builtin());

    let doc = ConfigurationDocument {
        extends: vec!["A".into()],
        ..Default::default()
    };
    let err = resolver.resolve(&doc, "a.js").unwrap_err();
    assert!(matches!(err, ResolveError::CyclicExtension { .. }));
    assert_eq!(err.to_string(), "cyclic extends: A -> B -> A");
}

#[test]
fn global_monotonicity_across_all_layers() {
    let mut base_preset = NamedRuleSet::new("env-preset");
    base_preset.env.insert("node".into(), true);
    let mut presets = PresetRegistry::new();
    presets.register(base_preset);
    let resolver = Resolver::new(presets, EnvironmentRegistry::builtin());

    let mut doc = ConfigurationDocument {
        extends: vec!["env-preset".into()],
        ..Default::default()
    };
    doc.globals.insert("APP".into(), GlobalAccess::Readonly);
    let mut tests = OverrideBlock::for_files(["**/*.test.js"]);
    tests.env.insert("jest".into(), true);
    tests.env.insert("node".into(), false);
    doc.overrides.push(tests);

    let resolved = resolver.resolve(&doc, "src/x.test.js").unwrap();
    for name in ["process", "APP", "describe"] {
        assert!(resolved.globals().contains_key(name), "missing {}", name);
    }
}

#[test]
fn parallel_resolution_shares_prepared_document() {
    let (resolver, doc) = scenario();
    let prepared = Arc::new(resolver.prepare(&doc).unwrap());

    let handles: Vec<_> = ["a.js", "b/c.js", "d.ts", "e/f/g.ts"]
        .into_iter()
        .map(|path| {
            let prepared = Arc::clone(&prepared);
            thread::spawn(move || (path, prepared.resolve(path)))
        })
        .collect();

    for handle in handles {
        let (path, resolved) = handle.join().unwrap();
        assert_eq!(resolved, resolver.resolve(&doc, path).unwrap());
    }
}

#[test]
fn cache_is_invisible_in_output() {
    let (resolver, doc) = scenario();
    let cache = ResolutionCache::new();
    let cached_doc = cache.prepare(&resolver, &doc).unwrap();
    for path in ["legacy/app.js", "src/app.ts"] {
        let cached = cache.resolve(&cached_doc, path);
        assert_eq!(*cached, resolver.resolve(&doc, path).unwrap());
    }
}

/// A TypeScript/React project config in the usual eslintrc shape, with the
/// shareable configs it extends stubbed as presets.
const PROJECT_CONFIG: &str = r#"{
    "config": {
        "root": true,
        "env": { "browser": true, "es6": true, "node": true, "jest/globals": true },
        "parser": "@typescript-eslint/parser",
        "parserOptions": { "project": "./tsconfig.json", "createDefaultProgram": true },
        "extends": [
            "eslint:recommended",
            "plugin:@typescript-eslint/recommended",
            "plugin:jest/recommended",
            "plugin:react/recommended"
        ],
        "plugins": ["miricanvas", "@typescript-eslint", "@typescript-eslint/tslint", "jest", "react"],
        "globals": { "$": "readonly", "__webpack_hash__": "readonly" },
        "settings": { "react": { "version": "detect" } },
        "ignorePatterns": ["*.css"],
        "rules": {
            "miricanvas/no-async-in-array-method": "error",
            "@typescript-eslint/ban-types": ["error", { "extendDefaults": true }],
            "eqeqeq": ["error", "smart"]
        },
        "overrides": [
            {
                "files": ["**/*test.ts", "**/*test.tsx"],
                "rules": { "@typescript-eslint/unbound-method": "off" }
            },
            {
                "files": ["**/*.js"],
                "rules": { "@typescript-eslint/no-var-requires": "off" }
            }
        ]
    },
    "presets": {
        "eslint:recommended": { "rules": { "no-undef": "error" } },
        "plugin:@typescript-eslint/recommended": {
            "parser": "@typescript-eslint/parser",
            "parserOptions": { "sourceType": "module" },
            "rules": { "@typescript-eslint/no-var-requires": "error" }
        },
        "plugin:jest/recommended": {
            "env": { "jest/globals": true },
            "rules": { "jest/no-focused-tests": "error" }
        },
        "plugin:react/recommended": {
            "parserOptions": { "ecmaFeatures": { "jsx": true } },
            "rules": { "react/jsx-key": "error" }
        }
    }
}"#;

#[test]
fn typical_project_config_resolves() {
    use rulecascade::cli::config_file::{ConfigFile, Format};

    let (resolver, doc) = ConfigFile::parse(PROJECT_CONFIG, Format::Json)
        .unwrap()
        .into_parts();
    let prepared = resolver.prepare(&doc).unwrap();
    assert!(prepared.is_ignored("src/theme.css"));

    let test_file = prepared.resolve("src/a.test.ts");
    for name in ["window", "Promise", "process", "describe", "$"] {
        assert!(test_file.globals().contains_key(name), "missing {}", name);
    }
    assert!(test_file.environments().contains("jest/globals"));
    assert_eq!(test_file.parser(), Some("@typescript-eslint/parser"));
    assert_eq!(test_file.parser_options()["project"], json!("./tsconfig.json"));
    assert_eq!(test_file.parser_options()["sourceType"], json!("module"));
    assert_eq!(test_file.parser_options()["ecmaFeatures"], json!({"jsx": true}));
    assert_eq!(test_file.severity("@typescript-eslint/unbound-method"), Severity::Off);
    assert_eq!(test_file.severity("no-undef"), Severity::Error);

    let ban_types = test_file
        .rules()
        .keys()
        .find(|id| id.as_str() == "@typescript-eslint/ban-types")
        .unwrap();
    assert_eq!(ban_types.plugin(), Some("@typescript-eslint"));
    assert_eq!(ban_types.name(), "ban-types");

    let script = prepared.resolve("webpack.config.js");
    assert_eq!(script.severity("@typescript-eslint/no-var-requires"), Severity::Off);
    assert_eq!(script.rule("@typescript-eslint/unbound-method"), None);
    assert_eq!(
        prepared
            .resolve("src/App.tsx")
            .severity("@typescript-eslint/no-var-requires"),
        Severity::Error
    );
}
