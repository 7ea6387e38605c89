use crate::config::{
    ConfigurationDocument, EffectiveConfiguration, EnvToggles, Globals, NamedRuleSet,
    OverrideBlock, RuleMap, RuleSource, Settings,
};
use crate::env::EnvironmentRegistry;
use crate::pattern::{self, PathMatcher};
use crate::presets::PresetRegistry;
use globset::GlobSet;
use thiserror::Error;

/// Why a document could not be resolved. Every variant is fatal for the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("cyclic extends: {}", .chain.join(" -> "))]
    CyclicExtension { chain: Vec<String> },

    #[error("malformed pattern '{pattern}': {reason}")]
    MalformedPattern { pattern: String, reason: String },

    #[error("unknown preset '{name}'")]
    UnknownPreset { name: String },

    #[error("'{reference}' requires plugin '{plugin}' to be declared")]
    UndeclaredPlugin { plugin: String, reference: String },

    #[error("unknown environment '{name}'")]
    UnknownEnvironment { name: String },
}

/// One contributing layer, borrowed from a preset, the document root or an override.
struct Layer<'a> {
    source: RuleSource,
    plugins: &'a [String],
    parser: Option<&'a str>,
    parser_options: &'a Settings,
    rules: &'a RuleMap,
    globals: &'a Globals,
    env: &'a EnvToggles,
    settings: &'a Settings,
}

impl<'a> Layer<'a> {
    fn preset(preset: &'a NamedRuleSet) -> Self {
        Self {
            source: RuleSource::Preset(preset.name.clone()),
            plugins: &preset.plugins,
            parser: preset.parser.as_deref(),
            parser_options: &preset.parser_options,
            rules: &preset.rules,
            globals: &preset.globals,
            env: &preset.env,
            settings: &preset.settings,
        }
    }

    fn document(doc: &'a ConfigurationDocument) -> Self {
        Self {
            source: RuleSource::Document,
            plugins: &doc.plugins,
            parser: doc.parser.as_deref(),
            parser_options: &doc.parser_options,
            rules: &doc.rules,
            globals: &doc.globals,
            env: &doc.env,
            settings: &doc.settings,
        }
    }

    fn override_block(index: usize, block: &'a OverrideBlock) -> Self {
        Self {
            source: RuleSource::Override(index),
            plugins: &block.plugins,
            parser: block.parser.as_deref(),
            parser_options: &block.parser_options,
            rules: &block.rules,
            globals: &block.globals,
            env: &block.env,
            settings: &block.settings,
        }
    }
}

/// Resolves configuration documents against a set of presets and environments.
#[derive(Debug, Clone)]
pub struct Resolver {
    presets: PresetRegistry,
    environments: EnvironmentRegistry,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(PresetRegistry::new(), EnvironmentRegistry::builtin())
    }
}

impl Resolver {
    pub fn new(presets: PresetRegistry, environments: EnvironmentRegistry) -> Self {
        Self {
            presets,
            environments,
        }
    }

    pub fn presets(&self) -> &PresetRegistry {
        &self.presets
    }

    pub fn environments(&self) -> &EnvironmentRegistry {
        &self.environments
    }

    /// Compute the effective configuration for one path.
    pub fn resolve(
        &self,
        document: &ConfigurationDocument,
        path: &str,
    ) -> Result<EffectiveConfiguration, ResolveError> {
        Ok(self.prepare(document)?.resolve(path))
    }

    /// Run every path-independent step once.
    ///
    /// The extends chain, base rules and root globals are merged into a base
    /// configuration; each override is compiled into a matcher plus the delta
    /// it contributes. Any error in any override fails the whole document.
    pub fn prepare(
        &self,
        document: &ConfigurationDocument,
    ) -> Result<PreparedDocument, ResolveError> {
        let mut base = EffectiveConfiguration::default();
        for preset in self.presets.flatten(&document.extends, &document.plugins)? {
            self.apply(&mut base, Layer::preset(preset))?;
        }
        self.apply(&mut base, Layer::document(document))?;

        let mut overrides = Vec::with_capacity(document.overrides.len());
        for (index, block) in document.overrides.iter().enumerate() {
            let matcher = PathMatcher::new(&block.files, &block.excluded_files)?;

            let mut delta = EffectiveConfiguration::default();
            for preset in self.presets.flatten(&block.extends, &block.plugins)? {
                self.apply(&mut delta, Layer::preset(preset))?;
            }
            self.apply(&mut delta, Layer::override_block(index, block))?;

            overrides.push(CompiledOverride { matcher, delta });
        }

        let ignore = pattern::build_glob_set(&document.ignore_patterns)?;

        tracing::debug!(
            base_rules = base.rules().len(),
            overrides = overrides.len(),
            "prepared configuration document"
        );

        Ok(PreparedDocument {
            base,
            overrides,
            ignore,
        })
    }

    fn apply(
        &self,
        config: &mut EffectiveConfiguration,
        layer: Layer<'_>,
    ) -> Result<(), ResolveError> {
        for (name, enabled) in layer.env {
            if !*enabled {
                continue;
            }
            let globals =
                self.environments
                    .get(name)
                    .ok_or_else(|| ResolveError::UnknownEnvironment {
                        name: name.clone(),
                    })?;
            for (global, access) in globals {
                config.declare_global(global, *access);
            }
            config.enable_environment(name);
        }

        for (global, access) in layer.globals {
            config.declare_global(global, *access);
        }
        for plugin in layer.plugins {
            config.add_plugin(plugin);
        }
        for (key, value) in layer.settings {
            config.set_setting(key, value.clone());
        }
        if let Some(parser) = layer.parser {
            config.set_parser(parser);
        }
        for (key, value) in layer.parser_options {
            config.set_parser_option(key, value.clone());
        }
        for (id, setting) in layer.rules {
            config.set_rule(id.clone(), setting.clone(), layer.source.clone());
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct CompiledOverride {
    matcher: PathMatcher,
    delta: EffectiveConfiguration,
}

/// A document with its path-independent work done; resolving a path cannot fail.
#[derive(Debug, Clone)]
pub struct PreparedDocument {
    base: EffectiveConfiguration,
    overrides: Vec<CompiledOverride>,
    ignore: GlobSet,
}

impl PreparedDocument {
    /// The configuration before any override is applied.
    pub fn base(&self) -> &EffectiveConfiguration {
        &self.base
    }

    /// Indices of the overrides that apply to `path`, in declaration order.
    pub fn matching_overrides(&self, path: &str) -> Vec<usize> {
        let path = pattern::normalize_path(path);
        self.overrides
            .iter()
            .enumerate()
            .filter(|(_, o)| o.matcher.is_match(&path))
            .map(|(index, _)| index)
            .collect()
    }

    /// Whether `path` matches the document's `ignorePatterns`.
    pub fn is_ignored(&self, path: &str) -> bool {
        self.ignore.is_match(pattern::normalize_path(path))
    }

    /// Apply matching overrides, in declaration order, over the base configuration.
    pub fn resolve(&self, path: &str) -> EffectiveConfiguration {
        let path = pattern::normalize_path(path);
        let mut config = self.base.clone();
        for compiled in &self.overrides {
            if compiled.matcher.is_match(&path) {
                config.merge_from(&compiled.delta);
            }
        }
        tracing::trace!(path = %path, rules = config.rules().len(), "resolved path");
        config
    }
}
