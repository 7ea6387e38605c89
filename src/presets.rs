use crate::config::NamedRuleSet;
use crate::resolve::ResolveError;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

const PLUGIN_PREFIX: &str = "plugin:";

/// Presets available to `extends`, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PresetRegistry {
    presets: BTreeMap<String, NamedRuleSet>,
}

impl PresetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a name-keyed map, naming each preset after its key.
    pub fn from_map(presets: BTreeMap<String, NamedRuleSet>) -> Self {
        let mut registry = Self::new();
        for (name, mut preset) in presets {
            preset.name = name;
            registry.register(preset);
        }
        registry
    }

    /// Add or replace a preset under its own name.
    pub fn register(&mut self, preset: NamedRuleSet) {
        self.presets.insert(preset.name.clone(), preset);
    }

    pub fn get(&self, name: &str) -> Option<&NamedRuleSet> {
        self.presets.get(name)
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    /// Expand `extends` into the ordered list of presets to apply.
    ///
    /// Depth first: a preset's own `extends` come before the preset itself and
    /// siblings keep declaration order. A preset reachable along several paths
    /// is applied once, at its last position; under last-writer-wins that gives
    /// the same result as applying it at every position, in linear time.
    /// `declared_plugins` are the plugins of whatever holds `extends`; nested
    /// presets are checked against their own `plugins`.
    pub fn flatten<'a>(
        &'a self,
        extends: &[String],
        declared_plugins: &[String],
    ) -> Result<Vec<&'a NamedRuleSet>, ResolveError> {
        struct Frame<'a> {
            preset: &'a NamedRuleSet,
            /// Children still to visit, walked from the back.
            remaining: usize,
        }

        // Walk the reversed expansion keeping first occurrences, then flip it:
        // the result keeps each preset's last occurrence.
        let mut reversed: Vec<&'a NamedRuleSet> = Vec::new();
        let mut seen: HashSet<&'a str> = HashSet::new();
        let mut stack: Vec<Frame<'a>> = Vec::new();

        for root in extends.iter().rev() {
            check_plugin(root, declared_plugins)?;
            if seen.contains(root.as_str()) {
                continue;
            }
            let preset = self.lookup(root)?;
            seen.insert(preset.name.as_str());
            reversed.push(preset);
            stack.push(Frame {
                preset,
                remaining: preset.extends.len(),
            });

            while let Some(frame) = stack.last_mut() {
                if frame.remaining == 0 {
                    stack.pop();
                    continue;
                }
                frame.remaining -= 1;
                let parent = frame.preset;
                let child = &parent.extends[frame.remaining];

                check_plugin(child, &parent.plugins)?;
                if stack.iter().any(|f| f.preset.name == *child) {
                    let mut chain: Vec<String> =
                        stack.iter().map(|f| f.preset.name.clone()).collect();
                    chain.push(child.clone());
                    return Err(ResolveError::CyclicExtension { chain });
                }
                if seen.contains(child.as_str()) {
                    continue;
                }

                let preset = self.lookup(child)?;
                seen.insert(preset.name.as_str());
                reversed.push(preset);
                stack.push(Frame {
                    preset,
                    remaining: preset.extends.len(),
                });
            }
        }

        reversed.reverse();
        tracing::debug!(
            roots = extends.len(),
            flattened = reversed.len(),
            "flattened preset chain"
        );
        Ok(reversed)
    }

    fn lookup(&self, name: &str) -> Result<&NamedRuleSet, ResolveError> {
        self.get(name).ok_or_else(|| ResolveError::UnknownPreset {
            name: name.to_string(),
        })
    }
}

/// `plugin:<plugin>/<config>` references need `<plugin>` to be declared.
fn check_plugin(reference: &str, declared: &[String]) -> Result<(), ResolveError> {
    let Some(rest) = reference.strip_prefix(PLUGIN_PREFIX) else {
        return Ok(());
    };
    let plugin = rest.split_once('/').map_or(rest, |(plugin, _)| plugin);
    if declared.iter().any(|p| p == plugin) {
        Ok(())
    } else {
        Err(ResolveError::UndeclaredPlugin {
            plugin: plugin.to_string(),
            reference: reference.to_string(),
        })
    }
}
