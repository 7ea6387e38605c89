use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::borrow::Borrow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Enforcement level of a rule.
///
/// Ordered by strictness: `Off < Warn < Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Off,
    Warn,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Off => "off",
            Severity::Warn => "warn",
            Severity::Error => "error",
        }
    }

    /// Numeric level used by the `0` / `1` / `2` shorthand.
    pub fn level(self) -> u8 {
        self as u8
    }

    pub fn from_level(level: u64) -> Option<Self> {
        match level {
            0 => Some(Severity::Off),
            1 => Some(Severity::Warn),
            2 => Some(Severity::Error),
            _ => None,
        }
    }

    /// Parse a severity name, case-insensitively.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "off" => Some(Severity::Off),
            "warn" => Some(Severity::Warn),
            "error" => Some(Severity::Error),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Severity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        severity_from_value(Value::deserialize(deserializer)?).map_err(D::Error::custom)
    }
}

fn severity_from_value(value: Value) -> Result<Severity, String> {
    match value {
        Value::String(name) => Severity::parse(&name)
            .ok_or_else(|| format!("unknown severity '{}', expected off, warn or error", name)),
        Value::Number(n) => n
            .as_u64()
            .and_then(Severity::from_level)
            .ok_or_else(|| format!("invalid severity level {}, expected 0, 1 or 2", n)),
        other => Err(format!("expected a severity, found {}", other)),
    }
}

/// Namespaced rule name, optionally plugin-qualified.
///
/// Both `plugin:ruleName` and the `plugin/ruleName` form used by plugin
/// packages are understood. For the slash form the rule name is the last
/// segment, so `@typescript-eslint/ban-types` belongs to `@typescript-eslint`
/// and `@typescript-eslint/tslint/config` to `@typescript-eslint/tslint`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(String);

impl RuleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn split(&self) -> Option<(&str, &str)> {
        self.0
            .split_once(':')
            .or_else(|| self.0.rsplit_once('/'))
            .filter(|(plugin, _)| !plugin.is_empty())
    }

    /// Plugin namespace, if the identifier is plugin-qualified.
    pub fn plugin(&self) -> Option<&str> {
        self.split().map(|(plugin, _)| plugin)
    }

    /// Rule name without its plugin namespace.
    pub fn name(&self) -> &str {
        self.split().map_or(self.0.as_str(), |(_, name)| name)
    }
}

impl Borrow<str> for RuleId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RuleId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// A severity plus the opaque options payload handed to the rule.
///
/// Written either as a bare severity (`"warn"`, `1`) or as an array whose
/// first element is the severity (`["error", "double", { "avoidEscape": true }]`).
/// An empty `options` sequence means the rule carries no options.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSetting {
    severity: Severity,
    options: Vec<Value>,
}

impl RuleSetting {
    pub fn new(severity: Severity) -> Self {
        Self {
            severity,
            options: Vec::new(),
        }
    }

    pub fn with_options(severity: Severity, options: Vec<Value>) -> Self {
        Self { severity, options }
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn options(&self) -> &[Value] {
        &self.options
    }

    pub fn is_enabled(&self) -> bool {
        self.severity != Severity::Off
    }
}

impl Serialize for RuleSetting {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.options.is_empty() {
            return self.severity.serialize(serializer);
        }
        let head = Value::String(self.severity.as_str().to_string());
        serializer.collect_seq(std::iter::once(&head).chain(self.options.iter()))
    }
}

impl<'de> Deserialize<'de> for RuleSetting {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Array(items) => {
                let mut items = items.into_iter();
                let head = items
                    .next()
                    .ok_or_else(|| D::Error::custom("rule setting array must start with a severity"))?;
                let severity = severity_from_value(head).map_err(D::Error::custom)?;
                Ok(RuleSetting::with_options(severity, items.collect()))
            }
            other => severity_from_value(other)
                .map(RuleSetting::new)
                .map_err(D::Error::custom),
        }
    }
}

/// Access mode of a declared global identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GlobalAccess {
    Readonly,
    Writable,
}

impl GlobalAccess {
    pub fn as_str(self) -> &'static str {
        match self {
            GlobalAccess::Readonly => "readonly",
            GlobalAccess::Writable => "writable",
        }
    }
}

impl Serialize for GlobalAccess {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for GlobalAccess {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Bool(true) => Ok(GlobalAccess::Writable),
            Value::Bool(false) => Ok(GlobalAccess::Readonly),
            Value::String(mode) => match mode.as_str() {
                "readonly" | "readable" => Ok(GlobalAccess::Readonly),
                "writable" | "writeable" => Ok(GlobalAccess::Writable),
                "off" => Err(D::Error::custom(
                    "globals cannot be turned off once declared",
                )),
                _ => Err(D::Error::custom(format!(
                    "unknown global access '{}', expected readonly or writable",
                    mode
                ))),
            },
            other => Err(D::Error::custom(format!(
                "expected a global access mode, found {}",
                other
            ))),
        }
    }
}

pub type RuleMap = BTreeMap<RuleId, RuleSetting>;
pub type Globals = BTreeMap<String, GlobalAccess>;
/// Environment name to enabled flag.
pub type EnvToggles = BTreeMap<String, bool>;
/// Shared settings visible to every rule.
pub type Settings = BTreeMap<String, Value>;

/// Accept either a single string or a list of strings.
fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(item) => vec![item],
        OneOrMany::Many(items) => items,
    })
}

/// A reusable, named bundle of rule settings (a preset).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct NamedRuleSet {
    /// Registry key; filled in when the preset is registered.
    #[serde(skip)]
    pub name: String,
    #[serde(deserialize_with = "one_or_many")]
    pub extends: Vec<String>,
    pub plugins: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parser: Option<String>,
    pub parser_options: Settings,
    pub rules: RuleMap,
    pub globals: Globals,
    pub env: EnvToggles,
    pub settings: Settings,
}

impl NamedRuleSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn rule(mut self, id: &str, setting: RuleSetting) -> Self {
        self.rules.insert(RuleId::new(id), setting);
        self
    }

    pub fn extending(mut self, name: &str) -> Self {
        self.extends.push(name.to_string());
        self
    }
}

/// File-pattern-scoped rule, global and environment overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct OverrideBlock {
    #[serde(deserialize_with = "one_or_many")]
    pub files: Vec<String>,
    #[serde(deserialize_with = "one_or_many")]
    pub excluded_files: Vec<String>,
    #[serde(deserialize_with = "one_or_many")]
    pub extends: Vec<String>,
    pub plugins: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parser: Option<String>,
    pub parser_options: Settings,
    pub rules: RuleMap,
    pub globals: Globals,
    pub env: EnvToggles,
    pub settings: Settings,
}

impl OverrideBlock {
    pub fn for_files<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            files: patterns.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn rule(mut self, id: &str, setting: RuleSetting) -> Self {
        self.rules.insert(RuleId::new(id), setting);
        self
    }
}

/// Root of a configuration: what it extends, its own declarations and its overrides.
///
/// Every field defaults to empty when absent from the source. Unknown keys are
/// rejected rather than dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct ConfigurationDocument {
    /// Marks a top-level config. Documents never cascade from parent
    /// directories here, so it is accepted and carries no meaning.
    #[serde(skip_serializing)]
    pub root: bool,
    #[serde(deserialize_with = "one_or_many")]
    pub extends: Vec<String>,
    pub plugins: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parser: Option<String>,
    pub parser_options: Settings,
    pub rules: RuleMap,
    pub globals: Globals,
    pub env: EnvToggles,
    pub settings: Settings,
    pub overrides: Vec<OverrideBlock>,
    pub ignore_patterns: Vec<String>,
}

/// The layer a resolved rule setting came from.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RuleSource {
    Preset(String),
    Document,
    /// Index into the document's `overrides`.
    Override(usize),
}

impl fmt::Display for RuleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleSource::Preset(name) => write!(f, "preset {}", name),
            RuleSource::Document => write!(f, "document"),
            RuleSource::Override(index) => write!(f, "override #{}", index),
        }
    }
}

impl Serialize for RuleSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Everything that applies to one file path once all layers are merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveConfiguration {
    rules: RuleMap,
    sources: BTreeMap<RuleId, RuleSource>,
    globals: Globals,
    environments: BTreeSet<String>,
    plugins: BTreeSet<String>,
    parser: Option<String>,
    parser_options: Settings,
    settings: Settings,
}

impl EffectiveConfiguration {
    pub fn rules(&self) -> &RuleMap {
        &self.rules
    }

    pub fn rule(&self, id: &str) -> Option<&RuleSetting> {
        self.rules.get(id)
    }

    /// Severity of a rule; rules absent from every layer are `Off`.
    pub fn severity(&self, id: &str) -> Severity {
        self.rule(id).map_or(Severity::Off, RuleSetting::severity)
    }

    /// The layer that set the rule's final value.
    pub fn source(&self, id: &str) -> Option<&RuleSource> {
        self.sources.get(id)
    }

    /// Rules the executor should run: everything not set to `off`.
    pub fn enabled_rules(&self) -> impl Iterator<Item = (&RuleId, &RuleSetting)> {
        self.rules.iter().filter(|(_, setting)| setting.is_enabled())
    }

    pub fn globals(&self) -> &Globals {
        &self.globals
    }

    pub fn environments(&self) -> &BTreeSet<String> {
        &self.environments
    }

    pub fn plugins(&self) -> &BTreeSet<String> {
        &self.plugins
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Parser of the last layer that named one.
    pub fn parser(&self) -> Option<&str> {
        self.parser.as_deref()
    }

    /// Parser options merged key by key; a later layer replaces a key's whole value.
    pub fn parser_options(&self) -> &Settings {
        &self.parser_options
    }

    /// Overwrite a rule entirely; severity and options are never merged.
    pub(crate) fn set_rule(&mut self, id: RuleId, setting: RuleSetting, source: RuleSource) {
        self.sources.insert(id.clone(), source);
        self.rules.insert(id, setting);
    }

    pub(crate) fn declare_global(&mut self, name: &str, access: GlobalAccess) {
        self.globals.insert(name.to_string(), access);
    }

    pub(crate) fn enable_environment(&mut self, name: &str) {
        self.environments.insert(name.to_string());
    }

    pub(crate) fn add_plugin(&mut self, name: &str) {
        self.plugins.insert(name.to_string());
    }

    pub(crate) fn set_setting(&mut self, key: &str, value: Value) {
        self.settings.insert(key.to_string(), value);
    }

    pub(crate) fn set_parser(&mut self, parser: &str) {
        self.parser = Some(parser.to_string());
    }

    pub(crate) fn set_parser_option(&mut self, key: &str, value: Value) {
        self.parser_options.insert(key.to_string(), value);
    }

    /// Apply `other` on top of `self`, as if its layers came after ours.
    pub(crate) fn merge_from(&mut self, other: &EffectiveConfiguration) {
        for (id, setting) in &other.rules {
            let source = other
                .sources
                .get(id)
                .cloned()
                .unwrap_or(RuleSource::Document);
            self.set_rule(id.clone(), setting.clone(), source);
        }
        self.globals
            .extend(other.globals.iter().map(|(k, v)| (k.clone(), *v)));
        self.environments.extend(other.environments.iter().cloned());
        self.plugins.extend(other.plugins.iter().cloned());
        self.settings
            .extend(other.settings.iter().map(|(k, v)| (k.clone(), v.clone())));
        if let Some(parser) = &other.parser {
            self.parser = Some(parser.clone());
        }
        self.parser_options
            .extend(other.parser_options.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
}
