use crate::config::{ConfigurationDocument, Globals, NamedRuleSet};
use crate::env::EnvironmentRegistry;
use crate::presets::PresetRegistry;
use crate::resolve::Resolver;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported config format '{}' (expected .toml or .json)", .0.display())]
    UnsupportedFormat(PathBuf),
}

/// Encoding of a config file, picked from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Toml,
    Json,
}

impl Format {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "toml" => Some(Format::Toml),
            "json" => Some(Format::Json),
            _ => None,
        }
    }
}

/// Top-level config file structure.
///
/// `config` is the document being resolved; `presets` and `environments`
/// stand in for what plugins and shareable configs would provide. Plugin
/// environments go under their `<plugin>/<env>` name.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub config: ConfigurationDocument,
    pub presets: BTreeMap<String, NamedRuleSet>,
    pub environments: BTreeMap<String, Globals>,
}

impl ConfigFile {
    pub fn parse(text: &str, format: Format) -> Result<Self, ConfigError> {
        Ok(match format {
            Format::Toml => toml::from_str(text)?,
            Format::Json => serde_json::from_str(text)?,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let format =
            Format::from_path(path).ok_or_else(|| ConfigError::UnsupportedFormat(path.into()))?;
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.into(),
            source,
        })?;
        let file = Self::parse(&text, format)?;
        tracing::debug!(
            path = %path.display(),
            presets = file.presets.len(),
            environments = file.environments.len(),
            "loaded config"
        );
        Ok(file)
    }

    /// Split into a resolver (presets + built-in and custom environments) and the document.
    pub fn into_parts(self) -> (Resolver, ConfigurationDocument) {
        let mut environments = EnvironmentRegistry::builtin();
        for (name, globals) in self.environments {
            environments.register(name, globals);
        }
        let resolver = Resolver::new(PresetRegistry::from_map(self.presets), environments);
        (resolver, self.config)
    }
}
