use crate::cli::config_file::{ConfigError, ConfigFile};
use crate::config::EffectiveConfiguration;
use crate::pattern::normalize_path;
use crate::resolve::{PreparedDocument, ResolveError};
use ignore::WalkBuilder;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to resolve config: {0}")]
    Resolve(#[from] ResolveError),

    #[error("failed to walk '{}': {source}", .path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: ignore::Error,
    },
}

/// Effective configuration of one file.
#[derive(Debug, Clone)]
pub struct FileResolution {
    /// Path relative to the config's directory, slash separated.
    pub path: String,
    pub config: EffectiveConfiguration,
}

pub struct ScanResult {
    pub files: Vec<FileResolution>,
    pub files_ignored: usize,
    pub overrides_loaded: usize,
}

/// Load the config, collect target files and resolve every one of them in parallel.
pub fn run_scan(config_path: &Path, target_paths: &[PathBuf]) -> Result<ScanResult, ScanError> {
    // 1. Load config and do the path-independent work once
    let (resolver, document) = ConfigFile::load(config_path)?.into_parts();
    let prepared = resolver.prepare(&document)?;
    let base_dir = config_base_dir(config_path);

    // 2. Walk targets; paths are matched relative to the config's directory
    let mut files: Vec<String> = Vec::new();
    for target in target_paths {
        if target.is_file() {
            files.push(relative_to(&base_dir, target));
            continue;
        }
        for entry in WalkBuilder::new(target).build() {
            let entry = match entry {
                Ok(e) => e,
                Err(source) if target.exists() => {
                    tracing::warn!(error = %source, "skipping unreadable entry");
                    continue;
                }
                Err(source) => {
                    return Err(ScanError::Walk {
                        path: target.clone(),
                        source,
                    })
                }
            };
            if entry.file_type().is_some_and(|t| t.is_file()) {
                files.push(relative_to(&base_dir, entry.path()));
            }
        }
    }
    files.sort();
    files.dedup();

    // 3. Drop ignored files, resolve the rest
    let total = files.len();
    files.retain(|f| !prepared.is_ignored(f));
    let files_ignored = total - files.len();

    Ok(ScanResult {
        files: resolve_all(&prepared, files),
        files_ignored,
        overrides_loaded: document.overrides.len(),
    })
}

/// Resolve many paths against one prepared document, preserving input order.
pub fn resolve_all(prepared: &PreparedDocument, paths: Vec<String>) -> Vec<FileResolution> {
    paths
        .into_par_iter()
        .map(|path| FileResolution {
            config: prepared.resolve(&path),
            path,
        })
        .collect()
}

fn config_base_dir(config_path: &Path) -> PathBuf {
    let parent = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    parent.canonicalize().unwrap_or_else(|_| parent.to_path_buf())
}

/// Express `path` relative to `base`, falling back to the path as given.
fn relative_to(base: &Path, path: &Path) -> String {
    let absolute = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    let rel = absolute.strip_prefix(base).unwrap_or(path);
    normalize_path(&rel.to_string_lossy())
}
