use crate::config::{ConfigurationDocument, EffectiveConfiguration};
use crate::pattern::normalize_path;
use crate::resolve::{PreparedDocument, ResolveError, Resolver};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;

/// Content hash of a resolver's registries together with a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub fn of(resolver: &Resolver, document: &ConfigurationDocument) -> Self {
        let mut hasher = blake3::Hasher::new();
        feed(&mut hasher, resolver.presets());
        feed(&mut hasher, resolver.environments());
        feed(&mut hasher, document);
        Self(*hasher.finalize().as_bytes())
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

// The model is map-ordered (BTreeMap), so its JSON form is stable. Every map
// in it is keyed by strings and the hasher's `Write` never fails, so
// serialization has no error path to propagate.
fn feed<T: Serialize>(hasher: &mut blake3::Hasher, value: &T) {
    serde_json::to_writer(&mut *hasher, value).expect("string-keyed model serializes to JSON");
    hasher.update(&[0]);
}

/// Entries kept per map before it is emptied and refilled.
pub const DEFAULT_LIMIT: usize = 4096;

/// A prepared document together with the fingerprint it was admitted under.
///
/// Obtained from [`ResolutionCache::prepare`]; resolving through it only hashes
/// the path.
#[derive(Debug, Clone)]
pub struct CachedDocument {
    fingerprint: Fingerprint,
    prepared: Arc<PreparedDocument>,
}

impl CachedDocument {
    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    pub fn prepared(&self) -> &Arc<PreparedDocument> {
        &self.prepared
    }
}

/// Caller-owned cache of prepared documents and resolved paths.
///
/// Entries are keyed by [`Fingerprint`] (and the normalized path), so one cache
/// can serve several resolvers and documents. A hit is always equal to what a
/// fresh resolution would return; failed resolutions are never cached. Each
/// map holds at most `limit` entries and is cleared when it would exceed that.
#[derive(Debug)]
pub struct ResolutionCache {
    prepared: DashMap<Fingerprint, Arc<PreparedDocument>>,
    resolved: DashMap<(Fingerprint, String), Arc<EffectiveConfiguration>>,
    limit: usize,
}

impl Default for ResolutionCache {
    fn default() -> Self {
        Self::with_limit(DEFAULT_LIMIT)
    }
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            prepared: DashMap::new(),
            resolved: DashMap::new(),
            limit: limit.max(1),
        }
    }

    /// Fingerprint `document` and prepare it, unless an equal one already was.
    pub fn prepare(
        &self,
        resolver: &Resolver,
        document: &ConfigurationDocument,
    ) -> Result<CachedDocument, ResolveError> {
        let fingerprint = Fingerprint::of(resolver, document);
        if let Some(hit) = self.prepared.get(&fingerprint) {
            return Ok(CachedDocument {
                fingerprint,
                prepared: Arc::clone(hit.value()),
            });
        }

        tracing::debug!(fingerprint = %fingerprint.to_hex(), "preparing uncached document");
        let prepared = Arc::new(resolver.prepare(document)?);
        if self.prepared.len() >= self.limit {
            tracing::debug!(entries = self.prepared.len(), "prepared document cache full, clearing");
            self.prepared.clear();
        }
        self.prepared.insert(fingerprint, Arc::clone(&prepared));
        Ok(CachedDocument {
            fingerprint,
            prepared,
        })
    }

    /// Effective configuration for `path` under an already prepared document.
    pub fn resolve(&self, document: &CachedDocument, path: &str) -> Arc<EffectiveConfiguration> {
        let key = (document.fingerprint, normalize_path(path));
        if let Some(hit) = self.resolved.get(&key) {
            return Arc::clone(hit.value());
        }

        let config = Arc::new(document.prepared.resolve(&key.1));
        if self.resolved.len() >= self.limit {
            tracing::debug!(entries = self.resolved.len(), "resolution cache full, clearing");
            self.resolved.clear();
        }
        self.resolved.insert(key, Arc::clone(&config));
        config
    }

    /// Number of cached path resolutions.
    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }

    pub fn clear(&self) {
        self.prepared.clear();
        self.resolved.clear();
    }
}
