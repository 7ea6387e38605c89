//! Resolution of cascading lint configuration.
//!
//! A [`ConfigurationDocument`] extends named presets, declares its own rules,
//! globals and environments, and scopes further overrides to file patterns.
//! [`Resolver`] flattens all of that into the [`EffectiveConfiguration`] for a
//! single path:
//!
//! 1. presets named in `extends`, depth first, in declaration order; a preset
//!    reached along several paths is applied once, at its last position
//! 2. the document's own declarations
//! 3. every override whose patterns match the path, in declaration order
//!
//! A later layer replaces an earlier layer's setting for the same rule as a
//! whole. Globals, environments and plugins only ever accumulate.

pub mod cache;
pub mod cli;
pub mod config;
pub mod env;
pub mod pattern;
pub mod presets;
pub mod resolve;
pub mod scan;

pub use cache::{CachedDocument, ResolutionCache};
pub use config::{
    ConfigurationDocument, EffectiveConfiguration, GlobalAccess, NamedRuleSet, OverrideBlock,
    RuleId, RuleSetting, RuleSource, Severity,
};
pub use env::EnvironmentRegistry;
pub use presets::PresetRegistry;
pub use resolve::{PreparedDocument, ResolveError, Resolver};

/// Install the `tracing` subscriber used by the binary.
///
/// `RUST_LOG` wins when set; otherwise `default_filter` is used.
pub fn init_tracing(default_filter: &str) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}
