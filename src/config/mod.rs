//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → SiteConfig (validated, immutable)
//!     → compiled into the router / analytics plan at startup
//! ```
//!
//! # Design Decisions
//! - Config is read once at process start and never mutated
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_or_default, parse_config, ConfigError};
pub use schema::{
    AnalyticsConfig, ClarityConfig, DeprecatedSectionConfig, DomainSplitConfig, EmailConfig,
    I18nConfig, ListenerConfig, LocaleStrategy, MatcherConfig, ObservabilityConfig, PrefixMatch,
    RewriteConfig, RybbitConfig, SiteConfig, TimeoutConfig, TrackingConfig, UpstreamConfig,
};
pub use validation::{validate_config, ValidationError};
