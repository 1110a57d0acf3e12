//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the site edge.
//! All types derive Serde traits for deserialization from config files, and the
//! defaults reproduce the production site so a minimal config only overrides
//! what differs.

use serde::{Deserialize, Serialize};

/// Root configuration for the site edge.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Locale table and fallback strategy.
    pub i18n: I18nConfig,

    /// Cross-domain locale split between the primary and secondary hosts.
    pub domains: DomainSplitConfig,

    /// Removed section that redirects to the site root.
    pub deprecated: DeprecatedSectionConfig,

    /// Well-known asset paths served by internal handlers.
    pub rewrites: Vec<RewriteConfig>,

    /// Paths that never reach the router.
    pub matcher: MatcherConfig,

    /// Downstream page renderer.
    pub upstream: UpstreamConfig,

    /// Third-party analytics integrations.
    pub analytics: AnalyticsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            timeouts: TimeoutConfig::default(),
            i18n: I18nConfig::default(),
            domains: DomainSplitConfig::default(),
            deprecated: DeprecatedSectionConfig::default(),
            rewrites: default_rewrites(),
            matcher: MatcherConfig::default(),
            upstream: UpstreamConfig::default(),
            analytics: AnalyticsConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
        }
    }
}

/// How unprefixed paths are resolved once no rule matched.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum LocaleStrategy {
    /// Apply the default locale and leave the request untouched.
    #[default]
    PassThrough,
    /// Redirect `/path` to `/{default}/path`.
    RedirectUnprefixed,
}

/// Locale table.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct I18nConfig {
    /// Supported locale codes, matched against the first path segment.
    pub languages: Vec<String>,

    /// Locale applied when the path carries no prefix.
    pub default_language: String,

    /// Fallback behavior for unprefixed paths.
    pub strategy: LocaleStrategy,
}

impl Default for I18nConfig {
    fn default() -> Self {
        Self {
            languages: vec!["en".to_string(), "zh-cn".to_string()],
            default_language: "en".to_string(),
            strategy: LocaleStrategy::PassThrough,
        }
    }
}

/// Prefix comparison used by the cross-domain rules.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PrefixMatch {
    /// Plain string prefix: `/en` matches `/enterprise`.
    #[default]
    Raw,
    /// Whole segments only: `/en` matches `/en` and `/en/...`.
    Segment,
}

/// Cross-domain locale split.
///
/// The primary host serves the default locale, the secondary host serves
/// `secondary_locale`. A request for the other host's locale is bounced there.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DomainSplitConfig {
    pub enabled: bool,

    /// Host serving the default locale (e.g. "sealos.io").
    pub primary_host: String,

    /// Host serving `secondary_locale` (e.g. "sealos.run").
    pub secondary_host: String,

    /// Non-default locale owned by the secondary host.
    pub secondary_locale: String,

    /// Scheme of the redirect targets.
    pub scheme: String,

    pub prefix_match: PrefixMatch,

    /// Redirect status code.
    pub status: u16,
}

impl Default for DomainSplitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            primary_host: "sealos.io".to_string(),
            secondary_host: "sealos.run".to_string(),
            secondary_locale: "zh-cn".to_string(),
            scheme: "https".to_string(),
            prefix_match: PrefixMatch::Raw,
            status: 307,
        }
    }
}

/// A removed content section.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DeprecatedSectionConfig {
    pub enabled: bool,

    /// Locale whose copy of the section was removed.
    pub locale: String,

    /// Section path without locale prefix (e.g. "/customers").
    pub section: String,

    /// Redirect target.
    pub target: String,

    /// Redirect status code.
    pub status: u16,
}

impl Default for DeprecatedSectionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            locale: "en".to_string(),
            section: "/customers".to_string(),
            target: "/".to_string(),
            status: 307,
        }
    }
}

/// Internal rewrite of an exact path.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RewriteConfig {
    /// Client-visible path (exact match).
    pub source: String,

    /// Internal handler path.
    pub destination: String,
}

impl RewriteConfig {
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }
}

/// Default rewrites: robots directives are generated by `/api/robots`.
pub fn default_rewrites() -> Vec<RewriteConfig> {
    vec![RewriteConfig::new("/robots.txt", "/api/robots")]
}

/// Requests bypassing the router.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Raw prefixes tested against the path without its leading slash.
    pub excluded_prefixes: Vec<String>,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        let excluded = [
            "api",
            "_next/static",
            "_next/image",
            "images/",
            "icons/",
            "favicon/",
            "favicon.ico",
            "logo.svg",
            "Deploy-on-Sealos.svg",
            "sitemap.xml",
            "llms.txt",
            "rss.xml",
        ];
        Self {
            excluded_prefixes: excluded.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// Downstream page renderer.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Address of the page renderer (e.g. "127.0.0.1:3000").
    /// Without it, requests not served internally answer 404.
    pub address: Option<String>,
}

/// Analytics integrations. A missing section is a disabled integration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub clarity: ClarityConfig,
    pub rybbit: RybbitConfig,
    pub baidu: TrackingConfig,
    pub google: TrackingConfig,
    pub email: EmailConfig,
}

/// Tracking-id based integration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct TrackingConfig {
    pub enabled: bool,
    pub tracking_id: String,
}

/// Microsoft Clarity session recording.
pub type ClarityConfig = TrackingConfig;

/// Rybbit analytics.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct RybbitConfig {
    pub enabled: bool,
    pub site_id: String,
    pub script_url: String,
}

impl Default for RybbitConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            site_id: String::new(),
            script_url: "https://analytics.sealos.io/api/script.js".to_string(),
        }
    }
}

/// Email engagement tracking (Mautic).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct EmailConfig {
    pub enabled: bool,
    pub script_url: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            script_url: "https://engage.sealos.io/mtc.js".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
