//! Route decision.
//!
//! # Responsibilities
//! - Compile the configured rules into an ordered list at startup
//! - Evaluate rules for a request, first match wins
//! - Fall back to locale resolution when no rule matches
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) rule scan (there are a handful of rules)
//! - Every request yields a decision; there is no error path

use std::fmt;

use axum::http::StatusCode;
use thiserror::Error;
use url::Url;

use crate::config::{LocaleStrategy, PrefixMatch, SiteConfig};
use crate::i18n::{Locale, LocaleError, LocaleTable};
use crate::routing::matcher::{
    AndMatcher, AnyMatcher, ExactPathMatcher, ExclusionMatcher, HostMatcher, Matcher,
    PathPrefixMatcher, SectionMatcher,
};
use crate::routing::target::RequestTarget;

/// Which rule produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    CrossDomainLocale,
    DeprecatedSection,
    AssetRewrite,
    LocaleResolution,
}

impl RuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::CrossDomainLocale => "cross_domain_locale",
            RuleKind::DeprecatedSection => "deprecated_section",
            RuleKind::AssetRewrite => "asset_rewrite",
            RuleKind::LocaleResolution => "locale_resolution",
        }
    }
}

/// The outcome of routing one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Tell the client to re-request `location`.
    Redirect {
        location: String,
        status: StatusCode,
        reason: RuleKind,
    },
    /// Serve the requested URL from the internal handler at `path`.
    Rewrite { path: String, reason: RuleKind },
    /// Hand the request to page resolution under `locale`.
    /// `prefixed` tells whether the locale came from the path.
    PassThrough { locale: Locale, prefixed: bool },
}

impl RouteDecision {
    /// Metric label for the outcome.
    pub fn outcome(&self) -> &'static str {
        match self {
            RouteDecision::Redirect { .. } => "redirect",
            RouteDecision::Rewrite { .. } => "rewrite",
            RouteDecision::PassThrough { .. } => "pass_through",
        }
    }

    pub fn reason(&self) -> RuleKind {
        match self {
            RouteDecision::Redirect { reason, .. } | RouteDecision::Rewrite { reason, .. } => {
                *reason
            }
            RouteDecision::PassThrough { .. } => RuleKind::LocaleResolution,
        }
    }
}

impl fmt::Display for RouteDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteDecision::Redirect {
                location, status, ..
            } => write!(f, "redirect {} {}", status.as_u16(), location),
            RouteDecision::Rewrite { path, .. } => write!(f, "rewrite {path}"),
            RouteDecision::PassThrough { locale, prefixed } => {
                write!(f, "pass-through locale={locale} prefixed={prefixed}")
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum RouterError {
    #[error(transparent)]
    Locale(#[from] LocaleError),

    #[error("locale {0:?} named by a rule is not in the locale table")]
    UnknownLocale(String),

    #[error("invalid redirect origin {origin:?}: {source}")]
    InvalidOrigin {
        origin: String,
        source: url::ParseError,
    },

    #[error("{0} is not a redirect status")]
    InvalidStatus(u16),
}

#[derive(Debug)]
enum Action {
    /// Same path on another origin.
    RedirectToOrigin { origin: Url, status: StatusCode },
    RedirectTo { location: String, status: StatusCode },
    RewriteTo { path: String },
}

#[derive(Debug)]
struct Rule {
    name: String,
    kind: RuleKind,
    matcher: Box<dyn Matcher>,
    action: Action,
}

impl Rule {
    fn apply(&self, target: &RequestTarget) -> RouteDecision {
        match &self.action {
            Action::RedirectToOrigin { origin, status } => {
                let mut url = origin.clone();
                url.set_path(&target.pathname);
                RouteDecision::Redirect {
                    location: url.to_string(),
                    status: *status,
                    reason: self.kind,
                }
            }
            Action::RedirectTo { location, status } => RouteDecision::Redirect {
                location: location.clone(),
                status: *status,
                reason: self.kind,
            },
            Action::RewriteTo { path } => RouteDecision::Rewrite {
                path: path.clone(),
                reason: self.kind,
            },
        }
    }
}

/// Compiled request router.
#[derive(Debug)]
pub struct SiteRouter {
    rules: Vec<Rule>,
    locales: LocaleTable,
    strategy: LocaleStrategy,
    exclusions: ExclusionMatcher,
}

impl SiteRouter {
    /// Compile the router from configuration.
    ///
    /// Rule order: cross-domain locale redirects, deprecated section,
    /// asset rewrites. Locale resolution runs when none matched.
    pub fn from_config(config: &SiteConfig) -> Result<Self, RouterError> {
        let locales = LocaleTable::from_config(&config.i18n)?;
        let mut rules = Vec::new();

        if config.domains.enabled {
            rules.extend(cross_domain_rules(config, &locales)?);
        }
        if config.deprecated.enabled {
            rules.push(deprecated_rule(config, &locales)?);
        }
        for rewrite in &config.rewrites {
            rules.push(Rule {
                name: format!("rewrite {}", rewrite.source),
                kind: RuleKind::AssetRewrite,
                matcher: Box::new(ExactPathMatcher::new(rewrite.source.clone())),
                action: Action::RewriteTo {
                    path: rewrite.destination.clone(),
                },
            });
        }

        tracing::debug!(
            rules = ?rules.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
            "Router compiled"
        );

        Ok(Self {
            rules,
            locales,
            strategy: config.i18n.strategy,
            exclusions: ExclusionMatcher::new(config.matcher.excluded_prefixes.iter().cloned()),
        })
    }

    /// Whether the path bypasses the router entirely.
    pub fn is_excluded(&self, path: &str) -> bool {
        self.exclusions.is_excluded(path)
    }

    pub fn locales(&self) -> &LocaleTable {
        &self.locales
    }

    /// Decide the outcome for one request. Pure and deterministic.
    pub fn decide(&self, target: &RequestTarget) -> RouteDecision {
        self.rules
            .iter()
            .find(|rule| rule.matcher.matches(target))
            .map(|rule| rule.apply(target))
            .unwrap_or_else(|| self.resolve_locale(target))
    }

    fn resolve_locale(&self, target: &RequestTarget) -> RouteDecision {
        if let Some((locale, _)) = self.locales.split_path(&target.pathname) {
            return RouteDecision::PassThrough {
                locale: locale.clone(),
                prefixed: true,
            };
        }

        let default = self.locales.default_locale();
        match self.strategy {
            LocaleStrategy::PassThrough => RouteDecision::PassThrough {
                locale: default.clone(),
                prefixed: false,
            },
            LocaleStrategy::RedirectUnprefixed => {
                let path = if target.pathname == "/" {
                    default.prefix()
                } else {
                    format!("{}{}", default.prefix(), target.pathname)
                };
                let location = match &target.query {
                    Some(query) => format!("{path}?{query}"),
                    None => path,
                };
                RouteDecision::Redirect {
                    location,
                    status: StatusCode::TEMPORARY_REDIRECT,
                    reason: RuleKind::LocaleResolution,
                }
            }
        }
    }
}

fn cross_domain_rules(config: &SiteConfig, locales: &LocaleTable) -> Result<Vec<Rule>, RouterError> {
    let domains = &config.domains;
    let status = redirect_status(domains.status)?;
    let secondary_locale = locales
        .get(&domains.secondary_locale)
        .ok_or_else(|| RouterError::UnknownLocale(domains.secondary_locale.clone()))?;
    let default_locale = locales.default_locale();

    let rule = |from_host: &str, to_host: &str, locale: &Locale| -> Result<Rule, RouterError> {
        let origin = format!("{}://{}", domains.scheme, to_host);
        let origin = Url::parse(&origin).map_err(|source| RouterError::InvalidOrigin {
            origin: origin.clone(),
            source,
        })?;
        Ok(Rule {
            name: format!("{from_host}{} -> {to_host}", locale.prefix()),
            kind: RuleKind::CrossDomainLocale,
            matcher: Box::new(AndMatcher::new(vec![
                Box::new(HostMatcher::new(from_host)),
                Box::new(PathPrefixMatcher::new(locale.prefix(), domains.prefix_match)),
            ])),
            action: Action::RedirectToOrigin { origin, status },
        })
    };

    Ok(vec![
        rule(&domains.primary_host, &domains.secondary_host, secondary_locale)?,
        rule(&domains.secondary_host, &domains.primary_host, default_locale)?,
    ])
}

fn deprecated_rule(config: &SiteConfig, locales: &LocaleTable) -> Result<Rule, RouterError> {
    let deprecated = &config.deprecated;
    let status = redirect_status(deprecated.status)?;
    let locale = locales
        .get(&deprecated.locale)
        .ok_or_else(|| RouterError::UnknownLocale(deprecated.locale.clone()))?;

    let mut matchers: Vec<Box<dyn Matcher>> = vec![Box::new(SectionMatcher::new(format!(
        "{}{}",
        locale.prefix(),
        deprecated.section
    )))];
    // The default locale is also served without prefix.
    if locales.is_default(locale) {
        matchers.push(Box::new(SectionMatcher::new(deprecated.section.clone())));
    }

    Ok(Rule {
        name: format!("deprecated {}{}", locale.prefix(), deprecated.section),
        kind: RuleKind::DeprecatedSection,
        matcher: Box::new(AnyMatcher::new(matchers)),
        action: Action::RedirectTo {
            location: deprecated.target.clone(),
            status,
        },
    })
}

fn redirect_status(code: u16) -> Result<StatusCode, RouterError> {
    StatusCode::from_u16(code)
        .ok()
        .filter(StatusCode::is_redirection)
        .ok_or(RouterError::InvalidStatus(code))
}
