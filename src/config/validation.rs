//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (locales named by rules exist in the table)
//! - Validate value ranges (redirect statuses, timeouts, addresses)
//! - Detect rules that could both match one request
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: SiteConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::SiteConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("i18n.languages must not be empty")]
    NoLanguages,

    #[error("i18n.languages: invalid locale code {0:?}")]
    InvalidLanguage(String),

    #[error("i18n.languages: duplicate locale code {0:?}")]
    DuplicateLanguage(String),

    #[error("i18n.default_language {0:?} is not listed in i18n.languages")]
    UnknownDefaultLanguage(String),

    #[error("{field}: {value:?} is not a valid host name")]
    InvalidHost { field: &'static str, value: String },

    #[error("domains: primary and secondary host are both {0:?}")]
    SameHosts(String),

    #[error("domains.secondary_locale {0:?} is not a non-default entry of i18n.languages")]
    InvalidSecondaryLocale(String),

    #[error("domains.scheme must be http or https, got {0:?}")]
    InvalidScheme(String),

    #[error("deprecated.locale {0:?} is not listed in i18n.languages")]
    UnknownDeprecatedLocale(String),

    #[error("{field}: path {value:?} must start with '/'")]
    InvalidPath { field: &'static str, value: String },

    #[error("{field}: {status} is not a redirect status")]
    InvalidRedirectStatus { field: &'static str, status: u16 },

    #[error("rewrites: source {0:?} is listed more than once")]
    DuplicateRewrite(String),

    #[error("{field}: {value:?} is not a socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),
}

const REDIRECT_STATUSES: [u16; 5] = [301, 302, 303, 307, 308];

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &SiteConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    validate_i18n(config, &mut errors);
    validate_domains(config, &mut errors);
    validate_deprecated(config, &mut errors);
    validate_rewrites(config, &mut errors);
    validate_network(config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_i18n(config: &SiteConfig, errors: &mut Vec<ValidationError>) {
    let i18n = &config.i18n;
    if i18n.languages.is_empty() {
        errors.push(ValidationError::NoLanguages);
    }

    let mut seen = HashSet::new();
    for code in &i18n.languages {
        if code.is_empty() || code.contains('/') || code.contains(char::is_whitespace) {
            errors.push(ValidationError::InvalidLanguage(code.clone()));
        }
        if !seen.insert(code.as_str()) {
            errors.push(ValidationError::DuplicateLanguage(code.clone()));
        }
    }

    if !i18n.languages.contains(&i18n.default_language) {
        errors.push(ValidationError::UnknownDefaultLanguage(
            i18n.default_language.clone(),
        ));
    }
}

fn validate_domains(config: &SiteConfig, errors: &mut Vec<ValidationError>) {
    let domains = &config.domains;
    if !domains.enabled {
        return;
    }

    check_host("domains.primary_host", &domains.primary_host, errors);
    check_host("domains.secondary_host", &domains.secondary_host, errors);

    // Equal hosts would let both cross-domain rules match the same request.
    if domains.primary_host.eq_ignore_ascii_case(&domains.secondary_host) {
        errors.push(ValidationError::SameHosts(domains.primary_host.clone()));
    }

    let locale = &domains.secondary_locale;
    if *locale == config.i18n.default_language || !config.i18n.languages.contains(locale) {
        errors.push(ValidationError::InvalidSecondaryLocale(locale.clone()));
    }

    if domains.scheme != "http" && domains.scheme != "https" {
        errors.push(ValidationError::InvalidScheme(domains.scheme.clone()));
    }

    check_status("domains.status", domains.status, errors);
}

fn validate_deprecated(config: &SiteConfig, errors: &mut Vec<ValidationError>) {
    let deprecated = &config.deprecated;
    if !deprecated.enabled {
        return;
    }

    if !config.i18n.languages.contains(&deprecated.locale) {
        errors.push(ValidationError::UnknownDeprecatedLocale(
            deprecated.locale.clone(),
        ));
    }
    check_path("deprecated.section", &deprecated.section, errors);
    if deprecated.section == "/" {
        // The whole locale would be removed; almost certainly a typo.
        errors.push(ValidationError::InvalidPath {
            field: "deprecated.section",
            value: deprecated.section.clone(),
        });
    }
    check_path("deprecated.target", &deprecated.target, errors);
    check_status("deprecated.status", deprecated.status, errors);
}

fn validate_rewrites(config: &SiteConfig, errors: &mut Vec<ValidationError>) {
    let mut seen = HashSet::new();
    for rewrite in &config.rewrites {
        check_path("rewrites.source", &rewrite.source, errors);
        check_path("rewrites.destination", &rewrite.destination, errors);
        if !seen.insert(rewrite.source.as_str()) {
            errors.push(ValidationError::DuplicateRewrite(rewrite.source.clone()));
        }
    }
}

fn validate_network(config: &SiteConfig, errors: &mut Vec<ValidationError>) {
    check_address("listener.bind_address", &config.listener.bind_address, errors);

    if let Some(address) = &config.upstream.address {
        check_address("upstream.address", address, errors);
    }

    if config.observability.metrics_enabled {
        check_address(
            "observability.metrics_address",
            &config.observability.metrics_address,
            errors,
        );
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("connect_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("request_secs"));
    }
}

fn check_host(field: &'static str, value: &str, errors: &mut Vec<ValidationError>) {
    let valid = !value.is_empty()
        && !value.contains([':', '/'])
        && url::Host::parse(value).is_ok();
    if !valid {
        errors.push(ValidationError::InvalidHost {
            field,
            value: value.to_string(),
        });
    }
}

fn check_path(field: &'static str, value: &str, errors: &mut Vec<ValidationError>) {
    if !value.starts_with('/') {
        errors.push(ValidationError::InvalidPath {
            field,
            value: value.to_string(),
        });
    }
}

fn check_status(field: &'static str, status: u16, errors: &mut Vec<ValidationError>) {
    if !REDIRECT_STATUSES.contains(&status) {
        errors.push(ValidationError::InvalidRedirectStatus { field, status });
    }
}

fn check_address(field: &'static str, value: &str, errors: &mut Vec<ValidationError>) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&SiteConfig::default()), Ok(()));
    }

    #[test]
    fn test_same_hosts_rejected() {
        let mut config = SiteConfig::default();
        config.domains.secondary_host = "SEALOS.IO".into();

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::SameHosts("sealos.io".into())));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = SiteConfig::default();
        config.i18n.default_language = "fr".into();
        config.deprecated.status = 200;
        config.rewrites[0].destination = "api/robots".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&ValidationError::UnknownDefaultLanguage("fr".into())));
        assert!(errors.contains(&ValidationError::InvalidRedirectStatus {
            field: "deprecated.status",
            status: 200,
        }));
    }

    #[test]
    fn test_secondary_locale_must_not_be_default() {
        let mut config = SiteConfig::default();
        config.domains.secondary_locale = "en".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::InvalidSecondaryLocale("en".into())]);
    }

    #[test]
    fn test_disabled_rules_skip_checks() {
        let mut config = SiteConfig::default();
        config.domains.enabled = false;
        config.domains.secondary_host = config.domains.primary_host.clone();
        config.deprecated.enabled = false;
        config.deprecated.section = "customers".into();

        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn test_host_with_port_rejected() {
        let mut config = SiteConfig::default();
        config.domains.primary_host = "sealos.io:443".into();

        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(
            errors.as_slice(),
            [ValidationError::InvalidHost { field: "domains.primary_host", .. }]
        ));
    }

    #[test]
    fn test_bad_upstream_address() {
        let mut config = SiteConfig::default();
        config.upstream.address = Some("localhost".into());

        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(
            errors.as_slice(),
            [ValidationError::InvalidAddress { field: "upstream.address", .. }]
        ));
    }
}
