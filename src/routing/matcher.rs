//! Route matching logic.
//!
//! # Responsibilities
//! - Match hostname (exact match, case-insensitive)
//! - Match path prefix (raw or segment-aware), exact path, or a section
//! - Combine conditions with AND / OR semantics
//! - Decide which requests bypass the router entirely
//!
//! # Design Decisions
//! - Host matching is case-insensitive
//! - Path matching is case-sensitive
//! - No regex to guarantee O(n) matching

use crate::config::PrefixMatch;
use crate::routing::target::RequestTarget;

/// Trait for matching requests against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the request matches this condition.
    fn matches(&self, target: &RequestTarget) -> bool;
}

/// Matches the request hostname.
#[derive(Debug, Clone)]
pub struct HostMatcher {
    expected_host: String,
}

impl HostMatcher {
    /// The host is normalized to lowercase for case-insensitive matching.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            expected_host: host.into().to_ascii_lowercase(),
        }
    }
}

impl Matcher for HostMatcher {
    fn matches(&self, target: &RequestTarget) -> bool {
        target.hostname == self.expected_host
    }
}

/// Matches the request path prefix.
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
    mode: PrefixMatch,
}

impl PathPrefixMatcher {
    pub fn new(prefix: impl Into<String>, mode: PrefixMatch) -> Self {
        Self {
            prefix: prefix.into(),
            mode,
        }
    }
}

impl Matcher for PathPrefixMatcher {
    fn matches(&self, target: &RequestTarget) -> bool {
        match self.mode {
            PrefixMatch::Raw => target.pathname.starts_with(&self.prefix),
            PrefixMatch::Segment => is_within(&target.pathname, &self.prefix),
        }
    }
}

/// Matches a section path and everything below it: `/en/customers` matches
/// `/en/customers` and `/en/customers/case-1`, not `/en/customers-stories`.
#[derive(Debug, Clone)]
pub struct SectionMatcher {
    section: String,
}

impl SectionMatcher {
    pub fn new(section: impl Into<String>) -> Self {
        Self {
            section: section.into(),
        }
    }
}

impl Matcher for SectionMatcher {
    fn matches(&self, target: &RequestTarget) -> bool {
        is_within(&target.pathname, &self.section)
    }
}

/// Matches one exact path.
#[derive(Debug, Clone)]
pub struct ExactPathMatcher {
    path: String,
}

impl ExactPathMatcher {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl Matcher for ExactPathMatcher {
    fn matches(&self, target: &RequestTarget) -> bool {
        target.pathname == self.path
    }
}

/// Combines multiple matchers with AND semantics.
#[derive(Debug)]
pub struct AndMatcher {
    matchers: Vec<Box<dyn Matcher>>,
}

impl AndMatcher {
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Self {
        Self { matchers }
    }
}

impl Matcher for AndMatcher {
    fn matches(&self, target: &RequestTarget) -> bool {
        self.matchers.iter().all(|m| m.matches(target))
    }
}

/// Combines multiple matchers with OR semantics.
#[derive(Debug)]
pub struct AnyMatcher {
    matchers: Vec<Box<dyn Matcher>>,
}

impl AnyMatcher {
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Self {
        Self { matchers }
    }
}

impl Matcher for AnyMatcher {
    fn matches(&self, target: &RequestTarget) -> bool {
        self.matchers.iter().any(|m| m.matches(target))
    }
}

/// Requests that never reach the router (API, build output, top-level
/// static files).
///
/// Each prefix is compared against the path with its leading slash removed,
/// as a plain string prefix: `api` excludes `/api/robots` and also `/apidocs`.
/// The root path is never excluded.
#[derive(Debug, Clone, Default)]
pub struct ExclusionMatcher {
    prefixes: Vec<String>,
}

impl ExclusionMatcher {
    pub fn new(prefixes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        let rest = path.strip_prefix('/').unwrap_or(path);
        !rest.is_empty() && self.prefixes.iter().any(|p| rest.starts_with(p.as_str()))
    }
}

fn is_within(path: &str, base: &str) -> bool {
    match path.strip_prefix(base) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || base.ends_with('/'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(host: &str, path: &str) -> RequestTarget {
        RequestTarget::new(host, path)
    }

    #[test]
    fn test_host_matcher() {
        let matcher = HostMatcher::new("Sealos.io");

        assert!(matcher.matches(&target("sealos.io", "/")));
        assert!(matcher.matches(&target("SEALOS.IO", "/"))); // Case insensitive
        assert!(!matcher.matches(&target("sealos.run", "/")));
    }

    #[test]
    fn test_raw_prefix_matches_longer_segment() {
        let matcher = PathPrefixMatcher::new("/en", PrefixMatch::Raw);

        assert!(matcher.matches(&target("a", "/en/pricing")));
        assert!(matcher.matches(&target("a", "/en")));
        assert!(matcher.matches(&target("a", "/enterprise")));
        assert!(!matcher.matches(&target("a", "/zh-cn")));
    }

    #[test]
    fn test_segment_prefix() {
        let matcher = PathPrefixMatcher::new("/en", PrefixMatch::Segment);

        assert!(matcher.matches(&target("a", "/en/pricing")));
        assert!(matcher.matches(&target("a", "/en")));
        assert!(!matcher.matches(&target("a", "/enterprise")));
    }

    #[test]
    fn test_section_matcher() {
        let matcher = SectionMatcher::new("/en/customers");

        assert!(matcher.matches(&target("a", "/en/customers")));
        assert!(matcher.matches(&target("a", "/en/customers/")));
        assert!(matcher.matches(&target("a", "/en/customers/case-1")));
        assert!(!matcher.matches(&target("a", "/en/customers-stories")));
        assert!(!matcher.matches(&target("a", "/en/customer")));
    }

    #[test]
    fn test_exact_path_matcher() {
        let matcher = ExactPathMatcher::new("/robots.txt");

        assert!(matcher.matches(&target("a", "/robots.txt")));
        assert!(!matcher.matches(&target("a", "/robots.txt/")));
        assert!(!matcher.matches(&target("a", "/en/robots.txt")));
    }

    #[test]
    fn test_and_any_matchers() {
        let both = AndMatcher::new(vec![
            Box::new(HostMatcher::new("sealos.io")),
            Box::new(PathPrefixMatcher::new("/zh-cn", PrefixMatch::Raw)),
        ]);
        assert!(both.matches(&target("sealos.io", "/zh-cn/docs")));
        assert!(!both.matches(&target("sealos.run", "/zh-cn/docs")));

        let either = AnyMatcher::new(vec![
            Box::new(SectionMatcher::new("/en/customers")),
            Box::new(SectionMatcher::new("/customers")),
        ]);
        assert!(either.matches(&target("a", "/customers/x")));
        assert!(either.matches(&target("a", "/en/customers")));
        assert!(!either.matches(&target("a", "/zh-cn/customers")));
    }

    #[test]
    fn test_exclusions_are_raw_prefixes() {
        let exclusions = ExclusionMatcher::new(["api", "images/", "favicon.ico", "sitemap.xml"]);

        assert!(exclusions.is_excluded("/api/robots"));
        assert!(exclusions.is_excluded("/apidocs"));
        assert!(exclusions.is_excluded("/images/logo.png"));
        assert!(exclusions.is_excluded("/favicon.ico"));
        assert!(exclusions.is_excluded("/sitemap.xml"));
        assert!(!exclusions.is_excluded("/images"));
        assert!(!exclusions.is_excluded("/robots.txt"));
        assert!(!exclusions.is_excluded("/en/docs/api"));
        assert!(!exclusions.is_excluded("/"));
    }
}
