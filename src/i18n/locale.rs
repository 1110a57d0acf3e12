//! Locale table: the fixed set of display languages and the default.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::config::I18nConfig;

/// A supported display language, identified by its path prefix code
/// (e.g. `en`, `zh-cn`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locale {
    code: Arc<str>,
}

impl Locale {
    fn new(code: &str) -> Self {
        Self { code: Arc::from(code) }
    }

    /// The locale code as it appears in paths.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Path prefix for this locale, e.g. `/zh-cn`.
    pub fn prefix(&self) -> String {
        format!("/{}", self.code)
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocaleError {
    #[error("locale table is empty")]
    Empty,
    #[error("default locale {0:?} is not in the locale table")]
    UnknownDefault(String),
}

/// Immutable table of supported locales.
#[derive(Debug, Clone)]
pub struct LocaleTable {
    locales: Vec<Locale>,
    default_index: usize,
}

impl LocaleTable {
    /// Build a table from locale codes and the default code.
    pub fn new<S: AsRef<str>>(codes: &[S], default: &str) -> Result<Self, LocaleError> {
        if codes.is_empty() {
            return Err(LocaleError::Empty);
        }
        let locales: Vec<Locale> = codes.iter().map(|c| Locale::new(c.as_ref())).collect();
        let default_index = locales
            .iter()
            .position(|l| l.code() == default)
            .ok_or_else(|| LocaleError::UnknownDefault(default.to_string()))?;

        Ok(Self {
            locales,
            default_index,
        })
    }

    pub fn from_config(config: &I18nConfig) -> Result<Self, LocaleError> {
        Self::new(config.languages.as_slice(), &config.default_language)
    }

    pub fn default_locale(&self) -> &Locale {
        &self.locales[self.default_index]
    }

    pub fn is_default(&self, locale: &Locale) -> bool {
        locale == self.default_locale()
    }

    pub fn get(&self, code: &str) -> Option<&Locale> {
        self.locales.iter().find(|l| l.code() == code)
    }

    /// Split a leading locale segment off `path`.
    ///
    /// Returns the locale and the remaining path (always starting with `/`).
    /// Only a whole first segment counts: `/english` carries no locale.
    pub fn split_path<'a>(&self, path: &'a str) -> Option<(&Locale, &'a str)> {
        let rest = path.strip_prefix('/')?;
        let (segment, tail) = match rest.find('/') {
            Some(idx) => (&rest[..idx], &rest[idx..]),
            None => (rest, ""),
        };
        let locale = self.get(segment)?;
        Some((locale, if tail.is_empty() { "/" } else { tail }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> LocaleTable {
        LocaleTable::new(&["en", "zh-cn"], "en").unwrap()
    }

    #[test]
    fn test_default_locale() {
        let table = table();
        assert_eq!(table.default_locale().code(), "en");
        assert!(table.is_default(table.get("en").unwrap()));
        assert!(!table.is_default(table.get("zh-cn").unwrap()));
    }

    #[test]
    fn test_unknown_default_rejected() {
        assert_eq!(
            LocaleTable::new(&["en"], "fr").unwrap_err(),
            LocaleError::UnknownDefault("fr".into())
        );
        assert_eq!(LocaleTable::new::<&str>(&[], "en").unwrap_err(), LocaleError::Empty);
    }

    #[test]
    fn test_split_path() {
        let table = table();

        let (locale, rest) = table.split_path("/zh-cn/docs/intro").unwrap();
        assert_eq!(locale.code(), "zh-cn");
        assert_eq!(rest, "/docs/intro");

        let (locale, rest) = table.split_path("/en").unwrap();
        assert_eq!(locale.code(), "en");
        assert_eq!(rest, "/");

        assert!(table.split_path("/english/docs").is_none());
        assert!(table.split_path("/docs").is_none());
        assert!(table.split_path("/").is_none());
    }

    #[test]
    fn test_prefix() {
        assert_eq!(table().get("zh-cn").unwrap().prefix(), "/zh-cn");
    }
}
