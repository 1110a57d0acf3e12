//! Internationalization: the locale table shared by the router and the
//! downstream page renderer (which receives the resolved locale in the
//! `x-site-locale` request header).

pub mod locale;

pub use locale::{Locale, LocaleError, LocaleTable};
