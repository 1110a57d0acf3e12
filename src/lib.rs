//! Edge layer for a bilingual documentation site.
//!
//! Decides per request whether to redirect, rewrite to an internal handler,
//! or pass the request on to the page renderer under a resolved locale, and
//! plans the analytics scripts every rendered page loads.

// Core subsystems
pub mod config;
pub mod http;
pub mod i18n;
pub mod routing;

// Page-side
pub mod analytics;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::SiteConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::{RouteDecision, SiteRouter};
