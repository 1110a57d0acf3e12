//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (host, path)
//!     → matcher.rs (exclusions: API, build output, top-level files bypass)
//!     → target.rs (normalized hostname + pathname)
//!     → router.rs (ordered rules, first match wins)
//!     → Return: Redirect | Rewrite | PassThrough(locale)
//!
//! Rule Compilation (at startup):
//!     SiteConfig
//!     → cross-domain locale rules, deprecated section, asset rewrites
//!     → Freeze as immutable SiteRouter
//! ```
//!
//! # Design Decisions
//! - Rules compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always yields the same decision

pub mod matcher;
pub mod router;
pub mod target;

pub use router::{RouteDecision, RouterError, RuleKind, SiteRouter};
pub use target::RequestTarget;
