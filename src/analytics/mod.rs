//! Analytics script loading.
//!
//! # Data Flow
//! ```text
//! AnalyticsConfig (static)
//!     → plan.rs (ordered immediate + deferred scripts)
//!     → loader.rs (mount: inject immediate, schedule deferred)
//!         → scheduler.rs (delay + cancellation token per task)
//!         → queue.rs (pending call buffers for analytics globals)
//!     → render.rs (same plan as an HTML head snippet)
//! ```
//!
//! # Design Decisions
//! - Fire-and-forget: script load failures are never observed
//! - Disabled or missing integrations are skipped, not reported
//! - Unmount cancels every deferred injection that has not fired

pub mod loader;
pub mod plan;
pub mod queue;
pub mod render;
pub mod scheduler;
pub mod script;

pub use loader::{Document, HeadDocument, MountHandle, ScriptLoader};
pub use plan::{LoadPlan, PlannedScript, Timing, CLARITY_DELAY, RYBBIT_DELAY};
pub use queue::{Delivery, PendingCall, PendingCallQueue, QueueRegistry};
pub use render::render_head_snippet;
pub use script::{Integration, ScriptTag};
