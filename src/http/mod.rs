//! HTTP handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request id, trace, timeout)
//!     → site.rs (exclusions, route decision: redirect / rewrite / pass-through)
//!     → handlers.rs (internal asset handlers, e.g. /api/robots)
//!     → forward.rs (everything else goes to the page renderer)
//!     → Send to client
//! ```

pub mod forward;
pub mod handlers;
pub mod request;
pub mod server;
pub mod site;

pub use forward::Forwarder;
pub use request::{MakeRequestUuidV4, RequestIdExt, X_REQUEST_ID};
pub use server::{build_router, AppState, HttpServer, ServerError};
pub use site::X_SITE_LOCALE;
