//! site-edge
//!
//! ```text
//!     Client Request
//!     ─────────────▶ request id ─▶ trace ─▶ timeout ─▶ site routing ─┬─▶ 30x redirect
//!                                                                    ├─▶ /api/* handler (rewrite)
//!                                                                    └─▶ page renderer (x-site-locale)
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use site_edge::analytics::{render_head_snippet, LoadPlan};
use site_edge::config::{load_or_default, SiteConfig};
use site_edge::lifecycle::{wait_for_signal, Shutdown};
use site_edge::observability::{logging, metrics};
use site_edge::routing::{RequestTarget, RouteDecision, SiteRouter};
use site_edge::HttpServer;

#[derive(Parser)]
#[command(name = "site-edge", version, about = "Locale routing edge for the documentation site")]
struct Cli {
    /// Path to the TOML configuration file. Built-in defaults when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the edge server (default)
    Serve,
    /// Print the routing decision for a host and path
    Route {
        #[arg(long, default_value = "sealos.io")]
        host: String,
        /// Path, optionally with a query string
        path: String,
    },
    /// Print the analytics head snippet
    Snippet,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_or_default(cli.config.as_deref())?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::Route { host, path } => {
            let router = SiteRouter::from_config(&config)?;
            let (path, query) = match path.split_once('?') {
                Some((p, q)) => (p.to_string(), Some(q.to_string())),
                None => (path, None),
            };
            let target = RequestTarget::new(&host, &path).with_query(query.as_deref());
            let decision = router.decide(&target);
            println!("{}", serde_json::to_string_pretty(&decision_json(&decision))?);
            Ok(())
        }
        Commands::Snippet => {
            print!("{}", render_head_snippet(&LoadPlan::from_config(&config.analytics)));
            Ok(())
        }
    }
}

async fn serve(config: SiteConfig) -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging(&config.observability.log_level)?;
    tracing::info!("site-edge v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        languages = ?config.i18n.languages,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(config)?;

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        wait_for_signal().await;
        shutdown.trigger();
    });

    server.run(listener, receiver).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn decision_json(decision: &RouteDecision) -> serde_json::Value {
    match decision {
        RouteDecision::Redirect {
            location,
            status,
            reason,
        } => serde_json::json!({
            "decision": decision.outcome(),
            "location": location,
            "status": status.as_u16(),
            "rule": reason.as_str(),
        }),
        RouteDecision::Rewrite { path, reason } => serde_json::json!({
            "decision": decision.outcome(),
            "path": path,
            "rule": reason.as_str(),
        }),
        RouteDecision::PassThrough { locale, prefixed } => serde_json::json!({
            "decision": decision.outcome(),
            "locale": locale.code(),
            "prefixed": prefixed,
        }),
    }
}
