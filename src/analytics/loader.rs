//! Deferred script loader.
//!
//! `mount` injects the immediate scripts right away and schedules the
//! deferred ones. The returned [`MountHandle`] owns the pending timers:
//! unmounting (or dropping the handle) cancels whatever has not fired yet.
//!
//! The loader does not look for scripts that are already present. Mounting
//! twice on the same document injects everything twice, so the host must
//! mount once per page lifecycle.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::analytics::plan::{LoadPlan, PlannedScript, Timing};
use crate::analytics::queue::QueueRegistry;
use crate::analytics::scheduler::{DeferredScheduler, DeferredTask, TaskOutcome};
use crate::analytics::script::ScriptTag;
use crate::observability::metrics;

/// The page the scripts are injected into.
pub trait Document: Send + Sync {
    /// Append at the end of the document (after-interactive scripts).
    fn append_script(&self, tag: ScriptTag);

    /// Insert before the first script element (lazily loaded scripts).
    fn insert_before_first_script(&self, tag: ScriptTag);
}

/// In-memory document that records script order.
#[derive(Debug, Default)]
pub struct HeadDocument {
    scripts: Mutex<Vec<ScriptTag>>,
}

impl HeadDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scripts(&self) -> Vec<ScriptTag> {
        self.scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Identify each script by id, or by src when it has none.
    pub fn labels(&self) -> Vec<String> {
        self.scripts()
            .into_iter()
            .map(|s| s.id.or(s.src).unwrap_or_default())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.scripts.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Document for HeadDocument {
    fn append_script(&self, tag: ScriptTag) {
        self.scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tag);
    }

    fn insert_before_first_script(&self, tag: ScriptTag) {
        self.scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(0, tag);
    }
}

/// Injects the integrations of a [`LoadPlan`] into a document.
#[derive(Debug, Clone)]
pub struct ScriptLoader {
    plan: Arc<LoadPlan>,
    queues: Arc<QueueRegistry>,
}

impl ScriptLoader {
    pub fn new(plan: Arc<LoadPlan>, queues: Arc<QueueRegistry>) -> Self {
        Self { plan, queues }
    }

    pub fn queues(&self) -> &Arc<QueueRegistry> {
        &self.queues
    }

    /// Inject immediate scripts now and schedule the deferred ones.
    /// Must be called from within a tokio runtime.
    pub fn mount<D: Document + 'static>(&self, document: Arc<D>) -> MountHandle {
        let token = CancellationToken::new();
        let scheduler = DeferredScheduler::new(&token);

        for script in self.plan.immediate() {
            inject(script, &*document, &self.queues);
        }

        let mut pending = Vec::new();
        for script in self.plan.deferred() {
            let Timing::Deferred(delay) = script.timing else {
                continue;
            };
            let script = script.clone();
            let document = document.clone();
            let queues = self.queues.clone();
            let name = script.integration.as_str();

            pending.push(scheduler.schedule(DeferredTask::new(name, delay, move || {
                inject(&script, &*document, &queues);
            })));
        }

        tracing::debug!(
            immediate = self.plan.immediate().count(),
            deferred = pending.len(),
            "Analytics loader mounted"
        );

        MountHandle { token, pending }
    }
}

fn inject(script: &PlannedScript, document: &dyn Document, queues: &QueueRegistry) {
    if let Some(binding) = &script.queue {
        let queue = queues.get_or_init(binding.name);
        for call in &binding.calls {
            queue.push(call.clone());
        }
    }

    match script.timing {
        Timing::AfterInteractive => document.append_script(script.tag.clone()),
        Timing::Deferred(_) => document.insert_before_first_script(script.tag.clone()),
    }
    metrics::record_injection(script.integration.as_str());
    tracing::debug!(integration = %script.integration, "Analytics script injected");
}

/// Pending deferred injections of one mount.
#[derive(Debug)]
pub struct MountHandle {
    token: CancellationToken,
    pending: Vec<JoinHandle<TaskOutcome>>,
}

impl MountHandle {
    /// Cancel every injection that has not fired yet.
    pub fn unmount(self) {
        // Drop does the work.
    }

    /// Number of deferred injections that have not finished.
    pub fn pending(&self) -> usize {
        self.pending.iter().filter(|h| !h.is_finished()).count()
    }

    /// Wait for every deferred injection to fire, returning their outcomes
    /// in schedule order.
    pub async fn settled(mut self) -> Vec<TaskOutcome> {
        let mut outcomes = Vec::with_capacity(self.pending.len());
        for handle in std::mem::take(&mut self.pending) {
            outcomes.push(handle.await.unwrap_or(TaskOutcome::Cancelled));
        }
        outcomes
    }
}

impl Drop for MountHandle {
    fn drop(&mut self) {
        if !self.token.is_cancelled() {
            let cancelled = self.pending();
            if cancelled > 0 {
                metrics::record_injections_cancelled(cancelled);
                tracing::debug!(cancelled, "Analytics loader unmounted with pending injections");
            }
            self.token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::analytics::queue::Delivery;
    use crate::analytics::queue::PendingCall;
    use crate::config::{AnalyticsConfig, EmailConfig, RybbitConfig, TrackingConfig};

    fn tracking(id: &str) -> TrackingConfig {
        TrackingConfig {
            enabled: true,
            tracking_id: id.to_string(),
        }
    }

    fn rybbit_only() -> AnalyticsConfig {
        AnalyticsConfig {
            rybbit: RybbitConfig {
                enabled: true,
                site_id: "3".into(),
                ..RybbitConfig::default()
            },
            ..AnalyticsConfig::default()
        }
    }

    fn loader(config: &AnalyticsConfig) -> ScriptLoader {
        ScriptLoader::new(
            Arc::new(LoadPlan::from_config(config)),
            Arc::new(QueueRegistry::new()),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmount_before_delay_cancels_injection() {
        let document = Arc::new(HeadDocument::new());
        let handle = loader(&rybbit_only()).mount(document.clone());
        assert_eq!(handle.pending(), 1);

        tokio::time::sleep(Duration::from_millis(1000)).await;
        handle.unmount();

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(document.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deferred_injection_fires_once() {
        let document = Arc::new(HeadDocument::new());
        let handle = loader(&rybbit_only()).mount(document.clone());

        tokio::time::sleep(Duration::from_millis(3499)).await;
        assert!(document.is_empty());

        assert_eq!(handle.settled().await, vec![TaskOutcome::Fired]);
        let scripts = document.scripts();
        assert_eq!(scripts.len(), 1);
        assert_eq!(scripts[0].attribute("data-site-id"), Some("3"));
        assert!(scripts[0].is_async && scripts[0].defer);
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_injection_order() {
        let config = AnalyticsConfig {
            clarity: tracking("c1"),
            rybbit: rybbit_only().rybbit,
            baidu: tracking("b1"),
            google: tracking("G-1"),
            email: EmailConfig {
                enabled: true,
                ..EmailConfig::default()
            },
        };
        let document = Arc::new(HeadDocument::new());
        let handle = loader(&config).mount(document.clone());

        // Immediate scripts are appended synchronously on mount.
        assert_eq!(
            document.labels(),
            ["baidu-analytics", "google-analytics", "google-analytics-config", "email-analytics"]
        );

        tokio::time::sleep(Duration::from_millis(3200)).await;
        assert_eq!(document.labels()[0], "https://www.clarity.ms/tag/c1");

        handle.settled().await;
        // Rybbit went in last, so it now sits before Clarity.
        let labels = document.labels();
        assert_eq!(labels.len(), 6);
        assert_eq!(labels[0], "https://analytics.sealos.io/api/script.js");
        assert_eq!(labels[1], "https://www.clarity.ms/tag/c1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_clarity_queue_initialized_on_fire() {
        let config = AnalyticsConfig {
            clarity: tracking("c1"),
            ..AnalyticsConfig::default()
        };
        let loader = loader(&config);
        let handle = loader.mount(Arc::new(HeadDocument::new()));
        assert!(loader.queues().get("clarity").is_none());

        handle.settled().await;
        let queue = loader.queues().get("clarity").unwrap();
        assert_eq!(queue.push(PendingCall::new(["set", "k"])), Delivery::Buffered);
    }

    #[tokio::test(start_paused = true)]
    async fn test_email_pageview_is_queued() {
        let config = AnalyticsConfig {
            google: tracking("G-1"),
            email: EmailConfig {
                enabled: true,
                ..EmailConfig::default()
            },
            ..AnalyticsConfig::default()
        };
        let loader = loader(&config);
        let _handle = loader.mount(Arc::new(HeadDocument::new()));

        let mt = loader.queues().get("mt").unwrap();
        assert_eq!(mt.drain(), vec![PendingCall::new(["send", "pageview"])]);
        assert_eq!(loader.queues().get("dataLayer").unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mounting_twice_double_injects() {
        let config = AnalyticsConfig {
            baidu: tracking("b1"),
            ..AnalyticsConfig::default()
        };
        let loader = loader(&config);
        let document = Arc::new(HeadDocument::new());
        let _first = loader.mount(document.clone());
        let _second = loader.mount(document.clone());
        assert_eq!(document.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_cancels() {
        let document = Arc::new(HeadDocument::new());
        {
            let _handle = loader(&rybbit_only()).mount(document.clone());
        }
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(document.is_empty());
    }
}
