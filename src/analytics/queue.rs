//! Pending call queues for analytics globals.
//!
//! Tracking snippets expose a global (`clarity`, `mt`, `_hmt`, `dataLayer`)
//! before the real script arrives. Calls made in between are buffered, and
//! the real script drains the buffer once it has loaded. The first caller
//! creates the queue; everyone after that shares it.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use dashmap::DashMap;
use serde_json::Value;

use crate::analytics::plan::escape_script_close;

/// One buffered call: the argument list as the page passed it.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCall {
    pub args: Vec<Value>,
}

impl PendingCall {
    pub fn new<I, V>(args: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Render as a call of the global function `name`.
    pub fn to_js(&self, name: &str) -> String {
        let args: Vec<String> = self.args.iter().map(Value::to_string).collect();
        escape_script_close(&format!("{name}({});", args.join(",")))
    }
}

/// Result of pushing onto a queue.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    /// The real script has not loaded yet; the call waits in the buffer.
    Buffered,
    /// The real script is present; the caller invokes it directly.
    Direct(PendingCall),
}

#[derive(Debug, Default)]
struct QueueState {
    buffer: VecDeque<PendingCall>,
    loaded: bool,
}

/// Buffer of calls waiting for a script to load.
#[derive(Debug)]
pub struct PendingCallQueue {
    name: String,
    state: Mutex<QueueState>,
}

impl PendingCallQueue {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            state: Mutex::new(QueueState::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn push(&self, call: PendingCall) -> Delivery {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.loaded {
            Delivery::Direct(call)
        } else {
            state.buffer.push_back(call);
            Delivery::Buffered
        }
    }

    /// Called by the real script: take every buffered call in FIFO order
    /// and switch the queue to direct delivery.
    pub fn drain(&self) -> Vec<PendingCall> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.loaded = true;
        state.buffer.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .buffer
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_loaded(&self) -> bool {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).loaded
    }
}

/// Page-wide registry of queues, keyed by global name.
#[derive(Debug, Default)]
pub struct QueueRegistry {
    queues: DashMap<String, Arc<PendingCallQueue>>,
}

impl QueueRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the queue for `name`, creating it on first use.
    pub fn get_or_init(&self, name: &str) -> Arc<PendingCallQueue> {
        self.queues
            .entry(name.to_string())
            .or_insert_with(|| {
                tracing::trace!(queue = name, "Pending call queue created");
                Arc::new(PendingCallQueue::new(name))
            })
            .clone()
    }

    pub fn get(&self, name: &str) -> Option<Arc<PendingCallQueue>> {
        self.queues.get(name).map(|q| q.clone())
    }

    pub fn len(&self) -> usize {
        self.queues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }
}

/// Browser-side shim that installs the queue contract for a function-style
/// global: calls are collected into `window.<name>.q` until the real script
/// replaces the function.
pub fn queue_shim(name: &str) -> String {
    format!(
        "window.{name}=window.{name}||function(){{(window.{name}.q=window.{name}.q||[]).push(arguments)}};"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_caller_creates_queue() {
        let registry = QueueRegistry::new();
        assert!(registry.get("clarity").is_none());

        let a = registry.get_or_init("clarity");
        let b = registry.get_or_init("clarity");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_calls_buffer_until_drained() {
        let queue = QueueRegistry::new().get_or_init("clarity");

        assert_eq!(queue.push(PendingCall::new(["set", "plan"])), Delivery::Buffered);
        assert_eq!(queue.push(PendingCall::new(["event", "signup"])), Delivery::Buffered);
        assert_eq!(queue.len(), 2);
        assert!(!queue.is_loaded());

        let drained = queue.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].args[0], "set");
        assert_eq!(drained[1].args[1], "signup");
        assert!(queue.is_empty());
        assert!(queue.is_loaded());

        let call = PendingCall::new(["event", "late"]);
        assert_eq!(queue.push(call.clone()), Delivery::Direct(call));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_call_to_js() {
        let call = PendingCall::new(["send", "pageview"]);
        assert_eq!(call.to_js("mt"), r#"mt("send","pageview");"#);
    }

    #[test]
    fn test_queue_shim() {
        let shim = queue_shim("clarity");
        assert!(shim.starts_with("window.clarity=window.clarity||function(){"));
        assert!(shim.contains("(window.clarity.q=window.clarity.q||[]).push(arguments)"));
    }
}
