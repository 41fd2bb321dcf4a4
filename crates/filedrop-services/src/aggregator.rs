//! Upload aggregator
//!
//! Collapses a burst of individually-delivered file events that share a group
//! key into one batch, using a sliding debounce window: every new arrival for
//! a pending group resets the window, so the window measures the inter-arrival
//! gap, not the total group duration. When the window elapses with no new
//! arrival the group is removed from pending state and handed to the flush
//! sink exactly once, in arrival order.
//!
//! Each pending group is a spawned collector task with its own mailbox.
//! Pending groups are not persisted; a crash loses the not-yet-registered
//! events of in-flight groups.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

use filedrop_core::models::FileEvent;

/// Receives a completed group. Implemented by the registration side.
#[async_trait]
pub trait GroupSink: Send + Sync {
    async fn flush(&self, group_key: &str, events: Vec<FileEvent>);
}

#[derive(Clone, Debug)]
pub struct AggregatorConfig {
    /// Sliding debounce window in milliseconds.
    pub debounce_window_ms: u64,
    /// Flush trigger: a group reaching this many events is flushed
    /// immediately instead of waiting for the window. Events arriving after
    /// that flush open a fresh group under the same key.
    pub max_group_size: usize,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            debounce_window_ms: 1000,
            max_group_size: 100,
        }
    }
}

#[derive(Clone)]
pub struct UploadAggregator {
    inner: Arc<Inner>,
}

struct Inner {
    pending: Mutex<HashMap<String, mpsc::UnboundedSender<FileEvent>>>,
    sink: Arc<dyn GroupSink>,
    config: AggregatorConfig,
}

impl UploadAggregator {
    pub fn new(config: AggregatorConfig, sink: Arc<dyn GroupSink>) -> Self {
        UploadAggregator {
            inner: Arc::new(Inner {
                pending: Mutex::new(HashMap::new()),
                sink,
                config,
            }),
        }
    }

    /// Feed one event into the group identified by `group_key`.
    ///
    /// Groups under distinct keys never mix; key equality is exact string
    /// match as supplied by the transport. The call returns as soon as the
    /// event is queued; registration happens on the collector task when the
    /// group flushes.
    pub async fn submit(&self, group_key: &str, event: FileEvent) {
        let mut pending = self.inner.pending.lock().await;

        let event = match pending.get(group_key) {
            Some(tx) => match tx.send(event) {
                Ok(()) => return,
                // The collector flushed this key between our lookup and the
                // send; start a fresh group with the returned event.
                Err(mpsc::error::SendError(event)) => event,
            },
            None => event,
        };

        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(event);
        pending.insert(group_key.to_string(), tx);
        drop(pending);

        Inner::spawn_collector(Arc::clone(&self.inner), group_key.to_string(), rx);
        tracing::debug!(group_key, "Opened pending upload group");
    }
}

impl Inner {
    fn spawn_collector(inner: Arc<Inner>, key: String, mut rx: mpsc::UnboundedReceiver<FileEvent>) {
        let window = Duration::from_millis(inner.config.debounce_window_ms);
        let max_group_size = inner.config.max_group_size;

        tokio::spawn(async move {
            let mut events: Vec<FileEvent> = Vec::new();
            loop {
                match tokio::time::timeout(window, rx.recv()).await {
                    Ok(Some(event)) => {
                        events.push(event);
                        if events.len() >= max_group_size {
                            tracing::warn!(
                                group_key = %key,
                                size = events.len(),
                                "Upload group reached size cap, flushing early"
                            );
                            break;
                        }
                    }
                    Ok(None) => break,
                    // Window elapsed with no new arrival: the group is done.
                    Err(_) => break,
                }
            }

            {
                let mut pending = inner.pending.lock().await;
                pending.remove(&key);
                // Submissions hold the pending lock while sending, so anything
                // that raced the expiry is already buffered; drain it into this
                // flush rather than dropping it.
                while let Ok(event) = rx.try_recv() {
                    events.push(event);
                }
            }

            if events.is_empty() {
                return;
            }

            tracing::info!(group_key = %key, count = events.len(), "Flushing upload group");
            inner.sink.flush(&key, events).await;
        });
    }
}
