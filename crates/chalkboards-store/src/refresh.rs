//! Periodic re-fetch of the row set as an explicit, cancellable task.
//!
//! Each completed fetch replaces the published [`FeedSnapshot`] wholesale.
//! Subscribers observe snapshots through a `tokio::sync::watch` channel.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chalkboards_core::RawRow;
use chrono::{DateTime, Utc};
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::client::RowSource;

/// The latest fetch result. A failed fetch carries no rows and the error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedSnapshot {
    pub rows: Arc<Vec<RawRow>>,
    pub fetched_at: Option<DateTime<Utc>>,
    /// Number of fetches published so far; `0` before the first one lands.
    pub generation: u64,
    pub error: Option<String>,
}

#[derive(Debug, Default)]
struct Shared {
    /// Held while publishing so `cancel` cannot interleave with a send.
    cancelled: Mutex<bool>,
    wake: Notify,
}

impl Shared {
    fn is_cancelled(&self) -> bool {
        *self
            .cancelled
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Cheap handle that asks the refresh task to fetch now.
#[derive(Debug, Clone)]
pub struct RefreshTrigger {
    shared: Arc<Shared>,
}

impl RefreshTrigger {
    pub fn request_refresh(&self) {
        self.shared.wake.notify_one();
    }
}

/// Owner of a running refresh task. Dropping it cancels the task.
#[derive(Debug)]
pub struct RefreshHandle {
    shared: Arc<Shared>,
    rx: watch::Receiver<FeedSnapshot>,
    task: JoinHandle<()>,
}

impl RefreshHandle {
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.rx.clone()
    }

    /// Copy of the most recently published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> FeedSnapshot {
        self.rx.borrow().clone()
    }

    #[must_use]
    pub fn trigger(&self) -> RefreshTrigger {
        RefreshTrigger {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Fetch now instead of waiting for the next tick.
    pub fn request_refresh(&self) {
        self.shared.wake.notify_one();
    }

    /// Stop the task. Once this returns no further snapshot is published,
    /// including one from a fetch that is already in flight.
    pub fn cancel(&self) {
        *self
            .shared
            .cancelled
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = true;
        self.task.abort();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.shared.is_cancelled()
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Start fetching from `source` now and every `interval` after that.
///
/// Must be called inside a Tokio runtime. Dropping the handle stops the task.
#[must_use]
pub fn spawn_refresh<S: RowSource>(source: Arc<S>, interval: Duration) -> RefreshHandle {
    let (tx, rx) = watch::channel(FeedSnapshot::default());
    let shared = Arc::new(Shared::default());
    let task = tokio::spawn(run_refresh_loop(source, interval, tx, Arc::clone(&shared)));
    RefreshHandle { shared, rx, task }
}

async fn run_refresh_loop<S: RowSource>(
    source: Arc<S>,
    interval: Duration,
    tx: watch::Sender<FeedSnapshot>,
    shared: Arc<Shared>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut generation = 0u64;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            () = shared.wake.notified() => {
                ticker.reset();
            }
        }
        if shared.is_cancelled() {
            break;
        }

        let result = source.fetch_rows().await;
        let snapshot = match result {
            Ok(rows) => {
                tracing::info!(
                    rows = rows.len(),
                    generation = generation + 1,
                    "feed refreshed"
                );
                FeedSnapshot {
                    rows: Arc::new(rows),
                    fetched_at: Some(Utc::now()),
                    generation: generation + 1,
                    error: None,
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "feed refresh failed");
                FeedSnapshot {
                    rows: Arc::new(Vec::new()),
                    fetched_at: Some(Utc::now()),
                    generation: generation + 1,
                    error: Some(e.to_string()),
                }
            }
        };

        {
            let cancelled = shared
                .cancelled
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if *cancelled {
                tracing::debug!("refresh cancelled, dropping in-flight result");
                break;
            }
            generation += 1;
            tx.send_replace(snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::future::Future;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::error::StoreError;

    /// Returns scripted results in order, then empty row sets. Optionally
    /// blocks every fetch until the gate is opened.
    #[derive(Default)]
    struct ScriptedSource {
        calls: AtomicU32,
        script: Mutex<VecDeque<Result<Vec<RawRow>, StoreError>>>,
        started: Notify,
        gate: Option<Arc<Notify>>,
    }

    impl ScriptedSource {
        fn with_script(script: Vec<Result<Vec<RawRow>, StoreError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                ..Self::default()
            }
        }
    }

    impl RowSource for ScriptedSource {
        fn fetch_rows(&self) -> impl Future<Output = Result<Vec<RawRow>, StoreError>> + Send {
            async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                self.started.notify_one();
                if let Some(gate) = &self.gate {
                    gate.notified().await;
                }
                self.script
                    .lock()
                    .unwrap()
                    .pop_front()
                    .unwrap_or_else(|| Ok(Vec::new()))
            }
        }
    }

    fn row(id: &str) -> RawRow {
        RawRow {
            id: Some(id.to_string()),
            ..RawRow::default()
        }
    }

    #[tokio::test]
    async fn publishes_first_fetch_immediately() {
        let script = vec![Ok(vec![row("a"), row("b")])];
        let source = Arc::new(ScriptedSource::with_script(script));
        let handle = spawn_refresh(Arc::clone(&source), Duration::from_hours(1));
        let mut rx = handle.subscribe();

        rx.changed().await.unwrap();
        let snap = rx.borrow().clone();
        assert_eq!(snap.generation, 1);
        assert_eq!(snap.rows.len(), 2);
        assert!(snap.error.is_none());
        assert!(snap.fetched_at.is_some());
    }

    #[tokio::test]
    async fn failure_publishes_empty_rows_with_error() {
        let source = Arc::new(ScriptedSource::with_script(vec![Err(StoreError::Api {
            status: 503,
            message: "unavailable".to_string(),
        })]));
        let handle = spawn_refresh(source, Duration::from_hours(1));
        let mut rx = handle.subscribe();

        rx.changed().await.unwrap();
        let snap = handle.snapshot();
        assert!(snap.rows.is_empty());
        assert_eq!(
            snap.error.as_deref(),
            Some("row store returned 503: unavailable")
        );
    }

    #[tokio::test]
    async fn request_refresh_fetches_before_the_next_tick() {
        let source = Arc::new(ScriptedSource::with_script(vec![
            Ok(vec![row("a")]),
            Ok(vec![row("a"), row("b"), row("c")]),
        ]));
        let handle = spawn_refresh(Arc::clone(&source), Duration::from_hours(1));
        let mut rx = handle.subscribe();
        rx.changed().await.unwrap();

        handle.trigger().request_refresh();
        tokio::time::timeout(Duration::from_secs(5), rx.changed())
            .await
            .expect("refresh should not wait for the interval")
            .unwrap();
        let snap = rx.borrow().clone();
        assert_eq!(snap.generation, 2);
        assert_eq!(snap.rows.len(), 3);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn refetches_on_every_interval() {
        let source = Arc::new(ScriptedSource::default());
        let handle = spawn_refresh(Arc::clone(&source), Duration::from_mins(4));
        let mut rx = handle.subscribe();

        for expected in 1..=3 {
            rx.changed().await.unwrap();
            assert_eq!(rx.borrow().generation, expected);
        }
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn cancel_discards_in_flight_fetch() {
        let gate = Arc::new(Notify::new());
        let source = Arc::new(ScriptedSource {
            gate: Some(Arc::clone(&gate)),
            script: Mutex::new(vec![Ok(vec![row("late")])].into()),
            ..ScriptedSource::default()
        });
        let handle = spawn_refresh(Arc::clone(&source), Duration::from_hours(1));
        let rx = handle.subscribe();

        source.started.notified().await;
        handle.cancel();
        gate.notify_one();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(handle.is_cancelled());
        assert_eq!(rx.borrow().generation, 0);
        assert!(rx.borrow().rows.is_empty());
    }
}
