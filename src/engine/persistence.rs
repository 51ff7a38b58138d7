// ── Bridge Engine: Persistence ─────────────────────────────────────────────
//
// Durable mirror of the in-memory store: one pretty-printed JSON record per
// fragment at `<storage_dir>/<id>.json`.
//
//   PersistenceSink: synchronous, one write per call
//   PersistQueue:    runs sink writes on a bounded blocking pool owned by a
//                    private tokio runtime; fire-and-forget for the caller
//
// Each write is attempted once. Outcomes are logged, counted and broadcast
// as `PersistEvent`s; a failed write never reaches the `store` caller and is
// never retried. The in-memory copy stays authoritative.

use crate::atoms::constants::{PERSIST_THREAD_PREFIX, RECORD_EXTENSION};
use crate::atoms::error::{BridgeError, BridgeResult};
use crate::atoms::types::{MemoryFragment, PersistEvent};
use log::{error, info};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::runtime::Runtime;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

// ═════════════════════════════════════════════════════════════════════════════
// Sink
// ═════════════════════════════════════════════════════════════════════════════

/// Whether `id` is a single plain file-name component.
pub fn is_safe_record_id(id: &str) -> bool {
    !id.is_empty() && !id.contains(['/', '\\', '\0']) && !id.contains("..")
}

/// Writes fragment records into a directory.
#[derive(Debug, Clone)]
pub struct PersistenceSink {
    dir: PathBuf,
}

impl PersistenceSink {
    /// Open a sink rooted at `dir`, creating the directory if absent.
    pub fn open(dir: impl Into<PathBuf>) -> BridgeResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| {
            BridgeError::Config(format!("Failed to create storage dir {}: {}", dir.display(), e))
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where the record for `id` lives. Ids that could name a path outside
    /// the storage directory are rejected.
    pub fn record_path(&self, id: &str) -> BridgeResult<PathBuf> {
        if !is_safe_record_id(id) {
            return Err(BridgeError::persistence(id, "id is not a valid record name"));
        }
        Ok(self.dir.join(format!("{}.{}", id, RECORD_EXTENSION)))
    }

    /// Serialize the whole fragment and write it, replacing any previous
    /// record with the same id. Identical fragments produce identical bytes.
    pub fn persist(&self, fragment: &MemoryFragment) -> BridgeResult<PathBuf> {
        let path = self.record_path(&fragment.id)?;
        let mut json = serde_json::to_string_pretty(fragment)?;
        json.push('\n');
        std::fs::write(&path, json)?;
        Ok(path)
    }

    /// Read a record back.
    pub fn load(&self, id: &str) -> BridgeResult<MemoryFragment> {
        let text = std::fs::read_to_string(self.record_path(id)?)?;
        Ok(serde_json::from_str(&text)?)
    }
}

// ═════════════════════════════════════════════════════════════════════════════
// Queue
// ═════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
struct PersistCounters {
    persisted: AtomicU64,
    failed: AtomicU64,
    pending: AtomicUsize,
}

/// Asynchronous write-behind queue in front of a `PersistenceSink`.
///
/// At most `workers` writes run at once; the rest wait in the runtime's
/// blocking queue. The queue is unbounded.
pub struct PersistQueue {
    /// `None` only during drop.
    runtime: Option<Runtime>,
    sink: Arc<PersistenceSink>,
    events: broadcast::Sender<PersistEvent>,
    in_flight: Mutex<Vec<JoinHandle<()>>>,
    counters: Arc<PersistCounters>,
}

impl PersistQueue {
    pub fn new(sink: PersistenceSink, workers: usize, event_capacity: usize) -> BridgeResult<Self> {
        let workers = workers.max(1);
        let thread_seq = Arc::new(AtomicUsize::new(0));
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(workers)
            .thread_name_fn(move || {
                let n = thread_seq.fetch_add(1, Ordering::Relaxed);
                format!("{}-{}", PERSIST_THREAD_PREFIX, n)
            })
            .enable_all()
            .build()?;
        let (events, _) = broadcast::channel(event_capacity.max(1));

        info!(
            "[bridge::persist] Write pool ready: {} workers → {}",
            workers,
            sink.dir().display()
        );

        Ok(Self {
            runtime: Some(runtime),
            sink: Arc::new(sink),
            events,
            in_flight: Mutex::new(Vec::new()),
            counters: Arc::new(PersistCounters::default()),
        })
    }

    pub fn sink(&self) -> &PersistenceSink {
        &self.sink
    }

    /// Receive outcomes of writes submitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<PersistEvent> {
        self.events.subscribe()
    }

    /// Schedule one write and return immediately.
    pub fn submit(&self, fragment: MemoryFragment) {
        let Some(runtime) = self.runtime.as_ref() else {
            return;
        };
        let sink = Arc::clone(&self.sink);
        let events = self.events.clone();
        let counters = Arc::clone(&self.counters);
        counters.pending.fetch_add(1, Ordering::SeqCst);

        let handle = runtime.spawn_blocking(move || {
            let event = match sink.persist(&fragment) {
                Ok(path) => {
                    counters.persisted.fetch_add(1, Ordering::SeqCst);
                    info!("[bridge::persist] ✓ {} → {}", fragment.id, path.display());
                    PersistEvent::Persisted { id: fragment.id, path }
                }
                Err(e) => {
                    counters.failed.fetch_add(1, Ordering::SeqCst);
                    let fault = BridgeError::persistence(fragment.id.as_str(), e.to_string());
                    error!("[bridge::persist] ✗ {}", fault);
                    PersistEvent::Failed { id: fragment.id, error: fault.to_string() }
                }
            };
            counters.pending.fetch_sub(1, Ordering::SeqCst);
            // No subscribers is not an error.
            let _ = events.send(event);
        });

        let mut in_flight = self.in_flight.lock();
        // Prune finished handles only when the buffer is about to grow, so
        // the cost stays amortized O(1) per submit.
        if in_flight.len() == in_flight.capacity() {
            in_flight.retain(|h| !h.is_finished());
        }
        in_flight.push(handle);
    }

    /// Block until every write submitted so far has finished.
    ///
    /// Blocks the calling thread; avoid calling from inside an async task.
    pub fn flush(&self) {
        let handles = std::mem::take(&mut *self.in_flight.lock());
        if handles.is_empty() {
            return;
        }
        for result in futures::executor::block_on(futures::future::join_all(handles)) {
            if let Err(e) = result {
                error!("[bridge::persist] Write task aborted: {}", e);
            }
        }
    }

    pub fn persisted_count(&self) -> u64 {
        self.counters.persisted.load(Ordering::SeqCst)
    }

    pub fn failure_count(&self) -> u64 {
        self.counters.failed.load(Ordering::SeqCst)
    }

    pub fn pending(&self) -> usize {
        self.counters.pending.load(Ordering::SeqCst)
    }
}

impl Drop for PersistQueue {
    fn drop(&mut self) {
        self.flush();
        // Dropping a runtime inside an async context panics; background
        // shutdown does not.
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(id: &str, content: &str) -> MemoryFragment {
        MemoryFragment {
            id: id.into(),
            source_actor: "claude".into(),
            target_actor: Some("wes".into()),
            content: content.into(),
            compressed_payload: Some(serde_json::json!({"keys": ["brücke"]})),
            emotion: None,
            intent: Some("bridge_to_wes".into()),
            context: None,
            created_at: "2026-10-14T09:00:00+00:00".into(),
            importance_score: 2.5,
            flagged: false,
        }
    }

    #[test]
    fn open_creates_nested_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("a").join("b");
        let sink = PersistenceSink::open(&dir).unwrap();
        assert!(dir.is_dir());
        assert_eq!(sink.record_path("x_1").unwrap(), dir.join("x_1.json"));
    }

    #[test]
    fn record_preserves_non_ascii_and_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = PersistenceSink::open(tmp.path()).unwrap();
        let f = fragment("claude_0badcafe", "Die Brücke hält — 橋");
        let path = sink.persist(&f).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("Die Brücke hält — 橋"));
        assert!(text.contains("\"target_actor\": \"wes\""));
        assert!(text.contains("\"emotion\": null"));
        assert_eq!(sink.load("claude_0badcafe").unwrap(), f);
    }

    #[test]
    fn rewriting_same_fragment_is_byte_identical() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = PersistenceSink::open(tmp.path()).unwrap();
        let f = fragment("claude_11111111", "same");
        let first = std::fs::read(sink.persist(&f).unwrap()).unwrap();
        let second = std::fs::read(sink.persist(&f).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn queue_reports_success_on_channel() {
        let tmp = tempfile::tempdir().unwrap();
        let queue = PersistQueue::new(PersistenceSink::open(tmp.path()).unwrap(), 2, 16).unwrap();
        let mut rx = queue.subscribe();

        queue.submit(fragment("claude_22222222", "queued"));
        queue.flush();

        assert_eq!(queue.persisted_count(), 1);
        assert_eq!(queue.pending(), 0);
        match rx.try_recv().unwrap() {
            PersistEvent::Persisted { id, path } => {
                assert_eq!(id, "claude_22222222");
                assert!(path.exists());
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn failed_write_is_counted_not_retried() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = PersistenceSink::open(tmp.path()).unwrap();
        // A directory squatting on the record path makes the write fail.
        std::fs::create_dir(sink.record_path("claude_33333333").unwrap()).unwrap();
        let queue = PersistQueue::new(sink, 1, 16).unwrap();
        let mut rx = queue.subscribe();

        queue.submit(fragment("claude_33333333", "doomed"));
        queue.submit(fragment("claude_44444444", "fine"));
        queue.flush();

        assert_eq!(queue.failure_count(), 1);
        assert_eq!(queue.persisted_count(), 1);

        let mut events = vec![rx.try_recv().unwrap(), rx.try_recv().unwrap()];
        events.sort_by(|a, b| a.id().cmp(b.id()));
        assert!(events[0].is_failure());
        assert!(!events[1].is_failure());
        assert!(rx.try_recv().is_err(), "no retry event expected");
    }

    #[test]
    fn traversal_ids_are_rejected() {
        assert!(is_safe_record_id("claude_0badcafe"));
        assert!(is_safe_record_id("wes-2_ab"));
        for bad in ["", "..", "../escaped_1", "a/b", "a\\b", "nul\0byte", "x..y"] {
            assert!(!is_safe_record_id(bad), "{bad:?} accepted");
        }
    }

    #[test]
    fn queue_reports_traversal_id_as_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("store");
        let queue = PersistQueue::new(PersistenceSink::open(&dir).unwrap(), 1, 4).unwrap();
        let mut rx = queue.subscribe();

        queue.submit(fragment("../escaped_f71a6e7a", "outside"));
        queue.flush();

        assert_eq!(queue.failure_count(), 1);
        assert!(rx.try_recv().unwrap().is_failure());
        assert!(!tmp.path().join("escaped_f71a6e7a.json").exists());
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);
    }

    #[test]
    fn finished_handles_are_pruned_when_buffer_fills() {
        let tmp = tempfile::tempdir().unwrap();
        let queue = PersistQueue::new(PersistenceSink::open(tmp.path()).unwrap(), 2, 256).unwrap();
        for i in 0..64 {
            queue.submit(fragment(&format!("claude_{:08x}", i), "bulk"));
        }
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(10);
        while !queue.in_flight.lock().iter().all(|h| h.is_finished()) {
            assert!(std::time::Instant::now() < deadline, "writes did not finish");
            std::thread::sleep(std::time::Duration::from_millis(5));
        }

        let (len, cap) = {
            let in_flight = queue.in_flight.lock();
            (in_flight.len(), in_flight.capacity())
        };
        assert_eq!(len, 64);
        // Fill to capacity, then one more submit triggers the prune.
        let extra = cap - len + 1;
        for i in 0..extra {
            queue.submit(fragment(&format!("wes_{:08x}", i), "more"));
        }
        assert!(queue.in_flight.lock().len() <= extra);

        queue.flush();
        assert_eq!(queue.persisted_count() as usize, 64 + extra);
    }

    #[test]
    fn flush_with_nothing_submitted_returns() {
        let tmp = tempfile::tempdir().unwrap();
        let queue = PersistQueue::new(PersistenceSink::open(tmp.path()).unwrap(), 1, 4).unwrap();
        queue.flush();
        assert_eq!(queue.pending(), 0);
    }
}
