// Sleuthcrab - GPL-3.0-or-later
// This file is part of Sleuthcrab.
//
// Copyright (C) 2026 Daniel Freiermuth
//
// Sleuthcrab is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// Sleuthcrab is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with Sleuthcrab.  If not, see <https://www.gnu.org/licenses/>.

//! Background merging with deduplication and memoization.
//!
//! A single thread runs merges, keeping only the latest request per
//! [`MergeCache`]: when files keep arriving, intermediate merges are skipped.
//! The newest stream per [`LogType`] is memoized by merge id, so asking again
//! for the same input set returns the same stream. Superseded streams are
//! dropped from the memo.
//!
//! [`MergeCache`] pairs a request slot with a `watch` channel and offers
//! stale-while-revalidate reads.

use crate::core::merge::{merge, merge_id, MergeInput, MergedStream};
use crate::parser::LogType;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use tokio::sync::watch;

type Slot = watch::Sender<Option<Arc<MergedStream>>>;

static NEXT_CACHE: AtomicU64 = AtomicU64::new(0);

/// Who a merge is for. Requests with the same key replace each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MergeKey {
    pub log_type: LogType,
    cache: u64,
}

impl MergeKey {
    /// A key no other requester shares.
    #[must_use]
    pub fn unique(log_type: LogType) -> Self {
        Self {
            log_type,
            cache: NEXT_CACHE.fetch_add(1, Ordering::Relaxed),
        }
    }
}

struct MergeRequest {
    inputs: Vec<MergeInput>,
    reply: Slot,
}

/// Handle to submit merges to the worker.
///
/// Clone this to submit from multiple places.
/// When all handles are dropped, the worker thread exits gracefully.
#[derive(Clone)]
pub struct MergeWorkerHandle {
    request_tx: Sender<(MergeKey, MergeRequest)>,
    memo: Arc<DashMap<LogType, Arc<MergedStream>>>,
}

impl MergeWorkerHandle {
    /// Submit a merge. A pending merge with the same `key` is replaced.
    pub fn submit(&self, key: MergeKey, inputs: Vec<MergeInput>, reply: Slot) {
        let _ = self
            .request_tx
            .send((key, MergeRequest { inputs, reply }));
    }

    /// The memoized merge of `log_type`, if it has this id.
    #[must_use]
    pub fn cached(&self, log_type: LogType, id: &str) -> Option<Arc<MergedStream>> {
        self.memo
            .get(&log_type)
            .filter(|entry| entry.value().id == id)
            .map(|entry| Arc::clone(entry.value()))
    }
}

/// Single-threaded merge worker.
pub struct MergeWorker {
    handle: MergeWorkerHandle,
    _thread: thread::JoinHandle<()>,
}

impl MergeWorker {
    /// Create a new merge worker with a background thread.
    #[must_use]
    pub fn new() -> Self {
        let (request_tx, request_rx) = channel();
        let memo = Arc::new(DashMap::new());

        let worker_memo = Arc::clone(&memo);
        let thread = thread::spawn(move || {
            Self::worker_loop(&request_rx, &worker_memo);
        });

        Self {
            handle: MergeWorkerHandle { request_tx, memo },
            _thread: thread,
        }
    }

    /// Get a handle to submit merges to this worker.
    #[must_use]
    pub fn handle(&self) -> MergeWorkerHandle {
        self.handle.clone()
    }

    fn worker_loop(
        request_rx: &Receiver<(MergeKey, MergeRequest)>,
        memo: &DashMap<LogType, Arc<MergedStream>>,
    ) {
        let mut pending: BTreeMap<MergeKey, MergeRequest> = BTreeMap::new();

        // Drain all available requests, keeping only latest per key
        let drain = |pending: &mut BTreeMap<MergeKey, MergeRequest>| {
            while let Ok((key, request)) = request_rx.try_recv() {
                pending.insert(key, request);
            }
        };

        // Main loop - exits when all senders are dropped
        while let Ok((key, request)) = request_rx.recv() {
            pending.insert(key, request);
            drain(&mut pending);

            while let Some((key, request)) = pending.pop_first() {
                let stream = Self::run(key.log_type, &request.inputs, memo);
                let _ = request.reply.send(Some(stream));
                drain(&mut pending);
            }
        }
        tracing::trace!("Merge worker exiting");
    }

    fn run(
        log_type: LogType,
        inputs: &[MergeInput],
        memo: &DashMap<LogType, Arc<MergedStream>>,
    ) -> Arc<MergedStream> {
        let id = merge_id(inputs);
        if let Some(hit) = memo.get(&log_type).filter(|hit| hit.value().id == id) {
            tracing::trace!("Reusing merge {id}");
            return Arc::clone(hit.value());
        }

        let stream = Arc::new(merge(inputs, log_type));
        // Replaces the previous merge of this type
        memo.insert(log_type, Arc::clone(&stream));
        stream
    }
}

impl Default for MergeWorker {
    fn default() -> Self {
        Self::new()
    }
}

/// Latest merge for one log type, computed in the background.
pub struct MergeCache {
    key: MergeKey,
    pending_id: Option<String>,
    rx: watch::Receiver<Option<Arc<MergedStream>>>,
    tx: Slot,
}

impl MergeCache {
    #[must_use]
    pub fn new(log_type: LogType) -> Self {
        let (tx, rx) = watch::channel(None);
        Self {
            key: MergeKey::unique(log_type),
            pending_id: None,
            rx,
            tx,
        }
    }

    /// The latest finished merge, possibly older than the last request.
    pub fn latest(&mut self) -> Option<Arc<MergedStream>> {
        // borrow_and_update marks the value as seen
        self.rx.borrow_and_update().clone()
    }

    /// A receiver that sees every finished merge.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<MergedStream>>> {
        self.tx.subscribe()
    }

    /// Ask for the merge of `inputs`.
    ///
    /// A no-op if the same input set is already requested. Memoized merges
    /// are published immediately.
    pub fn request(&mut self, inputs: Vec<MergeInput>, worker: &MergeWorkerHandle) {
        if inputs.is_empty() {
            return;
        }

        let id = merge_id(&inputs);
        if self.pending_id.as_deref() == Some(id.as_str()) {
            return;
        }

        if let Some(hit) = worker.cached(self.key.log_type, &id) {
            let _ = self.tx.send(Some(hit));
        } else {
            worker.submit(self.key, inputs, self.tx.clone());
        }
        self.pending_id = Some(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entry::{LevelCounts, LogEntry, ParsedFile};
    use indexmap::IndexMap;

    fn file(name: &str, moments: &[i64]) -> MergeInput {
        let entries = moments
            .iter()
            .enumerate()
            .map(|(index, m)| LogEntry {
                index,
                line: index + 1,
                timestamp: m.to_string(),
                moment_value: Some(*m),
                level: None,
                message: format!("{name}-{index}"),
                meta: None,
                log_type: LogType::Browser,
                source_file: Arc::from(name),
                repeated: Vec::new(),
            })
            .collect();
        MergeInput::Parsed(Arc::new(ParsedFile {
            id: name.to_string(),
            file_name: name.to_string(),
            full_path: name.to_string(),
            size: 0,
            log_type: LogType::Browser,
            entries: Arc::new(entries),
            lines: moments.len(),
            level_counts: LevelCounts::default(),
            repeated_counts: IndexMap::new(),
        }))
    }

    #[tokio::test]
    async fn test_cache_receives_merge() {
        let worker = MergeWorker::new();
        let mut cache = MergeCache::new(LogType::Browser);
        let mut rx = cache.subscribe();

        cache.request(vec![file("a", &[0, 2]), file("b", &[1])], &worker.handle());
        let merged = rx
            .wait_for(Option::is_some)
            .await
            .expect("worker alive")
            .clone()
            .expect("merged");

        assert_eq!(merged.id, "a+b");
        assert_eq!(merged.log_entries.len(), 3);
        assert_eq!(cache.latest().map(|m| m.id.clone()), Some("a+b".to_string()));
    }

    #[tokio::test]
    async fn test_latest_request_wins() {
        let worker = MergeWorker::new();
        let mut cache = MergeCache::new(LogType::Browser);
        let mut rx = cache.subscribe();

        cache.request(vec![file("a", &[0]), file("b", &[1])], &worker.handle());
        cache.request(
            vec![file("a", &[0]), file("b", &[1]), file("c", &[2])],
            &worker.handle(),
        );

        let merged = rx
            .wait_for(|m| m.as_ref().is_some_and(|m| m.id == "a+b+c"))
            .await
            .expect("worker alive")
            .clone()
            .expect("merged");
        assert_eq!(merged.log_entries.len(), 3);
    }

    #[tokio::test]
    async fn test_memoized_by_id() {
        let worker = MergeWorker::new();
        let handle = worker.handle();
        let inputs = vec![file("a", &[0]), file("b", &[1])];

        let mut first = MergeCache::new(LogType::Browser);
        let mut first_rx = first.subscribe();
        first.request(inputs.clone(), &handle);
        let first_stream = first_rx
            .wait_for(Option::is_some)
            .await
            .expect("worker alive")
            .clone()
            .expect("merged");

        let mut second = MergeCache::new(LogType::Browser);
        second.request(inputs, &handle);
        let second_stream = second.latest().expect("served from memo");
        assert!(Arc::ptr_eq(&first_stream, &second_stream));
        assert!(handle.cached(LogType::Browser, "a+b").is_some());
    }

    async fn next_merge(
        rx: &mut watch::Receiver<Option<Arc<MergedStream>>>,
        id: &str,
    ) -> Arc<MergedStream> {
        rx.wait_for(|m| m.as_ref().is_some_and(|m| m.id == id))
            .await
            .expect("worker alive")
            .clone()
            .expect("merged")
    }

    #[tokio::test]
    async fn test_superseded_merge_leaves_memo() {
        let worker = MergeWorker::new();
        let handle = worker.handle();
        let mut cache = MergeCache::new(LogType::Browser);
        let mut rx = cache.subscribe();

        let names: Vec<String> = (0..6).map(|i| format!("f{i}")).collect();
        for end in 2..=names.len() {
            let inputs = names[..end]
                .iter()
                .map(|name| file(name, &[0, 1, 2]))
                .collect();
            cache.request(inputs, &handle);
            next_merge(&mut rx, &names[..end].join("+")).await;
        }

        assert_eq!(handle.memo.len(), 1);
        assert!(handle.cached(LogType::Browser, "f0+f1").is_none());
        let newest = handle
            .cached(LogType::Browser, "f0+f1+f2+f3+f4+f5")
            .expect("newest merge memoized");
        assert_eq!(newest.log_entries.len(), 18);
    }

    #[tokio::test]
    async fn test_caches_of_same_type_both_answered() {
        let worker = MergeWorker::new();
        let handle = worker.handle();

        // Keep the worker busy so both requests queue up together
        let (busy_tx, _busy_rx) = watch::channel(None);
        let busy: Vec<i64> = (0..200_000).collect();
        handle.submit(
            MergeKey::unique(LogType::Renderer),
            vec![file("big1", &busy), file("big2", &busy)],
            busy_tx,
        );

        let mut first = MergeCache::new(LogType::All);
        let mut second = MergeCache::new(LogType::All);
        let mut first_rx = first.subscribe();
        let mut second_rx = second.subscribe();
        first.request(vec![file("a", &[0]), file("b", &[1])], &handle);
        second.request(vec![file("c", &[0]), file("d", &[1])], &handle);

        assert_eq!(next_merge(&mut first_rx, "a+b").await.log_entries.len(), 2);
        assert_eq!(next_merge(&mut second_rx, "c+d").await.log_entries.len(), 2);
    }

    #[test]
    fn test_repeated_request_is_noop() {
        let worker = MergeWorker::new();
        let mut cache = MergeCache::new(LogType::Webapp);
        cache.request(vec![file("w", &[0])], &worker.handle());
        cache.request(vec![file("w", &[0])], &worker.handle());
        assert_eq!(cache.pending_id.as_deref(), Some("w"));
        cache.request(Vec::new(), &worker.handle());
        assert_eq!(cache.pending_id.as_deref(), Some("w"));
    }
}
