//! Scan sessions and the result-stream protocol.
//!
//! A scan session turns N independent probe completions into an ordered,
//! streamable protocol: one `site_result` event per completed probe,
//! delivered in completion order, followed by exactly one `search_complete`
//! event. Probe tasks are producers on an internal channel; the session
//! driver is the single consumer serializing events to the boundary.

use crate::dispatcher::ScanEngine;
use crate::error::{Result, ScanError};
use crate::outcome::{ProbeOutcome, ProbeStatus, ScanEvent, ScanReport, ScanSummary};
use crate::target::ProbeTarget;
use chrono::Utc;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use umbra_core::Handle;
use uuid::Uuid;

/// Lifecycle of a scan session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Tasks dispatched, nothing delivered yet
    Pending,
    /// At least one outcome delivered
    Streaming,
    /// All outcomes and the terminal event delivered
    Complete,
    /// Consumer detached or cancelled before completion
    Cancelled,
}

/// Consumer handle for one scan's event stream.
///
/// Dropping the stream counts as disconnecting: the session stops emitting
/// events, while in-flight probes run to completion in the background and
/// release their concurrency slots.
pub struct ScanStream {
    session_id: Uuid,
    total: usize,
    events: mpsc::Receiver<ScanEvent>,
    cancel: CancellationToken,
}

impl ScanStream {
    /// Unique ID of the scan session.
    #[must_use]
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Number of platforms being probed.
    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    /// Receive the next event; `None` after the terminal event (or once the
    /// session notices a cancellation).
    pub async fn next_event(&mut self) -> Option<ScanEvent> {
        self.events.recv().await
    }

    /// Stop event delivery without aborting in-flight probes.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

/// One scan in flight: the handle, its expanded targets, and the outcomes
/// collected so far.
struct ScanSession {
    id: Uuid,
    handle: Handle,
    targets: Vec<ProbeTarget>,
    outcomes: Vec<ProbeOutcome>,
    state: SessionState,
}

impl ScanSession {
    /// Drive all probe tasks and serialize their outcomes to the consumer.
    async fn run(
        mut self,
        engine: ScanEngine,
        tx: mpsc::Sender<ScanEvent>,
        cancel: CancellationToken,
    ) {
        let mut inflight = FuturesUnordered::new();

        for target in self.targets.clone() {
            let engine = engine.clone();
            let site = target.name.clone();
            let url = target.url.clone();
            let category = target.category;
            let join = tokio::spawn(async move { engine.probe_target(&target).await });
            inflight.push(async move { (site, url, category, join.await) });
        }

        while let Some((site, url, category, joined)) = inflight.next().await {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(err) => {
                    // A panicked probe still counts toward the protocol: the
                    // consumer is owed exactly one event per target.
                    warn!(site = %site, error = %err, "probe task failed");
                    ProbeOutcome {
                        site,
                        url,
                        found: false,
                        state: ProbeStatus::Error,
                        status_code: 0,
                        via_proxy: false,
                        proxy_id: None,
                        latency_ms: None,
                        reason: Some(format!("probe task failed: {err}")),
                        display_name: None,
                        bio: None,
                        avatar: None,
                        category,
                    }
                }
            };

            self.deliver(&tx, &cancel, outcome).await;
        }

        self.finish(&tx).await;
    }

    /// Forward one outcome to the consumer, unless the session is cancelled.
    async fn deliver(
        &mut self,
        tx: &mpsc::Sender<ScanEvent>,
        cancel: &CancellationToken,
        outcome: ProbeOutcome,
    ) {
        if self.state != SessionState::Cancelled {
            if cancel.is_cancelled() {
                self.state = SessionState::Cancelled;
                debug!(session = %self.id, "scan cancelled, suppressing further events");
            } else if tx
                .send(ScanEvent::SiteResult(outcome.clone()))
                .await
                .is_err()
            {
                self.state = SessionState::Cancelled;
                debug!(session = %self.id, "consumer disconnected, suppressing further events");
            } else {
                self.state = SessionState::Streaming;
            }
        }

        self.outcomes.push(outcome);
    }

    /// Emit the terminal event once every probe has resolved.
    async fn finish(mut self, tx: &mpsc::Sender<ScanEvent>) {
        if self.state == SessionState::Cancelled {
            debug!(
                session = %self.id,
                discarded = self.outcomes.len(),
                "cancelled scan finished in background"
            );
            return;
        }

        let found_profiles: Vec<ProbeOutcome> =
            self.outcomes.iter().filter(|o| o.found).cloned().collect();
        let summary = ScanSummary {
            total: self.outcomes.len(),
            found_count: found_profiles.len(),
        };

        let event = ScanEvent::SearchComplete {
            summary,
            found_profiles,
        };

        if tx.send(event).await.is_ok() {
            self.state = SessionState::Complete;
            info!(
                session = %self.id,
                handle = %self.handle,
                total = summary.total,
                found = summary.found_count,
                "scan complete"
            );
        } else {
            self.state = SessionState::Cancelled;
        }
    }
}

impl ScanEngine {
    /// Start a scan and return its event stream.
    ///
    /// Fails fast (before dispatching any probe) if the catalog is empty.
    /// Must be called within a tokio runtime; probe tasks are spawned
    /// immediately.
    ///
    /// # Errors
    /// Returns [`ScanError::EmptyCatalog`] or a target-expansion error.
    pub fn start_scan(&self, handle: &Handle, limit: Option<usize>) -> Result<ScanStream> {
        let targets = self.expand_targets(handle, limit)?;
        let total = targets.len();

        let session_id = Uuid::new_v4();
        let cancel = CancellationToken::new();
        let (tx, rx) = mpsc::channel(total.max(1));

        info!(session = %session_id, handle = %handle, total, "starting scan");

        let session = ScanSession {
            id: session_id,
            handle: handle.clone(),
            targets,
            outcomes: Vec::with_capacity(total),
            state: SessionState::Pending,
        };

        tokio::spawn(session.run(self.clone(), tx, cancel.clone()));

        Ok(ScanStream {
            session_id,
            total,
            events: rx,
            cancel,
        })
    }

    /// Run a scan to completion and return the full outcome list.
    ///
    /// Identical semantics to [`ScanEngine::start_scan`], without partial
    /// delivery.
    ///
    /// # Errors
    /// Returns the same fail-fast errors as `start_scan`.
    pub async fn scan_to_completion(
        &self,
        handle: &Handle,
        limit: Option<usize>,
    ) -> Result<ScanReport> {
        let started_at = Utc::now();
        let mut stream = self.start_scan(handle, limit)?;

        let mut outcomes = Vec::with_capacity(stream.total());
        while let Some(event) = stream.next_event().await {
            if let ScanEvent::SiteResult(outcome) = event {
                outcomes.push(outcome);
            }
        }

        let found_count = outcomes.iter().filter(|o| o.found).count();

        Ok(ScanReport {
            handle: handle.to_string(),
            total: outcomes.len(),
            found_count,
            started_at,
            finished_at: Utc::now(),
            outcomes,
        })
    }

    /// Expand the catalog into probe targets for one handle.
    pub(crate) fn expand_targets(
        &self,
        handle: &Handle,
        limit: Option<usize>,
    ) -> Result<Vec<ProbeTarget>> {
        let definitions = self.registry.get_all();
        if definitions.is_empty() {
            return Err(ScanError::EmptyCatalog);
        }

        definitions
            .iter()
            .take(limit.unwrap_or(usize::MAX))
            .map(|definition| ProbeTarget::from_definition(definition, handle))
            .collect()
    }
}
