//! Sync coordinator - owner of the authoritative in-memory document.
//!
//! The document lives in a `tokio::sync::watch` channel. Its sender is the
//! only way to change the document, so every mutation (local edits, loads,
//! accepted remote pushes) is applied one at a time even on a multi-threaded
//! runtime, and every change is visible to observers through
//! [`Coordinator::subscribe`].
//!
//! # Flow
//!
//! 1. [`Coordinator::load`] reconciles the local and remote copies and
//!    adopts the winner unless memory already moved past it.
//! 2. [`Coordinator::persist`] applies a mutation in memory, stamps it and
//!    returns immediately; a single writer task then writes the local store
//!    followed by the remote store (merge-then-upsert).
//! 3. [`Coordinator::accept_remote`] applies change-feed pushes that are
//!    strictly newer than memory.
//!
//! Writes are queued while the in-memory document is still locked, so the
//! writer sees them in stamp order and the stores always end on the latest
//! state. Store failures never reach callers: they are logged and the
//! in-memory copy stays the visible truth until a later write or load heals
//! the stores.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tally_engine::{clock, reconcile, Document, Mutation, UserRole};
use tokio::sync::{mpsc, oneshot, watch};

use crate::feed::{self, Subscription};
use crate::store::{LocalStore, RemoteStore};

/// Whether any store write is still in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Idle,
    Syncing,
}

/// Counts a write as in flight for as long as it is alive.
struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Work for the writer task, handled strictly in queue order.
enum WriteJob {
    Store {
        doc: Document,
        include_remote: bool,
        in_flight: InFlight,
    },
    /// Answered once every job queued before it is done.
    Flush(oneshot::Sender<()>),
}

pub struct Coordinator {
    state: watch::Sender<Document>,
    local: Arc<dyn LocalStore>,
    remote: Option<Arc<dyn RemoteStore>>,
    writes: mpsc::UnboundedSender<WriteJob>,
    in_flight: Arc<AtomicUsize>,
    feed: Mutex<Option<Subscription>>,
}

impl Coordinator {
    /// Create a coordinator holding [`Document::initial`].
    ///
    /// Without a remote store the coordinator runs local-only. Must be called
    /// from within a Tokio runtime; the writer task stops when the coordinator
    /// is dropped.
    pub fn new(local: Arc<dyn LocalStore>, remote: Option<Arc<dyn RemoteStore>>) -> Self {
        let (state, _) = watch::channel(Document::initial());
        let (writes, jobs) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(Arc::clone(&local), remote.clone(), jobs));

        Self {
            state,
            local,
            remote,
            writes,
            in_flight: Arc::new(AtomicUsize::new(0)),
            feed: Mutex::new(None),
        }
    }

    /// Create a coordinator and load the stored state (load-or-default).
    ///
    /// Returns once the reconciled state is written back locally.
    pub async fn open(
        local: Arc<dyn LocalStore>,
        remote: Option<Arc<dyn RemoteStore>>,
    ) -> Arc<Self> {
        let coordinator = Arc::new(Self::new(local, remote));
        coordinator.load().await;
        coordinator.flush().await;
        coordinator
    }

    /// Clone of the current in-memory document.
    pub fn current(&self) -> Document {
        self.state.borrow().clone()
    }

    /// Receiver notified on every in-memory change.
    pub fn subscribe(&self) -> watch::Receiver<Document> {
        self.state.subscribe()
    }

    pub fn status(&self) -> SyncStatus {
        if self.in_flight.load(Ordering::SeqCst) > 0 {
            SyncStatus::Syncing
        } else {
            SyncStatus::Idle
        }
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// Reconcile the local and remote copies.
    ///
    /// Unreadable stores count as absent. The remote store is never written
    /// here. If memory moved past the winner while the stores were read, the
    /// winner is dropped: memory stays as it is and nothing is written back.
    /// Otherwise the winner is adopted and written back to the local store
    /// when it differs from it. The session role always comes from this
    /// device.
    pub async fn load(&self) -> Document {
        let (local, remote) = tokio::join!(self.read_local(), self.read_remote());

        let resolution = reconcile::resolve(local.as_ref(), remote.as_ref());
        let local_role = local.as_ref().and_then(|doc| doc.user_role);
        let mut winner =
            reconcile::pick_winner(local.clone(), remote).unwrap_or_else(Document::initial);
        winner.user_role = local_role;

        tracing::info!(
            resolution = ?resolution,
            updated_at = winner.updated_at,
            records = winner.record_count(),
            "Loaded state"
        );

        let adopted = self.state.send_if_modified(|current| {
            if winner.updated_at < current.updated_at {
                return false;
            }
            let mut next = winner.clone();
            next.user_role = current.user_role.or(winner.user_role);
            if local.as_ref() != Some(&next) {
                self.enqueue(next.clone(), false);
            }
            if *current == next {
                return false;
            }
            *current = next;
            true
        });

        if !adopted {
            tracing::debug!(
                updated_at = winner.updated_at,
                "In-memory state unchanged by load"
            );
        }

        winner
    }

    /// Apply a mutation optimistically and queue its write-through.
    ///
    /// The returned document is the new in-memory state.
    pub fn persist(&self, mutation: Mutation) -> Document {
        let mut snapshot = Document::default();
        self.state.send_modify(|doc| {
            mutation.apply(doc);
            doc.updated_at = clock::next_stamp(doc.updated_at, clock::now_millis());
            snapshot = doc.clone();
            self.enqueue(snapshot.clone(), true);
        });

        tracing::debug!(
            mutation = mutation.kind(),
            updated_at = snapshot.updated_at,
            "Applied mutation"
        );

        snapshot
    }

    /// Apply a document pushed by the change feed if it is strictly newer.
    ///
    /// Accepted pushes are mirrored to the local store. Returns whether the
    /// in-memory document changed.
    pub fn accept_remote(&self, incoming: Document) -> bool {
        let incoming_at = incoming.updated_at;
        let accepted = self.state.send_if_modified(|current| {
            if !reconcile::accept_remote(current, incoming) {
                return false;
            }
            self.enqueue(current.clone(), false);
            true
        });

        if accepted {
            tracing::info!(updated_at = incoming_at, "Accepted remote change");
        } else {
            tracing::trace!(updated_at = incoming_at, "Ignored stale remote change");
        }
        accepted
    }

    /// Set the session-local role. Not stamped and never sent to the remote store.
    pub fn set_user_role(&self, role: Option<UserRole>) {
        self.state.send_if_modified(|doc| {
            if doc.user_role == role {
                return false;
            }
            doc.user_role = role;
            self.enqueue(doc.clone(), false);
            true
        });
    }

    /// Forward the remote change feed into [`Coordinator::accept_remote`].
    ///
    /// `None` when running without a remote store. Dropping the subscription
    /// stops the feed.
    pub fn listen(self: &Arc<Self>) -> Option<Subscription> {
        let remote = self.remote.clone()?;
        let coordinator = Arc::downgrade(self);
        Some(feed::subscribe(remote, move |doc| {
            if let Some(coordinator) = coordinator.upgrade() {
                coordinator.accept_remote(doc);
            }
        }))
    }

    /// Keep a change feed running until [`Coordinator::stop_listening`].
    ///
    /// Does nothing if one is already running. Returns whether a feed is
    /// running afterwards, which is never the case without a remote store.
    pub fn start_listening(self: &Arc<Self>) -> bool {
        let mut feed = self.feed.lock().unwrap_or_else(PoisonError::into_inner);
        if feed.is_none() {
            *feed = self.listen();
            if feed.is_some() {
                tracing::info!("Change feed started");
            }
        }
        feed.is_some()
    }

    /// Tear down the change feed started by [`Coordinator::start_listening`].
    pub fn stop_listening(&self) {
        let stopped = self
            .feed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(subscription) = stopped {
            subscription.unsubscribe();
            tracing::info!("Change feed stopped");
        }
    }

    pub fn is_listening(&self) -> bool {
        self.feed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Wait until every write queued so far has finished.
    pub async fn flush(&self) {
        let (done, finished) = oneshot::channel();
        if self.writes.send(WriteJob::Flush(done)).is_err() || finished.await.is_err() {
            tracing::error!("Store writer stopped, pending writes are lost");
        }
    }

    fn enqueue(&self, doc: Document, include_remote: bool) {
        let job = WriteJob::Store {
            doc,
            include_remote,
            in_flight: InFlight::enter(&self.in_flight),
        };
        if self.writes.send(job).is_err() {
            tracing::error!("Store writer stopped, write dropped");
        }
    }

    async fn read_local(&self) -> Option<Document> {
        match self.local.get().await {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!(error = %e, "Local store unreadable, treating as absent");
                None
            }
        }
    }

    async fn read_remote(&self) -> Option<Document> {
        let remote = self.remote.as_ref()?;
        match remote.get().await {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!(error = %e, "Remote store unreachable, treating as absent");
                None
            }
        }
    }
}

/// Drain the write queue one job at a time until the coordinator is gone.
async fn run_writer(
    local: Arc<dyn LocalStore>,
    remote: Option<Arc<dyn RemoteStore>>,
    mut jobs: mpsc::UnboundedReceiver<WriteJob>,
) {
    while let Some(job) = jobs.recv().await {
        match job {
            WriteJob::Store {
                doc,
                include_remote,
                in_flight,
            } => {
                let remote = remote.as_deref().filter(|_| include_remote);
                write_through(local.as_ref(), remote, &doc).await;
                drop(in_flight);
            }
            WriteJob::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    tracing::debug!("Store writer stopped");
}

/// Write the local store, then merge-and-put the remote store.
/// Failures are logged and swallowed.
async fn write_through(local: &dyn LocalStore, remote: Option<&dyn RemoteStore>, doc: &Document) {
    if let Err(e) = local.put(doc).await {
        tracing::warn!(error = %e, updated_at = doc.updated_at, "Local write failed");
    }

    let Some(remote) = remote else {
        return;
    };
    match remote.put(doc).await {
        Ok(merged) => tracing::debug!(
            updated_at = merged.updated_at,
            records = merged.record_count(),
            "Remote write merged"
        ),
        Err(e) => tracing::warn!(error = %e, updated_at = doc.updated_at, "Remote write failed"),
    }
}
