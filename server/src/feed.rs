//! Change feed listener.
//!
//! Consumes the remote store's change stream on a background task and hands
//! every pushed document to a callback. Delivery is at-least-once and may be
//! out of order; the callback is expected to be idempotent (the coordinator's
//! strictly-newer rule is). Each notification carries the full document, so
//! nothing needs to be replayed after a gap.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tally_engine::Document;
use tokio::task::JoinHandle;

use crate::store::RemoteStore;

/// Pause before subscribing again after the feed failed or ended.
pub const RESUBSCRIBE_DELAY: Duration = Duration::from_secs(5);

/// Handle to a running change feed. Dropping it cancels the feed.
#[derive(Debug)]
pub struct Subscription {
    task: JoinHandle<()>,
}

impl Subscription {
    /// Stop delivering changes.
    pub fn unsubscribe(self) {
        self.task.abort();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Deliver every remote change to `on_change` until unsubscribed.
pub fn subscribe<F>(remote: Arc<dyn RemoteStore>, on_change: F) -> Subscription
where
    F: Fn(Document) + Send + 'static,
{
    subscribe_with_delay(remote, on_change, RESUBSCRIBE_DELAY)
}

/// Like [`subscribe`] with a custom resubscribe delay.
pub fn subscribe_with_delay<F>(
    remote: Arc<dyn RemoteStore>,
    on_change: F,
    resubscribe_delay: Duration,
) -> Subscription
where
    F: Fn(Document) + Send + 'static,
{
    let task = tokio::spawn(async move {
        loop {
            match remote.subscribe().await {
                Ok(mut changes) => {
                    tracing::info!("Subscribed to remote change feed");
                    while let Some(doc) = changes.next().await {
                        tracing::debug!(updated_at = doc.updated_at, "Remote change received");
                        on_change(doc);
                    }
                    tracing::warn!("Remote change feed ended");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to subscribe to remote change feed");
                }
            }
            tokio::time::sleep(resubscribe_delay).await;
        }
    });

    Subscription { task }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryRemoteStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc;

    fn doc_at(updated_at: u64) -> Document {
        Document {
            updated_at,
            ..Document::default()
        }
    }

    async fn wait_subscribed() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn delivers_every_upsert() {
        let remote = Arc::new(MemoryRemoteStore::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _subscription = subscribe(remote.clone(), move |doc| {
            let _ = tx.send(doc.updated_at);
        });
        wait_subscribed().await;

        remote.upsert(&doc_at(1)).await.unwrap();
        remote.upsert(&doc_at(2)).await.unwrap();

        assert_eq!(rx.recv().await, Some(1));
        assert_eq!(rx.recv().await, Some(2));
    }

    #[tokio::test]
    async fn unsubscribe_stops_delivery() {
        let remote = Arc::new(MemoryRemoteStore::new());
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        let subscription = subscribe(remote.clone(), move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        wait_subscribed().await;

        remote.upsert(&doc_at(1)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        subscription.unsubscribe();
        tokio::task::yield_now().await;
        remote.upsert(&doc_at(2)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn resubscribes_after_outage() {
        let remote = Arc::new(MemoryRemoteStore::new());
        remote.set_reachable(false);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let subscription = subscribe_with_delay(
            remote.clone(),
            move |doc| {
                let _ = tx.send(doc.updated_at);
            },
            Duration::from_millis(20),
        );

        // First attempt fails, a later one succeeds
        tokio::time::sleep(Duration::from_millis(30)).await;
        remote.set_reachable(true);
        tokio::time::sleep(Duration::from_millis(60)).await;

        remote.upsert(&doc_at(5)).await.unwrap();
        let received = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("delivered after reconnect");
        assert_eq!(received, Some(5));
        subscription.unsubscribe();
    }
}
