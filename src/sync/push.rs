use futures::StreamExt;
use strum::IntoEnumIterator;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::api::{Collection, Listener, Snapshot, SnapshotFeed};
use crate::error::ApiError;
use crate::model::UserId;

/// One delivery from a listener, tagged with the session epoch it was opened under.
#[derive(Debug, Clone)]
pub struct SyncEvent {
    pub epoch: u64,
    pub collection: Collection,
    pub outcome: Result<Snapshot, ApiError>,
}

pub type EventSender = mpsc::UnboundedSender<SyncEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<SyncEvent>;

pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// The four listeners of one identity. Dropping the set aborts them all.
pub struct SubscriptionSet {
    user: UserId,
    epoch: u64,
    tasks: Vec<JoinHandle<()>>,
}

impl SubscriptionSet {
    /// Subscribes every collection. A collection that can't be subscribed
    /// reports its error as an event; the others still open.
    #[instrument(name = "subscribe_all", skip(feed, events))]
    pub fn open(feed: &dyn SnapshotFeed, user: &UserId, epoch: u64, events: &EventSender) -> Self {
        let mut tasks = Vec::with_capacity(4);

        for collection in Collection::iter() {
            match feed.subscribe(user, collection) {
                Ok(listener) => {
                    tasks.push(tokio::spawn(forward(
                        listener,
                        collection,
                        epoch,
                        events.clone(),
                    )));
                }
                Err(e) => {
                    warn!(%collection, error = %e, "subscribe failed");
                    let _ = events.send(SyncEvent {
                        epoch,
                        collection,
                        outcome: Err(e),
                    });
                }
            }
        }

        info!(listeners = tasks.len(), "subscriptions open");
        Self {
            user: user.clone(),
            epoch,
            tasks,
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl Drop for SubscriptionSet {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
        debug!(user_id = %self.user, epoch = self.epoch, "unsubscribed from all listeners");
    }
}

async fn forward(mut listener: Listener, collection: Collection, epoch: u64, events: EventSender) {
    while let Some(outcome) = listener.next().await {
        if events
            .send(SyncEvent {
                epoch,
                collection,
                outcome,
            })
            .is_err()
        {
            // portal is gone
            break;
        }
    }
    debug!(%collection, epoch, "listener finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::memory::MemoryStore;
    use std::time::Duration;

    #[tokio::test]
    async fn every_collection_delivers_its_current_state() {
        let store = MemoryStore::new("hrms");
        let user = UserId::new("u-1");
        let (tx, mut rx) = channel();

        let set = SubscriptionSet::open(&store, &user, 7, &tx);
        assert_eq!(set.len(), 4);

        let mut seen = Vec::new();
        for _ in 0..4 {
            let event = rx.recv().await.unwrap();
            assert_eq!(event.epoch, 7);
            assert!(event.outcome.is_ok());
            seen.push(event.collection);
        }
        seen.sort_by_key(|c| c.to_string());
        assert_eq!(seen.len(), 4);
    }

    #[tokio::test]
    async fn dropping_the_set_detaches_listeners() {
        let store = MemoryStore::new("hrms");
        let user = UserId::new("u-1");
        let (tx, mut rx) = channel();

        let set = SubscriptionSet::open(&store, &user, 1, &tx);
        for _ in 0..4 {
            rx.recv().await.unwrap();
        }
        assert_eq!(store.listener_count(&user, Collection::Leaves), 1);

        drop(set);

        // aborted tasks drop their listener on the next scheduler turn
        tokio::time::timeout(Duration::from_secs(2), async {
            while Collection::iter().any(|c| store.listener_count(&user, c) > 0) {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("listeners still attached");
    }
}
