use strum::IntoEnumIterator;
use tracing::{debug, error, instrument};

use crate::api::{Collection, Snapshot, SnapshotSource};
use crate::error::ApiError;
use crate::model::Identity;

/// Result of one pull round, one entry per collection in fetch order.
#[derive(Debug, Default)]
pub struct PullReport {
    pub outcomes: Vec<(Collection, Result<Snapshot, ApiError>)>,
}

impl PullReport {
    pub fn failed(&self) -> impl Iterator<Item = Collection> + '_ {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| outcome.is_err())
            .map(|(collection, _)| *collection)
    }
}

/// Four sequential fetches. A failure is logged and the next fetch still runs.
#[instrument(name = "pull_all", skip(source, identity), fields(user_id = %identity.user_id))]
pub async fn pull_all(source: &dyn SnapshotSource, identity: &Identity) -> PullReport {
    let mut report = PullReport::default();
    for collection in Collection::iter() {
        let outcome = pull_one(source, identity, collection).await;
        report.outcomes.push((collection, outcome));
    }
    report
}

pub async fn pull_one(
    source: &dyn SnapshotSource,
    identity: &Identity,
    collection: Collection,
) -> Result<Snapshot, ApiError> {
    match source.fetch(identity, collection).await {
        Ok(snapshot) => {
            debug!(%collection, "fetched");
            Ok(snapshot)
        }
        Err(e) => {
            error!(%collection, error = %e, "failed to fetch");
            Err(e)
        }
    }
}
