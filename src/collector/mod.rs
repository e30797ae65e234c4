use jiff::Timestamp;
use tracing::{debug, error, info, info_span, Instrument};

use crate::{
    endpoint::{Endpoint, Target},
    parser,
    store::{
        entry::{Batch, Origin},
        error::StoreError,
        Store,
    },
};

pub mod scheduler;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// `stacks` is the payload's line count past the header
    Merged { stacks: usize },
    FetchFailed,
    SaveFailed,
}

/// Runs collection cycles: fetch one target, parse, merge into the store
pub struct Collector<E> {
    endpoint: E,
    store: Store,
}

impl<E: Endpoint> Collector<E> {
    pub fn new(endpoint: E, store: Store) -> Self {
        Self { endpoint, store }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub async fn collect(&self, target: &Target) -> Result<CycleOutcome, StoreError> {
        self.collect_with(target, || Timestamp::now().as_second())
            .await
    }

    /// One cycle for one target. Fetch and merge failures are logged and
    /// reported in the outcome; only a fatal store open error comes back
    /// as `Err`. `now` is called once, after the fetch, and stamps every
    /// observation of the batch.
    pub async fn collect_with(
        &self,
        target: &Target,
        now: impl FnOnce() -> i64,
    ) -> Result<CycleOutcome, StoreError> {
        let span = info_span!("collect", host = %target.host, port = target.port);
        async {
            let payload = match self.endpoint.fetch(target).await {
                Ok(payload) => payload,
                Err(e) => {
                    error!("error collecting data: {e}");
                    return Ok(CycleOutcome::FetchFailed);
                }
            };

            let origin = Origin {
                host: target.host.clone(),
                port: target.port,
                timestamp: now(),
            };
            let mut samples = parser::parse(&payload);
            let batch = Batch::new(origin, samples.by_ref());
            if samples.dropped() > 0 {
                debug!(dropped = samples.dropped(), "skipped malformed lines");
            }
            if batch.is_empty() {
                debug!("payload carried no samples");
            }

            match self.save(batch).await {
                Ok(()) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    error!("error saving data: {e}");
                    return Ok(CycleOutcome::SaveFailed);
                }
            }

            let num_stacks = parser::stack_count(&payload);
            info!(num_stacks, "data collected");
            Ok(CycleOutcome::Merged { stacks: num_stacks })
        }
        .instrument(span)
        .await
    }

    async fn save(&self, batch: Batch) -> Result<(), StoreError> {
        let handle = self.store.open().await?;
        let written = handle.merge_batch(batch).await?;
        let stored = handle.num_stacks().await?;
        handle.close().await?;
        debug!(written, stored, "batch merged");
        Ok(())
    }
}
