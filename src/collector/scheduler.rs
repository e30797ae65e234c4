use std::time::Duration;

use tracing::{debug, info};

use crate::{
    endpoint::{Endpoint, Target},
    store::error::StoreError,
};

use super::{Collector, CycleOutcome};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepSummary {
    pub merged: usize,
    pub fetch_failed: usize,
    pub save_failed: usize,
}

/// Polls every target in order, then sleeps for the interval
pub struct Scheduler<E> {
    collector: Collector<E>,
    targets: Vec<Target>,
    interval: Duration,
}

impl<E: Endpoint> Scheduler<E> {
    pub fn new(collector: Collector<E>, targets: Vec<Target>, interval: Duration) -> Self {
        Self {
            collector,
            targets,
            interval,
        }
    }

    /// One cycle per target, to completion, in configured order
    pub async fn sweep(&self) -> Result<SweepSummary, StoreError> {
        let mut summary = SweepSummary::default();
        for target in &self.targets {
            match self.collector.collect(target).await? {
                CycleOutcome::Merged { .. } => summary.merged += 1,
                CycleOutcome::FetchFailed => summary.fetch_failed += 1,
                CycleOutcome::SaveFailed => summary.save_failed += 1,
            }
        }
        Ok(summary)
    }

    /// Sweeps forever. Only returns on a fatal store error.
    pub async fn run(&self) -> Result<(), StoreError> {
        info!(
            targets = self.targets.len(),
            interval = ?self.interval,
            store = %self.collector.store().path().display(),
            "collecting"
        );

        loop {
            let summary = self.sweep().await?;
            debug!(
                merged = summary.merged,
                fetch_failed = summary.fetch_failed,
                save_failed = summary.save_failed,
                "sweep done"
            );
            tokio::time::sleep(self.interval).await;
        }
    }
}

/// Host-major: every port of the first host, then the next host
pub fn targets(hosts: &[String], ports: &[u16]) -> Vec<Target> {
    hosts
        .iter()
        .flat_map(|host| ports.iter().map(move |port| Target::new(host.clone(), *port)))
        .collect()
}
