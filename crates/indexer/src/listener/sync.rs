//! Sync engine for historical and live block processing.

use anyhow::{Context, Result};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, trace};

use super::events::LedgerEvent;
use super::RpcProvider;
use crate::config::SyncConfig;
use crate::dispatch::TopicRegistry;
use crate::error::SyncError;
use crate::projector::{Applied, Projector};
use crate::storage::Storage;

/// Counters for one processed batch.
#[derive(Debug, Default, Clone, Copy)]
pub struct BatchStats {
    /// Events with a known topic in the batch.
    pub events: usize,
    /// Events whose mutation was applied.
    pub projected: usize,
    /// Events skipped as expected-invalid.
    pub skipped: usize,
}

/// Sync engine: single-writer poll loop over the ledger.
///
/// Fetches a block range, processes its events strictly in order (each in
/// its own scoped transaction), then advances the watermark. Later events
/// may reference earlier ones within the same batch, so processing is never
/// parallelized.
pub struct SyncEngine {
    provider: RpcProvider,
    storage: Storage,
    registry: TopicRegistry,
    projector: Projector,
    config: SyncConfig,
}

impl SyncEngine {
    /// Create a new sync engine.
    pub fn new(
        provider: RpcProvider,
        storage: Storage,
        registry: TopicRegistry,
        projector: Projector,
        config: SyncConfig,
    ) -> Self {
        Self {
            provider,
            storage,
            registry,
            projector,
            config,
        }
    }

    /// Run the sync loop (historical catch-up + live polling).
    ///
    /// Runs until the shutdown signal flips; the signal is only observed
    /// between batches, so a stop never interrupts a transaction and the
    /// watermark always names the last fully committed block.
    ///
    /// Transport failures propagate to the host. Projection failures
    /// (local inconsistencies) are logged and retried from the same
    /// watermark on the next cycle.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        info!("Sync engine starting...");

        loop {
            if *shutdown.borrow() {
                info!("Shutdown requested, sync engine stopping between batches");
                return Ok(());
            }

            let sync_state = self.storage.get_sync_state().await?;
            let current_block = self.provider.get_block_number().await?;
            let safe_block = current_block.saturating_sub(self.config.confirmations);

            let last_synced = sync_state.last_block_number;
            let blocks_behind = safe_block.saturating_sub(last_synced);

            if blocks_behind == 0 {
                trace!(
                    "Caught up at block {}, waiting {}s for new blocks",
                    last_synced,
                    self.config.poll_interval_secs
                );
                self.idle(&mut shutdown).await;
                continue;
            }

            let batch_end = (last_synced + self.config.batch_size).min(safe_block);

            info!(
                "Syncing blocks {} to {} (head={}, safe={})",
                last_synced + 1,
                batch_end,
                current_block,
                safe_block
            );

            let logs = self
                .provider
                .fetch_logs(last_synced + 1, batch_end)
                .await
                .with_context(|| {
                    format!(
                        "Failed to fetch logs for blocks {} to {}",
                        last_synced + 1,
                        batch_end
                    )
                })?;

            match self.process_batch(&logs).await {
                Ok(stats) => {
                    // Advance only after every event in the range committed.
                    self.storage.advance_watermark(batch_end).await?;

                    info!(
                        "Batch complete: {} events, {} projected, {} skipped, watermark={}",
                        stats.events, stats.projected, stats.skipped, batch_end
                    );
                }
                Err(e) => {
                    error!(
                        "Batch {}..={} failed, retrying from watermark {} next cycle: {}",
                        last_synced + 1,
                        batch_end,
                        last_synced,
                        e
                    );
                    self.idle(&mut shutdown).await;
                    continue;
                }
            }

            // In live mode, rest between polls; in historical mode keep
            // batching until caught up.
            if blocks_behind <= self.config.batch_size {
                self.idle(&mut shutdown).await;
            }
        }
    }

    /// Process one fetched batch, each event in its own transaction.
    async fn process_batch(&self, logs: &[alloy::rpc::types::Log]) -> Result<BatchStats, SyncError> {
        let mut stats = BatchStats::default();

        for log in logs {
            let Some(topic0) = log.topic0() else {
                continue;
            };
            let Some(kind) = self.registry.classify(topic0) else {
                trace!(topic = %topic0, "ignoring unmapped topic");
                continue;
            };

            let event = LedgerEvent::decode(kind, log)?;
            stats.events += 1;

            trace!(
                family = event.family(),
                tx = %event.meta().tx_hash,
                block = event.meta().block_number,
                "processing event"
            );

            let mut tx = self.storage.begin().await?;
            let applied = self.projector.apply(&mut tx, &event).await?;
            // Skips are normal outcomes and commit their (no-op) transaction.
            tx.commit().await?;

            match applied {
                Applied::Projected => stats.projected += 1,
                Applied::Skipped(_) => stats.skipped += 1,
            }
        }

        Ok(stats)
    }

    /// Sleep one poll interval, waking early on shutdown.
    async fn idle(&self, shutdown: &mut watch::Receiver<bool>) {
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(self.config.poll_interval_secs)) => {}
            _ = shutdown.changed() => {}
        }
    }
}
