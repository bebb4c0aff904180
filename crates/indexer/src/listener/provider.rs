//! RPC provider wrapper for ledger communication.

use alloy::primitives::Address;
use alloy::providers::{Provider, ProviderBuilder, RootProvider};
use alloy::rpc::types::{Filter, Log};
use alloy::transports::http::{Client, Http};
use anyhow::{Context, Result};

/// HTTP RPC provider querying both contract event sources.
///
/// The base protocol contract and the board extension contract are fetched
/// over the identical block range with one filter, then merged into ledger
/// order so sibling events in the same block keep their causal order (a
/// signup is visible before a post that references it).
#[derive(Clone)]
pub struct RpcProvider {
    provider: RootProvider<Http<Client>>,
    protocol_address: Address,
    board_address: Address,
}

impl RpcProvider {
    /// Create a new RPC provider.
    pub async fn new(rpc_url: &str, protocol_address: Address, board_address: Address) -> Result<Self> {
        let url = rpc_url
            .parse()
            .with_context(|| format!("Invalid RPC URL: {}", rpc_url))?;

        let provider = ProviderBuilder::new().on_http(url);

        Ok(Self {
            provider,
            protocol_address,
            board_address,
        })
    }

    /// Get the latest block number.
    pub async fn get_block_number(&self) -> Result<u64> {
        self.provider
            .get_block_number()
            .await
            .context("Failed to get block number")
    }

    /// Fetch all logs from both contracts over a block range, ordered by
    /// `(block_number, log_index)`.
    ///
    /// No topic filter is applied: unknown topics are tolerated downstream
    /// so the ledger may emit event families newer than this mirror.
    pub async fn fetch_logs(&self, from_block: u64, to_block: u64) -> Result<Vec<Log>> {
        let filter = Filter::new()
            .address(vec![self.protocol_address, self.board_address])
            .from_block(from_block)
            .to_block(to_block);

        let mut logs: Vec<Log> = self
            .provider
            .get_logs(&filter)
            .await
            .context("Failed to fetch logs from RPC")?;

        // Providers return each address's logs in order, but the merged
        // sequence must interleave by ledger position.
        logs.sort_by_key(|log| {
            (
                log.block_number.unwrap_or(u64::MAX),
                log.log_index.unwrap_or(u64::MAX),
            )
        });

        Ok(logs)
    }
}
