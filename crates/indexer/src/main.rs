//! Murmur Indexer - ledger event ingestion for the Murmur board
//!
//! This binary provides:
//! - Event listening from Ethereum (AnonProtocol + MurmurBoard)
//! - Proof-gated, idempotent projection into the SQLite mirror
//! - Watermark-driven replay safety across restarts

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "murmur-indexer")]
#[command(version, about = "Murmur ledger synchronizer", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "indexer.toml")]
    config: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the synchronizer service
    Run,

    /// Show sync progress and mirror statistics
    Status,

    /// Initialize the database
    InitDb {
        /// Database URL
        #[arg(long, default_value = "sqlite://murmur.db")]
        database_url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.debug)?;

    info!("Murmur Indexer starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_indexer(&cli.config).await?,
        Commands::Status => show_status(&cli.config).await?,
        Commands::InitDb { database_url } => init_database(&database_url).await?,
    }

    Ok(())
}

/// Initialize tracing subscriber for logging
fn init_logging(debug: bool) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let env_filter = if debug {
        EnvFilter::new("murmur_indexer=debug,sqlx=debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("murmur_indexer=info"))
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_line_number(true))
        .init();

    Ok(())
}

/// Main service - runs the sync loop until ctrl-c.
async fn run_indexer(config_path: &str) -> Result<()> {
    use murmur_indexer::config::Config;
    use murmur_indexer::dispatch::TopicRegistry;
    use murmur_indexer::listener::{RpcProvider, SyncEngine};
    use murmur_indexer::projector::Projector;
    use murmur_indexer::storage::Storage;
    use murmur_indexer::verifier::HttpProofVerifier;

    info!("Starting synchronizer with config: {}", config_path);

    let config = Config::from_file(config_path).context("Failed to load configuration")?;

    info!("Configuration loaded successfully");
    info!("  Chain ID: {}", config.network.chain_id);
    info!("  RPC URL: {}", config.network.rpc_url);
    info!("  Database: {}", config.database.url);
    info!("  Start block: {}", config.sync.start_block);
    info!("  Verifier: {}", config.verifier.endpoint);

    let storage = Storage::new(
        &config.database.url,
        Some(config.database.max_connections),
        Some(config.database.min_connections),
    )
    .await
    .context("Failed to connect to database")?;

    storage
        .run_migrations()
        .await
        .context("Failed to run migrations")?;

    info!("Database initialized");

    let sync_state = storage.get_sync_state().await?;
    if sync_state.last_block_number == 0 && sync_state.chain_id == 0 {
        // Set the watermark to (start_block - 1) so the first cycle
        // processes start_block: the engine fetches from (watermark + 1).
        let initial_block = config.sync.start_block.saturating_sub(1);
        info!(
            "Fresh database detected, initializing sync state with chain_id={} initial_block={}",
            config.network.chain_id, initial_block
        );
        storage
            .initialize_sync_state(config.network.chain_id, initial_block)
            .await
            .context("Failed to initialize sync state")?;
    } else {
        info!(
            "Existing sync state found: chain_id={} last_block={}",
            sync_state.chain_id, sync_state.last_block_number
        );
        if sync_state.chain_id != config.network.chain_id {
            anyhow::bail!(
                "Database belongs to chain {} but config names chain {}",
                sync_state.chain_id,
                config.network.chain_id
            );
        }
    }

    let provider = RpcProvider::new(
        &config.network.rpc_url,
        config.contracts.protocol,
        config.contracts.board,
    )
    .await
    .context("Failed to create RPC provider")?;

    let verifier = HttpProofVerifier::new(
        &config.verifier.endpoint,
        Some(config.verifier.timeout_secs),
    )
    .context("Failed to create proof verifier client")?;

    let engine = SyncEngine::new(
        provider,
        storage.clone(),
        TopicRegistry::merged(),
        Projector::new(Arc::new(verifier)),
        config.sync.clone(),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut sync_handle = tokio::spawn(async move { engine.run(shutdown_rx).await });

    info!("Synchronizer is running. Press Ctrl+C to stop.");

    tokio::select! {
        result = &mut sync_handle => {
            storage.close().await;
            match result {
                Ok(Ok(())) => {
                    warn!("Sync engine exited unexpectedly");
                    Ok(())
                }
                Ok(Err(e)) => Err(e).context("Sync engine failed"),
                Err(e) => Err(anyhow::anyhow!("Sync task panicked: {}", e)),
            }
        }
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for Ctrl+C")?;
            info!("Received shutdown signal, stopping between batches...");
            let _ = shutdown_tx.send(true);

            // The engine only observes the signal between batches, so no
            // transaction is ever interrupted.
            match sync_handle.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("Sync engine exited with error during shutdown: {}", e),
                Err(e) => warn!("Sync task panicked during shutdown: {}", e),
            }

            storage.close().await;
            Ok(())
        }
    }
}

/// Show sync progress and mirror statistics.
async fn show_status(config_path: &str) -> Result<()> {
    use murmur_indexer::config::Config;
    use murmur_indexer::storage::Storage;

    // Fall back to the default database only when the config file is absent.
    let (database_url, max_conn, min_conn) = match Config::from_file(config_path) {
        Ok(config) => (
            config.database.url,
            Some(config.database.max_connections),
            Some(config.database.min_connections),
        ),
        Err(e) => {
            let is_not_found = e.chain().any(|cause| {
                cause
                    .downcast_ref::<std::io::Error>()
                    .map(|io_err| io_err.kind() == std::io::ErrorKind::NotFound)
                    .unwrap_or(false)
            });

            if is_not_found {
                info!("Config file not found, using default database: sqlite://murmur.db");
                ("sqlite://murmur.db".to_string(), None, None)
            } else {
                return Err(e).context("Failed to load config file");
            }
        }
    };

    let storage = Storage::new(&database_url, max_conn, min_conn)
        .await
        .context("Failed to connect to database")?;

    storage
        .run_migrations()
        .await
        .context("Failed to run migrations")?;

    let sync_state = storage.get_sync_state().await?;
    let stats = storage.stats().await?;

    println!("\n=== Murmur Indexer Status ===\n");
    println!("Sync Progress:");
    println!("  Chain ID: {}", sync_state.chain_id);
    println!("  Last Block: {}", sync_state.last_block_number);
    println!(
        "  Last Updated: {}",
        chrono::DateTime::from_timestamp(sync_state.updated_at, 0)
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_else(|| "unknown".to_string())
    );

    println!("\nMirror Statistics:");
    println!("  Content items: {}", stats.content_count);
    println!("  Votes: {}", stats.vote_count);
    println!("  Ledger records: {}", stats.record_count);
    println!("  Recorded proofs: {}", stats.proof_count);
    println!(
        "  Confirmed nullifiers: {}",
        stats.confirmed_nullifier_count
    );
    println!();

    storage.close().await;

    Ok(())
}

/// Initialize the database.
async fn init_database(database_url: &str) -> Result<()> {
    use murmur_indexer::storage::Storage;

    info!("Initializing database: {}", database_url);

    let storage = Storage::new(database_url, None, None)
        .await
        .context("Failed to connect to database")?;

    storage
        .run_migrations()
        .await
        .context("Failed to run migrations")?;

    storage
        .health_check()
        .await
        .context("Database health check failed")?;

    let stats = storage.stats().await?;
    info!("Database initialized successfully!");
    info!("  Content items: {}", stats.content_count);
    info!("  Last block: {}", stats.last_block_number);

    storage.close().await;

    Ok(())
}
