//! Demo CLI: run a rollover against an in-memory cluster
//!
//! Seeds one container behind an alias, attaches stats, and runs the
//! rollover protocol end to end, printing the JSON result. Useful for
//! poking at conditions and dry runs without a cluster.

use clap::{Parser, Subcommand};
use rollcoord::common::parse_duration;
use rollcoord::rollover::Condition;
use rollcoord::{
    spawn_coordinator, ActiveShardCount, ClusterState, ContainerMetadata, CreationParams,
    InMemoryStats, RolloverConfig, RolloverRequest, RolloverService, StatsSnapshot,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "rollcoord")]
#[command(about = "conditional alias rollover demo")]
#[command(version)]
struct Cli {
    /// Config file (JSON)
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Roll an alias over in a seeded in-memory cluster
    Rollover {
        /// Alias to roll over
        #[arg(long, default_value = "logs")]
        alias: String,

        /// Seeded source container name
        #[arg(long, default_value = "logs-000001")]
        source: String,

        /// Source age (e.g. "10d")
        #[arg(long, default_value = "10d")]
        age: String,

        /// Seeded document count
        #[arg(long, default_value = "50000")]
        docs: u64,

        /// Seeded size in bytes
        #[arg(long, default_value = "2000000000")]
        size: u64,

        /// Conditions (e.g. "max_age:7d", "max_docs:100000")
        #[arg(long = "condition", value_delimiter = ',')]
        conditions: Vec<String>,

        /// Explicit target container name
        #[arg(long)]
        target: Option<String>,

        /// Evaluate conditions without committing
        #[arg(long)]
        dry_run: bool,

        /// Minimum active shard copies to wait for ("all" or a number)
        #[arg(long, default_value = "1")]
        wait_for_shards: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => RolloverConfig::load(path)?,
        None => RolloverConfig::default(),
    };

    match cli.command {
        Commands::Rollover {
            alias,
            source,
            age,
            docs,
            size,
            conditions,
            target,
            dry_run,
            wait_for_shards,
        } => {
            let age = parse_duration(&age)?;
            let created_at_ms =
                rollcoord::common::timestamp_now_millis().saturating_sub(age.as_millis() as u64);
            let created_at = chrono::DateTime::from_timestamp_millis(created_at_ms as i64)
                .unwrap_or_default();
            tracing::info!(%source, created_at = %created_at.to_rfc3339(), "seeding cluster");

            let state = ClusterState::empty().with_container(ContainerMetadata {
                name: source.clone(),
                created_at_ms,
                shard_count: 1,
                replica_count: 0,
                active_shards: 1,
                aliases: BTreeMap::from([(
                    alias.clone(),
                    rollcoord::cluster::AliasEntry {
                        is_write_container: true,
                    },
                )]),
                settings: serde_json::Map::new(),
            });

            let coordinator = spawn_coordinator(state);
            let stats = Arc::new(InMemoryStats::new());
            stats.set(
                source.clone(),
                StatsSnapshot {
                    doc_count: docs,
                    size_bytes: size,
                    primary_shard_size_bytes: size,
                },
            );
            let service =
                RolloverService::with_cluster_observer(coordinator.clone(), stats, config);

            // The demo has no replication layer, so activate the new
            // container's shard as soon as it appears.
            let activator = coordinator.clone();
            tokio::spawn(async move {
                let mut rx = activator.subscribe();
                while rx.changed().await.is_ok() {
                    let pending: Vec<(String, u32)> = rx
                        .borrow_and_update()
                        .containers
                        .values()
                        .filter(|c| c.active_shards < c.total_shard_copies())
                        .map(|c| (c.name.clone(), c.total_shard_copies()))
                        .collect();
                    for (name, copies) in pending {
                        let _ = activator
                            .submit(
                                format!("activate [{}]", name),
                                Box::new(move |state| Ok(state.with_active_shards(&name, copies))),
                            )
                            .await;
                    }
                }
            });

            let request = RolloverRequest {
                alias,
                new_container_name: target,
                creation_params: CreationParams::default(),
                conditions: conditions
                    .iter()
                    .map(|s| s.parse::<Condition>())
                    .collect::<rollcoord::Result<Vec<_>>>()?,
                dry_run,
                min_active_shards: wait_for_shards.parse::<ActiveShardCount>()?,
                commit_timeout: None,
                ack_timeout: None,
            };

            let result = service.rollover(request).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}
