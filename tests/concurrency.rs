//! Same-alias race tests
//!
//! The decision step runs on statistics gathered outside the coordinator's
//! serialization point, so two requests can both decide to roll the same
//! alias against the same stale snapshot. The commit-time re-plan must then
//! let exactly one through.

use rollcoord::cluster::AliasEntry;
use rollcoord::common::timestamp_now_millis;
use rollcoord::rollover::{BoxFuture, ClusterShardObserver, StatsService};
use rollcoord::{
    spawn_coordinator, ActiveShardCount, ClusterState, ContainerMetadata, RolloverConfig,
    RolloverRequest, RolloverResult, RolloverService, StatsSnapshot,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Barrier;

/// Stats source that holds every fetch until all racing requests have
/// arrived, guaranteeing each previewed against the pre-commit snapshot.
struct GatedStats {
    snapshot: StatsSnapshot,
    barrier: Barrier,
}

impl GatedStats {
    fn new(parties: usize) -> Self {
        Self {
            snapshot: StatsSnapshot {
                doc_count: 10,
                size_bytes: 10,
                primary_shard_size_bytes: 10,
            },
            barrier: Barrier::new(parties),
        }
    }
}

impl StatsService for GatedStats {
    fn fetch<'a>(
        &'a self,
        _container: &'a str,
    ) -> BoxFuture<'a, rollcoord::Result<Option<StatsSnapshot>>> {
        Box::pin(async move {
            self.barrier.wait().await;
            Ok(Some(self.snapshot))
        })
    }
}

fn write_target(name: &str, alias: &str) -> ContainerMetadata {
    ContainerMetadata {
        name: name.to_string(),
        created_at_ms: timestamp_now_millis(),
        shard_count: 1,
        replica_count: 0,
        active_shards: 1,
        aliases: BTreeMap::from([(
            alias.to_string(),
            AliasEntry {
                is_write_container: true,
            },
        )]),
        settings: serde_json::Map::new(),
    }
}

fn unconditional(alias: &str) -> RolloverRequest {
    let mut request = RolloverRequest::new(alias);
    // Skip the shard wait; these tests have no replication layer
    request.min_active_shards = ActiveShardCount::Count(0);
    request
}

fn service_with(
    coordinator: &rollcoord::CoordinatorHandle,
    stats: Arc<dyn StatsService>,
) -> Arc<RolloverService> {
    Arc::new(RolloverService::new(
        coordinator.clone(),
        stats,
        Arc::new(ClusterShardObserver::new(coordinator)),
        RolloverConfig::default(),
    ))
}

fn split_outcomes(
    outcomes: Vec<rollcoord::Result<RolloverResult>>,
) -> (Vec<RolloverResult>, Vec<rollcoord::Error>) {
    let mut successes = Vec::new();
    let mut failures = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(result) => successes.push(result),
            Err(e) => failures.push(e),
        }
    }
    (successes, failures)
}

#[tokio::test]
async fn test_same_alias_race_has_exactly_one_winner() {
    let coordinator =
        spawn_coordinator(ClusterState::empty().with_container(write_target("logs-000003", "logs")));
    let service = service_with(&coordinator, Arc::new(GatedStats::new(2)));

    let a = tokio::spawn({
        let service = service.clone();
        async move { service.rollover(unconditional("logs")).await }
    });
    let b = tokio::spawn({
        let service = service.clone();
        async move { service.rollover(unconditional("logs")).await }
    });

    let outcomes = vec![a.await.unwrap(), b.await.unwrap()];
    let (successes, failures) = split_outcomes(outcomes);

    assert_eq!(successes.len(), 1);
    assert!(successes[0].rolled_over);
    assert_eq!(successes[0].source_container, "logs-000003");
    assert_eq!(successes[0].target_container, "logs-000004");

    assert_eq!(failures.len(), 1);
    assert!(matches!(
        failures[0],
        rollcoord::Error::ConcurrentModification(_)
    ));

    // Exactly one metadata generation was consumed
    let state = coordinator.current();
    assert_eq!(state.version, 1);
    assert_eq!(state.resolve_write_container("logs").unwrap().name, "logs-000004");
    assert!(state.container("logs-000005").is_none());
}

#[tokio::test]
async fn test_three_way_race_still_one_winner() {
    let coordinator =
        spawn_coordinator(ClusterState::empty().with_container(write_target("logs-000001", "logs")));
    let service = service_with(&coordinator, Arc::new(GatedStats::new(3)));

    let mut joins = Vec::new();
    for _ in 0..3 {
        let service = service.clone();
        joins.push(tokio::spawn(async move {
            service.rollover(unconditional("logs")).await
        }));
    }
    let mut outcomes = Vec::new();
    for join in joins {
        outcomes.push(join.await.unwrap());
    }
    let (successes, failures) = split_outcomes(outcomes);

    assert_eq!(successes.len(), 1);
    assert_eq!(failures.len(), 2);
    assert!(failures
        .iter()
        .all(|e| matches!(e, rollcoord::Error::ConcurrentModification(_))));
    assert_eq!(coordinator.current().version, 1);
}

#[tokio::test]
async fn test_different_aliases_do_not_contend() {
    let coordinator = spawn_coordinator(
        ClusterState::empty()
            .with_container(write_target("logs-000001", "logs"))
            .with_container(write_target("metrics-000001", "metrics")),
    );
    let service = service_with(&coordinator, Arc::new(GatedStats::new(2)));

    let a = tokio::spawn({
        let service = service.clone();
        async move { service.rollover(unconditional("logs")).await }
    });
    let b = tokio::spawn({
        let service = service.clone();
        async move { service.rollover(unconditional("metrics")).await }
    });

    let logs = a.await.unwrap().unwrap();
    let metrics = b.await.unwrap().unwrap();

    assert!(logs.rolled_over);
    assert!(metrics.rolled_over);
    assert_eq!(logs.target_container, "logs-000002");
    assert_eq!(metrics.target_container, "metrics-000002");
    assert_eq!(coordinator.current().version, 2);
}

// The loser's failure must not depend on which commit task runs first:
// even if the loser's task is applied first, it wins and the other fails.
// Either way the invariant is one success per generation.
#[tokio::test]
async fn test_race_repeated_runs_never_double_commit() {
    for round in 0..10 {
        let source = format!("logs-{:06}", round + 1);
        let coordinator =
            spawn_coordinator(ClusterState::empty().with_container(write_target(&source, "logs")));
        let service = service_with(&coordinator, Arc::new(GatedStats::new(2)));

        let a = tokio::spawn({
            let service = service.clone();
            async move { service.rollover(unconditional("logs")).await }
        });
        let b = tokio::spawn({
            let service = service.clone();
            async move { service.rollover(unconditional("logs")).await }
        });
        let (successes, failures) = split_outcomes(vec![a.await.unwrap(), b.await.unwrap()]);

        assert_eq!(successes.len(), 1, "round {}", round);
        assert_eq!(failures.len(), 1, "round {}", round);
        assert_eq!(coordinator.current().version, 1, "round {}", round);
    }
}
