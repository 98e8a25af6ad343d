//! Rollover orchestration
//!
//! Drives one rollover request through its states: resolve, preview, stats
//! fetch, decision, commit, shard wait. The decision is made on statistics
//! gathered outside the coordinator's serialization point; the commit task
//! then re-plans against the then-current snapshot and verifies that the
//! source container is still the one the decision was based on. Two requests
//! racing on the same alias therefore never both commit: the loser observes
//! a changed source inside the coordinator and fails without mutating.

use crate::cluster::state::{ActiveShardCount, CreationParams};
use crate::cluster::CoordinatorHandle;
use crate::common::utils::timestamp_now_millis;
use crate::common::{Result, RolloverConfig};
use crate::rollover::condition::{evaluate, Condition, ConditionResults};
use crate::rollover::planner::plan;
use crate::rollover::shards::{ClusterShardObserver, ShardObserver};
use crate::rollover::stats::StatsService;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// One rollover request; created and discarded within a single call
#[derive(Debug, Clone)]
pub struct RolloverRequest {
    pub alias: String,
    pub new_container_name: Option<String>,
    pub creation_params: CreationParams,
    pub conditions: Vec<Condition>,
    pub dry_run: bool,
    pub min_active_shards: ActiveShardCount,
    /// Overrides the configured default when set
    pub commit_timeout: Option<Duration>,
    /// Overrides the configured default when set
    pub ack_timeout: Option<Duration>,
}

impl RolloverRequest {
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            new_container_name: None,
            conditions: Vec::new(),
            creation_params: CreationParams::default(),
            dry_run: false,
            min_active_shards: ActiveShardCount::default(),
            commit_timeout: None,
            ack_timeout: None,
        }
    }

    pub fn condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Validate request construction.
    ///
    /// Canonical condition strings key the result map, so duplicates are a
    /// construction error here rather than a silent overwrite later.
    pub fn validate(&self) -> Result<()> {
        if self.alias.trim().is_empty() {
            return Err(crate::Error::InvalidRequest("alias must not be empty".into()));
        }
        let mut seen = HashSet::new();
        for condition in &self.conditions {
            let key = condition.to_string();
            if !seen.insert(key.clone()) {
                return Err(crate::Error::InvalidRequest(format!(
                    "duplicate condition [{}]",
                    key
                )));
            }
        }
        Ok(())
    }
}

/// Final state of one rollover run
#[derive(Debug, Clone, Serialize)]
pub struct RolloverResult {
    pub source_container: String,
    pub target_container: String,
    pub condition_results: ConditionResults,
    pub dry_run: bool,
    pub rolled_over: bool,
    pub acknowledged: bool,
    pub shards_acknowledged: bool,
}

impl RolloverResult {
    fn not_rolled_over(
        source: String,
        target: String,
        condition_results: ConditionResults,
        dry_run: bool,
    ) -> Self {
        Self {
            source_container: source,
            target_container: target,
            condition_results,
            dry_run,
            rolled_over: false,
            acknowledged: false,
            shards_acknowledged: false,
        }
    }
}

/// The rollover orchestrator
pub struct RolloverService {
    coordinator: CoordinatorHandle,
    stats: Arc<dyn StatsService>,
    shards: Arc<dyn ShardObserver>,
    config: RolloverConfig,
}

impl RolloverService {
    pub fn new(
        coordinator: CoordinatorHandle,
        stats: Arc<dyn StatsService>,
        shards: Arc<dyn ShardObserver>,
        config: RolloverConfig,
    ) -> Self {
        Self {
            coordinator,
            stats,
            shards,
            config,
        }
    }

    /// Service watching shard activation through the coordinator's own
    /// snapshot stream
    pub fn with_cluster_observer(
        coordinator: CoordinatorHandle,
        stats: Arc<dyn StatsService>,
        config: RolloverConfig,
    ) -> Self {
        let shards = Arc::new(ClusterShardObserver::new(&coordinator));
        Self::new(coordinator, stats, shards, config)
    }

    /// Run one rollover request to completion.
    ///
    /// The only externally visible mutation happens exactly once, atomically,
    /// inside the commit task; every error path leaves the cluster metadata
    /// exactly as it was.
    pub async fn rollover(&self, request: RolloverRequest) -> Result<RolloverResult> {
        // S0: validate
        request.validate()?;
        let commit_deadline =
            Instant::now() + request.commit_timeout.unwrap_or_else(|| self.config.commit_timeout());

        // S1: preview against the latest locally observed snapshot; no I/O,
        // runs for dry runs too so the response can always name both sides.
        let observed = self.coordinator.current();
        let preview = plan(
            &observed,
            &request.alias,
            request.new_container_name.as_deref(),
            &request.creation_params,
            self.config.counter_width,
            false,
            timestamp_now_millis(),
        )?;
        let source = preview.source_container.clone();
        let target = preview.target_container.clone();
        tracing::debug!(alias = %request.alias, %source, %target, "planned rollover");

        // S2: fetch live stats; nothing has mutated yet, so failures here
        // leave the whole request safely retryable.
        let stats = self
            .bounded(commit_deadline, self.stats.fetch(&source))
            .await?
            .map_err(|e| crate::Error::StatsFetch(source.clone(), e.to_string()))?;

        // S3: decide
        let created_at_ms = observed
            .container(&source)
            .map(|c| c.created_at_ms)
            .unwrap_or_default();
        let condition_results = evaluate(
            &request.conditions,
            stats.as_ref(),
            created_at_ms,
            timestamp_now_millis(),
        );

        if request.dry_run {
            return Ok(RolloverResult::not_rolled_over(
                source,
                target,
                condition_results,
                true,
            ));
        }

        let any_met = condition_results.iter().any(|(_, matched)| *matched);
        if !(request.conditions.is_empty() || any_met) {
            tracing::debug!(alias = %request.alias, "no rollover condition met");
            return Ok(RolloverResult::not_rolled_over(
                source,
                target,
                condition_results,
                false,
            ));
        }

        // S4: commit. The task re-plans against the then-current snapshot and
        // aborts if the source container changed since the preview.
        let alias = request.alias.clone();
        let explicit_name = request.new_container_name.clone();
        let params = request.creation_params.clone();
        let counter_width = self.config.counter_width;
        let expected_source = source.clone();
        let outcome = self
            .bounded(
                commit_deadline,
                self.coordinator.submit(
                    format!("rollover alias [{}] from [{}] to [{}]", alias, source, target),
                    Box::new(move |current| {
                        let replanned = plan(
                            current,
                            &alias,
                            explicit_name.as_deref(),
                            &params,
                            counter_width,
                            true,
                            timestamp_now_millis(),
                        )?;
                        if replanned.source_container != expected_source {
                            return Err(crate::Error::ConcurrentModification(alias.clone()));
                        }
                        replanned
                            .new_state
                            .ok_or_else(|| crate::Error::Internal("commit plan had no state".into()))
                    }),
                ),
            )
            .await??;

        // S5: wait for the new container's shards, bounded by the ack
        // timeout. An expired wait downgrades shards_acknowledged only; the
        // mutation already stands.
        let shards_acknowledged = if outcome.changed {
            let min_active = outcome
                .state
                .container(&target)
                .map(|c| request.min_active_shards.resolve(c))
                .unwrap_or_default();
            let ack_timeout = request.ack_timeout.unwrap_or_else(|| self.config.ack_timeout());
            self.shards
                .wait_for_active(&target, min_active, ack_timeout)
                .await
        } else {
            false
        };

        tracing::info!(
            alias = %request.alias,
            %source,
            %target,
            shards_acknowledged,
            "rollover committed"
        );

        Ok(RolloverResult {
            source_container: source,
            target_container: target,
            condition_results,
            dry_run: false,
            rolled_over: outcome.changed,
            acknowledged: outcome.changed,
            shards_acknowledged,
        })
    }

    /// Bound a suspension point by the commit deadline
    async fn bounded<T>(
        &self,
        deadline: Instant,
        fut: impl std::future::Future<Output = T>,
    ) -> Result<T> {
        tokio::time::timeout_at(deadline, fut)
            .await
            .map_err(|_| crate::Error::Timeout("commit deadline exceeded".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_empty_alias() {
        let request = RolloverRequest::new("  ");
        assert!(matches!(
            request.validate().unwrap_err(),
            crate::Error::InvalidRequest(_)
        ));
    }

    #[test]
    fn test_validate_rejects_duplicate_conditions() {
        let request = RolloverRequest::new("logs")
            .condition(Condition::MaxDocs(100))
            .condition(Condition::MaxDocs(100));
        let err = request.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate condition [max_docs:100]"));
    }

    #[test]
    fn test_validate_accepts_same_kind_different_value() {
        let request = RolloverRequest::new("logs")
            .condition(Condition::MaxDocs(100))
            .condition(Condition::MaxDocs(200));
        request.validate().unwrap();
    }
}
