//! Shard readiness waiter
//!
//! After a committed rollover the new container's shards come up
//! asynchronously. The waiter observes snapshot installations until the
//! container reports enough active shard copies or the timeout fires.
//! Timing out here never unwinds the commit; it only downgrades the
//! `shards_acknowledged` flag in the result.

use crate::cluster::state::ClusterState;
use crate::cluster::CoordinatorHandle;
use crate::rollover::stats::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Asynchronous observer of a container's activation state
pub trait ShardObserver: Send + Sync {
    /// Wait until `container` has at least `min_active` active shard copies.
    /// Returns whether the threshold was reached before the timeout.
    fn wait_for_active<'a>(
        &'a self,
        container: &'a str,
        min_active: u32,
        timeout: Duration,
    ) -> BoxFuture<'a, bool>;
}

/// Observer backed by the coordinator's snapshot stream
pub struct ClusterShardObserver {
    state_rx: watch::Receiver<Arc<ClusterState>>,
}

impl ClusterShardObserver {
    pub fn new(coordinator: &CoordinatorHandle) -> Self {
        Self {
            state_rx: coordinator.subscribe(),
        }
    }
}

fn threshold_reached(state: &ClusterState, container: &str, min_active: u32) -> bool {
    state
        .container(container)
        .map(|c| c.active_shards >= min_active)
        .unwrap_or(false)
}

impl ShardObserver for ClusterShardObserver {
    fn wait_for_active<'a>(
        &'a self,
        container: &'a str,
        min_active: u32,
        timeout: Duration,
    ) -> BoxFuture<'a, bool> {
        let mut state_rx = self.state_rx.clone();
        Box::pin(async move {
            if min_active == 0 {
                return true;
            }
            let wait = async {
                loop {
                    if threshold_reached(&state_rx.borrow_and_update(), container, min_active) {
                        return true;
                    }
                    if state_rx.changed().await.is_err() {
                        // Coordinator gone; no further activations can arrive.
                        return false;
                    }
                }
            };
            match tokio::time::timeout(timeout, wait).await {
                Ok(reached) => reached,
                Err(_) => {
                    tracing::debug!(
                        container,
                        min_active,
                        "shard readiness wait timed out"
                    );
                    false
                }
            }
        })
    }
}
