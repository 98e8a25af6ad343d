//! The conditional rollover protocol
//!
//! Swaps an alias's write target from an aging container to a fresh one,
//! gated by conditions evaluated against live statistics:
//!
//! ```text
//! resolve → preview → fetch stats → decide ─┬→ commit → await shards
//!                                           └→ (dry run / not met: report)
//! ```

pub mod condition;
pub mod planner;
pub mod service;
pub mod shards;
pub mod stats;

pub use condition::{evaluate, Condition, ConditionResults, StatsSnapshot};
pub use planner::{next_container_name, plan, PlannedRollover};
pub use service::{RolloverRequest, RolloverResult, RolloverService};
pub use shards::{ClusterShardObserver, ShardObserver};
pub use stats::{BoxFuture, InMemoryStats, StatsService};
