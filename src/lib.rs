//! # rollcoord
//!
//! Conditional alias rollover over versioned cluster metadata:
//! - aliases designate exactly one write-target container per snapshot
//! - rollover swaps the write pointer to a freshly created container,
//!   gated by conditions (age, size, docs) evaluated against live stats
//! - a single commit coordinator serializes every metadata mutation
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │              RolloverService                 │
//! │  resolve → preview → stats → decide → commit │
//! └──────┬─────────────┬────────────────┬────────┘
//!        │ read        │ fetch          │ submit task
//! ┌──────▼───────┐ ┌───▼──────────┐ ┌───▼──────────────┐
//! │ ClusterState │ │ StatsService │ │ CommitCoordinator│
//! │ (versioned,  │ │ (async,      │ │ (single writer,  │
//! │  immutable)  │ │  read-only)  │ │  ordered tasks)  │
//! └──────────────┘ └──────────────┘ └──────────────────┘
//! ```
//!
//! Decisions are made on statistics fetched outside the coordinator's
//! serialization point; the commit task re-validates the source container
//! inside it, so concurrent rollovers on one alias resolve to exactly one
//! winner.

pub mod cluster;
pub mod common;
pub mod rollover;

// Re-export commonly used types
pub use cluster::{
    spawn_coordinator, ActiveShardCount, ClusterState, ContainerMetadata, CoordinatorHandle,
    CreationParams,
};
pub use common::{Error, Result, RolloverConfig};
pub use rollover::{
    Condition, InMemoryStats, RolloverRequest, RolloverResult, RolloverService, StatsSnapshot,
};

/// Current version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
