//! Cluster metadata: versioned snapshots and the single-writer coordinator

pub mod coordinator;
pub mod state;

pub use coordinator::{spawn_coordinator, CommitOutcome, CommitTask, CoordinatorHandle};
pub use state::{
    ActiveShardCount, AliasEntry, ClusterState, ContainerMetadata, CreationParams,
};
