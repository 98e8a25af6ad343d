//! Versioned cluster metadata snapshots
//!
//! The cluster metadata is a single, globally versioned document. Snapshots
//! are immutable: every "mutation" builds a complete replacement snapshot,
//! and only the commit coordinator may install one as current. Readers hold
//! `Arc<ClusterState>` and never observe partial updates.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// One alias attachment on a container.
///
/// The write flag lives here, on the container side of the relationship.
/// "Alias X designates container Y as write target" therefore means: Y has
/// an alias entry for X with the flag set. The invariant that exactly one
/// container carries the flag per alias is checked at resolution time, which
/// keeps the degenerate states (none, several) representable and reportable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasEntry {
    #[serde(default)]
    pub is_write_container: bool,
}

/// Metadata for a single container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerMetadata {
    pub name: String,
    pub created_at_ms: u64,
    pub shard_count: u32,
    pub replica_count: u32,
    /// Active shard copies (primaries + started replicas), updated by the
    /// replication layer through coordinator tasks.
    pub active_shards: u32,
    pub aliases: BTreeMap<String, AliasEntry>,
    /// Opaque settings carried from creation; validated, never interpreted.
    #[serde(default)]
    pub settings: serde_json::Map<String, serde_json::Value>,
}

impl ContainerMetadata {
    /// Total shard copies this container will have once fully replicated
    pub fn total_shard_copies(&self) -> u32 {
        self.shard_count * (self.replica_count + 1)
    }

    fn write_alias_entry(&self, alias: &str) -> bool {
        self.aliases
            .get(alias)
            .map(|e| e.is_write_container)
            .unwrap_or(false)
    }
}

/// Parameters for creating the rollover target container.
///
/// Opaque to the rollover protocol itself; `validate` is the seam where the
/// (external) creation subsystem rejects unusable parameters before the
/// snapshot swap is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreationParams {
    pub shard_count: u32,
    pub replica_count: u32,
    #[serde(default)]
    pub settings: serde_json::Map<String, serde_json::Value>,
}

impl Default for CreationParams {
    fn default() -> Self {
        Self {
            shard_count: 1,
            replica_count: 1,
            settings: serde_json::Map::new(),
        }
    }
}

impl CreationParams {
    pub fn validate(&self) -> crate::Result<()> {
        if self.shard_count == 0 {
            return Err(crate::Error::CreationValidation(
                "shard_count must be at least 1".into(),
            ));
        }
        for (key, value) in &self.settings {
            if value.is_null() {
                return Err(crate::Error::CreationValidation(format!(
                    "setting [{}] must not be null",
                    key
                )));
            }
        }
        Ok(())
    }
}

/// Minimum active shard copies to wait for after a rollover
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActiveShardCount {
    Count(u32),
    All,
}

impl Default for ActiveShardCount {
    fn default() -> Self {
        ActiveShardCount::Count(1)
    }
}

impl ActiveShardCount {
    /// Resolve to a concrete copy count for a container
    pub fn resolve(&self, container: &ContainerMetadata) -> u32 {
        match self {
            ActiveShardCount::Count(n) => *n,
            ActiveShardCount::All => container.total_shard_copies(),
        }
    }
}

impl FromStr for ActiveShardCount {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        if s.eq_ignore_ascii_case("all") {
            return Ok(ActiveShardCount::All);
        }
        s.parse::<u32>()
            .map(ActiveShardCount::Count)
            .map_err(|_| crate::Error::InvalidRequest(format!("invalid shard count: {}", s)))
    }
}

impl std::fmt::Display for ActiveShardCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActiveShardCount::Count(n) => write!(f, "{}", n),
            ActiveShardCount::All => write!(f, "all"),
        }
    }
}

/// The cluster metadata snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterState {
    pub version: u64,
    pub containers: BTreeMap<String, ContainerMetadata>,
}

impl ClusterState {
    pub fn empty() -> Self {
        Self {
            version: 0,
            containers: BTreeMap::new(),
        }
    }

    pub fn container(&self, name: &str) -> Option<&ContainerMetadata> {
        self.containers.get(name)
    }

    /// Resolve an alias to its single write-target container.
    ///
    /// Fails when the alias is unknown, carries no write flag, or carries
    /// the flag on more than one container.
    pub fn resolve_write_container(&self, alias: &str) -> crate::Result<&ContainerMetadata> {
        let mut attached = 0usize;
        let mut write_targets: Vec<&ContainerMetadata> = Vec::new();
        for container in self.containers.values() {
            if container.aliases.contains_key(alias) {
                attached += 1;
                if container.write_alias_entry(alias) {
                    write_targets.push(container);
                }
            }
        }

        if attached == 0 {
            return Err(crate::Error::AliasResolution {
                alias: alias.to_string(),
                reason: "alias does not exist".into(),
            });
        }
        match write_targets.as_slice() {
            &[single] => Ok(single),
            [] => Err(crate::Error::AliasResolution {
                alias: alias.to_string(),
                reason: "alias has no write container".into(),
            }),
            many => Err(crate::Error::AliasResolution {
                alias: alias.to_string(),
                reason: format!("alias has {} write containers", many.len()),
            }),
        }
    }

    /// Replacement snapshot with one container inserted or replaced.
    /// Version is untouched; the coordinator assigns versions on apply.
    pub fn with_container(&self, container: ContainerMetadata) -> Self {
        let mut next = self.clone();
        next.containers.insert(container.name.clone(), container);
        next
    }

    /// Replacement snapshot with a container's active shard count updated.
    /// Unknown container names leave the snapshot logically unchanged.
    pub fn with_active_shards(&self, name: &str, active: u32) -> Self {
        let mut next = self.clone();
        if let Some(container) = next.containers.get_mut(name) {
            container.active_shards = active;
        }
        next
    }
}
