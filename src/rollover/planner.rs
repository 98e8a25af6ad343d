//! Rollover planning over a metadata snapshot
//!
//! `plan` is pure: it reads one snapshot and computes the source name, the
//! target name, and (in commit mode) the replacement snapshot with the write
//! pointer swapped. The same function serves the preview step and the
//! commit-time re-plan, which is what makes the two-phase source comparison
//! meaningful: identical logical inputs always produce identical names.

use crate::cluster::state::{AliasEntry, ClusterState, ContainerMetadata, CreationParams};
use crate::common::Result;

/// Outcome of planning a rollover against one snapshot
#[derive(Debug, Clone)]
pub struct PlannedRollover {
    pub source_container: String,
    pub target_container: String,
    /// Replacement snapshot; `None` in preview mode.
    pub new_state: Option<ClusterState>,
}

/// Plan a rollover of `alias` against `state`.
///
/// Preview mode (`commit == false`) resolves names only and never touches
/// the snapshot or validates creation parameters. Commit mode additionally
/// validates `params`, creates the target container (created at `now_ms`),
/// moves the alias write flag from source to target, and returns the
/// replacement snapshot.
pub fn plan(
    state: &ClusterState,
    alias: &str,
    explicit_name: Option<&str>,
    params: &CreationParams,
    counter_width: usize,
    commit: bool,
    now_ms: u64,
) -> Result<PlannedRollover> {
    let source = state.resolve_write_container(alias)?;
    let source_name = source.name.clone();
    let target_name = match explicit_name {
        Some(name) => name.to_string(),
        None => next_container_name(&source_name, counter_width),
    };

    if !commit {
        return Ok(PlannedRollover {
            source_container: source_name,
            target_container: target_name,
            new_state: None,
        });
    }

    params.validate()?;
    if state.container(&target_name).is_some() {
        return Err(crate::Error::CreationValidation(format!(
            "target container [{}] already exists",
            target_name
        )));
    }

    let target = ContainerMetadata {
        name: target_name.clone(),
        created_at_ms: now_ms,
        shard_count: params.shard_count,
        replica_count: params.replica_count,
        active_shards: 0,
        aliases: [(
            alias.to_string(),
            AliasEntry {
                is_write_container: true,
            },
        )]
        .into(),
        settings: params.settings.clone(),
    };

    // Old container keeps the alias for reads; only the write flag moves.
    let mut demoted = source.clone();
    if let Some(entry) = demoted.aliases.get_mut(alias) {
        entry.is_write_container = false;
    }

    let new_state = state.with_container(demoted).with_container(target);

    Ok(PlannedRollover {
        source_container: source_name,
        target_container: target_name,
        new_state: Some(new_state),
    })
}

/// Deterministic next name for a rolled-over container.
///
/// A trailing `-<digits>` counter increments, zero-padded to at least
/// `counter_width` (existing wider counters keep their width). Names
/// without a counter, or whose counter cannot advance within u64, get
/// `-1` appended at `counter_width`, keeping the function total over all
/// source names.
pub fn next_container_name(source: &str, counter_width: usize) -> String {
    if let Some((stem, suffix)) = source.rsplit_once('-') {
        if !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()) {
            if let Some(next) = suffix.parse::<u64>().ok().and_then(|c| c.checked_add(1)) {
                let width = suffix.len().max(counter_width);
                return format!("{}-{:0width$}", stem, next, width = width);
            }
        }
    }
    format!("{}-{:0width$}", source, 1, width = counter_width)
}
