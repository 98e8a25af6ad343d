//! Rollover conditions and their evaluation
//!
//! Conditions are pure predicates over a stats snapshot plus the source
//! container's creation time. Each condition has a canonical string
//! rendering (`max_age:7d`, `max_docs:100000`) that keys its entry in the
//! result map, so renderings must be stable and round-trip through parsing.

use crate::common::utils::{format_duration, format_size, parse_duration, parse_size};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Live statistics for a container's primary data.
///
/// Fetched fresh for every rollover run; never cached across calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub doc_count: u64,
    pub size_bytes: u64,
    pub primary_shard_size_bytes: u64,
}

/// A typed rollover condition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// Source container is at least this old
    MaxAge(#[serde(with = "duration_ms")] Duration),
    /// Source container holds at least this many documents
    MaxDocs(u64),
    /// Source container's primary data is at least this large
    MaxSize(u64),
    /// Largest primary shard is at least this large
    MaxPrimaryShardSize(u64),
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        (d.as_millis() as u64).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

impl Condition {
    /// Evaluate against a stats snapshot.
    ///
    /// `stats` is `None` when the source container vanished between preview
    /// and the stats fetch; every condition then reports false rather than
    /// erroring, so a vanished source never triggers a rollover.
    pub fn evaluate(&self, stats: Option<&StatsSnapshot>, created_at_ms: u64, now_ms: u64) -> bool {
        let Some(stats) = stats else {
            return false;
        };
        match self {
            Condition::MaxAge(max_age) => {
                let age_ms = now_ms.saturating_sub(created_at_ms);
                age_ms >= max_age.as_millis() as u64
            }
            Condition::MaxDocs(max_docs) => stats.doc_count >= *max_docs,
            Condition::MaxSize(max_size) => stats.size_bytes >= *max_size,
            Condition::MaxPrimaryShardSize(max_size) => {
                stats.primary_shard_size_bytes >= *max_size
            }
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Condition::MaxAge(d) => write!(f, "max_age:{}", format_duration(*d)),
            Condition::MaxDocs(n) => write!(f, "max_docs:{}", n),
            Condition::MaxSize(b) => write!(f, "max_size:{}", format_size(*b)),
            Condition::MaxPrimaryShardSize(b) => {
                write!(f, "max_primary_shard_size:{}", format_size(*b))
            }
        }
    }
}

impl FromStr for Condition {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        let (kind, value) = s
            .split_once(':')
            .ok_or_else(|| crate::Error::InvalidRequest(format!("invalid condition: {}", s)))?;
        match kind {
            "max_age" => Ok(Condition::MaxAge(parse_duration(value)?)),
            "max_docs" => value
                .parse::<u64>()
                .map(Condition::MaxDocs)
                .map_err(|_| crate::Error::InvalidRequest(format!("invalid max_docs: {}", value))),
            "max_size" => Ok(Condition::MaxSize(parse_size(value)?)),
            "max_primary_shard_size" => {
                Ok(Condition::MaxPrimaryShardSize(parse_size(value)?))
            }
            _ => Err(crate::Error::InvalidRequest(format!(
                "unknown condition kind: {}",
                kind
            ))),
        }
    }
}

/// Ordered condition results, insertion order = request order
pub type ConditionResults = Vec<(String, bool)>;

/// Evaluate every condition, one entry per condition in request order.
///
/// Pure and deterministic; duplicate canonical strings are a
/// request-construction error rejected before this point.
pub fn evaluate(
    conditions: &[Condition],
    stats: Option<&StatsSnapshot>,
    created_at_ms: u64,
    now_ms: u64,
) -> ConditionResults {
    conditions
        .iter()
        .map(|c| (c.to_string(), c.evaluate(stats, created_at_ms, now_ms)))
        .collect()
}
