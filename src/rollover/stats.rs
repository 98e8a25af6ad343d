//! Stats service: live statistics for a container's primary data

use crate::common::Result;
use crate::rollover::condition::StatsSnapshot;
use std::collections::HashMap;
use std::sync::Mutex;

/// Boxed future used by the async collaborator traits
pub type BoxFuture<'a, T> =
    std::pin::Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// Read-only, asynchronous statistics source.
///
/// `Ok(None)` means the container no longer exists; the caller treats that
/// as "no condition matches", not as a failure. `Err` is a fetch failure and
/// aborts the rollover before any mutation.
pub trait StatsService: Send + Sync {
    fn fetch<'a>(&'a self, container: &'a str) -> BoxFuture<'a, Result<Option<StatsSnapshot>>>;
}

/// In-memory stats source for the demo binary and tests
#[derive(Default)]
pub struct InMemoryStats {
    stats: Mutex<HashMap<String, StatsSnapshot>>,
}

impl InMemoryStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, container: impl Into<String>, snapshot: StatsSnapshot) {
        self.stats
            .lock()
            .expect("stats lock poisoned")
            .insert(container.into(), snapshot);
    }

    pub fn remove(&self, container: &str) {
        self.stats
            .lock()
            .expect("stats lock poisoned")
            .remove(container);
    }
}

impl StatsService for InMemoryStats {
    fn fetch<'a>(&'a self, container: &'a str) -> BoxFuture<'a, Result<Option<StatsSnapshot>>> {
        Box::pin(async move {
            let stats = self.stats.lock().expect("stats lock poisoned");
            Ok(stats.get(container).copied())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_stats() {
        let stats = InMemoryStats::new();
        stats.set(
            "logs-000003",
            StatsSnapshot {
                doc_count: 42,
                size_bytes: 1024,
                primary_shard_size_bytes: 512,
            },
        );

        let fetched = stats.fetch("logs-000003").await.unwrap().unwrap();
        assert_eq!(fetched.doc_count, 42);

        assert!(stats.fetch("gone").await.unwrap().is_none());

        stats.remove("logs-000003");
        assert!(stats.fetch("logs-000003").await.unwrap().is_none());
    }
}
