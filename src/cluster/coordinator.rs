//! Commit coordinator: the single writer for cluster metadata
//!
//! All metadata mutations are submitted as tasks and applied by one worker,
//! strictly in submission order, each against the snapshot most recently
//! installed. Tasks are pure replacement functions `&ClusterState ->
//! Result<ClusterState>`; a failing task leaves the current snapshot
//! untouched. The latest snapshot is published through a `watch` channel so
//! readers (previews, shard waiters) never contend with the writer.

use crate::cluster::state::ClusterState;
use crate::common::Result;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};

const SUBMISSION_QUEUE_BOUND: usize = 256;

/// A metadata mutation task
pub type CommitTask = Box<dyn FnOnce(&ClusterState) -> Result<ClusterState> + Send + 'static>;

/// Outcome of an applied commit task
#[derive(Debug, Clone)]
pub struct CommitOutcome {
    /// Snapshot current after the task ran
    pub state: Arc<ClusterState>,
    /// False when the task returned a snapshot identical to its input;
    /// nothing was installed and the version did not advance.
    pub changed: bool,
}

struct Submission {
    description: String,
    task: CommitTask,
    reply: oneshot::Sender<Result<CommitOutcome>>,
}

/// Handle to a running commit coordinator.
///
/// Cheap to clone; the coordinator worker stops once every handle is
/// dropped and the queue drains.
#[derive(Clone)]
pub struct CoordinatorHandle {
    submissions: mpsc::Sender<Submission>,
    state_rx: watch::Receiver<Arc<ClusterState>>,
}

impl CoordinatorHandle {
    /// Latest installed snapshot
    pub fn current(&self) -> Arc<ClusterState> {
        self.state_rx.borrow().clone()
    }

    /// Subscribe to snapshot installations
    pub fn subscribe(&self) -> watch::Receiver<Arc<ClusterState>> {
        self.state_rx.clone()
    }

    /// Submit a mutation task and wait for it to be applied.
    ///
    /// Tasks are applied in submission order; the returned outcome reflects
    /// this task's own application, not later ones.
    pub async fn submit(&self, description: impl Into<String>, task: CommitTask) -> Result<CommitOutcome> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.submissions
            .send(Submission {
                description: description.into(),
                task,
                reply: reply_tx,
            })
            .await
            .map_err(|_| crate::Error::Commit("coordinator stopped".into()))?;
        reply_rx
            .await
            .map_err(|_| crate::Error::Commit("coordinator dropped task".into()))?
    }
}

/// Spawn the coordinator worker with an initial snapshot
pub fn spawn_coordinator(initial: ClusterState) -> CoordinatorHandle {
    let (submission_tx, submission_rx) = mpsc::channel(SUBMISSION_QUEUE_BOUND);
    let (state_tx, state_rx) = watch::channel(Arc::new(initial));

    tokio::spawn(coordinator_loop(submission_rx, state_tx));

    CoordinatorHandle {
        submissions: submission_tx,
        state_rx,
    }
}

async fn coordinator_loop(
    mut submissions: mpsc::Receiver<Submission>,
    state_tx: watch::Sender<Arc<ClusterState>>,
) {
    while let Some(submission) = submissions.recv().await {
        let current = state_tx.borrow().clone();
        let outcome = apply(&current, submission.task);

        match &outcome {
            Ok(CommitOutcome { state, changed: true }) => {
                tracing::info!(
                    task = %submission.description,
                    version = state.version,
                    "applied metadata mutation"
                );
                let _ = state_tx.send(state.clone());
            }
            Ok(CommitOutcome { changed: false, .. }) => {
                tracing::debug!(task = %submission.description, "task produced no change");
            }
            Err(e) => {
                tracing::warn!(task = %submission.description, error = %e, "task failed");
            }
        }

        // Caller may have given up (timeout); the mutation stands regardless.
        let _ = submission.reply.send(outcome);
    }
    tracing::debug!("coordinator loop stopped");
}

fn apply(current: &Arc<ClusterState>, task: CommitTask) -> Result<CommitOutcome> {
    let proposed = task(current.as_ref())?;
    if proposed == **current {
        return Ok(CommitOutcome {
            state: current.clone(),
            changed: false,
        });
    }
    let mut installed = proposed;
    installed.version = current.version + 1;
    Ok(CommitOutcome {
        state: Arc::new(installed),
        changed: true,
    })
}
