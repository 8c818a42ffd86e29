// Checkpoints
// Persist interrupted runs per thread so they can be resumed later

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::runtime::{RunOutcome, RunStatus};
use super::state::{GraphState, Step};
use crate::core::errors::RagError;

/// Snapshot of a thread after its latest run or resume.
///
/// `next` is `None` once the run has completed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub thread_id: String,
    pub state: GraphState,
    pub next: Option<Step>,
    pub steps_taken: usize,
    pub trace: Vec<Step>,
    pub updated_at: DateTime<Utc>,
}

impl Checkpoint {
    pub fn from_outcome(thread_id: impl Into<String>, outcome: &RunOutcome) -> Self {
        let next = match outcome.status {
            RunStatus::Completed => None,
            RunStatus::Interrupted { next } => Some(next),
        };
        Self {
            thread_id: thread_id.into(),
            state: outcome.state.clone(),
            next,
            steps_taken: outcome.steps,
            trace: outcome.trace.clone(),
            updated_at: Utc::now(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.next.is_some()
    }

    pub fn into_outcome(self) -> RunOutcome {
        let status = match self.next {
            Some(next) => RunStatus::Interrupted { next },
            None => RunStatus::Completed,
        };
        RunOutcome {
            state: self.state,
            status,
            trace: self.trace,
            steps: self.steps_taken,
        }
    }
}

#[async_trait]
pub trait CheckpointStore: Send + Sync {
    async fn save(&self, checkpoint: Checkpoint) -> Result<(), RagError>;
    async fn load(&self, thread_id: &str) -> Result<Option<Checkpoint>, RagError>;
    async fn delete(&self, thread_id: &str) -> Result<bool, RagError>;
    /// Newest first
    async fn list(&self) -> Result<Vec<Checkpoint>, RagError>;
}

/// In-process checkpoint store. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryCheckpointStore {
    checkpoints: RwLock<HashMap<String, Checkpoint>>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CheckpointStore for MemoryCheckpointStore {
    async fn save(&self, checkpoint: Checkpoint) -> Result<(), RagError> {
        let mut checkpoints = self.checkpoints.write().await;
        checkpoints.insert(checkpoint.thread_id.clone(), checkpoint);
        Ok(())
    }

    async fn load(&self, thread_id: &str) -> Result<Option<Checkpoint>, RagError> {
        let checkpoints = self.checkpoints.read().await;
        Ok(checkpoints.get(thread_id).cloned())
    }

    async fn delete(&self, thread_id: &str) -> Result<bool, RagError> {
        let mut checkpoints = self.checkpoints.write().await;
        Ok(checkpoints.remove(thread_id).is_some())
    }

    async fn list(&self) -> Result<Vec<Checkpoint>, RagError> {
        let checkpoints = self.checkpoints.read().await;
        let mut all: Vec<Checkpoint> = checkpoints.values().cloned().collect();
        all.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interrupted(question: &str) -> RunOutcome {
        RunOutcome {
            state: GraphState::new(question),
            status: RunStatus::Interrupted {
                next: Step::WebSearch,
            },
            trace: vec![Step::Route],
            steps: 1,
        }
    }

    #[test]
    fn outcome_conversion_preserves_progress() {
        let outcome = interrupted("q");
        let checkpoint = Checkpoint::from_outcome("t1", &outcome);

        assert!(checkpoint.is_pending());
        assert_eq!(checkpoint.next, Some(Step::WebSearch));
        assert_eq!(checkpoint.into_outcome(), outcome);
    }

    #[test]
    fn completed_outcome_has_no_next_step() {
        let mut outcome = interrupted("q");
        outcome.status = RunStatus::Completed;
        let checkpoint = Checkpoint::from_outcome("t1", &outcome);
        assert!(!checkpoint.is_pending());
        assert!(checkpoint.into_outcome().is_completed());
    }

    #[tokio::test]
    async fn memory_store_save_load_delete() {
        let store = MemoryCheckpointStore::new();
        store
            .save(Checkpoint::from_outcome("a", &interrupted("first")))
            .await
            .unwrap();
        store
            .save(Checkpoint::from_outcome("a", &interrupted("second")))
            .await
            .unwrap();

        let loaded = store.load("a").await.unwrap().unwrap();
        assert_eq!(loaded.state.question, "second");
        assert_eq!(store.list().await.unwrap().len(), 1);

        assert!(store.delete("a").await.unwrap());
        assert!(!store.delete("a").await.unwrap());
        assert!(store.load("a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let store = MemoryCheckpointStore::new();
        let mut older = Checkpoint::from_outcome("old", &interrupted("q"));
        older.updated_at = Utc::now() - chrono::Duration::seconds(60);
        store.save(older).await.unwrap();
        store
            .save(Checkpoint::from_outcome("new", &interrupted("q")))
            .await
            .unwrap();

        let ids: Vec<String> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.thread_id)
            .collect();
        assert_eq!(ids, vec!["new", "old"]);
    }
}
