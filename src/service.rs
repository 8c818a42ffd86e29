// RAG Service
// Runs questions through the graph and keeps per-thread checkpoints

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use thiserror::Error;

use crate::collaborators::Collaborators;
use crate::core::config::Settings;
use crate::core::errors::{ApiError, RagError};
use crate::graph::{
    build_adaptive_rag_graph, Checkpoint, CheckpointStore, Document, GraphError, GraphRuntime,
    GraphState, NodeContext, RunOptions, RunOutcome, RunStatus, Step,
};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Rag(#[from] RagError),
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error("Thread not found: {0}")]
    ThreadNotFound(String),
    #[error("Thread {0} has no pending step to resume")]
    NotResumable(String),
    #[error("Thread {0} is already running")]
    ThreadBusy(String),
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Rag(err) => err.into(),
            ServiceError::Graph(err) => err.into(),
            ServiceError::ThreadNotFound(_) => ApiError::NotFound(err.to_string()),
            ServiceError::NotResumable(_) | ServiceError::ThreadBusy(_) => {
                ApiError::Conflict(err.to_string())
            }
        }
    }
}

/// Result of one `ask` or `resume` call
#[derive(Debug, Clone, Serialize)]
pub struct AskResponse {
    pub thread_id: String,
    #[serde(flatten)]
    pub status: RunStatus,
    pub question: String,
    pub generation: Option<String>,
    pub documents: Vec<Document>,
    pub trace: Vec<Step>,
    pub steps: usize,
}

impl AskResponse {
    fn from_outcome(thread_id: String, outcome: RunOutcome) -> Self {
        Self {
            thread_id,
            status: outcome.status,
            question: outcome.state.question,
            generation: outcome.state.generation,
            documents: outcome.state.documents,
            trace: outcome.trace,
            steps: outcome.steps,
        }
    }
}

/// Thread ids with a run in flight
#[derive(Default)]
struct ActiveThreads(Mutex<HashSet<String>>);

impl ActiveThreads {
    fn claim(&self, thread_id: &str) -> Result<ThreadClaim<'_>, ServiceError> {
        let mut active = self.0.lock().map_err(RagError::internal)?;
        if !active.insert(thread_id.to_string()) {
            return Err(ServiceError::ThreadBusy(thread_id.to_string()));
        }
        Ok(ThreadClaim {
            threads: self,
            thread_id: thread_id.to_string(),
        })
    }
}

/// Releases the thread when dropped, whether the run finished or failed
struct ThreadClaim<'a> {
    threads: &'a ActiveThreads,
    thread_id: String,
}

impl Drop for ThreadClaim<'_> {
    fn drop(&mut self) {
        if let Ok(mut active) = self.threads.0.lock() {
            active.remove(&self.thread_id);
        }
    }
}

pub struct RagService {
    graph: GraphRuntime,
    services: Collaborators,
    checkpoints: Arc<dyn CheckpointStore>,
    active: ActiveThreads,
    options: RunOptions,
    grading_concurrency: usize,
    max_input_length: usize,
}

impl RagService {
    pub fn new(
        graph: GraphRuntime,
        services: Collaborators,
        checkpoints: Arc<dyn CheckpointStore>,
        options: RunOptions,
    ) -> Self {
        Self {
            graph,
            services,
            checkpoints,
            active: ActiveThreads::default(),
            options,
            grading_concurrency: 4,
            max_input_length: 10_000,
        }
    }

    /// Build the adaptive RAG graph and take run limits from settings
    pub fn from_settings(
        settings: &Settings,
        services: Collaborators,
        checkpoints: Arc<dyn CheckpointStore>,
    ) -> Result<Self, GraphError> {
        let mut options = RunOptions::new(settings.graph.max_steps);
        for step in &settings.graph.interrupt_before {
            options = options.interrupt_before(*step);
        }
        Ok(Self::new(build_adaptive_rag_graph()?, services, checkpoints, options)
            .with_limits(settings.grading.concurrency, settings.app.max_input_length))
    }

    pub fn with_limits(mut self, grading_concurrency: usize, max_input_length: usize) -> Self {
        self.grading_concurrency = grading_concurrency.max(1);
        self.max_input_length = max_input_length;
        self
    }

    pub fn graph(&self) -> &GraphRuntime {
        &self.graph
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    fn validate_question(&self, question: &str) -> Result<String, RagError> {
        let trimmed = question.trim();
        if trimmed.is_empty() {
            return Err(RagError::InvalidInput("Question must not be empty".to_string()));
        }
        let length = trimmed.chars().count();
        if length > self.max_input_length {
            return Err(RagError::InvalidInput(format!(
                "Question is {} characters long; the limit is {}",
                length, self.max_input_length
            )));
        }
        Ok(trimmed.to_string())
    }

    /// Start a new run. A pending checkpoint on the same thread is replaced.
    pub async fn ask(
        &self,
        question: &str,
        thread_id: Option<String>,
    ) -> Result<AskResponse, ServiceError> {
        let question = self.validate_question(question)?;
        let thread_id = thread_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let _claim = self.active.claim(&thread_id)?;

        tracing::info!("Thread {}: starting run", thread_id);
        let ctx = NodeContext::new(&self.services).with_grading_concurrency(self.grading_concurrency);
        let outcome = self
            .graph
            .run(GraphState::new(question), &ctx, &self.options)
            .await
            .inspect_err(|err| tracing::warn!("Thread {}: {}", thread_id, err))?;

        self.finish(thread_id, outcome).await
    }

    /// Continue an interrupted thread from its pending step. The checkpoint
    /// is read only after the thread is claimed, so two resumes never both
    /// run the same pending step.
    pub async fn resume(&self, thread_id: &str) -> Result<AskResponse, ServiceError> {
        let _claim = self.active.claim(thread_id)?;
        let checkpoint = self
            .checkpoints
            .load(thread_id)
            .await?
            .ok_or_else(|| ServiceError::ThreadNotFound(thread_id.to_string()))?;
        if !checkpoint.is_pending() {
            return Err(ServiceError::NotResumable(thread_id.to_string()));
        }

        tracing::info!(
            "Thread {}: resuming at {:?} after {} steps",
            thread_id,
            checkpoint.next,
            checkpoint.steps_taken
        );
        let ctx = NodeContext::new(&self.services).with_grading_concurrency(self.grading_concurrency);
        let outcome = self
            .graph
            .resume(checkpoint.into_outcome(), &ctx, &self.options)
            .await
            .inspect_err(|err| tracing::warn!("Thread {}: {}", thread_id, err))?;

        self.finish(thread_id.to_string(), outcome).await
    }

    async fn finish(&self, thread_id: String, outcome: RunOutcome) -> Result<AskResponse, ServiceError> {
        match outcome.status {
            RunStatus::Completed => {
                tracing::info!("Thread {}: completed in {} steps", thread_id, outcome.steps)
            }
            RunStatus::Interrupted { next } => {
                tracing::info!("Thread {}: interrupted before {}", thread_id, next)
            }
        }
        self.checkpoints
            .save(Checkpoint::from_outcome(thread_id.clone(), &outcome))
            .await?;
        Ok(AskResponse::from_outcome(thread_id, outcome))
    }

    pub async fn thread(&self, thread_id: &str) -> Result<Checkpoint, ServiceError> {
        self.checkpoints
            .load(thread_id)
            .await?
            .ok_or_else(|| ServiceError::ThreadNotFound(thread_id.to_string()))
    }

    pub async fn threads(&self) -> Result<Vec<Checkpoint>, ServiceError> {
        Ok(self.checkpoints.list().await?)
    }

    pub async fn delete_thread(&self, thread_id: &str) -> Result<(), ServiceError> {
        if self.checkpoints.delete(thread_id).await? {
            Ok(())
        } else {
            Err(ServiceError::ThreadNotFound(thread_id.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Datasource, MemoryCheckpointStore, Score};
    use crate::testing::{docs, ScriptedServices};

    fn service(scripted: &ScriptedServices, settings: Settings) -> RagService {
        RagService::from_settings(
            &settings,
            scripted.build(),
            Arc::new(MemoryCheckpointStore::new()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn ask_completes_and_records_thread() {
        let scripted = ScriptedServices::new()
            .retrieve(vec![docs(&["agents remember"])])
            .generations(&["They remember."]);
        let rag = service(&scripted, Settings::default());

        let response = rag
            .ask("  agent memory ", Some("t-1".to_string()))
            .await
            .unwrap();

        assert_eq!(response.status, RunStatus::Completed);
        assert_eq!(response.question, "agent memory");
        assert_eq!(response.generation.as_deref(), Some("They remember."));
        let thread = rag.thread("t-1").await.unwrap();
        assert!(!thread.is_pending());
        assert!(matches!(
            rag.resume("t-1").await,
            Err(ServiceError::NotResumable(_))
        ));
    }

    #[tokio::test]
    async fn rejects_empty_and_oversized_questions() {
        let mut settings = Settings::default();
        settings.app.max_input_length = 5;
        let rag = service(&ScriptedServices::new(), settings);

        for question in ["   ", "far too long"] {
            let err = rag.ask(question, None).await.unwrap_err();
            assert!(matches!(err, ServiceError::Rag(RagError::InvalidInput(_))));
        }
    }

    #[tokio::test]
    async fn interrupt_then_resume_runs_the_web_path() {
        let scripted = ScriptedServices::new()
            .route(Some(Datasource::WebSearch))
            .web_results("[]")
            .hallucination(&[Some(Score::Yes)])
            .answer(&[Some(Score::Yes)]);
        let mut settings = Settings::default();
        settings.graph.interrupt_before = vec![Step::WebSearch];
        let rag = service(&scripted, settings);

        let paused = rag.ask("weather in Paris", None).await.unwrap();
        assert_eq!(paused.status, RunStatus::Interrupted { next: Step::WebSearch });
        assert!(scripted.web_search.calls.lock().unwrap().is_empty());

        let resumed = rag.resume(&paused.thread_id).await.unwrap();
        assert_eq!(resumed.status, RunStatus::Completed);
        assert_eq!(
            resumed.trace,
            vec![Step::Route, Step::WebSearch, Step::Generate, Step::GradeGeneration]
        );
        assert_eq!(rag.threads().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn resume_of_a_running_thread_is_rejected() {
        let scripted = ScriptedServices::new()
            .route(Some(Datasource::WebSearch))
            .web_results("[]")
            .hallucination(&[Some(Score::Yes)])
            .answer(&[Some(Score::Yes)]);
        let mut settings = Settings::default();
        settings.graph.interrupt_before = vec![Step::WebSearch];
        let rag = service(&scripted, settings);
        let paused = rag.ask("weather in Paris", None).await.unwrap();

        let held = rag.active.claim(&paused.thread_id).unwrap();
        assert!(matches!(
            rag.resume(&paused.thread_id).await,
            Err(ServiceError::ThreadBusy(_))
        ));
        assert!(scripted.web_search.calls.lock().unwrap().is_empty());
        assert!(rag.thread(&paused.thread_id).await.unwrap().is_pending());

        drop(held);
        let resumed = rag.resume(&paused.thread_id).await.unwrap();
        assert_eq!(resumed.status, RunStatus::Completed);
        assert_eq!(scripted.web_search.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn second_resume_after_completion_is_not_resumable() {
        let scripted = ScriptedServices::new()
            .route(Some(Datasource::WebSearch))
            .web_results("[]")
            .hallucination(&[Some(Score::Yes)])
            .answer(&[Some(Score::Yes)]);
        let mut settings = Settings::default();
        settings.graph.interrupt_before = vec![Step::WebSearch];
        let rag = service(&scripted, settings);
        let paused = rag.ask("weather in Paris", None).await.unwrap();

        let (first, second) = tokio::join!(
            rag.resume(&paused.thread_id),
            rag.resume(&paused.thread_id)
        );

        let outcomes = [first, second];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(outcomes.iter().any(|r| matches!(
            r,
            Err(ServiceError::ThreadBusy(_)) | Err(ServiceError::NotResumable(_))
        )));
        assert_eq!(scripted.web_search.calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn busy_thread_maps_to_conflict() {
        let err: ApiError = ServiceError::ThreadBusy("t".to_string()).into();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn unknown_thread_is_not_found() {
        let rag = service(&ScriptedServices::new(), Settings::default());
        assert!(matches!(
            rag.resume("missing").await,
            Err(ServiceError::ThreadNotFound(_))
        ));
        assert!(matches!(
            rag.delete_thread("missing").await,
            Err(ServiceError::ThreadNotFound(_))
        ));
    }
}
