// Node trait and types
// Base abstraction for graph nodes

use async_trait::async_trait;
use thiserror::Error;

use crate::collaborators::Collaborators;
use crate::core::errors::{ApiError, RagError};

use super::state::{Condition, GraphState, Step, StateUpdate};

const DEFAULT_GRADING_CONCURRENCY: usize = 4;

/// Context passed to nodes during execution
pub struct NodeContext<'a> {
    /// External services the nodes delegate to
    pub services: &'a Collaborators,
    /// Maximum number of relevance judgments in flight
    pub grading_concurrency: usize,
}

impl<'a> NodeContext<'a> {
    pub fn new(services: &'a Collaborators) -> Self {
        Self {
            services,
            grading_concurrency: DEFAULT_GRADING_CONCURRENCY,
        }
    }

    pub fn with_grading_concurrency(mut self, concurrency: usize) -> Self {
        self.grading_concurrency = concurrency.max(1);
        self
    }
}

/// Output from a node execution
#[derive(Debug, Clone, PartialEq)]
pub enum NodeOutput {
    /// Apply the update (if any) and follow the default edge
    Continue(Option<StateUpdate>),
    /// Follow the conditional edge labelled with this condition
    Branch(Condition),
}

#[derive(Debug, Error)]
pub enum GraphErrorKind {
    #[error(transparent)]
    Rag(#[from] RagError),
    #[error("maximum steps ({0}) exceeded")]
    StepLimitExceeded(usize),
    #[error("{0}")]
    Topology(String),
}

/// Graph execution error
///
/// `execution_trace` records the steps completed before the failure,
/// most-recent last.
#[derive(Debug)]
pub struct GraphError {
    pub step: Step,
    pub kind: GraphErrorKind,
    pub execution_trace: Vec<Step>,
}

impl GraphError {
    pub fn new(step: Step, kind: impl Into<GraphErrorKind>) -> Self {
        Self {
            step,
            kind: kind.into(),
            execution_trace: Vec::new(),
        }
    }

    pub fn topology(step: Step, message: impl Into<String>) -> Self {
        Self::new(step, GraphErrorKind::Topology(message.into()))
    }

    pub fn with_trace(mut self, trace: Vec<Step>) -> Self {
        self.execution_trace = trace;
        self
    }

    pub fn is_malformed_judgment(&self) -> bool {
        matches!(&self.kind, GraphErrorKind::Rag(err) if err.is_malformed_judgment())
    }

    fn trace_label(&self) -> String {
        self.execution_trace
            .iter()
            .map(Step::as_str)
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

impl From<GraphError> for ApiError {
    fn from(err: GraphError) -> Self {
        let message = err.to_string();
        match err.kind {
            GraphErrorKind::Rag(rag) => match ApiError::from(rag) {
                ApiError::BadRequest(_) => ApiError::BadRequest(message),
                ApiError::BadGateway(_) => ApiError::BadGateway(message),
                _ => ApiError::Internal(message),
            },
            GraphErrorKind::StepLimitExceeded(_) | GraphErrorKind::Topology(_) => {
                ApiError::Internal(message)
            }
        }
    }
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.execution_trace.is_empty() {
            write!(f, "GraphError in {}: {}", self.step, self.kind)
        } else {
            write!(
                f,
                "GraphError in {} (trace: {}): {}",
                self.step,
                self.trace_label(),
                self.kind
            )
        }
    }
}

impl std::error::Error for GraphError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

/// Node trait - all graph nodes implement this
#[async_trait]
pub trait Node: Send + Sync {
    /// The step this node executes
    fn step(&self) -> Step;

    /// Human-readable name for logs
    fn name(&self) -> &'static str {
        self.step().as_str()
    }

    /// Execute the node logic against a read-only view of the state
    async fn execute(
        &self,
        state: &GraphState,
        ctx: &NodeContext<'_>,
    ) -> Result<NodeOutput, GraphError>;
}
