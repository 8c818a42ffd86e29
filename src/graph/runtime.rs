// Graph Runtime - petgraph based
// Enum-tagged state machine over a fixed step topology

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::node::{GraphError, GraphErrorKind, Node, NodeContext, NodeOutput};
use super::state::{Condition, GraphState, Step};

/// Edge condition for graph routing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeCondition {
    /// Always follow this edge (default edge)
    Always,
    /// Follow this edge when the node branches with this condition
    On(Condition),
}

impl EdgeCondition {
    pub fn matches(&self, condition: Option<Condition>) -> bool {
        match (self, condition) {
            (EdgeCondition::Always, None) => true,
            (EdgeCondition::On(expected), Some(actual)) => *expected == actual,
            _ => false,
        }
    }
}

impl fmt::Display for EdgeCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeCondition::Always => f.write_str("always"),
            EdgeCondition::On(condition) => f.write_str(condition.as_str()),
        }
    }
}

/// Per-run execution limits. The step budget has no default: every caller
/// states how many node executions a run may take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub max_steps: usize,
    pub interrupt_before: Vec<Step>,
}

impl RunOptions {
    pub fn new(max_steps: usize) -> Self {
        Self {
            max_steps,
            interrupt_before: Vec::new(),
        }
    }

    pub fn interrupt_before(mut self, step: Step) -> Self {
        if !self.interrupt_before.contains(&step) {
            self.interrupt_before.push(step);
        }
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    /// Reached the accepting state
    Completed,
    /// Paused before executing `next`
    Interrupted { next: Step },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub state: GraphState,
    pub status: RunStatus,
    /// Steps executed so far, in order
    pub trace: Vec<Step>,
    pub steps: usize,
}

impl RunOutcome {
    pub fn is_completed(&self) -> bool {
        self.status == RunStatus::Completed
    }
}

/// One edge of the topology, for introspection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdgeDescription {
    pub from: Step,
    pub to: Step,
    pub condition: Option<Condition>,
}

/// petgraph-based StateGraph runtime
pub struct GraphRuntime {
    /// Step topology; `Done` is a sink vertex with no node
    graph: DiGraph<Step, EdgeCondition>,
    indices: HashMap<Step, NodeIndex>,
    nodes: HashMap<Step, Box<dyn Node>>,
    entry: Option<Step>,
}

impl GraphRuntime {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            indices: HashMap::new(),
            nodes: HashMap::new(),
            entry: None,
        }
    }

    pub fn entry(&self) -> Option<Step> {
        self.entry
    }

    /// Add a node; its step becomes a vertex of the topology
    pub fn add_node(&mut self, node: Box<dyn Node>) -> NodeIndex {
        let step = node.step();
        let index = self.vertex(step);
        self.nodes.insert(step, node);
        index
    }

    /// Add an edge between two steps (always follow)
    pub fn add_edge(&mut self, from: Step, to: Step) -> Result<(), GraphError> {
        self.add_conditional_edge(from, to, EdgeCondition::Always)
    }

    /// Add a conditional edge between two steps
    pub fn add_conditional_edge(
        &mut self,
        from: Step,
        to: Step,
        condition: EdgeCondition,
    ) -> Result<(), GraphError> {
        if from == Step::Done {
            return Err(GraphError::topology(from, "Done cannot have outgoing edges"));
        }
        if !self.nodes.contains_key(&from) {
            return Err(GraphError::topology(
                from,
                format!("Source node not found: {}", from),
            ));
        }
        if to != Step::Done && !self.nodes.contains_key(&to) {
            return Err(GraphError::topology(
                to,
                format!("Target node not found: {}", to),
            ));
        }

        let from_idx = self.vertex(from);
        let duplicate = self
            .graph
            .edges_directed(from_idx, Direction::Outgoing)
            .any(|edge| *edge.weight() == condition);
        if duplicate {
            return Err(GraphError::topology(
                from,
                format!("Duplicate edge '{}' from {}", condition, from),
            ));
        }

        let to_idx = self.vertex(to);
        self.graph.add_edge(from_idx, to_idx, condition);
        Ok(())
    }

    pub fn has_node(&self, step: Step) -> bool {
        self.nodes.contains_key(&step)
    }

    /// Check for cycles in the graph
    pub fn has_cycle(&self) -> bool {
        petgraph::algo::is_cyclic_directed(&self.graph)
    }

    /// All edges, sorted by source then target
    pub fn edges(&self) -> Vec<EdgeDescription> {
        let mut edges: Vec<EdgeDescription> = self
            .graph
            .edge_references()
            .map(|edge| EdgeDescription {
                from: self.graph[edge.source()],
                to: self.graph[edge.target()],
                condition: match edge.weight() {
                    EdgeCondition::Always => None,
                    EdgeCondition::On(condition) => Some(*condition),
                },
            })
            .collect();
        edges.sort_by_key(|edge| (edge.from.as_str(), edge.to.as_str()));
        edges
    }

    /// Graphviz rendering of the topology
    pub fn to_dot(&self) -> String {
        format!(
            "{}",
            petgraph::dot::Dot::with_config(&self.graph, &[])
        )
    }

    /// Pure transition function: the step that follows `from` given the
    /// condition it branched with (`None` for a plain continue).
    pub fn transition(&self, from: Step, condition: Option<Condition>) -> Result<Step, GraphError> {
        let from_idx = *self
            .indices
            .get(&from)
            .ok_or_else(|| GraphError::topology(from, format!("Unknown step: {}", from)))?;

        let edges: Vec<(NodeIndex, EdgeCondition)> = self
            .graph
            .edges_directed(from_idx, Direction::Outgoing)
            .map(|edge| (edge.target(), *edge.weight()))
            .collect();

        if edges.is_empty() {
            return Err(GraphError::topology(
                from,
                format!("No outgoing edges from step: {}", from),
            ));
        }

        if let Some((target, _)) = edges.iter().find(|(_, weight)| weight.matches(condition)) {
            return Ok(self.graph[*target]);
        }

        // Fall back to default (Always) edge
        if let Some((target, _)) = edges
            .iter()
            .find(|(_, weight)| *weight == EdgeCondition::Always)
        {
            tracing::warn!(
                "Condition '{}' not matched for step '{}', using default edge",
                condition.map(|c| c.as_str()).unwrap_or(""),
                from
            );
            return Ok(self.graph[*target]);
        }

        Err(GraphError::topology(
            from,
            format!(
                "No matching edge for condition: {}",
                condition.map(|c| c.as_str()).unwrap_or("(none)")
            ),
        ))
    }

    /// Execute the graph from its entry step
    pub async fn run(
        &self,
        state: GraphState,
        ctx: &NodeContext<'_>,
        options: &RunOptions,
    ) -> Result<RunOutcome, GraphError> {
        let entry = self
            .entry
            .ok_or_else(|| GraphError::topology(Step::Route, "No entry step set"))?;
        self.drive(entry, state, Vec::new(), 0, false, ctx, options)
            .await
    }

    /// Continue an interrupted run. The pending step executes even when it
    /// is listed in `interrupt_before`; the step budget counts steps taken
    /// before the interrupt.
    pub async fn resume(
        &self,
        outcome: RunOutcome,
        ctx: &NodeContext<'_>,
        options: &RunOptions,
    ) -> Result<RunOutcome, GraphError> {
        let RunStatus::Interrupted { next } = outcome.status else {
            return Err(GraphError::topology(Step::Done, "Run already completed"));
        };
        self.drive(
            next,
            outcome.state,
            outcome.trace,
            outcome.steps,
            true,
            ctx,
            options,
        )
        .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn drive(
        &self,
        start: Step,
        mut state: GraphState,
        mut trace: Vec<Step>,
        mut steps: usize,
        mut resuming: bool,
        ctx: &NodeContext<'_>,
        options: &RunOptions,
    ) -> Result<RunOutcome, GraphError> {
        let mut current = start;

        loop {
            if current == Step::Done {
                tracing::debug!("Graph execution complete after {} steps", steps);
                return Ok(RunOutcome {
                    state,
                    status: RunStatus::Completed,
                    trace,
                    steps,
                });
            }

            if !resuming && options.interrupt_before.contains(&current) {
                tracing::info!("Interrupting before step: {}", current);
                return Ok(RunOutcome {
                    state,
                    status: RunStatus::Interrupted { next: current },
                    trace,
                    steps,
                });
            }
            resuming = false;

            if steps >= options.max_steps {
                return Err(GraphError::new(
                    current,
                    GraphErrorKind::StepLimitExceeded(options.max_steps),
                )
                .with_trace(trace));
            }

            let node = self.nodes.get(&current).ok_or_else(|| {
                GraphError::topology(current, format!("Node not found in graph: {}", current))
                    .with_trace(trace.clone())
            })?;

            tracing::debug!("Executing node: {} (step {})", node.name(), steps);

            // State is only replaced once the node has finished, so an
            // aborted or failed step leaves it untouched.
            let output = match node.execute(&state, ctx).await {
                Ok(output) => output,
                Err(err) => return Err(err.with_trace(trace)),
            };

            trace.push(current);
            steps += 1;

            let condition = match output {
                NodeOutput::Continue(Some(update)) => {
                    tracing::debug!("Step {} replaced {}", current, update.field());
                    state = state.apply(update);
                    None
                }
                NodeOutput::Continue(None) => None,
                NodeOutput::Branch(condition) => Some(condition),
            };

            current = self
                .transition(current, condition)
                .map_err(|err| err.with_trace(trace.clone()))?;
        }
    }

    fn vertex(&mut self, step: Step) -> NodeIndex {
        if let Some(index) = self.indices.get(&step) {
            return *index;
        }
        let index = self.graph.add_node(step);
        self.indices.insert(step, index);
        index
    }
}

impl Default for GraphRuntime {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for constructing graphs fluently
pub struct GraphBuilder {
    runtime: GraphRuntime,
    pending_edges: Vec<(Step, Step, EdgeCondition)>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            runtime: GraphRuntime::new(),
            pending_edges: Vec::new(),
        }
    }

    pub fn entry(mut self, step: Step) -> Self {
        self.runtime.entry = Some(step);
        self
    }

    pub fn node(mut self, node: Box<dyn Node>) -> Self {
        self.runtime.add_node(node);
        self
    }

    pub fn edge(mut self, from: Step, to: Step) -> Self {
        self.pending_edges.push((from, to, EdgeCondition::Always));
        self
    }

    pub fn conditional_edge(mut self, from: Step, to: Step, condition: Condition) -> Self {
        self.pending_edges
            .push((from, to, EdgeCondition::On(condition)));
        self
    }

    pub fn build(mut self) -> Result<GraphRuntime, GraphError> {
        let entry = self
            .runtime
            .entry
            .ok_or_else(|| GraphError::topology(Step::Route, "No entry step set"))?;
        if !self.runtime.has_node(entry) {
            return Err(GraphError::topology(
                entry,
                format!("Entry node not found: {}", entry),
            ));
        }

        for (from, to, condition) in self.pending_edges {
            self.runtime.add_conditional_edge(from, to, condition)?;
        }
        Ok(self.runtime)
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::state::StateUpdate;
    use crate::testing::ScriptedServices;
    use async_trait::async_trait;

    struct Fixed {
        step: Step,
        output: NodeOutput,
    }

    #[async_trait]
    impl Node for Fixed {
        fn step(&self) -> Step {
            self.step
        }

        async fn execute(
            &self,
            _state: &GraphState,
            _ctx: &NodeContext<'_>,
        ) -> Result<NodeOutput, GraphError> {
            Ok(self.output.clone())
        }
    }

    fn fixed(step: Step, output: NodeOutput) -> Box<dyn Node> {
        Box::new(Fixed { step, output })
    }

    #[test]
    fn test_edge_condition_matching() {
        assert!(EdgeCondition::Always.matches(None));
        assert!(!EdgeCondition::Always.matches(Some(Condition::Useful)));

        assert!(EdgeCondition::On(Condition::Useful).matches(Some(Condition::Useful)));
        assert!(!EdgeCondition::On(Condition::Useful).matches(Some(Condition::NotUseful)));
        assert!(!EdgeCondition::On(Condition::Useful).matches(None));
    }

    #[test]
    fn build_rejects_edges_to_missing_nodes() {
        let result = GraphBuilder::new()
            .entry(Step::Generate)
            .node(fixed(Step::Generate, NodeOutput::Continue(None)))
            .edge(Step::Generate, Step::GradeGeneration)
            .build();

        let err = result.err().expect("missing target must be rejected");
        assert_eq!(err.step, Step::GradeGeneration);
    }

    #[test]
    fn build_rejects_missing_entry() {
        let result = GraphBuilder::new()
            .node(fixed(Step::Generate, NodeOutput::Continue(None)))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn build_rejects_duplicate_conditions() {
        let result = GraphBuilder::new()
            .entry(Step::Decide)
            .node(fixed(Step::Decide, NodeOutput::Continue(None)))
            .node(fixed(Step::Generate, NodeOutput::Continue(None)))
            .conditional_edge(Step::Decide, Step::Generate, Condition::DocumentsRelevant)
            .conditional_edge(Step::Decide, Step::Done, Condition::DocumentsRelevant)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn transition_prefers_condition_then_default() {
        let runtime = GraphBuilder::new()
            .entry(Step::Decide)
            .node(fixed(Step::Decide, NodeOutput::Continue(None)))
            .node(fixed(Step::Generate, NodeOutput::Continue(None)))
            .conditional_edge(Step::Decide, Step::Generate, Condition::DocumentsRelevant)
            .edge(Step::Decide, Step::Done)
            .build()
            .unwrap();

        assert_eq!(
            runtime
                .transition(Step::Decide, Some(Condition::DocumentsRelevant))
                .unwrap(),
            Step::Generate
        );
        assert_eq!(
            runtime
                .transition(Step::Decide, Some(Condition::NoRelevantDocuments))
                .unwrap(),
            Step::Done
        );
        assert_eq!(runtime.transition(Step::Decide, None).unwrap(), Step::Done);
        assert!(runtime.transition(Step::Generate, None).is_err());
    }

    #[tokio::test]
    async fn run_applies_updates_and_completes() {
        let runtime = GraphBuilder::new()
            .entry(Step::Generate)
            .node(fixed(
                Step::Generate,
                NodeOutput::Continue(Some(StateUpdate::Generation("A".into()))),
            ))
            .edge(Step::Generate, Step::Done)
            .build()
            .unwrap();

        let services = ScriptedServices::new().build();
        let ctx = NodeContext::new(&services);
        let outcome = runtime
            .run(GraphState::new("q"), &ctx, &RunOptions::new(5))
            .await
            .unwrap();

        assert!(outcome.is_completed());
        assert_eq!(outcome.state.generation.as_deref(), Some("A"));
        assert_eq!(outcome.trace, vec![Step::Generate]);
        assert_eq!(outcome.steps, 1);
    }

    #[tokio::test]
    async fn run_stops_at_step_limit_with_trace() {
        let runtime = GraphBuilder::new()
            .entry(Step::Generate)
            .node(fixed(Step::Generate, NodeOutput::Continue(None)))
            .edge(Step::Generate, Step::Generate)
            .build()
            .unwrap();
        assert!(runtime.has_cycle());

        let services = ScriptedServices::new().build();
        let ctx = NodeContext::new(&services);
        let err = runtime
            .run(GraphState::new("q"), &ctx, &RunOptions::new(3))
            .await
            .unwrap_err();

        assert!(matches!(err.kind, GraphErrorKind::StepLimitExceeded(3)));
        assert_eq!(err.execution_trace, vec![Step::Generate; 3]);
    }

    #[tokio::test]
    async fn interrupt_and_resume() {
        let runtime = GraphBuilder::new()
            .entry(Step::Route)
            .node(fixed(Step::Route, NodeOutput::Continue(None)))
            .node(fixed(
                Step::WebSearch,
                NodeOutput::Continue(Some(StateUpdate::Generation("B".into()))),
            ))
            .edge(Step::Route, Step::WebSearch)
            .edge(Step::WebSearch, Step::Done)
            .build()
            .unwrap();

        let services = ScriptedServices::new().build();
        let ctx = NodeContext::new(&services);
        let options = RunOptions::new(5).interrupt_before(Step::WebSearch);

        let paused = runtime
            .run(GraphState::new("q"), &ctx, &options)
            .await
            .unwrap();
        assert_eq!(
            paused.status,
            RunStatus::Interrupted {
                next: Step::WebSearch
            }
        );
        assert_eq!(paused.trace, vec![Step::Route]);
        assert!(paused.state.generation.is_none());

        let finished = runtime.resume(paused, &ctx, &options).await.unwrap();
        assert!(finished.is_completed());
        assert_eq!(finished.trace, vec![Step::Route, Step::WebSearch]);
        assert_eq!(finished.state.generation.as_deref(), Some("B"));

        assert!(runtime.resume(finished, &ctx, &options).await.is_err());
    }

    #[test]
    fn dot_output_names_steps() {
        let runtime = GraphBuilder::new()
            .entry(Step::Generate)
            .node(fixed(Step::Generate, NodeOutput::Continue(None)))
            .edge(Step::Generate, Step::Done)
            .build()
            .unwrap();

        let dot = runtime.to_dot();
        assert!(dot.contains("generate"));
        assert!(dot.contains("done"));
    }
}
