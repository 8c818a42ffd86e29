// Graph Builder
// Constructs the adaptive retrieval graph using petgraph

use super::node::GraphError;
use super::nodes::{
    DecideNode, GenerateNode, GradeDocumentsNode, GradeGenerationNode, RetrieveNode, RouterNode,
    TransformQueryNode, WebSearchNode,
};
use super::runtime::{GraphBuilder, GraphRuntime};
use super::state::{Condition, Step};

/// Build the adaptive RAG graph
pub fn build_adaptive_rag_graph() -> Result<GraphRuntime, GraphError> {
    GraphBuilder::new()
        .entry(Step::Route)
        // Entry point
        .node(Box::new(RouterNode::new()))
        // Web path
        .node(Box::new(WebSearchNode::new()))
        // Vector store path
        .node(Box::new(RetrieveNode::new()))
        .node(Box::new(GradeDocumentsNode::new()))
        .node(Box::new(DecideNode::new()))
        .node(Box::new(TransformQueryNode::new()))
        // Answering
        .node(Box::new(GenerateNode::new()))
        .node(Box::new(GradeGenerationNode::new()))
        // Router edges
        .conditional_edge(Step::Route, Step::WebSearch, Condition::WebSearch)
        .conditional_edge(Step::Route, Step::Retrieve, Condition::Vectorstore)
        .edge(Step::WebSearch, Step::Generate)
        .edge(Step::Retrieve, Step::GradeDocuments)
        .edge(Step::GradeDocuments, Step::Decide)
        // Decide edges
        .conditional_edge(Step::Decide, Step::Generate, Condition::DocumentsRelevant)
        .conditional_edge(Step::Decide, Step::TransformQuery, Condition::NoRelevantDocuments)
        .edge(Step::TransformQuery, Step::Retrieve)
        .edge(Step::Generate, Step::GradeGeneration)
        // Generation grading edges
        .conditional_edge(Step::GradeGeneration, Step::Done, Condition::Useful)
        .conditional_edge(Step::GradeGeneration, Step::Generate, Condition::NotSupported)
        .conditional_edge(Step::GradeGeneration, Step::TransformQuery, Condition::NotUseful)
        .build()
}
