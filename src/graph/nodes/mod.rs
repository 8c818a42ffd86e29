// Graph Nodes
// One node per step of the adaptive retrieval loop

pub mod decide;
pub mod generate;
pub mod grade_documents;
pub mod grade_generation;
pub mod retrieve;
pub mod router;
pub mod transform_query;
pub mod web_search;

pub use decide::{decide_to_generate, DecideNode};
pub use generate::GenerateNode;
pub use grade_documents::GradeDocumentsNode;
pub use grade_generation::GradeGenerationNode;
pub use retrieve::RetrieveNode;
pub use router::RouterNode;
pub use transform_query::TransformQueryNode;
pub use web_search::WebSearchNode;
