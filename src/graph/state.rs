// Graph State
// GraphState, steps, routing conditions and judgment types

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A retrieved or web-searched passage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Document {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: Map::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn source(&self) -> Option<&str> {
        self.metadata.get("source").and_then(Value::as_str)
    }
}

/// State threaded by value through every step of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphState {
    pub question: String,
    pub documents: Vec<Document>,
    pub generation: Option<String>,
}

/// Replacement of exactly one field of [`GraphState`].
#[derive(Debug, Clone, PartialEq)]
pub enum StateUpdate {
    Question(String),
    Documents(Vec<Document>),
    Generation(String),
}

impl StateUpdate {
    pub fn field(&self) -> &'static str {
        match self {
            StateUpdate::Question(_) => "question",
            StateUpdate::Documents(_) => "documents",
            StateUpdate::Generation(_) => "generation",
        }
    }
}

impl GraphState {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            documents: Vec::new(),
            generation: None,
        }
    }

    /// Reducer: every field is replaced wholesale, never appended to.
    pub fn apply(mut self, update: StateUpdate) -> Self {
        match update {
            StateUpdate::Question(question) => self.question = question,
            StateUpdate::Documents(documents) => self.documents = documents,
            StateUpdate::Generation(generation) => self.generation = Some(generation),
        }
        self
    }
}

/// Steps of the adaptive RAG state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Route,
    Retrieve,
    WebSearch,
    GradeDocuments,
    Decide,
    Generate,
    GradeGeneration,
    TransformQuery,
    Done,
}

impl Step {
    pub const ALL: [Step; 9] = [
        Step::Route,
        Step::Retrieve,
        Step::WebSearch,
        Step::GradeDocuments,
        Step::Decide,
        Step::Generate,
        Step::GradeGeneration,
        Step::TransformQuery,
        Step::Done,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        let lowered = s.trim().to_lowercase();
        Self::ALL.into_iter().find(|step| step.as_str() == lowered)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Route => "route",
            Step::Retrieve => "retrieve",
            Step::WebSearch => "web_search",
            Step::GradeDocuments => "grade_documents",
            Step::Decide => "decide",
            Step::Generate => "generate",
            Step::GradeGeneration => "grade_generation",
            Step::TransformQuery => "transform_query",
            Step::Done => "done",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Labels produced by branching steps and matched against conditional edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    WebSearch,
    Vectorstore,
    DocumentsRelevant,
    NoRelevantDocuments,
    Useful,
    NotUseful,
    NotSupported,
}

impl Condition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::WebSearch => "web_search",
            Condition::Vectorstore => "vectorstore",
            Condition::DocumentsRelevant => "documents_relevant",
            Condition::NoRelevantDocuments => "no_relevant_documents",
            Condition::Useful => "useful",
            Condition::NotUseful => "not_useful",
            Condition::NotSupported => "not_supported",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the router sends a fresh question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Datasource {
    WebSearch,
    Vectorstore,
}

impl From<Datasource> for Condition {
    fn from(source: Datasource) -> Self {
        match source {
            Datasource::WebSearch => Condition::WebSearch,
            Datasource::Vectorstore => Condition::Vectorstore,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Score {
    Yes,
    No,
}

impl Score {
    /// Accepts `yes`/`no` in any case, surrounding whitespace ignored.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "yes" => Some(Score::Yes),
            "no" => Some(Score::No),
            _ => None,
        }
    }
}

/// Output contract of every grader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryJudgment {
    pub score: Score,
}

impl BinaryJudgment {
    pub fn yes() -> Self {
        Self { score: Score::Yes }
    }

    pub fn no() -> Self {
        Self { score: Score::No }
    }

    pub fn is_yes(&self) -> bool {
        self.score == Score::Yes
    }
}
