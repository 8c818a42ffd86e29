// Scripted collaborators for unit tests

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::collaborators::{
    vars, Collaborators, GenerationModel, JudgmentModel, PromptVars, Retriever, RewriteModel,
    RoutingModel, WebSearch,
};
use crate::core::errors::RagError;
use crate::graph::state::{BinaryJudgment, Datasource, Document, Score};
use crate::llm::{ChatRequest, LlmProvider};

pub fn docs(contents: &[&str]) -> Vec<Document> {
    contents.iter().map(|c| Document::new(*c)).collect()
}

pub struct ScriptedRouter {
    datasource: Option<Datasource>,
    pub calls: Mutex<Vec<String>>,
}

#[async_trait]
impl RoutingModel for ScriptedRouter {
    async fn route(&self, question: &str) -> Result<Datasource, RagError> {
        self.calls.lock().unwrap().push(question.to_string());
        self.datasource
            .ok_or_else(|| RagError::malformed("question_router", "missing datasource"))
    }
}

/// Returns queued batches in order, repeating the last one when exhausted.
pub struct ScriptedRetriever {
    batches: Mutex<VecDeque<Vec<Document>>>,
    last: Mutex<Vec<Document>>,
    fail: bool,
    pub calls: Mutex<Vec<String>>,
}

#[async_trait]
impl Retriever for ScriptedRetriever {
    async fn retrieve(&self, question: &str) -> Result<Vec<Document>, RagError> {
        self.calls.lock().unwrap().push(question.to_string());
        if self.fail {
            return Err(RagError::collaborator("retriever", "index unavailable"));
        }
        let mut last = self.last.lock().unwrap();
        if let Some(batch) = self.batches.lock().unwrap().pop_front() {
            *last = batch;
        }
        Ok(last.clone())
    }
}

pub struct ScriptedWebSearch {
    blob: String,
    pub calls: Mutex<Vec<String>>,
}

#[async_trait]
impl WebSearch for ScriptedWebSearch {
    async fn search(&self, question: &str) -> Result<String, RagError> {
        self.calls.lock().unwrap().push(question.to_string());
        Ok(self.blob.clone())
    }
}

/// Judges by document content when a verdict is registered for it, else
/// pops the next queued score, else falls back to the default. A `None`
/// score simulates a malformed payload.
pub struct ScriptedJudge {
    name: &'static str,
    by_content: HashMap<String, Option<Score>>,
    queue: Mutex<VecDeque<Option<Score>>>,
    default: Option<Score>,
    pub calls: Mutex<Vec<PromptVars>>,
}

impl ScriptedJudge {
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl JudgmentModel for ScriptedJudge {
    async fn classify(&self, prompt_vars: &PromptVars) -> Result<BinaryJudgment, RagError> {
        self.calls.lock().unwrap().push(prompt_vars.clone());
        let by_content = prompt_vars
            .get(vars::CONTENT)
            .and_then(|content| self.by_content.get(content))
            .copied();
        let score = match by_content {
            Some(score) => score,
            None => self
                .queue
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(self.default),
        };
        score
            .map(|score| BinaryJudgment { score })
            .ok_or_else(|| RagError::malformed(self.name, "score is missing"))
    }
}

pub struct ScriptedGenerator {
    outputs: Mutex<VecDeque<String>>,
    pub calls: Mutex<Vec<PromptVars>>,
}

#[async_trait]
impl GenerationModel for ScriptedGenerator {
    async fn generate(&self, prompt_vars: &PromptVars) -> Result<String, RagError> {
        self.calls.lock().unwrap().push(prompt_vars.clone());
        let mut outputs = self.outputs.lock().unwrap();
        let output = if outputs.len() > 1 {
            outputs.pop_front()
        } else {
            outputs.front().cloned()
        };
        Ok(output.unwrap_or_else(|| "generated answer".to_string()))
    }
}

pub struct ScriptedRewriter {
    pub calls: Mutex<Vec<String>>,
}

#[async_trait]
impl RewriteModel for ScriptedRewriter {
    async fn rewrite(&self, question: &str) -> Result<String, RagError> {
        self.calls.lock().unwrap().push(question.to_string());
        Ok(format!("{} (rewritten)", question))
    }
}

/// Builder for a [`Collaborators`] bundle made of scripted fakes.
pub struct ScriptedServices {
    pub router: Arc<ScriptedRouter>,
    pub retriever: Arc<ScriptedRetriever>,
    pub web_search: Arc<ScriptedWebSearch>,
    pub relevance: Arc<ScriptedJudge>,
    pub hallucination: Arc<ScriptedJudge>,
    pub answer: Arc<ScriptedJudge>,
    pub generator: Arc<ScriptedGenerator>,
    pub rewriter: Arc<ScriptedRewriter>,
}

fn judge(name: &'static str) -> ScriptedJudge {
    ScriptedJudge {
        name,
        by_content: HashMap::new(),
        queue: Mutex::new(VecDeque::new()),
        default: Some(Score::Yes),
        calls: Mutex::new(Vec::new()),
    }
}

impl ScriptedServices {
    pub fn new() -> Self {
        Self {
            router: Arc::new(ScriptedRouter {
                datasource: Some(Datasource::Vectorstore),
                calls: Mutex::new(Vec::new()),
            }),
            retriever: Arc::new(ScriptedRetriever {
                batches: Mutex::new(VecDeque::new()),
                last: Mutex::new(Vec::new()),
                fail: false,
                calls: Mutex::new(Vec::new()),
            }),
            web_search: Arc::new(ScriptedWebSearch {
                blob: "[]".to_string(),
                calls: Mutex::new(Vec::new()),
            }),
            relevance: Arc::new(judge("relevance_grader")),
            hallucination: Arc::new(judge("hallucination_grader")),
            answer: Arc::new(judge("answer_grader")),
            generator: Arc::new(ScriptedGenerator {
                outputs: Mutex::new(VecDeque::new()),
                calls: Mutex::new(Vec::new()),
            }),
            rewriter: Arc::new(ScriptedRewriter {
                calls: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn route(mut self, datasource: Option<Datasource>) -> Self {
        self.router = Arc::new(ScriptedRouter {
            datasource,
            calls: Mutex::new(Vec::new()),
        });
        self
    }

    pub fn retrieve(mut self, batches: Vec<Vec<Document>>) -> Self {
        self.retriever = Arc::new(ScriptedRetriever {
            batches: Mutex::new(batches.into()),
            last: Mutex::new(Vec::new()),
            fail: false,
            calls: Mutex::new(Vec::new()),
        });
        self
    }

    pub fn failing_retriever(mut self) -> Self {
        self.retriever = Arc::new(ScriptedRetriever {
            batches: Mutex::new(VecDeque::new()),
            last: Mutex::new(Vec::new()),
            fail: true,
            calls: Mutex::new(Vec::new()),
        });
        self
    }

    pub fn web_results(mut self, blob: &str) -> Self {
        self.web_search = Arc::new(ScriptedWebSearch {
            blob: blob.to_string(),
            calls: Mutex::new(Vec::new()),
        });
        self
    }

    pub fn relevance_by_content(mut self, verdicts: &[(&str, Option<Score>)]) -> Self {
        let mut relevance = judge("relevance_grader");
        relevance.by_content = verdicts
            .iter()
            .map(|(content, score)| (content.to_string(), *score))
            .collect();
        self.relevance = Arc::new(relevance);
        self
    }

    pub fn relevance_default(mut self, score: Option<Score>) -> Self {
        let mut relevance = judge("relevance_grader");
        relevance.default = score;
        self.relevance = Arc::new(relevance);
        self
    }

    pub fn hallucination(mut self, scores: &[Option<Score>]) -> Self {
        self.hallucination = Arc::new(queued_judge("hallucination_grader", scores));
        self
    }

    pub fn answer(mut self, scores: &[Option<Score>]) -> Self {
        self.answer = Arc::new(queued_judge("answer_grader", scores));
        self
    }

    pub fn generations(mut self, outputs: &[&str]) -> Self {
        self.generator = Arc::new(ScriptedGenerator {
            outputs: Mutex::new(outputs.iter().map(|s| s.to_string()).collect()),
            calls: Mutex::new(Vec::new()),
        });
        self
    }

    pub fn build(&self) -> Collaborators {
        Collaborators {
            router: self.router.clone(),
            retriever: self.retriever.clone(),
            web_search: self.web_search.clone(),
            relevance_grader: self.relevance.clone(),
            hallucination_grader: self.hallucination.clone(),
            answer_grader: self.answer.clone(),
            generator: self.generator.clone(),
            rewriter: self.rewriter.clone(),
        }
    }
}

fn queued_judge(name: &'static str, scores: &[Option<Score>]) -> ScriptedJudge {
    let mut judge = judge(name);
    judge.queue = Mutex::new(scores.iter().copied().collect());
    judge
}

/// LLM provider that replays canned chat replies and embeds text as
/// keyword counts over a fixed vocabulary.
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<String>>,
    vocabulary: Vec<String>,
    offline: bool,
    pub requests: Mutex<Vec<ChatRequest>>,
    pub embedded: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn replying(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            vocabulary: Vec::new(),
            offline: false,
            requests: Mutex::new(Vec::new()),
            embedded: Mutex::new(Vec::new()),
        }
    }

    pub fn embedding(vocabulary: &[&str]) -> Self {
        let mut provider = Self::replying(&[]);
        provider.vocabulary = vocabulary.iter().map(|w| w.to_string()).collect();
        provider
    }

    /// Every embed call fails, as when the model server is down.
    pub fn offline() -> Self {
        let mut provider = Self::replying(&[]);
        provider.offline = true;
        provider
    }

    pub fn last_prompt(&self) -> String {
        self.requests
            .lock()
            .unwrap()
            .last()
            .map(|r| {
                r.messages
                    .iter()
                    .map(|m| m.content.as_str())
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn health_check(&self) -> Result<bool, RagError> {
        Ok(true)
    }

    async fn chat(&self, request: ChatRequest, _model_id: &str) -> Result<String, RagError> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| RagError::collaborator("scripted", "no reply queued"))
    }

    async fn embed(&self, inputs: &[String], _model_id: &str) -> Result<Vec<Vec<f32>>, RagError> {
        if self.offline {
            return Err(RagError::collaborator("scripted", "connection refused"));
        }
        self.embedded.lock().unwrap().extend(inputs.iter().cloned());
        Ok(inputs
            .iter()
            .map(|text| {
                let lowered = text.to_lowercase();
                self.vocabulary
                    .iter()
                    .map(|word| lowered.matches(word.as_str()).count() as f32)
                    .collect()
            })
            .collect())
    }
}
