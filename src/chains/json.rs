// Lenient extraction of the JSON object a model was asked to emit

use serde_json::Value;

use crate::core::errors::RagError;
use crate::graph::state::{BinaryJudgment, Datasource, Score};

/// Parse the reply as a JSON object, falling back to the outermost
/// `{ ... }` span so code fences or stray prose around it are tolerated.
pub fn extract_json_object(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(trimmed) {
        return Some(value);
    }
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    match serde_json::from_str::<Value>(&trimmed[start..=end]) {
        Ok(value @ Value::Object(_)) => Some(value),
        _ => None,
    }
}

pub fn parse_binary_judgment(grader: &str, reply: &str) -> Result<BinaryJudgment, RagError> {
    let object = extract_json_object(reply)
        .ok_or_else(|| RagError::malformed(grader, format!("reply is not a JSON object: {}", snippet(reply))))?;
    let raw = object
        .get("score")
        .and_then(Value::as_str)
        .ok_or_else(|| RagError::malformed(grader, format!("missing string 'score' in {}", object)))?;
    let score = Score::parse(raw)
        .ok_or_else(|| RagError::malformed(grader, format!("score must be 'yes' or 'no', got {:?}", raw)))?;
    Ok(BinaryJudgment { score })
}

/// `vectorstore` selects the vector store; any other datasource string
/// falls back to web search.
pub fn parse_datasource(reply: &str) -> Result<Datasource, RagError> {
    let object = extract_json_object(reply).ok_or_else(|| {
        RagError::malformed("question_router", format!("reply is not a JSON object: {}", snippet(reply)))
    })?;
    let raw = object
        .get("datasource")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            RagError::malformed("question_router", format!("missing string 'datasource' in {}", object))
        })?;

    match raw.trim().to_ascii_lowercase().as_str() {
        "vectorstore" => Ok(Datasource::Vectorstore),
        "web_search" => Ok(Datasource::WebSearch),
        other => {
            tracing::warn!("Unrecognized datasource {:?}, routing to web search", other);
            Ok(Datasource::WebSearch)
        }
    }
}

fn snippet(text: &str) -> String {
    const LIMIT: usize = 120;
    match text.char_indices().nth(LIMIT) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
