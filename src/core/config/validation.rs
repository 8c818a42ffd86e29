use serde_json::{Map, Value};

use crate::core::errors::RagError;
use crate::graph::state::Step;

const LLM_PROVIDERS: [&str; 4] = ["ollama", "lmstudio", "llama_cpp", "openai_compat"];
const SEARCH_PROVIDERS: [&str; 3] = ["duckduckgo", "brave", "tavily"];

pub fn validate_config(config: &Value) -> Result<(), RagError> {
    let root = config
        .as_object()
        .ok_or_else(|| config_type_error("root", "object"))?;

    if let Some(app) = expect_optional_object(root, "app")? {
        validate_u64_field(
            app,
            "app.max_input_length",
            "max_input_length",
            1,
            10_000_000,
        )?;
    }

    if let Some(server) = expect_optional_object(root, "server")? {
        validate_optional_string_field(server, "server.host", "host")?;
        validate_u64_field(server, "server.port", "port", 0, 65535)?;
        validate_string_array_field(
            server,
            "server.cors_allowed_origins",
            "cors_allowed_origins",
        )?;
    }

    if let Some(llm) = expect_optional_object(root, "llm")? {
        validate_choice_field(llm, "llm.provider", "provider", &LLM_PROVIDERS)?;
        validate_optional_string_field(llm, "llm.base_url", "base_url")?;
        validate_optional_string_field(llm, "llm.api_key", "api_key")?;
        validate_optional_string_field(llm, "llm.chat_model", "chat_model")?;
        validate_optional_string_field(llm, "llm.embedding_model", "embedding_model")?;
        validate_f64_field(llm, "llm.temperature", "temperature", 0.0, 2.0)?;
        validate_f64_field(llm, "llm.top_p", "top_p", 0.0, 1.0)?;
        validate_u64_field(llm, "llm.max_tokens", "max_tokens", 1, 1_000_000)?;
        validate_u64_field(llm, "llm.timeout_secs", "timeout_secs", 1, 86_400)?;
    }

    if let Some(retrieval) = expect_optional_object(root, "retrieval")? {
        validate_u64_field(retrieval, "retrieval.top_k", "top_k", 1, 100)?;
        validate_u64_field(
            retrieval,
            "retrieval.chunk_size",
            "chunk_size",
            1,
            1_000_000,
        )?;
        validate_u64_field(
            retrieval,
            "retrieval.chunk_overlap",
            "chunk_overlap",
            0,
            1_000_000,
        )?;
        validate_u64_field(
            retrieval,
            "retrieval.embed_batch_size",
            "embed_batch_size",
            1,
            4096,
        )?;
        validate_string_array_field(retrieval, "retrieval.source_dirs", "source_dirs")?;
        validate_string_array_field(retrieval, "retrieval.extensions", "extensions")?;
        validate_bool_field(retrieval, "retrieval.ingest_on_startup", "ingest_on_startup")?;

        let chunk_size = retrieval.get("chunk_size").and_then(Value::as_u64);
        let chunk_overlap = retrieval.get("chunk_overlap").and_then(Value::as_u64);
        if let (Some(size), Some(overlap)) = (chunk_size, chunk_overlap) {
            if overlap >= size {
                return Err(RagError::Config(format!(
                    "Invalid config at 'retrieval.chunk_overlap': must be smaller than chunk_size ({})",
                    size
                )));
            }
        }
    }

    if let Some(grading) = expect_optional_object(root, "grading")? {
        validate_u64_field(grading, "grading.concurrency", "concurrency", 1, 64)?;
    }

    if let Some(graph) = expect_optional_object(root, "graph")? {
        validate_u64_field(graph, "graph.max_steps", "max_steps", 1, 10_000)?;
        validate_string_array_field(graph, "graph.interrupt_before", "interrupt_before")?;
        if let Some(items) = graph.get("interrupt_before").and_then(Value::as_array) {
            for (index, item) in items.iter().enumerate() {
                let name = item.as_str().unwrap_or_default();
                match Step::parse(name) {
                    Some(Step::Done) | None => {
                        return Err(RagError::Config(format!(
                            "Invalid config at 'graph.interrupt_before[{}]': unknown step '{}'",
                            index, name
                        )));
                    }
                    Some(_) => {}
                }
            }
        }
    }

    if let Some(search) = expect_optional_object(root, "search")? {
        validate_choice_field(search, "search.provider", "provider", &SEARCH_PROVIDERS)?;
        validate_optional_string_field(search, "search.api_key", "api_key")?;
        validate_u64_field(search, "search.max_results", "max_results", 1, 50)?;
        validate_u64_field(search, "search.timeout_secs", "timeout_secs", 1, 600)?;
    }

    Ok(())
}

fn expect_optional_object<'a>(
    root: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a Map<String, Value>>, RagError> {
    match root.get(key) {
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(Value::Null) | None => Ok(None),
        Some(_) => Err(config_type_error(key, "object")),
    }
}

fn validate_bool_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), RagError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.as_bool().is_some() {
        return Ok(());
    }
    Err(config_type_error(path, "boolean"))
}

fn validate_u64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: u64,
    max: u64,
) -> Result<(), RagError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.is_null() {
        return Ok(());
    }
    let Some(number) = value.as_u64() else {
        return Err(config_type_error(path, "integer"));
    };
    if number < min || number > max {
        return Err(out_of_range(path, min, max));
    }
    Ok(())
}

fn validate_f64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: f64,
    max: f64,
) -> Result<(), RagError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.is_null() {
        return Ok(());
    }
    let Some(number) = value.as_f64() else {
        return Err(config_type_error(path, "number"));
    };
    if number < min || number > max {
        return Err(out_of_range(path, min, max));
    }
    Ok(())
}

fn validate_optional_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), RagError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.is_null() || value.as_str().is_some() {
        return Ok(());
    }
    Err(config_type_error(path, "string"))
}

fn validate_choice_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    choices: &[&str],
) -> Result<(), RagError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(text) = value.as_str() else {
        return Err(config_type_error(path, "string"));
    };
    if choices.contains(&text) {
        return Ok(());
    }
    Err(RagError::Config(format!(
        "Invalid config at '{}': expected one of {}",
        path,
        choices.join(", ")
    )))
}

fn validate_string_array_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), RagError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(items) = value.as_array() else {
        return Err(config_type_error(path, "array of strings"));
    };
    for (index, item) in items.iter().enumerate() {
        let Some(text) = item.as_str() else {
            return Err(config_type_error(&format!("{}[{}]", path, index), "string"));
        };
        if text.trim().is_empty() {
            return Err(RagError::Config(format!(
                "Invalid config at '{}[{}]': value cannot be empty",
                path, index
            )));
        }
    }
    Ok(())
}

fn out_of_range<T: std::fmt::Display>(path: &str, min: T, max: T) -> RagError {
    RagError::Config(format!(
        "Invalid config at '{}': must be between {} and {}",
        path, min, max
    ))
}

fn config_type_error(path: &str, expected: &str) -> RagError {
    RagError::Config(format!(
        "Invalid config at '{}': expected {}",
        path, expected
    ))
}
