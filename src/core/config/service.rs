use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};

use super::paths::AppPaths;
use super::settings::{default_config, Settings};
use super::validation::validate_config;
use crate::core::errors::RagError;

const REDACT_PLACEHOLDER: &str = "****";

const SENSITIVE_PATTERNS: [&str; 8] = [
    "api_key",
    "secret",
    "password",
    "_token",
    "token_",
    "credential",
    "private_key",
    "bearer",
];

const SENSITIVE_WHITELIST: [&str; 3] = ["max_tokens", "token_count", "tokens"];

/// Layered configuration: built-in defaults, then `config.yml`, then
/// `secrets.yaml`, then environment overrides.
#[derive(Clone)]
pub struct ConfigService {
    paths: Arc<AppPaths>,
}

impl ConfigService {
    pub fn new(paths: Arc<AppPaths>) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &AppPaths {
        &self.paths
    }

    pub fn config_path(&self) -> PathBuf {
        if let Ok(path) = env::var("ADAPTIVE_RAG_CONFIG_PATH") {
            return PathBuf::from(path);
        }

        let user_config = self.paths.user_data_dir.join("config.yml");
        if user_config.exists() {
            return user_config;
        }

        self.paths.project_root.join("config.yml")
    }

    pub fn secrets_path(&self) -> PathBuf {
        self.paths.secrets_path.clone()
    }

    pub fn load_config(&self) -> Result<Value, RagError> {
        let public_config = load_yaml_file(&self.config_path())?;
        let secrets_config = load_yaml_file(&self.secrets_path())?;
        let merged = deep_merge(&default_config(), &public_config);
        let mut merged = deep_merge(&merged, &secrets_config);
        apply_env_overrides(&mut merged);
        validate_config(&merged)?;
        Ok(merged)
    }

    pub fn load_settings(&self) -> Result<Settings, RagError> {
        let config = self.load_config()?;
        Settings::from_value(&config)
    }

    pub fn redact_sensitive_values(&self, value: &Value) -> Value {
        redact_sensitive_values(value)
    }
}

fn load_yaml_file(path: &Path) -> Result<Value, RagError> {
    if !path.exists() {
        return Ok(Value::Object(Map::new()));
    }

    let contents = fs::read_to_string(path)
        .map_err(|e| RagError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
    if contents.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }

    let value = serde_yaml::from_str::<Value>(&contents)
        .map_err(|e| RagError::Config(format!("Failed to parse {}: {}", path.display(), e)))?;
    match value {
        Value::Object(_) => Ok(value),
        Value::Null => Ok(Value::Object(Map::new())),
        _ => Err(RagError::Config(format!(
            "{} must contain a mapping at the top level",
            path.display()
        ))),
    }
}

fn apply_env_overrides(config: &mut Value) {
    let Some(port) = env::var("PORT").ok().and_then(|v| v.parse::<u16>().ok()) else {
        return;
    };
    if let Some(root) = config.as_object_mut() {
        let server = root
            .entry("server".to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Some(server) = server.as_object_mut() {
            server.insert("port".to_string(), Value::from(port));
        }
    }
}

fn deep_merge(base: &Value, override_value: &Value) -> Value {
    match (base, override_value) {
        (Value::Object(base_map), Value::Object(override_map)) => {
            let mut merged: Map<String, Value> = base_map.clone();
            for (key, value) in override_map {
                let merged_value = match merged.get(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), merged_value);
            }
            Value::Object(merged)
        }
        _ => override_value.clone(),
    }
}

fn redact_sensitive_values(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut redacted = Map::new();
            for (key, val) in map {
                if is_sensitive_key(key) && !val.is_null() {
                    redacted.insert(key.clone(), Value::String(REDACT_PLACEHOLDER.to_string()));
                } else {
                    redacted.insert(key.clone(), redact_sensitive_values(val));
                }
            }
            Value::Object(redacted)
        }
        Value::Array(items) => Value::Array(items.iter().map(redact_sensitive_values).collect()),
        _ => value.clone(),
    }
}

fn is_sensitive_key(key: &str) -> bool {
    let key_lower = key.to_lowercase();
    if SENSITIVE_WHITELIST
        .iter()
        .any(|allowed| *allowed == key_lower)
    {
        return false;
    }
    SENSITIVE_PATTERNS
        .iter()
        .any(|pattern| key_lower.contains(pattern))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn service_in(dir: &Path) -> ConfigService {
        let paths = AppPaths::with_dirs(dir.to_path_buf(), dir.join("data"));
        ConfigService::new(Arc::new(paths))
    }

    #[test]
    fn deep_merge_merges_objects_and_overrides_scalars() {
        let base = json!({
            "a": 1,
            "b": { "c": 2, "d": 3 },
            "arr": [1, 2]
        });
        let override_value = json!({
            "b": { "c": 99 },
            "arr": [3],
            "e": "x"
        });

        let merged = deep_merge(&base, &override_value);

        assert_eq!(
            merged,
            json!({
                "a": 1,
                "b": { "c": 99, "d": 3 },
                "arr": [3],
                "e": "x"
            })
        );
    }

    #[test]
    fn redact_sensitive_values_replaces_secrets_only() {
        let input = json!({
            "search": { "api_key": "tvly-123", "max_results": 5 },
            "llm": { "api_key": null, "max_tokens": 42 }
        });

        let redacted = redact_sensitive_values(&input);

        assert_eq!(
            redacted,
            json!({
                "search": { "api_key": "****", "max_results": 5 },
                "llm": { "api_key": null, "max_tokens": 42 }
            })
        );
    }

    #[test]
    fn missing_files_load_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let settings = service_in(tmp.path()).load_settings().unwrap();
        assert_eq!(settings.retrieval.chunk_size, 250);
    }

    #[test]
    fn project_config_and_secrets_are_layered() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(
            tmp.path().join("config.yml"),
            "llm:\n  chat_model: mistral\nsearch:\n  provider: tavily\n",
        )
        .unwrap();
        let service = service_in(tmp.path());
        fs::write(service.secrets_path(), "search:\n  api_key: tvly-secret\n").unwrap();

        let settings = service.load_settings().unwrap();
        assert_eq!(settings.llm.chat_model, "mistral");
        assert_eq!(settings.search.provider, "tavily");
        assert_eq!(settings.search.api_key.as_deref(), Some("tvly-secret"));
    }

    #[test]
    fn invalid_yaml_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("config.yml"), "llm: [unclosed").unwrap();
        let err = service_in(tmp.path()).load_config().unwrap_err();
        assert!(matches!(err, RagError::Config(_)));
    }

    #[test]
    fn invalid_values_fail_validation() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("config.yml"), "graph:\n  max_steps: 0\n").unwrap();
        assert!(service_in(tmp.path()).load_config().is_err());
    }
}
