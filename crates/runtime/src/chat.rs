//! The external model client
//!
//! The interpreter talks to the model through the [`ModelClient`] trait:
//! plain completion for generative literals and `chat`, schema-constrained
//! completion for casts and `semantic_fuzzy_eq`. The production
//! implementation speaks an OpenAI-compatible chat-completions API over
//! HTTP; tests use [`ScriptedClient`] with canned replies.
//!
//! The interpreter never retries: an upstream failure or an unparseable
//! reply surfaces as a model error.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use aua_core::{AuaError, Result};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

/// Default request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

pub trait ModelClient {
    /// Plain completion: send a prompt, get text back.
    fn ask(&self, prompt: &str) -> Result<String>;

    /// Schema-constrained completion. `schema` is `{name, schema}`; the
    /// returned string must be JSON matching the schema.
    fn ask_with_schema(&self, prompt: &str, schema: &serde_json::Value) -> Result<String>;
}

impl<T: ModelClient + ?Sized> ModelClient for Rc<T> {
    fn ask(&self, prompt: &str) -> Result<String> {
        (**self).ask(prompt)
    }

    fn ask_with_schema(&self, prompt: &str, schema: &serde_json::Value) -> Result<String> {
        (**self).ask_with_schema(prompt, schema)
    }
}

/// Connection settings for the HTTP client. Resolution order: environment
/// variables, then `$XDG_CONFIG_HOME/aua/config.toml` (or
/// `~/.config/aua/config.toml`), then defaults pointing at a local
/// OpenAI-compatible endpoint.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    model_url: Option<String>,
    model: Option<String>,
    api_key: Option<String>,
    timeout_secs: Option<u64>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            base_url: "http://localhost:11434/v1".to_string(),
            model: "llama3.2".to_string(),
            api_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ModelConfig {
    pub fn from_env() -> Result<Self> {
        let file = load_file_config()?;
        let defaults = ModelConfig::default();
        let base_url = std::env::var("AUA_MODEL_URL")
            .ok()
            .or(file.model_url)
            .unwrap_or(defaults.base_url);
        let model = std::env::var("AUA_MODEL")
            .ok()
            .or(file.model)
            .unwrap_or(defaults.model);
        let api_key = std::env::var("AUA_API_KEY").ok().or(file.api_key);
        let timeout_secs = match std::env::var("AUA_MODEL_TIMEOUT_SECS") {
            Ok(raw) => raw.parse().map_err(|_| {
                AuaError::Io(format!("invalid AUA_MODEL_TIMEOUT_SECS value '{}'", raw))
            })?,
            Err(_) => file.timeout_secs.unwrap_or(defaults.timeout_secs),
        };
        Ok(ModelConfig {
            base_url,
            model,
            api_key,
            timeout_secs,
        })
    }
}

/// `$XDG_CONFIG_HOME/aua/config.toml`, falling back to `~/.config/aua/`.
fn config_path() -> Option<PathBuf> {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        let path = PathBuf::from(xdg);
        if path.is_absolute() {
            return Some(path.join("aua").join("config.toml"));
        }
    }
    if let Ok(home) = std::env::var("HOME") {
        return Some(
            PathBuf::from(home)
                .join(".config")
                .join("aua")
                .join("config.toml"),
        );
    }
    None
}

fn load_file_config() -> Result<FileConfig> {
    let Some(path) = config_path() else {
        return Ok(FileConfig::default());
    };
    let Ok(text) = std::fs::read_to_string(&path) else {
        return Ok(FileConfig::default());
    };
    toml::from_str(&text)
        .map_err(|e| AuaError::Io(format!("malformed config file {}: {}", path.display(), e)))
}

/// OpenAI-compatible chat-completions client.
pub struct HttpModelClient {
    agent: ureq::Agent,
    config: ModelConfig,
}

impl HttpModelClient {
    pub fn new(config: ModelConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build();
        HttpModelClient { agent, config }
    }

    pub fn from_env() -> Result<Self> {
        Ok(HttpModelClient::new(ModelConfig::from_env()?))
    }

    fn complete(&self, body: serde_json::Value) -> Result<String> {
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let mut request = self
            .agent
            .post(&url)
            .set("Content-Type", "application/json");
        if let Some(key) = &self.config.api_key {
            request = request.set("Authorization", &format!("Bearer {}", key));
        }
        let response = match request.send_string(&body.to_string()) {
            Ok(response) => response,
            Err(ureq::Error::Status(code, response)) => {
                let detail = response.into_string().unwrap_or_default();
                return Err(AuaError::Model(format!(
                    "model endpoint returned HTTP {}: {}",
                    code, detail
                )));
            }
            Err(e) => {
                return Err(AuaError::Model(format!(
                    "request to model endpoint failed: {}",
                    e
                )));
            }
        };
        let text = response
            .into_string()
            .map_err(|e| AuaError::Model(format!("failed to read model response: {}", e)))?;
        let parsed: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| AuaError::Model(format!("model response is not JSON: {}", e)))?;
        parsed["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| {
                AuaError::Model("model response carries no message content".to_string())
            })
    }
}

impl ModelClient for HttpModelClient {
    fn ask(&self, prompt: &str) -> Result<String> {
        debug!(chars = prompt.len(), "model ask");
        self.complete(json!({
            "model": self.config.model,
            "messages": [{"role": "user", "content": prompt}],
        }))
    }

    fn ask_with_schema(&self, prompt: &str, schema: &serde_json::Value) -> Result<String> {
        debug!(
            chars = prompt.len(),
            schema = %schema["name"],
            "model ask with schema"
        );
        self.complete(json!({
            "model": self.config.model,
            "messages": [{"role": "user", "content": prompt}],
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": schema["name"],
                    "schema": schema["schema"],
                    "strict": true,
                },
            },
        }))
    }
}

/// Test double: replies come from a queue, and every interaction is
/// recorded so tests can assert on invocation counts, prompts, and the
/// schemas the interpreter derived.
#[derive(Default)]
pub struct ScriptedClient {
    replies: RefCell<VecDeque<String>>,
    invocations: Cell<usize>,
    prompts: RefCell<Vec<String>>,
    schemas: RefCell<Vec<serde_json::Value>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        ScriptedClient::default()
    }

    pub fn with_replies(replies: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let client = ScriptedClient::new();
        for reply in replies {
            client.push_reply(reply);
        }
        client
    }

    pub fn push_reply(&self, reply: impl Into<String>) {
        self.replies.borrow_mut().push_back(reply.into());
    }

    /// Total model invocations, plain and schema-constrained.
    pub fn invocations(&self) -> usize {
        self.invocations.get()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.borrow().clone()
    }

    /// The `{name, schema}` objects handed to schema-constrained calls.
    pub fn schemas(&self) -> Vec<serde_json::Value> {
        self.schemas.borrow().clone()
    }

    fn pop_reply(&self) -> Result<String> {
        self.replies
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| AuaError::Model("scripted client has no reply queued".to_string()))
    }
}

impl ModelClient for ScriptedClient {
    fn ask(&self, prompt: &str) -> Result<String> {
        self.invocations.set(self.invocations.get() + 1);
        self.prompts.borrow_mut().push(prompt.to_string());
        self.pop_reply()
    }

    fn ask_with_schema(&self, prompt: &str, schema: &serde_json::Value) -> Result<String> {
        self.invocations.set(self.invocations.get() + 1);
        self.prompts.borrow_mut().push(prompt.to_string());
        self.schemas.borrow_mut().push(schema.clone());
        self.pop_reply()
    }
}
