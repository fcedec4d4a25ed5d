use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tripweave_core::{RawPayload, ToolCall};

#[derive(Debug, Clone, Error)]
#[error("tool call '{operation}' failed: {message}")]
pub struct TransportError {
    pub operation: String,
    pub message: String,
}

impl TransportError {
    pub fn new(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

/// Blocking invocation of a provider operation. Implementations are shared
/// across requests and must not keep per-request state.
pub trait ToolChannel: Send + Sync {
    fn call(&self, call: &ToolCall) -> Result<RawPayload, TransportError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ScriptedResponse {
    operation: String,
    /// Every pair must equal the call's argument for the entry to apply.
    #[serde(default)]
    when: Map<String, Value>,
    #[serde(default)]
    payload: Option<RawPayload>,
    #[serde(default)]
    error: Option<String>,
}

impl ScriptedResponse {
    fn matches(&self, call: &ToolCall) -> bool {
        self.operation == call.operation
            && self
                .when
                .iter()
                .all(|(key, expected)| call.arguments.get(key) == Some(expected))
    }
}

#[derive(Debug, Deserialize)]
struct FixtureFile {
    responses: Vec<ScriptedResponse>,
}

/// Answers tool calls from scripted responses and records every call.
///
/// When several entries match, the one with the most `when` conditions wins,
/// so a generic answer can sit next to per-id overrides.
#[derive(Clone, Default)]
pub struct ReplayChannel {
    responses: Arc<RwLock<Vec<ScriptedResponse>>>,
    calls: Arc<Mutex<Vec<ToolCall>>>,
}

impl ReplayChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let fixture: FixtureFile =
            serde_json::from_str(raw).context("invalid replay fixture document")?;
        let channel = Self::new();
        channel.responses.write().extend(fixture.responses);
        Ok(channel)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed reading replay fixture: {}", path.display()))?;
        Self::from_json_str(&raw)
            .with_context(|| format!("failed loading replay fixture: {}", path.display()))
    }

    pub fn respond(&self, operation: &str, payload: impl Into<RawPayload>) {
        self.push(operation, Map::new(), Some(payload.into()), None);
    }

    pub fn respond_when(
        &self,
        operation: &str,
        key: &str,
        value: impl Into<Value>,
        payload: impl Into<RawPayload>,
    ) {
        let mut when = Map::new();
        when.insert(key.to_string(), value.into());
        self.push(operation, when, Some(payload.into()), None);
    }

    pub fn fail(&self, operation: &str, message: &str) {
        self.push(operation, Map::new(), None, Some(message.to_string()));
    }

    pub fn calls(&self) -> Vec<ToolCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.operation == operation)
            .count()
    }

    fn push(
        &self,
        operation: &str,
        when: Map<String, Value>,
        payload: Option<RawPayload>,
        error: Option<String>,
    ) {
        self.responses.write().push(ScriptedResponse {
            operation: operation.to_string(),
            when,
            payload,
            error,
        });
    }
}

impl ToolChannel for ReplayChannel {
    fn call(&self, call: &ToolCall) -> Result<RawPayload, TransportError> {
        self.calls.lock().push(call.clone());

        let responses = self.responses.read();
        let scripted = responses
            .iter()
            .filter(|response| response.matches(call))
            .max_by_key(|response| response.when.len())
            .ok_or_else(|| TransportError::new(&call.operation, "no scripted response"))?;

        if let Some(message) = &scripted.error {
            return Err(TransportError::new(&call.operation, message.clone()));
        }

        Ok(scripted
            .payload
            .clone()
            .unwrap_or(RawPayload::Value(Value::Null)))
    }
}
