//! Pathogen class lookup through an OpenAI-compatible chat endpoint.
//!
//! The model is offered one tool, `get_InfectiousAgentClass`, which returns
//! the UniProt lineage of a pathogen name. At most one tool round trip is
//! made; the final message content is parsed as a [`PathogenClass`].

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::domain::PathogenClass;
use crate::error::PathogenError;
use crate::uniprot::TaxonomyClient;

pub const DEFAULT_ORACLE_BASE: &str = "http://lambda5.cels.anl.gov:44497/v1";
pub const DEFAULT_ORACLE_MODEL: &str = "gpt-4.1";
pub const LINEAGE_TOOL: &str = "get_InfectiousAgentClass";

const SYSTEM_PROMPT: &str = "You are a biomedical AI assistant. \
You are given a pathogen name and can use the available tool to infer its type. \
Respond with one of the following only: \
Virus, Fungus, Helminth, Bacteria, Prion, or Protozoa.";

pub trait PathogenClassifier: Send + Sync {
    fn classify(&self, pathogen_name: &str) -> Result<PathogenClass, PathogenError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum OracleStep {
    Answer(String),
    ToolCall {
        id: String,
        name: String,
        pathogen_name: String,
        /// Assistant message to echo back before the tool result.
        message: Value,
    },
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Value],
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'a str>,
}

pub struct ChatClassifier<T> {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    taxonomy: T,
}

impl<T> ChatClassifier<T>
where
    T: TaxonomyClient,
{
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        taxonomy: T,
    ) -> Result<Self, PathogenError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("pathogen-rdf/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| PathogenError::OracleHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|err| PathogenError::OracleHttp(err.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
            taxonomy,
        })
    }

    fn complete(&self, request: &ChatRequest<'_>) -> Result<Value, PathogenError> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!(%url, messages = request.messages.len(), "oracle.complete");
        let mut builder = self.client.post(&url).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        let response = builder
            .send()
            .map_err(|err| PathogenError::OracleHttp(err.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "classification request failed".to_string());
            return Err(PathogenError::OracleStatus { status, message });
        }
        response
            .json()
            .map_err(|err| PathogenError::OracleHttp(err.to_string()))
    }
}

impl<T> PathogenClassifier for ChatClassifier<T>
where
    T: TaxonomyClient,
{
    fn classify(&self, pathogen_name: &str) -> Result<PathogenClass, PathogenError> {
        let mut messages = initial_messages(pathogen_name);
        let response = self.complete(&ChatRequest {
            model: &self.model,
            messages: &messages,
            tools: Some(tool_schema()),
            tool_choice: Some("auto"),
        })?;

        let answer = match next_step(&response)? {
            OracleStep::Answer(content) => content,
            OracleStep::ToolCall {
                id,
                name,
                pathogen_name: query,
                message,
            } => {
                let lineage = self.taxonomy.lineage(&query)?;
                info!(pathogen = %query, ranks = lineage.len(), "oracle.lineage_tool");
                let content = serde_json::to_string(&lineage)
                    .map_err(|err| PathogenError::OracleResponse(err.to_string()))?;
                messages.push(message);
                messages.push(json!({
                    "role": "tool",
                    "tool_call_id": id,
                    "name": name,
                    "content": content,
                }));
                let response = self.complete(&ChatRequest {
                    model: &self.model,
                    messages: &messages,
                    tools: None,
                    tool_choice: None,
                })?;
                match next_step(&response)? {
                    OracleStep::Answer(content) => content,
                    OracleStep::ToolCall { .. } => {
                        return Err(PathogenError::OracleResponse(
                            "second tool call after lineage was provided".to_string(),
                        ));
                    }
                }
            }
        };

        let Ok(class) = answer.parse::<PathogenClass>();
        if !class.is_closed_label() {
            debug!(answer = %answer, "oracle.free_text");
        }
        Ok(class)
    }
}

pub fn initial_messages(pathogen_name: &str) -> Vec<Value> {
    vec![
        json!({ "role": "system", "content": SYSTEM_PROMPT }),
        json!({ "role": "user", "content": pathogen_name }),
    ]
}

pub fn tool_schema() -> Value {
    json!([{
        "type": "function",
        "function": {
            "name": LINEAGE_TOOL,
            "description": "Fetches pathogen lineage from UniProt.",
            "parameters": {
                "type": "object",
                "properties": {
                    "pathogen_name": {
                        "type": "string",
                        "description": "The name of the pathogen (e.g., 'mpox')."
                    }
                },
                "required": ["pathogen_name"]
            }
        }
    }])
}

/// Reads `choices[0].message` of a chat completion.
pub fn next_step(response: &Value) -> Result<OracleStep, PathogenError> {
    let message = response
        .get("choices")
        .and_then(|v| v.as_array())
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .ok_or_else(|| PathogenError::OracleResponse("missing choices[0].message".to_string()))?;

    let first_call = message
        .get("tool_calls")
        .and_then(|v| v.as_array())
        .and_then(|calls| calls.first());
    if let Some(call) = first_call {
        let id = call
            .get("id")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let function = call
            .get("function")
            .ok_or_else(|| PathogenError::OracleResponse("tool call without function".to_string()))?;
        let name = function
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or(LINEAGE_TOOL)
            .to_string();
        if name != LINEAGE_TOOL {
            return Err(PathogenError::OracleResponse(format!("unknown tool `{name}`")));
        }
        let arguments: Value = match function.get("arguments") {
            Some(Value::String(text)) => serde_json::from_str(text)
                .map_err(|err| PathogenError::OracleResponse(format!("tool arguments: {err}")))?,
            Some(other) => other.clone(),
            None => Value::Null,
        };
        let pathogen_name = arguments
            .get("pathogen_name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                PathogenError::OracleResponse("tool call without pathogen_name".to_string())
            })?
            .to_string();
        return Ok(OracleStep::ToolCall {
            id,
            name,
            pathogen_name,
            message: message.clone(),
        });
    }

    message
        .get("content")
        .and_then(|v| v.as_str())
        .map(|content| OracleStep::Answer(content.to_string()))
        .ok_or_else(|| PathogenError::OracleResponse("message has no content".to_string()))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn direct_answer() {
        let response = json!({
            "choices": [{ "message": { "role": "assistant", "content": "Virus" } }]
        });
        assert_eq!(next_step(&response).unwrap(), OracleStep::Answer("Virus".to_string()));
    }

    #[test]
    fn tool_call_with_string_arguments() {
        let response = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {
                            "name": "get_InfectiousAgentClass",
                            "arguments": "{\"pathogen_name\": \"Monkeypox virus\"}"
                        }
                    }]
                }
            }]
        });
        assert_matches!(
            next_step(&response).unwrap(),
            OracleStep::ToolCall { id, pathogen_name, .. }
                if id == "call_1" && pathogen_name == "Monkeypox virus"
        );
    }

    #[test]
    fn unknown_tool_rejected() {
        let response = json!({
            "choices": [{ "message": { "tool_calls": [{
                "id": "x",
                "function": { "name": "rm_rf", "arguments": "{}" }
            }] } }]
        });
        assert_matches!(next_step(&response), Err(PathogenError::OracleResponse(_)));
    }

    #[test]
    fn empty_choices_rejected() {
        assert_matches!(
            next_step(&json!({ "choices": [] })),
            Err(PathogenError::OracleResponse(_))
        );
    }

    #[test]
    fn prompt_lists_closed_labels() {
        let messages = initial_messages("mpox");
        let system = messages[0]["content"].as_str().unwrap();
        for label in PathogenClass::LABELS {
            assert!(system.contains(label));
        }
        assert_eq!(messages[1]["content"], "mpox");
    }
}
