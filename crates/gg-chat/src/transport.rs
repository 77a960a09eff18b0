use std::collections::VecDeque;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::error::ChatError;

/// Local development proxy (`POST {message, analyzeEmotion}`).
pub const DEFAULT_PROXY_ENDPOINT: &str = "http://localhost:8080/api/chat";
pub const DEFAULT_COMPLETION_BASE_URL: &str = "https://api.deepseek.com";
pub const DEFAULT_COMPLETION_MODEL: &str = "deepseek-chat";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const COMPLETION_MAX_TOKENS: u32 = 150;
const COMPLETION_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub message: String,
    pub system_prompt: String,
    pub analyze_emotion: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransportReply {
    pub reply: String,
    pub emotion_score: Option<f64>,
}

pub trait ChatTransport: Send {
    fn complete(&mut self, request: &ChatRequest) -> Result<TransportReply, ChatError>;

    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChatMode {
    Proxy,
    Completion,
    #[default]
    Offline,
}

#[derive(Debug, Clone, Default)]
pub struct ChatConfig {
    pub mode: ChatMode,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: Option<u64>,
}

pub fn build_transport(config: &ChatConfig) -> Result<Box<dyn ChatTransport>, ChatError> {
    let timeout = Duration::from_secs(config.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));
    match config.mode {
        ChatMode::Offline => Ok(Box::new(OfflineTransport)),
        ChatMode::Proxy => {
            let endpoint = config
                .endpoint
                .clone()
                .unwrap_or_else(|| DEFAULT_PROXY_ENDPOINT.to_string());
            Ok(Box::new(ProxyTransport::new(&endpoint, timeout)))
        }
        ChatMode::Completion => {
            let api_key = config
                .api_key
                .clone()
                .filter(|key| !key.trim().is_empty())
                .ok_or_else(|| {
                    ChatError::Config("completion mode requires an API key".to_string())
                })?;
            let base_url = config
                .endpoint
                .clone()
                .unwrap_or_else(|| DEFAULT_COMPLETION_BASE_URL.to_string());
            let model = config
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_COMPLETION_MODEL.to_string());
            Ok(Box::new(CompletionTransport::new(
                &base_url, &api_key, &model, timeout,
            )))
        }
    }
}

fn build_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Posts to a stateless chat proxy that owns the persona prompt.
pub struct ProxyTransport {
    client: Client,
    endpoint: String,
}

impl ProxyTransport {
    pub fn new(endpoint: &str, timeout: Duration) -> Self {
        Self {
            client: build_client(timeout),
            endpoint: endpoint.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProxyRequest<'a> {
    message: &'a str,
    analyze_emotion: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProxyResponse {
    reply: String,
    #[serde(default)]
    emotion_score: Option<f64>,
}

impl ChatTransport for ProxyTransport {
    fn complete(&mut self, request: &ChatRequest) -> Result<TransportReply, ChatError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&ProxyRequest {
                message: &request.message,
                analyze_emotion: request.analyze_emotion,
            })
            .send()
            .map_err(|e| ChatError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ChatError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: ProxyResponse = response
            .json()
            .map_err(|e| ChatError::InvalidResponse(e.to_string()))?;
        Ok(TransportReply {
            reply: payload.reply,
            emotion_score: payload.emotion_score,
        })
    }

    fn name(&self) -> &'static str {
        "proxy"
    }
}

/// Calls an OpenAI-compatible `/v1/chat/completions` endpoint directly.
pub struct CompletionTransport {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl CompletionTransport {
    pub fn new(base_url: &str, api_key: &str, model: &str, timeout: Duration) -> Self {
        Self {
            client: build_client(timeout),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<CompletionMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct CompletionMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

fn build_messages(request: &ChatRequest) -> Vec<CompletionMessage> {
    vec![
        CompletionMessage {
            role: "system".to_string(),
            content: Some(request.system_prompt.clone()),
        },
        CompletionMessage {
            role: "user".to_string(),
            content: Some(request.message.clone()),
        },
    ]
}

fn convert_response(response: CompletionResponse) -> Result<TransportReply, ChatError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ChatError::InvalidResponse("no choices in completion".to_string()))?;
    Ok(TransportReply {
        reply: choice.message.content.unwrap_or_default(),
        emotion_score: None,
    })
}

impl ChatTransport for CompletionTransport {
    fn complete(&mut self, request: &ChatRequest) -> Result<TransportReply, ChatError> {
        let body = CompletionRequest {
            model: self.model.clone(),
            messages: build_messages(request),
            max_tokens: COMPLETION_MAX_TOKENS,
            temperature: COMPLETION_TEMPERATURE,
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| ChatError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ChatError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: CompletionResponse = response
            .json()
            .map_err(|e| ChatError::InvalidResponse(e.to_string()))?;
        convert_response(payload)
    }

    fn name(&self) -> &'static str {
        "completion"
    }
}

/// Never reaches a network; every message takes the local fallback path.
#[derive(Debug, Default)]
pub struct OfflineTransport;

impl ChatTransport for OfflineTransport {
    fn complete(&mut self, _request: &ChatRequest) -> Result<TransportReply, ChatError> {
        Err(ChatError::Offline)
    }

    fn name(&self) -> &'static str {
        "offline"
    }
}

/// Replays canned replies in order, then behaves like [`OfflineTransport`].
/// Used by replay testcases.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    replies: VecDeque<Option<String>>,
    requests: Vec<ChatRequest>,
}

impl ScriptedTransport {
    /// `None` entries simulate a failed request.
    pub fn new(replies: impl IntoIterator<Item = Option<String>>) -> Self {
        Self {
            replies: replies.into_iter().collect(),
            requests: Vec::new(),
        }
    }

    pub fn requests(&self) -> &[ChatRequest] {
        &self.requests
    }
}

impl ChatTransport for ScriptedTransport {
    fn complete(&mut self, request: &ChatRequest) -> Result<TransportReply, ChatError> {
        self.requests.push(request.clone());
        match self.replies.pop_front() {
            Some(Some(reply)) => Ok(TransportReply {
                reply,
                emotion_score: None,
            }),
            Some(None) => Err(ChatError::RequestFailed("scripted failure".to_string())),
            None => Err(ChatError::Offline),
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
