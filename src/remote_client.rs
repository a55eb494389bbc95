//! Client for the chat-completions endpoint.
//!
//! Every call is single-turn: a fixed system message and one user message
//! built from the task template. No history is kept between calls and
//! nothing is retried; failures go straight back to the caller.

use crate::config::{Credentials, Model};
use crate::error::{AppError, AppResult};
use crate::http_client::HttpClient;
use crate::prompts;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

const KEY_PROBE_TIMEOUT: Duration = Duration::from_secs(5);
const KEY_PROBE_MAX_TOKENS: u32 = 10;

/// Which operation a request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Analyze,
    Generate,
    Explain,
    Refactor,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskKind::Analyze => "analyze",
            TaskKind::Generate => "generate",
            TaskKind::Explain => "explain",
            TaskKind::Refactor => "refactor",
        };
        f.write_str(name)
    }
}

/// Raw reply text tagged with the task that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteReply {
    pub kind: TaskKind,
    pub text: String,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Sends task requests using the session's credentials.
pub struct RemoteClient<'a> {
    http: &'a dyn HttpClient,
    credentials: &'a Credentials,
}

impl<'a> RemoteClient<'a> {
    pub fn new(http: &'a dyn HttpClient, credentials: &'a Credentials) -> Self {
        Self { http, credentials }
    }

    pub async fn analyze(&self, code: &str, language: &str) -> AppResult<RemoteReply> {
        self.run(TaskKind::Analyze, prompts::analyze(code, language)).await
    }

    pub async fn generate(
        &self,
        description: &str,
        language: &str,
        context: Option<&str>,
    ) -> AppResult<RemoteReply> {
        self.run(TaskKind::Generate, prompts::generate(description, language, context))
            .await
    }

    pub async fn explain(&self, code: &str, language: &str) -> AppResult<RemoteReply> {
        self.run(TaskKind::Explain, prompts::explain(code, language)).await
    }

    pub async fn refactor(
        &self,
        code: &str,
        language: &str,
        goals: Option<&str>,
    ) -> AppResult<RemoteReply> {
        self.run(TaskKind::Refactor, prompts::refactor(code, language, goals))
            .await
    }

    async fn run(&self, kind: TaskKind, user_prompt: String) -> AppResult<RemoteReply> {
        info!("Sending {} request with model {}", kind, self.credentials.model());
        let messages = [
            ChatMessage {
                role: "system",
                content: prompts::SYSTEM_PROMPT,
            },
            ChatMessage {
                role: "user",
                content: &user_prompt,
            },
        ];

        let text = chat(
            self.http,
            self.credentials.base_url(),
            self.credentials.api_key(),
            json!({
                "model": self.credentials.model().as_str(),
                "messages": messages,
                "temperature": self.credentials.temperature(),
                "max_tokens": self.credentials.max_tokens(),
            }),
            None,
        )
        .await?;

        Ok(RemoteReply { kind, text })
    }

    /// Checks a key with a minimal request.
    ///
    /// Returns `Ok(false)` only when the service rejects the key; any other
    /// failure is passed through so the caller can tell "bad key" from
    /// "could not ask".
    pub async fn validate_key(http: &dyn HttpClient, base_url: &str, api_key: &str) -> AppResult<bool> {
        let body = json!({
            "model": Model::DeepseekChat.as_str(),
            "messages": [{ "role": "user", "content": "test" }],
            "max_tokens": KEY_PROBE_MAX_TOKENS,
        });

        match chat(http, base_url, api_key, body, Some(KEY_PROBE_TIMEOUT)).await {
            Ok(_) => Ok(true),
            Err(AppError::Authentication) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

fn completions_url(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

async fn chat(
    http: &dyn HttpClient,
    base_url: &str,
    api_key: &str,
    body: serde_json::Value,
    timeout: Option<Duration>,
) -> AppResult<String> {
    let authorization = format!("Bearer {}", api_key);
    let headers = [
        ("Authorization", authorization.as_str()),
        ("Content-Type", "application/json"),
    ];

    let response = http
        .post_json(&completions_url(base_url), &headers, &body, timeout)
        .await
        .map_err(|e| AppError::Transport(e.to_string()))?;

    if !response.is_success() {
        warn!("Remote service answered HTTP {}", response.status);
        return Err(classify_status(response.status, &response.body));
    }

    debug!("Remote service response: {}", response.body);
    extract_content(&response.body)
}

/// Maps a non-success status to the error taxonomy.
pub fn classify_status(status: u16, body: &str) -> AppError {
    match status {
        401 => AppError::Authentication,
        429 => AppError::RateLimited,
        _ => AppError::Transport(format!("HTTP {}: {}", status, error_detail(body))),
    }
}

fn error_detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message").or(Some(e)))
                .and_then(|m| m.as_str().map(ToString::to_string))
        })
        .unwrap_or_else(|| body.chars().take(200).collect())
}

fn extract_content(body: &str) -> AppResult<String> {
    let completion: ChatCompletion = serde_json::from_str(body)
        .map_err(|e| AppError::Transport(format!("unexpected response from service: {}", e)))?;

    completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| AppError::Transport("service returned no completion".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::testing::{MockHttpClient, completion};
    use crate::http_client::HttpResponse;

    fn credentials() -> Credentials {
        let mut c = Credentials::new("sk-test-key")
            .unwrap()
            .with_model(Model::DeepseekCoder)
            .with_base_url("https://api.example.test/v1/");
        c.set_temperature(0.3).unwrap();
        c.set_max_tokens(256).unwrap();
        c
    }

    #[tokio::test]
    async fn test_request_shape() {
        let http = MockHttpClient::ok(&completion("hello"));
        let creds = credentials();
        let reply = RemoteClient::new(&http, &creds)
            .explain("print(1)", "python")
            .await
            .unwrap();

        assert_eq!(reply, RemoteReply { kind: TaskKind::Explain, text: "hello".into() });

        let requests = http.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.url, "https://api.example.test/v1/chat/completions");
        assert!(request
            .headers
            .contains(&("Authorization".to_string(), "Bearer sk-test-key".to_string())));
        assert_eq!(request.body["model"], "deepseek-coder");
        assert_eq!(request.body["temperature"], 0.3);
        assert_eq!(request.body["max_tokens"], 256);
        assert!(request.timeout.is_none());

        let messages = request.body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["role"], "user");
        assert!(messages[1]["content"].as_str().unwrap().contains("print(1)"));
    }

    #[tokio::test]
    async fn test_calls_do_not_share_history() {
        let http = MockHttpClient::ok(&completion("ok"));
        let creds = credentials();
        let client = RemoteClient::new(&http, &creds);
        client.analyze("a = 1", "python").await.unwrap();
        client.generate("sort a list", "python", None).await.unwrap();

        for request in http.requests() {
            assert_eq!(request.body["messages"].as_array().unwrap().len(), 2);
        }
    }

    #[tokio::test]
    async fn test_401_is_authentication_error() {
        let http = MockHttpClient::status(401, r#"{"error":{"message":"bad key"}}"#);
        let creds = credentials();
        let err = RemoteClient::new(&http, &creds).analyze("x", "c").await.unwrap_err();
        assert!(matches!(err, AppError::Authentication));
        assert_eq!(http.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_429_is_rate_limited_without_retry() {
        let http = MockHttpClient::status(429, "");
        let creds = credentials();
        let err = RemoteClient::new(&http, &creds).analyze("x", "c").await.unwrap_err();
        assert!(matches!(err, AppError::RateLimited));
        assert_eq!(http.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_server_error_carries_service_message() {
        let http = MockHttpClient::status(503, r#"{"error":{"message":"overloaded"}}"#);
        let creds = credentials();
        let err = RemoteClient::new(&http, &creds).analyze("x", "c").await.unwrap_err();
        match err {
            AppError::Transport(message) => assert_eq!(message, "HTTP 503: overloaded"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_service_is_transport_error() {
        let http = MockHttpClient::unreachable("connection refused");
        let creds = credentials();
        let err = RemoteClient::new(&http, &creds).analyze("x", "c").await.unwrap_err();
        match err {
            AppError::Transport(message) => assert!(message.contains("connection refused")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_choices_is_transport_error() {
        let http = MockHttpClient::ok(r#"{"choices":[]}"#);
        let creds = credentials();
        let err = RemoteClient::new(&http, &creds).analyze("x", "c").await.unwrap_err();
        assert!(matches!(err, AppError::Transport(_)));
    }

    #[tokio::test]
    async fn test_validate_key_outcomes() {
        let accepted = MockHttpClient::ok(&completion("hi"));
        assert!(RemoteClient::validate_key(&accepted, "https://h/v1", "good").await.unwrap());
        let probe = &accepted.requests()[0];
        assert_eq!(probe.timeout, Some(Duration::from_secs(5)));
        assert_eq!(probe.body["model"], "deepseek-chat");
        assert_eq!(probe.body["max_tokens"], 10);

        let rejected = MockHttpClient::status(401, "");
        assert!(!RemoteClient::validate_key(&rejected, "https://h/v1", "bad").await.unwrap());

        let down = MockHttpClient::new(vec![Ok(HttpResponse::new(500, "boom"))]);
        assert!(RemoteClient::validate_key(&down, "https://h/v1", "any").await.is_err());
    }

    #[test]
    fn test_error_detail_falls_back_to_truncated_body() {
        let body = "x".repeat(500);
        assert_eq!(error_detail(&body).len(), 200);
        assert_eq!(error_detail(r#"{"error":"plain"}"#), "plain");
    }
}
