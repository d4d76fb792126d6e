//! Gemini REST client implementing the provider traits.

use std::time::Duration;

use async_trait::async_trait;
use confab_core::persona::{AiGeneratedPersona, Persona};
use confab_core::provider::{
    ChunkSink, HistoryEntry, PersonaGenerator, ProviderError, ResponseProvider,
};
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::GeminiConfig;
use crate::prompts;

/// Provider backed by the Gemini generative language API.
///
/// Chat replies use the SSE streaming endpoint; persona generation uses the
/// plain endpoint and parses the model's JSON output.
pub struct GeminiProvider {
    config: GeminiConfig,
    http: Client,
}

impl GeminiProvider {
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }

    /// Convenience constructor reading the environment, see [`GeminiConfig::from_env`].
    pub fn from_env() -> confab_core::Result<Self> {
        Ok(Self::new(GeminiConfig::from_env()?))
    }

    fn endpoint(&self, method: &str) -> String {
        format!(
            "{}/models/{}:{}",
            self.config.base_url, self.config.model, method
        )
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let retry_after = parse_retry_after(response.headers());
        let body = response.text().await.unwrap_or_default();
        Err(map_http_error(status, body, retry_after))
    }

    /// One-shot generation, used for persona suggestions.
    async fn generate_text(&self, request: &GenerateContentRequest) -> Result<String, ProviderError> {
        let response = self
            .http
            .post(self.endpoint("generateContent"))
            .headers(build_headers(&self.config.api_key))
            .json(request)
            .send()
            .await
            .map_err(classify_request_error)?;
        let response = Self::check_status(response).await?;

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|err| ProviderError::invalid_response(format!("Malformed response: {}", err)))?;
        extract_text(parsed)
            .ok_or_else(|| ProviderError::invalid_response("Response carried no text candidates"))
    }
}

#[async_trait]
impl ResponseProvider for GeminiProvider {
    async fn stream_generate(
        &self,
        persona: &Persona,
        user_message: &str,
        history: &[HistoryEntry],
        mut on_chunk: ChunkSink,
    ) -> Result<(), ProviderError> {
        let request = GenerateContentRequest::chat(persona, user_message, history);
        let url = format!("{}?alt=sse", self.endpoint("streamGenerateContent"));

        let response = self
            .http
            .post(&url)
            .headers(build_headers(&self.config.api_key))
            .json(&request)
            .send()
            .await
            .map_err(classify_request_error)?;
        let response = Self::check_status(response).await?;

        let mut bytes = response.bytes_stream();
        let mut buffer: Vec<u8> = Vec::new();
        while let Some(chunk) = bytes.next().await {
            let chunk = chunk.map_err(|err| ProviderError::stream(err.to_string()))?;
            buffer.extend_from_slice(&chunk);
            while let Some((pos, len)) = find_double_newline(&buffer) {
                let frame: Vec<u8> = buffer.drain(..pos + len).collect();
                deliver_frame(&frame[..pos], &mut on_chunk);
            }
        }
        // A final event may arrive without a trailing blank line.
        if !buffer.iter().all(|b| b.is_ascii_whitespace()) {
            deliver_frame(&buffer, &mut on_chunk);
        }
        debug!("Streamed response complete for persona {}", persona.name);
        Ok(())
    }
}

#[async_trait]
impl PersonaGenerator for GeminiProvider {
    async fn generate_personas(
        &self,
        search_term: &str,
    ) -> Result<Vec<AiGeneratedPersona>, ProviderError> {
        let request = GenerateContentRequest::prompt(prompts::generate_personas_prompt(search_term));
        let text = self.generate_text(&request).await?;

        let stripped = strip_code_fences(&text);
        let values: Vec<serde_json::Value> = serde_json::from_str(stripped).map_err(|err| {
            ProviderError::invalid_response(format!("Expected a JSON array of personas: {}", err))
        })?;

        let mut suggestions = Vec::with_capacity(values.len());
        for value in values {
            match AiGeneratedPersona::from_value(value) {
                Ok(suggestion) => suggestions.push(suggestion),
                Err(err) => warn!("Dropping invalid persona suggestion: {}", err),
            }
        }
        debug!(
            "Generated {} persona suggestions for '{}'",
            suggestions.len(),
            search_term
        );
        Ok(suggestions)
    }
}

fn build_headers(api_key: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        "x-goog-api-key",
        HeaderValue::from_str(api_key).unwrap_or_else(|_| HeaderValue::from_static("")),
    );
    headers.insert("content-type", HeaderValue::from_static("application/json"));
    headers
}

fn classify_request_error(err: reqwest::Error) -> ProviderError {
    ProviderError::request(
        format!("Gemini request failed: {}", err),
        err.is_connect() || err.is_timeout(),
    )
}

/// Parses one SSE frame and pushes any candidate text into the sink.
///
/// Malformed frames are logged and skipped; a stream that produced some
/// good frames should not be failed over one bad one.
fn deliver_frame(frame: &[u8], on_chunk: &mut ChunkSink) {
    let frame = String::from_utf8_lossy(frame);
    match parse_sse_frame(&frame) {
        Ok(Some(response)) => {
            if let Some(text) = extract_text(response) {
                if !text.is_empty() {
                    on_chunk(text);
                }
            }
        }
        Ok(None) => {}
        Err(err) => warn!("Skipping malformed SSE frame: {}", err),
    }
}

/// Extracts the JSON payload from a frame's `data:` lines.
fn parse_sse_frame(frame: &str) -> Result<Option<GenerateContentResponse>, ProviderError> {
    let data_lines: Vec<&str> = frame
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(str::trim)
        .collect();
    if data_lines.is_empty() {
        return Ok(None);
    }
    let data = data_lines.join("\n");
    let trimmed = data.trim();
    if trimmed.is_empty() || trimmed == "[DONE]" {
        return Ok(None);
    }
    serde_json::from_str(trimmed)
        .map(Some)
        .map_err(|err| ProviderError::stream(format!("Bad SSE JSON: {}", err)))
}

/// Finds the earliest event boundary, either `\n\n` or `\r\n\r\n`.
fn find_double_newline(buffer: &[u8]) -> Option<(usize, usize)> {
    let crlf = buffer.windows(4).position(|w| w == b"\r\n\r\n");
    let lf = buffer.windows(2).position(|w| w == b"\n\n");
    match (crlf, lf) {
        (Some(c), Some(l)) if l <= c => Some((l, 2)),
        (Some(c), _) => Some((c, 4)),
        (None, Some(l)) => Some((l, 2)),
        (None, None) => None,
    }
}

fn extract_text(response: GenerateContentResponse) -> Option<String> {
    response
        .candidates?
        .into_iter()
        .next()?
        .content?
        .parts
        .into_iter()
        .find_map(|part| part.text)
}

/// Removes a Markdown code fence around the model's JSON output, if any.
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json", ...) on the opening fence line.
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    let body = body.trim_end();
    body.strip_suffix("```").unwrap_or(body).trim()
}

fn map_http_error(status: StatusCode, body: String, retry_after: Option<Duration>) -> ProviderError {
    let message = serde_json::from_str::<ErrorWrapper>(&body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.clone());
            if status_text.is_empty() {
                msg
            } else {
                format!("{}: {}", status_text, msg)
            }
        })
        .unwrap_or(body);

    let is_retryable = matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    );

    ProviderError::Http {
        status: status.as_u16(),
        message,
        is_retryable,
        retry_after,
    }
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get("retry-after")?.to_str().ok()?;
    // Retry-After HTTP-date parsing is omitted for simplicity
    value.parse::<u64>().ok().map(Duration::from_secs)
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
}

impl GenerateContentRequest {
    /// A persona chat turn: windowed history plus the new user message,
    /// with the in-character system instruction alongside.
    fn chat(persona: &Persona, user_message: &str, history: &[HistoryEntry]) -> Self {
        Self {
            contents: vec![Content::user(prompts::chat_content(history, user_message))],
            system_instruction: Some(Content::system(prompts::system_instruction(persona))),
        }
    }

    /// A bare single-prompt request.
    fn prompt(text: String) -> Self {
        Self {
            contents: vec![Content::user(text)],
            system_instruction: None,
        }
    }
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

impl Content {
    fn user(text: String) -> Self {
        Self {
            role: "user".to_string(),
            parts: vec![Part { text }],
        }
    }

    fn system(text: String) -> Self {
        Self {
            role: "system".to_string(),
            parts: vec![Part { text }],
        }
    }
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collecting_sink() -> (ChunkSink, std::sync::Arc<std::sync::Mutex<Vec<String>>>) {
        let collected = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink_target = std::sync::Arc::clone(&collected);
        let sink: ChunkSink = Box::new(move |chunk| {
            sink_target.lock().unwrap().push(chunk);
        });
        (sink, collected)
    }

    #[test]
    fn test_parse_sse_frame_extracts_candidate_text() {
        let frame = r#"data: {"candidates":[{"content":{"parts":[{"text":"Hel"}]}}]}"#;
        let response = parse_sse_frame(frame).unwrap().unwrap();
        assert_eq!(extract_text(response).unwrap(), "Hel");
    }

    #[test]
    fn test_parse_sse_frame_skips_done_and_comments() {
        assert!(parse_sse_frame("data: [DONE]").unwrap().is_none());
        assert!(parse_sse_frame(": keep-alive").unwrap().is_none());
        assert!(parse_sse_frame("").unwrap().is_none());
    }

    #[test]
    fn test_parse_sse_frame_rejects_bad_json() {
        assert!(parse_sse_frame("data: {not json}").is_err());
    }

    #[test]
    fn test_deliver_frame_pushes_text_and_survives_garbage() {
        let (mut sink, collected) = collecting_sink();
        deliver_frame(
            br#"data: {"candidates":[{"content":{"parts":[{"text":"lo!"}]}}]}"#,
            &mut sink,
        );
        deliver_frame(b"data: {broken", &mut sink);
        assert_eq!(*collected.lock().unwrap(), vec!["lo!".to_string()]);
    }

    #[test]
    fn test_find_double_newline_prefers_earliest_boundary() {
        assert_eq!(find_double_newline(b"a\n\nb"), Some((1, 2)));
        assert_eq!(find_double_newline(b"a\r\n\r\nb"), Some((1, 4)));
        assert_eq!(find_double_newline(b"a\n\nb\r\n\r\n"), Some((1, 2)));
        assert_eq!(find_double_newline(b"no boundary"), None);
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("[1]"), "[1]");
        assert_eq!(strip_code_fences("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fences("```\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fences("  ```json\n[1, 2]\n```  "), "[1, 2]");
    }

    #[test]
    fn test_map_http_error_reads_error_body() {
        let body = r#"{"error":{"code":429,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#;
        let err = map_http_error(StatusCode::TOO_MANY_REQUESTS, body.to_string(), None);
        assert!(err.is_retryable());
        assert_eq!(err.to_string(), "HTTP 429: RESOURCE_EXHAUSTED: Quota exceeded");
    }

    #[test]
    fn test_map_http_error_client_errors_are_not_retryable() {
        let err = map_http_error(StatusCode::BAD_REQUEST, "nope".to_string(), None);
        assert!(!err.is_retryable());
        match err {
            ProviderError::Http { status, message, .. } => {
                assert_eq!(status, 400);
                assert_eq!(message, "nope");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_retry_after_seconds() {
        let mut headers = HeaderMap::new();
        headers.insert("retry-after", HeaderValue::from_static("30"));
        assert_eq!(parse_retry_after(&headers), Some(Duration::from_secs(30)));

        let mut bad = HeaderMap::new();
        bad.insert("retry-after", HeaderValue::from_static("Wed, 21 Oct"));
        assert_eq!(parse_retry_after(&bad), None);
        assert_eq!(parse_retry_after(&HeaderMap::new()), None);
    }

    #[test]
    fn test_chat_request_shape() {
        let persona = Persona::new("Ada", "Mathematician.", "Historical Figure");
        let request = GenerateContentRequest::chat(&persona, "hi", &[]);
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(value["contents"][0]["parts"][0]["text"], "User: hi");
        assert_eq!(value["systemInstruction"]["role"], "system");
        let instruction = value["systemInstruction"]["parts"][0]["text"]
            .as_str()
            .unwrap();
        assert!(instruction.contains("You are Ada"));
    }

    #[test]
    fn test_prompt_request_omits_system_instruction() {
        let request = GenerateContentRequest::prompt("generate things".to_string());
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("systemInstruction").is_none());
    }

    #[test]
    fn test_extract_text_takes_first_candidate() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[
                {"content":{"parts":[{"text":"first"}]}},
                {"content":{"parts":[{"text":"second"}]}}
            ]}"#,
        )
        .unwrap();
        assert_eq!(extract_text(response).unwrap(), "first");

        let empty: GenerateContentResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert!(extract_text(empty).is_none());
    }
}
