use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// External text-generation capability: prompt in, free text out.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Google Gemini `generateContent` client.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    endpoint: Url,
    timeout: Duration,
}

impl GeminiClient {
    pub fn new(
        api_key: String,
        model: &str,
        api_base: &str,
        client: Client,
        timeout: Duration,
    ) -> Result<Self> {
        let model = model.trim().trim_start_matches("models/");
        let endpoint = Url::parse(api_base)
            .and_then(|base| base.join(&format!("models/{}:generateContent", model)))
            .map_err(|e| Error::Config(format!("Invalid GEMINI_API_BASE: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            endpoint,
            timeout,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let payload = serde_json::json!({
            "contents": [
                { "role": "user", "parts": [{ "text": prompt }] }
            ]
        });

        let res = self
            .client
            .post(self.endpoint.clone())
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .timeout(self.timeout)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(Error::Generation(format!("Gemini API Error {}: {}", status, text)));
        }

        let body: JsonValue = res.json().await?;
        extract_candidate_text(&body)
            .ok_or_else(|| Error::Generation("Invalid Gemini response format".to_string()))
    }
}

/// Concatenates the text parts of the first candidate.
fn extract_candidate_text(body: &JsonValue) -> Option<String> {
    let parts = body
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())?;

    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
        .collect();

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Builds the quiz prompt, calls the generation service and normalizes its reply.
#[derive(Clone)]
pub struct QuizGenerator {
    backend: Arc<dyn TextGenerator>,
    question_count: usize,
    timeout: Duration,
}

impl QuizGenerator {
    pub fn new(backend: Arc<dyn TextGenerator>, question_count: usize, timeout: Duration) -> Self {
        Self {
            backend,
            question_count: question_count.max(1),
            timeout,
        }
    }

    /// Returns the raw (fence-stripped) quiz text. Not validated here.
    pub async fn generate(
        &self,
        topic: &str,
        supplementary_text: &str,
        file_text: &str,
    ) -> Result<String> {
        if topic.trim().is_empty() {
            return Err(Error::BadRequest("Main quiz topic is required".to_string()));
        }

        let content = build_content(topic, supplementary_text, file_text);
        let prompt = build_prompt(&content, self.question_count);

        tracing::info!(
            topic = topic.trim(),
            questions = self.question_count,
            content_chars = content.chars().count(),
            "requesting quiz generation"
        );
        let started = Instant::now();

        let raw = match tokio::time::timeout(self.timeout, self.backend.generate(&prompt)).await {
            Ok(Ok(text)) => text,
            Ok(Err(Error::Generation(msg))) => return Err(Error::Generation(msg)),
            Ok(Err(other)) => return Err(Error::Generation(other.to_string())),
            Err(_) => {
                tracing::warn!(timeout_secs = self.timeout.as_secs(), "quiz generation timed out");
                return Err(Error::Generation(format!(
                    "no response within {}s",
                    self.timeout.as_secs()
                )));
            }
        };

        tracing::info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            response_chars = raw.len(),
            "quiz generation finished"
        );

        let text = strip_code_fence(&raw);
        if text.is_empty() {
            return Err(Error::Generation("empty response".to_string()));
        }
        Ok(text)
    }
}

pub fn build_content(topic: &str, supplementary_text: &str, file_text: &str) -> String {
    format!(
        "MAIN TOPIC:\n{}\n\nOPTIONAL TEXT:\n{}\n\nOPTIONAL FILE CONTENT:\n{}",
        topic.trim(),
        supplementary_text.trim(),
        file_text.trim()
    )
}

pub fn build_prompt(content: &str, question_count: usize) -> String {
    format!(
        r#"Create a quiz with EXACTLY {count} multiple-choice questions about the content below.

STRICT JSON FORMAT:
{{
    "questions": [
        {{
            "question": "...",
            "options": ["A. ...", "B. ...", "C. ...", "D. ..."],
            "correct": "A",
            "explanation": "..."
        }}
    ]
}}

Every question has exactly 4 options labeled A, B, C and D.
"correct" is the single letter of the correct option.
No extra text. No notes. No paragraphs.

Content to use:
{content}
"#,
        count = question_count,
        content = content
    )
}

/// Removes surrounding whitespace and an optional Markdown code fence
/// (with or without a language tag).
pub fn strip_code_fence(text: &str) -> String {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim().to_string()
}
