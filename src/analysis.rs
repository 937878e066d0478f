//! Remote frame analysis: a few sampled frames go out, a text summary comes back.

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PROMPT: &str =
    "Summarize what happens in this video and list its most notable moments.";

/// Longest response excerpt carried in an error
const ERROR_BODY_LIMIT: usize = 200;

/// A JPEG frame to send for analysis
#[derive(Debug, Clone)]
pub struct AnalysisFrame {
    pub timestamp: f64,
    pub jpeg: Vec<u8>,
}

#[derive(Debug, Serialize)]
struct AnalysisRequest<'a> {
    prompt: &'a str,
    frames: Vec<EncodedFrame>,
}

#[derive(Debug, Serialize)]
struct EncodedFrame {
    timestamp: f64,
    image: String,
}

/// Structured result of an analysis request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub summary: String,
    #[serde(default)]
    pub highlights: Vec<String>,
}

pub struct AnalysisClient {
    endpoint: String,
    api_key: Option<String>,
    prompt: String,
    client: reqwest::Client,
}

impl AnalysisClient {
    pub fn new(endpoint: String, api_key: Option<String>) -> Self {
        Self {
            endpoint,
            api_key,
            prompt: DEFAULT_PROMPT.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_prompt(mut self, prompt: String) -> Self {
        self.prompt = prompt;
        self
    }

    pub async fn analyze(&self, frames: &[AnalysisFrame]) -> Result<AnalysisResult> {
        if frames.is_empty() {
            bail!("no frames to analyze");
        }
        let body = build_request(&self.prompt, frames);
        log::info!("analysis request: {} frames to {}", frames.len(), self.endpoint);

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(ref key) = self.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("analysis request to {} failed", self.endpoint))?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            bail!("analysis service returned {}: {}", status, excerpt(&text));
        }
        parse_response(&text)
    }
}

fn build_request<'a>(prompt: &'a str, frames: &[AnalysisFrame]) -> AnalysisRequest<'a> {
    AnalysisRequest {
        prompt,
        frames: frames
            .iter()
            .map(|f| EncodedFrame {
                timestamp: f.timestamp,
                image: STANDARD.encode(&f.jpeg),
            })
            .collect(),
    }
}

pub fn parse_response(text: &str) -> Result<AnalysisResult> {
    serde_json::from_str(text).context("malformed analysis response")
}

/// Indices of up to `max` items spread evenly over `len`
pub fn pick_evenly(len: usize, max: usize) -> Vec<usize> {
    if len == 0 || max == 0 {
        return Vec::new();
    }
    if len <= max {
        return (0..len).collect();
    }
    (0..max).map(|i| (i * 2 + 1) * len / (max * 2)).collect()
}

fn excerpt(text: &str) -> String {
    let trimmed = text.trim();
    match trimmed.char_indices().nth(ERROR_BODY_LIMIT) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}
