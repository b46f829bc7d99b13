use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::Config;
use crate::dataset::FEW_SHOT_EXAMPLES;
use crate::models::AnalysisResponse;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("request to the model failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("model endpoint returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("model reply contained no text")]
    EmptyReply,
    #[error("model reply is not a valid verdict: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("model verdict violates the contract: {0}")]
    Contract(String),
}

/// Screenshot submitted alongside (or instead of) text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ImagePayload {
    /// Accepts either raw base64 or a `data:image/...;base64,` URL.
    pub fn from_base64(encoded: &str) -> Result<Self, base64::DecodeError> {
        let (mime_type, data) = match encoded.strip_prefix("data:") {
            Some(rest) => match rest.split_once(";base64,") {
                Some((mime, data)) => (mime.to_string(), data),
                None => ("image/jpeg".to_string(), rest),
            },
            None => ("image/jpeg".to_string(), encoded),
        };
        Ok(Self {
            mime_type,
            bytes: BASE64.decode(data.trim())?,
        })
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.bytes)
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum Part {
    Text(String),
    InlineData {
        #[serde(rename = "mimeType")]
        mime_type: String,
        data: String,
    },
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ReplyPart>,
}

#[derive(Debug, Deserialize)]
struct ReplyPart {
    text: Option<String>,
}

/// Client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(config: &Config, api_key: &str) -> Result<Self, AiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.to_string(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }

    /// Sends the prompt (and screenshot) to the model and parses its verdict.
    pub async fn analyze(
        &self,
        text: &str,
        image: Option<&ImagePayload>,
    ) -> Result<AnalysisResponse, AiError> {
        let mut parts = vec![Part::Text(build_prompt(text, image.is_some()))];
        if let Some(image) = image {
            parts.push(Part::InlineData {
                mime_type: image.mime_type.clone(),
                data: image.to_base64(),
            });
        }
        let request = GenerateRequest {
            contents: vec![Content { parts }],
        };

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        debug!(model = %self.model, with_image = image.is_some(), "sending analysis request");

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let data: GenerateResponse = response.json().await?;
        let reply: String = data
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        info!(model = %self.model, reply_len = reply.len(), "model replied");
        parse_model_reply(&reply)
    }
}

pub fn build_prompt(text: &str, has_image: bool) -> String {
    let input = if text.trim().is_empty() {
        "No text provided, analyze image text."
    } else {
        text
    };
    let image_note = if has_image {
        "IMAGE PROVIDED: Run visual forensics."
    } else {
        "NO IMAGE PROVIDED."
    };

    format!(
        r#"You are an expert AI Fraud Intelligence Analyst.
Analyze the content (Text, Image, Email) for fraud patterns using the Local Reference Database.

{FEW_SHOT_EXAMPLES}

INPUT TEXT/EMAIL: "{input}"
{image_note}

TASK Checklist:
1. IMAGE PRE-CHECK: If generic photo (no text/logos) -> MARK SAFE.
2. EMAIL ANALYSIS: Check Sender Mismatch, Subject Urgency, Attachments.
3. BANK VERIFICATION: Check for Typosquatting (e.g. 'hdfkbank').
4. SIMILARITY: Does this look like the [DATASET_*] patterns above?

RETURN VALID JSON:
{{
  "is_fraud": boolean,
  "risk_score": number (0-100),
  "risk_level": "Safe" | "Suspicious" | "High" | "Critical",
  "fraud_type": ["Phishing", "Identity Theft", "Social Engineering", "AI Generated", "None", "Visual Scam", "Email Spoofing"],
  "why_fraud": ["Reason 1"],
  "risky_phrases": ["substring of the input"],
  "detected_signals": {{ "urgency": boolean, "impersonation": boolean, "otp_request": boolean, "suspicious_url": boolean, "ai_generated_tone": boolean, "image_text_mismatch": boolean, "fake_branding": boolean, "visual_artifacts": boolean }},
  "link_analysis": {{ "domain": "string", "shortened": boolean, "brand_spoofing": boolean, "google_presence": "High" | "Medium" | "Low" | "Not Found" }},
  "similar_case_match": {{ "id": "PATTERN_ID_OR_NONE", "similarity_score": number, "description": "reason" }},
  "text_error_analysis": {{ "typos": ["list"], "grammar_issues": ["list"], "score": number }},
  "bank_verification": {{ "detected_bank": "Name or null", "is_official_domain": boolean, "risk_reason": "string or null" }},
  "email_analysis": {{ "is_email": boolean, "sender_domain_mismatch": boolean, "suspicious_subject": boolean, "attachment_risk": "None" | "Low" | "High", "headers_analysis": "Summary" }},
  "image_analysis": {{ "is_safe_content": boolean, "visual_anomalies": ["list"], "ocr_text_risk": "Low" | "Medium" | "High" }},
  "counterfactual_safe_conditions": ["If X"],
  "campaign_detected": boolean,
  "recommended_action": ["Action"],
  "model_self_check": {{ "possible_misclassification_reason": "Reason", "confidence_calibration": "High" | "Medium" | "Low" }},
  "confidence": number (0-100),
  "explanation": "Summary",
  "signals": ["List"],
  "tone": "Normal" | "Urgent" | "Manipulative" | "AI-Like"
}}"#
    )
}

/// Removes markdown code fences the model tends to wrap JSON in.
pub fn strip_code_fences(reply: &str) -> &str {
    let trimmed = reply.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```JSON"))
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open
        .trim_end()
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}

pub fn parse_model_reply(reply: &str) -> Result<AnalysisResponse, AiError> {
    let body = strip_code_fences(reply);
    if body.is_empty() {
        return Err(AiError::EmptyReply);
    }

    let value: serde_json::Value = serde_json::from_str(body)?;
    for field in ["risk_score", "confidence"] {
        if let Some(score) = value.get(field).and_then(serde_json::Value::as_f64) {
            if !(0.0..=100.0).contains(&score) {
                return Err(AiError::Contract(format!("{field} {score} is outside 0-100")));
            }
        }
    }
    let verdict = AnalysisResponse::deserialize(value)?;
    Ok(verdict)
}
