use std::fmt;
use std::path::Path;

use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::gemini::{AiError, GeminiClient, ImagePayload};
use crate::links::{self, LinkReport};
use crate::models::AnalysisResponse;
use crate::risk;

const IMAGE_EXTENSIONS: &[(&str, &str)] = &[
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("webp", "image/webp"),
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("Please enter some text or attach a screenshot to analyze.")]
    Empty,
    #[error("Please enter a sender address or an email body.")]
    EmptyEmail,
    #[error("Please enter a valid http(s) URL.")]
    InvalidUrl,
    #[error("Could not read image '{0}'.")]
    UnreadableImage(String),
    #[error("Unsupported image type '{0}'; use png, jpg or webp.")]
    UnsupportedImage(String),
    #[error("Image data is not valid base64.")]
    InvalidImageData,
    #[error("Unknown demo scenario '{0}'.")]
    UnknownScenario(String),
}

/// One submission from any input surface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub text: String,
    pub image: Option<ImagePayload>,
    pub mode: InputMode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InputMode {
    #[default]
    Text,
    Email,
    Image,
    Batch,
}

impl InputMode {
    pub fn as_str(self) -> &'static str {
        match self {
            InputMode::Text => "text",
            InputMode::Email => "email",
            InputMode::Image => "image",
            InputMode::Batch => "batch",
        }
    }
}

impl AnalysisRequest {
    pub fn text(text: impl Into<String>) -> Result<Self, InputError> {
        Self::new(text.into(), None)
    }

    pub fn new(text: String, image: Option<ImagePayload>) -> Result<Self, InputError> {
        if text.trim().is_empty() && image.is_none() {
            return Err(InputError::Empty);
        }
        let mode = if image.is_some() {
            InputMode::Image
        } else {
            InputMode::Text
        };
        Ok(Self { text, image, mode })
    }

    /// Composes the header block the scorer and the model recognise as email.
    pub fn email(sender: &str, subject: &str, body: &str) -> Result<Self, InputError> {
        if sender.trim().is_empty() && body.trim().is_empty() {
            return Err(InputError::EmptyEmail);
        }
        let text = format!(
            "[EMAIL_HEADER_ANALYSIS_REQUEST]\nSENDER: {}\nSUBJECT: {}\nBODY:\n{}",
            sender.trim(),
            subject.trim(),
            body.trim()
        );
        Ok(Self {
            text,
            image: None,
            mode: InputMode::Email,
        })
    }

    pub fn with_mode(mut self, mode: InputMode) -> Self {
        self.mode = mode;
        self
    }
}

pub fn load_image(path: &Path) -> Result<ImagePayload, InputError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();
    let mime_type = IMAGE_EXTENSIONS
        .iter()
        .find(|(known, _)| *known == extension)
        .map(|(_, mime)| mime.to_string())
        .ok_or_else(|| InputError::UnsupportedImage(path.display().to_string()))?;

    let bytes = std::fs::read(path)
        .map_err(|_| InputError::UnreadableImage(path.display().to_string()))?;
    if bytes.is_empty() {
        return Err(InputError::UnreadableImage(path.display().to_string()));
    }
    Ok(ImagePayload { mime_type, bytes })
}

pub fn decode_image(encoded: &str) -> Result<ImagePayload, InputError> {
    ImagePayload::from_base64(encoded).map_err(|_| InputError::InvalidImageData)
}

pub fn validate_link(input: &str) -> Result<LinkReport, InputError> {
    links::check_link(input).ok_or(InputError::InvalidUrl)
}

/// Which path produced a verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Model(String),
    Heuristic,
    /// The model was asked but failed; the heuristic verdict stands in.
    Fallback(String),
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Model(model) => write!(f, "model ({model})"),
            Route::Heuristic => f.write_str("offline heuristic"),
            Route::Fallback(reason) => write!(f, "offline heuristic (model unavailable: {reason})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub response: AnalysisResponse,
    pub route: Route,
}

/// Heuristic verdict for a request, including the screenshot annotation.
pub fn heuristic(request: &AnalysisRequest) -> AnalysisResponse {
    let mut response = risk::score_text(&request.text);
    if request.image.is_some() {
        risk::annotate_image(&mut response);
    }
    response
}

/// Substitution policy: a model verdict is used as-is, any model error is
/// replaced by the heuristic verdict for the same request.
pub fn resolve(
    outcome: Result<AnalysisResponse, AiError>,
    model: &str,
    request: &AnalysisRequest,
) -> Analysis {
    match outcome {
        Ok(response) => Analysis {
            response,
            route: Route::Model(model.to_string()),
        },
        Err(err) => {
            warn!(error = %err, "model analysis failed; using heuristic scorer");
            Analysis {
                response: heuristic(request),
                route: Route::Fallback(err.to_string()),
            }
        }
    }
}

pub struct Analyzer {
    client: Option<GeminiClient>,
}

impl Analyzer {
    /// Builds an analyzer from config; `force_mock` wins over any API key.
    pub fn new(config: &Config, force_mock: bool) -> Self {
        let key = match config.api_key.as_deref() {
            Some(key) if config.uses_model() && !force_mock => key,
            _ => return Self::offline(),
        };
        match GeminiClient::new(config, key) {
            Ok(client) => Self {
                client: Some(client),
            },
            Err(err) => {
                warn!(error = %err, "could not build model client; staying offline");
                Self::offline()
            }
        }
    }

    pub fn offline() -> Self {
        Self { client: None }
    }

    pub fn is_online(&self) -> bool {
        self.client.is_some()
    }

    /// Never fails: without a client, or when the model errors, the verdict
    /// comes from the heuristic scorer.
    pub async fn analyze(&self, request: &AnalysisRequest) -> Analysis {
        let mut analysis = match &self.client {
            None => Analysis {
                response: heuristic(request),
                route: Route::Heuristic,
            },
            Some(client) => {
                let outcome = client.analyze(&request.text, request.image.as_ref()).await;
                resolve(outcome, client.model_name(), request)
            }
        };

        analysis
            .response
            .input_id
            .get_or_insert_with(|| Uuid::new_v4().to_string());
        info!(
            mode = request.mode.as_str(),
            route = %analysis.route,
            risk_score = analysis.response.risk_score,
            risk_level = %analysis.response.risk_level,
            "analysis complete"
        );
        analysis
    }
}
