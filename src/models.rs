use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RiskLevel {
    Safe,
    Suspicious,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Safe => "Safe",
            RiskLevel::Suspicious => "Suspicious",
            RiskLevel::High => "High",
            RiskLevel::Critical => "Critical",
        }
    }

    pub fn is_fraud(self) -> bool {
        self != RiskLevel::Safe
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = String;

    /// Accepts both vocabularies in circulation: Safe/Suspicious/High/Critical
    /// and the dataset's Low/Medium/High/Critical, plus the model's "Gray".
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "safe" | "low" => Ok(RiskLevel::Safe),
            "suspicious" | "medium" | "gray" | "grey" => Ok(RiskLevel::Suspicious),
            "high" | "high fraud risk" => Ok(RiskLevel::High),
            "critical" => Ok(RiskLevel::Critical),
            other => Err(format!("unknown risk level '{other}'")),
        }
    }
}

impl Serialize for RiskLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RiskLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Editorial tier attached to a dataset entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskTier {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskTier {
    /// Score the heuristic scorer pins a verdict to when the input matches a
    /// dataset entry of this tier.
    pub fn anchor_score(self) -> u8 {
        match self {
            RiskTier::Critical => 95,
            RiskTier::High => 75,
            RiskTier::Medium => 45,
            RiskTier::Low => 10,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskTier::Low => "LOW",
            RiskTier::Medium => "MEDIUM",
            RiskTier::High => "HIGH",
            RiskTier::Critical => "CRITICAL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoDatasetItem {
    pub id: &'static str,
    pub label: &'static str,
    pub text: &'static str,
    pub risk_tier: RiskTier,
    pub fraud_type: &'static str,
    pub explanation: &'static str,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectedSignals {
    pub urgency: bool,
    pub impersonation: bool,
    pub otp_request: bool,
    pub suspicious_url: bool,
    pub ai_generated_tone: bool,
    pub image_text_mismatch: bool,
    pub fake_branding: bool,
    pub visual_artifacts: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchPresence {
    High,
    Medium,
    Low,
    #[default]
    #[serde(rename = "Not Found")]
    NotFound,
}

impl fmt::Display for SearchPresence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SearchPresence::High => "High",
            SearchPresence::Medium => "Medium",
            SearchPresence::Low => "Low",
            SearchPresence::NotFound => "Not Found",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkAnalysis {
    pub domain: String,
    pub shortened: bool,
    pub brand_spoofing: bool,
    pub google_presence: SearchPresence,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarCase {
    pub id: String,
    pub similarity_score: u8,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextErrorAnalysis {
    pub typos: Vec<String>,
    pub grammar_issues: Vec<String>,
    pub score: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BankVerification {
    pub detected_bank: Option<String>,
    pub is_official_domain: bool,
    pub risk_reason: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttachmentRisk {
    #[default]
    None,
    Low,
    High,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailAnalysis {
    pub is_email: bool,
    pub sender_domain_mismatch: bool,
    pub suspicious_subject: bool,
    pub attachment_risk: AttachmentRisk,
    pub headers_analysis: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    #[default]
    Low,
    Medium,
    High,
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Grade::Low => "Low",
            Grade::Medium => "Medium",
            Grade::High => "High",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageAnalysis {
    pub is_safe_content: bool,
    pub visual_anomalies: Vec<String>,
    pub ocr_text_risk: Grade,
}

impl Default for ImageAnalysis {
    fn default() -> Self {
        Self {
            is_safe_content: true,
            visual_anomalies: Vec::new(),
            ocr_text_risk: Grade::Low,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSelfCheck {
    pub possible_misclassification_reason: String,
    pub confidence_calibration: Grade,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tone {
    #[default]
    Normal,
    Urgent,
    Manipulative,
    #[serde(rename = "AI-Like")]
    AiLike,
}

/// Verdict produced for one analysis, by the model or by the heuristic scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_id: Option<String>,
    pub is_fraud: bool,
    #[serde(deserialize_with = "rounded_score")]
    pub risk_score: u8,
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub fraud_type: Vec<String>,
    #[serde(default)]
    pub why_fraud: Vec<String>,
    #[serde(default)]
    pub risky_phrases: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub detected_signals: DetectedSignals,
    #[serde(default, deserialize_with = "null_as_default")]
    pub link_analysis: LinkAnalysis,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similar_case_match: Option<SimilarCase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_error_analysis: Option<TextErrorAnalysis>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub bank_verification: BankVerification,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email_analysis: EmailAnalysis,
    #[serde(default, deserialize_with = "null_as_default")]
    pub image_analysis: ImageAnalysis,
    #[serde(default)]
    pub counterfactual_safe_conditions: Vec<String>,
    #[serde(default)]
    pub campaign_detected: bool,
    #[serde(default)]
    pub recommended_action: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub model_self_check: ModelSelfCheck,
    #[serde(default, deserialize_with = "rounded_score")]
    pub confidence: u8,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub signals: Vec<String>,
    #[serde(default)]
    pub tone: Tone,
}

/// Models sometimes send `null` for a block they have nothing to say about.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts `87.5` as well as `87`; the value must already lie within 0-100.
fn rounded_score<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if !(0.0..=100.0).contains(&value) {
        return Err(serde::de::Error::custom(format!("score {value} is outside 0-100")));
    }
    Ok(value.round() as u8)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub risk_score: Option<u8>,
    #[serde(default)]
    pub confidence: Option<u8>,
    #[serde(default)]
    pub raw: serde_json::Value,
}

impl AnalysisRecord {
    /// Risk level stored in the raw verdict, when the record carries one.
    pub fn risk_level(&self) -> Option<RiskLevel> {
        self.raw
            .get("risk_level")
            .and_then(|value| value.as_str())
            .and_then(|value| value.parse().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_level_accepts_alternate_vocabularies() {
        assert_eq!("CRITICAL".parse::<RiskLevel>(), Ok(RiskLevel::Critical));
        assert_eq!("Gray".parse::<RiskLevel>(), Ok(RiskLevel::Suspicious));
        assert_eq!("medium".parse::<RiskLevel>(), Ok(RiskLevel::Suspicious));
        assert_eq!("LOW".parse::<RiskLevel>(), Ok(RiskLevel::Safe));
        assert!("catastrophic".parse::<RiskLevel>().is_err());
    }

    #[test]
    fn levels_are_ordered_by_severity() {
        assert!(RiskLevel::Critical > RiskLevel::High);
        assert!(RiskLevel::High > RiskLevel::Suspicious);
        assert!(RiskLevel::Suspicious > RiskLevel::Safe);
    }

    #[test]
    fn minimal_reply_fills_neutral_defaults() {
        let raw = r#"{"is_fraud": false, "risk_score": 4, "risk_level": "Safe"}"#;
        let parsed: AnalysisResponse = serde_json::from_str(raw).unwrap();

        assert!(!parsed.email_analysis.is_email);
        assert_eq!(parsed.email_analysis.attachment_risk, AttachmentRisk::None);
        assert!(parsed.image_analysis.is_safe_content);
        assert_eq!(parsed.link_analysis.google_presence, SearchPresence::NotFound);
        assert_eq!(parsed.tone, Tone::Normal);
    }

    #[test]
    fn null_blocks_fall_back_to_defaults() {
        let raw = r#"{
            "is_fraud": true,
            "risk_score": 70,
            "risk_level": "High",
            "detected_signals": null,
            "link_analysis": null,
            "bank_verification": null,
            "email_analysis": null,
            "image_analysis": null,
            "model_self_check": null
        }"#;
        let parsed: AnalysisResponse = serde_json::from_str(raw).unwrap();

        assert_eq!(parsed.bank_verification, BankVerification::default());
        assert_eq!(parsed.detected_signals, DetectedSignals::default());
        assert!(parsed.image_analysis.is_safe_content);
        assert_eq!(parsed.risk_score, 70);
    }

    #[test]
    fn fractional_scores_are_rounded() {
        let raw = r#"{"is_fraud": true, "risk_score": 64.4, "risk_level": "High", "confidence": 87.5}"#;
        let parsed: AnalysisResponse = serde_json::from_str(raw).unwrap();

        assert_eq!(parsed.risk_score, 64);
        assert_eq!(parsed.confidence, 88);
    }

    #[test]
    fn negative_score_is_rejected() {
        let raw = r#"{"is_fraud": false, "risk_score": -3, "risk_level": "Safe"}"#;
        assert!(serde_json::from_str::<AnalysisResponse>(raw).is_err());
    }

    #[test]
    fn presence_and_tone_use_display_names_on_the_wire() {
        let presence = serde_json::to_string(&SearchPresence::NotFound).unwrap();
        assert_eq!(presence, "\"Not Found\"");
        let tone = serde_json::to_string(&Tone::AiLike).unwrap();
        assert_eq!(tone, "\"AI-Like\"");
    }
}
