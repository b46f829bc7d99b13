use once_cell::sync::Lazy;
use regex::Regex;

use crate::dataset;
use crate::links::{self, Brand, LinkReport, BRANDS};
use crate::models::{
    AnalysisResponse, AttachmentRisk, BankVerification, DemoDatasetItem, DetectedSignals,
    EmailAnalysis, Grade, ImageAnalysis, LinkAnalysis, ModelSelfCheck, RiskLevel, RiskTier,
    SimilarCase, TextErrorAnalysis, Tone,
};

pub const URGENCY_WEIGHT: i32 = 25;
pub const LURE_WEIGHT_PER_MATCH: i32 = 10;
pub const LURE_WEIGHT_CAP: i32 = 30;
pub const BRAND_WEIGHT: i32 = 35;
pub const CREDENTIAL_WEIGHT: i32 = 30;
pub const SHORTENER_WEIGHT: i32 = 20;
pub const SUSPICIOUS_LINK_WEIGHT: i32 = 25;
pub const AI_TONE_WEIGHT: i32 = 15;
pub const SOCIAL_WEIGHT: i32 = 20;
pub const SENDER_SPOOF_WEIGHT: i32 = 40;
pub const URGENT_SUBJECT_WEIGHT: i32 = 15;

/// Casual markers only pull a verdict down while it is below this score.
const CASUAL_CEILING: i32 = 50;
const CASUAL_DISCOUNT: i32 = 15;

const URGENCY_TERMS: &[&str] = &[
    "urgent", "urgently", "immediately", "immediate", "block", "blocked", "suspend", "suspended",
    "today", "tonight", "act now", "expire", "expires", "expired", "deadline", "within 24 hours",
    "last chance", "final notice", "asap", "right away", "disconnected",
];

const LURE_TERMS: &[&str] = &[
    "won", "winner", "prize", "lottery", "jackpot", "reward", "cashback", "credited", "gift card",
    "free", "claim", "refund", "bonus", "pre-approved", "loan", "earn", "congratulations",
    "congratulation", "lakhs", "un-redeemed",
];

const CREDENTIAL_TERMS: &[&str] = &[
    "otp", "one time password", "one-time password", "verification code", "pin", "upi pin",
    "password", "cvv", "login details", "verify your account", "verify your identity",
    "confirm your details", "kyc", "pan card", "aadhaar", "card number", "share the code",
    "security code",
];

const AI_TONE_TERMS: &[&str] = &[
    "kindly", "please be advised", "we regret to inform", "valued customer", "dear customer",
    "dear user", "ensure compliance", "apologies for the inconvenience", "as per our records",
    "hereby", "do the needful", "we have detected", "for your security", "please note that",
];

const SOCIAL_TERMS: &[&str] = &[
    "hi mum", "hi mom", "hi dad", "new number", "my phone broke", "lost my phone", "can you send",
    "send me", "help me out", "quick favour", "quick favor", "i need a favour", "i need a favor",
    "don't tell", "whatsapp me", "text me on",
];

const CASUAL_TERMS: &[&str] = &[
    "hey", "hi", "hello", "lol", "haha", "how's", "how are you", "lunch", "dinner", "meet",
    "meeting", "saturday", "weekend", "tomorrow", "tomo", "see you", "thanks", "miss you", "kids",
    "school", "home",
];

const OFFICIAL_CLAIM_TERMS: &[&str] = &[
    "bank", "official", "department", "government", "ministry", "income tax", "support team",
    "security team", "customer care", "helpdesk", "police", "tax refund",
];

const CONSUMER_MAIL_DOMAINS: &[&str] = &[
    "gmail.com", "googlemail.com", "yahoo.com", "yahoo.co.in", "outlook.com", "hotmail.com",
    "live.com", "aol.com", "protonmail.com", "proton.me", "icloud.com", "rediffmail.com",
    "yandex.com", "mail.com", "gmx.com", "zoho.com",
];

const COMMON_TYPOS: &[&str] = &[
    "immedately", "immediatly", "acount", "accout", "verfy", "recieve", "recieved",
    "benifit", "suspened", "passwrd", "congratulation", "costumer", "offical", "securty",
];

static URGENCY: Lazy<Regex> = Lazy::new(|| keyword_pattern(URGENCY_TERMS));
static LURES: Lazy<Regex> = Lazy::new(|| keyword_pattern(LURE_TERMS));
static CREDENTIALS: Lazy<Regex> = Lazy::new(|| keyword_pattern(CREDENTIAL_TERMS));
static AI_TONE: Lazy<Regex> = Lazy::new(|| keyword_pattern(AI_TONE_TERMS));
static SOCIAL: Lazy<Regex> = Lazy::new(|| keyword_pattern(SOCIAL_TERMS));
static CASUAL: Lazy<Regex> = Lazy::new(|| keyword_pattern(CASUAL_TERMS));
static OFFICIAL_CLAIMS: Lazy<Regex> = Lazy::new(|| keyword_pattern(OFFICIAL_CLAIM_TERMS));
static TYPOS: Lazy<Regex> = Lazy::new(|| keyword_pattern(COMMON_TYPOS));
static BRAND_PATTERNS: Lazy<Vec<(&'static Brand, Regex)>> = Lazy::new(|| {
    BRANDS
        .iter()
        .map(|brand| (brand, keyword_pattern(&[brand.pattern])))
        .collect()
});
static SENDER_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^\s*(?:sender|from):[ \t]*(.*)$").expect("sender pattern compiles")
});
static SUBJECT_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^\s*subject:[ \t]*(.*)$").expect("subject pattern compiles")
});
static DANGEROUS_ATTACHMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\.(?:exe|scr|js|vbs|bat|cmd|zip|rar|iso|html?)\b")
        .expect("attachment pattern compiles")
});
static DOCUMENT_ATTACHMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\battach(?:ed|ment|ments)?\b|\.(?:pdf|docx?|xlsx?)\b")
        .expect("document pattern compiles")
});
static SHOUTED_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z]{4,}\b").expect("caps pattern compiles"));

/// Word-bounded, case-insensitive alternation over a keyword list. Spaces in
/// phrases match any run of whitespace.
fn keyword_pattern(terms: &[&str]) -> Regex {
    let alternation = terms
        .iter()
        .map(|term| regex::escape(term).replace(' ', r"\s+"))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{alternation})\b")).expect("keyword pattern compiles")
}

/// Distinct matches of a keyword set, in order of appearance, as written in
/// the original text.
fn matches<'t>(pattern: &Regex, text: &'t str) -> Vec<&'t str> {
    let mut seen: Vec<&'t str> = Vec::new();
    for found in pattern.find_iter(text) {
        let phrase = found.as_str();
        if !seen.iter().any(|known| known.eq_ignore_ascii_case(phrase)) {
            seen.push(phrase);
        }
    }
    seen
}

pub fn level_for_score(score: u8) -> RiskLevel {
    match score {
        80..=u8::MAX => RiskLevel::Critical,
        60..=79 => RiskLevel::High,
        30..=59 => RiskLevel::Suspicious,
        _ => RiskLevel::Safe,
    }
}

pub fn calibration_for_score(score: u8) -> Grade {
    if score >= 80 || score <= 15 {
        Grade::High
    } else {
        Grade::Medium
    }
}

#[derive(Debug, Default)]
struct Findings {
    score: i32,
    reasons: Vec<String>,
    signals: Vec<String>,
    phrases: Vec<String>,
    fraud_types: Vec<String>,
    detected: DetectedSignals,
    social_engineering: bool,
    lure: bool,
}

impl Findings {
    fn add(&mut self, weight: i32, signal: &str, reason: String) {
        self.score += weight;
        self.reasons.push(reason);
        if !self.signals.iter().any(|known| known == signal) {
            self.signals.push(signal.to_string());
        }
    }

    fn tag(&mut self, fraud_type: &str) {
        if !self.fraud_types.iter().any(|known| known == fraud_type) {
            self.fraud_types.push(fraud_type.to_string());
        }
    }

    fn highlight<S: AsRef<str>>(&mut self, phrases: &[S]) {
        for phrase in phrases {
            let phrase = phrase.as_ref();
            if !self.phrases.iter().any(|known| known.eq_ignore_ascii_case(phrase)) {
                self.phrases.push(phrase.to_string());
            }
        }
    }
}

/// Scores a message without any network access. Email submissions are
/// recognised by their `sender:` / `subject:` header lines.
pub fn score_text(text: &str) -> AnalysisResponse {
    let mut findings = Findings::default();
    let links: Vec<LinkReport> = links::extract_urls(text)
        .iter()
        .filter_map(|url| LinkReport::inspect(url))
        .collect();

    score_keywords(text, &mut findings);
    let brand = score_brands(text, &mut findings);
    score_links(&links, &mut findings);
    let email = score_email_headers(text, brand, &mut findings);
    let bank_verification = verify_brand(brand, &links, &email);
    apply_casual_discount(text, &mut findings);

    let dataset_match = dataset::find_match(text);
    if let Some(item) = dataset_match {
        apply_dataset_tier(item, &mut findings);
    }

    let risk_score = findings.score.clamp(0, 100) as u8;
    let risk_level = level_for_score(risk_score);
    let is_fraud = risk_level.is_fraud();

    if !is_fraud {
        findings.fraud_types = vec!["None".to_string()];
    } else if findings.fraud_types.is_empty() {
        findings.tag("Possible Scam");
    }

    let shortened = links.iter().any(|link| link.shortened);
    let link_analysis = links
        .iter()
        .find(|link| link.is_suspicious())
        .or_else(|| links.first())
        .map(LinkAnalysis::from)
        .unwrap_or_default();

    let campaign_detected = dataset_match
        .map(|item| matches!(item.risk_tier, RiskTier::High | RiskTier::Critical))
        .unwrap_or(false)
        || (shortened && findings.detected.urgency)
        || (findings.lure && findings.detected.suspicious_url);

    let similar_case_match = dataset_match.map(|item| SimilarCase {
        id: item.id.to_string(),
        similarity_score: similarity(text, item),
        description: item.explanation.to_string(),
    });

    let confidence_calibration = calibration_for_score(risk_score);

    AnalysisResponse {
        input_id: None,
        is_fraud,
        risk_score,
        risk_level,
        fraud_type: findings.fraud_types.clone(),
        why_fraud: findings.reasons.clone(),
        risky_phrases: findings.phrases.clone(),
        detected_signals: findings.detected.clone(),
        link_analysis,
        similar_case_match,
        text_error_analysis: Some(text_errors(text)),
        bank_verification,
        email_analysis: email,
        image_analysis: ImageAnalysis::default(),
        counterfactual_safe_conditions: counterfactuals(&findings),
        campaign_detected,
        recommended_action: recommended_actions(risk_score),
        model_self_check: ModelSelfCheck {
            possible_misclassification_reason: misclassification_note(risk_score).to_string(),
            confidence_calibration,
        },
        confidence: confidence(risk_score, confidence_calibration),
        explanation: explanation(risk_level, risk_score, dataset_match, &findings.reasons),
        signals: findings.signals.clone(),
        tone: tone(&findings),
    }
}

/// Folds an attached screenshot into a heuristic verdict. The scorer cannot
/// read pixels, so only the text-derived risk is carried over.
pub fn annotate_image(response: &mut AnalysisResponse) {
    response.image_analysis = ImageAnalysis {
        is_safe_content: !response.is_fraud,
        visual_anomalies: Vec::new(),
        ocr_text_risk: match response.risk_level {
            RiskLevel::Safe => Grade::Low,
            RiskLevel::Suspicious => Grade::Medium,
            RiskLevel::High | RiskLevel::Critical => Grade::High,
        },
    };
}

fn score_keywords(text: &str, findings: &mut Findings) {
    let urgency = matches(&URGENCY, text);
    if !urgency.is_empty() {
        findings.detected.urgency = true;
        findings.add(
            URGENCY_WEIGHT,
            "Urgency",
            format!("Uses high-pressure urgency language ({})", urgency.join(", ")),
        );
        findings.highlight(&urgency);
    }

    let lures = matches(&LURES, text);
    if !lures.is_empty() {
        findings.lure = true;
        let weight = (lures.len() as i32 * LURE_WEIGHT_PER_MATCH).min(LURE_WEIGHT_CAP);
        findings.add(
            weight,
            "Financial Lure",
            format!("Dangles money, prizes or rewards ({})", lures.join(", ")),
        );
        findings.tag("Financial Scam");
        findings.highlight(&lures);
    }

    let credentials = matches(&CREDENTIALS, text);
    if !credentials.is_empty() {
        findings.detected.otp_request = true;
        findings.add(
            CREDENTIAL_WEIGHT,
            "Credential Request",
            "Requests OTP, PIN or account credentials".to_string(),
        );
        findings.tag("Identity Theft");
        findings.highlight(&credentials);
    }

    let formal = matches(&AI_TONE, text);
    if formal.len() >= 2 {
        findings.detected.ai_generated_tone = true;
        findings.add(
            AI_TONE_WEIGHT,
            "AI-Generated Tone",
            "Formal template phrasing typical of generated scam messages".to_string(),
        );
        findings.tag("AI Generated");
    }

    let social = matches(&SOCIAL, text);
    if social.len() >= 2 {
        findings.social_engineering = true;
        findings.add(
            SOCIAL_WEIGHT,
            "Social Engineering",
            format!("Casual social-engineering phrasing ({})", social.join(", ")),
        );
        findings.tag("Social Engineering");
        findings.highlight(&social);
    }
}

fn score_brands(text: &str, findings: &mut Findings) -> Option<&'static Brand> {
    let mut found: Option<&'static Brand> = None;
    let mut mentions: Vec<&str> = Vec::new();

    for (brand, pattern) in BRAND_PATTERNS.iter() {
        if let Some(hit) = pattern.find(text) {
            found.get_or_insert(*brand);
            mentions.push(hit.as_str());
        }
    }

    let brand = found?;
    let kind = if brand.is_bank { "bank" } else { "brand" };
    findings.detected.impersonation = true;
    findings.add(
        BRAND_WEIGHT,
        "Brand Impersonation",
        format!("Mentions {}, a commonly impersonated {kind}", brand.name),
    );
    findings.tag("Impersonation");
    findings.highlight(&mentions);
    Some(brand)
}

fn score_links(links: &[LinkReport], findings: &mut Findings) {
    if let Some(link) = links.iter().find(|link| link.shortened) {
        findings.detected.suspicious_url = true;
        findings.add(
            SHORTENER_WEIGHT,
            "Shortened URL",
            format!("Uses URL shortener to hide the destination ({})", link.domain),
        );
        findings.highlight(&[link.url.as_str()]);
    }

    if let Some(link) = links.iter().find(|link| link.is_suspicious()) {
        findings.detected.suspicious_url = true;
        findings.add(
            SUSPICIOUS_LINK_WEIGHT,
            "Suspicious Domain",
            format!(
                "Link domain '{}' looks suspicious: {}",
                link.domain,
                link.summary().join("; ")
            ),
        );
        findings.tag("Phishing");
        findings.highlight(&[link.url.as_str()]);
    }
}

fn score_email_headers(
    text: &str,
    brand: Option<&'static Brand>,
    findings: &mut Findings,
) -> EmailAnalysis {
    let lower = text.to_lowercase();
    if !(lower.contains("sender:") || lower.contains("subject:")) {
        return EmailAnalysis::default();
    }

    let sender = capture(&SENDER_LINE, text);
    let subject = capture(&SUBJECT_LINE, text);
    let from_domain = sender.as_deref().and_then(sender_domain);
    let mut notes: Vec<String> = Vec::new();

    let claims_official = brand.is_some() || OFFICIAL_CLAIMS.is_match(text);
    let consumer_mailbox = from_domain
        .as_deref()
        .map(|domain| CONSUMER_MAIL_DOMAINS.contains(&domain))
        .unwrap_or(false);
    let spoofing_domain = from_domain
        .as_deref()
        .filter(|_| !consumer_mailbox)
        .and_then(LinkReport::inspect)
        .map(|report| report.spoofed_brand.is_some())
        .unwrap_or(false);

    let sender_domain_mismatch = (consumer_mailbox && claims_official) || spoofing_domain;
    if sender_domain_mismatch {
        let domain = from_domain.as_deref().unwrap_or("unknown");
        findings.detected.impersonation = true;
        findings.add(
            SENDER_SPOOF_WEIGHT,
            "Email Spoofing",
            format!("Claims to be an official institution but is sent from '{domain}'"),
        );
        findings.tag("Email Spoofing");
        notes.push(format!("Sender domain '{domain}' does not belong to the claimed institution"));
    } else if let Some(domain) = from_domain.as_deref() {
        notes.push(format!("Sender domain '{domain}' shows no spoofing pattern"));
    } else {
        notes.push("No sender address supplied".to_string());
    }

    let urgent_subject = subject
        .as_deref()
        .map(|line| matches(&URGENCY, line))
        .unwrap_or_default();
    let suspicious_subject = !urgent_subject.is_empty();
    if suspicious_subject {
        findings.add(
            URGENT_SUBJECT_WEIGHT,
            "Urgent Subject",
            format!("Subject line pressures the reader ({})", urgent_subject.join(", ")),
        );
        notes.push("Subject line uses urgency".to_string());
    }

    let attachment_risk = if DANGEROUS_ATTACHMENT.is_match(text) {
        notes.push("References an executable or archive attachment".to_string());
        AttachmentRisk::High
    } else if DOCUMENT_ATTACHMENT.is_match(text) {
        AttachmentRisk::Low
    } else {
        AttachmentRisk::None
    };

    EmailAnalysis {
        is_email: true,
        sender_domain_mismatch,
        suspicious_subject,
        attachment_risk,
        headers_analysis: notes.join(". "),
    }
}

fn capture(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|value| value.as_str().trim().to_string())
        .filter(|value| !value.is_empty())
}

fn sender_domain(sender: &str) -> Option<String> {
    let (_, domain) = sender.rsplit_once('@')?;
    let domain = domain
        .trim()
        .trim_end_matches(['>', ')', ']', '"', '\''])
        .to_lowercase();
    (!domain.is_empty()).then_some(domain)
}

fn verify_brand(
    brand: Option<&'static Brand>,
    links: &[LinkReport],
    email: &EmailAnalysis,
) -> BankVerification {
    let Some(brand) = brand else {
        return BankVerification::default();
    };

    let official_link = links.iter().any(|link| brand.owns(&link.domain));
    let any_suspicious = links.iter().any(|link| link.is_suspicious());
    let is_official_domain = official_link && !any_suspicious && !email.sender_domain_mismatch;

    let official = brand.official_domains.first().copied().unwrap_or("unknown");
    let risk_reason = if is_official_domain {
        None
    } else if let Some(link) = links.iter().find(|link| brand.spoofed_by(&link.domain)) {
        Some(format!(
            "Link domain '{}' imitates {}; the official domain is {}",
            link.domain, brand.name, official
        ))
    } else if let Some(link) = links.iter().find(|link| !brand.owns(&link.domain)) {
        Some(format!(
            "Link domain '{}' is not an official {} domain ({})",
            link.domain, brand.name, official
        ))
    } else if email.sender_domain_mismatch {
        Some(format!(
            "Claims to be {} but the sender address is not an official {} mailbox",
            brand.name, official
        ))
    } else {
        Some(format!(
            "{} is mentioned but no official {} link is referenced",
            brand.name, official
        ))
    };

    BankVerification {
        detected_bank: Some(brand.name.to_string()),
        is_official_domain,
        risk_reason,
    }
}

fn apply_casual_discount(text: &str, findings: &mut Findings) {
    let casual = matches(&CASUAL, text).len() as i32;
    if casual >= 2 && findings.score < CASUAL_CEILING && !findings.social_engineering {
        findings.score = (findings.score - casual * CASUAL_DISCOUNT).max(0);
    }
}

fn apply_dataset_tier(item: &DemoDatasetItem, findings: &mut Findings) {
    findings.score = i32::from(item.risk_tier.anchor_score());
    findings.add(
        0,
        "Known Pattern",
        format!("Matches known pattern '{}'", item.label),
    );
    if item.fraud_type != "None" {
        findings.fraud_types.retain(|known| known != item.fraud_type);
        findings.fraud_types.insert(0, item.fraud_type.to_string());
    }
}

fn similarity(text: &str, item: &DemoDatasetItem) -> u8 {
    let input = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let entry = item.text.split_whitespace().collect::<Vec<_>>().join(" ");
    if input.eq_ignore_ascii_case(&entry) {
        100
    } else {
        90
    }
}

fn text_errors(text: &str) -> TextErrorAnalysis {
    let typos: Vec<String> = matches(&TYPOS, text)
        .into_iter()
        .map(str::to_string)
        .collect();

    let mut grammar_issues = Vec::new();
    if SHOUTED_WORD.find_iter(text).count() >= 3 {
        grammar_issues.push("Excessive capitalisation".to_string());
    }
    if text.contains("!!") {
        grammar_issues.push("Repeated exclamation marks".to_string());
    }
    if text.contains(" ,") || text.contains(" .") {
        grammar_issues.push("Space before punctuation".to_string());
    }

    let score = (typos.len() * 20 + grammar_issues.len() * 15).min(100) as u8;
    TextErrorAnalysis {
        typos,
        grammar_issues,
        score,
    }
}

fn counterfactuals(findings: &Findings) -> Vec<String> {
    let signals = &findings.detected;
    let mut conditions = Vec::new();
    if signals.urgency {
        conditions.push("The message set no deadline and threatened no blocking".to_string());
    }
    if signals.suspicious_url {
        conditions.push("Every link pointed to a verified official domain".to_string());
    }
    if signals.otp_request {
        conditions.push("The message asked for no OTP, PIN or password".to_string());
    }
    if signals.impersonation {
        conditions.push("The sender was verifiably the named organisation".to_string());
    }
    if findings.lure {
        conditions.push("No money, prize or credit was offered".to_string());
    }
    conditions
}

fn recommended_actions(score: u8) -> Vec<String> {
    let actions: &[&str] = match score {
        80..=u8::MAX => &[
            "Do NOT click any links or call back numbers in this message",
            "Never share OTP, PIN or passwords with anyone",
            "Report the message to your bank and the cybercrime helpline",
            "Block the sender",
        ],
        30..=79 => &[
            "Verify the sender through an official channel before acting",
            "Do not share personal or banking details",
            "Avoid opening shortened or unfamiliar links",
        ],
        _ => &[
            "No action needed",
            "Stay alert for follow-up messages asking for money or codes",
        ],
    };
    actions.iter().map(|action| action.to_string()).collect()
}

fn misclassification_note(score: u8) -> &'static str {
    match score {
        80..=u8::MAX => "Genuine institutional alerts can share urgency wording and brand names",
        30..=79 => "Promotional messages often resemble scams; mixed signals lower certainty",
        _ => "Novel scam wording outside the keyword rules may be missed",
    }
}

fn confidence(score: u8, calibration: Grade) -> u8 {
    match calibration {
        Grade::High if score >= 80 => 70 + score / 4,
        Grade::High => 90,
        _ => 60 + score / 10,
    }
}

fn explanation(
    level: RiskLevel,
    score: u8,
    dataset_match: Option<&DemoDatasetItem>,
    reasons: &[String],
) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(item) = dataset_match {
        parts.push(item.explanation.to_string());
    }
    if level == RiskLevel::Safe && dataset_match.is_none() {
        parts.push("No significant fraud indicators detected.".to_string());
    }
    if !reasons.is_empty() {
        parts.push(format!(
            "{} risk (score {}/100): {}.",
            level,
            score,
            reasons.join("; ")
        ));
    }
    parts.join(" ")
}

fn tone(findings: &Findings) -> Tone {
    let signals = &findings.detected;
    if findings.social_engineering || (signals.impersonation && signals.otp_request) {
        Tone::Manipulative
    } else if signals.urgency {
        Tone::Urgent
    } else if signals.ai_generated_tone {
        Tone::AiLike
    } else {
        Tone::Normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::DEMO_DATASET;

    const SBI_SCAM: &str =
        "Your SBI account will be blocked today. Verify immediately: http://sbi-secure-login.xyz";

    #[test]
    fn thresholds_follow_expected_tiers() {
        assert_eq!(level_for_score(100), RiskLevel::Critical);
        assert_eq!(level_for_score(80), RiskLevel::Critical);
        assert_eq!(level_for_score(79), RiskLevel::High);
        assert_eq!(level_for_score(60), RiskLevel::High);
        assert_eq!(level_for_score(59), RiskLevel::Suspicious);
        assert_eq!(level_for_score(30), RiskLevel::Suspicious);
        assert_eq!(level_for_score(29), RiskLevel::Safe);
        assert_eq!(level_for_score(0), RiskLevel::Safe);
    }

    #[test]
    fn sbi_block_scam_is_critical() {
        let result = score_text(SBI_SCAM);

        assert!(result.detected_signals.urgency);
        assert!(result.detected_signals.impersonation);
        assert!(result.detected_signals.suspicious_url);
        assert_eq!(result.risk_level, RiskLevel::Critical);
        assert!(result.is_fraud);
        assert!(result
            .risky_phrases
            .iter()
            .any(|phrase| ["blocked", "today", "immediately"].contains(&phrase.as_str())));
        assert_eq!(result.link_analysis.domain, "sbi-secure-login.xyz");
        assert!(result.link_analysis.brand_spoofing);
    }

    #[test]
    fn spoofed_bank_domain_fails_verification() {
        let result = score_text(SBI_SCAM);
        let verification = &result.bank_verification;

        assert_eq!(verification.detected_bank.as_deref(), Some("SBI"));
        assert!(!verification.is_official_domain);
        assert!(verification.risk_reason.is_some());
    }

    #[test]
    fn official_bank_link_passes_verification() {
        let result = score_text(
            "Your HDFC statement is ready at https://netbanking.hdfcbank.com/statements",
        );
        assert!(result.bank_verification.is_official_domain);
        assert!(result.bank_verification.risk_reason.is_none());
        assert!(!result.detected_signals.suspicious_url);
    }

    #[test]
    fn urgency_contributes_at_least_its_weight() {
        for word in ["urgent", "immediately", "block", "blocked", "suspend", "today"] {
            let result = score_text(&format!("Please respond {word} regarding the parcel"));
            assert!(result.detected_signals.urgency, "{word} should flag urgency");
            assert!(i32::from(result.risk_score) >= URGENCY_WEIGHT, "{word} scored too low");
        }
    }

    #[test]
    fn dataset_entries_keep_their_editorial_tier() {
        for item in DEMO_DATASET {
            let result = score_text(item.text);
            let expected: RiskLevel = item.risk_tier.as_str().parse().unwrap();
            assert_eq!(result.risk_level, expected, "entry {}", item.id);
            assert_eq!(result.is_fraud, item.risk_tier != RiskTier::Low, "entry {}", item.id);
            assert_eq!(result.risk_score, item.risk_tier.anchor_score());
        }
    }

    #[test]
    fn otp_dataset_text_is_critical_fraud() {
        let item = dataset::find_by_id("otp-share").unwrap();
        let result = score_text(item.text);

        assert_eq!(result.risk_level, RiskLevel::Critical);
        assert!(result.is_fraud);
        assert!(result.detected_signals.otp_request);
        assert_eq!(result.fraud_type.first().map(String::as_str), Some("Identity Theft"));
        assert_eq!(result.similar_case_match.map(|case| case.similarity_score), Some(100));
    }

    #[test]
    fn dataset_override_preserves_accumulated_reasons() {
        let item = dataset::find_by_id("bank-kyc").unwrap();
        let result = score_text(item.text);

        assert!(result.signals.iter().any(|signal| signal == "Urgency"));
        assert!(result.signals.iter().any(|signal| signal == "Known Pattern"));
        assert!(result.detected_signals.otp_request);
    }

    #[test]
    fn scoring_is_idempotent() {
        let first = score_text(SBI_SCAM);
        let second = score_text(SBI_SCAM);
        assert_eq!(first, second);
    }

    #[test]
    fn casual_chat_is_safe() {
        let result = score_text("hey! are we still on for lunch tomorrow? the kids are at school");
        assert_eq!(result.risk_score, 0);
        assert_eq!(result.risk_level, RiskLevel::Safe);
        assert!(!result.is_fraud);
        assert_eq!(result.fraud_type, vec!["None".to_string()]);
        assert_eq!(result.model_self_check.confidence_calibration, Grade::High);
    }

    #[test]
    fn casual_markers_soften_a_weak_signal() {
        let result = score_text("hey, see you at dinner today!");
        assert!(result.detected_signals.urgency);
        assert_eq!(result.risk_score, 0);
    }

    #[test]
    fn family_impersonation_is_not_discounted() {
        let result = score_text(
            "Hi mum, this is my new number. Can you send me 200 for rent, I'll explain at home",
        );
        assert!(result.signals.iter().any(|signal| signal == "Social Engineering"));
        assert_eq!(result.tone, Tone::Manipulative);
        assert!(result.risk_score > 0);
    }

    #[test]
    fn lure_weight_is_capped() {
        let result = score_text("Winner! Claim your free prize, lottery jackpot bonus reward");
        assert_eq!(result.risk_score as i32, LURE_WEIGHT_CAP);
        assert_eq!(result.risk_level, RiskLevel::Suspicious);
    }

    #[test]
    fn formal_tone_needs_two_phrases() {
        let once = score_text("Kindly review the attached agenda.");
        assert!(!once.detected_signals.ai_generated_tone);

        let twice = score_text("Dear customer, kindly review your statement.");
        assert!(twice.detected_signals.ai_generated_tone);
        assert!(twice.signals.iter().any(|signal| signal == "AI-Generated Tone"));
    }

    #[test]
    fn consumer_mailbox_posing_as_bank_is_spoofing() {
        let email = "[EMAIL_HEADER_ANALYSIS_REQUEST]\nSENDER: icici.alerts@gmail.com\nSUBJECT: Urgent: account suspended\nBODY:\nYour ICICI Bank netbanking is locked. Reply with your details.";
        let result = score_text(email);

        assert!(result.email_analysis.is_email);
        assert!(result.email_analysis.sender_domain_mismatch);
        assert!(result.email_analysis.suspicious_subject);
        assert!(result.fraud_type.iter().any(|kind| kind == "Email Spoofing"));
        assert!(result.risk_score >= 80);
        assert!(result.bank_verification.risk_reason.is_some());
    }

    #[test]
    fn ordinary_email_from_consumer_mailbox_is_not_spoofing() {
        let email = "SENDER: sam@gmail.com\nSUBJECT: photos from the trip\nBODY:\nAttached are the pictures, see you soon.";
        let result = score_text(email);

        assert!(result.email_analysis.is_email);
        assert!(!result.email_analysis.sender_domain_mismatch);
        assert!(!result.email_analysis.suspicious_subject);
        assert_eq!(result.email_analysis.attachment_risk, AttachmentRisk::Low);
    }

    #[test]
    fn executable_attachment_is_high_risk() {
        let email = "Subject: invoice\nPlease open invoice_2024.exe to view the amount due.";
        let result = score_text(email);
        assert_eq!(result.email_analysis.attachment_risk, AttachmentRisk::High);
    }

    #[test]
    fn plain_text_yields_empty_email_block() {
        let result = score_text("Meeting moved to 3pm.");
        assert_eq!(result.email_analysis, EmailAnalysis::default());
        assert_eq!(result.bank_verification, BankVerification::default());
    }

    #[test]
    fn empty_input_still_returns_a_full_verdict() {
        let result = score_text("");
        assert_eq!(result.risk_score, 0);
        assert_eq!(result.risk_level, RiskLevel::Safe);
        assert!(result.similar_case_match.is_none());
        assert!(!result.explanation.is_empty());
        assert!(!result.recommended_action.is_empty());
    }

    #[test]
    fn recommended_actions_differ_by_band() {
        assert_ne!(recommended_actions(90), recommended_actions(45));
        assert_ne!(recommended_actions(45), recommended_actions(5));
        assert_eq!(recommended_actions(80), recommended_actions(99));
    }

    #[test]
    fn calibration_is_high_only_at_the_extremes() {
        assert_eq!(calibration_for_score(95), Grade::High);
        assert_eq!(calibration_for_score(10), Grade::High);
        assert_eq!(calibration_for_score(50), Grade::Medium);
    }

    #[test]
    fn image_annotation_tracks_text_risk() {
        let mut result = score_text(SBI_SCAM);
        annotate_image(&mut result);
        assert_eq!(result.image_analysis.ocr_text_risk, Grade::High);
        assert!(!result.image_analysis.is_safe_content);
    }

    #[test]
    fn googlemail_sender_without_official_claim_is_not_spoofing() {
        let email = "SENDER: sam@googlemail.com\nSUBJECT: photos from the trip\nBODY:\nHere are the pictures from the weekend.";
        let result = score_text(email);

        assert!(!result.email_analysis.sender_domain_mismatch);
        assert_eq!(result.risk_score, 0);
        assert_eq!(result.risk_level, RiskLevel::Safe);
        assert_eq!(result.fraud_type, vec!["None".to_string()]);
    }

    #[test]
    fn shortener_adds_its_weight() {
        let result = score_text("see bit.ly/x");
        assert_eq!(i32::from(result.risk_score), SHORTENER_WEIGHT);
        assert!(result.detected_signals.suspicious_url);
        assert!(result.link_analysis.shortened);
    }

    #[test]
    fn credential_request_adds_its_weight() {
        let result = score_text("Please read out the OTP");
        assert_eq!(i32::from(result.risk_score), CREDENTIAL_WEIGHT);
        assert!(result.detected_signals.otp_request);
        assert!(result.fraud_type.iter().any(|kind| kind == "Identity Theft"));
    }

    #[test]
    fn risky_tld_adds_suspicious_link_weight() {
        let result = score_text("Details at http://example.xyz");
        assert_eq!(i32::from(result.risk_score), SUSPICIOUS_LINK_WEIGHT);
        assert!(result.detected_signals.suspicious_url);
        assert!(!result.link_analysis.shortened);
    }

    #[test]
    fn scam_style_host_adds_suspicious_link_weight() {
        let result = score_text("Go to http://verify-portal.com/start");
        assert_eq!(i32::from(result.risk_score), SUSPICIOUS_LINK_WEIGHT);
        assert_eq!(result.link_analysis.domain, "verify-portal.com");
    }

    #[test]
    fn social_engineering_adds_its_weight() {
        let result = score_text("hi mum, my phone broke so this is my new number");
        assert_eq!(i32::from(result.risk_score), SOCIAL_WEIGHT);
        assert_eq!(result.tone, Tone::Manipulative);
    }

    #[test]
    fn urgent_subject_adds_on_top_of_body_urgency() {
        let email = "SUBJECT: Account suspended\nSENDER: bob@example.org\nBODY:\nPlease review.";
        let result = score_text(email);

        assert!(result.email_analysis.suspicious_subject);
        assert!(!result.email_analysis.sender_domain_mismatch);
        assert_eq!(
            i32::from(result.risk_score),
            URGENCY_WEIGHT + URGENT_SUBJECT_WEIGHT
        );
    }

    #[test]
    fn urgent_short_link_is_a_campaign() {
        let result = score_text("Act now: bit.ly/deal");
        assert_eq!(
            i32::from(result.risk_score),
            URGENCY_WEIGHT + SHORTENER_WEIGHT
        );
        assert!(result.campaign_detected);
        assert!(!score_text("Meeting moved to 3pm.").campaign_detected);
    }

    #[test]
    fn misspellings_are_listed_as_typos() {
        let result = score_text("Please verfy your acount");
        let errors = result.text_error_analysis.unwrap();
        assert_eq!(errors.typos, vec!["verfy".to_string(), "acount".to_string()]);
        assert!(errors.score > 0);
    }
}
