use std::collections::HashMap;
use std::fmt::{self, Write};

use crate::analyzer::Analysis;
use crate::dataset::DEMO_DATASET;
use crate::links::LinkReport;
use crate::models::{AnalysisRecord, AnalysisResponse, AttachmentRisk, RiskLevel};

#[derive(Debug, Clone, PartialEq)]
pub struct LevelSummary {
    pub level: Option<RiskLevel>,
    pub count: usize,
    pub avg_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Completed,
    Flagged,
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepStatus::Completed => f.write_str("Completed"),
            StepStatus::Flagged => f.write_str("Flagged"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineStep {
    pub title: &'static str,
    pub detail: String,
    pub status: StepStatus,
}

/// One scored row of a batch run.
#[derive(Debug, Clone)]
pub struct BatchRow {
    pub line: usize,
    pub label: Option<String>,
    pub response: AnalysisResponse,
}

fn flag(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

fn bullet_list(output: &mut String, items: &[String], empty: &str) {
    if items.is_empty() {
        let _ = writeln!(output, "- {empty}");
    } else {
        for item in items {
            let _ = writeln!(output, "- {item}");
        }
    }
}

pub fn render_summary(analysis: &Analysis) -> String {
    let response = &analysis.response;
    let mut output = String::new();

    let _ = writeln!(
        output,
        "Verdict: {} (score {}/100, confidence {}%)",
        response.risk_level, response.risk_score, response.confidence
    );
    let _ = writeln!(output, "Source: {}", analysis.route);
    if let Some(id) = &response.input_id {
        let _ = writeln!(output, "Analysis id: {id}");
    }
    let _ = writeln!(output, "Fraud type: {}", response.fraud_type.join(", "));
    if !response.explanation.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "{}", response.explanation);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "Why:");
    bullet_list(&mut output, &response.why_fraud, "No fraud indicators found");

    if !response.risky_phrases.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "Risky phrases: {}", response.risky_phrases.join(" | "));
    }

    let signals = &response.detected_signals;
    let _ = writeln!(output);
    let _ = writeln!(output, "Signals:");
    for (name, value) in [
        ("urgency", signals.urgency),
        ("impersonation", signals.impersonation),
        ("otp request", signals.otp_request),
        ("suspicious url", signals.suspicious_url),
        ("ai-generated tone", signals.ai_generated_tone),
        ("image/text mismatch", signals.image_text_mismatch),
        ("fake branding", signals.fake_branding),
        ("visual artifacts", signals.visual_artifacts),
    ] {
        let _ = writeln!(output, "  {:<20} {}", name, flag(value));
    }

    let bank = &response.bank_verification;
    if let Some(name) = &bank.detected_bank {
        let _ = writeln!(output);
        let _ = writeln!(
            output,
            "Bank check: {} ({})",
            name,
            if bank.is_official_domain {
                "official domain"
            } else {
                "not verified"
            }
        );
        if let Some(reason) = &bank.risk_reason {
            let _ = writeln!(output, "  {reason}");
        }
    }

    if let Some(case) = &response.similar_case_match {
        let _ = writeln!(output);
        let _ = writeln!(
            output,
            "Similar known case: {} ({}% similar) {}",
            case.id, case.similarity_score, case.description
        );
    }

    if !response.counterfactual_safe_conditions.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "Would be safe if:");
        bullet_list(&mut output, &response.counterfactual_safe_conditions, "");
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "Recommended actions:");
    bullet_list(&mut output, &response.recommended_action, "No action needed");

    output
}

pub fn render_email(response: &AnalysisResponse) -> String {
    let email = &response.email_analysis;
    let mut output = String::new();

    let _ = writeln!(output, "# Email Analysis");
    if !email.is_email {
        let _ = writeln!(output, "The input was not recognised as an email.");
        return output;
    }

    let attachment = match email.attachment_risk {
        AttachmentRisk::None => "none",
        AttachmentRisk::Low => "low",
        AttachmentRisk::High => "high",
    };
    let _ = writeln!(output, "- Sender domain mismatch: {}", flag(email.sender_domain_mismatch));
    let _ = writeln!(output, "- Suspicious subject: {}", flag(email.suspicious_subject));
    let _ = writeln!(output, "- Attachment risk: {attachment}");
    let _ = writeln!(output);
    let _ = writeln!(output, "{}", email.headers_analysis);
    let _ = writeln!(
        output,
        "Verdict: {} ({}/100)",
        response.risk_level, response.risk_score
    );

    output
}

/// Link intelligence for a verdict, plus notes for every inspected URL.
pub fn render_links(response: &AnalysisResponse, reports: &[LinkReport]) -> String {
    let link = &response.link_analysis;
    let mut output = String::new();

    let _ = writeln!(output, "# Link Intelligence");
    if link.domain.is_empty() && reports.is_empty() {
        let _ = writeln!(output, "No links found in the input.");
        return output;
    }

    if !link.domain.is_empty() {
        let _ = writeln!(output, "Primary domain: {}", link.domain);
        let _ = writeln!(output, "- Shortened: {}", flag(link.shortened));
        let _ = writeln!(output, "- Brand spoofing: {}", flag(link.brand_spoofing));
        let _ = writeln!(output, "- Search presence: {}", link.google_presence);
    }

    for report in reports {
        let _ = writeln!(output);
        let _ = write!(output, "{}", render_link_check(report));
    }

    output
}

pub fn render_link_check(report: &LinkReport) -> String {
    let mut output = String::new();
    let verdict = if report.is_suspicious() {
        "SUSPICIOUS"
    } else if report.shortened {
        "UNVERIFIED"
    } else {
        "NO KNOWN THREAT"
    };

    let _ = writeln!(output, "{} [{}]", report.url, verdict);
    let _ = writeln!(output, "  domain: {}", report.domain);
    let _ = writeln!(output, "  search presence: {}", report.presence());
    for note in report.summary() {
        let _ = writeln!(output, "  - {note}");
    }
    output
}

pub fn timeline(response: &AnalysisResponse) -> Vec<TimelineStep> {
    let signals = &response.detected_signals;
    let status = |flagged: bool| {
        if flagged {
            StepStatus::Flagged
        } else {
            StepStatus::Completed
        }
    };

    let text_flagged = signals.urgency || signals.otp_request || signals.ai_generated_tone;
    let link_flagged = signals.suspicious_url || response.link_analysis.brand_spoofing;
    let intel_flagged = signals.impersonation
        || response.campaign_detected
        || (response.similar_case_match.is_some() && response.is_fraud);

    vec![
        TimelineStep {
            title: "Text Analysis",
            detail: if response.risky_phrases.is_empty() {
                "No pressure or credential language found".to_string()
            } else {
                format!("Risky phrases: {}", response.risky_phrases.join(", "))
            },
            status: status(text_flagged),
        },
        TimelineStep {
            title: "Link Expansion",
            detail: if response.link_analysis.domain.is_empty() {
                "No links to expand".to_string()
            } else {
                format!(
                    "{} (search presence {})",
                    response.link_analysis.domain, response.link_analysis.google_presence
                )
            },
            status: status(link_flagged),
        },
        TimelineStep {
            title: "Threat Intelligence",
            detail: match &response.similar_case_match {
                Some(case) => format!("Matches known pattern {}", case.id),
                None => "No known campaign matched".to_string(),
            },
            status: status(intel_flagged),
        },
        TimelineStep {
            title: "Final Verdict",
            detail: format!("{} risk, score {}", response.risk_level, response.risk_score),
            status: status(response.is_fraud),
        },
    ]
}

pub fn render_timeline(response: &AnalysisResponse) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# Analysis Timeline");
    for (index, step) in timeline(response).iter().enumerate() {
        let _ = writeln!(
            output,
            "{}. {} [{}] {}",
            index + 1,
            step.title,
            step.status,
            step.detail
        );
    }
    output
}

pub fn render_demo_list() -> String {
    let mut output = String::new();
    for item in DEMO_DATASET {
        let _ = writeln!(
            output,
            "{:<12} {:<9} {}",
            item.id,
            item.risk_tier.as_str(),
            item.label
        );
    }
    output
}

pub fn render_batch(rows: &[BatchRow]) -> String {
    let mut output = String::new();
    if rows.is_empty() {
        let _ = writeln!(output, "No rows found.");
        return output;
    }

    let mut flagged = 0usize;
    let mut disagreements = 0usize;
    for row in rows {
        let response = &row.response;
        if response.is_fraud {
            flagged += 1;
        }
        let expected = row.label.as_deref().map(|label| label.parse::<RiskLevel>());
        let mark = match expected {
            Some(Ok(level)) if level.is_fraud() != response.is_fraud => {
                disagreements += 1;
                " (label disagrees)"
            }
            _ => "",
        };
        let _ = writeln!(
            output,
            "{:>4}  {:<10} {:>3}  {}{}",
            row.line,
            response.risk_level,
            response.risk_score,
            response.fraud_type.join(", "),
            mark
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "{flagged} of {} rows flagged as fraud.", rows.len());
    if disagreements > 0 {
        let _ = writeln!(output, "{disagreements} rows disagree with their label.");
    }
    output
}

pub fn summarize_by_level(records: &[AnalysisRecord]) -> Vec<LevelSummary> {
    let mut map: HashMap<Option<RiskLevel>, (usize, u32, usize)> = HashMap::new();

    for record in records {
        let entry = map.entry(record.risk_level()).or_insert((0, 0, 0));
        entry.0 += 1;
        if let Some(score) = record.risk_score {
            entry.1 += u32::from(score);
            entry.2 += 1;
        }
    }

    let mut summaries: Vec<LevelSummary> = map
        .into_iter()
        .map(|(level, (count, total_score, scored))| LevelSummary {
            level,
            count,
            avg_score: if scored == 0 {
                0.0
            } else {
                f64::from(total_score) / scored as f64
            },
        })
        .collect();

    summaries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| b.level.cmp(&a.level)));
    summaries
}

fn describe(record: &AnalysisRecord) -> String {
    let level = record
        .risk_level()
        .map(|level| level.to_string())
        .unwrap_or_else(|| "Unknown".to_string());
    let score = record
        .risk_score
        .map(|score| score.to_string())
        .unwrap_or_else(|| "?".to_string());
    let fraud_type = record
        .raw
        .get("fraud_type")
        .and_then(|value| value.as_array())
        .map(|types| {
            types
                .iter()
                .filter_map(|value| value.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        })
        .filter(|types| !types.is_empty())
        .unwrap_or_else(|| "unclassified".to_string());

    format!(
        "{} ({}, {}) {} score {} [{}]",
        record.id,
        record.mode.as_deref().unwrap_or("unknown"),
        record.timestamp.format("%Y-%m-%d %H:%M"),
        level,
        score,
        fraud_type
    )
}

pub fn render_history(records: &[AnalysisRecord], limit: usize) -> String {
    let mut output = String::new();
    if records.is_empty() {
        let _ = writeln!(output, "No analyses recorded yet.");
        return output;
    }
    for record in records.iter().take(limit) {
        let _ = writeln!(output, "- {}", describe(record));
    }
    if records.len() > limit {
        let _ = writeln!(output, "({} older analyses not shown)", records.len() - limit);
    }
    output
}

/// Recorded analyses scoring at least `min_score`, newest first.
pub fn alerts(records: &[AnalysisRecord], min_score: u8) -> Vec<&AnalysisRecord> {
    records
        .iter()
        .filter(|record| record.risk_score.is_some_and(|score| score >= min_score))
        .collect()
}

pub fn render_alerts(records: &[AnalysisRecord], min_score: u8) -> String {
    let flagged = alerts(records, min_score);
    let mut output = String::new();
    if flagged.is_empty() {
        let _ = writeln!(output, "No analyses scored {min_score} or higher.");
        return output;
    }
    let _ = writeln!(output, "High-risk alerts (score >= {min_score}):");
    for record in flagged {
        let _ = writeln!(output, "- {}", describe(record));
    }
    output
}

pub fn build_history_report(records: &[AnalysisRecord]) -> String {
    let summaries = summarize_by_level(records);
    let mut output = String::new();

    let _ = writeln!(output, "# Fraud Analysis History Report");
    let _ = writeln!(output, "Covering the {} most recent analyses", records.len());
    let _ = writeln!(output);
    let _ = writeln!(output, "## Risk Level Mix");

    if summaries.is_empty() {
        let _ = writeln!(output, "No analyses recorded yet.");
    } else {
        for summary in summaries.iter() {
            let level = summary
                .level
                .map(|level| level.to_string())
                .unwrap_or_else(|| "Unknown".to_string());
            let _ = writeln!(
                output,
                "- {}: {} analyses (avg score {:.1})",
                level, summary.count, summary.avg_score
            );
        }
    }

    let mut highest: Vec<&AnalysisRecord> = records
        .iter()
        .filter(|record| record.risk_score.is_some())
        .collect();
    highest.sort_by(|a, b| b.risk_score.cmp(&a.risk_score));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Highest Risk Analyses");

    if highest.is_empty() {
        let _ = writeln!(output, "No scored analyses recorded yet.");
    } else {
        for record in highest.iter().take(10) {
            let _ = writeln!(output, "- {}", describe(record));
        }
    }

    let mut recent: Vec<&AnalysisRecord> = records.iter().collect();
    recent.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Most Recent");

    if recent.is_empty() {
        let _ = writeln!(output, "No analyses recorded yet.");
    } else {
        for record in recent.iter().take(5) {
            let _ = writeln!(output, "- {}", describe(record));
        }
    }

    output
}
