use std::collections::{BTreeSet, HashSet};

use regex::{Regex, RegexBuilder};
use serde::Serialize;
use serde_json::json;

use crate::config::{Config, RiskThresholds, ScoringConfig};
use crate::processor::ProcessingAction;
use crate::store::EmailRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Critical,
    High,
    Medium,
    Low,
    Unknown,
}

impl RiskLevel {
    /// Highest qualifying bucket wins; exclusion keywords can push the score
    /// negative, which still lands in Low.
    pub fn from_score(score: i32, thresholds: &RiskThresholds) -> RiskLevel {
        if score >= thresholds.critical {
            RiskLevel::Critical
        } else if score >= thresholds.high {
            RiskLevel::High
        } else if score >= thresholds.medium {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Critical => "critical",
            RiskLevel::High => "high",
            RiskLevel::Medium => "medium",
            RiskLevel::Low => "low",
            RiskLevel::Unknown => "unknown",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Critical => "Critical",
            RiskLevel::High => "High",
            RiskLevel::Medium => "Medium",
            RiskLevel::Low => "Low",
            RiskLevel::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RiskAssessment {
    pub score: i32,
    pub level: RiskLevel,
}

/// Heuristic risk scorer. Keyword patterns are compiled once at
/// construction; all weights come from [`ScoringConfig`].
pub struct RiskScorer {
    risk_pattern: Option<Regex>,
    exclusion_pattern: Option<Regex>,
    concern_words: Vec<String>,
    scoring: ScoringConfig,
}

impl RiskScorer {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Ok(RiskScorer {
            risk_pattern: keyword_pattern(&config.keywords.risk)?,
            exclusion_pattern: keyword_pattern(&config.keywords.exclusion)?,
            concern_words: config.keywords.concern.clone(),
            scoring: config.scoring.clone(),
        })
    }

    /// Score one email. `flagged` is the batch snapshot of flagged sender
    /// addresses, lowercased. Returns the assessment plus the audit actions,
    /// always ending with exactly one `risk_analysis` action.
    pub fn score(
        &self,
        email: &EmailRecord,
        flagged: &HashSet<String>,
    ) -> (RiskAssessment, Vec<ProcessingAction>) {
        let mut actions = Vec::new();
        let mut score = 0i32;
        let mut factors: Vec<String> = Vec::new();

        let text = [
            email.subject.as_str(),
            email.justifications.as_str(),
            email.attachments.as_str(),
            email.policy_name.as_str(),
        ]
        .join(" ");

        let exclusions = unique_matches(&self.exclusion_pattern, &text);
        if !exclusions.is_empty() {
            score += self.scoring.exclusion_keyword * exclusions.len() as i32;
            actions.push(ProcessingAction {
                action_type: "exclude_keywords_found".to_string(),
                reason: Some(format!(
                    "Found exclusion keywords: {}",
                    exclusions.join(", ")
                )),
                confidence: Some(0.7),
                ..Default::default()
            });
        }

        let risks = unique_matches(&self.risk_pattern, &text);
        if !risks.is_empty() {
            score += self.scoring.risk_keyword * risks.len() as i32;
            factors.extend(risks.iter().cloned());
            actions.push(ProcessingAction {
                action_type: "risk_keywords_found".to_string(),
                reason: Some(format!("Found risk keywords: {}", risks.join(", "))),
                confidence: Some(0.8),
                details: Some(json!({ "keywords": risks })),
                ..Default::default()
            });
        }

        let sender = email.sender.to_lowercase();
        if !sender.is_empty() {
            if self
                .scoring
                .personal_domains
                .iter()
                .any(|d| sender.contains(&d.to_lowercase()))
            {
                score += self.scoring.personal_webmail;
                factors.push("personal_email_domain".to_string());
            }
            if sender.ends_with(".gov") || sender.ends_with(".edu") {
                score += self.scoring.trusted_tld;
            }
            if flagged.contains(&sender) {
                score += self.scoring.flagged_sender;
                factors.push("flagged_sender".to_string());
            }
        }

        if !email.attachments.is_empty() {
            let attachments = email.attachments.to_lowercase();
            if self
                .scoring
                .risky_extensions
                .iter()
                .any(|e| attachments.contains(&e.to_lowercase()))
            {
                score += self.scoring.risky_attachment;
                factors.push("risky_attachments".to_string());
            } else if email.attachments.trim() != "-" {
                score += self.scoring.attachment_present;
                factors.push("has_attachments".to_string());
            }
        }

        if email.final_outcome == "Escalated" {
            score += self.scoring.previously_escalated;
            factors.push("previously_escalated".to_string());
        }

        let response = email.user_response.to_lowercase();
        if self
            .concern_words
            .iter()
            .any(|w| response.contains(&w.to_lowercase()))
        {
            score += self.scoring.user_concern;
            factors.push("user_concern".to_string());
        }

        if email.leaver.eq_ignore_ascii_case("yes") || email.leaver.eq_ignore_ascii_case("true") {
            score += self.scoring.leaver;
            factors.push("leaver".to_string());
        }

        let level = RiskLevel::from_score(score, &self.scoring.thresholds);
        actions.push(ProcessingAction {
            action_type: "risk_analysis".to_string(),
            reason: Some(format!(
                "Risk score: {score}, Factors: {}",
                factors.join(", ")
            )),
            confidence: Some(0.85),
            details: Some(json!({
                "score": score,
                "factors": factors,
                "level": level.as_str(),
            })),
            ..Default::default()
        });

        (RiskAssessment { score, level }, actions)
    }
}

/// Word-boundary alternation over the vocabulary, case-insensitive. None
/// when the vocabulary is empty (an empty alternation would match
/// everywhere).
fn keyword_pattern(keywords: &[String]) -> anyhow::Result<Option<Regex>> {
    if keywords.is_empty() {
        return Ok(None);
    }
    let alternation = keywords
        .iter()
        .map(|kw| regex::escape(kw))
        .collect::<Vec<_>>()
        .join("|");
    let pattern = RegexBuilder::new(&format!(r"\b(?:{alternation})\b"))
        .case_insensitive(true)
        .build()?;
    Ok(Some(pattern))
}

fn unique_matches(pattern: &Option<Regex>, text: &str) -> Vec<String> {
    let Some(re) = pattern else {
        return Vec::new();
    };
    let mut seen = BTreeSet::new();
    for found in re.find_iter(text) {
        seen.insert(found.as_str().to_lowercase());
    }
    seen.into_iter().collect()
}
