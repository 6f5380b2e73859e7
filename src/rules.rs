use serde::{Deserialize, Serialize};

use crate::processor::ProcessingAction;
use crate::store::{EmailRecord, RuleRow};

/// Parsed condition of an admin rule. The variant is selected by the row's
/// `rule_type`; a payload that fails to parse degrades to [`LegacyText`]
/// so a corrupt rule can never halt a batch.
///
/// [`LegacyText`]: RuleCondition::LegacyText
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleCondition {
    SenderDomain { domains: Vec<String> },
    SenderExact { senders: Vec<String> },
    SubjectContains { keywords: Vec<String> },
    Department { departments: Vec<String> },
    AttachmentType { extensions: Vec<String> },
    /// Inverted sense: matches when every attachment carries an allowed
    /// extension. No attachments at all is considered safe and matches.
    AttachmentWhitelist { extensions: Vec<String> },
    RecipientDomain { domains: Vec<String> },
    KeywordMatch { keywords: Vec<String> },
    LegacyText { text: String },
}

#[derive(Debug, Clone)]
pub struct AdminRule {
    pub id: i64,
    pub rule_type: String,
    pub action: String,
    pub condition: RuleCondition,
}

impl AdminRule {
    pub fn from_row(row: &RuleRow) -> Self {
        let condition = parse_condition(&row.rule_type, &row.conditions).unwrap_or_else(|| {
            log::warn!(
                "rule {}: malformed condition payload {:?}, degrading to text match",
                row.id,
                row.conditions
            );
            RuleCondition::LegacyText {
                text: row.conditions.clone(),
            }
        });
        AdminRule {
            id: row.id,
            rule_type: row.rule_type.clone(),
            action: row.action.clone(),
            condition,
        }
    }

    pub fn matches(&self, email: &EmailRecord) -> bool {
        self.condition.matches(email)
    }
}

fn parse_condition(rule_type: &str, payload: &str) -> Option<RuleCondition> {
    #[derive(Deserialize)]
    struct Domains {
        domains: Vec<String>,
    }
    #[derive(Deserialize)]
    struct Senders {
        senders: Vec<String>,
    }
    #[derive(Deserialize)]
    struct Keywords {
        keywords: Vec<String>,
    }
    #[derive(Deserialize)]
    struct Departments {
        departments: Vec<String>,
    }
    #[derive(Deserialize)]
    struct Extensions {
        extensions: Vec<String>,
    }
    #[derive(Deserialize)]
    struct Text {
        text: String,
    }

    match rule_type {
        "sender_domain" => serde_json::from_str::<Domains>(payload)
            .ok()
            .map(|p| RuleCondition::SenderDomain { domains: p.domains }),
        "sender_exact" => serde_json::from_str::<Senders>(payload)
            .ok()
            .map(|p| RuleCondition::SenderExact { senders: p.senders }),
        "subject_contains" => serde_json::from_str::<Keywords>(payload)
            .ok()
            .map(|p| RuleCondition::SubjectContains {
                keywords: p.keywords,
            }),
        "department" => serde_json::from_str::<Departments>(payload)
            .ok()
            .map(|p| RuleCondition::Department {
                departments: p.departments,
            }),
        "attachment_type" => serde_json::from_str::<Extensions>(payload)
            .ok()
            .map(|p| RuleCondition::AttachmentType {
                extensions: p.extensions,
            }),
        "attachment_whitelist" => serde_json::from_str::<Extensions>(payload)
            .ok()
            .map(|p| RuleCondition::AttachmentWhitelist {
                extensions: p.extensions,
            }),
        "recipient_domain" => serde_json::from_str::<Domains>(payload)
            .ok()
            .map(|p| RuleCondition::RecipientDomain { domains: p.domains }),
        "keyword_match" => serde_json::from_str::<Keywords>(payload)
            .ok()
            .map(|p| RuleCondition::KeywordMatch {
                keywords: p.keywords,
            }),
        "text" => serde_json::from_str::<Text>(payload)
            .ok()
            .map(|p| RuleCondition::LegacyText { text: p.text }),
        _ => None,
    }
}

impl RuleCondition {
    pub fn matches(&self, email: &EmailRecord) -> bool {
        match self {
            RuleCondition::SenderDomain { domains } => {
                contains_any(&email.sender, domains)
            }
            RuleCondition::SenderExact { senders } => senders
                .iter()
                .any(|s| s.eq_ignore_ascii_case(&email.sender)),
            RuleCondition::SubjectContains { keywords } => {
                contains_any(&email.subject, keywords)
            }
            RuleCondition::Department { departments } => departments
                .iter()
                .any(|d| d.eq_ignore_ascii_case(&email.department)),
            RuleCondition::AttachmentType { extensions } => {
                !email.attachments.is_empty() && contains_any(&email.attachments, extensions)
            }
            RuleCondition::AttachmentWhitelist { extensions } => {
                let trimmed = email.attachments.trim();
                if trimmed.is_empty() || trimmed == "-" {
                    return true;
                }
                email
                    .attachments
                    .split(';')
                    .map(str::trim)
                    .filter(|a| !a.is_empty())
                    .all(|attachment| contains_any(attachment, extensions))
            }
            RuleCondition::RecipientDomain { domains } => {
                !email.recipients.is_empty() && contains_any(&email.recipients, domains)
            }
            RuleCondition::KeywordMatch { keywords } => {
                let haystack = [
                    email.subject.as_str(),
                    email.sender.as_str(),
                    email.justifications.as_str(),
                    email.attachments.as_str(),
                ]
                .join(" ");
                contains_any(&haystack, keywords)
            }
            RuleCondition::LegacyText { text } => {
                if text.trim().is_empty() {
                    return false;
                }
                let haystack = [
                    email.subject.as_str(),
                    email.sender.as_str(),
                    email.justifications.as_str(),
                ]
                .join(" ")
                .to_lowercase();
                haystack.contains(&text.to_lowercase())
            }
        }
    }
}

fn contains_any(haystack: &str, needles: &[String]) -> bool {
    let haystack = haystack.to_lowercase();
    needles
        .iter()
        .any(|n| haystack.contains(&n.to_lowercase()))
}

/// The active rule snapshot for one batch. All emails in a batch are
/// evaluated against the same snapshot even if an administrator edits rules
/// mid-run.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<AdminRule>,
}

impl RuleSet {
    pub fn from_rows(rows: &[RuleRow]) -> Self {
        let rules: Vec<AdminRule> = rows.iter().map(AdminRule::from_row).collect();
        log::info!("loaded {} active admin rules", rules.len());
        RuleSet { rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Evaluate every rule against one email, in creation order, producing
    /// one action per firing rule.
    pub fn evaluate(&self, email: &EmailRecord) -> Vec<ProcessingAction> {
        let mut actions = Vec::new();
        for rule in &self.rules {
            if rule.matches(email) {
                log::debug!("email {} matched rule {}", email.id, rule.id);
                actions.push(ProcessingAction {
                    action_type: rule.action.clone(),
                    rule_applied: Some(format!("Admin Rule {}", rule.id)),
                    reason: Some(format!("Rule type: {}", rule.rule_type)),
                    confidence: None,
                    details: serde_json::to_value(&rule.condition).ok(),
                });
            }
        }
        actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: i64, rule_type: &str, conditions: &str, action: &str) -> RuleRow {
        RuleRow {
            id,
            rule_type: rule_type.to_string(),
            conditions: conditions.to_string(),
            action: action.to_string(),
        }
    }

    fn email() -> EmailRecord {
        EmailRecord {
            id: 1,
            sender: "Jane.Doe@Partner.COM".to_string(),
            subject: "Re: Project Phoenix handover".to_string(),
            attachments: "notes.pdf; summary.docx".to_string(),
            recipients: "ops@vendor.net, jane@partner.com".to_string(),
            department: "Finance".to_string(),
            justifications: "routine handover".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn sender_domain_matches_case_insensitively() {
        let rule = AdminRule::from_row(&row(1, "sender_domain", r#"{"domains": ["partner.com"]}"#, "exclude"));
        assert!(rule.matches(&email()));

        let rule = AdminRule::from_row(&row(2, "sender_domain", r#"{"domains": ["other.com"]}"#, "exclude"));
        assert!(!rule.matches(&email()));
    }

    #[test]
    fn sender_exact_requires_full_address() {
        let rule = AdminRule::from_row(&row(
            1,
            "sender_exact",
            r#"{"senders": ["jane.doe@partner.com"]}"#,
            "whitelist",
        ));
        assert!(rule.matches(&email()));

        let rule = AdminRule::from_row(&row(
            2,
            "sender_exact",
            r#"{"senders": ["jane@partner.com"]}"#,
            "whitelist",
        ));
        assert!(!rule.matches(&email()));
    }

    #[test]
    fn subject_and_department_matching() {
        let rule = AdminRule::from_row(&row(
            1,
            "subject_contains",
            r#"{"keywords": ["phoenix"]}"#,
            "escalate",
        ));
        assert!(rule.matches(&email()));

        let rule = AdminRule::from_row(&row(2, "department", r#"{"departments": ["finance"]}"#, "escalate"));
        assert!(rule.matches(&email()));

        let rule = AdminRule::from_row(&row(3, "department", r#"{"departments": ["legal"]}"#, "escalate"));
        assert!(!rule.matches(&email()));
    }

    #[test]
    fn attachment_type_needs_attachments() {
        let rule = AdminRule::from_row(&row(1, "attachment_type", r#"{"extensions": [".docx"]}"#, "escalate"));
        assert!(rule.matches(&email()));

        let mut bare = email();
        bare.attachments = String::new();
        assert!(!rule.matches(&bare));
    }

    #[test]
    fn attachment_whitelist_requires_all_allowed() {
        let rule = AdminRule::from_row(&row(
            1,
            "attachment_whitelist",
            r#"{"extensions": [".pdf", ".docx"]}"#,
            "whitelist",
        ));
        assert!(rule.matches(&email()));

        let mut mixed = email();
        mixed.attachments = "notes.pdf; tool.exe".to_string();
        assert!(!rule.matches(&mixed));

        let mut none = email();
        none.attachments = String::new();
        assert!(rule.matches(&none));

        let mut placeholder = email();
        placeholder.attachments = " - ".to_string();
        assert!(rule.matches(&placeholder));
    }

    #[test]
    fn recipient_domain_and_keyword_match() {
        let rule = AdminRule::from_row(&row(1, "recipient_domain", r#"{"domains": ["vendor.net"]}"#, "escalate"));
        assert!(rule.matches(&email()));

        let rule = AdminRule::from_row(&row(
            2,
            "keyword_match",
            r#"{"keywords": ["handover", "nonexistent"]}"#,
            "escalate",
        ));
        assert!(rule.matches(&email()));
    }

    #[test]
    fn malformed_payload_degrades_to_text_match() {
        let rule = AdminRule::from_row(&row(1, "sender_domain", "partner.com is bad", "exclude"));
        assert!(matches!(rule.condition, RuleCondition::LegacyText { .. }));
        // The raw payload is not a substring of any searched field.
        assert!(!rule.matches(&email()));

        let rule = AdminRule::from_row(&row(2, "sender_domain", "phoenix", "exclude"));
        assert!(rule.matches(&email()));
    }

    #[test]
    fn unknown_rule_type_degrades_to_text_match() {
        let rule = AdminRule::from_row(&row(1, "time_window", r#"{"hours": [9, 17]}"#, "exclude"));
        assert!(matches!(rule.condition, RuleCondition::LegacyText { .. }));
        assert!(!rule.matches(&email()));
    }

    #[test]
    fn empty_payload_never_matches() {
        let rule = AdminRule::from_row(&row(1, "sender_domain", "", "exclude"));
        assert!(!rule.matches(&email()));
    }

    #[test]
    fn evaluate_reports_every_firing_rule_in_order() {
        let rows = vec![
            row(1, "department", r#"{"departments": ["finance"]}"#, "escalate"),
            row(2, "sender_domain", r#"{"domains": ["partner.com"]}"#, "exclude"),
            row(3, "subject_contains", r#"{"keywords": ["poker"]}"#, "exclude"),
        ];
        let rules = RuleSet::from_rows(&rows);
        let actions = rules.evaluate(&email());
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].action_type, "escalate");
        assert_eq!(actions[0].rule_applied.as_deref(), Some("Admin Rule 1"));
        assert_eq!(actions[1].action_type, "exclude");
    }
}
