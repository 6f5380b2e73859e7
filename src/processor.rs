use std::collections::HashSet;

use serde::Serialize;
use serde_json::json;

use crate::cases::CaseManager;
use crate::classify::Classifier;
use crate::config::{Config, LabelConfig, WhitelistConfig};
use crate::error::ProcessError;
use crate::risk::{RiskAssessment, RiskLevel, RiskScorer};
use crate::rules::RuleSet;
use crate::store::{Case, EmailRecord, Store};

/// Audit record of one evaluation step. Many are produced per email; they
/// feed both the disposition resolver and the case escalation reason.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProcessingAction {
    pub action_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_applied: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Terminal disposition of one processing run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    Escalated,
    Cleared,
    Excluded,
    Whitelisted,
    PendingReview,
}

impl Disposition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Disposition::Escalated => "escalated",
            Disposition::Cleared => "cleared",
            Disposition::Excluded => "excluded",
            Disposition::Whitelisted => "whitelisted",
            Disposition::PendingReview => "pending_review",
        }
    }
}

impl std::fmt::Display for Disposition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate outcome of one pipeline run over one email.
#[derive(Debug, Clone, Serialize)]
pub struct EmailProcessingResult {
    pub email_id: i64,
    pub disposition: Disposition,
    pub risk: RiskAssessment,
    pub actions: Vec<ProcessingAction>,
    pub classification: Option<String>,
    pub notes: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    pub processed: u64,
    pub escalated: u64,
    pub cleared: u64,
    pub excluded: u64,
    pub whitelisted: u64,
    pub pending_review: u64,
    pub errors: Vec<String>,
}

impl BatchSummary {
    pub fn record(&mut self, disposition: Disposition) {
        self.processed += 1;
        match disposition {
            Disposition::Escalated => self.escalated += 1,
            Disposition::Cleared => self.cleared += 1,
            Disposition::Excluded => self.excluded += 1,
            Disposition::Whitelisted => self.whitelisted += 1,
            Disposition::PendingReview => self.pending_review += 1,
        }
    }
}

/// Rule and flagged-sender state loaded once per batch, so every email in
/// the batch is evaluated against an identical snapshot.
pub struct RuleSnapshot {
    pub rules: RuleSet,
    pub flagged: HashSet<String>,
}

/// Orchestrates rule evaluation, whitelisting, risk scoring, classification,
/// disposition resolution, and persistence. Store and classifier are
/// injected so tests can substitute fakes.
pub struct Pipeline<'a> {
    store: &'a dyn Store,
    classifier: &'a dyn Classifier,
    config: &'a Config,
    scorer: RiskScorer,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        store: &'a dyn Store,
        classifier: &'a dyn Classifier,
        config: &'a Config,
    ) -> anyhow::Result<Self> {
        Ok(Pipeline {
            store,
            classifier,
            config,
            scorer: RiskScorer::new(config)?,
        })
    }

    pub fn load_snapshot(&self) -> Result<RuleSnapshot, ProcessError> {
        let rules = RuleSet::from_rows(&self.store.active_rules()?);
        let flagged: HashSet<String> = self
            .store
            .flagged_senders()?
            .into_iter()
            .map(|s| s.to_lowercase())
            .collect();
        log::info!("loaded {} flagged senders", flagged.len());
        Ok(RuleSnapshot { rules, flagged })
    }

    /// Run the full evaluation for one email without persisting anything.
    pub fn process_one(
        &self,
        email: &EmailRecord,
        snapshot: &RuleSnapshot,
    ) -> Result<EmailProcessingResult, ProcessError> {
        if email.id <= 0 {
            return Err(ProcessError::InvalidEmail(email.id, "id".to_string()));
        }
        log::info!("processing email {} from {}", email.id, email.sender);

        let mut actions = snapshot.rules.evaluate(email);

        if let Some(action) = check_whitelist(email, &self.config.whitelist) {
            actions.push(action);
        }

        let (risk, risk_actions) = self.scorer.score(email, &snapshot.flagged);
        actions.extend(risk_actions);

        let (classification, ml_action) = self.run_classification(email);
        actions.push(ml_action);

        let disposition = resolve_disposition(
            &actions,
            risk.level,
            classification.as_deref(),
            &self.config.labels,
        );

        log::info!(
            "email {} processed: status={} risk={} actions={}",
            email.id,
            disposition,
            risk.level,
            actions.len()
        );

        Ok(EmailProcessingResult {
            email_id: email.id,
            disposition,
            risk,
            notes: format!("Processed {} actions", actions.len()),
            actions,
            classification,
        })
    }

    fn run_classification(&self, email: &EmailRecord) -> (Option<String>, ProcessingAction) {
        let text = format!("{} {}", email.subject, email.justifications);
        if text.trim().is_empty() {
            return (
                None,
                ProcessingAction {
                    action_type: "ml_classification_failed".to_string(),
                    reason: Some("ML classification error: empty input".to_string()),
                    confidence: Some(0.0),
                    ..Default::default()
                },
            );
        }
        match self.classifier.classify(&text) {
            Ok(label) => {
                log::debug!("email {} ML classification: {label}", email.id);
                let action = ProcessingAction {
                    action_type: "ml_classification".to_string(),
                    reason: Some(format!("ML classified as: {label}")),
                    confidence: Some(0.75),
                    details: Some(json!({
                        "classification": label.clone(),
                        "text_length": text.len(),
                    })),
                    ..Default::default()
                };
                (Some(label), action)
            }
            Err(e) => {
                log::warn!("ML classification failed for email {}: {e}", email.id);
                let action = ProcessingAction {
                    action_type: "ml_classification_failed".to_string(),
                    reason: Some(format!("ML classification error: {e}")),
                    confidence: Some(0.0),
                    ..Default::default()
                };
                (None, action)
            }
        }
    }

    /// Persist one result: case first, then the disposition. If case
    /// creation fails the email's outcome is left unwritten, so the next
    /// batch retries it.
    pub fn persist(&self, result: &EmailProcessingResult) -> Result<Option<Case>, ProcessError> {
        let manager = CaseManager::new(self.store);
        let case = manager.find_or_create_case(result)?;
        manager.update_email_disposition(result)?;
        Ok(case)
    }

    /// Fetch, evaluate, and optionally persist a single email by id.
    pub fn process_single(
        &self,
        email_id: i64,
        persist: bool,
    ) -> Result<EmailProcessingResult, ProcessError> {
        let email = self
            .store
            .email_by_id(email_id)?
            .ok_or(ProcessError::NotFound(email_id))?;
        let snapshot = self.load_snapshot()?;
        let result = self.process_one(&email, &snapshot)?;
        if persist {
            self.persist(&result)?;
        }
        Ok(result)
    }

    /// Process a bounded batch of not-yet-dispositioned emails, most recent
    /// first. One email failing never aborts the batch; its error lands in
    /// the summary instead.
    pub fn process_batch(&self, limit: u32, offset: u32) -> Result<BatchSummary, ProcessError> {
        log::info!("starting batch processing: limit={limit} offset={offset}");
        let snapshot = self.load_snapshot()?;
        let emails = self.store.unprocessed_emails(limit, offset)?;
        if emails.is_empty() {
            log::info!("no emails found to process");
            return Ok(BatchSummary::default());
        }

        let mut summary = BatchSummary::default();
        for email in &emails {
            let outcome = self.process_one(email, &snapshot).and_then(|result| {
                self.persist(&result)?;
                Ok(result)
            });
            match outcome {
                Ok(result) => summary.record(result.disposition),
                Err(e) => {
                    let message = format!("email {}: {e}", email.id);
                    log::error!("{message}");
                    summary.errors.push(message);
                }
            }
        }

        log::info!(
            "batch complete: processed={} escalated={} cleared={} excluded={} whitelisted={} pending_review={} errors={}",
            summary.processed,
            summary.escalated,
            summary.cleared,
            summary.excluded,
            summary.whitelisted,
            summary.pending_review,
            summary.errors.len()
        );
        Ok(summary)
    }

    /// Evaluate a batch without persisting. Failed emails are skipped with a
    /// warning.
    pub fn dry_run(&self, limit: u32, offset: u32) -> Result<Vec<EmailProcessingResult>, ProcessError> {
        let snapshot = self.load_snapshot()?;
        let emails = self.store.unprocessed_emails(limit, offset)?;
        let mut results = Vec::with_capacity(emails.len());
        for email in &emails {
            match self.process_one(email, &snapshot) {
                Ok(result) => results.push(result),
                Err(e) => log::warn!("dry run skipping email {}: {e}", email.id),
            }
        }
        Ok(results)
    }
}

/// Independent of admin rules: trusted domains and automated-mail indicators
/// each whitelist with an associated confidence.
pub fn check_whitelist(email: &EmailRecord, config: &WhitelistConfig) -> Option<ProcessingAction> {
    let sender = email.sender.to_lowercase();
    for domain in &config.trusted_domains {
        if sender.contains(&domain.to_lowercase()) {
            return Some(ProcessingAction {
                action_type: "whitelist".to_string(),
                reason: Some(format!("Sender from whitelisted domain: {domain}")),
                confidence: Some(0.9),
                ..Default::default()
            });
        }
    }

    let subject = email.subject.to_lowercase();
    for indicator in &config.automated_indicators {
        let indicator_lower = indicator.to_lowercase();
        if subject.contains(&indicator_lower) || sender.contains(&indicator_lower) {
            return Some(ProcessingAction {
                action_type: "whitelist".to_string(),
                reason: Some(format!("Automated email detected: {indicator}")),
                confidence: Some(0.8),
                ..Default::default()
            });
        }
    }
    None
}

/// The decision table. Rule-triggered actions resolve by action type in a
/// fixed priority (exclude, whitelist, escalate) regardless of which rule
/// fired first; a second whitelist scan over the whole action list follows,
/// then risk level and classification label decide.
pub fn resolve_disposition(
    actions: &[ProcessingAction],
    risk_level: RiskLevel,
    classification: Option<&str>,
    labels: &LabelConfig,
) -> Disposition {
    let has_rule_action = |wanted: &str| {
        actions
            .iter()
            .any(|a| a.rule_applied.is_some() && a.action_type == wanted)
    };
    if has_rule_action("exclude") {
        return Disposition::Excluded;
    }
    if has_rule_action("whitelist") {
        return Disposition::Whitelisted;
    }
    if has_rule_action("escalate") {
        return Disposition::Escalated;
    }

    // Second whitelist scan, intentionally overlapping the one above: it is
    // what lets the rule-independent whitelist check resolve.
    if actions.iter().any(|a| a.action_type == "whitelist") {
        return Disposition::Whitelisted;
    }

    let label = classification.map(|l| l.to_lowercase());
    let label_in = |set: &[String]| label.as_ref().is_some_and(|l| set.contains(l));

    match risk_level {
        RiskLevel::Critical => Disposition::Escalated,
        RiskLevel::High => {
            if label_in(&labels.safe) {
                Disposition::Cleared
            } else {
                Disposition::Escalated
            }
        }
        RiskLevel::Medium => {
            if label_in(&labels.risky) {
                Disposition::Escalated
            } else {
                Disposition::Cleared
            }
        }
        RiskLevel::Low | RiskLevel::Unknown => {
            if label_in(&labels.risky) {
                Disposition::PendingReview
            } else {
                Disposition::Cleared
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{FixedClassifier, KeywordClassifier};
    use crate::error::StoreError;
    use crate::store::{RuleRow, SqliteStore};
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// In-memory store fake; lets tests drive the pipeline without SQLite
    /// and inject records no real ingest could produce.
    #[derive(Default)]
    struct MemStore {
        emails: Vec<EmailRecord>,
        rules: Vec<RuleRow>,
        flagged: Vec<String>,
        cases: RefCell<Vec<Case>>,
        dispositions: RefCell<HashMap<i64, (String, String)>>,
    }

    impl MemStore {
        fn effective_outcome(&self, email: &EmailRecord) -> String {
            self.dispositions
                .borrow()
                .get(&email.id)
                .map(|(outcome, _)| outcome.clone())
                .unwrap_or_else(|| email.final_outcome.clone())
        }
    }

    impl Store for MemStore {
        fn active_rules(&self) -> Result<Vec<RuleRow>, StoreError> {
            Ok(self.rules.clone())
        }

        fn flagged_senders(&self) -> Result<Vec<String>, StoreError> {
            Ok(self.flagged.clone())
        }

        fn unprocessed_emails(
            &self,
            limit: u32,
            offset: u32,
        ) -> Result<Vec<EmailRecord>, StoreError> {
            let mut pending: Vec<EmailRecord> = self
                .emails
                .iter()
                .filter(|e| {
                    matches!(self.effective_outcome(e).as_str(), "" | "Pending" | "-")
                })
                .cloned()
                .collect();
            pending.sort_by(|a, b| b.time.cmp(&a.time).then(b.id.cmp(&a.id)));
            Ok(pending
                .into_iter()
                .skip(offset as usize)
                .take(limit as usize)
                .collect())
        }

        fn email_by_id(&self, id: i64) -> Result<Option<EmailRecord>, StoreError> {
            Ok(self.emails.iter().find(|e| e.id == id).cloned())
        }

        fn find_case(&self, email_id: i64) -> Result<Option<Case>, StoreError> {
            Ok(self
                .cases
                .borrow()
                .iter()
                .find(|c| c.email_id == email_id)
                .cloned())
        }

        fn create_case(&self, email_id: i64, reason: &str) -> Result<(Case, bool), StoreError> {
            let mut cases = self.cases.borrow_mut();
            if let Some(existing) = cases.iter().find(|c| c.email_id == email_id) {
                return Ok((existing.clone(), false));
            }
            let case = Case {
                id: cases.len() as i64 + 1,
                email_id,
                escalation_reason: reason.to_string(),
                status: "open".to_string(),
                created_at: None,
                updated_at: None,
            };
            cases.push(case.clone());
            Ok((case, true))
        }

        fn update_email_disposition(
            &self,
            email_id: i64,
            outcome: &str,
            notes: &str,
        ) -> Result<(), StoreError> {
            if !self.emails.iter().any(|e| e.id == email_id) {
                return Err(StoreError::EmailNotFound(email_id));
            }
            self.dispositions
                .borrow_mut()
                .insert(email_id, (outcome.to_string(), notes.to_string()));
            Ok(())
        }
    }

    fn rule_row(id: i64, rule_type: &str, conditions: &str, action: &str) -> RuleRow {
        RuleRow {
            id,
            rule_type: rule_type.to_string(),
            conditions: conditions.to_string(),
            action: action.to_string(),
        }
    }

    fn email(id: i64, sender: &str, subject: &str) -> EmailRecord {
        EmailRecord {
            id,
            sender: sender.to_string(),
            subject: subject.to_string(),
            ..Default::default()
        }
    }

    struct FailingClassifier;

    impl Classifier for FailingClassifier {
        fn classify(&self, _text: &str) -> anyhow::Result<String> {
            Err(anyhow::anyhow!("model offline"))
        }
    }

    #[test]
    fn exclude_beats_escalate_regardless_of_rule_order() {
        let store = MemStore {
            emails: vec![email(1, "a@rival.com", "meeting notes")],
            // The escalate rule was authored first and fires first.
            rules: vec![
                rule_row(1, "sender_domain", r#"{"domains": ["rival.com"]}"#, "escalate"),
                rule_row(2, "subject_contains", r#"{"keywords": ["meeting"]}"#, "exclude"),
            ],
            ..Default::default()
        };
        let config = Config::default();
        let classifier = FixedClassifier::new("unknown");
        let pipeline = Pipeline::new(&store, &classifier, &config).unwrap();
        let snapshot = pipeline.load_snapshot().unwrap();

        let result = pipeline
            .process_one(&store.emails[0], &snapshot)
            .unwrap();
        assert_eq!(result.disposition, Disposition::Excluded);
    }

    #[test]
    fn rule_whitelist_beats_escalate() {
        let store = MemStore {
            emails: vec![email(1, "a@rival.com", "status update")],
            rules: vec![
                rule_row(1, "sender_domain", r#"{"domains": ["rival.com"]}"#, "escalate"),
                rule_row(2, "sender_domain", r#"{"domains": ["rival.com"]}"#, "whitelist"),
            ],
            ..Default::default()
        };
        let config = Config::default();
        let classifier = FixedClassifier::new("unknown");
        let pipeline = Pipeline::new(&store, &classifier, &config).unwrap();
        let snapshot = pipeline.load_snapshot().unwrap();

        let result = pipeline.process_one(&store.emails[0], &snapshot).unwrap();
        assert_eq!(result.disposition, Disposition::Whitelisted);
    }

    #[test]
    fn trusted_domain_resolves_whitelisted_without_rules() {
        let store = MemStore {
            emails: vec![email(1, "alerts@notification.com", "weekly digest")],
            ..Default::default()
        };
        let config = Config::default();
        let classifier = FixedClassifier::new("unknown");
        let pipeline = Pipeline::new(&store, &classifier, &config).unwrap();
        let snapshot = pipeline.load_snapshot().unwrap();

        let result = pipeline.process_one(&store.emails[0], &snapshot).unwrap();
        assert_eq!(result.disposition, Disposition::Whitelisted);
        let whitelist = result
            .actions
            .iter()
            .find(|a| a.action_type == "whitelist")
            .unwrap();
        assert_eq!(whitelist.confidence, Some(0.9));
        assert!(whitelist.rule_applied.is_none());
    }

    #[test]
    fn resolver_decision_table() {
        let labels = LabelConfig::default();
        let no_actions: Vec<ProcessingAction> = Vec::new();

        assert_eq!(
            resolve_disposition(&no_actions, RiskLevel::Critical, Some("safe"), &labels),
            Disposition::Escalated
        );
        assert_eq!(
            resolve_disposition(&no_actions, RiskLevel::High, Some("low_risk"), &labels),
            Disposition::Cleared
        );
        assert_eq!(
            resolve_disposition(&no_actions, RiskLevel::High, Some("unknown"), &labels),
            Disposition::Escalated
        );
        assert_eq!(
            resolve_disposition(&no_actions, RiskLevel::High, None, &labels),
            Disposition::Escalated
        );
        assert_eq!(
            resolve_disposition(&no_actions, RiskLevel::Medium, Some("high_risk"), &labels),
            Disposition::Escalated
        );
        assert_eq!(
            resolve_disposition(&no_actions, RiskLevel::Medium, Some("unknown"), &labels),
            Disposition::Cleared
        );
        assert_eq!(
            resolve_disposition(&no_actions, RiskLevel::Low, Some("critical"), &labels),
            Disposition::PendingReview
        );
        assert_eq!(
            resolve_disposition(&no_actions, RiskLevel::Low, None, &labels),
            Disposition::Cleared
        );
        assert_eq!(
            resolve_disposition(&no_actions, RiskLevel::Unknown, Some("HIGH_RISK"), &labels),
            Disposition::PendingReview
        );
    }

    #[test]
    fn classifier_failure_is_recorded_not_fatal() {
        let store = MemStore {
            emails: vec![email(1, "a@external.com", "follow-up on order")],
            ..Default::default()
        };
        let config = Config::default();
        let pipeline = Pipeline::new(&store, &FailingClassifier, &config).unwrap();
        let snapshot = pipeline.load_snapshot().unwrap();

        let result = pipeline.process_one(&store.emails[0], &snapshot).unwrap();
        assert!(result.classification.is_none());
        assert_eq!(result.disposition, Disposition::Cleared);
        let failed = result
            .actions
            .iter()
            .find(|a| a.action_type == "ml_classification_failed")
            .unwrap();
        assert_eq!(failed.confidence, Some(0.0));
    }

    #[test]
    fn empty_text_skips_classification() {
        let store = MemStore {
            emails: vec![email(1, "a@external.com", "")],
            ..Default::default()
        };
        let config = Config::default();
        let classifier = KeywordClassifier::default();
        let pipeline = Pipeline::new(&store, &classifier, &config).unwrap();
        let snapshot = pipeline.load_snapshot().unwrap();

        let result = pipeline.process_one(&store.emails[0], &snapshot).unwrap();
        assert!(result.classification.is_none());
        assert!(result
            .actions
            .iter()
            .any(|a| a.action_type == "ml_classification_failed"));
    }

    #[test]
    fn batch_survives_poison_email() {
        let store = MemStore {
            emails: vec![
                email(1, "a@external.com", "hello"),
                email(0, "broken@external.com", "no id"),
                email(2, "b@external.com", "world"),
            ],
            ..Default::default()
        };
        let config = Config::default();
        let classifier = FixedClassifier::new("unknown");
        let pipeline = Pipeline::new(&store, &classifier, &config).unwrap();

        let summary = pipeline.process_batch(10, 0).unwrap();
        assert_eq!(summary.processed, 2);
        assert_eq!(summary.errors.len(), 1);
        assert!(summary.errors[0].contains("invalid email record"));
    }

    #[test]
    fn end_to_end_risky_attachment_escalates_and_opens_one_case() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .insert_email(&EmailRecord {
                sender: "a@external.com".to_string(),
                subject: "Confidential transfer request".to_string(),
                attachments: "invoice.exe".to_string(),
                ..Default::default()
            })
            .unwrap();
        let config = Config::default();
        let classifier = FixedClassifier::new("unknown");
        let pipeline = Pipeline::new(&store, &classifier, &config).unwrap();

        let summary = pipeline.process_batch(10, 0).unwrap();
        assert_eq!(summary.processed, 1);
        assert_eq!(summary.escalated, 1);
        assert!(summary.errors.is_empty());
        assert_eq!(store.case_count().unwrap(), 1);

        // Second run over the same set: the email is dispositioned, nothing
        // is reprocessed and no second case appears.
        let summary = pipeline.process_batch(10, 0).unwrap();
        assert_eq!(summary.processed, 0);
        assert_eq!(store.case_count().unwrap(), 1);
    }

    #[test]
    fn end_to_end_automated_mail_is_whitelisted_without_case() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .insert_email(&EmailRecord {
                sender: "no-reply@vendor.com".to_string(),
                subject: "Auto-Reply: Out of Office".to_string(),
                ..Default::default()
            })
            .unwrap();
        let config = Config::default();
        let classifier = FixedClassifier::new("unknown");
        let pipeline = Pipeline::new(&store, &classifier, &config).unwrap();

        let summary = pipeline.process_batch(10, 0).unwrap();
        assert_eq!(summary.whitelisted, 1);
        assert_eq!(store.case_count().unwrap(), 0);
    }

    #[test]
    fn process_single_persists_and_repeats_identically() {
        let store = SqliteStore::open_in_memory().unwrap();
        let id = store
            .insert_email(&EmailRecord {
                sender: "a@external.com".to_string(),
                subject: "Confidential transfer request".to_string(),
                attachments: "invoice.exe".to_string(),
                ..Default::default()
            })
            .unwrap();
        let config = Config::default();
        let classifier = FixedClassifier::new("unknown");
        let pipeline = Pipeline::new(&store, &classifier, &config).unwrap();

        let first = pipeline.process_single(id, true).unwrap();
        assert_eq!(first.disposition, Disposition::Escalated);
        assert_eq!(store.case_count().unwrap(), 1);

        // Reprocessing the already-escalated email keeps the disposition and
        // the single case.
        let second = pipeline.process_single(id, true).unwrap();
        assert_eq!(second.disposition, Disposition::Escalated);
        assert_eq!(store.case_count().unwrap(), 1);

        assert!(matches!(
            pipeline.process_single(9999, true),
            Err(ProcessError::NotFound(9999))
        ));
    }

    #[test]
    fn dry_run_persists_nothing() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .insert_email(&EmailRecord {
                sender: "a@external.com".to_string(),
                subject: "Confidential transfer request".to_string(),
                attachments: "invoice.exe".to_string(),
                ..Default::default()
            })
            .unwrap();
        let config = Config::default();
        let classifier = FixedClassifier::new("unknown");
        let pipeline = Pipeline::new(&store, &classifier, &config).unwrap();

        let results = pipeline.dry_run(10, 0).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].disposition, Disposition::Escalated);
        assert_eq!(store.case_count().unwrap(), 0);
        // Still unprocessed afterwards.
        assert_eq!(store.unprocessed_emails(10, 0).unwrap().len(), 1);
    }
}
