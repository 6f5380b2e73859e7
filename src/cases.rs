use crate::error::StoreError;
use crate::processor::{Disposition, EmailProcessingResult};
use crate::store::{Case, Store};

/// Persists processing outcomes: at most one case per email, plus the final
/// disposition on the email row itself.
pub struct CaseManager<'a> {
    store: &'a dyn Store,
}

impl<'a> CaseManager<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        CaseManager { store }
    }

    /// Create a case for dispositions that need human follow-up. Idempotent:
    /// an existing case for the email is returned unchanged, and the insert
    /// itself runs under the store's uniqueness guard so two concurrent runs
    /// cannot both create one.
    pub fn find_or_create_case(
        &self,
        result: &EmailProcessingResult,
    ) -> Result<Option<Case>, StoreError> {
        if !matches!(
            result.disposition,
            Disposition::Escalated | Disposition::PendingReview
        ) {
            return Ok(None);
        }

        if let Some(existing) = self.store.find_case(result.email_id)? {
            log::debug!("case already exists for email {}", result.email_id);
            return Ok(Some(existing));
        }

        let reason = escalation_reason(result);
        let (case, created) = self.store.create_case(result.email_id, &reason)?;
        if created {
            log::info!("created case {} for email {}", case.id, result.email_id);
        } else {
            log::debug!("case {} for email {} won the race elsewhere", case.id, result.email_id);
        }
        Ok(Some(case))
    }

    /// Write the final disposition and a short note onto the email record.
    /// Same inputs produce the same stored state.
    pub fn update_email_disposition(
        &self,
        result: &EmailProcessingResult,
    ) -> Result<(), StoreError> {
        let mut notes = format!(
            "Status: {}, Risk: {}",
            result.disposition, result.risk.level
        );
        if let Some(label) = &result.classification {
            notes.push_str(&format!(", ML: {label}"));
        }
        self.store
            .update_email_disposition(result.email_id, result.disposition.as_str(), &notes)?;
        log::debug!(
            "updated email {} disposition to {}",
            result.email_id,
            result.disposition
        );
        Ok(())
    }
}

/// Risk level plus the first three reasoned evaluation steps.
pub fn escalation_reason(result: &EmailProcessingResult) -> String {
    let reasons: Vec<String> = result
        .actions
        .iter()
        .filter_map(|action| {
            action
                .reason
                .as_ref()
                .filter(|r| !r.is_empty())
                .map(|r| format!("{}: {}", action.action_type, r))
        })
        .take(3)
        .collect();
    format!(
        "Risk Level: {}. {}",
        result.risk.level.label(),
        reasons.join(". ")
    )
}
