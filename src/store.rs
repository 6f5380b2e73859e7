use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use serde::Serialize;

use crate::error::StoreError;

/// One ingested email metadata record. Mutated only through
/// [`Store::update_email_disposition`]; never deleted by the processor.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EmailRecord {
    pub id: i64,
    pub time: Option<DateTime<Utc>>,
    pub sender: String,
    pub subject: String,
    /// Semicolon-delimited attachment list; `-` is the ingest placeholder
    /// for "no attachments".
    pub attachments: String,
    /// Delimited recipient list as imported.
    pub recipients: String,
    pub department: String,
    pub business_unit: String,
    pub leaver: String,
    pub termination_date: Option<String>,
    pub user_response: String,
    pub final_outcome: String,
    pub policy_name: String,
    pub justifications: String,
}

/// A follow-up case. At most one exists per email, enforced by a UNIQUE
/// constraint on `email_id`.
#[derive(Debug, Clone, Serialize)]
pub struct Case {
    pub id: i64,
    pub email_id: i64,
    pub escalation_reason: String,
    pub status: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Raw admin rule row; condition parsing happens in [`crate::rules`].
#[derive(Debug, Clone)]
pub struct RuleRow {
    pub id: i64,
    pub rule_type: String,
    pub conditions: String,
    pub action: String,
}

/// Persistence capability consumed by the pipeline. Implemented by
/// [`SqliteStore`] in production and by in-memory fakes in tests.
pub trait Store {
    fn active_rules(&self) -> Result<Vec<RuleRow>, StoreError>;
    fn flagged_senders(&self) -> Result<Vec<String>, StoreError>;
    /// Emails with no final disposition yet, most recent first.
    fn unprocessed_emails(&self, limit: u32, offset: u32) -> Result<Vec<EmailRecord>, StoreError>;
    fn email_by_id(&self, id: i64) -> Result<Option<EmailRecord>, StoreError>;
    fn find_case(&self, email_id: i64) -> Result<Option<Case>, StoreError>;
    /// Atomic find-or-create: inserts under the `email_id` UNIQUE constraint
    /// and returns the surviving row. The boolean is true when this call
    /// created the case.
    fn create_case(&self, email_id: i64, reason: &str) -> Result<(Case, bool), StoreError>;
    fn update_email_disposition(
        &self,
        email_id: i64,
        outcome: &str,
        notes: &str,
    ) -> Result<(), StoreError>;
}

pub struct SqliteStore {
    conn: Connection,
}

const EMAIL_COLUMNS: &str = "id, _time, sender, subject, attachments, recipients, \
     department, bunit, leaver, termination_date, user_response, final_outcome, \
     policy_name, justifications";

impl SqliteStore {
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::Open {
            path: path.to_string(),
            source,
        })?;
        let store = SqliteStore { conn };
        store.init_schema()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = SqliteStore { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS emails (
                id INTEGER PRIMARY KEY,
                _time TEXT,
                sender TEXT,
                subject TEXT,
                attachments TEXT,
                recipients TEXT,
                department TEXT,
                bunit TEXT,
                leaver TEXT,
                termination_date TEXT,
                user_response TEXT,
                final_outcome TEXT,
                policy_name TEXT,
                justifications TEXT,
                created_at TEXT
            );
            CREATE TABLE IF NOT EXISTS admin_rules (
                id INTEGER PRIMARY KEY,
                rule_type TEXT NOT NULL,
                conditions TEXT,
                action TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT
            );
            CREATE TABLE IF NOT EXISTS flagged_senders (
                id INTEGER PRIMARY KEY,
                sender TEXT NOT NULL,
                reason TEXT,
                flagged_at TEXT
            );
            CREATE TABLE IF NOT EXISTS cases (
                id INTEGER PRIMARY KEY,
                email_id INTEGER NOT NULL UNIQUE,
                escalation_reason TEXT,
                status TEXT NOT NULL DEFAULT 'open',
                created_at TEXT,
                updated_at TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_emails_sender ON emails(sender);
            CREATE INDEX IF NOT EXISTS idx_emails_time ON emails(_time);
            CREATE INDEX IF NOT EXISTS idx_emails_department ON emails(department);
            CREATE INDEX IF NOT EXISTS idx_cases_status ON cases(status);
            CREATE INDEX IF NOT EXISTS idx_flagged_senders_sender ON flagged_senders(sender);",
        )?;
        Ok(())
    }

    /// Insert an email record (the `id` field is ignored; the store assigns
    /// one). Returns the new id.
    pub fn insert_email(&self, email: &EmailRecord) -> Result<i64, StoreError> {
        self.conn.execute(
            "INSERT INTO emails (_time, sender, subject, attachments, recipients,
                 department, bunit, leaver, termination_date, user_response,
                 final_outcome, policy_name, justifications, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                email.time.map(|t| t.to_rfc3339()),
                email.sender,
                email.subject,
                email.attachments,
                email.recipients,
                email.department,
                email.business_unit,
                email.leaver,
                email.termination_date,
                email.user_response,
                email.final_outcome,
                email.policy_name,
                email.justifications,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn insert_rule(
        &self,
        rule_type: &str,
        conditions: &str,
        action: &str,
        is_active: bool,
    ) -> Result<i64, StoreError> {
        self.conn.execute(
            "INSERT INTO admin_rules (rule_type, conditions, action, is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                rule_type,
                conditions,
                action,
                is_active as i64,
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn flag_sender(&self, sender: &str, reason: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO flagged_senders (sender, reason, flagged_at) VALUES (?1, ?2, ?3)",
            params![sender, reason, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn case_count(&self) -> Result<i64, StoreError> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM cases", [], |row| row.get(0))?;
        Ok(count)
    }
}

impl Store for SqliteStore {
    fn active_rules(&self) -> Result<Vec<RuleRow>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, rule_type, conditions, action FROM admin_rules
             WHERE is_active = 1 ORDER BY created_at ASC, id ASC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(RuleRow {
                    id: row.get(0)?,
                    rule_type: row.get(1)?,
                    conditions: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    action: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn flagged_senders(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self.conn.prepare("SELECT sender FROM flagged_senders")?;
        let senders = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(senders)
    }

    fn unprocessed_emails(&self, limit: u32, offset: u32) -> Result<Vec<EmailRecord>, StoreError> {
        let sql = format!(
            "SELECT {EMAIL_COLUMNS} FROM emails
             WHERE final_outcome IS NULL OR final_outcome IN ('', 'Pending', '-')
             ORDER BY _time DESC, id DESC LIMIT ?1 OFFSET ?2"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let emails = stmt
            .query_map(params![limit as i64, offset as i64], email_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(emails)
    }

    fn email_by_id(&self, id: i64) -> Result<Option<EmailRecord>, StoreError> {
        let sql = format!("SELECT {EMAIL_COLUMNS} FROM emails WHERE id = ?1");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query_map(params![id], email_from_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    fn find_case(&self, email_id: i64) -> Result<Option<Case>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, email_id, escalation_reason, status, created_at, updated_at
             FROM cases WHERE email_id = ?1",
        )?;
        let mut rows = stmt.query_map(params![email_id], case_from_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    fn create_case(&self, email_id: i64, reason: &str) -> Result<(Case, bool), StoreError> {
        let now = Utc::now().to_rfc3339();
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO cases (email_id, escalation_reason, status, created_at, updated_at)
             VALUES (?1, ?2, 'open', ?3, ?3)",
            params![email_id, reason, now],
        )?;
        let case = self.conn.query_row(
            "SELECT id, email_id, escalation_reason, status, created_at, updated_at
             FROM cases WHERE email_id = ?1",
            params![email_id],
            case_from_row,
        )?;
        Ok((case, inserted > 0))
    }

    fn update_email_disposition(
        &self,
        email_id: i64,
        outcome: &str,
        notes: &str,
    ) -> Result<(), StoreError> {
        let updated = self.conn.execute(
            "UPDATE emails SET final_outcome = ?1, user_response = ?2 WHERE id = ?3",
            params![outcome, notes, email_id],
        )?;
        if updated == 0 {
            return Err(StoreError::EmailNotFound(email_id));
        }
        Ok(())
    }
}

fn email_from_row(row: &Row<'_>) -> rusqlite::Result<EmailRecord> {
    let time = row
        .get::<_, Option<String>>(1)?
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|t| t.with_timezone(&Utc));
    Ok(EmailRecord {
        id: row.get(0)?,
        time,
        sender: text(row, 2)?,
        subject: text(row, 3)?,
        attachments: text(row, 4)?,
        recipients: text(row, 5)?,
        department: text(row, 6)?,
        business_unit: text(row, 7)?,
        leaver: text(row, 8)?,
        termination_date: row.get(9)?,
        user_response: text(row, 10)?,
        final_outcome: text(row, 11)?,
        policy_name: text(row, 12)?,
        justifications: text(row, 13)?,
    })
}

fn case_from_row(row: &Row<'_>) -> rusqlite::Result<Case> {
    Ok(Case {
        id: row.get(0)?,
        email_id: row.get(1)?,
        escalation_reason: text(row, 2)?,
        status: text(row, 3)?,
        created_at: parse_timestamp(row, 4)?,
        updated_at: parse_timestamp(row, 5)?,
    })
}

fn text(row: &Row<'_>, idx: usize) -> rusqlite::Result<String> {
    Ok(row.get::<_, Option<String>>(idx)?.unwrap_or_default())
}

fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    Ok(row
        .get::<_, Option<String>>(idx)?
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|t| t.with_timezone(&Utc)))
}
