use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database_path: String,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub keywords: KeywordConfig,
    #[serde(default)]
    pub whitelist: WhitelistConfig,
    #[serde(default)]
    pub labels: LabelConfig,
}

/// Weights and thresholds for the risk scorer. Every contribution the scorer
/// makes is driven by a value here, never a hard-wired constant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub exclusion_keyword: i32,
    pub risk_keyword: i32,
    pub personal_webmail: i32,
    pub trusted_tld: i32,
    pub risky_attachment: i32,
    pub attachment_present: i32,
    pub previously_escalated: i32,
    pub user_concern: i32,
    pub flagged_sender: i32,
    pub leaver: i32,
    pub thresholds: RiskThresholds,
    pub personal_domains: Vec<String>,
    pub risky_extensions: Vec<String>,
}

/// Score cut-offs for the risk buckets; highest qualifying bucket wins.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RiskThresholds {
    pub critical: i32,
    pub high: i32,
    pub medium: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordConfig {
    /// Raises the risk score when found in subject, justification,
    /// attachment, or policy text.
    pub risk: Vec<String>,
    /// Lowers the risk score (administrative and social traffic).
    pub exclusion: Vec<String>,
    /// Words in a prior user response that indicate concern.
    pub concern: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhitelistConfig {
    pub trusted_domains: Vec<String>,
    pub automated_indicators: Vec<String>,
}

/// Classifier label vocabularies consumed by the disposition resolver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelConfig {
    pub safe: Vec<String>,
    pub risky: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_path: "mail-guardian.db".to_string(),
            scoring: ScoringConfig::default(),
            keywords: KeywordConfig::default(),
            whitelist: WhitelistConfig::default(),
            labels: LabelConfig::default(),
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        ScoringConfig {
            exclusion_keyword: -10,
            risk_keyword: 20,
            personal_webmail: 15,
            trusted_tld: -5,
            risky_attachment: 30,
            attachment_present: 5,
            previously_escalated: 25,
            user_concern: 15,
            flagged_sender: 40,
            leaver: 35,
            thresholds: RiskThresholds::default(),
            personal_domains: string_vec(&["gmail.com", "yahoo.com", "hotmail.com", "outlook.com"]),
            risky_extensions: string_vec(&[".exe", ".zip", ".rar", ".bat", ".scr", ".com"]),
        }
    }
}

impl Default for RiskThresholds {
    fn default() -> Self {
        RiskThresholds {
            critical: 60,
            high: 40,
            medium: 20,
        }
    }
}

impl Default for KeywordConfig {
    fn default() -> Self {
        KeywordConfig {
            risk: string_vec(&[
                // Financial/legal
                "confidential",
                "classified",
                "restricted",
                "sensitive",
                "proprietary",
                "trade secret",
                "secret",
                "merger",
                "acquisition",
                "insider",
                "lawsuit",
                "legal action",
                "subpoena",
                "investigation",
                "fraud",
                "breach",
                "violation",
                "compliance",
                "wire transfer",
                "transfer",
                "payment",
                "urgent",
                // Security
                "password",
                "credential",
                "login",
                "access key",
                "api key",
                "token",
                "vulnerability",
                "exploit",
                "malware",
                "phishing",
                "ransomware",
                // HR/personnel
                "termination",
                "resignation",
                "dismissal",
                "harassment",
                "discrimination",
                "grievance",
                "complaint",
                "misconduct",
                "policy violation",
                // Data privacy
                "personal data",
                "pii",
                "gdpr",
                "hipaa",
                "sox",
                "customer data",
                "financial records",
                "bank account",
                "social security",
                "credit card",
            ]),
            exclusion: string_vec(&[
                // Administrative/system traffic
                "automated",
                "no-reply",
                "noreply",
                "do not reply",
                "system notification",
                "newsletter",
                "marketing",
                "promotional",
                "advertisement",
                "unsubscribe",
                "out of office",
                "auto-reply",
                "vacation",
                "away message",
                // Common safe communications
                "meeting invite",
                "calendar",
                "reminder",
                "thank you",
                "congratulations",
                "welcome",
                "birthday",
                "holiday",
                "lunch",
                "coffee",
                "social event",
            ]),
            concern: string_vec(&["flagged", "concern", "suspicious", "violation"]),
        }
    }
}

impl Default for WhitelistConfig {
    fn default() -> Self {
        WhitelistConfig {
            trusted_domains: string_vec(&[
                "company.com",
                "noreply.com",
                "no-reply.com",
                "donotreply.com",
                "notification.com",
                "alerts.com",
                "system.com",
            ]),
            automated_indicators: string_vec(&[
                "automated",
                "no-reply",
                "system notification",
                "out of office",
                "auto-reply",
                "delivery status",
            ]),
        }
    }
}

impl Default for LabelConfig {
    fn default() -> Self {
        LabelConfig {
            safe: string_vec(&["low_risk", "safe", "clear", "cleared", "approved"]),
            risky: string_vec(&["high_risk", "critical"]),
        }
    }
}

fn string_vec(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Config {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_file(&self, path: &str) -> anyhow::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
