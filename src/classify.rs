use anyhow::Result;

/// Text-classification capability. The real model lives outside this crate;
/// anything that can label a subject+justification string can back the
/// pipeline. Implementations must tolerate empty input and return a neutral
/// label rather than failing.
pub trait Classifier {
    fn classify(&self, text: &str) -> Result<String>;
}

/// Stand-in classifier used when no external model is wired in. Labels by
/// vocabulary density so the pipeline degrades gracefully instead of losing
/// the classification signal entirely.
pub struct KeywordClassifier {
    high_risk_terms: Vec<String>,
    safe_terms: Vec<String>,
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        KeywordClassifier {
            high_risk_terms: [
                "urgent",
                "confidential",
                "secret",
                "transfer",
                "payment",
                "password",
                "credential",
                "wire",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            safe_terms: [
                "thank you",
                "meeting",
                "newsletter",
                "reminder",
                "congratulations",
                "welcome",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl Classifier for KeywordClassifier {
    fn classify(&self, text: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Ok("unknown".to_string());
        }
        let text = text.to_lowercase();
        let risk_hits = self
            .high_risk_terms
            .iter()
            .filter(|t| text.contains(t.as_str()))
            .count();
        let safe_hits = self
            .safe_terms
            .iter()
            .filter(|t| text.contains(t.as_str()))
            .count();

        let label = if risk_hits >= 2 {
            "high_risk"
        } else if risk_hits == 0 && safe_hits > 0 {
            "low_risk"
        } else {
            "unknown"
        };
        log::debug!("keyword classifier: {risk_hits} risk / {safe_hits} safe hits -> {label}");
        Ok(label.to_string())
    }
}

/// Returns the same label for every input. Test double, also handy for
/// forcing a disposition policy in a sandbox.
pub struct FixedClassifier(pub String);

impl FixedClassifier {
    pub fn new(label: &str) -> Self {
        FixedClassifier(label.to_string())
    }
}

impl Classifier for FixedClassifier {
    fn classify(&self, _text: &str) -> Result<String> {
        Ok(self.0.clone())
    }
}
