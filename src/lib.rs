pub mod cases;
pub mod classify;
pub mod config;
pub mod error;
pub mod processor;
pub mod risk;
pub mod rules;
pub mod store;

pub use cases::CaseManager;
pub use classify::{Classifier, FixedClassifier, KeywordClassifier};
pub use config::Config;
pub use error::{ProcessError, StoreError};
pub use processor::{
    BatchSummary, Disposition, EmailProcessingResult, Pipeline, ProcessingAction,
};
pub use risk::{RiskAssessment, RiskLevel, RiskScorer};
pub use rules::{AdminRule, RuleCondition, RuleSet};
pub use store::{Case, EmailRecord, SqliteStore, Store};
