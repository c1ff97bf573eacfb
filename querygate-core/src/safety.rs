//! Lexical read-only gate for candidate SQL.
//!
//! Two independent checks guard every statement before it reaches the database:
//!
//! 1. **Forbidden keywords**: any whole-word occurrence of a mutating verb rejects the
//!    statement, wherever it appears (a literal or comment containing `DROP` is rejected too).
//! 2. **Allowed prefix**: the statement must begin with `SELECT` or `WITH`.
//!
//! This is not a SQL parser. False positives are accepted, false negatives are not, and
//! each check still holds if the other one is bypassed.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Mutating or privileged verbs, in the order they are reported.
pub const FORBIDDEN_KEYWORDS: [&str; 11] = [
    "INSERT", "UPDATE", "DELETE", "DROP", "CREATE", "ALTER", "TRUNCATE", "GRANT", "REVOKE",
    "EXEC", "EXECUTE",
];

pub const PREFIX_REJECTION: &str = "Query must start with SELECT or WITH";

/// Outcome of classifying one statement. Never partially safe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum SafetyVerdict {
    Safe,
    Rejected { reason: String },
}

impl SafetyVerdict {
    pub fn is_safe(&self) -> bool {
        matches!(self, SafetyVerdict::Safe)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            SafetyVerdict::Safe => None,
            SafetyVerdict::Rejected { reason } => Some(reason),
        }
    }
}

pub struct SafetyValidator {
    forbidden: Vec<(&'static str, Regex)>,
    allowed_prefix: Regex,
}

impl SafetyValidator {
    pub fn new() -> Result<Self, regex::Error> {
        let forbidden = FORBIDDEN_KEYWORDS
            .iter()
            .map(|kw| Ok((*kw, Regex::new(&format!(r"\b{}\b", regex::escape(kw)))?)))
            .collect::<Result<Vec<_>, regex::Error>>()?;

        Ok(Self {
            forbidden,
            allowed_prefix: Regex::new(r"^(SELECT|WITH)\b")?,
        })
    }

    /// Classifies `statement`. Pure: the same input always yields the same verdict.
    pub fn classify(&self, statement: &str) -> SafetyVerdict {
        // Only the working copy is uppercased; the caller executes the original text
        let normalized = statement.trim().to_uppercase();

        for (keyword, pattern) in &self.forbidden {
            if pattern.is_match(&normalized) {
                return SafetyVerdict::Rejected {
                    reason: format!("Query contains forbidden keyword: {}", keyword),
                };
            }
        }

        if !self.allowed_prefix.is_match(&normalized) {
            return SafetyVerdict::Rejected {
                reason: PREFIX_REJECTION.to_string(),
            };
        }

        SafetyVerdict::Safe
    }
}

static VALIDATOR: OnceLock<Option<SafetyValidator>> = OnceLock::new();

/// Classifies with a process-wide validator.
///
/// If the validator cannot be built every statement is rejected.
pub fn classify(statement: &str) -> SafetyVerdict {
    let validator = VALIDATOR.get_or_init(|| match SafetyValidator::new() {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::error!(error = %e, "Failed to build safety validator");
            None
        }
    });

    match validator {
        Some(v) => v.classify(statement),
        None => SafetyVerdict::Rejected {
            reason: "Safety validator unavailable".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejected_with(statement: &str) -> String {
        match classify(statement) {
            SafetyVerdict::Rejected { reason } => reason,
            SafetyVerdict::Safe => panic!("expected rejection for {statement:?}"),
        }
    }

    #[test]
    fn test_plain_reads_are_safe() {
        assert!(classify("SELECT * FROM usertable").is_safe());
        assert!(classify("  select id, name from usertable where age > 18  ").is_safe());
        assert!(classify("WITH counts AS (SELECT user_id, COUNT(*) AS c FROM prompt_history GROUP BY user_id) SELECT AVG(c) FROM counts").is_safe());
    }

    #[test]
    fn test_forbidden_keyword_anywhere_rejects() {
        assert_eq!(
            rejected_with("SELECT * FROM t; DROP TABLE t"),
            "Query contains forbidden keyword: DROP"
        );
        assert_eq!(
            rejected_with("delete from usertable"),
            "Query contains forbidden keyword: DELETE"
        );
        assert_eq!(
            rejected_with("WITH x AS (UPDATE t SET a = 1 RETURNING *) SELECT * FROM x"),
            "Query contains forbidden keyword: UPDATE"
        );
    }

    #[test]
    fn test_keyword_inside_literal_is_rejected_conservatively() {
        assert_eq!(
            rejected_with("SELECT * FROM notes WHERE body = 'please drop me'"),
            "Query contains forbidden keyword: DROP"
        );
    }

    #[test]
    fn test_identifier_substrings_do_not_trigger() {
        assert!(classify("SELECT * FROM insertions").is_safe());
        assert!(classify("SELECT created_at, updated_by FROM inserted_data").is_safe());
        assert!(classify("SELECT executed_at FROM dropped_sessions").is_safe());
    }

    #[test]
    fn test_disallowed_prefix_rejects() {
        assert_eq!(rejected_with("DO something"), PREFIX_REJECTION);
        assert_eq!(rejected_with("EXPLAIN SELECT 1"), PREFIX_REJECTION);
        assert_eq!(rejected_with("SELECTED_ROWS"), PREFIX_REJECTION);
        assert_eq!(rejected_with(""), PREFIX_REJECTION);
        assert_eq!(
            rejected_with("I can help you query the database."),
            PREFIX_REJECTION
        );
    }

    #[test]
    fn test_keyword_check_runs_before_prefix_check() {
        assert_eq!(
            rejected_with("TRUNCATE usertable"),
            "Query contains forbidden keyword: TRUNCATE"
        );
    }

    #[test]
    fn test_classify_is_idempotent() {
        let validator = SafetyValidator::new().unwrap();
        for statement in ["SELECT 1", "DROP TABLE t", "SHOW search_path"] {
            assert_eq!(validator.classify(statement), validator.classify(statement));
            assert_eq!(validator.classify(statement), classify(statement));
        }
    }

    #[test]
    fn test_verdict_reason_accessor() {
        assert_eq!(SafetyVerdict::Safe.reason(), None);
        assert_eq!(
            classify("GRANT ALL ON t TO bob").reason(),
            Some("Query contains forbidden keyword: GRANT")
        );
    }
}
