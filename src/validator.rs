//! Pluggable value validation.
//!
//! A [`Validator`] decides whether a candidate root value is acceptable
//! before it is committed to memory and disk. Validators must be
//! synchronous and side-effect-free: the tracker calls them speculatively
//! on simulated candidates that may be discarded.
//!
//! A validator may also *transform* the value it accepts (normalization,
//! defaulting of missing fields). Whole-value replacement through
//! [`Nook::set`](crate::Nook::set) stores the accepted value; the mutation
//! tracker only uses the accept/reject verdict and commits its own
//! candidate unchanged.

use serde_json::Value;

/// Outcome of validating a candidate value.
#[derive(Debug, Clone)]
pub enum Validation {
    /// The candidate is acceptable. Carries the value to store, which may
    /// differ from the candidate if the validator normalizes.
    Accepted(Value),
    /// The candidate is not acceptable; carries a human-readable reason.
    Rejected(String),
}

impl Validation {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Validation::Accepted(_))
    }
}

/// Decides whether a candidate root value may be committed.
pub trait Validator {
    fn validate(&self, candidate: &Value) -> Validation;
}

/// Any `Fn(&Value) -> Validation` closure is a validator.
impl<F> Validator for F
where
    F: Fn(&Value) -> Validation,
{
    fn validate(&self, candidate: &Value) -> Validation {
        self(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn all_strings(candidate: &Value) -> Validation {
        match candidate.as_array() {
            Some(items) if items.iter().all(|v| v.is_string()) => {
                Validation::Accepted(candidate.clone())
            }
            _ => Validation::Rejected("expected an array of strings".to_string()),
        }
    }

    #[test]
    fn test_closure_validator_accepts() {
        let verdict = all_strings.validate(&json!(["a", "b"]));
        assert!(verdict.is_accepted());
    }

    #[test]
    fn test_closure_validator_rejects() {
        let verdict = all_strings.validate(&json!(["a", 1]));
        assert!(!verdict.is_accepted());
    }

    #[test]
    fn test_accepted_may_transform() {
        let lowercase = |candidate: &Value| match candidate.as_str() {
            Some(s) => Validation::Accepted(Value::String(s.to_lowercase())),
            None => Validation::Rejected("expected a string".to_string()),
        };
        match lowercase.validate(&json!("HeLLo")) {
            Validation::Accepted(v) => assert_eq!(v, json!("hello")),
            Validation::Rejected(_) => panic!("expected acceptance"),
        }
    }
}
