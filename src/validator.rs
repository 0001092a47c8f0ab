//! Feature validation for raw transaction input.
//!
//! Raw input is a field-name-to-value mapping, typically parsed from JSON
//! or collected from a form. Validation is strict: exactly the 30 known
//! fields must be present, and every problem found is reported at once so
//! the caller can point at each offending field.

use crate::error::{FieldIssue, FraudScoringError, ValidationError};
use crate::types::transaction::{field_names, TransactionRecord, PCA_COMPONENTS, SECONDS_PER_DAY};
use serde_json::{Map, Value};

/// Parse JSON text into a raw field mapping.
///
/// Fails on malformed JSON and on any JSON value other than an object.
pub fn parse_json(text: &str) -> Result<Map<String, Value>, FraudScoringError> {
    match serde_json::from_str::<Value>(text)? {
        Value::Object(map) => Ok(map),
        _ => Err(FraudScoringError::NotAnObject),
    }
}

/// Validate a raw mapping into a [`TransactionRecord`].
pub fn validate(raw: &Map<String, Value>) -> Result<TransactionRecord, ValidationError> {
    let mut issues = Vec::new();
    let expected = field_names();

    for name in &expected {
        if !raw.contains_key(name) {
            issues.push(FieldIssue::Missing(name.clone()));
        }
    }

    let mut unexpected: Vec<&String> = raw.keys().filter(|k| !expected.contains(k)).collect();
    unexpected.sort();
    issues.extend(unexpected.into_iter().map(|k| FieldIssue::Unexpected(k.clone())));

    let amount = raw.get("amount").and_then(|v| check_amount(v, &mut issues));
    let time = raw.get("time").and_then(|v| check_time(v, &mut issues));

    let mut components = [0.0; PCA_COMPONENTS];
    for (i, slot) in components.iter_mut().enumerate() {
        let name = format!("v{}", i + 1);
        if let Some(value) = raw.get(&name) {
            match value.as_f64() {
                Some(v) => *slot = v,
                None => issues.push(FieldIssue::NotNumeric(name)),
            }
        }
    }

    match (amount, time) {
        (Some(amount), Some(time)) if issues.is_empty() => Ok(TransactionRecord {
            amount,
            time,
            components,
        }),
        _ => Err(ValidationError { issues }),
    }
}

fn check_amount(value: &Value, issues: &mut Vec<FieldIssue>) -> Option<f64> {
    let Some(amount) = value.as_f64() else {
        issues.push(FieldIssue::NotNumeric("amount".to_string()));
        return None;
    };

    if amount < 0.0 {
        issues.push(FieldIssue::OutOfRange {
            field: "amount".to_string(),
            reason: format!("must be >= 0, got {}", amount),
        });
        return None;
    }

    Some(amount)
}

fn check_time(value: &Value, issues: &mut Vec<FieldIssue>) -> Option<u32> {
    let Some(time) = value.as_f64() else {
        issues.push(FieldIssue::NotNumeric("time".to_string()));
        return None;
    };

    // Form widgets may send 3600.0; anything with a fractional part is rejected
    if time.fract() != 0.0 {
        issues.push(FieldIssue::NotInteger("time".to_string()));
        return None;
    }

    if !(0.0..=SECONDS_PER_DAY as f64).contains(&time) {
        issues.push(FieldIssue::OutOfRange {
            field: "time".to_string(),
            reason: format!("must be within 0..={}, got {}", SECONDS_PER_DAY, time),
        });
        return None;
    }

    Some(time as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_raw() -> Map<String, Value> {
        let mut raw = Map::new();
        raw.insert("amount".to_string(), json!(100.50));
        raw.insert("time".to_string(), json!(3600));
        for i in 1..=28 {
            raw.insert(format!("v{}", i), json!(0.0));
        }
        raw
    }

    #[test]
    fn test_accepts_valid_record() {
        let record = validate(&valid_raw()).unwrap();
        assert_eq!(record.amount(), 100.50);
        assert_eq!(record.time(), 3600);
        assert!(record.components().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_rejects_each_missing_field() {
        for name in field_names() {
            let mut raw = valid_raw();
            raw.remove(&name);

            let err = validate(&raw).unwrap_err();
            assert_eq!(err.fields(), vec![name.as_str()]);
            assert_eq!(err.issues[0], FieldIssue::Missing(name.clone()));
        }
    }

    #[test]
    fn test_rejects_extra_field() {
        let mut raw = valid_raw();
        raw.insert("merchant".to_string(), json!(1.0));

        let err = validate(&raw).unwrap_err();
        assert_eq!(err.issues, vec![FieldIssue::Unexpected("merchant".to_string())]);
    }

    #[test]
    fn test_time_bounds() {
        for (time, ok) in [(json!(-1), false), (json!(86401), false), (json!(0), true), (json!(86400), true)] {
            let mut raw = valid_raw();
            raw.insert("time".to_string(), time.clone());
            assert_eq!(validate(&raw).is_ok(), ok, "time = {}", time);
        }
    }

    #[test]
    fn test_time_must_be_integral() {
        let mut raw = valid_raw();
        raw.insert("time".to_string(), json!(3600.0));
        assert_eq!(validate(&raw).unwrap().time(), 3600);

        raw.insert("time".to_string(), json!(3600.5));
        let err = validate(&raw).unwrap_err();
        assert_eq!(err.issues, vec![FieldIssue::NotInteger("time".to_string())]);
    }

    #[test]
    fn test_amount_bounds() {
        let mut raw = valid_raw();
        raw.insert("amount".to_string(), json!(-0.01));
        let err = validate(&raw).unwrap_err();
        assert_eq!(err.fields(), vec!["amount"]);

        raw.insert("amount".to_string(), json!(0));
        assert_eq!(validate(&raw).unwrap().amount(), 0.0);
    }

    #[test]
    fn test_rejects_non_numeric_values() {
        let mut raw = valid_raw();
        raw.insert("v7".to_string(), json!("1.5"));
        raw.insert("amount".to_string(), json!(true));

        let err = validate(&raw).unwrap_err();
        assert_eq!(err.fields(), vec!["amount", "v7"]);
    }

    #[test]
    fn test_components_are_unconstrained() {
        let mut raw = valid_raw();
        raw.insert("v1".to_string(), json!(-1.0e6));
        raw.insert("v28".to_string(), json!(42.0));

        let record = validate(&raw).unwrap();
        assert_eq!(record.component(1), Some(-1.0e6));
        assert_eq!(record.component(28), Some(42.0));
    }

    #[test]
    fn test_parse_json() {
        assert!(parse_json(r#"{"amount": 1}"#).is_ok());
        assert!(matches!(
            parse_json("{not json"),
            Err(FraudScoringError::MalformedJson(_))
        ));
        assert!(matches!(parse_json("[1, 2]"), Err(FraudScoringError::NotAnObject)));
    }
}
