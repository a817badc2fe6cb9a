use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Number, Value};

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

/// A compiled regex constraint plus the message shown on mismatch.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub regex: Regex,
    pub description: Option<String>,
}

impl CompiledPattern {
    fn message(&self, label: &str) -> String {
        self.description
            .clone()
            .unwrap_or_else(|| format!("Invalid format for {label}"))
    }
}

/// Validation rule for one field, selected from the descriptor's type tag.
///
/// `String` covers text, textarea, date, and select inputs: all of them are
/// uninterpreted strings at this layer (dates get no calendar validation and
/// select membership is enforced by the widget, not the rule).
#[derive(Debug, Clone)]
pub enum FieldRule {
    String {
        required: bool,
        pattern: Option<CompiledPattern>,
    },
    Email {
        required: bool,
    },
    Number {
        required: bool,
    },
}

impl FieldRule {
    pub fn required(&self) -> bool {
        match self {
            FieldRule::String { required, .. }
            | FieldRule::Email { required }
            | FieldRule::Number { required } => *required,
        }
    }

    /// Check a raw entry against the rule, producing the coerced value.
    ///
    /// `Ok(None)` means "no value": an optional field left empty is neither
    /// an error nor a zero/empty coercion. Errors carry the user-facing
    /// message for the field.
    pub fn validate(&self, label: &str, raw: &str) -> Result<Option<Value>, String> {
        match self {
            FieldRule::String { required, pattern } => {
                if raw.is_empty() {
                    return absent(label, *required);
                }
                if let Some(pattern) = pattern {
                    if !pattern.regex.is_match(raw) {
                        return Err(pattern.message(label));
                    }
                }
                Ok(Some(Value::String(raw.to_string())))
            }
            FieldRule::Email { required } => {
                if raw.is_empty() {
                    return absent(label, *required);
                }
                if !EMAIL_RE.is_match(raw) {
                    return Err("Invalid email address".to_string());
                }
                Ok(Some(Value::String(raw.to_string())))
            }
            FieldRule::Number { required } => {
                if raw.is_empty() {
                    return absent(label, *required);
                }
                // absence is the truly empty entry; anything typed, even
                // whitespace, must coerce or it is a type error
                raw.trim()
                    .parse::<f64>()
                    .ok()
                    .and_then(Number::from_f64)
                    .map(|num| Some(Value::Number(num)))
                    .ok_or_else(|| format!("{label} must be a number"))
            }
        }
    }

    /// The compiled default: no value for numbers (never a spurious zero),
    /// empty string for every other type.
    pub fn default_value(&self) -> Value {
        match self {
            FieldRule::Number { .. } => Value::Null,
            _ => Value::String(String::new()),
        }
    }
}

fn absent(label: &str, required: bool) -> Result<Option<Value>, String> {
    if required {
        Err(format!("{label} is required"))
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pattern(source: &str, description: Option<&str>) -> CompiledPattern {
        CompiledPattern {
            regex: Regex::new(source).expect("test pattern"),
            description: description.map(str::to_string),
        }
    }

    #[test]
    fn required_number_distinguishes_absence_from_bad_input() {
        let rule = FieldRule::Number { required: true };
        assert_eq!(rule.validate("Fleet Size", ""), Err("Fleet Size is required".into()));
        assert_eq!(
            rule.validate("Fleet Size", "abc"),
            Err("Fleet Size must be a number".into())
        );
        assert_eq!(rule.validate("Fleet Size", "42"), Ok(Some(json!(42.0))));
    }

    #[test]
    fn optional_number_coerces_empty_to_no_value() {
        let rule = FieldRule::Number { required: false };
        assert_eq!(rule.validate("Fleet Size", ""), Ok(None));
        assert_eq!(rule.validate("Fleet Size", " 3.5 "), Ok(Some(json!(3.5))));
    }

    #[test]
    fn whitespace_only_number_entries_are_type_errors_not_absence() {
        for rule in [
            FieldRule::Number { required: true },
            FieldRule::Number { required: false },
        ] {
            assert_eq!(
                rule.validate("Fleet Size", "   "),
                Err("Fleet Size must be a number".into())
            );
        }
    }

    #[test]
    fn non_finite_numbers_are_type_errors() {
        let rule = FieldRule::Number { required: true };
        assert_eq!(
            rule.validate("Ratio", "NaN"),
            Err("Ratio must be a number".into())
        );
        assert_eq!(
            rule.validate("Ratio", "inf"),
            Err("Ratio must be a number".into())
        );
    }

    #[test]
    fn email_rule_accepts_well_formed_addresses_only() {
        let rule = FieldRule::Email { required: true };
        assert_eq!(
            rule.validate("Contact Email", "a@b.co"),
            Ok(Some(json!("a@b.co")))
        );
        assert_eq!(
            rule.validate("Contact Email", "not-an-email"),
            Err("Invalid email address".into())
        );
        assert_eq!(
            rule.validate("Contact Email", ""),
            Err("Contact Email is required".into())
        );
    }

    #[test]
    fn optional_email_may_be_absent() {
        let rule = FieldRule::Email { required: false };
        assert_eq!(rule.validate("Contact Email", ""), Ok(None));
    }

    #[test]
    fn string_rule_applies_pattern_with_default_message() {
        let rule = FieldRule::String {
            required: true,
            pattern: Some(pattern("^[A-Z]+$", None)),
        };
        assert_eq!(rule.validate("Code", ""), Err("Code is required".into()));
        assert_eq!(
            rule.validate("Code", "abc"),
            Err("Invalid format for Code".into())
        );
        assert_eq!(rule.validate("Code", "ABC"), Ok(Some(json!("ABC"))));
    }

    #[test]
    fn pattern_description_overrides_the_default_message() {
        let rule = FieldRule::String {
            required: false,
            pattern: Some(pattern("^[0-9]{4}$", Some("Four digits"))),
        };
        assert_eq!(rule.validate("Postcode", "12"), Err("Four digits".into()));
    }

    #[test]
    fn dates_pass_through_uninterpreted() {
        let rule = FieldRule::String {
            required: false,
            pattern: None,
        };
        assert_eq!(
            rule.validate("Founded", "not a date"),
            Ok(Some(json!("not a date")))
        );
    }
}
