//! Field-level validation driven by rule tables.
//!
//! Each input type publishes a static list of [`Rule`]s (`field`,
//! `constraint`, `message`) and exposes its field values by name through
//! [`Validate::field`]. [`validate`] walks the list and reports every violated
//! rule, in list order, as one [`EngineError::Validation`].
//!
//! Only the `Required` constraint fails on an absent value; the others are
//! skipped when a field is missing, which lets partial updates reuse the same
//! constraints.

use validator::ValidateEmail;

use crate::{EngineError, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Constraint {
    Required,
    /// Character count of the trimmed text, inclusive bounds.
    Length { min: usize, max: usize },
    /// Inclusive numeric bounds.
    Range { min: i64, max: i64 },
    Email,
    Phone,
}

#[derive(Clone, Copy, Debug)]
pub struct Rule {
    pub field: &'static str,
    pub constraint: Constraint,
    pub message: &'static str,
}

impl Rule {
    pub const fn new(field: &'static str, constraint: Constraint, message: &'static str) -> Self {
        Self {
            field,
            constraint,
            message,
        }
    }
}

/// A field value as seen by the validator.
#[derive(Clone, Copy, Debug)]
pub enum Value<'a> {
    Text(Option<&'a str>),
    Number(Option<i64>),
}

pub trait Validate {
    fn rules() -> &'static [Rule];

    fn field(&self, name: &str) -> Value<'_>;
}

/// Evaluate all rules of `T` against `input`.
pub fn validate<T: Validate>(input: &T) -> ResultEngine<()> {
    into_result(violations(input))
}

/// Messages of every rule `input` violates, in rule order.
///
/// Inputs with nested parts (a user with an address) concatenate the
/// violations of each part and finish with [`into_result`].
pub fn violations<T: Validate>(input: &T) -> Vec<String> {
    T::rules()
        .iter()
        .filter(|rule| !satisfies(rule.constraint, input.field(rule.field)))
        .map(|rule| rule.message.to_string())
        .collect()
}

pub fn into_result(errors: Vec<String>) -> ResultEngine<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(EngineError::Validation(errors))
    }
}

fn satisfies(constraint: Constraint, value: Value<'_>) -> bool {
    match (constraint, value) {
        (Constraint::Required, Value::Text(text)) => text.is_some_and(|t| !t.trim().is_empty()),
        (Constraint::Required, Value::Number(number)) => number.is_some(),
        (_, Value::Text(None)) | (_, Value::Number(None)) => true,
        (Constraint::Length { min, max }, Value::Text(Some(text))) => {
            let len = text.trim().chars().count();
            len >= min && len <= max
        }
        (Constraint::Range { min, max }, Value::Number(Some(number))) => {
            number >= min && number <= max
        }
        (Constraint::Email, Value::Text(Some(text))) => is_email(text.trim()),
        (Constraint::Phone, Value::Text(Some(text))) => is_phone(text.trim()),
        // A constraint applied to the wrong kind of value is a rule table bug.
        _ => false,
    }
}

fn is_email(value: &str) -> bool {
    value.validate_email()
}

fn is_phone(value: &str) -> bool {
    let digits = value.strip_prefix('+').unwrap_or(value);
    let count = digits.chars().filter(char::is_ascii_digit).count();
    digits
        .chars()
        .all(|c| c.is_ascii_digit() || c == ' ' || c == '-')
        && (6..=20).contains(&count)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Sample {
        name: Option<String>,
        email: Option<String>,
        age: Option<i64>,
    }

    const SAMPLE_RULES: &[Rule] = &[
        Rule::new("name", Constraint::Required, "name is required"),
        Rule::new(
            "name",
            Constraint::Length { min: 2, max: 5 },
            "name must be 2-5 characters",
        ),
        Rule::new("email", Constraint::Email, "email is invalid"),
        Rule::new("age", Constraint::Range { min: 18, max: 99 }, "age out of range"),
    ];

    impl Validate for Sample {
        fn rules() -> &'static [Rule] {
            SAMPLE_RULES
        }

        fn field(&self, name: &str) -> Value<'_> {
            match name {
                "name" => Value::Text(self.name.as_deref()),
                "email" => Value::Text(self.email.as_deref()),
                "age" => Value::Number(self.age),
                _ => Value::Text(None),
            }
        }
    }

    #[test]
    fn valid_input_passes() {
        let sample = Sample {
            name: Some("Ada".to_string()),
            email: Some("ada@example.com".to_string()),
            age: Some(36),
        };
        assert!(validate(&sample).is_ok());
    }

    #[test]
    fn reports_every_violation_in_rule_order() {
        let sample = Sample {
            name: Some(" ".to_string()),
            email: Some("not-an-email".to_string()),
            age: Some(7),
        };
        assert_eq!(
            validate(&sample).unwrap_err(),
            EngineError::Validation(vec![
                "name is required".to_string(),
                "name must be 2-5 characters".to_string(),
                "email is invalid".to_string(),
                "age out of range".to_string(),
            ])
        );
    }

    #[test]
    fn optional_constraints_skip_missing_values() {
        let sample = Sample {
            name: Some("Bob".to_string()),
            email: None,
            age: None,
        };
        assert!(validate(&sample).is_ok());
    }

    #[test]
    fn email_and_phone_shapes() {
        assert!(is_email("renter@rent.example"));
        assert!(!is_email("renter.rent.example"));
        assert!(!is_email("a b@example.com"));
        assert!(!is_email("@example.com"));
        assert!(is_phone("+36 30 123 4567"));
        assert!(is_phone("06-30-1234567"));
        assert!(!is_phone("12ab34"));
        assert!(!is_phone("123"));
    }
}
