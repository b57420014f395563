pub mod bookingdtos;
pub mod listingdtos;
pub mod userdtos;

use std::borrow::Cow;

use axum::extract::FromRequest;
use serde::{Deserialize, Serialize};
use validator::{ValidationError, ValidationErrors, ValidationErrorsKind};

use crate::error::HttpError;

/// `Json` whose rejection is reported in the API error envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(HttpError))]
pub struct AppJson<T>(pub T);

/// A JSON number or a numeric string, as sent by HTML forms.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Numeric {
    Number(f64),
    Text(String),
}

impl Numeric {
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            Numeric::Number(n) => *n,
            Numeric::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }

    pub fn as_i32(&self) -> Option<i32> {
        let value = self.as_f64()?;
        if value.fract() == 0.0 && value >= i32::MIN as f64 && value <= i32::MAX as f64 {
            Some(value as i32)
        } else {
            None
        }
    }
}

pub(crate) fn validation_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::from(message));
    err
}

/// Picks one human-readable message, preferring fields in alphabetical order
/// and descending into nested structs.
pub fn first_validation_message(errors: &ValidationErrors) -> String {
    first_message(errors).unwrap_or_else(|| errors.to_string())
}

fn first_message(errors: &ValidationErrors) -> Option<String> {
    let mut fields: Vec<_> = errors.errors().iter().collect();
    fields.sort_unstable_by(|a, b| a.0.cmp(b.0));

    fields.into_iter().find_map(|(_, kind)| match kind {
        ValidationErrorsKind::Field(errs) => errs.first().map(|err| match &err.message {
            Some(message) => message.to_string(),
            None => format!("Invalid value: {}", err.code),
        }),
        ValidationErrorsKind::Struct(nested) => first_message(nested),
        ValidationErrorsKind::List(items) => {
            items.values().find_map(|nested| first_message(nested))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_accepts_numbers_and_strings() {
        let n: Numeric = serde_json::from_str("1000").unwrap();
        assert_eq!(n.as_f64(), Some(1000.0));

        let s: Numeric = serde_json::from_str("\" 250.5 \"").unwrap();
        assert_eq!(s.as_f64(), Some(250.5));

        let bad: Numeric = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(bad.as_f64(), None);
    }

    #[test]
    fn numeric_integers_reject_fractions() {
        assert_eq!(Numeric::Text("3".to_string()).as_i32(), Some(3));
        assert_eq!(Numeric::Number(2.5).as_i32(), None);
        assert_eq!(Numeric::Text("1e12".to_string()).as_i32(), None);
    }
}
