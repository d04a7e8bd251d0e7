//! Field-level input checks.
//!
//! A [`Validator`] collects every failing field of a payload so the client gets
//! the full list at once; nothing is written until [`Validator::finish`] passes.

use jiff::civil::Date;

use crate::error::{AppError, AppResult, FieldError};

#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    /// Required, at most `max` characters, and starting with an uppercase letter.
    pub fn name(&mut self, field: &str, value: &str, max: usize) {
        let value = value.trim();
        if value.is_empty() {
            self.push(field, format!("the field {field} is required"));
            return;
        }
        if value.chars().count() > max {
            self.push(field, format!("the field {field} must have {max} characters or fewer"));
        }
        if !first_letter_uppercase(value) {
            self.push(field, "the first letter must be uppercase");
        }
    }

    pub fn max_len(&mut self, field: &str, value: &str, max: usize) {
        if value.chars().count() > max {
            self.push(field, format!("the field {field} must have {max} characters or fewer"));
        }
    }

    pub fn range(&mut self, field: &str, value: f64, min: f64, max: f64) {
        if !(min..=max).contains(&value) {
            self.push(field, format!("the field {field} must be between {min} and {max}"));
        }
    }

    /// Parses a `YYYY-MM-DD` date, recording an error when absent or malformed.
    pub fn date(&mut self, field: &str, value: Option<&str>) -> Option<Date> {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            None => {
                self.push(field, format!("the field {field} is required"));
                None
            },
            Some(raw) => match raw.parse::<Date>() {
                Ok(date) => Some(date),
                Err(_) => {
                    self.push(field, format!("the field {field} must be a date (YYYY-MM-DD)"));
                    None
                },
            },
        }
    }

    pub fn email(&mut self, field: &str, value: &str) {
        let value = value.trim();
        let valid = match value.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty() && !domain.is_empty() && !domain.contains('@')
            },
            None => false,
        };
        if !valid {
            self.push(field, format!("the field {field} is not a valid email address"));
        }
    }

    pub fn finish(self) -> AppResult<()> {
        if self.errors.is_empty() { Ok(()) } else { Err(AppError::Validation(self.errors)) }
    }
}

fn first_letter_uppercase(value: &str) -> bool {
    value.chars().next().is_some_and(|c| !c.is_alphabetic() || c.is_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(result: AppResult<()>) -> Vec<String> {
        match result {
            Err(AppError::Validation(errors)) => errors.into_iter().map(|e| e.field).collect(),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn name_rules() {
        let mut v = Validator::new();
        v.name("name", "Drama", 50);
        assert!(v.finish().is_ok());

        let mut v = Validator::new();
        v.name("name", "drama", 50);
        assert_eq!(fields(v.finish()), vec!["name"]);

        let mut v = Validator::new();
        v.name("name", "   ", 50);
        assert_eq!(fields(v.finish()), vec!["name"]);

        let mut v = Validator::new();
        v.name("name", &"A".repeat(51), 50);
        assert_eq!(fields(v.finish()), vec!["name"]);
    }

    #[test]
    fn leading_digit_is_not_a_lowercase_letter() {
        let mut v = Validator::new();
        v.name("title", "2001: A Space Odyssey", 300);
        assert!(v.finish().is_ok());
    }

    #[test]
    fn collects_every_failing_field() {
        let mut v = Validator::new();
        v.name("name", "", 75);
        v.range("latitude", 91.0, -90.0, 90.0);
        v.range("longitude", -180.0, -180.0, 180.0);
        assert_eq!(fields(v.finish()), vec!["name", "latitude"]);
    }

    #[test]
    fn dates() {
        let mut v = Validator::new();
        assert_eq!(v.date("releaseDate", Some("2024-02-29")), Some(jiff::civil::date(2024, 2, 29)));
        assert!(v.date("releaseDate", Some("2023-02-29")).is_none());
        assert!(v.date("releaseDate", None).is_none());
        assert_eq!(fields(v.finish()), vec!["releaseDate", "releaseDate"]);
    }

    #[test]
    fn emails() {
        let mut v = Validator::new();
        v.email("email", "someone@example.com");
        assert!(v.finish().is_ok());

        let mut v = Validator::new();
        v.email("email", "example.com");
        v.email("email", "@example.com");
        assert_eq!(fields(v.finish()).len(), 2);
    }
}
