//! Form validation accumulator.
//!
//! A [`Validator`] is created per form submission. Handlers run every check
//! through it and re-render the form with the collected messages when
//! [`Validator::is_valid`] is false.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

/// Pattern used to sanity check email addresses, compiled once per process.
///
/// # Examples
/// ```
/// use snippetbox::domain::{Validator, email_regex};
///
/// assert!(Validator::matches("alice@example.com", email_regex()));
/// assert!(!Validator::matches("alice@", email_regex()));
/// ```
#[must_use]
pub fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        let pattern = concat!(
            r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@",
            r"[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?",
            r"(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
        );
        Regex::new(pattern).unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Field and non-field error messages collected while checking a form.
///
/// Serialises as `{ "field_errors": {..}, "non_field_errors": [..] }` so
/// templates can render the messages next to their inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Validator {
    field_errors: BTreeMap<String, String>,
    non_field_errors: Vec<String>,
}

impl Validator {
    /// Start with no recorded errors.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True when neither field nor non-field errors were recorded.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.field_errors.is_empty() && self.non_field_errors.is_empty()
    }

    /// Record `message` against `key` unless `key` already has a message.
    pub fn add_field_error(&mut self, key: &str, message: &str) {
        self.field_errors
            .entry(key.to_owned())
            .or_insert_with(|| message.to_owned());
    }

    /// Record a message that does not belong to a single field.
    pub fn add_non_field_error(&mut self, message: &str) {
        self.non_field_errors.push(message.to_owned());
    }

    /// Record `message` against `key` when `ok` is false. First failure wins.
    pub fn check_field(&mut self, ok: bool, key: &str, message: &str) {
        if !ok {
            self.add_field_error(key, message);
        }
    }

    /// Message recorded for `key`, if any.
    #[must_use]
    pub fn field_error(&self, key: &str) -> Option<&str> {
        self.field_errors.get(key).map(String::as_str)
    }

    /// All field errors keyed by field name.
    #[must_use]
    pub fn field_errors(&self) -> &BTreeMap<String, String> {
        &self.field_errors
    }

    /// Non-field errors in insertion order.
    #[must_use]
    pub fn non_field_errors(&self) -> &[String] {
        &self.non_field_errors
    }

    /// True when `value` has non-whitespace content.
    #[must_use]
    pub fn not_blank(value: &str) -> bool {
        !value.trim().is_empty()
    }

    /// True when `value` has at most `n` code points.
    #[must_use]
    pub fn max_chars(value: &str, n: usize) -> bool {
        value.chars().count() <= n
    }

    /// True when `value` has at least `n` code points.
    #[must_use]
    pub fn min_chars(value: &str, n: usize) -> bool {
        value.chars().count() >= n
    }

    /// True when `value` is one of `permitted`.
    #[must_use]
    pub fn permitted_value<T: PartialEq>(value: &T, permitted: &[T]) -> bool {
        permitted.contains(value)
    }

    /// True when `value` matches `pattern`.
    #[must_use]
    pub fn matches(value: &str, pattern: &Regex) -> bool {
        pattern.is_match(value)
    }
}
