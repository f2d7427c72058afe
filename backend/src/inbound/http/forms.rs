//! Validation messages shared by the HTML forms.

/// Message for a required field left empty.
pub const BLANK: &str = "This field cannot be blank";
/// Message for a malformed email address.
pub const INVALID_EMAIL: &str = "This field must be a valid email address";

/// Message for a value longer than `n` characters.
#[must_use]
pub fn max_chars_message(n: usize) -> String {
    format!("This field cannot be more than {n} characters long")
}

/// Message for a value shorter than `n` characters.
#[must_use]
pub fn min_chars_message(n: usize) -> String {
    format!("This field must be at least {n} characters long")
}
