//! User account primitives.
//!
//! Field-level checks (blank names, email shape, password length) live in the
//! form handlers through [`crate::domain::Validator`]; these types only carry
//! already-validated values to the user port.

use std::fmt;

use zeroize::Zeroizing;

/// Minimum password length accepted at signup, in code points.
pub const PASSWORD_MIN_CHARS: usize = 8;

/// Database identifier of a registered user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(i32);

impl UserId {
    /// Wrap a raw identifier.
    #[must_use]
    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    /// Underlying integer value.
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Signup payload handed to [`crate::domain::ports::UserRepository::insert`].
///
/// ## Invariants
/// - `name` and `email` are trimmed.
/// - `password` is the plain text secret; it is zeroed on drop and only ever
///   leaves this type as a bcrypt hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    name: String,
    email: String,
    password: Zeroizing<String>,
}

impl NewUser {
    /// Build a signup payload from form input.
    #[must_use]
    pub fn new(name: &str, email: &str, password: &str) -> Self {
        Self {
            name: name.trim().to_owned(),
            email: email.trim().to_owned(),
            password: Zeroizing::new(password.to_owned()),
        }
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Unique login email.
    #[must_use]
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Plain text password.
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Email and password submitted to the login form.
///
/// # Examples
/// ```
/// use snippetbox::domain::LoginCredentials;
///
/// let creds = LoginCredentials::new(" alice@example.com ", "pa55word");
/// assert_eq!(creds.email(), "alice@example.com");
/// assert_eq!(creds.password(), "pa55word");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials; the email is trimmed, the password kept verbatim.
    #[must_use]
    pub fn new(email: &str, password: &str) -> Self {
        Self {
            email: email.trim().to_owned(),
            password: Zeroizing::new(password.to_owned()),
        }
    }

    /// Email used for the lookup.
    #[must_use]
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Password supplied by the caller.
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn new_user_trims_identity_but_not_password() {
        let user = NewUser::new("  Alice ", " alice@example.com", " secret pw ");
        assert_eq!(user.name(), "Alice");
        assert_eq!(user.email(), "alice@example.com");
        assert_eq!(user.password(), " secret pw ");
    }

    #[rstest]
    #[case(1)]
    #[case(9000)]
    fn user_id_round_trips(#[case] raw: i32) {
        assert_eq!(UserId::new(raw).get(), raw);
        assert_eq!(UserId::new(raw).to_string(), raw.to_string());
    }
}
