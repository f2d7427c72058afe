//! Account pages.
//!
//! ```text
//! GET  /user/signup   signup form
//! POST /user/signup   register and redirect to login
//! GET  /user/login    login form
//! POST /user/login    authenticate and redirect to snippet creation
//! POST /user/logout   end the session and redirect home
//! ```

use actix_web::http::StatusCode;
use actix_web::http::header::LOCATION;
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::ports::UserPersistenceError;
use crate::domain::{LoginCredentials, NewUser, PASSWORD_MIN_CHARS, Validator, email_regex};
use crate::inbound::http::error::HandlerResult;
use crate::inbound::http::forms::{BLANK, INVALID_EMAIL, min_chars_message};
use crate::inbound::http::page::{PageContext, render};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Flash shown after a successful signup.
pub const SIGNUP_FLASH: &str = "Your signup was successful. Please log in.";
/// Flash shown after logging out.
pub const LOGOUT_FLASH: &str = "You've been logged out successfully!";
const DUPLICATE_EMAIL: &str = "Email address is already in use";
const BAD_CREDENTIALS: &str = "Email or password is incorrect";
const AFTER_LOGIN_PATH: &str = "/snippet/create";

fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((LOCATION, location.to_owned()))
        .finish()
}

/// Raw `POST /user/signup` body. Missing fields read as empty.
#[derive(Deserialize)]
pub struct SignupInput {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

/// Signup form state rendered back into `signup.html`. The password is
/// never echoed.
#[derive(Debug, Default, Serialize)]
struct SignupForm {
    name: String,
    email: String,
    #[serde(flatten)]
    validator: Validator,
}

impl SignupForm {
    fn validate(input: &SignupInput) -> Self {
        let mut v = Validator::new();
        v.check_field(Validator::not_blank(&input.name), "name", BLANK);
        v.check_field(Validator::not_blank(&input.email), "email", BLANK);
        v.check_field(
            Validator::matches(&input.email, email_regex()),
            "email",
            INVALID_EMAIL,
        );
        v.check_field(Validator::not_blank(&input.password), "password", BLANK);
        v.check_field(
            Validator::min_chars(&input.password, PASSWORD_MIN_CHARS),
            "password",
            &min_chars_message(PASSWORD_MIN_CHARS),
        );
        Self {
            name: input.name.clone(),
            email: input.email.clone(),
            validator: v,
        }
    }
}

/// Raw `POST /user/login` body. Missing fields read as empty.
#[derive(Deserialize)]
pub struct LoginInput {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

/// Login form state rendered back into `login.html`.
#[derive(Debug, Default, Serialize)]
struct LoginForm {
    email: String,
    #[serde(flatten)]
    validator: Validator,
}

impl LoginForm {
    fn validate(input: &LoginInput) -> Self {
        let mut v = Validator::new();
        v.check_field(Validator::not_blank(&input.email), "email", BLANK);
        v.check_field(
            Validator::matches(&input.email, email_regex()),
            "email",
            INVALID_EMAIL,
        );
        v.check_field(Validator::not_blank(&input.password), "password", BLANK);
        Self {
            email: input.email.clone(),
            validator: v,
        }
    }
}

/// Empty signup form.
pub async fn user_signup(
    state: web::Data<HttpState>,
    page: PageContext,
) -> HandlerResult<HttpResponse> {
    let data = page
        .data(state.clock.utc())
        .with_form(&SignupForm::default())?;
    render(&state, "signup.html", StatusCode::OK, &data)
}

/// Register a new account.
///
/// Invalid input or an email already in use re-renders the form with 422.
pub async fn user_signup_post(
    state: web::Data<HttpState>,
    page: PageContext,
    session: SessionContext,
    web::Form(input): web::Form<SignupInput>,
) -> HandlerResult<HttpResponse> {
    let mut form = SignupForm::validate(&input);

    if form.validator.is_valid() {
        let user = NewUser::new(&input.name, &input.email, &input.password);
        match state.users.insert(&user).await {
            Ok(()) => {
                info!("user signed up");
                session.put_flash(SIGNUP_FLASH)?;
                return Ok(see_other("/user/login"));
            }
            Err(UserPersistenceError::DuplicateEmail) => {
                form.validator.add_field_error("email", DUPLICATE_EMAIL);
            }
            Err(err) => return Err(err.into()),
        }
    }

    let data = page.data(state.clock.utc()).with_form(&form)?;
    render(&state, "signup.html", StatusCode::UNPROCESSABLE_ENTITY, &data)
}

/// Empty login form.
pub async fn user_login(
    state: web::Data<HttpState>,
    page: PageContext,
) -> HandlerResult<HttpResponse> {
    let data = page
        .data(state.clock.utc())
        .with_form(&LoginForm::default())?;
    render(&state, "login.html", StatusCode::OK, &data)
}

/// Authenticate and start a fresh session.
///
/// Invalid input or wrong credentials re-render the form with 422.
pub async fn user_login_post(
    state: web::Data<HttpState>,
    page: PageContext,
    session: SessionContext,
    web::Form(input): web::Form<LoginInput>,
) -> HandlerResult<HttpResponse> {
    let mut form = LoginForm::validate(&input);

    if form.validator.is_valid() {
        let credentials = LoginCredentials::new(&input.email, &input.password);
        match state.users.authenticate(&credentials).await {
            Ok(user_id) => {
                session.log_in(user_id)?;
                info!(%user_id, "user logged in");
                return Ok(see_other(AFTER_LOGIN_PATH));
            }
            Err(UserPersistenceError::InvalidCredentials) => {
                form.validator.add_non_field_error(BAD_CREDENTIALS);
            }
            Err(err) => return Err(err.into()),
        }
    }

    let data = page.data(state.clock.utc()).with_form(&form)?;
    render(&state, "login.html", StatusCode::UNPROCESSABLE_ENTITY, &data)
}

/// End the authenticated session.
pub async fn user_logout_post(session: SessionContext) -> HandlerResult<HttpResponse> {
    session.log_out();
    session.put_flash(LOGOUT_FLASH)?;
    Ok(see_other("/"))
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    fn signup(name: &str, email: &str, password: &str) -> SignupForm {
        SignupForm::validate(&SignupInput {
            name: name.to_owned(),
            email: email.to_owned(),
            password: password.to_owned(),
        })
    }

    #[rstest]
    fn accepts_a_complete_signup() {
        assert!(signup("Alice", "alice@example.com", "pa55word").validator.is_valid());
    }

    #[rstest]
    #[case("", "alice@example.com", "pa55word", "name", BLANK)]
    #[case("Alice", "", "pa55word", "email", BLANK)]
    #[case("Alice", "not-an-email", "pa55word", "email", INVALID_EMAIL)]
    #[case("Alice", "alice@example.com", "", "password", BLANK)]
    #[case(
        "Alice",
        "alice@example.com",
        "short",
        "password",
        "This field must be at least 8 characters long"
    )]
    fn signup_reports_first_failure_per_field(
        #[case] name: &str,
        #[case] email: &str,
        #[case] password: &str,
        #[case] field: &str,
        #[case] message: &str,
    ) {
        let form = signup(name, email, password);
        assert_eq!(form.validator.field_errors().len(), 1);
        assert_eq!(form.validator.field_error(field), Some(message));
    }

    #[rstest]
    fn password_is_never_rendered_back() {
        let form = signup("Alice", "alice@example.com", "short");
        let value = serde_json::to_value(&form).expect("serialise");
        assert!(value.get("password").is_none());
        assert_eq!(value["email"], "alice@example.com");
        assert!(value["field_errors"]["password"].is_string());
    }

    #[rstest]
    #[case("", "pa55word", "email", BLANK)]
    #[case("bob@", "pa55word", "email", INVALID_EMAIL)]
    #[case("bob@example.com", "", "password", BLANK)]
    fn login_requires_email_and_password(
        #[case] email: &str,
        #[case] password: &str,
        #[case] field: &str,
        #[case] message: &str,
    ) {
        let form = LoginForm::validate(&LoginInput {
            email: email.to_owned(),
            password: password.to_owned(),
        });
        assert_eq!(form.validator.field_error(field), Some(message));
    }
}
