//! Snippet pages.
//!
//! ```text
//! GET  /                    latest snippets
//! GET  /snippet/view/{id}   one live snippet
//! GET  /snippet/create      creation form
//! POST /snippet/create      create and redirect to the new snippet
//! ```

use std::str::FromStr;

use actix_web::http::StatusCode;
use actix_web::http::header::LOCATION;
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::{
    CONTENT_MAX_CHARS, Error, PERMITTED_EXPIRY_DAYS, SnippetId, TITLE_MAX_CHARS, Validator,
};
use crate::inbound::http::error::HandlerResult;
use crate::inbound::http::forms::{BLANK, max_chars_message};
use crate::inbound::http::page::{PageContext, render};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

const DEFAULT_EXPIRY_DAYS: i32 = 365;
const EXPIRES_MESSAGE: &str = "This field must equal 1, 7 or 365";
/// Flash shown after a snippet is stored.
pub const CREATED_FLASH: &str = "Snippet successfully created!";

/// Raw `POST /snippet/create` body. Missing fields read as empty.
#[derive(Debug, Deserialize)]
pub struct SnippetCreateInput {
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    expires: String,
}

/// Form state rendered back into `create.html`.
#[derive(Debug, Serialize)]
struct SnippetCreateForm {
    title: String,
    content: String,
    expires: i32,
    #[serde(flatten)]
    validator: Validator,
}

impl SnippetCreateForm {
    fn blank() -> Self {
        Self {
            title: String::new(),
            content: String::new(),
            expires: DEFAULT_EXPIRY_DAYS,
            validator: Validator::new(),
        }
    }

    /// Decode the submission; a non-numeric expiry is a malformed request.
    fn decode(input: SnippetCreateInput) -> HandlerResult<Self> {
        let expires = i32::from_str(input.expires.trim())
            .map_err(|_| Error::invalid_request("expires must be an integer"))?;
        Ok(Self {
            title: input.title,
            content: input.content,
            expires,
            validator: Validator::new(),
        })
    }

    fn validate(&mut self) {
        let v = &mut self.validator;
        v.check_field(Validator::not_blank(&self.title), "title", BLANK);
        v.check_field(
            Validator::max_chars(&self.title, TITLE_MAX_CHARS),
            "title",
            &max_chars_message(TITLE_MAX_CHARS),
        );
        v.check_field(Validator::not_blank(&self.content), "content", BLANK);
        v.check_field(
            Validator::max_chars(&self.content, CONTENT_MAX_CHARS),
            "content",
            &max_chars_message(CONTENT_MAX_CHARS),
        );
        v.check_field(
            Validator::permitted_value(&self.expires, &PERMITTED_EXPIRY_DAYS),
            "expires",
            EXPIRES_MESSAGE,
        );
    }
}

/// Home page listing the latest live snippets.
pub async fn home(state: web::Data<HttpState>, page: PageContext) -> HandlerResult<HttpResponse> {
    let snippets = state.snippets.latest().await?;
    let mut data = page.data(state.clock.utc());
    data.snippets = snippets;
    render(&state, "home.html", StatusCode::OK, &data)
}

/// Show one snippet.
///
/// Ids that are not positive integers, unknown ids and expired snippets all
/// answer 404.
pub async fn snippet_view(
    state: web::Data<HttpState>,
    page: PageContext,
    path: web::Path<String>,
) -> HandlerResult<HttpResponse> {
    let id = SnippetId::from_str(&path.into_inner())
        .map_err(|err| Error::not_found(format!("invalid snippet id: {err}")))?;
    let snippet = state.snippets.get(id).await?;

    let mut data = page.data(state.clock.utc());
    data.snippet = Some(snippet);
    render(&state, "view.html", StatusCode::OK, &data)
}

/// Empty creation form defaulting to a one year expiry.
pub async fn snippet_create(
    state: web::Data<HttpState>,
    page: PageContext,
) -> HandlerResult<HttpResponse> {
    let data = page
        .data(state.clock.utc())
        .with_form(&SnippetCreateForm::blank())?;
    render(&state, "create.html", StatusCode::OK, &data)
}

/// Validate and store a new snippet.
///
/// Invalid input re-renders the form with 422; success queues a flash and
/// redirects to the new snippet with 303.
pub async fn snippet_create_post(
    state: web::Data<HttpState>,
    page: PageContext,
    session: SessionContext,
    input: web::Form<SnippetCreateInput>,
) -> HandlerResult<HttpResponse> {
    let mut form = SnippetCreateForm::decode(input.into_inner())?;
    form.validate();
    if !form.validator.is_valid() {
        let data = page.data(state.clock.utc()).with_form(&form)?;
        return render(&state, "create.html", StatusCode::UNPROCESSABLE_ENTITY, &data);
    }

    let id = state
        .snippets
        .insert(&form.title, &form.content, form.expires)
        .await?;
    info!(snippet_id = %id, "snippet created");

    session.put_flash(CREATED_FLASH)?;
    Ok(HttpResponse::SeeOther()
        .insert_header((LOCATION, format!("/snippet/view/{id}")))
        .finish())
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    fn input(title: &str, content: &str, expires: &str) -> SnippetCreateInput {
        SnippetCreateInput {
            title: title.to_owned(),
            content: content.to_owned(),
            expires: expires.to_owned(),
        }
    }

    fn validated(title: &str, content: &str, expires: &str) -> SnippetCreateForm {
        let mut form = SnippetCreateForm::decode(input(title, content, expires)).expect("decodes");
        form.validate();
        form
    }

    #[rstest]
    fn accepts_a_complete_submission() {
        assert!(validated("Test", "Body", "7").validator.is_valid());
    }

    #[rstest]
    #[case(&"x".repeat(101), "ok", "7", "title", "This field cannot be more than 100 characters long")]
    #[case("  ", "ok", "7", "title", "This field cannot be blank")]
    #[case("ok", "", "7", "content", "This field cannot be blank")]
    #[case("ok", &"y".repeat(251), "7", "content", "This field cannot be more than 250 characters long")]
    #[case("ok", "ok", "30", "expires", "This field must equal 1, 7 or 365")]
    fn reports_each_problem_under_its_own_field(
        #[case] title: &str,
        #[case] content: &str,
        #[case] expires: &str,
        #[case] field: &str,
        #[case] message: &str,
    ) {
        let form = validated(title, content, expires);
        assert_eq!(form.validator.field_errors().len(), 1);
        assert_eq!(form.validator.field_error(field), Some(message));
    }

    #[rstest]
    #[case("")]
    #[case("seven")]
    #[case("7.5")]
    fn non_numeric_expiry_is_a_bad_request(#[case] expires: &str) {
        let err = SnippetCreateForm::decode(input("t", "c", expires)).expect_err("rejected");
        assert_eq!(err.code(), crate::domain::ErrorCode::InvalidRequest);
    }

    #[rstest]
    fn form_errors_render_alongside_values() {
        let form = validated("", "Body", "1");
        let value = serde_json::to_value(&form).expect("serialise");
        assert_eq!(value["content"], "Body");
        assert_eq!(value["expires"], 1);
        assert_eq!(value["field_errors"]["title"], "This field cannot be blank");
    }
}
