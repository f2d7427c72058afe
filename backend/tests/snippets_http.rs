//! End-to-end behaviour of the public and snippet pages.
//!
//! The full application is built over in-memory stores so these tests cover
//! routing, every middleware chain, the templates and the handlers together.

#[allow(dead_code, reason = "helpers are shared between integration test crates")]
mod support;

use actix_web::http::StatusCode;
use actix_web::http::header;
use actix_web::test;
use chrono::TimeDelta;
use rstest::{fixture, rstest};
use snippetbox::server::build_app;
use support::{Browser, Stores};

#[fixture]
fn stores() -> Stores {
    Stores::new()
}

#[rstest]
#[actix_web::test]
async fn ping_answers_ok_with_security_headers(stores: Stores) {
    let app = test::init_service(build_app(stores.deps())).await;
    let page = Browser::default().get(&app, "/ping").await;

    assert_eq!(page.status, StatusCode::OK);
    assert_eq!(page.body, "OK");
    for (name, value) in [
        (header::X_FRAME_OPTIONS, "deny"),
        (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
        (header::REFERRER_POLICY, "origin-when-cross-origin"),
        (header::X_XSS_PROTECTION, "0"),
    ] {
        assert_eq!(
            page.headers.get(&name).and_then(|v| v.to_str().ok()),
            Some(value),
            "{name}"
        );
    }
    assert!(page.headers.contains_key(header::CONTENT_SECURITY_POLICY));
    assert!(page.headers.contains_key("trace-id"));
}

#[rstest]
#[actix_web::test]
async fn static_assets_are_served(stores: Stores) {
    let app = test::init_service(build_app(stores.deps())).await;
    let page = Browser::default().get(&app, "/static/css/main.css").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("font-family"));

    let missing = Browser::default().get(&app, "/static/css/").await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[rstest]
#[actix_web::test]
async fn home_lists_latest_snippets(stores: Stores) {
    let app = test::init_service(build_app(stores.deps())).await;
    let mut browser = Browser::default();

    let empty = browser.get(&app, "/").await;
    assert_eq!(empty.status, StatusCode::OK);
    assert!(empty.body.contains("There's nothing to see here"));

    let now = mockable::Clock::utc(stores.clock.as_ref());
    stores
        .snippets
        .seed("An old silent pond", "A frog jumps in", now, now + TimeDelta::days(7));
    let listed = browser.get(&app, "/").await;
    assert!(listed.body.contains("An old silent pond"));
    assert!(listed.body.contains("14 Mar 2026 at 09:30"));
}

#[rstest]
#[case("/snippet/view/0")]
#[case("/snippet/view/-1")]
#[case("/snippet/view/abc")]
#[case("/snippet/view/1.5")]
#[case("/snippet/view/99")]
#[case("/no/such/page")]
#[actix_web::test]
async fn unknown_snippets_and_paths_are_not_found(stores: Stores, #[case] uri: &str) {
    let app = test::init_service(build_app(stores.deps())).await;
    let page = Browser::default().get(&app, uri).await;
    assert_eq!(page.status, StatusCode::NOT_FOUND);
}

#[rstest]
#[actix_web::test]
async fn expired_snippets_disappear(stores: Stores) {
    let app = test::init_service(build_app(stores.deps())).await;
    let now = mockable::Clock::utc(stores.clock.as_ref());
    let id = stores
        .snippets
        .seed("Ephemeral", "gone soon", now, now + TimeDelta::days(1));
    let uri = format!("/snippet/view/{id}");
    let mut browser = Browser::default();

    assert_eq!(browser.get(&app, &uri).await.status, StatusCode::OK);

    stores.clock.advance(TimeDelta::days(1));
    assert_eq!(browser.get(&app, &uri).await.status, StatusCode::NOT_FOUND);
    assert!(!browser.get(&app, "/").await.body.contains("Ephemeral"));
}

#[rstest]
#[actix_web::test]
async fn wrong_method_on_public_route_is_not_allowed(stores: Stores) {
    let app = test::init_service(build_app(stores.deps())).await;
    let res = test::call_service(
        &app,
        test::TestRequest::delete().uri("/ping").to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[rstest]
#[actix_web::test]
async fn anonymous_create_redirects_to_login(stores: Stores) {
    let app = test::init_service(build_app(stores.deps())).await;
    let page = Browser::default().get(&app, "/snippet/create").await;
    assert_eq!(page.status, StatusCode::SEE_OTHER);
    assert_eq!(page.location(), Some("/user/login"));
}

#[rstest]
#[actix_web::test]
async fn post_without_csrf_token_is_rejected(stores: Stores) {
    let app = test::init_service(build_app(stores.deps())).await;
    let mut browser = Browser::default();
    browser.sign_up_and_log_in(&app, "alice@example.com", "pa55word").await;

    let page = browser
        .post(
            &app,
            "/snippet/create",
            &[("title", "Test"), ("content", "Body"), ("expires", "7")],
        )
        .await;
    assert_eq!(page.status, StatusCode::BAD_REQUEST);
    assert!(stores.snippets.is_empty());
}

#[rstest]
#[actix_web::test]
async fn created_snippet_is_shown_with_flash(stores: Stores) {
    let app = test::init_service(build_app(stores.deps())).await;
    let mut browser = Browser::default();
    browser.sign_up_and_log_in(&app, "alice@example.com", "pa55word").await;

    let form = browser.get(&app, "/snippet/create").await;
    assert_eq!(form.status, StatusCode::OK);
    assert_eq!(
        form.headers.get(header::CACHE_CONTROL).and_then(|v| v.to_str().ok()),
        Some("no-store")
    );
    assert!(form.body.contains(r#"value="365" checked"#));

    let created = browser
        .submit(
            &app,
            "/snippet/create",
            "/snippet/create",
            &[("title", "Test"), ("content", "Body"), ("expires", "7")],
        )
        .await;
    assert_eq!(created.status, StatusCode::SEE_OTHER);
    let location = created.location().expect("redirect target").to_owned();
    assert!(location.starts_with("/snippet/view/"), "{location}");

    let view = browser.get(&app, &location).await;
    assert_eq!(view.status, StatusCode::OK);
    assert!(view.body.contains("Test"));
    assert!(view.body.contains("Snippet successfully created!"));

    let again = browser.get(&app, &location).await;
    assert!(!again.body.contains("Snippet successfully created!"));
}

#[rstest]
#[actix_web::test]
async fn overlong_title_is_reported_on_title_only(stores: Stores) {
    let app = test::init_service(build_app(stores.deps())).await;
    let mut browser = Browser::default();
    browser.sign_up_and_log_in(&app, "alice@example.com", "pa55word").await;

    let title = "x".repeat(101);
    let page = browser
        .submit(
            &app,
            "/snippet/create",
            "/snippet/create",
            &[("title", title.as_str()), ("content", "ok"), ("expires", "7")],
        )
        .await;
    assert_eq!(page.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(page.body.matches(r#"class="error""#).count(), 1);
    assert!(page.body.contains("This field cannot be more than 100 characters long"));
    assert!(page.body.contains(title.as_str()));
    assert!(stores.snippets.is_empty());
}

#[rstest]
#[actix_web::test]
async fn non_numeric_expiry_is_a_bad_request(stores: Stores) {
    let app = test::init_service(build_app(stores.deps())).await;
    let mut browser = Browser::default();
    browser.sign_up_and_log_in(&app, "alice@example.com", "pa55word").await;

    let page = browser
        .submit(
            &app,
            "/snippet/create",
            "/snippet/create",
            &[("title", "t"), ("content", "c"), ("expires", "forever")],
        )
        .await;
    assert_eq!(page.status, StatusCode::BAD_REQUEST);
    assert_eq!(page.body, "Bad Request");
}
