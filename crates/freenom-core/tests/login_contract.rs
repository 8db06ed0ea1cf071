//! Contract Test: Login and Session State
//!
//! Constraints verified:
//! - Login starts from an empty cookie jar and posts the page's anti-forgery token
//! - Any login failure leaves the session UNAUTHENTICATED with a fresh jar
//! - Operations needing a session fail with "Not logged in" before any request

mod common;

use common::*;
use freenom_core::error::Error;
use freenom_core::traits::Extractor;
use freenom_core::RegexExtractor;
use freenom_core::types::{DomainRecord, RecordType};
use freenom_core::SessionState;

#[test]
fn fixtures_carry_token_and_greeting() {
    let extractor = RegexExtractor::new();

    assert_eq!(extractor.login_token(&login_page(TOKEN)).as_deref(), Some(TOKEN));
    assert!(extractor.is_logged_in(&home_page()));
    assert!(!extractor.is_logged_in(&login_page(TOKEN)));
}

#[tokio::test]
async fn login_posts_token_and_credentials() {
    let transport = ScriptedTransport::new();
    let engine = logged_in_engine(&transport).await;

    assert!(engine.is_authenticated());
    assert_eq!(engine.state(), SessionState::Authenticated);

    let submit = transport.last(Step::LoginSubmit);
    assert_eq!(submit.url, format!("{BASE_URL}dologin.php"));
    assert_eq!(submit.form_value("token"), Some(TOKEN));
    assert_eq!(submit.form_value("username"), Some("jane@example.com"));
    assert_eq!(submit.form_value("password"), Some("hunter2"));
    assert_eq!(
        submit.header_value("referer"),
        Some(format!("{BASE_URL}clientarea.php").as_str())
    );

    // Jar reset before the login page is fetched
    assert_eq!(transport.reset_count(), 1);
    assert_eq!(transport.count(Step::LoginPage), 1);
}

#[tokio::test]
async fn missing_token_fails_without_submitting() {
    let transport = ScriptedTransport::new();
    transport.page(Step::LoginPage, "<html><body>Maintenance</body></html>");

    let mut engine = engine(&transport);
    let err = engine.login("jane@example.com", "hunter2").await.unwrap_err();

    assert!(matches!(err, Error::Parse(_)), "unexpected error: {err}");
    assert_eq!(transport.count(Step::LoginSubmit), 0);
    assert!(!engine.is_authenticated());
}

#[tokio::test]
async fn missing_greeting_fails_and_resets_jar() {
    let transport = ScriptedTransport::new();
    transport
        .page(Step::LoginPage, login_page(TOKEN))
        .page(Step::LoginSubmit, login_page("second-token"));

    let mut engine = engine(&transport);
    let err = engine.login("jane@example.com", "wrong").await.unwrap_err();

    assert!(matches!(err, Error::Authentication(_)), "unexpected error: {err}");
    assert_eq!(engine.state(), SessionState::Unauthenticated);
    // Once before the attempt, once after the failure
    assert_eq!(transport.reset_count(), 2);
}

#[tokio::test]
async fn failed_relogin_drops_previous_session() {
    let transport = ScriptedTransport::new();
    let mut engine = logged_in_engine(&transport).await;
    assert!(engine.is_authenticated());

    transport.script(Step::LoginPage, vec![Reply::fail("connection refused")]);
    let err = engine.login("jane@example.com", "hunter2").await.unwrap_err();

    assert!(matches!(err, Error::Transport { .. }), "unexpected error: {err}");
    assert!(!engine.is_authenticated());

    let err = engine.list_domains().await.unwrap_err();
    assert!(matches!(err, Error::NotLoggedIn));
    assert_eq!(transport.count(Step::DomainList), 0);
}

#[tokio::test]
async fn operations_require_login_and_make_no_requests() {
    let transport = ScriptedTransport::new();
    let mut engine = engine(&transport);
    let record = DomainRecord::new(RecordType::A, "www", 3600, "1.2.3.4");

    assert!(matches!(engine.list_domains().await, Err(Error::NotLoggedIn)));
    assert!(matches!(
        engine.get_domain_info("example.tk").await,
        Err(Error::NotLoggedIn)
    ));
    assert!(matches!(
        engine.add_record("example.tk", &[record.clone()]).await,
        Err(Error::NotLoggedIn)
    ));
    assert!(matches!(
        engine.modify_record("example.tk", &record, &record).await,
        Err(Error::NotLoggedIn)
    ));
    assert!(matches!(
        engine.delete_record("example.tk", &record).await,
        Err(Error::NotLoggedIn)
    ));
    assert!(matches!(
        engine.delete_record_by_index("example.tk", 0).await,
        Err(Error::NotLoggedIn)
    ));
    assert!(matches!(
        engine.renew_free_domains(None, 12).await,
        Err(Error::NotLoggedIn)
    ));

    assert!(transport.requests().is_empty());
    assert_eq!(transport.reset_count(), 0);
}

#[tokio::test]
async fn not_logged_in_message() {
    let transport = ScriptedTransport::new();
    let mut engine = engine(&transport);

    let err = engine.list_domains().await.unwrap_err();
    assert_eq!(err.to_string(), "Not logged in");
}
