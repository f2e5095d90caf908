//! Mailing list sign-up and community access.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use serde_json::{Value, json};

use sparktizen_integration_tests::TestContext;

#[tokio::test]
async fn test_subscribe_then_resend_same_code() {
    let ctx = TestContext::start().await;
    let visitor = ctx.visitor();

    let resp = visitor
        .post(ctx.url("/api/mailing-list"))
        .json(&json!({ "email": "Fan@Example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Check your email for your access code.");

    let body: Value = visitor
        .post(ctx.url("/api/mailing-list"))
        .json(&json!({ "email": "fan@example.com" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        body["message"],
        "Already on the list. Code resent to your inbox."
    );

    let sent = ctx.mailer.sent().await;
    assert_eq!(sent.len(), 2);
    let (first_to, first_code) = sent.first().unwrap();
    let (second_to, second_code) = sent.last().unwrap();
    assert_eq!(first_to, "fan@example.com");
    assert_eq!(first_to, second_to);
    assert_eq!(first_code, second_code);
}

#[tokio::test]
async fn test_subscribe_rejects_invalid_email() {
    let ctx = TestContext::start().await;

    let resp = ctx
        .visitor()
        .post(ctx.url("/api/mailing-list"))
        .json(&json!({ "email": "not-an-email" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Please enter a valid email address.");
    assert!(ctx.mailer.sent().await.is_empty());
}

#[tokio::test]
async fn test_community_login() {
    let ctx = TestContext::start().await;
    let visitor = ctx.visitor();

    visitor
        .post(ctx.url("/api/mailing-list"))
        .json(&json!({ "email": "member@example.com" }))
        .send()
        .await
        .unwrap();
    let (_, code) = ctx.mailer.sent().await.pop().unwrap();

    let resp = visitor
        .post(ctx.url("/api/community/login"))
        .json(&json!({ "email": "member@example.com", "code": "WRONG000" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body["error"],
        "Invalid credentials. Check your email and code."
    );

    let session: Value = visitor
        .get(ctx.url("/api/session"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(session["community_member"], false);

    let resp = visitor
        .post(ctx.url("/api/community/login"))
        .json(&json!({ "email": "MEMBER@example.com", "code": code }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let session: Value = visitor
        .get(ctx.url("/api/session"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(session["community_member"], true);
    assert!(session["admin"].is_null());

    // Access belongs to the session, not the subscriber.
    let other: Value = ctx
        .visitor()
        .get(ctx.url("/api/session"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(other["community_member"], false);
}

#[tokio::test]
async fn test_community_login_unknown_email() {
    let ctx = TestContext::start().await;

    let resp = ctx
        .visitor()
        .post(ctx.url("/api/community/login"))
        .json(&json!({ "email": "nobody@example.com", "code": "ABCD1234" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
