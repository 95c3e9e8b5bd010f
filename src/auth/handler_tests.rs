use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::json;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::app::build_app;
use crate::auth::claims::Claims;
use crate::config::Environment;
use crate::state::AppState;
use crate::testing::{
    body_json, json_request, register_token, send, session_pair, set_cookie, test_config,
    with_bearer, with_cookie, FakeStorage, TEST_SECRET,
};

fn app() -> Router {
    build_app(AppState::fake())
}

fn me() -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri("/auth/me")
        .body(Body::empty())
        .unwrap()
}

fn creds(username: &str, password: &str) -> serde_json::Value {
    json!({ "username": username, "password": password })
}

#[tokio::test]
async fn register_returns_public_identity_and_cookie() {
    let app = app();
    let res = send(&app, json_request("POST", "/auth/register", creds("alice", "secret1"))).await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let cookie = set_cookie(&res).expect("cookie set");
    assert!(cookie.starts_with("token="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Max-Age=3600"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(!cookie.contains("Secure"));

    let body = body_json(res).await;
    let keys: HashSet<_> = body.as_object().unwrap().keys().cloned().collect();
    assert_eq!(keys, HashSet::from(["id".to_string(), "username".to_string()]));
    assert_eq!(body["username"], "alice");
}

#[tokio::test]
async fn register_reports_every_invalid_field() {
    let app = app();
    let res = send(&app, json_request("POST", "/auth/register", creds("al", "12345"))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(set_cookie(&res).is_none());
    let body = body_json(res).await;
    let fields: Vec<_> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(fields, ["username", "password"]);
}

#[tokio::test]
async fn register_missing_body_fields_is_validation_error() {
    let app = app();
    let res = send(&app, json_request("POST", "/auth/register", json!({}))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(res).await["errors"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let app = app();
    let req = Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    assert_eq!(send(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let res = send(&app, json_request("POST", "/auth/login", json!({ "username": 5, "password": "x" }))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_username_conflicts() {
    let app = app();
    register_token(&app, "alice", "secret1").await;
    let res = send(&app, json_request("POST", "/auth/register", creds("alice", "another1"))).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(res).await["message"], "Username already taken");

    // trimming makes these the same username
    let res = send(&app, json_request("POST", "/auth/register", creds("  alice ", "another1"))).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    // but usernames are case-sensitive
    let res = send(&app, json_request("POST", "/auth/register", creds("Alice", "another1"))).await;
    assert_eq!(res.status(), StatusCode::CREATED);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_duplicate_registrations_admit_exactly_one() {
    let app = app();
    let mut tasks = Vec::new();
    for _ in 0..8 {
        let app = app.clone();
        tasks.push(tokio::spawn(async move {
            send(&app, json_request("POST", "/auth/register", creds("racer", "secret1")))
                .await
                .status()
        }));
    }
    let mut created = 0;
    let mut conflicts = 0;
    for t in tasks {
        match t.await.unwrap() {
            StatusCode::CREATED => created += 1,
            StatusCode::CONFLICT => conflicts += 1,
            other => panic!("unexpected status {other}"),
        }
    }
    assert_eq!((created, conflicts), (1, 7));
}

#[tokio::test]
async fn register_then_login_returns_same_id() {
    let app = app();
    let res = send(&app, json_request("POST", "/auth/register", creds("bob", "hunter22"))).await;
    let registered = body_json(res).await;

    let res = send(&app, json_request("POST", "/auth/login", creds("bob", "hunter22"))).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(session_pair(&res).is_some());
    let logged_in = body_json(res).await;
    assert_eq!(registered["id"], logged_in["id"]);
    assert_eq!(logged_in["username"], "bob");
}

#[tokio::test]
async fn bad_password_and_unknown_user_look_identical() {
    let app = app();
    register_token(&app, "alice", "secret1").await;

    let wrong_pw = send(&app, json_request("POST", "/auth/login", creds("alice", "wrong"))).await;
    let unknown = send(&app, json_request("POST", "/auth/login", creds("nobody", "secret1"))).await;

    assert_eq!(wrong_pw.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookie(&wrong_pw).is_none());
    assert!(set_cookie(&unknown).is_none());
    let (a, b) = (body_json(wrong_pw).await, body_json(unknown).await);
    assert_eq!(a, b);
    assert_eq!(a["message"], "Invalid credentials");
}

#[tokio::test]
async fn login_requires_username_and_password() {
    let app = app();
    let res = send(&app, json_request("POST", "/auth/login", json!({ "username": "alice" }))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(res).await["errors"][0]["field"], "password");
}

#[tokio::test]
async fn me_accepts_bearer_header() {
    let app = app();
    let token = register_token(&app, "carol", "secret1").await;
    let res = send(&app, with_bearer(me(), &token)).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["username"], "carol");
}

#[tokio::test]
async fn me_rejects_missing_garbage_and_foreign_tokens() {
    let app = app();
    assert_eq!(send(&app, me()).await.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        send(&app, with_bearer(me(), "invalid.token.here")).await.status(),
        StatusCode::UNAUTHORIZED
    );

    let claims = Claims {
        sub: Uuid::new_v4(),
        username: "eve".into(),
        iat: OffsetDateTime::now_utc().unix_timestamp() as usize,
        exp: OffsetDateTime::now_utc().unix_timestamp() as usize + 600,
    };
    let forged = encode(&Header::default(), &claims, &EncodingKey::from_secret(b"wrong-secret")).unwrap();
    assert_eq!(
        send(&app, with_bearer(me(), &forged)).await.status(),
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn me_rejects_expired_token() {
    let app = app();
    let now = OffsetDateTime::now_utc().unix_timestamp() as usize;
    let claims = Claims {
        sub: Uuid::new_v4(),
        username: "old".into(),
        iat: now - 7200,
        exp: now - 3600,
    };
    let expired = encode(&Header::default(), &claims, &EncodingKey::from_secret(TEST_SECRET.as_bytes())).unwrap();
    let res = send(&app, with_cookie(me(), &format!("token={expired}"))).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(res).await["message"], "Invalid token");
}

#[tokio::test]
async fn alice_session_scenario() {
    let app = app();

    let res = send(&app, json_request("POST", "/auth/register", creds("alice", "secret1"))).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    assert!(session_pair(&res).is_some());

    let res = send(&app, json_request("POST", "/auth/login", creds("alice", "secret1"))).await;
    assert_eq!(res.status(), StatusCode::OK);
    let cookie = session_pair(&res).expect("login cookie");
    let body = body_json(res).await;
    assert_eq!(body["username"], "alice");
    assert!(body["id"].is_string());

    let res = send(&app, json_request("POST", "/auth/login", creds("alice", "wrong"))).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = send(&app, with_cookie(me(), &cookie)).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await, body);

    let logout = Request::builder()
        .method("POST")
        .uri("/auth/logout")
        .body(Body::empty())
        .unwrap();
    let res = send(&app, with_cookie(logout, &cookie)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let cleared = set_cookie(&res).expect("clearing cookie");
    assert!(cleared.starts_with("token=;"));
    assert!(cleared.contains("Max-Age=0"));
    assert_eq!(body_json(res).await["message"], "Logged out");

    // the browser dropped the cookie; nothing else to present
    assert_eq!(send(&app, me()).await.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_is_idempotent_and_leaves_bearer_copies_valid() {
    let app = app();
    let token = register_token(&app, "dave", "secret1").await;

    for _ in 0..2 {
        let req = Request::builder()
            .method("POST")
            .uri("/auth/logout")
            .body(Body::empty())
            .unwrap();
        let res = send(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert!(set_cookie(&res).unwrap().contains("Max-Age=0"));
    }

    // no server-side revocation: the token stays usable until it expires
    let res = send(&app, with_bearer(me(), &token)).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn production_cookies_are_secure_cross_site() {
    let state = AppState::fake_with(
        test_config(Environment::Production),
        Arc::new(FakeStorage::default()),
    );
    let app = build_app(state);
    let res = send(&app, json_request("POST", "/auth/register", creds("erin", "secret1"))).await;
    let cookie = set_cookie(&res).unwrap();
    assert!(cookie.contains("Secure"));
    assert!(cookie.contains("SameSite=None"));
    assert!(cookie.contains("HttpOnly"));
}

#[tokio::test]
async fn cookie_max_age_follows_configured_lifetime() {
    let mut config = test_config(Environment::Development);
    config.jwt.ttl = Duration::from_secs(900);
    let app = build_app(AppState::fake_with(config, Arc::new(FakeStorage::default())));
    let res = send(&app, json_request("POST", "/auth/register", creds("frank", "secret1"))).await;
    assert!(set_cookie(&res).unwrap().contains("Max-Age=900"));
}
