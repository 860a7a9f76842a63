//! Integration tests for user sync, login/logout and the session middleware
//!
//! Tests: credential extraction, cookie precedence, idempotent sync

mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use serde_json::json;
use tower::ServiceExt;

use common::*;

#[tokio::test]
async fn test_health_is_public() {
    let app = test_app();

    let response = app.router.oneshot(request(Method::GET, "/", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_protected_endpoints_require_auth() {
    let app = test_app();

    let endpoints = [
        (Method::GET, "/users/me/role"),
        (Method::GET, "/admin/users"),
        (Method::GET, "/users/role/alice@x.com"),
        (Method::GET, "/payments/user/alice@x.com"),
        (Method::POST, "/notes"),
        (Method::GET, "/materials"),
    ];

    for (method, uri) in endpoints {
        let response = app
            .router
            .clone()
            .oneshot(request(method.clone(), uri, None))
            .await
            .unwrap();
        assert_eq!(
            response.status(),
            StatusCode::UNAUTHORIZED,
            "Expected 401 for {} {} without auth",
            method,
            uri
        );
        let body = body_json(response).await;
        assert_eq!(body["error"], "UNAUTHORIZED");
    }
}

#[tokio::test]
async fn test_invalid_token_is_unauthorized() {
    let app = test_app();

    let response = app
        .router
        .oneshot(request(Method::GET, "/users/me/role", Some("not-a-jwt")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_my_role_defaults_to_student() {
    let app = test_app();
    let token = token_for("nobody@x.com");

    let response = app
        .router
        .oneshot(request(Method::GET, "/users/me/role", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["email"], "nobody@x.com");
    assert_eq!(body["role"], "student");
}

#[tokio::test]
async fn test_cookie_wins_over_bearer_header() {
    let app = test_app();
    seed_admin(&app.store, "admin@x.com").await;
    seed_user(&app.store, "bob@x.com").await;

    // Admin cookie, student header: the cookie decides
    let request = Request::builder()
        .method(Method::GET)
        .uri("/admin/users")
        .header(header::COOKIE, format!("token={}", token_for("admin@x.com")))
        .header(
            header::AUTHORIZATION,
            format!("Bearer {}", token_for("bob@x.com")),
        )
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // And the other way round
    let request = Request::builder()
        .method(Method::GET)
        .uri("/admin/users")
        .header(header::COOKIE, format!("token={}", token_for("bob@x.com")))
        .header(
            header::AUTHORIZATION,
            format!("Bearer {}", token_for("admin@x.com")),
        )
        .body(Body::empty())
        .unwrap();
    let response = app.router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_login_sets_session_cookie() {
    let app = test_app();
    seed_tutor(&app.store, "tina@x.com").await;
    let token = token_for("tina@x.com");

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/login",
            None,
            json!({ "token": token }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert!(cookie.starts_with(&format!("token={}", token)));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains(&format!("Max-Age={}", 7 * 24 * 3600)));

    let body = body_json(response).await;
    assert_eq!(body["role"], "tutor");

    // The cookie alone authenticates later requests
    let request = Request::builder()
        .method(Method::GET)
        .uri("/users/me/role")
        .header(header::COOKIE, cookie.split(';').next().unwrap())
        .body(Body::empty())
        .unwrap();
    let response = app.router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_rejects_bad_credential() {
    let app = test_app();

    let response = app
        .router
        .clone()
        .oneshot(json_request(Method::POST, "/login", None, json!({ "token": "garbage" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .router
        .oneshot(json_request(Method::POST, "/login", None, json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let app = test_app();

    let response = app
        .router
        .oneshot(request(Method::POST, "/logout", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(cookie.starts_with("token=;"));
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_user_sync_is_idempotent() {
    let app = test_app();
    let payload = json!({
        "email": "Carol@X.com",
        "name": "Carol",
        "photoURL": "https://img/carol.png"
    });

    let response = app
        .router
        .clone()
        .oneshot(json_request(Method::POST, "/users", None, payload.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let first = body_json(response).await;
    assert_eq!(first["success"], true);
    assert_eq!(first["message"], "New user inserted");
    assert_eq!(first["user"]["email"], "carol@x.com");
    assert_eq!(first["user"]["role"], "student");

    let response = app
        .router
        .oneshot(json_request(Method::POST, "/users", None, payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let second = body_json(response).await;
    assert_eq!(second["success"], false);
    assert_eq!(second["message"], "User already existed");
    assert_eq!(second["user"]["id"], first["user"]["id"]);

    use tutoring_core::ports::DatabaseService;
    assert_eq!(app.store.count_users(None).await.unwrap(), 1);
}

#[tokio::test]
async fn test_user_sync_validates_email() {
    let app = test_app();

    let response = app
        .router
        .oneshot(json_request(
            Method::POST,
            "/users",
            None,
            json!({ "email": "not-an-email" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_sync_body_is_json_bad_request() {
    let app = test_app();

    let response = app
        .router
        .clone()
        .oneshot(json_request(Method::POST, "/users", None, json!({ "name": "No Email" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "BAD_REQUEST");
    assert!(body["message"].as_str().unwrap().contains("email"));

    let request = Request::builder()
        .method(Method::POST)
        .uri("/users")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"email\": "))
        .unwrap();
    let response = app.router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "BAD_REQUEST");
}
