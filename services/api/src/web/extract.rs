//! services/api/src/web/extract.rs
//!
//! Request extractors whose rejections render as `ApiError` bodies.

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};

use crate::error::ApiError;

/// `Json<T>` with a `{error, message}` rejection instead of axum's plain-text one.
/// Missing fields, wrong types and malformed bodies all surface as 400.
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, StatusCode},
    };
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Payload {
        email: String,
    }

    fn post(body: &str) -> Request {
        axum::http::Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_accepts_well_formed_body() {
        let body = r#"{"email":"a@x.com"}"#;
        let ValidJson(payload) = ValidJson::<Payload>::from_request(post(body), &())
            .await
            .ok()
            .unwrap();
        assert_eq!(payload.email, "a@x.com");
    }

    #[tokio::test]
    async fn test_missing_field_is_bad_request() {
        let err = ValidJson::<Payload>::from_request(post("{}"), &())
            .await
            .err()
            .unwrap();
        assert_eq!(err.status(), (StatusCode::BAD_REQUEST, "BAD_REQUEST"));
        assert!(err.to_string().contains("email"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let err = ValidJson::<Payload>::from_request(post("{not json"), &())
            .await
            .err()
            .unwrap();
        assert_eq!(err.status().0, StatusCode::BAD_REQUEST);
    }
}
