//! services/api/src/web/guard.rs
//!
//! Route-level authorization. Wraps a route with an explicit, ordered guard
//! list that is evaluated after the session middleware has attached the
//! caller's identity.
//!
//! ```ignore
//! Router::new()
//!     .route("/admin/users", get(list_users_handler))
//!     .route_layer(RequireGuardsLayer::new(state.clone(), ADMIN_ONLY))
//! ```

use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    extract::{FromRequestParts, RawPathParams, Request},
    response::{IntoResponse, Response},
};
use futures::future::BoxFuture;
use tower::{Layer, Service};
use tracing::debug;
use tutoring_core::{authorize, Guard, VerifiedIdentity};

use crate::error::ApiError;
use crate::web::state::AppState;

/// Layer that requires every guard in `guards` to pass.
#[derive(Clone)]
pub struct RequireGuardsLayer {
    state: Arc<AppState>,
    guards: &'static [Guard],
}

impl RequireGuardsLayer {
    pub fn new(state: Arc<AppState>, guards: &'static [Guard]) -> Self {
        Self { state, guards }
    }
}

impl<S> Layer<S> for RequireGuardsLayer {
    type Service = RequireGuardsService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequireGuardsService {
            inner,
            state: self.state.clone(),
            guards: self.guards,
        }
    }
}

/// Service that evaluates the guards before forwarding the request.
#[derive(Clone)]
pub struct RequireGuardsService<S> {
    inner: S,
    state: Arc<AppState>,
    guards: &'static [Guard],
}

impl<S> Service<Request> for RequireGuardsService<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let state = self.state.clone();
        let guards = self.guards;
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let (mut parts, body) = req.into_parts();

            // Set by the session middleware; absence means it was not applied.
            let Some(identity) = parts.extensions.get::<VerifiedIdentity>().cloned() else {
                return Ok(ApiError::Unauthorized.into_response());
            };

            let params: Vec<(String, String)> = RawPathParams::from_request_parts(&mut parts, &())
                .await
                .map(|raw| {
                    raw.iter()
                        .map(|(key, value)| (key.to_string(), value.to_string()))
                        .collect()
                })
                .unwrap_or_default();

            if let Err(e) = authorize(state.db.as_ref(), &identity, guards, &params).await {
                debug!("Request by {} denied: {}", identity.email, e);
                return Ok(ApiError::from(e).into_response());
            }

            inner.call(Request::from_parts(parts, body)).await
        })
    }
}
