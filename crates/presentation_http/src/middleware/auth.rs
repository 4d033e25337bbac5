//! API key authentication middleware
//!
//! Validates Bearer tokens in the Authorization header against configured
//! Argon2id hashes. Each key maps to a user ID and a marketplace role; the
//! middleware turns a verified key into a [`RequestContext`] stored in the
//! request extensions.
//!
//! With no keys configured, authentication is disabled and every request runs
//! as the anonymous driver [`ANONYMOUS_USER_ID`].

use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use application::{RequestContext, UserRole};
use axum::{
    extract::Request,
    http::header::AUTHORIZATION,
    response::{IntoResponse, Response},
};
use domain::UserId;
use infrastructure::{ApiKeyHasher, config::ApiKeyEntry};
use tower::{Layer, Service};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::RequestId;

/// Identity used for every request while authentication is disabled
pub const ANONYMOUS_USER_ID: UserId = UserId::from_uuid(Uuid::nil());

/// Paths reachable without credentials
const PUBLIC_PATHS: [&str; 5] = ["/health", "/ready", "/swagger-ui", "/api-docs", "/redoc"];

/// Verified API key entry with parsed user ID
#[derive(Clone, Debug)]
struct VerifiedKeyEntry {
    /// Argon2 hash of the API key
    hash: String,
    /// Parsed user ID
    user_id: UserId,
    role: UserRole,
}

/// Storage for API key entries with hash verification
#[derive(Clone, Debug, Default)]
pub struct ApiKeyStore {
    entries: Vec<VerifiedKeyEntry>,
    hasher: ApiKeyHasher,
}

impl ApiKeyStore {
    /// Create from a list of API key entries
    ///
    /// Entries whose user ID is not a UUID are logged and skipped.
    #[must_use]
    pub fn from_entries(entries: Vec<ApiKeyEntry>) -> Self {
        let entries = entries
            .into_iter()
            .filter_map(|entry| match UserId::parse(&entry.user_id) {
                Ok(user_id) => Some(VerifiedKeyEntry {
                    hash: entry.hash,
                    user_id,
                    role: entry.role,
                }),
                Err(e) => {
                    warn!(
                        user_id = %entry.user_id,
                        error = %e,
                        "Invalid user ID format in api_keys configuration, skipping entry"
                    );
                    None
                },
            })
            .collect();

        Self {
            entries,
            hasher: ApiKeyHasher::new(),
        }
    }

    /// Check if the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Verify an API key and return the caller it identifies
    #[must_use]
    pub fn verify(&self, api_key: &str) -> Option<(UserId, UserRole)> {
        for entry in &self.entries {
            match self.hasher.verify(api_key, &entry.hash) {
                Ok(true) => {
                    debug!(user_id = %entry.user_id, role = %entry.role, "API key verified");
                    return Some((entry.user_id, entry.role));
                },
                Ok(false) => {},
                Err(e) => {
                    warn!(error = %e, "Error verifying API key hash");
                },
            }
        }
        None
    }
}

/// Layer that applies API key authentication
#[derive(Clone, Debug)]
pub struct ApiKeyAuthLayer {
    api_key_store: Arc<ApiKeyStore>,
}

impl ApiKeyAuthLayer {
    /// Authentication disabled: every request runs as the anonymous driver
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            api_key_store: Arc::new(ApiKeyStore::default()),
        }
    }

    /// Create a new API key auth layer from API key entries
    #[must_use]
    pub fn from_api_keys(entries: Vec<ApiKeyEntry>) -> Self {
        Self {
            api_key_store: Arc::new(ApiKeyStore::from_entries(entries)),
        }
    }
}

impl<S> Layer<S> for ApiKeyAuthLayer {
    type Service = ApiKeyAuth<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ApiKeyAuth {
            inner,
            api_key_store: Arc::clone(&self.api_key_store),
        }
    }
}

/// Middleware service for API key authentication
#[derive(Clone, Debug)]
pub struct ApiKeyAuth<S> {
    inner: S,
    api_key_store: Arc<ApiKeyStore>,
}

impl<S> Service<Request> for ApiKeyAuth<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let api_key_store = Arc::clone(&self.api_key_store);
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let path = req.uri().path();
            if PUBLIC_PATHS.iter().any(|p| path.starts_with(p)) {
                return inner.call(req).await;
            }

            if api_key_store.is_empty() {
                inject_request_context(&mut req, ANONYMOUS_USER_ID, UserRole::Driver);
                return inner.call(req).await;
            }

            let token = req
                .headers()
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .map(|header| header.strip_prefix("Bearer ").ok_or(()));

            match token {
                Some(Ok(token)) => {
                    if let Some((user_id, role)) = api_key_store.verify(token) {
                        inject_request_context(&mut req, user_id, role);
                        return inner.call(req).await;
                    }
                    Ok(unauthorized_response("Invalid API key"))
                },
                Some(Err(())) => Ok(unauthorized_response(
                    "Invalid authorization format, expected Bearer token",
                )),
                None => Ok(unauthorized_response("Missing Authorization header")),
            }
        })
    }
}

/// Store the caller's `RequestContext`, reusing the request ID from `RequestIdLayer`
fn inject_request_context(req: &mut Request, user_id: UserId, role: UserRole) {
    let request_id = req
        .extensions()
        .get::<RequestId>()
        .map_or_else(Uuid::now_v7, RequestId::as_uuid);

    let ctx = RequestContext::with_request_id(user_id, role, request_id);
    req.extensions_mut().insert(ctx);
}

fn unauthorized_response(message: &str) -> Response {
    ApiError::Unauthorized(message.to_string()).into_response()
}
