//! Tower middleware that resolves the acting principal.
//!
//! `AuthLayer` and `AuthService` wrap any inner service. On success the
//! resolved [`Principal`] is inserted into request extensions for handlers.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::response::IntoResponse;
use http::{Request, StatusCode};
use tower::{Layer, Service};

use crate::{AuthConfig, AuthError, PrincipalResolver};

/// Tower `Layer` that wraps services with principal resolution.
pub struct AuthLayer<R: PrincipalResolver> {
    resolver: Arc<R>,
    config: AuthConfig,
}

impl<R: PrincipalResolver> Clone for AuthLayer<R> {
    fn clone(&self) -> Self {
        Self {
            resolver: self.resolver.clone(),
            config: self.config.clone(),
        }
    }
}

impl<R: PrincipalResolver> AuthLayer<R> {
    /// Create a new auth layer with the given resolver and config.
    pub fn new(resolver: Arc<R>, config: AuthConfig) -> Self {
        Self { resolver, config }
    }
}

impl<R: PrincipalResolver, S> Layer<S> for AuthLayer<R> {
    type Service = AuthService<R, S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthService {
            inner,
            resolver: self.resolver.clone(),
            config: self.config.clone(),
        }
    }
}

/// Tower `Service` that resolves the principal before forwarding requests.
pub struct AuthService<R: PrincipalResolver, S> {
    inner: S,
    resolver: Arc<R>,
    config: AuthConfig,
}

impl<R: PrincipalResolver, S: Clone> Clone for AuthService<R, S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            resolver: self.resolver.clone(),
            config: self.config.clone(),
        }
    }
}

impl<R, S> Service<Request<Body>> for AuthService<R, S>
where
    R: PrincipalResolver,
    S: Service<Request<Body>, Error = Infallible> + Clone + Send + 'static,
    S::Response: IntoResponse,
    S::Future: Send,
{
    type Response = axum::response::Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        let resolver = self.resolver.clone();
        let config = self.config.clone();

        Box::pin(async move {
            let token = match extract_bearer_token(&req) {
                Some(t) => t.to_string(),
                // Dev mode acts as the anonymous user
                None if !config.enabled => config.anonymous_user.clone(),
                None => return Ok(error_response(&AuthError::MissingToken)),
            };

            match resolver.resolve(&token, &config).await {
                Ok(principal) => {
                    log::debug!("Request acting as {principal}");
                    req.extensions_mut().insert(principal);
                    let resp = inner
                        .call(req)
                        .await
                        .unwrap_or_else(|infallible| match infallible {});
                    Ok(resp.into_response())
                }
                Err(auth_err) => {
                    log::warn!("Authentication failed: {auth_err}");
                    Ok(error_response(&auth_err))
                }
            }
        })
    }
}

/// Extract bearer token from the Authorization header.
fn extract_bearer_token(req: &Request<Body>) -> Option<&str> {
    req.headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Build a 401 (client errors) or 500 response with a JSON body.
fn error_response(err: &AuthError) -> axum::response::Response {
    let (status, category) = if err.is_client_error() {
        (StatusCode::UNAUTHORIZED, "authentication")
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, "internal")
    };
    let body = serde_json::json!({
        "error": {
            "category": category,
            "message": err.to_string(),
        }
    });

    let mut response = (
        status,
        [(http::header::CONTENT_TYPE, "application/json")],
        serde_json::to_string(&body).unwrap_or_default(),
    )
        .into_response();

    if status == StatusCode::UNAUTHORIZED {
        response.headers_mut().insert(
            http::header::WWW_AUTHENTICATE,
            http::HeaderValue::from_static("Bearer"),
        );
    }

    response
}
