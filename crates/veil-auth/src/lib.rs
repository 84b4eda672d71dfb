//! Principal resolution for Veil's HTTP surface.
//!
//! Provides:
//! - [`PrincipalResolver`]: Trait turning a bearer token into a [`Principal`]
//! - [`DirectoryResolver`]: Resolver backed by the host's role directory
//! - [`AuthLayer`] / [`AuthService`]: Tower middleware parameterised over `PrincipalResolver`
//! - [`AuthConfig`]: Configuration for the auth layer
//! - [`AuthError`]: Auth-specific error types

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod middleware;
mod principal;

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use veil_core::{Principal, RoleDirectory};

pub use error::AuthError;
pub use middleware::{AuthLayer, AuthService};
pub use principal::{principal_from_parts, user_from_parts};

/// Configuration for the auth middleware.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Whether a bearer token is required. When false, requests without one
    /// act as `anonymous_user`.
    pub enabled: bool,
    /// User that tokenless requests act as when auth is disabled.
    pub anonymous_user: String,
    /// Bearer tokens and the user each one authenticates.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub tokens: BTreeMap<String, String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            anonymous_user: "Guest".to_string(),
            tokens: BTreeMap::new(),
        }
    }
}

impl AuthConfig {
    /// The user a bearer token authenticates.
    ///
    /// Configured tokens always map to their user. With auth disabled, any
    /// other token is taken as a user name.
    pub fn user_for_token<'a>(&'a self, token: &'a str) -> Option<&'a str> {
        match self.tokens.get(token) {
            Some(user) => Some(user.as_str()),
            None if !self.enabled => Some(token),
            None => None,
        }
    }

    /// Check that the configuration can authenticate anyone.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when auth is enabled with no tokens.
    pub fn validate(&self) -> veil_core::Result<()> {
        if self.enabled && self.tokens.is_empty() {
            return Err(veil_core::Error::config(
                "auth is enabled but no tokens are configured under [auth.tokens]",
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("enabled", &self.enabled)
            .field("anonymous_user", &self.anonymous_user)
            .field("tokens", &self.tokens.len())
            .finish()
    }
}

/// Boxed future returned by [`PrincipalResolver::resolve`].
pub type ResolveFuture<'a> = Pin<Box<dyn Future<Output = Result<Principal, AuthError>> + Send + 'a>>;

/// Trait for turning a token into the acting principal.
///
/// The middleware calls `resolve()` with the bearer token, or with the
/// anonymous user when auth is disabled and no token was sent.
pub trait PrincipalResolver: Send + Sync + 'static {
    /// Resolve a token into a principal.
    fn resolve<'a>(&'a self, token: &'a str, config: &'a AuthConfig) -> ResolveFuture<'a>;
}

/// Resolver that maps the bearer token to a user through
/// [`AuthConfig::tokens`] and looks the user's roles up in a [`RoleDirectory`].
///
/// With auth disabled, unmapped tokens are taken as user names. Users without
/// any role are rejected, except the configured anonymous user.
pub struct DirectoryResolver<D: ?Sized> {
    directory: Arc<D>,
}

impl<D: RoleDirectory + ?Sized> DirectoryResolver<D> {
    /// Create a resolver over `directory`.
    pub fn new(directory: Arc<D>) -> Self {
        Self { directory }
    }
}

impl<D: RoleDirectory + ?Sized + 'static> PrincipalResolver for DirectoryResolver<D> {
    fn resolve<'a>(&'a self, token: &'a str, config: &'a AuthConfig) -> ResolveFuture<'a> {
        Box::pin(async move {
            if token.is_empty() {
                return Err(AuthError::MissingToken);
            }
            let user = config.user_for_token(token).ok_or(AuthError::InvalidToken)?;
            let principal = self.directory.principal(user).await?;
            if principal.roles.is_empty() && user != config.anonymous_user {
                return Err(AuthError::UnknownUser(user.to_string()));
            }
            Ok(principal)
        })
    }
}
