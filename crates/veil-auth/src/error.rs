//! Auth-specific error types.

/// Errors that can occur while resolving the acting principal.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AuthError {
    /// No Authorization header or bearer token present.
    #[error("missing authentication token")]
    MissingToken,

    /// The bearer token is not one the server recognizes.
    #[error("invalid authentication token")]
    InvalidToken,

    /// The token does not name a known user.
    #[error("unknown user '{0}'")]
    UnknownUser(String),

    /// The role directory failed.
    #[error("role lookup failed: {0}")]
    Directory(String),
}

impl AuthError {
    /// Whether this error should result in a 401 (vs. a 500).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AuthError::MissingToken | AuthError::InvalidToken | AuthError::UnknownUser(_)
        )
    }
}

impl From<veil_core::Error> for AuthError {
    fn from(e: veil_core::Error) -> Self {
        AuthError::Directory(e.to_string())
    }
}
