//! Principal extraction helpers.

use veil_core::Principal;

/// Extract the [`Principal`] from HTTP request `Parts`, if present.
pub fn principal_from_parts(parts: &http::request::Parts) -> Option<&Principal> {
    parts.extensions.get::<Principal>()
}

/// Extract the acting user's name from HTTP request `Parts`.
///
/// Returns `"anonymous"` if the auth layer did not run.
pub fn user_from_parts(parts: &http::request::Parts) -> &str {
    principal_from_parts(parts)
        .map(|p| p.user.as_str())
        .unwrap_or("anonymous")
}
