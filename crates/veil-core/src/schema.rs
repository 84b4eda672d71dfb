//! Names and limits of the schema surface this layer adds to the host.

/// Host table holding role grants.
pub const ROLE_MAPPING_DOCTYPE: &str = "Confidential Role Mapping";

/// Field on each managed kind holding the role table.
pub const ALLOWED_ROLES_FIELD: &str = "allowed_roles";

/// Field on each managed kind holding the flag.
pub const IS_CONFIDENTIAL_FIELD: &str = "is_confidential";

/// Role that bypasses every confidentiality check unless configured otherwise.
pub const DEFAULT_PRIVILEGED_ROLE: &str = "System Manager";

/// Lifetime of a memoized permission decision, in seconds.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Ceiling of the settings record's debug log, in bytes.
pub const DEBUG_LOG_LIMIT: usize = 50 * 1024;

/// Appended when the debug log is cut at [`DEBUG_LOG_LIMIT`].
pub const TRUNCATION_MARKER: &str = "\n... (truncated)";

/// Host table name for a doctype, backtick-quoted.
pub fn table(doctype: &str) -> String {
    format!("`tab{doctype}`")
}
