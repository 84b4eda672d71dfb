//! List filters restricting queries to records a principal may see.
//!
//! The fragment targets the host's MariaDB dialect and is built fresh on
//! every call.

use std::fmt;

use veil_core::schema::{self, ALLOWED_ROLES_FIELD, IS_CONFIDENTIAL_FIELD, ROLE_MAPPING_DOCTYPE};
use veil_core::{DocKind, Principal};

/// A boolean expression appended to the host's list query.
///
/// An empty fragment places no restriction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryFragment(String);

impl QueryFragment {
    /// The always-true fragment.
    pub fn empty() -> Self {
        Self(String::new())
    }

    /// Returns `true` if this fragment places no restriction.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The expression text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueryFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<QueryFragment> for String {
    fn from(fragment: QueryFragment) -> Self {
        fragment.0
    }
}

/// Build the list predicate for `principal` over records of `kind`.
///
/// Non-confidential rows always pass. Confidential rows pass when a role
/// grant matches one of the principal's roles; that disjunct is omitted when
/// the principal has no roles.
pub fn filter_predicate(kind: DocKind, principal: &Principal, privileged_role: &str) -> QueryFragment {
    if principal.has_role(privileged_role) {
        return QueryFragment::empty();
    }

    let table = schema::table(kind.doctype());
    let flag = format!("{table}.`{IS_CONFIDENTIAL_FIELD}`");
    let open = format!("{flag} = 0 OR {flag} IS NULL");

    if principal.roles.is_empty() {
        return QueryFragment(format!("({open})"));
    }

    let grants = schema::table(ROLE_MAPPING_DOCTYPE);
    let roles = principal
        .roles
        .iter()
        .map(quote_literal)
        .collect::<Vec<_>>()
        .join(", ");

    QueryFragment(format!(
        "({open} OR ({flag} = 1 AND EXISTS (SELECT 1 FROM {grants} \
         WHERE {grants}.`parent` = {table}.`name` \
         AND {grants}.`parenttype` = {doctype} \
         AND {grants}.`parentfield` = '{ALLOWED_ROLES_FIELD}' \
         AND {grants}.`role` IN ({roles}))))",
        doctype = quote_literal(kind.doctype()),
    ))
}

/// Single-quote a string literal, escaping backslashes and doubling quotes.
pub fn quote_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("''"),
            '\0' => out.push_str("\\0"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}
