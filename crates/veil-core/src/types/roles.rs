//! Role sets and principals.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// An unordered set of role names.
///
/// Duplicates collapse and equality is set equality, so two role lists that
/// differ only in order or repetition compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleSet(BTreeSet<String>);

impl RoleSet {
    /// Creates an empty role set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a role, returning `true` if it was not present.
    pub fn insert<S: Into<String>>(&mut self, role: S) -> bool {
        self.0.insert(role.into())
    }

    /// Returns `true` if the set contains the role.
    pub fn contains(&self, role: &str) -> bool {
        self.0.contains(role)
    }

    /// Returns `true` if the two sets share at least one role.
    pub fn intersects(&self, other: &RoleSet) -> bool {
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        small.iter().any(|r| large.contains(r))
    }

    /// Number of roles.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no roles.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates roles in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Removes every role.
    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl<S: Into<String>> FromIterator<S> for RoleSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<String>, const N: usize> From<[S; N]> for RoleSet {
    fn from(roles: [S; N]) -> Self {
        roles.into_iter().collect()
    }
}

impl IntoIterator for RoleSet {
    type Item = String;
    type IntoIter = std::collections::btree_set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, role) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{role}")?;
        }
        write!(f, "}}")
    }
}

/// The acting user and its resolved roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// User identity
    pub user: String,
    /// Resolved roles; flat, no hierarchy
    #[serde(default)]
    pub roles: RoleSet,
}

impl Principal {
    /// Creates a principal from a user and its roles.
    pub fn new<U: Into<String>>(user: U, roles: RoleSet) -> Self {
        Self {
            user: user.into(),
            roles,
        }
    }

    /// A principal with no roles.
    pub fn anonymous<U: Into<String>>(user: U) -> Self {
        Self::new(user, RoleSet::new())
    }

    /// Returns `true` if the principal holds the role.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user)
    }
}
