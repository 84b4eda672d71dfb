//! Process lifecycle events that invalidate cached state.

use std::fmt;

use crate::cache::PermissionCache;
use crate::settings::SettingsProvider;

/// A host event after which cached settings and decisions may be stale.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LifecycleEvent {
    /// The application was updated.
    AppUpdate,
    /// A user logged in.
    Login {
        /// The user who logged in
        user: String,
    },
    /// Schema migrations ran.
    Migrate,
    /// Fixtures (roles, custom fields, permissions) were synced.
    FixtureSync,
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleEvent::AppUpdate => write!(f, "app update"),
            LifecycleEvent::Login { user } => write!(f, "login of {user}"),
            LifecycleEvent::Migrate => write!(f, "migration"),
            LifecycleEvent::FixtureSync => write!(f, "fixture sync"),
        }
    }
}

/// Clear the settings slot and the decision cache.
pub fn handle(event: &LifecycleEvent, settings: &SettingsProvider, cache: &PermissionCache) {
    match event {
        LifecycleEvent::Login { .. } => {
            log::debug!("Clearing confidentiality caches after {event}")
        }
        _ => log::info!("Clearing confidentiality caches after {event}"),
    }
    settings.invalidate();
    cache.clear();
}
