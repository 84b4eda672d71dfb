//! Cached access to the settings record.
//!
//! One [`SettingsProvider`] is shared by everything that consults the
//! protection switches. A load failure never surfaces to callers: they get
//! [`Settings::safe_default`] (protection off) and the failure is logged.

use std::sync::{Arc, RwLock};

use veil_core::{DocKind, Result, Settings, SettingsStore};

/// Process-wide settings slot in front of a [`SettingsStore`].
pub struct SettingsProvider {
    store: Arc<dyn SettingsStore>,
    slot: RwLock<Option<Settings>>,
}

impl SettingsProvider {
    /// Create a provider with an empty cache slot.
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self {
            store,
            slot: RwLock::new(None),
        }
    }

    /// The current settings, loading them on a cache miss.
    pub async fn get_settings(&self) -> Settings {
        if let Some(settings) = self.cached() {
            return settings;
        }

        match self.store.load_settings().await {
            Ok(settings) => {
                if let Ok(mut slot) = self.slot.write() {
                    *slot = Some(settings.clone());
                }
                settings
            }
            Err(e) => {
                log::error!("Confidential settings unavailable, protection disabled: {e}");
                Settings::safe_default()
            }
        }
    }

    /// Returns `true` if checks apply to records of `kind`.
    pub async fn is_protection_enabled(&self, kind: DocKind) -> bool {
        self.get_settings().await.protects(kind)
    }

    /// Clear the cache slot.
    pub fn invalidate(&self) {
        if let Ok(mut slot) = self.slot.write() {
            *slot = None;
        }
        log::debug!("Confidential settings cache cleared");
    }

    /// Persist new settings and drop the cached copy.
    ///
    /// Turning debug mode off also clears the accumulated debug log.
    pub async fn update_settings(&self, settings: &Settings) -> Result<()> {
        self.store.save_settings(settings).await?;
        if !settings.debug_mode {
            self.store.write_debug_logs("").await?;
        }
        self.invalidate();
        Ok(())
    }

    /// Returns `true` if the slot currently holds settings.
    pub fn is_cached(&self) -> bool {
        self.cached().is_some()
    }

    fn cached(&self) -> Option<Settings> {
        self.slot.read().ok()?.clone()
    }
}

impl std::fmt::Debug for SettingsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsProvider")
            .field("cached", &self.cached())
            .finish()
    }
}
