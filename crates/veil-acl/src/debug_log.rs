//! Diagnostics appended to the settings record.
//!
//! Every message goes to the `log` facade at debug level. When the settings
//! record has `debug_mode` on, the message is also prepended to its
//! `debug_logs` field. Failures here never reach the caller.

use std::sync::Arc;

use veil_core::schema::{DEBUG_LOG_LIMIT, TRUNCATION_MARKER};
use veil_core::{Clock, Result, SettingsStore};

use crate::settings::SettingsProvider;

/// Separator between stored entries.
const ENTRY_SEPARATOR: &str = "\n---\n";

/// Writer for the settings record's debug log.
pub struct DebugLog {
    settings: Arc<SettingsProvider>,
    store: Arc<dyn SettingsStore>,
    clock: Arc<dyn Clock>,
}

impl DebugLog {
    /// Create a debug log writing through `store`.
    pub fn new(
        settings: Arc<SettingsProvider>,
        store: Arc<dyn SettingsStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            settings,
            store,
            clock,
        }
    }

    /// Record a diagnostic message.
    pub async fn record(&self, message: &str) {
        self.record_with(message, None).await;
    }

    /// Record a diagnostic message with structured details.
    pub async fn record_with(&self, message: &str, details: Option<serde_json::Value>) {
        log::debug!("{message}");

        if !self.settings.get_settings().await.debug_mode {
            return;
        }

        if let Err(e) = self.append(message, details).await {
            log::warn!("Failed to append confidential debug log: {e}");
        }
    }

    async fn append(&self, message: &str, details: Option<serde_json::Value>) -> Result<()> {
        let mut entry = format!(
            "{}: {message}",
            self.clock.now().format("%Y-%m-%d %H:%M:%S%.6f")
        );
        if let Some(details) = details {
            entry.push_str("\nDetails: ");
            entry.push_str(&serde_json::to_string_pretty(&details)?);
        }

        let existing = self.store.debug_logs().await?;
        let combined = format!("{entry}{ENTRY_SEPARATOR}{existing}");
        self.store.write_debug_logs(&truncate_log(combined)).await
    }
}

/// Cut a log at [`DEBUG_LOG_LIMIT`] bytes and append the truncation marker.
pub fn truncate_log(mut logs: String) -> String {
    if logs.len() <= DEBUG_LOG_LIMIT {
        return logs;
    }
    let mut cut = DEBUG_LOG_LIMIT;
    while !logs.is_char_boundary(cut) {
        cut -= 1;
    }
    logs.truncate(cut);
    logs.push_str(TRUNCATION_MARKER);
    logs
}
