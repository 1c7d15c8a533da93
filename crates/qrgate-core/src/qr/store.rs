//! Observable holder of the current [`QrConfig`].

use tokio::sync::watch;

use super::options::{ConfigUpdate, EcLevel, QrConfig};

/// Single source of truth for the generator's configuration.
///
/// Every update replaces the whole value; receivers are only woken when the
/// value actually changed.
#[derive(Debug)]
pub struct ConfigStore {
    tx: watch::Sender<QrConfig>,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::with_config(QrConfig::default())
    }

    pub fn with_config(config: QrConfig) -> Self {
        let (tx, _rx) = watch::channel(config);
        Self { tx }
    }

    /// Snapshot of the current configuration.
    pub fn get(&self) -> QrConfig {
        self.tx.borrow().clone()
    }

    /// Applies `update`. Returns true if the configuration changed.
    pub fn apply(&self, update: ConfigUpdate) -> bool {
        let changed = self.tx.send_if_modified(|current| {
            let next = current.clone().apply(update);
            if next == *current {
                return false;
            }
            *current = next;
            true
        });
        if changed {
            tracing::trace!(config = ?*self.tx.borrow(), "configuration updated");
        }
        changed
    }

    pub fn set_content(&self, content: impl Into<String>) -> bool {
        self.apply(ConfigUpdate::Content(content.into()))
    }

    pub fn set_size(&self, size: i64) -> bool {
        self.apply(ConfigUpdate::Size(size))
    }

    pub fn set_foreground(&self, color: impl Into<String>) -> bool {
        self.apply(ConfigUpdate::Foreground(color.into()))
    }

    pub fn set_background(&self, color: impl Into<String>) -> bool {
        self.apply(ConfigUpdate::Background(color.into()))
    }

    pub fn set_level(&self, level: EcLevel) -> bool {
        self.apply(ConfigUpdate::Level(level))
    }

    pub fn set_include_margin(&self, include_margin: bool) -> bool {
        self.apply(ConfigUpdate::IncludeMargin(include_margin))
    }

    /// Restores the defaults.
    pub fn reset(&self) -> bool {
        self.tx.send_if_modified(|current| {
            let defaults = QrConfig::default();
            if *current == defaults {
                return false;
            }
            *current = defaults;
            true
        })
    }

    /// Receiver that observes every effective change.
    pub fn subscribe(&self) -> watch::Receiver<QrConfig> {
        self.tx.subscribe()
    }
}
