use crate::calc::picker::PickStrategy;
use crate::calc::undo::DEFAULT_MAX_UNDO_STATES;
use crate::data::persistence::Persistable;
use crate::data::store::{Notifier, Toast, ToastKind};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::warn;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AppSettings {
    /// How many table states the undo history keeps.
    pub max_undo_states: usize,
    pub pick_strategy: PickStrategy,
    pub success_toast_ms: u64,
    pub failure_toast_ms: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        AppSettings {
            max_undo_states: DEFAULT_MAX_UNDO_STATES,
            pick_strategy: PickStrategy::Pair,
            success_toast_ms: 2000,
            failure_toast_ms: 5000,
        }
    }
}

/// Wrapper that reads the `settings` key from config.yaml.
#[derive(Serialize, Deserialize, Default, Debug)]
struct SettingsWrapper {
    #[serde(default)]
    settings: AppSettings,
}

impl Persistable for SettingsWrapper {
    fn filename() -> &'static str {
        "config.yaml"
    }
    fn is_json() -> bool {
        false
    }
}

impl AppSettings {
    /// Reads the settings from `dir`. An unreadable config.yaml falls back to
    /// the defaults and raises a failure toast.
    pub fn load_or_default(dir: &Path, notifier: &dyn Notifier) -> Self {
        match SettingsWrapper::load_from(dir) {
            Ok(wrapper) => wrapper.settings,
            Err(e) => {
                warn!("using default settings: {e:#}");
                let settings = AppSettings::default();
                notifier.notify(Toast {
                    message: "Failed to read config.yaml, using defaults.".to_string(),
                    kind: ToastKind::Failure,
                    duration: settings.failure_toast(),
                });
                settings
            }
        }
    }

    pub fn save_to(&self, dir: &Path) -> Result<()> {
        let wrapper = SettingsWrapper {
            settings: self.clone(),
        };
        wrapper.save_to(dir)
    }

    pub fn success_toast(&self) -> Duration {
        Duration::from_millis(self.success_toast_ms)
    }

    pub fn failure_toast(&self) -> Duration {
        Duration::from_millis(self.failure_toast_ms)
    }
}
