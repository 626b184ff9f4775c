//! User settings stored as settings.json in the app data directory

use crate::constants::{API_BASE_ENV, DEFAULT_API_BASE_URL, DEFAULT_CATEGORY};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Window geometry
    pub window_x: Option<f32>,
    pub window_y: Option<f32>,
    pub window_w: Option<f32>,
    pub window_h: Option<f32>,

    // Upstream
    pub api_base_url: String,
    pub category: String,
    pub connect_timeout_secs: u64,

    // View
    pub large_cards: bool,

    // Sharing
    pub share_via_clipboard: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            window_x: None,
            window_y: None,
            window_w: None,
            window_h: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            category: DEFAULT_CATEGORY.to_string(),
            connect_timeout_secs: 10,
            large_cards: true,
            share_via_clipboard: true,
        }
    }
}

impl Settings {
    pub fn load(data_dir: &Path) -> Self {
        let api_override = std::env::var(API_BASE_ENV).ok();
        Self::load_from(data_dir, api_override.as_deref())
    }

    fn load_from(data_dir: &Path, api_override: Option<&str>) -> Self {
        let path = data_dir.join("settings.json");
        let mut settings = match std::fs::read_to_string(&path) {
            Ok(s) => match serde_json::from_str(&s) {
                Ok(settings) => {
                    debug!(path = %path.display(), "Settings loaded");
                    settings
                }
                Err(e) => {
                    warn!(error = %e, "Failed to parse settings, using defaults");
                    Self::default()
                }
            },
            Err(_) => {
                debug!("No settings file found, using defaults");
                Self::default()
            }
        };

        if let Some(base) = api_override {
            settings.apply_api_override(base);
        }
        settings
    }

    pub fn save(&self, data_dir: &Path) {
        let path = data_dir.join("settings.json");
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&path, json) {
                    warn!(error = %e, "Failed to save settings");
                }
            }
            Err(e) => warn!(error = %e, "Failed to serialize settings"),
        }
    }

    fn apply_api_override(&mut self, base: &str) {
        let base = base.trim();
        if base.is_empty() {
            return;
        }
        info!(base = %base, "API base URL overridden from environment");
        self.api_base_url = base.to_string();
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs.max(1))
    }
}
