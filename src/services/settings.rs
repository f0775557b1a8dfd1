use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::persistence::Persistence;
use crate::config::{DEFAULT_REPLY_DELAY, SETTINGS_KEY};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub send_with_enter: bool,
    pub color_scheme: ColorScheme,
    pub sidebar_collapsed: bool,
    /// Delay before the simulated assistant reply is appended.
    pub reply_delay_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorScheme {
    System,
    Light,
    Dark,
}

impl AppSettings {
    pub fn reply_delay(&self) -> Duration {
        Duration::from_millis(self.reply_delay_ms)
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            send_with_enter: true,
            color_scheme: ColorScheme::System,
            sidebar_collapsed: false,
            reply_delay_ms: DEFAULT_REPLY_DELAY.as_millis() as u64,
        }
    }
}

pub struct SettingsService;

impl SettingsService {
    pub async fn load(persistence: &Persistence) -> AppSettings {
        persistence.load_json(SETTINGS_KEY, AppSettings::default).await
    }

    pub async fn save(persistence: &Persistence, settings: &AppSettings) -> Result<()> {
        persistence.save_json(SETTINGS_KEY, settings).await
    }
}
