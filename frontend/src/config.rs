use log::{warn, Level};
use serde::Deserialize;

use crate::dom::PresentationTree;
use crate::error::ConfigError;

/// Id of the optional `<script type="application/json">` element carrying overrides.
pub const CONFIG_ELEMENT_ID: &str = "ui-config";

#[cfg(debug_assertions)]
pub fn log_level() -> Level {
    Level::Debug  // Verbose while developing locally
}

#[cfg(not(debug_assertions))]
pub fn log_level() -> Level {
    Level::Info
}

/// Timings, thresholds and texts used by the page behaviors.
///
/// Every field has a default, so a partial JSON document only overrides what it names.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub notification_ms: u32,
    pub exit_transition_ms: u32,
    pub submit_delay_ms: u32,
    pub counter_duration_ms: u32,
    pub counter_tick_ms: u32,
    pub fade_in_delay_ms: u32,
    pub navbar_shadow_after: f64,
    pub navbar_hide_after: f64,
    pub scroll_top_after: f64,
    pub section_offset: f64,
    pub easter_egg_clicks: u32,
    pub messages: Messages,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            notification_ms: 5_000,
            exit_transition_ms: 300,
            submit_delay_ms: 1_500,
            counter_duration_ms: 2_000,
            counter_tick_ms: 16,
            fade_in_delay_ms: 100,
            navbar_shadow_after: 50.0,
            navbar_hide_after: 100.0,
            scroll_top_after: 300.0,
            section_offset: 100.0,
            easter_egg_clicks: 5,
            messages: Messages::default(),
        }
    }
}

/// User-visible strings. Defaults are the Indonesian texts the site ships with.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Messages {
    pub required: String,
    pub invalid_email: String,
    pub invalid_phone: String,
    pub form_invalid: String,
    pub form_sent: String,
    pub sending: String,
    pub easter_egg: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            required: "Field ini wajib diisi".to_string(),
            invalid_email: "Format email tidak valid".to_string(),
            invalid_phone: "Format nomor telepon tidak valid".to_string(),
            form_invalid: "Mohon periksa kembali isian formulir Anda.".to_string(),
            form_sent: "Terima kasih! Pesan Anda telah diterima. Tim kami akan segera menghubungi Anda.".to_string(),
            sending: "Mengirim...".to_string(),
            easter_egg: "🎉 Selamat! Anda menemukan Easter Egg! Terima kasih telah mengeksplorasi PetraScan!".to_string(),
        }
    }
}

impl UiConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads overrides from the page, falling back to defaults when the element is
    /// missing or does not parse.
    pub fn from_tree(tree: &dyn PresentationTree) -> Self {
        let Some(node) = tree.by_id(CONFIG_ELEMENT_ID) else {
            return Self::default();
        };
        match Self::from_json(&tree.text(node)) {
            Ok(config) => config,
            Err(e) => {
                warn!("Ignoring page config: {}", e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryTree;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = UiConfig::from_json(r#"{"notification_ms": 3000, "messages": {"sending": "Sending..."}}"#)
            .unwrap();
        assert_eq!(config.notification_ms, 3_000);
        assert_eq!(config.exit_transition_ms, 300);
        assert_eq!(config.messages.sending, "Sending...");
        assert_eq!(config.messages.required, "Field ini wajib diisi");
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(UiConfig::from_json("{not json"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn reads_config_element_from_page() {
        let tree = MemoryTree::new();
        let script = tree.element(tree.head(), "script", &[("id", CONFIG_ELEMENT_ID)]);
        tree.set_text(script, r#"{"easter_egg_clicks": 3}"#);
        assert_eq!(UiConfig::from_tree(&tree).easter_egg_clicks, 3);
    }

    #[test]
    fn broken_config_element_falls_back_to_defaults() {
        let tree = MemoryTree::new();
        let script = tree.element(tree.head(), "script", &[("id", CONFIG_ELEMENT_ID)]);
        tree.set_text(script, "[1, 2");
        assert_eq!(UiConfig::from_tree(&tree), UiConfig::default());
        assert_eq!(UiConfig::from_tree(&MemoryTree::new()), UiConfig::default());
    }
}
