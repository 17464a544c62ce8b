//! TOML file configuration structures.
//!
//! These structs directly map to the `wbridge.toml` file format. Every
//! section is optional.

use serde::{Deserialize, Serialize};
use wbridge_core::config::{ChannelCapacities, NotificationPrefs};

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub channels: ChannelCapacities,
    #[serde(default)]
    pub notifications: NotificationPrefs,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// Simulated engine and navigation section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Number of wallets opened in the simulated engine.
    #[serde(default = "default_wallets")]
    pub wallets: usize,
    /// Milliseconds between two events on an engine thread.
    #[serde(default = "default_event_interval_ms")]
    pub event_interval_ms: u64,
    /// Seconds a page stays visible before the simulator navigates away.
    #[serde(default = "default_page_dwell_secs")]
    pub page_dwell_secs: u64,
}

fn default_wallets() -> usize {
    2
}

fn default_event_interval_ms() -> u64 {
    200
}

fn default_page_dwell_secs() -> u64 {
    3
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            wallets: default_wallets(),
            event_interval_ms: default_event_interval_ms(),
            page_dwell_secs: default_page_dwell_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config_parsing() {
        let toml_str = r#"
[channels]
tx_and_block = 16
order = 2

[notifications]
transaction_notifications = false
beep_new_blocks = true
privacy_mode = true

[simulation]
wallets = 3
event_interval_ms = 50
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.channels.tx_and_block, 16);
        assert_eq!(config.channels.order, 2);
        assert_eq!(config.channels.proposal, 8);
        assert!(!config.notifications.transaction_notifications);
        assert!(config.notifications.beep_new_blocks);
        assert!(config.notifications.governance_api);
        assert_eq!(config.simulation.wallets, 3);
        assert_eq!(config.simulation.page_dwell_secs, 3);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: FileConfig = toml::from_str("").unwrap();
        assert_eq!(config.channels, ChannelCapacities::default());
        assert_eq!(config.notifications, NotificationPrefs::default());
        assert_eq!(config.simulation.wallets, 2);
    }
}
