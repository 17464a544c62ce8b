//! Configuration types for the notification bridge.
//!
//! These are the validated runtime types. Reading them from a file is the
//! binary's job.

mod channels;
mod config_store;
mod preferences;

pub use channels::{ChannelCapacities, InvalidCapacity};
pub use config_store::{ConfigStore, ConfigWatcher};
pub use preferences::NotificationPrefs;

use serde::{Deserialize, Serialize};

/// Everything the bridge itself can be configured with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub channels: ChannelCapacities,
    #[serde(default)]
    pub notifications: NotificationPrefs,
}
