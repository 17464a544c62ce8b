use serde::{Deserialize, Serialize};

/// User preferences that decide which desktop notifications are posted.
///
/// Held in a `ConfigStore` so a reload takes effect without re-attaching
/// any page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPrefs {
    /// Post a desktop notification for incoming transactions.
    #[serde(default = "default_true")]
    pub transaction_notifications: bool,
    /// Beep when a new block is attached.
    #[serde(default)]
    pub beep_new_blocks: bool,
    /// Post a desktop notification for proposal updates.
    #[serde(default)]
    pub proposal_notifications: bool,
    #[serde(default)]
    pub privacy_mode: bool,
    /// Whether the governance (Politeia) API may be contacted at all.
    #[serde(default = "default_true")]
    pub governance_api: bool,
}

fn default_true() -> bool {
    true
}

impl Default for NotificationPrefs {
    fn default() -> Self {
        Self {
            transaction_notifications: true,
            beep_new_blocks: false,
            proposal_notifications: false,
            privacy_mode: false,
            governance_api: true,
        }
    }
}

impl NotificationPrefs {
    /// Proposal notifications are posted when explicitly enabled, or
    /// whenever privacy mode is off.
    pub fn posts_proposal_notifications(&self) -> bool {
        self.proposal_notifications || !self.privacy_mode
    }
}
