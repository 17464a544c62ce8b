use crate::events::{DEFAULT_CHANNEL_BUFFER, NotificationDomain, TX_AND_BLOCK_CHANNEL_BUFFER};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("channel capacity for {0} must be at least 1")]
pub struct InvalidCapacity(pub NotificationDomain);

/// Channel buffer size per notification domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelCapacities {
    #[serde(default = "default_capacity")]
    pub sync_progress: usize,
    #[serde(default = "default_tx_and_block_capacity")]
    pub tx_and_block: usize,
    #[serde(default = "default_capacity")]
    pub account_mixer: usize,
    #[serde(default = "default_capacity")]
    pub proposal: usize,
    #[serde(default = "default_capacity")]
    pub order: usize,
}

fn default_capacity() -> usize {
    DEFAULT_CHANNEL_BUFFER
}

fn default_tx_and_block_capacity() -> usize {
    TX_AND_BLOCK_CHANNEL_BUFFER
}

impl Default for ChannelCapacities {
    fn default() -> Self {
        Self {
            sync_progress: DEFAULT_CHANNEL_BUFFER,
            tx_and_block: TX_AND_BLOCK_CHANNEL_BUFFER,
            account_mixer: DEFAULT_CHANNEL_BUFFER,
            proposal: DEFAULT_CHANNEL_BUFFER,
            order: DEFAULT_CHANNEL_BUFFER,
        }
    }
}

impl ChannelCapacities {
    pub fn for_domain(&self, domain: NotificationDomain) -> usize {
        match domain {
            NotificationDomain::SyncProgress => self.sync_progress,
            NotificationDomain::TxAndBlock => self.tx_and_block,
            NotificationDomain::AccountMixer => self.account_mixer,
            NotificationDomain::Proposal => self.proposal,
            NotificationDomain::Order => self.order,
        }
    }

    /// Every domain needs room for at least one notification.
    pub fn validate(&self) -> Result<(), InvalidCapacity> {
        match NotificationDomain::ALL
            .into_iter()
            .find(|domain| self.for_domain(*domain) == 0)
        {
            Some(domain) => Err(InvalidCapacity(domain)),
            None => Ok(()),
        }
    }
}
