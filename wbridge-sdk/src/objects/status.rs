//! Status values reported through the engine's listener callbacks.

use serde::{Deserialize, Serialize};

/// Account mixer run status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MixerRunStatus {
    Started,
    Ended,
}

/// Governance proposal sync status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    /// The proposal set is fully synced.
    Synced,
    NewProposal,
    VoteStarted,
    VoteFinished,
}

/// Swap order sync status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderSyncStatus {
    Started,
    Synced,
    Failed,
}
