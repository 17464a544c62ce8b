use compact_str::CompactString;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalCategory {
    Pre,
    Active,
    Approved,
    Rejected,
    Abandoned,
}

/// A governance proposal as cached by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub token: CompactString,
    pub name: String,
    pub category: ProposalCategory,
    /// Unix timestamp of the latest proposal update.
    pub timestamp: i64,
}
