//! Transaction payload as serialized by the engine.
//!
//! The engine hands new transactions to `on_transaction` as a JSON string,
//! so this type mirrors the engine's field names exactly.

use super::WalletId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Block height reported for transactions that are still in the mempool.
pub const UNCONFIRMED_HEIGHT: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxType {
    Regular,
    Coinbase,
    Ticket,
    Vote,
    Revocation,
    #[serde(other)]
    Unknown,
}

/// Direction of a transaction relative to the wallet.
///
/// Encoded as an integer on the wire: 0 sent, 1 received, 2 transferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum TxDirection {
    Sent,
    Received,
    Transferred,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transaction direction: {0}")]
pub struct InvalidDirection(pub i32);

impl TryFrom<i32> for TxDirection {
    type Error = InvalidDirection;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(TxDirection::Sent),
            1 => Ok(TxDirection::Received),
            2 => Ok(TxDirection::Transferred),
            other => Err(InvalidDirection(other)),
        }
    }
}

impl From<TxDirection> for i32 {
    fn from(direction: TxDirection) -> Self {
        match direction {
            TxDirection::Sent => 0,
            TxDirection::Received => 1,
            TxDirection::Transferred => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "walletID")]
    pub wallet_id: WalletId,
    pub hash: String,
    #[serde(rename = "type")]
    pub tx_type: TxType,
    pub direction: TxDirection,
    /// Amount in atoms.
    pub amount: i64,
    #[serde(default)]
    pub fee: i64,
    #[serde(default)]
    pub vote_reward: i64,
    pub block_height: i32,
    /// Unix timestamp.
    pub timestamp: i64,
}

impl Transaction {
    /// Decode the engine's JSON payload.
    pub fn from_json(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn is_confirmed(&self) -> bool {
        self.block_height != UNCONFIRMED_HEIGHT
    }

    pub fn timestamp_utc(&self) -> Option<time::OffsetDateTime> {
        time::OffsetDateTime::from_unix_timestamp(self.timestamp).ok()
    }
}
