use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Status of an instant swap order
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    New,
    Waiting,
    Confirming,
    Exchanging,
    Sending,
    Completed,
    Refunded,
    Expired,
    Failed,
}

impl OrderStatus {
    /// Returns `true` once the order can no longer change.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Completed | OrderStatus::Refunded | OrderStatus::Expired | OrderStatus::Failed
        )
    }
}

/// A swap order tracked by the exchange subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub uuid: Uuid,
    pub exchange: String,
    pub status: OrderStatus,
    /// Unix timestamp of order creation.
    pub created_at: i64,
}
