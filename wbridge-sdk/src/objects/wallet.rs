use super::{Asset, WalletId};
use serde::{Deserialize, Serialize};

/// Summary of an opened wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletInfo {
    pub id: WalletId,
    pub name: String,
    pub asset: Asset,
    /// Spendable balance in atoms.
    pub balance: i64,
    #[serde(default)]
    pub watching_only: bool,
}
