use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// All assets a wallet can hold
pub enum Asset {
    #[serde(rename = "dcr")]
    Dcr,
    #[serde(rename = "btc")]
    Btc,
}

impl Asset {
    /// Both assets use 8 decimal places.
    const DECIMALS: u32 = 8;

    pub fn ticker(&self) -> &'static str {
        match self {
            Asset::Dcr => "DCR",
            Asset::Btc => "BTC",
        }
    }

    /// Convert an atom (satoshi) amount to coins, without trailing zeros.
    pub fn to_coin(&self, atoms: i64) -> Decimal {
        Decimal::new(atoms, Self::DECIMALS).normalize()
    }
}

impl std::fmt::Display for Asset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.ticker())
    }
}
