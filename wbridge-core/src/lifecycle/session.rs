use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use wbridge_sdk::objects::{Asset, WalletId, WalletInfo};

/// Tabs of the wallet main page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WalletTab {
    Info,
    Transactions,
    StakeShuffle,
    Governance,
}

impl WalletTab {
    /// Tabs offered for `wallet`. Mixing and governance need a spending
    /// DCR wallet.
    pub fn available_for(wallet: &WalletInfo) -> Vec<WalletTab> {
        let mut tabs = vec![WalletTab::Info, WalletTab::Transactions];
        if wallet.asset == Asset::Dcr && !wallet.watching_only {
            tabs.push(WalletTab::StakeShuffle);
            tabs.push(WalletTab::Governance);
        }
        tabs
    }
}

/// Navigation state that outlives a single page visit.
///
/// Owned by whoever builds the pages; the wallet main page reads it to
/// restore the last selected tab when it becomes visible again.
#[derive(Debug, Default)]
pub struct WalletSessionState {
    selected_tabs: HashMap<WalletId, WalletTab>,
}

pub type SharedSession = Arc<Mutex<WalletSessionState>>;

impl WalletSessionState {
    pub fn selected_tab(&self, wallet_id: WalletId) -> WalletTab {
        self.selected_tabs
            .get(&wallet_id)
            .copied()
            .unwrap_or(WalletTab::Info)
    }

    pub fn select_tab(&mut self, wallet_id: WalletId, tab: WalletTab) {
        self.selected_tabs.insert(wallet_id, tab);
    }

    /// Forget a wallet that was closed.
    pub fn forget(&mut self, wallet_id: WalletId) {
        self.selected_tabs.remove(&wallet_id);
    }
}
