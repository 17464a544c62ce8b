//! Simulated engine activity.
//!
//! The Simulator is responsible for:
//! - Opening the configured number of wallets in an [`InMemoryEngine`]
//! - Emitting a random mix of engine events from dedicated engine threads
//! - Stopping those threads on request
//!
//! Events are emitted from plain OS threads, as the real engine does, so
//! that a full notification channel blocks the emitting thread and nothing
//! else.

use rand::Rng;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;
use time::OffsetDateTime;
use uuid::Uuid;
use wbridge_core::engine::InMemoryEngine;
use wbridge_sdk::objects::{
    Asset, MixerRunStatus, Order, OrderStatus, OrderSyncStatus, Proposal, ProposalCategory,
    ProposalStatus, Transaction, TxDirection, TxType, WalletId, WalletInfo,
};

const ATOMS_PER_COIN: i64 = 100_000_000;

const PROPOSAL_NAMES: [&str; 3] = [
    "Treasury Spending Q3",
    "Marketing Budget",
    "Bug Bounty Extension",
];

/// Open `count` wallets and return their ids.
pub fn seed_wallets(engine: &InMemoryEngine, count: usize) -> Vec<WalletId> {
    let ids: Vec<WalletId> = (1..).take(count).collect();
    for &id in &ids {
        engine.add_wallet(WalletInfo {
            id,
            name: format!("wallet-{id}"),
            asset: if id % 3 == 0 { Asset::Btc } else { Asset::Dcr },
            balance: 10 * ATOMS_PER_COIN,
            watching_only: false,
        });
    }
    let now = OffsetDateTime::now_utc().unix_timestamp();
    engine.set_proposals(
        PROPOSAL_NAMES
            .iter()
            .enumerate()
            .map(|(i, name)| Proposal {
                token: format!("{:016x}", i + 1).into(),
                name: (*name).to_owned(),
                category: ProposalCategory::Active,
                timestamp: now,
            })
            .collect(),
    );
    ids
}

/// Handle to the running engine threads.
pub struct Simulator {
    stop: Arc<AtomicBool>,
    threads: Vec<JoinHandle<()>>,
}

impl Simulator {
    pub fn start(
        engine: Arc<InMemoryEngine>,
        wallets: Vec<WalletId>,
        interval: Duration,
    ) -> std::io::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let mut threads = Vec::new();

        let chain = ChainActivity {
            engine: Arc::clone(&engine),
            wallets: wallets.clone(),
            heights: vec![1_000; wallets.len()],
            balances: vec![10 * ATOMS_PER_COIN; wallets.len()],
            pending: Vec::new(),
        };
        threads.push(spawn_engine_thread(
            "engine-chain",
            Arc::clone(&stop),
            interval,
            chain,
        )?);

        let services = ServiceActivity {
            engine,
            wallets,
            mixer_running: false,
        };
        threads.push(spawn_engine_thread(
            "engine-services",
            Arc::clone(&stop),
            interval * 3,
            services,
        )?);

        Ok(Self { stop, threads })
    }

    /// Ask the engine threads to stop after their current event.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    /// Wait for every engine thread to exit. Blocks.
    pub fn join(self) {
        self.request_stop();
        for thread in self.threads {
            if thread.join().is_err() {
                tracing::error!("Engine thread panicked");
            }
        }
    }
}

trait Activity: Send + 'static {
    fn step(&mut self, rng: &mut impl Rng);
}

fn spawn_engine_thread<A: Activity>(
    name: &str,
    stop: Arc<AtomicBool>,
    interval: Duration,
    mut activity: A,
) -> std::io::Result<JoinHandle<()>> {
    let thread_name = name.to_owned();
    std::thread::Builder::new()
        .name(name.to_owned())
        .spawn(move || {
            let mut rng = rand::rng();
            while !stop.load(Ordering::Acquire) {
                activity.step(&mut rng);
                std::thread::sleep(interval);
            }
            tracing::debug!(thread = %thread_name, "Engine thread stopped");
        })
}

/// Transactions, blocks and sync progress.
struct ChainActivity {
    engine: Arc<InMemoryEngine>,
    wallets: Vec<WalletId>,
    heights: Vec<i32>,
    balances: Vec<i64>,
    /// Unconfirmed transactions as (wallet index, hash).
    pending: Vec<(usize, String)>,
}

impl ChainActivity {
    fn new_transaction(&mut self, index: usize, rng: &mut impl Rng) {
        let wallet_id = self.wallets[index];
        let (tx_type, direction) = match rng.random_range(0..10) {
            0 => (TxType::Vote, TxDirection::Transferred),
            1 => (TxType::Revocation, TxDirection::Transferred),
            2 => (TxType::Ticket, TxDirection::Transferred),
            3 | 4 => (TxType::Regular, TxDirection::Sent),
            _ => (TxType::Regular, TxDirection::Received),
        };
        let amount = rng.random_range(1..5 * ATOMS_PER_COIN);
        let vote_reward = if tx_type == TxType::Vote {
            rng.random_range(1_000_000..20_000_000)
        } else {
            0
        };
        match direction {
            TxDirection::Received => self.balances[index] += amount,
            TxDirection::Sent => self.balances[index] -= amount.min(self.balances[index]),
            TxDirection::Transferred => self.balances[index] += vote_reward,
        }
        if let Err(e) = self.engine.set_balance(wallet_id, self.balances[index]) {
            tracing::warn!(wallet_id, error = %e, "Failed to update simulated balance");
        }

        let hash = Uuid::new_v4().simple().to_string();
        self.pending.push((index, hash.clone()));
        self.engine.emit_transaction(Transaction {
            wallet_id,
            hash,
            tx_type,
            direction,
            amount,
            fee: if direction == TxDirection::Sent { 2_530 } else { 0 },
            vote_reward,
            block_height: -1,
            timestamp: OffsetDateTime::now_utc().unix_timestamp(),
        });
    }

    /// Attach a block to one wallet and confirm what was pending for it.
    fn new_block(&mut self, index: usize) {
        let wallet_id = self.wallets[index];
        self.heights[index] += 1;
        let height = self.heights[index];

        self.engine.emit_block_attached(wallet_id, height);
        let (confirmed, pending): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|(i, _)| *i == index);
        self.pending = pending;
        for (_, hash) in confirmed {
            self.engine.emit_transaction_confirmed(wallet_id, &hash, height);
        }
    }
}

impl Activity for ChainActivity {
    fn step(&mut self, rng: &mut impl Rng) {
        if self.wallets.is_empty() {
            return;
        }
        let index = rng.random_range(0..self.wallets.len());
        match rng.random_range(0..20) {
            0 => {
                self.engine.emit_sync_started(false);
                self.engine.emit_sync_completed();
            }
            1 => self.engine.emit_sync_canceled(true),
            2..=9 => self.new_transaction(index, rng),
            _ => self.new_block(index),
        }
    }
}

/// Mixer runs, proposal updates and swap order syncs.
struct ServiceActivity {
    engine: Arc<InMemoryEngine>,
    wallets: Vec<WalletId>,
    mixer_running: bool,
}

impl Activity for ServiceActivity {
    fn step(&mut self, rng: &mut impl Rng) {
        match rng.random_range(0..3) {
            0 => {
                self.mixer_running = !self.mixer_running;
                for &wallet_id in &self.wallets {
                    self.engine.set_mixer_active(wallet_id, self.mixer_running);
                }
                self.engine.emit_mixer_status(if self.mixer_running {
                    MixerRunStatus::Started
                } else {
                    MixerRunStatus::Ended
                });
            }
            1 => {
                let name = PROPOSAL_NAMES[rng.random_range(0..PROPOSAL_NAMES.len())];
                let status = match rng.random_range(0..3) {
                    0 => ProposalStatus::NewProposal,
                    1 => ProposalStatus::VoteStarted,
                    _ => ProposalStatus::VoteFinished,
                };
                self.engine.emit_proposal_status(name, status);
                self.engine.emit_proposal_status(name, ProposalStatus::Synced);
            }
            _ => {
                self.engine.emit_order_status(OrderSyncStatus::Started);
                if rng.random_bool(0.2) {
                    self.engine.emit_order_status(OrderSyncStatus::Failed);
                    return;
                }
                self.engine.push_order(Order {
                    uuid: Uuid::new_v4(),
                    exchange: "changenow".to_owned(),
                    status: OrderStatus::Completed,
                    created_at: OffsetDateTime::now_utc().unix_timestamp(),
                });
                self.engine.emit_order_status(OrderSyncStatus::Synced);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wbridge_sdk::WalletQueries;

    #[test]
    fn test_seed_wallets() {
        let engine = InMemoryEngine::new();
        let ids = seed_wallets(&engine, 3);
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(engine.opened_wallets_count(), 3);
        assert_eq!(engine.wallet(3).unwrap().asset, Asset::Btc);
        assert_eq!(engine.proposals().unwrap().len(), PROPOSAL_NAMES.len());
    }

    #[test]
    fn test_block_confirms_pending_transactions() {
        let engine = Arc::new(InMemoryEngine::new());
        let wallets = seed_wallets(&engine, 1);
        let mut chain = ChainActivity {
            engine: Arc::clone(&engine),
            wallets,
            heights: vec![10],
            balances: vec![0],
            pending: Vec::new(),
        };
        let mut rng = rand::rng();
        chain.new_transaction(0, &mut rng);
        chain.new_block(0);

        assert!(chain.pending.is_empty());
        let txs = engine.transactions(1, true).unwrap();
        assert_eq!(txs[0].block_height, 11);
    }
}
