use crate::events::NotificationDomain;
use compact_str::CompactString;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, error, trace};
use wbridge_sdk::engine::{
    AccountMixerNotificationListener, OrderNotificationListener, ProposalNotificationListener,
    SyncProgressListener, TxAndBlockNotificationListener,
};
use wbridge_sdk::objects::{
    MixerRunStatus, Order, OrderSyncStatus, Proposal, ProposalStatus, Transaction, WalletId,
    WalletInfo,
};
use wbridge_sdk::{EngineError, NotificationEngine, WalletQueries};

/// How often a name was added to and removed from one domain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistrationCounts {
    pub added: u64,
    /// Counts every remove call, including ones for unknown names.
    pub removed: u64,
}

type ListenerMap<L> = HashMap<CompactString, Arc<L>>;

#[derive(Default)]
struct Listeners {
    sync_progress: ListenerMap<dyn SyncProgressListener>,
    tx_and_block: ListenerMap<dyn TxAndBlockNotificationListener>,
    account_mixer: ListenerMap<dyn AccountMixerNotificationListener>,
    proposal: ListenerMap<dyn ProposalNotificationListener>,
    order: ListenerMap<dyn OrderNotificationListener>,
    counts: HashMap<(NotificationDomain, CompactString), RegistrationCounts>,
}

impl Listeners {
    fn len(&self, domain: NotificationDomain) -> usize {
        match domain {
            NotificationDomain::SyncProgress => self.sync_progress.len(),
            NotificationDomain::TxAndBlock => self.tx_and_block.len(),
            NotificationDomain::AccountMixer => self.account_mixer.len(),
            NotificationDomain::Proposal => self.proposal.len(),
            NotificationDomain::Order => self.order.len(),
        }
    }

    fn contains(&self, domain: NotificationDomain, name: &str) -> bool {
        match domain {
            NotificationDomain::SyncProgress => self.sync_progress.contains_key(name),
            NotificationDomain::TxAndBlock => self.tx_and_block.contains_key(name),
            NotificationDomain::AccountMixer => self.account_mixer.contains_key(name),
            NotificationDomain::Proposal => self.proposal.contains_key(name),
            NotificationDomain::Order => self.order.contains_key(name),
        }
    }

    fn counts_mut(&mut self, domain: NotificationDomain, name: &str) -> &mut RegistrationCounts {
        self.counts
            .entry((domain, CompactString::from(name)))
            .or_default()
    }
}

#[derive(Default)]
struct Fixtures {
    wallets: BTreeMap<WalletId, WalletInfo>,
    transactions: HashMap<WalletId, Vec<Transaction>>,
    mixer_active: HashSet<WalletId>,
    proposals: Vec<Proposal>,
    orders: Vec<Order>,
}

/// In-process engine that delivers events to registered listeners.
///
/// Every `emit_*` method calls the listeners on the calling thread, outside
/// the engine lock, exactly like the real engine calls them from its worker
/// threads. Since bridge listeners block while their channel is full, emit
/// from a plain thread or `spawn_blocking`, never from an async task.
pub struct InMemoryEngine {
    listeners: Mutex<Listeners>,
    fixtures: Mutex<Fixtures>,
    reject_registrations: AtomicBool,
    remove_delay: Mutex<Option<Duration>>,
}

impl Default for InMemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryEngine {
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(Listeners::default()),
            fixtures: Mutex::new(Fixtures::default()),
            reject_registrations: AtomicBool::new(false),
            remove_delay: Mutex::new(None),
        }
    }

    // -- Control --------------------------------------------------------

    /// Make every following `add_*` call fail with [`EngineError::Rejected`].
    pub fn reject_registrations(&self, reject: bool) {
        self.reject_registrations.store(reject, Ordering::Release);
    }

    /// Make every `remove_*` call sleep before taking effect.
    pub fn set_remove_delay(&self, delay: Option<Duration>) {
        *lock(&self.remove_delay) = delay;
    }

    pub fn listener_count(&self, domain: NotificationDomain) -> usize {
        lock(&self.listeners).len(domain)
    }

    pub fn is_listening(&self, domain: NotificationDomain, name: &str) -> bool {
        lock(&self.listeners).contains(domain, name)
    }

    pub fn registration_counts(&self, domain: NotificationDomain, name: &str) -> RegistrationCounts {
        lock(&self.listeners)
            .counts
            .get(&(domain, CompactString::from(name)))
            .copied()
            .unwrap_or_default()
    }

    // -- Fixtures -------------------------------------------------------

    pub fn add_wallet(&self, wallet: WalletInfo) {
        lock(&self.fixtures).wallets.insert(wallet.id, wallet);
    }

    pub fn set_balance(&self, wallet_id: WalletId, balance: i64) -> Result<(), EngineError> {
        let mut fixtures = lock(&self.fixtures);
        let wallet = fixtures
            .wallets
            .get_mut(&wallet_id)
            .ok_or(EngineError::UnknownWallet(wallet_id))?;
        wallet.balance = balance;
        Ok(())
    }

    pub fn set_mixer_active(&self, wallet_id: WalletId, active: bool) {
        let mut fixtures = lock(&self.fixtures);
        if active {
            fixtures.mixer_active.insert(wallet_id);
        } else {
            fixtures.mixer_active.remove(&wallet_id);
        }
    }

    pub fn set_proposals(&self, proposals: Vec<Proposal>) {
        lock(&self.fixtures).proposals = proposals;
    }

    pub fn push_order(&self, order: Order) {
        lock(&self.fixtures).orders.push(order);
    }

    // -- Event emission -------------------------------------------------

    pub fn emit_sync_started(&self, was_restarted: bool) {
        for listener in self.snapshot(|l| &l.sync_progress) {
            listener.on_sync_started(was_restarted);
        }
    }

    pub fn emit_sync_canceled(&self, will_restart: bool) {
        for listener in self.snapshot(|l| &l.sync_progress) {
            listener.on_sync_canceled(will_restart);
        }
    }

    pub fn emit_sync_ended_with_error(&self, error: &str) {
        for listener in self.snapshot(|l| &l.sync_progress) {
            listener.on_sync_ended_with_error(error);
        }
    }

    pub fn emit_sync_completed(&self) {
        for listener in self.snapshot(|l| &l.sync_progress) {
            listener.on_sync_completed();
        }
    }

    /// Store `transaction` and announce it to tx listeners.
    pub fn emit_transaction(&self, transaction: Transaction) {
        let payload = match transaction.to_json() {
            Ok(payload) => payload,
            Err(e) => {
                error!(error = %e, hash = %transaction.hash, "Failed to encode transaction");
                return;
            }
        };
        lock(&self.fixtures)
            .transactions
            .entry(transaction.wallet_id)
            .or_default()
            .push(transaction);
        self.emit_raw_transaction(&payload);
    }

    /// Announce a transaction payload as-is, without storing anything.
    pub fn emit_raw_transaction(&self, payload: &str) {
        for listener in self.snapshot(|l| &l.tx_and_block) {
            listener.on_transaction(payload);
        }
    }

    pub fn emit_block_attached(&self, wallet_id: WalletId, block_height: i32) {
        for listener in self.snapshot(|l| &l.tx_and_block) {
            listener.on_block_attached(wallet_id, block_height);
        }
    }

    /// Mark a stored transaction as mined and announce it.
    pub fn emit_transaction_confirmed(&self, wallet_id: WalletId, hash: &str, block_height: i32) {
        {
            let mut fixtures = lock(&self.fixtures);
            if let Some(tx) = fixtures
                .transactions
                .get_mut(&wallet_id)
                .and_then(|txs| txs.iter_mut().find(|tx| tx.hash == hash))
            {
                tx.block_height = block_height;
            }
        }
        for listener in self.snapshot(|l| &l.tx_and_block) {
            listener.on_transaction_confirmed(wallet_id, hash, block_height);
        }
    }

    pub fn emit_mixer_status(&self, status: MixerRunStatus) {
        for listener in self.snapshot(|l| &l.account_mixer) {
            listener.on_mixer_run_status_changed(status);
        }
    }

    pub fn emit_proposal_status(&self, proposal_name: &str, status: ProposalStatus) {
        for listener in self.snapshot(|l| &l.proposal) {
            listener.on_proposal_sync_status_changed(proposal_name, status);
        }
    }

    pub fn emit_order_status(&self, status: OrderSyncStatus) {
        for listener in self.snapshot(|l| &l.order) {
            listener.on_order_sync_status_changed(status);
        }
    }

    // -- Private helpers ------------------------------------------------

    /// Clone out the listeners of one domain so callbacks run unlocked.
    fn snapshot<L: ?Sized>(&self, select: impl FnOnce(&Listeners) -> &ListenerMap<L>) -> Vec<Arc<L>> {
        let listeners = lock(&self.listeners);
        let map = select(&*listeners);
        trace!(listeners = map.len(), "Emitting engine event");
        map.values().cloned().collect()
    }

    fn add<L: ?Sized>(
        &self,
        domain: NotificationDomain,
        select: impl FnOnce(&mut Listeners) -> &mut ListenerMap<L>,
        listener: Arc<L>,
        name: &str,
    ) -> Result<(), EngineError> {
        if self.reject_registrations.load(Ordering::Acquire) {
            return Err(EngineError::Rejected(format!(
                "{domain} listener registration disabled"
            )));
        }

        let mut listeners = lock(&self.listeners);
        let map = select(&mut *listeners);
        if map.contains_key(name) {
            return Err(EngineError::ListenerExists(name.to_owned()));
        }
        map.insert(CompactString::from(name), listener);
        listeners.counts_mut(domain, name).added += 1;
        debug!(%domain, listener = name, "Engine listener added");
        Ok(())
    }

    fn remove<L: ?Sized>(
        &self,
        domain: NotificationDomain,
        select: impl FnOnce(&mut Listeners) -> &mut ListenerMap<L>,
        name: &str,
    ) {
        let delay = *lock(&self.remove_delay);
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }

        let mut listeners = lock(&self.listeners);
        let removed = select(&mut *listeners).remove(name).is_some();
        listeners.counts_mut(domain, name).removed += 1;
        debug!(%domain, listener = name, removed, "Engine listener remove requested");
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl NotificationEngine for InMemoryEngine {
    fn add_sync_progress_listener(
        &self,
        listener: Arc<dyn SyncProgressListener>,
        name: &str,
    ) -> Result<(), EngineError> {
        self.add(
            NotificationDomain::SyncProgress,
            |l| &mut l.sync_progress,
            listener,
            name,
        )
    }

    fn remove_sync_progress_listener(&self, name: &str) {
        self.remove(NotificationDomain::SyncProgress, |l| &mut l.sync_progress, name);
    }

    fn add_tx_and_block_listener(
        &self,
        listener: Arc<dyn TxAndBlockNotificationListener>,
        name: &str,
    ) -> Result<(), EngineError> {
        self.add(
            NotificationDomain::TxAndBlock,
            |l| &mut l.tx_and_block,
            listener,
            name,
        )
    }

    fn remove_tx_and_block_listener(&self, name: &str) {
        self.remove(NotificationDomain::TxAndBlock, |l| &mut l.tx_and_block, name);
    }

    fn add_account_mixer_listener(
        &self,
        listener: Arc<dyn AccountMixerNotificationListener>,
        name: &str,
    ) -> Result<(), EngineError> {
        self.add(
            NotificationDomain::AccountMixer,
            |l| &mut l.account_mixer,
            listener,
            name,
        )
    }

    fn remove_account_mixer_listener(&self, name: &str) {
        self.remove(NotificationDomain::AccountMixer, |l| &mut l.account_mixer, name);
    }

    fn add_proposal_listener(
        &self,
        listener: Arc<dyn ProposalNotificationListener>,
        name: &str,
    ) -> Result<(), EngineError> {
        self.add(NotificationDomain::Proposal, |l| &mut l.proposal, listener, name)
    }

    fn remove_proposal_listener(&self, name: &str) {
        self.remove(NotificationDomain::Proposal, |l| &mut l.proposal, name);
    }

    fn add_order_listener(
        &self,
        listener: Arc<dyn OrderNotificationListener>,
        name: &str,
    ) -> Result<(), EngineError> {
        self.add(NotificationDomain::Order, |l| &mut l.order, listener, name)
    }

    fn remove_order_listener(&self, name: &str) {
        self.remove(NotificationDomain::Order, |l| &mut l.order, name);
    }
}

impl WalletQueries for InMemoryEngine {
    fn wallet(&self, wallet_id: WalletId) -> Result<WalletInfo, EngineError> {
        lock(&self.fixtures)
            .wallets
            .get(&wallet_id)
            .cloned()
            .ok_or(EngineError::UnknownWallet(wallet_id))
    }

    fn opened_wallets_count(&self) -> usize {
        lock(&self.fixtures).wallets.len()
    }

    fn transactions(
        &self,
        wallet_id: WalletId,
        newest_first: bool,
    ) -> Result<Vec<Transaction>, EngineError> {
        let fixtures = lock(&self.fixtures);
        if !fixtures.wallets.contains_key(&wallet_id) {
            return Err(EngineError::UnknownWallet(wallet_id));
        }
        let mut transactions = fixtures
            .transactions
            .get(&wallet_id)
            .cloned()
            .unwrap_or_default();
        transactions.sort_by_key(|tx| tx.timestamp);
        if newest_first {
            transactions.reverse();
        }
        Ok(transactions)
    }

    fn is_account_mixer_active(&self, wallet_id: WalletId) -> Result<bool, EngineError> {
        let fixtures = lock(&self.fixtures);
        if !fixtures.wallets.contains_key(&wallet_id) {
            return Err(EngineError::UnknownWallet(wallet_id));
        }
        Ok(fixtures.mixer_active.contains(&wallet_id))
    }

    fn proposals(&self) -> Result<Vec<Proposal>, EngineError> {
        Ok(lock(&self.fixtures).proposals.clone())
    }

    fn orders(&self, offset: usize, limit: usize) -> Result<Vec<Order>, EngineError> {
        let mut orders = lock(&self.fixtures).orders.clone();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders.into_iter().skip(offset).take(limit).collect())
    }
}
