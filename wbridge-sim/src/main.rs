//! Wallet notification bridge simulator
//!
//! Drives the bridge with a simulated engine: engine threads emit wallet
//! events, pages are navigated on a timer, and a render loop redraws on
//! demand.

mod config;
mod shutdown;
mod simulator;

use clap::Parser;
use config::ConfigLoader;
use rand::Rng;
use shutdown::{shutdown_signal, spawn_config_reload_handler};
use simulator::{Simulator, seed_wallets};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use wbridge_core::config::{ConfigStore, NotificationPrefs};
use wbridge_core::engine::InMemoryEngine;
use wbridge_core::events::NotificationDomain;
use wbridge_core::lifecycle::{
    NotificationHub, Page, PageNavigator, SharedSession, WalletSessionState, WalletTab,
};
use wbridge_core::notifications::{DesktopNotifier, TracingNotifier};
use wbridge_core::pages::{OrderHistoryPage, ProposalsPage, WalletMainPage};
use wbridge_core::redraw::RedrawHandle;
use wbridge_sdk::WalletQueries;
use wbridge_sdk::objects::WalletId;

/// Wallet notification bridge simulator
#[derive(Parser, Debug)]
#[command(name = "wbridge-sim")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, env = "WBRIDGE_CONFIG", default_value = "./wbridge.toml")]
    config: PathBuf,

    /// Stop after this many seconds instead of waiting for a signal
    #[arg(short, long)]
    duration: Option<u64>,

    /// Override the number of simulated wallets
    #[arg(short, long)]
    wallets: Option<usize>,
}

/// Top-level screens the simulator cycles through.
#[derive(Debug, Clone, Copy)]
enum Screen {
    Wallet(WalletId),
    OrderHistory,
    Governance,
}

/// Builds pages on behalf of the navigation script.
struct PageFactory {
    engine: Arc<InMemoryEngine>,
    prefs: ConfigStore<NotificationPrefs>,
    notifier: Arc<dyn DesktopNotifier>,
    session: SharedSession,
}

impl PageFactory {
    fn build(&self, screen: Screen) -> Box<dyn Page> {
        match screen {
            Screen::Wallet(wallet_id) => {
                self.pick_tab(wallet_id);
                Box::new(WalletMainPage::new(
                    wallet_id,
                    self.engine.clone(),
                    self.prefs.clone(),
                    Arc::clone(&self.notifier),
                    Arc::clone(&self.session),
                ))
            }
            Screen::OrderHistory => Box::new(OrderHistoryPage::new(self.engine.clone())),
            Screen::Governance => {
                Box::new(ProposalsPage::new(self.engine.clone(), self.prefs.clone()))
            }
        }
    }

    /// Pretend the user picked a tab during the previous visit.
    fn pick_tab(&self, wallet_id: WalletId) {
        let wallet = match self.engine.wallet(wallet_id) {
            Ok(wallet) => wallet,
            Err(e) => {
                tracing::warn!("Cannot pick a tab for wallet {}: {}", wallet_id, e);
                return;
            }
        };
        let tabs = WalletTab::available_for(&wallet);
        let tab = tabs[rand::rng().random_range(0..tabs.len())];
        if let Ok(mut session) = self.session.lock() {
            session.select_tab(wallet_id, tab);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    init_tracing();

    // Parse command line arguments
    let args = Args::parse();

    tracing::info!("Starting wbridge-sim v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_loader = Arc::new(ConfigLoader::new(&args.config, args.wallets));
    let loaded_config = config_loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;
    tracing::info!("Configuration loaded from {:?}", args.config);

    let prefs_store = ConfigStore::new(loaded_config.notifications);
    let simulation = loaded_config.simulation;

    // Simulated engine
    let engine = Arc::new(InMemoryEngine::new());
    let wallet_ids = seed_wallets(&engine, simulation.wallets);
    tracing::info!("Opened {} simulated wallets", wallet_ids.len());

    let redraw = RedrawHandle::new();
    let hub = NotificationHub::new(engine.clone(), loaded_config.channels, redraw.clone());
    let mut navigator = PageNavigator::new(hub.clone());
    let factory = PageFactory {
        engine: Arc::clone(&engine),
        prefs: prefs_store.clone(),
        notifier: Arc::new(TracingNotifier),
        session: Arc::new(Mutex::new(WalletSessionState::default())),
    };

    let simulator = Simulator::start(
        Arc::clone(&engine),
        wallet_ids.clone(),
        Duration::from_millis(simulation.event_interval_ms),
    )?;

    // Spawn config reload handler (listens for SIGHUP)
    let mut prefs_watcher = prefs_store.subscribe();
    let mut watching_prefs = true;
    let reload_notify = spawn_config_reload_handler(config_loader, prefs_store.clone());

    let mut screens = wallet_ids
        .iter()
        .map(|&id| Screen::Wallet(id))
        .chain([Screen::OrderHistory, Screen::Governance])
        .collect::<Vec<_>>()
        .into_iter()
        .cycle();

    let mut dwell = tokio::time::interval(Duration::from_secs(simulation.page_dwell_secs.max(1)));
    let deadline = async {
        match args.duration {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    let mut frames: u64 = 0;
    loop {
        tokio::select! {
            result = &mut shutdown => {
                if let Err(e) = result {
                    tracing::error!("Failed to install signal handlers: {}", e);
                }
                break;
            }
            _ = &mut deadline => {
                tracing::info!("Simulation duration elapsed");
                break;
            }
            _ = dwell.tick() => {
                if let Some(screen) = screens.next() {
                    tracing::debug!(?screen, "Navigating");
                    navigator.display(factory.build(screen)).await;
                }
            }
            changed = prefs_watcher.changed(), if watching_prefs => match changed {
                Ok(version) => {
                    let prefs = prefs_store.snapshot().await;
                    tracing::info!(version, ?prefs, "Notification preferences reloaded");
                    redraw.request();
                }
                Err(_) => watching_prefs = false,
            },
            _ = redraw.wait() => {
                frames += 1;
                tracing::debug!(frame = frames, page = ?navigator.current_id(), "Render");
            }
        }
    }

    // Stop producing, then detach so that blocked engine threads drain.
    simulator.request_stop();
    navigator.close_current().await;
    tokio::task::spawn_blocking(move || simulator.join()).await?;
    reload_notify.notify_one();

    for domain in NotificationDomain::ALL {
        let stats = hub.registry(domain).stats();
        tracing::info!(
            %domain,
            registered = stats.registered,
            unregistered = stats.unregistered,
            channels_closed = stats.channels_closed,
            "Registry stats"
        );
    }
    tracing::info!(
        frames,
        redraw_requests = redraw.requests(),
        "Simulation shutdown complete"
    );

    Ok(())
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,wbridge_core=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
