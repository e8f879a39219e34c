//! Scan orchestration: bootstrap, refresh cycles, auto-refresh timer,
//! blacklist and settings plumbing
//!
//! The `Scanner` owns all mutable scan state. Locks are held only for
//! snapshot/swap; nothing awaits while holding one. A refresh is
//! single-flight: a request arriving while one runs is rejected with a
//! status line, not queued.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::{BlacklistStore, ScanMode, ScanSettings, SettingsStore};
use crate::exchanges::registry::ExchangeRegistry;

use super::aggregator::collect_batch;
use super::popularity::PopularitySource;
use super::render::RenderSink;
use super::routes::RoutePolicy;
use super::saved_top::SavedTopCache;
use super::spread::{apply_filters, finalize_rows, FilterOptions, TopN};
use super::universe::{build_universe, UniverseState, SCAN_BATCH_SIZE};

// ==================== Settings mapping ====================

/// Map persisted settings onto the filter pipeline's options.
pub fn filter_options(settings: &ScanSettings) -> FilterOptions {
    FilterOptions {
        min_spread: settings.min_spread_value(),
        sort_by_spread: settings.sort_by_spread,
        top_n: TopN::parse(&settings.top_n),
        verified_only: settings.verified_only,
        good_volume_only: settings.good_volume_only,
        min_volume_usd: settings.min_volume_usd(),
    }
}

pub fn route_policy(settings: &ScanSettings) -> RoutePolicy {
    if settings.strict_routes {
        RoutePolicy::Strict
    } else {
        RoutePolicy::Lenient
    }
}

/// Split a manual coin entry: commas, trimmed, upper-cased, deduplicated,
/// blacklisted coins skipped.
pub fn parse_manual_coins(raw: &str, blacklist: &HashSet<String>) -> Vec<Arc<str>> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut coins: Vec<Arc<str>> = Vec::new();
    for piece in raw.split(',') {
        let coin = piece.trim().to_uppercase();
        if coin.is_empty() || blacklist.contains(&coin) || !seen.insert(coin.clone()) {
            continue;
        }
        coins.push(Arc::from(coin.as_str()));
    }
    coins
}

// ==================== Scanner ====================

pub struct Scanner {
    registry: Arc<ExchangeRegistry>,
    popularity: Arc<dyn PopularitySource>,
    sink: Arc<dyn RenderSink>,
    settings_store: SettingsStore,
    blacklist_store: BlacklistStore,
    settings: RwLock<ScanSettings>,
    blacklist: RwLock<HashSet<String>>,
    universe: Mutex<UniverseState>,
    saved: Mutex<SavedTopCache>,
    is_refreshing: AtomicBool,
    bootstrapping: AtomicBool,
    universe_ready: AtomicBool,
    auto: Mutex<Option<CancellationToken>>,
    tracker: TaskTracker,
}

impl Scanner {
    /// Build a scanner, loading settings and blacklist snapshots.
    pub fn new(
        registry: Arc<ExchangeRegistry>,
        popularity: Arc<dyn PopularitySource>,
        sink: Arc<dyn RenderSink>,
        settings_store: SettingsStore,
        blacklist_store: BlacklistStore,
    ) -> Arc<Self> {
        let settings = settings_store.load();
        let blacklist = blacklist_store.load();
        Arc::new(Self {
            registry,
            popularity,
            sink,
            settings_store,
            blacklist_store,
            settings: RwLock::new(settings),
            blacklist: RwLock::new(blacklist),
            universe: Mutex::new(UniverseState::default()),
            saved: Mutex::new(SavedTopCache::new()),
            is_refreshing: AtomicBool::new(false),
            bootstrapping: AtomicBool::new(false),
            universe_ready: AtomicBool::new(false),
            auto: Mutex::new(None),
            tracker: TaskTracker::new(),
        })
    }

    // ==================== Snapshots ====================

    pub fn settings(&self) -> ScanSettings {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn update_settings(&self, mut settings: ScanSettings) {
        settings.sanitize();
        *self
            .settings
            .write()
            .unwrap_or_else(PoisonError::into_inner) = settings;
    }

    pub fn blacklist_snapshot(&self) -> HashSet<String> {
        self.blacklist
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_universe_ready(&self) -> bool {
        self.universe_ready.load(Ordering::SeqCst)
    }

    // ==================== Bootstrap ====================

    /// Build the global coin universe. Refreshes are rejected while this
    /// runs; an empty result leaves AUTO mode rejected until rebuilt.
    pub async fn bootstrap(&self) {
        self.bootstrapping.store(true, Ordering::SeqCst);
        self.sink.status(&format!(
            "Clients ready: {}/{}",
            self.registry.len(),
            crate::exchanges::factory::SUPPORTED_VENUES.len()
        ));

        let blacklist = self.blacklist_snapshot();
        let coins = build_universe(&self.registry, self.popularity.as_ref(), &blacklist).await;
        if coins.is_empty() {
            self.universe_ready.store(false, Ordering::SeqCst);
            warn!("universe construction produced no coins");
            self.sink.status("Failed to build the coin universe");
        } else {
            let count = coins.len();
            *self
                .universe
                .lock()
                .unwrap_or_else(PoisonError::into_inner) = UniverseState::new(coins);
            self.universe_ready.store(true, Ordering::SeqCst);
            info!(coins = count, "universe ready");
            self.sink.status(&format!("Universe ready: {} coins", count));
        }
        self.bootstrapping.store(false, Ordering::SeqCst);
    }

    // ==================== Refresh ====================

    /// Run one refresh cycle unless bootstrap or another refresh holds the
    /// flag.
    pub async fn refresh_once(self: &Arc<Self>) {
        if self.bootstrapping.load(Ordering::SeqCst) {
            self.sink.status("Universe bootstrap in progress");
            return;
        }
        if self
            .is_refreshing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            self.sink.status("Refresh already in progress");
            return;
        }
        self.run_refresh().await;
        self.is_refreshing.store(false, Ordering::SeqCst);
    }

    async fn run_refresh(self: &Arc<Self>) {
        let cycle_id = Uuid::new_v4();
        let settings = self.settings();
        let blacklist = self.blacklist_snapshot();

        let batch: Vec<Arc<str>> = match settings.scan_mode {
            ScanMode::Auto => {
                if !self.is_universe_ready() {
                    self.sink.status("Waiting for the global coin universe...");
                    return;
                }
                let mut universe = self
                    .universe
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                let previous_cycle = universe.cycle();
                let (batch, next) = universe.advance(SCAN_BATCH_SIZE, &blacklist);
                if next.cycle() > previous_cycle {
                    info!(cycle = next.cycle(), "scan cycle complete");
                }
                *universe = next;
                batch
            }
            ScanMode::Manual => parse_manual_coins(&settings.coins, &blacklist),
        };
        if batch.is_empty() {
            self.sink.status("Coin list is empty.");
            return;
        }

        let exchanges = self.registry.select(&settings.selected_exchanges);
        if exchanges.is_empty() {
            self.sink.status("Select at least one exchange.");
            return;
        }

        info!(
            cycle_id = %cycle_id,
            coins = batch.len(),
            exchanges = exchanges.len(),
            mode = ?settings.scan_mode,
            "refresh started"
        );

        let mut rows = collect_batch(&exchanges, &batch, &settings.preferred_quote()).await;
        let selected_ids: Vec<Arc<str>> = exchanges.iter().map(|ex| ex.id().clone()).collect();
        finalize_rows(&mut rows, &selected_ids, route_policy(&settings));
        let items = apply_filters(&batch, &rows, &filter_options(&settings), &blacklist);

        self.saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .update_from_items(&items, &blacklist);

        self.sink.render_table(&exchanges, &items);
        self.render_saved_view();
        self.sink.status(&format!(
            "Updated: {} | Rows: {}",
            Utc::now().format("%Y-%m-%d %H:%M:%S"),
            items.len()
        ));
        info!(cycle_id = %cycle_id, rows = items.len(), "refresh finished");

        self.spawn_saved_refresh();
    }

    // ==================== Saved top ====================

    fn render_saved_view(&self) {
        let items = self
            .saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .displayed();
        self.sink.render_saved(&items);
    }

    fn spawn_saved_refresh(self: &Arc<Self>) {
        let scanner = self.clone();
        self.tracker.spawn(async move {
            scanner.refresh_saved().await;
        });
    }

    /// Re-price every pool coin independently of the active batch, dropping
    /// entries that no longer produce a spread.
    async fn refresh_saved(&self) {
        let pool = self
            .saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pool_coins();
        if pool.is_empty() {
            return;
        }

        let settings = self.settings();
        let exchanges = self.registry.select(&settings.selected_exchanges);
        if exchanges.is_empty() {
            return;
        }

        let mut rows = collect_batch(&exchanges, &pool, &settings.preferred_quote()).await;
        let selected_ids: Vec<Arc<str>> = exchanges.iter().map(|ex| ex.id().clone()).collect();
        finalize_rows(&mut rows, &selected_ids, route_policy(&settings));

        self.saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .apply_refreshed(&pool, &rows);
        self.render_saved_view();
    }

    /// Drop a coin from the saved top for the rest of the session.
    pub fn exclude_saved_coin(&self, coin: &str) {
        self.saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .exclude(coin);
        info!(coin = %coin.trim().to_uppercase(), "saved coin excluded");
        self.render_saved_view();
    }

    // ==================== Auto refresh ====================

    /// Start the repeating refresh timer: an immediate refresh, then one per
    /// interval. Any previous timer is stopped first. Rejected with a status
    /// line when the configured interval is not an integer of at least 5.
    pub fn start_auto_refresh(self: &Arc<Self>) {
        let Some(interval_secs) = self.settings().interval_secs() else {
            error!("auto refresh rejected, interval must be an integer >= 5");
            self.sink.status("Interval must be an integer >= 5");
            return;
        };
        self.stop_auto_refresh();

        let token = CancellationToken::new();
        *self.auto.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.clone());
        info!(interval_secs, "auto refresh enabled");

        let scanner = self.clone();
        self.tracker.spawn(async move {
            loop {
                scanner.refresh_once().await;
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(Duration::from_secs(interval_secs)) => {}
                }
            }
        });
    }

    pub fn stop_auto_refresh(&self) {
        let token = self
            .auto
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(token) = token {
            token.cancel();
            info!("auto refresh disabled");
        }
    }

    // ==================== Blacklist ====================

    /// Add coins to the blacklist, purge them from the saved top and
    /// persist. Returns how many codes were newly added.
    pub fn add_to_blacklist(&self, entry: &str) -> usize {
        let coins = parse_manual_coins(entry, &HashSet::new());
        if coins.is_empty() {
            return 0;
        }

        let added = {
            let mut blacklist = self
                .blacklist
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            coins
                .iter()
                .filter(|coin| blacklist.insert(coin.to_string()))
                .count()
        };
        {
            let mut saved = self.saved.lock().unwrap_or_else(PoisonError::into_inner);
            for coin in &coins {
                saved.exclude(coin);
            }
        }
        self.persist_blacklist();
        info!(added, "blacklist extended");
        self.sink.status(&format!("Blacklisted: {}", added));
        self.render_saved_view();
        added
    }

    /// Remove coins from the blacklist and persist. Returns how many codes
    /// were actually removed.
    pub fn remove_from_blacklist(&self, entry: &str) -> usize {
        let coins = parse_manual_coins(entry, &HashSet::new());
        if coins.is_empty() {
            return 0;
        }

        let removed = {
            let mut blacklist = self
                .blacklist
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            coins
                .iter()
                .filter(|coin| blacklist.remove(coin.as_ref()))
                .count()
        };
        self.persist_blacklist();
        info!(removed, "blacklist reduced");
        self.sink.status(&format!("Removed from blacklist: {}", removed));
        removed
    }

    // ==================== Persistence & shutdown ====================

    pub fn persist_settings(&self) {
        let settings = self.settings();
        if let Err(err) = self.settings_store.save(&settings) {
            warn!(error = %err, "failed to persist settings");
        }
    }

    fn persist_blacklist(&self) {
        let blacklist = self.blacklist_snapshot();
        if let Err(err) = self.blacklist_store.save(&blacklist) {
            warn!(error = %err, "failed to persist blacklist");
        }
    }

    /// Stop the timer, drain background tasks, persist state.
    pub async fn shutdown(&self) {
        self.stop_auto_refresh();
        self.tracker.close();
        self.tracker.wait().await;
        self.persist_settings();
        self.persist_blacklist();
        info!("scanner shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::popularity::StaticRanking;
    use crate::core::render::RecordingSink;
    use crate::exchanges::factory::AnyClient;
    use crate::exchanges::registry::Exchange;
    use crate::exchanges::test_utils::MockExchange;
    use tempfile::TempDir;

    struct Harness {
        scanner: Arc<Scanner>,
        sink: Arc<RecordingSink>,
        _dir: TempDir,
    }

    fn harness(mocks: Vec<(&str, MockExchange)>) -> Harness {
        let registry = ExchangeRegistry::new(
            mocks
                .into_iter()
                .map(|(name, mock)| Arc::new(Exchange::new(name, name, AnyClient::Mock(mock))))
                .collect(),
        );
        let dir = TempDir::new().unwrap();
        let sink = Arc::new(RecordingSink::new());
        let scanner = Scanner::new(
            Arc::new(registry),
            Arc::new(StaticRanking(vec![])),
            sink.clone(),
            SettingsStore::new(dir.path().join("settings.json")),
            BlacklistStore::new(dir.path().join("blacklist.json")),
        );
        // Mock venue ids are not in the supported table, so bypass sanitize
        // for the selection here.
        Harness {
            scanner,
            sink,
            _dir: dir,
        }
    }

    fn two_btc_venues() -> Vec<(&'static str, MockExchange)> {
        vec![
            (
                "alpha",
                MockExchange::new("alpha").with_priced_market("BTC", "USDT", 100.0, 50_000.0),
            ),
            (
                "beta",
                MockExchange::new("beta").with_priced_market("BTC", "USDT", 110.0, 80_000.0),
            ),
        ]
    }

    fn select_all(scanner: &Arc<Scanner>, ids: &[&str]) {
        let mut settings = scanner.settings();
        settings.selected_exchanges = ids.iter().map(|s| s.to_string()).collect();
        *scanner
            .settings
            .write()
            .unwrap_or_else(PoisonError::into_inner) = settings;
    }

    #[test]
    fn test_parse_manual_coins() {
        let blacklist = HashSet::from(["FTT".to_string()]);
        let coins = parse_manual_coins(" btc , eth,BTC,, ftt ,sol", &blacklist);
        let names: Vec<&str> = coins.iter().map(|c| c.as_ref()).collect();
        assert_eq!(names, vec!["BTC", "ETH", "SOL"]);
    }

    #[test]
    fn test_settings_map_to_filters() {
        let mut settings = ScanSettings::default();
        settings.min_spread = "1.5".to_string();
        settings.top_n = "20".to_string();
        settings.good_volume_only = true;
        settings.min_volume_k = "10".to_string();
        let options = filter_options(&settings);
        assert!((options.min_spread - 1.5).abs() < 1e-9);
        assert_eq!(options.top_n, TopN::Limit(20));
        assert!(options.good_volume_only);
        assert_eq!(options.min_volume_usd, 10_000.0);

        assert_eq!(route_policy(&settings), RoutePolicy::Lenient);
        settings.strict_routes = true;
        assert_eq!(route_policy(&settings), RoutePolicy::Strict);
    }

    #[tokio::test]
    async fn test_bootstrap_reports_universe() {
        let h = harness(two_btc_venues());
        h.scanner.bootstrap().await;
        assert!(h.scanner.is_universe_ready());
        assert_eq!(
            h.sink.last_status().as_deref(),
            Some("Universe ready: 1 coins")
        );
    }

    #[tokio::test]
    async fn test_bootstrap_failure_blocks_auto_refresh() {
        let h = harness(vec![(
            "alpha",
            MockExchange::new("alpha").failing_markets(),
        )]);
        select_all(&h.scanner, &["alpha"]);
        h.scanner.bootstrap().await;
        assert!(!h.scanner.is_universe_ready());
        assert_eq!(
            h.sink.last_status().as_deref(),
            Some("Failed to build the coin universe")
        );

        h.scanner.refresh_once().await;
        assert_eq!(
            h.sink.last_status().as_deref(),
            Some("Waiting for the global coin universe...")
        );
    }

    #[tokio::test]
    async fn test_refresh_renders_spread_row() {
        let h = harness(two_btc_venues());
        select_all(&h.scanner, &["alpha", "beta"]);
        h.scanner.bootstrap().await;
        h.scanner.refresh_once().await;

        let table = h.sink.last_table().expect("table rendered");
        assert_eq!(table.len(), 1);
        let (coin, row) = &table[0];
        assert_eq!(coin.as_ref(), "BTC");
        assert!((row.spread.unwrap() - 10.0).abs() < 1e-9);
        assert_eq!(row.min_exchange.as_deref(), Some("alpha"));
        assert_eq!(row.max_exchange.as_deref(), Some("beta"));

        let saved = h.sink.last_saved().expect("saved rendered");
        assert_eq!(saved.len(), 1);
        assert!(h
            .sink
            .last_status()
            .unwrap()
            .starts_with("Updated: "));

        h.scanner.shutdown().await;
    }

    #[tokio::test]
    async fn test_manual_mode_scans_entered_coins() {
        let h = harness(two_btc_venues());
        select_all(&h.scanner, &["alpha", "beta"]);
        let mut settings = h.scanner.settings();
        settings.scan_mode = ScanMode::Manual;
        settings.coins = "btc, nope".to_string();
        settings.selected_exchanges = vec!["alpha".to_string(), "beta".to_string()];
        *h.scanner
            .settings
            .write()
            .unwrap_or_else(PoisonError::into_inner) = settings;

        h.scanner.refresh_once().await;
        let table = h.sink.last_table().expect("table rendered");
        assert_eq!(table.len(), 1);
        assert_eq!(table[0].0.as_ref(), "BTC");
        h.scanner.shutdown().await;
    }

    #[tokio::test]
    async fn test_empty_manual_list_aborts() {
        let h = harness(two_btc_venues());
        let mut settings = h.scanner.settings();
        settings.scan_mode = ScanMode::Manual;
        settings.coins = " , ".to_string();
        *h.scanner
            .settings
            .write()
            .unwrap_or_else(PoisonError::into_inner) = settings;

        h.scanner.refresh_once().await;
        assert_eq!(h.sink.last_status().as_deref(), Some("Coin list is empty."));
        assert!(h.sink.last_table().is_none());
    }

    #[tokio::test]
    async fn test_no_selected_exchanges_aborts() {
        let h = harness(two_btc_venues());
        h.scanner.bootstrap().await;
        select_all(&h.scanner, &[]);
        h.scanner.refresh_once().await;
        assert_eq!(
            h.sink.last_status().as_deref(),
            Some("Select at least one exchange.")
        );
    }

    #[tokio::test]
    async fn test_concurrent_refresh_is_rejected() {
        let h = harness(two_btc_venues());
        select_all(&h.scanner, &["alpha", "beta"]);
        h.scanner.bootstrap().await;

        let first = h.scanner.refresh_once();
        let second = h.scanner.refresh_once();
        tokio::join!(first, second);

        assert!(h
            .sink
            .statuses()
            .iter()
            .any(|s| s == "Refresh already in progress"));
        h.scanner.shutdown().await;
    }

    #[tokio::test]
    async fn test_blacklist_purges_saved_and_skips_next_scan() {
        let h = harness(two_btc_venues());
        select_all(&h.scanner, &["alpha", "beta"]);
        h.scanner.bootstrap().await;
        h.scanner.refresh_once().await;
        assert_eq!(h.sink.last_saved().unwrap().len(), 1);

        let added = h.scanner.add_to_blacklist("btc");
        assert_eq!(added, 1);
        assert!(h.sink.last_saved().unwrap().is_empty());

        h.scanner.refresh_once().await;
        // The only universe coin is blacklisted, so the batch is empty.
        assert_eq!(h.sink.last_status().as_deref(), Some("Coin list is empty."));

        let removed = h.scanner.remove_from_blacklist("btc");
        assert_eq!(removed, 1);
        h.scanner.shutdown().await;
    }

    #[tokio::test]
    async fn test_exclude_saved_coin_hides_it() {
        let h = harness(two_btc_venues());
        select_all(&h.scanner, &["alpha", "beta"]);
        h.scanner.bootstrap().await;
        h.scanner.refresh_once().await;
        assert_eq!(h.sink.last_saved().unwrap().len(), 1);

        h.scanner.exclude_saved_coin("btc");
        assert!(h.sink.last_saved().unwrap().is_empty());
        h.scanner.shutdown().await;
    }

    #[tokio::test]
    async fn test_auto_refresh_rejects_bad_interval() {
        let h = harness(two_btc_venues());
        let mut settings = h.scanner.settings();
        settings.interval = "3".to_string();
        *h.scanner
            .settings
            .write()
            .unwrap_or_else(PoisonError::into_inner) = settings;

        h.scanner.start_auto_refresh();
        assert_eq!(
            h.sink.last_status().as_deref(),
            Some("Interval must be an integer >= 5")
        );
    }

    #[tokio::test]
    async fn test_auto_refresh_runs_and_stops() {
        let h = harness(two_btc_venues());
        select_all(&h.scanner, &["alpha", "beta"]);
        h.scanner.bootstrap().await;

        h.scanner.start_auto_refresh();
        h.scanner.stop_auto_refresh();
        h.scanner.shutdown().await;
        // The timer task always runs its immediate refresh before it sees
        // the cancellation.
        assert!(h.sink.table_count() >= 1);
    }
}
