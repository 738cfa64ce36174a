//! Refresh cycles and the background tasks that run them
//!
//! [`RefreshController`] runs one poll-cache-render cycle for a single
//! [`Feature`]. [`RefreshHandle`] spawns one tokio task per enabled feature,
//! each waiting on its own ticker, and delivers rendered panels to the UI loop
//! over a channel.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::cache::{is_valid, CacheManager};
use crate::config::DashboardConfig;
use crate::data::{
    build_client, AlertsSource, ClockSource, FetchError, NetworkSource, NewsSource, SpeedTest,
    WeatherSource, DEFAULT_USER_AGENT,
};
use crate::feature::{Feature, FeatureKind};
use crate::scheduler::{Schedule, SharedClock};
use crate::view::Panel;

/// Where a cycle currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    CheckingCache,
    RenderingFromCache,
    Fetching,
    Transforming,
    Caching,
    Rendering,
    Failing,
    RenderingFallback,
}

/// How a finished cycle got its panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// A fresh cache entry was rendered; no request was made
    FromCache,
    /// New data was fetched, cached and rendered
    Fetched,
    /// The fallback panel was rendered; the cache was left alone
    Failed,
}

/// Per-feature state owned by its controller
#[derive(Debug, Clone)]
pub struct FeatureState<M> {
    /// When the model on screen was fetched (from the cache entry if it came from there)
    pub last_fetched_at: Option<DateTime<Utc>>,
    pub cached_payload: Option<M>,
    pub rendered: Option<Panel>,
}

impl<M> Default for FeatureState<M> {
    fn default() -> Self {
        Self {
            last_fetched_at: None,
            cached_payload: None,
            rendered: None,
        }
    }
}

/// Runs refresh cycles for one feature
pub struct RefreshController<F: Feature> {
    feature: F,
    cache: Option<CacheManager>,
    clock: SharedClock,
    state: FeatureState<F::Model>,
    cycle: CycleState,
}

impl<F: Feature> RefreshController<F> {
    /// Creates a controller; without a cache manager every cycle fetches
    pub fn new(feature: F, cache: Option<CacheManager>, clock: SharedClock) -> Self {
        Self {
            feature,
            cache,
            clock,
            state: FeatureState::default(),
            cycle: CycleState::Idle,
        }
    }

    pub fn feature(&self) -> &F {
        &self.feature
    }

    pub fn state(&self) -> &FeatureState<F::Model> {
        &self.state
    }

    pub fn cycle_state(&self) -> CycleState {
        self.cycle
    }

    /// The panel produced by the last cycle
    pub fn rendered(&self) -> Option<&Panel> {
        self.state.rendered.as_ref()
    }

    fn enter(&mut self, next: CycleState) {
        trace!(feature = %self.feature.kind(), from = ?self.cycle, to = ?next, "cycle transition");
        self.cycle = next;
    }

    /// Runs one full cycle and returns how it ended
    ///
    /// Never fails: fetch and transform errors are logged and turned into the
    /// feature's fallback panel.
    pub async fn refresh(&mut self) -> CycleOutcome {
        self.enter(CycleState::CheckingCache);
        if let Some((model, fetched_at)) = self.read_fresh_cache() {
            self.enter(CycleState::RenderingFromCache);
            self.state.rendered = Some(self.feature.render(&model));
            self.state.cached_payload = Some(model);
            self.state.last_fetched_at = fetched_at;
            self.enter(CycleState::Idle);
            return CycleOutcome::FromCache;
        }

        self.enter(CycleState::Fetching);
        let result = match self.feature.fetch().await {
            Ok(raw) => {
                self.enter(CycleState::Transforming);
                self.feature.transform(raw)
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(model) => {
                self.enter(CycleState::Caching);
                let now = self.clock.now();
                self.write_cache(&model, now);

                self.enter(CycleState::Rendering);
                self.state.rendered = Some(self.feature.render(&model));
                self.state.cached_payload = Some(model);
                self.state.last_fetched_at = Some(now);
                self.enter(CycleState::Idle);
                CycleOutcome::Fetched
            }
            Err(error) => {
                self.enter(CycleState::Failing);
                self.log_failure(&error);

                self.enter(CycleState::RenderingFallback);
                self.state.rendered = Some(self.feature.fallback());
                self.enter(CycleState::Idle);
                CycleOutcome::Failed
            }
        }
    }

    /// Cached model and its write time, if an entry exists and is younger than the TTL
    fn read_fresh_cache(&self) -> Option<(F::Model, Option<DateTime<Utc>>)> {
        let policy = self.feature.cache_policy()?;
        let cache = self.cache.as_ref()?;
        let entry = cache.read::<F::Model>(&policy.key)?;

        if entry.scope != policy.scope {
            debug!(
                feature = %self.feature.kind(),
                cached = ?entry.scope,
                wanted = ?policy.scope,
                "cache entry was written for a different query"
            );
            return None;
        }

        let age = entry.age(self.clock.now());
        if !is_valid(age, policy.ttl) {
            debug!(feature = %self.feature.kind(), age_secs = age.as_secs(), "cache entry is stale");
            return None;
        }

        debug!(feature = %self.feature.kind(), age_secs = age.as_secs(), "rendering from cache");
        let written_at = entry.written_at();
        Some((entry.payload, written_at))
    }

    fn write_cache(&self, model: &F::Model, now: DateTime<Utc>) {
        let (Some(policy), Some(cache)) = (self.feature.cache_policy(), self.cache.as_ref()) else {
            return;
        };
        if let Err(e) = cache.write_scoped(&policy.key, policy.scope.as_deref(), model, now) {
            warn!(feature = %self.feature.kind(), error = %e, "failed to write cache entry");
        }
    }

    fn log_failure(&self, error: &FetchError) {
        warn!(feature = %self.feature.kind(), error = %error, "refresh cycle failed");
    }
}

/// A rendered panel on its way to the screen
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshMessage {
    pub panel: Panel,
    pub outcome: CycleOutcome,
    pub at: DateTime<Utc>,
}

/// Instructions broadcast to every feature task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Run an extra cycle on every periodically scheduled feature
    ///
    /// Features scheduled [`Schedule::Once`] (the speed test) ignore it and
    /// only rerun on an explicit [`Command::Refresh`].
    RefreshAll,
    /// Run an extra cycle on one feature
    Refresh(FeatureKind),
    /// Stop all feature tasks
    Shutdown,
}

/// Drives one controller until shutdown
///
/// Cycles of the same feature never overlap: the next tick or command is only
/// awaited after the previous cycle has rendered.
pub async fn run_feature<F: Feature + 'static>(
    mut controller: RefreshController<F>,
    updates: mpsc::Sender<RefreshMessage>,
    mut commands: broadcast::Receiver<Command>,
    clock: SharedClock,
) {
    let kind = controller.feature().kind();
    let schedule = controller.feature().schedule();
    let mut ticker = schedule.ticker();
    debug!(feature = %kind, "refresh task started");

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            command = commands.recv() => match command {
                Ok(Command::Shutdown) | Err(broadcast::error::RecvError::Closed) => break,
                Ok(Command::RefreshAll) if schedule == Schedule::Once => continue,
                Ok(Command::RefreshAll) => {}
                Ok(Command::Refresh(target)) if target == kind => {}
                Ok(Command::Refresh(_)) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(feature = %kind, skipped, "command receiver lagged");
                }
            },
        }

        let outcome = controller.refresh().await;
        let Some(panel) = controller.rendered().cloned() else {
            continue;
        };

        let message = RefreshMessage {
            panel,
            outcome,
            at: clock.now(),
        };
        if updates.send(message).await.is_err() {
            break;
        }
    }

    debug!(feature = %kind, "refresh task stopped");
}

/// Handle for controlling the background refresh tasks
pub struct RefreshHandle {
    /// Channel for receiving rendered panels
    pub receiver: mpsc::Receiver<RefreshMessage>,
    sender: mpsc::Sender<RefreshMessage>,
    commands: broadcast::Sender<Command>,
    tasks: Vec<JoinHandle<()>>,
    clock: SharedClock,
}

impl RefreshHandle {
    /// Creates a handle with no running tasks
    pub fn new(clock: SharedClock) -> Self {
        let (sender, receiver) = mpsc::channel(64);
        let (commands, _) = broadcast::channel(16);
        Self {
            receiver,
            sender,
            commands,
            tasks: Vec::new(),
            clock,
        }
    }

    /// Spawns a task for every feature `config` enables
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_all(
        config: &DashboardConfig,
        cache: Option<CacheManager>,
        clock: SharedClock,
    ) -> Result<Self, reqwest::Error> {
        let mut handle = Self::new(clock.clone());
        let client = build_client(config.request_timeout(), DEFAULT_USER_AGENT)?;

        handle.spawn(RefreshController::new(
            ClockSource::from_config(clock.clone(), &config.clock),
            None,
            clock.clone(),
        ));

        match WeatherSource::from_config(client.clone(), &config.weather) {
            Some(source) => {
                handle.spawn(RefreshController::new(source, cache.clone(), clock.clone()));
            }
            None => warn!("no OpenWeatherMap API key configured; weather panel disabled"),
        }

        if config.alerts.enabled {
            handle.spawn(RefreshController::new(
                AlertsSource::from_config(client.clone(), &config.alerts),
                cache.clone(),
                clock.clone(),
            ));
        }

        if config.news.enabled {
            handle.spawn(RefreshController::new(
                NewsSource::from_config(client.clone(), &config.news),
                cache.clone(),
                clock.clone(),
            ));
        }

        if config.network.enabled {
            handle.spawn(RefreshController::new(
                NetworkSource::from_config(client, &config.network),
                cache.clone(),
                clock.clone(),
            ));
        }

        if config.speed_test.enabled {
            let probe_client = build_client(
                Duration::from_secs(config.speed_test.timeout_secs),
                DEFAULT_USER_AGENT,
            )?;
            handle.spawn(RefreshController::new(
                SpeedTest::from_config(probe_client, &config.speed_test),
                None,
                clock,
            ));
        }

        info!(tasks = handle.task_count(), "refresh tasks spawned");
        Ok(handle)
    }

    /// Spawns a background task for one controller
    pub fn spawn<F: Feature + 'static>(&mut self, controller: RefreshController<F>) {
        let task = tokio::spawn(run_feature(
            controller,
            self.sender.clone(),
            self.commands.subscribe(),
            self.clock.clone(),
        ));
        self.tasks.push(task);
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Requests an immediate extra cycle, for one feature or all of them
    pub fn request_refresh(&self, target: Option<FeatureKind>) {
        self.send_command(target.map_or(Command::RefreshAll, Command::Refresh));
    }

    /// Broadcasts a command to every feature task
    pub fn send_command(&self, command: Command) {
        // No receivers just means no tasks are running
        let _ = self.commands.send(command);
    }

    /// Returns the next pending message without blocking
    pub fn try_recv(&mut self) -> Option<RefreshMessage> {
        self.receiver.try_recv().ok()
    }

    /// Stops every feature task and waits for them to finish
    ///
    /// Idle tasks exit on the shutdown command; a task in the middle of a
    /// fetch is aborted at its next await point.
    pub async fn shutdown(self) {
        let _ = self.commands.send(Command::Shutdown);
        drop(self.receiver);
        for task in &self.tasks {
            task.abort();
        }
        for task in self.tasks {
            let _ = task.await;
        }
        debug!("refresh tasks shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::alerts::ActiveAlerts;
    use crate::feature::CachePolicy;
    use crate::scheduler::ManualClock;
    use crate::view::{self, AlertBanner, NEWS_FALLBACK};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use serde::{Deserialize, Serialize};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Story {
        title: String,
    }

    /// Feature whose fetch can be switched between success and failure
    struct FakeNews {
        calls: Arc<AtomicUsize>,
        failing: Arc<AtomicBool>,
        ttl: Duration,
        schedule: Schedule,
        scope: Option<String>,
    }

    impl FakeNews {
        fn new(ttl: Duration) -> Self {
            Self {
                calls: Arc::new(AtomicUsize::new(0)),
                failing: Arc::new(AtomicBool::new(false)),
                ttl,
                schedule: Schedule::Every(Duration::from_secs(900)),
                scope: None,
            }
        }

        fn scoped(ttl: Duration, scope: &str) -> Self {
            Self {
                scope: Some(scope.to_string()),
                ..Self::new(ttl)
            }
        }
    }

    #[async_trait]
    impl Feature for FakeNews {
        type Raw = String;
        type Model = Story;

        fn kind(&self) -> FeatureKind {
            FeatureKind::News
        }

        fn schedule(&self) -> Schedule {
            self.schedule
        }

        fn cache_policy(&self) -> Option<CachePolicy> {
            let policy = CachePolicy::new("news", self.ttl);
            Some(match &self.scope {
                Some(scope) => policy.with_scope(scope.clone()),
                None => policy,
            })
        }

        async fn fetch(&self) -> Result<Self::Raw, FetchError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.failing.load(Ordering::SeqCst) {
                return Err(FetchError::Malformed("simulated outage".to_string()));
            }
            Ok(format!("story {}", n))
        }

        fn transform(&self, raw: Self::Raw) -> Result<Self::Model, FetchError> {
            if raw.is_empty() {
                return Err(FetchError::Malformed("empty".to_string()));
            }
            Ok(Story { title: raw })
        }

        fn render(&self, model: &Self::Model) -> Panel {
            Panel::News(view::NewsView {
                source: "fake".to_string(),
                headlines: vec![model.title.clone()],
            })
        }

        fn fallback(&self) -> Panel {
            Panel::unavailable(FeatureKind::News, NEWS_FALLBACK)
        }
    }

    /// Alert feature fed from a canned list of headlines
    struct FakeAlerts {
        headlines: Vec<String>,
        failing: bool,
    }

    #[async_trait]
    impl Feature for FakeAlerts {
        type Raw = Vec<String>;
        type Model = ActiveAlerts;

        fn kind(&self) -> FeatureKind {
            FeatureKind::Alerts
        }

        fn schedule(&self) -> Schedule {
            Schedule::Every(Duration::from_secs(600))
        }

        async fn fetch(&self) -> Result<Self::Raw, FetchError> {
            if self.failing {
                return Err(FetchError::Malformed("down".to_string()));
            }
            Ok(self.headlines.clone())
        }

        fn transform(&self, raw: Self::Raw) -> Result<Self::Model, FetchError> {
            Ok(ActiveAlerts {
                zone: "SCZ010".to_string(),
                headlines: raw,
            })
        }

        fn render(&self, model: &Self::Model) -> Panel {
            view::render_alerts(model)
        }

        fn fallback(&self) -> Panel {
            Panel::Alert(AlertBanner::hidden())
        }
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 15, 12, 0, 0).unwrap()
    }

    fn setup(ttl: Duration) -> (RefreshController<FakeNews>, Arc<ManualClock>, CacheManager, TempDir) {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let cache = CacheManager::with_dir(dir.path().to_path_buf());
        let clock = Arc::new(ManualClock::new(noon()));
        let controller = RefreshController::new(FakeNews::new(ttl), Some(cache.clone()), clock.clone());
        (controller, clock, cache, dir)
    }

    fn headline(panel: Option<&Panel>) -> String {
        match panel {
            Some(Panel::News(view)) => view.headlines[0].clone(),
            other => panic!("Expected news panel, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_first_cycle_fetches_and_caches() {
        let (mut controller, _clock, cache, _dir) = setup(Duration::from_secs(900));

        let outcome = controller.refresh().await;

        assert_eq!(outcome, CycleOutcome::Fetched);
        assert_eq!(controller.cycle_state(), CycleState::Idle);
        assert_eq!(headline(controller.rendered()), "story 1");
        assert_eq!(controller.state().last_fetched_at, Some(noon()));

        let entry = cache.read::<Story>("news").expect("entry should be written");
        assert_eq!(entry.payload.title, "story 1");
        assert_eq!(entry.timestamp, noon().timestamp_millis());
    }

    #[tokio::test]
    async fn test_fresh_cache_skips_fetch() {
        let (mut controller, clock, _cache, _dir) = setup(Duration::from_secs(30 * 60));
        controller.refresh().await;

        clock.advance(chrono::Duration::seconds(29 * 60 + 59));
        let outcome = controller.refresh().await;

        assert_eq!(outcome, CycleOutcome::FromCache);
        assert_eq!(controller.feature().calls.load(Ordering::SeqCst), 1);
        assert_eq!(headline(controller.rendered()), "story 1");
        assert_eq!(controller.state().last_fetched_at, Some(noon()));
    }

    #[tokio::test]
    async fn test_stale_cache_fetches_again() {
        let (mut controller, clock, _cache, _dir) = setup(Duration::from_secs(30 * 60));
        controller.refresh().await;

        clock.advance(chrono::Duration::seconds(30 * 60 + 1));
        let outcome = controller.refresh().await;

        assert_eq!(outcome, CycleOutcome::Fetched);
        assert_eq!(controller.feature().calls.load(Ordering::SeqCst), 2);
        assert_eq!(headline(controller.rendered()), "story 2");
    }

    #[tokio::test]
    async fn test_failure_renders_fallback_and_keeps_cache() {
        let (mut controller, clock, cache, _dir) = setup(Duration::from_secs(30 * 60));
        controller.refresh().await;
        let before = cache.read::<Story>("news").unwrap();

        clock.advance(chrono::Duration::minutes(31));
        controller.feature().failing.store(true, Ordering::SeqCst);
        let outcome = controller.refresh().await;

        assert_eq!(outcome, CycleOutcome::Failed);
        assert_eq!(controller.cycle_state(), CycleState::Idle);
        assert_eq!(
            controller.rendered(),
            Some(&Panel::unavailable(FeatureKind::News, NEWS_FALLBACK))
        );
        assert_eq!(cache.read::<Story>("news").unwrap(), before);
    }

    #[tokio::test]
    async fn test_failure_does_not_disturb_a_fresh_entry() {
        let (mut controller, clock, cache, dir) = setup(Duration::from_secs(30 * 60));
        controller.refresh().await;

        // A second controller with its own failing source shares the cache
        let failing = FakeNews::new(Duration::ZERO);
        failing.failing.store(true, Ordering::SeqCst);
        let mut other = RefreshController::new(failing, Some(cache.clone()), clock.clone());
        assert_eq!(other.refresh().await, CycleOutcome::Failed);

        clock.advance(chrono::Duration::minutes(10));
        assert_eq!(controller.refresh().await, CycleOutcome::FromCache);
        assert_eq!(headline(controller.rendered()), "story 1");
        drop(dir);
    }

    #[tokio::test]
    async fn test_entry_for_another_location_is_not_reused() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let cache = CacheManager::with_dir(dir.path().to_path_buf());
        let clock = Arc::new(ManualClock::new(noon()));
        let ttl = Duration::from_secs(30 * 60);

        let mut anderson = RefreshController::new(
            FakeNews::scoped(ttl, "city:4569298"),
            Some(cache.clone()),
            clock.clone(),
        );
        assert_eq!(anderson.refresh().await, CycleOutcome::Fetched);

        // Same key, new location, well inside the TTL
        clock.advance(chrono::Duration::minutes(1));
        let mut new_york = RefreshController::new(
            FakeNews::scoped(ttl, "city:5128581"),
            Some(cache.clone()),
            clock.clone(),
        );
        assert_eq!(new_york.refresh().await, CycleOutcome::Fetched);
        assert_eq!(new_york.feature().calls.load(Ordering::SeqCst), 1);

        let entry = cache.read::<Story>("news").unwrap();
        assert_eq!(entry.scope.as_deref(), Some("city:5128581"));

        // A matching scope is still served from cache
        clock.advance(chrono::Duration::minutes(1));
        assert_eq!(new_york.refresh().await, CycleOutcome::FromCache);
    }

    #[tokio::test]
    async fn test_unscoped_entry_is_not_reused_by_scoped_feature() {
        let (mut plain, clock, cache, _dir) = setup(Duration::from_secs(30 * 60));
        plain.refresh().await;

        let mut scoped = RefreshController::new(
            FakeNews::scoped(Duration::from_secs(30 * 60), "https://feeds.example/rss"),
            Some(cache),
            clock,
        );
        assert_eq!(scoped.refresh().await, CycleOutcome::Fetched);
    }

    #[tokio::test]
    async fn test_without_cache_manager_every_cycle_fetches() {
        let clock = Arc::new(ManualClock::new(noon()));
        let mut controller = RefreshController::new(FakeNews::new(Duration::from_secs(900)), None, clock);

        controller.refresh().await;
        controller.refresh().await;

        assert_eq!(controller.feature().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_alert_cycle_toggles_banner() {
        let clock = Arc::new(ManualClock::new(noon()));

        let mut active = RefreshController::new(
            FakeAlerts {
                headlines: vec!["X".to_string()],
                failing: false,
            },
            None,
            clock.clone(),
        );
        active.refresh().await;
        match active.rendered() {
            Some(Panel::Alert(banner)) => {
                assert!(banner.visible);
                assert!(banner.text.contains('X'));
            }
            other => panic!("Expected alert panel, got {:?}", other),
        }

        let mut failing = RefreshController::new(
            FakeAlerts {
                headlines: vec!["X".to_string()],
                failing: true,
            },
            None,
            clock,
        );
        assert_eq!(failing.refresh().await, CycleOutcome::Failed);
        assert_eq!(failing.rendered(), Some(&Panel::Alert(AlertBanner::hidden())));
    }

    #[tokio::test(start_paused = true)]
    async fn test_task_refreshes_on_schedule_and_on_request() {
        let clock: SharedClock = Arc::new(ManualClock::new(noon()));
        let mut handle = RefreshHandle::new(clock.clone());
        let feature = FakeNews::new(Duration::ZERO);
        let calls = feature.calls.clone();
        handle.spawn(RefreshController::new(feature, None, clock));

        // Startup cycle
        let first = handle.receiver.recv().await.expect("startup render");
        assert_eq!(first.outcome, CycleOutcome::Fetched);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Next scheduled tick after 15 minutes
        let second = handle.receiver.recv().await.expect("scheduled render");
        assert_eq!(second.outcome, CycleOutcome::Fetched);
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        // Manual request for another feature is ignored, one for this feature runs
        handle.request_refresh(Some(FeatureKind::Weather));
        handle.request_refresh(Some(FeatureKind::News));
        let third = handle.receiver.recv().await.expect("requested render");
        assert_eq!(third.panel.kind(), FeatureKind::News);
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_once_schedule_runs_a_single_cycle() {
        let clock: SharedClock = Arc::new(ManualClock::new(noon()));
        let mut handle = RefreshHandle::new(clock.clone());
        let mut feature = FakeNews::new(Duration::ZERO);
        feature.schedule = Schedule::Once;
        let calls = feature.calls.clone();
        handle.spawn(RefreshController::new(feature, None, clock));

        handle.receiver.recv().await.expect("startup render");
        tokio::time::sleep(Duration::from_secs(24 * 3600)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(handle.try_recv().is_none());

        // A full refresh leaves once-per-launch features alone
        handle.request_refresh(None);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(handle.try_recv().is_none());

        handle.request_refresh(Some(FeatureKind::News));
        handle.receiver.recv().await.expect("requested render");
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_stops_tasks() {
        let clock: SharedClock = Arc::new(ManualClock::new(noon()));
        let mut handle = RefreshHandle::new(clock.clone());
        handle.spawn(RefreshController::new(FakeNews::new(Duration::ZERO), None, clock));
        assert_eq!(handle.task_count(), 1);

        tokio::time::timeout(Duration::from_secs(5), handle.shutdown())
            .await
            .expect("shutdown should complete");
    }

    #[tokio::test]
    async fn test_spawn_all_skips_disabled_features() {
        let clock: SharedClock = Arc::new(ManualClock::new(noon()));
        let mut config = DashboardConfig::default();
        config.alerts.enabled = false;
        config.news.enabled = false;
        config.network.enabled = false;
        config.speed_test.enabled = false;

        let handle = RefreshHandle::spawn_all(&config, None, clock).unwrap();

        // Clock only; weather has no API key
        assert_eq!(handle.task_count(), 1);
        handle.shutdown().await;
    }
}
