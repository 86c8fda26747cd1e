use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use thiserror::Error;

use crate::adapters::cmsv_api::{ApiError, SessionClient};
use crate::adapters::http_transport::{Fetched, HttpFetcher};
use crate::domain::models::{AlarmPage, CoordinateSystem, Session};

#[derive(Debug, Error)]
pub enum PollerError {
    #[error("alarm poller is already running")]
    AlreadyRunning,
    #[error("failed to spawn alarm poller thread: {0}")]
    Spawn(#[source] std::io::Error),
}

pub trait AlarmSource: Send + Sync + 'static {
    fn fetch_alarms(
        &self,
        session: &Session,
        device_id: &str,
        coordinates: CoordinateSystem,
    ) -> Result<Fetched<AlarmPage>, ApiError>;
}

impl<F> AlarmSource for SessionClient<F>
where
    F: HttpFetcher,
{
    fn fetch_alarms(
        &self,
        session: &Session,
        device_id: &str,
        coordinates: CoordinateSystem,
    ) -> Result<Fetched<AlarmPage>, ApiError> {
        self.alarms(session, device_id, coordinates)
    }
}

pub trait AlarmSink: Send + 'static {
    fn deliver(&mut self, page: &Fetched<AlarmPage>);
}

impl<T> AlarmSink for T
where
    T: FnMut(&Fetched<AlarmPage>) + Send + 'static,
{
    fn deliver(&mut self, page: &Fetched<AlarmPage>) {
        self(page)
    }
}

/// What the poller queries on each tick. An empty `device_id` means all devices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlarmSelection {
    pub session: Option<Session>,
    pub device_id: String,
    pub coordinates: CoordinateSystem,
}

/// Selection shared between the foreground and the poller thread.
#[derive(Debug, Clone, Default)]
pub struct SharedSelection {
    inner: Arc<Mutex<AlarmSelection>>,
}

impl SharedSelection {
    pub fn new(selection: AlarmSelection) -> Self {
        Self {
            inner: Arc::new(Mutex::new(selection)),
        }
    }

    pub fn snapshot(&self) -> AlarmSelection {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn update(&self, op: impl FnOnce(&mut AlarmSelection)) {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        op(&mut guard);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PollerStats {
    pub ticks: u64,
    pub deliveries: u64,
    pub failures: u64,
}

#[derive(Debug, Default)]
struct Counters {
    ticks: AtomicU64,
    deliveries: AtomicU64,
    failures: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> PollerStats {
        PollerStats {
            ticks: self.ticks.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

struct Worker {
    wake: mpsc::Sender<()>,
    accepting: Arc<Mutex<bool>>,
    handle: JoinHandle<()>,
}

enum PollerState {
    Idle,
    Running(Worker),
}

/// Periodic alarm query with two states: Idle and Running.
pub struct AlarmPoller {
    interval: Duration,
    state: PollerState,
    retiring: Vec<JoinHandle<()>>,
    counters: Arc<Counters>,
}

impl AlarmPoller {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            state: PollerState::Idle,
            retiring: Vec::new(),
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, PollerState::Running(_))
    }

    pub fn stats(&self) -> PollerStats {
        self.counters.snapshot()
    }

    pub fn start<S, K>(
        &mut self,
        source: S,
        selection: SharedSelection,
        sink: K,
    ) -> Result<(), PollerError>
    where
        S: AlarmSource,
        K: AlarmSink,
    {
        if self.is_running() {
            return Err(PollerError::AlreadyRunning);
        }

        let (wake, wake_rx) = mpsc::channel();
        let accepting = Arc::new(Mutex::new(true));
        let tick = Tick {
            source,
            selection,
            sink,
            accepting: Arc::clone(&accepting),
            counters: Arc::clone(&self.counters),
        };
        let interval = self.interval;

        let handle = std::thread::Builder::new()
            .name("alarm-poller".to_string())
            .spawn(move || run_worker(tick, interval, wake_rx))
            .map_err(PollerError::Spawn)?;

        tracing::info!(interval_ms = interval.as_millis() as u64, "alarm poller started");
        self.state = PollerState::Running(Worker {
            wake,
            accepting,
            handle,
        });
        Ok(())
    }

    /// Returns once no further delivery can happen; a request already in
    /// flight is left to finish and its result is dropped.
    pub fn stop(&mut self) -> bool {
        let PollerState::Running(worker) = std::mem::replace(&mut self.state, PollerState::Idle)
        else {
            return false;
        };

        *worker.accepting.lock().unwrap_or_else(PoisonError::into_inner) = false;
        let _ = worker.wake.send(());
        self.retiring.push(worker.handle);

        tracing::info!("alarm poller stopped");
        true
    }

    /// Stops the poller and waits for every worker thread it started to exit.
    pub fn shutdown(mut self) {
        self.stop();
        for handle in self.retiring.drain(..) {
            if handle.join().is_err() {
                tracing::error!("alarm poller thread panicked");
            }
        }
    }
}

impl Drop for AlarmPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

struct Tick<S, K> {
    source: S,
    selection: SharedSelection,
    sink: K,
    accepting: Arc<Mutex<bool>>,
    counters: Arc<Counters>,
}

impl<S, K> Tick<S, K>
where
    S: AlarmSource,
    K: AlarmSink,
{
    fn run(&mut self) {
        self.counters.ticks.fetch_add(1, Ordering::Relaxed);

        let selection = self.selection.snapshot();
        let Some(session) = selection.session else {
            tracing::debug!("no session selected, skipping alarm poll tick");
            return;
        };

        match self
            .source
            .fetch_alarms(&session, &selection.device_id, selection.coordinates)
        {
            Ok(page) => {
                let accepting = self.accepting.lock().unwrap_or_else(PoisonError::into_inner);
                if !*accepting {
                    tracing::debug!("discarding alarm result that arrived after stop");
                    return;
                }
                self.sink.deliver(&page);
                self.counters.deliveries.fetch_add(1, Ordering::Relaxed);
            }
            Err(error) => {
                let failures = self.counters.failures.fetch_add(1, Ordering::Relaxed) + 1;
                tracing::warn!(error = %error, failures, "alarm poll tick failed");
            }
        }
    }
}

fn run_worker<S, K>(mut tick: Tick<S, K>, interval: Duration, wake: mpsc::Receiver<()>)
where
    S: AlarmSource,
    K: AlarmSink,
{
    loop {
        match wake.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => tick.run(),
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::{Duration, Instant};

    use super::{AlarmPoller, AlarmSelection, AlarmSource, PollerError, SharedSelection};
    use crate::adapters::cmsv_api::ApiError;
    use crate::adapters::http_transport::{Fetched, TrustLevel};
    use crate::domain::models::{Alarm, AlarmPage, CoordinateSystem, Session};

    const INTERVAL: Duration = Duration::from_millis(10);

    fn wait_until(condition: impl Fn() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !condition() {
            assert!(Instant::now() < deadline, "condition not reached in time");
            thread::sleep(Duration::from_millis(5));
        }
    }

    fn page_for(device_id: &str) -> Fetched<AlarmPage> {
        Fetched {
            value: AlarmPage {
                alarms: vec![Alarm {
                    device_id: device_id.to_string(),
                    ..Alarm::default()
                }],
                ..AlarmPage::default()
            },
            trust: TrustLevel::Verified,
        }
    }

    fn logged_in() -> SharedSelection {
        SharedSelection::new(AlarmSelection {
            session: Some(Session::new("tok")),
            ..AlarmSelection::default()
        })
    }

    #[derive(Default)]
    struct RecordingSource {
        queries: Mutex<Vec<(String, CoordinateSystem)>>,
        fail: bool,
    }

    impl AlarmSource for Arc<RecordingSource> {
        fn fetch_alarms(
            &self,
            _session: &Session,
            device_id: &str,
            coordinates: CoordinateSystem,
        ) -> Result<Fetched<AlarmPage>, ApiError> {
            self.queries
                .lock()
                .expect("queries lock")
                .push((device_id.to_string(), coordinates));
            if self.fail {
                Err(ApiError::Result {
                    action: "vehicle alarms",
                    code: 5,
                })
            } else {
                Ok(page_for(device_id))
            }
        }
    }

    fn counting_sink() -> (Arc<AtomicUsize>, impl FnMut(&Fetched<AlarmPage>) + Send + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        (count, move |_: &Fetched<AlarmPage>| {
            seen.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn stop_before_first_tick_never_delivers() {
        let source = Arc::new(RecordingSource::default());
        let (delivered, sink) = counting_sink();
        let mut poller = AlarmPoller::new(Duration::from_millis(200));

        poller
            .start(Arc::clone(&source), logged_in(), sink)
            .expect("poller starts");
        assert!(poller.stop());
        assert!(!poller.is_running());
        poller.shutdown();

        assert_eq!(delivered.load(Ordering::SeqCst), 0);
        assert!(source.queries.lock().expect("queries lock").is_empty());
    }

    #[test]
    fn delivers_each_successful_tick() {
        let source = Arc::new(RecordingSource::default());
        let (delivered, sink) = counting_sink();
        let mut poller = AlarmPoller::new(INTERVAL);

        poller
            .start(Arc::clone(&source), logged_in(), sink)
            .expect("poller starts");
        wait_until(|| delivered.load(Ordering::SeqCst) >= 2);

        let stats = poller.stats();
        assert!(stats.deliveries >= 2);
        assert_eq!(stats.failures, 0);
        poller.shutdown();
    }

    #[test]
    fn failed_tick_keeps_running_without_delivery() {
        let source = Arc::new(RecordingSource {
            fail: true,
            ..RecordingSource::default()
        });
        let (delivered, sink) = counting_sink();
        let mut poller = AlarmPoller::new(INTERVAL);

        poller
            .start(Arc::clone(&source), logged_in(), sink)
            .expect("poller starts");
        wait_until(|| poller.stats().failures >= 2);

        assert!(poller.is_running());
        assert_eq!(delivered.load(Ordering::SeqCst), 0);
        poller.shutdown();
    }

    #[test]
    fn tick_without_session_skips_query() {
        let source = Arc::new(RecordingSource::default());
        let (delivered, sink) = counting_sink();
        let mut poller = AlarmPoller::new(INTERVAL);

        poller
            .start(Arc::clone(&source), SharedSelection::default(), sink)
            .expect("poller starts");
        wait_until(|| poller.stats().ticks >= 3);
        poller.shutdown();

        assert!(source.queries.lock().expect("queries lock").is_empty());
        assert_eq!(delivered.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn picks_up_selection_changes_between_ticks() {
        let source = Arc::new(RecordingSource::default());
        let (_, sink) = counting_sink();
        let selection = logged_in();
        let mut poller = AlarmPoller::new(INTERVAL);

        poller
            .start(Arc::clone(&source), selection.clone(), sink)
            .expect("poller starts");
        wait_until(|| !source.queries.lock().expect("queries lock").is_empty());

        selection.update(|current| {
            current.device_id = "10001".to_string();
            current.coordinates = CoordinateSystem::Gcj02;
        });
        wait_until(|| {
            source
                .queries
                .lock()
                .expect("queries lock")
                .contains(&("10001".to_string(), CoordinateSystem::Gcj02))
        });
        poller.shutdown();

        let queries = source.queries.lock().expect("queries lock");
        assert_eq!(queries[0], (String::new(), CoordinateSystem::Wgs84));
    }

    #[test]
    fn rejects_second_start_while_running() {
        let source = Arc::new(RecordingSource::default());
        let mut poller = AlarmPoller::new(Duration::from_secs(60));

        poller
            .start(Arc::clone(&source), logged_in(), |_: &Fetched<AlarmPage>| {})
            .expect("poller starts");
        let second = poller.start(Arc::clone(&source), logged_in(), |_: &Fetched<AlarmPage>| {});

        assert!(matches!(second, Err(PollerError::AlreadyRunning)));
        assert!(poller.stop());
        assert!(!poller.stop());
    }

    struct DropCounter(Arc<AtomicUsize>);

    impl DropCounter {
        fn touch(&self) {}
    }

    impl Drop for DropCounter {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn shutdown_joins_workers_from_earlier_runs() {
        let source = Arc::new(RecordingSource::default());
        let exited = Arc::new(AtomicUsize::new(0));
        let mut poller = AlarmPoller::new(Duration::from_secs(60));

        for _ in 0..2 {
            let guard = DropCounter(Arc::clone(&exited));
            poller
                .start(
                    Arc::clone(&source),
                    logged_in(),
                    move |_: &Fetched<AlarmPage>| {
                        guard.touch();
                    },
                )
                .expect("poller starts");
            assert!(poller.stop());
        }
        poller.shutdown();

        assert_eq!(exited.load(Ordering::SeqCst), 2);
    }

    struct BlockingSource {
        entered: Mutex<mpsc::Sender<()>>,
        release: Mutex<mpsc::Receiver<()>>,
    }

    impl AlarmSource for BlockingSource {
        fn fetch_alarms(
            &self,
            _session: &Session,
            device_id: &str,
            _coordinates: CoordinateSystem,
        ) -> Result<Fetched<AlarmPage>, ApiError> {
            let _ = self.entered.lock().expect("entered lock").send(());
            let _ = self.release.lock().expect("release lock").recv();
            Ok(page_for(device_id))
        }
    }

    #[test]
    fn result_arriving_after_stop_is_discarded() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let source = BlockingSource {
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
        };
        let (delivered, sink) = counting_sink();
        let mut poller = AlarmPoller::new(INTERVAL);

        poller
            .start(source, logged_in(), sink)
            .expect("poller starts");
        entered_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("request should be in flight");
        poller.stop();
        release_tx.send(()).expect("release in-flight request");
        poller.shutdown();

        assert_eq!(delivered.load(Ordering::SeqCst), 0);
    }
}
