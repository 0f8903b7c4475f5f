//! The viewer session: owns the store, the motion controllers, the
//! socket lifetime, and the fetch worker, and advances them all from a
//! single loop thread. Everything mutable lives here; the socket and
//! fetch threads only ever talk back over channels.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, TryRecvError};
use std::thread;
use std::time::Instant;

use crate::config::ViewerConfig;
use crate::connection::{apply_socket_update, spawn_socket_reader, SocketUpdate};
use crate::detail_refresh::DetailRefreshCoordinator;
use crate::fetch::{FetchError, FetchJob, FetchOutcome, FetchWorker, SnapshotSlot};
use crate::motion::MotionSet;
use crate::stage::StageLayout;
use crate::store::SimStore;

#[derive(Debug)]
pub enum ViewerAppError {
    Fetch(FetchError),
}

impl fmt::Display for ViewerAppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewerAppError::Fetch(err) => write!(f, "fetch setup failed: {err}"),
        }
    }
}

impl std::error::Error for ViewerAppError {}

impl From<FetchError> for ViewerAppError {
    fn from(err: FetchError) -> Self {
        ViewerAppError::Fetch(err)
    }
}

pub struct ViewerApp {
    config: ViewerConfig,
    store: SimStore,
    motion: MotionSet,
    layout: StageLayout,
    snapshot_slot: SnapshotSlot,
    fetch: FetchWorker,
    coordinator: DetailRefreshCoordinator,
    socket: Option<Receiver<SocketUpdate>>,
    reconnect_failures: u32,
    reconnect_at: Option<Instant>,
    /// Detail id the coordinator was last armed for; a mismatch with
    /// the store means the view closed or switched underneath it.
    coordinator_npc_id: Option<String>,
    started: Instant,
}

impl ViewerApp {
    /// Builds a session and opens the first socket. The initial
    /// snapshot fetch is driven by the socket's `Opened` update, so a
    /// server that is down at startup costs nothing but reconnects.
    pub fn new(config: ViewerConfig) -> Result<Self, ViewerAppError> {
        let fetch = FetchWorker::spawn(config.api_base.clone())?;
        let motion = MotionSet::new(config.motion);
        let socket = Some(spawn_socket_reader(config.api_base.clone()));
        Ok(Self {
            config,
            store: SimStore::new(),
            motion,
            layout: StageLayout::quadrants(),
            snapshot_slot: SnapshotSlot::new(),
            fetch,
            coordinator: DetailRefreshCoordinator::new(),
            socket,
            reconnect_failures: 0,
            reconnect_at: None,
            coordinator_npc_id: None,
            started: Instant::now(),
        })
    }

    pub fn store(&self) -> &SimStore {
        &self.store
    }

    pub fn motion(&self) -> &MotionSet {
        &self.motion
    }

    pub fn now_secs(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    pub fn is_connected(&self) -> bool {
        self.socket.is_some()
    }

    /// Opens the detail view for an actor and kicks off its fetch.
    pub fn select_npc(&mut self, npc_id: &str) {
        self.coordinator.clear();
        self.coordinator_npc_id = Some(npc_id.to_string());
        self.store.open_detail(npc_id);
        self.fetch.submit(FetchJob::Detail {
            npc_id: npc_id.to_string(),
        });
    }

    pub fn deselect_npc(&mut self) {
        self.coordinator.clear();
        self.coordinator_npc_id = None;
        self.store.close_detail();
    }

    /// One loop iteration: drain inbound channels, advance animation,
    /// fire any due debounced detail refresh, reconnect if scheduled.
    pub fn tick(&mut self) {
        let now = self.now_secs();
        self.drain_socket(now);
        self.drain_fetches(now);
        self.reconcile_coordinator();
        self.motion.advance_all(now);
        if self.coordinator.poll(now) {
            if let Some(npc_id) = self.store.refresh_detail() {
                self.fetch.submit(FetchJob::Detail { npc_id });
            }
        }
        self.maybe_reconnect();
    }

    /// Runs the session until `shutdown` flips.
    pub fn run(&mut self, shutdown: &AtomicBool) {
        while !shutdown.load(Ordering::SeqCst) {
            self.tick();
            thread::sleep(self.config.frame_interval);
        }
    }

    fn drain_socket(&mut self, now: f64) {
        let Some(socket) = self.socket.take() else {
            return;
        };
        let mut disconnected = false;
        loop {
            match socket.try_recv() {
                Ok(update) => {
                    if update == SocketUpdate::Opened {
                        self.reconnect_failures = 0;
                    }
                    let dispatch = apply_socket_update(&mut self.store, &update);
                    if dispatch.refetch_snapshot {
                        self.request_snapshot();
                    }
                    if let Some(candidate) = dispatch.detail_candidate {
                        let open_name = self
                            .store
                            .detail()
                            .and_then(|view| view.npc_name())
                            .map(str::to_string);
                        self.coordinator.note_event(
                            &candidate,
                            open_name.as_deref(),
                            now,
                            self.config.detail_refresh_debounce_secs,
                        );
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    disconnected = true;
                    break;
                }
            }
        }
        if !disconnected {
            self.socket = Some(socket);
        } else if self.config.reconnect_enabled {
            let delay = self.config.reconnect_delay(self.reconnect_failures);
            self.reconnect_failures = self.reconnect_failures.saturating_add(1);
            self.store
                .push_log(format!("Reconnecting in {:.1}s...", delay.as_secs_f64()));
            self.reconnect_at = Some(Instant::now() + delay);
        }
    }

    fn drain_fetches(&mut self, now: f64) {
        while let Some(outcome) = self.fetch.try_recv() {
            match outcome {
                FetchOutcome::Snapshot { generation, result } => {
                    let (accept, follow_up) = self.snapshot_slot.complete(generation);
                    if accept {
                        match result {
                            Ok(snapshot) => {
                                self.store.apply_snapshot(snapshot);
                                self.motion.sync(
                                    self.store.npcs(),
                                    self.store.areas(),
                                    &self.layout,
                                    now,
                                );
                            }
                            Err(err) => {
                                self.store
                                    .push_log(format!("Error fetching /state: {err}"));
                            }
                        }
                    }
                    if let Some(generation) = follow_up {
                        self.fetch.submit(FetchJob::Snapshot { generation });
                    }
                }
                FetchOutcome::Detail { npc_id, result } => {
                    self.store
                        .apply_detail(&npc_id, result.map_err(|err| err.to_string()));
                }
            }
        }
    }

    fn request_snapshot(&mut self) {
        if let Some(generation) = self.snapshot_slot.request() {
            self.fetch.submit(FetchJob::Snapshot { generation });
        }
    }

    /// The store can close or switch the detail view on its own (actor
    /// vanished, failed open); a pending refresh must not outlive it.
    fn reconcile_coordinator(&mut self) {
        let open_id = self.store.detail().map(|view| view.npc_id.clone());
        if open_id != self.coordinator_npc_id {
            self.coordinator.clear();
            self.coordinator_npc_id = open_id;
        }
    }

    fn maybe_reconnect(&mut self) {
        let due = self
            .reconnect_at
            .is_some_and(|at| Instant::now() >= at);
        if due && self.socket.is_none() {
            self.reconnect_at = None;
            self.socket = Some(spawn_socket_reader(self.config.api_base.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_app() -> ViewerApp {
        // Points at a closed port; the socket thread reports Failed
        // and the channel drops, which is the path under test.
        let config = ViewerConfig::default()
            .with_api_base("http://127.0.0.1:1")
            .with_reconnect(false);
        ViewerApp::new(config).expect("app builds without a server")
    }

    #[test]
    fn select_logs_fetch_and_opens_pending_view() {
        let mut app = offline_app();
        app.select_npc("npc-1");
        let view = app.store().detail().expect("view open");
        assert_eq!(view.npc_id, "npc-1");
        assert!(view.data.is_none());
        assert_eq!(
            app.store().log().next(),
            Some("Fetching details for NPC: npc-1...")
        );
    }

    #[test]
    fn deselect_clears_view_and_pending_refresh() {
        let mut app = offline_app();
        app.select_npc("npc-1");
        app.deselect_npc();
        assert!(app.store().detail().is_none());
        app.tick();
        assert!(app.store().detail().is_none());
    }

    #[test]
    fn socket_failure_without_reconnect_stays_disconnected() {
        let mut app = offline_app();
        // Give the socket thread time to fail, then drain it.
        thread::sleep(std::time::Duration::from_millis(300));
        app.tick();
        assert!(!app.is_connected());
        assert!(app
            .store()
            .log()
            .any(|line| line == "WebSocket error occurred."));
    }
}
