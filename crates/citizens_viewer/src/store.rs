//! The canonical client-side store: actors, zones, clock, activity
//! log, and the optional open detail view. Every mutation goes through
//! the operations here; no other component holds a writable reference.

use std::collections::VecDeque;

use citizens_proto::{Area, Npc, NpcDetail, StateSnapshot};

pub const LOG_CAPACITY: usize = 100;

/// Simulated wall clock, decoded from a minutes-since-midnight value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimClock {
    pub day: u32,
    pub hh: u32,
    pub mm: u32,
}

impl Default for SimClock {
    fn default() -> Self {
        Self {
            day: 1,
            hh: 0,
            mm: 0,
        }
    }
}

impl SimClock {
    pub fn from_sim_min(day: u32, sim_min: u32) -> Self {
        Self {
            day,
            hh: (sim_min / 60) % 24,
            mm: sim_min % 60,
        }
    }
}

/// At most one actor's expanded detail is resident at a time.
///
/// `data` stays `None` between the open request and the first
/// completed fetch; the id is what stale-response guards check.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailView {
    pub npc_id: String,
    pub data: Option<NpcDetail>,
}

impl DetailView {
    pub fn npc_name(&self) -> Option<&str> {
        self.data.as_ref().map(|detail| detail.npc_name.as_str())
    }
}

#[derive(Debug, Default)]
pub struct SimStore {
    npcs: Vec<Npc>,
    areas: Vec<Area>,
    clock: SimClock,
    log: VecDeque<String>,
    detail: Option<DetailView>,
    log_seq: u64,
}

impl SimStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn npcs(&self) -> &[Npc] {
        &self.npcs
    }

    pub fn areas(&self) -> &[Area] {
        &self.areas
    }

    pub fn clock(&self) -> SimClock {
        self.clock
    }

    /// Newest-first view of the activity log.
    pub fn log(&self) -> impl Iterator<Item = &str> {
        self.log.iter().map(String::as_str)
    }

    /// Total lines ever appended; lets a presenter detect new lines
    /// without re-reading the whole ring.
    pub fn log_seq(&self) -> u64 {
        self.log_seq
    }

    pub fn detail(&self) -> Option<&DetailView> {
        self.detail.as_ref()
    }

    /// The only write path into the log. Newest first, capacity
    /// [`LOG_CAPACITY`], oldest silently dropped.
    pub fn push_log(&mut self, message: impl Into<String>) {
        self.log.push_front(message.into());
        self.log.truncate(LOG_CAPACITY);
        self.log_seq += 1;
    }

    pub fn replace_actors(&mut self, npcs: Vec<Npc>) {
        // Referential integrity: an open detail view whose actor is no
        // longer listed must close, not dangle.
        if let Some(view) = &self.detail {
            if !npcs.iter().any(|npc| npc.id == view.npc_id) {
                self.detail = None;
            }
        }
        self.npcs = npcs;
    }

    pub fn replace_zones(&mut self, areas: Vec<Area>) {
        self.areas = areas;
    }

    pub fn replace_clock(&mut self, clock: SimClock) {
        self.clock = clock;
    }

    /// Applies one fetched snapshot atomically: actors and zones from
    /// this payload only, clock only when the payload carries both the
    /// minute value and the day. An incomplete clock logs a warning
    /// and skips the clock update alone.
    pub fn apply_snapshot(&mut self, snapshot: StateSnapshot) {
        if let Some(npcs) = snapshot.npcs {
            self.replace_actors(npcs);
        }
        if let Some(areas) = snapshot.areas {
            self.replace_zones(areas);
        }

        let sim_min = snapshot.sim_clock.and_then(|clock| clock.sim_min);
        let day = snapshot.environment.and_then(|env| env.day);
        match (sim_min, day) {
            (Some(sim_min), Some(day)) => {
                let clock = SimClock::from_sim_min(day, sim_min);
                self.replace_clock(clock);
                self.push_log(format!(
                    "Tick: Day {} - {:02}:{:02}",
                    clock.day, clock.hh, clock.mm
                ));
            }
            _ => {
                self.push_log("Clock data incomplete in /state.");
            }
        }
    }

    /// Marks a detail view as open (and pending) for `npc_id`.
    pub fn open_detail(&mut self, npc_id: impl Into<String>) {
        let npc_id = npc_id.into();
        self.push_log(format!("Fetching details for NPC: {npc_id}..."));
        self.detail = Some(DetailView {
            npc_id,
            data: None,
        });
    }

    pub fn close_detail(&mut self) {
        self.detail = None;
    }

    /// Starts a refresh of the open detail view: logs the fetch and
    /// returns the actor id the caller should re-request. `None` when
    /// no view is open.
    pub fn refresh_detail(&mut self) -> Option<String> {
        let npc_id = self.detail.as_ref()?.npc_id.clone();
        self.push_log(format!("Fetching details for NPC: {npc_id}..."));
        Some(npc_id)
    }

    /// Applies a completed detail fetch for `requested_id`.
    ///
    /// A response that arrives after the view closed or switched to a
    /// different actor is ignored — identity check on completion, not
    /// cancellation; the read is idempotent so this is sufficient.
    pub fn apply_detail(&mut self, requested_id: &str, result: Result<NpcDetail, String>) {
        let open_for_request = self
            .detail
            .as_ref()
            .is_some_and(|view| view.npc_id == requested_id);
        if !open_for_request {
            return;
        }
        match result {
            Ok(detail) => {
                self.push_log(format!("Details loaded for {}.", detail.npc_name));
                self.detail = Some(DetailView {
                    npc_id: requested_id.to_string(),
                    data: Some(detail),
                });
            }
            Err(message) => {
                let had_data = self
                    .detail
                    .as_ref()
                    .is_some_and(|view| view.data.is_some());
                if had_data {
                    // Refresh failure: keep the view, just report it.
                    let name = self
                        .detail
                        .as_ref()
                        .and_then(DetailView::npc_name)
                        .unwrap_or(requested_id)
                        .to_string();
                    self.push_log(format!("Error refreshing details for {name}: {message}"));
                } else {
                    self.push_log(format!(
                        "Error loading details for NPC {requested_id}: {message}"
                    ));
                    self.detail = None;
                }
            }
        }
    }
}
