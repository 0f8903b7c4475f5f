//! HTTP fetches against the simulation server: full-state snapshots
//! and per-actor detail reads. Requests run on a worker thread so the
//! advance loop never blocks on the network; completions come back
//! over a channel and are applied (or discarded) on the loop thread.

use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use citizens_proto::{NpcDetail, StateSnapshot};

const HTTP_TIMEOUT_SECS: u64 = 10;

#[derive(Debug)]
pub enum FetchError {
    Http(reqwest::Error),
    Status(reqwest::StatusCode),
    Decode(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Http(err) => write!(f, "http error: {err}"),
            FetchError::Status(status) => write!(f, "server returned {status}"),
            FetchError::Decode(detail) => write!(f, "decode error: {detail}"),
        }
    }
}

impl std::error::Error for FetchError {}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Http(err)
    }
}

/// One request handed to the fetch worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchJob {
    /// Full-state snapshot, stamped with its request generation.
    Snapshot { generation: u64 },
    Detail { npc_id: String },
}

/// One completed request, carrying enough identity for the loop thread
/// to decide whether the result is still wanted.
#[derive(Debug)]
pub enum FetchOutcome {
    Snapshot {
        generation: u64,
        result: Result<StateSnapshot, FetchError>,
    },
    Detail {
        npc_id: String,
        result: Result<NpcDetail, FetchError>,
    },
}

/// Serializes snapshot fetches: at most one in flight, and completions
/// from superseded requests are discarded.
///
/// Refetch triggers while a fetch is in flight collapse into a single
/// follow-up request rather than queueing one per trigger.
#[derive(Debug, Default)]
pub struct SnapshotSlot {
    requested: u64,
    applied: u64,
    in_flight: bool,
    rerun_wanted: bool,
}

impl SnapshotSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a refetch trigger. Returns the generation to fetch
    /// now, or `None` if a fetch is already in flight (the trigger is
    /// remembered and replayed on completion).
    pub fn request(&mut self) -> Option<u64> {
        if self.in_flight {
            self.rerun_wanted = true;
            return None;
        }
        self.requested += 1;
        self.in_flight = true;
        Some(self.requested)
    }

    /// Handles a completed fetch. Returns `(accept, follow_up)`:
    /// whether the completion's payload should be applied, and the
    /// generation of an immediate follow-up fetch if triggers arrived
    /// while this one was in flight.
    pub fn complete(&mut self, generation: u64) -> (bool, Option<u64>) {
        if generation != self.requested {
            // A newer request exists; this completion is stale.
            return (false, None);
        }
        self.in_flight = false;
        let accept = generation > self.applied;
        if accept {
            self.applied = generation;
        }
        let follow_up = if self.rerun_wanted {
            self.rerun_wanted = false;
            self.request()
        } else {
            None
        };
        (accept, follow_up)
    }
}

/// Handle to the fetch worker thread.
pub struct FetchWorker {
    jobs: Sender<FetchJob>,
    outcomes: Receiver<FetchOutcome>,
}

impl FetchWorker {
    /// Spawns the worker. Jobs run strictly in submission order, one
    /// at a time; the worker exits when the handle is dropped.
    pub fn spawn(api_base: String) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()?;
        let (job_tx, job_rx) = mpsc::channel::<FetchJob>();
        let (outcome_tx, outcome_rx) = mpsc::channel();
        thread::spawn(move || {
            let base = api_base.trim_end_matches('/').to_string();
            while let Ok(job) = job_rx.recv() {
                let outcome = match job {
                    FetchJob::Snapshot { generation } => FetchOutcome::Snapshot {
                        generation,
                        result: get_json(&client, &format!("{base}/state")),
                    },
                    FetchJob::Detail { npc_id } => {
                        let result =
                            get_json(&client, &format!("{base}/npc_details/{npc_id}"));
                        FetchOutcome::Detail { npc_id, result }
                    }
                };
                if outcome_tx.send(outcome).is_err() {
                    break;
                }
            }
        });
        Ok(Self {
            jobs: job_tx,
            outcomes: outcome_rx,
        })
    }

    pub fn submit(&self, job: FetchJob) {
        // A dead worker surfaces as a disconnected outcome channel.
        let _ = self.jobs.send(job);
    }

    pub fn try_recv(&self) -> Option<FetchOutcome> {
        self.outcomes.try_recv().ok()
    }
}

fn get_json<T: serde::de::DeserializeOwned>(
    client: &reqwest::blocking::Client,
    url: &str,
) -> Result<T, FetchError> {
    let response = client.get(url).send()?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status(status));
    }
    let body = response.text()?;
    serde_json::from_str(&body).map_err(|err| FetchError::Decode(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_serializes_concurrent_triggers() {
        let mut slot = SnapshotSlot::new();
        let first = slot.request().expect("first request issues");
        assert_eq!(first, 1);

        // Triggers while in flight do not issue new fetches.
        assert_eq!(slot.request(), None);
        assert_eq!(slot.request(), None);

        // Completion applies and replays exactly one follow-up.
        let (accept, follow_up) = slot.complete(first);
        assert!(accept);
        let second = follow_up.expect("coalesced follow-up");
        assert_eq!(second, 2);

        let (accept, follow_up) = slot.complete(second);
        assert!(accept);
        assert_eq!(follow_up, None);
    }

    #[test]
    fn stale_completion_is_discarded() {
        let mut slot = SnapshotSlot::new();
        let first = slot.request().expect("first");
        // Simulate a worker restart reissuing before completion.
        let (accept, _) = slot.complete(first);
        assert!(accept);
        let second = slot.request().expect("second");
        assert_ne!(first, second);

        // The old generation completing again must not apply.
        let (accept, follow_up) = slot.complete(first);
        assert!(!accept);
        assert_eq!(follow_up, None);

        let (accept, _) = slot.complete(second);
        assert!(accept);
    }

    #[test]
    fn idle_completion_after_apply_does_not_reapply() {
        let mut slot = SnapshotSlot::new();
        let generation = slot.request().expect("request");
        assert!(slot.complete(generation).0);
        // Duplicate delivery of the same completion.
        assert!(!slot.complete(generation).0);
    }
}
