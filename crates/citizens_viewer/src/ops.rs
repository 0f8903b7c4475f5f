//! Operator controls: the small POST endpoints that drive the
//! simulation from the viewer. These are fire-and-forget from the
//! client's point of view; resulting state changes arrive through the
//! event socket like any other update.

use std::time::Duration;

use serde::Serialize;

use crate::fetch::FetchError;

const CONTROL_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Serialize)]
struct UserEventBody<'a> {
    description: &'a str,
}

pub struct ControlClient {
    client: reqwest::blocking::Client,
    base: String,
}

impl ControlClient {
    pub fn new(api_base: &str) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(CONTROL_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            base: api_base.trim_end_matches('/').to_string(),
        })
    }

    /// Advances the simulation by one tick.
    pub fn trigger_tick(&self) -> Result<(), FetchError> {
        self.post(&format!("{}/tick", self.base))
    }

    /// Sets the tick speed multiplier.
    pub fn set_speed(&self, factor: u32) -> Result<(), FetchError> {
        self.post(&format!("{}/speed/{factor}", self.base))
    }

    /// Rolls the simulation forward to the start of the next day.
    pub fn reset_day(&self) -> Result<(), FetchError> {
        self.post(&format!("{}/reset_day", self.base))
    }

    /// Re-seeds the world with a fresh population.
    pub fn reseed(&self) -> Result<(), FetchError> {
        self.post(&format!("{}/seed", self.base))
    }

    /// Injects a user-submitted world event. The server broadcasts it
    /// back as a `sim_event` frame.
    pub fn trigger_user_event(&self, description: &str) -> Result<(), FetchError> {
        let url = format!("{}/trigger_user_event", self.base);
        let response = self
            .client
            .post(&url)
            .json(&UserEventBody { description })
            .send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }
        Ok(())
    }

    fn post(&self, url: &str) -> Result<(), FetchError> {
        let response = self.client.post(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }
        Ok(())
    }
}
