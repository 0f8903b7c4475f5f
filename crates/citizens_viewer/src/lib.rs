//! Client core for the citizens simulation viewer.
//!
//! Keeps a live population of simulated actors correct, smooth, and
//! race-free under three competing update sources: full-state snapshot
//! refetches, push events over a persistent socket, and continuous
//! local animation. Rendering proper is out of scope; the store and
//! the motion controllers are the interface a presentation layer
//! consumes.

pub mod app;
pub mod config;
pub mod connection;
pub mod detail_refresh;
pub mod fetch;
pub mod motion;
pub mod ops;
pub mod stage;
pub mod store;

pub use app::{ViewerApp, ViewerAppError};
pub use config::ViewerConfig;
pub use store::SimStore;
