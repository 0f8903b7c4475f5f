//! Wire types shared between the citizens viewer and the simulation
//! server: push-event frames, the `/state` snapshot payload, and the
//! `/npc_details/{id}` payload.

pub mod detail;
pub mod events;
pub mod state;

pub use detail::{ActionInfo, MemoryEvent, NpcDetail, ReflectionInfo};
pub use events::{
    ActionStart, DialogueEvent, NpcStatusSummary, PlanningEvent, ReflectionEvent, ServerEvent,
    SimEvent, SocialEvent, TickUpdate,
};
pub use state::{Area, AreaBounds, Environment, Npc, SimClockRaw, SpawnPoint, StateSnapshot};
