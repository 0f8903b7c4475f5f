//! Per-actor animation: one controller per actor identity, a tagged
//! Settled / Moving / Idling phase, and an injected monotonic clock
//! (`f64` seconds) so every transition is deterministic under test.
//!
//! The last authoritative target — never the interpolated point — is
//! what each incoming snapshot is diffed against.

use std::collections::HashMap;

use citizens_proto::{Area, Npc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::stage::{map_to_screen, ScreenPos, StageLayout};

pub const ANIMATION_DURATION_SECS: f64 = 0.8;
/// Below this distance a new target is floating-point noise, not a move.
pub const MOVE_EPSILON_PX: f64 = 0.5;
pub const IDLE_INTERVAL_SECS: f64 = 3.0;
pub const IDLE_RANGE_PX: f64 = 3.0;

const IDLE_NUDGE_SECS: f64 = 0.25;
const IDLE_HOLD_SECS: f64 = 0.4;
const IDLE_RETURN_SECS: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionTuning {
    pub animation_duration_secs: f64,
    pub move_epsilon_px: f64,
    pub idle_interval_secs: f64,
    pub idle_range_px: f64,
}

impl Default for MotionTuning {
    fn default() -> Self {
        Self {
            animation_duration_secs: ANIMATION_DURATION_SECS,
            move_epsilon_px: MOVE_EPSILON_PX,
            idle_interval_secs: IDLE_INTERVAL_SECS,
            idle_range_px: IDLE_RANGE_PX,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum MotionPhase {
    /// No animation running; visual position equals the confirmed target.
    Settled { idle_due: f64 },
    /// Purposeful interpolation toward a new authoritative target.
    Moving {
        from: ScreenPos,
        to: ScreenPos,
        started: f64,
    },
    /// Idle micro-motion around the confirmed target.
    Idling {
        leg: IdleLeg,
        offset: ScreenPos,
        leg_started: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IdleLeg {
    Out,
    Hold,
    Back,
}

/// Animation state for a single actor identity. Destroyed and
/// recreated — never mutated in place — when the actor id changes.
#[derive(Debug)]
pub struct MotionController {
    confirmed: ScreenPos,
    phase: MotionPhase,
    tuning: MotionTuning,
    rng: StdRng,
}

impl MotionController {
    /// A controller for a newly seen actor: settled at its mapped
    /// position, idle cycle armed. New actors do not animate in.
    pub fn new(initial: ScreenPos, tuning: MotionTuning, now: f64) -> Self {
        let mut rng = StdRng::from_entropy();
        let idle_due = now + idle_delay(&mut rng, tuning.idle_interval_secs);
        Self {
            confirmed: initial,
            phase: MotionPhase::Settled { idle_due },
            tuning,
            rng,
        }
    }

    #[cfg(test)]
    fn with_seed(initial: ScreenPos, tuning: MotionTuning, now: f64, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let idle_due = now + idle_delay(&mut rng, tuning.idle_interval_secs);
        Self {
            confirmed: initial,
            phase: MotionPhase::Settled { idle_due },
            tuning,
            rng,
        }
    }

    /// The position the next server update should be diffed against:
    /// the in-flight destination while moving, otherwise the last
    /// confirmed target. Never the interpolated point.
    pub fn authoritative_target(&self) -> ScreenPos {
        match self.phase {
            MotionPhase::Moving { to, .. } => to,
            _ => self.confirmed,
        }
    }

    /// Supplies a fresh authoritative target.
    ///
    /// Idempotent for targets within the pixel epsilon of the current
    /// authoritative target. A genuinely new target supersedes any
    /// in-flight interpolation and aborts an idle cycle mid-leg, so at
    /// most one animation runs per actor.
    pub fn set_target(&mut self, target: ScreenPos, now: f64) {
        if target.distance(self.authoritative_target()) <= self.tuning.move_epsilon_px {
            return;
        }
        let from = self.position(now);
        self.phase = MotionPhase::Moving {
            from,
            to: target,
            started: now,
        };
    }

    /// Advances phase transitions up to `now`.
    pub fn advance(&mut self, now: f64) {
        match self.phase {
            MotionPhase::Moving { to, started, .. } => {
                if now - started >= self.tuning.animation_duration_secs {
                    // Snap exactly to the target; it becomes the new
                    // confirmed position and the idle cycle re-arms.
                    self.confirmed = to;
                    self.phase = MotionPhase::Settled {
                        idle_due: now + idle_delay(&mut self.rng, self.tuning.idle_interval_secs),
                    };
                }
            }
            MotionPhase::Settled { idle_due } => {
                if now >= idle_due {
                    let offset = ScreenPos {
                        x: self.confirmed.x + self.jitter(),
                        y: self.confirmed.y + self.jitter(),
                    };
                    self.phase = MotionPhase::Idling {
                        leg: IdleLeg::Out,
                        offset,
                        leg_started: now,
                    };
                }
            }
            MotionPhase::Idling {
                leg,
                offset,
                leg_started,
            } => {
                let elapsed = now - leg_started;
                match leg {
                    IdleLeg::Out if elapsed >= IDLE_NUDGE_SECS => {
                        self.phase = MotionPhase::Idling {
                            leg: IdleLeg::Hold,
                            offset,
                            leg_started: now,
                        };
                    }
                    IdleLeg::Hold if elapsed >= IDLE_HOLD_SECS => {
                        self.phase = MotionPhase::Idling {
                            leg: IdleLeg::Back,
                            offset,
                            leg_started: now,
                        };
                    }
                    IdleLeg::Back if elapsed >= IDLE_RETURN_SECS => {
                        self.phase = MotionPhase::Settled {
                            idle_due: now
                                + idle_delay(&mut self.rng, self.tuning.idle_interval_secs),
                        };
                    }
                    _ => {}
                }
            }
        }
    }

    /// Samples the visual position at `now`.
    pub fn position(&self, now: f64) -> ScreenPos {
        match self.phase {
            MotionPhase::Settled { .. } => self.confirmed,
            MotionPhase::Moving { from, to, started } => {
                let t = ((now - started) / self.tuning.animation_duration_secs).clamp(0.0, 1.0);
                lerp(from, to, ease_in_out_cubic(t))
            }
            MotionPhase::Idling {
                leg,
                offset,
                leg_started,
            } => match leg {
                IdleLeg::Out => {
                    let t = ((now - leg_started) / IDLE_NUDGE_SECS).clamp(0.0, 1.0);
                    lerp(self.confirmed, offset, t)
                }
                IdleLeg::Hold => offset,
                IdleLeg::Back => {
                    let t = ((now - leg_started) / IDLE_RETURN_SECS).clamp(0.0, 1.0);
                    lerp(offset, self.confirmed, t)
                }
            },
        }
    }

    pub fn is_moving(&self) -> bool {
        matches!(self.phase, MotionPhase::Moving { .. })
    }

    fn jitter(&mut self) -> f64 {
        self.rng.gen_range(-self.tuning.idle_range_px..=self.tuning.idle_range_px)
    }
}

fn idle_delay(rng: &mut StdRng, interval: f64) -> f64 {
    interval * rng.gen_range(0.75..=1.25)
}

fn lerp(from: ScreenPos, to: ScreenPos, t: f64) -> ScreenPos {
    ScreenPos {
        x: from.x + (to.x - from.x) * t,
        y: from.y + (to.y - from.y) * t,
    }
}

fn ease_in_out_cubic(t: f64) -> f64 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        let u = -2.0 * t + 2.0;
        1.0 - u * u * u / 2.0
    }
}

/// Controllers keyed by actor id, synced against each snapshot.
#[derive(Debug, Default)]
pub struct MotionSet {
    controllers: HashMap<String, MotionController>,
    tuning: MotionTuning,
}

impl MotionSet {
    pub fn new(tuning: MotionTuning) -> Self {
        Self {
            controllers: HashMap::new(),
            tuning,
        }
    }

    /// Reconciles the controller set with the actors of a fresh
    /// snapshot: new ids spawn settled at their mapped position,
    /// existing ids get a target update, absent ids are removed along
    /// with every pending deadline they owned.
    pub fn sync(&mut self, npcs: &[Npc], areas: &[Area], layout: &StageLayout, now: f64) {
        for npc in npcs {
            match self.controllers.get_mut(&npc.id) {
                Some(controller) => {
                    let fallback = controller.authoritative_target();
                    let target = map_to_screen(npc, areas, layout, fallback);
                    controller.set_target(target, now);
                }
                None => {
                    // Not rendered until the mapper produces a valid
                    // position; probe with a sentinel fallback.
                    let sentinel = ScreenPos::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
                    let initial = map_to_screen(npc, areas, layout, sentinel);
                    if initial != sentinel {
                        self.controllers.insert(
                            npc.id.clone(),
                            MotionController::new(initial, self.tuning, now),
                        );
                    }
                }
            }
        }
        let live: std::collections::HashSet<&str> =
            npcs.iter().map(|npc| npc.id.as_str()).collect();
        self.controllers.retain(|id, _| live.contains(id.as_str()));
    }

    pub fn advance_all(&mut self, now: f64) {
        for controller in self.controllers.values_mut() {
            controller.advance(now);
        }
    }

    pub fn position_of(&self, npc_id: &str, now: f64) -> Option<ScreenPos> {
        self.controllers
            .get(npc_id)
            .map(|controller| controller.position(now))
    }

    pub fn controller(&self, npc_id: &str) -> Option<&MotionController> {
        self.controllers.get(npc_id)
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }
}
