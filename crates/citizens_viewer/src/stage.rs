//! Stage geometry: mapping an actor's logical, zone-relative position
//! to a global canvas position.

use std::collections::HashMap;

use citizens_proto::{Area, Npc};

pub const STAGE_WIDTH: f64 = 800.0;
pub const STAGE_HEIGHT: f64 = 600.0;
pub const ZONE_WIDTH: f64 = STAGE_WIDTH / 2.0;
pub const ZONE_HEIGHT: f64 = STAGE_HEIGHT / 2.0;
/// Keeps the actor dot plus its name/emoji labels inside the zone.
pub const STAGE_MARGIN: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPos {
    pub x: f64,
    pub y: f64,
}

impl ScreenPos {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: ScreenPos) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

/// Client-only mapping from zone name to a screen-space rectangle.
/// Static configuration, independent of the server's zone bounds.
#[derive(Debug, Clone)]
pub struct StageLayout {
    rects: HashMap<String, ZoneRect>,
}

impl StageLayout {
    pub fn new(rects: HashMap<String, ZoneRect>) -> Self {
        Self { rects }
    }

    /// The original four-room quadrant layout.
    pub fn quadrants() -> Self {
        let mut rects = HashMap::new();
        for (name, col, row) in [
            ("Bedroom", 0.0, 0.0),
            ("Office", 1.0, 0.0),
            ("Bathroom", 0.0, 1.0),
            ("Lounge", 1.0, 1.0),
        ] {
            rects.insert(
                name.to_string(),
                ZoneRect {
                    x: col * ZONE_WIDTH,
                    y: row * ZONE_HEIGHT,
                    w: ZONE_WIDTH,
                    h: ZONE_HEIGHT,
                },
            );
        }
        Self { rects }
    }

    pub fn rect_for(&self, zone_name: &str) -> Option<ZoneRect> {
        self.rects.get(zone_name).copied()
    }
}

impl Default for StageLayout {
    fn default() -> Self {
        Self::quadrants()
    }
}

/// Maps an actor's logical position to a global canvas position.
///
/// Looks up the actor's zone rectangle by zone id, adds the logical
/// coordinates to the zone offset, and clamps the result into the zone
/// interior shrunk by [`STAGE_MARGIN`] on all sides. Unknown zone ids
/// and missing or non-finite coordinates yield the caller-supplied
/// fallback; network data must never make this panic.
pub fn map_to_screen(
    npc: &Npc,
    areas: &[Area],
    layout: &StageLayout,
    fallback: ScreenPos,
) -> ScreenPos {
    let Some((x, y)) = npc.logical_pos() else {
        return fallback;
    };
    if !x.is_finite() || !y.is_finite() {
        return fallback;
    }
    let Some(area_id) = npc.area_id() else {
        return fallback;
    };
    let Some(area) = areas.iter().find(|area| area.id == area_id) else {
        return fallback;
    };
    let Some(rect) = layout.rect_for(&area.name) else {
        return fallback;
    };
    ScreenPos {
        x: clamp_into(rect.x + x, rect.x, rect.w),
        y: clamp_into(rect.y + y, rect.y, rect.h),
    }
}

fn clamp_into(value: f64, offset: f64, extent: f64) -> f64 {
    let lo = offset + STAGE_MARGIN;
    let hi = offset + extent - STAGE_MARGIN;
    if hi < lo {
        // Interior shrank to nothing; pin to the zone's center line.
        return offset + extent / 2.0;
    }
    value.clamp(lo, hi)
}
