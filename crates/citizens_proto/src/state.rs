use serde::{Deserialize, Serialize};

/// Full-state payload of `GET /state`.
///
/// Every top-level key may be absent; the reconciler applies whatever
/// is present and warns about an incomplete clock.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    #[serde(default)]
    pub npcs: Option<Vec<Npc>>,
    #[serde(default)]
    pub areas: Option<Vec<Area>>,
    #[serde(default)]
    pub sim_clock: Option<SimClockRaw>,
    #[serde(default)]
    pub environment: Option<Environment>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimClockRaw {
    /// Minutes since midnight of the simulated day.
    #[serde(default)]
    pub sim_min: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    #[serde(default)]
    pub day: Option<u32>,
}

/// One simulated actor as listed in a snapshot. Identity (`id`) and
/// `name` are required; everything else is server-optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Npc {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub emoji: Option<String>,
    /// Logical position relative to the actor's current zone.
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default)]
    pub spawn: Option<SpawnPoint>,
    #[serde(default)]
    pub traits: Vec<String>,
    #[serde(default)]
    pub energy: Option<f64>,
}

impl Npc {
    /// The actor's current zone reference.
    pub fn area_id(&self) -> Option<&str> {
        self.spawn.as_ref().and_then(|spawn| spawn.area_id.as_deref())
    }

    /// Logical coordinates, with the spawn point as a fallback when
    /// the top-level display coordinates are missing.
    pub fn logical_pos(&self) -> Option<(f64, f64)> {
        match (self.x, self.y) {
            (Some(x), Some(y)) => Some((x, y)),
            _ => {
                let spawn = self.spawn.as_ref()?;
                Some((spawn.x?, spawn.y?))
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpawnPoint {
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default, rename = "areaId")]
    pub area_id: Option<String>,
}

/// One named rectangular zone of the simulated world, bounds in the
/// server's canonical space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub bounds: Option<AreaBounds>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AreaBounds {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_parses_with_all_keys() {
        let payload = r#"{
            "npcs": [{"id":"n1","name":"Ada","emoji":"👩","x":10.0,"y":20.0,
                      "spawn":{"x":1.0,"y":2.0,"areaId":"a1"},
                      "traits":["curious"],"energy":0.8}],
            "areas": [{"id":"a1","name":"Office","bounds":{"x":0,"y":0,"w":400,"h":300}}],
            "sim_clock": {"sim_min": 125},
            "environment": {"day": 2}
        }"#;
        let snapshot: StateSnapshot = serde_json::from_str(payload).expect("parse snapshot");
        let npcs = snapshot.npcs.expect("npcs present");
        assert_eq!(npcs[0].area_id(), Some("a1"));
        assert_eq!(npcs[0].logical_pos(), Some((10.0, 20.0)));
        assert_eq!(snapshot.sim_clock.expect("clock").sim_min, Some(125));
    }

    #[test]
    fn snapshot_parses_with_any_subset_of_keys() {
        let empty: StateSnapshot = serde_json::from_str("{}").expect("parse empty");
        assert_eq!(empty, StateSnapshot::default());

        let clock_only: StateSnapshot =
            serde_json::from_str(r#"{"sim_clock":{"sim_min":5}}"#).expect("parse clock only");
        assert!(clock_only.npcs.is_none());
        assert_eq!(clock_only.sim_clock.expect("clock").sim_min, Some(5));
    }

    #[test]
    fn npc_logical_pos_falls_back_to_spawn() {
        let npc: Npc = serde_json::from_str(
            r#"{"id":"n1","name":"Ada","spawn":{"x":3.0,"y":4.0,"areaId":"a1"}}"#,
        )
        .expect("parse npc");
        assert_eq!(npc.logical_pos(), Some((3.0, 4.0)));

        let bare: Npc =
            serde_json::from_str(r#"{"id":"n2","name":"Grace"}"#).expect("parse bare npc");
        assert_eq!(bare.logical_pos(), None);
    }
}
