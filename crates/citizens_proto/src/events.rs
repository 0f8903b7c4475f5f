use serde::{Deserialize, Serialize};

/// One push frame from the live event socket.
///
/// Frames are UTF-8 JSON of the form `{"type": <tag>, "data": {...}}`.
/// The union is closed: a frame whose tag is not listed here fails to
/// parse and is dropped by the connection layer. Payload fields are
/// individually optional because the server omits them freely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    TickUpdate(TickUpdate),
    SimEvent(SimEvent),
    PlanningEvent(PlanningEvent),
    ReflectionEvent(ReflectionEvent),
    ActionStart(ActionStart),
    SocialEvent(SocialEvent),
    DialogueEvent(DialogueEvent),
    NpcStatusSummary(NpcStatusSummary),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickUpdate {
    #[serde(default)]
    pub new_sim_min: Option<u32>,
    #[serde(default)]
    pub new_day: Option<u32>,
}

/// An environment challenge (alarm, delivery, outage) or a
/// user-submitted event injected through the operator endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimEvent {
    #[serde(default)]
    pub event_code: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub day: Option<u32>,
    #[serde(default)]
    pub tick: Option<u64>,
    #[serde(default)]
    pub event_id: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

impl SimEvent {
    pub fn is_user_submitted(&self) -> bool {
        self.event_code.as_deref() == Some("user_submitted")
            || self.source.as_deref() == Some("user")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanningEvent {
    #[serde(default)]
    pub npc_name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub day: Option<u32>,
    #[serde(default)]
    pub num_actions: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReflectionEvent {
    #[serde(default)]
    pub npc_name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub day: Option<u32>,
    #[serde(default)]
    pub num_reflections: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionStart {
    #[serde(default)]
    pub npc_name: Option<String>,
    #[serde(default)]
    pub action_title: Option<String>,
    #[serde(default)]
    pub emoji: Option<String>,
    /// Minutes since midnight of the simulated day.
    #[serde(default)]
    pub sim_time: Option<u32>,
    #[serde(default)]
    pub day: Option<u32>,
}

/// One actor noticing another entering or leaving a zone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialEvent {
    #[serde(default)]
    pub observer_npc_id: Option<String>,
    #[serde(default)]
    pub observer_npc_name: Option<String>,
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub target_npc_name: Option<String>,
    #[serde(default)]
    pub area_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sim_min_of_day: Option<u32>,
    #[serde(default)]
    pub day: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DialogueEvent {
    #[serde(default)]
    pub npc_a_name: Option<String>,
    #[serde(default)]
    pub npc_b_name: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub day: Option<u32>,
}

/// Periodic roll-up of per-actor statuses. Carried for completeness of
/// the union; the client reacts to the tick cadence instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NpcStatusSummary {
    #[serde(default)]
    pub day: Option<u32>,
    #[serde(default)]
    pub sim_min_of_day: Option<u32>,
    #[serde(default)]
    pub statuses: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_update_frame_parses() {
        let frame = r#"{"type":"tick_update","data":{"new_sim_min":480,"new_day":2}}"#;
        let event: ServerEvent = serde_json::from_str(frame).expect("parse tick frame");
        assert_eq!(
            event,
            ServerEvent::TickUpdate(TickUpdate {
                new_sim_min: Some(480),
                new_day: Some(2),
            })
        );
    }

    #[test]
    fn sim_event_frame_tolerates_missing_fields() {
        let frame = r#"{"type":"sim_event","data":{"description":"The fire alarm blares!"}}"#;
        let event: ServerEvent = serde_json::from_str(frame).expect("parse sim_event frame");
        let ServerEvent::SimEvent(sim) = event else {
            panic!("expected sim_event variant");
        };
        assert_eq!(sim.description.as_deref(), Some("The fire alarm blares!"));
        assert_eq!(sim.event_code, None);
        assert!(!sim.is_user_submitted());
    }

    #[test]
    fn sim_event_recognizes_user_submission() {
        let by_code = SimEvent {
            event_code: Some("user_submitted".to_string()),
            ..SimEvent::default()
        };
        let by_source = SimEvent {
            source: Some("user".to_string()),
            ..SimEvent::default()
        };
        assert!(by_code.is_user_submitted());
        assert!(by_source.is_user_submitted());
    }

    #[test]
    fn unknown_tag_fails_to_parse() {
        let frame = r#"{"type":"mystery_event","data":{}}"#;
        assert!(serde_json::from_str::<ServerEvent>(frame).is_err());
    }

    #[test]
    fn action_start_frame_parses_with_sim_time() {
        let frame = r#"{"type":"action_start","data":{"npc_name":"Ada","action_title":"Work","emoji":"💻","sim_time":125,"day":3}}"#;
        let event: ServerEvent = serde_json::from_str(frame).expect("parse action_start frame");
        let ServerEvent::ActionStart(action) = event else {
            panic!("expected action_start variant");
        };
        assert_eq!(action.sim_time, Some(125));
        assert_eq!(action.npc_name.as_deref(), Some("Ada"));
    }
}
