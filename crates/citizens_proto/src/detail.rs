use serde::{Deserialize, Serialize};

/// Expanded detail payload of `GET /npc_details/{id}`: recent and
/// queued actions, reflections, the current plan summary, and a tagged
/// memory stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpcDetail {
    pub npc_id: String,
    pub npc_name: String,
    #[serde(default)]
    pub last_completed_action: Option<ActionInfo>,
    #[serde(default)]
    pub completed_actions: Vec<ActionInfo>,
    #[serde(default)]
    pub queued_actions: Vec<ActionInfo>,
    #[serde(default)]
    pub latest_reflection: Option<String>,
    #[serde(default)]
    pub reflections: Vec<ReflectionInfo>,
    #[serde(default)]
    pub current_plan_summary: Vec<String>,
    #[serde(default)]
    pub memory_stream: Vec<MemoryEvent>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionInfo {
    #[serde(default)]
    pub time: Option<String>,
    pub title: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub area_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReflectionInfo {
    pub content: String,
    #[serde(default)]
    pub time: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryEvent {
    pub content: String,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_parses_with_minimal_payload() {
        let payload = r#"{"npc_id":"n1","npc_name":"Ada"}"#;
        let detail: NpcDetail = serde_json::from_str(payload).expect("parse minimal detail");
        assert_eq!(detail.npc_name, "Ada");
        assert!(detail.completed_actions.is_empty());
        assert!(detail.memory_stream.is_empty());
    }

    #[test]
    fn memory_event_kind_maps_from_type_key() {
        let payload = r#"{"content":"[Social] I saw Grace enter the Lounge.","time":"08:00","type":"obs"}"#;
        let memory: MemoryEvent = serde_json::from_str(payload).expect("parse memory event");
        assert_eq!(memory.kind.as_deref(), Some("obs"));
    }
}
