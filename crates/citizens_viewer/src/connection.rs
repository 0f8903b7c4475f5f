//! The persistent event socket: one reader thread that parses inbound
//! frames into typed events, and the single dispatch table that turns
//! them into log lines and refetch signals. The connection layer never
//! touches rendering.

use std::sync::mpsc::{self, Receiver};
use std::thread;

use citizens_proto::ServerEvent;
use tungstenite::protocol::Message;
use tungstenite::Error as WsError;

use crate::store::SimStore;

/// One parsed notification from the socket reader thread.
#[derive(Debug, Clone, PartialEq)]
pub enum SocketUpdate {
    Opened,
    Event(ServerEvent),
    /// Frame dropped; the connection stays up.
    Malformed { detail: String },
    Closed {
        code: Option<u16>,
        reason: String,
    },
    Failed {
        message: String,
    },
}

/// Scheme-translates the HTTP API base into the event socket URL.
pub fn websocket_url(api_base: &str) -> String {
    let base = api_base.trim_end_matches('/');
    let translated = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        base.to_string()
    };
    format!("{translated}/ws")
}

/// Spawns the reader thread for one socket lifetime.
///
/// Every frame becomes exactly one [`SocketUpdate`]; the channel
/// closing after `Closed`/`Failed` is the end-of-life signal the app
/// loop uses to schedule a reconnect.
pub fn spawn_socket_reader(api_base: String) -> Receiver<SocketUpdate> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let url = websocket_url(&api_base);
        let mut socket = match tungstenite::connect(url.as_str()) {
            Ok((socket, _response)) => socket,
            Err(err) => {
                let _ = tx.send(SocketUpdate::Failed {
                    message: err.to_string(),
                });
                return;
            }
        };
        if tx.send(SocketUpdate::Opened).is_err() {
            return;
        }
        loop {
            match socket.read() {
                Ok(Message::Text(text)) => {
                    if tx.send(parse_frame(&text)).is_err() {
                        break;
                    }
                }
                Ok(Message::Binary(binary)) => {
                    let update = match String::from_utf8(binary) {
                        Ok(text) => parse_frame(&text),
                        Err(_) => SocketUpdate::Malformed {
                            detail: "non-UTF-8 binary frame".to_string(),
                        },
                    };
                    if tx.send(update).is_err() {
                        break;
                    }
                }
                Ok(Message::Ping(payload)) => {
                    if socket.send(Message::Pong(payload)).is_err() {
                        break;
                    }
                }
                Ok(Message::Pong(_)) | Ok(Message::Frame(_)) => {}
                Ok(Message::Close(frame)) => {
                    let (code, reason) = match frame {
                        Some(frame) => (
                            Some(u16::from(frame.code)),
                            frame.reason.into_owned(),
                        ),
                        None => (None, String::new()),
                    };
                    let _ = tx.send(SocketUpdate::Closed { code, reason });
                    break;
                }
                Err(WsError::ConnectionClosed) | Err(WsError::AlreadyClosed) => {
                    let _ = tx.send(SocketUpdate::Closed {
                        code: None,
                        reason: "connection closed".to_string(),
                    });
                    break;
                }
                Err(err) => {
                    let _ = tx.send(SocketUpdate::Failed {
                        message: err.to_string(),
                    });
                    break;
                }
            }
        }
    });
    rx
}

fn parse_frame(text: &str) -> SocketUpdate {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return SocketUpdate::Malformed {
            detail: "empty frame".to_string(),
        };
    }
    match serde_json::from_str::<ServerEvent>(trimmed) {
        Ok(event) => SocketUpdate::Event(event),
        Err(err) => SocketUpdate::Malformed {
            detail: err.to_string(),
        },
    }
}

/// What the app loop should do after one update was dispatched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dispatch {
    /// A fresh full-state snapshot should be requested.
    pub refetch_snapshot: bool,
    /// Actor name a debounced detail refresh may apply to.
    pub detail_candidate: Option<String>,
}

/// The single dispatch table over the closed event union. All log
/// lines go through the store's one append path, so log order matches
/// event-arrival order.
pub fn apply_socket_update(store: &mut SimStore, update: &SocketUpdate) -> Dispatch {
    match update {
        SocketUpdate::Opened => {
            store.push_log("Connected to simulation server.");
            Dispatch {
                refetch_snapshot: true,
                detail_candidate: None,
            }
        }
        SocketUpdate::Event(event) => apply_server_event(store, event),
        SocketUpdate::Malformed { .. } => {
            store.push_log("Received malformed data from server.");
            Dispatch::default()
        }
        SocketUpdate::Closed { code, .. } => {
            match code {
                Some(code) => store.push_log(format!("Disconnected: Code {code}")),
                None => store.push_log("Disconnected: Code -"),
            }
            Dispatch::default()
        }
        SocketUpdate::Failed { .. } => {
            store.push_log("WebSocket error occurred.");
            Dispatch::default()
        }
    }
}

fn apply_server_event(store: &mut SimStore, event: &ServerEvent) -> Dispatch {
    match event {
        ServerEvent::TickUpdate(_) => Dispatch {
            refetch_snapshot: true,
            detail_candidate: None,
        },
        ServerEvent::SimEvent(sim) => {
            let description = sim.description.as_deref().unwrap_or("(no description)");
            let day = day_label(sim.day);
            if sim.is_user_submitted() {
                store.push_log(format!("📣 DAY {day} USER EVENT: {description}"));
            } else {
                let emoji = match sim.event_code.as_deref() {
                    Some("fire_alarm") => "🔥",
                    Some("pizza_drop") => "🍕",
                    Some("wifi_down") => "📉",
                    _ => "⚠️",
                };
                store.push_log(format!("{emoji} DAY {day} EVENT: {description}"));
            }
            Dispatch::default()
        }
        ServerEvent::PlanningEvent(plan) => {
            let npc = plan.npc_name.as_deref().unwrap_or("?");
            let status = plan.status.as_deref().unwrap_or("planning");
            let count = plan
                .num_actions
                .map(|n| format!(" ({n} actions)"))
                .unwrap_or_default();
            store.push_log(format!(
                "📋 PLAN D{}: {npc} {status}{count}.",
                day_label(plan.day)
            ));
            Dispatch {
                refetch_snapshot: false,
                detail_candidate: plan.npc_name.clone(),
            }
        }
        ServerEvent::ReflectionEvent(reflection) => {
            let npc = reflection.npc_name.as_deref().unwrap_or("?");
            let status = reflection.status.as_deref().unwrap_or("reflecting");
            store.push_log(format!(
                "🤔 REFLECT D{}: {npc} {status}.",
                day_label(reflection.day)
            ));
            Dispatch {
                refetch_snapshot: false,
                detail_candidate: reflection.npc_name.clone(),
            }
        }
        ServerEvent::ActionStart(action) => {
            let npc = action.npc_name.as_deref().unwrap_or("?");
            let title = action.action_title.as_deref().unwrap_or("(untitled)");
            let emoji = action.emoji.as_deref().unwrap_or("🎬");
            let time = action
                .sim_time
                .map(format_hh_mm)
                .map(|hhmm| format!("{hhmm} "))
                .unwrap_or_default();
            store.push_log(format!(
                "{emoji} D{} {time}{npc}: {title}",
                day_label(action.day)
            ));
            Dispatch {
                refetch_snapshot: false,
                detail_candidate: action.npc_name.clone(),
            }
        }
        ServerEvent::SocialEvent(social) => {
            let observer = social.observer_npc_name.as_deref().unwrap_or("?");
            let description = match social.description.as_deref() {
                Some(description) => description.to_string(),
                None => format!(
                    "noticed {}",
                    social.target_npc_name.as_deref().unwrap_or("someone")
                ),
            };
            store.push_log(format!(
                "👀 D{} {observer}: {description}",
                day_label(social.day)
            ));
            Dispatch::default()
        }
        ServerEvent::DialogueEvent(dialogue) => {
            let a = dialogue.npc_a_name.as_deref().unwrap_or("?");
            let b = dialogue.npc_b_name.as_deref().unwrap_or("?");
            let summary = dialogue
                .summary
                .as_deref()
                .map(|summary| format!(": {summary}"))
                .unwrap_or_default();
            store.push_log(format!("💬 D{}: {a} ⇄ {b}{summary}", day_label(dialogue.day)));
            Dispatch::default()
        }
        // The tick cadence already covers the roll-up's content.
        ServerEvent::NpcStatusSummary(_) => Dispatch::default(),
    }
}

/// Zero-padded HH:MM from a minutes-of-day integer.
pub fn format_hh_mm(sim_time: u32) -> String {
    format!("{:02}:{:02}", (sim_time / 60) % 24, sim_time % 60)
}

fn day_label(day: Option<u32>) -> String {
    day.map(|day| day.to_string())
        .unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use citizens_proto::{
        ActionStart, DialogueEvent, PlanningEvent, ReflectionEvent, SimEvent, SocialEvent,
        TickUpdate,
    };

    fn first_line(store: &SimStore) -> String {
        store.log().next().expect("log line").to_string()
    }

    #[test]
    fn websocket_url_translates_scheme_and_appends_path() {
        assert_eq!(
            websocket_url("http://127.0.0.1:8000"),
            "ws://127.0.0.1:8000/ws"
        );
        assert_eq!(
            websocket_url("https://sim.example.org/"),
            "wss://sim.example.org/ws"
        );
    }

    #[test]
    fn open_triggers_log_line_and_snapshot_refetch() {
        let mut store = SimStore::new();
        let dispatch = apply_socket_update(&mut store, &SocketUpdate::Opened);
        assert!(dispatch.refetch_snapshot);
        assert_eq!(first_line(&store), "Connected to simulation server.");
    }

    #[test]
    fn tick_update_requests_refetch_without_logging() {
        let mut store = SimStore::new();
        let dispatch = apply_socket_update(
            &mut store,
            &SocketUpdate::Event(ServerEvent::TickUpdate(TickUpdate::default())),
        );
        assert!(dispatch.refetch_snapshot);
        assert_eq!(store.log().count(), 0);
    }

    #[test]
    fn sim_event_lines_pick_emoji_by_code() {
        let mut store = SimStore::new();
        apply_socket_update(
            &mut store,
            &SocketUpdate::Event(ServerEvent::SimEvent(SimEvent {
                event_code: Some("fire_alarm".to_string()),
                description: Some("The fire alarm blares!".to_string()),
                day: Some(2),
                ..SimEvent::default()
            })),
        );
        assert_eq!(first_line(&store), "🔥 DAY 2 EVENT: The fire alarm blares!");

        apply_socket_update(
            &mut store,
            &SocketUpdate::Event(ServerEvent::SimEvent(SimEvent {
                event_code: Some("user_submitted".to_string()),
                description: Some("A parade starts outside.".to_string()),
                day: Some(2),
                ..SimEvent::default()
            })),
        );
        assert_eq!(
            first_line(&store),
            "📣 DAY 2 USER EVENT: A parade starts outside."
        );
    }

    #[test]
    fn planning_line_includes_action_count_and_names_candidate() {
        let mut store = SimStore::new();
        let dispatch = apply_socket_update(
            &mut store,
            &SocketUpdate::Event(ServerEvent::PlanningEvent(PlanningEvent {
                npc_name: Some("Ada".to_string()),
                status: Some("completed_planning".to_string()),
                day: Some(3),
                num_actions: Some(5),
            })),
        );
        assert_eq!(
            first_line(&store),
            "📋 PLAN D3: Ada completed_planning (5 actions)."
        );
        assert_eq!(dispatch.detail_candidate.as_deref(), Some("Ada"));
        assert!(!dispatch.refetch_snapshot);
    }

    #[test]
    fn reflection_line_names_candidate() {
        let mut store = SimStore::new();
        let dispatch = apply_socket_update(
            &mut store,
            &SocketUpdate::Event(ServerEvent::ReflectionEvent(ReflectionEvent {
                npc_name: Some("Grace".to_string()),
                status: Some("completed_reflection".to_string()),
                day: Some(1),
                num_reflections: None,
            })),
        );
        assert_eq!(first_line(&store), "🤔 REFLECT D1: Grace completed_reflection.");
        assert_eq!(dispatch.detail_candidate.as_deref(), Some("Grace"));
    }

    #[test]
    fn action_start_line_zero_pads_minutes_of_day() {
        let mut store = SimStore::new();
        let dispatch = apply_socket_update(
            &mut store,
            &SocketUpdate::Event(ServerEvent::ActionStart(ActionStart {
                npc_name: Some("Ada".to_string()),
                action_title: Some("Work".to_string()),
                emoji: Some("💻".to_string()),
                sim_time: Some(125),
                day: Some(3),
            })),
        );
        assert_eq!(first_line(&store), "💻 D3 02:05 Ada: Work");
        assert_eq!(dispatch.detail_candidate.as_deref(), Some("Ada"));

        assert_eq!(format_hh_mm(1439), "23:59");
        assert_eq!(format_hh_mm(0), "00:00");
    }

    #[test]
    fn social_and_dialogue_lines_name_participants() {
        let mut store = SimStore::new();
        apply_socket_update(
            &mut store,
            &SocketUpdate::Event(ServerEvent::SocialEvent(SocialEvent {
                observer_npc_name: Some("Ada".to_string()),
                target_npc_name: Some("Grace".to_string()),
                description: Some("[Social] I saw Grace enter the Lounge.".to_string()),
                day: Some(2),
                ..SocialEvent::default()
            })),
        );
        assert_eq!(
            first_line(&store),
            "👀 D2 Ada: [Social] I saw Grace enter the Lounge."
        );

        apply_socket_update(
            &mut store,
            &SocketUpdate::Event(ServerEvent::DialogueEvent(DialogueEvent {
                npc_a_name: Some("Ada".to_string()),
                npc_b_name: Some("Grace".to_string()),
                summary: None,
                day: Some(2),
            })),
        );
        assert_eq!(first_line(&store), "💬 D2: Ada ⇄ Grace");
    }

    #[test]
    fn malformed_and_closed_updates_log_without_side_effects() {
        let mut store = SimStore::new();
        let dispatch = apply_socket_update(
            &mut store,
            &SocketUpdate::Malformed {
                detail: "bad json".to_string(),
            },
        );
        assert_eq!(dispatch, Dispatch::default());
        assert_eq!(first_line(&store), "Received malformed data from server.");

        apply_socket_update(
            &mut store,
            &SocketUpdate::Closed {
                code: Some(1006),
                reason: String::new(),
            },
        );
        assert_eq!(first_line(&store), "Disconnected: Code 1006");
    }

    #[test]
    fn unparseable_frame_becomes_malformed_update() {
        assert!(matches!(
            parse_frame("{not json"),
            SocketUpdate::Malformed { .. }
        ));
        assert!(matches!(
            parse_frame(r#"{"type":"mystery","data":{}}"#),
            SocketUpdate::Malformed { .. }
        ));
        assert!(matches!(
            parse_frame(r#"{"type":"tick_update","data":{}}"#),
            SocketUpdate::Event(ServerEvent::TickUpdate(_))
        ));
    }
}
