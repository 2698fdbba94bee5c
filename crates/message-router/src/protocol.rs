//! Wire protocol shared by every extension context.
//!
//! Messages are tagged on `action` with the names the browser side uses.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use puzlog_core_types::PuzzleId;
use puzlog_puzzle_model::{PersistedPuzzle, PuzzleStatus, PuzzleUpdate};

use crate::tabs::TabId;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum Message {
    #[serde(rename = "start", rename_all = "camelCase")]
    Start {
        puzzle_id: PuzzleId,
        url: String,
        title: String,
    },
    #[serde(rename = "finish", rename_all = "camelCase")]
    Finish { puzzle_id: PuzzleId },
    #[serde(rename = "resume", rename_all = "camelCase")]
    Resume { puzzle_id: PuzzleId },
    #[serde(rename = "updatePuzzle", rename_all = "camelCase")]
    UpdatePuzzle {
        puzzle_id: PuzzleId,
        updated_values: PuzzleUpdate,
    },
    #[serde(rename = "OpenPuzlogTab")]
    OpenPuzlogTab,
    #[serde(rename = "getContentScriptStatus")]
    GetContentScriptStatus,
    #[serde(rename = "getTabPuzzleStatus")]
    GetTabPuzzleStatus,
    #[serde(rename = "stateUpdated", rename_all = "camelCase")]
    StateUpdated { puzzle_state: PersistedPuzzle },
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::Start { .. } => MessageKind::Start,
            Message::Finish { .. } => MessageKind::Finish,
            Message::Resume { .. } => MessageKind::Resume,
            Message::UpdatePuzzle { .. } => MessageKind::UpdatePuzzle,
            Message::OpenPuzlogTab => MessageKind::OpenPuzlogTab,
            Message::GetContentScriptStatus => MessageKind::GetContentScriptStatus,
            Message::GetTabPuzzleStatus => MessageKind::GetTabPuzzleStatus,
            Message::StateUpdated { .. } => MessageKind::StateUpdated,
        }
    }
}

/// Discriminant a router registers handlers under.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum MessageKind {
    Start,
    Finish,
    Resume,
    UpdatePuzzle,
    OpenPuzlogTab,
    GetContentScriptStatus,
    GetTabPuzzleStatus,
    StateUpdated,
}

impl MessageKind {
    pub fn action(self) -> &'static str {
        match self {
            MessageKind::Start => "start",
            MessageKind::Finish => "finish",
            MessageKind::Resume => "resume",
            MessageKind::UpdatePuzzle => "updatePuzzle",
            MessageKind::OpenPuzlogTab => "OpenPuzlogTab",
            MessageKind::GetContentScriptStatus => "getContentScriptStatus",
            MessageKind::GetTabPuzzleStatus => "getTabPuzzleStatus",
            MessageKind::StateUpdated => "stateUpdated",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.action())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Response {
    Ack,
    #[serde(rename_all = "camelCase")]
    PuzzleState { puzzle_state: PersistedPuzzle },
    #[serde(rename_all = "camelCase")]
    ContentScriptStatus {
        loaded: bool,
        puzzle_id: Option<PuzzleId>,
    },
    #[serde(rename_all = "camelCase")]
    TabPuzzleStatus {
        puzzle_id: PuzzleId,
        status: PuzzleStatus,
    },
    #[serde(rename_all = "camelCase")]
    TabOpened { tab_id: TabId },
}

/// Which context a message came from.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Origin {
    Worker,
    Tab(TabId),
    Popup,
    App,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub id: Uuid,
    pub origin: Origin,
    pub message: Message,
}

impl Envelope {
    pub fn new(origin: Origin, message: Message) -> Self {
        Self {
            id: Uuid::new_v4(),
            origin,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn actions_use_browser_names() {
        let message = Message::UpdatePuzzle {
            puzzle_id: PuzzleId::from_url("https://example.com/p/1"),
            updated_values: PuzzleUpdate::elapsed(61_000),
        };
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({
                "action": "updatePuzzle",
                "puzzleId": "https://example.com/p/1",
                "updatedValues": { "elapsedTime": 61000 }
            })
        );
        let open: Message = serde_json::from_value(json!({ "action": "OpenPuzlogTab" })).unwrap();
        assert_eq!(open.kind(), MessageKind::OpenPuzlogTab);
    }

    #[test]
    fn unknown_action_is_rejected() {
        assert!(serde_json::from_value::<Message>(json!({ "action": "explode" })).is_err());
    }

    #[test]
    fn status_response_shape() {
        let response = Response::ContentScriptStatus {
            loaded: true,
            puzzle_id: Some(PuzzleId::from_url("https://example.com/p/1")),
        };
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({ "type": "ContentScriptStatus", "loaded": true, "puzzleId": "https://example.com/p/1" })
        );
    }
}
