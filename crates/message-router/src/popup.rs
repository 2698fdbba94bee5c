use std::sync::Arc;

use tracing::debug;

use puzlog_core_types::{Alert, PuzlogError, PuzzleId};
use puzlog_puzzle_model::{deserialize, PuzzleRecord, PuzzleStatus};

use crate::errors::RouterError;
use crate::protocol::{Message, MessageKind, Origin, Response};
use crate::runtime::ExtensionRuntime;
use crate::tabs::{TabId, TabInfo};

/// What the popup shows for the focused tab.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TabStatus {
    pub tab: TabInfo,
    pub puzzle_id: PuzzleId,
    pub status: PuzzleStatus,
}

/// Popup actions. Every failure reaches the caller as an [`Alert`].
pub struct PopupClient {
    runtime: Arc<ExtensionRuntime>,
}

impl PopupClient {
    pub fn new(runtime: Arc<ExtensionRuntime>) -> Self {
        Self { runtime }
    }

    pub async fn tab_status(&self) -> Result<TabStatus, Alert> {
        self.try_tab_status().await.map_err(alert)
    }

    pub async fn start(&self) -> Result<PuzzleRecord, Alert> {
        self.relay(MessageKind::Start).await.map_err(alert)
    }

    pub async fn finish(&self) -> Result<PuzzleRecord, Alert> {
        self.relay(MessageKind::Finish).await.map_err(alert)
    }

    pub async fn resume(&self) -> Result<PuzzleRecord, Alert> {
        self.relay(MessageKind::Resume).await.map_err(alert)
    }

    pub async fn open_app(&self) -> Result<TabId, Alert> {
        match self
            .runtime
            .send_to_worker(Origin::Popup, Message::OpenPuzlogTab)
            .await
        {
            Ok(Response::TabOpened { tab_id }) => Ok(tab_id),
            Ok(_) => Err(alert(RouterError::UnexpectedResponse(MessageKind::OpenPuzlogTab))),
            Err(err) => Err(alert(err)),
        }
    }

    /// Confirms a content script is loaded in the focused tab and returns its puzzle.
    async fn loaded_puzzle(&self) -> Result<(TabInfo, PuzzleId), RouterError> {
        let (tab, response) = self
            .runtime
            .send_to_active_tab(Origin::Popup, Message::GetContentScriptStatus)
            .await?;
        match response {
            Response::ContentScriptStatus {
                loaded: true,
                puzzle_id: Some(puzzle_id),
            } => Ok((tab, puzzle_id)),
            Response::ContentScriptStatus { .. } => Err(RouterError::unreachable(
                "No puzzle on this page",
                format!("{} is not a puzzle Puzlog recognises", tab.url),
            )),
            _ => Err(RouterError::UnexpectedResponse(
                MessageKind::GetContentScriptStatus,
            )),
        }
    }

    async fn try_tab_status(&self) -> Result<TabStatus, RouterError> {
        let (tab, puzzle_id) = self.loaded_puzzle().await?;
        match self
            .runtime
            .send_to_tab(tab.id, Origin::Popup, Message::GetTabPuzzleStatus)
            .await?
        {
            Response::TabPuzzleStatus { puzzle_id, status } => Ok(TabStatus {
                tab,
                puzzle_id,
                status,
            }),
            _ => {
                debug!(%puzzle_id, "tab answered status query with something else");
                Err(RouterError::UnexpectedResponse(
                    MessageKind::GetTabPuzzleStatus,
                ))
            }
        }
    }

    async fn relay(&self, kind: MessageKind) -> Result<PuzzleRecord, RouterError> {
        let (tab, puzzle_id) = self.loaded_puzzle().await?;
        let message = match kind {
            MessageKind::Start => Message::Start {
                puzzle_id,
                url: tab.url,
                title: tab.title,
            },
            MessageKind::Finish => Message::Finish { puzzle_id },
            MessageKind::Resume => Message::Resume { puzzle_id },
            other => return Err(RouterError::NoHandler(other)),
        };
        match self.runtime.send_to_worker(Origin::Popup, message).await? {
            Response::PuzzleState { puzzle_state } => Ok(deserialize(puzzle_state)?),
            _ => Err(RouterError::UnexpectedResponse(kind)),
        }
    }
}

fn alert(err: RouterError) -> Alert {
    Alert::from(&PuzlogError::from(err))
}
