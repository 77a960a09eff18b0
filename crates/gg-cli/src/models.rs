use gg_core::{SaveSnapshot, SceneId};
use serde::{Deserialize, Serialize};

pub(crate) const PLAYER_STATE_SCHEMA: &str = "galgame-player-state.v1";
pub(crate) const LOCAL_SAVE_KEY: &str = "galgame_save";
pub(crate) const DEFAULT_STATE_FILE: &str = ".galgame/storage.json";
pub(crate) const DEFAULT_LOG_FILE: &str = ".galgame/galgame.log";

/// Agent-mode state carried between invocations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PlayerState {
    pub(crate) schema_version: String,
    pub(crate) bundle_id: String,
    pub(crate) base_script: String,
    pub(crate) snapshot: SaveSnapshot,
    /// Where the next `chat` call resumes the reply randomness.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) chat_seed: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BoundaryEvent {
    Scene,
    Choices,
    Input,
    FreeChat,
    Chat,
    Unchanged,
    End,
}

impl BoundaryEvent {
    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Scene => "SCENE",
            Self::Choices => "CHOICES",
            Self::Input => "INPUT",
            Self::FreeChat => "FREE_CHAT",
            Self::Chat => "CHAT",
            Self::Unchanged => "UNCHANGED",
            Self::End => "END",
        }
    }

    /// Everything but the end keeps a resumable session.
    pub(crate) fn keeps_state(self) -> bool {
        self != Self::End
    }
}

/// One engine answer flattened for the line protocol and the terminal UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BoundaryResult {
    pub(crate) event: BoundaryEvent,
    pub(crate) scene_id: Option<SceneId>,
    pub(crate) title: Option<String>,
    pub(crate) speaker: Option<String>,
    pub(crate) texts: Vec<String>,
    pub(crate) background: Option<String>,
    pub(crate) sprite: Option<String>,
    pub(crate) hint: Option<String>,
    pub(crate) choices: Vec<(usize, String)>,
    pub(crate) input_placeholder: Option<String>,
    pub(crate) emotion: Option<String>,
    pub(crate) affection: Option<i64>,
    pub(crate) affection_gain: Option<i64>,
}

impl BoundaryResult {
    pub(crate) fn empty(event: BoundaryEvent) -> Self {
        Self {
            event,
            scene_id: None,
            title: None,
            speaker: None,
            texts: Vec::new(),
            background: None,
            sprite: None,
            hint: None,
            choices: Vec::new(),
            input_placeholder: None,
            emotion: None,
            affection: None,
            affection_gain: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TuiCommandAction {
    NotHandled,
    Continue,
    RefreshBoundary,
    Quit,
}
