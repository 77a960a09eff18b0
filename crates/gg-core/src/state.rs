use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::script::{NextTarget, SceneId, FIRST_SCENE_ID};

/// A recognized "special" player name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecialIdentity {
    pub user_type: String,
    #[serde(default)]
    pub character_id: Option<String>,
    pub character_name: String,
}

/// Armed by the greeting override; consumed by the next advance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingTrigger {
    pub user_type: String,
    pub overlay: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlaySnapshot {
    pub script: String,
    pub scene_id: SceneId,
    pub state: Box<SessionState>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum OverlayState {
    #[default]
    Base,
    #[serde(rename_all = "camelCase")]
    Overlay {
        name: String,
        saved: Box<OverlaySnapshot>,
    },
}

impl OverlayState {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Overlay { .. })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayMode {
    #[default]
    Script,
    FreeChat,
    Ended,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub current_scene_id: SceneId,
    pub active_script: String,
    #[serde(default)]
    pub choices: BTreeMap<SceneId, NextTarget>,
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
    #[serde(default)]
    pub affection: i64,
    #[serde(default)]
    pub loop_count: u32,
    #[serde(default)]
    pub identity: Option<SpecialIdentity>,
    #[serde(default)]
    pub pending: Option<PendingTrigger>,
    #[serde(default)]
    pub overlay: OverlayState,
    #[serde(default)]
    pub mode: PlayMode,
}

impl SessionState {
    pub fn new(base_script: impl Into<String>, variables: BTreeMap<String, String>) -> Self {
        Self {
            current_scene_id: FIRST_SCENE_ID,
            active_script: base_script.into(),
            choices: BTreeMap::new(),
            variables,
            affection: 0,
            loop_count: 0,
            identity: None,
            pending: None,
            overlay: OverlayState::Base,
            mode: PlayMode::Script,
        }
    }

    pub fn variable(&self, name: &str) -> Option<&str> {
        self.variables
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    pub fn in_overlay(&self) -> bool {
        self.overlay.is_active()
    }
}
