use serde::{Deserialize, Serialize};

use crate::script::{SceneId, SceneKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRef {
    pub name: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpriteView {
    pub character: String,
    pub pose: String,
    pub path: String,
    #[serde(default)]
    pub position: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceItem {
    pub index: usize,
    pub text: String,
}

/// A scene ready for presentation: placeholders substituted, assets resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneView {
    pub script: String,
    pub scene_id: SceneId,
    pub kind: SceneKind,
    pub speaker: String,
    pub text: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub background: Option<AssetRef>,
    #[serde(default)]
    pub sprite: Option<SpriteView>,
    pub hint: String,
    #[serde(default)]
    pub choices: Vec<ChoiceItem>,
    #[serde(default)]
    pub input_placeholder: Option<String>,
    pub affection: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreeChatView {
    pub intro: String,
    pub speaker: String,
    #[serde(default)]
    pub background: Option<AssetRef>,
    #[serde(default)]
    pub sprite: Option<SpriteView>,
    pub hint: String,
    pub affection: i64,
}

/// Result of one free-chat exchange after it has been applied to the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatView {
    pub speaker: String,
    pub reply: String,
    pub emotion: String,
    #[serde(default)]
    pub sprite: Option<SpriteView>,
    pub affection: i64,
    pub affection_gain: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EngineOutput {
    Scene(SceneView),
    FreeChat(FreeChatView),
    /// The event was accepted but nothing changed (e.g. advancing on a choice scene).
    Unchanged,
    Ended {
        message: String,
    },
}
