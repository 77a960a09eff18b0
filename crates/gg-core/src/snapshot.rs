use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::script::SceneId;
use crate::state::SessionState;

pub const SAVE_SCHEMA_V1: &str = "galgame-save.v1";

/// The single saved session: `{currentSceneId, gameState, timestamp}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveSnapshot {
    #[serde(default = "default_schema")]
    pub schema_version: String,
    pub current_scene_id: SceneId,
    pub game_state: SessionState,
    pub timestamp: DateTime<Utc>,
}

fn default_schema() -> String {
    SAVE_SCHEMA_V1.to_string()
}

impl SaveSnapshot {
    pub fn capture(state: &SessionState, timestamp: DateTime<Utc>) -> Self {
        Self {
            schema_version: SAVE_SCHEMA_V1.to_string(),
            current_scene_id: state.current_scene_id,
            game_state: state.clone(),
            timestamp,
        }
    }
}
