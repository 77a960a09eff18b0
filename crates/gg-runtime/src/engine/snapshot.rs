use chrono::{DateTime, Utc};
use gg_core::{EngineOutput, GalgameError, OverlayState, SaveSnapshot, SAVE_SCHEMA_V1};
use tracing::info;

use super::GalgameEngine;
use crate::reducer::Event;

impl GalgameEngine {
    pub fn snapshot(&self) -> SaveSnapshot {
        self.snapshot_at(Utc::now())
    }

    pub fn snapshot_at(&self, timestamp: DateTime<Utc>) -> SaveSnapshot {
        SaveSnapshot::capture(&self.state, timestamp)
    }

    /// Replaces the session with `snapshot` and renders where it left off.
    /// Every script the snapshot refers to must load.
    pub fn resume(&mut self, snapshot: SaveSnapshot) -> Result<EngineOutput, GalgameError> {
        if snapshot.schema_version != SAVE_SCHEMA_V1 {
            return Err(GalgameError::new(
                "SNAPSHOT_SCHEMA",
                format!(
                    "Unsupported snapshot schema \"{}\".",
                    snapshot.schema_version
                ),
            ));
        }

        let mut state = snapshot.game_state;
        state.current_scene_id = snapshot.current_scene_id;

        let mut scripts = vec![state.active_script.clone()];
        if let OverlayState::Overlay { saved, .. } = &state.overlay {
            scripts.push(saved.script.clone());
        }
        for script in &scripts {
            self.library.ensure(script).map_err(|error| {
                GalgameError::new(
                    "SNAPSHOT_SCRIPT",
                    format!("Snapshot script \"{}\" cannot be loaded: {}", script, error),
                )
            })?;
        }

        info!(
            script = %state.active_script,
            scene = state.current_scene_id,
            saved_at = %snapshot.timestamp,
            "session resumed"
        );
        self.state = state;
        self.dispatch(Event::Refresh)
    }
}
