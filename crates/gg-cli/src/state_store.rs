use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use gg_core::{GalgameError, SaveSnapshot};
use tracing::{info, warn};

use crate::{
    map_cli_state_encode, map_cli_state_invalid, map_cli_state_read, map_cli_state_write,
    PlayerState, LOCAL_SAVE_KEY, PLAYER_STATE_SCHEMA,
};

fn ensure_parent(path: &Path) -> Result<(), GalgameError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(map_cli_state_write)
}

pub(crate) fn save_player_state(path: &Path, state: &PlayerState) -> Result<(), GalgameError> {
    ensure_parent(path)?;
    let payload = serde_json::to_string(state).map_err(map_cli_state_encode)?;
    fs::write(path, payload).map_err(map_cli_state_write)
}

pub(crate) fn load_player_state(path: &Path) -> Result<PlayerState, GalgameError> {
    if !path.exists() {
        return Err(GalgameError::new(
            "CLI_STATE_NOT_FOUND",
            format!("State file does not exist: {}", path.display()),
        ));
    }

    let raw = fs::read_to_string(path).map_err(map_cli_state_read)?;
    let state: PlayerState = serde_json::from_str(&raw).map_err(map_cli_state_invalid)?;

    if state.schema_version != PLAYER_STATE_SCHEMA {
        return Err(GalgameError::new(
            "CLI_STATE_SCHEMA",
            format!("Unsupported player state schema: {}", state.schema_version),
        ));
    }

    Ok(state)
}

/// String key/value file with browser local-storage semantics.
#[derive(Debug, Clone)]
pub(crate) struct LocalStore {
    path: PathBuf,
}

impl LocalStore {
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file is an empty store; an unreadable one is reset with a warning.
    fn read_all(&self) -> Result<BTreeMap<String, String>, GalgameError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(error) => return Err(map_cli_state_read(error)),
        };
        match serde_json::from_str(&raw) {
            Ok(items) => Ok(items),
            Err(error) => {
                warn!(path = %self.path.display(), %error, "local storage file is malformed");
                Ok(BTreeMap::new())
            }
        }
    }

    fn write_all(&self, items: &BTreeMap<String, String>) -> Result<(), GalgameError> {
        ensure_parent(&self.path)?;
        let payload = serde_json::to_string_pretty(items).map_err(map_cli_state_encode)?;
        fs::write(&self.path, payload).map_err(map_cli_state_write)
    }

    pub(crate) fn get_item(&self, key: &str) -> Result<Option<String>, GalgameError> {
        Ok(self.read_all()?.remove(key))
    }

    pub(crate) fn set_item(&self, key: &str, value: &str) -> Result<(), GalgameError> {
        let mut items = self.read_all()?;
        items.insert(key.to_string(), value.to_string());
        self.write_all(&items)
    }

    pub(crate) fn remove_item(&self, key: &str) -> Result<(), GalgameError> {
        let mut items = self.read_all()?;
        if items.remove(key).is_some() {
            self.write_all(&items)?;
        }
        Ok(())
    }
}

pub(crate) fn save_local_snapshot(
    store: &LocalStore,
    snapshot: &SaveSnapshot,
) -> Result<(), GalgameError> {
    let payload = serde_json::to_string(snapshot).map_err(map_cli_state_encode)?;
    store.set_item(LOCAL_SAVE_KEY, &payload)?;
    info!(
        path = %store.path().display(),
        scene = snapshot.current_scene_id,
        "game saved"
    );
    Ok(())
}

/// `None` covers both "never saved" and a malformed entry.
pub(crate) fn load_local_snapshot(
    store: &LocalStore,
) -> Result<Option<SaveSnapshot>, GalgameError> {
    let Some(raw) = store.get_item(LOCAL_SAVE_KEY)? else {
        return Ok(None);
    };
    match serde_json::from_str::<SaveSnapshot>(&raw) {
        Ok(snapshot) => Ok(Some(snapshot)),
        Err(error) => {
            warn!(key = LOCAL_SAVE_KEY, %error, "saved game is malformed, ignoring it");
            Ok(None)
        }
    }
}
