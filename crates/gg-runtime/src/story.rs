use std::collections::BTreeMap;

use gg_core::{OverlaySpec, FIRST_SCENE_ID};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CHARACTER_ASSETS: &str = "assets/characters/";
pub const DEFAULT_BACKGROUND_ASSETS: &str = "assets/backgrounds/";

/// Directory prefixes joined (by plain concatenation) with asset file names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AssetRoot {
    #[serde(default = "default_characters")]
    pub characters: String,
    #[serde(default = "default_backgrounds")]
    pub backgrounds: String,
}

fn default_characters() -> String {
    DEFAULT_CHARACTER_ASSETS.to_string()
}

fn default_backgrounds() -> String {
    DEFAULT_BACKGROUND_ASSETS.to_string()
}

impl Default for AssetRoot {
    fn default() -> Self {
        Self {
            characters: default_characters(),
            backgrounds: default_backgrounds(),
        }
    }
}

impl AssetRoot {
    pub fn character(&self, file: &str) -> String {
        format!("{}{}", self.characters, file)
    }

    pub fn background(&self, file: &str) -> String {
        format!("{}{}", self.backgrounds, file)
    }
}

/// Static description of one story: which script is the base and which
/// overlays may replace it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryConfig {
    pub title: String,
    pub base_script: String,
    pub protagonist: String,
    pub assets: AssetRoot,
    pub overlays: BTreeMap<String, OverlaySpec>,
}

impl StoryConfig {
    pub fn new(base_script: impl Into<String>, protagonist: impl Into<String>) -> Self {
        Self {
            title: String::new(),
            base_script: base_script.into(),
            protagonist: protagonist.into(),
            assets: AssetRoot::default(),
            overlays: BTreeMap::new(),
        }
    }

    /// Unregistered names resolve to `<name>.json` starting at the first scene.
    pub fn overlay_spec(&self, name: &str) -> OverlaySpec {
        self.overlays.get(name).cloned().unwrap_or_else(|| OverlaySpec {
            script: format!("{}.json", name),
            start_scene: FIRST_SCENE_ID,
        })
    }
}
