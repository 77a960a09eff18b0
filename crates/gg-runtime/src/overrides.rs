use std::collections::BTreeMap;

use gg_core::{GalgameError, PendingTrigger, Scene, SceneId, SessionState, SpecialIdentity};
use serde::{Deserialize, Serialize};

const CHARACTER_NAME_PLACEHOLDER: &str = "{character_name}";

/// Data table of recognized player names and their greeting replacements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecialResponseTable {
    /// Input variable whose submissions run name recognition.
    #[serde(default = "default_name_variable")]
    pub name_variable: String,
    #[serde(default)]
    pub greeting_scene_id: Option<SceneId>,
    /// The greeting is only replaced when the raw scene text contains one of these.
    #[serde(default)]
    pub greeting_markers: Vec<String>,
    #[serde(default)]
    pub identities: Vec<IdentityEntry>,
    /// Generic reply per user type, for entries without their own.
    #[serde(default)]
    pub fallbacks: BTreeMap<String, ResponseTemplate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityEntry {
    pub names: Vec<String>,
    pub user_type: String,
    #[serde(default)]
    pub character_id: Option<String>,
    #[serde(default)]
    pub reply: Option<String>,
    #[serde(default)]
    pub emotion: Option<String>,
    /// Overlay loaded on the click after the greeting.
    #[serde(default)]
    pub overlay: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseTemplate {
    pub reply: String,
    #[serde(default)]
    pub emotion: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecialResponse {
    pub text: String,
    pub emotion: Option<String>,
    pub trigger: Option<PendingTrigger>,
}

fn default_name_variable() -> String {
    "player_name".to_string()
}

impl Default for SpecialResponseTable {
    fn default() -> Self {
        Self {
            name_variable: default_name_variable(),
            greeting_scene_id: None,
            greeting_markers: Vec::new(),
            identities: Vec::new(),
            fallbacks: BTreeMap::new(),
        }
    }
}

impl SpecialResponseTable {
    pub fn parse(raw: &str) -> Result<Self, GalgameError> {
        serde_json::from_str(raw).map_err(|error| {
            GalgameError::new(
                "BUNDLE_SPECIAL_RESPONSES",
                format!("Failed to parse special responses: {}", error),
            )
        })
    }

    /// Exact-match lookup of a submitted name. `None` means an ordinary player.
    pub fn recognize(&self, name: &str) -> Option<SpecialIdentity> {
        let name = name.trim();
        self.identities
            .iter()
            .find(|entry| entry.names.iter().any(|candidate| candidate == name))
            .map(|entry| SpecialIdentity {
                user_type: entry.user_type.clone(),
                character_id: entry.character_id.clone(),
                character_name: name.to_string(),
            })
    }

    /// Greeting replacement for the current identity, if `scene` is the greeting.
    pub fn resolve(&self, scene: &Scene, state: &SessionState) -> Option<SpecialResponse> {
        let identity = state.identity.as_ref()?;
        if self.greeting_scene_id != Some(scene.id) {
            return None;
        }
        if !self.greeting_markers.is_empty()
            && !self
                .greeting_markers
                .iter()
                .any(|marker| scene.text.contains(marker.as_str()))
        {
            return None;
        }

        let entry = self.identities.iter().find(|entry| {
            entry.user_type == identity.user_type && entry.character_id == identity.character_id
        })?;
        let (reply, emotion) = match &entry.reply {
            Some(reply) => (reply.clone(), entry.emotion.clone()),
            None => {
                let template = self.fallbacks.get(&entry.user_type)?;
                (
                    template.reply.clone(),
                    entry.emotion.clone().or_else(|| template.emotion.clone()),
                )
            }
        };

        Some(SpecialResponse {
            text: reply.replace(CHARACTER_NAME_PLACEHOLDER, &identity.character_name),
            emotion,
            trigger: entry.overlay.as_ref().map(|overlay| PendingTrigger {
                user_type: identity.user_type.clone(),
                overlay: overlay.clone(),
            }),
        })
    }
}
