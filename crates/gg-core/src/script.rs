use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::GalgameError;

pub type SceneId = u32;

pub const FIRST_SCENE_ID: SceneId = 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneKind {
    #[default]
    Dialogue,
    Choice,
    Input,
    Narration,
    SceneChange,
    Ending,
    FreeChat,
}

impl SceneKind {
    /// Choice and input scenes only move on an explicit selection or submission.
    pub fn waits_for_interaction(self) -> bool {
        matches!(self, Self::Choice | Self::Input)
    }
}

/// Where a scene (or a choice) sends the cursor next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTarget", into = "RawTarget")]
pub enum NextTarget {
    GoToScene(SceneId),
    EnterFreeChat,
    EndOverlay,
    LoadOverlay(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawTarget {
    Id(SceneId),
    Token(String),
}

impl TryFrom<RawTarget> for NextTarget {
    type Error = String;

    fn try_from(raw: RawTarget) -> Result<Self, Self::Error> {
        match raw {
            RawTarget::Id(id) => Ok(Self::GoToScene(id)),
            RawTarget::Token(token) => NextTarget::parse_token(&token),
        }
    }
}

impl From<NextTarget> for RawTarget {
    fn from(target: NextTarget) -> Self {
        match target {
            NextTarget::GoToScene(id) => RawTarget::Id(id),
            other => RawTarget::Token(other.to_string()),
        }
    }
}

impl NextTarget {
    pub fn parse_token(token: &str) -> Result<Self, String> {
        let token = token.trim();
        if let Ok(id) = token.parse::<SceneId>() {
            return Ok(Self::GoToScene(id));
        }
        match token {
            "free_chat" => return Ok(Self::EnterFreeChat),
            "special_end" => return Ok(Self::EndOverlay),
            _ => {}
        }
        let overlay = token
            .strip_prefix("load:")
            .or_else(|| token.strip_prefix("load_"))
            .filter(|name| !name.is_empty());
        match overlay {
            Some(name) => Ok(Self::LoadOverlay(name.to_string())),
            None => Err(format!("Unknown scene target \"{}\".", token)),
        }
    }
}

impl fmt::Display for NextTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GoToScene(id) => write!(f, "{}", id),
            Self::EnterFreeChat => f.write_str("free_chat"),
            Self::EndOverlay => f.write_str("special_end"),
            Self::LoadOverlay(name) => write!(f, "load:{}", name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialAction {
    ReturnToMain,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub text: String,
    pub next: NextTarget,
    #[serde(default)]
    pub affection: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    pub id: SceneId,
    #[serde(rename = "type", default)]
    pub kind: SceneKind,
    #[serde(default)]
    pub speaker: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub background: Option<String>,
    #[serde(default)]
    pub character: Option<String>,
    #[serde(default)]
    pub sprite: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<ChoiceOption>,
    #[serde(default)]
    pub input_variable: Option<String>,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub next: Option<NextTarget>,
    #[serde(default)]
    pub special_action: Option<SpecialAction>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterDef {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sprites: BTreeMap<String, String>,
}

/// A loaded story script. Immutable once parsed; overlays replace it wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptDocument {
    #[serde(default)]
    pub title: String,
    pub scenes: Vec<Scene>,
    #[serde(default)]
    pub characters: BTreeMap<String, CharacterDef>,
    #[serde(default)]
    pub backgrounds: BTreeMap<String, String>,
    /// Defaults merged into the session. Non-string JSON values are kept as
    /// their text form.
    #[serde(default, deserialize_with = "deserialize_variables")]
    pub variables: BTreeMap<String, String>,
}

fn deserialize_variables<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = BTreeMap::<String, serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(key, value)| {
            let text = match value {
                serde_json::Value::String(text) => text,
                serde_json::Value::Null => String::new(),
                other => other.to_string(),
            };
            (key, text)
        })
        .collect())
}

impl ScriptDocument {
    pub fn parse(script_name: &str, raw: &str) -> Result<Self, GalgameError> {
        let document: ScriptDocument = serde_json::from_str(raw).map_err(|error| {
            GalgameError::new(
                "SCRIPT_PARSE",
                format!("Failed to parse script \"{}\": {}", script_name, error),
            )
        })?;
        document.validate(script_name)?;
        Ok(document)
    }

    pub fn scene(&self, id: SceneId) -> Option<&Scene> {
        self.scenes.iter().find(|scene| scene.id == id)
    }

    pub fn sprite_file(&self, character: &str, pose: &str) -> Option<&str> {
        self.characters
            .get(character)
            .and_then(|def| def.sprites.get(pose))
            .map(String::as_str)
    }

    fn validate(&self, script_name: &str) -> Result<(), GalgameError> {
        if self.scenes.is_empty() {
            return Err(GalgameError::new(
                "SCRIPT_EMPTY",
                format!("Script \"{}\" has no scenes.", script_name),
            ));
        }

        let mut seen = BTreeSet::new();
        for scene in &self.scenes {
            if !seen.insert(scene.id) {
                return Err(GalgameError::new(
                    "SCRIPT_DUPLICATE_SCENE",
                    format!(
                        "Script \"{}\" declares scene {} more than once.",
                        script_name, scene.id
                    ),
                ));
            }
            match scene.kind {
                SceneKind::Choice if scene.choices.is_empty() => {
                    return Err(GalgameError::new(
                        "SCRIPT_CHOICE_EMPTY",
                        format!(
                            "Choice scene {} in \"{}\" has no options.",
                            scene.id, script_name
                        ),
                    ));
                }
                SceneKind::Input if scene.input_variable.is_none() => {
                    return Err(GalgameError::new(
                        "SCRIPT_INPUT_VARIABLE",
                        format!(
                            "Input scene {} in \"{}\" has no input_variable.",
                            scene.id, script_name
                        ),
                    ));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// Registration of an alternate script that can temporarily replace the base one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlaySpec {
    pub script: String,
    #[serde(default = "default_start_scene")]
    pub start_scene: SceneId,
}

fn default_start_scene() -> SceneId {
    FIRST_SCENE_ID
}

#[cfg(test)]
mod script_tests {
    use super::*;

    #[test]
    fn next_target_accepts_ids_and_sentinels() {
        let parsed: Vec<NextTarget> = serde_json::from_str(
            r#"[3, "4", "free_chat", "special_end", "load_nagito_special", "load:kawasaki_special"]"#,
        )
        .expect("targets should parse");
        assert_eq!(
            parsed,
            vec![
                NextTarget::GoToScene(3),
                NextTarget::GoToScene(4),
                NextTarget::EnterFreeChat,
                NextTarget::EndOverlay,
                NextTarget::LoadOverlay("nagito_special".to_string()),
                NextTarget::LoadOverlay("kawasaki_special".to_string()),
            ]
        );
    }

    #[test]
    fn next_target_rejects_unknown_token() {
        let error = serde_json::from_str::<NextTarget>(r#""somewhere""#)
            .expect_err("unknown token should fail");
        assert!(error.to_string().contains("somewhere"));
        assert!(NextTarget::parse_token("load:").is_err());
    }

    #[test]
    fn next_target_serializes_back_to_wire_tokens() {
        let json = serde_json::to_string(&vec![
            NextTarget::GoToScene(7),
            NextTarget::EnterFreeChat,
            NextTarget::LoadOverlay("x".to_string()),
        ])
        .expect("serialize");
        assert_eq!(json, r#"[7,"free_chat","load:x"]"#);
    }

    #[test]
    fn parse_applies_defaults_and_finds_scenes() {
        let document = ScriptDocument::parse(
            "story.json",
            r#"{
  "title": "Demo",
  "scenes": [
    {"id": 1, "speaker": "A", "text": "hi", "next": 3},
    {"id": 3, "type": "choice", "text": "pick", "choices": [
      {"text": "yes", "next": 1, "affection": 2},
      {"text": "chat", "next": "free_chat"}
    ]}
  ],
  "characters": {"kurose": {"sprites": {"normal": "n.png"}}}
}"#,
        )
        .expect("script should parse");

        let first = document.scene(1).expect("scene 1");
        assert_eq!(first.kind, SceneKind::Dialogue);
        assert_eq!(first.next, Some(NextTarget::GoToScene(3)));
        let choice = document.scene(3).expect("scene 3");
        assert_eq!(choice.choices[1].affection, 0);
        assert!(document.scene(2).is_none());
        assert_eq!(document.sprite_file("kurose", "normal"), Some("n.png"));
        assert_eq!(document.sprite_file("kurose", "angry"), None);
    }

    #[test]
    fn parse_rejects_structural_problems() {
        let duplicate = ScriptDocument::parse(
            "dup.json",
            r#"{"scenes": [{"id": 1, "text": "a"}, {"id": 1, "text": "b"}]}"#,
        )
        .expect_err("duplicate ids");
        assert_eq!(duplicate.code, "SCRIPT_DUPLICATE_SCENE");

        let input = ScriptDocument::parse(
            "input.json",
            r#"{"scenes": [{"id": 1, "type": "input", "text": "name?"}]}"#,
        )
        .expect_err("missing variable");
        assert_eq!(input.code, "SCRIPT_INPUT_VARIABLE");

        let empty = ScriptDocument::parse("empty.json", r#"{"scenes": []}"#).expect_err("empty");
        assert_eq!(empty.code, "SCRIPT_EMPTY");

        let broken = ScriptDocument::parse("broken.json", "{").expect_err("broken");
        assert_eq!(broken.code, "SCRIPT_PARSE");
    }

    #[test]
    fn variable_defaults_accept_any_json_scalar() {
        let document = ScriptDocument::parse(
            "story.json",
            r#"{
  "variables": {"player_name": "", "visits": 0, "ratio": 0.5, "met": true, "note": null, "tags": ["a"]},
  "scenes": [{"id": 1, "text": "第{visits}次来访"}]
}"#,
        )
        .expect("script should parse");
        assert_eq!(document.variables["player_name"], "");
        assert_eq!(document.variables["visits"], "0");
        assert_eq!(document.variables["ratio"], "0.5");
        assert_eq!(document.variables["met"], "true");
        assert_eq!(document.variables["note"], "");
        assert_eq!(document.variables["tags"], r#"["a"]"#);
    }

    #[test]
    fn overlay_spec_defaults_start_scene() {
        let spec: OverlaySpec =
            serde_json::from_str(r#"{"script": "nagito_special.json"}"#).expect("spec");
        assert_eq!(spec.start_scene, FIRST_SCENE_ID);
    }
}
