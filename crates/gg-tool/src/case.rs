use serde::{Deserialize, Serialize};

pub const TESTCASE_SCHEMA_V1: &str = "gg-tool-case.v1";

/// A scripted play-through of one story bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub schema_version: String,
    /// Overrides the manifest's base script.
    #[serde(default)]
    pub entry_script: Option<String>,
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Replies handed out by the chat transport in order. `null` simulates a
    /// failed request; once exhausted every message takes the offline path.
    #[serde(default)]
    pub chat_replies: Vec<Option<String>>,
    #[serde(default)]
    pub actions: Vec<TestAction>,
    #[serde(default)]
    pub expected_events: Vec<ExpectedEvent>,
}

fn default_seed() -> u64 {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TestAction {
    Choose { index: usize },
    Input { text: String },
    Chat { text: String },
}

impl TestAction {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Choose { .. } => "choose",
            Self::Input { .. } => "input",
            Self::Chat { .. } => "chat",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "kind",
    rename_all = "lowercase",
    rename_all_fields = "camelCase"
)]
pub enum ExpectedEvent {
    Scene {
        scene_id: u32,
        speaker: String,
        text: String,
    },
    Choices {
        scene_id: u32,
        text: String,
        choices: Vec<String>,
    },
    Input {
        scene_id: u32,
        text: String,
        #[serde(default)]
        placeholder: Option<String>,
    },
    FreeChat {
        intro: String,
        affection: i64,
    },
    Chat {
        reply: String,
        affection: i64,
    },
    Unchanged,
    End,
}

#[cfg(test)]
mod case_tests {
    use super::*;

    #[test]
    fn test_action_kind_name_reports_expected_value() {
        assert_eq!(TestAction::Choose { index: 0 }.kind_name(), "choose");
        assert_eq!(
            TestAction::Chat {
                text: "x".to_string()
            }
            .kind_name(),
            "chat"
        );
    }

    #[test]
    fn testcase_deserialize_applies_defaults() {
        let parsed: TestCase = serde_json::from_str(
            r#"{
  "schemaVersion": "gg-tool-case.v1",
  "actions": [],
  "expectedEvents": []
}"#,
        )
        .expect("testcase should deserialize");

        assert_eq!(parsed.schema_version, TESTCASE_SCHEMA_V1);
        assert_eq!(parsed.entry_script, None);
        assert_eq!(parsed.seed, 1);
        assert!(parsed.chat_replies.is_empty());
    }

    #[test]
    fn expected_event_deserialize_supports_all_variants() {
        let parsed: Vec<ExpectedEvent> = serde_json::from_str(
            r#"[
  {"kind":"scene","sceneId":1,"speaker":"A","text":"a"},
  {"kind":"choices","sceneId":2,"text":"pick","choices":["A"]},
  {"kind":"input","sceneId":3,"text":"name"},
  {"kind":"freechat","intro":"","affection":2},
  {"kind":"chat","reply":"hi","affection":3},
  {"kind":"unchanged"},
  {"kind":"end"}
]"#,
        )
        .expect("events should deserialize");

        assert_eq!(parsed.len(), 7);
        assert_eq!(
            parsed[2],
            ExpectedEvent::Input {
                scene_id: 3,
                text: "name".to_string(),
                placeholder: None,
            }
        );
        assert!(matches!(parsed[3], ExpectedEvent::FreeChat { affection: 2, .. }));
        assert!(matches!(parsed[6], ExpectedEvent::End));
    }

    #[test]
    fn chat_replies_accept_null_failures() {
        let parsed: TestCase = serde_json::from_str(
            r#"{"schemaVersion":"gg-tool-case.v1","chatReplies":["ok",null]}"#,
        )
        .expect("testcase should deserialize");
        assert_eq!(parsed.chat_replies, vec![Some("ok".to_string()), None]);
    }
}
