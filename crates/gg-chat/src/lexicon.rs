use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ChatError;

const DEFAULT_LEXICON_JSON: &str = include_str!("../data/default_lexicon.json");

/// Content tables driving the local side of the bridge. Loaded from JSON; no
/// keyword or reply text lives in code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatLexicon {
    pub persona: Persona,
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f64,
    #[serde(default)]
    pub affection_rules: Vec<AffectionRule>,
    #[serde(default)]
    pub fallback_categories: Vec<FallbackCategory>,
    pub default_replies: Vec<String>,
    #[serde(default)]
    pub emotion_rules: Vec<EmotionRule>,
    #[serde(default = "default_emotion")]
    pub default_emotion: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Persona {
    pub speaker: String,
    pub system_prompt: String,
    #[serde(default)]
    pub emotion_instruction: String,
}

/// First rule with a keyword found in the user's text decides the delta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffectionRule {
    pub delta: i64,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackCategory {
    pub name: String,
    pub keywords: Vec<String>,
    pub replies: Vec<String>,
}

/// Matches when any `user` keyword is in the user text or any `reply`
/// keyword is in the reply. A matching rule resolves to its first matching
/// refinement, then its random split, then its own emotion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionRule {
    pub emotion: String,
    #[serde(default)]
    pub user: Vec<String>,
    #[serde(default)]
    pub reply: Vec<String>,
    #[serde(default)]
    pub refinements: Vec<EmotionRule>,
    #[serde(default)]
    pub split: Option<RandomSplit>,
}

/// `above` when a unit draw exceeds `threshold`, else `otherwise`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RandomSplit {
    pub threshold: f64,
    pub above: String,
    pub otherwise: String,
}

fn default_score_threshold() -> f64 {
    0.5
}

fn default_emotion() -> String {
    "normal".to_string()
}

impl ChatLexicon {
    pub fn parse(raw: &str) -> Result<Self, ChatError> {
        let lexicon: ChatLexicon =
            serde_json::from_str(raw).map_err(|error| ChatError::Lexicon(error.to_string()))?;
        if lexicon.default_replies.is_empty() {
            return Err(ChatError::Lexicon(
                "defaultReplies must not be empty".to_string(),
            ));
        }
        if let Some(category) = lexicon
            .fallback_categories
            .iter()
            .find(|category| category.replies.is_empty())
        {
            return Err(ChatError::Lexicon(format!(
                "fallback category \"{}\" has no replies",
                category.name
            )));
        }
        Ok(lexicon)
    }

    pub fn from_file(path: &Path) -> Result<Self, ChatError> {
        let raw = std::fs::read_to_string(path).map_err(|error| {
            ChatError::Lexicon(format!("failed to read {}: {}", path.display(), error))
        })?;
        Self::parse(&raw)
    }

    pub fn builtin() -> Result<Self, ChatError> {
        Self::parse(DEFAULT_LEXICON_JSON)
    }

    /// System prompt sent to completion endpoints, with the score instruction
    /// appended when requested.
    pub fn system_prompt(&self, analyze_emotion: bool) -> String {
        if analyze_emotion && !self.persona.emotion_instruction.is_empty() {
            format!(
                "{}\n\n{}",
                self.persona.system_prompt, self.persona.emotion_instruction
            )
        } else {
            self.persona.system_prompt.clone()
        }
    }
}

pub(crate) fn contains_any(haystack: &str, needles: &[String]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle.as_str()))
}

#[cfg(test)]
mod lexicon_tests {
    use super::*;

    #[test]
    fn builtin_lexicon_covers_all_tables() {
        let lexicon = ChatLexicon::builtin().expect("builtin lexicon");
        assert_eq!(lexicon.persona.speaker, "黒瀨澄");
        assert_eq!(lexicon.affection_rules.len(), 3);
        let names = lexicon
            .fallback_categories
            .iter()
            .map(|category| category.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            vec![
                "greeting",
                "thanks",
                "sadness",
                "anxiety",
                "romance",
                "complaint",
                "question",
                "joy"
            ]
        );
        assert_eq!(lexicon.default_replies.len(), 5);
        assert_eq!(lexicon.default_emotion, "normal");
    }

    #[test]
    fn system_prompt_appends_instruction_only_on_request() {
        let lexicon = ChatLexicon::builtin().expect("builtin lexicon");
        assert!(lexicon.system_prompt(true).contains("[EMOTION_SCORE:X]"));
        assert!(!lexicon.system_prompt(false).contains("EMOTION_SCORE"));
    }

    #[test]
    fn parse_rejects_empty_reply_tables() {
        let error = ChatLexicon::parse(
            r#"{"persona": {"speaker": "a", "systemPrompt": "b"}, "defaultReplies": []}"#,
        )
        .expect_err("empty defaults");
        assert!(error.to_string().contains("defaultReplies"));

        let error = ChatLexicon::parse(
            r#"{"persona": {"speaker": "a", "systemPrompt": "b"}, "defaultReplies": ["x"],
                "fallbackCategories": [{"name": "joy", "keywords": ["k"], "replies": []}]}"#,
        )
        .expect_err("empty category");
        assert!(error.to_string().contains("joy"));
    }
}
