use std::sync::OnceLock;

use regex::Regex;

#[derive(Debug, Clone, PartialEq)]
pub struct TaggedReply {
    pub text: String,
    pub score: Option<f64>,
}

fn emotion_tag_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"\[EMOTION_SCORE:(-?\d+\.?\d*)\]").expect("emotion tag regex must compile")
    })
}

/// Removes every `[EMOTION_SCORE:x]` tag; the first one supplies the score.
pub fn strip_emotion_tag(reply: &str) -> TaggedReply {
    let regex = emotion_tag_regex();
    let score = regex
        .captures(reply)
        .and_then(|captures| captures.get(1))
        .and_then(|value| value.as_str().parse::<f64>().ok());
    let text = regex.replace_all(reply, "").trim().to_string();
    TaggedReply { text, score }
}
