use crate::lexicon::{contains_any, ChatLexicon};

/// Affection change for one exchange. A numeric score from the endpoint wins;
/// otherwise the lexicon's keyword rules classify the user's text.
pub fn affection_delta(lexicon: &ChatLexicon, user_text: &str, score: Option<f64>) -> i64 {
    if let Some(score) = score {
        if score > lexicon.score_threshold {
            return 1;
        }
        if score < -lexicon.score_threshold {
            return -1;
        }
        return 0;
    }

    let lowered = user_text.to_lowercase();
    lexicon
        .affection_rules
        .iter()
        .find(|rule| contains_any(&lowered, &rule.keywords))
        .map(|rule| rule.delta)
        .unwrap_or(0)
}
