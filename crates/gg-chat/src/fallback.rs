use crate::lexicon::{contains_any, ChatLexicon};
use crate::rng::RandomSource;

/// Canned reply used whenever the remote endpoint cannot answer.
pub fn fallback_reply(
    lexicon: &ChatLexicon,
    user_text: &str,
    random: &mut dyn RandomSource,
) -> String {
    let lowered = user_text.to_lowercase();
    let replies = lexicon
        .fallback_categories
        .iter()
        .find(|category| contains_any(&lowered, &category.keywords))
        .map(|category| category.replies.as_slice())
        .unwrap_or(lexicon.default_replies.as_slice());
    if replies.is_empty() {
        return String::new();
    }
    replies[random.next_index(replies.len())].clone()
}
