use crate::lexicon::{contains_any, ChatLexicon, EmotionRule};
use crate::rng::RandomSource;

/// Picks the sprite emotion for an exchange from the user text and the reply.
pub fn classify_emotion(
    lexicon: &ChatLexicon,
    user_text: &str,
    reply: &str,
    random: &mut dyn RandomSource,
) -> String {
    let user = user_text.to_lowercase();
    let reply = reply.to_lowercase();
    lexicon
        .emotion_rules
        .iter()
        .find(|rule| rule_matches(rule, &user, &reply))
        .map(|rule| resolve_rule(rule, &user, &reply, random))
        .unwrap_or_else(|| lexicon.default_emotion.clone())
}

fn rule_matches(rule: &EmotionRule, user: &str, reply: &str) -> bool {
    contains_any(user, &rule.user) || contains_any(reply, &rule.reply)
}

fn resolve_rule(
    rule: &EmotionRule,
    user: &str,
    reply: &str,
    random: &mut dyn RandomSource,
) -> String {
    if let Some(refinement) = rule
        .refinements
        .iter()
        .find(|refinement| rule_matches(refinement, user, reply))
    {
        return resolve_rule(refinement, user, reply, random);
    }
    match &rule.split {
        Some(split) if random.next_unit() > split.threshold => split.above.clone(),
        Some(split) => split.otherwise.clone(),
        None => rule.emotion.clone(),
    }
}
