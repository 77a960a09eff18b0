use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::{Captures, Regex};

fn placeholder_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"\{(\w+)\}").expect("placeholder regex must compile"))
}

/// Replaces `{name}` with the variable's value. Unknown or empty variables
/// keep the placeholder text.
pub fn substitute_variables(text: &str, variables: &BTreeMap<String, String>) -> String {
    placeholder_regex()
        .replace_all(text, |captures: &Captures<'_>| {
            match variables.get(&captures[1]).filter(|value| !value.is_empty()) {
                Some(value) => value.clone(),
                None => captures[0].to_string(),
            }
        })
        .into_owned()
}
