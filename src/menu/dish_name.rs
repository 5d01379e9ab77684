use std::{borrow::Cow, sync::OnceLock};

use regex::Regex;

/// Strips `( ... )` annotations, greedy to the last `)` on each line.
pub fn remove_parentheticals(s: &str) -> Cow<'_, str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"\(.*\)").expect("regex should be valid"));
    re.replace_all(s, "")
}

/// Collapses runs of spaces and tabs. Newlines are left alone so a cleaned
/// name never gains a new `( ... )` span across lines.
pub fn remove_excess_whitespace(s: &str) -> Cow<'_, str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"[^\S\r\n]{2,}").expect("regex should be valid"));
    re.replace_all(s, " ")
}

pub fn clean_dish_name(marketing_name: &str) -> String {
    let stripped = remove_parentheticals(marketing_name);
    remove_excess_whitespace(&stripped).trim().to_owned()
}
