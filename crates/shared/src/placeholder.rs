//! Named placeholder substitution.
//!
//! Email templates stored by the web application reference call details as
//! `{caller_id_name}`, `{dialed_user}` and so on. Placeholders without a
//! matching variable are left untouched so a template typo stays visible in the
//! delivered message instead of failing the notification.

use std::collections::HashMap;

lazy_static::lazy_static! {
    static ref PLACEHOLDER_REGEX: regex::Regex =
        regex::Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap();
}

/// Replaces every `{name}` in `template` with `vars[name]`.
pub fn render(template: &str, vars: &HashMap<&str, String>) -> String {
    PLACEHOLDER_REGEX
        .replace_all(template, |caps: &regex::Captures<'_>| {
            match vars.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}
