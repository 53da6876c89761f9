//! Message lookup for user-facing error text.
//!
//! The executor never shows messages itself; it only knows which key and
//! positional arguments describe a failure. A [`Localizer`] turns those into
//! text. Templates use `{0}`, `{1}`, ... placeholders.

use std::collections::HashMap;

/// Resolves message templates by key.
pub trait Localizer: Send + Sync {
    /// Returns the message for `key` with positional `args` substituted.
    fn get(&self, key: &str, args: &[&str]) -> String;
}

/// English messages for the keys the engine emits.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultLocalizer;

impl DefaultLocalizer {
    fn template(key: &str) -> Option<&'static str> {
        match key {
            "DataReadStatusError" => Some("Could not read data (HTTP status {0})."),
            "DataParseError" => Some("Could not parse the server response: {0}"),
            "DataReadEmptyError" => Some("The server returned an empty result."),
            "DataReadNetworkError" => Some("Could not reach the server: {0}"),
            "DataReadCancelled" => Some("The request was cancelled."),
            _ => None,
        }
    }
}

impl Localizer for DefaultLocalizer {
    fn get(&self, key: &str, args: &[&str]) -> String {
        match Self::template(key) {
            Some(template) => format_template(template, args),
            None => key.to_string(),
        }
    }
}

/// A localizer backed by an in-memory key → template table.
///
/// Keys missing from the table fall through to [`DefaultLocalizer`].
#[derive(Debug, Clone, Default)]
pub struct TableLocalizer {
    templates: HashMap<String, String>,
}

impl TableLocalizer {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a template.
    pub fn with(mut self, key: impl Into<String>, template: impl Into<String>) -> Self {
        self.templates.insert(key.into(), template.into());
        self
    }
}

impl Localizer for TableLocalizer {
    fn get(&self, key: &str, args: &[&str]) -> String {
        match self.templates.get(key) {
            Some(template) => format_template(template, args),
            None => DefaultLocalizer.get(key, args),
        }
    }
}

/// Substitutes `{n}` placeholders with `args[n]`.
///
/// Placeholders without a matching argument are left untouched.
pub fn format_template(template: &str, args: &[&str]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };

        match after[..close].parse::<usize>().ok().and_then(|i| args.get(i)) {
            Some(arg) => out.push_str(arg),
            None => out.push_str(&rest[open..open + close + 2]),
        }
        rest = &after[close + 1..];
    }

    out.push_str(rest);
    out
}
