use once_cell::sync::Lazy;
use regex::Regex;

/// Binary name used to recognize our own invocations in captured commands
pub const OWN_NAME: &str = env!("CARGO_PKG_NAME");

/// Session names tmux assigns when none is given ("0", "1", ...)
static RE_NUMERIC_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+$").unwrap());

/// Our own binary as a word of a command line, bare or as a path component
static RE_OWN_INVOCATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(^|[\s/]){}(\s|$)", regex::escape(OWN_NAME))).unwrap()
});

/// Whether tmux auto-assigned this session name
pub fn is_numeric_name(name: &str) -> bool {
    RE_NUMERIC_NAME.is_match(name)
}

/// Clean a captured foreground command for storage and replay.
///
/// Returns an empty string for our own invocation, so a save triggered from
/// inside the picker does not record the picker.
pub fn clean_command(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() || RE_OWN_INVOCATION.is_match(trimmed) {
        return String::new();
    }
    trimmed.replace('"', "\\\"")
}

/// Single-quote a path for a `cd` line
pub fn quote_path(path: &str) -> String {
    format!("'{}'", path.replace('\'', r"'\''"))
}
