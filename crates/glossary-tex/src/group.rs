//! `\group{...}` annotation codec
//!
//! Category groups are stored wrapped as `\group{label}`. Editors show the
//! bare label and entries carry it as `group={label}`.

use crate::scanner::extract_braced;

/// Command wrapping a stored group label
pub const GROUP_COMMAND: &str = "\\group";

/// Strip a `\group{...}` wrapper, returning the bare label
///
/// Values without the wrapper, or whose wrapper does not close, are
/// returned trimmed but otherwise unchanged.
pub fn decode_group(value: &str) -> &str {
    let value = value.trim();
    let Some(start) = value.find(GROUP_COMMAND) else {
        return value;
    };
    let after = start + GROUP_COMMAND.len();
    if !value[after..].starts_with('{') {
        return value;
    }
    match extract_braced(value, after) {
        Ok(found) => found.content.trim(),
        Err(_) => value,
    }
}

/// Wrap a label as `\group{label}`; empty labels yield `None`
pub fn encode_group(label: &str) -> Option<String> {
    let label = decode_group(label);
    if label.is_empty() {
        None
    } else {
        Some(format!("{}{{{}}}", GROUP_COMMAND, label))
    }
}
