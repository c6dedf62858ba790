//! Brace-balanced scanning over raw markup
//!
//! The scanner locates matching delimiter pairs and named field bodies
//! inside glossary markup. It is the only primitive able to extract field
//! values that themselves contain nested groups, e.g.
//! `description={A {nested} value}`.
//!
//! Field lookup is a plain substring search for `name=`, not a tokenized
//! walk of the body. A field name that also appears inside a sibling value
//! can therefore be misattributed; [`ambiguous_fields`] flags those cases
//! without changing what [`extract_field`] returns.

use lazy_static::lazy_static;
use nom::IResult;
use regex::Regex;

use crate::error::{ParseError, Result};

/// Field names a glossary entry body may carry
pub const FIELD_NAMES: [&str; 6] = ["type", "name", "first", "text", "description", "group"];

/// Content found between a matched pair of delimiters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Balanced<'a> {
    /// Text strictly between the opener and its matching closer
    pub content: &'a str,
    /// Byte index of the opener
    pub open: usize,
    /// Byte index of the matching closer
    pub close: usize,
}

/// Extract the content of the first balanced `{...}` group at or after `start`
pub fn extract_braced(text: &str, start: usize) -> Result<Balanced<'_>> {
    extract_balanced(text, start, '{', '}')
}

/// Extract the content of the first balanced group at or after `start`
///
/// Scanning begins at `start`, which need not be an opener itself. Closers
/// seen before the first opener are ignored. Fails with
/// [`ParseError::MissingOpenDelimiter`] when no opener exists and with
/// [`ParseError::UnbalancedDelimiter`] when the text ends before the group
/// closes; a partial prefix is never returned.
pub fn extract_balanced(
    text: &str,
    start: usize,
    open_char: char,
    close_char: char,
) -> Result<Balanced<'_>> {
    let tail = text
        .get(start..)
        .ok_or(ParseError::MissingOpenDelimiter { from: start })?;

    let mut depth = 0usize;
    let mut open = None;

    for (idx, c) in tail.char_indices() {
        let pos = start + idx;
        if c == open_char {
            if depth == 0 {
                open = Some(pos);
            }
            depth += 1;
        } else if c == close_char && depth > 0 {
            depth -= 1;
            if depth == 0 {
                // `open` is always set once depth has been raised
                let open_at = open.unwrap_or(pos);
                return Ok(Balanced {
                    content: &text[open_at + open_char.len_utf8()..pos],
                    open: open_at,
                    close: pos,
                });
            }
        }
    }

    match open {
        Some(open_at) => Err(ParseError::UnbalancedDelimiter { open_at }),
        None => Err(ParseError::MissingOpenDelimiter { from: start }),
    }
}

/// nom adapter: parse a `{...}` group that starts exactly at the input
///
/// Returns the inner content and the input after the closing brace.
pub(crate) fn braced(input: &str) -> IResult<&str, &str> {
    if !input.starts_with('{') {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Char,
        )));
    }
    match extract_braced(input, 0) {
        Ok(found) => Ok((&input[found.close + 1..], found.content)),
        Err(_) => Err(nom::Err::Failure(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Char,
        ))),
    }
}

/// Check that every `{` in `text` has a matching `}` and vice versa
pub fn is_balanced(text: &str) -> bool {
    first_unbalanced(text).is_none()
}

/// Byte index of the first stray `}` or of the outermost unclosed `{`
pub fn first_unbalanced(text: &str) -> Option<usize> {
    let mut open = Vec::new();
    for (idx, c) in text.char_indices() {
        match c {
            '{' => open.push(idx),
            '}' => {
                if open.pop().is_none() {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    open.first().copied()
}

/// Extract the value of `field_name` from an entry body
///
/// Looks for the first case-sensitive occurrence of `field_name=`, then
/// skips whitespace and repeated `=`. The `type` field is a bare token that
/// runs to the next top-level `,` or `}` (or the end of the body). Every
/// other field must start with `{` and is read with [`extract_braced`].
pub fn extract_field<'a>(body: &'a str, field_name: &str) -> Option<&'a str> {
    let needle = format!("{}=", field_name);
    let found = body.find(&needle)?;

    let rest = &body[found + field_name.len()..];
    let skipped = rest.len() - rest.trim_start_matches(|c: char| c == '=' || c.is_whitespace()).len();
    let pos = found + field_name.len() + skipped;
    if pos >= body.len() {
        return None;
    }

    if field_name == "type" {
        let value = bare_value(&body[pos..]).trim();
        return if value.is_empty() { None } else { Some(value) };
    }

    if !body[pos..].starts_with('{') {
        return None;
    }
    extract_braced(body, pos).ok().map(|found| found.content)
}

/// Read a bare token up to the first top-level `,` or `}`
fn bare_value(input: &str) -> &str {
    let mut depth = 0usize;
    for (idx, c) in input.char_indices() {
        match c {
            '{' => depth += 1,
            '}' if depth == 0 => return &input[..idx],
            '}' => depth -= 1,
            ',' if depth == 0 => return &input[..idx],
            _ => {}
        }
    }
    input
}

lazy_static! {
    static ref ASSIGNMENT: Regex = Regex::new(r"([A-Za-z]+)=").unwrap();
}

/// Known field names whose substring lookup would not land on their own
/// top-level assignment
///
/// A field is reported when the first `name=` hit sits inside another
/// field's braces or is glued to a longer identifier (`typename=`), i.e.
/// whenever [`extract_field`] would read something other than the field's
/// real top-level value.
pub fn ambiguous_fields(body: &str) -> Vec<&'static str> {
    let depths = brace_depths(body);

    FIELD_NAMES
        .iter()
        .copied()
        .filter(|name| {
            let Some(hit) = body.find(&format!("{}=", name)) else {
                return false;
            };
            let assignment = ASSIGNMENT
                .captures_iter(body)
                .filter_map(|cap| cap.get(1))
                .find(|m| m.as_str() == *name && depths_at(&depths, m.start()) == 0)
                .map(|m| m.start());
            assignment != Some(hit)
        })
        .collect()
}

/// Fail with [`ParseError::AmbiguousFieldMatch`] naming every field that
/// [`ambiguous_fields`] flags in `body`
pub fn check_unambiguous(body: &str) -> Result<()> {
    let ambiguous = ambiguous_fields(body);
    if ambiguous.is_empty() {
        Ok(())
    } else {
        Err(ParseError::AmbiguousFieldMatch(ambiguous.join(", ")))
    }
}

/// Brace depth recorded at each `{`/`}` transition, as (byte index, depth after)
fn brace_depths(text: &str) -> Vec<(usize, usize)> {
    let mut depth = 0usize;
    let mut marks = Vec::new();
    for (idx, c) in text.char_indices() {
        match c {
            '{' => {
                depth += 1;
                marks.push((idx, depth));
            }
            '}' => {
                depth = depth.saturating_sub(1);
                marks.push((idx, depth));
            }
            _ => {}
        }
    }
    marks
}

fn depths_at(marks: &[(usize, usize)], pos: usize) -> usize {
    marks
        .iter()
        .take_while(|(idx, _)| *idx < pos)
        .last()
        .map(|(_, depth)| *depth)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_simple_group() {
        let found = extract_braced("{abc}", 0).unwrap();
        assert_eq!(found.content, "abc");
        assert_eq!(found.open, 0);
        assert_eq!(found.close, 4);
    }

    #[test]
    fn test_extract_nested_group() {
        let text = "xx{a{b}{c{d}}e}yy";
        let found = extract_braced(text, 0).unwrap();
        assert_eq!(found.content, "a{b}{c{d}}e");
        assert_eq!(found.open, 2);
        assert_eq!(found.close, 14);
    }

    #[test]
    fn test_extract_starts_mid_text() {
        let text = "{first} {second}";
        let found = extract_braced(text, 1).unwrap();
        assert_eq!(found.content, "second");
    }

    #[test]
    fn test_closer_before_opener_is_ignored() {
        let found = extract_braced("a}b{c}", 0).unwrap();
        assert_eq!(found.content, "c");
        assert_eq!(found.open, 3);
    }

    #[test]
    fn test_unbalanced_fails() {
        assert_eq!(
            extract_braced("ab{c{d}", 0),
            Err(ParseError::UnbalancedDelimiter { open_at: 2 })
        );
    }

    #[test]
    fn test_no_opener_fails() {
        assert_eq!(
            extract_braced("plain text", 3),
            Err(ParseError::MissingOpenDelimiter { from: 3 })
        );
        assert_eq!(
            extract_braced("{a}", 10),
            Err(ParseError::MissingOpenDelimiter { from: 10 })
        );
    }

    #[test]
    fn test_custom_delimiters() {
        let found = extract_balanced("f(a(b)c)", 0, '(', ')').unwrap();
        assert_eq!(found.content, "a(b)c");
    }

    #[test]
    fn test_multibyte_content() {
        let found = extract_braced("è{perché {sì}}", 0).unwrap();
        assert_eq!(found.content, "perché {sì}");
    }

    #[test]
    fn test_braced_nom_adapter() {
        let (rest, content) = braced("{a{b}}tail").unwrap();
        assert_eq!(content, "a{b}");
        assert_eq!(rest, "tail");
        assert!(braced("x{a}").is_err());
        assert!(matches!(braced("{open"), Err(nom::Err::Failure(_))));
    }

    #[test]
    fn test_is_balanced() {
        assert!(is_balanced(""));
        assert!(is_balanced("\\textbf{a{b}}"));
        assert!(!is_balanced("\\textbf{a"));
        assert!(!is_balanced("}{"));
    }

    #[test]
    fn test_first_unbalanced() {
        assert_eq!(first_unbalanced("a{b}c"), None);
        assert_eq!(first_unbalanced("a}b"), Some(1));
        assert_eq!(first_unbalanced("{a{b}"), Some(0));
    }

    #[test]
    fn test_extract_braced_field() {
        let body = "type=\\acronymtype,\n    name={Term},\n    description={A {nested} term.}";
        assert_eq!(extract_field(body, "name"), Some("Term"));
        assert_eq!(extract_field(body, "description"), Some("A {nested} term."));
    }

    #[test]
    fn test_extract_type_field() {
        assert_eq!(
            extract_field("type=\\acronymtype,\nname={X}", "type"),
            Some("\\acronymtype")
        );
        assert_eq!(extract_field("name={X}, type= main ", "type"), Some("main"));
        assert_eq!(extract_field("type=main}", "type"), Some("main"));
    }

    #[test]
    fn test_extract_skips_redundant_equals_and_whitespace() {
        assert_eq!(extract_field("name==  \n{X}", "name"), Some("X"));
    }

    #[test]
    fn test_missing_field() {
        assert_eq!(extract_field("name={X}", "group"), None);
        assert_eq!(extract_field("name=X", "name"), None);
        assert_eq!(extract_field("name={X", "name"), None);
        assert_eq!(extract_field("name=", "name"), None);
    }

    #[test]
    fn test_substring_lookup_is_preserved() {
        // "name=" inside the description is found before the real field
        let body = "description={see name={Other}},\nname={Real}";
        assert_eq!(extract_field(body, "name"), Some("Other"));
    }

    #[test]
    fn test_ambiguous_fields() {
        let body = "description={see name={Other}},\nname={Real},\ntext={T}";
        assert_eq!(ambiguous_fields(body), vec!["name"]);

        let glued = "typename={X},\nname={Y}";
        assert_eq!(ambiguous_fields(glued), vec!["name"]);

        let clean = "type=main,\nname={N},\nfirst={F},\ntext={T},\ndescription={D}";
        assert!(ambiguous_fields(clean).is_empty());
    }

    #[test]
    fn test_check_unambiguous() {
        let body = "description={see name={Other} and text={x}},\nname={Real},\ntext={T}";
        assert_eq!(
            check_unambiguous(body),
            Err(ParseError::AmbiguousFieldMatch("name, text".to_string()))
        );
        assert_eq!(check_unambiguous("name={N},\ntext={T}"), Ok(()));
    }
}
