//! Pure per-line classification and value extraction.
//!
//! Nothing in this module holds state: one raw line goes in, one
//! classified payload comes out. Multi-line bookkeeping (continuations,
//! open sections) lives in [`crate::parser::stream`].

use crate::scan::{skip_spaces, skip_spaces_back, until_space, until_space_back};

/// Rough shape of one line, before value extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoughKind {
    /// Blank line, or no `=` present.
    Raw,
    /// First non-space byte is `#`.
    Comment,
    /// Contains `=` and is not a comment.
    Assignment,
}

/// A fully extracted `KEY=VALUE` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub key: String,
    /// Value content, unquoted and with quote/backslash escapes removed.
    pub value: String,
    /// Raw bytes before the value: leading space, key, `=`, padding.
    pub prefix: String,
    /// Raw bytes after the value: trailing space, inline comment.
    pub suffix: String,
    /// False when a quoted value runs past end of line.
    pub terminated: bool,
    /// The quote character, when the value was quoted.
    pub quote: Option<char>,
}

/// One line that continues an unterminated quoted value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Continuation {
    /// Partial value content on this line, escapes removed.
    pub value: String,
    /// Raw bytes after the closing quote (empty when unterminated).
    pub suffix: String,
    /// True when this line carries the closing quote.
    pub terminated: bool,
    /// The quote character being searched for.
    pub quote: char,
    /// Continuation lines seen so far for this variable, this one included.
    pub seen: u32,
}

/// Errors from assignment extraction; the stream parser attaches the
/// line index before surfacing them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentError {
    /// `=` at line start or preceded only by whitespace.
    NoKey,
    /// Nothing but whitespace after `=`.
    NoValue,
}

/// Classify a line without extracting anything.
pub fn rough_kind(line: &str) -> RoughKind {
    let start = skip_spaces(line, 0);
    if start >= line.len() {
        return RoughKind::Raw;
    }
    if line.as_bytes()[start] == b'#' {
        return RoughKind::Comment;
    }
    if line.contains('=') {
        return RoughKind::Assignment;
    }
    RoughKind::Raw
}

/// Extract key, value, prefix and suffix from an assignment line.
pub fn parse_assignment(line: &str) -> Result<Assignment, AssignmentError> {
    let eq = line.find('=').ok_or(AssignmentError::NoKey)?;
    let key = extract_key(line, eq)?;

    let value_start = skip_spaces(line, eq + 1);
    if value_start >= line.len() {
        return Err(AssignmentError::NoValue);
    }

    let prefix = line[..value_start].to_string();
    let first = line.as_bytes()[value_start];

    if first == b'"' || first == b'\'' {
        let quote = first as char;
        return Ok(match find_closing_quote(line, value_start + 1, quote) {
            Some(close) => Assignment {
                key,
                value: unescape(&line[value_start + 1..close], quote),
                prefix,
                suffix: line[close + 1..].to_string(),
                terminated: true,
                quote: Some(quote),
            },
            None => Assignment {
                key,
                value: unescape(&line[value_start + 1..], quote),
                prefix,
                suffix: String::new(),
                terminated: false,
                quote: Some(quote),
            },
        });
    }

    // Unquoted values run to the next whitespace and never continue.
    let value_end = until_space(line, value_start);
    Ok(Assignment {
        key,
        value: line[value_start..value_end].to_string(),
        prefix,
        suffix: line[value_end..].to_string(),
        terminated: true,
        quote: None,
    })
}

/// Scan a continuation line for the closing quote.
///
/// `seen` is filled in by the stream parser; it is zero here.
pub fn parse_continuation(line: &str, quote: char) -> Continuation {
    match find_closing_quote(line, 0, quote) {
        Some(close) => Continuation {
            value: unescape(&line[..close], quote),
            suffix: line[close + 1..].to_string(),
            terminated: true,
            quote,
            seen: 0,
        },
        None => Continuation {
            value: unescape(line, quote),
            suffix: String::new(),
            terminated: false,
            quote,
            seen: 0,
        },
    }
}

fn extract_key(line: &str, eq: usize) -> Result<String, AssignmentError> {
    if eq == 0 {
        return Err(AssignmentError::NoKey);
    }
    let key_end = skip_spaces_back(line, eq - 1).ok_or(AssignmentError::NoKey)?;
    let key_start = until_space_back(line, key_end).map_or(0, |i| i + 1);
    Ok(line[key_start..=key_end].to_string())
}

/// Find the closing quote at or after `from`, honoring escape parity: a
/// quote preceded by an odd number of consecutive backslashes is escaped.
pub fn find_closing_quote(line: &str, from: usize, quote: char) -> Option<usize> {
    let bytes = line.as_bytes();
    let quote = quote as u8;
    let mut backslashes = 0usize;

    for i in from..bytes.len() {
        let b = bytes[i];
        if b == b'\\' {
            backslashes += 1;
            continue;
        }
        if b == quote && backslashes % 2 == 0 {
            return Some(i);
        }
        backslashes = 0;
    }
    None
}

/// Remove the escapes that quoting introduced: `\<quote>` and `\\`.
/// Other backslash sequences pass through verbatim.
fn unescape(raw: &str, quote: char) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.peek() {
                Some(&next) if next == quote || next == '\\' => {
                    out.push(next);
                    chars.next();
                }
                _ => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rough_kinds() {
        assert_eq!(rough_kind(""), RoughKind::Raw);
        assert_eq!(rough_kind("   "), RoughKind::Raw);
        assert_eq!(rough_kind("# comment"), RoughKind::Comment);
        assert_eq!(rough_kind("   # indented"), RoughKind::Comment);
        assert_eq!(rough_kind("KEY=value"), RoughKind::Assignment);
        assert_eq!(rough_kind("no equals here"), RoughKind::Raw);
    }

    #[test]
    fn simple_assignment() {
        let a = parse_assignment("KEY=value").unwrap();
        assert_eq!(a.key, "KEY");
        assert_eq!(a.value, "value");
        assert_eq!(a.prefix, "KEY=");
        assert_eq!(a.suffix, "");
        assert!(a.terminated);
        assert_eq!(a.quote, None);
    }

    #[test]
    fn key_with_padding_and_export_prefix() {
        let a = parse_assignment("export KEY = value").unwrap();
        assert_eq!(a.key, "KEY");
        assert_eq!(a.prefix, "export KEY = ");
        assert_eq!(a.value, "value");
    }

    #[test]
    fn unquoted_value_stops_at_whitespace() {
        let a = parse_assignment("KEY=value # comment").unwrap();
        assert_eq!(a.value, "value");
        assert_eq!(a.suffix, " # comment");
    }

    #[test]
    fn quoted_value_keeps_interior_whitespace() {
        let a = parse_assignment("KEY=\"hello world\" # c").unwrap();
        assert_eq!(a.value, "hello world");
        assert_eq!(a.suffix, " # c");
        assert_eq!(a.quote, Some('"'));
        assert!(a.terminated);
    }

    #[test]
    fn single_quoted_value() {
        let a = parse_assignment("KEY='a \"b\" c'").unwrap();
        assert_eq!(a.value, "a \"b\" c");
        assert_eq!(a.quote, Some('\''));
    }

    #[test]
    fn escaped_quote_does_not_terminate() {
        let a = parse_assignment(r#"KEY="a\"b""#).unwrap();
        assert_eq!(a.value, "a\"b");
        assert!(a.terminated);
    }

    #[test]
    fn escaped_backslash_then_real_terminator() {
        let a = parse_assignment(r#"KEY="a\\""#).unwrap();
        assert_eq!(a.value, "a\\");
        assert!(a.terminated);
    }

    #[test]
    fn unterminated_quoted_value() {
        let a = parse_assignment("KEY=\"starts here").unwrap();
        assert!(!a.terminated);
        assert_eq!(a.value, "starts here");
        assert_eq!(a.quote, Some('"'));
        assert_eq!(a.suffix, "");
    }

    #[test]
    fn no_key_errors() {
        assert_eq!(parse_assignment("=value"), Err(AssignmentError::NoKey));
        assert_eq!(parse_assignment("   =value"), Err(AssignmentError::NoKey));
    }

    #[test]
    fn no_value_errors() {
        assert_eq!(parse_assignment("KEY="), Err(AssignmentError::NoValue));
        assert_eq!(parse_assignment("KEY=   "), Err(AssignmentError::NoValue));
    }

    #[test]
    fn continuation_terminated_mid_line() {
        let c = parse_continuation("rest of value\" # trailing", '"');
        assert!(c.terminated);
        assert_eq!(c.value, "rest of value");
        assert_eq!(c.suffix, " # trailing");
    }

    #[test]
    fn continuation_unterminated() {
        let c = parse_continuation("still going", '"');
        assert!(!c.terminated);
        assert_eq!(c.value, "still going");
    }

    #[test]
    fn continuation_escaped_quote_is_skipped() {
        let c = parse_continuation(r#"middle \" part"#, '"');
        assert!(!c.terminated);
        assert_eq!(c.value, "middle \" part");
    }

    #[test]
    fn closing_quote_parity() {
        assert_eq!(find_closing_quote(r#"a\"b""#, 0, '"'), Some(4));
        assert_eq!(find_closing_quote(r#"a\\"b"#, 0, '"'), Some(3));
        assert_eq!(find_closing_quote(r#"a\"b"#, 0, '"'), None);
    }
}
