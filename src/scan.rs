//! Byte-level text scanning primitives shared by the classifier and formatter.
//!
//! All scanners operate on raw bytes and treat any ASCII whitespace
//! (space, tab, CR, LF, vertical tab, form feed) as "space". Input lines
//! are expected to be UTF-8; multi-byte code points never collide with
//! the ASCII bytes these scanners look for.

/// First index at or after `pos` holding a non-space byte.
///
/// Returns `line.len()` if everything from `pos` onward is whitespace.
pub fn skip_spaces(line: &str, pos: usize) -> usize {
    let bytes = line.as_bytes();
    for i in pos..bytes.len() {
        if !bytes[i].is_ascii_whitespace() {
            return i;
        }
    }
    line.len()
}

/// First index at or after `pos` holding a space byte.
///
/// Returns `line.len()` if no whitespace is found.
pub fn until_space(line: &str, pos: usize) -> usize {
    let bytes = line.as_bytes();
    for i in pos..bytes.len() {
        if bytes[i].is_ascii_whitespace() {
            return i;
        }
    }
    line.len()
}

/// Last index at or before `pos` holding a non-space byte, scanning left.
///
/// Returns `None` if all bytes from 0 through `pos` are whitespace.
pub fn skip_spaces_back(line: &str, pos: usize) -> Option<usize> {
    let bytes = line.as_bytes();
    for i in (0..=pos.min(bytes.len().checked_sub(1)?)).rev() {
        if !bytes[i].is_ascii_whitespace() {
            return Some(i);
        }
    }
    None
}

/// First space byte encountered scanning left from `pos`.
///
/// Returns `None` if no whitespace exists in `[0, pos]`.
pub fn until_space_back(line: &str, pos: usize) -> Option<usize> {
    let bytes = line.as_bytes();
    for i in (0..=pos.min(bytes.len().checked_sub(1)?)).rev() {
        if bytes[i].is_ascii_whitespace() {
            return Some(i);
        }
    }
    None
}

/// True when the string is empty or contains only whitespace.
pub fn is_blank(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_whitespace())
}

/// True when the string contains at least one whitespace character.
pub fn has_whitespace(s: &str) -> bool {
    s.chars().any(|c| c.is_whitespace())
}

/// Convert a field name to UPPER_SNAKE_CASE.
///
/// A word starts at an uppercase letter that follows a lowercase letter
/// or digit (`listenAddr` -> `LISTEN_ADDR`), or at the last capital of
/// an acronym run (`HTTPPort` -> `HTTP_PORT`). Names already in
/// upper-snake pass through unchanged.
pub fn to_upper_snake(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() * 2);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() && i > 0 && !out.ends_with('_') {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower)
            {
                out.push('_');
            }
        }
        out.extend(c.to_uppercase());
    }
    out
}
