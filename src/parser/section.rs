//! Section marker recognition and formatting.
//!
//! Sections are delimited by paired marker comments:
//!
//! ```text
//! # [SECTION: net] optional comment
//! PORT=8080
//! # [SECTION_END: net]
//! ```
//!
//! Markers are matched literally at line start; the name and inline
//! comment are trimmed of surrounding whitespace.

const START_PREFIX: &str = "# [SECTION:";
const END_PREFIX: &str = "# [SECTION_END:";

/// Name and trailing comment extracted from a section marker line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionMarker {
    pub name: String,
    pub comment: String,
}

/// Match `# [SECTION: name] comment`.
pub fn match_section_start(line: &str) -> Option<SectionMarker> {
    match_marker(line, START_PREFIX)
}

/// Match `# [SECTION_END: name] comment`.
pub fn match_section_end(line: &str) -> Option<SectionMarker> {
    match_marker(line, END_PREFIX)
}

fn match_marker(line: &str, prefix: &str) -> Option<SectionMarker> {
    let rest = line.strip_prefix(prefix)?;
    let close = rest.find(']')?;
    // The bracket must enclose a name; a blank one is a plain comment.
    let name = rest[..close].trim();
    if name.is_empty() {
        return None;
    }
    Some(SectionMarker {
        name: name.to_string(),
        comment: rest[close + 1..].trim().to_string(),
    })
}

/// Build a section start marker, e.g. `# [SECTION: net] comment`.
///
/// Returns an empty string for an empty name.
pub fn make_section_start(name: &str, comment: &str, ensure_newline: bool) -> String {
    make_marker("# [SECTION: ", name, comment, ensure_newline)
}

/// Build a section end marker, e.g. `# [SECTION_END: net] comment`.
pub fn make_section_end(name: &str, comment: &str, ensure_newline: bool) -> String {
    make_marker("# [SECTION_END: ", name, comment, ensure_newline)
}

fn make_marker(prefix: &str, name: &str, comment: &str, ensure_newline: bool) -> String {
    if name.is_empty() {
        return String::new();
    }

    let mut out = String::with_capacity(prefix.len() + name.len() + comment.len() + 3);
    out.push_str(prefix);
    out.push_str(name);
    out.push(']');

    if !comment.is_empty() {
        out.push(' ');
        out.push_str(comment);
    }

    if ensure_newline {
        out.push('\n');
    }

    out
}
