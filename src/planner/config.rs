use std::collections::HashMap;

/// Planner behavior switches.
///
/// The comment maps are keyed by section name; the empty-string key holds
/// the default used when a section has no entry of its own.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Rewrite a variable in place when its value differs.
    pub replace: bool,
    /// Append variables that never matched an existing occurrence.
    pub add: bool,
    /// Relocate a variable whose section differs from the request.
    pub move_section: bool,
    /// Give formatted variable text a trailing newline when missing.
    pub ensure_newline: bool,
    /// Quote character used when a new value needs quoting.
    pub default_quote: char,
    /// Inline comments for synthesized section start markers.
    pub section_start_comments: HashMap<String, String>,
    /// Inline comments for synthesized section end markers.
    pub section_end_comments: HashMap<String, String>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        PlannerConfig {
            replace: true,
            add: true,
            move_section: true,
            ensure_newline: true,
            default_quote: '"',
            section_start_comments: HashMap::new(),
            section_end_comments: HashMap::new(),
        }
    }
}

impl PlannerConfig {
    pub fn start_comment(&self, section: &str) -> &str {
        section_comment(&self.section_start_comments, section)
    }

    pub fn end_comment(&self, section: &str) -> &str {
        section_comment(&self.section_end_comments, section)
    }
}

fn section_comment<'a>(map: &'a HashMap<String, String>, section: &str) -> &'a str {
    match map.get(section) {
        Some(comment) if !comment.is_empty() => comment,
        _ => map.get("").map(String::as_str).unwrap_or(""),
    }
}
