use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::apply::UpdateFileOptions;
use crate::parser::ParserConfig;
use crate::planner::{PlannerConfig, UpdateRequest};

/// An updates file: run options, per-section marker comments, and the
/// update list.
///
/// ```toml
/// [options]
/// backup = true
///
/// [sections.net]
/// start = "networking, managed by deploy"
///
/// [[update]]
/// key = "PORT"
/// value = "8080"
/// section = "net"
/// ```
#[derive(Debug, Deserialize, Default, Clone)]
pub struct UpdatesFile {
    #[serde(default)]
    pub options: Options,
    #[serde(default)]
    pub sections: HashMap<String, SectionComments>,
    #[serde(default, rename = "update")]
    pub updates: Vec<UpdateEntry>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Options {
    pub backup: bool,
    pub replace: bool,
    pub add: bool,
    pub move_section: bool,
    pub ensure_newline: bool,
    pub default_quote: char,
    pub ignore_sections: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            backup: false,
            replace: true,
            add: true,
            move_section: true,
            ensure_newline: true,
            default_quote: '"',
            ignore_sections: false,
        }
    }
}

/// Marker comments for one section; the `default` table entry applies to
/// sections without their own.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct SectionComments {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct UpdateEntry {
    pub key: String,
    pub value: String,
    pub section: String,
    pub ignore_section: bool,
    pub prefix: String,
    pub comment: String,
}

impl UpdatesFile {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.updates.is_empty() {
            issues.push(ValidationIssue::EmptyUpdateList);
        }

        let mut seen = HashSet::new();
        for entry in &self.updates {
            if entry.key.trim().is_empty() {
                issues.push(ValidationIssue::MissingKey);
                continue;
            }
            if !seen.insert(entry.key.as_str()) {
                issues.push(ValidationIssue::DuplicateKey {
                    key: entry.key.clone(),
                });
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    pub fn update_requests(&self) -> Vec<UpdateRequest> {
        self.updates
            .iter()
            .map(|entry| UpdateRequest {
                key: entry.key.clone(),
                value: entry.value.clone(),
                section: entry.section.clone(),
                ignore_section: entry.ignore_section,
                prefix: entry.prefix.clone(),
                inline_comment: entry.comment.clone(),
            })
            .collect()
    }

    /// Translate file options into run options. The `default` section
    /// comment entry maps to the planner's empty-string key.
    pub fn file_options(&self) -> UpdateFileOptions {
        let mut planner = PlannerConfig {
            replace: self.options.replace,
            add: self.options.add,
            move_section: self.options.move_section,
            ensure_newline: self.options.ensure_newline,
            default_quote: self.options.default_quote,
            ..PlannerConfig::default()
        };

        for (name, comments) in &self.sections {
            let key = if name == "default" { "" } else { name.as_str() };
            if !comments.start.is_empty() {
                planner
                    .section_start_comments
                    .insert(key.to_string(), comments.start.clone());
            }
            if !comments.end.is_empty() {
                planner
                    .section_end_comments
                    .insert(key.to_string(), comments.end.clone());
            }
        }

        UpdateFileOptions {
            backup: self.options.backup,
            parser: ParserConfig {
                ignore_sections: self.options.ignore_sections,
            },
            planner,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone)]
pub enum ValidationIssue {
    EmptyUpdateList,
    MissingKey,
    DuplicateKey { key: String },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyUpdateList => write!(f, "updates file contains no updates"),
            ValidationIssue::MissingKey => write!(f, "update entry missing required field 'key'"),
            ValidationIssue::DuplicateKey { key } => {
                write!(f, "duplicate update entry for key '{key}'")
            }
        }
    }
}
