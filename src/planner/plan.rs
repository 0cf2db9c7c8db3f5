//! The update planner: consumes the parser's record stream plus a set of
//! requested updates and produces a line-indexed patch set.
//!
//! The planner owns all semantic decisions (leave, replace in place,
//! relocate, append) and deals purely in logical line indices; byte
//! offsets belong to the engine.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, info, warn};

use crate::parser::{
    make_section_end, make_section_start, Assignment, LineKind, LogicalLine, ParseError,
    RecordStream,
};
use crate::patch::PatchSet;
use crate::planner::config::PlannerConfig;
use crate::planner::errors::PlanError;
use crate::planner::format::format_var;

/// One requested key/value/section change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateRequest {
    pub key: String,
    pub value: String,
    /// Destination section; empty means file scope.
    pub section: String,
    /// Never relocate the key when it already exists, even if its section
    /// differs from `section`.
    pub ignore_section: bool,
    /// Prepended before `KEY=` when the key is newly inserted
    /// (e.g. `"export "`).
    pub prefix: String,
    /// Appended as ` # comment` when the key is newly inserted.
    pub inline_comment: String,
}

impl UpdateRequest {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        UpdateRequest {
            key: key.into(),
            value: value.into(),
            ..UpdateRequest::default()
        }
    }

    pub fn in_section(mut self, section: impl Into<String>) -> Self {
        self.section = section.into();
        self
    }
}

/// The variable currently being read: its definition line plus any
/// continuation lines, accumulated until the value terminates.
#[derive(Debug)]
struct VarState {
    def_line: u64,
    section: String,
    definition: Assignment,
    continuation_values: Vec<String>,
    terminated: bool,
}

impl VarState {
    fn physical_lines(&self) -> u64 {
        1 + self.continuation_values.len() as u64
    }

    /// Rejoin the full original value, continuation parts separated by
    /// newlines.
    fn original_value(&self) -> String {
        if self.continuation_values.is_empty() {
            return self.definition.value.clone();
        }
        let mut parts = Vec::with_capacity(1 + self.continuation_values.len());
        parts.push(self.definition.value.as_str());
        parts.extend(self.continuation_values.iter().map(String::as_str));
        parts.join("\n")
    }
}

/// Stateful planner fed one logical line at a time.
#[derive(Debug)]
pub struct Planner {
    config: PlannerConfig,
    /// Requests not yet matched, keyed by variable name.
    pending: BTreeMap<String, UpdateRequest>,
    patches: PatchSet,
    /// Last line index belonging to each named section: the marker line
    /// at first, then the final physical line of its latest variable.
    sections_last_var_line: HashMap<String, u64>,
    /// Formatted text queued for each destination section ("" = file
    /// scope), resolved to patches at end of input.
    add_to_section: BTreeMap<String, String>,
    var_state: Option<VarState>,
}

impl Planner {
    /// Validate the request set and build a planner.
    ///
    /// Duplicate keys are rejected here, before any line is processed.
    pub fn new(updates: Vec<UpdateRequest>, config: PlannerConfig) -> Result<Self, PlanError> {
        let mut pending = BTreeMap::new();
        for update in updates {
            debug!(key = %update.key, section = %update.section, "registered update");
            if pending.contains_key(&update.key) {
                return Err(PlanError::DuplicateUpdateKey { key: update.key });
            }
            pending.insert(update.key.clone(), update);
        }
        Ok(Planner {
            config,
            pending,
            patches: PatchSet::new(),
            sections_last_var_line: HashMap::new(),
            add_to_section: BTreeMap::new(),
            var_state: None,
        })
    }

    /// Feed the next logical line.
    pub fn handle_line(&mut self, idx: u64, line: &LogicalLine) -> Result<(), PlanError> {
        match &line.kind {
            LineKind::SectionStart { name, .. } => {
                if name.is_empty() {
                    return Err(PlanError::MissingSectionData { line: idx });
                }
                debug!(section = %name, line = idx, "entered section");
                self.sections_last_var_line.insert(name.clone(), idx);
            }
            LineKind::SectionEnd { name, .. } => {
                debug!(section = %name, line = idx, "section end");
            }
            LineKind::Assignment(assignment) => {
                let section = line.section.clone().unwrap_or_default();
                self.note_var_line(&section, idx);
                self.var_state = Some(VarState {
                    def_line: idx,
                    section,
                    terminated: assignment.terminated,
                    definition: assignment.clone(),
                    continuation_values: Vec::new(),
                });
                self.resolve_var()?;
            }
            LineKind::Continuation(part) => {
                let section = line.section.clone().unwrap_or_default();
                self.note_var_line(&section, idx);
                let state = self
                    .var_state
                    .as_mut()
                    .ok_or(PlanError::MissingVariableData { line: idx })?;
                state.continuation_values.push(part.value.clone());
                state.terminated = part.terminated;
                self.resolve_var()?;
            }
            LineKind::Comment | LineKind::Raw => {}
        }
        Ok(())
    }

    /// Consume end of input: stage never-matched requests as new
    /// variables, then resolve every section buffer into patches.
    ///
    /// `total_lines` is the number of physical lines the stream produced.
    pub fn finish(mut self, total_lines: u64) -> Result<PatchSet, PlanError> {
        if let Some(state) = &self.var_state {
            if !state.terminated {
                return Err(PlanError::Parse(ParseError::UnterminatedValue {
                    key: state.definition.key.clone(),
                    line: state.def_line,
                }));
            }
        }

        self.stage_new_variables();
        self.distribute_section_buffers(total_lines);

        info!(
            patches = self.patches.len(),
            "stream processing complete"
        );
        Ok(self.patches)
    }

    fn note_var_line(&mut self, section: &str, idx: u64) {
        if !section.is_empty() {
            self.sections_last_var_line.insert(section.to_string(), idx);
        }
    }

    /// Once the variable being read is fully terminated, decide what to
    /// do with it.
    fn resolve_var(&mut self) -> Result<(), PlanError> {
        let Some(state) = &self.var_state else {
            return Ok(());
        };
        if !state.terminated {
            return Ok(());
        }
        let state = self
            .var_state
            .take()
            .expect("checked Some above");

        let key = &state.definition.key;
        let Some(update) = self.pending.get(key) else {
            debug!(key = %key, line = state.def_line, "skipping variable (no update)");
            return Ok(());
        };
        let update = update.clone();

        let original_value = state.original_value();
        let value_ok = original_value == update.value;
        let section_ok = state.section == update.section
            || update.ignore_section
            || !self.config.move_section;

        debug!(
            key = %key,
            line = state.def_line,
            value_ok,
            section_ok,
            current_section = %state.section,
            target_section = %update.section,
            multiline = state.physical_lines() > 1,
            "variable update analysis"
        );

        if value_ok && section_ok {
            self.pending.remove(key);
            return Ok(());
        }

        if section_ok && !self.config.replace {
            debug!(key = %key, "replace disabled; leaving variable untouched");
            self.pending.remove(key);
            return Ok(());
        }

        // Every remaining case removes the occurrence's physical lines.
        for i in 0..state.physical_lines() {
            let entry = self.patches.entry(state.def_line + i).or_default();
            entry.remove_line = true;
        }

        let content = format_var(
            &update,
            Some(&state.definition),
            self.config.ensure_newline,
            self.config.default_quote,
        );

        if section_ok {
            debug!(key = %key, line = state.def_line, "updating variable in place");
            let entry = self
                .patches
                .get_mut(&state.def_line)
                .expect("removal patch inserted above");
            entry.insert_before = Some(content);
        } else {
            debug!(
                key = %key,
                from = %state.section,
                to = %update.section,
                "moving variable to different section"
            );
            self.queue_for_section(&update.section, &content);
        }

        self.pending.remove(key);
        Ok(())
    }

    fn queue_for_section(&mut self, section: &str, content: &str) {
        self.add_to_section
            .entry(section.to_string())
            .or_default()
            .push_str(content);
    }

    /// Requests that never matched become brand-new variables.
    fn stage_new_variables(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        if !self.config.add {
            warn!(
                count = self.pending.len(),
                "add disabled; dropping updates that matched no existing variable"
            );
            return;
        }

        info!(count = self.pending.len(), "processing new variables");
        let pending = std::mem::take(&mut self.pending);
        for (key, update) in pending {
            let content = format_var(&update, None, true, self.config.default_quote);
            debug!(key = %key, section = %update.section, "formatted new variable");
            self.queue_for_section(&update.section, &content);
        }
    }

    /// Turn section buffers into insert-after patches. Existing sections
    /// receive their content after their last variable line; unknown
    /// sections become synthesized blocks appended at file end, after any
    /// file-scope content.
    fn distribute_section_buffers(&mut self, total_lines: u64) {
        let buffers = std::mem::take(&mut self.add_to_section);
        let mut file_end = String::new();

        // BTreeMap order puts the file-scope buffer ("") first and keeps
        // synthesized sections in name order.
        for (section, content) in buffers {
            if content.is_empty() {
                continue;
            }
            if section.is_empty() {
                file_end.push_str(&content);
                continue;
            }
            match self.sections_last_var_line.get(&section) {
                Some(&last_line) => {
                    debug!(section = %section, after_line = last_line, "inserting into existing section");
                    self.patches
                        .entry(last_line)
                        .or_default()
                        .push_insert_after(&content);
                }
                None => {
                    debug!(section = %section, "creating new section");
                    file_end.push_str(&self.render_section_block(&section, &content));
                }
            }
        }

        if file_end.is_empty() {
            return;
        }

        // The last physical line, or the synthetic append index when the
        // file is empty.
        let idx = total_lines.saturating_sub(1);
        debug!(line = idx, bytes = file_end.len(), "adding content to file end");
        self.patches
            .entry(idx)
            .or_default()
            .push_insert_after(&file_end);
    }

    fn render_section_block(&self, name: &str, content: &str) -> String {
        let start = make_section_start(name, self.config.start_comment(name), true);
        let end = make_section_end(name, self.config.end_comment(name), true);

        let mut block = String::with_capacity(start.len() + content.len() + end.len() + 1);
        block.push_str(&start);
        block.push_str(content);
        if !content.ends_with('\n') {
            block.push('\n');
        }
        block.push_str(&end);
        block.push('\n');
        block
    }
}

/// Plan against in-memory text (mainly for tests and previews).
pub fn plan_str(
    input: &str,
    updates: Vec<UpdateRequest>,
    config: PlannerConfig,
) -> Result<PatchSet, PlanError> {
    use crate::parser::{ParserConfig, StreamParser};
    let mut stream = StreamParser::new(
        std::io::Cursor::new(input.as_bytes().to_vec()),
        ParserConfig::default(),
    );
    plan_updates(&mut stream, updates, config)
}

/// Drive a record stream to completion against a set of updates.
pub fn plan_updates<S: RecordStream>(
    stream: &mut S,
    updates: Vec<UpdateRequest>,
    config: PlannerConfig,
) -> Result<PatchSet, PlanError> {
    let mut planner = Planner::new(updates, config)?;
    info!("starting stream processing");

    loop {
        let idx = stream.line_idx();
        match stream.next_record()? {
            Some(line) => planner.handle_line(idx, &line)?,
            None => return planner.finish(stream.line_idx()),
        }
    }
}
