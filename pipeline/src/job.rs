use std::cell::OnceCell;
use std::path::PathBuf;

use crate::fresh::FreshnessOracle;

/// One schedulable unit of work: an ordered shell command chain plus the
/// files it reads and writes.
///
/// Generators build jobs with the chained setters and hand them to the
/// engine; the engine then fixes the loop tags exactly once, which also
/// fixes the id. Everything else is immutable after construction.
#[derive(Debug, Default)]
pub struct Job {
    commands: Vec<String>,
    inputs: Vec<PathBuf>,
    outputs: Vec<PathBuf>,
    modules: Vec<String>,
    removable: Vec<PathBuf>,
    report_files: Vec<PathBuf>,
    tags: Vec<String>,
    id: String,
    verdict: OnceCell<bool>,
}

impl Job {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn command(mut self, cmd: impl Into<String>) -> Self {
        self.commands.push(cmd.into());
        self
    }

    pub fn input(mut self, path: impl Into<PathBuf>) -> Self {
        self.inputs.push(path.into());
        self
    }

    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.outputs.push(path.into());
        self
    }

    /// Environment module to `module load` before the commands run.
    pub fn module(mut self, module: impl Into<String>) -> Self {
        self.modules.push(module.into());
        self
    }

    /// Intermediate file that `--clean` may remove.
    pub fn removable(mut self, path: impl Into<PathBuf>) -> Self {
        self.removable.push(path.into());
        self
    }

    /// Markdown fragment that `--report` merges.
    pub fn report_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.report_files.push(path.into());
        self
    }

    /// Extra loop tag seeded by a fan-out generator (chunk index, contrast
    /// name). Scope tags are prepended later by the engine.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Fixes the loop tags and the id. Called exactly once, by the engine,
    /// right after the generator returns.
    pub(crate) fn finalize(&mut self, step_name: &str, scope_tags: &[&str]) {
        let mut tags = Vec::with_capacity(scope_tags.len() + self.tags.len());
        tags.extend(scope_tags.iter().map(|t| t.to_string()));
        tags.append(&mut self.tags);
        self.tags = tags;

        self.id = String::from(step_name);
        for tag in &self.tags {
            self.id.push('.');
            self.id.push_str(tag);
        }
    }

    /// Step name and loop tags joined with `.`; empty until the engine has
    /// fixed the tags.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    pub fn modules(&self) -> &[String] {
        &self.modules
    }

    pub fn removable_files(&self) -> &[PathBuf] {
        &self.removable
    }

    pub fn report_files(&self) -> &[PathBuf] {
        &self.report_files
    }

    /// The oracle's verdict for this job, computed on first call and fixed
    /// from then on, so a job keeps one answer for the whole run even if
    /// the filesystem moves underneath it.
    pub fn up_to_date(&self, oracle: &FreshnessOracle) -> bool {
        *self
            .verdict
            .get_or_init(|| oracle.up_to_date(&self.inputs, &self.outputs))
    }
}
