use std::io::Write;
use std::path::Path;

use anyhow::Result;

use crate::job::Job;

/// Run-wide values a formatter needs for the script header.
#[derive(Debug)]
pub struct RunMeta<'a> {
    pub pipeline: &'a str,
    /// Normalized rendering of the selected step range.
    pub steps: &'a str,
    pub output_dir: &'a Path,
}

/// Renders jobs into submission text on the engine's output stream.
///
/// Implementations only ever write text; nothing is executed and nothing
/// waits on a scheduler.
pub trait Scheduler {
    /// Script header, written once before any step.
    fn prologue(&self, meta: &RunMeta, out: &mut dyn Write) -> Result<()>;

    /// Step banner, written once per selected step that has at least one
    /// job to submit.
    fn begin_step(&self, step: &str, out: &mut dyn Write) -> Result<()>;

    /// Write the submission block for `job`. `deps` holds the capture
    /// tokens of the job's prerequisites that are themselves submitted by
    /// this script. Returns the token later jobs use to depend on this
    /// one, or `None` when nothing was written (up-to-date jobs in
    /// particular).
    fn submit(
        &self,
        step: &str,
        job: &Job,
        up_to_date: bool,
        deps: &[&str],
        out: &mut dyn Write,
    ) -> Result<Option<String>>;
}
