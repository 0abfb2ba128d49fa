use std::io::{self, Write};

use pipeline::Job;

pub(crate) const SEPARATOR: &str =
    "#-------------------------------------------------------------------------------";

pub(crate) fn banner(out: &mut dyn Write, title: &str) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", SEPARATOR)?;
    writeln!(out, "# {}", title)?;
    writeln!(out, "{}", SEPARATOR)
}

/// Shell variable that captures a job's scheduler id: the job id with
/// every non-alphanumeric byte replaced by `_`, plus a `_JOB_ID` suffix.
pub(crate) fn capture_var(job_id: &str) -> String {
    let mut var: String = job_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    var.push_str("_JOB_ID");
    var
}

/// The command chain a job runs: drop the done marker, load modules, run
/// the commands, all `&&`-chained so the chain stops at the first failure.
/// The done marker is recreated by the scheduler-specific trailer, on its
/// own line after the chain: a trailing command may end in a heredoc, so
/// nothing can be appended to the chain itself.
pub(crate) fn command_chain(job: &Job) -> String {
    let mut pieces: Vec<String> = Vec::with_capacity(job.commands().len() + 2);
    pieces.push("rm -f $JOB_DONE".to_string());
    if !job.modules().is_empty() {
        pieces.push(format!("module load {}", job.modules().join(" ")));
    }
    pieces.extend(job.commands().iter().cloned());
    pieces.join(" && \\\n")
}
