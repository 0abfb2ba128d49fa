use std::io::Write;

use anyhow::Result;

use pipeline::{Job, RunMeta, Scheduler};

use crate::script::{banner, command_chain, SEPARATOR};

/// Formats jobs as plain shell blocks executed in script order. There are
/// no dependency flags and no captured ids: sequential execution under
/// `set -e` is the dependency mechanism.
pub struct BatchScheduler;

impl Scheduler for BatchScheduler {
    fn prologue(&self, meta: &RunMeta, out: &mut dyn Write) -> Result<()> {
        writeln!(out, "#!/bin/bash")?;
        writeln!(out, "set -eu -o pipefail")?;
        writeln!(out)?;
        writeln!(out, "{}", SEPARATOR)?;
        writeln!(out, "# {} batch script", meta.pipeline)?;
        writeln!(out, "# steps: {}", meta.steps)?;
        writeln!(out, "{}", SEPARATOR)?;
        writeln!(out)?;
        writeln!(out, "PIPELINE={}", meta.pipeline)?;
        writeln!(out, "STEPS={}", meta.steps)?;
        writeln!(out, "OUTPUT_DIR={}", meta.output_dir.display())?;
        writeln!(out, "JOB_OUTPUT_DIR=$OUTPUT_DIR/job_output")?;
        writeln!(out, "mkdir -p $OUTPUT_DIR")?;
        writeln!(out, "cd $OUTPUT_DIR")?;
        Ok(())
    }

    fn begin_step(&self, step: &str, out: &mut dyn Write) -> Result<()> {
        banner(out, &format!("STEP: {}", step))?;
        writeln!(out, "STEP={}", step)?;
        writeln!(out, "mkdir -p $JOB_OUTPUT_DIR/$STEP")?;
        Ok(())
    }

    fn submit(
        &self,
        _step: &str,
        job: &Job,
        up_to_date: bool,
        _deps: &[&str],
        out: &mut dyn Write,
    ) -> Result<Option<String>> {
        if up_to_date {
            return Ok(None);
        }
        log::debug!("job {} inlined into the batch script", job.id());
        banner(out, &format!("JOB: {}", job.id()))?;
        writeln!(out, "JOB_NAME={}", job.id())?;
        writeln!(out, "JOB_DONE=$JOB_OUTPUT_DIR/$STEP/$JOB_NAME.seqpipe.done")?;
        writeln!(out, "{}", command_chain(job))?;
        // under set -e this line is only reached when the chain succeeded
        writeln!(out, "touch $JOB_DONE")?;
        Ok(None)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testutil;
    use anyhow::Result;

    #[test]
    fn test_batch_script_is_plain_shell() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let pipeline = testutil::two_step_pipeline();
        let ctx = testutil::one_sample_ctx(dir.path());
        let mut buf = Vec::new();
        pipeline.run(&ctx, "1-2", false, &BatchScheduler, &mut buf)?;
        let text = String::from_utf8(buf)?;

        assert!(text.starts_with("#!/bin/bash\nset -eu -o pipefail\n"));
        assert!(text.contains("# methyltest batch script\n"));
        assert!(text.contains("# STEP: align\n"));
        assert!(text.contains("JOB_NAME=align.sA.r1\n"));
        assert!(text.contains("JOB_DONE=$JOB_OUTPUT_DIR/$STEP/$JOB_NAME.seqpipe.done\n"));
        assert!(text.contains("rm -f $JOB_DONE && \\\n"));
        assert!(text.contains("bismark -q genome/ r1.fq\ntouch $JOB_DONE\n"));

        // no scheduler machinery in batch mode
        assert!(!text.contains("qsub"));
        assert!(!text.contains("JOB_ID"));
        assert!(!text.contains("JOB_DEPENDENCIES"));
        assert!(!text.contains("SCHEDULER="));
        Ok(())
    }

    #[test]
    fn test_up_to_date_job_is_omitted() -> Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::create_dir_all(dir.path().join("genome/Bisulfite_Genome"))?;
        let pipeline = testutil::two_step_pipeline();
        let ctx = testutil::one_sample_ctx(dir.path());
        let mut buf = Vec::new();
        pipeline.run(&ctx, "1-2", false, &BatchScheduler, &mut buf)?;
        let text = String::from_utf8(buf)?;

        assert!(!text.contains("JOB_NAME=prepare\n"));
        assert!(text.contains("JOB_NAME=align.sA.r1\n"));
        Ok(())
    }
}
