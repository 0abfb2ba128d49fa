use std::io::Write;

use anyhow::Result;

use config::Config;
use pipeline::{Job, RunMeta, Scheduler};

use crate::script::{banner, capture_var, command_chain, SEPARATOR};

/// Formats each job as a `qsub` submission, with resource flags looked up
/// in the job's step section (falling back to `[DEFAULT]`) and scheduler
/// job ids threaded between submissions through captured shell variables.
pub struct PbsScheduler<'a> {
    config: &'a Config,
}

impl<'a> PbsScheduler<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }
}

impl Scheduler for PbsScheduler<'_> {
    fn prologue(&self, meta: &RunMeta, out: &mut dyn Write) -> Result<()> {
        writeln!(out, "#!/bin/bash")?;
        writeln!(out, "set -eu -o pipefail")?;
        writeln!(out)?;
        writeln!(out, "{}", SEPARATOR)?;
        writeln!(out, "# {} PBS job submission script", meta.pipeline)?;
        writeln!(out, "# steps: {}", meta.steps)?;
        writeln!(out, "{}", SEPARATOR)?;
        writeln!(out)?;
        writeln!(out, "SCHEDULER=pbs")?;
        writeln!(out, "PIPELINE={}", meta.pipeline)?;
        writeln!(out, "STEPS={}", meta.steps)?;
        writeln!(out, "OUTPUT_DIR={}", meta.output_dir.display())?;
        writeln!(out, "JOB_OUTPUT_DIR=$OUTPUT_DIR/job_output")?;
        // resolved when the script runs, so regeneration is byte-identical
        writeln!(out, "TIMESTAMP=`date +%FT%H.%M.%S`")?;
        writeln!(out, "JOB_LIST=$JOB_OUTPUT_DIR/${{PIPELINE}}_job_list_$TIMESTAMP")?;
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
        step: &str,
        job: &Job,
        up_to_date: bool,
        deps: &[&str],
        out: &mut dyn Write,
    ) -> Result<Option<String>> {
        if up_to_date {
            return Ok(None);
        }

        // look everything up before writing, so a missing key cannot leave
        // half a job block behind
        let submit_cmd = self.config.param(step, "cluster_submit_cmd")?;
        let other = self.config.param(step, "cluster_other_arg")?;
        let work_dir_arg = self.config.param(step, "cluster_work_dir_arg")?;
        let output_dir_arg = self.config.param(step, "cluster_output_dir_arg")?;
        let job_name_arg = self.config.param(step, "cluster_job_name_arg")?;
        let walltime = self.config.param(step, "cluster_walltime")?;
        let queue = self.config.param(step, "cluster_queue")?;
        let cpu = self.config.param(step, "cluster_cpu")?;
        let mem = self.config.param_opt(step, "cluster_mem");
        let dep_arg = self.config.param(step, "cluster_dependency_arg")?;
        let dep_sep = self.config.param(step, "cluster_dependency_sep")?;
        let suffix = self.config.param_opt(step, "cluster_submit_cmd_suffix");

        let mut qsub = format!(
            "{submit_cmd} {other} {work_dir_arg} $OUTPUT_DIR {output_dir_arg} $JOB_OUTPUT \
             {job_name_arg} $JOB_NAME {walltime} {queue} {cpu}"
        );
        if let Some(mem) = mem {
            qsub.push(' ');
            qsub.push_str(mem);
        }
        if !deps.is_empty() {
            qsub.push(' ');
            qsub.push_str(dep_arg);
            qsub.push_str("$JOB_DEPENDENCIES");
        }
        if let Some(suffix) = suffix {
            qsub.push(' ');
            qsub.push_str(suffix);
        }
        log::debug!("job {} submits with: {}", job.id(), qsub);

        let var = capture_var(job.id());
        banner(out, &format!("JOB: {}", job.id()))?;
        writeln!(out, "JOB_NAME={}", job.id())?;
        // always assigned, so the job-list line below never sees a stale
        // value from the previous job
        writeln!(out, "JOB_DEPENDENCIES={}", deps.join(dep_sep))?;
        writeln!(out, "JOB_DONE=$JOB_OUTPUT_DIR/$STEP/$JOB_NAME.seqpipe.done")?;
        writeln!(out, "JOB_OUTPUT_RELATIVE_PATH=$STEP/${{JOB_NAME}}_$TIMESTAMP.o")?;
        writeln!(out, "JOB_OUTPUT=$JOB_OUTPUT_DIR/$JOB_OUTPUT_RELATIVE_PATH")?;
        // the body is echoed inside double quotes: backslashes and quotes
        // in the chain are escaped so the job receives the commands byte
        // for byte, while the unescaped $JOB_DONE in the chain head and in
        // the trailer below is baked in at submission time
        let chain = command_chain(job).replace('\\', "\\\\").replace('"', "\\\"");
        writeln!(out, "{}=$(echo \"{}", var, chain)?;
        writeln!(out, "seqpipe_state=\\$?")?;
        writeln!(out, "echo SeqpipeExitStatus:\\$seqpipe_state")?;
        writeln!(
            out,
            "if [ \\$seqpipe_state -eq 0 ] ; then touch $JOB_DONE ; fi"
        )?;
        writeln!(out, "exit \\$seqpipe_state\" | \\")?;
        writeln!(out, "{})", qsub)?;
        writeln!(
            out,
            "echo \"${}\t$JOB_NAME\t$JOB_DEPENDENCIES\t$JOB_OUTPUT_RELATIVE_PATH\" >> $JOB_LIST",
            var
        )?;

        Ok(Some(format!("${}", var)))
    }
}
