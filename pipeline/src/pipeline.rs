use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context as _, Result};

use util::{HashMap, HashSet, IdVec};

use crate::context::Context;
use crate::error::Error;
use crate::fresh::FreshnessOracle;
use crate::id::{JobId, StepId};
use crate::job::Job;
use crate::range;
use crate::registry::JobRegistry;
use crate::step::{Runner, Step};
use crate::submit::{RunMeta, Scheduler};

/// Counts returned by a generation run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub submitted: usize,
    pub up_to_date: usize,
}

/// An ordered list of validated steps plus the engine that expands them
/// into jobs and streams submission text.
#[derive(Debug)]
pub struct Pipeline {
    name: &'static str,
    steps: IdVec<StepId, Step>,
    index: HashMap<&'static str, StepId>,
}

impl Pipeline {
    /// Validate the definition in one pass: step names must be unique and
    /// parents may only name steps declared earlier in the list.
    pub fn new(name: &'static str, steps: Vec<Step>) -> Result<Self, Error> {
        let mut index: HashMap<&'static str, StepId> = HashMap::default();
        for (i, step) in steps.iter().enumerate() {
            for &parent in step.parents() {
                if !index.contains_key(parent) {
                    return Err(Error::UnknownParent {
                        child: step.name(),
                        parent,
                    });
                }
            }
            if index.insert(step.name(), StepId::from(i)).is_some() {
                return Err(Error::DuplicateStep(step.name()));
            }
        }
        Ok(Self {
            name,
            steps: IdVec::from(steps),
            index,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn num_steps(&self) -> usize {
        self.steps.len()
    }

    /// Step names in declaration order; a step's 1-based display number is
    /// its position here plus one.
    pub fn step_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.steps.iter().map(|s| s.name())
    }

    // RUNNING /////////////////

    /// Expand the selected steps into jobs and stream their submissions.
    ///
    /// Output is incremental: each submission reaches `out` as soon as it
    /// is computed, and text already written stands when a later step
    /// fails. A partial script stays usable because finished jobs are
    /// up to date on the next generation.
    pub fn run(
        &self,
        ctx: &Context,
        range_str: &str,
        force: bool,
        scheduler: &dyn Scheduler,
        out: &mut dyn Write,
    ) -> Result<RunSummary> {
        let selected = range::parse(range_str, self.steps.len())?;
        let rendered = range::render(&selected);
        let oracle = FreshnessOracle::new(force, &ctx.output_dir);

        let meta = RunMeta {
            pipeline: self.name,
            steps: &rendered,
            output_dir: &ctx.output_dir,
        };
        scheduler.prologue(&meta, out)?;

        let mut registry = JobRegistry::new(self.steps.len());
        let mut summary = RunSummary::default();

        for &sid in &selected {
            let step = self.steps.get(sid);
            let jobs = self.generate(step, ctx)?;
            let must_run = jobs.iter().filter(|j| !j.up_to_date(&oracle)).count();
            log::info!(
                "step {}: {} job(s), {} to submit",
                step.name(),
                jobs.len(),
                must_run
            );
            if must_run > 0 {
                scheduler.begin_step(step.name(), out)?;
            }

            for job in jobs {
                let up = job.up_to_date(&oracle);
                if up {
                    log::debug!("job {} is up to date, not submitting", job.id());
                }
                let id = registry.insert(sid, job)?;
                let token = {
                    let record = registry.record(id);
                    let prereqs = self.find_dependencies(&registry, step, record.job.tags());
                    if !prereqs.is_empty() {
                        log::debug!(
                            "job {} awaits [{}]",
                            record.job.id(),
                            prereqs
                                .iter()
                                .map(|p| registry.record(*p).job.id())
                                .collect::<Vec<_>>()
                                .join(", ")
                        );
                    }
                    // up-to-date prerequisites have no token; they are
                    // satisfied by existing on disk:
                    let deps: Vec<&str> = prereqs
                        .iter()
                        .filter_map(|p| registry.record(*p).token.as_deref())
                        .collect();
                    scheduler
                        .submit(step.name(), &record.job, up, &deps, out)
                        .with_context(|| format!("submitting job '{}'", record.job.id()))?
                };
                if let Some(token) = token {
                    registry.set_token(id, token);
                }
                summary.total += 1;
                if up {
                    summary.up_to_date += 1;
                } else {
                    summary.submitted += 1;
                }
            }
        }
        log::info!(
            "{} job(s) total: {} submitted, {} up to date",
            summary.total,
            summary.submitted,
            summary.up_to_date
        );
        Ok(summary)
    }

    /// Emit `rm -rf` lines for every selected job's removable files,
    /// whether or not the jobs would run.
    pub fn run_clean(&self, ctx: &Context, range_str: &str, out: &mut dyn Write) -> Result<()> {
        let selected = range::parse(range_str, self.steps.len())?;
        let mut seen: HashSet<PathBuf> = HashSet::default();
        for &sid in &selected {
            let step = self.steps.get(sid);
            for job in self.generate(step, ctx)? {
                for path in job.removable_files() {
                    if seen.insert(path.clone()) {
                        writeln!(out, "rm -rf {}", ctx.output_dir.join(path).display())?;
                    }
                }
            }
        }
        log::info!("{} removable path(s) in selected steps", seen.len());
        Ok(())
    }

    /// Emit one pandoc invocation merging the report fragments of the
    /// selected jobs that exist on disk.
    pub fn run_report(&self, ctx: &Context, range_str: &str, out: &mut dyn Write) -> Result<()> {
        let selected = range::parse(range_str, self.steps.len())?;
        let mut fragments = Vec::new();
        for &sid in &selected {
            let step = self.steps.get(sid);
            for job in self.generate(step, ctx)? {
                for path in job.report_files() {
                    let on_disk = ctx.output_dir.join(path);
                    if !on_disk.is_file() {
                        log::debug!("report fragment {} not generated yet", on_disk.display());
                    } else if !fragments.contains(&on_disk) {
                        fragments.push(on_disk);
                    }
                }
            }
        }
        if fragments.is_empty() {
            log::warn!("no report fragments on disk for the selected steps");
            return Ok(());
        }

        let report_dir = ctx.output_dir.join("report");
        let options = ctx
            .config
            .param_opt("report", "pandoc_options")
            .unwrap_or("--toc -s --to html");
        writeln!(out, "mkdir -p {}", report_dir.display())?;
        write!(
            out,
            "pandoc {} -o {}",
            options,
            report_dir.join(format!("{}.html", self.name)).display()
        )?;
        for fragment in &fragments {
            write!(out, " \\\n  {}", fragment.display())?;
        }
        writeln!(out)?;
        Ok(())
    }

    // EXPANSION /////////////////

    /// Run one step's generator over its scope, fixing each job's tags.
    fn generate(&self, step: &Step, ctx: &Context) -> Result<Vec<Job>> {
        let mut jobs = Vec::new();
        match step.runner() {
            Runner::Global(run) => {
                let generated = run(ctx).with_context(|| format!("in step '{}'", step.name()))?;
                for mut job in generated {
                    job.finalize(step.name(), &[]);
                    jobs.push(job);
                }
            }
            Runner::PerSample(run) => {
                for sample in &ctx.samples {
                    let generated =
                        run(ctx, sample).with_context(|| format!("in step '{}'", step.name()))?;
                    if let Some(mut job) = generated {
                        job.finalize(step.name(), &[sample.name.as_str()]);
                        jobs.push(job);
                    }
                }
            }
            Runner::PerReadset(run) => {
                for sample in &ctx.samples {
                    for readset in &sample.readsets {
                        let generated = run(ctx, sample, readset)
                            .with_context(|| format!("in step '{}'", step.name()))?;
                        if let Some(mut job) = generated {
                            job.finalize(
                                step.name(),
                                &[sample.name.as_str(), readset.name.as_str()],
                            );
                            jobs.push(job);
                        }
                    }
                }
            }
        }
        Ok(jobs)
    }

    /// Jobs from parent steps whose leading loop tags match the child's.
    ///
    /// The compared prefix length is the depth of the shallower scope, so
    /// a global parent matches every child, a sample parent matches the
    /// readset children of its sample, and a readset parent fans in to the
    /// sample child covering it. Generator-seeded tags sit beyond the
    /// scope depth and never participate.
    fn find_dependencies(
        &self,
        registry: &JobRegistry,
        child: &Step,
        child_tags: &[String],
    ) -> Vec<JobId> {
        let mut prereqs = Vec::new();
        for &parent_name in child.parents() {
            // parents are validated at construction, the lookup cannot miss
            let pid = self.index[parent_name];
            let d = self
                .steps
                .get(pid)
                .scope()
                .depth()
                .min(child.scope().depth());
            for &jid in registry.step_jobs(pid) {
                if registry.record(jid).job.tags()[..d] == child_tags[..d] {
                    prereqs.push(jid);
                }
            }
        }
        prereqs
    }
}
