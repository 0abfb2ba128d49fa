use std::io::Write;

use anyhow::{Context as _, Result};
use colored::Colorize;

use config::Config;
use pipeline::{Context, Pipeline, RunSummary};
use scheduler::{BatchScheduler, PbsScheduler};
use util::Timer;

use crate::args::SchedulerKind;
use crate::settings::Settings;
use crate::steps;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("No steps given; choose a range with -s from:\n{0}")]
    NoStepsSpecified(String),
}

/// Carries one run of the command-line app from settings to output.
pub struct App {
    /// Validated settings for this run
    settings: Settings,
}

impl App {
    /// An app that will run with the given settings.
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Run the app, streaming the generated text to stdout.
    pub fn run(self) -> Result<()> {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        self.run_to(&mut out)
    }

    /// Run the app, using settings to determine what to generate.
    pub fn run_to(self, out: &mut dyn Write) -> Result<()> {
        let timer = Timer::now();
        let pipeline = steps::methylseq()?;

        let steps = match &self.settings.steps {
            Some(steps) => steps.clone(),
            None => return Err(Error::NoStepsSpecified(step_listing(&pipeline)).into()),
        };

        let ctx = self.load_context()?;

        if self.settings.clean {
            pipeline.run_clean(&ctx, &steps, out)?;
        } else if self.settings.report {
            pipeline.run_report(&ctx, &steps, out)?;
        } else {
            let summary = self.generate(&pipeline, &ctx, &steps, out)?;
            out.flush()?;
            print_summary(&summary);
        }

        if let Ok(elapsed) = timer.elapsed() {
            log::debug!("finished in {:?}", elapsed);
        }
        Ok(())
    }
}

// LOADING INPUTS /////////////////
impl App {
    fn load_context(&self) -> Result<Context> {
        let config = Config::load(&self.settings.configs)?;
        let samples = sheet::load_readsets(&self.settings.readsets)?;
        let contrasts = match &self.settings.design {
            Some(path) => Some(sheet::load_design(path, &samples)?),
            None => None,
        };
        Ok(Context::new(
            config,
            samples,
            contrasts,
            self.settings.output_dir.clone(),
        ))
    }
}

// GENERATING /////////////////
impl App {
    fn generate(
        &self,
        pipeline: &Pipeline,
        ctx: &Context,
        steps: &str,
        out: &mut dyn Write,
    ) -> Result<RunSummary> {
        let summary = match self.settings.scheduler {
            SchedulerKind::Pbs => {
                let scheduler = PbsScheduler::new(&ctx.config);
                pipeline.run(ctx, steps, self.settings.force, &scheduler, out)
            }
            SchedulerKind::Batch => {
                pipeline.run(ctx, steps, self.settings.force, &BatchScheduler, out)
            }
        };
        summary.context("generating submission script")
    }
}

/// Numbered step names, one per line, for the -s error message.
fn step_listing(pipeline: &Pipeline) -> String {
    let mut listing = String::with_capacity(256);
    for (i, name) in pipeline.step_names().enumerate() {
        if i > 0 {
            listing.push('\n');
        }
        listing.push_str(&format!("{}- {}", i + 1, name));
    }
    listing
}

fn print_summary(summary: &RunSummary) {
    eprintln!(
        "{} {} job(s): {} to submit, {} up to date.",
        "Generation complete.".green(),
        summary.total,
        summary.submitted,
        summary.up_to_date,
    );
}
