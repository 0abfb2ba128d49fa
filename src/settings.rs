use std::path::{Path, PathBuf};

use crate::args::{Args, LogLevel, SchedulerKind};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("config file '{0}' does not exist")]
    MissingConfig(String),
    #[error("readset sheet '{0}' does not exist")]
    MissingReadsets(String),
    #[error("design sheet '{0}' does not exist")]
    MissingDesign(String),
}

/// Args after validation: input paths are checked and
/// resolved, the output dir is made absolute.
#[derive(Debug)]
pub struct Settings {
    pub configs: Vec<PathBuf>,
    pub readsets: PathBuf,
    pub design: Option<PathBuf>,
    pub steps: Option<String>,
    pub output_dir: PathBuf,
    pub scheduler: SchedulerKind,
    pub force: bool,
    pub clean: bool,
    pub report: bool,
    pub loglevel: LogLevel,
}

impl TryFrom<Args> for Settings {
    type Error = anyhow::Error;
    fn try_from(args: Args) -> Result<Self, Self::Error> {
        let mut configs = Vec::with_capacity(args.config.len());
        for path in &args.config {
            configs.push(existing(path).ok_or_else(|| Error::MissingConfig(path.clone()))?);
        }
        let readsets =
            existing(&args.readsets).ok_or_else(|| Error::MissingReadsets(args.readsets.clone()))?;
        let design = match &args.design {
            Some(path) => Some(existing(path).ok_or_else(|| Error::MissingDesign(path.clone()))?),
            None => None,
        };

        // the output dir usually does not exist yet (the generated script
        // creates it), so it is absolutized against cwd, not canonicalized
        let output_dir = PathBuf::from(&args.output_dir);
        let output_dir = if output_dir.is_absolute() {
            output_dir
        } else {
            std::env::current_dir()?.join(output_dir)
        };

        Ok(Self {
            configs,
            readsets,
            design,
            steps: args.steps,
            output_dir,
            scheduler: args.job_scheduler,
            force: args.force,
            clean: args.clean,
            report: args.report,
            loglevel: args.loglevel,
        })
    }
}

/// Canonicalized path of an input file that must already exist.
fn existing(path: &str) -> Option<PathBuf> {
    Path::new(path).canonicalize().ok()
}
