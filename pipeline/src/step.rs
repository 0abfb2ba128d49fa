use anyhow::Result;

use sheet::{Readset, Sample};

use crate::context::Context;
use crate::job::Job;

/// How a step loops when expanding into jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Global,
    Sample,
    Readset,
}

impl Scope {
    /// Number of scope loop tags a job of this scope carries in front of
    /// any generator-seeded tags.
    pub fn depth(self) -> usize {
        match self {
            Scope::Global => 0,
            Scope::Sample => 1,
            Scope::Readset => 2,
        }
    }
}

/// A step's job generator, tagged by scope.
///
/// Global generators run once and may return any number of jobs (fan-out
/// steps seed a distinguishing tag on each). Sample and readset generators
/// run once per iteration and return at most one job.
#[derive(Debug)]
pub enum Runner {
    Global(fn(&Context) -> Result<Vec<Job>>),
    PerSample(fn(&Context, &Sample) -> Result<Option<Job>>),
    PerReadset(fn(&Context, &Sample, &Readset) -> Result<Option<Job>>),
}

impl Runner {
    pub fn scope(&self) -> Scope {
        match self {
            Runner::Global(_) => Scope::Global,
            Runner::PerSample(_) => Scope::Sample,
            Runner::PerReadset(_) => Scope::Readset,
        }
    }
}

/// Static step declaration. Declaration order in the pipeline definition
/// fixes the 1-based index that step ranges select by; parents may only
/// name steps declared earlier.
#[derive(Debug)]
pub struct Step {
    name: &'static str,
    parents: &'static [&'static str],
    runner: Runner,
}

impl Step {
    pub fn global(
        name: &'static str,
        parents: &'static [&'static str],
        run: fn(&Context) -> Result<Vec<Job>>,
    ) -> Self {
        Self {
            name,
            parents,
            runner: Runner::Global(run),
        }
    }

    pub fn per_sample(
        name: &'static str,
        parents: &'static [&'static str],
        run: fn(&Context, &Sample) -> Result<Option<Job>>,
    ) -> Self {
        Self {
            name,
            parents,
            runner: Runner::PerSample(run),
        }
    }

    pub fn per_readset(
        name: &'static str,
        parents: &'static [&'static str],
        run: fn(&Context, &Sample, &Readset) -> Result<Option<Job>>,
    ) -> Self {
        Self {
            name,
            parents,
            runner: Runner::PerReadset(run),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn parents(&self) -> &'static [&'static str] {
        self.parents
    }

    pub fn scope(&self) -> Scope {
        self.runner.scope()
    }

    pub(crate) fn runner(&self) -> &Runner {
        &self.runner
    }
}
