//! Step and job-graph engine: expands loop-scoped steps into concrete
//! jobs, resolves inter-job dependencies across scopes, decides freshness
//! from file timestamps, and streams scheduler submissions in order.

mod context;
pub use context::Context;

mod error;
pub use error::Error;

mod fresh;
pub use fresh::FreshnessOracle;

mod id;
pub use id::{JobId, StepId};

mod job;
pub use job::Job;

mod pipeline;
pub use pipeline::{Pipeline, RunSummary};

pub mod range;

mod registry;

mod step;
pub use step::{Runner, Scope, Step};

mod submit;
pub use submit::{RunMeta, Scheduler};
