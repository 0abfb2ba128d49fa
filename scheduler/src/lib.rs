//! Submission formatters: render jobs coming out of the engine as PBS
//! `qsub` submissions or as a plain sequential shell script.

mod batch;
pub use batch::BatchScheduler;

mod pbs;
pub use pbs::PbsScheduler;

mod script;

#[cfg(test)]
mod testutil;
