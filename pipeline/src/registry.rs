use util::{HashMap, IdVec};

use crate::error::Error;
use crate::id::{JobId, StepId};
use crate::job::Job;

/// A job as the engine keeps it after submission: which step produced it,
/// the job itself, and the capture token returned by the formatter (absent
/// when nothing was written for it).
#[derive(Debug)]
pub struct JobRecord {
    pub step: StepId,
    pub job: Job,
    pub token: Option<String>,
}

/// Every job the current run has produced so far, addressable three ways:
/// by handle, by producing step, and by job-id string (for uniqueness).
#[derive(Debug)]
pub struct JobRegistry {
    records: IdVec<JobId, JobRecord>,
    by_step: IdVec<StepId, Vec<JobId>>,
    ids: HashMap<String, JobId>,
}

impl JobRegistry {
    pub fn new(num_steps: usize) -> Self {
        Self {
            records: IdVec::default(),
            by_step: IdVec::fill(Vec::new(), num_steps),
            ids: HashMap::default(),
        }
    }

    /// Record a finalized job. Two jobs with the same id would emit the
    /// same capture variable, so a duplicate is refused.
    pub fn insert(&mut self, step: StepId, job: Job) -> Result<JobId, Error> {
        let key = job.id().to_string();
        if self.ids.contains_key(&key) {
            return Err(Error::DuplicateJob(key));
        }
        let id = self.records.push(JobRecord {
            step,
            job,
            token: None,
        });
        self.ids.insert(key, id);
        self.by_step.get_mut(step).push(id);
        Ok(id)
    }

    pub fn record(&self, id: JobId) -> &JobRecord {
        self.records.get(id)
    }

    pub fn set_token(&mut self, id: JobId, token: String) {
        self.records.get_mut(id).token = Some(token);
    }

    /// Handles of the jobs a step has produced, in production order.
    pub fn step_jobs(&self, step: StepId) -> &[JobId] {
        self.by_step.get(step)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
