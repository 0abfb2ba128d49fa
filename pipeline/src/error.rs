/// Pipeline definition and job-graph errors.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("duplicate step name '{0}'")]
    DuplicateStep(&'static str),
    #[error("step '{child}' declares parent '{parent}', which is not declared before it")]
    UnknownParent {
        child: &'static str,
        parent: &'static str,
    },
    #[error("duplicate job id '{0}'")]
    DuplicateJob(String),
}
