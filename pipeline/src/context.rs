use std::path::PathBuf;

use config::Config;
use sheet::{Contrast, Sample};

/// Everything a step generator may consult while building its jobs:
/// merged configuration, the sample collection from the readset sheet, the
/// contrasts from the design sheet when one was given, and the output
/// directory all relative paths are written against.
#[derive(Debug)]
pub struct Context {
    pub config: Config,
    pub samples: Vec<Sample>,
    pub contrasts: Option<Vec<Contrast>>,
    pub output_dir: PathBuf,
}

impl Context {
    pub fn new(
        config: Config,
        samples: Vec<Sample>,
        contrasts: Option<Vec<Contrast>>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            config,
            samples,
            contrasts,
            output_dir: output_dir.into(),
        }
    }
}
