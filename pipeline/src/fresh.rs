use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Decides whether a job's declared outputs are current with respect to its
/// declared inputs, from filesystem modification times alone.
///
/// Job paths are written the way they appear in the emitted script, which
/// runs after `cd`-ing into the output directory, so relative paths here are
/// resolved against that same directory before stat-ing.
#[derive(Debug)]
pub struct FreshnessOracle {
    force: bool,
    base: PathBuf,
}

impl FreshnessOracle {
    pub fn new(force: bool, base: impl Into<PathBuf>) -> Self {
        Self {
            force,
            base: base.into(),
        }
    }

    /// True when every declared output exists and is no older than the
    /// newest existing input.
    ///
    /// - `force` makes every job stale, regardless of timestamps.
    /// - No declared outputs means there is nothing to be current: stale.
    /// - A missing output means stale.
    /// - A missing input is treated as infinitely old, so it never keeps a
    ///   job stale; generators that need an input present must check for it
    ///   themselves.
    /// - No inputs at all (or none that exist) with all outputs present is
    ///   current: a static artifact.
    pub fn up_to_date(&self, inputs: &[PathBuf], outputs: &[PathBuf]) -> bool {
        if self.force || outputs.is_empty() {
            return false;
        }

        let mut oldest_output: Option<SystemTime> = None;
        for path in outputs {
            match self.mtime(path) {
                None => return false,
                Some(t) => {
                    oldest_output = Some(match oldest_output {
                        Some(prev) if prev <= t => prev,
                        _ => t,
                    });
                }
            }
        }

        let mut newest_input: Option<SystemTime> = None;
        for path in inputs {
            if let Some(t) = self.mtime(path) {
                newest_input = Some(match newest_input {
                    Some(prev) if prev >= t => prev,
                    _ => t,
                });
            }
        }

        match (oldest_output, newest_input) {
            (Some(out), Some(inp)) => out >= inp,
            // outputs exist, no stattable inputs:
            (Some(_), None) => true,
            // outputs is non-empty, so every output was stattable here:
            (None, _) => unreachable!("checked above"),
        }
    }

    fn mtime(&self, path: &Path) -> Option<SystemTime> {
        let resolved = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base.join(path)
        };
        std::fs::metadata(resolved).and_then(|m| m.modified()).ok()
    }
}
