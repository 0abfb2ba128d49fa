use std::path::Path;

use anyhow::{Context, Result};

use util::HashSet;

use crate::Sample;

/// One named comparison between two groups of samples.
#[derive(Debug, Clone)]
pub struct Contrast {
    pub name: String,
    pub controls: Vec<String>,
    pub treatments: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("design sheet has no header line")]
    NoHeader,
    #[error("design sheet header must start with a \"Sample\" column")]
    BadHeader,
    #[error("design sheet declares no contrast columns")]
    NoContrasts,
    #[error("design sheet: duplicate contrast name \"{0}\"")]
    DuplicateContrast(String),
    #[error("line {line}: row has {got} cell(s) but the header declares {want} columns")]
    BadCellCount { line: usize, got: usize, want: usize },
    #[error("line {line}: \"{value}\" is not a contrast membership (expected 0, 1 or 2)")]
    BadMembership { line: usize, value: String },
    #[error("line {line}: unknown sample \"{name}\" (not in the readset sheet)")]
    UnknownSample { line: usize, name: String },
    #[error("line {line}: duplicate design row for sample \"{name}\"")]
    DuplicateSample { line: usize, name: String },
}

pub fn load_design(path: &Path, samples: &[Sample]) -> Result<Vec<Contrast>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading design sheet {}", path.display()))?;
    let contrasts = parse_design(&text, samples)
        .with_context(|| format!("parsing design sheet {}", path.display()))?;
    log::info!("{} contrast(s) from {}", contrasts.len(), path.display());
    Ok(contrasts)
}

/// Parse a tab-separated design sheet.
///
/// The first header cell must be `Sample`; every further header cell names a
/// contrast. Each row assigns its sample a membership per contrast: `0` (not
/// involved), `1` (control) or `2` (treatment). Sample names must come from
/// the readset sheet.
pub fn parse_design(text: &str, samples: &[Sample]) -> Result<Vec<Contrast>, Error> {
    let known: HashSet<&str> = samples.iter().map(|s| s.name.as_str()).collect();

    let mut lines = text.lines().enumerate().filter(|(_, l)| !l.trim().is_empty());
    let (_, header) = lines.next().ok_or(Error::NoHeader)?;
    let header: Vec<&str> = header.split('\t').map(str::trim).collect();
    if header.first() != Some(&"Sample") {
        return Err(Error::BadHeader);
    }
    if header.len() < 2 {
        return Err(Error::NoContrasts);
    }

    let mut contrasts: Vec<Contrast> = Vec::with_capacity(header.len() - 1);
    let mut names: HashSet<&str> = HashSet::default();
    for name in &header[1..] {
        if !names.insert(name) {
            return Err(Error::DuplicateContrast(name.to_string()));
        }
        contrasts.push(Contrast {
            name: name.to_string(),
            controls: Vec::new(),
            treatments: Vec::new(),
        });
    }

    let mut seen_samples: HashSet<String> = HashSet::default();
    for (i, text_line) in lines {
        let line = i + 1;
        let cells: Vec<&str> = text_line.split('\t').map(str::trim).collect();
        if cells.len() != header.len() {
            return Err(Error::BadCellCount {
                line,
                got: cells.len(),
                want: header.len(),
            });
        }
        let sample = cells[0];
        if !known.contains(sample) {
            return Err(Error::UnknownSample {
                line,
                name: sample.to_string(),
            });
        }
        if !seen_samples.insert(sample.to_string()) {
            return Err(Error::DuplicateSample {
                line,
                name: sample.to_string(),
            });
        }
        for (contrast, &cell) in contrasts.iter_mut().zip(&cells[1..]) {
            match cell {
                "0" => {}
                "1" => contrast.controls.push(sample.to_string()),
                "2" => contrast.treatments.push(sample.to_string()),
                value => {
                    return Err(Error::BadMembership {
                        line,
                        value: value.to_string(),
                    })
                }
            }
        }
    }
    Ok(contrasts)
}
