use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use util::{HashMap, HashSet};

/// Sequencing protocol of one readset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunType {
    PairedEnd,
    SingleEnd,
}

impl RunType {
    pub fn is_paired(&self) -> bool {
        matches!(self, Self::PairedEnd)
    }
}

/// One raw sequencing data unit (a FASTQ pair and/or a BAM) belonging to a sample.
#[derive(Debug, Clone)]
pub struct Readset {
    pub name: String,
    pub sample: String,
    pub run_type: RunType,
    pub library: Option<String>,
    pub quality_offset: u8,
    pub fastq1: Option<PathBuf>,
    pub fastq2: Option<PathBuf>,
    pub bam: Option<PathBuf>,
}

/// A sample and its readsets, in sheet order.
#[derive(Debug, Clone)]
pub struct Sample {
    pub name: String,
    pub readsets: Vec<Readset>,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("readset sheet has no header line")]
    NoHeader,
    #[error("readset sheet header is missing the \"{0}\" column")]
    MissingColumn(&'static str),
    #[error("line {line}: missing value in \"{column}\" column")]
    MissingValue { line: usize, column: &'static str },
    #[error("line {line}: unknown run type \"{value}\" (expected PAIRED_END or SINGLE_END)")]
    BadRunType { line: usize, value: String },
    #[error("line {line}: quality offset \"{value}\" is not a number")]
    BadQualityOffset { line: usize, value: String },
    #[error("line {line}: paired-end readset \"{name}\" has FASTQ1 but no FASTQ2")]
    MissingFastq2 { line: usize, name: String },
    #[error("line {line}: readset \"{name}\" has neither a FASTQ1 nor a BAM input")]
    NoInput { line: usize, name: String },
    #[error("line {line}: duplicate readset name \"{name}\"")]
    DuplicateReadset { line: usize, name: String },
}

pub fn load_readsets(path: &Path) -> Result<Vec<Sample>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading readset sheet {}", path.display()))?;
    let samples = parse_readsets(&text)
        .with_context(|| format!("parsing readset sheet {}", path.display()))?;
    log::info!(
        "{} readset(s) in {} sample(s) from {}",
        samples.iter().map(|s| s.readsets.len()).sum::<usize>(),
        samples.len(),
        path.display()
    );
    Ok(samples)
}

/// Parse a tab-separated readset sheet.
///
/// Columns are located by header name, so column order does not matter and
/// unknown columns are ignored. `Sample`, `Readset` and `RunType` are
/// required; `Library`, `QualityOffset`, `FASTQ1`, `FASTQ2` and `BAM` are
/// optional. Samples are returned grouped by first appearance, readsets in
/// sheet order.
pub fn parse_readsets(text: &str) -> Result<Vec<Sample>, Error> {
    let mut lines = text.lines().enumerate().filter(|(_, l)| !l.trim().is_empty());
    let header = lines.next().map(|(_, l)| Header::parse(l)).ok_or(Error::NoHeader)??;

    let mut samples: Vec<Sample> = Vec::new();
    let mut sample_idx: HashMap<String, usize> = HashMap::default();
    let mut seen_readsets: HashSet<String> = HashSet::default();

    for (i, text_line) in lines {
        let line = i + 1;
        let cells: Vec<&str> = text_line.split('\t').collect();
        let readset = header.parse_row(&cells, line)?;

        if !seen_readsets.insert(readset.name.clone()) {
            return Err(Error::DuplicateReadset {
                line,
                name: readset.name,
            });
        }

        match sample_idx.get(&readset.sample) {
            Some(&idx) => samples[idx].readsets.push(readset),
            None => {
                sample_idx.insert(readset.sample.clone(), samples.len());
                samples.push(Sample {
                    name: readset.sample.clone(),
                    readsets: vec![readset],
                });
            }
        }
    }
    Ok(samples)
}

/// Column positions located from the header line.
struct Header {
    sample: usize,
    readset: usize,
    run_type: usize,
    library: Option<usize>,
    quality_offset: Option<usize>,
    fastq1: Option<usize>,
    fastq2: Option<usize>,
    bam: Option<usize>,
}

impl Header {
    fn parse(line: &str) -> Result<Self, Error> {
        let mut cols: HashMap<&str, usize> = HashMap::default();
        for (i, name) in line.split('\t').enumerate() {
            cols.entry(name.trim()).or_insert(i);
        }
        let required = |name: &'static str| cols.get(name).copied().ok_or(Error::MissingColumn(name));
        Ok(Self {
            sample: required("Sample")?,
            readset: required("Readset")?,
            run_type: required("RunType")?,
            library: cols.get("Library").copied(),
            quality_offset: cols.get("QualityOffset").copied(),
            fastq1: cols.get("FASTQ1").copied(),
            fastq2: cols.get("FASTQ2").copied(),
            bam: cols.get("BAM").copied(),
        })
    }

    fn parse_row(&self, cells: &[&str], line: usize) -> Result<Readset, Error> {
        let cell = |col: Option<usize>| {
            col.and_then(|i| cells.get(i))
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
        };
        let required = |col: usize, column: &'static str| {
            cell(Some(col)).ok_or(Error::MissingValue { line, column })
        };

        let sample = required(self.sample, "Sample")?.to_string();
        let name = required(self.readset, "Readset")?.to_string();
        let run_type = match required(self.run_type, "RunType")? {
            "PAIRED_END" => RunType::PairedEnd,
            "SINGLE_END" => RunType::SingleEnd,
            value => {
                return Err(Error::BadRunType {
                    line,
                    value: value.to_string(),
                })
            }
        };
        let quality_offset = match cell(self.quality_offset) {
            Some(value) => value.parse().map_err(|_| Error::BadQualityOffset {
                line,
                value: value.to_string(),
            })?,
            None => 33,
        };
        let fastq1 = cell(self.fastq1).map(PathBuf::from);
        let fastq2 = cell(self.fastq2).map(PathBuf::from);
        let bam = cell(self.bam).map(PathBuf::from);

        if run_type.is_paired() && fastq1.is_some() && fastq2.is_none() {
            return Err(Error::MissingFastq2 { line, name });
        }
        if fastq1.is_none() && bam.is_none() {
            return Err(Error::NoInput { line, name });
        }

        Ok(Readset {
            name,
            sample,
            run_type,
            library: cell(self.library).map(str::to_string),
            quality_offset,
            fastq1,
            fastq2,
            bam,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const SHEET: &str = "\
Sample\tReadset\tLibrary\tRunType\tQualityOffset\tFASTQ1\tFASTQ2\tBAM
S1\tS1.R1\tlib01\tPAIRED_END\t33\traw/s1_r1_1.fq.gz\traw/s1_r1_2.fq.gz\t
S2\tS2.R1\tlib02\tSINGLE_END\t\traw/s2_r1.fq.gz\t\t
S1\tS1.R2\tlib01\tPAIRED_END\t64\traw/s1_r2_1.fq.gz\traw/s1_r2_2.fq.gz\t
";

    #[test]
    fn test_groups_by_first_appearance() -> anyhow::Result<()> {
        let samples = parse_readsets(SHEET)?;
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].name, "S1");
        assert_eq!(samples[1].name, "S2");
        // S1's readsets keep sheet order even though S2 sits between them:
        let names: Vec<&str> = samples[0].readsets.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["S1.R1", "S1.R2"]);
        assert_eq!(samples[0].readsets[1].quality_offset, 64);
        assert_eq!(samples[1].readsets[0].quality_offset, 33);
        assert!(samples[1].readsets[0].fastq2.is_none());
        Ok(())
    }

    #[test]
    fn test_columns_located_by_name() -> anyhow::Result<()> {
        // different column order, extra column, no BAM column at all:
        let sheet = "\
RunType\tSample\tExtra\tReadset\tFASTQ1\tFASTQ2
PAIRED_END\tS1\tx\tS1.R1\ta_1.fq\ta_2.fq
";
        let samples = parse_readsets(sheet)?;
        assert_eq!(samples[0].readsets[0].fastq1, Some(PathBuf::from("a_1.fq")));
        assert!(samples[0].readsets[0].bam.is_none());
        assert!(samples[0].readsets[0].library.is_none());
        Ok(())
    }

    #[test]
    fn test_bam_only_readset() -> anyhow::Result<()> {
        let sheet = "Sample\tReadset\tRunType\tBAM\nS1\tS1.R1\tPAIRED_END\taligned/s1.bam\n";
        let samples = parse_readsets(sheet)?;
        assert_eq!(
            samples[0].readsets[0].bam,
            Some(PathBuf::from("aligned/s1.bam"))
        );
        Ok(())
    }

    #[test]
    fn test_errors() {
        // missing required column:
        let err = parse_readsets("Sample\tRunType\nS1\tPAIRED_END\n").unwrap_err();
        assert!(matches!(err, Error::MissingColumn("Readset")));

        // unknown run type:
        let err = parse_readsets("Sample\tReadset\tRunType\tBAM\nS1\tR1\tMATE_PAIR\tx.bam\n")
            .unwrap_err();
        assert!(matches!(err, Error::BadRunType { line: 2, .. }));

        // paired-end with half a pair:
        let err = parse_readsets("Sample\tReadset\tRunType\tFASTQ1\nS1\tR1\tPAIRED_END\ta.fq\n")
            .unwrap_err();
        assert!(matches!(err, Error::MissingFastq2 { .. }));

        // no input at all:
        let err = parse_readsets("Sample\tReadset\tRunType\nS1\tR1\tSINGLE_END\n").unwrap_err();
        assert!(matches!(err, Error::NoInput { .. }));

        // duplicate readset name:
        let sheet = "Sample\tReadset\tRunType\tBAM\nS1\tR1\tSINGLE_END\ta.bam\nS2\tR1\tSINGLE_END\tb.bam\n";
        let err = parse_readsets(sheet).unwrap_err();
        assert!(matches!(err, Error::DuplicateReadset { line: 3, .. }));
    }
}
