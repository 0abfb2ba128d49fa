//! Step definitions for the bundled `methylseq` pipeline: WGBS/RRBS
//! bisulfite sequencing from genome preparation through differential
//! methylation. Each submodule groups the steps built around one tool
//! family; all output paths are relative to the run's output directory.

/// Bismark steps: genome preparation, alignment, deduplication, calling
mod bismark;
/// Per-contrast differential methylation analyses (R drivers)
mod differential;
/// Picard BAM merging
mod picard;
/// Trim Galore read trimming
mod trim;

use pipeline::{Pipeline, Step};
use sheet::{Readset, Sample};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("a design sheet (-d) is required for differential methylation")]
    NoDesign,
    #[error("contrast '{0}' needs at least one control and one treatment sample")]
    EmptyContrast(String),
}

/// The bundled bisulfite pipeline, steps in fixed declaration order.
pub fn methylseq() -> Result<Pipeline, pipeline::Error> {
    Pipeline::new(
        "methylseq",
        vec![
            Step::global("bismark_prepare_genome", &[], bismark::prepare_genome),
            Step::per_readset("trim_galore", &[], trim::trim_galore),
            Step::per_readset(
                "bismark_align",
                &["bismark_prepare_genome", "trim_galore"],
                bismark::align,
            ),
            Step::per_sample("merge_alignments", &["bismark_align"], picard::merge_alignments),
            Step::per_sample("bismark_deduplicate", &["merge_alignments"], bismark::deduplicate),
            Step::per_sample("methylation_call", &["bismark_deduplicate"], bismark::methylation_call),
            Step::global(
                "differential_methylated_pos",
                &["methylation_call"],
                differential::methylated_positions,
            ),
            Step::global(
                "differential_methylated_regions",
                &["methylation_call"],
                differential::methylated_regions,
            ),
        ],
    )
}

/// RRBS libraries change trimming flags and skip deduplication.
fn is_rrbs(rs: &Readset) -> bool {
    rs.library.as_deref() == Some("RRBS")
}

/// Run type and protocol are treated as per-sample properties, read off
/// the first readset; the sheet parser guarantees every sample owns at
/// least one.
fn lead_readset(sample: &Sample) -> &Readset {
    match sample.readsets.first() {
        Some(rs) => rs,
        None => unreachable!("samples are built from readset rows"),
    }
}
