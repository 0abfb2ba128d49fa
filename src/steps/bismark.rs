use std::path::PathBuf;

use anyhow::Result;

use pipeline::{Context, Job};
use sheet::{Readset, Sample};

use super::{picard, trim};

/// Directory the bisulfite-converted genome index is built in.
pub(super) const GENOME_DIR: &str = "bismark_prepare_genome";

/// Aligned per-readset BAM under `aligned/<sample>/`. Bismark appends
/// `_pe` to the basename for paired-end runs.
pub(super) fn aligned_bam(sample: &Sample, rs: &Readset) -> PathBuf {
    let suffix = if rs.run_type.is_paired() { "_pe" } else { "" };
    PathBuf::from(format!("aligned/{}/{}_aligned{}.bam", sample.name, rs.name, suffix))
}

/// Where a readset's alignment comes from: the BAM `align` writes, or the
/// sheet-supplied BAM for readsets shipped pre-aligned (BAM, no FASTQ1).
/// A readset carrying both is trimmed and aligned like any other and its
/// sheet BAM is ignored.
pub(super) fn alignment_source(sample: &Sample, rs: &Readset) -> PathBuf {
    match &rs.bam {
        Some(bam) if rs.fastq1.is_none() => bam.clone(),
        _ => aligned_bam(sample, rs),
    }
}

/// Deduplicated per-sample BAM under `dedup/<sample>/`.
pub(super) fn dedup_bam(sample: &Sample) -> PathBuf {
    PathBuf::from(format!(
        "dedup/{0}/{0}.merged.deduplicated.bam",
        sample.name
    ))
}

/// Methylation coverage file a sample's calling job produces.
pub(super) fn coverage_file(name: &str) -> PathBuf {
    PathBuf::from(format!(
        "methyl_calls/{0}/{0}.merged.deduplicated.bismark.cov.gz",
        name
    ))
}

pub(super) fn prepare_genome(ctx: &Context) -> Result<Vec<Job>> {
    let section = "bismark_prepare_genome";
    let genome = ctx.config.param_filepath(section, "genome_file")?;

    let job = Job::new()
        .command(format!("mkdir -p {}", GENOME_DIR))
        .command(format!("ln -s -f {} {}/", genome.display(), GENOME_DIR))
        .command(format!(
            "bismark_genome_preparation --verbose --bowtie2 {}",
            GENOME_DIR
        ))
        .module(ctx.config.module(section, "bismark")?)
        .module(ctx.config.module(section, "bowtie2")?)
        .module(ctx.config.module(section, "samtools")?)
        .input(genome)
        .output(format!("{}/Bisulfite_Genome", GENOME_DIR));
    Ok(vec![job])
}

pub(super) fn align(ctx: &Context, sample: &Sample, rs: &Readset) -> Result<Option<Job>> {
    // pre-aligned readsets bring their own BAM; nothing to align
    if rs.fastq1.is_none() {
        return Ok(None);
    }
    let section = "bismark_align";
    let dir = format!("aligned/{}", sample.name);
    let trimmed = trim::trimmed_fastqs(sample, rs);
    let other = ctx.config.param(section, "other_options")?;

    let mut args: Vec<String> = vec!["bismark -q".to_string()];
    if super::is_rrbs(rs) {
        args.push("--non_directional".to_string());
    }
    if !other.is_empty() {
        args.push(other.to_string());
    }
    args.push(format!("--output_dir {}", dir));
    args.push(format!("--basename {}_aligned", rs.name));
    args.push(format!("--genome_folder {}", GENOME_DIR));
    if rs.run_type.is_paired() {
        args.push(format!("-1 {} -2 {}", trimmed[0].display(), trimmed[1].display()));
    } else {
        args.push(trimmed[0].display().to_string());
    }

    let report = if rs.run_type.is_paired() {
        format!("aligned/{}/{}_aligned_PE_report.txt", sample.name, rs.name)
    } else {
        format!("aligned/{}/{}_aligned_SE_report.txt", sample.name, rs.name)
    };

    let mut job = Job::new()
        .command(format!("mkdir -p {}", dir))
        .command(args.join(" "))
        .module(ctx.config.module(section, "bismark")?)
        .module(ctx.config.module(section, "bowtie2")?)
        .module(ctx.config.module(section, "samtools")?)
        .input(format!("{}/Bisulfite_Genome", GENOME_DIR))
        .output(aligned_bam(sample, rs))
        .removable(aligned_bam(sample, rs))
        .report_file(report);
    for fastq in trimmed {
        job = job.input(fastq);
    }
    Ok(Some(job))
}

pub(super) fn deduplicate(ctx: &Context, sample: &Sample) -> Result<Option<Job>> {
    let section = "bismark_deduplicate";
    let lead = super::lead_readset(sample);
    let dir = format!("dedup/{}", sample.name);
    let input = picard::merged_bam(sample);
    let output = dedup_bam(sample);

    // deduplication is not recommended for RRBS libraries; alias the
    // merged BAM so downstream steps see the same path either way
    if super::is_rrbs(lead) {
        let job = Job::new()
            .command(format!("mkdir -p {}", dir))
            .command(format!(
                "ln -s -f ../../{} {}",
                input.display(),
                output.display()
            ))
            .input(input)
            .output(output);
        return Ok(Some(job));
    }

    let mode = if lead.run_type.is_paired() { "--paired" } else { "--single" };
    let mut args: Vec<String> = vec![format!("deduplicate_bismark {} --bam", mode)];
    if let Some(other) = ctx.config.param_opt(section, "other_options") {
        args.push(other.to_string());
    }
    args.push(format!("--output_dir {}", dir));
    args.push(input.display().to_string());

    let job = Job::new()
        .command(format!("mkdir -p {}", dir))
        .command(args.join(" "))
        .module(ctx.config.module(section, "bismark")?)
        .module(ctx.config.module(section, "samtools")?)
        .input(input)
        .output(output.clone())
        .removable(output)
        .report_file(format!(
            "dedup/{0}/{0}.merged.deduplication_report.txt",
            sample.name
        ));
    Ok(Some(job))
}

pub(super) fn methylation_call(ctx: &Context, sample: &Sample) -> Result<Option<Job>> {
    let section = "methylation_call";
    let lead = super::lead_readset(sample);
    let dir = format!("methyl_calls/{}", sample.name);
    let input = dedup_bam(sample);
    let other = ctx.config.param(section, "other_options")?;

    let mode = if lead.run_type.is_paired() { "--paired-end" } else { "--single-end" };
    let mut args: Vec<String> = vec![format!("bismark_methylation_extractor {}", mode)];
    if !other.is_empty() {
        args.push(other.to_string());
    }
    args.push(format!("--output {}", dir));
    args.push("--bedGraph".to_string());
    args.push(input.display().to_string());

    let job = Job::new()
        .command(format!("mkdir -p {}", dir))
        .command(args.join(" "))
        .module(ctx.config.module(section, "bismark")?)
        .module(ctx.config.module(section, "samtools")?)
        .input(input)
        .output(coverage_file(&sample.name))
        .report_file(format!(
            "methyl_calls/{0}/{0}.merged.deduplicated_splitting_report.txt",
            sample.name
        ));
    Ok(Some(job))
}
