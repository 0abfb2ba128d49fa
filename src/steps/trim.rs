use std::path::PathBuf;

use anyhow::Result;

use pipeline::{Context, Job};
use sheet::{Readset, Sample};

/// Per-readset output prefix: `trimmed/<sample>/<readset>/<readset>`.
fn trimmed_prefix(sample: &Sample, rs: &Readset) -> String {
    format!("trimmed/{}/{}/{}", sample.name, rs.name, rs.name)
}

/// Trimmed FASTQ paths for one readset. Trim Galore has no option to pick
/// output names, so these follow its fixed naming scheme.
pub(super) fn trimmed_fastqs(sample: &Sample, rs: &Readset) -> Vec<PathBuf> {
    let prefix = trimmed_prefix(sample, rs);
    if rs.run_type.is_paired() {
        vec![
            PathBuf::from(format!("{}_1_val_1.fq.gz", prefix)),
            PathBuf::from(format!("{}_2_val_2.fq.gz", prefix)),
        ]
    } else {
        vec![PathBuf::from(format!("{}_trimmed.fq.gz", prefix))]
    }
}

pub(super) fn trim_galore(ctx: &Context, sample: &Sample, rs: &Readset) -> Result<Option<Job>> {
    // a readset aligned outside the pipeline carries a BAM instead of
    // FASTQs; there is nothing to trim
    let fastq1 = match &rs.fastq1 {
        Some(fastq1) => fastq1,
        None => return Ok(None),
    };
    let dir = format!("trimmed/{}/{}", sample.name, rs.name);
    let prefix = trimmed_prefix(sample, rs);
    let threads = ctx.config.param_posint("trim_galore", "threads")?;
    let other = ctx.config.param("trim_galore", "other_options")?;

    let mut args: Vec<String> = vec!["trim_galore".to_string()];
    if super::is_rrbs(rs) {
        args.push("--rrbs".to_string());
    }
    if rs.run_type.is_paired() {
        args.push("--paired".to_string());
        if super::is_rrbs(rs) {
            args.push("--non_directional".to_string());
        }
    }
    if !other.is_empty() {
        args.push(other.to_string());
    }
    args.push(format!("--output_dir {}", dir));
    args.push(format!("--fastqc_args \"-t {}\"", threads));
    args.push(fastq1.display().to_string());
    // the sheet parser guarantees paired readsets with a FASTQ1 carry a FASTQ2
    let fastq2 = rs.fastq2.as_ref().filter(|_| rs.run_type.is_paired());
    if let Some(fastq2) = fastq2 {
        args.push(fastq2.display().to_string());
    }

    let mut job = Job::new()
        .command(format!("mkdir -p {}", dir))
        .command(args.join(" "))
        .module(ctx.config.module("trim_galore", "trim_galore")?)
        .module(ctx.config.module("trim_galore", "cutadapt")?)
        .module(ctx.config.module("trim_galore", "fastqc")?)
        .input(fastq1);
    if let Some(fastq2) = fastq2 {
        job = job.input(fastq2);
    }
    for fastq in trimmed_fastqs(sample, rs) {
        job = job.output(fastq.clone()).removable(fastq);
    }
    if rs.run_type.is_paired() {
        job = job
            .report_file(format!("{}_1_trimming_report.txt", prefix))
            .report_file(format!("{}_1_val_1_fastqc.html", prefix))
            .report_file(format!("{}_2_trimming_report.txt", prefix))
            .report_file(format!("{}_2_val_2_fastqc.html", prefix));
    } else {
        job = job
            .report_file(format!("{}_trimming_report.txt", prefix))
            .report_file(format!("{}_fastqc.html", prefix));
    }
    Ok(Some(job))
}
