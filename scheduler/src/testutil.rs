//! Shared fixtures for the formatter tests: a two-step pipeline (one
//! global step, one per-readset step depending on it) over a single
//! sample, with a full set of cluster keys in `[DEFAULT]`.

use std::path::Path;

use anyhow::Result;

use config::Config;
use pipeline::{Context, Job, Pipeline, Step};
use sheet::{Readset, RunType, Sample};

pub fn cluster_config() -> Config {
    let mut config = Config::default();
    config
        .merge_str(
            "[DEFAULT]\n\
             cluster_submit_cmd=qsub\n\
             cluster_other_arg=-m ae -W umask=0002\n\
             cluster_work_dir_arg=-d\n\
             cluster_output_dir_arg=-j oe -o\n\
             cluster_job_name_arg=-N\n\
             cluster_walltime=-l walltime=24:00:0\n\
             cluster_queue=-q sw\n\
             cluster_cpu=-l nodes=1:ppn=1\n\
             cluster_dependency_arg=-W depend=afterok:\n\
             cluster_dependency_sep=:\n\
             cluster_submit_cmd_suffix=| grep \"[0-9]\"\n\
             \n\
             [align]\n\
             cluster_cpu=-l nodes=1:ppn=12\n",
        )
        .unwrap();
    config
}

fn gen_prepare(_: &Context) -> Result<Vec<Job>> {
    Ok(vec![Job::new()
        .command("bismark_genome_preparation genome/")
        .module("seqpipe/bismark/0.19")
        .output("genome/Bisulfite_Genome")])
}

fn gen_align(_: &Context, _: &Sample, rs: &Readset) -> Result<Option<Job>> {
    Ok(Some(
        Job::new()
            .command(format!("bismark -q genome/ {}.fq", rs.name))
            .module("seqpipe/bismark/0.19")
            .input(format!("{}.fq", rs.name))
            .output(format!("{}.bam", rs.name)),
    ))
}

pub fn two_step_pipeline() -> Pipeline {
    Pipeline::new(
        "methyltest",
        vec![
            Step::global("prepare", &[], gen_prepare),
            Step::per_readset("align", &["prepare"], gen_align),
        ],
    )
    .unwrap()
}

pub fn one_sample_ctx(dir: &Path) -> Context {
    let readset = Readset {
        name: "r1".to_string(),
        sample: "sA".to_string(),
        run_type: RunType::SingleEnd,
        library: None,
        quality_offset: 33,
        fastq1: Some("r1.fq".into()),
        fastq2: None,
        bam: None,
    };
    let sample = Sample {
        name: "sA".to_string(),
        readsets: vec![readset],
    };
    Context::new(cluster_config(), vec![sample], None, dir)
}
