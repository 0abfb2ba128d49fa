use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::Result;
use tempfile::{tempdir, TempDir};

use seqpipe::{App, Args, LogLevel, SchedulerKind};

const STEP_NAMES: [&str; 8] = [
    "bismark_prepare_genome",
    "trim_galore",
    "bismark_align",
    "merge_alignments",
    "bismark_deduplicate",
    "methylation_call",
    "differential_methylated_pos",
    "differential_methylated_regions",
];

// sampleA exercises the paired-end merge path, sampleB the single-end
// RRBS aliasing paths
const READSETS: &str = "\
Sample\tReadset\tLibrary\tRunType\tQualityOffset\tFASTQ1\tFASTQ2\tBAM
sampleA\tsampleA.rs1\tlibA\tPAIRED_END\t33\traw/sA_rs1_R1.fq.gz\traw/sA_rs1_R2.fq.gz\t
sampleA\tsampleA.rs2\tlibA\tPAIRED_END\t33\traw/sA_rs2_R1.fq.gz\traw/sA_rs2_R2.fq.gz\t
sampleB\tsampleB.rs1\tRRBS\tSINGLE_END\t33\traw/sB_rs1.fq.gz\t\t
";

const DESIGN: &str = "\
Sample\tBvsA
sampleA\t1
sampleB\t2
";

fn config_text(root: &Path) -> String {
    format!(
        "\
[DEFAULT]
cluster_submit_cmd=qsub
cluster_other_arg=-m ae -W umask=0002
cluster_work_dir_arg=-d
cluster_output_dir_arg=-j oe -o
cluster_job_name_arg=-N
cluster_walltime=-l walltime=24:00:0
cluster_queue=-q metaq
cluster_cpu=-l nodes=1:ppn=1
cluster_dependency_arg=-W depend=afterok:
cluster_dependency_sep=:
cluster_submit_cmd_suffix=| grep \"[0-9]\"
module_bismark=seqpipe/bismark/0.19
module_bowtie2=seqpipe/bowtie2/2.3.5
module_samtools=seqpipe/samtools/1.9
module_trim_galore=seqpipe/trim_galore/0.6.5
module_cutadapt=seqpipe/cutadapt/2.10
module_fastqc=seqpipe/fastqc/0.11.9
module_java=seqpipe/java/jdk1.8.0_72
module_picard=seqpipe/picard/2.9.0
module_R=seqpipe/R/3.2.3
module_r_packages=seqpipe/R_packages/1.3

[bismark_prepare_genome]
genome_file={root}/genome.fa

[trim_galore]
threads=4
other_options=--gzip

[bismark_align]
cluster_cpu=-l nodes=1:ppn=12
other_options=--multicore 4

[merge_alignments]
tmp_dir=/tmp
java_other_options=-XX:ParallelGCThreads=4
ram=16G
max_records_in_ram=3750000
picard_jar=/apps/picard/2.9.0/picard.jar

[methylation_call]
other_options=--multicore 4 --comprehensive

[differential_methylated_pos]
read_coverage=10
padjust_method=fdr
pvalue=0.05
delta_beta_threshold=0.2

[differential_methylated_regions]
read_coverage=10
delta_beta_threshold=0.2
permutations=1000
cores=12
",
        root = root.display()
    )
}

fn write_fixture() -> Result<TempDir> {
    let dir = tempdir()?;
    File::create(dir.path().join("genome.fa"))?;
    fs::write(dir.path().join("config.ini"), config_text(dir.path()))?;
    fs::write(dir.path().join("readsets.tsv"), READSETS)?;
    fs::write(dir.path().join("design.tsv"), DESIGN)?;
    Ok(dir)
}

fn path_str(dir: &TempDir, name: &str) -> String {
    dir.path().join(name).to_str().unwrap().to_owned()
}

fn out_dir(dir: &TempDir) -> PathBuf {
    dir.path().join("out")
}

fn basic_args(dir: &TempDir) -> Args {
    Args {
        config: vec![path_str(dir, "config.ini")],
        readsets: path_str(dir, "readsets.tsv"),
        design: Some(path_str(dir, "design.tsv")),
        steps: Some("1-8".to_string()),
        output_dir: path_str(dir, "out"),
        job_scheduler: SchedulerKind::Pbs,
        force: false,
        clean: false,
        report: false,
        loglevel: LogLevel::Info,
    }
}

fn generate(args: Args) -> Result<String> {
    simple_logging::log_to_stderr(log::LevelFilter::Trace);
    let app = App::new(args.try_into()?);
    let mut buf = Vec::new();
    app.run_to(&mut buf)?;
    Ok(String::from_utf8(buf)?)
}

#[test]
fn test_pbs_script_covers_every_step() -> Result<()> {
    let dir = write_fixture()?;
    let text = generate(basic_args(&dir))?;

    assert!(text.starts_with("#!/bin/bash\nset -eu -o pipefail\n"));
    assert!(text.contains("SCHEDULER=pbs\n"));
    assert!(text.contains("PIPELINE=methylseq\n"));
    assert!(text.contains("STEPS=1-8\n"));
    assert!(text.contains(&format!("OUTPUT_DIR={}\n", out_dir(&dir).display())));
    for name in STEP_NAMES {
        assert!(text.contains(&format!("# STEP: {}\n", name)), "missing {}", name);
    }

    // one job per scope member
    assert!(text.contains("JOB_NAME=bismark_prepare_genome\n"));
    assert!(text.contains("JOB_NAME=trim_galore.sampleA.sampleA.rs1\n"));
    assert!(text.contains("JOB_NAME=trim_galore.sampleA.sampleA.rs2\n"));
    assert!(text.contains("JOB_NAME=trim_galore.sampleB.sampleB.rs1\n"));
    assert!(text.contains("JOB_NAME=merge_alignments.sampleA\n"));
    assert!(text.contains("JOB_NAME=methylation_call.sampleB\n"));
    assert!(text.contains("JOB_NAME=differential_methylated_pos.BvsA\n"));
    assert!(text.contains("JOB_NAME=differential_methylated_regions.BvsA\n"));

    // protocol switches picked up from the sheet
    assert!(text.contains(
        "trim_galore --paired --gzip --output_dir trimmed/sampleA/sampleA.rs1 \
         --fastqc_args \\\"-t 4\\\" raw/sA_rs1_R1.fq.gz raw/sA_rs1_R2.fq.gz"
    ));
    assert!(text.contains(
        "trim_galore --rrbs --gzip --output_dir trimmed/sampleB/sampleB.rs1 \
         --fastqc_args \\\"-t 4\\\" raw/sB_rs1.fq.gz"
    ));
    assert!(text.contains(
        "-1 trimmed/sampleA/sampleA.rs1/sampleA.rs1_1_val_1.fq.gz \
         -2 trimmed/sampleA/sampleA.rs1/sampleA.rs1_2_val_2.fq.gz"
    ));
    assert!(text.contains("bismark -q --non_directional --multicore 4"));

    // sampleA merges two readsets through picard, sampleB aliases its one
    assert!(text.contains("-jar /apps/picard/2.9.0/picard.jar MergeSamFiles"));
    assert!(text.contains("ln -s -f ../aligned/sampleB/sampleB.rs1_aligned.bam merged/sampleB.merged.bam"));

    // RRBS skips deduplication, paired-end does not
    assert!(text.contains(
        "deduplicate_bismark --paired --bam --output_dir dedup/sampleA merged/sampleA.merged.bam"
    ));
    assert!(text.contains(
        "ln -s -f ../../merged/sampleB.merged.bam dedup/sampleB/sampleB.merged.deduplicated.bam"
    ));
    assert!(text.contains(
        "bismark_methylation_extractor --single-end --multicore 4 --comprehensive \
         --output methyl_calls/sampleB --bedGraph dedup/sampleB/sampleB.merged.deduplicated.bam"
    ));
    Ok(())
}

#[test]
fn test_pbs_dependency_chain_across_scopes() -> Result<()> {
    let dir = write_fixture()?;
    let text = generate(basic_args(&dir))?;

    // readset child of a global and a readset parent
    assert!(text.contains(
        "JOB_DEPENDENCIES=$bismark_prepare_genome_JOB_ID:$trim_galore_sampleA_sampleA_rs1_JOB_ID\n"
    ));
    // sample child fans in over its readsets only
    assert!(text.contains(
        "JOB_DEPENDENCIES=$bismark_align_sampleA_sampleA_rs1_JOB_ID:$bismark_align_sampleA_sampleA_rs2_JOB_ID\n"
    ));
    // contrast jobs wait for every sample's methylation calls
    assert!(text.contains(
        "JOB_DEPENDENCIES=$methylation_call_sampleA_JOB_ID:$methylation_call_sampleB_JOB_ID\n"
    ));

    // per-step resource override and the dependency flag reach qsub
    assert!(text.contains(
        "-l walltime=24:00:0 -q metaq -l nodes=1:ppn=12 \
         -W depend=afterok:$JOB_DEPENDENCIES | grep \"[0-9]\")\n"
    ));
    assert!(text.contains(
        "echo \"$bismark_prepare_genome_JOB_ID\t$JOB_NAME\t$JOB_DEPENDENCIES\t$JOB_OUTPUT_RELATIVE_PATH\" >> $JOB_LIST\n"
    ));
    Ok(())
}

#[test]
fn test_pbs_escapes_the_r_driver_for_echo() -> Result<()> {
    let dir = write_fixture()?;
    let text = generate(basic_args(&dir))?;

    // chain continuations are doubled so the job script keeps them
    assert!(text.contains("rm -f $JOB_DONE && \\\\\n"));
    assert!(text.contains("module load seqpipe/R/3.2.3 seqpipe/R_packages/1.3 && \\\\\n"));
    // R quoting survives the echo as \" while the heredoc stays intact
    assert!(text.contains("R --no-save --no-restore <<'EOF'\n"));
    assert!(text.contains(
        "dmp <- dmpFinder(M, pheno=colData(rrbs.filtered)[,\\\"group\\\"], type=\\\"categorical\\\")\n"
    ));
    assert!(text.contains(
        "readBismark(c('methyl_calls/sampleA/sampleA.merged.deduplicated.bismark.cov.gz', \
         'methyl_calls/sampleB/sampleB.merged.deduplicated.bismark.cov.gz')"
    ));
    // each submission ends with the exit-status trailer
    assert!(text.contains("\nseqpipe_state=\\$?\necho SeqpipeExitStatus:\\$seqpipe_state\n"));
    assert!(text.contains("if [ \\$seqpipe_state -eq 0 ] ; then touch $JOB_DONE ; fi\n"));
    Ok(())
}

#[test]
fn test_batch_script_runs_inline() -> Result<()> {
    let dir = write_fixture()?;
    let mut args = basic_args(&dir);
    args.job_scheduler = SchedulerKind::Batch;
    let text = generate(args)?;

    assert!(text.starts_with("#!/bin/bash\nset -eu -o pipefail\n"));
    assert!(text.contains("# methylseq batch script\n"));
    for name in STEP_NAMES {
        assert!(text.contains(&format!("# STEP: {}\n", name)), "missing {}", name);
    }

    // commands appear verbatim, no echo escaping and no qsub machinery
    assert!(text.contains("--fastqc_args \"-t 4\""));
    assert!(text.contains(
        "  INPUT=aligned/sampleA/sampleA.rs1_aligned_pe.bam \\\n\
         \x20 INPUT=aligned/sampleA/sampleA.rs2_aligned_pe.bam \\\n\
         \x20 OUTPUT=merged/sampleA.merged.bam \\\n\
         \x20 USE_THREADING=true"
    ));
    assert!(text.contains(
        "write.csv(result, file=\"differential_methylated_positions/BvsA_differential_methylated_pos.csv\", \
         quote=FALSE, row.names=FALSE)\nEOF\ntouch $JOB_DONE\n"
    ));
    assert!(!text.contains("qsub"));
    assert!(!text.contains("JOB_DEPENDENCIES"));
    assert!(!text.contains("_JOB_ID"));
    Ok(())
}

#[test]
fn test_regeneration_is_byte_identical() -> Result<()> {
    let dir = write_fixture()?;
    let first = generate(basic_args(&dir))?;
    let second = generate(basic_args(&dir))?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn test_existing_outputs_are_skipped() -> Result<()> {
    let dir = write_fixture()?;
    fs::create_dir_all(out_dir(&dir).join("bismark_prepare_genome/Bisulfite_Genome"))?;

    let mut args = basic_args(&dir);
    args.steps = Some("1".to_string());
    let text = generate(args)?;

    assert!(!text.contains("JOB_NAME=bismark_prepare_genome"));
    assert!(!text.contains("# STEP:"));
    Ok(())
}

#[test]
fn test_force_regenerates_fresh_outputs() -> Result<()> {
    let dir = write_fixture()?;
    fs::create_dir_all(out_dir(&dir).join("bismark_prepare_genome/Bisulfite_Genome"))?;

    let mut args = basic_args(&dir);
    args.steps = Some("1".to_string());
    args.force = true;
    let text = generate(args)?;

    assert!(text.contains("JOB_NAME=bismark_prepare_genome\n"));
    Ok(())
}

#[test]
fn test_step_range_selects_a_subset() -> Result<()> {
    let dir = write_fixture()?;
    let mut args = basic_args(&dir);
    args.steps = Some("2-3".to_string());
    let text = generate(args)?;

    assert!(text.contains("STEPS=2-3\n"));
    assert!(!text.contains("# STEP: bismark_prepare_genome\n"));
    assert!(text.contains("# STEP: trim_galore\n"));
    assert!(text.contains("# STEP: bismark_align\n"));
    assert!(!text.contains("# STEP: merge_alignments\n"));
    // out-of-range parents contribute no dependency tokens
    assert!(text.contains("JOB_DEPENDENCIES=$trim_galore_sampleA_sampleA_rs1_JOB_ID\n"));
    Ok(())
}

#[test]
fn test_missing_steps_flag_lists_the_menu() -> Result<()> {
    let dir = write_fixture()?;
    let mut args = basic_args(&dir);
    args.steps = None;
    let err = generate(args).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("No steps given"));
    assert!(msg.contains("1- bismark_prepare_genome"));
    assert!(msg.contains("8- differential_methylated_regions"));
    Ok(())
}

#[test]
fn test_clean_prints_removal_commands() -> Result<()> {
    let dir = write_fixture()?;
    let mut args = basic_args(&dir);
    args.steps = Some("2".to_string());
    args.clean = true;
    let text = generate(args)?;

    let root = out_dir(&dir);
    let root = root.display();
    assert_eq!(
        text,
        format!(
            "rm -rf {root}/trimmed/sampleA/sampleA.rs1/sampleA.rs1_1_val_1.fq.gz\n\
             rm -rf {root}/trimmed/sampleA/sampleA.rs1/sampleA.rs1_2_val_2.fq.gz\n\
             rm -rf {root}/trimmed/sampleA/sampleA.rs2/sampleA.rs2_1_val_1.fq.gz\n\
             rm -rf {root}/trimmed/sampleA/sampleA.rs2/sampleA.rs2_2_val_2.fq.gz\n\
             rm -rf {root}/trimmed/sampleB/sampleB.rs1/sampleB.rs1_trimmed.fq.gz\n"
        )
    );
    Ok(())
}

#[test]
fn test_report_merges_fragments_on_disk() -> Result<()> {
    let dir = write_fixture()?;
    let fragment_dir = out_dir(&dir).join("trimmed/sampleA/sampleA.rs1");
    fs::create_dir_all(&fragment_dir)?;
    File::create(fragment_dir.join("sampleA.rs1_1_trimming_report.txt"))?;

    let mut args = basic_args(&dir);
    args.steps = Some("2".to_string());
    args.report = true;
    let text = generate(args)?;

    let root = out_dir(&dir);
    assert!(text.starts_with(&format!("mkdir -p {}/report\n", root.display())));
    assert!(text.contains(&format!(
        "pandoc --toc -s --to html -o {}/report/methylseq.html",
        root.display()
    )));
    assert!(text.contains("sampleA.rs1_1_trimming_report.txt"));
    // fragments not generated yet stay out of the merge
    assert!(!text.contains("sampleA.rs2"));
    Ok(())
}

#[test]
fn test_design_sheet_is_only_required_for_contrast_steps() -> Result<()> {
    let dir = write_fixture()?;
    let mut args = basic_args(&dir);
    args.design = None;
    args.steps = Some("1-6".to_string());
    let text = generate(args)?;
    assert!(text.contains("JOB_NAME=methylation_call.sampleA\n"));

    let mut args = basic_args(&dir);
    args.design = None;
    let err = generate(args).unwrap_err();
    let msg = format!("{:#}", err);
    assert!(msg.contains("in step 'differential_methylated_pos'"));
    assert!(msg.contains("design sheet"));
    Ok(())
}

#[test]
fn test_sheet_bams_stand_in_for_missing_fastqs() -> Result<()> {
    let dir = write_fixture()?;
    // sampleC mixes a FASTQ readset with a pre-aligned one, sampleD is a
    // single pre-aligned readset with an absolute BAM path
    let readsets = format!(
        "Sample\tReadset\tLibrary\tRunType\tFASTQ1\tFASTQ2\tBAM\n\
         sampleC\tsampleC.rs1\tlibC\tPAIRED_END\traw/sC_rs1_R1.fq.gz\traw/sC_rs1_R2.fq.gz\t\n\
         sampleC\tsampleC.rs2\tlibC\tPAIRED_END\t\t\taligned_elsewhere/sC_rs2.bam\n\
         sampleD\tsampleD.rs1\tlibD\tSINGLE_END\t\t\t{}/bams/sD.bam\n",
        dir.path().display()
    );
    fs::write(dir.path().join("readsets.tsv"), readsets)?;

    let mut args = basic_args(&dir);
    args.design = None;
    args.steps = Some("1-6".to_string());
    let text = generate(args)?;

    // pre-aligned readsets get no trim or align jobs
    assert!(text.contains("JOB_NAME=trim_galore.sampleC.sampleC.rs1\n"));
    assert!(!text.contains("trim_galore.sampleC.sampleC.rs2"));
    assert!(!text.contains("bismark_align.sampleC.sampleC.rs2"));
    assert!(!text.contains("trim_galore.sampleD"));

    // the merge takes the sheet BAM alongside the freshly aligned one and
    // only waits on the job that actually runs
    assert!(text.contains("  INPUT=aligned/sampleC/sampleC.rs1_aligned_pe.bam"));
    assert!(text.contains("  INPUT=aligned_elsewhere/sC_rs2.bam"));
    assert!(text.contains("JOB_DEPENDENCIES=$bismark_align_sampleC_sampleC_rs1_JOB_ID\n"));

    // a lone pre-aligned readset is aliased, absolute path kept as is
    assert!(text.contains(&format!(
        "ln -s -f {}/bams/sD.bam merged/sampleD.merged.bam",
        dir.path().display()
    )));
    assert!(text.contains("JOB_NAME=methylation_call.sampleD\n"));
    Ok(())
}

#[test]
fn test_missing_input_files_are_fatal() -> Result<()> {
    let dir = write_fixture()?;
    let mut args = basic_args(&dir);
    args.config = vec![path_str(&dir, "nope.ini")];
    let err = generate(args).unwrap_err();
    assert!(err.to_string().contains("does not exist"));

    let mut args = basic_args(&dir);
    args.readsets = path_str(&dir, "nope.tsv");
    let err = generate(args).unwrap_err();
    assert!(err.to_string().contains("does not exist"));
    Ok(())
}
