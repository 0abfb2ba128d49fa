use std::path::PathBuf;

use anyhow::Result;

use pipeline::{Context, Job};
use sheet::Sample;

use super::bismark;

/// Merged per-sample BAM: `merged/<sample>.merged.bam`.
pub(super) fn merged_bam(sample: &Sample) -> PathBuf {
    PathBuf::from(format!("merged/{}.merged.bam", sample.name))
}

pub(super) fn merge_alignments(ctx: &Context, sample: &Sample) -> Result<Option<Job>> {
    let section = "merge_alignments";
    let inputs: Vec<PathBuf> = sample
        .readsets
        .iter()
        .map(|rs| bismark::alignment_source(sample, rs))
        .collect();
    let output = merged_bam(sample);

    // a single readset needs no merge; alias its BAM instead. Relative
    // paths are one level up from merged/, sheet BAMs may be absolute
    if let [input] = &inputs[..] {
        let target = if input.is_absolute() {
            input.display().to_string()
        } else {
            format!("../{}", input.display())
        };
        let job = Job::new()
            .command("mkdir -p merged".to_string())
            .command(format!("ln -s -f {} {}", target, output.display()))
            .input(input)
            .output(output.clone())
            .removable(output);
        return Ok(Some(job));
    }

    let tmp_dir = ctx.config.param(section, "tmp_dir")?;
    let java_other = ctx.config.param(section, "java_other_options")?;
    let ram = ctx.config.param(section, "ram")?;
    let max_records = ctx.config.param_posint(section, "max_records_in_ram")?;
    let picard_jar = ctx.config.param(section, "picard_jar")?;

    let mut lines: Vec<String> = vec![format!(
        "java -Djava.io.tmpdir={} {} -Xmx{} -jar {} MergeSamFiles",
        tmp_dir, java_other, ram, picard_jar
    )];
    lines.push("  VALIDATION_STRINGENCY=SILENT".to_string());
    lines.push(format!("  TMP_DIR={}", tmp_dir));
    lines.extend(inputs.iter().map(|bam| format!("  INPUT={}", bam.display())));
    lines.push(format!("  OUTPUT={}", output.display()));
    lines.push("  USE_THREADING=true".to_string());
    lines.push("  SORT_ORDER=queryname".to_string());
    lines.push(format!("  MAX_RECORDS_IN_RAM={}", max_records));
    let command = lines.join(" \\\n");

    let mut job = Job::new()
        .command("mkdir -p merged".to_string())
        .command(command)
        .module(ctx.config.module(section, "java")?)
        .module(ctx.config.module(section, "picard")?)
        .output(output.clone())
        .removable(output);
    for bam in inputs {
        job = job.input(bam);
    }
    Ok(Some(job))
}
