//! Differential methylation steps: one R driver job per contrast in the
//! design sheet, fed by the coverage files of every sample in the
//! contrast.
//!
//! The R text runs inside a quoted heredoc and indexes with `[ ]` rather
//! than `$`, so it reaches the job shell unexpanded whether the chain is
//! echoed to qsub or executed inline.

use anyhow::Result;

use pipeline::{Context, Job};
use sheet::Contrast;

use super::{bismark, Error};

/// Contrasts from the design sheet; a missing sheet or a one-sided
/// contrast is fatal before any job is built.
fn contrasts(ctx: &Context) -> Result<&[Contrast], Error> {
    let contrasts = ctx.contrasts.as_deref().ok_or(Error::NoDesign)?;
    for contrast in contrasts {
        if contrast.controls.is_empty() || contrast.treatments.is_empty() {
            return Err(Error::EmptyContrast(contrast.name.clone()));
        }
    }
    Ok(contrasts)
}

/// Sample names in a contrast, controls first.
fn members(contrast: &Contrast) -> impl Iterator<Item = &String> {
    contrast.controls.iter().chain(contrast.treatments.iter())
}

/// Renders `c('a', 'b')`, the vector literal handed to R.
fn r_vector<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let quoted: Vec<String> = items
        .into_iter()
        .map(|item| format!("'{}'", item.as_ref()))
        .collect();
    format!("c({})", quoted.join(", "))
}

fn coverage_files(contrast: &Contrast) -> Vec<String> {
    members(contrast)
        .map(|name| bismark::coverage_file(name).display().to_string())
        .collect()
}

/// `'control'` for each control sample, then `'case'` for each treatment
/// sample, matching the coverage file order.
fn group_vector(contrast: &Contrast) -> String {
    r_vector(
        contrast
            .controls
            .iter()
            .map(|_| "control")
            .chain(contrast.treatments.iter().map(|_| "case")),
    )
}

pub(super) fn methylated_positions(ctx: &Context) -> Result<Vec<Job>> {
    let section = "differential_methylated_pos";
    let dir = "differential_methylated_positions";

    // config is read once up front, so a bad key fails before any job
    let coverage = ctx.config.param_posint(section, "read_coverage")?;
    let padjust = ctx.config.param(section, "padjust_method")?;
    let pvalue = ctx.config.param_float(section, "pvalue")?;
    let delta = ctx.config.param_float(section, "delta_beta_threshold")?;
    let module_r = ctx.config.module(section, "R")?;
    let module_packages = ctx.config.module(section, "r_packages")?;

    let mut jobs = Vec::new();
    for contrast in contrasts(ctx)? {
        let cov_files = coverage_files(contrast);
        let output = format!("{}/{}_differential_methylated_pos.csv", dir, contrast.name);
        let script = format!(
            "R --no-save --no-restore <<'EOF'\n\
             suppressPackageStartupMessages(library(BiSeq))\n\
             suppressPackageStartupMessages(library(minfi))\n\
             rrbs <- readBismark({cov}, colData=DataFrame(group=factor({groups}), row.names={names}))\n\
             rrbs.filtered <- rrbs[apply(totalReads(rrbs), 1, function(x) any(x > {coverage})),]\n\
             beta <- methLevel(rawToRel(rrbs.filtered))\n\
             # dmpFinder rejects M values at 0 or Inf, so nudge the betas off the edges\n\
             beta[beta == 0] <- 0.0001\n\
             beta[beta == 1] <- 0.9999\n\
             M <- log2(beta/(1-beta))\n\
             dmp <- dmpFinder(M, pheno=colData(rrbs.filtered)[,\"group\"], type=\"categorical\")\n\
             dmp[\"pval\"] <- p.adjust(dmp[,\"pval\"], method=\"{padjust}\")\n\
             dmp <- dmp[dmp[\"pval\"] < {pvalue},][\"pval\"]\n\
             controls <- {controls}\n\
             cases <- {cases}\n\
             result <- as.data.frame(rowRanges(rrbs.filtered))[1:4]\n\
             result[\"Avg Control Beta\"] <- rowMeans(beta[,controls])\n\
             result[\"Avg Case Beta\"] <- rowMeans(beta[,cases])\n\
             result[\"Avg Delta Beta\"] <- result[,\"Avg Case Beta\"] - result[,\"Avg Control Beta\"]\n\
             result <- merge(result, dmp, by=0)\n\
             result <- result[abs(result[,\"Avg Delta Beta\"]) > {delta},]\n\
             write.csv(result, file=\"{output}\", quote=FALSE, row.names=FALSE)\n\
             EOF",
            cov = r_vector(&cov_files),
            groups = group_vector(contrast),
            names = r_vector(members(contrast)),
            controls = r_vector(&contrast.controls),
            cases = r_vector(&contrast.treatments),
            coverage = coverage,
            padjust = padjust,
            pvalue = pvalue,
            delta = delta,
            output = output,
        );

        let mut job = Job::new()
            .command(format!("mkdir -p {}", dir))
            .command(script)
            .module(module_r.clone())
            .module(module_packages.clone())
            .output(output.as_str())
            .report_file(output.as_str())
            .tag(contrast.name.clone());
        for cov in &cov_files {
            job = job.input(cov);
        }
        jobs.push(job);
    }
    Ok(jobs)
}

pub(super) fn methylated_regions(ctx: &Context) -> Result<Vec<Job>> {
    let section = "differential_methylated_regions";
    let dir = "differential_methylated_regions";

    let coverage = ctx.config.param_posint(section, "read_coverage")?;
    let delta = ctx.config.param_float(section, "delta_beta_threshold")?;
    let permutations = ctx.config.param_posint(section, "permutations")?;
    let cores = ctx.config.param_posint(section, "cores")?;
    let module_r = ctx.config.module(section, "R")?;
    let module_packages = ctx.config.module(section, "r_packages")?;

    let mut jobs = Vec::new();
    for contrast in contrasts(ctx)? {
        let cov_files = coverage_files(contrast);
        let output = format!(
            "{}/{}_differential_methylated_regions.csv",
            dir, contrast.name
        );
        let script = format!(
            "R --no-save --no-restore <<'EOF'\n\
             suppressPackageStartupMessages(library(bumphunter))\n\
             suppressPackageStartupMessages(library(BiSeq))\n\
             library(doParallel)\n\
             registerDoParallel(cores={cores})\n\
             rrbs <- readBismark({cov}, colData=DataFrame(group={groups}, row.names={names}))\n\
             rrbs.filtered <- rrbs[apply(totalReads(rrbs), 1, function(x) any(x > {coverage})),]\n\
             beta <- methLevel(rawToRel(rrbs.filtered))\n\
             chr <- as.character(seqnames(rowRanges(rrbs.filtered)))\n\
             pos <- start(ranges(rowRanges(rrbs.filtered)))\n\
             pheno <- colData(rrbs.filtered)[,\"group\"]\n\
             designM <- model.matrix(~pheno)\n\
             dmrs <- bumphunterEngine(beta,\n\
                 chr=chr,\n\
                 pos=pos,\n\
                 design=designM,\n\
                 cutoff={delta},\n\
                 pickCutoffQ=0.99,\n\
                 null_method=c(\"permutation\",\"bootstrap\"),\n\
                 smooth=FALSE,\n\
                 smoothFunction=locfitByCluster,\n\
                 B={permutations},\n\
                 verbose=TRUE,\n\
                 maxGap=500)\n\
             dmrs <- na.omit(dmrs)\n\
             write.csv(dmrs[[\"table\"]], \"{output}\", quote=FALSE, row.names=FALSE)\n\
             EOF",
            cov = r_vector(&cov_files),
            groups = group_vector(contrast),
            names = r_vector(members(contrast)),
            cores = cores,
            coverage = coverage,
            delta = delta,
            permutations = permutations,
            output = output,
        );

        let mut job = Job::new()
            .command(format!("mkdir -p {}", dir))
            .command(script)
            .module(module_r.clone())
            .module(module_packages.clone())
            .output(output.as_str())
            .report_file(output.as_str())
            .tag(contrast.name.clone());
        for cov in &cov_files {
            job = job.input(cov);
        }
        jobs.push(job);
    }
    Ok(jobs)
}
