use crate::{
    config::*,
    consts::*,
    core::{reads, Stage},
    error::Result,
    executor::job::Job,
    sample::SampleId,
    template::{PathTemplate, PER_SAMPLE},
};

const CONSUMED: &[&str] = &[THREADS, "mean", "sd", "bootstraps"];

/// Quantify transcripts with salmon, one job per sample
///
/// # Arguments
/// * `config` - The configuration for the pipeline
/// * `ids` - Sample identifiers
///
/// # Returns
/// One `quant` job per sample; targets are the `quant.sf` files
///
/// # Example
/// ```rust, ignore
/// let stage = salmon::quant(&config, &ids)?;
/// ```
pub fn quant(config: &Config, ids: &[SampleId]) -> Result<Stage> {
    let index = config.reference(SALMON_INDEX)?;
    let mean = config.require_param(SALMON, "mean")?;
    let sd = config.require_param(SALMON, "sd")?;
    let threads = config.int_or(SALMON, THREADS, DEFAULT_SALMON_THREADS)?;
    let bootstraps = config.int_or(SALMON, "bootstraps", DEFAULT_SALMON_BOOTSTRAPS)?;
    let extra = config.get_step_args(SALMON, CONSUMED);

    let work = config.dir(SALMON, WORK)?;
    let out_dir = PathTemplate::under(&work, "{sample}", &PER_SAMPLE)?;
    let quant_sf = PathTemplate::under(&work, &format!("{{sample}}/{}", QUANT_SF), &PER_SAMPLE)?;

    let mut stage = Stage::default();

    for id in ids {
        let inputs = reads(config, id)?;
        let out = out_dir.render_sample(id)?;
        let quant = quant_sf.render_sample(id)?;

        let job = Job::new(SALMON, id.as_str())
            .package(config.package(SALMON))
            .task("salmon quant")
            .opt_path("-i", index)
            .opt("-l", "A")
            .arg("-r")
            .paths(&inputs)
            .opt("-p", threads)
            .opt("--fldMean", mean)
            .opt("--fldSD", sd)
            .args(&["--dumpEq", "--seqBias", "--gcBias"])
            .opt("--numBootstraps", bootstraps)
            .arg(&extra)
            .opt_path("-o", &out)
            .inputs(inputs)
            .output(&quant);

        stage.targets.push(quant);
        stage.jobs.push(job);
    }

    log::info!(
        "INFO [SALMON]: {} quantification jobs declared",
        stage.jobs.len()
    );

    Ok(stage)
}
