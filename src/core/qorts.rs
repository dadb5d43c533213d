use std::path::PathBuf;

use crate::{
    config::*,
    consts::*,
    core::Stage,
    error::Result,
    executor::job::Job,
    sample::SampleId,
    template::{PathTemplate, PER_SAMPLE},
};

/// Count tables and QC metrics with QoRTs
///
/// # Arguments
/// * `config` - The configuration for the pipeline
/// * `ids` - Sample identifiers
///
/// # Returns
/// One `qorts` job per sample writing the gene, exon and splice junction
/// count tables into `{qorts.work}/{sample}_qorts/`. Those directories are
/// listed in `Stage::dirs` so they exist before QoRTs runs.
///
/// # Example
/// ```rust, ignore
/// let stage = qorts::qc(&config, &ids)?;
/// ```
pub fn qc(config: &Config, ids: &[SampleId]) -> Result<Stage> {
    let jar = config.software(QORTS)?;
    let gtf = config.reference(GTF)?;
    let heap = config.str_or(QORTS, MEMORY, DEFAULT_QORTS_HEAP);

    let work = config.dir(ALIGNMENT, WORK)?;
    let sorted = PathTemplate::under(&work, &format!("{{sample}}{}", SORTED_BAM), &PER_SAMPLE)?;
    let out_dir = PathTemplate::under(
        &config.dir(QORTS, WORK)?,
        &format!("{{sample}}{}", QORTS_SUFFIX),
        &PER_SAMPLE,
    )?;

    let mut stage = Stage::default();

    for id in ids {
        let input = sorted.render_sample(id)?;
        let dir = out_dir.render_sample(id)?;
        let outputs: Vec<PathBuf> = QORTS_OUTPUTS.iter().map(|f| dir.join(f)).collect();

        let job = Job::new(QORTS, id.as_str())
            .package(config.package(QORTS))
            .task(JAVA)
            .arg(format!("-Xmx{}", heap))
            .opt_path("-jar", jar)
            .arg("QC")
            .path(&input)
            .path(gtf)
            .path(&dir)
            .input(input)
            .input(gtf)
            .outputs(outputs.iter().cloned());

        stage.targets.extend(outputs);
        stage.dirs.push(dir);
        stage.jobs.push(job);
    }

    log::info!("INFO [QORTS]: {} QC jobs declared", stage.jobs.len());

    Ok(stage)
}
