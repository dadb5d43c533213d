use crate::{
    config::*,
    consts::*,
    core::{reads, Stage},
    error::Result,
    executor::job::Job,
    sample::SampleId,
    template::{PathTemplate, PER_SAMPLE},
};

/// Align paired reads with STAR, one job per sample
///
/// # Arguments
/// * `config` - The configuration for the pipeline
/// * `ids` - Sample identifiers
///
/// # Returns
/// One `star` job per sample writing `{sample}Aligned.out.bam` and
/// `{sample}SJ.out.tab` under the alignment work directory
///
/// # Example
/// ```rust, ignore
/// let stage = star::align(&config, &ids)?;
/// ```
pub fn align(config: &Config, ids: &[SampleId]) -> Result<Stage> {
    let genome = config.reference(STAR)?;
    let clip = config.int_or(BARCODE, "length", 0)?;
    let threads = config.int_or(STAR, THREADS, DEFAULT_STAR_THREADS)?;
    let extra = config.get_step_args(STAR, &[THREADS]);

    let work = config.dir(ALIGNMENT, WORK)?;
    let prefix = PathTemplate::under(&work, "{sample}", &PER_SAMPLE)?;
    let bam = PathTemplate::under(&work, &format!("{{sample}}{}", ALIGNED_BAM), &PER_SAMPLE)?;
    let junctions = PathTemplate::under(&work, &format!("{{sample}}{}", SJ_TAB), &PER_SAMPLE)?;

    let mut stage = Stage::default();

    for id in ids {
        let inputs = reads(config, id)?;
        let bam = bam.render_sample(id)?;
        let junctions = junctions.render_sample(id)?;

        let job = Job::new(STAR, id.as_str())
            .package(config.package(STAR))
            .task("STAR")
            .opt("--runMode", "alignReads")
            .opt("--runThreadN", threads)
            .opt_path("--genomeDir", genome)
            .opt("--outSAMunmapped", "Within")
            .args(&["--outSAMtype", "BAM", "Unsorted"])
            .args(&["--readFilesCommand", "gunzip", "-c"])
            .opt("--clip5pNbases", clip)
            .opt("--genomeLoad", "LoadAndKeep")
            .arg("--readFilesIn")
            .paths(&inputs)
            .opt_path("--outFileNamePrefix", prefix.render_sample(id)?)
            .arg(&extra)
            .inputs(inputs)
            .output(&bam)
            .output(&junctions);

        stage.targets.push(bam);
        stage.targets.push(junctions);
        stage.jobs.push(job);
    }

    log::info!("INFO [STAR]: {} alignment jobs declared", stage.jobs.len());

    Ok(stage)
}
