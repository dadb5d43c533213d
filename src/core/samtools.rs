use crate::{
    config::*,
    consts::*,
    core::Stage,
    error::Result,
    executor::job::{quote, Job},
    sample::SampleId,
    template::{PathTemplate, PER_SAMPLE},
};

/// Sort STAR alignments by coordinate
///
/// # Arguments
/// * `config` - The configuration for the pipeline
/// * `ids` - Sample identifiers
///
/// # Note
///
/// Each sample gets its own temporary directory under the `bam_sort`
/// scratch root, named by the full identifier so samples sharing a key
/// across groups never share temp files.
///
/// # Example
/// ```rust, ignore
/// let stage = samtools::sort(&config, &ids)?;
/// ```
pub fn sort(config: &Config, ids: &[SampleId]) -> Result<Stage> {
    let memory = config.str_or(SAMTOOLS, MEMORY, DEFAULT_SORT_MEMORY);

    let work = config.dir(ALIGNMENT, WORK)?;
    let scratch = config.dir(BAM_SORT, SCRATCH)?;
    let aligned = PathTemplate::under(&work, &format!("{{sample}}{}", ALIGNED_BAM), &PER_SAMPLE)?;
    let sorted = PathTemplate::under(&work, &format!("{{sample}}{}", SORTED_BAM), &PER_SAMPLE)?;
    let tmp = PathTemplate::under(&scratch, "{sample}/", &PER_SAMPLE)?;

    let mut stage = Stage::default();

    for id in ids {
        let input = aligned.render_sample(id)?;
        let output = sorted.render_sample(id)?;
        let tmp = tmp.render_sample(id)?;

        let job = Job::new("sort", id.as_str())
            .package(config.package(SAMTOOLS))
            .before(format!("mkdir -p {}", quote(&tmp.to_string_lossy())))
            .task("samtools sort")
            .opt("-m", &memory)
            .opt_path("-T", &tmp)
            .opt_path("-o", &output)
            .path(&input)
            .input(input)
            .output(&output);

        stage.targets.push(output);
        stage.jobs.push(job);
    }

    Ok(stage)
}

/// Index coordinate-sorted BAMs
///
/// # Example
/// ```rust, ignore
/// let stage = samtools::index(&config, &ids)?;
/// ```
pub fn index(config: &Config, ids: &[SampleId]) -> Result<Stage> {
    let work = config.dir(ALIGNMENT, WORK)?;
    let sorted = PathTemplate::under(&work, &format!("{{sample}}{}", SORTED_BAM), &PER_SAMPLE)?;
    let bai = PathTemplate::under(
        &work,
        &format!("{{sample}}{}{}", SORTED_BAM, BAI),
        &PER_SAMPLE,
    )?;

    let mut stage = Stage::default();

    for id in ids {
        let input = sorted.render_sample(id)?;
        let output = bai.render_sample(id)?;

        let job = Job::new("index", id.as_str())
            .package(config.package(SAMTOOLS))
            .task("samtools index")
            .path(&input)
            .input(input)
            .output(&output);

        stage.targets.push(output);
        stage.jobs.push(job);
    }

    log::info!(
        "INFO [SAMTOOLS]: {} sort/index job pairs declared",
        stage.jobs.len()
    );

    Ok(stage)
}
