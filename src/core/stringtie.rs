use crate::{
    config::*,
    consts::*,
    core::Stage,
    error::Result,
    executor::job::Job,
    sample::SampleId,
    template::{PathTemplate, PER_SAMPLE},
};

/// Estimate reference transcript abundances with StringTie
///
/// # Arguments
/// * `config` - The configuration for the pipeline
/// * `ids` - Sample identifiers
///
/// # Note
///
/// Sorted BAMs are read from the alignment *scratch* directory, so this
/// pipeline can run on alignments staged outside the alignment pipeline.
/// Each sample writes into its own `{stringtie.naive}/{sample}/` directory
/// (created during bootstrap), because `-B` drops Ballgown tables next to
/// the GTF.
///
/// # Example
/// ```rust, ignore
/// let stage = stringtie::assemble(&config, &ids)?;
/// ```
pub fn assemble(config: &Config, ids: &[SampleId]) -> Result<Stage> {
    let annotation = config.reference(GTF)?;
    let threads = config.int_or(STRINGTIE, THREADS, DEFAULT_STRINGTIE_THREADS)?;
    let extra = config.get_step_args(STRINGTIE, &[THREADS]);

    let scratch = config.dir(ALIGNMENT, SCRATCH)?;
    let naive = config.dir(STRINGTIE, NAIVE)?;
    let sorted = PathTemplate::under(&scratch, &format!("{{sample}}{}", SORTED_BAM), &PER_SAMPLE)?;
    let sample_dir = PathTemplate::under(&naive, "{sample}", &PER_SAMPLE)?;
    let gtf = PathTemplate::under(
        &naive,
        &format!("{{sample}}/{{sample}}{}", STRINGTIE_GTF),
        &PER_SAMPLE,
    )?;

    let mut stage = Stage::default();

    for id in ids {
        let input = sorted.render_sample(id)?;
        let output = gtf.render_sample(id)?;

        let job = Job::new(STRINGTIE, id.as_str())
            .package(config.package(STRINGTIE))
            .task(STRINGTIE)
            .path(&input)
            .opt_path("-G", annotation)
            .args(&["-e", "-B"])
            .opt("-p", threads)
            .arg(&extra)
            .opt_path("-o", &output)
            .input(input)
            .input(annotation)
            .output(&output);

        stage.targets.push(output);
        stage.dirs.push(sample_dir.render_sample(id)?);
        stage.jobs.push(job);
    }

    log::info!(
        "INFO [STRINGTIE]: {} assembly jobs declared",
        stage.jobs.len()
    );

    Ok(stage)
}
