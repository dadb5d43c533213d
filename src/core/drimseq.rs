use indexmap::IndexMap;

use std::path::PathBuf;

use crate::{
    config::*,
    consts::*,
    core::Stage,
    error::{PipeError, Result},
    executor::job::Job,
    template::{Bindings, PathTemplate, PER_CONDITION},
};

/// Test differential transcript usage with the DRIMSeq R script,
/// one job per condition
///
/// # Arguments
/// * `config` - The configuration for the pipeline
/// * `conditions` - Condition names, each with an entry in `conditions`
///   (salmon quantification directory) and `annotations`
///
/// # Returns
/// One `drimseq` job per condition writing
/// `{out}/{condition}.drimseq_coef.{label}.RData`
///
/// # Example
/// ```rust, ignore
/// let stage = drimseq::test_usage(&config, &config.condition_names()?)?;
/// ```
pub fn test_usage(config: &Config, conditions: &[String]) -> Result<Stage> {
    let script = config.software(DRIMSEQ)?;
    let label = config.str_or(DRIMSEQ, LABEL, DEFAULT_DRIMSEQ_LABEL);

    let out = config.dir(OUT, WORK)?;
    let coef = PathTemplate::under(
        &out,
        &format!("{{condition}}.{}.{}.{}", DRIMSEQ_COEF, label, RDATA),
        &PER_CONDITION,
    )?;

    let mut stage = Stage::default();

    for condition in conditions {
        let quant_dir = lookup(&config.conditions, CONDITIONS, condition)?;
        let annotation = lookup(&config.annotations, ANNOTATIONS, condition)?;

        let mut bindings = Bindings::new();
        bindings.insert(CONDITION, condition.clone());
        let output = coef.render(&bindings)?;

        let job = Job::new(DRIMSEQ, condition)
            .package(config.package(DRIMSEQ))
            .task("Rscript")
            .path(script)
            .path(&quant_dir)
            .path(&out)
            .path(&annotation)
            .arg(condition)
            .input(quant_dir)
            .input(annotation)
            .output(&output);

        stage.targets.push(output);
        stage.jobs.push(job);
    }

    log::info!("INFO [DRIMSEQ]: {} DTU tests declared", stage.jobs.len());

    Ok(stage)
}

fn lookup(map: &IndexMap<String, String>, section: &str, condition: &str) -> Result<PathBuf> {
    map.get(condition)
        .map(PathBuf::from)
        .ok_or_else(|| PipeError::MissingKey(format!("{}.{}", section, condition)))
}
