pub mod drimseq;
pub mod qorts;
pub mod salmon;
pub mod samtools;
pub mod star;
pub mod stringtie;

use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;

use crate::{
    bootstrap,
    cli::{GraphArgs, RunArgs, WriteArgs},
    config::*,
    consts::*,
    error::{PipeError, Result},
    executor::{
        job::{quote, Job},
        manager::ParallelExecutor,
    },
    graph::{TargetSet, TaskGraph},
    sample::SampleId,
    template::{PathTemplate, PER_READ},
};

/// Jobs, final outputs and per-sample directories declared by one or
/// more pipelines.
#[derive(Debug, Default)]
pub struct Stage {
    pub jobs: Vec<Job>,
    pub targets: TargetSet,
    pub dirs: Vec<PathBuf>,
}

impl Stage {
    pub fn extend(&mut self, other: Stage) {
        self.jobs.extend(other.jobs);
        self.targets.extend(other.targets);
        self.dirs.extend(other.dirs);
    }
}

/// An enum representing the pipelines this crate declares.
///
/// # Example
///
/// ``` rust, ignore
/// let pipeline = Pipeline::from_str("alignment")?;
/// assert_eq!(pipeline, Pipeline::Alignment);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Pipeline {
    /// salmon quantification
    Salmon,
    /// STAR -> samtools sort -> samtools index -> QoRTs
    Alignment,
    /// StringTie on sorted alignments
    StringTie,
    /// DRIMSeq differential transcript usage per condition
    Drimseq,
}

impl Pipeline {
    pub const ALL: [Pipeline; 4] = [
        Pipeline::Salmon,
        Pipeline::Alignment,
        Pipeline::StringTie,
        Pipeline::Drimseq,
    ];

    /// Pipelines the config carries a section for.
    pub fn detect(config: &Config) -> Vec<Pipeline> {
        Self::ALL
            .into_iter()
            .filter(|pipeline| match pipeline {
                Pipeline::Salmon => config.has_dir(SALMON),
                Pipeline::Alignment => config.has_dir(QORTS),
                Pipeline::StringTie => config.has_dir(STRINGTIE),
                Pipeline::Drimseq => !config.conditions.is_empty(),
            })
            .collect()
    }

    /// Declare the jobs of this pipeline.
    pub fn stage(&self, config: &Config, ids: &[SampleId]) -> Result<Stage> {
        let mut stage = Stage::default();

        match self {
            Pipeline::Salmon => stage.extend(salmon::quant(config, ids)?),
            Pipeline::Alignment => {
                stage.extend(star::align(config, ids)?);
                stage.extend(samtools::sort(config, ids)?);
                stage.extend(samtools::index(config, ids)?);
                stage.extend(qorts::qc(config, ids)?);
            }
            Pipeline::StringTie => stage.extend(stringtie::assemble(config, ids)?),
            Pipeline::Drimseq => {
                stage.extend(drimseq::test_usage(config, &config.condition_names()?)?)
            }
        }

        Ok(stage)
    }

    fn needs_samples(&self) -> bool {
        !matches!(self, Pipeline::Drimseq)
    }
}

impl FromStr for Pipeline {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "salmon" => Ok(Self::Salmon),
            "alignment" | "star" => Ok(Self::Alignment),
            "stringtie" => Ok(Self::StringTie),
            "drimseq" => Ok(Self::Drimseq),
            _ => Err(format!("ERROR: Invalid pipeline: {}", s)),
        }
    }
}

impl std::fmt::Display for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Pipeline::Salmon => write!(f, "salmon"),
            Pipeline::Alignment => write!(f, "alignment"),
            Pipeline::StringTie => write!(f, "stringtie"),
            Pipeline::Drimseq => write!(f, "drimseq"),
        }
    }
}

/// Paired FASTQ files of a sample:
/// `{fastq.work}/{group}/{key}_{read}.fastq.gz`.
pub fn reads(config: &Config, id: &SampleId) -> Result<Vec<PathBuf>> {
    let fastq = PathTemplate::under(
        &config.dir(FASTQ, WORK)?,
        &format!("{{group}}/{{key}}_{{read}}.{}", FASTQ_GZ),
        &PER_READ,
    )?;

    READS
        .iter()
        .map(|read| {
            let mut bindings = id.bindings();
            bindings.insert(READ, read.to_string());
            fastq.render(&bindings)
        })
        .collect()
}

/// Declare every job of the selected pipelines. An empty selection
/// means every pipeline the config has a section for.
///
/// # Example
///
/// ``` rust, ignore
/// let stage = build(&config, &[Pipeline::Alignment])?;
/// let graph = TaskGraph::new(stage.jobs)?;
/// ```
pub fn build(config: &Config, pipelines: &[Pipeline]) -> Result<Stage> {
    let mut pipelines = if pipelines.is_empty() {
        Pipeline::detect(config)
    } else {
        pipelines.to_vec()
    };
    pipelines.sort();
    pipelines.dedup();

    if pipelines.is_empty() {
        return Err(PipeError::MissingKey(
            "directories.{salmon,qorts,stringtie} or conditions".into(),
        ));
    }

    log::info!(
        "INFO [{}]: building {}",
        RNAPIPE.to_uppercase(),
        pipelines
            .iter()
            .map(Pipeline::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    );

    let ids = if pipelines.iter().any(Pipeline::needs_samples) {
        config.sample_ids()?
    } else {
        Vec::new()
    };

    let mut stage = Stage::default();
    for pipeline in &pipelines {
        stage.extend(pipeline.stage(config, &ids)?);
    }

    Ok(stage)
}

/// Load the config and build the task graph for `args`.
fn load(args: &GraphArgs) -> Result<(Config, TaskGraph, Stage)> {
    let config = Config::read(&args.config)?;
    log::debug!("DEBUG: running with the following config: {:#?}", config);

    let mut stage = build(&config, &args.pipelines)?;
    let graph = TaskGraph::new(std::mem::take(&mut stage.jobs))?;

    Ok((config, graph, stage))
}

/// Build the graph, bootstrap per-sample directories and execute
/// every out-of-date job needed for the requested targets.
///
/// # Example
///
/// ``` rust, ignore
/// run(&args)?;
/// ```
pub fn run(args: &RunArgs) -> Result<()> {
    let (config, graph, stage) = load(&args.graph)?;

    let targets = if args.targets.is_empty() {
        stage.targets.clone()
    } else {
        args.targets.clone()
    };

    let resolved = graph.resolve(&targets)?;
    if resolved.is_empty() {
        log::warn!("WARN [GRAPH]: no target selected, nothing to build");
        return Ok(());
    }

    log::info!(
        "INFO [GRAPH]: {} target(s) need {} job(s) in {} level(s)",
        targets.len(),
        resolved.len(),
        resolved.levels().len()
    );

    if args.dry_run {
        if let Err(e) = resolved.check_leaves() {
            log::warn!("WARN: {}", e);
        }
    } else {
        bootstrap::ensure_dirs(&dirs_for(&stage.dirs, &resolved.ordered()))?;
        resolved.check_leaves()?;
    }

    let levels = resolved.schedule();
    if levels.is_empty() {
        log::info!("INFO [GRAPH]: nothing to be done, all targets are up to date");
        return Ok(());
    }

    let ran = ParallelExecutor::new(args.manager)
        .threads(args.jobs)
        .dry_run(args.dry_run)
        .with_config(&config)?
        .execute(&levels)?;

    if !args.dry_run {
        log::info!("INFO [{}]: {} job(s) completed", RNAPIPE.to_uppercase(), ran);
    }

    Ok(())
}

/// Print the target set, one path per line.
pub fn targets(args: &GraphArgs) -> Result<Vec<PathBuf>> {
    let (_, _, stage) = load(args)?;

    for target in &stage.targets {
        println!("{}", target.display());
    }

    Ok(stage.targets)
}

/// Per-sample directories that hold an output of one of `jobs`.
fn dirs_for(dirs: &[PathBuf], jobs: &[&Job]) -> Vec<PathBuf> {
    dirs.iter()
        .filter(|dir| {
            jobs.iter()
                .flat_map(|job| job.outputs.iter())
                .any(|output| output.starts_with(dir))
        })
        .cloned()
        .collect()
}

/// Render a bash script creating `dirs` and running `jobs` in order.
///
/// # Example
///
/// ``` rust, ignore
/// let script = render_script(&stage.dirs, &resolved.ordered());
/// assert!(script.starts_with("#!/usr/bin/env bash"));
/// ```
pub fn render_script(dirs: &[PathBuf], jobs: &[&Job]) -> String {
    let mut script = String::from("#!/usr/bin/env bash\nset -euo pipefail\n\n");

    for dir in dirs {
        let dir = quote(&dir.to_string_lossy()).into_owned();
        script.push_str(&format!("[ -d {0} ] || mkdir {0}\n", dir));
    }
    if !dirs.is_empty() {
        script.push('\n');
    }

    for job in jobs {
        script.push_str(&format!("# {}\n{}\n", job.name(), job.shell()));
    }

    script
}

/// Write every command of the graph, dependencies first, to a shell
/// script. Per-sample directories are created by the script itself.
pub fn write(args: &WriteArgs) -> Result<()> {
    let (_, graph, stage) = load(&args.graph)?;
    let resolved = graph.resolve(&stage.targets)?;
    let jobs = resolved.ordered();
    let script = render_script(&dirs_for(&stage.dirs, &jobs), &jobs);

    let path = &args.output;
    let mut file = std::fs::File::create(path).map_err(|e| PipeError::io(e, path))?;
    file.write_all(script.as_bytes())
        .map_err(|e| PipeError::io(e, path))?;

    log::info!(
        "INFO [WRITE]: {} command(s) written to {}",
        resolved.len(),
        path.display()
    );

    Ok(())
}
