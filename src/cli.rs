use clap::{Args as ClapArgs, Parser, Subcommand};
use log::Level;
use std::path::PathBuf;

use crate::consts::RUN_SCRIPT;
use crate::core::Pipeline;
use crate::executor::manager::ParallelManager;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: SubArgs,

    #[arg(
        short = 'v',
        long = "verbose",
        help = "Increase verbosity",
        global = true,
        conflicts_with = "quiet"
    )]
    pub verbose: bool,

    #[arg(short = 'q', long = "quiet", help = "Decrease verbosity", global = true)]
    pub quiet: bool,
}

impl Args {
    pub fn level(&self) -> Level {
        if self.verbose {
            Level::Debug
        } else if self.quiet {
            Level::Warn
        } else {
            Level::Info
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum SubArgs {
    #[command(name = "run")]
    Run {
        #[command(flatten)]
        args: RunArgs,
    },
    #[command(name = "targets")]
    Targets {
        #[command(flatten)]
        args: GraphArgs,
    },
    #[command(name = "write")]
    Write {
        #[command(flatten)]
        args: WriteArgs,
    },
}

/// Config and pipeline selection shared by every subcommand
///
/// # Note
///
/// * `pipelines` can take multiple values
/// * If no pipeline is given, every pipeline the config has
///   directories (or conditions) for is selected
#[derive(Debug, ClapArgs, Clone)]
pub struct GraphArgs {
    #[arg(
        short = 'c',
        long = "config",
        help = "Path to the configuration file (.json or .toml)",
        value_name = "CONFIG",
        default_value = "config.json"
    )]
    pub config: PathBuf,

    #[arg(
        short = 'p',
        long = "pipeline",
        help = "Pipeline(s) to build: salmon, alignment, stringtie, drimseq",
        value_name = "PIPELINE",
        value_delimiter = ','
    )]
    pub pipelines: Vec<Pipeline>,
}

/// Build the task graph and run what is out of date
///
/// # Example
///
/// ```bash,no_run
/// rnapipe run -c config.json -p alignment
/// rnapipe run -c config.json -n
/// rnapipe run -c config.json -m para /data/salmon/brain_s1/quant.sf
/// ```
///
/// # Note
///
/// * Without targets, the whole target set of the selected pipelines is built
/// * `--dry-run` lists commands without creating directories or files
#[derive(Debug, ClapArgs, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub graph: GraphArgs,

    #[arg(
        short = 'm',
        long = "manager",
        help = "Parallel executor strategy",
        value_name = "MANAGER",
        default_value = "local"
    )]
    pub manager: ParallelManager,

    #[arg(
        short = 'j',
        long = "jobs",
        help = "Jobs to run at the same time with the local manager",
        value_name = "N",
        default_value_t = num_cpus::get()
    )]
    pub jobs: usize,

    #[arg(short = 'n', long = "dry-run", help = "Dry run the pipeline")]
    pub dry_run: bool,

    #[arg(help = "Only build these output paths", value_name = "TARGET")]
    pub targets: Vec<PathBuf>,
}

/// Write commands to a .sh file in dependency order
/// with parameters specified in --config
///
/// # Example
///
/// ```bash,no_run
/// rnapipe write -c config.json -p salmon -o salmon.sh
/// ```
#[derive(Debug, ClapArgs, Clone)]
pub struct WriteArgs {
    #[command(flatten)]
    pub graph: GraphArgs,

    #[arg(
        short = 'o',
        long = "output",
        help = "Path of the shell script to write",
        value_name = "SCRIPT",
        default_value = RUN_SCRIPT
    )]
    pub output: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn parses_run_with_targets() {
        let args = Args::parse_from([
            "rnapipe",
            "run",
            "-c",
            "cfg.toml",
            "-p",
            "salmon,drimseq",
            "-j",
            "3",
            "-n",
            "a/quant.sf",
            "b/quant.sf",
        ]);

        match args.command {
            SubArgs::Run { args } => {
                assert_eq!(args.graph.config, PathBuf::from("cfg.toml"));
                assert_eq!(args.graph.pipelines, vec![Pipeline::Salmon, Pipeline::Drimseq]);
                assert_eq!(args.jobs, 3);
                assert!(args.dry_run);
                assert_eq!(args.manager, ParallelManager::Local);
                assert_eq!(args.targets.len(), 2);
            }
            other => panic!("unexpected subcommand {:?}", other),
        }
    }

    #[test]
    fn verbosity_maps_to_level() {
        let args = Args::parse_from(["rnapipe", "targets", "-v"]);
        assert_eq!(args.level(), Level::Debug);

        let args = Args::parse_from(["rnapipe", "-q", "targets"]);
        assert_eq!(args.level(), Level::Warn);
    }

    #[test]
    fn rejects_unknown_pipeline() {
        assert!(Args::try_parse_from(["rnapipe", "targets", "-p", "kallisto"]).is_err());
    }
}
