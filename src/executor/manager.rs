use dashmap::DashMap;
use rayon::prelude::*;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::{
    config::Config,
    consts::*,
    error::{PipeError, Result},
    executor::job::Job,
};

/// Runs dependency levels of jobs, one level after the other.
///
/// Jobs inside a level never depend on each other, so a level is
/// handed over as a whole: to a rayon pool for the local manager, or
/// as a job list for `para`.
#[derive(Debug, Clone)]
pub struct ParallelExecutor {
    /// Strategy used to run each level
    pub manager: ParallelManager,
    /// Concurrent jobs for the local manager
    pub threads: usize,
    /// Log commands instead of running them
    pub dry_run: bool,
    /// Cluster queue for `para`
    pub queue: String,
    /// Memory per job (MB) for `para`
    pub memory: i64,
    /// Where job lists are written
    pub workdir: PathBuf,
}

impl ParallelExecutor {
    /// Create a new instance of ParallelExecutor
    ///
    /// # Example
    ///
    /// ```rust, no_run
    /// use rnapipe::executor::manager::{ParallelExecutor, ParallelManager};
    ///
    /// let executor = ParallelExecutor::new(ParallelManager::Local).threads(4);
    /// assert_eq!(executor.threads, 4);
    /// ```
    pub fn new(manager: ParallelManager) -> Self {
        Self {
            manager,
            threads: num_cpus::get(),
            dry_run: false,
            queue: DEFAULT_QUEUE.to_string(),
            memory: DEFAULT_MEMORY_MB,
            workdir: PathBuf::from("."),
        }
    }

    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Read queue, memory and job list directory from the config block
    /// named after the manager
    ///
    /// # Example
    ///
    /// ``` toml
    /// [para]
    /// queue = "long"
    /// memory = 32000
    /// workdir = "/scratch/runs"
    /// ```
    pub fn with_config(mut self, config: &Config) -> Result<Self> {
        let block = self.manager.to_string();

        self.queue = config.str_or(&block, QUEUE, DEFAULT_QUEUE);
        self.memory = config.int_or(&block, MEMORY, DEFAULT_MEMORY_MB)?;
        self.workdir = PathBuf::from(config.str_or(&block, WORKDIR, "."));

        Ok(self)
    }

    /// Execute every level in order and stop at the first level with
    /// a failed job.
    ///
    /// # Returns
    ///
    /// The number of jobs run (or listed, in dry-run mode).
    pub fn execute(&self, levels: &[Vec<&Job>]) -> Result<usize> {
        let total: usize = levels.iter().map(Vec::len).sum();

        if self.dry_run {
            for job in levels.iter().flatten() {
                log::info!("INFO [DRY-RUN] {}: {}", job.name(), job.shell());
            }
            log::info!("INFO [DRY-RUN]: {} job(s) would run", total);

            return Ok(total);
        }

        match self.manager {
            ParallelManager::Local => self.run_local(levels)?,
            ParallelManager::Para => self.run_para(levels)?,
        }

        Ok(total)
    }

    fn run_local(&self, levels: &[Vec<&Job>]) -> Result<()> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .build()
            .map_err(|e| PipeError::InvalidValue {
                key: "jobs".into(),
                msg: e.to_string(),
            })?;

        for (idx, level) in levels.iter().enumerate() {
            log::info!(
                "INFO [LEVEL {}/{}]: running {} job(s) on {} thread(s)...",
                idx + 1,
                levels.len(),
                level.len(),
                self.threads
            );

            let failures: DashMap<String, String> = DashMap::new();

            pool.install(|| {
                level.par_iter().for_each(|job| {
                    log::debug!("DEBUG [{}]: {}", job.name(), job.shell());

                    if let Err(msg) = shell(&job.shell()).and_then(|_| check_outputs(job)) {
                        clean_outputs(job);
                        failures.insert(job.name(), msg);
                    } else {
                        log::info!("INFO [{}]: done!", job.name());
                    }
                });
            });

            fail_on(failures)?;
        }

        Ok(())
    }

    fn run_para(&self, levels: &[Vec<&Job>]) -> Result<()> {
        let run_dir = self.workdir.join(format!(
            "{}_{}",
            RNAPIPE,
            chrono::Local::now().format("%Y%m%d%H%M%S")
        ));
        std::fs::create_dir_all(&run_dir).map_err(|e| PipeError::io(e, &run_dir))?;

        for (idx, level) in levels.iter().enumerate() {
            let joblist = run_dir.join(format!("{}.{}", JOBLIST, idx));
            write_jobs(level, &joblist)?;

            // INFO: 'para make <name> <jobs> -q <queue> -memoryMb <memory>'
            let cmd = format!(
                "para make {}_{} {} -q {} -memoryMb {}",
                RNAPIPE,
                idx,
                joblist.display(),
                self.queue,
                self.memory,
            );

            log::info!(
                "INFO [LEVEL {}/{}]: sending {} job(s) to para...",
                idx + 1,
                levels.len(),
                level.len()
            );

            let failures: DashMap<String, String> = DashMap::new();

            if let Err(msg) = shell(&cmd) {
                // INFO: para does not say which jobs failed, none of the level is trusted
                for job in level {
                    clean_outputs(job);
                }
                failures.insert(format!("para:{}", idx), msg);
            } else {
                for job in level {
                    if let Err(msg) = check_outputs(job) {
                        clean_outputs(job);
                        failures.insert(job.name(), msg);
                    }
                }
            }

            fail_on(failures)?;
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParallelManager {
    /// Run jobs on this machine
    Local,
    /// Send job lists to the para cluster manager
    Para,
}

impl FromStr for ParallelManager {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(ParallelManager::Local),
            "para" => Ok(ParallelManager::Para),
            _ => Err(format!("ERROR: Unknown parallel manager: {}", s)),
        }
    }
}

impl std::fmt::Display for ParallelManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParallelManager::Local => write!(f, "local"),
            ParallelManager::Para => write!(f, "para"),
        }
    }
}

/// Write the jobs to a file, one shell line per job
///
/// # Example
///
/// ```rust, ignore
/// write_jobs(&level, Path::new("run/jobs.0"))?;
/// ```
pub fn write_jobs(jobs: &[&Job], path: &Path) -> Result<()> {
    let mut file = std::fs::File::create(path).map_err(|e| PipeError::io(e, path))?;

    for job in jobs {
        writeln!(file, "{}", job.shell()).map_err(|e| PipeError::io(e, path))?;
    }

    Ok(())
}

/// Executes a shell command and returns stderr on failure.
///
/// # Example
///
/// ```rust, ignore
/// shell("ls -l")?;
/// ```
pub fn shell(cmd: &str) -> std::result::Result<(), String> {
    let output = std::process::Command::new("sh")
        .arg("-c")
        .arg(cmd)
        .output()
        .map_err(|e| format!("failed to spawn sh: {}", e))?;

    if output.status.success() {
        Ok(())
    } else {
        Err(format!(
            "{} exited with {}\n{}",
            cmd,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim_end()
        ))
    }
}

/// A job that exits cleanly but leaves a declared output behind has failed.
fn check_outputs(job: &Job) -> std::result::Result<(), String> {
    match job.outputs.iter().find(|output| !output.exists()) {
        Some(missing) => Err(format!("declared output {} was not created", missing.display())),
        None => Ok(()),
    }
}

/// Delete whatever a failed job left behind, so a truncated file is
/// never taken for an up-to-date output on the next run.
fn clean_outputs(job: &Job) {
    for output in job.outputs.iter().filter(|output| output.exists()) {
        match std::fs::remove_file(output) {
            Ok(()) => log::warn!(
                "WARN [{}]: removed output of failed job: {}",
                job.name(),
                output.display()
            ),
            Err(e) => log::error!(
                "ERROR [{}]: could not remove {}: {}",
                job.name(),
                output.display(),
                e
            ),
        }
    }
}

fn fail_on(failures: DashMap<String, String>) -> Result<()> {
    if failures.is_empty() {
        return Ok(());
    }

    let mut names = Vec::with_capacity(failures.len());
    for (name, msg) in failures {
        log::error!("ERROR: failed to execute {}\n{}", name, msg);
        names.push(name);
    }
    names.sort();

    Err(PipeError::JobFailed {
        failed: names.len(),
        names: names.join(", "),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::TaskGraph;

    fn touch_job(rule: &str, output: &Path) -> Job {
        Job::new(rule, "s1")
            .task("touch")
            .path(output)
            .output(output)
    }

    #[test]
    fn parses_manager_names() {
        assert_eq!("Local".parse::<ParallelManager>(), Ok(ParallelManager::Local));
        assert_eq!("para".parse::<ParallelManager>(), Ok(ParallelManager::Para));
        assert!("slurm".parse::<ParallelManager>().is_err());
        assert_eq!(ParallelManager::Para.to_string(), "para");
    }

    #[test]
    fn local_runs_levels_in_order() {
        let root = tempfile::tempdir().unwrap();
        let first = root.path().join("first.txt");
        let second = root.path().join("second.txt");

        let a = touch_job("a", &first);
        let b = Job::new("b", "s1")
            .task("cp")
            .path(&first)
            .path(&second)
            .input(&first)
            .output(&second);

        let executor = ParallelExecutor::new(ParallelManager::Local).threads(2);
        let ran = executor.execute(&[vec![&a], vec![&b]]).unwrap();

        assert_eq!(ran, 2);
        assert!(second.exists());
    }

    #[test]
    fn failures_stop_the_run() {
        let root = tempfile::tempdir().unwrap();
        let never = root.path().join("never.txt");

        let bad = Job::new("bad", "s1").task("exit 3").output(root.path().join("x"));
        let after = touch_job("after", &never);

        let executor = ParallelExecutor::new(ParallelManager::Local).threads(1);
        match executor.execute(&[vec![&bad], vec![&after]]) {
            Err(PipeError::JobFailed { failed, names }) => {
                assert_eq!(failed, 1);
                assert_eq!(names, "bad:s1");
            }
            other => panic!("expected a job failure, got {:?}", other),
        }
        assert!(!never.exists());
    }

    #[test]
    fn failed_job_outputs_are_removed_and_rescheduled() {
        let root = tempfile::tempdir().unwrap();
        let input = root.path().join("in.bam");
        let output = root.path().join("out.sortedByCoord.bam");
        std::fs::write(&input, "bam").unwrap();

        let job = Job::new("sort", "s1")
            .task(&format!("echo trunc > {} && exit 1", output.display()))
            .input(&input)
            .output(&output);
        let graph = TaskGraph::new(vec![job]).unwrap();
        let resolved = graph.resolve(&[output.clone()]).unwrap();

        let executor = ParallelExecutor::new(ParallelManager::Local).threads(1);
        assert!(matches!(
            executor.execute(&resolved.schedule()),
            Err(PipeError::JobFailed { failed: 1, .. })
        ));

        assert!(!output.exists());
        assert_eq!(resolved.schedule().len(), 1);
    }

    #[test]
    fn partial_outputs_of_a_job_missing_one_are_removed() {
        let root = tempfile::tempdir().unwrap();
        let written = root.path().join("QC.geneCounts.txt.gz");
        let job = Job::new("qorts", "s1")
            .task("touch")
            .path(&written)
            .output(&written)
            .output(root.path().join("QC.exonCounts.txt.gz"));

        let executor = ParallelExecutor::new(ParallelManager::Local);
        assert!(executor.execute(&[vec![&job]]).is_err());
        assert!(!written.exists());
    }

    #[test]
    fn missing_declared_output_is_a_failure() {
        let root = tempfile::tempdir().unwrap();
        let job = Job::new("liar", "s1")
            .task("true")
            .output(root.path().join("promised.txt"));

        let executor = ParallelExecutor::new(ParallelManager::Local);
        assert!(matches!(
            executor.execute(&[vec![&job]]),
            Err(PipeError::JobFailed { .. })
        ));
    }

    #[test]
    fn dry_run_touches_nothing() {
        let root = tempfile::tempdir().unwrap();
        let out = root.path().join("out.txt");
        let job = touch_job("a", &out);

        let executor = ParallelExecutor::new(ParallelManager::Para).dry_run(true);
        assert_eq!(executor.execute(&[vec![&job]]).unwrap(), 1);
        assert!(!out.exists());
    }

    #[test]
    fn job_list_has_one_line_per_job() {
        let root = tempfile::tempdir().unwrap();
        let a = touch_job("a", Path::new("a.txt")).package(Some("coreutils"));
        let b = touch_job("b", Path::new("b.txt"));
        let list = root.path().join("jobs.0");

        write_jobs(&[&a, &b], &list).unwrap();

        assert_eq!(
            std::fs::read_to_string(&list).unwrap(),
            "module load coreutils && touch a.txt\ntouch b.txt\n"
        );
    }
}
