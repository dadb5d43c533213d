//! Directed acyclic task graph over files.
//!
//! Jobs are nodes; an edge runs from the job that declares a path as output
//! to every job that declares the same path as input. Paths no job produces
//! are leaf inputs and must exist on disk before anything runs.

use hashbrown::{HashMap, HashSet};

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::{PipeError, Result};
use crate::executor::job::Job;

/// The final output paths a run aims to produce.
pub type TargetSet = Vec<PathBuf>;

#[derive(Debug)]
pub struct TaskGraph {
    jobs: Vec<Job>,
    producers: HashMap<PathBuf, usize>,
}

impl TaskGraph {
    /// Index every declared output. An output declared twice is an error.
    pub fn new(jobs: Vec<Job>) -> Result<Self> {
        let mut producers = HashMap::new();

        for (idx, job) in jobs.iter().enumerate() {
            for output in &job.outputs {
                if producers.insert(output.clone(), idx).is_some() {
                    return Err(PipeError::OutputCollision(output.clone()));
                }
            }
        }

        Ok(Self { jobs, producers })
    }

    pub fn producer(&self, path: &Path) -> Option<&Job> {
        self.producers.get(path).map(|&idx| &self.jobs[idx])
    }

    /// Collect the jobs needed for `targets` and order them in levels:
    /// every job only depends on jobs of earlier levels.
    ///
    /// # Example
    ///
    /// ``` rust, ignore
    /// let resolved = graph.resolve(&targets)?;
    /// for level in resolved.levels() { ... }
    /// ```
    pub fn resolve(&self, targets: &[PathBuf]) -> Result<Resolved<'_>> {
        let mut needed = HashSet::new();
        let mut stack = Vec::new();

        for target in targets {
            let idx = *self
                .producers
                .get(target)
                .ok_or_else(|| PipeError::UnknownTarget(target.clone()))?;
            stack.push(idx);
        }

        while let Some(idx) = stack.pop() {
            if !needed.insert(idx) {
                continue;
            }

            stack.extend(
                self.jobs[idx]
                    .inputs
                    .iter()
                    .filter_map(|input| self.producers.get(input).copied()),
            );
        }

        // INFO: Kahn's algorithm restricted to the needed subgraph,
        // job indices sorted so levels come out in declaration order
        let mut order: Vec<usize> = needed.iter().copied().collect();
        order.sort_unstable();

        let mut pending: HashMap<usize, usize> = HashMap::new();
        let mut dependents: HashMap<usize, Vec<usize>> = HashMap::new();

        for &idx in &order {
            let deps: HashSet<usize> = self.jobs[idx]
                .inputs
                .iter()
                .filter_map(|input| self.producers.get(input).copied())
                .collect();

            pending.insert(idx, deps.len());
            for dep in deps {
                dependents.entry(dep).or_default().push(idx);
            }
        }

        let mut levels = Vec::new();
        let mut current: Vec<usize> = order
            .iter()
            .copied()
            .filter(|idx| pending[idx] == 0)
            .collect();
        let mut placed = 0;

        while !current.is_empty() {
            placed += current.len();

            let mut next = Vec::new();
            for idx in &current {
                for dependent in dependents.get(idx).into_iter().flatten() {
                    if let Some(count) = pending.get_mut(dependent) {
                        *count -= 1;
                        if *count == 0 {
                            next.push(*dependent);
                        }
                    }
                }
            }
            next.sort_unstable();

            levels.push(current);
            current = next;
        }

        if placed < order.len() {
            let stuck = order
                .iter()
                .find(|idx| pending[*idx] > 0)
                .map(|&idx| self.jobs[idx].name())
                .unwrap_or_default();
            return Err(PipeError::Cycle(stuck));
        }

        Ok(Resolved {
            graph: self,
            levels,
        })
    }
}

/// The subgraph needed for a set of targets, in dependency levels.
#[derive(Debug)]
pub struct Resolved<'a> {
    graph: &'a TaskGraph,
    levels: Vec<Vec<usize>>,
}

impl<'a> Resolved<'a> {
    pub fn levels(&self) -> Vec<Vec<&'a Job>> {
        self.levels
            .iter()
            .map(|level| level.iter().map(|&idx| &self.graph.jobs[idx]).collect())
            .collect()
    }

    /// Every job, dependencies first.
    pub fn ordered(&self) -> Vec<&'a Job> {
        self.levels().into_iter().flatten().collect()
    }

    pub fn len(&self) -> usize {
        self.levels.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Inputs that no job produces, paired with the first job reading them.
    pub fn leaves(&self) -> Vec<(&'a Path, &'a Job)> {
        let mut seen = HashSet::new();

        self.ordered()
            .into_iter()
            .flat_map(|job| job.inputs.iter().map(move |input| (input.as_path(), job)))
            .filter(|(input, _)| self.graph.producer(input).is_none())
            .filter(|(input, _)| seen.insert(*input))
            .collect()
    }

    /// Fail on the first leaf input missing from disk.
    pub fn check_leaves(&self) -> Result<()> {
        for (input, job) in self.leaves() {
            if !input.exists() {
                return Err(PipeError::MissingInput {
                    path: input.to_path_buf(),
                    rule: job.name(),
                });
            }
        }

        Ok(())
    }

    /// Levels restricted to jobs that have to run: jobs whose outputs are
    /// missing or older than one of their inputs, and every job downstream
    /// of one of those.
    pub fn schedule(&self) -> Vec<Vec<&'a Job>> {
        let mut rerun: HashSet<&Path> = HashSet::new();
        let mut scheduled = Vec::new();

        for level in self.levels() {
            let stale: Vec<&Job> = level
                .into_iter()
                .filter(|job| {
                    job.inputs.iter().any(|i| rerun.contains(i.as_path())) || is_stale(job)
                })
                .collect();

            for &job in &stale {
                rerun.extend(job.outputs.iter().map(PathBuf::as_path));
            }

            if !stale.is_empty() {
                scheduled.push(stale);
            }
        }

        scheduled
    }
}

/// A job is stale when an output is missing or older than any input.
pub fn is_stale(job: &Job) -> bool {
    let oldest_output = job
        .outputs
        .iter()
        .map(|output| modified(output))
        .collect::<Option<Vec<_>>>()
        .and_then(|times| times.into_iter().min());

    let Some(oldest_output) = oldest_output else {
        return true;
    };

    job.inputs
        .iter()
        .filter_map(|input| modified(input))
        .any(|input_time| input_time > oldest_output)
}

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(rule: &str, inputs: &[&str], outputs: &[&str]) -> Job {
        Job::new(rule, "s1")
            .task(rule)
            .inputs(inputs.iter().map(PathBuf::from))
            .outputs(outputs.iter().map(PathBuf::from))
    }

    fn chain() -> Vec<Job> {
        vec![
            job("index", &["sorted.bam"], &["sorted.bam.bai"]),
            job("align", &["r1.fq", "r2.fq"], &["aligned.bam", "sj.tab"]),
            job("sort", &["aligned.bam"], &["sorted.bam"]),
            job("qc", &["sorted.bam", "genes.gtf"], &["qc.txt"]),
        ]
    }

    fn names(levels: &[Vec<&Job>]) -> Vec<Vec<String>> {
        levels
            .iter()
            .map(|l| l.iter().map(|j| j.rule.clone()).collect())
            .collect()
    }

    #[test]
    fn resolves_levels_in_dependency_order() {
        let graph = TaskGraph::new(chain()).unwrap();
        let resolved = graph
            .resolve(&[PathBuf::from("sorted.bam.bai"), PathBuf::from("qc.txt")])
            .unwrap();

        assert_eq!(
            names(&resolved.levels()),
            vec![vec!["align"], vec!["sort"], vec!["index", "qc"]]
        );
        assert_eq!(resolved.len(), 4);
    }

    #[test]
    fn only_needed_jobs_are_resolved() {
        let graph = TaskGraph::new(chain()).unwrap();
        let resolved = graph.resolve(&[PathBuf::from("sorted.bam")]).unwrap();

        assert_eq!(names(&resolved.levels()), vec![vec!["align"], vec!["sort"]]);

        let leaves: Vec<_> = resolved.leaves().into_iter().map(|(p, _)| p).collect();
        assert_eq!(leaves, vec![Path::new("r1.fq"), Path::new("r2.fq")]);
    }

    #[test]
    fn unknown_target_is_rejected() {
        let graph = TaskGraph::new(chain()).unwrap();

        assert!(matches!(
            graph.resolve(&[PathBuf::from("r1.fq")]),
            Err(PipeError::UnknownTarget(_))
        ));
    }

    #[test]
    fn colliding_outputs_are_rejected() {
        let jobs = vec![job("a", &[], &["x"]), job("b", &[], &["x"])];

        assert!(matches!(
            TaskGraph::new(jobs),
            Err(PipeError::OutputCollision(p)) if p == PathBuf::from("x")
        ));
    }

    #[test]
    fn cycles_are_rejected() {
        let jobs = vec![job("a", &["y"], &["x"]), job("b", &["x"], &["y"])];
        let graph = TaskGraph::new(jobs).unwrap();

        assert!(matches!(
            graph.resolve(&[PathBuf::from("x")]),
            Err(PipeError::Cycle(_))
        ));
    }

    #[test]
    fn missing_leaf_is_reported_with_its_rule() {
        let root = tempfile::tempdir().unwrap();
        let input = root.path().join("r1.fq");
        let output = root.path().join("out.bam");
        let graph = TaskGraph::new(vec![Job::new("align", "s1")
            .input(&input)
            .output(&output)])
        .unwrap();
        let resolved = graph.resolve(&[output]).unwrap();

        match resolved.check_leaves() {
            Err(PipeError::MissingInput { path, rule }) => {
                assert_eq!(path, input);
                assert_eq!(rule, "align:s1");
            }
            other => panic!("expected missing input, got {:?}", other),
        }

        std::fs::write(&input, "@r\nA\n+\nI\n").unwrap();
        assert!(resolved.check_leaves().is_ok());
    }

    #[test]
    fn up_to_date_jobs_are_skipped_and_downstream_reruns() {
        let root = tempfile::tempdir().unwrap();
        let p = |name: &str| root.path().join(name);

        for name in ["in.txt", "mid.txt", "out.txt"] {
            std::fs::write(p(name), name).unwrap();
        }

        let jobs = vec![
            Job::new("first", "s1").input(p("in.txt")).output(p("mid.txt")),
            Job::new("second", "s1").input(p("mid.txt")).output(p("out.txt")),
        ];
        let graph = TaskGraph::new(jobs).unwrap();
        let resolved = graph.resolve(&[p("out.txt")]).unwrap();

        // INFO: files were written in order, so nothing is older than its input
        let mid = std::fs::File::options().write(true).open(p("mid.txt")).unwrap();
        let now = SystemTime::now();
        mid.set_modified(now).unwrap();
        std::fs::File::options()
            .write(true)
            .open(p("out.txt"))
            .unwrap()
            .set_modified(now + std::time::Duration::from_secs(5))
            .unwrap();
        std::fs::File::options()
            .write(true)
            .open(p("in.txt"))
            .unwrap()
            .set_modified(now - std::time::Duration::from_secs(5))
            .unwrap();
        assert!(resolved.schedule().is_empty());

        std::fs::remove_file(p("mid.txt")).unwrap();
        assert_eq!(
            names(&resolved.schedule()),
            vec![vec!["first"], vec!["second"]]
        );
    }
}
