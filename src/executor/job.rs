use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// Struct to represent a job to be executed
/// by the pipeline
///
/// A job is one rule applied to one sample (or condition): the files it
/// reads, the files it promises to write and the command line that turns
/// the former into the latter.
///
/// # Example
///
/// ```rust, no_run
/// use rnapipe::executor::job::Job;
///
/// let job = Job::new("index", "brain_s1")
///     .task("samtools index")
///     .input("brain_s1.sortedByCoord.bam")
///     .output("brain_s1.sortedByCoord.bam.bai")
///     .arg("brain_s1.sortedByCoord.bam");
///
/// assert_eq!(job.cmd(), "samtools index brain_s1.sortedByCoord.bam");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Job {
    pub rule: String,
    pub wildcard: String,
    pub cmd: String,
    pub inputs: Vec<PathBuf>,
    pub outputs: Vec<PathBuf>,
    pub preamble: Vec<String>,
}

impl Job {
    /// Create a new job for `rule` bound to `wildcard`
    /// (a sample identifier or a condition).
    pub fn new(rule: &str, wildcard: &str) -> Self {
        Self {
            rule: rule.to_string(),
            wildcard: wildcard.to_string(),
            ..Default::default()
        }
    }

    /// Set the executable (and subcommand, if any) of the job.
    pub fn task(mut self, exe: &str) -> Self {
        self.cmd.push_str(exe);
        self
    }

    /// Add an argument to the job. Empty arguments are skipped.
    pub fn arg(mut self, arg: impl std::fmt::Display) -> Self {
        let arg = arg.to_string();

        if !arg.is_empty() {
            if !self.cmd.is_empty() {
                self.cmd.push(' ');
            }
            self.cmd.push_str(&arg);
        }

        self
    }

    /// Add a flag followed by its value.
    pub fn opt(self, flag: &str, value: impl std::fmt::Display) -> Self {
        self.arg(flag).arg(value)
    }

    /// Add a path argument, quoted for the shell when needed.
    pub fn path(self, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_string_lossy();
        self.arg(quote(&path))
    }

    /// Add a flag followed by a path.
    pub fn opt_path(self, flag: &str, path: impl AsRef<Path>) -> Self {
        self.arg(flag).path(path)
    }

    /// Add several path arguments.
    pub fn paths(self, paths: &[PathBuf]) -> Self {
        paths.iter().fold(self, |job, path| job.path(path))
    }

    /// Add multiple arguments to the job
    pub fn args<T: std::fmt::Display>(self, args: &[T]) -> Self {
        args.iter().fold(self, |job, arg| job.arg(arg))
    }

    pub fn input(mut self, path: impl Into<PathBuf>) -> Self {
        self.inputs.push(path.into());
        self
    }

    pub fn inputs(mut self, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        self.inputs.extend(paths);
        self
    }

    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.outputs.push(path.into());
        self
    }

    pub fn outputs(mut self, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        self.outputs.extend(paths);
        self
    }

    /// Run `cmd` before the job's own command.
    pub fn before(mut self, cmd: impl Into<String>) -> Self {
        self.preamble.push(cmd.into());
        self
    }

    /// Load an environment module first, if one is configured.
    pub fn package(self, package: Option<&str>) -> Self {
        match package {
            Some(package) => self.before(format!("module load {}", package)),
            None => self,
        }
    }

    pub fn cmd(&self) -> &str {
        &self.cmd
    }

    /// `rule:wildcard`, used in logs and job lists.
    pub fn name(&self) -> String {
        format!("{}:{}", self.rule, self.wildcard)
    }

    /// The full shell line: preamble commands chained with `&&`.
    pub fn shell(&self) -> String {
        self.preamble
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.cmd.as_str()))
            .collect::<Vec<_>>()
            .join(" && ")
    }
}

/// Single-quote `token` unless it only holds characters the shell
/// leaves alone.
///
/// # Example
///
/// ``` rust, ignore
/// assert_eq!(quote("/data/run 1"), "'/data/run 1'");
/// assert_eq!(quote("/data/run_1"), "/data/run_1");
/// ```
pub fn quote(token: &str) -> Cow<'_, str> {
    let plain = !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "/._-+=:,@%".contains(c));

    if plain {
        Cow::Borrowed(token)
    } else {
        Cow::Owned(format!("'{}'", token.replace('\'', "'\\''")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_command_from_tokens() {
        let job = Job::new("stringtie", "brain_s1")
            .task("stringtie")
            .path(Path::new("/aln/brain_s1.sortedByCoord.bam"))
            .opt("-G", "/ref/genes.gtf")
            .args(&["-e", "-B"])
            .opt("-p", 8)
            .arg("");

        assert_eq!(
            job.cmd(),
            "stringtie /aln/brain_s1.sortedByCoord.bam -G /ref/genes.gtf -e -B -p 8"
        );
        assert_eq!(job.name(), "stringtie:brain_s1");
    }

    #[test]
    fn shell_prepends_module_load() {
        let job = Job::new("index", "brain_s1")
            .package(Some("samtools/1.9"))
            .task("samtools index")
            .arg("x.bam");

        assert_eq!(job.shell(), "module load samtools/1.9 && samtools index x.bam");

        let bare = Job::new("index", "brain_s1")
            .package(None)
            .task("samtools index")
            .arg("x.bam");
        assert_eq!(bare.shell(), "samtools index x.bam");
    }

    #[test]
    fn paths_with_spaces_stay_one_argument() {
        let job = Job::new("sort", "brain_s1")
            .task("samtools sort")
            .opt_path("-o", "/data/run 1/brain_s1.bam")
            .path(Path::new("/data/it's/in.bam"))
            .path(Path::new("/data/plain/in.bam"));

        assert_eq!(
            job.cmd(),
            "samtools sort -o '/data/run 1/brain_s1.bam' '/data/it'\\''s/in.bam' /data/plain/in.bam"
        );
        assert_eq!(quote(""), "''");
        assert_eq!(quote("{x}"), "'{x}'");
    }
}
