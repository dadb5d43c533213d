use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading a configuration, building the
/// task graph or running it.
#[derive(Debug, Error)]
pub enum PipeError {
    #[error("could not parse config {path}: {msg}")]
    Parse { path: PathBuf, msg: String },

    #[error("missing config key '{0}'")]
    MissingKey(String),

    #[error("invalid value for '{key}': {msg}")]
    InvalidValue { key: String, msg: String },

    #[error("duplicate sample identifier '{id}' (from group '{group}', sample '{sample}')")]
    DuplicateSample {
        id: String,
        group: String,
        sample: String,
    },

    #[error("malformed template '{pattern}': {msg}")]
    Template { pattern: String, msg: String },

    #[error("output {0} is declared by more than one rule")]
    OutputCollision(PathBuf),

    #[error("no rule produces target {0}")]
    UnknownTarget(PathBuf),

    #[error("dependency cycle through rule '{0}'")]
    Cycle(String),

    #[error("input {path} required by '{rule}' does not exist")]
    MissingInput { path: PathBuf, rule: String },

    #[error("{failed} job(s) failed: {names}")]
    JobFailed { failed: usize, names: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        source: std::io::Error,
        path: PathBuf,
    },
}

impl PipeError {
    /// Wraps an `io::Error` with the path it happened on.
    pub fn io(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        Self::Io {
            source,
            path: path.into(),
        }
    }

    pub fn template(pattern: &str, msg: impl Into<String>) -> Self {
        Self::Template {
            pattern: pattern.to_string(),
            msg: msg.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_no_level_tag() {
        let e = PipeError::MissingInput {
            path: PathBuf::from("/data/fastq/brain/s1_1.fastq.gz"),
            rule: "salmon:brain_s1".into(),
        };

        assert_eq!(
            e.to_string(),
            "input /data/fastq/brain/s1_1.fastq.gz required by 'salmon:brain_s1' does not exist"
        );
        assert_eq!(
            PipeError::MissingKey("reference.star".into()).to_string(),
            "missing config key 'reference.star'"
        );
    }
}
