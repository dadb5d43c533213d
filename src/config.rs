use indexmap::IndexMap;
use serde::Deserialize;

use std::path::{Path, PathBuf};

use crate::consts::*;
use crate::error::{PipeError, Result};
use crate::sample::{derive_conditions, derive_sample_ids, SampleId};

/// A struct representing a configuration file.
///
/// # Fields
///
/// * `samples` - group -> sample key -> source path.
/// * `conditions` - condition -> quantification directory (DRIMSeq).
/// * `annotations` - condition -> annotation file (DRIMSeq).
/// * `directories` - role -> {work, scratch, naive} -> path, or role -> path.
/// * `reference` - tool -> reference path.
/// * `software` - tool -> executable path.
/// * `packages` - tool -> environment module to load before the tool runs.
/// * `params` - every other top-level table, one per tool.
///
/// # Example
///
/// ``` json
/// {
///   "samples": { "brain": { "s1": "brain/s1" } },
///   "directories": {
///     "fastq": { "work": "/data/fastq" },
///     "salmon": { "work": "/data/salmon" }
///   },
///   "reference": { "salmon_quasi": "/ref/salmon_index" },
///   "software": {},
///   "salmon": { "mean": 200, "sd": 80 }
/// }
/// ```
#[derive(Deserialize, Debug, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub samples: IndexMap<String, IndexMap<String, String>>,
    #[serde(default)]
    pub conditions: IndexMap<String, String>,
    #[serde(default)]
    pub annotations: IndexMap<String, String>,
    #[serde(default)]
    pub directories: IndexMap<String, Directory>,
    #[serde(default)]
    pub reference: IndexMap<String, String>,
    #[serde(default)]
    pub software: IndexMap<String, String>,
    #[serde(default)]
    pub packages: IndexMap<String, String>,
    #[serde(flatten)]
    pub params: IndexMap<String, StepParams>,
}

impl Config {
    /// Read a configuration file and return a Config struct.
    ///
    /// Files ending in `.json` are parsed as JSON, everything else as TOML.
    ///
    /// # Example
    ///
    /// ``` rust, ignore
    /// let config = Config::read(Path::new("config.json"))?;
    /// ```
    pub fn read(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| PipeError::io(e, path))?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case(JSON))
            .unwrap_or(false);

        let parsed = if is_json {
            Self::from_json(&contents)
        } else {
            Self::from_toml(&contents)
        };

        parsed.map_err(|e| match e {
            PipeError::Parse { msg, .. } => PipeError::Parse {
                path: path.to_path_buf(),
                msg,
            },
            other => other,
        })
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        serde_json::from_str(contents).map_err(|e| PipeError::Parse {
            path: PathBuf::from("<json>"),
            msg: e.to_string(),
        })
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| PipeError::Parse {
            path: PathBuf::from("<toml>"),
            msg: e.to_string(),
        })
    }

    /// Sample identifiers in configuration order.
    ///
    /// # Example
    ///
    /// ``` rust, ignore
    /// let ids = config.sample_ids()?;
    /// assert_eq!(ids[0].as_str(), "brain_s1");
    /// ```
    pub fn sample_ids(&self) -> Result<Vec<SampleId>> {
        if self.samples.is_empty() {
            return Err(PipeError::MissingKey(SAMPLES.into()));
        }

        derive_sample_ids(&self.samples)
    }

    /// Condition names in configuration order, each guaranteed
    /// to carry an annotation.
    pub fn condition_names(&self) -> Result<Vec<String>> {
        if self.conditions.is_empty() {
            return Err(PipeError::MissingKey(CONDITIONS.into()));
        }

        derive_conditions(&self.conditions, &self.annotations)
    }

    /// Get the path configured for a directory role.
    ///
    /// A role given as a plain string only answers to `work`.
    ///
    /// # Example
    ///
    /// ``` rust, ignore
    /// let dir = config.dir("alignment", "scratch")?;
    /// ```
    pub fn dir(&self, role: &str, kind: &str) -> Result<PathBuf> {
        let key = format!("directories.{}.{}", role, kind);

        match self.directories.get(role) {
            Some(Directory::Path(path)) if kind == WORK => Ok(PathBuf::from(path)),
            Some(Directory::Path(_)) => Err(PipeError::MissingKey(key)),
            Some(Directory::Roles(roles)) => roles
                .get(kind)
                .map(PathBuf::from)
                .ok_or(PipeError::MissingKey(key)),
            None => Err(PipeError::MissingKey(key)),
        }
    }

    pub fn has_dir(&self, role: &str) -> bool {
        self.directories.contains_key(role)
    }

    pub fn reference(&self, key: &str) -> Result<&str> {
        self.reference
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| PipeError::MissingKey(format!("reference.{}", key)))
    }

    pub fn software(&self, key: &str) -> Result<&str> {
        self.software
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| PipeError::MissingKey(format!("software.{}", key)))
    }

    /// Environment module for a tool, if any.
    pub fn package(&self, tool: &str) -> Option<&str> {
        self.packages.get(tool).map(String::as_str)
    }

    /// Get a parameter value from a tool block.
    ///
    /// # Example
    ///
    /// ``` rust, ignore
    /// let value = config.get_param("salmon", "mean");
    /// ```
    pub fn get_param(&self, tool: &str, key: &str) -> Option<&ParamValue> {
        self.params.get(tool).and_then(|params| params.get(key))
    }

    /// Same as [`Config::get_param`] but missing keys are an error.
    pub fn require_param(&self, tool: &str, key: &str) -> Result<&ParamValue> {
        self.get_param(tool, key)
            .ok_or_else(|| PipeError::MissingKey(format!("{}.{}", tool, key)))
    }

    /// Integer parameter with a fallback for absent keys. A present
    /// value of the wrong type is an error.
    pub fn int_or(&self, tool: &str, key: &str, default: i64) -> Result<i64> {
        match self.get_param(tool, key) {
            None => Ok(default),
            Some(value) => value.to_int().ok_or_else(|| PipeError::InvalidValue {
                key: format!("{}.{}", tool, key),
                msg: format!("expected an integer, got '{}'", value),
            }),
        }
    }

    /// String parameter with a fallback for absent keys. Scalars of
    /// any type are rendered as strings.
    pub fn str_or(&self, tool: &str, key: &str, default: &str) -> String {
        self.get_param(tool, key)
            .map(|value| value.to_string())
            .unwrap_or_else(|| default.to_string())
    }

    /// Flattened extra CLI arguments of a tool block, excluding the keys
    /// the rule already consumes.
    ///
    /// # Example
    ///
    /// ``` rust, ignore
    /// let extra = config.get_step_args("salmon", &["mean", "sd"]);
    /// ```
    pub fn get_step_args(&self, tool: &str, exclude: &[&str]) -> String {
        self.params
            .get(tool)
            .map(|params| params.flat(exclude))
            .unwrap_or_default()
    }
}

/// A directory entry: either a single path or a map of
/// location kinds (`work`, `scratch`, `naive`) to paths.
#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum Directory {
    Path(String),
    Roles(IndexMap<String, String>),
}

/// A struct representing the parameter block of a tool.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(transparent)]
pub struct StepParams {
    values: IndexMap<String, ParamValue>,
}

impl StepParams {
    /// Flatten the parameters into a single string for CLI execution.
    ///
    /// # Note
    ///
    /// Keys of 2 or less characters are short flags (`-k value`), longer
    /// keys are long flags (`--key value`). `true` booleans become bare
    /// switches and `false` booleans are dropped.
    ///
    /// # Example
    ///
    /// ``` rust, ignore
    /// let flat = params.flat(&["mean"]);
    /// assert_eq!(flat, "--validateMappings -k 31");
    /// ```
    pub fn flat(&self, exclude: &[&str]) -> String {
        self.values
            .iter()
            .filter(|(key, _)| !exclude.contains(&key.as_str()))
            .filter_map(|(key, value)| {
                let flag = if key.len() > 2 {
                    format!("--{}", key)
                } else {
                    format!("-{}", key)
                };

                match value {
                    ParamValue::Bool(true) => Some(flag),
                    ParamValue::Bool(false) => None,
                    other => Some(format!("{} {}", flag, other)),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.values.get(key)
    }
}

/// Represents a parameter value for any tool
///
/// # Example
///
/// ``` rust, ignore
/// let value = ParamValue::Int(1);
///
/// assert_eq!(value.to_int(), Some(1));
/// ```
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl ParamValue {
    pub fn to_int(&self) -> Option<i64> {
        match self {
            ParamValue::Int(i) => Some(*i),
            ParamValue::Str(s) => s.parse().ok(),
            _ => None,
        }
    }
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamValue::Int(i) => write!(f, "{}", i),
            ParamValue::Float(flt) => write!(f, "{}", flt),
            ParamValue::Bool(b) => write!(f, "{}", b),
            ParamValue::Str(s) => write!(f, "{}", s),
        }
    }
}
