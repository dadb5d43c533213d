use hashbrown::HashSet;
use indexmap::IndexMap;

use crate::consts::*;
use crate::error::{PipeError, Result};
use crate::template::Bindings;

/// A sample identifier: `{group}_{key}`.
///
/// # Example
///
/// ``` rust, ignore
/// let id = SampleId::new("brain", "s1");
/// assert_eq!(id.as_str(), "brain_s1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SampleId {
    group: String,
    key: String,
    id: String,
}

impl SampleId {
    pub fn new(group: &str, key: &str) -> Self {
        Self {
            group: group.to_string(),
            key: key.to_string(),
            id: format!("{}_{}", group, key),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.id
    }

    /// Placeholder bindings for this sample: `sample`, `group` and `key`.
    pub fn bindings(&self) -> Bindings {
        let mut bindings = Bindings::new();
        bindings.insert(SAMPLE, self.id.clone());
        bindings.insert(GROUP, self.group.clone());
        bindings.insert(KEY, self.key.clone());

        bindings
    }
}

impl std::fmt::Display for SampleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// Derive one identifier per (group, sample) pair, groups first and
/// samples within each group in configuration order.
///
/// Two pairs that join to the same identifier are rejected.
///
/// # Example
///
/// ``` rust, ignore
/// let ids = derive_sample_ids(&config.samples)?;
/// ```
pub fn derive_sample_ids(
    samples: &IndexMap<String, IndexMap<String, String>>,
) -> Result<Vec<SampleId>> {
    let mut seen = HashSet::new();
    let mut ids = Vec::with_capacity(samples.values().map(IndexMap::len).sum());

    for (group, members) in samples {
        for key in members.keys() {
            let id = SampleId::new(group, key);

            if !seen.insert(id.as_str().to_string()) {
                return Err(PipeError::DuplicateSample {
                    id: id.as_str().to_string(),
                    group: group.clone(),
                    sample: key.clone(),
                });
            }

            ids.push(id);
        }
    }

    log::info!(
        "INFO [SAMPLES]: {} samples -> {:?}",
        ids.len(),
        ids.iter().map(SampleId::as_str).collect::<Vec<_>>()
    );

    Ok(ids)
}

/// Condition names in configuration order. Every condition needs
/// a matching entry in `annotations`.
pub fn derive_conditions(
    conditions: &IndexMap<String, String>,
    annotations: &IndexMap<String, String>,
) -> Result<Vec<String>> {
    conditions
        .keys()
        .map(|condition| {
            if annotations.contains_key(condition) {
                Ok(condition.clone())
            } else {
                Err(PipeError::MissingKey(format!(
                    "{}.{}",
                    ANNOTATIONS, condition
                )))
            }
        })
        .collect()
}
