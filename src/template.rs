//! Typed path templates with `{name}` placeholders.
//!
//! A template is compiled once against a [`Schema`] listing which
//! placeholders it must and may contain, so a pattern that can never
//! produce a unique path per sample is rejected before any job is built.
//! Rendering is a pure string substitution and never touches the
//! filesystem. `{{` and `}}` escape literal braces.

use hashbrown::HashMap;

use std::path::{Path, PathBuf};

use crate::consts::*;
use crate::error::{PipeError, Result};
use crate::sample::SampleId;

/// Placeholder name -> value.
pub type Bindings = HashMap<&'static str, String>;

/// Which placeholders a template must contain and which it may contain.
#[derive(Debug, Clone, Copy)]
pub struct Schema {
    pub required: &'static [&'static str],
    pub optional: &'static [&'static str],
}

impl Schema {
    fn allows(&self, name: &str) -> bool {
        self.required.contains(&name) || self.optional.contains(&name)
    }
}

/// One file per sample, named by the full identifier.
pub const PER_SAMPLE: Schema = Schema {
    required: &[SAMPLE],
    optional: &[GROUP, KEY],
};

/// Raw reads, laid out as `{group}/{key}_{read}`.
pub const PER_READ: Schema = Schema {
    required: &[GROUP, KEY, READ],
    optional: &[SAMPLE],
};

pub const PER_CONDITION: Schema = Schema {
    required: &[CONDITION],
    optional: &[],
};

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

#[derive(Debug, Clone)]
pub struct PathTemplate {
    pattern: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    /// Parse `pattern` and check its placeholders against `schema`.
    ///
    /// # Example
    ///
    /// ``` rust, ignore
    /// let template = PathTemplate::compile("out/{sample}/result.txt", &PER_SAMPLE)?;
    /// ```
    pub fn compile(pattern: &str, schema: &Schema) -> Result<Self> {
        let segments = parse(pattern)?;

        for segment in &segments {
            if let Segment::Placeholder(name) = segment {
                if !schema.allows(name) {
                    return Err(PipeError::template(
                        pattern,
                        format!("unexpected placeholder '{{{}}}'", name),
                    ));
                }
            }
        }

        for required in schema.required {
            let present = segments
                .iter()
                .any(|s| matches!(s, Segment::Placeholder(name) if name == required));

            if !present {
                return Err(PipeError::template(
                    pattern,
                    format!("missing placeholder '{{{}}}'", required),
                ));
            }
        }

        Ok(Self {
            pattern: pattern.to_string(),
            segments,
        })
    }

    /// Compile `tail` joined under a configured directory.
    ///
    /// # Example
    ///
    /// ``` rust, ignore
    /// let dir = config.dir("salmon", "work")?;
    /// let quant = PathTemplate::under(&dir, "{sample}/quant.sf", &PER_SAMPLE)?;
    /// ```
    pub fn under(dir: &Path, tail: &str, schema: &Schema) -> Result<Self> {
        let pattern = dir.join(tail);
        Self::compile(&pattern.to_string_lossy(), schema)
    }

    /// Substitute every placeholder from `bindings`.
    pub fn render(&self, bindings: &Bindings) -> Result<PathBuf> {
        let mut rendered = String::with_capacity(self.pattern.len());

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => rendered.push_str(text),
                Segment::Placeholder(name) => {
                    let value = bindings.get(name.as_str()).ok_or_else(|| {
                        PipeError::template(&self.pattern, format!("no value for '{{{}}}'", name))
                    })?;
                    rendered.push_str(value);
                }
            }
        }

        Ok(PathBuf::from(rendered))
    }

    pub fn render_sample(&self, id: &SampleId) -> Result<PathBuf> {
        self.render(&id.bindings())
    }
}

/// Render `template` once per identifier, in identifier order.
///
/// # Example
///
/// ``` rust, ignore
/// let targets = expand(&template, &ids)?;
/// ```
pub fn expand(template: &PathTemplate, ids: &[SampleId]) -> Result<Vec<PathBuf>> {
    ids.iter().map(|id| template.render_sample(id)).collect()
}

fn parse(pattern: &str) -> Result<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                literal.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                literal.push('}');
            }
            '{' => {
                let mut name = String::new();
                let mut closed = false;

                for c in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    name.push(c);
                }

                if !closed {
                    return Err(PipeError::template(pattern, "unclosed '{'"));
                }
                if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
                {
                    return Err(PipeError::template(
                        pattern,
                        format!("invalid placeholder name '{}'", name),
                    ));
                }

                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Placeholder(name));
            }
            '}' => return Err(PipeError::template(pattern, "unmatched '}'")),
            _ => literal.push(c),
        }
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }

    Ok(segments)
}
