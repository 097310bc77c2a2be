pub mod alias;
pub mod functions;
mod parser;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::{info, warn};

use crate::paths;
use crate::sampler::Combination;
use functions::{FunctionError, Functions, Value};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TemplateError {
    #[error("template {template}: parse error at byte {offset}: {message}")]
    Parse {
        template: String,
        offset: usize,
        message: String,
    },
    #[error("template {template}: function {function:?} not defined")]
    UnknownFunction { template: String, function: String },
    #[error("template {template}: no value for field .{field}")]
    MissingField { template: String, field: String },
    #[error("template {template}: {source}")]
    Function {
        template: String,
        #[source]
        source: FunctionError,
    },
    #[error("no template named {0:?}")]
    UnknownTemplate(String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Arg {
    Field(String),
    Literal(Value),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Text(String),
    Field(String),
    Literal(Value),
    Call { name: String, args: Vec<Arg> },
}

/// A parsed prompt template.
///
/// Text with `{{.Field}}` substitutions, `{{fn arg ...}}` calls into
/// [`Functions`], `{{/* comments */}}`, and `{{-`/`-}}` whitespace trimming.
#[derive(Clone, Debug)]
pub struct Template {
    name: String,
    nodes: Vec<Node>,
}

impl Template {
    pub fn parse(name: impl Into<String>, source: &str) -> Result<Self, TemplateError> {
        let name = name.into();
        let nodes = parser::parse(&name, source)?;
        Ok(Self { name, nodes })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Every field referenced, first occurrence order.
    pub fn fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = Vec::new();
        for node in &self.nodes {
            let referenced: Vec<&str> = match node {
                Node::Field(field) => vec![field.as_str()],
                Node::Call { args, .. } => args
                    .iter()
                    .filter_map(|arg| match arg {
                        Arg::Field(field) => Some(field.as_str()),
                        Arg::Literal(_) => None,
                    })
                    .collect(),
                Node::Text(_) | Node::Literal(_) => Vec::new(),
            };
            for field in referenced {
                if !fields.contains(&field) {
                    fields.push(field);
                }
            }
        }
        fields
    }

    pub fn render(
        &self,
        data: &Combination,
        functions: &mut Functions,
    ) -> Result<String, TemplateError> {
        let mut out = String::new();
        for node in &self.nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Field(field) => out.push_str(self.lookup(data, field)?),
                Node::Literal(value) => out.push_str(&value.to_string()),
                Node::Call { name, args } => {
                    let values = args
                        .iter()
                        .map(|arg| match arg {
                            Arg::Field(field) => {
                                self.lookup(data, field).map(|v| Value::Str(v.to_string()))
                            }
                            Arg::Literal(value) => Ok(value.clone()),
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                    let value = functions.call(name, &values).map_err(|source| {
                        TemplateError::Function {
                            template: self.name.clone(),
                            source,
                        }
                    })?;
                    out.push_str(&value.to_string());
                }
            }
        }
        Ok(out)
    }

    fn lookup<'d>(&self, data: &'d Combination, field: &str) -> Result<&'d str, TemplateError> {
        data.get(field)
            .map(String::as_str)
            .ok_or_else(|| TemplateError::MissingField {
                template: self.name.clone(),
                field: field.to_string(),
            })
    }
}

/// Templates keyed by name, iterated in name order.
#[derive(Clone, Debug, Default)]
pub struct TemplateSet {
    templates: BTreeMap<String, Template>,
}

impl TemplateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse every `*.tpl` under `paths` (files or directories). A template's
    /// name is its file name; a later file with the same name replaces an
    /// earlier one. One trailing newline at the end of a file is dropped.
    pub fn load(paths: &[impl AsRef<Path>]) -> Result<Self> {
        let files = paths::expand(paths, "tpl")?;
        if files.is_empty() {
            anyhow::bail!("no template files found");
        }

        let mut set = Self::new();
        for file in &files {
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .with_context(|| format!("template path {} has no file name", file.display()))?;
            let source = fs::read_to_string(file)
                .with_context(|| format!("failed to read template {}", file.display()))?;
            let source = source
                .strip_suffix('\n')
                .map(|s| s.strip_suffix('\r').unwrap_or(s))
                .unwrap_or(&source);
            let template = Template::parse(name, source)
                .with_context(|| format!("failed to parse template {}", file.display()))?;
            if let Some(previous) = set.insert(template) {
                warn!(
                    template = previous.name(),
                    path = %file.display(),
                    "template name loaded twice, keeping the later file"
                );
            }
        }
        info!(templates = set.len(), "loaded templates");
        Ok(set)
    }

    /// Returns the template previously stored under the same name.
    pub fn insert(&mut self, template: Template) -> Option<Template> {
        self.templates.insert(template.name.clone(), template)
    }

    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Template> {
        self.templates.values()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
