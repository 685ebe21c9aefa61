//! Module templates
//!
//! A read-only, name-keyed table supplying the default color, team, kind and
//! task list for a module name. A missing template is not an error: callers
//! fall back to [`FALLBACK_COLOR`], [`FALLBACK_TEAM`] and [`FALLBACK_KIND`].

use crate::error::TemplateError;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Color used when no template matches
pub const FALLBACK_COLOR: &str = "#579bfc";

/// Team used when no template matches
pub const FALLBACK_TEAM: &str = "General";

/// Kind used when no template matches
pub const FALLBACK_KIND: &str = "custom";

/// Default definition of a task created from a template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDefinition {
    /// Task name
    pub name: String,
    /// Sub-task names
    #[serde(default)]
    pub subtasks: Vec<String>,
}

impl TaskDefinition {
    /// Create a definition without sub-tasks
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subtasks: Vec::new(),
        }
    }

    /// With sub-task names
    #[must_use]
    pub fn with_subtasks<I, S>(mut self, subtasks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subtasks = subtasks.into_iter().map(Into::into).collect();
        self
    }
}

/// Defaults for modules of a given name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleTemplate {
    /// Template name, matched against module names and group titles
    pub name: String,
    /// Module classification
    #[serde(default = "default_kind")]
    pub kind: String,
    /// Display color (hex)
    #[serde(default = "default_color")]
    pub color: String,
    /// Owning team
    #[serde(default = "default_team")]
    pub team: String,
    /// Tasks created with the module
    #[serde(default)]
    pub tasks: Vec<TaskDefinition>,
}

fn default_kind() -> String {
    FALLBACK_KIND.to_string()
}

fn default_color() -> String {
    FALLBACK_COLOR.to_string()
}

fn default_team() -> String {
    FALLBACK_TEAM.to_string()
}

/// Read-only template lookup capability
pub trait TemplateLookup: Send + Sync + Debug {
    /// Find the template for a module name
    fn find_by_name(&self, name: &str) -> Option<ModuleTemplate>;
}

/// In-memory template table
///
/// Names match case-insensitively after trimming.
#[derive(Debug, Clone, Default)]
pub struct StaticTemplates {
    templates: Vec<ModuleTemplate>,
}

#[derive(Deserialize)]
struct TemplateFile {
    templates: Vec<ModuleTemplate>,
}

impl StaticTemplates {
    /// Create from a list of templates
    #[inline]
    #[must_use]
    pub fn new(templates: Vec<ModuleTemplate>) -> Self {
        Self { templates }
    }

    /// Parse a YAML document with a top-level `templates` list
    ///
    /// # Errors
    /// - `TemplateError::Yaml` if the document is malformed
    /// - `TemplateError::DuplicateName` if two templates share a name
    pub fn from_yaml_str(yaml: &str) -> Result<Self, TemplateError> {
        let file: TemplateFile = serde_yaml::from_str(yaml)?;

        let mut seen = std::collections::HashSet::new();
        for template in &file.templates {
            if !seen.insert(normalize(&template.name)) {
                return Err(TemplateError::DuplicateName(template.name.clone()));
            }
        }

        Ok(Self::new(file.templates))
    }

    /// Number of templates
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Whether the table is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Iterate over template names
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.iter().map(|t| t.name.as_str())
    }
}

impl TemplateLookup for StaticTemplates {
    fn find_by_name(&self, name: &str) -> Option<ModuleTemplate> {
        let wanted = normalize(name);
        self.templates
            .iter()
            .find(|t| normalize(&t.name) == wanted)
            .cloned()
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}
