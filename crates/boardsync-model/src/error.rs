//! Error types for the domain model

/// Template table errors
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// Template document could not be parsed
    #[error("invalid template document: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Two templates share a name
    #[error("duplicate template name: {0}")]
    DuplicateName(String),
}
