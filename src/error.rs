//! Crate-wide error type.

use std::path::PathBuf;
use thiserror::Error;

use crate::cfn_yaml;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by template loading, processing and typed lookups.
///
/// Unresolvable intrinsic functions are never reported here; they resolve
/// to `null` or an empty string instead.
#[derive(Debug, Error)]
pub enum Error {
    /// The input was not valid JSON, or a value could not be serialised.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The input was not a valid CloudFormation YAML document.
    #[error("invalid YAML: {0}")]
    Yaml(#[from] cfn_yaml::Error),

    /// Emitting YAML failed.
    #[error("failed to emit YAML: {0}")]
    YamlEmit(#[from] serde_yml::Error),

    /// Reading a template from disk failed.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The template file extension is neither JSON nor YAML.
    #[error("unrecognised template format: {}", .0.display())]
    UnknownFormat(PathBuf),

    /// No resource with this logical name and type exists in the template.
    #[error("resource {name:?} of type {type_name} not found")]
    ResourceNotFound { name: String, type_name: String },

    /// A resource with a matching type tag failed to decode.
    #[error("resource {name:?} of type {type_name} could not be decoded: {source}")]
    Decode {
        name: String,
        type_name: String,
        #[source]
        source: serde_json::Error,
    },
}
