//! Typed CloudFormation resources.
//!
//! Every resource type follows the same pattern: a plain data struct with
//! PascalCase fields, a constant type name, and the shared `{Type,
//! Properties}` envelope in [`envelope`]. The types in this module cover a
//! handful of common resources. Others can be added by implementing
//! [`Resource`] on any serde type.

pub mod envelope;
pub mod s3;
pub mod serverless;
pub mod sns;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub use envelope::{marshal, unmarshal, DependsOn, Envelope, ResourceAttributes};

/// A CloudFormation resource type.
pub trait Resource: Serialize + DeserializeOwned + Default {
    /// The `Type` tag, e.g. `AWS::S3::Bucket`.
    const TYPE: &'static str;

    fn aws_cloudformation_type(&self) -> &'static str {
        Self::TYPE
    }
}

/// Key/value tag used by most AWS resource types.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Name of a JSON value's kind, for decode errors.
pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
