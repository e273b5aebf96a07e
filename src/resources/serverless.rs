//! `AWS::Serverless::*` resources from the SAM transform.
//!
//! Several SAM properties accept more than one shape. Those are modelled as
//! enums and decoded by looking at the kind of JSON value present.

use indexmap::IndexMap;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::{json_kind, Resource};

/// `AWS::Serverless::Function`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Function {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handler: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_uri: Option<CodeUri>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_size: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policies: Option<Policies>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<FunctionEnvironment>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub tags: IndexMap<String, String>,
}

impl Resource for Function {
    const TYPE: &'static str = "AWS::Serverless::Function";
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FunctionEnvironment {
    #[serde(default)]
    pub variables: IndexMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct S3Location {
    pub bucket: String,
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
}

/// `CodeUri`: an `s3://` URI or local path, or an S3 location object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CodeUri {
    Uri(String),
    S3Location(S3Location),
}

impl<'de> Deserialize<'de> for CodeUri {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        match value {
            Value::String(uri) => Ok(CodeUri::Uri(uri)),
            Value::Object(_) => serde_json::from_value(value)
                .map(CodeUri::S3Location)
                .map_err(D::Error::custom),
            other => Err(D::Error::custom(format!(
                "CodeUri must be a string or an S3 location, found {}",
                json_kind(&other)
            ))),
        }
    }
}

/// An IAM policy document.
///
/// `Statement` is kept as raw JSON since it may be a single statement or a
/// list of them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IamPolicyDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub statement: Value,
}

/// A SAM policy template such as `{"DynamoDBCrudPolicy": {"TableName": ...}}`,
/// keyed by template name.
pub type PolicyTemplate = IndexMap<String, Value>;

/// One entry of a `Policies` list that mixes shapes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PolicyEntry {
    Name(String),
    Document(IamPolicyDocument),
    Template(PolicyTemplate),
}

impl<'de> Deserialize<'de> for PolicyEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        match value {
            Value::String(name) => Ok(PolicyEntry::Name(name)),
            Value::Object(_) if is_document(&value) => serde_json::from_value(value)
                .map(PolicyEntry::Document)
                .map_err(D::Error::custom),
            Value::Object(_) => serde_json::from_value(value)
                .map(PolicyEntry::Template)
                .map_err(D::Error::custom),
            other => Err(D::Error::custom(format!(
                "policy must be a name, a policy document, or a policy template, found {}",
                json_kind(&other)
            ))),
        }
    }
}

/// `Policies`: a managed policy name, a policy document, a policy template,
/// or a list of those.
///
/// Lists of a single shape decode to `Strings` or `Documents`; anything else
/// decodes to `Entries`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Policies {
    String(String),
    Strings(Vec<String>),
    Document(IamPolicyDocument),
    Documents(Vec<IamPolicyDocument>),
    Template(PolicyTemplate),
    Entries(Vec<PolicyEntry>),
}

fn is_document(value: &Value) -> bool {
    value.get("Statement").is_some()
}

impl<'de> Deserialize<'de> for Policies {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        match value {
            Value::String(name) => Ok(Policies::String(name)),
            Value::Object(_) if is_document(&value) => serde_json::from_value(value)
                .map(Policies::Document)
                .map_err(D::Error::custom),
            Value::Object(_) => serde_json::from_value(value)
                .map(Policies::Template)
                .map_err(D::Error::custom),
            Value::Array(items) if items.iter().all(Value::is_string) => {
                serde_json::from_value(Value::Array(items))
                    .map(Policies::Strings)
                    .map_err(D::Error::custom)
            }
            Value::Array(items) if !items.is_empty() && items.iter().all(is_document) => {
                serde_json::from_value(Value::Array(items))
                    .map(Policies::Documents)
                    .map_err(D::Error::custom)
            }
            Value::Array(items) => serde_json::from_value(Value::Array(items))
                .map(Policies::Entries)
                .map_err(D::Error::custom),
            other => Err(D::Error::custom(format!(
                "Policies must be a string, a list, a policy document, or a policy template, found {}",
                json_kind(&other)
            ))),
        }
    }
}
