//! CloudFormation YAML loading.
//!
//! Templates written in YAML may use the short-form intrinsic tags
//! (`!Ref`, `!Sub`, `!GetAtt`, ...). These are expanded to the long-form
//! JSON objects so that the rest of the crate only ever sees JSON values.

mod convert;
mod errors;
mod mappings;

pub use errors::{Error, InternalError};

/// Parse CloudFormation YAML and convert to serde_json::Value
pub fn parse_yaml_to_json(yaml_str: &str) -> errors::Result<serde_json::Value> {
    let value: serde_yml::Value = serde_yml::from_str(yaml_str)?;
    convert::to_json_value(value)
}
