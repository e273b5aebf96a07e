use serde_json::{Map, Number, Value as JsonValue};
use serde_yml::Value as YamlValue;

use super::errors::{InternalError, Result};
use super::mappings::short_form_to_long;

/// Convert a parsed YAML value into JSON, expanding short-form intrinsic
/// tags into their long-form single-key objects.
pub(crate) fn to_json_value(value: YamlValue) -> Result<JsonValue> {
    match value {
        YamlValue::Null => Ok(JsonValue::Null),
        YamlValue::Bool(b) => Ok(JsonValue::Bool(b)),
        YamlValue::Number(n) => Ok(number_to_json(&n)),
        YamlValue::String(s) => Ok(JsonValue::String(s)),
        YamlValue::Sequence(seq) => seq
            .into_iter()
            .map(to_json_value)
            .collect::<Result<Vec<_>>>()
            .map(JsonValue::Array),
        YamlValue::Mapping(mapping) => {
            let mut obj = Map::new();
            for (key, value) in mapping {
                obj.insert(key_to_string(key)?, to_json_value(value)?);
            }
            Ok(JsonValue::Object(obj))
        }
        YamlValue::Tagged(tagged) => {
            let tag = tagged.tag.to_string();
            let name = tag.trim_start_matches('!');
            let long = short_form_to_long(name)
                .ok_or_else(|| InternalError::UnknownTag(name.to_string()))?;

            let inner = match (long, tagged.value) {
                // !GetAtt Resource.Attribute is shorthand for [Resource, Attribute]
                ("Fn::GetAtt", YamlValue::String(s)) => match s.split_once('.') {
                    Some((resource, attribute)) => JsonValue::Array(vec![
                        JsonValue::String(resource.to_string()),
                        JsonValue::String(attribute.to_string()),
                    ]),
                    None => JsonValue::String(s),
                },
                (_, value) => to_json_value(value)?,
            };

            let mut obj = Map::new();
            obj.insert(long.to_string(), inner);
            Ok(JsonValue::Object(obj))
        }
    }
}

fn number_to_json(n: &serde_yml::Number) -> JsonValue {
    if let Some(i) = n.as_i64() {
        JsonValue::Number(i.into())
    } else if let Some(u) = n.as_u64() {
        JsonValue::Number(u.into())
    } else {
        n.as_f64()
            .and_then(Number::from_f64)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null)
    }
}

fn key_to_string(key: YamlValue) -> Result<String> {
    match key {
        YamlValue::String(s) => Ok(s),
        YamlValue::Number(n) => Ok(n.to_string()),
        YamlValue::Bool(b) => Ok(b.to_string()),
        YamlValue::Null => Ok("null".to_string()),
        YamlValue::Sequence(_) => Err(InternalError::InvalidKeyType("sequence".into()).into()),
        YamlValue::Mapping(_) => Err(InternalError::InvalidKeyType("mapping".into()).into()),
        YamlValue::Tagged(_) => Err(InternalError::InvalidKeyType("tagged value".into()).into()),
    }
}
