//! The `{Type, Properties}` wire shape shared by every resource.

use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::Resource;

/// Resource attributes that sit beside `Type` and `Properties`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<DependsOn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletion_policy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_replace_policy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

/// `DependsOn` may name a single resource or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DependsOn {
    One(String),
    Many(Vec<String>),
}

impl DependsOn {
    pub fn names(&self) -> Vec<&str> {
        match self {
            DependsOn::One(name) => vec![name.as_str()],
            DependsOn::Many(names) => names.iter().map(String::as_str).collect(),
        }
    }
}

/// A typed resource together with its attributes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Envelope<R> {
    pub properties: R,
    pub attributes: ResourceAttributes,
}

impl<R: Resource> Envelope<R> {
    pub fn new(properties: R) -> Self {
        Self {
            properties,
            attributes: ResourceAttributes::default(),
        }
    }

    pub fn with_attributes(mut self, attributes: ResourceAttributes) -> Self {
        self.attributes = attributes;
        self
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawEnvelope<P> {
    #[serde(rename = "Type")]
    type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    properties: Option<P>,
    #[serde(flatten)]
    attributes: ResourceAttributes,
}

impl<R: Resource> Serialize for Envelope<R> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        RawEnvelope {
            type_name: R::TYPE.to_string(),
            properties: Some(&self.properties),
            attributes: self.attributes.clone(),
        }
        .serialize(serializer)
    }
}

impl<'de, R: Resource> Deserialize<'de> for Envelope<R> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawEnvelope::<R>::deserialize(deserializer)?;
        if raw.type_name != R::TYPE {
            return Err(de::Error::custom(format!(
                "expected resource type {}, found {}",
                R::TYPE,
                raw.type_name
            )));
        }
        Ok(Envelope {
            properties: raw.properties.unwrap_or_default(),
            attributes: raw.attributes,
        })
    }
}

/// Wrap a resource as `{"Type": ..., "Properties": ...}`.
pub fn marshal<R: Resource>(resource: &R) -> serde_json::Result<Value> {
    serde_json::to_value(RawEnvelope {
        type_name: R::TYPE.to_string(),
        properties: Some(resource),
        attributes: ResourceAttributes::default(),
    })
}

/// Unwrap a resource from its envelope. The `Type` must match `R::TYPE`;
/// a missing `Properties` yields the default resource.
pub fn unmarshal<R: Resource>(value: &Value) -> serde_json::Result<R> {
    decode::<Envelope<R>>(value).map(|envelope| envelope.properties)
}

pub(crate) fn decode<T: DeserializeOwned>(value: &Value) -> serde_json::Result<T> {
    T::deserialize(value)
}
