//! The CloudFormation template document.

use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

use crate::error::{Error, Result};
use crate::intrinsics::{self, ProcessorOptions};
use crate::resources::envelope::{self, Envelope};
use crate::resources::Resource;

pub const DEFAULT_FORMAT_VERSION: &str = "2010-09-09";

/// A CloudFormation template.
///
/// Sections are kept as generic JSON so that any resource type can be
/// carried. Typed access goes through [`Template::get`] and
/// [`Template::get_all`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Template {
    #[serde(
        rename = "AWSTemplateFormatVersion",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub aws_template_format_version: Option<String>,
    #[serde(rename = "Transform", default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<Value>,
    #[serde(rename = "Description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "Metadata", default, skip_serializing_if = "IndexMap::is_empty")]
    pub metadata: IndexMap<String, Value>,
    #[serde(rename = "Parameters", default, skip_serializing_if = "IndexMap::is_empty")]
    pub parameters: IndexMap<String, Value>,
    #[serde(rename = "Mappings", default, skip_serializing_if = "IndexMap::is_empty")]
    pub mappings: IndexMap<String, Value>,
    #[serde(rename = "Conditions", default, skip_serializing_if = "IndexMap::is_empty")]
    pub conditions: IndexMap<String, Value>,
    #[serde(rename = "Resources", default, skip_serializing_if = "IndexMap::is_empty")]
    pub resources: IndexMap<String, Value>,
    #[serde(rename = "Outputs", default, skip_serializing_if = "IndexMap::is_empty")]
    pub outputs: IndexMap<String, Value>,
    /// The SAM `Globals` section.
    #[serde(rename = "Globals", default, skip_serializing_if = "IndexMap::is_empty")]
    pub globals: IndexMap<String, Value>,
    /// Any other top-level section (`Rules`, `Hooks`, ...), kept as-is.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// Template file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

impl Format {
    /// Guess the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "json" | "template" => Some(Format::Json),
            "yaml" | "yml" => Some(Format::Yaml),
            _ => None,
        }
    }
}

impl Template {
    /// An empty template with the current format version.
    pub fn new() -> Self {
        Self {
            aws_template_format_version: Some(DEFAULT_FORMAT_VERSION.to_string()),
            ..Default::default()
        }
    }

    /// Parse a JSON template, resolving intrinsic functions with the
    /// default options.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        Self::from_json_with_options(data, &ProcessorOptions::default())
    }

    pub fn from_json_with_options(data: &[u8], options: &ProcessorOptions) -> Result<Self> {
        let processed = intrinsics::process_json(data, Some(options))?;
        Ok(serde_json::from_slice(&processed)?)
    }

    /// Parse a YAML template, resolving intrinsic functions with the
    /// default options.
    pub fn from_yaml(data: &[u8]) -> Result<Self> {
        Self::from_yaml_with_options(data, &ProcessorOptions::default())
    }

    pub fn from_yaml_with_options(data: &[u8], options: &ProcessorOptions) -> Result<Self> {
        let processed = intrinsics::process_yaml(data, Some(options))?;
        Ok(serde_json::from_slice(&processed)?)
    }

    /// Read a template from disk. The format is chosen by file extension:
    /// `.json` and `.template` are JSON, `.yaml` and `.yml` are YAML.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_options(path, &ProcessorOptions::default())
    }

    pub fn open_with_options(path: impl AsRef<Path>, options: &ProcessorOptions) -> Result<Self> {
        let path = path.as_ref();
        let format =
            Format::from_path(path).ok_or_else(|| Error::UnknownFormat(path.to_path_buf()))?;
        let data = std::fs::read(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;

        match format {
            Format::Json => Self::from_json_with_options(&data, options),
            Format::Yaml => Self::from_yaml_with_options(&data, options),
        }
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yml::to_string(self)?)
    }

    /// The `Type` of the resource with this logical name.
    pub fn resource_type(&self, name: &str) -> Option<&str> {
        self.resources.get(name)?.get("Type")?.as_str()
    }

    /// Look up a resource by logical name, decoded as `R`.
    ///
    /// Fails with [`Error::ResourceNotFound`] when no resource has this name
    /// or its type is not `R::TYPE`.
    pub fn get<R: Resource>(&self, name: &str) -> Result<R> {
        self.get_envelope::<R>(name)
            .map(|envelope| envelope.properties)
    }

    /// Like [`Template::get`], keeping the resource attributes.
    pub fn get_envelope<R: Resource>(&self, name: &str) -> Result<Envelope<R>> {
        if self.resource_type(name) != Some(R::TYPE) {
            return Err(Error::ResourceNotFound {
                name: name.to_string(),
                type_name: R::TYPE.to_string(),
            });
        }

        let value = &self.resources[name];
        envelope::decode::<Envelope<R>>(value).map_err(|source| Error::Decode {
            name: name.to_string(),
            type_name: R::TYPE.to_string(),
            source,
        })
    }

    /// Every resource of type `R`, keyed by logical name.
    ///
    /// Entries whose `Type` matches but which fail to decode are skipped.
    pub fn get_all<R: Resource>(&self) -> IndexMap<String, R> {
        self.resources
            .iter()
            .filter(|(_, value)| value.get("Type").and_then(Value::as_str) == Some(R::TYPE))
            .filter_map(|(name, value)| match envelope::unmarshal::<R>(value) {
                Ok(resource) => Some((name.clone(), resource)),
                Err(err) => {
                    debug!("Skipping {} ({}): {}", name, R::TYPE, err);
                    None
                }
            })
            .collect()
    }

    /// Add or replace a resource.
    pub fn set<R: Resource>(&mut self, name: impl Into<String>, resource: &R) -> Result<()> {
        self.resources
            .insert(name.into(), envelope::marshal(resource)?);
        Ok(())
    }

    /// Add or replace a resource together with its attributes.
    pub fn set_envelope<R: Resource>(
        &mut self,
        name: impl Into<String>,
        envelope: &Envelope<R>,
    ) -> Result<()> {
        self.resources
            .insert(name.into(), serde_json::to_value(envelope)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::s3::Bucket;
    use crate::resources::serverless::{Function, Policies};
    use crate::resources::sns::Topic;
    use crate::resources::{DependsOn, ResourceAttributes};
    use serde_json::json;
    use std::io::Write;

    fn sample() -> Template {
        let json = json!({
            "AWSTemplateFormatVersion": "2010-09-09",
            "Resources": {
                "Logs": {"Type": "AWS::S3::Bucket", "Properties": {"BucketName": "logs"}},
                "Site": {"Type": "AWS::S3::Bucket"},
                "Broken": {"Type": "AWS::S3::Bucket", "Properties": {"BucketName": 7}},
                "Alerts": {"Type": "AWS::SNS::Topic", "Properties": {"DisplayName": "alerts"}}
            }
        });
        Template::from_json(json.to_string().as_bytes()).unwrap()
    }

    #[test]
    fn test_new() {
        let template = Template::new();
        assert_eq!(template.aws_template_format_version.as_deref(), Some("2010-09-09"));
        assert_eq!(template.to_json().unwrap(), br#"{"AWSTemplateFormatVersion":"2010-09-09"}"#);
    }

    #[test]
    fn test_get_by_name() {
        let template = sample();
        let bucket: Bucket = template.get("Logs").unwrap();
        assert_eq!(bucket.bucket_name.as_deref(), Some("logs"));
        let site: Bucket = template.get("Site").unwrap();
        assert_eq!(site, Bucket::default());
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let template = sample();
        let err = template.get::<Bucket>("Nope").unwrap_err();
        assert!(matches!(
            err,
            Error::ResourceNotFound { ref name, ref type_name }
                if name == "Nope" && type_name == "AWS::S3::Bucket"
        ));
    }

    #[test]
    fn test_get_wrong_type_is_not_found() {
        let template = sample();
        let err = template.get::<Topic>("Logs").unwrap_err();
        assert!(matches!(err, Error::ResourceNotFound { .. }));
    }

    #[test]
    fn test_get_absent_type_is_not_found() {
        let template = sample();
        assert!(template.get_all::<Function>().is_empty());
        let err = template.get::<Function>("Logs").unwrap_err();
        assert!(matches!(err, Error::ResourceNotFound { .. }));
    }

    #[test]
    fn test_get_undecodable_is_decode_error() {
        let template = sample();
        let err = template.get::<Bucket>("Broken").unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }

    #[test]
    fn test_get_all_skips_undecodable() {
        let template = sample();
        let buckets = template.get_all::<Bucket>();
        let names: Vec<&str> = buckets.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["Logs", "Site"]);

        let topics = template.get_all::<Topic>();
        assert_eq!(topics["Alerts"].display_name.as_deref(), Some("alerts"));
    }

    #[test]
    fn test_set_then_get() {
        let mut template = Template::new();
        let function = Function {
            handler: Some("index.handler".to_string()),
            policies: Some(Policies::String("AWSLambdaExecute".to_string())),
            ..Default::default()
        };
        template.set("Fn", &function).unwrap();
        assert_eq!(template.resource_type("Fn"), Some("AWS::Serverless::Function"));
        assert_eq!(template.get::<Function>("Fn").unwrap(), function);
    }

    #[test]
    fn test_set_envelope_keeps_attributes() {
        let mut template = Template::new();
        let envelope = Envelope::new(Bucket::default()).with_attributes(ResourceAttributes {
            depends_on: Some(DependsOn::One("Key".to_string())),
            ..Default::default()
        });
        template.set_envelope("Data", &envelope).unwrap();
        assert_eq!(template.resources["Data"]["DependsOn"], json!("Key"));
        assert_eq!(template.get_envelope::<Bucket>("Data").unwrap(), envelope);
    }

    #[test]
    fn test_from_json_resolves_intrinsics() {
        let data = json!({
            "Parameters": {"Name": {"Type": "String", "Default": "assets"}},
            "Resources": {
                "Bucket": {
                    "Type": "AWS::S3::Bucket",
                    "Properties": {
                        "BucketName": {"Fn::Sub": "${Name}-${AWS::Region}"},
                        "AccessControl": {"Ref": "AWS::NoValue"}
                    }
                }
            }
        });
        let options = ProcessorOptions::default().with_parameter("Name", "media");
        let template = Template::from_json_with_options(data.to_string().as_bytes(), &options).unwrap();
        let bucket: Bucket = template.get("Bucket").unwrap();
        assert_eq!(bucket.bucket_name.as_deref(), Some("media-us-east-1"));
        assert_eq!(bucket.access_control, None);
    }

    #[test]
    fn test_unmodelled_sections_survive() {
        let data = json!({
            "Transform": "AWS::Serverless-2016-10-31",
            "Globals": {"Function": {"Timeout": 30, "Runtime": {"Ref": "AWS::NoValue"}}},
            "Rules": {"ProdOnly": {"Assertions": [{"Assert": {"Fn::Equals": ["a", "a"]}}]}},
            "Resources": {"Logs": {"Type": "AWS::S3::Bucket"}}
        });
        let template = Template::from_json(data.to_string().as_bytes()).unwrap();
        assert_eq!(template.globals["Function"], json!({"Timeout": 30}));
        assert_eq!(
            template.extra["Rules"],
            json!({"ProdOnly": {"Assertions": [{"Assert": true}]}})
        );

        let output: Value = serde_json::from_slice(&template.to_json().unwrap()).unwrap();
        assert_eq!(output["Globals"], json!({"Function": {"Timeout": 30}}));
        assert_eq!(output["Rules"], template.extra["Rules"]);
        assert_eq!(output["Resources"], data["Resources"]);
    }

    #[test]
    fn test_from_json_malformed() {
        assert!(matches!(Template::from_json(b"{").unwrap_err(), Error::Json(_)));
    }

    #[test]
    fn test_from_yaml() {
        let yaml = br#"
AWSTemplateFormatVersion: "2010-09-09"
Description: Site bucket
Resources:
  Site:
    Type: AWS::S3::Bucket
    Properties:
      BucketName: !Join
        - "-"
        - - site
          - !Ref AWS::AccountId
"#;
        let template = Template::from_yaml(yaml).unwrap();
        assert_eq!(template.description.as_deref(), Some("Site bucket"));
        let bucket: Bucket = template.get("Site").unwrap();
        assert_eq!(bucket.bucket_name.as_deref(), Some("site-123456789012"));
    }

    #[test]
    fn test_yaml_output_parses_back() {
        let template = sample();
        let yaml = template.to_yaml().unwrap();
        let reparsed = Template::from_yaml(yaml.as_bytes()).unwrap();
        assert_eq!(reparsed, template);
    }

    #[test]
    fn test_open_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let json_path = dir.path().join("stack.json");
        std::fs::write(
            &json_path,
            r#"{"Resources": {"T": {"Type": "AWS::SNS::Topic", "Properties": {"TopicName": {"Ref": "AWS::StackName"}}}}}"#,
        )
        .unwrap();
        let topic: Topic = Template::open(&json_path).unwrap().get("T").unwrap();
        assert_eq!(topic.topic_name.as_deref(), Some("cfn-resolve-stack"));

        let yaml_path = dir.path().join("stack.yml");
        let mut file = std::fs::File::create(&yaml_path).unwrap();
        writeln!(file, "Resources:\n  T:\n    Type: AWS::SNS::Topic\n    Properties:\n      TopicName: !Ref AWS::Region").unwrap();
        let topic: Topic = Template::open(&yaml_path).unwrap().get("T").unwrap();
        assert_eq!(topic.topic_name.as_deref(), Some("us-east-1"));
    }

    #[test]
    fn test_open_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stack.txt");
        std::fs::write(&path, "{}").unwrap();
        assert!(matches!(Template::open(&path).unwrap_err(), Error::UnknownFormat(_)));
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Template::open(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
