use serde_json::Value;

pub const ACCOUNT_ID: &str = "AWS::AccountId";
pub const NOTIFICATION_ARNS: &str = "AWS::NotificationARNs";
pub const NO_VALUE: &str = "AWS::NoValue";
pub const PARTITION: &str = "AWS::Partition";
pub const REGION: &str = "AWS::Region";
pub const STACK_ID: &str = "AWS::StackId";
pub const STACK_NAME: &str = "AWS::StackName";
pub const URL_SUFFIX: &str = "AWS::URLSuffix";

/// Values returned for `Ref` to a pseudo-parameter.
///
/// Templates are resolved outside of a real deployment, so the defaults are
/// stub values:
///
/// | Parameter               | Default                                          |
/// |-------------------------|--------------------------------------------------|
/// | `AWS::AccountId`        | `123456789012`                                   |
/// | `AWS::Region`           | `us-east-1`                                      |
/// | `AWS::StackId`          | `arn:aws:cloudformation:us-east-1:123456789012:stack/MyStack/1c2fa620-982a-11e3-aff7-50e2416294e0` |
/// | `AWS::StackName`        | `cfn-resolve-stack`                              |
/// | `AWS::NotificationARNs` | `["arn:aws:sns:us-east-1:123456789012:MyTopic"]` |
/// | `AWS::Partition`        | `aws`                                            |
/// | `AWS::URLSuffix`        | `amazonaws.com`                                  |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PseudoParameters {
    pub account_id: String,
    pub region: String,
    pub stack_id: String,
    pub stack_name: String,
    pub notification_arns: Vec<String>,
    pub partition: String,
    pub url_suffix: String,
}

impl Default for PseudoParameters {
    fn default() -> Self {
        Self {
            account_id: "123456789012".to_string(),
            region: "us-east-1".to_string(),
            stack_id: "arn:aws:cloudformation:us-east-1:123456789012:stack/MyStack/1c2fa620-982a-11e3-aff7-50e2416294e0".to_string(),
            stack_name: "cfn-resolve-stack".to_string(),
            notification_arns: vec!["arn:aws:sns:us-east-1:123456789012:MyTopic".to_string()],
            partition: "aws".to_string(),
            url_suffix: "amazonaws.com".to_string(),
        }
    }
}

impl PseudoParameters {
    pub fn with_account_id(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = account_id.into();
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_stack_id(mut self, stack_id: impl Into<String>) -> Self {
        self.stack_id = stack_id.into();
        self
    }

    pub fn with_stack_name(mut self, stack_name: impl Into<String>) -> Self {
        self.stack_name = stack_name.into();
        self
    }

    pub fn with_notification_arns(mut self, arns: Vec<String>) -> Self {
        self.notification_arns = arns;
        self
    }

    pub fn with_partition(mut self, partition: impl Into<String>) -> Self {
        self.partition = partition.into();
        self
    }

    pub fn with_url_suffix(mut self, url_suffix: impl Into<String>) -> Self {
        self.url_suffix = url_suffix.into();
        self
    }

    /// Value of a pseudo-parameter by name.
    ///
    /// Returns `None` for names that are not pseudo-parameters. `AWS::NoValue`
    /// is not handled here since it resolves to absence, not a value.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        let value = match name {
            ACCOUNT_ID => Value::String(self.account_id.clone()),
            REGION => Value::String(self.region.clone()),
            STACK_ID => Value::String(self.stack_id.clone()),
            STACK_NAME => Value::String(self.stack_name.clone()),
            PARTITION => Value::String(self.partition.clone()),
            URL_SUFFIX => Value::String(self.url_suffix.clone()),
            NOTIFICATION_ARNS => Value::Array(
                self.notification_arns
                    .iter()
                    .cloned()
                    .map(Value::String)
                    .collect(),
            ),
            _ => return None,
        };
        Some(value)
    }
}

/// Checks if a name is a CloudFormation pseudo-parameter
pub fn is_pseudo_parameter(name: &str) -> bool {
    name.starts_with("AWS::")
}
