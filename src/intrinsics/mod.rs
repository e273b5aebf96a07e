//! Resolution of CloudFormation intrinsic functions.
//!
//! A template is walked bottom-up. Every object with exactly one key that
//! names a known intrinsic function (`Ref`, `Fn::Join`, `Fn::Sub`, ...) is
//! replaced with the value its handler computes from the already-resolved
//! argument. Anything that cannot be resolved outside of a deployment
//! (unknown references, `Fn::GetAtt`, missing mapping keys) becomes `null`
//! or an empty string rather than an error.
//!
//! ```
//! use cfn_resolve::intrinsics::{resolve, ProcessorOptions};
//! use serde_json::json;
//!
//! let template = json!({
//!     "Parameters": { "Env": { "Type": "String", "Default": "dev" } },
//!     "Outputs": { "Name": { "Value": { "Fn::Sub": "${Env}-${AWS::Region}" } } }
//! });
//! let resolved = resolve(template, &ProcessorOptions::default());
//! assert_eq!(resolved["Outputs"]["Name"]["Value"], json!("dev-us-east-1"));
//! ```

mod conditions;
mod functions;
pub mod pseudo;

use indexmap::IndexMap;
use lazy_static::lazy_static;
use log::{trace, warn};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::cfn_yaml;
use crate::error::Result;
pub use pseudo::PseudoParameters;

/// A caller-supplied intrinsic function handler.
///
/// Receives the function name, its argument (with any nested intrinsics
/// already resolved) and the resolution context. Returning `None` removes
/// the containing field, the same as `AWS::NoValue`.
pub type IntrinsicHandler = Arc<dyn Fn(&str, Value, &Context<'_>) -> Option<Value> + Send + Sync>;

type HandlerFn = fn(&str, Value, &Context<'_>) -> Option<Value>;

lazy_static! {
    static ref DEFAULT_HANDLERS: HashMap<&'static str, HandlerFn> = {
        let mut m: HashMap<&'static str, HandlerFn> = HashMap::new();
        m.insert("Ref", functions::fn_ref);
        m.insert("Fn::Base64", functions::fn_base64);
        m.insert("Fn::FindInMap", functions::fn_find_in_map);
        m.insert("Fn::GetAZs", functions::fn_get_azs);
        m.insert("Fn::Join", functions::fn_join);
        m.insert("Fn::Select", functions::fn_select);
        m.insert("Fn::Split", functions::fn_split);
        m.insert("Fn::Sub", functions::fn_sub);
        m.insert("Fn::GetAtt", functions::non_resolving);
        m.insert("Fn::ImportValue", functions::non_resolving);
        m.insert("Fn::Cidr", functions::non_resolving);
        m.insert("Fn::And", conditions::fn_and);
        m.insert("Fn::Equals", conditions::fn_equals);
        m.insert("Fn::If", conditions::fn_if);
        m.insert("Fn::Not", conditions::fn_not);
        m.insert("Fn::Or", conditions::fn_or);
        m.insert("Condition", conditions::condition);
        m
    };
}

/// Names of the intrinsic functions resolved without any overrides.
pub fn default_handler_names() -> impl Iterator<Item = &'static str> {
    DEFAULT_HANDLERS.keys().copied()
}

/// Read-only view of the template being resolved, handed to every handler.
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    template: &'a Value,
    pseudo_parameters: &'a PseudoParameters,
}

impl<'a> Context<'a> {
    pub fn new(template: &'a Value, pseudo_parameters: &'a PseudoParameters) -> Self {
        Self {
            template,
            pseudo_parameters,
        }
    }

    pub fn template(&self) -> &'a Value {
        self.template
    }

    pub fn pseudo_parameters(&self) -> &'a PseudoParameters {
        self.pseudo_parameters
    }

    /// A top-level template section such as `Mappings` or `Parameters`.
    pub fn section(&self, name: &str) -> Option<&'a Map<String, Value>> {
        self.template.get(name).and_then(Value::as_object)
    }

    /// The `Default` of a declared template parameter.
    pub fn parameter_default(&self, name: &str) -> Option<&'a Value> {
        self.section("Parameters")?.get(name)?.get("Default")
    }

    /// The value of a named condition, once the `Conditions` section has
    /// been evaluated to booleans.
    pub fn condition(&self, name: &str) -> Option<bool> {
        self.section("Conditions")?.get(name)?.as_bool()
    }
}

/// Options controlling how a template is processed.
#[derive(Clone, Default)]
pub struct ProcessorOptions {
    /// Values for `Ref` to `AWS::*` pseudo-parameters.
    pub pseudo_parameters: PseudoParameters,
    /// Handlers that replace the default behaviour for a function name.
    pub intrinsic_handler_overrides: HashMap<String, IntrinsicHandler>,
    /// Values that replace the `Default` of declared template parameters.
    pub parameter_overrides: IndexMap<String, Value>,
    /// Evaluate the `Conditions` section before resolving the rest, so
    /// `Fn::If` and `Condition` can pick a branch.
    pub evaluate_conditions: bool,
    /// Leave the template untouched.
    pub no_process: bool,
}

impl fmt::Debug for ProcessorOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut overrides: Vec<&String> = self.intrinsic_handler_overrides.keys().collect();
        overrides.sort();
        f.debug_struct("ProcessorOptions")
            .field("pseudo_parameters", &self.pseudo_parameters)
            .field("intrinsic_handler_overrides", &overrides)
            .field("parameter_overrides", &self.parameter_overrides)
            .field("evaluate_conditions", &self.evaluate_conditions)
            .field("no_process", &self.no_process)
            .finish()
    }
}

impl ProcessorOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pseudo_parameters(mut self, pseudo_parameters: PseudoParameters) -> Self {
        self.pseudo_parameters = pseudo_parameters;
        self
    }

    /// Override the handler for one intrinsic function. Other functions keep
    /// their default handlers.
    pub fn with_handler<F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&str, Value, &Context<'_>) -> Option<Value> + Send + Sync + 'static,
    {
        self.intrinsic_handler_overrides
            .insert(name.into(), Arc::new(handler));
        self
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameter_overrides.insert(name.into(), value.into());
        self
    }

    pub fn evaluate_conditions(mut self, evaluate: bool) -> Self {
        self.evaluate_conditions = evaluate;
        self
    }

    pub fn no_process(mut self, no_process: bool) -> Self {
        self.no_process = no_process;
        self
    }

    fn handler(&self, name: &str) -> Option<Handler<'_>> {
        if let Some(handler) = self.intrinsic_handler_overrides.get(name) {
            return Some(Handler::Override(handler));
        }
        DEFAULT_HANDLERS.get(name).copied().map(Handler::Default)
    }
}

enum Handler<'h> {
    Override(&'h IntrinsicHandler),
    Default(HandlerFn),
}

impl Handler<'_> {
    fn call(&self, name: &str, input: Value, ctx: &Context<'_>) -> Option<Value> {
        match self {
            Handler::Override(handler) => handler(name, input, ctx),
            Handler::Default(handler) => handler(name, input, ctx),
        }
    }
}

/// Resolve every intrinsic function in a parsed template.
///
/// Parameter overrides are applied first, then (optionally) the
/// `Conditions` section is evaluated, then the whole document is resolved
/// against that prepared template. This never fails: unresolvable values
/// become `null` or `""`.
pub fn resolve(document: Value, options: &ProcessorOptions) -> Value {
    let mut template = document;
    override_parameters(&mut template, &options.parameter_overrides);
    if options.evaluate_conditions {
        conditions::evaluate_conditions(&mut template, options);
    }

    let ctx = Context::new(&template, &options.pseudo_parameters);
    search(template.clone(), &ctx, options).unwrap_or(Value::Null)
}

/// Resolve intrinsic functions in a JSON template.
///
/// Malformed JSON is the only failure. With `no_process` set the input is
/// returned as-is once it has been checked to be valid JSON.
pub fn process_json(input: &[u8], options: Option<&ProcessorOptions>) -> Result<Vec<u8>> {
    let document: Value = serde_json::from_slice(input)?;
    let options = options.cloned().unwrap_or_default();
    if options.no_process {
        return Ok(input.to_vec());
    }

    let resolved = resolve(document, &options);
    Ok(serde_json::to_vec(&resolved)?)
}

/// Resolve intrinsic functions in a YAML template, returning JSON.
///
/// Short-form tags are expanded first, so `!Ref`, `!Sub` and friends are
/// resolved like their long forms.
pub fn process_yaml(input: &[u8], options: Option<&ProcessorOptions>) -> Result<Vec<u8>> {
    let text =
        std::str::from_utf8(input).map_err(|e| cfn_yaml::Error::ParseError(e.to_string()))?;
    let document = cfn_yaml::parse_yaml_to_json(text)?;
    process_json(&serde_json::to_vec(&document)?, options)
}

fn override_parameters(template: &mut Value, overrides: &IndexMap<String, Value>) {
    for (name, value) in overrides {
        let parameter = template
            .get_mut("Parameters")
            .and_then(|parameters| parameters.get_mut(name))
            .and_then(Value::as_object_mut);
        match parameter {
            Some(parameter) => {
                let value = match (parameter.get("Type").and_then(Value::as_str), value) {
                    (Some("Number"), Value::String(s)) => {
                        parse_number(s).unwrap_or_else(|| value.clone())
                    }
                    _ => value.clone(),
                };
                parameter.insert("Default".to_string(), value);
            }
            None => warn!("Parameter override {} does not match any template parameter", name),
        }
    }
}

/// Numeric text as a JSON number, so overrides given as strings compare
/// equal to numeric literals in the template.
fn parse_number(text: &str) -> Option<Value> {
    let text = text.trim();
    if let Ok(i) = text.parse::<i64>() {
        return Some(Value::from(i));
    }
    text.parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
}

/// Marker passed to handlers in place of an argument that resolved to
/// absence, so that e.g. `Fn::If` can still select it.
pub(crate) fn no_value() -> Value {
    let mut map = Map::new();
    map.insert("Ref".to_string(), Value::String(pseudo::NO_VALUE.to_string()));
    Value::Object(map)
}

pub(crate) fn is_no_value(value: &Value) -> bool {
    value.as_object().map_or(false, |map| {
        map.len() == 1 && map.get("Ref").and_then(Value::as_str) == Some(pseudo::NO_VALUE)
    })
}

/// Recursively resolves a JSON value. `None` means the value is absent.
pub(crate) fn search(value: Value, ctx: &Context<'_>, options: &ProcessorOptions) -> Option<Value> {
    match value {
        Value::Object(map) => {
            // An intrinsic function is an object with a single key
            if map.len() == 1 {
                let handler = map
                    .iter()
                    .next()
                    .filter(|(key, argument)| is_call(key, argument, ctx))
                    .and_then(|(key, _)| options.handler(key));
                if let Some(handler) = handler {
                    let (name, argument) = map.into_iter().next()?;
                    trace!("Resolving {}", name);
                    let argument = resolve_argument(argument, ctx, options);
                    let result = handler.call(&name, argument, ctx)?;
                    return if is_no_value(&result) {
                        None
                    } else {
                        Some(result)
                    };
                }
            }

            let resolved = map
                .into_iter()
                .filter_map(|(key, value)| search(value, ctx, options).map(|value| (key, value)))
                .collect();
            Some(Value::Object(resolved))
        }
        Value::Array(items) => Some(Value::Array(
            items
                .into_iter()
                .filter_map(|item| search(item, ctx, options))
                .collect(),
        )),
        // Strings, numbers, bools, and null pass through unchanged
        _ => Some(value),
    }
}

/// `Condition` doubles as an ordinary property name, so it is only a call
/// when it names a declared condition.
fn is_call(name: &str, argument: &Value, ctx: &Context<'_>) -> bool {
    if name != "Condition" {
        return true;
    }
    match (argument.as_str(), ctx.section("Conditions")) {
        (Some(condition), Some(conditions)) => conditions.contains_key(condition),
        _ => false,
    }
}

fn resolve_argument(argument: Value, ctx: &Context<'_>, options: &ProcessorOptions) -> Value {
    match argument {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| search(item, ctx, options).unwrap_or_else(no_value))
                .collect(),
        ),
        other => search(other, ctx, options).unwrap_or_else(no_value),
    }
}
