//! Default handlers for the value-producing intrinsic functions.
//!
//! Every handler receives its argument with nested intrinsics already
//! resolved. Arguments of the wrong shape resolve to `null`.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use lazy_static::lazy_static;
use log::debug;
use regex::{Captures, Regex};
use serde_json::{Map, Value};

use super::pseudo::{is_pseudo_parameter, NO_VALUE};
use super::Context;

lazy_static! {
    // ${Name}, ${Resource.Attribute} and the ${!Literal} escape
    static ref SUB_VARIABLE: Regex =
        Regex::new(r"\$\{([^}]*)\}").expect("Fn::Sub variable pattern is valid");
}

/// `{ "Ref": "Name" }`
pub(crate) fn fn_ref(_name: &str, input: Value, ctx: &Context<'_>) -> Option<Value> {
    match input {
        Value::String(name) => resolve_ref(&name, ctx),
        _ => Some(Value::Null),
    }
}

/// Resolves a reference to a pseudo-parameter or a template parameter's
/// default. References to anything else (resources, parameters without a
/// default) resolve to `null`.
fn resolve_ref(name: &str, ctx: &Context<'_>) -> Option<Value> {
    if name == NO_VALUE {
        return None;
    }
    if is_pseudo_parameter(name) {
        let value = ctx.pseudo_parameters().lookup(name);
        if value.is_none() {
            debug!("Unknown pseudo-parameter {}", name);
        }
        return Some(value.unwrap_or(Value::Null));
    }
    Some(ctx.parameter_default(name).cloned().unwrap_or(Value::Null))
}

/// `{ "Fn::Join": [ "delimiter", [ "a", "b" ] ] }`
pub(crate) fn fn_join(_name: &str, input: Value, _ctx: &Context<'_>) -> Option<Value> {
    let Value::Array(args) = input else {
        return Some(Value::Null);
    };
    let [delimiter, items] = args.as_slice() else {
        return Some(Value::Null);
    };

    let joined = match (delimiter.as_str(), items.as_array()) {
        (Some(delimiter), Some(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(delimiter),
        _ => String::new(),
    };
    Some(Value::String(joined))
}

/// `{ "Fn::Split": [ "delimiter", "source string" ] }`
pub(crate) fn fn_split(_name: &str, input: Value, _ctx: &Context<'_>) -> Option<Value> {
    let Value::Array(args) = input else {
        return Some(Value::Null);
    };
    let [delimiter, source] = args.as_slice() else {
        return Some(Value::Null);
    };
    let (Some(delimiter), Some(source)) = (delimiter.as_str(), source.as_str()) else {
        return Some(Value::Null);
    };

    let parts: Vec<Value> = if delimiter.is_empty() {
        source.chars().map(|c| Value::String(c.to_string())).collect()
    } else {
        source
            .split(delimiter)
            .map(|part| Value::String(part.to_string()))
            .collect()
    };
    Some(Value::Array(parts))
}

/// `{ "Fn::Select": [ index, [ ... ] ] }`
///
/// The index may be a number or a numeric string.
pub(crate) fn fn_select(_name: &str, input: Value, _ctx: &Context<'_>) -> Option<Value> {
    let Value::Array(args) = input else {
        return Some(Value::Null);
    };
    let Ok([index, list]) = <[Value; 2]>::try_from(args) else {
        return Some(Value::Null);
    };

    let index = match &index {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    let selected = match (index.and_then(|i| usize::try_from(i).ok()), list) {
        (Some(index), Value::Array(mut items)) if index < items.len() => items.swap_remove(index),
        _ => Value::Null,
    };
    Some(selected)
}

/// `{ "Fn::FindInMap": [ "MapName", "TopLevelKey", "SecondLevelKey" ] }`
///
/// A fourth element of the form `{ "DefaultValue": ... }` is returned when
/// the lookup misses.
pub(crate) fn fn_find_in_map(_name: &str, input: Value, ctx: &Context<'_>) -> Option<Value> {
    let Value::Array(args) = input else {
        return Some(Value::Null);
    };
    if args.len() != 3 && args.len() != 4 {
        return Some(Value::Null);
    }

    let default = args.get(3).and_then(|d| d.get("DefaultValue")).cloned();
    let found = match (args[0].as_str(), args[1].as_str(), args[2].as_str()) {
        (Some(map_name), Some(top_level_key), Some(second_level_key)) => ctx
            .section("Mappings")
            .and_then(|mappings| mappings.get(map_name))
            .and_then(|map| map.get(top_level_key))
            .and_then(|entry| entry.get(second_level_key))
            .cloned(),
        _ => None,
    };
    Some(found.or(default).unwrap_or(Value::Null))
}

/// `{ "Fn::Base64": "string" }`
pub(crate) fn fn_base64(_name: &str, input: Value, _ctx: &Context<'_>) -> Option<Value> {
    match input {
        Value::String(s) => Some(Value::String(STANDARD.encode(s.as_bytes()))),
        _ => Some(Value::Null),
    }
}

/// `{ "Fn::GetAZs": "region" }`, where an empty region means the current one.
pub(crate) fn fn_get_azs(_name: &str, input: Value, ctx: &Context<'_>) -> Option<Value> {
    let Value::String(region) = input else {
        return Some(Value::Null);
    };
    let region = if region.is_empty() {
        ctx.pseudo_parameters().region.clone()
    } else {
        region
    };
    Some(Value::Array(
        ["a", "b", "c"]
            .iter()
            .map(|zone| Value::String(format!("{}{}", region, zone)))
            .collect(),
    ))
}

/// `{ "Fn::Sub": "template" }` or `{ "Fn::Sub": [ "template", { vars } ] }`
///
/// Each `${Name}` is taken from the explicit variables first, then from
/// `Ref` resolution. `${Resource.Attribute}` only resolves from explicit
/// variables. Anything unresolved becomes an empty string.
pub(crate) fn fn_sub(_name: &str, input: Value, ctx: &Context<'_>) -> Option<Value> {
    let (source, variables) = match input {
        Value::String(source) => (source, Map::new()),
        Value::Array(args) => match <[Value; 2]>::try_from(args) {
            Ok([Value::String(source), Value::Object(variables)]) => (source, variables),
            _ => return Some(Value::Null),
        },
        _ => return Some(Value::Null),
    };

    let rendered = SUB_VARIABLE.replace_all(&source, |caps: &Captures| {
        substitute(&caps[1], &variables, ctx)
    });
    Some(Value::String(rendered.into_owned()))
}

fn substitute(variable: &str, variables: &Map<String, Value>, ctx: &Context<'_>) -> String {
    if let Some(literal) = variable.strip_prefix('!') {
        return format!("${{{}}}", literal);
    }

    let resolved = match variables.get(variable) {
        Some(value) => Some(value.clone()),
        // Attributes are only known at deploy time
        None if variable.contains('.') => None,
        None => resolve_ref(variable, ctx),
    };
    resolved
        .as_ref()
        .and_then(scalar_to_string)
        .unwrap_or_default()
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Handler for functions that only have a value at deploy time
/// (`Fn::GetAtt`, `Fn::ImportValue`, `Fn::Cidr`).
pub(crate) fn non_resolving(_name: &str, _input: Value, _ctx: &Context<'_>) -> Option<Value> {
    Some(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::super::{resolve, ProcessorOptions, PseudoParameters};
    use rstest::rstest;
    use serde_json::{json, Value};

    fn resolve_default(value: Value) -> Value {
        resolve(value, &ProcessorOptions::default())
    }

    #[rstest]
    #[case("AWS::AccountId", json!("123456789012"))]
    #[case("AWS::Region", json!("us-east-1"))]
    #[case("AWS::StackName", json!("cfn-resolve-stack"))]
    #[case(
        "AWS::StackId",
        json!("arn:aws:cloudformation:us-east-1:123456789012:stack/MyStack/1c2fa620-982a-11e3-aff7-50e2416294e0")
    )]
    #[case("AWS::NotificationARNs", json!(["arn:aws:sns:us-east-1:123456789012:MyTopic"]))]
    #[case("AWS::Partition", json!("aws"))]
    #[case("AWS::URLSuffix", json!("amazonaws.com"))]
    fn test_ref_pseudo_parameter_defaults(#[case] name: &str, #[case] expected: Value) {
        let resolved = resolve_default(json!({"Value": {"Ref": name}}));
        assert_eq!(resolved["Value"], expected);
    }

    #[test]
    fn test_ref_caller_supplied_pseudo_parameters() {
        let pseudo = PseudoParameters::default()
            .with_account_id("210987654321")
            .with_region("ap-southeast-2")
            .with_stack_id("arn:aws:cloudformation:ap-southeast-2:210987654321:stack/app/1")
            .with_stack_name("app");
        let options = ProcessorOptions::default().with_pseudo_parameters(pseudo);
        let resolved = resolve(
            json!({
                "Account": {"Ref": "AWS::AccountId"},
                "Region": {"Ref": "AWS::Region"},
                "StackId": {"Ref": "AWS::StackId"},
                "StackName": {"Ref": "AWS::StackName"}
            }),
            &options,
        );
        assert_eq!(
            resolved,
            json!({
                "Account": "210987654321",
                "Region": "ap-southeast-2",
                "StackId": "arn:aws:cloudformation:ap-southeast-2:210987654321:stack/app/1",
                "StackName": "app"
            })
        );
    }

    #[test]
    fn test_ref_parameter_default() {
        let resolved = resolve_default(json!({
            "Parameters": {
                "Env": {"Type": "String", "Default": "dev"},
                "Size": {"Type": "Number", "Default": 3},
                "NoDefault": {"Type": "String"}
            },
            "A": {"Ref": "Env"},
            "B": {"Ref": "Size"},
            "C": {"Ref": "NoDefault"}
        }));
        assert_eq!(resolved["A"], json!("dev"));
        assert_eq!(resolved["B"], json!(3));
        assert_eq!(resolved["C"], Value::Null);
    }

    #[test]
    fn test_ref_unresolvable_is_null() {
        let resolved = resolve_default(json!({
            "A": {"Ref": "SomeResource"},
            "B": {"Ref": 42},
            "C": {"Ref": "AWS::Unknown"}
        }));
        assert_eq!(resolved, json!({"A": null, "B": null, "C": null}));
    }

    #[test]
    fn test_join() {
        let resolved = resolve_default(json!({"Value": {"Fn::Join": [":", ["a", "b", "c"]]}}));
        assert_eq!(resolved["Value"], json!("a:b:c"));
    }

    #[test]
    fn test_join_empty_delimiter_and_nested_ref() {
        let resolved = resolve_default(json!({
            "Value": {"Fn::Join": ["", ["arn:aws:s3:::", {"Ref": "AWS::StackName"}, "/*"]]}
        }));
        assert_eq!(resolved["Value"], json!("arn:aws:s3:::cfn-resolve-stack/*"));
    }

    #[test]
    fn test_join_skips_non_strings_and_novalue() {
        let resolved = resolve_default(json!({
            "Value": {"Fn::Join": ["-", ["a", 1, {"Ref": "AWS::NoValue"}, "b"]]}
        }));
        assert_eq!(resolved["Value"], json!("a-b"));
    }

    #[test]
    fn test_join_malformed() {
        let resolved = resolve_default(json!({
            "A": {"Fn::Join": "abc"},
            "B": {"Fn::Join": ["-"]},
            "C": {"Fn::Join": [1, ["a"]]}
        }));
        assert_eq!(resolved, json!({"A": null, "B": null, "C": ""}));
    }

    #[test]
    fn test_split() {
        let resolved = resolve_default(json!({"Value": {"Fn::Split": [",", "a,b,,c"]}}));
        assert_eq!(resolved["Value"], json!(["a", "b", "", "c"]));
    }

    #[test]
    fn test_split_then_join_roundtrip() {
        for (delimiter, source) in [(",", "a,b,c"), ("::", "x::y"), ("", "abc"), ("-", "")] {
            let resolved = resolve_default(json!({
                "Value": {"Fn::Join": [delimiter, {"Fn::Split": [delimiter, source]}]}
            }));
            assert_eq!(resolved["Value"], json!(source), "delimiter {:?}", delimiter);
        }
    }

    #[test]
    fn test_split_malformed() {
        let resolved = resolve_default(json!({"Value": {"Fn::Split": [",", 5]}}));
        assert_eq!(resolved["Value"], Value::Null);
    }

    #[rstest]
    #[case(json!(0), json!("apple"))]
    #[case(json!(2), json!("cherry"))]
    #[case(json!("1"), json!("banana"))]
    #[case(json!(3), Value::Null)]
    #[case(json!(-1), Value::Null)]
    #[case(json!("x"), Value::Null)]
    fn test_select(#[case] index: Value, #[case] expected: Value) {
        let resolved = resolve_default(json!({
            "Value": {"Fn::Select": [index, ["apple", "banana", "cherry"]]}
        }));
        assert_eq!(resolved["Value"], expected);
    }

    #[test]
    fn test_select_from_nested_intrinsics() {
        let resolved = resolve_default(json!({
            "Value": {"Fn::Select": [1, {"Fn::GetAZs": {"Ref": "AWS::Region"}}]}
        }));
        assert_eq!(resolved["Value"], json!("us-east-1b"));
    }

    #[test]
    fn test_find_in_map() {
        let resolved = resolve_default(json!({
            "Mappings": {
                "RegionMap": {
                    "us-east-1": {"AMI": "ami-1234", "Count": 2}
                }
            },
            "A": {"Fn::FindInMap": ["RegionMap", {"Ref": "AWS::Region"}, "AMI"]},
            "B": {"Fn::FindInMap": ["RegionMap", "us-east-1", "Count"]},
            "C": {"Fn::FindInMap": ["RegionMap", "eu-west-1", "AMI"]},
            "D": {"Fn::FindInMap": ["Missing", "us-east-1", "AMI"]},
            "E": {"Fn::FindInMap": ["RegionMap", "us-east-1", "Nope"]},
            "F": {"Fn::FindInMap": ["RegionMap", "eu-west-1", "AMI", {"DefaultValue": "ami-default"}]}
        }));
        assert_eq!(resolved["A"], json!("ami-1234"));
        assert_eq!(resolved["B"], json!(2));
        assert_eq!(resolved["C"], Value::Null);
        assert_eq!(resolved["D"], Value::Null);
        assert_eq!(resolved["E"], Value::Null);
        assert_eq!(resolved["F"], json!("ami-default"));
    }

    #[test]
    fn test_base64() {
        let resolved = resolve_default(json!({
            "A": {"Fn::Base64": "hello world"},
            "B": {"Fn::Base64": {"Fn::Join": ["", ["#!/bin/bash\n", "echo ", {"Ref": "AWS::Region"}]]}},
            "C": {"Fn::Base64": ["not", "a", "string"]}
        }));
        assert_eq!(resolved["A"], json!("aGVsbG8gd29ybGQ="));
        assert_eq!(resolved["B"], json!("IyEvYmluL2Jhc2gKZWNobyB1cy1lYXN0LTE="));
        assert_eq!(resolved["C"], Value::Null);
    }

    #[test]
    fn test_get_azs() {
        let resolved = resolve_default(json!({
            "A": {"Fn::GetAZs": ""},
            "B": {"Fn::GetAZs": "eu-west-1"}
        }));
        assert_eq!(resolved["A"], json!(["us-east-1a", "us-east-1b", "us-east-1c"]));
        assert_eq!(resolved["B"], json!(["eu-west-1a", "eu-west-1b", "eu-west-1c"]));
    }

    #[test]
    fn test_sub_string_form() {
        let resolved = resolve_default(json!({
            "Parameters": {"Env": {"Type": "String", "Default": "dev"}},
            "Value": {"Fn::Sub": "arn:aws:s3:::${Env}-${AWS::AccountId}-${AWS::Region}/*"}
        }));
        assert_eq!(resolved["Value"], json!("arn:aws:s3:::dev-123456789012-us-east-1/*"));
    }

    #[test]
    fn test_sub_explicit_variables() {
        let resolved = resolve_default(json!({
            "Value": {
                "Fn::Sub": [
                    "${Name}:${Port}:${Enabled}:${Name}",
                    {"Name": "web", "Port": 8080, "Enabled": true}
                ]
            }
        }));
        assert_eq!(resolved["Value"], json!("web:8080:true:web"));
    }

    #[test]
    fn test_sub_unresolvable_placeholders_are_empty() {
        let resolved = resolve_default(json!({
            "A": {"Fn::Sub": "x-${Unknown}-y"},
            "B": {"Fn::Sub": ["${Known}/${Unknown}", {"Known": "k"}]},
            "C": {"Fn::Sub": "${Bucket.Arn}"}
        }));
        assert_eq!(resolved["A"], json!("x--y"));
        assert_eq!(resolved["B"], json!("k/"));
        assert_eq!(resolved["C"], json!(""));
    }

    #[test]
    fn test_sub_explicit_dotted_variable() {
        let resolved = resolve_default(json!({
            "Value": {"Fn::Sub": ["${Bucket.Arn}/*", {"Bucket.Arn": "arn:aws:s3:::b"}]}
        }));
        assert_eq!(resolved["Value"], json!("arn:aws:s3:::b/*"));
    }

    #[test]
    fn test_sub_literal_escape() {
        let resolved = resolve_default(json!({"Value": {"Fn::Sub": "${!Literal}-${AWS::Region}"}}));
        assert_eq!(resolved["Value"], json!("${Literal}-us-east-1"));
    }

    #[test]
    fn test_sub_malformed() {
        let resolved = resolve_default(json!({
            "A": {"Fn::Sub": ["only-template"]},
            "B": {"Fn::Sub": 12}
        }));
        assert_eq!(resolved, json!({"A": null, "B": null}));
    }

    #[test]
    fn test_non_resolving_functions() {
        let resolved = resolve_default(json!({
            "A": {"Fn::GetAtt": ["Bucket", "Arn"]},
            "B": {"Fn::ImportValue": "SharedVpc"},
            "C": {"Fn::Cidr": ["10.0.0.0/16", 4, 8]}
        }));
        assert_eq!(resolved, json!({"A": null, "B": null, "C": null}));
    }
}
