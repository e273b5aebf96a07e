//! Condition functions and evaluation of the `Conditions` section.

use log::debug;
use serde_json::{Map, Value};

use super::{search, Context, ProcessorOptions};

/// Replaces every expression in `Conditions` with its evaluated value.
///
/// Conditions may refer to each other through `{ "Condition": "Name" }`, so
/// the original expressions are re-evaluated against the previous pass until
/// the section stops changing. Each pass can settle at least one more
/// condition, which bounds the number of passes.
pub(crate) fn evaluate_conditions(template: &mut Value, options: &ProcessorOptions) {
    let Some(expressions) = template
        .get("Conditions")
        .and_then(Value::as_object)
        .cloned()
    else {
        return;
    };

    for pass in 0..=expressions.len() {
        let evaluated: Map<String, Value> = {
            let ctx = Context::new(template, &options.pseudo_parameters);
            expressions
                .iter()
                .map(|(name, expression)| {
                    let value = search(expression.clone(), &ctx, options).unwrap_or(Value::Null);
                    (name.clone(), value)
                })
                .collect()
        };

        if template.get("Conditions").and_then(Value::as_object) == Some(&evaluated) {
            break;
        }
        debug!("Condition evaluation pass {} changed the Conditions section", pass);
        if let Some(conditions) = template.get_mut("Conditions") {
            *conditions = Value::Object(evaluated);
        }
    }
}

fn bools(input: &Value) -> Option<Vec<bool>> {
    input.as_array()?.iter().map(Value::as_bool).collect()
}

/// `{ "Fn::Equals": [ a, b ] }`
pub(crate) fn fn_equals(_name: &str, input: Value, _ctx: &Context<'_>) -> Option<Value> {
    match input.as_array().map(Vec::as_slice) {
        Some([a, b]) => Some(Value::Bool(a == b)),
        _ => Some(Value::Null),
    }
}

/// `{ "Fn::And": [ cond, cond, ... ] }`
pub(crate) fn fn_and(_name: &str, input: Value, _ctx: &Context<'_>) -> Option<Value> {
    match bools(&input) {
        Some(values) if !values.is_empty() => Some(Value::Bool(values.iter().all(|b| *b))),
        _ => Some(Value::Null),
    }
}

/// `{ "Fn::Or": [ cond, cond, ... ] }`
pub(crate) fn fn_or(_name: &str, input: Value, _ctx: &Context<'_>) -> Option<Value> {
    match bools(&input) {
        Some(values) if !values.is_empty() => Some(Value::Bool(values.iter().any(|b| *b))),
        _ => Some(Value::Null),
    }
}

/// `{ "Fn::Not": [ cond ] }`
pub(crate) fn fn_not(_name: &str, input: Value, _ctx: &Context<'_>) -> Option<Value> {
    match bools(&input).as_deref() {
        Some([value]) => Some(Value::Bool(!value)),
        _ => Some(Value::Null),
    }
}

/// `{ "Fn::If": [ "ConditionName", value_if_true, value_if_false ] }`
pub(crate) fn fn_if(_name: &str, input: Value, ctx: &Context<'_>) -> Option<Value> {
    let Value::Array(args) = input else {
        return Some(Value::Null);
    };
    let Ok([condition, if_true, if_false]) = <[Value; 3]>::try_from(args) else {
        return Some(Value::Null);
    };

    match condition.as_str().and_then(|name| ctx.condition(name)) {
        Some(true) => Some(if_true),
        Some(false) => Some(if_false),
        None => Some(Value::Null),
    }
}

/// `{ "Condition": "ConditionName" }`
pub(crate) fn condition(_name: &str, input: Value, ctx: &Context<'_>) -> Option<Value> {
    let value = input
        .as_str()
        .and_then(|name| ctx.condition(name))
        .map(Value::Bool)
        .unwrap_or(Value::Null);
    Some(value)
}
