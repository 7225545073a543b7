//! Slash option values as template strings

use serde_json::Value;
use serenity::model::application::interaction::application_command::CommandDataOption;
use std::collections::HashMap;

/// Flatten options (including subcommand options) into name -> display string
pub fn option_values(options: &[CommandDataOption]) -> HashMap<String, String> {
    let mut values = HashMap::new();
    collect(options, &mut values);
    values
}

fn collect(options: &[CommandDataOption], values: &mut HashMap<String, String>) {
    for opt in options {
        if let Some(value) = opt.value.as_ref().and_then(display_value) {
            values.insert(opt.name.clone(), value);
        }
        collect(&opt.options, values);
    }
}

/// Strings unquoted, numbers and booleans as written; objects are skipped
fn display_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
