//! # Slash Command Builders
//!
//! Turn slash definitions into Discord application command payloads.
//!
//! - **Version**: 3.0.0
//! - **Since**: 0.9.0
//!
//! ## Changelog
//! - 3.0.0: One top-level command per definition file
//! - 2.0.0: Consolidate under a single command with subcommands
//! - 1.0.0: Initial release

use crate::features::definitions::{option_kind, CommandOption, SlashCommand};
use serde_json::Value;
use serenity::builder::{CreateApplicationCommand, CreateApplicationCommandOption};
use serenity::model::application::command::CommandOptionType;

/// Builder for one slash definition
///
/// Option types and choice values were checked when the definition loaded.
pub fn build_command(command: &SlashCommand) -> CreateApplicationCommand {
    let mut cmd = CreateApplicationCommand::default();
    cmd.name(&command.name).description(&command.description);

    // Discord wants required options first
    let (required, optional): (Vec<&CommandOption>, Vec<&CommandOption>) =
        command.options.iter().partition(|o| o.required);

    for opt in required.into_iter().chain(optional) {
        cmd.create_option(|o| build_option(o, opt));
    }

    cmd
}

fn build_option<'a>(
    o: &'a mut CreateApplicationCommandOption,
    opt: &CommandOption,
) -> &'a mut CreateApplicationCommandOption {
    let kind = option_kind(&opt.option_type).unwrap_or(CommandOptionType::String);
    o.name(&opt.name)
        .description(&opt.description)
        .kind(kind)
        .required(opt.required);

    for choice in &opt.choices {
        match kind {
            CommandOptionType::Integer => {
                if let Ok(val) = choice.value.parse::<i32>() {
                    o.add_int_choice(&choice.name, val);
                }
            }
            CommandOptionType::Number => {
                if let Ok(val) = choice.value.parse::<f64>() {
                    o.add_number_choice(&choice.name, val);
                }
            }
            _ => {
                o.add_string_choice(&choice.name, &choice.value);
            }
        }
    }

    o
}

/// JSON body for one command, as sent in a bulk overwrite
pub fn command_payload(command: &SlashCommand) -> Value {
    let built = build_command(command);
    Value::Object(
        built
            .0
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(yaml: &str) -> SlashCommand {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_payload_has_name_and_description() {
        let payload = command_payload(&command(
            "name: ping\ndescription: Replies with Pong\naction: { type: reply, content: Pong }\n",
        ));

        assert_eq!(payload["name"], "ping");
        assert_eq!(payload["description"], "Replies with Pong");
    }

    #[test]
    fn test_options_required_first_with_choices() {
        let payload = command_payload(&command(
            r#"
name: roll
description: Roll dice
options:
  - name: label
    description: Optional label
  - name: sides
    description: Number of sides
    type: integer
    required: true
    choices:
      - { name: Six, value: "6" }
      - { name: Twenty, value: "20" }
  - name: weight
    description: Bias
    type: Number
    choices:
      - { name: Half, value: "0.5" }
action: { type: reply, content: rolled }
"#,
        ));

        let options = payload["options"].as_array().unwrap();
        assert_eq!(options.len(), 3);
        assert_eq!(options[0]["name"], "sides");
        assert_eq!(options[0]["type"], 4);
        assert_eq!(options[0]["required"], true);
        assert_eq!(options[0]["choices"][1]["value"], 20);
        assert_eq!(options[1]["name"], "label");
        assert_eq!(options[1]["type"], 3);
        assert_eq!(options[2]["type"], 10);
        assert_eq!(options[2]["choices"][0]["value"], 0.5);
    }
}
