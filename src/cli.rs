//! Command-line parsing.
//!
//! ```text
//! hass-panel update [--time-colour C] [--data-colour C] [--border C] [--background C] [--stdout]
//! hass-panel info
//! hass-panel test-ha <entity_id>
//! ```
//!
//! Colours are `white`, `black` or `red` in any case. Options accept both
//! `--opt value` and `--opt=value`.

use crate::colour::{Colour, ColourError, PanelConfig};
use thiserror::Error;

pub const USAGE: &str = "\
Usage: hass-panel <COMMAND>

Commands:
  update            Render the status panel and show it
  info              Print display and hub details
  test-ha <ENTITY>  Print the raw hub state of an entity
  help              Print this message

Update options:
  --time-colour <COLOUR>   Clock colour [default: BLACK]
  --data-colour <COLOUR>   Status line colour [default: RED]
  --border <COLOUR>        Border colour [default: BLACK]
  --background <COLOUR>    Background colour [default: WHITE]
  --stdout                 Print an ASCII preview instead of driving the display

Colours: white, black, red (case-insensitive)";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Update { colours: PanelConfig, stdout: bool },
    Info,
    TestHa { entity_id: String },
    Help,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CliError {
    #[error("missing command")]
    MissingCommand,
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    #[error("unknown option '{0}'")]
    UnknownOption(String),
    #[error("option '{0}' needs a value")]
    MissingValue(String),
    #[error("'{0}' needs an entity id")]
    MissingEntity(String),
    #[error("unexpected argument '{0}'")]
    UnexpectedArgument(String),
    #[error("{option}: {source}")]
    InvalidColour {
        option: String,
        #[source]
        source: ColourError,
    },
}

/// Parse arguments, excluding the program name.
pub fn parse<I, S>(args: I) -> Result<Command, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut args = args.into_iter().map(Into::into);
    let command = args.next().ok_or(CliError::MissingCommand)?;

    match command.as_str() {
        "update" => parse_update(args),
        "info" => no_more(args, Command::Info),
        "test-ha" | "test" => {
            let entity_id = args
                .next()
                .ok_or_else(|| CliError::MissingEntity(command.clone()))?;
            no_more(args, Command::TestHa { entity_id })
        }
        "help" | "--help" | "-h" => Ok(Command::Help),
        other => Err(CliError::UnknownCommand(other.to_string())),
    }
}

fn no_more(mut args: impl Iterator<Item = String>, command: Command) -> Result<Command, CliError> {
    match args.next() {
        Some(extra) => Err(CliError::UnexpectedArgument(extra)),
        None => Ok(command),
    }
}

fn parse_update(mut args: impl Iterator<Item = String>) -> Result<Command, CliError> {
    let mut colours = PanelConfig::default();
    let mut stdout = false;

    while let Some(arg) = args.next() {
        if arg == "--stdout" {
            stdout = true;
            continue;
        }
        if !arg.starts_with("--") {
            return Err(CliError::UnexpectedArgument(arg));
        }

        let (option, inline) = match arg.split_once('=') {
            Some((option, value)) => (option.to_string(), Some(value.to_string())),
            None => (arg, None),
        };

        let slot = match option.as_str() {
            "--time-colour" | "--time-color" => &mut colours.time_colour,
            "--data-colour" | "--data-color" => &mut colours.data_colour,
            "--border" => &mut colours.border_colour,
            "--background" => &mut colours.background_colour,
            _ => return Err(CliError::UnknownOption(option.clone())),
        };

        let value = match inline {
            Some(value) => value,
            None => args
                .next()
                .ok_or_else(|| CliError::MissingValue(option.clone()))?,
        };

        *slot = value
            .parse::<Colour>()
            .map_err(|source| CliError::InvalidColour { option, source })?;
    }

    Ok(Command::Update { colours, stdout })
}
