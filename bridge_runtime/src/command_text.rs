use thiserror::Error;

/// A command line from the queue medium, tokenized and routed by its first token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeCommand {
    /// `start`: regenerate the world and forget every claimed name.
    Start,
    /// `register <name>`
    Register { name: String },
    /// `info <name>`
    Info { name: String },
    /// `<subject> <operation> <target>`
    Invoke {
        subject: String,
        operation: String,
        target: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandParseError {
    #[error("empty command")]
    Empty,
    #[error("Invalid command format: {0}")]
    InvalidFormat(String),
}

pub fn parse_command_line(input: &str) -> Result<BridgeCommand, CommandParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(CommandParseError::Empty);
    }

    let tokens: Vec<&str> = trimmed.split_whitespace().collect();
    let invalid = || CommandParseError::InvalidFormat(trimmed.to_string());

    match tokens.as_slice() {
        ["start"] => Ok(BridgeCommand::Start),
        ["register", name] => Ok(BridgeCommand::Register {
            name: (*name).to_string(),
        }),
        ["info", name] => Ok(BridgeCommand::Info {
            name: (*name).to_string(),
        }),
        ["start" | "register" | "info", ..] => Err(invalid()),
        [subject, operation, target] => Ok(BridgeCommand::Invoke {
            subject: (*subject).to_string(),
            operation: (*operation).to_string(),
            target: (*target).to_string(),
        }),
        _ => Err(invalid()),
    }
}
