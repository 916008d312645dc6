use std::{
    fs,
    io::{self, Read},
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context, Result};
use bridge_runtime::{
    load_bridge_config, load_bridge_config_from_env, parse_command_line, split_commands,
    BridgeConfig, CommandParseError, QueueMedium,
};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about = "Controller-side client for the state bridge queue", long_about = None)]
struct Args {
    /// Bridge config JSON (defaults to BRIDGE_CONFIG_PATH, then the bundled file)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the queue file from the config
    #[arg(long, global = true)]
    queue: Option<PathBuf>,

    /// Override the feedback file from the config
    #[arg(long, global = true)]
    feedback: Option<PathBuf>,

    #[command(subcommand)]
    command: Action,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Append commands to the queue file under the queue lock
    Send {
        /// Commands, one per argument (e.g. "register alice")
        commands: Vec<String>,

        /// Read additional commands from a file, or `-` for stdin
        #[arg(long)]
        file: Option<PathBuf>,

        /// How long to wait for the bridge to release the queue lock
        #[arg(long, default_value_t = 2000)]
        timeout_ms: u64,

        /// Queue lines even if they do not match the command grammar
        #[arg(long)]
        allow_invalid: bool,
    },
    /// Print the feedback file
    Feedback {
        /// Only print the last N lines
        #[arg(long)]
        tail: Option<usize>,
    },
    /// Print the effective bridge configuration as JSON
    Config,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = effective_config(&args)?;

    match &args.command {
        Action::Send {
            commands,
            file,
            timeout_ms,
            allow_invalid,
        } => {
            let mut lines = commands.clone();
            if let Some(path) = file {
                lines.extend(read_command_file(path)?);
            }
            let lines = check_grammar(lines, *allow_invalid)?;
            if lines.is_empty() {
                bail!("No commands to send");
            }

            let medium = QueueMedium::new(config.queue_path.clone(), config.lock_stale_after());
            let written = medium
                .append(&lines, Duration::from_millis(*timeout_ms))
                .with_context(|| {
                    format!("Failed to append to queue {}", config.queue_path.display())
                })?;
            println!(
                "queued {written} command(s) in {}",
                config.queue_path.display()
            );
        }
        Action::Feedback { tail } => {
            let contents = match fs::read_to_string(&config.feedback_path) {
                Ok(contents) => contents,
                Err(err) if err.kind() == io::ErrorKind::NotFound => String::new(),
                Err(err) => {
                    return Err(err).with_context(|| {
                        format!(
                            "Failed to read feedback file {}",
                            config.feedback_path.display()
                        )
                    })
                }
            };
            for line in tail_lines(&contents, *tail) {
                println!("{line}");
            }
        }
        Action::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

fn effective_config(args: &Args) -> Result<BridgeConfig> {
    let (mut config, _) = match &args.config {
        Some(path) => load_bridge_config(Some(path.clone())),
        None => load_bridge_config_from_env(),
    };
    if let Some(path) = &args.queue {
        config.queue_path = path.clone();
    }
    if let Some(path) = &args.feedback {
        config.feedback_path = path.clone();
    }
    config
        .validate()
        .with_context(|| "Bridge configuration rejected")?;
    Ok(config)
}

fn read_command_file(path: &Path) -> Result<Vec<String>> {
    let contents = if path == Path::new("-") {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .with_context(|| "Failed to read commands from stdin")?;
        buffer
    } else {
        fs::read_to_string(path)
            .with_context(|| format!("Failed to read commands from {}", path.display()))?
    };
    Ok(split_commands(&contents))
}

/// Drop blank lines and reject (or, with `allow_invalid`, keep) lines the
/// bridge would discard as malformed.
fn check_grammar(lines: Vec<String>, allow_invalid: bool) -> Result<Vec<String>> {
    let mut accepted = Vec::with_capacity(lines.len());
    for line in lines {
        match parse_command_line(&line) {
            Ok(_) => accepted.push(line.trim().to_string()),
            Err(CommandParseError::Empty) => {}
            Err(err) if allow_invalid => {
                eprintln!("warning: {err}");
                accepted.push(line.trim().to_string());
            }
            Err(err) => bail!("{err} (pass --allow-invalid to queue it anyway)"),
        }
    }
    Ok(accepted)
}

fn tail_lines(contents: &str, tail: Option<usize>) -> Vec<&str> {
    let lines: Vec<&str> = contents.lines().collect();
    match tail {
        Some(count) if count < lines.len() => lines[lines.len() - count..].to_vec(),
        _ => lines,
    }
}
