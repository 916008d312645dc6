use std::env;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use bridge_runtime::{bridge_config_schema, BridgeConfig};
use jsonschema::JSONSchema;
use serde_json::Value;

const DEFAULT_CONFIG_GLOB: &str = "bridge_runtime/src/data/*.json";
const DEFAULT_SCHEMA_PATH: &str = "bridge_runtime/schema/bridge_config.schema.json";

fn main() -> Result<(), Box<dyn Error>> {
    let mut args = env::args().skip(1);
    match args.next().as_deref() {
        Some("config-schema") => config_schema(args.next().map(PathBuf::from)),
        Some("validate-config") => validate_config(args.collect()),
        Some("help") | None => {
            print_usage();
            Ok(())
        }
        Some(cmd) => {
            eprintln!("Unknown xtask '{cmd}'.");
            print_usage();
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    eprintln!("Usage: cargo xtask config-schema [OUT]");
    eprintln!("       cargo xtask validate-config [GLOB...]");
    eprintln!("       cargo xtask help");
}

fn schema_value() -> Result<Value, Box<dyn Error>> {
    Ok(serde_json::to_value(bridge_config_schema())?)
}

fn config_schema(out: Option<PathBuf>) -> Result<(), Box<dyn Error>> {
    let out = out.unwrap_or_else(|| PathBuf::from(DEFAULT_SCHEMA_PATH));
    if let Some(parent) = out.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut rendered = serde_json::to_string_pretty(&schema_value()?)?;
    rendered.push('\n');
    fs::write(&out, rendered)?;
    println!("Wrote bridge config schema to {}", out.display());
    Ok(())
}

fn validate_config(patterns: Vec<String>) -> Result<(), Box<dyn Error>> {
    let patterns = if patterns.is_empty() {
        vec![DEFAULT_CONFIG_GLOB.to_string()]
    } else {
        patterns
    };

    let schema = schema_value()?;
    let compiled = JSONSchema::compile(&schema)
        .map_err(|err| format!("bridge config schema does not compile: {err}"))?;

    let mut checked = 0usize;
    let mut failures = Vec::new();
    for pattern in &patterns {
        for entry in glob::glob(pattern)? {
            let path = entry?;
            checked += 1;
            if let Err(problems) = check_file(&compiled, &path) {
                for problem in problems {
                    failures.push(format!("{}: {problem}", path.display()));
                }
            }
        }
    }

    if checked == 0 {
        return Err(format!("no config files matched {patterns:?}").into());
    }
    if !failures.is_empty() {
        for failure in &failures {
            eprintln!("{failure}");
        }
        return Err(format!("{} problem(s) in {checked} file(s)", failures.len()).into());
    }

    println!("Validated {checked} bridge config file(s)");
    Ok(())
}

/// Schema check followed by the semantic checks the loader applies.
fn check_file(schema: &JSONSchema, path: &Path) -> Result<(), Vec<String>> {
    let contents = fs::read_to_string(path).map_err(|err| vec![err.to_string()])?;
    let instance: Value = serde_json::from_str(&contents).map_err(|err| vec![err.to_string()])?;

    if let Err(errors) = schema.validate(&instance) {
        return Err(errors
            .map(|error| format!("{} at {}", error, error.instance_path))
            .collect());
    }
    BridgeConfig::from_json_str(&contents)
        .map(|_| ())
        .map_err(|err| vec![err.to_string()])
}
