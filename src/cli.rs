//! Cadence command-line interface
//!
//! Runs scripts to completion in a fresh root scope. Exit status is 1 when the
//! script ends with an ERROR (or with a loop control code outside any loop).

use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::executor::errors;
use crate::executor::json::{json_to_val, val_to_json};
use crate::executor::{new_root_scope, EvalResult, ResultCode, Scope, Val};

#[derive(Parser)]
#[command(name = "cadence")]
#[command(about = "Cadence - resumable command language", long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default search)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Maximum process depth (overrides config file and env vars)
    #[arg(long, global = true)]
    pub max_depth: Option<usize>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a script file
    Run {
        /// Script file
        file: PathBuf,

        /// Predefine a variable from JSON (name=<json>), repeatable
        #[arg(long = "set", value_name = "NAME=JSON")]
        vars: Vec<String>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Evaluate a script given on the command line
    Eval {
        /// Script source
        source: String,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the parsed AST of a script file as JSON
    Parse {
        /// Script file
        file: PathBuf,
    },

    /// Print the effective configuration
    Config,
}

/// Run the CLI by parsing process arguments
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    run_cli_with_args(cli)
}

/// Run the CLI with provided arguments
pub fn run_cli_from_args(args: Vec<String>) -> Result<()> {
    let cli = Cli::parse_from(args);
    run_cli_with_args(cli)
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut builder = Config::builder();
    if let Some(path) = &cli.config {
        builder = builder.config_path(path.clone());
    }
    if let Some(max_depth) = cli.max_depth {
        builder = builder.max_depth(max_depth);
    }
    builder.build().context("Failed to load configuration")
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    // A subscriber may already be installed by an embedding host
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run_cli_with_args(cli: Cli) -> Result<()> {
    // Load configuration before anything else so errors surface first
    let config = load_config(&cli)?;
    init_logging(&config);

    match cli.command {
        Commands::Run { file, vars, json } => {
            let source = read_source(&file)?;
            let scope = root_scope(&config);
            for assignment in &vars {
                define_variable(&scope, assignment)?;
            }
            debug!(file = %file.display(), "running script");
            let result = evaluate(&scope, &source)?;
            report(result, json)
        }

        Commands::Eval { source, json } => {
            let scope = root_scope(&config);
            let result = evaluate(&scope, &source)?;
            report(result, json)
        }

        Commands::Parse { file } => {
            let source = read_source(&file)?;
            let script = crate::parser::parse(&source)
                .with_context(|| format!("Failed to parse {}", file.display()))?;
            let json = serde_json::to_string_pretty(&script).context("Failed to serialize AST")?;
            println!("{}", json);
            Ok(())
        }

        Commands::Config => {
            println!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn root_scope(config: &Config) -> Rc<Scope> {
    let scope = new_root_scope();
    scope.set_max_depth(config.engine.max_depth);
    scope
}

/// `name=<json>` from `--set`
fn define_variable(scope: &Scope, assignment: &str) -> Result<()> {
    let (name, json) = assignment
        .split_once('=')
        .ok_or_else(|| anyhow!("Invalid --set value {:?}: expected NAME=JSON", assignment))?;
    let value: serde_json::Value = serde_json::from_str(json)
        .with_context(|| format!("Invalid JSON for variable {:?}", name))?;
    let result = scope.set_named_variable(name, json_to_val(&value));
    if let Some(message) = result.message() {
        bail!("Cannot set {:?}: {}", name, message);
    }
    Ok(())
}

fn evaluate(scope: &Rc<Scope>, source: &str) -> Result<EvalResult> {
    crate::eval_source(scope, source).context("Failed to parse script")
}

fn report(result: EvalResult, json: bool) -> Result<()> {
    let value = match result.code {
        ResultCode::Ok | ResultCode::Return => result.value,
        ResultCode::Error => {
            eprintln!("error: {}", result.message().unwrap_or_default());
            std::process::exit(1);
        }
        code => {
            let unexpected = errors::unexpected(code);
            eprintln!("error: {}", unexpected.message().unwrap_or_default());
            std::process::exit(1);
        }
    };

    if json {
        let json = val_to_json(&value).map_err(|e| anyhow!("Cannot convert result to JSON: {}", e))?;
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else if value != Val::Nil {
        println!("{}", value);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_arguments() {
        let cli = Cli::parse_from([
            "cadence",
            "--max-depth",
            "100",
            "run",
            "script.cad",
            "--set",
            "n=3",
            "--set",
            "names=[\"a\"]",
            "--json",
        ]);
        assert_eq!(cli.max_depth, Some(100));
        match cli.command {
            Commands::Run { file, vars, json } => {
                assert_eq!(file, PathBuf::from("script.cad"));
                assert_eq!(vars, vec!["n=3".to_string(), "names=[\"a\"]".to_string()]);
                assert!(json);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_define_variable() {
        let scope = new_root_scope();
        define_variable(&scope, "n=3").expect("valid assignment");
        assert_eq!(scope.get_value("n"), Some(Val::Int(3)));
        assert!(define_variable(&scope, "missing-equals").is_err());
        assert!(define_variable(&scope, "bad={").is_err());
    }

    #[test]
    fn test_evaluate_uses_scope() {
        let scope = new_root_scope();
        define_variable(&scope, "n=20").expect("valid assignment");
        let result = evaluate(&scope, "+ $n 1").expect("parse");
        assert_eq!(result, EvalResult::ok(Val::Int(21)));
    }
}
