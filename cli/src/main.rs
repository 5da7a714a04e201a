//! evmatch CLI — driving adapter for the evmatch predicate chains.
//!
//! Subcommands:
//! - `eval <config> [--event <file>] [--trace]` — evaluate an event (file or stdin)
//! - `check <config>` — validate config compiles without errors
//! - `parse <expression>...` — show how property expressions are parsed

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use evmatch::{Dispatcher, ExpectedValue, MatchExpression, MetadataChangeEvent, NotificationConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "evmatch")]
#[command(version, about = "Match metadata-change events against notification criteria")]
struct Cli {
    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate an event against a notification config
    Eval {
        /// Notification config (.json, otherwise YAML)
        config: PathBuf,

        /// Event JSON file (reads stdin when omitted)
        #[arg(short, long)]
        event: Option<PathBuf>,

        /// Print the full evaluation trace
        #[arg(long)]
        trace: bool,
    },

    /// Validate a notification config
    Check {
        /// Notification config (.json, otherwise YAML)
        config: PathBuf,
    },

    /// Show how property expressions are parsed
    Parse {
        /// Expressions such as `owner=alice` or `tier=*`
        #[arg(required = true)]
        expressions: Vec<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Eval {
            config,
            event,
            trace,
        } => cmd_eval(&config, event.as_deref(), trace),
        Command::Check { config } => cmd_check(&config),
        Command::Parse { expressions } => cmd_parse(&expressions),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

// ═══════════════════════════════════════════════════════════════════════════════
// Commands
// ═══════════════════════════════════════════════════════════════════════════════

fn cmd_eval(config_path: &Path, event_path: Option<&Path>, trace: bool) -> Result<()> {
    let dispatcher = load_dispatcher(config_path)?;
    let event = read_event(event_path)?;

    let output = if trace {
        let trace = dispatcher
            .evaluate_with_trace(&event)
            .context("evaluation failed")?;
        serde_json::to_value(&trace)?
    } else {
        let dispatch = dispatcher.evaluate(&event).context("evaluation failed")?;
        eval_output(dispatch)
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn cmd_check(config_path: &Path) -> Result<()> {
    let dispatcher = load_dispatcher(config_path)?;
    println!(
        "Config valid: {} chain(s), {} applicable",
        dispatcher.len(),
        dispatcher.applicable().count()
    );
    Ok(())
}

fn cmd_parse(expressions: &[String]) -> Result<()> {
    for raw in expressions {
        let expr = MatchExpression::parse(raw)?;
        println!("{}", describe(&expr));
    }
    Ok(())
}

fn eval_output(dispatch: Option<evmatch::Dispatch>) -> serde_json::Value {
    match dispatch {
        Some(dispatch) => serde_json::json!({
            "matched": true,
            "matchType": dispatch.match_type,
            "properties": dispatch.properties,
        }),
        None => serde_json::json!({ "matched": false }),
    }
}

fn describe(expr: &MatchExpression) -> String {
    match expr.expected() {
        ExpectedValue::Present => format!("{}: present and non-empty", expr.key()),
        ExpectedValue::Exact(v) => format!("{}: equals {v:?}", expr.key()),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Loading
// ═══════════════════════════════════════════════════════════════════════════════

fn load_dispatcher(path: &Path) -> Result<Dispatcher> {
    let config = load_config(path)?;
    let dispatcher = Dispatcher::from_config(&config)
        .with_context(|| format!("config \"{}\" is invalid", path.display()))?;
    tracing::debug!(
        chains = dispatcher.len(),
        applicable = dispatcher.applicable().count(),
        "config loaded"
    );
    Ok(dispatcher)
}

fn load_config(path: &Path) -> Result<NotificationConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read \"{}\"", path.display()))?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        serde_json::from_str(&content).context("JSON parse error")
    } else {
        // Default to YAML (handles .yaml and .yml)
        serde_yaml::from_str(&content).context("YAML parse error")
    }
}

fn read_event(path: Option<&Path>) -> Result<MetadataChangeEvent> {
    let content = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read \"{}\"", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read event from stdin")?;
            buf
        }
    };
    Ok(MetadataChangeEvent::from_json(&content)?)
}
