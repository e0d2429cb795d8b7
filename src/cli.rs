// SPDX-License-Identifier: Apache-2.0

//! `querygate` command line front-end
//!
//! Runs single statements through a gateway on a SQLite database, reports the
//! reputation score of an address, and prints the diagnostic log.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use gate_core::{ClientContext, LedgerStore};
use gate_drivers::{SqliteConnector, SqliteLedgerStore};
use serde_json::json;

use crate::config::{DbConfigLayer, GatewayConfig};
use crate::diagnostics::DiagnosticLogger;
use crate::gateway::{Gateway, GatewayServices};
use crate::observability;
use crate::reputation::ReputationLedger;

#[derive(Debug, Parser)]
#[command(name = "querygate")]
#[command(about = "Secure query gateway with per-client reputation scoring")]
pub struct Cli {
    /// JSON configuration file; defaults apply when it does not exist
    #[arg(long, default_value = "./querygate.json")]
    config: PathBuf,

    /// SQLite database file; overrides `db.name` from the configuration
    #[arg(long)]
    db: Option<PathBuf>,

    /// Directory for the rolling tracing log
    #[arg(long)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Execute one statement on behalf of a client
    Exec(ExecArgs),
    /// Print the reputation score of an address
    Score(ScoreArgs),
    /// Print the diagnostic log
    Logs,
}

#[derive(Debug, Args)]
pub struct ExecArgs {
    #[arg(long)]
    sql: String,
    /// `name=value` or `name=value~pattern`; repeatable
    #[arg(long = "param", value_parser = parse_param)]
    params: Vec<ParamArg>,
    #[arg(long)]
    ip: String,
    #[arg(long)]
    user: Option<String>,
}

#[derive(Debug, Args)]
pub struct ScoreArgs {
    #[arg(long)]
    ip: String,
}

/// One `--param` argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamArg {
    pub name: String,
    pub value: String,
    pub pattern: Option<String>,
}

/// Parses `name=value[~pattern]`. The pattern starts after the first `~`
/// following the `=`.
pub fn parse_param(raw: &str) -> Result<ParamArg, String> {
    let (name, rest) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{raw}'"))?;
    if name.trim().is_empty() {
        return Err(format!("missing parameter name in '{raw}'"));
    }

    let (value, pattern) = match rest.split_once('~') {
        Some((value, pattern)) => (value, Some(pattern.to_string())),
        None => (rest, None),
    };

    Ok(ParamArg {
        name: name.trim().to_string(),
        value: value.to_string(),
        pattern,
    })
}

/// Runs a parsed command line.
///
/// # Errors
/// Returns an error when configuration, storage or the statement fails.
pub fn run_cli(cli: Cli) -> Result<()> {
    observability::init_tracing(cli.log_dir.as_deref());

    let mut config = GatewayConfig::load(&cli.config)?;
    if let Some(db) = &cli.db {
        config.db.name = Some(db.display().to_string());
    }

    match cli.command {
        Command::Exec(args) => run_exec(&config, args),
        Command::Score(args) => run_score(&config, &args),
        Command::Logs => {
            let logger = DiagnosticLogger::from_config(&config.log);
            print!("{}", logger.get_logs()?);
            Ok(())
        }
    }
}

fn run_exec(config: &GatewayConfig, args: ExecArgs) -> Result<()> {
    let store = open_ledger_store(config)?;
    let services = GatewayServices::from_config(config, store);

    let mut client = ClientContext::new(args.ip);
    if let Some(user) = args.user {
        client = client.with_user(user);
    }

    let mut gateway = Gateway::connect(
        config,
        &sqlite_session_layer(),
        &SqliteConnector,
        services,
        client,
    )?;

    gateway.set_query(args.sql);
    for param in args.params {
        gateway.add_param(&param.name, param.value, param.pattern.as_deref())?;
    }

    let result = gateway.execute()?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn run_score(config: &GatewayConfig, args: &ScoreArgs) -> Result<()> {
    let ledger = ReputationLedger::new(
        open_ledger_store(config)?,
        config.security.error_points_threshold,
    );
    let score = ledger.score(&args.ip)?;
    let events = ledger.events(&args.ip)?;

    let report = json!({
        "ip": args.ip,
        "score": score,
        "threshold": ledger.threshold(),
        "blocked": score >= ledger.threshold(),
        "events": events,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// The ledger lives in `security.ledger_path`, or next to the application
/// tables when that is unset.
fn open_ledger_store(config: &GatewayConfig) -> Result<Arc<dyn LedgerStore>> {
    let path = match (&config.security.ledger_path, &config.db.name) {
        (Some(path), _) => path.clone(),
        (None, Some(name)) => PathBuf::from(name),
        (None, None) => return Err(anyhow!("no database given: pass --db or set db.name")),
    };

    let store = SqliteLedgerStore::open(Path::new(&path))
        .with_context(|| format!("failed to open ledger store at {}", path.display()))?;
    Ok(Arc::new(store))
}

/// Stand-in for the web session: a local SQLite file has no host or
/// credentials.
fn sqlite_session_layer() -> DbConfigLayer {
    DbConfigLayer {
        host: Some("localhost".to_string()),
        driver: Some("sqlite".to_string()),
        ..DbConfigLayer::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn param_without_pattern() {
        let param = parse_param("id=42").unwrap();
        assert_eq!(param.name, "id");
        assert_eq!(param.value, "42");
        assert_eq!(param.pattern, None);
    }

    #[test]
    fn param_with_pattern() {
        let param = parse_param(r":id=42~^\d+$").unwrap();
        assert_eq!(param.name, ":id");
        assert_eq!(param.value, "42");
        assert_eq!(param.pattern.as_deref(), Some(r"^\d+$"));
    }

    #[test]
    fn value_may_contain_equals() {
        let param = parse_param("q=a=b").unwrap();
        assert_eq!(param.value, "a=b");
    }

    #[test]
    fn malformed_params_are_rejected() {
        assert!(parse_param("novalue").is_err());
        assert!(parse_param("=x").is_err());
    }

    #[test]
    fn cli_parses_exec() {
        let cli = Cli::try_parse_from([
            "querygate",
            "--db",
            "app.db",
            "exec",
            "--sql",
            "SELECT 1",
            "--param",
            "a=1",
            "--ip",
            "10.0.0.5",
        ])
        .unwrap();
        match cli.command {
            Command::Exec(args) => {
                assert_eq!(args.ip, "10.0.0.5");
                assert_eq!(args.params.len(), 1);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
