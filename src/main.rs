use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use twoparty_chaincode::{
    ledger::state_root, store::FileStore, ChaincodeError, ContractConfig, ErrorResponse,
    OverdraftPolicy, Response, TwoPartyContract, WriteMode,
};

/// Drive the two-party ledger contract against a JSON state file.
#[derive(Parser, Debug)]
#[command(name = "twoparty", version, about)]
struct Cli {
    /// Ledger state file
    #[arg(long, global = true, default_value = "ledger.json")]
    state: PathBuf,

    /// JSON contract config (overdraft, write_mode)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Reject transfers that would take the source below zero
    #[arg(long, global = true)]
    no_overdraft: bool,

    /// Recovery strategy when the second transfer write fails
    #[arg(long, global = true)]
    write_mode: Option<WriteMode>,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Set both balances: <accountA> <balanceA> <accountB> <balanceB>
    Init {
        #[arg(num_args = 0.., allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Call the write entry point by function name (init, invoke, delete)
    Invoke {
        function: String,
        #[arg(num_args = 0.., allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Move an amount: <source> <destination> <amount>
    Transfer {
        #[arg(num_args = 0.., allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Remove an account
    Delete {
        #[arg(num_args = 0.., allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Print {"name", "amount"} for an account
    Query {
        #[arg(num_args = 0.., allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Print the SHA-256 merkle root of the whole state file
    StateRoot,
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "twoparty_chaincode=debug,twoparty=debug"
    } else {
        "twoparty_chaincode=info,twoparty=info"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(cli: &Cli) -> Result<ContractConfig> {
    let mut config = match &cli.config {
        Some(path) => ContractConfig::load(path)?,
        None => ContractConfig::default(),
    };
    if cli.no_overdraft {
        config.overdraft = OverdraftPolicy::Deny;
    }
    if let Some(mode) = cli.write_mode {
        config.write_mode = mode;
    }
    Ok(config)
}

/// Runs one contract call. The outer error is CLI plumbing, the inner one
/// is the contract's answer; `Ok(Some(line))` is what goes to stdout.
fn execute(cli: &Cli) -> Result<std::result::Result<Option<String>, ChaincodeError>> {
    let contract = TwoPartyContract::new(load_config(cli)?);
    debug!(config = ?contract.config(), state = %cli.state.display(), "contract ready");
    let mut store = FileStore::open(&cli.state)
        .with_context(|| format!("open state file {}", cli.state.display()))?;

    let outcome = match &cli.command {
        Command::Init { args } => contract.dispatch(&mut store, "init", args.as_slice()),
        Command::Invoke { function, args } => contract
            .invoke(&mut store, function, args.as_slice())
            .map(|_| Response::Committed),
        Command::Transfer { args } => contract.dispatch(&mut store, "invoke", args.as_slice()),
        Command::Delete { args } => contract.dispatch(&mut store, "delete", args.as_slice()),
        Command::Query { args } => contract
            .query(&store, "query", args.as_slice())
            .map(Response::Balance),
        Command::StateRoot => {
            let entries = store.entries().context("read state entries")?;
            return Ok(Ok(Some(hex::encode(state_root(&entries)))));
        }
    };
    Ok(match outcome {
        Ok(Response::Committed) => Ok(None),
        Ok(Response::Balance(q)) => Ok(Some(
            serde_json::to_string(&q).context("encode query response")?,
        )),
        Err(err) => Err(err),
    })
}

/// What the process prints and how it exits.
#[derive(Debug, PartialEq, Eq)]
struct Report {
    code: u8,
    stdout: Option<String>,
    stderr: Option<String>,
}

/// Exit 0 on success, 1 with `{"error": ...}` on stdout when the contract
/// refuses, 2 when the CLI itself fails.
fn report(outcome: Result<std::result::Result<Option<String>, ChaincodeError>>) -> Report {
    match outcome {
        Ok(Ok(stdout)) => Report {
            code: 0,
            stdout,
            stderr: None,
        },
        Ok(Err(err)) => Report {
            code: 1,
            stdout: Some(
                serde_json::to_string(&ErrorResponse::from(&err))
                    .unwrap_or_else(|_| err.to_string()),
            ),
            stderr: None,
        },
        Err(err) => Report {
            code: 2,
            stdout: None,
            stderr: Some(format!("error: {err:#}")),
        },
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let report = report(execute(&cli));
    if let Some(line) = &report.stdout {
        println!("{line}");
    }
    if let Some(line) = &report.stderr {
        eprintln!("{line}");
    }
    ExitCode::from(report.code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn parse(state: &Path, rest: &[&str]) -> Cli {
        let state = state.to_str().unwrap();
        let mut argv = vec!["twoparty", "--state", state];
        argv.extend_from_slice(rest);
        Cli::try_parse_from(argv).unwrap()
    }

    fn run(state: &Path, rest: &[&str]) -> Report {
        report(execute(&parse(state, rest)))
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("contract.json");
        std::fs::write(&config, r#"{"overdraft":"allow","write_mode":"compensating"}"#).unwrap();
        let config = config.to_str().unwrap();
        let state = dir.path().join("ledger.json");

        let cli = parse(&state, &["--config", config, "query", "a"]);
        assert_eq!(load_config(&cli).unwrap(), ContractConfig::default());

        let cli = parse(
            &state,
            &[
                "--config",
                config,
                "--no-overdraft",
                "--write-mode",
                "sequential",
                "query",
                "a",
            ],
        );
        let loaded = load_config(&cli).unwrap();
        assert_eq!(loaded.overdraft, OverdraftPolicy::Deny);
        assert_eq!(loaded.write_mode, WriteMode::Sequential);
    }

    #[test]
    fn query_prints_json_and_exits_zero() {
        let dir = tempfile::tempdir().unwrap();
        let state = dir.path().join("ledger.json");
        assert_eq!(run(&state, &["init", "A", "100", "B", "50"]).code, 0);
        assert_eq!(run(&state, &["transfer", "A", "B", "30"]).code, 0);
        assert_eq!(
            run(&state, &["query", "B"]),
            Report {
                code: 0,
                stdout: Some(r#"{"name":"B","amount":"80"}"#.to_string()),
                stderr: None,
            }
        );
        let root = run(&state, &["state-root"]).stdout.unwrap();
        assert_eq!(root.len(), 64);
    }

    #[test]
    fn contract_error_prints_error_json_and_exits_one() {
        let dir = tempfile::tempdir().unwrap();
        let state = dir.path().join("ledger.json");
        assert_eq!(
            run(&state, &["query", "ghost"]),
            Report {
                code: 1,
                stdout: Some(r#"{"error":"entity not found: ghost"}"#.to_string()),
                stderr: None,
            }
        );
        let failed = run(&state, &["invoke", "frobnicate"]);
        assert_eq!(failed.code, 1);
        assert!(failed.stdout.unwrap().starts_with(r#"{"error":"#));
    }

    #[test]
    fn plumbing_failure_exits_two() {
        let dir = tempfile::tempdir().unwrap();
        let state = dir.path().join("ledger.json");
        let missing = dir.path().join("missing.json");
        let failed = run(&state, &["--config", missing.to_str().unwrap(), "query", "a"]);
        assert_eq!(failed.code, 2);
        assert_eq!(failed.stdout, None);
        assert!(failed.stderr.unwrap().contains("read config"));
    }

    #[test]
    fn hyphenated_accounts_reach_every_command() {
        let dir = tempfile::tempdir().unwrap();
        let state = dir.path().join("ledger.json");
        assert_eq!(run(&state, &["init", "-x", "5", "y", "1"]).code, 0);
        assert_eq!(
            run(&state, &["query", "-x"]).stdout,
            Some(r#"{"name":"-x","amount":"5"}"#.to_string())
        );
        assert_eq!(run(&state, &["delete", "-x"]).code, 0);
        assert_eq!(run(&state, &["query", "-x"]).code, 1);
    }
}
