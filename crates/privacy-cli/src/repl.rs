//! REPL – interactive shell over the request bridge.
//!
//! Every privacy operation has one slash-command; JSON arguments take the
//! rest of the line, so they may contain spaces.
//!
//!   /set-seed <seed>               /get-seed
//!   /poseidon <int> [<int> …]      /generate-op <json>
//!   /confirm <id>  /abort <id>  /nullify <id>  /confirmed
//!   /execute <json>  /fee <json>  /proof-data <json>
//!   /token-name <address>          /token-decimals <address>
//!   /prove <name> <json-url> <vk-url> <witness-json>
//!   /schema  /config  /help  /quit | /exit

use std::io::{self, BufRead, Write};

use colored::Colorize;
use num_bigint::BigInt;
use privacy_bridge::RequestBridge;
use privacy_types::{
    BridgeError, CircuitInfo, OperationMetadata, ProofQuery, TransactionBody, WitnessInput,
};
use serde_json::Value;
use thiserror::Error;
use tokio::runtime::Runtime;

use crate::config::Config;

/// A parsed shell line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    ShowConfig,
    Schema,
    Quit,
    SetSeed(String),
    GetSeed,
    Poseidon(Vec<BigInt>),
    GenerateOperation(OperationMetadata),
    Confirm(u64),
    Abort(u64),
    Nullify(u64),
    Confirmed,
    Execute(TransactionBody),
    Fee(TransactionBody),
    ProofData(ProofQuery),
    TokenName(String),
    TokenDecimals(String),
    Prove(CircuitInfo, WitnessInput),
}

/// Parse one input line.  The error is a user-facing message.
pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };

    let command = match head {
        "/help" => Command::Help,
        "/config" => Command::ShowConfig,
        "/schema" => Command::Schema,
        "/quit" | "/exit" => Command::Quit,
        "/set-seed" => Command::SetSeed(required(head, rest)?.to_string()),
        "/get-seed" => Command::GetSeed,
        "/poseidon" => {
            let inputs = required(head, rest)?
                .split_whitespace()
                .map(|raw| {
                    raw.parse::<BigInt>()
                        .map_err(|_| format!("not an integer: '{raw}'"))
                })
                .collect::<Result<Vec<_>, _>>()?;
            Command::Poseidon(inputs)
        }
        "/generate-op" => Command::GenerateOperation(OperationMetadata(json_arg(head, rest)?)),
        "/confirm" => Command::Confirm(id_arg(head, rest)?),
        "/abort" => Command::Abort(id_arg(head, rest)?),
        "/nullify" => Command::Nullify(id_arg(head, rest)?),
        "/confirmed" => Command::Confirmed,
        "/execute" => Command::Execute(TransactionBody(json_arg(head, rest)?)),
        "/fee" => Command::Fee(TransactionBody(json_arg(head, rest)?)),
        "/proof-data" => Command::ProofData(ProofQuery(json_arg(head, rest)?)),
        "/token-name" => Command::TokenName(required(head, rest)?.to_string()),
        "/token-decimals" => Command::TokenDecimals(required(head, rest)?.to_string()),
        "/prove" => {
            let mut parts = rest.splitn(4, char::is_whitespace);
            let (Some(name), Some(json_url), Some(vk_url), Some(witness)) =
                (parts.next(), parts.next(), parts.next(), parts.next())
            else {
                return Err("usage: /prove <name> <json-url> <vk-url> <witness-json>".to_string());
            };
            let circuit = CircuitInfo {
                name: name.to_string(),
                json_url: json_url.to_string(),
                vk_url: vk_url.to_string(),
            };
            Command::Prove(circuit, WitnessInput(json_arg(head, witness)?))
        }
        other => return Err(format!("unknown command '{other}'")),
    };
    Ok(command)
}

fn required<'a>(head: &str, rest: &'a str) -> Result<&'a str, String> {
    if rest.is_empty() {
        Err(format!("{head} needs an argument"))
    } else {
        Ok(rest)
    }
}

fn id_arg(head: &str, rest: &str) -> Result<u64, String> {
    let raw = required(head, rest)?;
    raw.parse::<u64>()
        .map_err(|_| format!("{head}: '{raw}' is not an operation id"))
}

fn json_arg(head: &str, rest: &str) -> Result<Value, String> {
    serde_json::from_str(required(head, rest)?.trim())
        .map_err(|e| format!("{head}: invalid JSON: {e}"))
}

/// Why a shell command produced no reply.
#[derive(Error, Debug)]
pub enum ExecError {
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error("could not render reply: {0}")]
    Render(#[from] serde_json::Error),
}

/// Run a privacy command through the bridge and return the reply as JSON.
///
/// Shell-only commands are not accepted here.
pub async fn execute(bridge: &RequestBridge, command: Command) -> Result<Value, ExecError> {
    let reply = match command {
        Command::SetSeed(seed) => bridge.set_seed(seed).await?,
        Command::GetSeed => serde_json::to_value(bridge.get_seed().await?)?,
        Command::Poseidon(inputs) => serde_json::to_value(bridge.poseidon_hash(inputs).await?)?,
        Command::GenerateOperation(metadata) => {
            serde_json::to_value(bridge.generate_operation(metadata).await?)?
        }
        Command::Confirm(id) => bridge.confirm_operation(id).await?,
        Command::Abort(id) => bridge.abort_operation(id).await?,
        Command::Nullify(id) => bridge.nullify_operation(id).await?,
        Command::Confirmed => serde_json::to_value(bridge.get_confirmed_operations().await?)?,
        Command::Execute(body) => bridge.execute_transaction(body).await?,
        Command::Fee(body) => bridge.get_fee_data(body).await?,
        Command::ProofData(body) => bridge.get_proof_data(body).await?,
        Command::TokenName(address) => bridge.get_token_name(address).await?,
        Command::TokenDecimals(address) => bridge.get_token_decimals(address).await?,
        Command::Prove(circuit, witness) => bridge.generate_proof(circuit, witness).await?,
        Command::Help | Command::ShowConfig | Command::Schema | Command::Quit => Value::Null,
    };
    Ok(reply)
}

/// Entry point for the interactive REPL.  Returns on `/quit` or EOF.
pub fn run(runtime: &Runtime, bridge: &RequestBridge, cfg: &Config) {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", "privacy>".bold().cyan());
        stdout.flush().ok();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break, // EOF
            Ok(_) => {}
            Err(e) => {
                eprintln!("{}: {}", "Read error".red(), e);
                break;
            }
        }
        if line.trim().is_empty() {
            continue;
        }

        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(e) => {
                println!("{} {}. Type {} for commands.", "✗".red(), e, "/help".bold());
                continue;
            }
        };

        match command {
            Command::Help => cmd_help(),
            Command::ShowConfig => cmd_config(cfg),
            Command::Schema => cmd_schema(),
            Command::Quit => {
                println!("{}", "Goodbye.".green());
                break;
            }
            call => match runtime.block_on(execute(bridge, call)) {
                Ok(reply) => print_json(&reply),
                Err(e) => println!("{} {}", "✗".red(), e.to_string().red()),
            },
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Shell-only commands
// ─────────────────────────────────────────────────────────────────────────────

fn cmd_help() {
    println!();
    println!("{}", "Privacy Commands".bold().underline());
    let rows = [
        ("/set-seed <seed>", "install the secret seed"),
        ("/get-seed", "show the installed seed"),
        ("/poseidon <int>…", "Poseidon hash of the inputs"),
        ("/generate-op <json>", "start a tracked operation"),
        ("/confirm <id>", "confirm an operation"),
        ("/abort <id>", "abort an operation"),
        ("/nullify <id>", "nullify an operation"),
        ("/confirmed", "list confirmed operations"),
        ("/execute <json>", "submit a transaction"),
        ("/fee <json>", "estimate a transaction fee"),
        ("/proof-data <json>", "fetch proof inputs"),
        ("/token-name <addr>", "token display name"),
        ("/token-decimals <addr>", "token decimal precision"),
        ("/prove <name> <json-url> <vk-url> <json>", "generate a proof"),
        ("/schema", "print the request JSON Schema"),
        ("/config", "show the active configuration"),
        ("/quit  /exit", "exit the shell"),
    ];
    for (usage, what) in rows {
        println!("  {:<44} – {}", usage.bold().cyan(), what);
    }
    println!();
}

fn cmd_config(cfg: &Config) {
    println!("  Relay URL      : {}", cfg.relay_url.yellow());
    println!("  Poll interval  : {} ms", cfg.bridge.poll_interval_ms.to_string().yellow());
    println!("  Wait bound     : {} ms", cfg.bridge.timeout_ms.to_string().yellow());
    println!(
        "  Config file    : {}",
        crate::config::config_path().display().to_string().dimmed()
    );
}

fn cmd_schema() {
    match serde_json::to_string_pretty(&privacy_types::message_schema()) {
        Ok(schema) => println!("{schema}"),
        Err(e) => println!("{}: {}", "Schema error".red(), e),
    }
}

fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text.green()),
        Err(_) => println!("{value}"),
    }
}
