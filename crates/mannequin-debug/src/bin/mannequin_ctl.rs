//! mannequin-ctl - send tooling commands to a running mannequin instance
//!
//! Usage:
//!   mannequin-ctl [--addr HOST:PORT] '<command json>'
//!   mannequin-ctl [--addr HOST:PORT] < commands.jsonl
//!
//! With no command argument, every non-empty stdin line is sent in turn.

use std::io::{self, BufRead};
use std::process::ExitCode;

use mannequin_debug::{DebugClient, DebugResponse, DEFAULT_PORT};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let mut addr = format!("127.0.0.1:{}", DEFAULT_PORT);
    let mut command = None;

    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--addr" => {
                i += 1;
                match args.get(i) {
                    Some(value) => addr = value.clone(),
                    None => {
                        eprintln!("--addr needs a value");
                        return ExitCode::FAILURE;
                    }
                }
            }
            "--help" | "-h" => {
                println!("Usage: mannequin-ctl [--addr HOST:PORT] ['<command json>']");
                println!();
                println!("Example: mannequin-ctl '{{\"cmd\":\"ListPoses\"}}'");
                return ExitCode::SUCCESS;
            }
            other => command = Some(other.to_string()),
        }
        i += 1;
    }

    let mut client = match DebugClient::connect(addr.as_str()) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Cannot reach mannequin on {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    let lines: Vec<String> = match command {
        Some(cmd) => vec![cmd],
        None => io::stdin()
            .lock()
            .lines()
            .map_while(Result::ok)
            .filter(|l| !l.trim().is_empty())
            .collect(),
    };

    let mut failed = false;
    for line in lines {
        match client.send_raw(&line) {
            Ok(response) => {
                failed |= matches!(response, DebugResponse::Error { .. });
                match serde_json::to_string_pretty(&response) {
                    Ok(text) => println!("{}", text),
                    Err(e) => eprintln!("Cannot print response: {}", e),
                }
            }
            Err(e) => {
                eprintln!("{}", e);
                return ExitCode::FAILURE;
            }
        }
    }

    if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}
