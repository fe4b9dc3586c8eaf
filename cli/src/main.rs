//! Courier CLI - shell access to the demonstration bank application.
//!
//! ```text
//! courier call <Type> <method> [payload|-]   invoke one method, print the result envelope
//! courier types                              list remotely invocable methods
//! ```
//!
//! The payload is a JSON call object (`{"target": ..., "arguments": [...]}`).
//! When it is `-` or omitted the payload is read from stdin; empty input
//! stands for `{}`.
//!
//! Settings come from `~/.courier/config.toml` (see [`courier_config`]).
//! Logs go to stderr so stdout carries only envelopes.

mod bank;

use std::io::{self, Read};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use courier_config::CourierConfig;
use courier_dispatch::{Application, ResultEnvelope};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const DEFAULT_APPLICATION: &str = "bank";

const USAGE: &str = "\
Usage:
  courier call <Type> <method> [payload|-]
  courier types";

/// `RUST_LOG` wins over the configured filter, which wins over `info`.
fn init_tracing(configured: Option<&str>) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| configured.map_or_else(|| EnvFilter::try_new("info"), EnvFilter::try_new))
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(env_filter)
        .init();
}

fn load_config() -> CourierConfig {
    match CourierConfig::load() {
        Ok(config) => {
            init_tracing(config.logging.filter.as_deref());
            config
        }
        Err(err) => {
            init_tracing(None);
            tracing::warn!("Ignoring unusable config: {err}");
            CourierConfig::default()
        }
    }
}

fn build_application(config: &CourierConfig) -> Result<Application> {
    let name = config
        .application
        .name
        .as_deref()
        .unwrap_or(DEFAULT_APPLICATION);
    let ledger = Arc::new(bank::Ledger::default());
    let app = bank::builder(name, &ledger)
        .whitelist_properties(config.application.whitelist_properties)
        .max_depth(config.codec.max_depth)
        .pretty(config.codec.pretty)
        .build()
        .context("Failed to configure the bank application")?;
    Ok(app)
}

fn read_payload(argument: Option<&str>) -> Result<String> {
    let payload = match argument {
        Some("-") | None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read payload from stdin")?;
            buffer
        }
        Some(inline) => inline.to_string(),
    };
    if payload.trim().is_empty() {
        return Ok("{}".to_string());
    }
    Ok(payload)
}

fn call(app: &Application, args: &[String]) -> Result<ExitCode> {
    let (type_name, method) = match args {
        [type_name, method, ..] if args.len() <= 3 => (type_name.as_str(), method.as_str()),
        _ => bail!("call expects <Type> <method> [payload|-]\n\n{USAGE}"),
    };
    let payload = read_payload(args.get(2).map(String::as_str))?;

    let output = app.invoke_json(type_name, method, &payload);
    println!("{output}");

    let succeeded = matches!(
        serde_json::from_str::<ResultEnvelope>(&output),
        Ok(envelope) if !envelope.is_failure()
    );
    Ok(if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn list_types(app: &Application) {
    for type_name in app.remote_types() {
        println!("{type_name}");
        for method in app.remote_methods(type_name) {
            let parameters = method
                .parameters()
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            let prefix = if method.is_static() { "static " } else { "" };
            println!("  {prefix}{}({parameters})", method.name());
        }
    }
}

fn main() -> Result<ExitCode> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = load_config();
    let app = build_application(&config)?;

    match args.first().map(String::as_str) {
        Some("call") => call(&app, &args[1..]),
        Some("types") => {
            list_types(&app);
            Ok(ExitCode::SUCCESS)
        }
        Some("-h" | "--help" | "help") => {
            println!("{USAGE}");
            Ok(ExitCode::SUCCESS)
        }
        Some(other) => bail!("Unknown command: {other}\n\n{USAGE}"),
        None => bail!("Missing command\n\n{USAGE}"),
    }
}
