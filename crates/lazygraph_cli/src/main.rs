//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `lazygraph_core` linkage and store bootstrap from the environment.
//! - Keep output deterministic for quick local sanity checks.

use lazygraph_core::db::migrations::current_version;
use lazygraph_core::{core_version, init_logging_from, ping, CoreConfig, GraphService};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("lazygraph_core ping={}", ping());
    println!("lazygraph_core version={}", core_version());

    let config = match CoreConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("config error: {err}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(err) = init_logging_from(&config) {
        eprintln!("logging error: {err}");
        return ExitCode::FAILURE;
    }

    let service = match GraphService::open(&config) {
        Ok(service) => service,
        Err(err) => {
            eprintln!("store error: {err}");
            return ExitCode::FAILURE;
        }
    };
    println!(
        "lazygraph_core keep_alive={}",
        if service.keep_alive().is_some() { "on" } else { "off" }
    );
    let schema = service
        .db()
        .read(|tx| current_version(tx))
        .map_err(|err| err.to_string());
    match schema {
        Ok(version) => {
            println!("lazygraph_core schema_version={version}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("store error: {err}");
            ExitCode::FAILURE
        }
    }
}
