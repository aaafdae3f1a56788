//! Config validation CLI tool
//!
//! Validates a workpulsed configuration file and reports any errors.

use std::path::PathBuf;
use std::process::ExitCode;
use workpulse_util::default_config_path;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1) {
        Some(path) => PathBuf::from(path),
        None => {
            let default_path = default_config_path();
            eprintln!("Usage: validate-config [config-file]");
            eprintln!();
            eprintln!("Validates a workpulsed configuration file.");
            eprintln!();
            eprintln!("If no path is provided, uses: {}", default_path.display());
            return ExitCode::from(2);
        }
    };

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    match workpulse_config::load_config(&config_path) {
        Ok(settings) => {
            println!("✓ Configuration is valid");
            println!();
            println!("Summary:");
            println!("  Config version:   {}", workpulse_config::CURRENT_CONFIG_VERSION);
            println!("  HTTP ingress:     {}", settings.service.http_addr);
            println!("  Push channel:     {}", settings.service.push_addr);
            println!("  Ledger:           {}", settings.service.ledger_path().display());
            println!("  Tick interval:    {:?}", settings.service.tick_interval);
            println!("  Shutdown timeout: {:?}", settings.service.shutdown_timeout);
            println!("  Start marker:     {:?}", settings.markers.start);
            println!("  Complete marker:  {:?}", settings.markers.complete);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration is invalid");
            eprintln!();
            match e {
                workpulse_config::ConfigError::ValidationFailed { errors } => {
                    for error in errors {
                        eprintln!("  - {}", error);
                    }
                }
                other => eprintln!("  {}", other),
            }
            ExitCode::from(1)
        }
    }
}
