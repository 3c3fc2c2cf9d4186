//! credupe - password-manager export deduplicator
//!
//! Entry point for the credupe CLI.

use clap::Parser;
use credupe::{
    cli::Cli,
    error::{hint_for, ExitCode, StructuredError},
};

fn main() {
    let cli = Cli::parse();
    let json_errors = cli.json_errors;

    match credupe::run_app(cli) {
        Ok(code) => std::process::exit(code.as_i32()),
        Err(err) => {
            let exit_code = ExitCode::from_error(&err);

            if json_errors {
                let structured = StructuredError::new(&err, exit_code);
                match serde_json::to_string_pretty(&structured) {
                    Ok(json) => eprintln!("{}", json),
                    Err(_) => eprintln!("[{}] Error: {:#}", exit_code.code_prefix(), err),
                }
            } else {
                eprintln!("[{}] Error: {:#}", exit_code.code_prefix(), err);
                if let Some(hint) = hint_for(&err) {
                    eprintln!("hint: {}", hint);
                }
            }

            std::process::exit(exit_code.as_i32());
        }
    }
}
