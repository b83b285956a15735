use std::process::ExitCode;

use clap::Parser;

use bkmk_cli::cli_args::Args;
use bkmk_cli::commands::dispatch;

fn main() -> ExitCode {
    env_logger::init();

    match dispatch(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
