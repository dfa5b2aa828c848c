use clap::Parser;
use fireball_cli::cli::{Cli, Command};
use fireball_cli::{build, BuildConfig};
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Command::Build { files, output, opt_level, emit_ir } => {
            let config = BuildConfig { files, output, opt_level, emit_ir };
            match build(&config) {
                Ok(()) => ExitCode::SUCCESS,
                Err(error) => {
                    eprintln!("error: {}", error);
                    ExitCode::FAILURE
                }
            }
        }
    }
}
