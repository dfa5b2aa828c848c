//! Command line definition.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fireball", version, about = "The Fireball compiler")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Compile source files to object files.
    Build {
        /// Source files to compile; each becomes one object file.
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output object path; only valid with a single source file.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Optimization level passed to the native compiler.
        #[arg(short = 'O', long = "opt-level", default_value_t = 0)]
        opt_level: u8,

        /// Stop after writing the .ll files.
        #[arg(long)]
        emit_ir: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn build_parses_its_flags() {
        let cli = Cli::parse_from(["fireball", "build", "main.fb", "-O2", "--emit-ir"]);
        let Command::Build { files, opt_level, emit_ir, output } = cli.command;
        assert_eq!(files, vec![PathBuf::from("main.fb")]);
        assert_eq!(opt_level, 2);
        assert!(emit_ir);
        assert!(output.is_none());
    }
}
