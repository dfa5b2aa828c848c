//! The external object-code compiler.
//!
//! Fireball performs no native code generation of its own: the emitted
//! `.ll` module is handed to `llc`, which produces the object file. This
//! module owns that invocation:
//!
//! ```text
//! llc input.ll -O{0..3} --filetype obj -o output.o [--frame-pointer all]
//! ```
//!
//! `--frame-pointer all` is appended at `-O0` so unoptimized builds keep
//! usable stack traces. A non-zero exit surfaces the tool's stderr
//! verbatim as the error message.

use std::path::Path;
use std::process::Command;

/// Errors from driving the external compiler.
#[derive(Debug)]
pub enum BuildError {
    /// `llc` could not be spawned (missing binary, I/O failure).
    Io(String),
    /// `llc` ran and failed; carries its stderr verbatim.
    Llc(String),
}

impl std::fmt::Display for BuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildError::Io(e) => write!(f, "failed to run llc: {}", e),
            BuildError::Llc(stderr) => write!(f, "{}", stderr),
        }
    }
}

impl std::error::Error for BuildError {}

/// Drives `llc` over an emitted IR module.
pub struct Compiler {
    /// Optimization level passed through as `-O{n}`, clamped to 0..=3.
    pub optimization_level: u8,
}

impl Compiler {
    pub fn new(optimization_level: u8) -> Self {
        Compiler {
            optimization_level: optimization_level.min(3),
        }
    }

    /// The argument list for one invocation.
    fn arguments(&self, input: &Path, output: &Path) -> Vec<String> {
        let mut args = vec![
            input.display().to_string(),
            format!("-O{}", self.optimization_level),
            "--filetype".to_string(),
            "obj".to_string(),
            "-o".to_string(),
            output.display().to_string(),
        ];

        if self.optimization_level == 0 {
            args.push("--frame-pointer".to_string());
            args.push("all".to_string());
        }

        args
    }

    /// Compiles `input` (LLVM IR text) to `output` (an object file).
    pub fn compile(&self, input: &Path, output: &Path) -> Result<(), BuildError> {
        let args = self.arguments(input, output);
        log::info!("llc {}", args.join(" "));

        let result = Command::new("llc")
            .args(&args)
            .output()
            .map_err(|e| BuildError::Io(e.to_string()))?;

        if !result.status.success() {
            return Err(BuildError::Llc(
                String::from_utf8_lossy(&result.stderr).into_owned(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn args_for(level: u8) -> Vec<String> {
        Compiler::new(level).arguments(&PathBuf::from("main.ll"), &PathBuf::from("main.o"))
    }

    #[test]
    fn arguments_follow_the_llc_contract() {
        let args = args_for(2);
        assert_eq!(args, vec!["main.ll", "-O2", "--filetype", "obj", "-o", "main.o"]);
    }

    #[test]
    fn level_zero_keeps_frame_pointers() {
        let args = args_for(0);
        assert_eq!(
            args,
            vec!["main.ll", "-O0", "--filetype", "obj", "-o", "main.o", "--frame-pointer", "all"]
        );
    }

    #[test]
    fn optimization_level_is_clamped() {
        assert_eq!(Compiler::new(9).optimization_level, 3);
    }

    #[test]
    fn missing_binary_reports_io_error() {
        // Point PATH at an empty directory so the spawn itself fails.
        let dir = tempfile::tempdir().unwrap();
        let old_path = std::env::var_os("PATH");
        std::env::set_var("PATH", dir.path());

        let result = Compiler::new(0).compile(&PathBuf::from("in.ll"), &PathBuf::from("out.o"));

        match old_path {
            Some(path) => std::env::set_var("PATH", path),
            None => std::env::remove_var("PATH"),
        }

        assert!(matches!(result, Err(BuildError::Io(_))));
    }
}
