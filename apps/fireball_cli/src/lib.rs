//! Build orchestration for the `fireball` command.
//!
//! The CLI is a thin driver over [`fireball_compile`]: it reads the file
//! set, runs each file through the pipeline, prints diagnostics as
//! `file:line:column: severity: message`, writes the `.ll` artifact, and
//! hands it to the external compiler for the object file.

pub mod cli;

use fireball_compile::{compile, Compiler};
use std::fs;
use std::path::{Path, PathBuf};

/// A build request for a set of source files.
pub struct BuildConfig {
    pub files: Vec<PathBuf>,
    /// Explicit object path; only valid for a single-file build.
    pub output: Option<PathBuf>,
    pub opt_level: u8,
    /// Stop after writing the `.ll` files.
    pub emit_ir: bool,
}

/// Errors surfaced to the user by the build command.
#[derive(Debug)]
pub enum CliError {
    /// Reading a source file or writing an artifact failed.
    Io(PathBuf, String),
    /// `-o` was combined with more than one source file.
    OutputWithManyFiles,
    /// Compilation reported error diagnostics (already printed).
    CompileFailed,
    /// The external compiler failed.
    Build(fireball_compile::BuildError),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Io(path, e) => write!(f, "{}: {}", path.display(), e),
            CliError::OutputWithManyFiles => {
                write!(f, "'-o' cannot be used with multiple source files")
            }
            CliError::CompileFailed => write!(f, "compilation failed"),
            CliError::Build(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CliError {}

/// Compiles every file in the request to an object file.
pub fn build(config: &BuildConfig) -> Result<(), CliError> {
    if config.output.is_some() && config.files.len() > 1 {
        return Err(CliError::OutputWithManyFiles);
    }

    let mut failed = false;

    for file in &config.files {
        let source = fs::read_to_string(file)
            .map_err(|e| CliError::Io(file.clone(), e.to_string()))?;
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.display().to_string());

        log::info!("compiling {}", file.display());
        let output = compile(&file_name, &source);

        for diagnostic in &output.diagnostics {
            eprintln!(
                "{}:{}:{}: {}: {}",
                file.display(),
                diagnostic.range.start.line,
                diagnostic.range.start.column,
                diagnostic.severity,
                diagnostic.message
            );
        }

        let Some(ir) = output.ir else {
            failed = true;
            continue;
        };

        let object_path = match &config.output {
            Some(path) => path.clone(),
            None => file.with_extension("o"),
        };
        let ir_path = object_path.with_extension("ll");

        fs::write(&ir_path, &ir).map_err(|e| CliError::Io(ir_path.clone(), e.to_string()))?;
        log::info!("wrote {}", ir_path.display());

        if config.emit_ir {
            continue;
        }

        Compiler::new(config.opt_level)
            .compile(&ir_path, &object_path)
            .map_err(CliError::Build)?;
        log::info!("wrote {}", object_path.display());
    }

    if failed {
        return Err(CliError::CompileFailed);
    }

    Ok(())
}

/// Derives the object path the build will write for a source file.
pub fn object_path(file: &Path, output: Option<&Path>) -> PathBuf {
    match output {
        Some(path) => path.to_path_buf(),
        None => file.with_extension("o"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emit_ir_writes_the_module_next_to_the_object() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("main.fb");
        fs::write(&source, "func main() -> i32 { return 0; }").unwrap();

        let config = BuildConfig {
            files: vec![source.clone()],
            output: None,
            opt_level: 0,
            emit_ir: true,
        };
        build(&config).unwrap();

        let ir = fs::read_to_string(source.with_extension("ll")).unwrap();
        assert!(ir.contains("define i32 @main()"));
    }

    #[test]
    fn compile_errors_fail_the_build() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("bad.fb");
        fs::write(&source, "func main() { return x; }").unwrap();

        let config = BuildConfig {
            files: vec![source],
            output: None,
            opt_level: 0,
            emit_ir: true,
        };
        assert!(matches!(build(&config), Err(CliError::CompileFailed)));
    }

    #[test]
    fn output_with_many_files_is_rejected() {
        let config = BuildConfig {
            files: vec![PathBuf::from("a.fb"), PathBuf::from("b.fb")],
            output: Some(PathBuf::from("out.o")),
            opt_level: 0,
            emit_ir: true,
        };
        assert!(matches!(build(&config), Err(CliError::OutputWithManyFiles)));
    }

    #[test]
    fn object_path_derives_from_the_source_name() {
        assert_eq!(
            object_path(Path::new("src/main.fb"), None),
            PathBuf::from("src/main.o")
        );
        assert_eq!(
            object_path(Path::new("main.fb"), Some(Path::new("build/out.o"))),
            PathBuf::from("build/out.o")
        );
    }
}
