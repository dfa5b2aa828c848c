//! The compilation pipeline entry point.
//!
//! [`compile`] runs one source file through scan → parse → check →
//! codegen and returns the IR text together with every diagnostic
//! collected along the way. Each call is one compilation unit with its own
//! arenas, interner, and string pool; callers may compile different files
//! on different threads without sharing anything.
//!
//! Diagnostics are values, never panics: IR is produced exactly when no
//! error-severity diagnostic was collected.

use crate::codegen;
use fireball_base::{Diagnostic, Interner};
use fireball_language::arena_ctx::{AstArenas, AstContext};
use fireball_language::{check, parse};

/// The result of compiling one source file.
pub struct CompileOutput {
    /// The LLVM IR module, present when no errors were reported.
    pub ir: Option<String>,
    /// Parser and checker diagnostics, sorted into source order.
    pub diagnostics: Vec<Diagnostic>,
}

impl CompileOutput {
    /// `true` if any diagnostic prevents code generation.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Compiles one source file to LLVM textual IR.
///
/// `file_name` only labels the module header and debug metadata; no file
/// I/O happens here.
pub fn compile(file_name: &str, source: &str) -> CompileOutput {
    let mut interner = Interner::new();
    let arenas = AstArenas::new();
    let ctx = AstContext::new(&arenas);

    let parsed = parse(ctx, source, &mut interner);
    let mut diagnostics = parsed.diagnostics;
    diagnostics.extend(check(&parsed.decls, ctx, &interner));
    diagnostics.sort();

    if diagnostics.iter().any(Diagnostic::is_error) {
        log::debug!("'{}' failed with {} diagnostics", file_name, diagnostics.len());
        return CompileOutput { ir: None, diagnostics };
    }

    let ir = codegen::generate(&parsed.decls, &interner, file_name);
    CompileOutput { ir: Some(ir), diagnostics }
}
