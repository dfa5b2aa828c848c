//! The Fireball compilation pipeline: checked AST → LLVM IR → object.
//!
//! - [`compile::compile`] runs one source file through the whole front
//!   end and code generator
//! - [`codegen::generate`] lowers a checked AST to LLVM textual IR
//! - [`llc::Compiler`] invokes the external `llc` on an emitted module

pub mod codegen;
pub mod compile;
pub mod llc;

pub use compile::{compile, CompileOutput};
pub use llc::{BuildError, Compiler};
