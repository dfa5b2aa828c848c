//! Structural atoms shared by every layer of the fireball compiler.
//!
//! This crate has no knowledge of the Fireball language itself. It provides
//! the building blocks the front-end and code generator are made of:
//!
//! - [`Arena`]: bump allocation for AST and type nodes
//! - [`Interner`] / [`Symbol`]: string interning for O(1) name comparison
//! - [`Position`] / [`Range`]: source locations for diagnostics and debug info
//! - [`Diagnostic`] / [`Severity`]: the structured error record produced by
//!   the parser and checker

pub mod arena;
pub mod diagnostic;
pub mod intern;
pub mod span;

pub use arena::Arena;
pub use diagnostic::{Diagnostic, Severity};
pub use intern::{Interner, Symbol};
pub use span::{Position, Range};
