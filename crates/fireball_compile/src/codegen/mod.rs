//! Code generation from the checked Fireball AST to LLVM textual IR.
//!
//! # Pipeline position
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  source → scanner → parser → AST → checker → HERE        │
//! └──────────────────────────────────────────────────────────┘
//!                                            ↓
//!                                   LLVM IR text → llc → .o
//! ```
//!
//! The generator is a plain recursive walk over the AST (one `match` per
//! node category), writing IR text into per-function buffers. Per-function
//! state lives on [`Codegen`]: the `%N` temporary allocator, the `bbN`
//! block allocator, the named-slot counter, the scope stack, and the
//! currently open block. Module state accumulates alongside: named struct
//! types, the deduplicated string-constant pool, extern declarations, and
//! the debug metadata trailer.
//!
//! # Emission order
//!
//! IR is emitted in source order within a function. Globals are assembled
//! *after* all functions complete, so string constants collected during
//! function codegen textually precede their uses in the final module.
//!
//! # Addressability
//!
//! Values flow through [`context::ExprValue`]: `addressable` means the
//! identifier is a pointer to storage and needs a `load` in value
//! positions. Stack slots are named `%{ident}.{K}` and their `alloca`s are
//! emitted into the `entry` block, which keeps the `%N` temporaries
//! textually sequential as LLVM requires.
//!
//! Invariant violations here (an unresolved identifier, a cast the checker
//! should have rejected) are compiler bugs and panic.

pub(crate) mod context;
pub(crate) mod debug;
pub(crate) mod expr;
pub(crate) mod stmt;
pub(crate) mod types;

pub use types::ir_type;

use context::{Blocks, ExprValue, Locals, LoopLabels, Scopes, Variable};
use debug::DebugInfo;
use fireball_base::{Interner, Symbol};
use fireball_language::ast::Decl;
use fireball_language::types::Type;
use std::collections::HashMap;
use std::fmt::Write;

/// Emits a line into a `String` buffer.
macro_rules! write_inst {
    ($dst:expr, $($arg:tt)*) => {{
        let _ = writeln!($dst, $($arg)*);
    }};
}
pub(crate) use write_inst;

const TARGET_TRIPLE: &str = "x86_64-unknown-linux-gnu";

/// Generates a complete LLVM IR module for a checked file.
///
/// Requires a clean check: every expression typed, every identifier
/// resolved.
pub fn generate<'a>(decls: &[Decl<'a>], interner: &Interner, file_name: &str) -> String {
    let mut codegen = Codegen::new(interner, file_name);

    for decl in decls {
        if let Decl::Func(f) = decl {
            codegen
                .functions
                .insert(f.name.lexeme, format!("@{}", interner.resolve(f.name.lexeme)));
        }
    }

    for decl in decls {
        match decl {
            Decl::Struct(s) => codegen.struct_definition(s),
            Decl::Func(f) if f.body.is_none() => codegen.declare_function(f),
            _ => {}
        }
    }

    for decl in decls {
        if let Decl::Func(f) = decl {
            if f.body.is_some() {
                codegen.function(f);
            }
        }
    }

    log::debug!("generated IR for '{}'", file_name);
    codegen.assemble(file_name)
}

pub(crate) struct Codegen<'a, 'i> {
    pub(crate) interner: &'i Interner,

    // Module state.
    struct_defs: String,
    declares: String,
    functions_ir: String,
    strings: Vec<(String, String)>,
    string_ids: HashMap<String, usize>,
    pub(crate) functions: HashMap<Symbol, String>,
    pub(crate) debug: DebugInfo,

    // Per-function state, reset by `function`.
    pub(crate) locals: Locals,
    pub(crate) blocks: Blocks,
    slots: usize,
    pub(crate) scopes: Scopes<'a>,
    pub(crate) entry: String,
    pub(crate) body: String,
    pub(crate) block: String,
    pub(crate) terminated: bool,
    pub(crate) loops: Vec<LoopLabels>,
}

impl<'a, 'i> Codegen<'a, 'i> {
    fn new(interner: &'i Interner, file_name: &str) -> Self {
        Codegen {
            interner,
            struct_defs: String::new(),
            declares: String::new(),
            functions_ir: String::new(),
            strings: Vec::new(),
            string_ids: HashMap::new(),
            functions: HashMap::new(),
            debug: DebugInfo::new(file_name),
            locals: Locals::new(),
            blocks: Blocks::new(),
            slots: 0,
            scopes: Scopes::new(),
            entry: String::new(),
            body: String::new(),
            block: String::new(),
            terminated: false,
            loops: Vec::new(),
        }
    }

    // ========================================================================
    // Module pieces
    // ========================================================================

    fn struct_definition(&mut self, s: &fireball_language::ast::StructDecl<'a>) {
        let ty = s.ty.get().expect("checked struct");
        let struct_ty = ty.as_struct().expect("struct type");

        let fields: Vec<String> = struct_ty
            .fields()
            .iter()
            .map(|field| ir_type(field.ty, self.interner))
            .collect();

        write_inst!(
            self.struct_defs,
            "%struct.{} = type {{ {} }}",
            self.interner.resolve(struct_ty.name),
            fields.join(", ")
        );
    }

    fn declare_function(&mut self, f: &fireball_language::ast::FuncDecl<'a>) {
        let Some(Type::Function(fn_ty)) = f.ty.get() else {
            panic!("codegen: undeclared function type");
        };

        let mut params: Vec<String> = fn_ty
            .params
            .iter()
            .map(|param| ir_type(param.ty, self.interner))
            .collect();
        if fn_ty.variadic {
            params.push("...".to_string());
        }

        write_inst!(
            self.declares,
            "declare {} @{}({})",
            ir_type(fn_ty.returns, self.interner),
            self.interner.resolve(fn_ty.name),
            params.join(", ")
        );
    }

    fn function(&mut self, f: &fireball_language::ast::FuncDecl<'a>) {
        let Some(Type::Function(fn_ty)) = f.ty.get() else {
            panic!("codegen: undeclared function type");
        };
        let body = f.body.expect("function body");
        let name = self.interner.resolve(f.name.lexeme).to_string();

        self.locals = Locals::new();
        self.blocks = Blocks::new();
        self.slots = 0;
        self.scopes.clear();
        self.entry.clear();
        self.body.clear();
        self.block = "entry".to_string();
        self.terminated = false;
        self.loops.clear();

        self.scopes.push();

        let mut signature = Vec::new();
        for param in fn_ty.params {
            let param_name = self.interner.resolve(param.name).to_string();
            let param_ir = ir_type(param.ty, self.interner);
            signature.push(format!("{} %{}", param_ir, param_name));

            // Parameters get stack slots so they are addressable like any
            // other variable.
            let slot = self.slot(&param_name);
            write_inst!(self.entry, "  {} = alloca {}", slot, param_ir);
            write_inst!(self.entry, "  store {} %{}, ptr {}", param_ir, param_name, slot);
            self.scopes.define(param.name, Variable {
                value: ExprValue::addressable(slot),
                ty: param.ty,
            });
        }

        let subprogram = self.debug.begin_function(&name, f.name.line);

        for stmt in body {
            self.stmt(stmt);
        }

        if !self.terminated {
            if fn_ty.returns.is_void() {
                write_inst!(self.body, "  ret void");
            } else {
                write_inst!(self.body, "  unreachable");
            }
        }

        self.scopes.pop();

        write_inst!(
            self.functions_ir,
            "define {} @{}({}) !dbg {} {{",
            ir_type(fn_ty.returns, self.interner),
            name,
            signature.join(", "),
            subprogram
        );
        write_inst!(self.functions_ir, "entry:");
        self.functions_ir.push_str(&self.entry);
        self.functions_ir.push_str(&self.body);
        write_inst!(self.functions_ir, "}}");
        self.functions_ir.push('\n');
    }

    fn assemble(&self, file_name: &str) -> String {
        let mut out = String::new();

        write_inst!(out, "; ModuleID = '{}'", file_name);
        write_inst!(out, "source_filename = \"{}\"", file_name);
        write_inst!(out, "target triple = \"{}\"", TARGET_TRIPLE);
        out.push('\n');

        if !self.struct_defs.is_empty() {
            out.push_str(&self.struct_defs);
            out.push('\n');
        }

        for (content, name) in &self.strings {
            write_inst!(
                out,
                "{} = private unnamed_addr constant [{} x i8] c\"{}\\00\"",
                name,
                content.len() + 1,
                escape_bytes(content)
            );
        }
        if !self.strings.is_empty() {
            out.push('\n');
        }

        if !self.declares.is_empty() {
            out.push_str(&self.declares);
            out.push('\n');
        }

        out.push_str(&self.functions_ir);
        out.push_str(&self.debug.finish());
        out
    }

    // ========================================================================
    // Shared machinery
    // ========================================================================

    /// Allocates a uniquely-named stack slot for `name`.
    pub(crate) fn slot(&mut self, name: &str) -> String {
        let slot = format!("%{}.{}", name, self.slots);
        self.slots += 1;
        slot
    }

    /// Interns a string constant, returning its global name.
    ///
    /// The pool is deduplicated by content and iterated in insertion
    /// order, so repeated runs emit identical globals.
    pub(crate) fn string_constant(&mut self, content: &str) -> String {
        if let Some(&id) = self.string_ids.get(content) {
            return self.strings[id].1.clone();
        }

        let name = format!("@str.{}", self.strings.len());
        self.string_ids.insert(content.to_string(), self.strings.len());
        self.strings.push((content.to_string(), name.clone()));
        name
    }

    /// Opens a new basic block.
    pub(crate) fn write_block(&mut self, label: &str) {
        write_inst!(self.body, "{}:", label);
        self.block = label.to_string();
        self.terminated = false;
    }

    /// Branches to `label` unless the current block already terminated.
    pub(crate) fn branch_to(&mut self, label: &str) {
        if !self.terminated {
            write_inst!(self.body, "  br label %{}", label);
            self.terminated = true;
        }
    }

    /// Loads an addressable value; non-addressable values pass through.
    pub(crate) fn load(&mut self, value: ExprValue, ty: &'a Type<'a>) -> ExprValue {
        if !value.addressable {
            return value;
        }

        let result = self.locals.unnamed();
        write_inst!(
            self.body,
            "  {} = load {}, ptr {}",
            result,
            ir_type(ty, self.interner),
            value
        );
        result
    }
}

/// Escapes string bytes for an LLVM `c"…"` constant.
fn escape_bytes(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    for byte in content.bytes() {
        if (0x20..0x7f).contains(&byte) && byte != b'"' && byte != b'\\' {
            out.push(byte as char);
        } else {
            let _ = write!(out, "\\{:02X}", byte);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::escape_bytes;

    #[test]
    fn printable_bytes_pass_through() {
        assert_eq!(escape_bytes("hello world"), "hello world");
    }

    #[test]
    fn quotes_and_backslashes_are_escaped() {
        assert_eq!(escape_bytes("a\"b"), "a\\22b");
        assert_eq!(escape_bytes("a\\n"), "a\\5Cn");
    }

    #[test]
    fn non_printable_bytes_become_hex() {
        assert_eq!(escape_bytes("\n"), "\\0A");
        assert_eq!(escape_bytes("\t"), "\\09");
    }
}
