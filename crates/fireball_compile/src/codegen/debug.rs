//! Debug metadata emission.
//!
//! Every lowered instruction is tagged `!dbg !N`, where `!N` is a
//! `DILocation` carrying the originating token's line and column and the
//! enclosing function's `DISubprogram` scope. The module trailer carries
//! the compile unit, file node, and module flags that make the locations
//! meaningful to a debugger.
//!
//! Node numbering is fixed for the shared prefix (compile unit, file,
//! flags, subroutine type) and monotonic for subprograms and locations,
//! so two runs over the same AST emit byte-identical metadata.

use crate::codegen::write_inst;
use fireball_language::token::Token;
use std::fmt::Write;

const COMPILE_UNIT: usize = 0;
const FILE: usize = 1;
const DWARF_VERSION_FLAG: usize = 2;
const DEBUG_INFO_FLAG: usize = 3;
const SUBROUTINE_TYPE: usize = 4;
const SUBROUTINE_TYPES: usize = 5;
const FIRST_DYNAMIC: usize = 6;

pub struct DebugInfo {
    file_name: String,
    nodes: Vec<String>,
    scope: String,
}

impl DebugInfo {
    pub fn new(file_name: &str) -> Self {
        DebugInfo {
            file_name: file_name.to_string(),
            nodes: Vec::new(),
            scope: format!("!{}", COMPILE_UNIT),
        }
    }

    fn next_id(&self) -> usize {
        FIRST_DYNAMIC + self.nodes.len()
    }

    /// Opens a function scope and returns its `DISubprogram` reference for
    /// the `define` line.
    pub fn begin_function(&mut self, name: &str, line: u32) -> String {
        let id = self.next_id();
        self.nodes.push(format!(
            "!{} = distinct !DISubprogram(name: \"{}\", scope: !{}, file: !{}, line: {}, type: !{}, spFlags: DISPFlagDefinition, unit: !{})",
            id, name, FILE, FILE, line, SUBROUTINE_TYPE, COMPILE_UNIT
        ));
        self.scope = format!("!{}", id);
        self.scope.clone()
    }

    /// Returns a `!N` location reference for the given token.
    pub fn location(&mut self, token: Token) -> String {
        let id = self.next_id();
        self.nodes.push(format!(
            "!{} = !DILocation(line: {}, column: {}, scope: {})",
            id,
            token.line,
            token.column + 1,
            self.scope
        ));
        format!("!{}", id)
    }

    /// The metadata trailer for the module.
    pub fn finish(&self) -> String {
        let mut out = String::new();

        write_inst!(out, "!llvm.dbg.cu = !{{!{}}}", COMPILE_UNIT);
        write_inst!(
            out,
            "!llvm.module.flags = !{{!{}, !{}}}",
            DWARF_VERSION_FLAG,
            DEBUG_INFO_FLAG
        );
        out.push('\n');

        write_inst!(
            out,
            "!{} = distinct !DICompileUnit(language: DW_LANG_C, file: !{}, producer: \"fireball\", isOptimized: false, runtimeVersion: 0, emissionKind: FullDebug)",
            COMPILE_UNIT,
            FILE
        );
        write_inst!(
            out,
            "!{} = !DIFile(filename: \"{}\", directory: \".\")",
            FILE,
            self.file_name
        );
        write_inst!(out, "!{} = !{{i32 7, !\"Dwarf Version\", i32 4}}", DWARF_VERSION_FLAG);
        write_inst!(out, "!{} = !{{i32 2, !\"Debug Info Version\", i32 3}}", DEBUG_INFO_FLAG);
        write_inst!(out, "!{} = !DISubroutineType(types: !{})", SUBROUTINE_TYPE, SUBROUTINE_TYPES);
        write_inst!(out, "!{} = !{{null}}", SUBROUTINE_TYPES);

        for node in &self.nodes {
            let _ = writeln!(out, "{}", node);
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fireball_base::Symbol;
    use fireball_language::token::TokenKind;

    fn token_at(line: u32, column: u32) -> Token {
        Token::new(TokenKind::Identifier, Symbol::EMPTY, line, column, 0, 1)
    }

    #[test]
    fn locations_reference_the_open_subprogram() {
        let mut debug = DebugInfo::new("test.fb");
        let sp = debug.begin_function("main", 1);
        let loc = debug.location(token_at(2, 4));

        assert_eq!(sp, "!6");
        assert_eq!(loc, "!7");

        let trailer = debug.finish();
        assert!(trailer.contains("!7 = !DILocation(line: 2, column: 5, scope: !6)"));
        assert!(trailer.contains("DISubprogram(name: \"main\""));
    }

    #[test]
    fn trailer_declares_the_compile_unit() {
        let debug = DebugInfo::new("unit.fb");
        let trailer = debug.finish();
        assert!(trailer.contains("!llvm.dbg.cu = !{!0}"));
        assert!(trailer.contains("!DIFile(filename: \"unit.fb\""));
        assert!(trailer.contains("\"Debug Info Version\", i32 3"));
    }

    #[test]
    fn numbering_is_deterministic() {
        let build = || {
            let mut debug = DebugInfo::new("same.fb");
            debug.begin_function("f", 1);
            debug.location(token_at(1, 0));
            debug.location(token_at(2, 2));
            debug.finish()
        };
        assert_eq!(build(), build());
    }
}
