//! Recursive-descent parser for Fireball.
//!
//! The parser pulls tokens from the [`Scanner`] with a one-token lookahead
//! (`current` is the last consumed token, `next` the lookahead). Each parse
//! frame returns `Result<_, Diagnostic>`: the first expectation failure
//! aborts the frame, the partial declaration is discarded, and
//! [`Parser::synchronize`] skips to the next declaration boundary
//! (`func` / `struct` / `enum` / `impl` / `static` / `extern`), so one bad
//! declaration costs exactly one diagnostic.
//!
//! Submodules:
//!
//! - [`decl`]: `func` / `struct` / `enum` declarations
//! - [`stmt`]: statements and blocks
//! - [`expr`]: the operator-precedence expression grammar
//! - [`types`]: type spellings (`i32`, `*T`, named types)

mod decl;
mod expr;
mod stmt;
mod types;

use crate::arena_ctx::AstContext;
use crate::ast::Decl;
use crate::scanner::Scanner;
use crate::token::{Token, TokenKind};
use fireball_base::{Diagnostic, Interner, Symbol};

/// Everything a parse produces: the surviving declarations and the
/// diagnostics collected across recovery points.
pub struct ParseOutput<'a> {
    pub decls: Vec<Decl<'a>>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Parses a whole source file.
pub fn parse<'a>(ctx: AstContext<'a>, source: &str, interner: &mut Interner) -> ParseOutput<'a> {
    let scanner = Scanner::new(source, interner);
    let mut parser = Parser::new(ctx, scanner);

    let mut decls = Vec::new();
    let mut diagnostics = Vec::new();

    while !parser.check(TokenKind::Eof) {
        match parser.declaration() {
            Ok(decl) => decls.push(decl),
            Err(diagnostic) => {
                diagnostics.push(diagnostic);
                parser.synchronize();
            }
        }
    }

    log::debug!(
        "parsed {} declarations, {} diagnostics",
        decls.len(),
        diagnostics.len()
    );

    ParseOutput { decls, diagnostics }
}

pub(crate) type ParseResult<T> = Result<T, Diagnostic>;

pub(crate) struct Parser<'s, 'a> {
    scanner: Scanner<'s>,
    pub(crate) ctx: AstContext<'a>,
    pub(crate) current: Token,
    pub(crate) next: Token,
    /// Struct initializers are suppressed directly inside `if`/`while`/`for`
    /// headers, where `IDENT {` would swallow the statement's block.
    pub(crate) allow_initializer: bool,
}

impl<'s, 'a> Parser<'s, 'a> {
    pub(crate) fn new(ctx: AstContext<'a>, mut scanner: Scanner<'s>) -> Self {
        let next = scanner.next();
        Parser {
            scanner,
            ctx,
            current: Token::new(TokenKind::Eof, Symbol::EMPTY, 1, 0, 0, 0),
            next,
            allow_initializer: true,
        }
    }

    pub(crate) fn advance(&mut self) {
        self.current = self.next;
        self.next = self.scanner.next();
    }

    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.next.kind == kind
    }

    /// Consumes the lookahead if it has the given kind.
    pub(crate) fn match_kind(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            return true;
        }
        false
    }

    /// Consumes the lookahead if it has any of the given kinds.
    pub(crate) fn match_kinds(&mut self, kinds: &[TokenKind]) -> bool {
        if kinds.contains(&self.next.kind) {
            self.advance();
            return true;
        }
        false
    }

    /// Consumes a token of the given kind or fails with a positional
    /// diagnostic at the lookahead.
    pub(crate) fn consume(&mut self, kind: TokenKind, message: &str) -> ParseResult<Token> {
        if self.check(kind) {
            self.advance();
            return Ok(self.current);
        }
        Err(self.error_at_next(message))
    }

    /// Builds a diagnostic at the lookahead token.
    ///
    /// Scanner failures win over parser expectations: when the lookahead is
    /// an `Error` token its own message is reported instead.
    pub(crate) fn error_at_next(&self, message: &str) -> Diagnostic {
        let token = self.next;
        if token.kind == TokenKind::Error {
            Diagnostic::error(token.range(), self.resolve(token.lexeme))
        } else {
            Diagnostic::error(token.range(), message)
        }
    }

    pub(crate) fn resolve(&self, sym: Symbol) -> &str {
        self.scanner.resolve(sym)
    }

    /// Skips tokens until the next declaration boundary.
    pub(crate) fn synchronize(&mut self) {
        self.advance();

        while !self.check(TokenKind::Eof) {
            if self.current.kind == TokenKind::Semicolon {
                return;
            }

            match self.next.kind {
                TokenKind::Func
                | TokenKind::Struct
                | TokenKind::Enum
                | TokenKind::Impl
                | TokenKind::Static
                | TokenKind::Extern => return,
                _ => self.advance(),
            }
        }
    }

    /// Runs `f` with struct initializers allowed or suppressed, restoring
    /// the previous setting afterwards.
    pub(crate) fn with_initializers<T>(
        &mut self,
        allow: bool,
        f: impl FnOnce(&mut Self) -> T,
    ) -> T {
        let previous = self.allow_initializer;
        self.allow_initializer = allow;
        let result = f(self);
        self.allow_initializer = previous;
        result
    }
}
