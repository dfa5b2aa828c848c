//! Statement parsing.
//!
//! Statement errors propagate upward unhandled; recovery happens only at
//! declaration boundaries, so a malformed statement discards its whole
//! declaration.

use super::{ParseResult, Parser};
use crate::ast::Stmt;
use crate::token::TokenKind;
use std::cell::Cell;

impl<'s, 'a> Parser<'s, 'a> {
    pub(crate) fn statement(&mut self) -> ParseResult<Stmt<'a>> {
        if self.match_kind(TokenKind::LeftBrace) {
            let token = self.current;
            let stmts = self.block()?;
            return Ok(Stmt::Block { token, stmts });
        }
        if self.match_kind(TokenKind::Var) {
            return self.variable_statement();
        }
        if self.match_kind(TokenKind::If) {
            return self.if_statement();
        }
        if self.match_kind(TokenKind::While) {
            return self.while_statement();
        }
        if self.match_kind(TokenKind::For) {
            return self.for_statement();
        }
        if self.match_kind(TokenKind::Return) {
            let token = self.current;
            let value = if self.check(TokenKind::Semicolon) {
                None
            } else {
                Some(self.expression()?)
            };
            self.consume(TokenKind::Semicolon, "Expected ';' after return value.")?;
            return Ok(Stmt::Return { token, value });
        }
        if self.match_kind(TokenKind::Break) {
            let token = self.current;
            self.consume(TokenKind::Semicolon, "Expected ';' after 'break'.")?;
            return Ok(Stmt::Break { token });
        }
        if self.match_kind(TokenKind::Continue) {
            let token = self.current;
            self.consume(TokenKind::Semicolon, "Expected ';' after 'continue'.")?;
            return Ok(Stmt::Continue { token });
        }

        let expr = self.expression()?;
        self.consume(TokenKind::Semicolon, "Expected ';' after expression.")?;
        Ok(Stmt::Expression { expr })
    }

    /// Parses statements up to and including the closing `}`.
    pub(crate) fn block(&mut self) -> ParseResult<&'a [Stmt<'a>]> {
        let mut stmts = Vec::new();

        while !self.check(TokenKind::RightBrace) && !self.check(TokenKind::Eof) {
            stmts.push(self.statement()?);
        }

        self.consume(TokenKind::RightBrace, "Expected '}' after block.")?;
        Ok(self.ctx.stmt_list(stmts))
    }

    fn variable_statement(&mut self) -> ParseResult<Stmt<'a>> {
        let name = self.consume(TokenKind::Identifier, "Expected variable name.")?;

        let type_expr = if self.match_kind(TokenKind::Colon) {
            Some(self.parse_type()?)
        } else {
            None
        };

        let initializer = if self.match_kind(TokenKind::Equal) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TokenKind::Semicolon, "Expected ';' after variable declaration.")?;

        Ok(Stmt::Variable {
            name,
            type_expr,
            initializer,
            infer_type: type_expr.is_none(),
            ty: Cell::new(None),
        })
    }

    fn if_statement(&mut self) -> ParseResult<Stmt<'a>> {
        let token = self.current;
        let condition = self.with_initializers(false, |p| p.expression())?;

        self.consume(TokenKind::LeftBrace, "Expected '{' after if condition.")?;
        let brace = self.current;
        let then_stmts = self.block()?;
        let then_branch = self.ctx.stmt(Stmt::Block { token: brace, stmts: then_stmts });

        let else_branch = if self.match_kind(TokenKind::Else) {
            if self.match_kind(TokenKind::If) {
                let nested = self.if_statement()?;
                Some(self.ctx.stmt(nested))
            } else {
                self.consume(TokenKind::LeftBrace, "Expected '{' after 'else'.")?;
                let brace = self.current;
                let stmts = self.block()?;
                Some(self.ctx.stmt(Stmt::Block { token: brace, stmts }))
            }
        } else {
            None
        };

        Ok(Stmt::If { token, condition, then_branch, else_branch })
    }

    fn while_statement(&mut self) -> ParseResult<Stmt<'a>> {
        let token = self.current;
        let condition = self.with_initializers(false, |p| p.expression())?;

        self.consume(TokenKind::LeftBrace, "Expected '{' after loop condition.")?;
        let brace = self.current;
        let stmts = self.block()?;
        let body = self.ctx.stmt(Stmt::Block { token: brace, stmts });

        Ok(Stmt::While { token, condition, body })
    }

    fn for_statement(&mut self) -> ParseResult<Stmt<'a>> {
        let token = self.current;

        // A bare `for {` is an infinite loop with no clauses.
        if self.match_kind(TokenKind::LeftBrace) {
            let brace = self.current;
            let stmts = self.block()?;
            let body = self.ctx.stmt(Stmt::Block { token: brace, stmts });
            return Ok(Stmt::For {
                token,
                initializer: None,
                condition: None,
                increment: None,
                body,
            });
        }

        let initializer = if self.match_kind(TokenKind::Semicolon) {
            None
        } else if self.match_kind(TokenKind::Var) {
            // variable_statement consumes the terminating ';'.
            let stmt = self.variable_statement()?;
            Some(self.ctx.stmt(stmt))
        } else {
            let expr = self.with_initializers(false, |p| p.expression())?;
            self.consume(TokenKind::Semicolon, "Expected ';' after loop initializer.")?;
            Some(self.ctx.stmt(Stmt::Expression { expr }))
        };

        let condition = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.with_initializers(false, |p| p.expression())?)
        };
        self.consume(TokenKind::Semicolon, "Expected ';' after loop condition.")?;

        let increment = if self.check(TokenKind::LeftBrace) {
            None
        } else {
            Some(self.with_initializers(false, |p| p.expression())?)
        };

        self.consume(TokenKind::LeftBrace, "Expected '{' after for clauses.")?;
        let brace = self.current;
        let stmts = self.block()?;
        let body = self.ctx.stmt(Stmt::Block { token: brace, stmts });

        Ok(Stmt::For { token, initializer, condition, increment, body })
    }
}
