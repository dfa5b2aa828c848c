//! Expression parsing.
//!
//! Precedence, low to high:
//!
//! ```text
//! expression  → logic_or
//! logic_or    → logic_and ( '||' logic_and )*
//! logic_and   → equality  ( '&&' equality )*
//! equality    → comparison ( ( '==' | '!=' ) comparison )*
//! comparison  → bitwise   ( ( '<' | '<=' | '>' | '>=' ) bitwise )*
//! bitwise     → term      ( ( '|' | '&' | '<<' | '>>' ) term )*
//! term        → factor    ( ( '+' | '-' ) factor )*
//! factor      → unary     ( ( '*' | '/' | '%' ) unary )*
//! unary       → ( '!' | '-' | '&' | '*' ) unary | call
//! call        → primary ( call-suffix )*
//! call-suffix → assign-op expression | 'as' type | '(' args? ')'
//!             | '[' expression ']' | '.' IDENT
//! primary     → literal | IDENT | IDENT '{' fields '}' | '(' expression ')'
//! ```
//!
//! Assignment is a *postfix* against a call-chain target; the parser does
//! not enforce lvalue-ness (the checker does). `as T` is a postfix cast.

use super::{ParseResult, Parser};
use crate::ast::{ExprKind, Expr, IdentKind, InitField};
use crate::token::TokenKind;
use std::cell::Cell;

const ASSIGNMENT_OPS: [TokenKind; 6] = [
    TokenKind::Equal,
    TokenKind::PlusEqual,
    TokenKind::MinusEqual,
    TokenKind::StarEqual,
    TokenKind::SlashEqual,
    TokenKind::PercentageEqual,
];

impl<'s, 'a> Parser<'s, 'a> {
    pub(crate) fn expression(&mut self) -> ParseResult<&'a Expr<'a>> {
        self.logic_or()
    }

    fn logic_or(&mut self) -> ParseResult<&'a Expr<'a>> {
        let mut expr = self.logic_and()?;

        while self.match_kind(TokenKind::Or) {
            let op = self.current;
            let right = self.logic_and()?;
            expr = self.ctx.expr(ExprKind::Logical { left: expr, op, right });
        }

        Ok(expr)
    }

    fn logic_and(&mut self) -> ParseResult<&'a Expr<'a>> {
        let mut expr = self.equality()?;

        while self.match_kind(TokenKind::And) {
            let op = self.current;
            let right = self.equality()?;
            expr = self.ctx.expr(ExprKind::Logical { left: expr, op, right });
        }

        Ok(expr)
    }

    fn equality(&mut self) -> ParseResult<&'a Expr<'a>> {
        let mut expr = self.comparison()?;

        while self.match_kinds(&[TokenKind::EqualEqual, TokenKind::BangEqual]) {
            let op = self.current;
            let right = self.comparison()?;
            expr = self.ctx.expr(ExprKind::Binary { left: expr, op, right });
        }

        Ok(expr)
    }

    fn comparison(&mut self) -> ParseResult<&'a Expr<'a>> {
        let mut expr = self.bitwise()?;

        while self.match_kinds(&[
            TokenKind::Less,
            TokenKind::LessEqual,
            TokenKind::Greater,
            TokenKind::GreaterEqual,
        ]) {
            let op = self.current;
            let right = self.bitwise()?;
            expr = self.ctx.expr(ExprKind::Binary { left: expr, op, right });
        }

        Ok(expr)
    }

    fn bitwise(&mut self) -> ParseResult<&'a Expr<'a>> {
        let mut expr = self.term()?;

        while self.match_kinds(&[
            TokenKind::Pipe,
            TokenKind::Ampersand,
            TokenKind::LessLess,
            TokenKind::GreaterGreater,
        ]) {
            let op = self.current;
            let right = self.term()?;
            expr = self.ctx.expr(ExprKind::Binary { left: expr, op, right });
        }

        Ok(expr)
    }

    fn term(&mut self) -> ParseResult<&'a Expr<'a>> {
        let mut expr = self.factor()?;

        while self.match_kinds(&[TokenKind::Plus, TokenKind::Minus]) {
            let op = self.current;
            let right = self.factor()?;
            expr = self.ctx.expr(ExprKind::Binary { left: expr, op, right });
        }

        Ok(expr)
    }

    fn factor(&mut self) -> ParseResult<&'a Expr<'a>> {
        let mut expr = self.unary()?;

        while self.match_kinds(&[TokenKind::Star, TokenKind::Slash, TokenKind::Percentage]) {
            let op = self.current;
            let right = self.unary()?;
            expr = self.ctx.expr(ExprKind::Binary { left: expr, op, right });
        }

        Ok(expr)
    }

    fn unary(&mut self) -> ParseResult<&'a Expr<'a>> {
        if self.match_kinds(&[
            TokenKind::Bang,
            TokenKind::Minus,
            TokenKind::Ampersand,
            TokenKind::Star,
        ]) {
            let op = self.current;
            let right = self.unary()?;
            return Ok(self.ctx.expr(ExprKind::Unary { op, right }));
        }

        self.call()
    }

    fn call(&mut self) -> ParseResult<&'a Expr<'a>> {
        let mut expr = self.primary()?;

        loop {
            if self.match_kinds(&ASSIGNMENT_OPS) {
                expr = self.finish_assignment(expr)?;
            } else if self.match_kind(TokenKind::As) {
                let token = self.current;
                let target = self.parse_type()?;
                expr = self.ctx.expr(ExprKind::Cast { token, expr, target });
            } else if self.match_kind(TokenKind::LeftParen) {
                expr = self.finish_call(expr)?;
            } else if self.match_kind(TokenKind::LeftBracket) {
                expr = self.finish_index(expr)?;
            } else if self.match_kind(TokenKind::Dot) {
                expr = self.finish_member(expr)?;
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn finish_assignment(&mut self, assignee: &'a Expr<'a>) -> ParseResult<&'a Expr<'a>> {
        let op = self.current;
        let value = self.expression()?;

        Ok(self.ctx.expr(ExprKind::Assignment { assignee, op, value }))
    }

    fn finish_call(&mut self, callee: &'a Expr<'a>) -> ParseResult<&'a Expr<'a>> {
        let mut args = Vec::new();

        while !self.check(TokenKind::RightParen) && !self.check(TokenKind::Eof) {
            let arg = self.with_initializers(true, |p| p.expression())?;
            args.push(arg);

            if !self.match_kind(TokenKind::Comma) {
                break;
            }
        }

        self.consume(TokenKind::RightParen, "Expected ')' after call arguments.")?;

        Ok(self.ctx.expr(ExprKind::Call {
            token: self.current,
            callee,
            args: self.ctx.expr_list(args),
        }))
    }

    fn finish_index(&mut self, value: &'a Expr<'a>) -> ParseResult<&'a Expr<'a>> {
        let token = self.current;
        let index = self.with_initializers(true, |p| p.expression())?;

        self.consume(TokenKind::RightBracket, "Expected ']' after index expression.")?;

        Ok(self.ctx.expr(ExprKind::Index { token, value, index }))
    }

    fn finish_member(&mut self, value: &'a Expr<'a>) -> ParseResult<&'a Expr<'a>> {
        let name = self.consume(TokenKind::Identifier, "Expected member name.")?;

        Ok(self.ctx.expr(ExprKind::Member { value, name }))
    }

    fn primary(&mut self) -> ParseResult<&'a Expr<'a>> {
        if self.match_kinds(&[
            TokenKind::Nil,
            TokenKind::True,
            TokenKind::False,
            TokenKind::Number,
            TokenKind::Hex,
            TokenKind::Binary,
            TokenKind::Character,
            TokenKind::String,
        ]) {
            return Ok(self.ctx.expr(ExprKind::Literal { value: self.current }));
        }

        if self.match_kind(TokenKind::Identifier) {
            let identifier = self.current;

            if self.allow_initializer && self.check(TokenKind::LeftBrace) {
                return self.finish_initializer(identifier);
            }

            return Ok(self.ctx.expr(ExprKind::Identifier {
                identifier,
                kind: Cell::new(IdentKind::Unresolved),
            }));
        }

        if self.match_kind(TokenKind::LeftParen) {
            let token = self.current;
            let expr = self.with_initializers(true, |p| p.expression())?;
            self.consume(TokenKind::RightParen, "Expected ')' after expression.")?;

            return Ok(self.ctx.expr(ExprKind::Group { token, expr }));
        }

        Err(self.error_at_next("Expected expression."))
    }

    fn finish_initializer(&mut self, name: crate::token::Token) -> ParseResult<&'a Expr<'a>> {
        self.consume(TokenKind::LeftBrace, "Expected '{' after struct name.")?;

        let mut fields = Vec::new();

        while !self.check(TokenKind::RightBrace) && !self.check(TokenKind::Eof) {
            let field_name = self.consume(TokenKind::Identifier, "Expected field name.")?;
            self.consume(TokenKind::Colon, "Expected ':' after field name.")?;
            let value = self.with_initializers(true, |p| p.expression())?;

            fields.push(InitField { name: field_name, value });

            if !self.match_kind(TokenKind::Comma) {
                break;
            }
        }

        self.consume(TokenKind::RightBrace, "Expected '}' after struct initializer.")?;

        Ok(self.ctx.expr(ExprKind::Initializer {
            name,
            fields: self.ctx.init_field_list(fields),
        }))
    }
}
