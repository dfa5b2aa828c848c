//! Declaration parsing: `func`, `struct`, and `enum`.

use super::{ParseResult, Parser};
use crate::ast::{CaseDecl, Decl, EnumDecl, FieldDecl, FuncDecl, ParamDecl, StructDecl};
use crate::token::TokenKind;
use fireball_base::Diagnostic;
use std::cell::Cell;

impl<'s, 'a> Parser<'s, 'a> {
    pub(crate) fn declaration(&mut self) -> ParseResult<Decl<'a>> {
        if self.match_kind(TokenKind::Extern) {
            self.consume(TokenKind::Func, "Expected 'func' after 'extern'.")?;
            return self.func_declaration(true);
        }
        if self.match_kind(TokenKind::Func) {
            return self.func_declaration(false);
        }
        if self.match_kind(TokenKind::Struct) {
            return self.struct_declaration();
        }
        if self.match_kind(TokenKind::Enum) {
            return self.enum_declaration();
        }

        Err(self.error_at_next("Expected declaration."))
    }

    fn func_declaration(&mut self, is_extern: bool) -> ParseResult<Decl<'a>> {
        let name = self.consume(TokenKind::Identifier, "Expected function name.")?;
        self.consume(TokenKind::LeftParen, "Expected '(' after function name.")?;

        let mut params = Vec::new();
        let mut variadic = false;

        while !self.check(TokenKind::RightParen) && !self.check(TokenKind::Eof) {
            if self.check(TokenKind::Dot) {
                // The variadic marker is spelled `...`.
                for _ in 0..3 {
                    self.consume(TokenKind::Dot, "Expected '...' for variadic parameter.")?;
                }
                variadic = true;
                break;
            }

            let param_name = self.consume(TokenKind::Identifier, "Expected parameter name.")?;
            self.consume(TokenKind::Colon, "Expected ':' after parameter name.")?;
            let type_expr = self.parse_type()?;

            params.push(ParamDecl { name: param_name, type_expr });

            if !self.match_kind(TokenKind::Comma) {
                break;
            }
        }

        self.consume(TokenKind::RightParen, "Expected ')' after function parameters.")?;

        // A return type is written `-> T`; the scanner delivers the arrow as
        // `-` followed by `>`.
        let return_type = if self.match_kind(TokenKind::Minus) {
            self.consume(TokenKind::Greater, "Expected '>' in return type.")?;
            Some(self.parse_type()?)
        } else {
            None
        };

        let body = if is_extern {
            self.consume(
                TokenKind::Semicolon,
                "Expected ';' after extern function declaration.",
            )?;
            None
        } else {
            self.consume(TokenKind::LeftBrace, "Expected '{' before function body.")?;
            Some(self.block()?)
        };

        Ok(Decl::Func(FuncDecl {
            name,
            params: self.ctx.param_list(params),
            return_type,
            body,
            is_extern,
            variadic,
            ty: Cell::new(None),
        }))
    }

    fn struct_declaration(&mut self) -> ParseResult<Decl<'a>> {
        let name = self.consume(TokenKind::Identifier, "Expected struct name.")?;
        self.consume(TokenKind::LeftBrace, "Expected '{' after struct name.")?;

        let mut fields = Vec::new();

        while !self.check(TokenKind::RightBrace) && !self.check(TokenKind::Eof) {
            let field_name = self.consume(TokenKind::Identifier, "Expected field name.")?;
            self.consume(TokenKind::Colon, "Expected ':' after field name.")?;
            let type_expr = self.parse_type()?;

            fields.push(FieldDecl { name: field_name, type_expr });

            if !self.match_kind(TokenKind::Comma) {
                break;
            }
        }

        self.consume(TokenKind::RightBrace, "Expected '}' after struct fields.")?;

        Ok(Decl::Struct(StructDecl {
            name,
            fields: self.ctx.field_list(fields),
            ty: Cell::new(None),
        }))
    }

    fn enum_declaration(&mut self) -> ParseResult<Decl<'a>> {
        let name = self.consume(TokenKind::Identifier, "Expected enum name.")?;

        let underlying = if self.match_kind(TokenKind::Colon) {
            Some(self.consume(TokenKind::Identifier, "Expected enum type after ':'.")?)
        } else {
            None
        };

        self.consume(TokenKind::LeftBrace, "Expected '{' after enum name.")?;

        let mut cases = Vec::new();
        let mut next_value: i64 = 0;

        while !self.check(TokenKind::RightBrace) && !self.check(TokenKind::Eof) {
            let case_name = self.consume(TokenKind::Identifier, "Expected enum case name.")?;

            let (value, infer_value) = if self.match_kind(TokenKind::Equal) {
                if !self.match_kinds(&[TokenKind::Number, TokenKind::Hex, TokenKind::Binary]) {
                    return Err(self.error_at_next("Expected enum case value."));
                }
                (self.case_value()?, false)
            } else {
                (next_value, true)
            };

            next_value = value.wrapping_add(1);
            cases.push(CaseDecl { name: case_name, value, infer_value });

            if !self.match_kind(TokenKind::Comma) {
                break;
            }
        }

        self.consume(TokenKind::RightBrace, "Expected '}' after enum cases.")?;

        Ok(Decl::Enum(EnumDecl {
            name,
            underlying,
            cases: self.ctx.case_list(cases),
            infer_type: underlying.is_none(),
            ty: Cell::new(None),
        }))
    }

    /// Parses the already-consumed value token of an enum case.
    fn case_value(&self) -> ParseResult<i64> {
        let token = self.current;
        let text = self.resolve(token.lexeme);

        let parsed = match token.kind {
            TokenKind::Hex => i64::from_str_radix(&text[2..], 16).ok(),
            TokenKind::Binary => i64::from_str_radix(&text[2..], 2).ok(),
            _ => text.parse::<i64>().ok(),
        };

        parsed.ok_or_else(|| Diagnostic::error(token.range(), "Invalid enum case value."))
    }
}
