//! Type spellings: `i32`, `bool`, `*T`, and named struct/enum references.

use super::{ParseResult, Parser};
use crate::ast::TypeExpr;
use crate::token::TokenKind;
use crate::types::PrimitiveKind;

impl<'s, 'a> Parser<'s, 'a> {
    pub(crate) fn parse_type(&mut self) -> ParseResult<&'a TypeExpr<'a>> {
        if self.match_kind(TokenKind::Star) {
            let token = self.current;
            let pointee = self.parse_type()?;
            return Ok(self.ctx.type_expr(TypeExpr::Pointer { token, pointee }));
        }

        let name = self.consume(TokenKind::Identifier, "Expected type.")?;
        let kind = PrimitiveKind::from_name(self.resolve(name.lexeme));

        Ok(self.ctx.type_expr(match kind {
            Some(kind) => TypeExpr::Primitive { token: name, kind },
            None => TypeExpr::Named { name },
        }))
    }
}
