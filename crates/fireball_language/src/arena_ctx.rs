//! Arena context for AST and type allocation.
//!
//! [`AstArenas`] owns one typed arena per node category; [`AstContext`] is
//! the `Copy` handle the parser and checker allocate through. The split
//! keeps the borrow self-contained:
//!
//! ```
//! use fireball_language::arena_ctx::{AstArenas, AstContext};
//!
//! let arenas = AstArenas::new();
//! let ctx = AstContext::new(&arenas);
//! # let _ = ctx;
//! ```
//!
//! Everything allocated through the context lives until `arenas` drops,
//! which is how the whole AST is released as a unit at the end of a
//! compilation.

use crate::ast::{CaseDecl, Decl, Expr, ExprKind, FieldDecl, InitField, ParamDecl, Stmt, TypeExpr};
use crate::types::{EnumCase, Field, Param, Type};
use fireball_base::Arena;

/// Owns the arenas a compilation unit allocates into.
pub struct AstArenas<'a> {
    pub exprs: Arena<Expr<'a>>,
    pub expr_refs: Arena<&'a Expr<'a>>,
    pub stmts: Arena<Stmt<'a>>,
    pub decls: Arena<Decl<'a>>,
    pub type_exprs: Arena<TypeExpr<'a>>,
    pub params: Arena<ParamDecl<'a>>,
    pub fields: Arena<FieldDecl<'a>>,
    pub cases: Arena<CaseDecl>,
    pub init_fields: Arena<InitField<'a>>,

    pub types: Arena<Type<'a>>,
    pub type_params: Arena<Param<'a>>,
    pub type_fields: Arena<Field<'a>>,
    pub type_cases: Arena<EnumCase>,
}

impl<'a> AstArenas<'a> {
    pub fn new() -> Self {
        AstArenas {
            exprs: Arena::new(),
            expr_refs: Arena::new(),
            stmts: Arena::new(),
            decls: Arena::new(),
            type_exprs: Arena::new(),
            params: Arena::new(),
            fields: Arena::new(),
            cases: Arena::new(),
            init_fields: Arena::new(),
            types: Arena::new(),
            type_params: Arena::new(),
            type_fields: Arena::new(),
            type_cases: Arena::new(),
        }
    }
}

impl<'a> Default for AstArenas<'a> {
    fn default() -> Self {
        Self::new()
    }
}

/// The allocation handle threaded through the parser and checker.
#[derive(Clone, Copy)]
pub struct AstContext<'a> {
    arenas: &'a AstArenas<'a>,
}

impl<'a> AstContext<'a> {
    pub fn new(arenas: &'a AstArenas<'a>) -> Self {
        AstContext { arenas }
    }

    /// Allocates an expression node with its type slot unset.
    pub fn expr(&self, kind: ExprKind<'a>) -> &'a Expr<'a> {
        self.arenas.exprs.alloc(Expr::new(kind))
    }

    pub fn expr_list<I>(&self, exprs: I) -> &'a [&'a Expr<'a>]
    where
        I: IntoIterator<Item = &'a Expr<'a>>,
        I::IntoIter: ExactSizeIterator,
    {
        self.arenas.expr_refs.alloc_slice(exprs)
    }

    pub fn stmt(&self, stmt: Stmt<'a>) -> &'a Stmt<'a> {
        self.arenas.stmts.alloc(stmt)
    }

    pub fn stmt_list<I>(&self, stmts: I) -> &'a [Stmt<'a>]
    where
        I: IntoIterator<Item = Stmt<'a>>,
        I::IntoIter: ExactSizeIterator,
    {
        self.arenas.stmts.alloc_slice(stmts)
    }

    pub fn type_expr(&self, ty: TypeExpr<'a>) -> &'a TypeExpr<'a> {
        self.arenas.type_exprs.alloc(ty)
    }

    pub fn param_list<I>(&self, params: I) -> &'a [ParamDecl<'a>]
    where
        I: IntoIterator<Item = ParamDecl<'a>>,
        I::IntoIter: ExactSizeIterator,
    {
        self.arenas.params.alloc_slice(params)
    }

    pub fn field_list<I>(&self, fields: I) -> &'a [FieldDecl<'a>]
    where
        I: IntoIterator<Item = FieldDecl<'a>>,
        I::IntoIter: ExactSizeIterator,
    {
        self.arenas.fields.alloc_slice(fields)
    }

    pub fn case_list<I>(&self, cases: I) -> &'a [CaseDecl]
    where
        I: IntoIterator<Item = CaseDecl>,
        I::IntoIter: ExactSizeIterator,
    {
        self.arenas.cases.alloc_slice(cases)
    }

    pub fn init_field_list<I>(&self, fields: I) -> &'a [InitField<'a>]
    where
        I: IntoIterator<Item = InitField<'a>>,
        I::IntoIter: ExactSizeIterator,
    {
        self.arenas.init_fields.alloc_slice(fields)
    }

    pub fn ty(&self, ty: Type<'a>) -> &'a Type<'a> {
        self.arenas.types.alloc(ty)
    }

    pub fn type_param_list<I>(&self, params: I) -> &'a [Param<'a>]
    where
        I: IntoIterator<Item = Param<'a>>,
        I::IntoIter: ExactSizeIterator,
    {
        self.arenas.type_params.alloc_slice(params)
    }

    pub fn type_field_list<I>(&self, fields: I) -> &'a [Field<'a>]
    where
        I: IntoIterator<Item = Field<'a>>,
        I::IntoIter: ExactSizeIterator,
    {
        self.arenas.type_fields.alloc_slice(fields)
    }

    pub fn type_case_list<I>(&self, cases: I) -> &'a [EnumCase]
    where
        I: IntoIterator<Item = EnumCase>,
        I::IntoIter: ExactSizeIterator,
    {
        self.arenas.type_cases.alloc_slice(cases)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{Token, TokenKind};
    use fireball_base::Symbol;

    #[test]
    fn allocated_nodes_reference_each_other() {
        let arenas = AstArenas::new();
        let ctx = AstContext::new(&arenas);

        let token = Token::new(TokenKind::Number, Symbol::EMPTY, 1, 0, 0, 1);
        let lit = ctx.expr(ExprKind::Literal { value: token });
        let group = ctx.expr(ExprKind::Group { token, expr: lit });

        match &group.kind {
            ExprKind::Group { expr, .. } => {
                assert!(matches!(expr.kind, ExprKind::Literal { .. }));
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn slices_survive_the_building_vec() {
        let arenas = AstArenas::new();
        let ctx = AstContext::new(&arenas);

        let token = Token::new(TokenKind::Number, Symbol::EMPTY, 1, 0, 0, 1);
        let exprs: Vec<&Expr> = (0..3)
            .map(|_| ctx.expr(ExprKind::Literal { value: token }))
            .collect();
        let slice = ctx.expr_list(exprs);

        assert_eq!(slice.len(), 3);
    }
}
