//! Hover information for editor integration.
//!
//! [`hover`] answers "what is under the cursor" for a checked AST: the
//! type of an expression, the integer value of an enum case, or the type
//! of a struct initializer field. The LSP server maps the returned
//! [`HoverInfo`] onto the protocol shape; this module knows nothing about
//! the protocol itself.

use crate::ast::{Decl, Expr, ExprKind, IdentKind, Stmt};
use crate::types::Type;
use fireball_base::{Interner, Position, Range};

/// Plain-text hover content plus the range it describes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoverInfo {
    pub value: String,
    pub range: Range,
}

/// Returns hover info for the given position, if anything is there.
///
/// Expects a checked AST: expression types and identifier kinds must be
/// resolved.
pub fn hover<'a>(
    decls: &[Decl<'a>],
    pos: Position,
    interner: &Interner,
) -> Option<HoverInfo> {
    for decl in decls {
        match decl {
            Decl::Enum(e) => {
                for case in e.cases {
                    let range = case.name.range();
                    if range.contains(pos) {
                        return Some(HoverInfo { value: case.value.to_string(), range });
                    }
                }
            }

            Decl::Func(f) => {
                let Some(body) = f.body else { continue };
                for stmt in body {
                    if let Some(info) = hover_stmt(stmt, pos, interner) {
                        return Some(info);
                    }
                }
            }

            Decl::Struct(_) => {}
        }
    }

    None
}

fn hover_stmt<'a>(stmt: &Stmt<'a>, pos: Position, interner: &Interner) -> Option<HoverInfo> {
    match stmt {
        Stmt::Block { stmts, .. } => stmts.iter().find_map(|s| hover_stmt(s, pos, interner)),

        Stmt::Expression { expr } => hover_expr(expr, pos, interner),

        Stmt::Variable { name, initializer, ty, .. } => {
            let range = name.range();
            if range.contains(pos) {
                let ty = ty.get()?;
                return Some(HoverInfo { value: ty.display(interner), range });
            }
            initializer.and_then(|init| hover_expr(init, pos, interner))
        }

        Stmt::If { condition, then_branch, else_branch, .. } => {
            hover_expr(condition, pos, interner)
                .or_else(|| hover_stmt(then_branch, pos, interner))
                .or_else(|| else_branch.and_then(|e| hover_stmt(e, pos, interner)))
        }

        Stmt::While { condition, body, .. } => {
            hover_expr(condition, pos, interner).or_else(|| hover_stmt(body, pos, interner))
        }

        Stmt::For { initializer, condition, increment, body, .. } => {
            initializer
                .and_then(|i| hover_stmt(i, pos, interner))
                .or_else(|| condition.and_then(|c| hover_expr(c, pos, interner)))
                .or_else(|| increment.and_then(|i| hover_expr(i, pos, interner)))
                .or_else(|| hover_stmt(body, pos, interner))
        }

        Stmt::Return { value, .. } => value.and_then(|v| hover_expr(v, pos, interner)),

        Stmt::Break { .. } | Stmt::Continue { .. } => None,
    }
}

fn hover_expr<'a>(expr: &Expr<'a>, pos: Position, interner: &Interner) -> Option<HoverInfo> {
    if !expr.range().contains(pos) {
        return None;
    }

    // Deepest node wins.
    if let Some(info) = hover_children(expr, pos, interner) {
        return Some(info);
    }

    match &expr.kind {
        // A field name inside an initializer hovers as the field's type.
        ExprKind::Initializer { fields, .. } => {
            for field in *fields {
                let range = field.name.range();
                if range.contains(pos) {
                    let s = expr.ty()?.as_struct()?;
                    let (_, struct_field) = s.field(field.name.lexeme)?;
                    return Some(HoverInfo {
                        value: struct_field.ty.display(interner),
                        range,
                    });
                }
            }
            hover_type(expr, interner)
        }

        // An enum case access hovers as the case's value.
        ExprKind::Member { value, name } => {
            if let ExprKind::Identifier { kind, .. } = &value.kind {
                if kind.get() == IdentKind::Enum {
                    if let Some(Type::Enum(e)) = expr.ty() {
                        if let Some(case) = e.case(name.lexeme) {
                            return Some(HoverInfo {
                                value: case.value.to_string(),
                                range: expr.range(),
                            });
                        }
                    }
                }
            }
            hover_type(expr, interner)
        }

        // Literals hover as nothing.
        ExprKind::Literal { .. } => None,

        _ => hover_type(expr, interner),
    }
}

fn hover_type<'a>(expr: &Expr<'a>, interner: &Interner) -> Option<HoverInfo> {
    let ty = expr.ty()?;
    Some(HoverInfo {
        value: ty.display(interner),
        range: expr.range(),
    })
}

fn hover_children<'a>(
    expr: &Expr<'a>,
    pos: Position,
    interner: &Interner,
) -> Option<HoverInfo> {
    match &expr.kind {
        ExprKind::Group { expr: inner, .. } => hover_expr(inner, pos, interner),
        ExprKind::Literal { .. } | ExprKind::Identifier { .. } => None,
        ExprKind::Initializer { fields, .. } => fields
            .iter()
            .find_map(|field| hover_expr(field.value, pos, interner)),
        ExprKind::Unary { right, .. } => hover_expr(right, pos, interner),
        ExprKind::Binary { left, right, .. } | ExprKind::Logical { left, right, .. } => {
            hover_expr(left, pos, interner).or_else(|| hover_expr(right, pos, interner))
        }
        ExprKind::Assignment { assignee, value, .. } => {
            hover_expr(assignee, pos, interner).or_else(|| hover_expr(value, pos, interner))
        }
        ExprKind::Cast { expr: inner, .. } => hover_expr(inner, pos, interner),
        ExprKind::Call { callee, args, .. } => hover_expr(callee, pos, interner)
            .or_else(|| args.iter().find_map(|arg| hover_expr(arg, pos, interner))),
        ExprKind::Index { value, index, .. } => {
            hover_expr(value, pos, interner).or_else(|| hover_expr(index, pos, interner))
        }
        ExprKind::Member { value, .. } => hover_expr(value, pos, interner),
    }
}
