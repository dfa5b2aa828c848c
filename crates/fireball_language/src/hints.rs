//! Inlay hints for editor integration.
//!
//! [`annotate`] collects the places where the compiler inferred something
//! the source does not spell out: variable types, enum underlying types,
//! and auto-assigned enum case values. Call-site parameter-name hints
//! exist behind [`AnnotateConfig::parameter_names`] and are off by
//! default.

use crate::ast::{Decl, Expr, ExprKind, FuncDecl, IdentKind, Stmt};
use fireball_base::{Interner, Position, Symbol};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InlayHintKind {
    Type,
    Parameter,
}

/// A single hint: text the editor renders at a position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlayHint {
    pub position: Position,
    pub label: String,
    pub kind: InlayHintKind,
}

/// Annotation switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnnotateConfig {
    /// Emit `name:` hints before call arguments.
    pub parameter_names: bool,
}

/// Collects inlay hints for a checked AST.
pub fn annotate<'a>(
    decls: &[Decl<'a>],
    interner: &Interner,
    config: AnnotateConfig,
) -> Vec<InlayHint> {
    let mut annotator = Annotator {
        functions: decls
            .iter()
            .filter_map(|decl| match decl {
                Decl::Func(f) => Some((f.name.lexeme, f)),
                _ => None,
            })
            .collect(),
        hints: Vec::new(),
        interner,
        config,
    };

    for decl in decls {
        annotator.decl(decl);
    }

    annotator.hints
}

struct Annotator<'d, 'a, 'i> {
    functions: HashMap<Symbol, &'d FuncDecl<'a>>,
    hints: Vec<InlayHint>,
    interner: &'i Interner,
    config: AnnotateConfig,
}

impl<'d, 'a, 'i> Annotator<'d, 'a, 'i> {
    fn decl(&mut self, decl: &'d Decl<'a>) {
        match decl {
            Decl::Enum(e) => {
                if e.infer_type {
                    if let Some(ty) = e.ty.get() {
                        if let Some(enum_ty) = ty.as_enum() {
                            self.add(
                                e.name.end(),
                                format!(" {}", enum_ty.underlying.name()),
                                InlayHintKind::Type,
                            );
                        }
                    }
                }

                for case in e.cases {
                    if case.infer_value {
                        self.add(
                            case.name.end(),
                            format!(" = {}", case.value),
                            InlayHintKind::Parameter,
                        );
                    }
                }
            }

            Decl::Func(f) => {
                if let Some(body) = f.body {
                    for stmt in body {
                        self.stmt(stmt);
                    }
                }
            }

            Decl::Struct(_) => {}
        }
    }

    fn stmt(&mut self, stmt: &Stmt<'a>) {
        match stmt {
            Stmt::Block { stmts, .. } => {
                for inner in *stmts {
                    self.stmt(inner);
                }
            }

            Stmt::Expression { expr } => self.expr(expr),

            Stmt::Variable { name, initializer, infer_type, ty, .. } => {
                if *infer_type {
                    if let Some(ty) = ty.get() {
                        self.add(
                            name.end(),
                            format!(" {}", ty.display(self.interner)),
                            InlayHintKind::Type,
                        );
                    }
                }
                if let Some(init) = initializer {
                    self.expr(init);
                }
            }

            Stmt::If { condition, then_branch, else_branch, .. } => {
                self.expr(condition);
                self.stmt(then_branch);
                if let Some(else_branch) = else_branch {
                    self.stmt(else_branch);
                }
            }

            Stmt::While { condition, body, .. } => {
                self.expr(condition);
                self.stmt(body);
            }

            Stmt::For { initializer, condition, increment, body, .. } => {
                if let Some(init) = initializer {
                    self.stmt(init);
                }
                if let Some(condition) = condition {
                    self.expr(condition);
                }
                if let Some(increment) = increment {
                    self.expr(increment);
                }
                self.stmt(body);
            }

            Stmt::Return { value, .. } => {
                if let Some(value) = value {
                    self.expr(value);
                }
            }

            Stmt::Break { .. } | Stmt::Continue { .. } => {}
        }
    }

    fn expr(&mut self, expr: &Expr<'a>) {
        match &expr.kind {
            ExprKind::Call { callee, args, .. } => {
                if self.config.parameter_names {
                    self.parameter_hints(callee, args);
                }
                self.expr(callee);
                for arg in *args {
                    self.expr(arg);
                }
            }

            ExprKind::Group { expr: inner, .. } => self.expr(inner),
            ExprKind::Literal { .. } | ExprKind::Identifier { .. } => {}
            ExprKind::Initializer { fields, .. } => {
                for field in *fields {
                    self.expr(field.value);
                }
            }
            ExprKind::Unary { right, .. } => self.expr(right),
            ExprKind::Binary { left, right, .. } | ExprKind::Logical { left, right, .. } => {
                self.expr(left);
                self.expr(right);
            }
            ExprKind::Assignment { assignee, value, .. } => {
                self.expr(assignee);
                self.expr(value);
            }
            ExprKind::Cast { expr: inner, .. } => self.expr(inner),
            ExprKind::Index { value, index, .. } => {
                self.expr(value);
                self.expr(index);
            }
            ExprKind::Member { value, .. } => self.expr(value),
        }
    }

    fn parameter_hints(&mut self, callee: &Expr<'a>, args: &[&Expr<'a>]) {
        let ExprKind::Identifier { identifier, kind } = &callee.kind else {
            return;
        };
        if kind.get() != IdentKind::Function {
            return;
        }
        let Some(func) = self.functions.get(&identifier.lexeme) else {
            return;
        };

        let mut labels = Vec::new();
        for (arg, param) in args.iter().zip(func.params) {
            labels.push((
                arg.range().start,
                format!("{}: ", self.interner.resolve(param.name.lexeme)),
            ));
        }
        for (position, label) in labels {
            self.add(position, label, InlayHintKind::Parameter);
        }
    }

    fn add(&mut self, position: Position, label: String, kind: InlayHintKind) {
        self.hints.push(InlayHint { position, label, kind });
    }
}
