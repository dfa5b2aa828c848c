//! Resolution and type checking.
//!
//! Two passes over the parsed declarations:
//!
//! 1. **Declare**: every struct, enum, and function gets exactly one
//!    interned [`Type`]. Struct shells are created first and their field
//!    lists filled afterwards, so pointer fields may refer to any named
//!    type, including the one being defined. Duplicate names, duplicate
//!    fields/cases/params, and value-recursive structs are diagnosed here.
//! 2. **Check**: function bodies are walked with a scope stack. Every
//!    expression gets its type cell filled, every identifier its resolved
//!    kind. Resolution and type errors are appended to the diagnostic
//!    list; checking continues with a `void` poison type so one mistake
//!    does not hide the rest of the body.
//!
//! Numeric literals adopt an expected primitive type when one is in
//! context (variable initializer, assignment, call argument, return), and
//! `nil` adopts any expected pointer type. Everything else is checked
//! nominally against the interned types.

use crate::arena_ctx::AstContext;
use crate::ast::{Decl, Expr, ExprKind, IdentKind, Stmt, TypeExpr};
use crate::token::{Token, TokenKind};
use crate::types::{
    EnumCase, EnumType, Field, FunctionType, Param, PrimitiveKind, StructType, Type,
};
use fireball_base::{Diagnostic, Interner, Range, Symbol};
use std::collections::{HashMap, HashSet};

/// Checks a parsed file, filling type cells and returning the collected
/// diagnostics.
pub fn check<'a>(
    decls: &[Decl<'a>],
    ctx: AstContext<'a>,
    interner: &Interner,
) -> Vec<Diagnostic> {
    let mut checker = Checker::new(ctx, interner);
    checker.declare(decls);
    checker.check_bodies(decls);
    checker.diagnostics
}

#[derive(Clone, Copy)]
struct Binding<'a> {
    ty: &'a Type<'a>,
    is_param: bool,
}

struct Checker<'a, 'i> {
    ctx: AstContext<'a>,
    interner: &'i Interner,
    diagnostics: Vec<Diagnostic>,

    primitives: HashMap<PrimitiveKind, &'a Type<'a>>,
    structs: HashMap<Symbol, &'a Type<'a>>,
    enums: HashMap<Symbol, &'a Type<'a>>,
    functions: HashMap<Symbol, &'a Type<'a>>,

    scopes: Vec<HashMap<Symbol, Binding<'a>>>,
    current_return: Option<&'a Type<'a>>,
    loop_depth: u32,
}

impl<'a, 'i> Checker<'a, 'i> {
    fn new(ctx: AstContext<'a>, interner: &'i Interner) -> Self {
        let primitives = PrimitiveKind::ALL
            .into_iter()
            .map(|kind| (kind, &*ctx.ty(Type::Primitive(kind))))
            .collect();

        Checker {
            ctx,
            interner,
            diagnostics: Vec::new(),
            primitives,
            structs: HashMap::new(),
            enums: HashMap::new(),
            functions: HashMap::new(),
            scopes: Vec::new(),
            current_return: None,
            loop_depth: 0,
        }
    }

    // ========================================================================
    // Pass 1: declare
    // ========================================================================

    fn declare(&mut self, decls: &[Decl<'a>]) {
        // Shells for named types so fields and signatures can refer to them.
        for decl in decls {
            match decl {
                Decl::Struct(s) => {
                    let sym = s.name.lexeme;
                    if self.type_name_taken(sym) {
                        self.error_at(s.name, format!(
                            "Type '{}' is already defined.",
                            self.interner.resolve(sym)
                        ));
                        continue;
                    }
                    let ty = self.ctx.ty(Type::Struct(StructType::new(sym)));
                    self.structs.insert(sym, ty);
                    s.ty.set(Some(ty));
                }
                Decl::Enum(e) => {
                    let sym = e.name.lexeme;
                    if self.type_name_taken(sym) {
                        self.error_at(e.name, format!(
                            "Type '{}' is already defined.",
                            self.interner.resolve(sym)
                        ));
                        continue;
                    }

                    let underlying = self.enum_underlying(e.underlying);

                    let mut seen = HashSet::new();
                    let mut cases = Vec::new();
                    for case in e.cases {
                        if !seen.insert(case.name.lexeme) {
                            self.error_at(case.name, format!(
                                "Duplicate enum case '{}'.",
                                self.interner.resolve(case.name.lexeme)
                            ));
                            continue;
                        }
                        cases.push(EnumCase {
                            name: case.name.lexeme,
                            value: case.value,
                            infer_value: case.infer_value,
                        });
                    }

                    let ty = self.ctx.ty(Type::Enum(EnumType {
                        name: sym,
                        underlying,
                        cases: self.ctx.type_case_list(cases),
                        infer_type: e.infer_type,
                    }));
                    self.enums.insert(sym, ty);
                    e.ty.set(Some(ty));
                }
                Decl::Func(_) => {}
            }
        }

        // Fill struct field lists.
        for decl in decls {
            if let Decl::Struct(s) = decl {
                let Some(ty) = s.ty.get() else { continue };
                let struct_ty = ty.as_struct().expect("struct shell");

                let mut seen = HashSet::new();
                let mut fields = Vec::new();
                for field in s.fields {
                    if !seen.insert(field.name.lexeme) {
                        self.error_at(field.name, format!(
                            "Duplicate field '{}'.",
                            self.interner.resolve(field.name.lexeme)
                        ));
                        continue;
                    }
                    let field_ty = self.resolve_type_expr(field.type_expr);
                    if field_ty.is_void() {
                        self.error_at(field.name, "Field cannot have type 'void'.");
                        continue;
                    }
                    fields.push(Field { name: field.name.lexeme, ty: field_ty });
                }

                struct_ty.set_fields(self.ctx.type_field_list(fields));
            }
        }

        self.reject_value_recursive_structs(decls);

        // Function signatures, now that every named type resolves.
        for decl in decls {
            if let Decl::Func(f) = decl {
                let sym = f.name.lexeme;
                if self.functions.contains_key(&sym) {
                    self.error_at(f.name, format!(
                        "Function '{}' is already defined.",
                        self.interner.resolve(sym)
                    ));
                    continue;
                }

                let mut seen = HashSet::new();
                let mut params = Vec::new();
                for param in f.params {
                    if !seen.insert(param.name.lexeme) {
                        self.error_at(param.name, format!(
                            "Duplicate parameter '{}'.",
                            self.interner.resolve(param.name.lexeme)
                        ));
                    }
                    let param_ty = self.resolve_type_expr(param.type_expr);
                    if param_ty.is_void() {
                        self.error_at(param.name, "Parameter cannot have type 'void'.");
                    }
                    params.push(Param { name: param.name.lexeme, ty: param_ty });
                }

                let returns = match f.return_type {
                    Some(te) => self.resolve_type_expr(te),
                    None => self.primitive(PrimitiveKind::Void),
                };

                let ty = self.ctx.ty(Type::Function(FunctionType {
                    name: sym,
                    params: self.ctx.type_param_list(params),
                    variadic: f.variadic,
                    returns,
                    is_extern: f.is_extern,
                }));
                self.functions.insert(sym, ty);
                f.ty.set(Some(ty));
            }
        }
    }

    fn type_name_taken(&self, sym: Symbol) -> bool {
        self.structs.contains_key(&sym) || self.enums.contains_key(&sym)
    }

    fn enum_underlying(&mut self, token: Option<Token>) -> PrimitiveKind {
        let Some(token) = token else {
            return PrimitiveKind::I32;
        };

        match PrimitiveKind::from_name(self.interner.resolve(token.lexeme)) {
            Some(kind) if kind.is_integer() => kind,
            _ => {
                self.error_at(token, "Enum underlying type must be an integer.");
                PrimitiveKind::I32
            }
        }
    }

    /// A struct that contains itself by value has no finite size.
    fn reject_value_recursive_structs(&mut self, decls: &[Decl<'a>]) {
        fn embeds(ty: &Type, target: Symbol, visited: &mut HashSet<Symbol>) -> bool {
            let Some(s) = ty.as_struct() else { return false };
            if !visited.insert(s.name) {
                return false;
            }
            s.fields().iter().any(|field| {
                field
                    .ty
                    .as_struct()
                    .is_some_and(|inner| inner.name == target)
                    || embeds(field.ty, target, visited)
            })
        }

        for decl in decls {
            if let Decl::Struct(s) = decl {
                let Some(ty) = s.ty.get() else { continue };
                let mut visited = HashSet::new();
                if embeds(ty, s.name.lexeme, &mut visited) {
                    self.error_at(s.name, format!(
                        "Struct '{}' recursively contains itself.",
                        self.interner.resolve(s.name.lexeme)
                    ));
                    // Break the cycle so size computations terminate.
                    ty.as_struct().expect("struct shell").set_fields(&[]);
                }
            }
        }
    }

    fn resolve_type_expr(&mut self, te: &'a TypeExpr<'a>) -> &'a Type<'a> {
        match te {
            TypeExpr::Primitive { kind, .. } => self.primitive(*kind),
            TypeExpr::Pointer { pointee, .. } => {
                let pointee = self.resolve_type_expr(pointee);
                self.ctx.ty(Type::Pointer(pointee))
            }
            TypeExpr::Named { name } => {
                let sym = name.lexeme;
                if let Some(ty) = self.structs.get(&sym).or_else(|| self.enums.get(&sym)) {
                    ty
                } else {
                    self.error_at(*name, format!(
                        "Unknown type '{}'.",
                        self.interner.resolve(sym)
                    ));
                    self.primitive(PrimitiveKind::Void)
                }
            }
        }
    }

    // ========================================================================
    // Pass 2: check bodies
    // ========================================================================

    fn check_bodies(&mut self, decls: &[Decl<'a>]) {
        for decl in decls {
            let Decl::Func(f) = decl else { continue };
            let Some(body) = f.body else { continue };
            let Some(Type::Function(fn_ty)) = f.ty.get() else { continue };

            self.current_return = Some(fn_ty.returns);
            self.loop_depth = 0;
            self.scopes.clear();

            let mut params = HashMap::new();
            for param in fn_ty.params {
                params.insert(param.name, Binding { ty: param.ty, is_param: true });
            }
            self.scopes.push(params);

            for stmt in body {
                self.check_stmt(stmt);
            }

            self.scopes.pop();
            self.current_return = None;
        }
    }

    fn check_stmt(&mut self, stmt: &'a Stmt<'a>) {
        match stmt {
            Stmt::Block { stmts, .. } => {
                self.scopes.push(HashMap::new());
                for inner in *stmts {
                    self.check_stmt(inner);
                }
                self.scopes.pop();
            }

            Stmt::Expression { expr } => {
                self.check_expr(expr, None);
            }

            Stmt::Variable { name, type_expr, initializer, ty, .. } => {
                let declared = type_expr.map(|te| self.resolve_type_expr(te));

                if let Some(d) = declared {
                    if d.is_void() {
                        self.error_at(*name, "Cannot declare a variable of type 'void'.");
                    }
                }

                let init_ty = initializer.map(|init| (init, self.check_expr(init, declared)));

                let var_ty = match (declared, init_ty) {
                    (Some(d), Some((init, i))) => {
                        if !i.can_assign_to(d) {
                            self.error(init.range(), format!(
                                "Cannot assign value of type {} to variable of type {}.",
                                i.display(self.interner),
                                d.display(self.interner)
                            ));
                        }
                        d
                    }
                    (Some(d), None) => d,
                    (None, Some((init, i))) => {
                        if i.is_void() {
                            self.error(init.range(),
                                "Cannot assign a 'void' value to a variable.");
                        }
                        i
                    }
                    (None, None) => {
                        self.error_at(*name,
                            "Variable declaration needs a type or an initializer.");
                        self.primitive(PrimitiveKind::Void)
                    }
                };

                ty.set(Some(var_ty));
                self.bind(name.lexeme, Binding { ty: var_ty, is_param: false });
            }

            Stmt::If { condition, then_branch, else_branch, .. } => {
                self.check_condition(condition, "If condition must be a 'bool'.");
                self.check_stmt(then_branch);
                if let Some(else_branch) = else_branch {
                    self.check_stmt(else_branch);
                }
            }

            Stmt::While { condition, body, .. } => {
                self.check_condition(condition, "Loop condition must be a 'bool'.");
                self.loop_depth += 1;
                self.check_stmt(body);
                self.loop_depth -= 1;
            }

            Stmt::For { initializer, condition, increment, body, .. } => {
                self.scopes.push(HashMap::new());
                if let Some(init) = initializer {
                    self.check_stmt(init);
                }
                if let Some(condition) = condition {
                    self.check_condition(condition, "Loop condition must be a 'bool'.");
                }
                if let Some(increment) = increment {
                    self.check_expr(increment, None);
                }
                self.loop_depth += 1;
                self.check_stmt(body);
                self.loop_depth -= 1;
                self.scopes.pop();
            }

            Stmt::Return { token, value } => {
                let returns = self.current_return.expect("return outside function");

                if returns.is_void() {
                    if let Some(value) = value {
                        self.check_expr(value, None);
                        self.error_at(*token,
                            "Cannot return a value from a function returning 'void'.");
                    }
                } else {
                    match value {
                        None => self.error_at(*token, "Expected a return value."),
                        Some(value) => {
                            let vt = self.check_expr(value, Some(returns));
                            if !vt.can_assign_to(returns) {
                                self.error(value.range(), format!(
                                    "Cannot return a value of type {} from a function returning {}.",
                                    vt.display(self.interner),
                                    returns.display(self.interner)
                                ));
                            }
                        }
                    }
                }
            }

            Stmt::Break { token } => {
                if self.loop_depth == 0 {
                    self.error_at(*token, "Break statement outside of a loop.");
                }
            }

            Stmt::Continue { token } => {
                if self.loop_depth == 0 {
                    self.error_at(*token, "Continue statement outside of a loop.");
                }
            }
        }
    }

    fn check_condition(&mut self, condition: &'a Expr<'a>, message: &str) {
        let bool_ty = self.primitive(PrimitiveKind::Bool);
        let ty = self.check_expr(condition, Some(bool_ty));
        if !ty.is_primitive(PrimitiveKind::Bool) {
            self.error(condition.range(), message);
        }
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn check_expr(
        &mut self,
        expr: &'a Expr<'a>,
        expected: Option<&'a Type<'a>>,
    ) -> &'a Type<'a> {
        let ty = self.check_expr_kind(expr, expected);
        expr.set_ty(ty);
        ty
    }

    fn check_expr_kind(
        &mut self,
        expr: &'a Expr<'a>,
        expected: Option<&'a Type<'a>>,
    ) -> &'a Type<'a> {
        match &expr.kind {
            ExprKind::Literal { value } => self.literal_type(*value, expected),

            ExprKind::Group { expr: inner, .. } => self.check_expr(inner, expected),

            ExprKind::Identifier { identifier, kind } => {
                let sym = identifier.lexeme;

                if let Some(binding) = self.lookup(sym) {
                    kind.set(if binding.is_param {
                        IdentKind::Parameter
                    } else {
                        IdentKind::Variable
                    });
                    return binding.ty;
                }
                if let Some(ty) = self.functions.get(&sym) {
                    kind.set(IdentKind::Function);
                    return ty;
                }
                if let Some(ty) = self.enums.get(&sym) {
                    kind.set(IdentKind::Enum);
                    return ty;
                }

                self.error_at(*identifier, format!(
                    "Unknown identifier '{}'.",
                    self.interner.resolve(sym)
                ));
                self.primitive(PrimitiveKind::Void)
            }

            ExprKind::Initializer { name, fields } => {
                let Some(&ty) = self.structs.get(&name.lexeme) else {
                    self.error_at(*name, format!(
                        "Unknown struct '{}'.",
                        self.interner.resolve(name.lexeme)
                    ));
                    for field in *fields {
                        self.check_expr(field.value, None);
                    }
                    return self.primitive(PrimitiveKind::Void);
                };

                let struct_name = self.interner.resolve(name.lexeme).to_string();
                let mut seen = HashSet::new();

                for field in *fields {
                    if !seen.insert(field.name.lexeme) {
                        self.error_at(field.name, format!(
                            "Field '{}' is already initialized.",
                            self.interner.resolve(field.name.lexeme)
                        ));
                    }

                    match ty.as_struct().and_then(|s| s.field(field.name.lexeme)) {
                        Some((_, struct_field)) => {
                            let vt = self.check_expr(field.value, Some(struct_field.ty));
                            if !vt.can_assign_to(struct_field.ty) {
                                self.error(field.value.range(), format!(
                                    "Cannot assign value of type {} to field '{}' of type {}.",
                                    vt.display(self.interner),
                                    self.interner.resolve(field.name.lexeme),
                                    struct_field.ty.display(self.interner)
                                ));
                            }
                        }
                        None => {
                            self.error_at(field.name, format!(
                                "Struct '{}' has no field '{}'.",
                                struct_name,
                                self.interner.resolve(field.name.lexeme)
                            ));
                            self.check_expr(field.value, None);
                        }
                    }
                }

                ty
            }

            ExprKind::Unary { op, right } => self.check_unary(*op, right, expected),

            ExprKind::Binary { left, op, right } => self.check_binary(left, *op, right, expected),

            ExprKind::Logical { left, op, right } => {
                let bool_ty = self.primitive(PrimitiveKind::Bool);
                let lt = self.check_expr(left, Some(bool_ty));
                let rt = self.check_expr(right, Some(bool_ty));

                if !lt.is_primitive(PrimitiveKind::Bool) || !rt.is_primitive(PrimitiveKind::Bool) {
                    self.error(expr.range(), format!(
                        "Operands of '{}' must be 'bool'.",
                        self.interner.resolve(op.lexeme)
                    ));
                }

                bool_ty
            }

            ExprKind::Assignment { assignee, op, value } => {
                let at = self.check_expr(assignee, None);

                if !self.is_lvalue(assignee) {
                    self.error(assignee.range(), "Invalid assignment target.");
                }

                let vt = self.check_expr(value, Some(at));

                if op.kind != TokenKind::Equal {
                    let numeric = at
                        .as_primitive()
                        .is_some_and(|k| k.is_integer() || k.is_floating());
                    if !numeric {
                        self.error(expr.range(), format!(
                            "Operands of '{}' must be numbers of the same type.",
                            self.interner.resolve(op.lexeme)
                        ));
                    }
                }

                if !vt.can_assign_to(at) {
                    self.error(value.range(), format!(
                        "Cannot assign value of type {} to target of type {}.",
                        vt.display(self.interner),
                        at.display(self.interner)
                    ));
                }

                at
            }

            ExprKind::Cast { expr: inner, target, .. } => {
                let from = self.check_expr(inner, None);
                let to = self.resolve_type_expr(target);

                if !cast_allowed(from, to) {
                    self.error(expr.range(), format!(
                        "Cannot cast from {} to {}.",
                        from.display(self.interner),
                        to.display(self.interner)
                    ));
                }

                to
            }

            ExprKind::Call { token, callee, args } => {
                let ct = self.check_expr(callee, None);

                let Some(f) = ct.as_function() else {
                    self.error(callee.range(), "Can only call functions.");
                    for arg in *args {
                        self.check_expr(arg, None);
                    }
                    return self.primitive(PrimitiveKind::Void);
                };

                let arity_ok = if f.variadic {
                    args.len() >= f.params.len()
                } else {
                    args.len() == f.params.len()
                };
                if !arity_ok {
                    self.error_at(*token, format!(
                        "Expected {} arguments but got {}.",
                        f.params.len(),
                        args.len()
                    ));
                }

                for (i, arg) in args.iter().enumerate() {
                    let param = f.params.get(i);
                    let at = self.check_expr(arg, param.map(|p| p.ty));
                    if let Some(param) = param {
                        if !at.can_assign_to(param.ty) {
                            self.error(arg.range(), format!(
                                "Argument of type {} cannot be assigned to parameter '{}' of type {}.",
                                at.display(self.interner),
                                self.interner.resolve(param.name),
                                param.ty.display(self.interner)
                            ));
                        }
                    }
                }

                f.returns
            }

            ExprKind::Index { value, index, .. } => {
                let vt = self.check_expr(value, None);

                let Some(pointee) = vt.as_pointer() else {
                    self.error(value.range(), "Can only index pointer values.");
                    self.check_expr(index, None);
                    return self.primitive(PrimitiveKind::Void);
                };

                if !self.is_lvalue(value) {
                    self.error(value.range(), "Cannot index a value expression.");
                }

                let i64_ty = self.primitive(PrimitiveKind::I64);
                let it = self.check_expr(index, Some(i64_ty));
                if !it.is_integer() {
                    self.error(index.range(), "Index must be an integer.");
                }

                pointee
            }

            ExprKind::Member { value, name } => self.check_member(value, *name),
        }
    }

    fn check_unary(
        &mut self,
        op: Token,
        right: &'a Expr<'a>,
        expected: Option<&'a Type<'a>>,
    ) -> &'a Type<'a> {
        match op.kind {
            TokenKind::Bang => {
                let bool_ty = self.primitive(PrimitiveKind::Bool);
                let rt = self.check_expr(right, Some(bool_ty));
                if !rt.is_primitive(PrimitiveKind::Bool) {
                    self.error(right.range(), "Operand of '!' must be a 'bool'.");
                }
                bool_ty
            }

            TokenKind::Minus => {
                let rt = self.check_expr(right, expected);
                let ok = rt
                    .as_primitive()
                    .is_some_and(|k| k.is_floating() || k.is_signed());
                if !ok {
                    self.error(right.range(), "Operand of '-' must be a signed number.");
                }
                rt
            }

            TokenKind::Ampersand => {
                let rt = self.check_expr(right, None);
                if !self.is_lvalue(right) {
                    self.error(right.range(), "Cannot take the address of a value expression.");
                }
                self.ctx.ty(Type::Pointer(rt))
            }

            TokenKind::Star => {
                let rt = self.check_expr(right, None);
                match rt.as_pointer() {
                    Some(pointee) => pointee,
                    None => {
                        self.error(right.range(), "Cannot dereference a non-pointer value.");
                        self.primitive(PrimitiveKind::Void)
                    }
                }
            }

            _ => unreachable!("parser produced unary operator {:?}", op.kind),
        }
    }

    fn check_binary(
        &mut self,
        left: &'a Expr<'a>,
        op: Token,
        right: &'a Expr<'a>,
        expected: Option<&'a Type<'a>>,
    ) -> &'a Type<'a> {
        let kind = op.kind;

        // An expected numeric type flows into both operands so literals
        // adopt it; comparisons constrain only right-to-left.
        let lt = if kind.is_arithmetic() || kind.is_bitwise() {
            self.check_expr(left, expected)
        } else {
            self.check_expr(left, None)
        };
        let rt = self.check_expr(right, Some(lt));

        let op_text = self.interner.resolve(op.lexeme).to_string();
        let bool_ty = self.primitive(PrimitiveKind::Bool);

        if kind.is_equality() {
            let comparable = matches!(lt, Type::Pointer(_) | Type::Enum(_))
                || lt.as_primitive().is_some_and(|k| k != PrimitiveKind::Void);
            if !comparable {
                self.error(left.range(), format!(
                    "Cannot compare values of type {}.",
                    lt.display(self.interner)
                ));
            } else if !rt.equals(lt) {
                self.error(right.range(), format!(
                    "Operands of '{}' must have the same type.",
                    op_text
                ));
            }
            return bool_ty;
        }

        if kind.is_comparison() {
            if !self.same_numeric(lt, rt) {
                self.error(right.range(), format!(
                    "Operands of '{}' must be numbers of the same type.",
                    op_text
                ));
            }
            return bool_ty;
        }

        if kind.is_bitwise() {
            let ok = lt.is_integer() && rt.equals(lt);
            if !ok {
                self.error(right.range(), format!(
                    "Operands of '{}' must be integers of the same type.",
                    op_text
                ));
            }
            return lt;
        }

        // Arithmetic.
        if !self.same_numeric(lt, rt) {
            self.error(right.range(), format!(
                "Operands of '{}' must be numbers of the same type.",
                op_text
            ));
        }
        lt
    }

    fn check_member(&mut self, value: &'a Expr<'a>, name: Token) -> &'a Type<'a> {
        let vt = self.check_expr(value, None);

        // `Enum.Case` reads the case constant.
        if let ExprKind::Identifier { kind, .. } = &value.kind {
            if kind.get() == IdentKind::Enum {
                let e = vt.as_enum().expect("enum identifier");
                if e.case(name.lexeme).is_none() {
                    self.error_at(name, format!(
                        "Enum '{}' has no case '{}'.",
                        self.interner.resolve(e.name),
                        self.interner.resolve(name.lexeme)
                    ));
                }
                return vt;
            }
        }

        // Struct field access, through at most one pointer.
        let struct_ty = vt
            .as_struct()
            .or_else(|| vt.as_pointer().and_then(|p| p.as_struct()));

        let Some(s) = struct_ty else {
            self.error(value.range(), "Only structs and enums have members.");
            return self.primitive(PrimitiveKind::Void);
        };

        match s.field(name.lexeme) {
            Some((_, field)) => field.ty,
            None => {
                self.error_at(name, format!(
                    "Struct '{}' has no field '{}'.",
                    self.interner.resolve(s.name),
                    self.interner.resolve(name.lexeme)
                ));
                self.primitive(PrimitiveKind::Void)
            }
        }
    }

    fn same_numeric(&self, lt: &'a Type<'a>, rt: &'a Type<'a>) -> bool {
        let numeric = lt
            .as_primitive()
            .is_some_and(|k| k.is_integer() || k.is_floating());
        numeric && rt.equals(lt)
    }

    fn literal_type(
        &mut self,
        token: Token,
        expected: Option<&'a Type<'a>>,
    ) -> &'a Type<'a> {
        match token.kind {
            TokenKind::Nil => match expected {
                Some(ty @ Type::Pointer(_)) => ty,
                _ => {
                    let void = self.primitive(PrimitiveKind::Void);
                    self.ctx.ty(Type::Pointer(void))
                }
            },

            TokenKind::True | TokenKind::False => self.primitive(PrimitiveKind::Bool),

            TokenKind::Number => {
                let text = self.interner.resolve(token.lexeme);
                if text.ends_with('f') || text.ends_with('F') {
                    self.primitive(PrimitiveKind::F32)
                } else if text.contains('.') {
                    self.adopt_expected(expected, |k| k.is_floating())
                        .unwrap_or_else(|| self.primitive(PrimitiveKind::F64))
                } else {
                    self.adopt_expected(expected, |k| k.is_integer() || k.is_floating())
                        .unwrap_or_else(|| self.primitive(PrimitiveKind::I32))
                }
            }

            TokenKind::Hex | TokenKind::Binary => self
                .adopt_expected(expected, |k| k.is_integer())
                .unwrap_or_else(|| self.primitive(PrimitiveKind::I32)),

            TokenKind::Character => self.primitive(PrimitiveKind::U8),

            TokenKind::String => {
                let u8_ty = self.primitive(PrimitiveKind::U8);
                self.ctx.ty(Type::Pointer(u8_ty))
            }

            _ => unreachable!("parser produced literal kind {:?}", token.kind),
        }
    }

    fn adopt_expected(
        &self,
        expected: Option<&'a Type<'a>>,
        accepts: impl Fn(PrimitiveKind) -> bool,
    ) -> Option<&'a Type<'a>> {
        let ty = expected?;
        ty.as_primitive().filter(|k| accepts(*k))?;
        Some(ty)
    }

    /// An lvalue names storage: a variable or parameter, a dereference, an
    /// index, or a member reached through addressable storage.
    fn is_lvalue(&self, expr: &Expr<'a>) -> bool {
        match &expr.kind {
            ExprKind::Identifier { kind, .. } => {
                matches!(kind.get(), IdentKind::Variable | IdentKind::Parameter)
            }
            ExprKind::Unary { op, .. } => op.kind == TokenKind::Star,
            ExprKind::Index { .. } => true,
            ExprKind::Member { value, .. } => {
                if let ExprKind::Identifier { kind, .. } = &value.kind {
                    if kind.get() == IdentKind::Enum {
                        return false;
                    }
                }
                self.is_lvalue(value)
                    || value.ty().is_some_and(|ty| ty.as_pointer().is_some())
            }
            ExprKind::Group { expr, .. } => self.is_lvalue(expr),
            _ => false,
        }
    }

    // ========================================================================
    // Utilities
    // ========================================================================

    fn primitive(&self, kind: PrimitiveKind) -> &'a Type<'a> {
        self.primitives[&kind]
    }

    fn bind(&mut self, sym: Symbol, binding: Binding<'a>) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(sym, binding);
        }
    }

    fn lookup(&self, sym: Symbol) -> Option<Binding<'a>> {
        for scope in self.scopes.iter().rev() {
            if let Some(binding) = scope.get(&sym) {
                return Some(*binding);
            }
        }
        None
    }

    fn error(&mut self, range: Range, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::error(range, message));
    }

    fn error_at(&mut self, token: Token, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::error(token.range(), message));
    }
}

/// The cast lattice: primitive↔primitive, enum↔integer, pointer↔pointer.
fn cast_allowed<'a>(from: &Type<'a>, to: &Type<'a>) -> bool {
    if from.equals(to) {
        return true;
    }

    match (from, to) {
        (Type::Primitive(a), Type::Primitive(b)) => {
            *a != PrimitiveKind::Void && *b != PrimitiveKind::Void
        }
        (Type::Enum(_), Type::Primitive(p)) => *p != PrimitiveKind::Void,
        (Type::Primitive(p), Type::Enum(_)) => p.is_integer(),
        (Type::Pointer(_), Type::Pointer(_)) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use crate::arena_ctx::{AstArenas, AstContext};
    use crate::parser::parse;
    use fireball_base::{Diagnostic, Interner};

    fn check_source(source: &str) -> Vec<Diagnostic> {
        let mut interner = Interner::new();
        let arenas = AstArenas::new();
        let ctx = AstContext::new(&arenas);

        let output = parse(ctx, source, &mut interner);
        assert!(
            output.diagnostics.is_empty(),
            "parse failed: {:?}",
            output.diagnostics
        );

        super::check(&output.decls, ctx, &interner)
    }

    fn assert_clean(source: &str) {
        let diags = check_source(source);
        assert!(diags.is_empty(), "unexpected diagnostics: {:?}", diags);
    }

    fn assert_error(source: &str, fragment: &str) {
        let diags = check_source(source);
        assert!(
            diags.iter().any(|d| d.message.contains(fragment)),
            "expected '{}' in {:?}",
            fragment,
            diags
        );
    }

    #[test]
    fn well_typed_function_checks_clean() {
        assert_clean("func add(a: i32, b: i32) -> i32 { return a + b; }");
    }

    #[test]
    fn unknown_identifier_is_reported() {
        assert_error("func f() { var x: i32 = y; }", "Unknown identifier 'y'.");
    }

    #[test]
    fn literal_adopts_the_declared_type() {
        assert_clean("func f() { var x: i64 = 42; var y: f64 = 1; }");
    }

    #[test]
    fn mismatched_initializer_is_reported() {
        assert_error(
            "func f() { var x: i32 = true; }",
            "Cannot assign value of type bool to variable of type i32.",
        );
    }

    #[test]
    fn mixed_arithmetic_is_reported() {
        assert_error(
            "func f(a: i32, b: i64) { var c: i32 = a + b; }",
            "must be numbers of the same type",
        );
    }

    #[test]
    fn condition_must_be_bool() {
        assert_error("func f() { if 1 { } }", "If condition must be a 'bool'.");
    }

    #[test]
    fn break_outside_loop_is_reported() {
        assert_error("func f() { break; }", "Break statement outside of a loop.");
    }

    #[test]
    fn break_inside_loop_is_fine() {
        assert_clean("func f() { while true { break; continue; } }");
    }

    #[test]
    fn return_type_must_match() {
        assert_error(
            "func f() -> i32 { return true; }",
            "Cannot return a value of type bool",
        );
    }

    #[test]
    fn void_function_cannot_return_a_value() {
        assert_error(
            "func f() { return 1; }",
            "Cannot return a value from a function returning 'void'.",
        );
    }

    #[test]
    fn call_arity_is_checked() {
        assert_error(
            "func g(a: i32) { } func f() { g(); }",
            "Expected 1 arguments but got 0.",
        );
    }

    #[test]
    fn struct_fields_resolve() {
        assert_clean(
            "struct P { x: i32, y: i32 } func f() -> i32 { var p: P = P { x: 1, y: 2 }; return p.x; }",
        );
    }

    #[test]
    fn unknown_struct_field_is_reported() {
        assert_error(
            "struct P { x: i32 } func f() { var p: P = P { z: 1 }; }",
            "Struct 'P' has no field 'z'.",
        );
    }

    #[test]
    fn enum_member_resolves_to_the_enum_type() {
        assert_clean(
            "enum E: i32 { A, B = 5 } func f() -> i32 { return E.B as i32; }",
        );
    }

    #[test]
    fn unknown_enum_case_is_reported() {
        assert_error(
            "enum E { A } func f() { var x: E = E.Z; }",
            "Enum 'E' has no case 'Z'.",
        );
    }

    #[test]
    fn address_of_a_value_expression_is_reported() {
        assert_error(
            "func f() { var p: *i32 = &1; }",
            "Cannot take the address of a value expression.",
        );
    }

    #[test]
    fn address_of_a_variable_is_fine() {
        assert_clean("func f() { var x: i32 = 1; var p: *i32 = &x; var y: i32 = *p; }");
    }

    #[test]
    fn indexing_a_value_expression_is_reported() {
        assert_error(
            "extern func g() -> *i32; func f() -> i32 { return g()[0]; }",
            "Cannot index a value expression.",
        );
    }

    #[test]
    fn indexing_a_pointer_variable_is_fine() {
        assert_clean("func f(p: *i32) -> i32 { return p[0]; }");
    }

    #[test]
    fn invalid_cast_is_reported() {
        assert_error(
            "struct P { x: i32 } func f(p: P) { var x: i32 = p as i32; }",
            "Cannot cast from P to i32.",
        );
    }

    #[test]
    fn duplicate_struct_field_is_reported() {
        assert_error("struct P { x: i32, x: i32 }", "Duplicate field 'x'.");
    }

    #[test]
    fn duplicate_parameter_is_reported() {
        assert_error("func f(a: i32, a: i32) { }", "Duplicate parameter 'a'.");
    }

    #[test]
    fn value_recursive_struct_is_reported() {
        assert_error(
            "struct A { a: A }",
            "Struct 'A' recursively contains itself.",
        );
    }

    #[test]
    fn pointer_recursive_struct_is_fine() {
        assert_clean("struct Node { next: *Node, value: i32 }");
    }

    #[test]
    fn nil_adopts_the_expected_pointer_type() {
        assert_clean("func f() { var p: *i32 = nil; }");
    }

    #[test]
    fn assignment_target_must_be_an_lvalue() {
        assert_error("func f() { 1 = 2; }", "Invalid assignment target.");
    }

    #[test]
    fn compound_assignment_checks_clean() {
        assert_clean("func f() { var x: i32 = 0; x += 2; x %= 3; }");
    }
}
