//! Expression lowering.
//!
//! One function per expression form, mirroring the checker's shapes:
//!
//! | Form | Lowering |
//! |------|----------|
//! | literal | immediate constant (floats as double bit patterns, strings via the global pool) |
//! | group | transparent |
//! | unary | `xor i1`, `fneg`/`sub nsw`, address-of, pointer load |
//! | binary | one instruction chosen by `(op, floating, signed)` |
//! | logical | short-circuit diamond ending in a `phi i1` |
//! | identifier | scope slot, `@function` symbol, or the `$enum$` sentinel |
//! | assignment | evaluate assignee, load RHS, optional compound op, `store` |
//! | cast | `trunc`/`sext`/`zext`/`fptrunc`/`fpext`/`sitofp`/… by kind pair |
//! | call | load each argument, emit `call`, bind a result unless void |
//! | index | pointer value + `getelementptr inbounds`, addressable result |
//! | member | enum case constant, field GEP, or `extractvalue` |
//! | initializer | `zeroinitializer` + one `insertvalue` per written field |
//!
//! The right-hand side of `&&`/`||` is evaluated only inside its branch
//! block, and the `phi` names whatever block is current after that
//! evaluation, so nested logicals chain correctly.

use super::context::ExprValue;
use super::types::ir_type;
use super::{write_inst, Codegen};
use fireball_language::ast::{Expr, ExprKind, IdentKind};
use fireball_language::token::{Token, TokenKind};
use fireball_language::types::{PrimitiveKind, Type};
use std::fmt::Write;

/// The sentinel an enum identifier lowers to; the following member access
/// replaces it with the case's integer constant without touching memory.
const ENUM_SENTINEL: &str = "$enum$";

impl<'a, 'i> Codegen<'a, 'i> {
    pub(crate) fn expr(&mut self, expr: &'a Expr<'a>) -> ExprValue {
        match &expr.kind {
            ExprKind::Group { expr: inner, .. } => self.expr(inner),
            ExprKind::Literal { value } => self.literal(expr, *value),
            ExprKind::Initializer { fields, .. } => self.initializer(expr, fields),
            ExprKind::Unary { op, right } => self.unary(expr, *op, right),
            ExprKind::Binary { left, op, right } => {
                let lv = self.expr(left);
                let rv = self.expr(right);
                self.binary(*op, lv, expr_ty(left), rv, expr_ty(right))
            }
            ExprKind::Logical { left, op, right } => self.logical(*op, left, right),
            ExprKind::Identifier { identifier, kind } => self.identifier(*identifier, kind.get()),
            ExprKind::Assignment { assignee, op, value } => self.assignment(assignee, *op, value),
            ExprKind::Cast { expr: inner, token, .. } => self.cast(expr, *token, inner),
            ExprKind::Call { token, callee, args } => self.call(expr, *token, callee, args),
            ExprKind::Index { token, value, index } => self.index(expr, *token, value, index),
            ExprKind::Member { value, name } => self.member(value, *name),
        }
    }

    /// Evaluates an expression and loads it into a value, returning the
    /// value and its IR type.
    pub(crate) fn load_expr(&mut self, expr: &'a Expr<'a>) -> (ExprValue, String) {
        let value = self.expr(expr);
        let ty = expr_ty(expr);
        (self.load(value, ty), ir_type(ty, self.interner))
    }

    // ========================================================================
    // Leaves
    // ========================================================================

    fn literal(&mut self, expr: &'a Expr<'a>, value: Token) -> ExprValue {
        let raw = match value.kind {
            TokenKind::Nil => "null".to_string(),

            TokenKind::True | TokenKind::False => {
                self.interner.resolve(value.lexeme).to_string()
            }

            TokenKind::Number => {
                let text = self.interner.resolve(value.lexeme);
                match expr_ty(expr).as_primitive() {
                    Some(PrimitiveKind::F32) => {
                        let trimmed = text.trim_end_matches(['f', 'F']);
                        let parsed: f32 = trimmed.parse().unwrap_or(0.0);
                        format!("0x{:X}", (parsed as f64).to_bits())
                    }
                    Some(PrimitiveKind::F64) => {
                        let parsed: f64 = text.parse().unwrap_or(0.0);
                        format!("0x{:X}", parsed.to_bits())
                    }
                    _ => text.to_string(),
                }
            }

            TokenKind::Hex => {
                let text = self.interner.resolve(value.lexeme);
                u64::from_str_radix(&text[2..], 16).unwrap_or(0).to_string()
            }

            TokenKind::Binary => {
                let text = self.interner.resolve(value.lexeme);
                u64::from_str_radix(&text[2..], 2).unwrap_or(0).to_string()
            }

            TokenKind::Character => {
                let text = self.interner.resolve(value.lexeme);
                let inner = &text[1..text.len() - 1];
                let byte: u8 = match inner {
                    "\\'" => b'\'',
                    "\\0" => b'\0',
                    "\\n" => b'\n',
                    "\\r" => b'\r',
                    "\\t" => b'\t',
                    other => other.as_bytes()[0],
                };
                byte.to_string()
            }

            TokenKind::String => {
                let text = self.interner.resolve(value.lexeme).to_string();
                let content = text[1..text.len() - 1].to_string();
                self.string_constant(&content)
            }

            kind => panic!("codegen: invalid literal kind {:?}", kind),
        };

        ExprValue::constant(raw)
    }

    fn identifier(&mut self, identifier: Token, kind: IdentKind) -> ExprValue {
        match kind {
            IdentKind::Function => {
                let symbol = self
                    .functions
                    .get(&identifier.lexeme)
                    .unwrap_or_else(|| panic!("codegen: unknown function"));
                ExprValue::constant(symbol.clone())
            }

            IdentKind::Enum => ExprValue::constant(ENUM_SENTINEL),

            IdentKind::Variable | IdentKind::Parameter => {
                let variable = self
                    .scopes
                    .get(identifier.lexeme)
                    .unwrap_or_else(|| panic!("codegen: unknown variable"));
                variable.value.clone()
            }

            IdentKind::Unresolved => panic!("codegen: unresolved identifier"),
        }
    }

    // ========================================================================
    // Operators
    // ========================================================================

    fn unary(&mut self, expr: &'a Expr<'a>, op: Token, right: &'a Expr<'a>) -> ExprValue {
        let loc = self.debug.location(op);
        let value = self.expr(right);
        let right_ty = expr_ty(right);

        match op.kind {
            TokenKind::Bang => {
                let value = self.load(value, right_ty);
                let result = self.locals.unnamed();
                write_inst!(self.body, "  {} = xor i1 {}, true, !dbg {}", result, value, loc);
                result
            }

            TokenKind::Minus => {
                let Some(kind) = right_ty.as_primitive() else {
                    panic!("codegen: negation of a non-primitive");
                };
                let value = self.load(value, right_ty);
                let result = self.locals.unnamed();
                let ty = ir_type(right_ty, self.interner);

                if kind.is_floating() {
                    write_inst!(self.body, "  {} = fneg {} {}, !dbg {}", result, ty, value, loc);
                } else {
                    write_inst!(
                        self.body,
                        "  {} = sub nsw {} 0, {}, !dbg {}",
                        result, ty, value, loc
                    );
                }
                result
            }

            // The operand's slot pointer *is* the address value.
            TokenKind::Ampersand => {
                assert!(value.addressable, "codegen: address of a value expression");
                ExprValue::constant(value.identifier)
            }

            // Loading the pointer value yields an addressable view of the
            // pointee; value positions then load through it.
            TokenKind::Star => {
                let pointer = self.load(value, right_ty);
                ExprValue::addressable(pointer.identifier)
            }

            kind => panic!("codegen: invalid unary operator {:?}", kind),
        }
    }

    /// Emits a single binary instruction chosen by `(op, floating, signed)`.
    pub(crate) fn binary(
        &mut self,
        op: Token,
        left: ExprValue,
        left_ty: &'a Type<'a>,
        right: ExprValue,
        right_ty: &'a Type<'a>,
    ) -> ExprValue {
        let left = self.load(left, left_ty);
        let right = self.load(right, right_ty);

        let (floating, signed) = match left_ty.as_primitive() {
            Some(kind) => (kind.is_floating(), kind.is_signed()),
            None => (false, false),
        };

        let inst = match op.kind {
            TokenKind::Plus | TokenKind::PlusEqual => ternary(floating, "fadd", "add"),
            TokenKind::Minus | TokenKind::MinusEqual => ternary(floating, "fsub", "sub"),
            TokenKind::Star | TokenKind::StarEqual => ternary(floating, "fmul", "mul"),
            TokenKind::Slash | TokenKind::SlashEqual => {
                ternary(floating, "fdiv", ternary(signed, "sdiv", "udiv"))
            }
            TokenKind::Percentage | TokenKind::PercentageEqual => {
                ternary(floating, "frem", ternary(signed, "srem", "urem"))
            }

            TokenKind::EqualEqual => ternary(floating, "fcmp oeq", "icmp eq"),
            TokenKind::BangEqual => ternary(floating, "fcmp one", "icmp ne"),

            TokenKind::Less => {
                ternary(floating, "fcmp olt", ternary(signed, "icmp slt", "icmp ult"))
            }
            TokenKind::LessEqual => {
                ternary(floating, "fcmp ole", ternary(signed, "icmp sle", "icmp ule"))
            }
            TokenKind::Greater => {
                ternary(floating, "fcmp ogt", ternary(signed, "icmp sgt", "icmp ugt"))
            }
            TokenKind::GreaterEqual => {
                ternary(floating, "fcmp oge", ternary(signed, "icmp sge", "icmp uge"))
            }

            TokenKind::Pipe => "or",
            TokenKind::Ampersand => "and",
            TokenKind::LessLess => "shl",
            TokenKind::GreaterGreater => ternary(signed, "ashr", "lshr"),

            kind => panic!("codegen: invalid binary operator {:?}", kind),
        };

        let result = self.locals.unnamed();
        let loc = self.debug.location(op);
        write_inst!(
            self.body,
            "  {} = {} {} {}, {}, !dbg {}",
            result,
            inst,
            ir_type(left_ty, self.interner),
            left,
            right,
            loc
        );

        result
    }

    /// Short-circuit `&&` / `||` as a diamond ending in a `phi i1`.
    ///
    /// The right operand is evaluated only inside its branch block; the
    /// phi's second incoming edge is whatever block is current once that
    /// evaluation finishes.
    fn logical(&mut self, op: Token, left: &'a Expr<'a>, right: &'a Expr<'a>) -> ExprValue {
        let loc = self.debug.location(op);

        let (left_value, _) = self.load_expr(left);
        let start = self.block.clone();

        let rhs = self.blocks.unnamed();
        let end = self.blocks.unnamed();

        let or = op.kind == TokenKind::Or;
        if or {
            write_inst!(self.body, "  br i1 {}, label %{}, label %{}", left_value, end, rhs);
        } else {
            write_inst!(self.body, "  br i1 {}, label %{}, label %{}", left_value, rhs, end);
        }
        self.terminated = true;

        self.write_block(&rhs);
        let (right_value, _) = self.load_expr(right);
        let rhs_end = self.block.clone();
        self.branch_to(&end);

        self.write_block(&end);
        let result = self.locals.unnamed();
        let short_circuit = if or { "true" } else { "false" };
        write_inst!(
            self.body,
            "  {} = phi i1 [ {}, %{} ], [ {}, %{} ], !dbg {}",
            result,
            short_circuit,
            start,
            right_value,
            rhs_end,
            loc
        );

        result
    }

    fn assignment(
        &mut self,
        assignee: &'a Expr<'a>,
        op: Token,
        value: &'a Expr<'a>,
    ) -> ExprValue {
        let target = self.expr(assignee);
        assert!(target.addressable, "codegen: assignment into a value expression");

        let (mut loaded, value_ty) = self.load_expr(value);

        if op.kind != TokenKind::Equal {
            let current = self.load(target.clone(), expr_ty(assignee));
            loaded = self.binary(op, current, expr_ty(assignee), loaded, expr_ty(value));
        }

        let loc = self.debug.location(op);
        write_inst!(
            self.body,
            "  store {} {}, ptr {}, !dbg {}",
            value_ty, loaded, target, loc
        );

        target
    }

    // ========================================================================
    // Casts
    // ========================================================================

    fn cast(&mut self, expr: &'a Expr<'a>, token: Token, inner: &'a Expr<'a>) -> ExprValue {
        let loc = self.debug.location(token);
        let value = self.expr(inner);

        let from = expr_ty(inner);
        let to = expr_ty(expr);

        match (from, to) {
            (Type::Primitive(a), Type::Primitive(b)) => {
                self.cast_primitive(value, loc, from, to, *a, *b)
            }
            (Type::Enum(e), Type::Primitive(b)) => {
                self.cast_primitive(value, loc, from, to, e.underlying, *b)
            }
            (Type::Primitive(a), Type::Enum(e)) => {
                self.cast_primitive(value, loc, from, to, *a, e.underlying)
            }
            (Type::Enum(a), Type::Enum(b)) => {
                self.cast_primitive(value, loc, from, to, a.underlying, b.underlying)
            }
            // Opaque pointers make pointer-to-pointer casts a no-op.
            (Type::Pointer(_), Type::Pointer(_)) => value,
            _ => panic!("codegen: invalid cast"),
        }
    }

    fn cast_primitive(
        &mut self,
        value: ExprValue,
        loc: String,
        from: &'a Type<'a>,
        to: &'a Type<'a>,
        from_kind: PrimitiveKind,
        to_kind: PrimitiveKind,
    ) -> ExprValue {
        if from_kind == to_kind {
            return value;
        }

        let value = self.load(value, from);
        let from_ir = ir_type(from, self.interner);
        let to_ir = ir_type(to, self.interner);

        let from_int = from_kind.is_integer() || from_kind == PrimitiveKind::Bool;

        if from_int && to_kind.is_integer() {
            // Same-width integer casts only change signedness; the IR type
            // is identical and no instruction is needed.
            if from.size() == to.size() {
                return value;
            }

            let result = self.locals.unnamed();
            let inst = if from.size() > to.size() {
                "trunc"
            } else if from_kind.is_signed() {
                "sext"
            } else {
                "zext"
            };
            write_inst!(
                self.body,
                "  {} = {} {} {} to {}, !dbg {}",
                result, inst, from_ir, value, to_ir, loc
            );
            return result;
        }

        if from_kind.is_floating() && to_kind.is_floating() {
            let result = self.locals.unnamed();
            let inst = if from.size() > to.size() { "fptrunc" } else { "fpext" };
            write_inst!(
                self.body,
                "  {} = {} {} {} to {}, !dbg {}",
                result, inst, from_ir, value, to_ir, loc
            );
            return result;
        }

        if from_int && to_kind.is_floating() {
            let result = self.locals.unnamed();
            let inst = if from_kind.is_signed() { "sitofp" } else { "uitofp" };
            write_inst!(
                self.body,
                "  {} = {} {} {} to {}, !dbg {}",
                result, inst, from_ir, value, to_ir, loc
            );
            return result;
        }

        if from_kind.is_floating() && to_kind.is_integer() {
            let result = self.locals.unnamed();
            let inst = if to_kind.is_signed() { "fptosi" } else { "fptoui" };
            write_inst!(
                self.body,
                "  {} = {} {} {} to {}, !dbg {}",
                result, inst, from_ir, value, to_ir, loc
            );
            return result;
        }

        if from_kind.is_integer() && to_kind == PrimitiveKind::Bool {
            let result = self.locals.unnamed();
            write_inst!(
                self.body,
                "  {} = icmp ne {} {}, 0, !dbg {}",
                result, from_ir, value, loc
            );
            return result;
        }

        if from_kind.is_floating() && to_kind == PrimitiveKind::Bool {
            let result = self.locals.unnamed();
            write_inst!(
                self.body,
                "  {} = fcmp une {} {}, 0.0, !dbg {}",
                result, from_ir, value, loc
            );
            return result;
        }

        panic!("codegen: invalid primitive cast");
    }

    // ========================================================================
    // Compound expressions
    // ========================================================================

    fn call(
        &mut self,
        expr: &'a Expr<'a>,
        token: Token,
        callee: &'a Expr<'a>,
        args: &[&'a Expr<'a>],
    ) -> ExprValue {
        let Some(fn_ty) = expr_ty(callee).as_function() else {
            panic!("codegen: call of a non-function");
        };

        let mut lowered = Vec::with_capacity(args.len());
        for arg in args {
            lowered.push(self.load_expr(arg));
        }

        let callee_value = self.expr(callee);
        let callee_value = self.load(callee_value, expr_ty(callee));

        // Variadic calls spell out the full function type.
        let return_ir = ir_type(expr_ty(expr), self.interner);
        let call_ty = if fn_ty.variadic {
            let params: Vec<String> = fn_ty
                .params
                .iter()
                .map(|p| ir_type(p.ty, self.interner))
                .collect();
            format!("{} ({}, ...)", return_ir, params.join(", "))
        } else {
            return_ir
        };

        let arg_list: Vec<String> = lowered
            .iter()
            .map(|(value, ty)| format!("{} {}", ty, value))
            .collect();

        let loc = self.debug.location(token);

        if fn_ty.returns.is_void() {
            write_inst!(
                self.body,
                "  call {} {}({}), !dbg {}",
                call_ty,
                callee_value,
                arg_list.join(", "),
                loc
            );
            ExprValue::constant("")
        } else {
            let result = self.locals.unnamed();
            write_inst!(
                self.body,
                "  {} = call {} {}({}), !dbg {}",
                result,
                call_ty,
                callee_value,
                arg_list.join(", "),
                loc
            );
            result
        }
    }

    fn index(
        &mut self,
        expr: &'a Expr<'a>,
        token: Token,
        value: &'a Expr<'a>,
        index: &'a Expr<'a>,
    ) -> ExprValue {
        let base = self.expr(value);
        let (index_value, index_ty) = self.load_expr(index);

        // The base is pointer-typed; fetch the pointer value out of its
        // slot before computing the element address.
        let base = self.load(base, expr_ty(value));

        let element_ty = ir_type(expr_ty(expr), self.interner);
        let result = self.locals.unnamed();
        let loc = self.debug.location(token);

        write_inst!(
            self.body,
            "  {} = getelementptr inbounds {}, ptr {}, {} {}, !dbg {}",
            result, element_ty, base, index_ty, index_value, loc
        );

        ExprValue::addressable(result.identifier)
    }

    fn member(&mut self, value: &'a Expr<'a>, name: Token) -> ExprValue {
        let base = self.expr(value);
        let value_ty = expr_ty(value);

        // Enum case access lowers to the case's integer constant.
        if base.identifier == ENUM_SENTINEL {
            let e = value_ty.as_enum().expect("enum sentinel with enum type");
            let case = e
                .case(name.lexeme)
                .unwrap_or_else(|| panic!("codegen: unknown enum case"));
            return ExprValue::constant(case.value.to_string());
        }

        // Struct member, through at most one pointer.
        let (struct_ty, base) = if let Some(s) = value_ty.as_struct() {
            (s, base)
        } else if let Some(pointee) = value_ty.as_pointer() {
            let s = pointee.as_struct().unwrap_or_else(|| {
                panic!("codegen: member access through a non-struct pointer")
            });
            let pointer = self.load(base, value_ty);
            (s, ExprValue::addressable(pointer.identifier))
        } else {
            panic!("codegen: member access on a non-struct value");
        };

        let (field_index, _) = struct_ty
            .field(name.lexeme)
            .unwrap_or_else(|| panic!("codegen: unknown struct field"));

        let struct_ir = format!("%struct.{}", self.interner.resolve(struct_ty.name));
        let result = self.locals.unnamed();
        let loc = self.debug.location(name);

        if base.addressable {
            write_inst!(
                self.body,
                "  {} = getelementptr inbounds {}, ptr {}, i32 0, i32 {}, !dbg {}",
                result, struct_ir, base, field_index, loc
            );
            ExprValue::addressable(result.identifier)
        } else {
            write_inst!(
                self.body,
                "  {} = extractvalue {} {}, {}, !dbg {}",
                result, struct_ir, base, field_index, loc
            );
            result
        }
    }

    /// `zeroinitializer` plus one `insertvalue` per written field.
    fn initializer(
        &mut self,
        expr: &'a Expr<'a>,
        fields: &[fireball_language::ast::InitField<'a>],
    ) -> ExprValue {
        let ty = expr_ty(expr);
        let struct_ty = ty.as_struct().expect("initializer of a struct type");
        let ty_ir = ir_type(ty, self.interner);

        let mut result = ExprValue::constant("zeroinitializer");

        for field in fields {
            let loc = self.debug.location(field.name);
            let (value, value_ty) = self.load_expr(field.value);
            let (field_index, _) = struct_ty
                .field(field.name.lexeme)
                .unwrap_or_else(|| panic!("codegen: unknown struct field"));

            let next = self.locals.unnamed();
            write_inst!(
                self.body,
                "  {} = insertvalue {} {}, {} {}, {}, !dbg {}",
                next, ty_ir, result, value_ty, value, field_index, loc
            );
            result = next;
        }

        result
    }
}

/// The checked type of an expression; absence is a compiler bug.
pub(crate) fn expr_ty<'a>(expr: &Expr<'a>) -> &'a Type<'a> {
    expr.ty().expect("codegen: expression was not checked")
}

fn ternary<'t>(condition: bool, when_true: &'t str, when_false: &'t str) -> &'t str {
    if condition {
        when_true
    } else {
        when_false
    }
}
