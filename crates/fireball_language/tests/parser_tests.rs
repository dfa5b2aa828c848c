//! Parser integration tests: grammar shapes, error messages, recovery.

use fireball_base::Interner;
use fireball_language::arena_ctx::{AstArenas, AstContext};
use fireball_language::ast::{CaseDecl, Decl, Expr, ExprKind, Stmt};
use fireball_language::parser::{parse, ParseOutput};

fn parse_source<'a>(ctx: AstContext<'a>, source: &str) -> (ParseOutput<'a>, Interner) {
    let mut interner = Interner::new();
    let output = parse(ctx, source, &mut interner);
    (output, interner)
}

/// Renders an expression as an S-expression fingerprint of its shape.
fn shape(expr: &Expr, interner: &Interner) -> String {
    match &expr.kind {
        ExprKind::Group { expr, .. } => format!("(group {})", shape(expr, interner)),
        ExprKind::Literal { value } => interner.resolve(value.lexeme).to_string(),
        ExprKind::Initializer { name, fields } => {
            let fields: Vec<String> = fields
                .iter()
                .map(|f| {
                    format!(
                        "{}: {}",
                        interner.resolve(f.name.lexeme),
                        shape(f.value, interner)
                    )
                })
                .collect();
            format!("(init {} {})", interner.resolve(name.lexeme), fields.join(" "))
        }
        ExprKind::Unary { op, right } => {
            format!("({} {})", interner.resolve(op.lexeme), shape(right, interner))
        }
        ExprKind::Binary { left, op, right } | ExprKind::Logical { left, op, right } => format!(
            "({} {} {})",
            interner.resolve(op.lexeme),
            shape(left, interner),
            shape(right, interner)
        ),
        ExprKind::Identifier { identifier, .. } => {
            interner.resolve(identifier.lexeme).to_string()
        }
        ExprKind::Assignment { assignee, op, value } => format!(
            "({} {} {})",
            interner.resolve(op.lexeme),
            shape(assignee, interner),
            shape(value, interner)
        ),
        ExprKind::Cast { expr, target, .. } => format!(
            "(as {} {})",
            shape(expr, interner),
            interner.resolve(target.token().lexeme)
        ),
        ExprKind::Call { callee, args, .. } => {
            let args: Vec<String> = args.iter().map(|a| shape(a, interner)).collect();
            format!("(call {} [{}])", shape(callee, interner), args.join(" "))
        }
        ExprKind::Index { value, index, .. } => {
            format!("(index {} {})", shape(value, interner), shape(index, interner))
        }
        ExprKind::Member { value, name } => format!(
            "(member {} {})",
            shape(value, interner),
            interner.resolve(name.lexeme)
        ),
    }
}

/// Renders an expression back to parseable source text.
fn print_expr(expr: &Expr, interner: &Interner) -> String {
    match &expr.kind {
        ExprKind::Group { expr, .. } => format!("({})", print_expr(expr, interner)),
        ExprKind::Literal { value } => interner.resolve(value.lexeme).to_string(),
        ExprKind::Initializer { name, fields } => {
            let fields: Vec<String> = fields
                .iter()
                .map(|f| {
                    format!(
                        "{}: {}",
                        interner.resolve(f.name.lexeme),
                        print_expr(f.value, interner)
                    )
                })
                .collect();
            format!("{} {{ {} }}", interner.resolve(name.lexeme), fields.join(", "))
        }
        ExprKind::Unary { op, right } => {
            format!("{}{}", interner.resolve(op.lexeme), print_expr(right, interner))
        }
        ExprKind::Binary { left, op, right } | ExprKind::Logical { left, op, right } => format!(
            "({} {} {})",
            print_expr(left, interner),
            interner.resolve(op.lexeme),
            print_expr(right, interner)
        ),
        ExprKind::Identifier { identifier, .. } => {
            interner.resolve(identifier.lexeme).to_string()
        }
        ExprKind::Assignment { assignee, op, value } => format!(
            "{} {} {}",
            print_expr(assignee, interner),
            interner.resolve(op.lexeme),
            print_expr(value, interner)
        ),
        ExprKind::Cast { expr, target, .. } => format!(
            "{} as {}",
            print_expr(expr, interner),
            interner.resolve(target.token().lexeme)
        ),
        ExprKind::Call { callee, args, .. } => {
            let args: Vec<String> = args.iter().map(|a| print_expr(a, interner)).collect();
            format!("{}({})", print_expr(callee, interner), args.join(", "))
        }
        ExprKind::Index { value, index, .. } => format!(
            "{}[{}]",
            print_expr(value, interner),
            print_expr(index, interner)
        ),
        ExprKind::Member { value, name } => format!(
            "{}.{}",
            print_expr(value, interner),
            interner.resolve(name.lexeme)
        ),
    }
}

/// Parses `expr` inside a function body and returns its shape.
fn expr_shape(source_expr: &str) -> String {
    let arenas = AstArenas::new();
    let ctx = AstContext::new(&arenas);
    let source = format!("func t() {{ {}; }}", source_expr);
    let (output, interner) = parse_source(ctx, &source);

    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
    let Decl::Func(f) = &output.decls[0] else { panic!("expected func") };
    let Stmt::Expression { expr } = &f.body.unwrap()[0] else { panic!("expected expr stmt") };
    shape(expr, &interner)
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    assert_eq!(expr_shape("1 + 2 * 3"), "(+ 1 (* 2 3))");
}

#[test]
fn comparison_binds_tighter_than_equality() {
    assert_eq!(expr_shape("a < b == c > d"), "(== (< a b) (> c d))");
}

#[test]
fn bitwise_sits_between_term_and_comparison() {
    assert_eq!(expr_shape("a + b << c"), "(<< (+ a b) c)");
    assert_eq!(expr_shape("a << b < c"), "(< (<< a b) c)");
}

#[test]
fn logical_and_binds_tighter_than_or() {
    assert_eq!(expr_shape("a || b && c"), "(|| a (&& b c))");
}

#[test]
fn binary_operators_are_left_associative() {
    assert_eq!(expr_shape("a - b - c"), "(- (- a b) c)");
    assert_eq!(expr_shape("a / b % c"), "(% (/ a b) c)");
}

#[test]
fn unary_operators_nest() {
    assert_eq!(expr_shape("!-x"), "(! (- x))");
    assert_eq!(expr_shape("&x"), "(& x)");
    assert_eq!(expr_shape("*p"), "(* p)");
}

#[test]
fn postfix_suffixes_chain_left_to_right() {
    assert_eq!(expr_shape("f(1)[2].x"), "(member (index (call f [1]) 2) x)");
}

#[test]
fn assignment_is_a_postfix_with_expression_rhs() {
    assert_eq!(expr_shape("a.b = c + 1"), "(= (member a b) (+ c 1))");
    assert_eq!(expr_shape("x += 2"), "(+= x 2)");
}

#[test]
fn cast_is_a_postfix() {
    assert_eq!(expr_shape("x as i64 as f64"), "(as (as x i64) f64)");
    assert_eq!(expr_shape("a + b as i64"), "(+ a (as b i64))");
}

#[test]
fn grouping_overrides_precedence() {
    assert_eq!(expr_shape("(1 + 2) * 3"), "(* (group (+ 1 2)) 3)");
}

#[test]
fn struct_initializers_parse_in_expression_position() {
    assert_eq!(expr_shape("P { x: 1, y: 2 }"), "(init P x: 1 y: 2)");
}

#[test]
fn printed_expressions_reparse_to_the_same_shape() {
    let sources = [
        "1 + 2 * 3",
        "a || b && !c",
        "f(x, y)[0].field as i64",
        "p.x = q.y + 1",
        "-x * (y + 2)",
        "P { x: 1, y: f(2) }",
    ];

    for source in sources {
        let arenas = AstArenas::new();
        let ctx = AstContext::new(&arenas);
        let wrapped = format!("func t() {{ {}; }}", source);
        let (output, interner) = parse_source(ctx, &wrapped);
        assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);

        let Decl::Func(f) = &output.decls[0] else { panic!() };
        let Stmt::Expression { expr } = &f.body.unwrap()[0] else { panic!() };

        let printed = print_expr(expr, &interner);
        let original = shape(expr, &interner);
        drop(interner);

        assert_eq!(expr_shape(&printed), original, "printed: {}", printed);
    }
}

#[test]
fn statements_parse_into_their_forms() {
    let arenas = AstArenas::new();
    let ctx = AstContext::new(&arenas);
    let source = "\
func t() {
    var a: i32 = 1;
    var b = 2;
    if a < b { } else if b < a { } else { }
    while true { break; }
    for var i: i32 = 0; i < 10; i = i + 1 { continue; }
    for { break; }
    return;
}";
    let (output, _interner) = parse_source(ctx, source);
    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);

    let Decl::Func(f) = &output.decls[0] else { panic!() };
    let body = f.body.unwrap();
    assert_eq!(body.len(), 7);

    assert!(matches!(&body[0], Stmt::Variable { infer_type: false, .. }));
    assert!(matches!(&body[1], Stmt::Variable { infer_type: true, .. }));
    let Stmt::If { else_branch: Some(else_branch), .. } = &body[2] else { panic!() };
    assert!(matches!(else_branch, Stmt::If { .. }));
    assert!(matches!(&body[3], Stmt::While { .. }));
    let Stmt::For { initializer, condition, increment, .. } = &body[4] else { panic!() };
    assert!(initializer.is_some() && condition.is_some() && increment.is_some());
    let Stmt::For { initializer, condition, increment, .. } = &body[5] else { panic!() };
    assert!(initializer.is_none() && condition.is_none() && increment.is_none());
    assert!(matches!(&body[6], Stmt::Return { value: None, .. }));
}

#[test]
fn initializers_are_suppressed_in_condition_headers() {
    let arenas = AstArenas::new();
    let ctx = AstContext::new(&arenas);
    let (output, _) = parse_source(ctx, "func t() { if c { x; } }");
    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);

    let Decl::Func(f) = &output.decls[0] else { panic!() };
    let Stmt::If { condition, .. } = &f.body.unwrap()[0] else { panic!() };
    assert!(matches!(condition.kind, ExprKind::Identifier { .. }));
}

#[test]
fn extern_functions_declare_without_a_body() {
    let arenas = AstArenas::new();
    let ctx = AstContext::new(&arenas);
    let (output, _) =
        parse_source(ctx, "extern func printf(fmt: *u8, ...) -> i32;");
    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);

    let Decl::Func(f) = &output.decls[0] else { panic!() };
    assert!(f.is_extern);
    assert!(f.variadic);
    assert!(f.body.is_none());
    assert_eq!(f.params.len(), 1);
}

#[test]
fn enum_cases_auto_assign_from_the_previous_value() {
    let arenas = AstArenas::new();
    let ctx = AstContext::new(&arenas);
    let (output, _) = parse_source(ctx, "enum E: i32 { A, B = 5, C }");
    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);

    let Decl::Enum(e) = &output.decls[0] else { panic!() };
    let values: Vec<(i64, bool)> = e
        .cases
        .iter()
        .map(|c: &CaseDecl| (c.value, c.infer_value))
        .collect();
    assert_eq!(values, vec![(0, true), (5, false), (6, true)]);
    assert!(!e.infer_type);
}

#[test]
fn enum_without_underlying_type_is_inferred() {
    let arenas = AstArenas::new();
    let ctx = AstContext::new(&arenas);
    let (output, _) = parse_source(ctx, "enum E { A, B }");
    assert!(output.diagnostics.is_empty());

    let Decl::Enum(e) = &output.decls[0] else { panic!() };
    assert!(e.infer_type);
}

#[test]
fn expectation_failures_carry_positional_messages() {
    let cases = [
        ("func f() { g(1 }", "Expected ')' after call arguments."),
        ("func f() { var x = 1 }", "Expected ';' after variable declaration."),
        ("func f() { p[1; }", "Expected ']' after index expression."),
        ("func f() { x. ; }", "Expected member name."),
        ("func f(x i32) { }", "Expected ':' after parameter name."),
        ("func f() { if { } }", "Expected expression."),
        ("struct P x: i32 }", "Expected '{' after struct name."),
    ];

    for (source, message) in cases {
        let arenas = AstArenas::new();
        let ctx = AstContext::new(&arenas);
        let (output, _) = parse_source(ctx, source);
        assert!(
            output.diagnostics.iter().any(|d| d.message == message),
            "source {:?} produced {:?}",
            source,
            output.diagnostics
        );
    }
}

#[test]
fn scanner_errors_surface_through_the_parser() {
    let arenas = AstArenas::new();
    let ctx = AstContext::new(&arenas);
    let (output, _) = parse_source(ctx, "func f() { var s = \"unterminated; }");
    assert!(output
        .diagnostics
        .iter()
        .any(|d| d.message == "Unterminated string."));
}

#[test]
fn recovery_resumes_at_the_next_declaration() {
    let arenas = AstArenas::new();
    let ctx = AstContext::new(&arenas);
    let source = "func broken( { }\nstruct P { x: i32 }\nfunc ok() { }";
    let (output, _) = parse_source(ctx, source);

    assert_eq!(output.diagnostics.len(), 1);
    assert_eq!(output.decls.len(), 2);
    assert!(matches!(output.decls[0], Decl::Struct(_)));
    assert!(matches!(output.decls[1], Decl::Func(_)));
}

#[test]
fn one_diagnostic_per_broken_declaration() {
    let arenas = AstArenas::new();
    let ctx = AstContext::new(&arenas);
    let source = "func a( { }\nfunc b( { }\nfunc c() { }";
    let (output, _) = parse_source(ctx, source);

    assert_eq!(output.diagnostics.len(), 2);
    assert_eq!(output.decls.len(), 1);
}
