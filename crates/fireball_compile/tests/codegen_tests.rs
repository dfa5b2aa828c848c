//! End-to-end lowering scenarios: source text in, IR fragments out.

use fireball_compile::compile;

fn ir_for(source: &str) -> String {
    let output = compile("test.fb", source);
    assert!(
        !output.has_errors(),
        "unexpected diagnostics: {:?}",
        output.diagnostics
    );
    output.ir.expect("ir")
}

fn offset_of(haystack: &str, needle: &str) -> usize {
    haystack
        .find(needle)
        .unwrap_or_else(|| panic!("{:?} not found in:\n{}", needle, haystack))
}

#[test]
fn variable_declaration_allocates_and_stores() {
    let ir = ir_for("func f() { var x: i32 = 42; }");
    assert!(ir.contains("%x.0 = alloca i32"));
    assert!(ir.contains("store i32 42, ptr %x.0"));
    assert!(ir.contains("ret void"));
}

#[test]
fn identity_function_loads_the_parameter_slot() {
    let ir = ir_for("func id(x: i32) -> i32 { return x; }");
    assert!(ir.contains("define i32 @id(i32 %x)"));
    assert!(ir.contains("%x.0 = alloca i32"));
    assert!(ir.contains("store i32 %x, ptr %x.0"));
    assert!(ir.contains("%0 = load i32, ptr %x.0"));
    assert!(ir.contains("ret i32 %0"));
    // A single basic block: no allocated labels.
    assert!(!ir.contains("bb0:"));
}

#[test]
fn float_addition_uses_fadd() {
    let ir = ir_for("func addf(a: f32, b: f32) -> f32 { return a + b; }");
    assert!(ir.contains("fadd float"));
    assert!(!ir.contains("add i32"));
}

#[test]
fn logical_or_lowers_to_a_phi_diamond() {
    let ir = ir_for("func or(a: bool, b: bool) -> bool { return a || b; }");
    assert!(ir.contains("br i1"));
    assert!(ir.contains("phi i1 [ true, %entry ], ["));

    // The right operand is loaded inside its branch block, not before the
    // branch.
    let branch = offset_of(&ir, "br i1");
    let rhs_block = offset_of(&ir, "bb0:");
    let rhs_load = offset_of(&ir, "load i1, ptr %b.1");
    assert!(branch < rhs_block);
    assert!(rhs_block < rhs_load);
}

#[test]
fn logical_and_short_circuits_with_false() {
    let ir = ir_for("func and(a: bool, b: bool) -> bool { return a && b; }");
    assert!(ir.contains("phi i1 [ false, %entry ], ["));
}

#[test]
fn struct_initializer_chains_insertvalue_from_zeroinitializer() {
    let ir = ir_for(
        "struct P { x: i32, y: i32 } func mk() -> P { return P { x: 1, y: 2 }; }",
    );
    assert!(ir.contains("%struct.P = type { i32, i32 }"));
    assert!(ir.contains("insertvalue %struct.P zeroinitializer, i32 1, 0"));
    assert!(ir.contains(", i32 2, 1"));
}

#[test]
fn enum_case_access_lowers_to_the_constant() {
    let ir = ir_for(
        "enum E: i32 { A, B = 5, C } func f() -> i32 { return E.B as i32; }",
    );
    assert!(ir.contains("ret i32 5"));
}

#[test]
fn lowering_is_deterministic() {
    let source = "\
struct P { x: i32, y: f64 }
enum E { A, B = 3 }
extern func print(message: *u8) -> i32;
func f(p: *P, n: i64) -> i32 {
    var total: i32 = 0;
    for var i: i64 = 0; i < n; i = i + 1 {
        total += 1;
    }
    print(\"done\");
    return total;
}";
    assert_eq!(ir_for(source), ir_for(source));
}

#[test]
fn string_constants_are_pooled_and_deduplicated() {
    let ir = ir_for(
        "extern func print(message: *u8) -> i32;\n\
         func f() { print(\"hi\"); print(\"hi\"); print(\"other\"); }",
    );
    assert!(ir.contains("@str.0 = private unnamed_addr constant [3 x i8] c\"hi\\00\""));
    assert!(ir.contains("@str.1 = private unnamed_addr constant [6 x i8] c\"other\\00\""));
    assert!(!ir.contains("@str.2"));

    // Globals precede the functions that use them.
    assert!(offset_of(&ir, "@str.0 =") < offset_of(&ir, "define"));
}

#[test]
fn signed_widening_uses_sext_and_unsigned_zext() {
    let signed = ir_for("func f(x: i32) -> i64 { return x as i64; }");
    assert!(signed.contains("sext i32"));

    let unsigned = ir_for("func f(x: u32) -> i64 { return x as i64; }");
    assert!(unsigned.contains("zext i32"));

    let narrowing = ir_for("func f(x: i64) -> i8 { return x as i8; }");
    assert!(narrowing.contains("trunc i64"));
}

#[test]
fn float_casts_pick_the_fp_instructions() {
    assert!(ir_for("func f(x: f64) -> f32 { return x as f32; }").contains("fptrunc double"));
    assert!(ir_for("func f(x: f32) -> f64 { return x as f64; }").contains("fpext float"));
    assert!(ir_for("func f(x: i32) -> f64 { return x as f64; }").contains("sitofp i32"));
    assert!(ir_for("func f(x: u32) -> f64 { return x as f64; }").contains("uitofp i32"));
    assert!(ir_for("func f(x: f64) -> i32 { return x as i32; }").contains("fptosi double"));
    assert!(ir_for("func f(x: f64) -> u32 { return x as u32; }").contains("fptoui double"));
}

#[test]
fn bool_casts_compare_against_zero() {
    assert!(ir_for("func f(x: i32) -> bool { return x as bool; }").contains("icmp ne i32"));
    assert!(ir_for("func f(x: f64) -> bool { return x as bool; }")
        .contains("fcmp une double"));
}

#[test]
fn unsigned_division_differs_from_signed() {
    assert!(ir_for("func f(a: u32, b: u32) -> u32 { return a / b; }").contains("udiv i32"));
    assert!(ir_for("func f(a: i32, b: i32) -> i32 { return a / b; }").contains("sdiv i32"));
    assert!(ir_for("func f(a: u32, b: u32) -> u32 { return a % b; }").contains("urem i32"));
    assert!(ir_for("func f(a: i32, b: i32) -> bool { return a < b; }").contains("icmp slt"));
    assert!(ir_for("func f(a: u32, b: u32) -> bool { return a < b; }").contains("icmp ult"));
    assert!(ir_for("func f(a: f64, b: f64) -> bool { return a < b; }").contains("fcmp olt"));
}

#[test]
fn shift_right_follows_the_sign() {
    assert!(ir_for("func f(a: i32) -> i32 { return a >> 1; }").contains("ashr i32"));
    assert!(ir_for("func f(a: u32) -> u32 { return a >> 1; }").contains("lshr i32"));
    assert!(ir_for("func f(a: u32) -> u32 { return a << 1; }").contains("shl i32"));
}

#[test]
fn unary_operators_lower_by_type() {
    assert!(ir_for("func f(b: bool) -> bool { return !b; }").contains("xor i1"));
    assert!(ir_for("func f(x: i32) -> i32 { return -x; }").contains("sub nsw i32 0,"));
    assert!(ir_for("func f(x: f64) -> f64 { return -x; }").contains("fneg double"));
}

#[test]
fn float_literals_emit_double_bit_patterns() {
    let ir = ir_for("func f() -> f64 { return 1.5; }");
    assert!(ir.contains("0x3FF8000000000000"));

    let ir = ir_for("func f() -> f32 { return 2.5f; }");
    assert!(ir.contains("0x4004000000000000"));
}

#[test]
fn integer_like_literals_normalize_to_decimal() {
    assert!(ir_for("func f() -> i32 { return 0xFF; }").contains("ret i32 255"));
    assert!(ir_for("func f() -> i32 { return 0b101; }").contains("ret i32 5"));
    assert!(ir_for("func f() -> u8 { return 'A'; }").contains("ret i8 65"));
    assert!(ir_for("func f() -> i32 { return -7; }").contains("ret i32 -7"));
}

#[test]
fn nil_lowers_to_null() {
    assert!(ir_for("func f() -> *i32 { return nil; }").contains("ret ptr null"));
}

#[test]
fn assignment_stores_through_the_slot() {
    let ir = ir_for("func f() { var x: i32 = 1; x = 2; x += 3; }");
    assert!(ir.contains("store i32 2, ptr %x.0"));
    // The compound form loads, adds, then stores.
    assert!(ir.contains("add i32"));
}

#[test]
fn pointer_deref_assignment_stores_through_the_pointer() {
    let ir = ir_for("func f(p: *i32) { *p = 3; }");
    // Load the pointer value out of the parameter slot, then store into it.
    assert!(ir.contains("%0 = load ptr, ptr %p.0"));
    assert!(ir.contains("store i32 3, ptr %0"));
}

#[test]
fn deref_in_value_position_loads_twice() {
    let ir = ir_for("func f(p: *i32) -> i32 { return *p; }");
    assert!(ir.contains("%0 = load ptr, ptr %p.0"));
    assert!(ir.contains("%1 = load i32, ptr %0"));
    assert!(ir.contains("ret i32 %1"));
}

#[test]
fn index_emits_an_inbounds_gep() {
    let ir = ir_for("func f(p: *i32, i: i64) -> i32 { return p[i]; }");
    assert!(ir.contains("getelementptr inbounds i32, ptr"));
    // The element is loaded after the address computation.
    assert!(offset_of(&ir, "getelementptr") < offset_of(&ir, "ret i32"));
}

#[test]
fn member_access_on_a_slot_uses_a_field_gep() {
    let ir = ir_for(
        "struct P { x: i32, y: i32 } func f(p: P) -> i32 { return p.y; }",
    );
    assert!(ir.contains("getelementptr inbounds %struct.P, ptr %p.0, i32 0, i32 1"));
}

#[test]
fn member_access_through_a_pointer_loads_the_pointer_first() {
    let ir = ir_for(
        "struct P { x: i32, y: i32 } func f(p: *P) -> i32 { return p.y; }",
    );
    assert!(ir.contains("%0 = load ptr, ptr %p.0"));
    assert!(ir.contains("getelementptr inbounds %struct.P, ptr %0, i32 0, i32 1"));
}

#[test]
fn member_access_on_a_value_uses_extractvalue() {
    let ir = ir_for(
        "struct P { x: i32, y: i32 } func mk() -> P { return P { x: 1, y: 2 }; } \
         func f() -> i32 { return mk().y; }",
    );
    assert!(ir.contains("extractvalue %struct.P"));
}

#[test]
fn if_else_produces_branch_targets() {
    let ir = ir_for(
        "func f(c: bool) -> i32 { if c { return 1; } else { return 2; } return 3; }",
    );
    assert!(ir.contains("br i1"));
    assert!(ir.contains("bb0:"));
    assert!(ir.contains("bb1:"));
    assert!(ir.contains("ret i32 1"));
    assert!(ir.contains("ret i32 2"));
}

#[test]
fn while_loop_branches_back_to_the_condition() {
    let ir = ir_for(
        "func f(n: i32) -> i32 { var i: i32 = 0; while i < n { i += 1; } return i; }",
    );
    // Condition, body, and exit blocks with a back edge.
    assert!(ir.contains("bb0:"));
    assert!(ir.contains("br label %bb0"));
    assert!(ir.contains("icmp slt i32"));
}

#[test]
fn for_loop_continue_targets_the_increment_block() {
    let ir = ir_for(
        "func f() { for var i: i32 = 0; i < 3; i = i + 1 { continue; } }",
    );
    // bb0 cond, bb1 body, bb2 increment, bb3 end.
    assert!(ir.contains("bb2:"));
    let body = offset_of(&ir, "bb1:");
    let continue_branch = ir[body..].find("br label %bb2").map(|i| i + body);
    assert!(continue_branch.is_some());
}

#[test]
fn break_targets_the_loop_exit() {
    let ir = ir_for("func f() { while true { break; } }");
    assert!(ir.contains("br label %bb2"));
    assert!(ir.contains("ret void"));
}

#[test]
fn void_calls_bind_no_result() {
    let ir = ir_for("func helper() { } func f() { helper(); }");
    assert!(ir.contains("call void @helper()"));
    assert!(!ir.contains("= call void"));
}

#[test]
fn calls_load_arguments_before_the_call() {
    let ir = ir_for(
        "func add(a: i32, b: i32) -> i32 { return a + b; } \
         func f(x: i32) -> i32 { return add(x, 2); }",
    );
    assert!(ir.contains("call i32 @add(i32"));
}

#[test]
fn variadic_externs_spell_the_full_call_type() {
    let ir = ir_for(
        "extern func printf(fmt: *u8, ...) -> i32;\n\
         func f() { printf(\"%d\", 1); }",
    );
    assert!(ir.contains("declare i32 @printf(ptr, ...)"));
    assert!(ir.contains("call i32 (ptr, ...) @printf(ptr @str.0, i32 1)"));
}

#[test]
fn every_instruction_carries_a_debug_location() {
    let ir = ir_for("func f(x: i32) -> i32 { return x + 1; }");
    assert!(ir.contains("!llvm.dbg.cu = !{!0}"));
    assert!(ir.contains("!DIFile(filename: \"test.fb\""));
    assert!(ir.contains("define i32 @f(i32 %x) !dbg !6"));
    assert!(ir.contains("add i32") && ir.contains(", !dbg !"));
    assert!(ir.contains("!DILocation(line: 1"));
}

#[test]
fn allocas_land_in_the_entry_block() {
    let ir = ir_for("func f() { while true { var x: i32 = 1; } }");
    // The loop-local variable's alloca is hoisted into entry, before the
    // first branch.
    let alloca = offset_of(&ir, "%x.0 = alloca i32");
    let first_block = offset_of(&ir, "bb0:");
    assert!(alloca < first_block);
}

#[test]
fn same_width_integer_casts_are_free() {
    let ir = ir_for("func f(x: u32) -> i32 { return x as i32; }");
    assert!(!ir.contains("zext"));
    assert!(!ir.contains("sext"));
    assert!(!ir.contains("trunc"));
}
