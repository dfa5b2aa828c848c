//! Per-function code generation state: IR values, name allocators, and the
//! variable scope stack.

use fireball_base::Symbol;
use fireball_language::types::Type;
use std::collections::HashMap;

/// The result of lowering one expression.
///
/// `identifier` is the IR spelling: an SSA name (`%3`), a named slot
/// (`%x.0`), a global (`@str.1`, `@main`), or an immediate (`42`, `null`).
///
/// `addressable` means the identifier holds a *pointer to storage* of the
/// expression's logical type (a stack slot or a GEP result); using it in a
/// value position requires an explicit `load`. A non-addressable value
/// already holds the logical value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExprValue {
    pub identifier: String,
    pub addressable: bool,
}

impl ExprValue {
    /// An immediate or already-loaded value.
    pub fn constant(identifier: impl Into<String>) -> Self {
        ExprValue { identifier: identifier.into(), addressable: false }
    }

    /// A pointer to storage of the expression's type.
    pub fn addressable(identifier: impl Into<String>) -> Self {
        ExprValue { identifier: identifier.into(), addressable: true }
    }
}

impl std::fmt::Display for ExprValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.identifier)
    }
}

/// Monotonic `%N` allocator for SSA temporaries.
///
/// Resets per function. Unnamed LLVM values must be defined in strictly
/// increasing textual order, which holds because temporaries are only ever
/// allocated at their emission point.
#[derive(Default)]
pub struct Locals {
    count: usize,
}

impl Locals {
    pub fn new() -> Self {
        Locals { count: 0 }
    }

    pub fn unnamed(&mut self) -> ExprValue {
        let value = ExprValue::constant(format!("%{}", self.count));
        self.count += 1;
        value
    }
}

/// Monotonic `bbN` allocator for basic block labels.
///
/// Labels are names, not numbers, so they carry no ordering constraint;
/// the fixed `entry` label is not allocated here.
#[derive(Default)]
pub struct Blocks {
    count: usize,
}

impl Blocks {
    pub fn new() -> Self {
        Blocks { count: 0 }
    }

    pub fn unnamed(&mut self) -> String {
        let label = format!("bb{}", self.count);
        self.count += 1;
        label
    }
}

/// A named variable or parameter slot.
pub struct Variable<'a> {
    pub value: ExprValue,
    pub ty: &'a Type<'a>,
}

/// Lexical scope stack mapping names to their stack slots.
///
/// Pushed on block entry, popped on block exit; pops happen on every exit
/// path because statement lowering never unwinds.
#[derive(Default)]
pub struct Scopes<'a> {
    stack: Vec<HashMap<Symbol, Variable<'a>>>,
}

impl<'a> Scopes<'a> {
    pub fn new() -> Self {
        Scopes { stack: Vec::new() }
    }

    pub fn push(&mut self) {
        self.stack.push(HashMap::new());
    }

    pub fn pop(&mut self) {
        self.stack.pop();
    }

    pub fn clear(&mut self) {
        self.stack.clear();
    }

    pub fn define(&mut self, name: Symbol, variable: Variable<'a>) {
        if let Some(scope) = self.stack.last_mut() {
            scope.insert(name, variable);
        }
    }

    pub fn get(&self, name: Symbol) -> Option<&Variable<'a>> {
        self.stack.iter().rev().find_map(|scope| scope.get(&name))
    }
}

/// Break and continue targets for the innermost loop.
pub struct LoopLabels {
    pub continue_label: String,
    pub break_label: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locals_count_up_from_zero() {
        let mut locals = Locals::new();
        assert_eq!(locals.unnamed().identifier, "%0");
        assert_eq!(locals.unnamed().identifier, "%1");
        assert_eq!(locals.unnamed().identifier, "%2");
    }

    #[test]
    fn blocks_count_up_from_zero() {
        let mut blocks = Blocks::new();
        assert_eq!(blocks.unnamed(), "bb0");
        assert_eq!(blocks.unnamed(), "bb1");
    }

    #[test]
    fn scopes_resolve_innermost_first() {
        use fireball_language::types::PrimitiveKind;

        let i32_ty = Type::Primitive(PrimitiveKind::I32);
        let bool_ty = Type::Primitive(PrimitiveKind::Bool);

        let mut scopes = Scopes::new();
        scopes.push();
        scopes.define(Symbol::EMPTY, Variable {
            value: ExprValue::addressable("%x.0"),
            ty: &i32_ty,
        });
        scopes.push();
        scopes.define(Symbol::EMPTY, Variable {
            value: ExprValue::addressable("%x.1"),
            ty: &bool_ty,
        });

        assert_eq!(scopes.get(Symbol::EMPTY).unwrap().value.identifier, "%x.1");
        scopes.pop();
        assert_eq!(scopes.get(Symbol::EMPTY).unwrap().value.identifier, "%x.0");
        scopes.pop();
        assert!(scopes.get(Symbol::EMPTY).is_none());
    }
}
