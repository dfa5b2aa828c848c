//! Statement lowering.
//!
//! Control flow produces labeled basic blocks and `br` edges; variable
//! declarations produce `alloca`s in the entry block with the slot
//! recorded in the scope stack. A block that already terminated (through
//! `return`, `break`, or `continue`) suppresses its fall-through branch.

use super::context::{ExprValue, LoopLabels, Variable};
use super::types::ir_type;
use super::{write_inst, Codegen};
use fireball_language::ast::Stmt;
use std::fmt::Write;

impl<'a, 'i> Codegen<'a, 'i> {
    pub(crate) fn stmt(&mut self, stmt: &'a Stmt<'a>) {
        match stmt {
            Stmt::Block { stmts, .. } => {
                self.scopes.push();
                for inner in *stmts {
                    self.stmt(inner);
                }
                self.scopes.pop();
            }

            Stmt::Expression { expr } => {
                self.expr(expr);
            }

            Stmt::Variable { name, initializer, ty, .. } => {
                let var_ty = ty.get().expect("checked variable");
                let var_ir = ir_type(var_ty, self.interner);

                let var_name = self.interner.resolve(name.lexeme).to_string();
                let slot = self.slot(&var_name);
                write_inst!(self.entry, "  {} = alloca {}", slot, var_ir);

                self.scopes.define(name.lexeme, Variable {
                    value: ExprValue::addressable(slot.clone()),
                    ty: var_ty,
                });

                if let Some(init) = initializer {
                    let (value, value_ty) = self.load_expr(init);
                    let loc = self.debug.location(*name);
                    write_inst!(
                        self.body,
                        "  store {} {}, ptr {}, !dbg {}",
                        value_ty, value, slot, loc
                    );
                }
            }

            Stmt::If { condition, then_branch, else_branch, .. } => {
                let (cond, _) = self.load_expr(condition);

                let then_label = self.blocks.unnamed();
                let (else_label, end_label) = if else_branch.is_some() {
                    (self.blocks.unnamed(), self.blocks.unnamed())
                } else {
                    let end = self.blocks.unnamed();
                    (end.clone(), end)
                };

                write_inst!(
                    self.body,
                    "  br i1 {}, label %{}, label %{}",
                    cond, then_label, else_label
                );
                self.terminated = true;

                self.write_block(&then_label);
                self.stmt(then_branch);
                self.branch_to(&end_label);

                if let Some(else_branch) = else_branch {
                    self.write_block(&else_label);
                    self.stmt(else_branch);
                    self.branch_to(&end_label);
                }

                self.write_block(&end_label);
            }

            Stmt::While { condition, body, .. } => {
                let cond_label = self.blocks.unnamed();
                let body_label = self.blocks.unnamed();
                let end_label = self.blocks.unnamed();

                self.branch_to(&cond_label);
                self.write_block(&cond_label);
                let (cond, _) = self.load_expr(condition);
                write_inst!(
                    self.body,
                    "  br i1 {}, label %{}, label %{}",
                    cond, body_label, end_label
                );
                self.terminated = true;

                self.write_block(&body_label);
                self.loops.push(LoopLabels {
                    continue_label: cond_label.clone(),
                    break_label: end_label.clone(),
                });
                self.stmt(body);
                self.loops.pop();
                self.branch_to(&cond_label);

                self.write_block(&end_label);
            }

            Stmt::For { initializer, condition, increment, body, .. } => {
                self.scopes.push();

                if let Some(init) = initializer {
                    self.stmt(init);
                }

                let cond_label = self.blocks.unnamed();
                let body_label = self.blocks.unnamed();
                let inc_label = self.blocks.unnamed();
                let end_label = self.blocks.unnamed();

                self.branch_to(&cond_label);
                self.write_block(&cond_label);
                match condition {
                    Some(condition) => {
                        let (cond, _) = self.load_expr(condition);
                        write_inst!(
                            self.body,
                            "  br i1 {}, label %{}, label %{}",
                            cond, body_label, end_label
                        );
                        self.terminated = true;
                    }
                    None => self.branch_to(&body_label),
                }

                self.write_block(&body_label);
                self.loops.push(LoopLabels {
                    continue_label: inc_label.clone(),
                    break_label: end_label.clone(),
                });
                self.stmt(body);
                self.loops.pop();
                self.branch_to(&inc_label);

                self.write_block(&inc_label);
                if let Some(increment) = increment {
                    self.expr(increment);
                }
                self.branch_to(&cond_label);

                self.write_block(&end_label);
                self.scopes.pop();
            }

            Stmt::Return { token, value } => {
                let loc = self.debug.location(*token);
                match value {
                    Some(value) => {
                        let (loaded, ty) = self.load_expr(value);
                        write_inst!(self.body, "  ret {} {}, !dbg {}", ty, loaded, loc);
                    }
                    None => {
                        write_inst!(self.body, "  ret void, !dbg {}", loc);
                    }
                }
                self.terminated = true;
            }

            Stmt::Break { .. } => {
                let label = self
                    .loops
                    .last()
                    .map(|l| l.break_label.clone())
                    .expect("codegen: break outside of a loop");
                write_inst!(self.body, "  br label %{}", label);
                self.terminated = true;
            }

            Stmt::Continue { .. } => {
                let label = self
                    .loops
                    .last()
                    .map(|l| l.continue_label.clone())
                    .expect("codegen: continue outside of a loop");
                write_inst!(self.body, "  br label %{}", label);
                self.terminated = true;
            }
        }
    }
}
