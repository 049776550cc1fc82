//! Semantic analysis: name resolution, typing, implicit coercion, cast
//! insertion, return-type checking.
//!
//! Grounded on `original_source/pork/src/semantics.c`'s `process_ast` for the
//! recursive structure and scope handling; the coercion/cast-insertion rules
//! themselves are spec.md §4.D (the original only checks same-type equality —
//! superseded here, see SPEC_FULL.md §4.D). Errors accumulate in a
//! [`DiagnosticBag`] rather than aborting on the first one, so the caller sees
//! every problem in one pass.

pub mod coerce;
pub mod scope;

use crate::ast::{Ast, AstKind, AstPayload, NodeId};
use crate::diagnostics::{Diagnostic, DiagnosticBag};
use crate::types::{Program, TypeId, VarId, Variable, Variables};
use scope::Scopes;

struct Analyzer<'a> {
    program: &'a Program,
    ast: &'a mut Ast,
    variables: &'a mut Variables,
    scopes: Scopes,
    diagnostics: DiagnosticBag,
    return_type: TypeId,
}

/// Runs semantic analysis over the function body rooted at `root`, coercing
/// `return` expressions to `return_type`. Pork's grammar has no function-signature
/// syntax (spec.md §6), so every compilation unit is a single implicit function;
/// [`crate::pipeline`] passes `program.i64_()` as its declared return type — the
/// widest built-in, so every well-typed `return` coerces and the mismatch branch
/// stays reachable only for expressions that are already `void` from an earlier
/// error (see DESIGN.md's Open Question notes on spec.md §4.D's "default i32",
/// which cannot be literal given spec.md Scenario 6 returns a `u64`).
pub fn analyze(
    program: &Program,
    ast: &mut Ast,
    variables: &mut Variables,
    root: NodeId,
    return_type: TypeId,
) -> Result<(), Vec<Diagnostic>> {
    let mut analyzer = Analyzer {
        program,
        ast,
        variables,
        scopes: Scopes::new(),
        diagnostics: DiagnosticBag::new(),
        return_type,
    };

    let success = analyzer.analyze_node(root);

    if success && !analyzer.diagnostics.has_errors() {
        Ok(())
    } else {
        Err(analyzer.diagnostics.into_vec())
    }
}

impl Analyzer<'_> {
    fn error(&mut self, line: u32, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::at_line(line, message));
    }

    /// Sets `variable: Some(id)` on a `Variable`/`VariableDecl` node's payload.
    fn bind_variable(&mut self, node: NodeId, var: VarId) {
        match &mut self.ast.get_mut(node).payload {
            AstPayload::Variable { variable, .. } | AstPayload::VariableDecl { variable, .. } => {
                *variable = Some(var);
            }
            _ => unreachable!("bind_variable called on a non-variable node"),
        }
    }

    fn analyze_node(&mut self, node: NodeId) -> bool {
        let kind = self.ast.get(node).kind;
        let line = self.ast.get(node).line;

        match kind {
            AstKind::IntLiteral => true,

            AstKind::Variable => {
                let name = match &self.ast.get(node).payload {
                    AstPayload::Variable { name, .. } => name.clone(),
                    _ => unreachable!(),
                };

                match self.scopes.lookup(&name) {
                    Some(var_id) => {
                        self.bind_variable(node, var_id);
                        self.ast.get_mut(node).ty = self.variables.get(var_id).declared_type;
                        true
                    }
                    None => {
                        self.error(line, "undefined variable");
                        self.ast.get_mut(node).ty = self.program.void;
                        false
                    }
                }
            }

            AstKind::VariableDecl => {
                let name = match &self.ast.get(node).payload {
                    AstPayload::VariableDecl { name, .. } => name.clone(),
                    _ => unreachable!(),
                };

                if self.scopes.declared_in_current_scope(&name) {
                    self.error(line, "variable redefinition");
                    return false;
                }

                let declared_type = self.ast.get(node).ty;
                let var_id = self.variables.alloc(Variable::new(name.clone(), declared_type));
                self.scopes.declare(name, var_id);
                self.bind_variable(node, var_id);
                true
            }

            AstKind::Cast => {
                let expr = self.ast.get(node).expression();
                self.analyze_node(expr)
            }

            AstKind::Add
            | AstKind::Sub
            | AstKind::Mul
            | AstKind::Div
            | AstKind::Less
            | AstKind::LEqual
            | AstKind::Equal
            | AstKind::NEqual => {
                let (left, right) = match &self.ast.get(node).payload {
                    AstPayload::Binary { left, right } => (*left, *right),
                    _ => unreachable!(),
                };

                let mut success = self.analyze_node(left);
                success &= self.analyze_node(right);

                match coerce::unify_binary_operands(self.ast, self.program, left, right) {
                    Some(ty) => {
                        self.ast.get_mut(node).ty = ty;
                    }
                    None => {
                        self.error(line, "types of operands are invalid for this operation");
                        self.ast.get_mut(node).ty = self.program.void;
                        success = false;
                    }
                }

                success
            }

            AstKind::Assign => {
                let (left, right) = match &self.ast.get(node).payload {
                    AstPayload::Assign { left, right } => (*left, *right),
                    _ => unreachable!(),
                };

                let mut success = self.analyze_node(left);
                success &= self.analyze_node(right);

                if self.ast.get(left).kind != AstKind::Variable {
                    self.error(self.ast.get(left).line, "not assignable");
                    success = false;
                }

                let left_ty = self.ast.get(left).ty;
                match coerce::coerce_to(self.ast, self.program, right, left_ty) {
                    Some(ty) => {
                        self.ast.get_mut(node).ty = ty;
                    }
                    None => {
                        self.error(line, "types of operands are invalid for this operation");
                        self.ast.get_mut(node).ty = self.program.void;
                        success = false;
                    }
                }

                success
            }

            AstKind::Block => {
                self.scopes.push();
                let children = self.ast.block_children(node);
                let mut success = true;
                for child in children {
                    success &= self.analyze_node(child);
                }
                self.scopes.pop();
                success
            }

            AstKind::Return => {
                let expr = self.ast.get(node).expression();
                let mut success = self.analyze_node(expr);

                let return_type = self.return_type;
                match coerce::coerce_to(self.ast, self.program, expr, return_type) {
                    Some(_) => {}
                    None => {
                        self.error(line, "return type does not match the function signature");
                        success = false;
                    }
                }

                success
            }

            AstKind::If => {
                let (condition, block_then, block_else) = match &self.ast.get(node).payload {
                    AstPayload::If {
                        condition,
                        block_then,
                        block_else,
                    } => (*condition, *block_then, *block_else),
                    _ => unreachable!(),
                };

                let mut success = self.analyze_node(condition);
                success &= self.analyze_node(block_then);
                if let Some(block_else) = block_else {
                    success &= self.analyze_node(block_else);
                }
                success
            }

            AstKind::While => {
                let (condition, block) = match &self.ast.get(node).payload {
                    AstPayload::While { condition, block } => (*condition, *block),
                    _ => unreachable!(),
                };

                let mut success = self.analyze_node(condition);
                success &= self.analyze_node(block);
                success
            }
        }
    }
}
