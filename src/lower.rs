//! AST → three-address bytecode lowering: virtual-register allocation, label
//! generation, and (via [`labels`]) label compaction.
//!
//! Grounded on `original_source/pork/src/bytecode.c`'s `translate`/
//! `generate_bytecode`. Extended with an `AST_CAST` arm the original never
//! exercises (its semantics analyzer never inserts casts); `CAST`'s operand
//! encoding (`a3` carries the source [`OpType`]) is spec.md §3's table.

pub mod labels;

use crate::ast::{Ast, AstKind, AstPayload, NodeId};
use crate::bytecode::{Bytecode, Instruction, Op, Reg, SYNTHETIC_LINE};
use crate::types::{OpType, Program, Variables};

struct Lowering<'a> {
    program: &'a Program,
    ast: &'a Ast,
    variables: &'a mut Variables,
    bytecode: Bytecode,
    /// Position each label was placed at, indexed by (pre-compaction) label id.
    /// `usize::MAX` means "allocated but not yet placed" — a programming error
    /// if still present when lowering finishes.
    label_positions: Vec<usize>,
}

/// Lowers one function body into fresh [`Bytecode`], assigning virtual registers
/// to every [`crate::types::Variable`] as its `VariableDecl` is lowered.
pub fn lower(program: &Program, ast: &Ast, variables: &mut Variables, root: NodeId) -> Bytecode {
    let mut lowering = Lowering {
        program,
        ast,
        variables,
        bytecode: Bytecode::new(),
        label_positions: Vec::new(),
    };

    lowering.lower_node(root);

    let label_positions = std::mem::take(&mut lowering.label_positions);
    debug_assert!(
        label_positions.iter().all(|&p| p != usize::MAX),
        "a label was allocated but never placed"
    );
    labels::compact(&mut lowering.bytecode, &label_positions);

    lowering.bytecode
}

impl Lowering<'_> {
    fn op_type(&self, node: NodeId) -> OpType {
        self.program.get(self.ast.get(node).ty).op_type
    }

    fn get_label(&mut self) -> u32 {
        let id = self.label_positions.len() as u32;
        self.label_positions.push(usize::MAX);
        id
    }

    fn place_label(&mut self, label: u32) {
        self.label_positions[label as usize] = self.bytecode.instructions.len();
    }

    fn emit(&mut self, op: Op, ty: Option<OpType>, a1: i64, a2: i64, a3: i64, line: u32) {
        self.bytecode.push(Instruction {
            op,
            ty,
            a1,
            a2,
            a3,
            label: None,
            line,
        });
        tracing::trace!(?op, a1, a2, a3, line, "emitted instruction");
    }

    /// Lowers `node`, returning the virtual register holding its value, or
    /// `None` for statement kinds that produce no value (spec.md §4.E: "−1 for
    /// statements").
    fn lower_node(&mut self, node: NodeId) -> Option<Reg> {
        let line = self.ast.get(node).line;

        match self.ast.get(node).kind {
            AstKind::IntLiteral => {
                let value = match self.ast.get(node).payload {
                    AstPayload::IntLiteral(v) => v,
                    _ => unreachable!(),
                };
                let r = self.bytecode.alloc_register();
                self.emit(Op::Imm, Some(self.op_type(node)), r as i64, value as i64, 0, line);
                Some(r)
            }

            AstKind::Variable => {
                let var_id = match &self.ast.get(node).payload {
                    AstPayload::Variable { variable, .. } => variable.expect("name resolved during analysis"),
                    _ => unreachable!(),
                };
                Some(
                    self.variables
                        .get(var_id)
                        .virtual_register
                        .expect("variable's declaration was lowered before this use"),
                )
            }

            AstKind::VariableDecl => {
                let var_id = match &self.ast.get(node).payload {
                    AstPayload::VariableDecl { variable, .. } => variable.expect("bound during analysis"),
                    _ => unreachable!(),
                };
                let r = self.bytecode.alloc_register();
                self.variables.get_mut(var_id).virtual_register = Some(r);
                None
            }

            AstKind::Cast => {
                let expr = self.ast.get(node).expression();
                let source_ty = self.op_type(expr);
                let r_src = self.lower_node(expr).expect("cast operand is an expression");
                let r_dst = self.bytecode.alloc_register();
                self.emit(
                    Op::Cast,
                    Some(self.op_type(node)),
                    r_dst as i64,
                    r_src as i64,
                    source_ty.to_code(),
                    line,
                );
                Some(r_dst)
            }

            kind @ (AstKind::Add
            | AstKind::Sub
            | AstKind::Mul
            | AstKind::Div
            | AstKind::Less
            | AstKind::LEqual
            | AstKind::Equal
            | AstKind::NEqual) => {
                let (left, right) = match &self.ast.get(node).payload {
                    AstPayload::Binary { left, right } => (*left, *right),
                    _ => unreachable!(),
                };
                let l = self.lower_node(left).expect("binary operand is an expression");
                let r = self.lower_node(right).expect("binary operand is an expression");
                let dst = self.bytecode.alloc_register();
                let op = binary_op(kind);
                self.emit(op, Some(self.op_type(node)), dst as i64, l as i64, r as i64, line);
                Some(dst)
            }

            AstKind::Assign => {
                let (left, right) = match &self.ast.get(node).payload {
                    AstPayload::Assign { left, right } => (*left, *right),
                    _ => unreachable!(),
                };
                let r = self.lower_node(right).expect("assign's right side is an expression");
                let var_id = match &self.ast.get(left).payload {
                    AstPayload::Variable { variable, .. } => variable.expect("bound during analysis"),
                    _ => unreachable!("assign's left side must be a Variable, enforced by analysis"),
                };
                let dst = self
                    .variables
                    .get(var_id)
                    .virtual_register
                    .expect("assigned variable was declared earlier in the same function");
                self.emit(Op::Copy, None, dst as i64, r as i64, 0, line);
                Some(r)
            }

            AstKind::Block => {
                for child in self.ast.block_children(node) {
                    self.lower_node(child);
                }
                None
            }

            AstKind::Return => {
                let expr = self.ast.get(node).expression();
                let r = self.lower_node(expr).expect("return's expression is an expression");
                self.emit(Op::Ret, None, r as i64, 0, 0, line);
                None
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

                let has_else = block_else.is_some();
                let label_then = self.get_label();
                let label_else = self.get_label();

                let cond_reg = self.lower_node(condition).expect("if condition is an expression");
                self.emit(
                    Op::CJmp,
                    None,
                    cond_reg as i64,
                    label_then as i64,
                    label_else as i64,
                    SYNTHETIC_LINE,
                );

                self.place_label(label_then);
                self.lower_node(block_then);

                let label_end = if has_else {
                    let label_end = self.get_label();
                    self.emit(Op::Jmp, None, label_end as i64, 0, 0, SYNTHETIC_LINE);
                    Some(label_end)
                } else {
                    None
                };

                self.place_label(label_else);

                if let Some(block_else) = block_else {
                    self.lower_node(block_else);
                    self.place_label(label_end.unwrap());
                }

                None
            }

            AstKind::While => {
                let (condition, block) = match &self.ast.get(node).payload {
                    AstPayload::While { condition, block } => (*condition, *block),
                    _ => unreachable!(),
                };

                let label_start = self.get_label();
                let label_body = self.get_label();
                let label_end = self.get_label();

                self.place_label(label_start);
                let cond_reg = self.lower_node(condition).expect("while condition is an expression");
                self.emit(
                    Op::CJmp,
                    None,
                    cond_reg as i64,
                    label_body as i64,
                    label_end as i64,
                    SYNTHETIC_LINE,
                );

                self.place_label(label_body);
                self.lower_node(block);
                self.emit(Op::Jmp, None, label_start as i64, 0, 0, SYNTHETIC_LINE);

                self.place_label(label_end);

                None
            }
        }
    }
}

fn binary_op(kind: AstKind) -> Op {
    match kind {
        AstKind::Add => Op::Add,
        AstKind::Sub => Op::Sub,
        AstKind::Mul => Op::Mul,
        AstKind::Div => Op::Div,
        AstKind::Less => Op::Less,
        AstKind::LEqual => Op::LEqual,
        AstKind::Equal => Op::Equal,
        AstKind::NEqual => Op::NEqual,
        other => unreachable!("{other:?} is not a binary op"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer;
    use crate::parser::Parser;

    fn lower_source(source: &str) -> Bytecode {
        let program = Program::new();
        let parser = Parser::new(source, &program);
        let (mut ast, body) = parser.parse_program().expect("parse failed");
        let mut variables = Variables::new();
        analyzer::analyze(&program, &mut ast, &mut variables, body, program.i64_()).expect("analyze failed");
        lower(&program, &ast, &mut variables, body)
    }

    #[test]
    fn literal_return_emits_imm_then_ret() {
        let bc = lower_source("{ return 42; }");
        assert_eq!(bc.instructions.len(), 2);
        assert_eq!(bc.instructions[0].op, Op::Imm);
        assert_eq!(bc.instructions[0].a2, 42);
        assert_eq!(bc.instructions[1].op, Op::Ret);
    }

    #[test]
    fn every_label_resolves_within_bounds_and_end_label_points_past_the_stream() {
        let bc = lower_source("{ i32 x; x = 3; if x < 5 { return 1; } else { return 2; } }");
        let len = bc.instructions.len();
        for ins in &bc.instructions {
            match ins.op {
                Op::Jmp => assert!(bc.label_locations.contains_key(&ins.label_a1())),
                Op::CJmp => {
                    assert!(bc.label_locations.contains_key(&ins.label_a2()));
                    assert!(bc.label_locations.contains_key(&ins.label_a3()));
                }
                _ => {}
            }
        }
        let end_label = bc.end_label();
        assert_eq!(*bc.label_locations.get(&end_label).unwrap(), len);
    }

    #[test]
    fn while_loop_jumps_back_to_its_condition() {
        let bc = lower_source("{ i32 i; i = 0; while i < 10 { i = i + 1; } return i; }");
        let jmp = bc.instructions.iter().find(|i| i.op == Op::Jmp).expect("has a jmp");
        let target = *bc.label_locations.get(&jmp.label_a1()).unwrap();
        assert_eq!(bc.instructions[target].op, Op::CJmp);
    }
}
