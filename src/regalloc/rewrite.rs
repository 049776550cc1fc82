//! Final pass: replace every virtual register operand with its assigned color,
//! and shrink `Bytecode::register_count` to `k` (spec.md §4.H Rewrite).
//!
//! Grounded on `original_source/pork/src/bytecode.c`'s tail of `allocate_registers`
//! (the `REMAP` macro applied per-op by the same `switch` the rest of the pipeline
//! uses for operand direction).

use crate::bytecode::{Bytecode, Op};
use crate::regalloc::lr::LiveRanges;

fn remap(lr: &mut LiveRanges, colors: &[i64], reg: i64) -> i64 {
    colors[lr.find(reg as u32) as usize]
}

pub fn rewrite(bytecode: &mut Bytecode, lr: &mut LiveRanges, colors: &[i64], k: u32) {
    for ins in &mut bytecode.instructions {
        match ins.op {
            Op::Noop | Op::Jmp => {}

            Op::Imm => {
                ins.a1 = remap(lr, colors, ins.a1);
            }

            Op::Copy => {
                ins.a1 = remap(lr, colors, ins.a1);
                ins.a2 = remap(lr, colors, ins.a2);
            }

            // a3 carries the source OpType code, not a register; leave it alone.
            Op::Cast => {
                ins.a1 = remap(lr, colors, ins.a1);
                ins.a2 = remap(lr, colors, ins.a2);
            }

            Op::Add | Op::Sub | Op::Mul | Op::Div | Op::Less | Op::LEqual | Op::Equal | Op::NEqual => {
                ins.a1 = remap(lr, colors, ins.a1);
                ins.a2 = remap(lr, colors, ins.a2);
                ins.a3 = remap(lr, colors, ins.a3);
            }

            // a2/a3 of CJMP are labels; only the condition register remaps.
            Op::Ret | Op::CJmp => {
                ins.a1 = remap(lr, colors, ins.a1);
            }
        }
    }

    bytecode.register_count = k;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::Instruction;

    #[test]
    fn remaps_every_register_operand_and_leaves_labels_and_opcodes_alone() {
        let mut bytecode = Bytecode::new();
        bytecode.register_count = 3;
        bytecode.push(Instruction {
            op: Op::Add,
            ty: None,
            a1: 2,
            a2: 0,
            a3: 1,
            label: None,
            line: 0,
        });
        bytecode.push(Instruction {
            op: Op::CJmp,
            ty: None,
            a1: 2,
            a2: 5,
            a3: 6,
            label: None,
            line: 0,
        });

        let mut lr = LiveRanges::new(3);
        let colors = vec![0i64, 1, 2];
        rewrite(&mut bytecode, &mut lr, &colors, 3);

        assert_eq!(bytecode.instructions[0].a1, 2);
        assert_eq!(bytecode.instructions[0].a2, 0);
        assert_eq!(bytecode.instructions[0].a3, 1);
        assert_eq!(bytecode.instructions[1].a1, 2);
        assert_eq!(bytecode.instructions[1].a2, 5);
        assert_eq!(bytecode.instructions[1].a3, 6);
        assert_eq!(bytecode.register_count, 3);
    }
}
