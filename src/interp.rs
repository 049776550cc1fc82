//! Register-file executor for allocated bytecode (spec.md §4.I).
//!
//! Grounded on `original_source/pork/src/vm.c`'s `vm_execute`: same instruction
//! dispatch, same register file size, same fall-through-to-`No return.` sentinel.
//! Differs in three ways the original leaves to undefined behavior and spec.md
//! §9 resolves: arithmetic uses `wrapping_*` (native `+`/`-`/`*`/`/` on `i64`
//! panic on overflow in safe Rust, where C silently wraps/UBs), `CAST` narrows to
//! its destination width and signedness instead of performing a raw copy, and
//! division by zero is a typed [`RuntimeError`] rather than a crash.

use crate::bytecode::{Bytecode, Op};
use crate::error::RuntimeError;
use crate::regalloc::K;

/// Runs `bytecode` (already allocated down to `K` physical registers) to
/// completion and returns the value passed to `RET`.
pub fn execute(bytecode: &Bytecode) -> Result<i64, RuntimeError> {
    let span = tracing::debug_span!("interp");
    let _enter = span.enter();

    let mut regs = [0i64; K as usize];
    let mut pc = 0usize;

    while pc < bytecode.instructions.len() {
        let ins = &bytecode.instructions[pc];

        match ins.op {
            Op::Noop => {}

            Op::Imm => regs[ins.a1 as usize] = ins.a2,

            Op::Copy => regs[ins.a1 as usize] = regs[ins.a2 as usize],

            Op::Cast => {
                let ty = ins.ty.expect("cast instruction always carries a destination type");
                regs[ins.a1 as usize] = ty.narrow(regs[ins.a2 as usize]);
            }

            Op::Add => regs[ins.a1 as usize] = regs[ins.reg_a2() as usize].wrapping_add(regs[ins.reg_a3() as usize]),
            Op::Sub => regs[ins.a1 as usize] = regs[ins.reg_a2() as usize].wrapping_sub(regs[ins.reg_a3() as usize]),
            Op::Mul => regs[ins.a1 as usize] = regs[ins.reg_a2() as usize].wrapping_mul(regs[ins.reg_a3() as usize]),

            Op::Div => {
                let divisor = regs[ins.reg_a3() as usize];
                if divisor == 0 {
                    return Err(RuntimeError::DivideByZero { line: ins.line });
                }
                regs[ins.a1 as usize] = regs[ins.reg_a2() as usize].wrapping_div(divisor);
            }

            Op::Less => regs[ins.a1 as usize] = (regs[ins.reg_a2() as usize] < regs[ins.reg_a3() as usize]) as i64,
            Op::LEqual => regs[ins.a1 as usize] = (regs[ins.reg_a2() as usize] <= regs[ins.reg_a3() as usize]) as i64,
            Op::Equal => regs[ins.a1 as usize] = (regs[ins.reg_a2() as usize] == regs[ins.reg_a3() as usize]) as i64,
            Op::NEqual => regs[ins.a1 as usize] = (regs[ins.reg_a2() as usize] != regs[ins.reg_a3() as usize]) as i64,

            Op::Ret => {
                let value = regs[ins.reg_a1() as usize];
                tracing::debug!(value, "returned");
                return Ok(value);
            }

            Op::Jmp => {
                pc = bytecode.label_locations[&ins.label_a1()];
                continue;
            }

            Op::CJmp => {
                let label = if regs[ins.reg_a1() as usize] != 0 {
                    ins.label_a2()
                } else {
                    ins.label_a3()
                };
                pc = bytecode.label_locations[&label];
                continue;
            }
        }

        pc += 1;
    }

    Err(RuntimeError::MissingReturn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer;
    use crate::cfg;
    use crate::liveness;
    use crate::lower::lower;
    use crate::parser::Parser;
    use crate::regalloc;
    use crate::types::{Program, Variables};

    fn run(source: &str) -> Result<i64, RuntimeError> {
        let program = Program::new();
        let parser = Parser::new(source, &program);
        let (mut ast, body) = parser.parse_program().expect("parse failed");
        let mut variables = Variables::new();
        analyzer::analyze(&program, &mut ast, &mut variables, body, program.i64_()).expect("analyze failed");
        let mut bytecode = lower(&program, &ast, &mut variables, body);
        let cfg = cfg::build(source, &bytecode).expect("cfg failed");
        let live = liveness::analyze(&cfg, &bytecode);
        regalloc::allocate(&mut bytecode, &cfg, &live).expect("should allocate");
        execute(&bytecode)
    }

    #[test]
    fn literal_return() {
        assert_eq!(run("{ return 42; }"), Ok(42));
    }

    #[test]
    fn arithmetic_precedence_multiplies_before_adding() {
        assert_eq!(run("{ return 2 + 3 * 4; }"), Ok(14));
    }

    #[test]
    fn variable_assignment_and_use() {
        assert_eq!(run("{ i32 x; x = 7; return x + 1; }"), Ok(8));
    }

    #[test]
    fn if_else_picks_the_taken_branch() {
        assert_eq!(run("{ i32 x; x = 5; if x < 10 { return 1; } else { return 2; } }"), Ok(1));
        assert_eq!(
            run("{ i32 x; x = 50; if x < 10 { return 1; } else { return 2; } }"),
            Ok(2)
        );
    }

    #[test]
    fn while_loop_accumulates() {
        assert_eq!(
            run("{ i32 i; i = 0; i32 sum; sum = 0; while i < 5 { sum = sum + i; i = i + 1; } return sum; }"),
            Ok(10)
        );
    }

    #[test]
    fn mixed_width_arithmetic_widens_before_adding() {
        assert_eq!(run("{ u32 a; a = 1000; u64 b; b = a + 1; return b; }"), Ok(1001));
    }

    #[test]
    fn division_by_zero_is_a_runtime_error_not_a_crash() {
        assert_eq!(run("{ return 1 / 0; }"), Err(RuntimeError::DivideByZero { line: 1 }));
    }

    #[test]
    fn narrowing_cast_sign_extends_a_negative_i8_back_to_i64() {
        // `u8 a; a = 255;` holds 255 in an 8-byte register; casting to `i8` should
        // narrow to the bit pattern 0xFF and sign-extend it back to -1.
        assert_eq!(run("{ u8 a; a = 255; i8 b; b = a; return b; }"), Ok(-1));
    }
}
