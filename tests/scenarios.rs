//! End-to-end scenarios from spec.md §8, run through the whole pipeline.

use pork_vm::error::PipelineError;
use pork_vm::pipeline;

fn result_of(source: &str) -> i64 {
    pipeline::run(source).unwrap_or_else(|err| panic!("expected success, got {err}"))
}

fn diagnostics_of(source: &str) -> Vec<String> {
    match pipeline::run(source) {
        Err(PipelineError::Compile(compile_err)) => {
            compile_err.diagnostics().iter().map(|d| d.to_string()).collect()
        }
        other => panic!("expected a compile error, got {other:?}"),
    }
}

#[test]
fn scenario_1_literal_return() {
    assert_eq!(result_of("{ return 42; }"), 42);
}

#[test]
fn scenario_2_arithmetic_precedence() {
    assert_eq!(result_of("{ return 1 + 2 * 3; }"), 7);
}

#[test]
fn scenario_3_variable_and_assignment() {
    assert_eq!(result_of("{ i32 a; a = 10; a = a + 5; return a; }"), 15);
}

#[test]
fn scenario_4_if_else() {
    assert_eq!(result_of("{ i32 x; x = 3; if x < 5 { return 1; } else { return 2; } }"), 1);
}

#[test]
fn scenario_5_while_loop() {
    assert_eq!(
        result_of("{ i32 i; i = 0; i32 s; s = 0; while i < 10 { s = s + i; i = i + 1; } return s; }"),
        45
    );
}

#[test]
fn scenario_6_mixed_width_arithmetic() {
    assert_eq!(result_of("{ u32 a; a = 1000; u64 b; b = a + 1; return b; }"), 1001);
}

#[test]
fn scenario_7_missing_return_diagnostic() {
    let diagnostics = diagnostics_of("{ i32 x; x = 0; if x == 0 { x = 1; } }");
    assert!(diagnostics.iter().any(|d| d.contains("Not all control paths return.")));
}

#[test]
fn scenario_8_unreachable_code_diagnostic() {
    let diagnostics = diagnostics_of("{ return 1; return 2; }");
    assert!(diagnostics.iter().any(|d| d.contains("Unreachable code") && d.contains("Line 1")));
}

#[test]
fn scenario_9_coalescing_reduces_copy_count_and_preserves_result() {
    let source = "{ i32 a; a = 1; i32 b; b = a; i32 c; c = b; i32 d; d = c; return d; }";
    assert_eq!(result_of(source), 1);

    // Re-lower independently to count copies before coalescing, confirming the
    // allocator actually eliminated some (spec.md §8 Scenario 9).
    use pork_vm::analyzer;
    use pork_vm::bytecode::Op;
    use pork_vm::cfg;
    use pork_vm::liveness;
    use pork_vm::lower::lower;
    use pork_vm::parser::Parser;
    use pork_vm::regalloc;
    use pork_vm::types::{Program, Variables};

    let program = Program::new();
    let parser = Parser::new(source, &program);
    let (mut ast, body) = parser.parse_program().unwrap();
    let mut variables = Variables::new();
    analyzer::analyze(&program, &mut ast, &mut variables, body, program.i64_()).unwrap();
    let mut bytecode = lower(&program, &ast, &mut variables, body);

    let copies_before = bytecode.instructions.iter().filter(|ins| ins.op == Op::Copy).count();

    let cfg = cfg::build(source, &bytecode).unwrap();
    let live = liveness::analyze(&cfg, &bytecode);
    regalloc::allocate(&mut bytecode, &cfg, &live).unwrap();

    let copies_after = bytecode.instructions.iter().filter(|ins| ins.op == Op::Copy).count();
    assert!(copies_after < copies_before, "coalescing should eliminate at least one copy");
}
