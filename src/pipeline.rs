//! Orchestrates the whole compile-and-run pipeline: lex → parse → analyze →
//! lower → CFG → liveness → register-allocate → interpret.
//!
//! Grounded on `original_source/pork/src/main.c`'s `main`: the same straight-line
//! sequence of stages, each gating the next. The two scratch arenas and the
//! long-lived arena that the original threads through every stage are, here,
//! replaced by owned Rust values ([`crate::ast::Ast`], [`crate::types::Variables`],
//! [`crate::bytecode::Bytecode`]) whose lifetime already matches "one function's
//! compilation" (spec.md §9: "a per-call arena passed by argument... is
//! equivalent"). [`crate::arena`] is kept as a faithful, separately tested port of
//! the original's bump allocator but has no consumer on this path.

use crate::analyzer;
use crate::cfg;
use crate::error::{CompileError, PipelineError};
use crate::interp;
use crate::lower::lower;
use crate::parser::Parser;
use crate::regalloc;
use crate::types::{Program, Variables};

/// Compiles and runs `source`, returning the value passed to the function's
/// `return` statement.
///
/// Mirrors `original_source/pork/src/main.c`'s stage sequence exactly: a
/// failure at any stage short-circuits the rest (spec.md §2: "the pipeline runs
/// strictly left to right").
pub fn run(source: &str) -> Result<i64, PipelineError> {
    let span = tracing::info_span!("pipeline");
    let _enter = span.enter();

    let program = Program::new();

    let parser = Parser::new(source, &program);
    let (mut ast, body) = parser.parse_program().map_err(CompileError)?;
    tracing::debug!("parsed");

    let mut variables = Variables::new();
    analyzer::analyze(&program, &mut ast, &mut variables, body, program.i64_()).map_err(CompileError)?;
    tracing::debug!("analyzed");

    let mut bytecode = lower(&program, &ast, &mut variables, body);
    tracing::debug!(instructions = bytecode.instructions.len(), "lowered");

    let cfg = cfg::build(source, &bytecode).map_err(CompileError)?;
    tracing::debug!(blocks = cfg.blocks.len(), "built cfg");

    let liveness = crate::liveness::analyze(&cfg, &bytecode);

    regalloc::allocate(&mut bytecode, &cfg, &liveness)?;
    tracing::debug!(registers = bytecode.register_count, "allocated");

    Ok(interp::execute(&bytecode)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_return() {
        assert_eq!(run("{ return 42; }").unwrap(), 42);
    }

    #[test]
    fn missing_return_is_a_compile_error() {
        let err = run("{ i32 x; x = 0; if x == 0 { x = 1; } }").unwrap_err();
        match err {
            PipelineError::Compile(e) => {
                assert!(e.diagnostics().iter().any(|d| d.to_string().contains("Not all control paths return")));
            }
            other => panic!("expected a compile error, got {other:?}"),
        }
    }

    #[test]
    fn unreachable_code_is_a_compile_error() {
        let err = run("{ return 1; return 2; }").unwrap_err();
        match err {
            PipelineError::Compile(e) => {
                assert!(e.diagnostics().iter().any(|d| d.to_string().contains("Unreachable code")));
            }
            other => panic!("expected a compile error, got {other:?}"),
        }
    }
}
