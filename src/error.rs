//! Error types for every stage of the pipeline.
//!
//! Split the way the teacher crate splits `InterpreterError`/`RuntimeError`: one
//! enum per failure domain, `thiserror`-derived, with `#[from]` conversions where a
//! lower stage's error is always wrapped rather than matched on by its caller.

use thiserror::Error;

use crate::diagnostics::Diagnostic;

/// Terminal failure of lexing, parsing, semantic analysis, or CFG validation.
///
/// All four stages that can produce this share the same shape: one or more
/// `Line <n>: <message>` diagnostics and nothing else salvageable. Semantic
/// analysis collects every diagnostic it can find before returning this (spec.md
/// §4.D); lexing/parsing/CFG validation return as soon as they hit the first
/// unrecoverable problem.
#[derive(Debug, Error)]
#[error("compilation failed with {} error(s)", .0.len())]
pub struct CompileError(pub Vec<Diagnostic>);

impl CompileError {
    pub fn single(diagnostic: Diagnostic) -> Self {
        CompileError(vec![diagnostic])
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.0
    }
}

/// Failure of the register allocator's Simplify/Select pass.
///
/// Spilling is an explicit non-goal (spec.md §1, §4.H, §9): if Simplify's worklist
/// stalls with a nonempty residual set, the function simply cannot be colored with
/// the available registers and allocation aborts.
#[derive(Debug, Error)]
pub enum AllocError {
    /// Simplify could not reduce the live-range graph to degree `< k` for every
    /// remaining node; `live_ranges` lists the representatives stuck above degree.
    #[error(
        "cannot color {} live range(s) with {k} registers (spilling is unsupported)",
        .live_ranges.len()
    )]
    Uncolorable { live_ranges: Vec<u32>, k: u32 },
}

/// A failure that happens while the interpreter is executing already-allocated
/// bytecode.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuntimeError {
    /// Control fell off the end of the instruction stream without a `RET`. CFG
    /// validation (spec.md §4.F) proves this unreachable for any program that
    /// compiled successfully; the interpreter still checks for it defensively
    /// because the check is one comparison per step and the alternative is an
    /// out-of-bounds program-counter read.
    #[error("No return.")]
    MissingReturn,

    /// Division by zero (spec.md §9 Open Question iii, resolved as a trap rather
    /// than native UB).
    #[error("division by zero at line {line}")]
    DivideByZero { line: u32 },
}

/// Top-level error returned by [`crate::pipeline::run`], unifying every stage.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Alloc(#[from] AllocError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error("failed to read source file {path:?}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}
