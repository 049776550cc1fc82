//! CLI driver: reads a `.pork` source file, runs the full pipeline, and prints
//! either `Result: <int>` or diagnostics.
//!
//! Grounded on `original_source/pork/src/main.c`'s `main`: same default source
//! path, same `Result: %lld` success message, same "every failure exits 1"
//! convention (spec.md §6).

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use pork_vm::error::{PipelineError, RuntimeError};
use pork_vm::pipeline;

const DEFAULT_SOURCE_PATH: &str = "demos/test.pork";

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let path = std::env::args().nth(1).map(PathBuf::from).unwrap_or_else(|| DEFAULT_SOURCE_PATH.into());

    let source = match fs::read_to_string(&path) {
        Ok(source) => source,
        Err(source_err) => {
            let err = PipelineError::Io { path, source: source_err };
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };

    match pipeline::run(&source) {
        Ok(value) => {
            println!("Result: {value}");
            ExitCode::SUCCESS
        }
        Err(PipelineError::Compile(compile_err)) => {
            for diagnostic in compile_err.diagnostics() {
                println!("{}", diagnostic.render(&source));
            }
            ExitCode::FAILURE
        }
        Err(PipelineError::Alloc(alloc_err)) => {
            println!("{alloc_err}");
            ExitCode::FAILURE
        }
        Err(PipelineError::Runtime(RuntimeError::MissingReturn)) => {
            println!("No return.");
            ExitCode::FAILURE
        }
        Err(PipelineError::Runtime(runtime_err)) => {
            println!("{runtime_err}");
            ExitCode::FAILURE
        }
        Err(PipelineError::Io { .. }) => unreachable!("read_to_string already succeeded"),
    }
}
