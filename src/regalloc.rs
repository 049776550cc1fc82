//! Chaitin-Briggs register allocation: build interference, coalesce copies,
//! simplify/select colors, then rewrite every operand in place (spec.md §4.H).
//!
//! Grounded on `original_source/pork/src/bytecode.c`'s `allocate_registers`,
//! split across [`graph`]/[`lr`]/[`coalesce`]/[`color`]/[`rewrite`] the way the
//! original keeps one function but with clearly delineated phases (build,
//! coalesce, simplify, select, rewrite — this crate's module boundaries mirror
//! those five phase comments).

pub mod coalesce;
pub mod color;
pub mod graph;
pub mod lr;
pub mod rewrite;

use crate::bytecode::Bytecode;
use crate::cfg::Cfg;
use crate::error::AllocError;
use crate::liveness::Liveness;

/// The interpreter's register file size (spec.md §4.H: "targeting `k` physical
/// registers (the interpreter uses 8)").
pub const K: u32 = 8;

/// Runs every phase, mutating `bytecode` so its instructions use physical
/// registers in `[0, K)` and `register_count == K`.
pub fn allocate(bytecode: &mut Bytecode, cfg: &Cfg, liveness: &Liveness) -> Result<(), AllocError> {
    let span = tracing::debug_span!("regalloc");
    let _enter = span.enter();

    let coalesce::Coalesced { mut graph, mut lr } = coalesce::build_and_coalesce(bytecode, cfg, liveness);
    let colors = color::color(&mut graph, &mut lr, K)?;
    rewrite::rewrite(bytecode, &mut lr, &colors, K);

    tracing::debug!(register_count = bytecode.register_count, "allocation complete");
    Ok(())
}
