//! Control-flow analysis: basic-block partition, successor/predecessor graph,
//! reachability, and the missing-return / unreachable-code diagnostics.
//!
//! Grounded on `original_source/pork/src/bytecode.c`'s `analyze_control_flow`/
//! `mark_reachable`: a single forward scan that starts a new block at any
//! labelled instruction or right after a `Jmp`/`CJmp`/`Ret`, a synthetic `end`
//! sentinel block bound to the terminal label, and a DFS reachability pass from
//! block 0 that both proves "missing return" (end reachable) and "unreachable
//! code" (a block with user code that DFS never visits).

use crate::bytecode::{Bytecode, Op};
use crate::diagnostics::{Diagnostic, DiagnosticBag};

pub const END_BLOCK: usize = usize::MAX;

#[derive(Debug, Default)]
pub struct BasicBlock {
    pub index: usize,
    pub start: usize,
    pub end: usize,
    /// Block indices; [`END_BLOCK`] is stripped out once validation succeeds
    /// (spec.md §3: "the synthetic end pseudo-block is never retained in the
    /// final successor arrays").
    pub successors: Vec<usize>,
    pub predecessors: Vec<usize>,
    pub has_user_code: bool,
    pub reachable: bool,
    pub first_line: u32,
}

/// The control-flow graph: one real [`BasicBlock`] per partition plus
/// bookkeeping for the label→block lookup used while building successors.
#[derive(Debug, Default)]
pub struct Cfg {
    pub blocks: Vec<BasicBlock>,
}

impl Cfg {
    pub fn get(&self, index: usize) -> &BasicBlock {
        &self.blocks[index]
    }
}

fn new_block(index: usize, start: usize) -> BasicBlock {
    BasicBlock {
        index,
        start,
        end: start,
        successors: Vec::new(),
        predecessors: Vec::new(),
        has_user_code: false,
        reachable: false,
        first_line: u32::MAX,
    }
}

/// Builds the CFG and validates it. Returns `Err` with every collected
/// diagnostic if any block is unreachable-but-has-code, or if the `end`
/// sentinel is reachable (spec.md §4.F).
pub fn build(source: &str, bytecode: &Bytecode) -> Result<Cfg, Vec<Diagnostic>> {
    let span = tracing::debug_span!("cfg");
    let _enter = span.enter();

    let end_label = bytecode.end_label();

    let mut blocks = vec![new_block(0, 0)];
    // Maps a dense label id to the block index it starts, or END_BLOCK for the
    // terminal label.
    let mut labelled_blocks: Vec<usize> = vec![usize::MAX; bytecode.label_locations.len()];
    labelled_blocks[end_label as usize] = END_BLOCK;

    let mut current = 0usize;
    let mut start_new_block = false;

    for (i, ins) in bytecode.instructions.iter().enumerate() {
        if ins.label.is_some() || start_new_block {
            start_new_block = false;
            let index = blocks.len();
            blocks.push(new_block(index, i));
            current = index;
            if let Some(label) = ins.label {
                labelled_blocks[label as usize] = current;
            }
        }

        blocks[current].end += 1;

        if ins.op != Op::Jmp && ins.op != Op::CJmp {
            blocks[current].has_user_code = true;
            blocks[current].first_line = blocks[current].first_line.min(ins.line);
        }

        if matches!(ins.op, Op::Jmp | Op::CJmp | Op::Ret) {
            start_new_block = true;
        }
    }

    let block_count = blocks.len();
    for index in 0..block_count {
        let next = if index + 1 < block_count { index + 1 } else { END_BLOCK };

        if blocks[index].end == blocks[index].start {
            blocks[index].successors.push(next);
            continue;
        }

        let last = &bytecode.instructions[blocks[index].end - 1];
        match last.op {
            Op::Ret => {}
            Op::Jmp => {
                blocks[index].successors.push(labelled_blocks[last.label_a1() as usize]);
            }
            Op::CJmp => {
                let then_block = labelled_blocks[last.label_a2() as usize];
                let else_block = labelled_blocks[last.label_a3() as usize];
                blocks[index].successors.push(then_block);
                if else_block != then_block {
                    blocks[index].successors.push(else_block);
                }
            }
            _ => {
                blocks[index].successors.push(next);
            }
        }
    }

    let mut end_reachable = false;
    let mut reachable = vec![false; block_count];
    mark_reachable(0, &blocks, &mut reachable, &mut end_reachable);
    for (index, block) in blocks.iter_mut().enumerate() {
        block.reachable = reachable[index];
    }

    let mut diagnostics = DiagnosticBag::new();

    if end_reachable {
        diagnostics.push(Diagnostic::bare("Not all control paths return."));
    }

    for block in &blocks {
        if block.has_user_code && !block.reachable {
            diagnostics.push(Diagnostic::at_line(block.first_line, "Unreachable code"));
        }
    }

    if diagnostics.has_errors() {
        return Err(diagnostics.into_vec());
    }

    for block in &mut blocks {
        block.successors.retain(|&s| s != END_BLOCK);
    }

    for index in 0..block_count {
        let successors = blocks[index].successors.clone();
        for successor in successors {
            blocks[successor].predecessors.push(index);
        }
    }

    let _ = source;
    Ok(Cfg { blocks })
}

fn mark_reachable(block: usize, blocks: &[BasicBlock], reachable: &mut [bool], end_reachable: &mut bool) {
    if block == END_BLOCK {
        *end_reachable = true;
        return;
    }
    if reachable[block] {
        return;
    }
    reachable[block] = true;
    for &successor in &blocks[block].successors {
        mark_reachable(successor, blocks, reachable, end_reachable);
    }
}
