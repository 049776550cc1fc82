//! Label compaction: dense label ids plus a terminal "end" label one past the
//! last instruction (spec.md §3, §4.E).
//!
//! Grounded on `original_source/pork/src/bytecode.c`'s `generate_bytecode` remap:
//! two passes over the translator's (possibly sparse/duplicated) label
//! positions, assigning a compact id the first time a position is seen, then
//! rewriting every `JMP`/`CJMP` operand through the old→new mapping.

use crate::bytecode::{Bytecode, Op};

/// `label_positions[i]` is the instruction index label `i` (in pre-compaction,
/// translator-local numbering) was placed at. Mutates `bytecode` in place:
/// assigns compact ids to the instructions at those positions (at most one
/// label per instruction, matching whichever original label got there first),
/// appends the terminal end label, and rewrites every `Jmp`/`CJmp` operand to
/// point at the compacted ids.
pub fn compact(bytecode: &mut Bytecode, label_positions: &[usize]) {
    let stream_len = bytecode.instructions.len();
    let mut remap: Vec<Option<u32>> = vec![None; label_positions.len()];

    for (i, &pos) in label_positions.iter().enumerate() {
        if pos < stream_len {
            if bytecode.instructions[pos].label.is_none() {
                let compact_id = bytecode.label_locations.len() as u32;
                bytecode.label_locations.insert(compact_id, pos);
                bytecode.instructions[pos].label = Some(compact_id);
            }
            remap[i] = bytecode.instructions[pos].label;
        }
    }

    let end_label = bytecode.label_locations.len() as u32;
    bytecode.label_locations.insert(end_label, stream_len);

    for slot in remap.iter_mut() {
        if slot.is_none() {
            *slot = Some(end_label);
        }
    }

    for ins in &mut bytecode.instructions {
        match ins.op {
            Op::Jmp => ins.a1 = remap[ins.a1 as usize].unwrap() as i64,
            Op::CJmp => {
                ins.a2 = remap[ins.a2 as usize].unwrap() as i64;
                ins.a3 = remap[ins.a3 as usize].unwrap() as i64;
            }
            _ => {}
        }
    }
}
