//! IR diagnostics.
use std::fmt::Write;
use serde::{Serialize, Deserialize};
use crate::ir::Ir;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrStats {
    pub instruction_count: usize,
    pub block_count: usize,
    pub static_node_count: usize,
    pub dynamic_node_count: usize,
}

/// Counts value-producing instructions by their static flag. Instructions
/// without one (`set_prop`, `append_child`, `store`) count toward neither.
pub fn analyze_ir(ir: &Ir) -> IrStats {
    let mut stats = IrStats {
        instruction_count: ir.instruction_count(),
        block_count: ir.blocks.len(),
        ..IrStats::default()
    };
    for instruction in ir.blocks.values().flat_map(|x| x.instructions.iter()) {
        match instruction.op.is_static() {
            Some(true) => stats.static_node_count += 1,
            Some(false) => stats.dynamic_node_count += 1,
            None => {}
        }
    }
    stats
}

/// Human readable listing, one block at a time.
pub fn print_ir(ir: &Ir) -> String {
    let mut out = String::new();
    for block in ir.blocks.values() {
        let entry = if block.id == ir.entry {" (entry)"} else {""};
        let _ = writeln!(out, "block{}{}:", block.id, entry);
        for instruction in &block.instructions {
            let _ = writeln!(out, "  {}", instruction);
        }
    }
    if !ir.aliases.is_empty() {
        let _ = writeln!(out, "aliases:");
        for (alias, target) in &ir.aliases {
            let _ = writeln!(out, "  {} -> {}", alias, target);
        }
    }
    if !ir.duplicates.is_empty() {
        let _ = writeln!(out, "duplicates:");
        for (dest, first) in &ir.duplicates {
            let _ = writeln!(out, "  {} ~ {}", dest, first);
        }
    }
    match &ir.root {
        Some(root) => {
            let _ = writeln!(out, "root: {}", root);
        }
        None => {
            let _ = writeln!(out, "root: none");
        }
    }
    out
}
