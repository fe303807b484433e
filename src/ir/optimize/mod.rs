/// Peephole optimizer.
///
/// Runs rewrite passes over a finished `Vec<Instruction>` until a full round
/// changes nothing. Every pass either shrinks the sequence or strictly
/// reduces the number of distinct labels, so the loop terminates.
use std::collections::{BTreeMap, BTreeSet};

use super::{Instruction, LabelId};

#[cfg(test)]
mod tests;

/// One rewrite: reports whether it changed anything.
type Pass = fn(Vec<Instruction>) -> (bool, Vec<Instruction>);

const PASSES: &[(&str, Pass)] = &[
    ("redundant copies", eliminate_redundant_copies),
    ("adjacent labels", merge_adjacent_labels),
    ("jump threading", thread_jumps),
    ("unreferenced labels", eliminate_unreferenced_labels),
    ("dead code", eliminate_dead_code),
    ("label remap", remap_labels),
];

/// Apply all passes until no more changes occur.
pub fn optimize(ops: Vec<Instruction>) -> Vec<Instruction> {
    let mut ir = ops;
    let before = ir.len();
    let mut rounds = 0;
    loop {
        rounds += 1;
        let mut changed = false;
        for (name, pass) in PASSES {
            let (pass_changed, next) = pass(ir);
            if pass_changed {
                log::trace!("round {}: {} rewrote the listing", rounds, name);
            }
            changed |= pass_changed;
            ir = next;
        }
        if !changed {
            break;
        }
    }
    log::debug!(
        "optimizer: {} -> {} instructions in {} round(s)",
        before,
        ir.len(),
        rounds
    );
    ir
}

/// Drop a `CopyFrom`/`CopyTo` of the cell the previous copy just touched:
/// the accumulator and the cell already hold the same value.
fn eliminate_redundant_copies(ops: Vec<Instruction>) -> (bool, Vec<Instruction>) {
    let before = ops.len();
    let mut out: Vec<Instruction> = Vec::with_capacity(ops.len());
    for op in ops {
        if let (Some(cell), Some(prev)) = (op.copy_operand(), out.last()) {
            if prev.copy_operand() == Some(cell) {
                continue;
            }
        }
        out.push(op);
    }
    (out.len() != before, out)
}

/// Collapse runs of consecutive labels into the first one of each run.
fn merge_adjacent_labels(ops: Vec<Instruction>) -> (bool, Vec<Instruction>) {
    let mut alias: BTreeMap<LabelId, LabelId> = BTreeMap::new();
    let mut out: Vec<Instruction> = Vec::with_capacity(ops.len());
    for op in ops {
        if let Some(label) = op.declared_label() {
            if let Some(first) = out.last().and_then(Instruction::declared_label) {
                alias.insert(label, first);
                continue;
            }
        }
        out.push(op);
    }
    if alias.is_empty() {
        return (false, out);
    }
    let out: Vec<Instruction> = out
        .into_iter()
        .map(|op| match op.jump_target().and_then(|t| alias.get(&t)) {
            Some(first) => op.with_label(*first),
            None => op,
        })
        .collect();
    (true, out)
}

/// Redirect jumps to `L` when `L:` is immediately followed by `jump M`.
fn thread_jumps(ops: Vec<Instruction>) -> (bool, Vec<Instruction>) {
    let mut forward: BTreeMap<LabelId, LabelId> = BTreeMap::new();
    for pair in ops.windows(2) {
        if let (Instruction::Label(from), Instruction::Jump(to)) = (pair[0], pair[1]) {
            if from != to {
                forward.insert(from, to);
            }
        }
    }
    if forward.is_empty() {
        return (false, ops);
    }

    let mut changed = false;
    let out: Vec<Instruction> = ops
        .into_iter()
        .map(|op| {
            let Some(target) = op.jump_target() else {
                return op;
            };
            match resolve_forward(&forward, target) {
                Some(dest) if dest != target => {
                    changed = true;
                    op.with_label(dest)
                }
                _ => op,
            }
        })
        .collect();
    (changed, out)
}

/// Follow a chain of forwarded labels. `None` if the chain loops.
fn resolve_forward(forward: &BTreeMap<LabelId, LabelId>, start: LabelId) -> Option<LabelId> {
    let mut seen = BTreeSet::new();
    let mut current = start;
    while let Some(next) = forward.get(&current) {
        if !seen.insert(current) {
            return None;
        }
        current = *next;
    }
    Some(current)
}

fn eliminate_unreferenced_labels(ops: Vec<Instruction>) -> (bool, Vec<Instruction>) {
    let referenced: BTreeSet<LabelId> = ops.iter().filter_map(Instruction::jump_target).collect();
    let before = ops.len();
    let out: Vec<Instruction> = ops
        .into_iter()
        .filter(|op| match op.declared_label() {
            Some(label) => referenced.contains(&label),
            None => true,
        })
        .collect();
    (out.len() != before, out)
}

/// Nothing between an unconditional jump and the next label can run.
fn eliminate_dead_code(ops: Vec<Instruction>) -> (bool, Vec<Instruction>) {
    let before = ops.len();
    let mut out: Vec<Instruction> = Vec::with_capacity(ops.len());
    let mut unreachable = false;
    for op in ops {
        if op.declared_label().is_some() {
            unreachable = false;
        }
        if unreachable {
            continue;
        }
        if matches!(op, Instruction::Jump(_)) {
            unreachable = true;
        }
        out.push(op);
    }
    (out.len() != before, out)
}

/// Renumber labels densely from 0 in order of first appearance.
fn remap_labels(ops: Vec<Instruction>) -> (bool, Vec<Instruction>) {
    let mut mapping: BTreeMap<LabelId, LabelId> = BTreeMap::new();
    for op in &ops {
        if let Some(label) = op.declared_label().or_else(|| op.jump_target()) {
            let next = mapping.len() as LabelId;
            mapping.entry(label).or_insert(next);
        }
    }
    if mapping.iter().all(|(from, to)| from == to) {
        return (false, ops);
    }
    let out: Vec<Instruction> = ops
        .into_iter()
        .map(|op| {
            match op
                .declared_label()
                .or_else(|| op.jump_target())
                .and_then(|l| mapping.get(&l))
            {
                Some(to) => op.with_label(*to),
                None => op,
            }
        })
        .collect();
    (true, out)
}
