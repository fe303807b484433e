use super::*;
use crate::ir::{check_label_closure, Cell};

use Instruction::*;

fn d(a: u32) -> Cell {
    Cell::Direct(a)
}

fn assert_fixed_point(ops: &[Instruction]) {
    let again = optimize(ops.to_vec());
    assert_eq!(again, ops, "second run changed the listing");
    for (name, pass) in PASSES {
        let (changed, _) = pass(ops.to_vec());
        assert!(!changed, "{} still reports a change", name);
    }
}

#[test]
fn drop_copy_back_of_stored_cell() {
    let ops = vec![Input, CopyTo(d(1)), CopyFrom(d(1)), Output];
    let (changed, out) = eliminate_redundant_copies(ops);
    assert!(changed);
    assert_eq!(out, vec![Input, CopyTo(d(1)), Output]);
}

#[test]
fn drop_run_of_copies_to_same_cell() {
    let ops = vec![CopyTo(d(2)), CopyTo(d(2)), CopyFrom(d(2)), CopyTo(d(3))];
    let (_, out) = eliminate_redundant_copies(ops);
    assert_eq!(out, vec![CopyTo(d(2)), CopyTo(d(3))]);
}

#[test]
fn keep_copies_of_other_cells_or_modes() {
    let ops = vec![
        CopyTo(d(2)),
        CopyFrom(Cell::Indirect(2)),
        CopyFrom(d(3)),
        Label(0),
        CopyFrom(d(3)),
        Jump(0),
    ];
    let (changed, out) = eliminate_redundant_copies(ops.clone());
    assert!(!changed);
    assert_eq!(out, ops);
}

#[test]
fn merge_label_run_and_redirect_jumps() {
    let ops = vec![JumpIfZero(2), Label(1), Label(2), Output, Jump(1)];
    let (changed, out) = merge_adjacent_labels(ops);
    assert!(changed);
    assert_eq!(out, vec![JumpIfZero(1), Label(1), Output, Jump(1)]);
}

#[test]
fn thread_label_followed_by_jump() {
    let ops = vec![
        Label(0),
        Input,
        JumpIfNegative(1),
        Output,
        Label(1),
        Jump(0),
    ];
    let (changed, out) = thread_jumps(ops);
    assert!(changed);
    assert_eq!(out[2], JumpIfNegative(0));
}

#[test]
fn thread_follows_chains() {
    let ops = vec![Jump(0), Label(0), Jump(1), Label(1), Jump(2), Label(2), Output];
    let (_, out) = thread_jumps(ops);
    assert_eq!(out[0], Jump(2));
    assert_eq!(out[2], Jump(2));
}

#[test]
fn thread_leaves_cycles_alone() {
    let ops = vec![Label(0), Jump(1), Label(1), Jump(0)];
    let (changed, out) = thread_jumps(ops.clone());
    assert!(!changed);
    assert_eq!(out, ops);
    // The full pipeline still terminates on a jump cycle.
    let optimized = optimize(ops);
    assert!(check_label_closure(&optimized, true).is_ok());
}

#[test]
fn remove_unreferenced_labels() {
    let ops = vec![Label(0), Input, Label(1), Output, Jump(1)];
    let (changed, out) = eliminate_unreferenced_labels(ops);
    assert!(changed);
    assert_eq!(out, vec![Input, Label(1), Output, Jump(1)]);
}

#[test]
fn drop_code_after_unconditional_jump() {
    let ops = vec![Label(0), Input, Jump(0), Output, Jump(1), Label(1), Output];
    let (changed, out) = eliminate_dead_code(ops);
    assert!(changed);
    assert_eq!(out, vec![Label(0), Input, Jump(0), Label(1), Output]);
}

#[test]
fn conditional_jump_keeps_fall_through() {
    let ops = vec![JumpIfZero(0), Output, Label(0)];
    let (changed, _) = eliminate_dead_code(ops);
    assert!(!changed);
}

#[test]
fn remap_by_first_appearance() {
    let ops = vec![Label(7), JumpIfZero(3), Output, Jump(7), Label(3), Output];
    let (changed, out) = remap_labels(ops);
    assert!(changed);
    assert_eq!(
        out,
        vec![Label(0), JumpIfZero(1), Output, Jump(0), Label(1), Output]
    );
}

#[test]
fn remap_identity_reports_no_change() {
    let ops = vec![Label(0), JumpIfZero(1), Jump(0), Label(1)];
    let (changed, out) = remap_labels(ops.clone());
    assert!(!changed);
    assert_eq!(out, ops);
}

#[test]
fn optimize_max_program() {
    let raw = vec![
        Label(0),
        Input,
        CopyTo(d(0)),
        Input,
        CopyTo(d(1)),
        CopyFrom(d(0)),
        CopyTo(d(2)),
        CopyFrom(d(1)),
        Sub(d(2)),
        JumpIfNegative(1),
        CopyFrom(d(1)),
        Output,
        Jump(2),
        Label(1),
        CopyFrom(d(0)),
        Output,
        Label(2),
        Jump(0),
    ];
    let out = optimize(raw);
    assert_eq!(
        out,
        vec![
            Label(0),
            Input,
            CopyTo(d(0)),
            Input,
            CopyTo(d(1)),
            CopyFrom(d(0)),
            CopyTo(d(2)),
            CopyFrom(d(1)),
            Sub(d(2)),
            JumpIfNegative(1),
            CopyFrom(d(1)),
            Output,
            Jump(0),
            Label(1),
            CopyFrom(d(0)),
            Output,
            Jump(0),
        ]
    );
    assert_fixed_point(&out);
    assert!(check_label_closure(&out, true).is_ok());
}

#[test]
fn optimize_collapses_guard_exits() {
    // guard chain whose exits all land on the loop back-edge
    let raw = vec![
        Label(0),
        Input,
        CopyTo(d(0)),
        Label(1),
        JumpIfZero(4),
        Jump(3),
        Label(4),
        CopyFrom(d(0)),
        Output,
        Jump(1),
        Jump(2),
        Label(3),
        Label(2),
        Jump(0),
    ];
    let out = optimize(raw);
    assert_eq!(
        out,
        vec![
            Label(0),
            Input,
            CopyTo(d(0)),
            Label(1),
            JumpIfZero(2),
            Jump(0),
            Label(2),
            CopyFrom(d(0)),
            Output,
            Jump(1),
        ]
    );
    assert_fixed_point(&out);
    assert!(check_label_closure(&out, true).is_ok());
}

#[test]
fn optimize_empty_listing() {
    assert!(optimize(Vec::new()).is_empty());
}
