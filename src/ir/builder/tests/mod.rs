//! CodegenContext unit tests: layout, operands, and cell allocation.


use super::*;
use crate::error::CompileError;
use crate::ir::{Cell, Instruction};

use Instruction::*;

fn parse(source: &str) -> Program {
    crate::parse_source_silent(source, "test.clerk").unwrap_or_else(|errs| {
        panic!(
            "parse failed: {:?}",
            errs.iter().map(|e| &e.message).collect::<Vec<_>>()
        )
    })
}

pub(super) fn build(source: &str) -> CompileResult<Vec<Instruction>> {
    let program = parse(source);
    let builtins = Builtins::standard();
    CodegenContext::new(&program, &builtins).build()
}

pub(super) fn build_ok(source: &str) -> Vec<Instruction> {
    build(source).unwrap_or_else(|e| panic!("build failed: {}", e))
}

pub(super) fn d(a: Address) -> Cell {
    Cell::Direct(a)
}

pub(super) fn count(ops: &[Instruction], wanted: Instruction) -> usize {
    ops.iter().filter(|op| **op == wanted).count()
}

// ── Control flow ──

#[test]
fn test_if_swapped_branches_layout() {
    let ops = build_ok(
        "main = do { a <- read; b <- read; if gt a b then write a else write b; main }\n",
    );
    assert_eq!(
        ops,
        vec![
            Label(0),
            Input,
            CopyTo(d(0)),
            Input,
            CopyTo(d(1)),
            // gt a b computes b - a
            CopyFrom(d(0)),
            CopyTo(d(2)),
            CopyFrom(d(1)),
            Sub(d(2)),
            JumpIfNegative(1),
            // else falls through
            CopyFrom(d(1)),
            Output,
            Jump(2),
            Label(1),
            CopyFrom(d(0)),
            Output,
            Label(2),
            Jump(0),
        ]
    );
}

#[test]
fn test_if_without_else() {
    let ops = build_ok("main = do { a <- read; if eq a 0 then write a; main }\n");
    // eq against zero needs no scratch cell
    assert_eq!(
        ops,
        vec![
            Label(0),
            Input,
            CopyTo(d(0)),
            CopyFrom(d(0)),
            JumpIfZero(1),
            Jump(2),
            Label(1),
            CopyFrom(d(0)),
            Output,
            Label(2),
            Jump(0),
        ]
    );
}

#[test]
fn test_guard_without_swap_jumps_to_next() {
    let ops = build_ok(
        "pick x\n    | neq x 0 = write x\n\nmain = do { a <- read; pick a; main }\n",
    );
    assert_eq!(
        ops,
        vec![
            Label(0),
            Input,
            CopyTo(d(0)),
            CopyFrom(d(0)),
            CopyTo(d(1)),
            Label(1),
            CopyFrom(d(1)),
            JumpIfZero(3),
            CopyFrom(d(1)),
            Output,
            Jump(2),
            Label(3),
            Label(2),
            Jump(0),
        ]
    );
}

#[test]
fn test_guard_with_swap_jumps_into_body() {
    let ops = build_ok(
        "small x\n    | lt x 5 = write x\n    | ge x 5 = nop\n\nmain = do { a <- read; small a }\n",
    );
    let first_jump = ops
        .iter()
        .position(|op| matches!(op, JumpIfNegative(_)))
        .unwrap();
    let JumpIfNegative(body) = ops[first_jump] else {
        unreachable!()
    };
    assert!(matches!(ops[first_jump + 1], Jump(_)));
    assert_eq!(ops[first_jump + 2], Label(body));
    assert_eq!(count(&ops, Output), 1);
}

#[test]
fn test_condition_must_be_comparison() {
    let err = build("main = do { a <- read; if a then write a else nop }\n").unwrap_err();
    assert!(matches!(err, CompileError::NotACondition { .. }));
}

#[test]
fn test_function_ending_in_comparison_is_a_condition() {
    let ops = build_ok(
        "positive x = gt x 0\n\nmain = do { a <- read; if positive a then write a; main }\n",
    );
    assert_eq!(count(&ops, Output), 1);
    assert!(ops.iter().any(|op| matches!(op, JumpIfNegative(_))));
}

// ── Builtins ──

#[test]
fn test_add_literal_bumps_scratch_copy() {
    let ops = build_ok("main = do { x <- read; y <- add x 4; write y }\n");
    assert_eq!(
        ops,
        vec![
            Label(0),
            Input,
            CopyTo(d(0)),
            CopyFrom(d(0)),
            CopyTo(d(1)),
            Increment(d(1)),
            Increment(d(1)),
            Increment(d(1)),
            Increment(d(1)),
            CopyTo(d(1)),
            CopyFrom(d(1)),
            Output,
        ]
    );
}

#[test]
fn test_add_zero_is_a_plain_load() {
    let ops = build_ok("main = do { x <- read; write (add 0 x) }\n");
    assert_eq!(count(&ops, Increment(d(1))), 0);
    assert_eq!(ops[3], CopyFrom(d(0)));
}

#[test]
fn test_sub_negative_literal_counts_up() {
    let ops = build_ok("main = do { x <- read; write (sub x -2) }\n");
    assert_eq!(count(&ops, Increment(d(1))), 2);
    assert_eq!(count(&ops, Decrement(d(1))), 0);
}

#[test]
fn test_literal_minus_cell() {
    let ops = build_ok("main = do { x <- read; y <- sub 3 x; write y }\n");
    assert_eq!(
        &ops[3..11],
        &[
            CopyFrom(d(0)),
            CopyTo(d(1)),
            Sub(d(1)),
            CopyTo(d(1)),
            Increment(d(1)),
            Increment(d(1)),
            Increment(d(1)),
            Sub(d(0)),
        ]
    );
}

#[test]
fn test_two_literals_rejected() {
    let err = build("main = write (add 3 4)\n").unwrap_err();
    assert!(
        matches!(err, CompileError::TwoLiterals { ref name, left: 3, right: 4, .. } if name == "add")
    );
}

#[test]
fn test_builtin_arity() {
    let err = build("main = do { x <- read; write (add x) }\n").unwrap_err();
    assert!(matches!(
        err,
        CompileError::Arity {
            expected: 2,
            found: 1,
            ..
        }
    ));
    let err = build("main = do { x <- read; write (add x x x) }\n").unwrap_err();
    assert!(matches!(
        err,
        CompileError::Arity {
            expected: 2,
            found: 3,
            ..
        }
    ));
}

#[test]
fn test_write_literal_rejected() {
    let err = build("main = write 7\n").unwrap_err();
    assert!(matches!(err, CompileError::LiteralOperand { value: 7, .. }));
}

#[test]
fn test_addr_variable_is_indirect() {
    let ops = build_ok("main = do { p <- read; write (addr p) }\n");
    assert!(ops.contains(&CopyFrom(Cell::Indirect(0))));
}

#[test]
fn test_addr_negative_literal_rejected() {
    let err = build("main = write (addr -1)\n").unwrap_err();
    assert!(matches!(err, CompileError::InvalidAddress { value: -1, .. }));
}

#[test]
fn test_unresolved_name() {
    let err = build("main = frobnicate\n").unwrap_err();
    assert!(matches!(err, CompileError::UnresolvedName { ref name, .. } if name == "frobnicate"));
}

// ── Cell allocation ──

#[test]
fn test_addr_literal_cells_are_reserved() {
    let ops = build_ok("main = do { a <- read; write (addr 0); write a }\n");
    assert_eq!(ops[2], CopyTo(d(1)));
    assert!(!ops[3..].contains(&CopyTo(d(0))));
}

#[test]
fn test_callee_cells_never_overlap_live_caller_cells() {
    let ops = build_ok(
        "twice v = do { w <- add v v; write w }\n\nmain = do { a <- read; b <- read; twice a; write b; main }\n",
    );
    // a and b live in 0 and 1; nothing after their reads may overwrite them
    let writes: Vec<Cell> = ops[5..]
        .iter()
        .filter_map(|op| match op {
            CopyTo(c) => Some(*c),
            _ => None,
        })
        .collect();
    assert!(!writes.is_empty());
    assert!(!writes.contains(&d(0)));
    assert!(!writes.contains(&d(1)));
    // `write b` still reads the caller's cell
    let tail = &ops[ops.len() - 3..];
    assert_eq!(tail, &[CopyFrom(d(1)), Output, Jump(0)]);
}

#[test]
fn test_first_cell_and_reserved_cells() {
    let program = parse("main = do { a <- read; b <- read; write b }\n");
    let builtins = Builtins::standard();
    let ops = CodegenContext::new(&program, &builtins)
        .with_first_cell(4)
        .with_reserved_cells([5])
        .build()
        .unwrap();
    assert_eq!(ops[2], CopyTo(d(4)));
    assert_eq!(ops[4], CopyTo(d(6)));
}

#[test]
fn test_literal_parameter_occupies_no_cell() {
    let ops = build_ok(
        "plus x k = add x k\n\nmain = do { a <- read; b <- plus a 2; write b; main }\n",
    );
    assert_eq!(count(&ops, Increment(d(2))), 2);
    assert_eq!(count(&ops, Output), 1);
}

#[test]
fn test_custom_entry() {
    let program = parse("start = do { a <- read; write a; start }\n");
    let builtins = Builtins::standard();
    let ops = CodegenContext::new(&program, &builtins)
        .with_entry("start")
        .build()
        .unwrap();
    assert_eq!(ops.last(), Some(&Jump(0)));

    let err = CodegenContext::new(&program, &builtins).build().unwrap_err();
    assert!(matches!(err, CompileError::UnresolvedName { ref name, .. } if name == "main"));
}

#[test]
fn test_builtins_can_be_removed() {
    let program = parse("main = do { a <- read; write a }\n");
    let builtins = Builtins::standard().without("write");
    let err = CodegenContext::new(&program, &builtins).build().unwrap_err();
    assert!(matches!(err, CompileError::UnresolvedName { ref name, .. } if name == "write"));
}

#[test]
fn test_duplicate_function_rejected() {
    use crate::span::{Span, Spanned};
    let def = |start| FunctionDef {
        name: Spanned::new("main".to_string(), Span::new(start, start + 4)),
        params: Vec::new(),
        body: Spanned::dummy(Expr::Call(Call::new(
            Spanned::dummy("nop".to_string()),
            Vec::new(),
        ))),
    };
    let program = Program {
        functions: vec![def(0), def(20)],
    };
    let builtins = Builtins::standard();
    let err = CodegenContext::new(&program, &builtins).build().unwrap_err();
    assert_eq!(
        err,
        CompileError::DuplicateFunction {
            name: "main".to_string(),
            span: Span::new(20, 24),
        }
    );
}

#[test]
fn test_live_cells_stay_disjoint() {
    // every assignment checks its cell against all visible names
    for source in [
        "twice v = do { w <- add v v; write w }\n\nmain = do { a <- read; b <- read; twice a; twice b; main }\n",
        "main = do { a <- read; if gt a 0 then do { b <- read; write b } else do { c <- read; write c }; d <- read; write d }\n",
        "f x = do { y <- sub x 1; g y; z <- read; write z }\n\ng p = do { q <- add p 2; write q }\n\nmain = do { a <- read; f a; main }\n",
    ] {
        build_ok(source);
    }
}

#[test]
fn test_shared_cell_is_an_internal_error() {
    let program = parse("main = nop\n");
    let builtins = Builtins::standard();
    let mut ctx = CodegenContext::new(&program, &builtins);
    ctx.frame.bind("a", Operand::Cell(0));
    ctx.push_frame();
    ctx.frame.bind("b", Operand::Cell(1));
    assert!(ctx.check_live_cells().is_ok());
    ctx.frame.bind("c", Operand::Cell(0));
    assert!(matches!(
        ctx.check_live_cells(),
        Err(CompileError::Internal(_))
    ));
}

// ── Scoping ──

#[test]
fn test_branch_bindings_do_not_leak_into_sibling() {
    // `eq` lays out `else` first, `neq` lays out `then` first
    for cmp in ["eq", "neq"] {
        let source = format!(
            "main = do {{ a <- read; if {} a 0 then do {{ y <- read; nop }} else write y }}\n",
            cmp
        );
        let err = build(&source).unwrap_err();
        assert!(
            matches!(err, CompileError::UnresolvedName { ref name, .. } if name == "y"),
            "{}: {:?}",
            cmp,
            err
        );
    }
}

#[test]
fn test_branch_bindings_do_not_leak_past_if() {
    let err = build("main = do { a <- read; if neq a 0 then do { y <- read; nop }; write y }\n")
        .unwrap_err();
    assert!(matches!(err, CompileError::UnresolvedName { ref name, .. } if name == "y"));
}

#[test]
fn test_guard_bindings_do_not_leak_into_next_guard() {
    let err = build(
        "pick x\n    | eq x 0 = do { y <- read; nop }\n    | neq x 0 = write y\n\nmain = do { a <- read; pick a }\n",
    )
    .unwrap_err();
    assert!(matches!(err, CompileError::UnresolvedName { ref name, .. } if name == "y"));
}

#[test]
fn test_sibling_branches_get_distinct_cells() {
    let ops = build_ok(
        "main = do { a <- read; if neq a 0 then do { y <- read; write y } else do { z <- read; write z } }\n",
    );
    assert!(ops.contains(&CopyTo(d(1))));
    assert!(ops.contains(&CopyTo(d(2))));
    assert!(!ops[3..].contains(&CopyTo(d(0))));
}

#[test]
fn test_condition_bindings_stay_visible() {
    let ops = build_ok(
        "main = do { if do { x <- read; gt x 0 } then write x else nop; main }\n",
    );
    assert_eq!(count(&ops, Output), 1);
}

// ── Limits ──

#[test]
fn test_floor_exhausted_at_top_cell() {
    let program = parse("main = do { a <- read; write a }\n");
    let builtins = Builtins::standard();
    let err = CodegenContext::new(&program, &builtins)
        .with_first_cell(Address::MAX)
        .build()
        .unwrap_err();
    assert_eq!(
        err,
        CompileError::FloorExhausted {
            first: Address::MAX
        }
    );

    let err = CodegenContext::new(&program, &builtins)
        .with_first_cell(Address::MAX - 1)
        .with_reserved_cells([Address::MAX - 1, Address::MAX])
        .build()
        .unwrap_err();
    assert!(matches!(err, CompileError::FloorExhausted { .. }));
}

#[test]
fn test_literal_magnitude_is_bounded() {
    let ops = build_ok("main = do { x <- read; write (add x 999) }\n");
    assert_eq!(count(&ops, Increment(d(1))), 999);

    for source in [
        "main = do { x <- read; write (add x 1000) }\n",
        "main = do { x <- read; write (sub x -1000) }\n",
        "main = do { x <- read; write (sub 1000 x) }\n",
        "main = do { x <- read; if lt x 9223372036854775807 then write x }\n",
    ] {
        let err = build(source).unwrap_err();
        assert!(
            matches!(err, CompileError::LiteralOutOfRange { .. }),
            "{}: {:?}",
            source,
            err
        );
    }
}
