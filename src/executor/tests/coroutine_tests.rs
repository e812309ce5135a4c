//! Tests for coroutines

use super::helpers::{eval, eval_in, eval_ok};
use crate::executor::stdlib::new_root_scope;
use crate::executor::types::{EvalResult, Val};

#[test]
fn test_wait_active_done() {
    let scope = new_root_scope();
    assert!(!eval_in(&scope, "set co [coroutine {yield val1; idem val2}]").is_error());

    assert_eq!(eval_in(&scope, "$co active"), EvalResult::ok(false));
    assert_eq!(eval_in(&scope, "$co wait"), EvalResult::ok("val1"));
    assert_eq!(eval_in(&scope, "$co active"), EvalResult::ok(true));
    assert_eq!(eval_in(&scope, "$co done"), EvalResult::ok(false));

    assert_eq!(eval_in(&scope, "$co wait"), EvalResult::ok("val2"));
    assert_eq!(eval_in(&scope, "$co active"), EvalResult::ok(false));
    assert_eq!(eval_in(&scope, "$co done"), EvalResult::ok(true));

    // Completed coroutines keep returning their final result
    assert_eq!(eval_in(&scope, "$co wait"), EvalResult::ok("val2"));
}

#[test]
fn test_yield_sends_value_back() {
    let source = "set co [coroutine {set x [yield first]; idem got:$x}]
        idem ([$co wait] [$co yield hello])";
    assert_eq!(
        eval_ok(source),
        Val::tuple(vec![Val::from("first"), Val::from("got:hello")])
    );
}

#[test]
fn test_yield_requires_active_coroutine() {
    assert_eq!(
        eval("set co [coroutine {idem x}]; $co yield v").message().as_deref(),
        Some("coroutine is inactive")
    );
}

#[test]
fn test_coroutine_scope_is_isolated() {
    let scope = new_root_scope();
    let result = eval_in(&scope, "set co [coroutine {set inner 1; idem ok}]; $co wait");
    assert_eq!(result, EvalResult::ok("ok"));
    assert!(!scope.has_value("inner"));
}

#[test]
fn test_coroutine_boundary() {
    assert_eq!(eval_ok("set co [coroutine {return early}]; $co wait"), Val::from("early"));
    assert_eq!(
        eval("set co [coroutine {break}]; $co wait").message().as_deref(),
        Some("unexpected break")
    );
    assert_eq!(
        eval("set co [coroutine {error boom}]; $co wait").message().as_deref(),
        Some("boom")
    );
}

#[test]
fn test_coroutine_driven_by_loop() {
    let source = "set co [coroutine {
            set i 0
            while {$i < 3} {set i [$i + 1]; yield $i}
            idem end
        }]
        set out ()
        while {! [$co done]} {set out ($*out [$co wait])}
        idem $out";
    assert_eq!(
        eval_ok(source),
        Val::tuple(vec![Val::Int(1), Val::Int(2), Val::Int(3), Val::from("end")])
    );
}

#[test]
fn test_coroutine_cannot_wait_on_itself() {
    let source = "set co [coroutine {$co wait}]; $co wait";
    assert_eq!(eval(source).message().as_deref(), Some("coroutine is already running"));
}
