//! Tests for namespaces and scope objects

use super::helpers::{eval, eval_in, eval_ok, prepare};
use crate::executor::stdlib::new_root_scope;
use crate::executor::types::{EvalResult, Val};

#[test]
fn test_namespace_call_and_subcommands() {
    let scope = new_root_scope();
    let source = "namespace ns {
            set greeting hello
            closure greet {name} {idem $greeting,$name}
        }";
    assert!(!eval_in(&scope, source).is_error());

    assert_eq!(eval_in(&scope, "ns greet bob"), EvalResult::ok("hello,bob"));
    assert_eq!(
        eval_in(&scope, "ns subcommands"),
        EvalResult::ok(Val::list(vec![Val::from("subcommands"), Val::from("greet")]))
    );
    assert_eq!(
        eval_in(&scope, "ns missing").message().as_deref(),
        Some("unknown subcommand \"missing\"")
    );
    assert!(!scope.has_value("greeting"));
}

#[test]
fn test_namespace_body_can_yield() {
    let scope = new_root_scope();
    let source = "namespace ns {
            set a 1
            closure ga {} {get a}
            set y [yield x]
            set b ([ga] $y)
        }";
    let mut process = prepare(&scope, source);

    assert_eq!(process.run(), EvalResult::yielded("x"));
    // Registered only once the body completes
    assert!(!scope.has_local_command("ns"));
    assert!(!scope.has_value("a"));

    process.yield_back(Val::from("resumed"));
    assert!(!process.run().is_error());
    assert!(scope.has_local_command("ns"));
    assert_eq!(eval_in(&scope, "ns ga"), EvalResult::ok("1"));
    assert_eq!(
        eval_in(&scope, "[ns] eval {get b}"),
        EvalResult::ok(Val::tuple(vec![Val::from("1"), Val::from("resumed")]))
    );
}

#[test]
fn test_namespace_metacommand() {
    let scope = new_root_scope();
    assert!(!eval_in(&scope, "set meta [namespace {set counter 1; closure inc {} {set counter [$counter + 1]}}]").is_error());

    assert_eq!(eval_in(&scope, "$meta call inc"), EvalResult::ok(Val::Int(2)));
    assert_eq!(eval_in(&scope, "$meta eval {get counter}"), EvalResult::ok(Val::Int(2)));
    assert_eq!(
        eval_in(&scope, "$meta subcommands"),
        EvalResult::ok(Val::list(vec![
            Val::from("subcommands"),
            Val::from("eval"),
            Val::from("call"),
            Val::from("import"),
        ]))
    );
    assert_eq!(eval_in(&scope, "[$meta] inc"), EvalResult::ok(Val::Int(3)));
}

#[test]
fn test_namespace_import() {
    let scope = new_root_scope();
    assert!(!eval_in(&scope, "set meta [namespace {closure hi {} {idem hi}}]").is_error());

    assert_eq!(eval_in(&scope, "$meta import hi; hi"), EvalResult::ok("hi"));
    assert_eq!(eval_in(&scope, "$meta import hi hello; hello"), EvalResult::ok("hi"));
    assert_eq!(
        eval_in(&scope, "$meta import idem").message().as_deref(),
        Some("cannot resolve imported command \"idem\"")
    );
}

#[test]
fn test_namespace_eval_passes_return_through() {
    assert_eq!(eval("set meta [namespace {}]; $meta eval {return out}"), EvalResult::ret("out"));
    assert_eq!(
        eval("set meta [namespace {}]; $meta eval {continue}").message().as_deref(),
        Some("unexpected continue")
    );
}

#[test]
fn test_failed_namespace_body_keeps_partial_definitions() {
    let scope = new_root_scope();
    assert_eq!(
        eval_in(&scope, "namespace ns {closure a {} {}; error boom}").message().as_deref(),
        Some("boom")
    );
    assert!(eval_in(&scope, "ns a").is_error());
}

#[test]
fn test_scope_object() {
    let scope = new_root_scope();
    assert!(!eval_in(&scope, "scope obj {set v 1; closure get_v {} {get v}}").is_error());

    assert_eq!(eval_in(&scope, "obj call get_v"), EvalResult::ok("1"));
    assert_eq!(eval_in(&scope, "obj eval {set v 2}; obj call get_v"), EvalResult::ok("2"));
    assert_eq!(
        eval_in(&scope, "obj subcommands"),
        EvalResult::ok(Val::list(vec![
            Val::from("subcommands"),
            Val::from("eval"),
            Val::from("call"),
        ]))
    );
    assert!(!scope.has_value("v"));
}

#[test]
fn test_scope_object_requires_subcommand() {
    assert_eq!(
        eval("scope obj {}; obj").message().as_deref(),
        Some("wrong # args: should be \"<scope> subcommand ?arg ...?\"")
    );
    assert_eq!(eval_ok("set s [scope {}]; $s eval {idem inside}"), Val::from("inside"));
}
