//! Tests for ensembles

use std::rc::Rc;

use super::helpers::{eval, eval_in, prepare};
use crate::executor::scope::Scope;
use crate::executor::stdlib::new_root_scope;
use crate::executor::types::{EvalResult, Val};

const POINT: &str = "ensemble point (x y) {
        closure show {x y} {idem $x,$y}
        closure shift {x y dx} {idem ([+ $x $dx] $y)}
    }";

fn point_scope() -> Rc<Scope> {
    let scope = new_root_scope();
    let defined = eval_in(&scope, POINT);
    assert!(!defined.is_error(), "ensemble definition failed: {:?}", defined);
    scope
}

#[test]
fn test_ensemble_arguments_are_prepended() {
    let scope = point_scope();
    assert_eq!(eval_in(&scope, "point 1 2 show"), EvalResult::ok("1,2"));
    assert_eq!(
        eval_in(&scope, "point 1 2 shift 3"),
        EvalResult::ok(Val::tuple(vec![Val::Int(4), Val::from("2")]))
    );
}

#[test]
fn test_ensemble_without_subcommand_returns_arguments() {
    let scope = point_scope();
    assert_eq!(
        eval_in(&scope, "point 1 2"),
        EvalResult::ok(Val::tuple(vec![Val::from("1"), Val::from("2")]))
    );
    assert_eq!(
        eval_in(&scope, "point 1").message().as_deref(),
        Some("wrong # args: should be \"point x y ?subcommand? ?arg ...?\"")
    );
}

#[test]
fn test_ensemble_subcommands() {
    let scope = point_scope();
    assert_eq!(
        eval_in(&scope, "point 1 2 subcommands"),
        EvalResult::ok(Val::list(vec![
            Val::from("subcommands"),
            Val::from("shift"),
            Val::from("show"),
        ]))
    );
    assert_eq!(
        eval_in(&scope, "point 1 2 idem").message().as_deref(),
        Some("unknown subcommand \"idem\"")
    );
}

#[test]
fn test_ensemble_metacommand() {
    let scope = new_root_scope();
    let source = "set meta [ensemble (a) {set counter 0; closure twice {a b} {idem $b$b}}]";
    assert!(!eval_in(&scope, source).is_error());

    assert_eq!(eval_in(&scope, "$meta argspec"), EvalResult::ok(Val::tuple(vec![Val::from("a")])));
    assert_eq!(eval_in(&scope, "$meta call twice x z"), EvalResult::ok("zz"));
    assert_eq!(eval_in(&scope, "$meta eval {get counter}"), EvalResult::ok("0"));
    assert_eq!(eval_in(&scope, "$meta help twice"), EvalResult::ok("<ensemble> a twice b"));
    assert_eq!(
        eval_in(&scope, "$meta eval {break}").message().as_deref(),
        Some("unexpected break")
    );
    assert_eq!(eval_in(&scope, "[$meta] v twice w"), EvalResult::ok("ww"));
    assert!(!scope.has_value("counter"));
}

#[test]
fn test_ensemble_definition_errors() {
    assert_eq!(
        eval("ensemble e {?a?} {}").message().as_deref(),
        Some("ensemble arguments must be fixed")
    );
    // A failed body leaves the ensemble unregistered
    let scope = new_root_scope();
    assert_eq!(
        eval_in(&scope, "ensemble e () {error boom}").message().as_deref(),
        Some("boom")
    );
    assert_eq!(
        eval_in(&scope, "e").message().as_deref(),
        Some("cannot resolve command \"e\"")
    );
}

#[test]
fn test_ensemble_subcommand_can_yield() {
    let scope = point_scope();
    assert!(!eval_in(&scope, "closure ask {} {yield question}").is_error());
    let mut process = prepare(
        &scope,
        "ensemble q () {closure go {} {idem [ask]!}}; q go",
    );
    assert_eq!(process.run(), EvalResult::yielded("question"));
    process.yield_back(Val::from("answer"));
    assert_eq!(process.run(), EvalResult::ok("answer!"));
}
