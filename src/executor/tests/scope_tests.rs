//! Tests for scope tables and command resolution

use std::rc::Rc;

use super::helpers::eval_in;
use crate::executor::command::Builtin;
use crate::executor::scope::Scope;
use crate::executor::stdlib::new_root_scope;
use crate::executor::types::{EvalResult, Val};

fn answer(_args: &[Val], _scope: &Rc<Scope>) -> EvalResult {
    EvalResult::ok(Val::Int(42))
}

#[test]
fn test_child_scope_writes_through() {
    let root = Scope::new_root_scope();
    let child = root.new_child_scope();
    assert!(!child.is_local());

    assert!(!child.set_named_variable("v", Val::from("1")).is_error());
    assert_eq!(root.get_value("v"), Some(Val::from("1")));

    child.register_named_command("cmd", Rc::new(Builtin::new("cmd", "cmd", answer)));
    assert!(root.has_local_command("cmd"));
}

#[test]
fn test_local_scope_is_opaque() {
    let root = Scope::new_root_scope();
    assert!(!root.set_named_variable("outer", Val::Int(1)).is_error());
    let local = root.new_local_scope();
    assert!(local.is_local());

    assert!(!local.set_named_variable("inner", Val::Int(2)).is_error());
    assert!(!root.has_value("inner"));
    // Lookups still fall back to the parent chain
    assert_eq!(local.get_value("outer"), Some(Val::Int(1)));

    // Shadowing a parent variable binds a new one in the local namespace
    assert!(!local.set_named_variable("outer", Val::Int(3)).is_error());
    assert_eq!(root.get_value("outer"), Some(Val::Int(1)));
    assert_eq!(local.get_value("outer"), Some(Val::Int(3)));
}

#[test]
fn test_locals_shadow_and_are_write_once() {
    let root = Scope::new_root_scope();
    assert!(!root.set_named_variable("x", Val::Int(1)).is_error());
    let child = root.new_child_scope();
    assert!(!child.set_named_local("x", Val::Int(2)).is_error());

    assert_eq!(child.get_value("x"), Some(Val::Int(2)));
    assert_eq!(
        child.set_named_local("x", Val::Int(3)).message().as_deref(),
        Some("cannot redefine local \"x\"")
    );
    assert_eq!(
        child.unset_named_variable("x").message().as_deref(),
        Some("cannot unset local \"x\"")
    );
}

#[test]
fn test_local_commands_shadow_parent() {
    let root = new_root_scope();
    let local = root.new_local_scope();
    local.register_named_command("idem", Rc::new(Builtin::new("idem", "idem", answer)));

    assert_eq!(eval_in(&local, "idem x"), EvalResult::ok(Val::Int(42)));
    assert_eq!(eval_in(&root, "idem x"), EvalResult::ok("x"));
    assert_eq!(local.get_local_commands(), vec!["idem".to_string()]);
}

#[test]
fn test_resolve_command() {
    let root = new_root_scope();
    assert!(root.resolve_command(&Val::from("idem")).is_ok());
    assert!(root.resolve_command(&Val::Int(3)).is_ok());
    assert!(root.resolve_command(&Val::from("2.5")).is_ok());

    let missing = root.resolve_command(&Val::from("nope"));
    assert_eq!(
        missing.err().and_then(|error| error.message()).as_deref(),
        Some("cannot resolve command \"nope\"")
    );
    let structured = root.resolve_command(&Val::list(vec![]));
    assert_eq!(
        structured.err().and_then(|error| error.message()).as_deref(),
        Some("invalid command name")
    );
}

#[test]
fn test_numbers_as_commands() {
    let root = new_root_scope();
    assert_eq!(eval_in(&root, "1 + 2 * 3"), EvalResult::ok(Val::Int(7)));
    assert_eq!(eval_in(&root, "[idem 4] > 3"), EvalResult::ok(Val::Bool(true)));
}

#[test]
fn test_dropping_the_root_releases_its_callables() {
    let scope = new_root_scope();
    let source = "closure f {} {idem 1}
        set g [closure {} {idem 2}]
        namespace ns {closure h {} {idem 3}}
        idem ([f] [[$g]] [ns h])";
    assert_eq!(
        eval_in(&scope, source),
        EvalResult::ok(Val::tuple(vec![Val::from("1"), Val::from("2"), Val::from("3")]))
    );
    let weak = Rc::downgrade(&scope);
    drop(scope);
    assert!(weak.upgrade().is_none());
}

#[test]
fn test_dropping_the_root_releases_suspended_coroutines() {
    let scope = new_root_scope();
    assert_eq!(
        eval_in(&scope, "set co [coroutine {yield 1; idem 2}]; $co wait"),
        EvalResult::ok("1")
    );
    let weak = Rc::downgrade(&scope);
    drop(scope);
    assert!(weak.upgrade().is_none());
}

#[test]
fn test_orphaned_scope_resolves_from_the_root() {
    let root = new_root_scope();
    assert!(!root.set_named_variable("top", Val::Int(1)).is_error());
    let local = root.new_local_scope();
    assert!(!local.set_named_variable("middle", Val::Int(2)).is_error());
    let child = local.new_child_scope();
    assert_eq!(child.get_value("middle"), Some(Val::Int(2)));

    drop(local);
    assert_eq!(child.get_value("middle"), None);
    assert_eq!(child.get_value("top"), Some(Val::Int(1)));
    assert_eq!(eval_in(&child, "idem ok"), EvalResult::ok("ok"));
}

#[test]
fn test_max_depth_lives_on_the_root() {
    let root = Scope::new_root_scope();
    let local = root.new_local_scope().new_child_scope();
    local.set_max_depth(7);
    assert_eq!(root.max_depth(), 7);
    assert_eq!(root.prepare_process(root.compile_script(&Default::default())).depth(), 1);
    local.set_max_depth(0);
    assert_eq!(root.max_depth(), 1);
}

#[test]
fn test_execute_script_rejects_top_level_yield() {
    let root = new_root_scope();
    let script = crate::parser::parse("yield x").expect("parse failed");
    let value = Val::script(script, Some("yield x"));
    let Val::Script(script) = value else {
        panic!("expected a script value");
    };
    assert_eq!(
        root.execute_script(&script).message().as_deref(),
        Some("unexpected yield")
    );
}
