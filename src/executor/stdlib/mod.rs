//! Built-in command catalogue
//!
//! Commands are organized by category, one module each. `new_root_scope()`
//! builds a root scope with every builtin registered.

pub mod basic;
pub mod callables;
pub mod collections;
pub mod control;
pub mod coroutine;
pub mod ensemble;
pub mod logic;
pub mod math;
pub mod namespace;
pub mod variables;

use std::rc::Rc;

use super::command::{Builtin, BuiltinFn};
use super::errors;
use super::scope::Scope;
use super::types::{EvalResult, Val};

/* ===================== Registration ===================== */

/// Root scope with the whole catalogue registered
pub fn new_root_scope() -> Rc<Scope> {
    let scope = Scope::new_root_scope();
    register_builtins(&scope);
    scope
}

pub fn register_builtins(scope: &Scope) {
    basic::register(scope);
    variables::register(scope);
    math::register(scope);
    logic::register(scope);
    control::register(scope);
    callables::register(scope);
    coroutine::register(scope);
    ensemble::register(scope);
    namespace::register(scope);
    collections::register(scope);
}

fn add_builtin(scope: &Scope, name: &'static str, usage: &'static str, handler: BuiltinFn) {
    scope.register_named_command(name, Rc::new(Builtin::new(name, usage, handler)));
}

/* ===================== Shared Helpers ===================== */

/// Collapse a fallible value computation into a result
fn into_result(value: Result<Val, EvalResult>) -> EvalResult {
    match value {
        Ok(value) => EvalResult::ok(value),
        Err(error) => error,
    }
}

fn subcommand_name(value: &Val) -> Result<String, EvalResult> {
    value.as_name().ok_or_else(|| errors::invalid_name("subcommand"))
}

/// `subcommands` result: list of names
fn subcommand_list<S: AsRef<str>>(names: impl IntoIterator<Item = S>) -> EvalResult {
    EvalResult::ok(Val::list(
        names.into_iter().map(|name| Val::from(name.as_ref())).collect(),
    ))
}

/// Text used in messages about a value
fn describe(value: &Val) -> String {
    value.to_text().unwrap_or_else(|| value.to_string())
}
