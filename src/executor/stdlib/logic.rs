//! Boolean commands
//!
//! `!`, `&&` and `||` take boolean values or scripts. Scripts are evaluated
//! lazily, one at a time, through continuations: a script that yields
//! suspends the whole chain and no later argument is looked at before it
//! resumes.

use std::rc::Rc;

use super::{add_builtin, describe};
use crate::executor::command::check_args;
use crate::executor::errors;
use crate::executor::scope::Scope;
use crate::executor::types::{EvalResult, ResultCode, Val};

pub fn register(scope: &Scope) {
    add_builtin(scope, "true", "true", true_);
    add_builtin(scope, "false", "false", false_);
    add_builtin(scope, "!", "! arg", not);
    add_builtin(scope, "&&", "&& arg ?arg ...?", and);
    add_builtin(scope, "||", "|| arg ?arg ...?", or);
}

fn true_(args: &[Val], _scope: &Rc<Scope>) -> EvalResult {
    if let Some(error) = check_args(args, 1, Some(1), "true") {
        return error;
    }
    EvalResult::ok(true)
}

fn false_(args: &[Val], _scope: &Rc<Scope>) -> EvalResult {
    if let Some(error) = check_args(args, 1, Some(1), "false") {
        return error;
    }
    EvalResult::ok(false)
}

fn boolean(value: &Val) -> Result<bool, EvalResult> {
    value
        .as_bool()
        .ok_or_else(|| errors::invalid_boolean(&describe(value)))
}

/// Evaluate a boolean argument, then hand the boolean to `next`
///
/// Scripts run as a continuation in `scope`; non-OK codes skip `next`.
pub fn test_condition(
    value: &Val,
    scope: &Rc<Scope>,
    next: impl Fn(bool) -> EvalResult + 'static,
) -> EvalResult {
    test_condition_with(value, scope, next, |result| result)
}

/// Like `test_condition`, with `other` mapping the non-OK results of a script
pub fn test_condition_with(
    value: &Val,
    scope: &Rc<Scope>,
    next: impl Fn(bool) -> EvalResult + 'static,
    other: impl Fn(EvalResult) -> EvalResult + 'static,
) -> EvalResult {
    match value {
        Val::Script(script) => {
            let program = scope.compile_script(&script.script);
            EvalResult::continuation_with(Rc::clone(scope), program, move |result| {
                if result.code != ResultCode::Ok {
                    return other(result);
                }
                match boolean(&result.value) {
                    Ok(b) => next(b),
                    Err(error) => error,
                }
            })
        }
        _ => match boolean(value) {
            Ok(b) => next(b),
            Err(error) => error,
        },
    }
}

fn not(args: &[Val], scope: &Rc<Scope>) -> EvalResult {
    if let Some(error) = check_args(args, 2, Some(2), "! arg") {
        return error;
    }
    test_condition(&args[1], scope, |b| EvalResult::ok(!b))
}

fn and(args: &[Val], scope: &Rc<Scope>) -> EvalResult {
    if let Some(error) = check_args(args, 2, None, "&& arg ?arg ...?") {
        return error;
    }
    short_circuit(Rc::new(args[1..].to_vec()), 0, false, Rc::clone(scope))
}

fn or(args: &[Val], scope: &Rc<Scope>) -> EvalResult {
    if let Some(error) = check_args(args, 2, None, "|| arg ?arg ...?") {
        return error;
    }
    short_circuit(Rc::new(args[1..].to_vec()), 0, true, Rc::clone(scope))
}

/// Walk `operands` from `index`, stopping at the first one equal to `stop`
fn short_circuit(operands: Rc<Vec<Val>>, index: usize, stop: bool, scope: Rc<Scope>) -> EvalResult {
    let Some(operand) = operands.get(index) else {
        return EvalResult::ok(!stop);
    };
    let rest = Rc::clone(&operands);
    let next_scope = Rc::clone(&scope);
    test_condition(operand, &scope, move |b| {
        if b == stop {
            EvalResult::ok(stop)
        } else {
            short_circuit(Rc::clone(&rest), index + 1, stop, Rc::clone(&next_scope))
        }
    })
}

#[cfg(test)]
mod tests {
    use crate::executor::stdlib::new_root_scope;
    use crate::executor::tests::helpers::{eval, eval_ok};
    use crate::executor::types::{EvalResult, Val};

    #[test]
    fn test_not() {
        assert_eq!(eval_ok("! true"), Val::Bool(false));
        assert_eq!(eval_ok("! {false}"), Val::Bool(true));
        assert_eq!(eval("! maybe").message().as_deref(), Some("invalid boolean \"maybe\""));
    }

    #[test]
    fn test_and_or() {
        assert_eq!(eval_ok("&& true {true} true"), Val::Bool(true));
        assert_eq!(eval_ok("&& true {false} {error unreachable}"), Val::Bool(false));
        assert_eq!(eval_ok("|| false {true} {error unreachable}"), Val::Bool(true));
        assert_eq!(eval_ok("|| false {false}"), Val::Bool(false));
    }

    #[test]
    fn test_and_propagates_codes() {
        assert_eq!(eval("&& true {error boom} false").message().as_deref(), Some("boom"));
        assert_eq!(eval("&& {return r}"), EvalResult::ret("r"));
    }

    #[test]
    fn test_and_suspends_before_later_operands() {
        let scope = new_root_scope();
        let script = crate::parser::parse("&& true {yield value; true} {set seen 1; false}")
            .expect("parse failed");
        let mut process = scope.prepare_process(scope.compile_script(&script));

        let result = process.run();
        assert_eq!(result, EvalResult::yielded("value"));
        assert!(!scope.has_value("seen"));

        process.yield_back(Val::Nil);
        assert_eq!(process.run(), EvalResult::ok(false));
        assert!(scope.has_value("seen"));
    }
}
