//! Core commands: values, control codes, evaluation and help

use std::rc::Rc;

use super::add_builtin;
use crate::executor::command::{check_args, HelpOptions};
use crate::executor::scope::Scope;
use crate::executor::types::{EvalResult, Val};

pub fn register(scope: &Scope) {
    add_builtin(scope, "idem", "idem value", idem);
    add_builtin(scope, "return", "return ?value?", return_);
    add_builtin(scope, "tailcall", "tailcall body", tailcall);
    add_builtin(scope, "yield", "yield ?value?", yield_);
    add_builtin(scope, "error", "error message", error);
    add_builtin(scope, "break", "break", break_);
    add_builtin(scope, "continue", "continue", continue_);
    add_builtin(scope, "eval", "eval body", eval);
    add_builtin(scope, "help", "help command ?arg ...?", help);
}

fn idem(args: &[Val], _scope: &Rc<Scope>) -> EvalResult {
    if let Some(error) = check_args(args, 2, Some(2), "idem value") {
        return error;
    }
    EvalResult::ok(args[1].clone())
}

fn return_(args: &[Val], _scope: &Rc<Scope>) -> EvalResult {
    if let Some(error) = check_args(args, 1, Some(2), "return ?value?") {
        return error;
    }
    EvalResult::ret(args.get(1).cloned().unwrap_or(Val::Nil))
}

/// Evaluate `body` in place of the enclosing callable body
fn tailcall(args: &[Val], scope: &Rc<Scope>) -> EvalResult {
    if let Some(error) = check_args(args, 2, Some(2), "tailcall body") {
        return error;
    }
    let program = match scope.compile_body(&args[1]) {
        Ok(program) => program,
        Err(error) => return error,
    };
    EvalResult::tail_call(Rc::clone(scope), program)
}

/// Suspend; the value supplied on resumption becomes the result
fn yield_(args: &[Val], _scope: &Rc<Scope>) -> EvalResult {
    if let Some(error) = check_args(args, 1, Some(2), "yield ?value?") {
        return error;
    }
    EvalResult::yielded(args.get(1).cloned().unwrap_or(Val::Nil))
}

fn error(args: &[Val], _scope: &Rc<Scope>) -> EvalResult {
    if let Some(error) = check_args(args, 2, Some(2), "error message") {
        return error;
    }
    match args[1].to_text() {
        Some(message) => EvalResult::error(message),
        None => EvalResult::error("invalid message"),
    }
}

fn break_(args: &[Val], _scope: &Rc<Scope>) -> EvalResult {
    if let Some(error) = check_args(args, 1, Some(1), "break") {
        return error;
    }
    EvalResult::brk()
}

fn continue_(args: &[Val], _scope: &Rc<Scope>) -> EvalResult {
    if let Some(error) = check_args(args, 1, Some(1), "continue") {
        return error;
    }
    EvalResult::cont()
}

/// Evaluate `body` in the current scope; its result is passed through as is
fn eval(args: &[Val], scope: &Rc<Scope>) -> EvalResult {
    if let Some(error) = check_args(args, 2, Some(2), "eval body") {
        return error;
    }
    match scope.compile_body(&args[1]) {
        Ok(program) => EvalResult::continuation(Rc::clone(scope), program),
        Err(error) => error,
    }
}

fn help(args: &[Val], scope: &Rc<Scope>) -> EvalResult {
    if let Some(error) = check_args(args, 2, None, "help command ?arg ...?") {
        return error;
    }
    let command = match scope.resolve_command(&args[1]) {
        Ok(command) => command,
        Err(_) => {
            return EvalResult::error(format!("unknown command \"{}\"", super::describe(&args[1])))
        }
    };
    command.help(&args[1..], &HelpOptions::default(), scope)
}

#[cfg(test)]
mod tests {
    use crate::executor::tests::helpers::{eval, eval_ok};
    use crate::executor::types::{EvalResult, Val};

    #[test]
    fn test_idem_and_arity() {
        assert_eq!(eval_ok("idem value"), Val::from("value"));
        assert_eq!(
            eval("idem").message().as_deref(),
            Some("wrong # args: should be \"idem value\"")
        );
    }

    #[test]
    fn test_return_and_tailcall() {
        assert_eq!(eval("return val; idem unreachable"), EvalResult::ret("val"));
        assert_eq!(eval("tailcall {idem val}; idem unreachable"), EvalResult::ret("val"));
    }

    #[test]
    fn test_error_propagates() {
        let result = eval("error oops; idem unreachable");
        assert_eq!(result.message().as_deref(), Some("oops"));
    }

    #[test]
    fn test_eval_passes_codes_through() {
        assert_eq!(eval_ok("eval {idem a; idem b}"), Val::from("b"));
        assert_eq!(eval("eval {break}"), EvalResult::brk());
        assert_eq!(eval_ok("eval (idem tuple)"), Val::from("tuple"));
    }

    #[test]
    fn test_help() {
        assert_eq!(eval_ok("help idem"), Val::from("idem value"));
        assert_eq!(
            eval("help nosuch").message().as_deref(),
            Some("unknown command \"nosuch\"")
        );
    }
}
