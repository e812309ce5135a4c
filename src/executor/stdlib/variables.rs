//! Variable and constant commands

use std::rc::Rc;

use super::add_builtin;
use crate::executor::command::check_args;
use crate::executor::errors;
use crate::executor::scope::Scope;
use crate::executor::types::{EvalResult, ResultCode, Val};

pub fn register(scope: &Scope) {
    add_builtin(scope, "let", "let constname value", let_);
    add_builtin(scope, "set", "set varname value", set);
    add_builtin(scope, "get", "get varname ?default?", get);
    add_builtin(scope, "unset", "unset varname", unset);
    add_builtin(scope, "exists", "exists varname", exists);
}

fn let_(args: &[Val], scope: &Rc<Scope>) -> EvalResult {
    if let Some(error) = check_args(args, 3, Some(3), "let constname value") {
        return error;
    }
    scope.set_constant(&args[1], &args[2])
}

fn set(args: &[Val], scope: &Rc<Scope>) -> EvalResult {
    if let Some(error) = check_args(args, 3, Some(3), "set varname value") {
        return error;
    }
    scope.set_variable(&args[1], &args[2])
}

/// Names, tuples of names and qualified names such as `d(key)` are accepted
fn get(args: &[Val], scope: &Rc<Scope>) -> EvalResult {
    if let Some(error) = check_args(args, 2, Some(3), "get varname ?default?") {
        return error;
    }
    let result = scope.resolve_value(&args[1]);
    match (result.code, args.get(2)) {
        (ResultCode::Error, Some(default)) => EvalResult::ok(default.clone()),
        _ => result,
    }
}

fn unset(args: &[Val], scope: &Rc<Scope>) -> EvalResult {
    if let Some(error) = check_args(args, 2, Some(2), "unset varname") {
        return error;
    }
    match args[1].as_name() {
        Some(name) => scope.unset_named_variable(&name),
        None => errors::invalid_name("variable"),
    }
}

fn exists(args: &[Val], scope: &Rc<Scope>) -> EvalResult {
    if let Some(error) = check_args(args, 2, Some(2), "exists varname") {
        return error;
    }
    let result = scope.resolve_value(&args[1]);
    EvalResult::ok(result.code == ResultCode::Ok)
}

#[cfg(test)]
mod tests {
    use crate::executor::stdlib::new_root_scope;
    use crate::executor::tests::helpers::{eval, eval_in, eval_ok};
    use crate::executor::types::{EvalResult, Val};

    #[test]
    fn test_let_is_write_once() {
        assert_eq!(eval_ok("let x 1; idem $x"), Val::from("1"));
        assert_eq!(
            eval("let x 1; let x 2").message().as_deref(),
            Some("cannot redefine constant \"x\"")
        );
        assert_eq!(
            eval("set x 1; let x 2").message().as_deref(),
            Some("cannot define constant \"x\": variable already exists")
        );
        assert_eq!(
            eval("let x 1; set x 2").message().as_deref(),
            Some("cannot redefine constant \"x\"")
        );
    }

    #[test]
    fn test_set_rebinds() {
        assert_eq!(eval_ok("set x 1; set x 2; get x"), Val::from("2"));
    }

    #[test]
    fn test_destructuring() {
        assert_eq!(eval_ok("let (a (b c)) (1 (2 3)); idem $b$c$a"), Val::from("231"));
        assert_eq!(
            eval("set (a b) (1 2 3)").message().as_deref(),
            Some("bad value shape")
        );
        // Nothing is bound when the shape does not match
        let scope = new_root_scope();
        assert!(eval_in(&scope, "set (a (b c)) (1 2)").is_error());
        assert_eq!(eval_in(&scope, "exists a"), EvalResult::ok(false));
        assert_eq!(
            eval("let ([list ()]) (1)").message().as_deref(),
            Some("invalid constant name")
        );
    }

    #[test]
    fn test_get_and_unset() {
        assert_eq!(
            eval("get nope").message().as_deref(),
            Some("can't read \"nope\": no such variable")
        );
        assert_eq!(eval_ok("get nope fallback"), Val::from("fallback"));
        assert_eq!(eval_ok("set v 1; unset v; exists v"), Val::Bool(false));
        assert_eq!(
            eval("unset v").message().as_deref(),
            Some("cannot unset \"v\": no such variable")
        );
        assert_eq!(
            eval("let c 1; unset c").message().as_deref(),
            Some("cannot unset constant \"c\"")
        );
    }

    #[test]
    fn test_get_qualified() {
        assert_eq!(eval_ok("set d [dict (k v)]; get d(k)"), Val::from("v"));
        assert_eq!(eval_ok("set l [list (a b c)]; idem $l[1]"), Val::from("b"));
        assert_eq!(
            eval("set d [dict (k v)]; get d(x)").message().as_deref(),
            Some("unknown key \"x\"")
        );
    }
}
