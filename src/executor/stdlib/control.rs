//! Control structures: while, if, foreach
//!
//! Loops are chains of continuations: each iteration's callback returns the
//! continuation for the next test or body, so the native stack stays flat no
//! matter how many times a loop runs. BREAK ends a loop with nil, CONTINUE skips to
//! the next iteration; every other non-OK code leaves the loop unchanged. This
//! holds for the `while` test script as well as for loop bodies.

use std::rc::Rc;

use super::add_builtin;
use super::logic::{test_condition, test_condition_with};
use crate::executor::command::check_args;
use crate::executor::errors;
use crate::executor::scope::Scope;
use crate::executor::types::{EvalResult, Program, ResultCode, Val};

pub fn register(scope: &Scope) {
    add_builtin(scope, "while", WHILE_USAGE, while_);
    add_builtin(scope, "if", IF_USAGE, if_);
    add_builtin(scope, "foreach", FOREACH_USAGE, foreach);
}

/* ===================== while ===================== */

const WHILE_USAGE: &str = "while test body";

struct WhileLoop {
    test: Val,
    body: Rc<Program>,
    scope: Rc<Scope>,
}

fn while_(args: &[Val], scope: &Rc<Scope>) -> EvalResult {
    if let Some(error) = check_args(args, 3, Some(3), WHILE_USAGE) {
        return error;
    }
    let body = match scope.compile_body(&args[2]) {
        Ok(body) => body,
        Err(error) => return error,
    };
    let state = Rc::new(WhileLoop {
        test: args[1].clone(),
        body,
        scope: Rc::clone(scope),
    });
    while_test(state, Val::Nil)
}

fn while_test(state: Rc<WhileLoop>, last: Val) -> EvalResult {
    let next = Rc::clone(&state);
    let retest = Rc::clone(&state);
    let last_seen = last.clone();
    test_condition_with(
        &state.test,
        &state.scope,
        move |b| {
            if b {
                while_body(Rc::clone(&next), last.clone())
            } else {
                EvalResult::ok(last.clone())
            }
        },
        move |result| match result.code {
            ResultCode::Break => EvalResult::nil(),
            ResultCode::Continue => while_test(Rc::clone(&retest), last_seen.clone()),
            _ => result,
        },
    )
}

fn while_body(state: Rc<WhileLoop>, last: Val) -> EvalResult {
    let next = Rc::clone(&state);
    EvalResult::continuation_with(
        Rc::clone(&state.scope),
        Rc::clone(&state.body),
        move |result| match result.code {
            ResultCode::Ok => while_test(Rc::clone(&next), result.value),
            ResultCode::Break => EvalResult::nil(),
            ResultCode::Continue => while_test(Rc::clone(&next), last.clone()),
            _ => result,
        },
    )
}

/* ===================== if ===================== */

const IF_USAGE: &str = "if test body ?elseif test body ...? ?else body?";

struct Branch {
    /// `None` for the `else` branch
    test: Option<Val>,
    body: Rc<Program>,
}

fn if_(args: &[Val], scope: &Rc<Scope>) -> EvalResult {
    let branches = match parse_branches(args, scope) {
        Ok(branches) => branches,
        Err(error) => return error,
    };
    if_branch(Rc::new(branches), 0, Rc::clone(scope))
}

fn parse_branches(args: &[Val], scope: &Rc<Scope>) -> Result<Vec<Branch>, EvalResult> {
    if args.len() < 3 {
        return Err(errors::wrong_args(IF_USAGE));
    }
    let mut branches = vec![Branch {
        test: Some(args[1].clone()),
        body: scope.compile_body(&args[2])?,
    }];
    let mut i = 3;
    while i < args.len() {
        let keyword = args[i].as_name().unwrap_or_default();
        match keyword.as_str() {
            "elseif" if i + 2 < args.len() => {
                branches.push(Branch {
                    test: Some(args[i + 1].clone()),
                    body: scope.compile_body(&args[i + 2])?,
                });
                i += 3;
            }
            "else" if i + 2 == args.len() => {
                branches.push(Branch {
                    test: None,
                    body: scope.compile_body(&args[i + 1])?,
                });
                i += 2;
            }
            "elseif" | "else" => return Err(errors::wrong_args(IF_USAGE)),
            _ => {
                return Err(EvalResult::error(format!(
                    "invalid keyword \"{}\"",
                    super::describe(&args[i])
                )))
            }
        }
    }
    Ok(branches)
}

fn if_branch(branches: Rc<Vec<Branch>>, index: usize, scope: Rc<Scope>) -> EvalResult {
    let Some(branch) = branches.get(index) else {
        return EvalResult::nil();
    };
    let Some(test) = &branch.test else {
        return EvalResult::continuation(scope, Rc::clone(&branch.body));
    };
    let body = Rc::clone(&branch.body);
    let rest = Rc::clone(&branches);
    let next_scope = Rc::clone(&scope);
    test_condition(test, &scope, move |b| {
        if b {
            EvalResult::continuation(Rc::clone(&next_scope), Rc::clone(&body))
        } else {
            if_branch(Rc::clone(&rest), index + 1, Rc::clone(&next_scope))
        }
    })
}

/* ===================== foreach ===================== */

const FOREACH_USAGE: &str = "foreach varname list body";

struct ForeachLoop {
    shape: Val,
    items: Rc<Vec<Val>>,
    body: Rc<Program>,
    scope: Rc<Scope>,
}

/// Each iteration binds the loop variables as locals of a fresh child scope
fn foreach(args: &[Val], scope: &Rc<Scope>) -> EvalResult {
    if let Some(error) = check_args(args, 4, Some(4), FOREACH_USAGE) {
        return error;
    }
    let items = match &args[2] {
        Val::List(items) | Val::Tuple(items) => Rc::clone(items),
        other => {
            return EvalResult::error(format!(
                "value of type {} is not iterable",
                other.type_name()
            ))
        }
    };
    let body = match scope.compile_body(&args[3]) {
        Ok(body) => body,
        Err(error) => return error,
    };
    let state = Rc::new(ForeachLoop {
        shape: args[1].clone(),
        items,
        body,
        scope: Rc::clone(scope),
    });
    foreach_step(state, 0, Val::Nil)
}

fn foreach_step(state: Rc<ForeachLoop>, index: usize, last: Val) -> EvalResult {
    let Some(item) = state.items.get(index) else {
        return EvalResult::ok(last);
    };
    let iteration = state.scope.new_child_scope();
    let bound = iteration.destructure(&state.shape, item, "variable", &mut |name, value| {
        iteration.set_named_local(name, value)
    });
    if bound.code != ResultCode::Ok {
        return bound;
    }

    let next = Rc::clone(&state);
    EvalResult::continuation_with(iteration, Rc::clone(&state.body), move |result| match result.code {
        ResultCode::Ok => foreach_step(Rc::clone(&next), index + 1, result.value),
        ResultCode::Break => EvalResult::nil(),
        ResultCode::Continue => foreach_step(Rc::clone(&next), index + 1, last.clone()),
        _ => result,
    })
}

#[cfg(test)]
mod tests {
    use crate::executor::tests::helpers::{eval, eval_ok};
    use crate::executor::types::{EvalResult, Val};

    #[test]
    fn test_while() {
        let source = "set i 0; set acc 0
            while {$i < 5} {set acc [$acc + $i]; set i [$i + 1]}
            idem $acc";
        assert_eq!(eval_ok(source), Val::Int(10));
    }

    #[test]
    fn test_while_break_and_continue() {
        let source = "set i 0; set acc ()
            while true {
                set i [$i + 1]
                if {$i > 4} {break}
                if {$i == 2} {continue}
                set acc ($*acc $i)
            }
            idem $acc";
        assert_eq!(
            eval_ok(source),
            Val::tuple(vec![Val::Int(1), Val::Int(3), Val::Int(4)])
        );
    }

    #[test]
    fn test_while_propagates_return() {
        assert_eq!(eval("while true {return out}"), EvalResult::ret("out"));
    }

    #[test]
    fn test_while_test_script_loop_control() {
        assert_eq!(eval("while {break} {idem x}"), EvalResult::nil());

        let source = "set i 0; set runs 0
            while {set i [$i + 1]; if {$i < 3} {continue}; $i < 5} {set runs [$runs + 1]}
            idem ($i $runs)";
        assert_eq!(eval_ok(source), Val::tuple(vec![Val::Int(5), Val::Int(2)]));
    }

    #[test]
    fn test_if_chain() {
        assert_eq!(eval_ok("if false {idem a} elseif {true} {idem b} else {idem c}"), Val::from("b"));
        assert_eq!(eval_ok("if false {idem a} else {idem c}"), Val::from("c"));
        assert_eq!(eval_ok("if false {idem a}"), Val::Nil);
        assert_eq!(
            eval("if true {idem a} else").message().as_deref(),
            Some("wrong # args: should be \"if test body ?elseif test body ...? ?else body?\"")
        );
        assert_eq!(
            eval("if true {idem a} otherwise {idem b}").message().as_deref(),
            Some("invalid keyword \"otherwise\"")
        );
    }

    #[test]
    fn test_foreach() {
        let source = "set acc 0
            foreach x (1 2 3) {set acc [$acc + $x]}
            idem $acc";
        assert_eq!(eval_ok(source), Val::Int(6));

        let source = "set out ()
            foreach (k v) ((a 1) (b 2)) {set out ($*out $v$k)}
            idem $out";
        assert_eq!(eval_ok(source), Val::tuple(vec![Val::from("1a"), Val::from("2b")]));
    }

    #[test]
    fn test_foreach_variables_do_not_leak() {
        assert_eq!(eval_ok("foreach x (1 2) {idem $x}; exists x"), Val::Bool(false));
        assert_eq!(eval_ok("foreach x (1 2) {set last $x}; idem $last"), Val::from("2"));
    }

    #[test]
    fn test_foreach_break() {
        let source = "foreach x (1 2 3) {if {$x == 2} {break}; idem $x}";
        assert_eq!(eval_ok(source), Val::Nil);
        assert_eq!(eval_ok("set n 0; foreach x (1 2 3) {set n $x; break}; idem $n"), Val::from("1"));
    }
}
