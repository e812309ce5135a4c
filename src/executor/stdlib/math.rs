//! Arithmetic and comparison commands
//!
//! Prefix forms (`+ 1 2`) are builtins. Numeric words act as commands
//! themselves, taking infix operators: `[1 + 2 * 3]`, `[$n <= 1]`. `*` and `/`
//! bind tighter than `+` and `-`; a comparison takes exactly one operand on
//! each side.

use std::cmp::Ordering;
use std::rc::Rc;

use super::{add_builtin, describe, into_result};
use crate::executor::command::{check_args, Command, HelpOptions};
use crate::executor::errors;
use crate::executor::scope::Scope;
use crate::executor::types::{EvalResult, Val};

pub fn register(scope: &Scope) {
    add_builtin(scope, "+", "+ ?number ...?", add);
    add_builtin(scope, "-", "- number ?number ...?", subtract);
    add_builtin(scope, "*", "* ?number ...?", multiply);
    add_builtin(scope, "/", "/ number number ?number ...?", divide);
    add_builtin(scope, "==", "== value1 value2", eq);
    add_builtin(scope, "!=", "!= value1 value2", ne);
    add_builtin(scope, "<", "< number1 number2", lt);
    add_builtin(scope, "<=", "<= number1 number2", le);
    add_builtin(scope, ">", "> number1 number2", gt);
    add_builtin(scope, ">=", ">= number1 number2", ge);
}

/* ===================== Numbers ===================== */

fn number(value: &Val) -> Result<Val, EvalResult> {
    value
        .as_number()
        .ok_or_else(|| errors::invalid_number(&describe(value)))
}

fn as_f64(value: &Val) -> f64 {
    match value {
        Val::Int(n) => *n as f64,
        Val::Real(n) => *n,
        _ => f64::NAN,
    }
}

/// Binary arithmetic; integers stay integers until they overflow or divide unevenly
fn arith(op: &str, a: &Val, b: &Val) -> Result<Val, EvalResult> {
    if let (Val::Int(x), Val::Int(y)) = (a, b) {
        let exact = match op {
            "+" => x.checked_add(*y),
            "-" => x.checked_sub(*y),
            "*" => x.checked_mul(*y),
            "/" if *y == 0 => return Err(EvalResult::error("division by zero")),
            "/" if x.checked_rem(*y) == Some(0) => x.checked_div(*y),
            "/" => None,
            _ => return Err(EvalResult::error(format!("invalid operator \"{}\"", op))),
        };
        if let Some(n) = exact {
            return Ok(Val::Int(n));
        }
    }
    let (x, y) = (as_f64(a), as_f64(b));
    let n = match op {
        "+" => x + y,
        "-" => x - y,
        "*" => x * y,
        "/" if y == 0.0 => return Err(EvalResult::error("division by zero")),
        "/" => x / y,
        _ => return Err(EvalResult::error(format!("invalid operator \"{}\"", op))),
    };
    Ok(Val::Real(n))
}

fn is_comparison(op: &str) -> bool {
    matches!(op, "==" | "!=" | "<" | "<=" | ">" | ">=")
}

fn compare(op: &str, a: &Val, b: &Val) -> Result<Val, EvalResult> {
    let ordering = match (a.as_number(), b.as_number()) {
        (Some(x), Some(y)) => as_f64(&x).partial_cmp(&as_f64(&y)),
        _ => match op {
            "==" => return Ok(Val::Bool(a == b)),
            "!=" => return Ok(Val::Bool(a != b)),
            _ => {
                let bad = if a.as_number().is_none() { a } else { b };
                return Err(errors::invalid_number(&describe(bad)));
            }
        },
    };
    let result = match (op, ordering) {
        ("==", ordering) => ordering == Some(Ordering::Equal),
        ("!=", ordering) => ordering != Some(Ordering::Equal),
        ("<", Some(ordering)) => ordering == Ordering::Less,
        ("<=", Some(ordering)) => ordering != Ordering::Greater,
        (">", Some(ordering)) => ordering == Ordering::Greater,
        (">=", Some(ordering)) => ordering != Ordering::Less,
        _ => false,
    };
    Ok(Val::Bool(result))
}

/* ===================== Prefix Commands ===================== */

fn fold(op: &str, initial: Val, operands: &[Val]) -> Result<Val, EvalResult> {
    operands
        .iter()
        .try_fold(initial, |acc, value| arith(op, &acc, &number(value)?))
}

fn add(args: &[Val], _scope: &Rc<Scope>) -> EvalResult {
    into_result(fold("+", Val::Int(0), &args[1..]))
}

fn subtract(args: &[Val], _scope: &Rc<Scope>) -> EvalResult {
    if let Some(error) = check_args(args, 2, None, "- number ?number ...?") {
        return error;
    }
    let result = number(&args[1]).and_then(|first| match args.len() {
        2 => arith("-", &Val::Int(0), &first),
        _ => fold("-", first, &args[2..]),
    });
    into_result(result)
}

fn multiply(args: &[Val], _scope: &Rc<Scope>) -> EvalResult {
    into_result(fold("*", Val::Int(1), &args[1..]))
}

fn divide(args: &[Val], _scope: &Rc<Scope>) -> EvalResult {
    if let Some(error) = check_args(args, 3, None, "/ number number ?number ...?") {
        return error;
    }
    into_result(number(&args[1]).and_then(|first| fold("/", first, &args[2..])))
}

fn comparison(op: &'static str, usage: &'static str, args: &[Val]) -> EvalResult {
    if let Some(error) = check_args(args, 3, Some(3), usage) {
        return error;
    }
    into_result(compare(op, &args[1], &args[2]))
}

fn eq(args: &[Val], _scope: &Rc<Scope>) -> EvalResult {
    comparison("==", "== value1 value2", args)
}

fn ne(args: &[Val], _scope: &Rc<Scope>) -> EvalResult {
    comparison("!=", "!= value1 value2", args)
}

fn lt(args: &[Val], _scope: &Rc<Scope>) -> EvalResult {
    comparison("<", "< number1 number2", args)
}

fn le(args: &[Val], _scope: &Rc<Scope>) -> EvalResult {
    comparison("<=", "<= number1 number2", args)
}

fn gt(args: &[Val], _scope: &Rc<Scope>) -> EvalResult {
    comparison(">", "> number1 number2", args)
}

fn ge(args: &[Val], _scope: &Rc<Scope>) -> EvalResult {
    comparison(">=", ">= number1 number2", args)
}

/* ===================== Numeric Command ===================== */

const NUMBER_USAGE: &str = "number ?operator operand ...?";

/// Command resolved for a numeric first word
pub struct NumberCommand {
    value: Val,
}

impl NumberCommand {
    pub fn new(value: Val) -> Self {
        NumberCommand { value }
    }

    fn infix(&self, args: &[Val]) -> Result<Val, EvalResult> {
        if args.len() % 2 == 0 {
            return Err(errors::wrong_args(NUMBER_USAGE));
        }
        let first = number(&self.value)?;
        if args.len() == 1 {
            return Ok(first);
        }

        let operator = |value: &Val| {
            value
                .as_name()
                .ok_or_else(|| EvalResult::error("invalid operator"))
        };

        let op = operator(&args[1])?;
        if is_comparison(&op) {
            if args.len() != 3 {
                return Err(errors::wrong_args(&format!("number {} number", op)));
            }
            return compare(&op, &first, &args[2]);
        }

        // Sum of signed terms; products fold into the last term
        let mut terms: Vec<(String, Val)> = vec![("+".to_string(), first)];
        for pair in args[1..].chunks(2) {
            let op = operator(&pair[0])?;
            let operand = number(&pair[1])?;
            match op.as_str() {
                "+" | "-" => terms.push((op, operand)),
                "*" | "/" => {
                    let (sign, last) = terms.pop().unwrap_or(("+".to_string(), Val::Int(0)));
                    terms.push((sign, arith(&op, &last, &operand)?));
                }
                _ => return Err(EvalResult::error(format!("invalid operator \"{}\"", op))),
            }
        }
        terms
            .iter()
            .try_fold(Val::Int(0), |acc, (sign, term)| arith(sign, &acc, term))
    }
}

impl Command for NumberCommand {
    fn execute(&self, args: &[Val], _scope: &Rc<Scope>) -> EvalResult {
        into_result(self.infix(args))
    }

    fn help(&self, _args: &[Val], _options: &HelpOptions, _scope: &Rc<Scope>) -> EvalResult {
        EvalResult::ok(NUMBER_USAGE)
    }
}
