//! Collection constructors: list, dict, tuple

use std::collections::HashMap;
use std::rc::Rc;

use super::{add_builtin, describe, into_result, subcommand_list, subcommand_name};
use crate::executor::command::check_args;
use crate::executor::errors;
use crate::executor::scope::Scope;
use crate::executor::types::{EvalResult, Val};

pub fn register(scope: &Scope) {
    add_builtin(scope, "list", LIST_USAGE, list);
    add_builtin(scope, "dict", DICT_USAGE, dict);
    add_builtin(scope, "tuple", TUPLE_USAGE, tuple);
}

const LIST_USAGE: &str = "list values ?subcommand? ?arg ...?";
const DICT_USAGE: &str = "dict entries ?subcommand? ?arg ...?";
const TUPLE_USAGE: &str = "tuple values ?subcommand? ?arg ...?";

fn items(value: &Val) -> Result<Rc<Vec<Val>>, EvalResult> {
    match value {
        Val::List(items) | Val::Tuple(items) => Ok(Rc::clone(items)),
        _ => Err(EvalResult::error(format!("invalid list \"{}\"", describe(value)))),
    }
}

/// `length` / `at index` shared by lists and tuples
fn sequence_op(kind: &str, value: Val, items: &[Val], args: &[Val]) -> EvalResult {
    let Some(subcommand) = args.get(2) else {
        return EvalResult::ok(value);
    };
    let subcommand = match subcommand_name(subcommand) {
        Ok(name) => name,
        Err(error) => return error,
    };
    match (subcommand.as_str(), args.len()) {
        ("subcommands", 3) => subcommand_list(["subcommands", "length", "at"]),
        ("length", 3) => EvalResult::ok(items.len() as i64),
        ("at", 4) => into_result(value.select_index(&args[3]).map_err(EvalResult::error)),
        ("subcommands", _) => errors::wrong_args(&format!("{} value subcommands", kind)),
        ("length", _) => errors::wrong_args(&format!("{} value length", kind)),
        ("at", _) => errors::wrong_args(&format!("{} value at index", kind)),
        _ => errors::unknown_subcommand(&subcommand),
    }
}

fn list(args: &[Val], _scope: &Rc<Scope>) -> EvalResult {
    if let Some(error) = check_args(args, 2, None, LIST_USAGE) {
        return error;
    }
    match items(&args[1]) {
        Ok(items) => sequence_op("list", Val::List(Rc::clone(&items)), &items, args),
        Err(error) => error,
    }
}

fn tuple(args: &[Val], _scope: &Rc<Scope>) -> EvalResult {
    if let Some(error) = check_args(args, 2, None, TUPLE_USAGE) {
        return error;
    }
    match items(&args[1]) {
        Ok(items) => sequence_op("tuple", Val::Tuple(Rc::clone(&items)), &items, args),
        Err(error) => error,
    }
}

fn entries(value: &Val) -> Result<Rc<HashMap<String, Val>>, EvalResult> {
    match value {
        Val::Dict(entries) => Ok(Rc::clone(entries)),
        Val::List(items) | Val::Tuple(items) if items.len() % 2 == 0 => {
            let mut entries = HashMap::with_capacity(items.len() / 2);
            for pair in items.chunks(2) {
                let key = pair[0].as_name().ok_or_else(|| EvalResult::error("invalid key"))?;
                entries.insert(key, pair[1].clone());
            }
            Ok(Rc::new(entries))
        }
        _ => Err(EvalResult::error(format!("invalid dictionary \"{}\"", describe(value)))),
    }
}

fn dict(args: &[Val], _scope: &Rc<Scope>) -> EvalResult {
    if let Some(error) = check_args(args, 2, None, DICT_USAGE) {
        return error;
    }
    let entries = match entries(&args[1]) {
        Ok(entries) => entries,
        Err(error) => return error,
    };
    let value = Val::Dict(Rc::clone(&entries));
    let Some(subcommand) = args.get(2) else {
        return EvalResult::ok(value);
    };
    let subcommand = match subcommand_name(subcommand) {
        Ok(name) => name,
        Err(error) => return error,
    };
    match (subcommand.as_str(), args.len()) {
        ("subcommands", 3) => subcommand_list(["subcommands", "size", "has", "get"]),
        ("size", 3) => EvalResult::ok(entries.len() as i64),
        ("has", 4) => match args[3].as_name() {
            Some(key) => EvalResult::ok(entries.contains_key(&key)),
            None => EvalResult::error("invalid key"),
        },
        ("get", 4) => into_result(value.select_key(&args[3]).map_err(EvalResult::error)),
        ("subcommands", _) => errors::wrong_args("dict value subcommands"),
        ("size", _) => errors::wrong_args("dict value size"),
        ("has", _) => errors::wrong_args("dict value has key"),
        ("get", _) => errors::wrong_args("dict value get key"),
        _ => errors::unknown_subcommand(&subcommand),
    }
}

#[cfg(test)]
mod tests {
    use crate::executor::tests::helpers::{eval, eval_ok};
    use crate::executor::types::Val;

    #[test]
    fn test_list() {
        assert_eq!(eval_ok("list (a b)"), Val::list(vec![Val::from("a"), Val::from("b")]));
        assert_eq!(eval_ok("list (a b) length"), Val::Int(2));
        assert_eq!(eval_ok("list (a b) at 1"), Val::from("b"));
        assert_eq!(eval("list (a b) at 5").message().as_deref(), Some("index out of range \"5\""));
        assert_eq!(eval("list (a) pop").message().as_deref(), Some("unknown subcommand \"pop\""));
    }

    #[test]
    fn test_tuple() {
        assert_eq!(eval_ok("tuple [list (a b)]"), Val::tuple(vec![Val::from("a"), Val::from("b")]));
        assert_eq!(eval_ok("tuple (a b c) length"), Val::Int(3));
    }

    #[test]
    fn test_dict() {
        assert_eq!(eval_ok("dict (a 1 b 2) size"), Val::Int(2));
        assert_eq!(eval_ok("dict (a 1 b 2) get b"), Val::from("2"));
        assert_eq!(eval_ok("dict (a 1) has z"), Val::Bool(false));
        assert_eq!(eval("dict (a)").message().as_deref(), Some("invalid dictionary \"(a)\""));
    }
}
