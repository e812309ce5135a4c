//! Canonical error results
//!
//! Script-level failures are ERROR results carrying a message. Commands build
//! them here so the wording stays uniform across the catalogue.

use super::types::{EvalResult, ResultCode};

pub fn wrong_args(usage: &str) -> EvalResult {
    EvalResult::error(format!("wrong # args: should be \"{}\"", usage))
}

/// `kind` is one of variable, constant, command, subcommand, argument
pub fn invalid_name(kind: &str) -> EvalResult {
    EvalResult::error(format!("invalid {} name", kind))
}

pub fn unknown_subcommand(name: &str) -> EvalResult {
    EvalResult::error(format!("unknown subcommand \"{}\"", name))
}

pub fn unresolved_command(name: &str) -> EvalResult {
    EvalResult::error(format!("cannot resolve command \"{}\"", name))
}

pub fn no_such_variable(name: &str) -> EvalResult {
    EvalResult::error(format!("can't read \"{}\": no such variable", name))
}

pub fn invalid_boolean(text: &str) -> EvalResult {
    EvalResult::error(format!("invalid boolean \"{}\"", text))
}

pub fn invalid_number(text: &str) -> EvalResult {
    EvalResult::error(format!("invalid number \"{}\"", text))
}

/// Control code surfacing where it has no meaning
pub fn unexpected(code: ResultCode) -> EvalResult {
    EvalResult::error(format!("unexpected {}", code))
}

pub fn body_not_script() -> EvalResult {
    EvalResult::error("body must be a script or tuple")
}

/// Command invoked after the namespace it was defined in went away
pub fn scope_dropped() -> EvalResult {
    EvalResult::error("defining scope no longer exists")
}

pub fn value_has_no_text(type_name: &str) -> EvalResult {
    EvalResult::error(format!("value of type {} has no string representation", type_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            wrong_args("idem value").message().as_deref(),
            Some("wrong # args: should be \"idem value\"")
        );
        assert_eq!(unexpected(ResultCode::Break).message().as_deref(), Some("unexpected break"));
        assert_eq!(
            no_such_variable("x").message().as_deref(),
            Some("can't read \"x\": no such variable")
        );
    }
}
