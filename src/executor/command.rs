//! Command capability
//!
//! Every command variant (builtins, closures, macros, procedures, coroutines,
//! ensembles, namespaces, scope objects, metacommands) is reached only through
//! this trait; the engine never inspects the concrete type.

use std::rc::Rc;

use super::errors;
use super::scope::Scope;
use super::types::{EvalResult, ResultCode, Val};

/// Options passed to `Command::help`
#[derive(Debug, Clone, Default)]
pub struct HelpOptions {
    /// Prepended to the usage line
    pub prefix: Option<String>,
    /// Number of leading arguments already covered by the prefix
    pub skip: usize,
}

pub trait Command {
    /// Run the command; `args[0]` is the command word itself
    fn execute(&self, args: &[Val], scope: &Rc<Scope>) -> EvalResult;

    /// Called when the engine re-enters this command
    ///
    /// `result` is either the YIELD result of a plain suspension, with the
    /// value supplied by `Process::yield_back`, or the terminal result of a
    /// sub-program the command deferred to.
    fn resume(&self, result: EvalResult, _scope: &Rc<Scope>) -> EvalResult {
        match result.code {
            ResultCode::Yield => EvalResult::ok(result.value),
            _ => result,
        }
    }

    /// Usage line for the command
    fn help(&self, _args: &[Val], _options: &HelpOptions, _scope: &Rc<Scope>) -> EvalResult {
        EvalResult::error("no help available")
    }
}

/// Built-in command handler
pub type BuiltinFn = fn(&[Val], &Rc<Scope>) -> EvalResult;

/// Primitive command backed by a plain function
pub struct Builtin {
    name: &'static str,
    usage: &'static str,
    handler: BuiltinFn,
}

impl Builtin {
    pub fn new(name: &'static str, usage: &'static str, handler: BuiltinFn) -> Self {
        Self {
            name,
            usage,
            handler,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl Command for Builtin {
    fn execute(&self, args: &[Val], scope: &Rc<Scope>) -> EvalResult {
        (self.handler)(args, scope)
    }

    fn help(&self, _args: &[Val], options: &HelpOptions, _scope: &Rc<Scope>) -> EvalResult {
        EvalResult::ok(prefixed_usage(options, self.usage))
    }
}

/// Usage line preceded by the help prefix, if any
pub fn prefixed_usage(options: &HelpOptions, usage: &str) -> String {
    match &options.prefix {
        Some(prefix) => format!("{} {}", prefix, usage),
        None => usage.to_string(),
    }
}

/// Usage error unless `args` has between `min` and `max` items
pub fn check_args(args: &[Val], min: usize, max: Option<usize>, usage: &str) -> Option<EvalResult> {
    let n = args.len();
    if n < min || max.is_some_and(|max| n > max) {
        Some(errors::wrong_args(usage))
    } else {
        None
    }
}
