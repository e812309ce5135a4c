//! Coroutines
//!
//! `coroutine body` prepares a process over `body` in a dedicated local scope
//! and returns a command driving it:
//!
//! - `wait`: run until the next yield or the end; a finished coroutine keeps
//!   returning its final result
//! - `yield ?value?`: resume a suspended coroutine with `value`, then as `wait`
//! - `active`, `done`: state queries
//!
//! The coroutine process is run from inside the `wait` call; the enclosing
//! process only sees an ordinary command result.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::debug;

use super::{add_builtin, subcommand_list, subcommand_name};
use crate::executor::command::{check_args, Command, HelpOptions};
use crate::executor::continuation::callable_boundary;
use crate::executor::errors;
use crate::executor::process::Process;
use crate::executor::scope::Scope;
use crate::executor::types::{EvalResult, ResultCode, Val};

pub fn register(scope: &Scope) {
    add_builtin(scope, "coroutine", "coroutine body", define_coroutine);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CoroutineState {
    Inactive,
    Running,
    Suspended,
    Done,
}

pub struct Coroutine {
    state: Cell<CoroutineState>,
    /// Taken out while the coroutine runs
    process: RefCell<Option<Process>>,
    /// Final result, once done
    result: RefCell<Option<EvalResult>>,
}

const SUBCOMMANDS: [&str; 5] = ["subcommands", "wait", "active", "done", "yield"];

impl Coroutine {
    fn new(process: Process) -> Self {
        Coroutine {
            state: Cell::new(CoroutineState::Inactive),
            process: RefCell::new(Some(process)),
            result: RefCell::new(None),
        }
    }

    fn is_active(&self) -> bool {
        self.state.get() == CoroutineState::Suspended
    }

    fn is_done(&self) -> bool {
        self.state.get() == CoroutineState::Done
    }

    /// Advance the coroutine, optionally yielding a value back first
    fn step(&self, yield_back: Option<Val>) -> EvalResult {
        if self.is_done() {
            return self.result.borrow().clone().unwrap_or_else(EvalResult::nil);
        }
        let Some(mut process) = self.process.borrow_mut().take() else {
            return EvalResult::error("coroutine is already running");
        };
        if let Some(value) = yield_back {
            process.yield_back(value);
        }

        self.state.set(CoroutineState::Running);
        let result = process.run();
        if result.code == ResultCode::Yield {
            self.state.set(CoroutineState::Suspended);
            *self.process.borrow_mut() = Some(process);
            debug!("coroutine suspended");
            return EvalResult::ok(result.value);
        }

        let result = callable_boundary(result);
        self.state.set(CoroutineState::Done);
        *self.result.borrow_mut() = Some(result.clone());
        debug!(code = %result.code, "coroutine done");
        result
    }
}

impl Command for Coroutine {
    fn execute(&self, args: &[Val], _scope: &Rc<Scope>) -> EvalResult {
        if let Some(error) = check_args(args, 2, None, "<coroutine> ?subcommand? ?arg ...?") {
            return error;
        }
        let subcommand = match subcommand_name(&args[1]) {
            Ok(name) => name,
            Err(error) => return error,
        };
        let usage = format!("<coroutine> {}", subcommand);
        match subcommand.as_str() {
            "subcommands" => match check_args(args, 2, Some(2), &usage) {
                Some(error) => error,
                None => subcommand_list(SUBCOMMANDS),
            },
            "wait" => match check_args(args, 2, Some(2), &usage) {
                Some(error) => error,
                None => self.step(None),
            },
            "active" => match check_args(args, 2, Some(2), &usage) {
                Some(error) => error,
                None => EvalResult::ok(self.is_active()),
            },
            "done" => match check_args(args, 2, Some(2), &usage) {
                Some(error) => error,
                None => EvalResult::ok(self.is_done()),
            },
            "yield" => {
                if let Some(error) = check_args(args, 2, Some(3), "<coroutine> yield ?value?") {
                    return error;
                }
                if !self.is_active() {
                    return EvalResult::error("coroutine is inactive");
                }
                self.step(Some(args.get(2).cloned().unwrap_or(Val::Nil)))
            }
            _ => errors::unknown_subcommand(&subcommand),
        }
    }

    fn help(&self, _args: &[Val], _options: &HelpOptions, _scope: &Rc<Scope>) -> EvalResult {
        EvalResult::ok("<coroutine> ?subcommand? ?arg ...?")
    }
}

fn define_coroutine(args: &[Val], scope: &Rc<Scope>) -> EvalResult {
    if let Some(error) = check_args(args, 2, Some(2), "coroutine body") {
        return error;
    }
    let program = match scope.compile_body(&args[1]) {
        Ok(program) => program,
        Err(error) => return error,
    };
    let process = scope.new_local_scope().prepare_process(program);
    EvalResult::ok(Val::command(Rc::new(Coroutine::new(process))))
}
