//! User-defined callables: closure, proc, macro
//!
//! All three are defined as `<kind> ?name? argspec body`, where body is a
//! script or a `(guard script)` pair. Definition returns a metacommand; a
//! named definition also registers the callable in the defining scope.
//!
//! | kind    | body scope                               |
//! |---------|------------------------------------------|
//! | closure | transparent child of the defining scope  |
//! | proc    | opaque local scope of the defining scope |
//! | macro   | transparent child of the calling scope   |
//!
//! The body result goes through the callable boundary (RETURN becomes OK,
//! BREAK/CONTINUE become errors). On OK the guard, if any, is then invoked with
//! the value in the defining scope; other codes bypass it.
//!
//! A callable defined directly in a namespace holds it weakly (see
//! `CapturedScope`); calling it once that namespace is gone is an error.

use std::rc::Rc;

use super::{add_builtin, subcommand_list, subcommand_name};
use crate::compiler::Compiler;
use crate::executor::argspec::Argspec;
use crate::executor::command::{prefixed_usage, Command, HelpOptions};
use crate::executor::continuation::{callable_boundary, Callback};
use crate::executor::errors;
use crate::executor::scope::{CapturedScope, Scope};
use crate::executor::types::{EvalResult, Program, ResultCode, Val};

pub fn register(scope: &Scope) {
    add_builtin(scope, "closure", "closure ?name? argspec body", define_closure);
    add_builtin(scope, "proc", "proc ?name? argspec body", define_proc);
    add_builtin(scope, "macro", "macro ?name? argspec body", define_macro);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallableKind {
    Closure,
    Proc,
    Macro,
}

impl CallableKind {
    fn keyword(self) -> &'static str {
        match self {
            CallableKind::Closure => "closure",
            CallableKind::Proc => "proc",
            CallableKind::Macro => "macro",
        }
    }
}

/// Compiled body plus optional guard
pub struct Body {
    pub program: Rc<Program>,
    pub guard: Option<Val>,
}

impl Body {
    /// Script, or `(guard script)` pair
    pub fn from_value(value: &Val, scope: &Scope) -> Result<Self, EvalResult> {
        match value {
            Val::Script(script) => Ok(Body {
                program: scope.compile_script(&script.script),
                guard: None,
            }),
            Val::Tuple(items) => match items.as_slice() {
                [guard, Val::Script(script)] => Ok(Body {
                    program: scope.compile_script(&script.script),
                    guard: Some(guard.clone()),
                }),
                _ => Err(EvalResult::error("body must be a script or a (guard script) pair")),
            },
            _ => Err(errors::body_not_script()),
        }
    }
}

/// Map a body result through the boundary, then through the guard
fn apply_guard(result: EvalResult, guard: Option<&Val>, defining_scope: &Rc<Scope>) -> EvalResult {
    match guard {
        Some(guard) => run_guard(callable_boundary(result), guard, defining_scope),
        None => callable_boundary(result),
    }
}

/// The guard runs as a continuation in `defining_scope`, on OK only
fn run_guard(result: EvalResult, guard: &Val, defining_scope: &Rc<Scope>) -> EvalResult {
    match result.code {
        ResultCode::Ok => EvalResult::continuation(
            Rc::clone(defining_scope),
            Rc::new(Compiler::new().compile_pair(guard.clone(), result.value)),
        ),
        _ => result,
    }
}

/* ===================== Callable ===================== */

pub struct Callable {
    kind: CallableKind,
    /// Defining scope
    scope: CapturedScope,
    argspec: Argspec,
    body: Body,
}

impl Callable {
    fn usage(&self, name: &str, options: &HelpOptions) -> String {
        let usage = match self.argspec.usage(options.skip) {
            spec if spec.is_empty() => name.to_string(),
            spec => format!("{} {}", name, spec),
        };
        prefixed_usage(options, &usage)
    }
}

impl Command for Callable {
    fn execute(&self, args: &[Val], scope: &Rc<Scope>) -> EvalResult {
        if !self.argspec.check_arity(args, 1) {
            let name = args.first().map(super::describe).unwrap_or_default();
            return errors::wrong_args(&self.usage(&name, &HelpOptions::default()));
        }

        let defining = match self.scope.get() {
            Ok(defining) => defining,
            Err(error) => return error,
        };
        let local = match self.kind {
            CallableKind::Closure => defining.new_child_scope(),
            CallableKind::Proc => defining.new_local_scope(),
            CallableKind::Macro => scope.new_child_scope(),
        };
        let bound = self
            .argspec
            .apply_arguments(args, 1, &mut |name, value| local.set_named_local(name, value));
        if bound.code != ResultCode::Ok {
            return bound;
        }

        let program = Rc::clone(&self.body.program);
        match self.kind {
            CallableKind::Macro => EvalResult::deferred(local, program),
            CallableKind::Closure | CallableKind::Proc => {
                let guard = self.body.guard.clone().map(|guard| -> Callback {
                    let captured = self.scope.clone();
                    Rc::new(move |result: EvalResult| match captured.get() {
                        Ok(defining) => run_guard(result, &guard, &defining),
                        Err(error) => error,
                    })
                });
                EvalResult::callable_body(local, program, guard)
            }
        }
    }

    /// Macro bodies come back here once their deferred evaluation ends
    fn resume(&self, result: EvalResult, _scope: &Rc<Scope>) -> EvalResult {
        match self.scope.get() {
            Ok(defining) => apply_guard(result, self.body.guard.as_ref(), &defining),
            Err(error) => error,
        }
    }

    fn help(&self, args: &[Val], options: &HelpOptions, _scope: &Rc<Scope>) -> EvalResult {
        let name = args.first().map(super::describe).unwrap_or_default();
        EvalResult::ok(self.usage(&name, options))
    }
}

/* ===================== Metacommand ===================== */

/// Returned by a definition: introspection over the callable
pub struct CallableMetacommand {
    callable: Rc<Callable>,
}

const META_SUBCOMMANDS: [&str; 2] = ["subcommands", "argspec"];

impl Command for CallableMetacommand {
    fn execute(&self, args: &[Val], _scope: &Rc<Scope>) -> EvalResult {
        if args.len() == 1 {
            let callable: Rc<dyn Command> = self.callable.clone();
            return EvalResult::ok(Val::command(callable));
        }
        let subcommand = match subcommand_name(&args[1]) {
            Ok(name) => name,
            Err(error) => return error,
        };
        let usage = format!("<{}> {}", self.callable.kind.keyword(), subcommand);
        match subcommand.as_str() {
            "subcommands" if args.len() == 2 => subcommand_list(META_SUBCOMMANDS),
            "argspec" if args.len() == 2 => EvalResult::ok(self.callable.argspec.value().clone()),
            "subcommands" | "argspec" => errors::wrong_args(&usage),
            _ => errors::unknown_subcommand(&subcommand),
        }
    }

    fn help(&self, _args: &[Val], _options: &HelpOptions, _scope: &Rc<Scope>) -> EvalResult {
        EvalResult::ok(format!("<{}> ?subcommand? ?arg ...?", self.callable.kind.keyword()))
    }
}

/* ===================== Definitions ===================== */

fn define(kind: CallableKind, args: &[Val], scope: &Rc<Scope>) -> EvalResult {
    let (name, spec, body) = match args {
        [_, spec, body] => (None, spec, body),
        [_, name, spec, body] => (Some(name), spec, body),
        _ => return errors::wrong_args(&format!("{} ?name? argspec body", kind.keyword())),
    };
    let argspec = match Argspec::from_value(spec) {
        Ok(argspec) => argspec,
        Err(error) => return error,
    };
    let body = match Body::from_value(body, scope) {
        Ok(body) => body,
        Err(error) => return error,
    };

    let callable = Rc::new(Callable {
        kind,
        scope: CapturedScope::new(scope),
        argspec,
        body,
    });
    if let Some(name) = name {
        let registered = scope.register_command(name, callable.clone());
        if registered.code != ResultCode::Ok {
            return registered;
        }
    }
    EvalResult::ok(Val::command(Rc::new(CallableMetacommand { callable })))
}

fn define_closure(args: &[Val], scope: &Rc<Scope>) -> EvalResult {
    define(CallableKind::Closure, args, scope)
}

fn define_proc(args: &[Val], scope: &Rc<Scope>) -> EvalResult {
    define(CallableKind::Proc, args, scope)
}

fn define_macro(args: &[Val], scope: &Rc<Scope>) -> EvalResult {
    define(CallableKind::Macro, args, scope)
}
