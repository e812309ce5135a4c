//! Namespaces and scope objects
//!
//! Both own a persistent local scope, isolated from the caller: everything
//! from outside goes through `eval`, `call` or (namespaces only) `import`.
//! The body runs at definition time. Whatever it defined before an error or
//! a suspension stays defined; the command is registered only on success.

use std::rc::Rc;

use super::{add_builtin, describe, subcommand_list, subcommand_name};
use crate::compiler::Compiler;
use crate::executor::command::{check_args, Command, HelpOptions};
use crate::executor::continuation::{callable_boundary, loop_control_boundary};
use crate::executor::errors;
use crate::executor::scope::Scope;
use crate::executor::types::{EvalResult, ResultCode, Val};

pub fn register(scope: &Scope) {
    add_builtin(scope, "namespace", "namespace ?name? body", define_namespace);
    add_builtin(scope, "scope", "scope ?name? body", define_scope);
}

/* ===================== Shared Operations ===================== */

/// `eval body` inside `scope`
fn eval_in(scope: &Rc<Scope>, body: &Val) -> EvalResult {
    match scope.compile_body(body) {
        Ok(program) => EvalResult::continuation_with(Rc::clone(scope), program, loop_control_boundary),
        Err(error) => error,
    }
}

/// `call cmd ?arg ...?` on a command defined inside `scope`
fn call_in(scope: &Rc<Scope>, args: &[Val]) -> EvalResult {
    let name = match subcommand_name(&args[0]) {
        Ok(name) => name,
        Err(error) => return error,
    };
    if !scope.has_local_command(&name) {
        return errors::unknown_subcommand(&name);
    }
    let Some(command) = scope.resolve_named_command(&name) else {
        return errors::unknown_subcommand(&name);
    };
    let mut sentence = Vec::with_capacity(args.len());
    sentence.push(Val::command(command));
    sentence.extend_from_slice(&args[1..]);
    let program = Rc::new(Compiler::new().compile_args(&sentence));
    EvalResult::continuation(Rc::clone(scope), program)
}

fn local_subcommands(base: &[&str], scope: &Scope) -> EvalResult {
    let mut names: Vec<String> = base.iter().map(|name| name.to_string()).collect();
    names.extend(scope.get_local_commands());
    subcommand_list(names)
}

/* ===================== Namespace ===================== */

pub struct Namespace {
    scope: Rc<Scope>,
}

impl Command for Namespace {
    /// `ns ?subcommand? ?arg ...?`; without arguments returns the metacommand
    fn execute(&self, args: &[Val], _scope: &Rc<Scope>) -> EvalResult {
        if args.len() == 1 {
            return EvalResult::ok(Val::command(Rc::new(NamespaceMetacommand {
                scope: Rc::clone(&self.scope),
            })));
        }
        match subcommand_name(&args[1]) {
            Ok(name) if name == "subcommands" => match args.len() {
                2 => local_subcommands(&["subcommands"], &self.scope),
                _ => errors::wrong_args(&format!("{} subcommands", describe(&args[0]))),
            },
            Ok(_) => call_in(&self.scope, &args[1..]),
            Err(error) => error,
        }
    }

    fn help(&self, args: &[Val], _options: &HelpOptions, _scope: &Rc<Scope>) -> EvalResult {
        let name = args.first().map(describe).unwrap_or_default();
        EvalResult::ok(format!("{} ?subcommand? ?arg ...?", name))
    }
}

pub struct NamespaceMetacommand {
    scope: Rc<Scope>,
}

const NAMESPACE_META_SUBCOMMANDS: [&str; 4] = ["subcommands", "eval", "call", "import"];

impl Command for NamespaceMetacommand {
    fn execute(&self, args: &[Val], scope: &Rc<Scope>) -> EvalResult {
        if args.len() == 1 {
            return EvalResult::ok(Val::command(Rc::new(Namespace {
                scope: Rc::clone(&self.scope),
            })));
        }
        let subcommand = match subcommand_name(&args[1]) {
            Ok(name) => name,
            Err(error) => return error,
        };
        match subcommand.as_str() {
            "subcommands" => match check_args(args, 2, Some(2), "<namespace> subcommands") {
                Some(error) => error,
                None => subcommand_list(NAMESPACE_META_SUBCOMMANDS),
            },
            "eval" => match check_args(args, 3, Some(3), "<namespace> eval body") {
                Some(error) => error,
                None => eval_in(&self.scope, &args[2]),
            },
            "call" => match check_args(args, 3, None, "<namespace> call cmdname ?arg ...?") {
                Some(error) => error,
                None => call_in(&self.scope, &args[2..]),
            },
            "import" => match check_args(args, 3, Some(4), "<namespace> import name ?alias?") {
                Some(error) => error,
                None => self.import(scope, &args[2], args.get(3)),
            },
            _ => errors::unknown_subcommand(&subcommand),
        }
    }

    fn help(&self, _args: &[Val], _options: &HelpOptions, _scope: &Rc<Scope>) -> EvalResult {
        EvalResult::ok("<namespace> ?subcommand? ?arg ...?")
    }
}

impl NamespaceMetacommand {
    /// Register namespace command `name` in the calling scope
    fn import(&self, caller: &Rc<Scope>, name: &Val, alias: Option<&Val>) -> EvalResult {
        let Some(text) = name.as_name() else {
            return errors::invalid_name("command");
        };
        let command = match self.scope.resolve_named_command(&text) {
            Some(command) if self.scope.has_local_command(&text) => command,
            _ => return EvalResult::error(format!("cannot resolve imported command \"{}\"", text)),
        };
        caller.register_command(alias.unwrap_or(name), command)
    }
}

fn define_namespace(args: &[Val], scope: &Rc<Scope>) -> EvalResult {
    let (name, body) = match args {
        [_, body] => (None, body),
        [_, name, body] => (Some(name.clone()), body),
        _ => return errors::wrong_args("namespace ?name? body"),
    };
    let local = scope.new_local_scope();
    let program = match local.compile_body(body) {
        Ok(program) => program,
        Err(error) => return error,
    };
    let defining = Rc::clone(scope);
    let namespace_scope = Rc::clone(&local);
    EvalResult::continuation_with(local, program, move |result| {
        let result = callable_boundary(result);
        if result.code != ResultCode::Ok {
            return result;
        }
        if let Some(name) = &name {
            let namespace = Rc::new(Namespace {
                scope: Rc::clone(&namespace_scope),
            });
            let registered = defining.register_command(name, namespace);
            if registered.code != ResultCode::Ok {
                return registered;
            }
        }
        EvalResult::ok(Val::command(Rc::new(NamespaceMetacommand {
            scope: Rc::clone(&namespace_scope),
        })))
    })
}

/* ===================== Scope Object ===================== */

pub struct ScopeObject {
    scope: Rc<Scope>,
}

const SCOPE_SUBCOMMANDS: [&str; 3] = ["subcommands", "eval", "call"];

impl Command for ScopeObject {
    fn execute(&self, args: &[Val], _scope: &Rc<Scope>) -> EvalResult {
        if let Some(error) = check_args(args, 2, None, "<scope> subcommand ?arg ...?") {
            return error;
        }
        let subcommand = match subcommand_name(&args[1]) {
            Ok(name) => name,
            Err(error) => return error,
        };
        match subcommand.as_str() {
            "subcommands" => match check_args(args, 2, Some(2), "<scope> subcommands") {
                Some(error) => error,
                None => subcommand_list(SCOPE_SUBCOMMANDS),
            },
            "eval" => match check_args(args, 3, Some(3), "<scope> eval body") {
                Some(error) => error,
                None => eval_in(&self.scope, &args[2]),
            },
            "call" => match check_args(args, 3, None, "<scope> call cmdname ?arg ...?") {
                Some(error) => error,
                None => call_in(&self.scope, &args[2..]),
            },
            _ => errors::unknown_subcommand(&subcommand),
        }
    }

    fn help(&self, _args: &[Val], _options: &HelpOptions, _scope: &Rc<Scope>) -> EvalResult {
        EvalResult::ok("<scope> subcommand ?arg ...?")
    }
}

fn define_scope(args: &[Val], scope: &Rc<Scope>) -> EvalResult {
    let (name, body) = match args {
        [_, body] => (None, body),
        [_, name, body] => (Some(name.clone()), body),
        _ => return errors::wrong_args("scope ?name? body"),
    };
    let local = scope.new_local_scope();
    let program = match local.compile_body(body) {
        Ok(program) => program,
        Err(error) => return error,
    };
    let object = Rc::new(ScopeObject {
        scope: Rc::clone(&local),
    });
    let defining = Rc::clone(scope);
    EvalResult::continuation_with(local, program, move |result| {
        let result = callable_boundary(result);
        if result.code != ResultCode::Ok {
            return result;
        }
        if let Some(name) = &name {
            let registered = defining.register_command(name, object.clone());
            if registered.code != ResultCode::Ok {
                return registered;
            }
        }
        let command: Rc<dyn Command> = object.clone();
        EvalResult::ok(Val::command(command))
    })
}
