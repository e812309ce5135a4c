//! Ensembles
//!
//! `ensemble ?name? argspec body` evaluates `body` in a new local scope; the
//! commands it defines become the ensemble's subcommands. The ensemble is
//! registered only when the body completes without error.
//!
//! Invoking the ensemble with exactly its arguments returns them as a tuple;
//! `ens a b sub ...` calls subcommand `sub` with the ensemble arguments in
//! front of its own.

use std::rc::Rc;

use super::{add_builtin, describe, subcommand_list, subcommand_name};
use crate::compiler::Compiler;
use crate::executor::argspec::Argspec;
use crate::executor::command::{prefixed_usage, Command, HelpOptions};
use crate::executor::continuation::{callable_boundary, loop_control_boundary};
use crate::executor::errors;
use crate::executor::scope::Scope;
use crate::executor::types::{EvalResult, ResultCode, Val};

pub fn register(scope: &Scope) {
    add_builtin(scope, "ensemble", "ensemble ?name? argspec body", define_ensemble);
}

pub struct Ensemble {
    scope: Rc<Scope>,
    argspec: Argspec,
}

impl Ensemble {
    fn usage(&self, name: &str) -> String {
        match self.argspec.usage(0) {
            spec if spec.is_empty() => format!("{} ?subcommand? ?arg ...?", name),
            spec => format!("{} {} ?subcommand? ?arg ...?", name, spec),
        }
    }

    fn subcommands(&self) -> EvalResult {
        let mut names = vec!["subcommands".to_string()];
        names.extend(self.scope.get_local_commands());
        subcommand_list(names)
    }

    /// Call local command `name` as `name ?prefix ...? ?arg ...?`
    fn call_local(&self, name: &Val, prefix: &[Val], rest: &[Val]) -> EvalResult {
        let name_text = match subcommand_name(name) {
            Ok(name) => name,
            Err(error) => return error,
        };
        if !self.scope.has_local_command(&name_text) {
            return errors::unknown_subcommand(&name_text);
        }
        let Some(command) = self.scope.resolve_named_command(&name_text) else {
            return errors::unknown_subcommand(&name_text);
        };
        let mut args = Vec::with_capacity(1 + prefix.len() + rest.len());
        args.push(Val::command(command));
        args.extend_from_slice(prefix);
        args.extend_from_slice(rest);
        let program = Rc::new(Compiler::new().compile_args(&args));
        EvalResult::continuation_with(Rc::clone(&self.scope), program, callable_boundary)
    }
}

impl Command for Ensemble {
    fn execute(&self, args: &[Val], _scope: &Rc<Scope>) -> EvalResult {
        let n = self.argspec.nb_required();
        if args.len() < n + 1 {
            let name = args.first().map(describe).unwrap_or_default();
            return errors::wrong_args(&self.usage(&name));
        }
        let ensemble_args = &args[1..=n];
        if args.len() == n + 1 {
            return EvalResult::ok(Val::tuple(ensemble_args.to_vec()));
        }
        match subcommand_name(&args[n + 1]) {
            Ok(name) if name == "subcommands" => {
                if args.len() != n + 2 {
                    return errors::wrong_args(&format!("{} subcommands", describe(&args[0])));
                }
                self.subcommands()
            }
            Ok(_) => self.call_local(&args[n + 1], ensemble_args, &args[n + 2..]),
            Err(error) => error,
        }
    }

    fn help(&self, args: &[Val], options: &HelpOptions, _scope: &Rc<Scope>) -> EvalResult {
        let name = args.first().map(describe).unwrap_or_default();
        EvalResult::ok(prefixed_usage(options, &self.usage(&name)))
    }
}

/* ===================== Metacommand ===================== */

pub struct EnsembleMetacommand {
    ensemble: Rc<Ensemble>,
}

const META_SUBCOMMANDS: [&str; 5] = ["subcommands", "eval", "call", "argspec", "help"];

impl Command for EnsembleMetacommand {
    fn execute(&self, args: &[Val], _scope: &Rc<Scope>) -> EvalResult {
        if args.len() == 1 {
            let ensemble: Rc<dyn Command> = self.ensemble.clone();
            return EvalResult::ok(Val::command(ensemble));
        }
        let subcommand = match subcommand_name(&args[1]) {
            Ok(name) => name,
            Err(error) => return error,
        };
        match (subcommand.as_str(), args.len()) {
            ("subcommands", 2) => subcommand_list(META_SUBCOMMANDS),
            ("argspec", 2) => EvalResult::ok(self.ensemble.argspec.value().clone()),
            ("eval", 3) => match self.ensemble.scope.compile_body(&args[2]) {
                Ok(program) => EvalResult::continuation_with(
                    Rc::clone(&self.ensemble.scope),
                    program,
                    loop_control_boundary,
                ),
                Err(error) => error,
            },
            ("call", n) if n >= 3 => self.ensemble.call_local(&args[2], &[], &args[3..]),
            ("help", n) if n >= 3 => {
                let Ok(name) = subcommand_name(&args[2]) else {
                    return errors::invalid_name("subcommand");
                };
                match self.ensemble.scope.resolve_named_command(&name) {
                    Some(command) if self.ensemble.scope.has_local_command(&name) => {
                        let prefix = match self.ensemble.argspec.usage(0) {
                            spec if spec.is_empty() => "<ensemble>".to_string(),
                            spec => format!("<ensemble> {}", spec),
                        };
                        let options = HelpOptions {
                            prefix: Some(prefix),
                            skip: self.ensemble.argspec.nb_required(),
                        };
                        command.help(&args[2..], &options, &self.ensemble.scope)
                    }
                    _ => errors::unknown_subcommand(&name),
                }
            }
            ("subcommands" | "argspec", _) => {
                errors::wrong_args(&format!("<ensemble> {}", subcommand))
            }
            ("eval", _) => errors::wrong_args("<ensemble> eval body"),
            ("call", _) => errors::wrong_args("<ensemble> call cmdname ?arg ...?"),
            ("help", _) => errors::wrong_args("<ensemble> help subcommand ?arg ...?"),
            _ => errors::unknown_subcommand(&subcommand),
        }
    }

    fn help(&self, _args: &[Val], _options: &HelpOptions, _scope: &Rc<Scope>) -> EvalResult {
        EvalResult::ok("<ensemble> ?subcommand? ?arg ...?")
    }
}

/* ===================== Definition ===================== */

fn define_ensemble(args: &[Val], scope: &Rc<Scope>) -> EvalResult {
    let (name, spec, body) = match args {
        [_, spec, body] => (None, spec, body),
        [_, name, spec, body] => (Some(name.clone()), spec, body),
        _ => return errors::wrong_args("ensemble ?name? argspec body"),
    };
    let argspec = match Argspec::from_value(spec) {
        Ok(argspec) => argspec,
        Err(error) => return error,
    };
    if !argspec.is_fixed() {
        return EvalResult::error("ensemble arguments must be fixed");
    }
    let local = scope.new_local_scope();
    let program = match local.compile_body(body) {
        Ok(program) => program,
        Err(error) => return error,
    };

    let ensemble = Rc::new(Ensemble {
        scope: Rc::clone(&local),
        argspec,
    });
    let defining = Rc::clone(scope);
    EvalResult::continuation_with(local, program, move |result| {
        let result = callable_boundary(result);
        if result.code != ResultCode::Ok {
            return result;
        }
        if let Some(name) = &name {
            let registered = defining.register_command(name, ensemble.clone());
            if registered.code != ResultCode::Ok {
                return registered;
            }
        }
        EvalResult::ok(Val::command(Rc::new(EnsembleMetacommand {
            ensemble: Rc::clone(&ensemble),
        })))
    })
}
