//! Scopes
//!
//! A scope holds argument bindings (`locals`) and, when it owns a namespace,
//! constant, variable and command tables. Scopes are shared through `Rc` and
//! link to their parent for lookup only: the parent link is weak, so a scope
//! never keeps its ancestors alive. Owners are the host (root scope), process
//! frames (per-invocation scopes) and the objects built on a persistent scope
//! (coroutines, namespaces, ensembles, scope objects).
//!
//! - **child scope** (transparent): fresh locals, definitions write through to
//!   the nearest ancestor that owns a namespace.
//! - **local scope** (opaque): fresh locals and its own namespace; definitions
//!   stay inside, lookups fall back to the parent chain.
//!
//! A scope whose parent has been dropped resolves straight from the root.
//!
//! Execution is single-threaded, so the tables use `RefCell` without locking.
//! No borrow is ever held across a command invocation.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use super::command::Command;
use super::errors;
use super::process::{Process, DEFAULT_MAX_DEPTH};
use super::stdlib::math::NumberCommand;
use super::types::{EvalResult, Program, QualifiedValue, ResultCode, Script, ScriptValue, Val};
use crate::compiler::Compiler;

pub struct Scope {
    parent: Option<Weak<Scope>>,
    /// `None` on the root itself
    root: Option<Weak<Scope>>,
    local: bool,
    locals: RefCell<HashMap<String, Val>>,
    constants: RefCell<HashMap<String, Val>>,
    variables: RefCell<HashMap<String, Val>>,
    commands: RefCell<HashMap<String, Rc<dyn Command>>>,
    /// Frame limit for processes prepared from this scope tree (read from the
    /// root while it is alive)
    max_depth: Cell<usize>,
}

impl Scope {
    fn with_parent(parent: Option<&Rc<Scope>>, local: bool) -> Rc<Self> {
        let root = parent.map(|parent| match &parent.root {
            Some(root) => Weak::clone(root),
            None => Rc::downgrade(parent),
        });
        Rc::new(Scope {
            parent: parent.map(Rc::downgrade),
            root,
            local,
            locals: RefCell::new(HashMap::new()),
            constants: RefCell::new(HashMap::new()),
            variables: RefCell::new(HashMap::new()),
            commands: RefCell::new(HashMap::new()),
            max_depth: Cell::new(parent.map_or(DEFAULT_MAX_DEPTH, |parent| parent.max_depth())),
        })
    }

    /// Empty root scope, without builtins
    pub fn new_root_scope() -> Rc<Self> {
        Self::with_parent(None, true)
    }

    /// Transparent child: shares this scope's namespace
    pub fn new_child_scope(self: &Rc<Self>) -> Rc<Self> {
        Self::with_parent(Some(self), false)
    }

    /// Opaque child: own namespace, lookups fall back to this scope
    pub fn new_local_scope(self: &Rc<Self>) -> Rc<Self> {
        Self::with_parent(Some(self), true)
    }

    pub fn is_local(&self) -> bool {
        self.local
    }

    /// Next scope in the lookup chain: the parent, or the root once the
    /// parent is gone
    pub fn parent(&self) -> Option<Rc<Scope>> {
        let parent = self.parent.as_ref()?;
        parent.upgrade().or_else(|| self.root())
    }

    fn root(&self) -> Option<Rc<Scope>> {
        self.root.as_ref().and_then(Weak::upgrade)
    }

    /// Set the frame limit for every process prepared in this scope tree
    pub fn set_max_depth(&self, max_depth: usize) {
        let max_depth = max_depth.max(1);
        match self.root() {
            Some(root) => root.max_depth.set(max_depth),
            None => self.max_depth.set(max_depth),
        }
    }

    pub fn max_depth(&self) -> usize {
        match self.root() {
            Some(root) => root.max_depth.get(),
            None => self.max_depth.get(),
        }
    }

    /// First match of `find` along the lookup chain, starting here
    fn find_up<T>(&self, find: impl Fn(&Scope) -> Option<T>) -> Option<T> {
        if let Some(found) = find(self) {
            return Some(found);
        }
        let mut next = self.parent();
        while let Some(scope) = next {
            if let Some(found) = find(&scope) {
                return Some(found);
            }
            next = scope.parent();
        }
        None
    }

    /// Nearest ancestor owning the namespace that receives definitions made
    /// here; `None` when this scope owns it
    fn namespace_owner(&self) -> Option<Rc<Scope>> {
        if self.local {
            return None;
        }
        let mut next = self.parent();
        while let Some(scope) = next {
            if scope.local {
                return Some(scope);
            }
            next = scope.parent();
        }
        None
    }

    /// Locals visible before reaching the namespace owner
    fn has_local(&self, name: &str) -> bool {
        self.find_up(|scope| {
            if scope.locals.borrow().contains_key(name) {
                Some(true)
            } else if scope.local {
                Some(false)
            } else {
                None
            }
        })
        .unwrap_or(false)
    }
}

/// Scope captured by a command defined in it
///
/// Scopes that own a namespace are captured weakly: the command may be stored
/// in that very namespace. Transparent scopes only carry argument bindings and
/// are kept alive by the commands that captured them.
#[derive(Clone)]
pub enum CapturedScope {
    Owned(Rc<Scope>),
    Namespace(Weak<Scope>),
}

impl CapturedScope {
    pub fn new(scope: &Rc<Scope>) -> Self {
        if scope.is_local() {
            CapturedScope::Namespace(Rc::downgrade(scope))
        } else {
            CapturedScope::Owned(Rc::clone(scope))
        }
    }

    /// The scope, unless it has been dropped
    pub fn get(&self) -> Result<Rc<Scope>, EvalResult> {
        match self {
            CapturedScope::Owned(scope) => Ok(Rc::clone(scope)),
            CapturedScope::Namespace(scope) => scope.upgrade().ok_or_else(errors::scope_dropped),
        }
    }
}

/* ===================== Values ===================== */

impl Scope {
    /// Look a name up through locals, constants and variables up the chain
    pub fn get_value(&self, name: &str) -> Option<Val> {
        self.find_up(|scope| {
            if let Some(value) = scope.locals.borrow().get(name) {
                return Some(value.clone());
            }
            if !scope.local {
                return None;
            }
            if let Some(value) = scope.constants.borrow().get(name) {
                return Some(value.clone());
            }
            scope.variables.borrow().get(name).cloned()
        })
    }

    pub fn has_value(&self, name: &str) -> bool {
        self.get_value(name).is_some()
    }

    /// Bind an argument in this scope only
    pub fn set_named_local(&self, name: &str, value: Val) -> EvalResult {
        let mut locals = self.locals.borrow_mut();
        if locals.contains_key(name) {
            return EvalResult::error(format!("cannot redefine local \"{}\"", name));
        }
        locals.insert(name.to_string(), value.clone());
        EvalResult::ok(value)
    }

    /// Write-once binding in the namespace
    pub fn set_named_constant(&self, name: &str, value: Val) -> EvalResult {
        if self.has_local(name) {
            return EvalResult::error(format!("cannot redefine local \"{}\"", name));
        }
        let owner = self.namespace_owner();
        let namespace = owner.as_deref().unwrap_or(self);
        if namespace.constants.borrow().contains_key(name) {
            return EvalResult::error(format!("cannot redefine constant \"{}\"", name));
        }
        if namespace.variables.borrow().contains_key(name) {
            return EvalResult::error(format!(
                "cannot define constant \"{}\": variable already exists",
                name
            ));
        }
        namespace
            .constants
            .borrow_mut()
            .insert(name.to_string(), value.clone());
        EvalResult::ok(value)
    }

    /// Rebindable binding in the namespace
    pub fn set_named_variable(&self, name: &str, value: Val) -> EvalResult {
        if self.has_local(name) {
            return EvalResult::error(format!("cannot redefine local \"{}\"", name));
        }
        let owner = self.namespace_owner();
        let namespace = owner.as_deref().unwrap_or(self);
        if namespace.constants.borrow().contains_key(name) {
            return EvalResult::error(format!("cannot redefine constant \"{}\"", name));
        }
        namespace
            .variables
            .borrow_mut()
            .insert(name.to_string(), value.clone());
        EvalResult::ok(value)
    }

    pub fn unset_named_variable(&self, name: &str) -> EvalResult {
        if self.has_local(name) {
            return EvalResult::error(format!("cannot unset local \"{}\"", name));
        }
        let owner = self.namespace_owner();
        let namespace = owner.as_deref().unwrap_or(self);
        if namespace.constants.borrow().contains_key(name) {
            return EvalResult::error(format!("cannot unset constant \"{}\"", name));
        }
        let removed = namespace.variables.borrow_mut().remove(name);
        match removed {
            Some(_) => EvalResult::nil(),
            None => EvalResult::error(format!("cannot unset \"{}\": no such variable", name)),
        }
    }

    /// `let`: name or tuple shape
    pub fn set_constant(&self, shape: &Val, value: &Val) -> EvalResult {
        let result = self.destructure(shape, value, "constant", &mut |name, v| {
            self.set_named_constant(name, v)
        });
        on_ok(result, value)
    }

    /// `set`: name or tuple shape
    pub fn set_variable(&self, shape: &Val, value: &Val) -> EvalResult {
        let result = self.destructure(shape, value, "variable", &mut |name, v| {
            self.set_named_variable(name, v)
        });
        on_ok(result, value)
    }

    /// Bind every name of `shape` to the matching part of `value`
    ///
    /// The whole shape is checked before anything is bound, so a mismatch
    /// leaves no partial bindings behind.
    pub fn destructure(
        &self,
        shape: &Val,
        value: &Val,
        kind: &str,
        bind: &mut dyn FnMut(&str, Val) -> EvalResult,
    ) -> EvalResult {
        if let Some(error) = check_shape(shape, value, kind) {
            return error;
        }
        bind_shape(shape, value, bind)
    }

    /// Resolve a variable reference: name, tuple of names or qualified value
    pub fn resolve_value(&self, reference: &Val) -> EvalResult {
        match reference {
            Val::Tuple(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items.iter() {
                    let result = self.resolve_value(item);
                    if result.code != ResultCode::Ok {
                        return result;
                    }
                    values.push(result.value);
                }
                EvalResult::ok(Val::tuple(values))
            }
            Val::Qualified(qualified) => self.resolve_qualified(qualified),
            _ => match reference.as_name() {
                Some(name) => match self.get_value(&name) {
                    Some(value) => EvalResult::ok(value),
                    None => errors::no_such_variable(&name),
                },
                None => errors::invalid_name("variable"),
            },
        }
    }

    /// Resolve the source name, then apply the selector chain
    pub fn resolve_qualified(&self, qualified: &QualifiedValue) -> EvalResult {
        let source = self.resolve_value(&qualified.source);
        if source.code != ResultCode::Ok {
            return source;
        }
        let mut value = source.value;
        for selector in &qualified.selectors {
            match selector.apply(&value) {
                Ok(selected) => value = selected,
                Err(message) => return EvalResult::error(message),
            }
        }
        EvalResult::ok(value)
    }
}

fn on_ok(result: EvalResult, value: &Val) -> EvalResult {
    match result.code {
        ResultCode::Ok => EvalResult::ok(value.clone()),
        _ => result,
    }
}

fn check_shape(shape: &Val, value: &Val, kind: &str) -> Option<EvalResult> {
    match shape {
        Val::Tuple(names) => {
            let Some(items) = value.as_items() else {
                return Some(EvalResult::error("bad value shape"));
            };
            if items.len() != names.len() {
                return Some(EvalResult::error("bad value shape"));
            }
            names
                .iter()
                .zip(items)
                .find_map(|(name, item)| check_shape(name, item, kind))
        }
        _ => match shape.as_name() {
            Some(_) => None,
            None => Some(errors::invalid_name(kind)),
        },
    }
}

fn bind_shape(shape: &Val, value: &Val, bind: &mut dyn FnMut(&str, Val) -> EvalResult) -> EvalResult {
    if let (Val::Tuple(names), Some(items)) = (shape, value.as_items()) {
        for (name, item) in names.iter().zip(items) {
            let result = bind_shape(name, item, bind);
            if result.code != ResultCode::Ok {
                return result;
            }
        }
        return EvalResult::ok(value.clone());
    }
    match shape.as_name() {
        Some(name) => bind(&name, value.clone()),
        None => errors::invalid_name("variable"),
    }
}

/* ===================== Commands ===================== */

impl Scope {
    pub fn register_named_command(&self, name: &str, command: Rc<dyn Command>) {
        let owner = self.namespace_owner();
        owner
            .as_deref()
            .unwrap_or(self)
            .commands
            .borrow_mut()
            .insert(name.to_string(), command);
    }

    /// Register under a name value; fails on structured names
    pub fn register_command(&self, name: &Val, command: Rc<dyn Command>) -> EvalResult {
        match name.as_name() {
            Some(name) => {
                self.register_named_command(&name, command);
                EvalResult::nil()
            }
            None => errors::invalid_name("command"),
        }
    }

    pub fn has_local_command(&self, name: &str) -> bool {
        let owner = self.namespace_owner();
        let namespace = owner.as_deref().unwrap_or(self);
        let found = namespace.commands.borrow().contains_key(name);
        found
    }

    /// Sorted names of the commands defined in this scope's namespace
    pub fn get_local_commands(&self) -> Vec<String> {
        let owner = self.namespace_owner();
        let namespace = owner.as_deref().unwrap_or(self);
        let mut names: Vec<String> = namespace.commands.borrow().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn resolve_named_command(&self, name: &str) -> Option<Rc<dyn Command>> {
        self.find_up(|scope| match scope.local {
            true => scope.commands.borrow().get(name).cloned(),
            false => None,
        })
    }

    /// Resolve the first word of a sentence
    ///
    /// Command values resolve to themselves, names go through the scope chain,
    /// and numbers fall back to the numeric command.
    pub fn resolve_command(&self, word: &Val) -> Result<Rc<dyn Command>, EvalResult> {
        match word {
            Val::Command(command) => Ok(Rc::clone(&command.0)),
            Val::Int(_) | Val::Real(_) => Ok(Rc::new(NumberCommand::new(word.clone()))),
            _ => {
                let Some(name) = word.as_name() else {
                    return Err(errors::invalid_name("command"));
                };
                if let Some(command) = self.resolve_named_command(&name) {
                    return Ok(command);
                }
                match word.as_number() {
                    Some(number) => Ok(Rc::new(NumberCommand::new(number))),
                    None => Err(errors::unresolved_command(&name)),
                }
            }
        }
    }
}

/* ===================== Processes ===================== */

impl Scope {
    pub fn compile_script(&self, script: &Script) -> Rc<Program> {
        Rc::new(Compiler::new().compile_script(script))
    }

    /// Compile a command body: script or tuple
    pub fn compile_body(&self, body: &Val) -> Result<Rc<Program>, EvalResult> {
        match body {
            Val::Script(script) => Ok(self.compile_script(&script.script)),
            Val::Tuple(items) => Ok(Rc::new(Compiler::new().compile_tuple(items))),
            _ => Err(errors::body_not_script()),
        }
    }

    pub fn prepare_script_value(self: &Rc<Self>, script: &ScriptValue) -> Process {
        self.prepare_process(self.compile_script(&script.script))
    }

    pub fn prepare_process(self: &Rc<Self>, program: Rc<Program>) -> Process {
        Process::new(program, Rc::clone(self)).with_max_depth(self.max_depth())
    }

    /// Run a script to completion; a top-level YIELD is an error
    pub fn execute_script(self: &Rc<Self>, script: &ScriptValue) -> EvalResult {
        let mut process = self.prepare_script_value(script);
        let result = process.run();
        match result.code {
            ResultCode::Yield => errors::unexpected(ResultCode::Yield),
            _ => result,
        }
    }
}
