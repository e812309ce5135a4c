//! Program stepping
//!
//! This module contains `execute()`, which runs the opcodes of one compiled
//! program against one scope. It never recurses into nested programs: when a
//! command hands back a continuation, a deferred value or a YIELD, `execute()`
//! records where it stopped in `ProgramState` and returns. The process
//! trampoline decides what runs next and calls back in to resume.
//!
//! ## Function Organization
//! 1. execute() - Drives one program until it ends or a command result is not final
//! 2. step_opcode() - Applies a single opcode to the frame stack

use std::rc::Rc;

use super::command::Command;
use super::errors;
use super::scope::Scope;
use super::types::{EvalResult, OpCode, Program, ResultCode, Selector, Val};

/* ===================== Program State ===================== */

/// Resumable position inside a program
pub struct ProgramState {
    /// Value stacks, one per open frame
    frames: Vec<Vec<Val>>,
    /// Next opcode
    pc: usize,
    /// Command of the last evaluated sentence, re-entered through `resume`
    command: Option<Rc<dyn Command>>,
    /// Result of the last evaluated sentence
    pub result: EvalResult,
}

impl ProgramState {
    pub fn new() -> Self {
        ProgramState {
            frames: vec![Vec::new()],
            pc: 0,
            command: None,
            result: EvalResult::nil(),
        }
    }

    /// Command the program is currently waiting on, if any
    pub fn command(&self) -> Option<&Rc<dyn Command>> {
        self.command.as_ref()
    }

    /// Nothing left to run once the pending command result is in
    pub fn is_done(&self, program: &Program) -> bool {
        self.pc >= program.opcodes.len() && self.frames.iter().all(Vec::is_empty)
    }

    fn frame(&mut self) -> &mut Vec<Val> {
        if self.frames.is_empty() {
            self.frames.push(Vec::new());
        }
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    fn push(&mut self, value: Val) {
        self.frame().push(value);
    }

    fn pop(&mut self) -> Val {
        self.frame().pop().unwrap_or(Val::Nil)
    }

    fn close_frame(&mut self) -> Vec<Val> {
        if self.frames.len() > 1 {
            self.frames.pop().unwrap_or_default()
        } else {
            std::mem::take(self.frame())
        }
    }
}

impl Default for ProgramState {
    fn default() -> Self {
        Self::new()
    }
}

/* ===================== Public API ===================== */

/// Run `program` from the position stored in `state`
///
/// Returns the program's final result, or the first command result that is
/// not final OK (non-OK code, or OK carrying a continuation). In the latter
/// case `state` is left positioned after the sentence so that the caller can
/// store the eventual command result in `state.result` and call again.
///
/// When `state.result` is a plain YIELD on entry, the pending command is
/// resumed first with that result (whose value was set by the process).
pub fn execute(program: &Program, state: &mut ProgramState, scope: &Rc<Scope>) -> EvalResult {
    if state.result.code == ResultCode::Yield && state.result.data.is_none() {
        let pending = state.result.clone();
        let result = match &state.command {
            Some(command) => command.resume(pending, scope),
            None => EvalResult::ok(pending.value),
        };
        state.result = result.clone();
        if !result.is_final_ok() {
            return result;
        }
    }

    while let Some(opcode) = program.opcodes.get(state.pc) {
        state.pc += 1;
        if let Some(result) = step_opcode(opcode, state, scope) {
            return result;
        }
    }

    match state.frame().pop() {
        Some(value) => EvalResult::ok(value),
        None => EvalResult::ok(state.result.value.clone()),
    }
}

/* ===================== Opcodes ===================== */

/// Apply one opcode; `Some` stops the program with that result
fn step_opcode(opcode: &OpCode, state: &mut ProgramState, scope: &Rc<Scope>) -> Option<EvalResult> {
    match opcode {
        OpCode::PushNil => state.push(Val::Nil),

        OpCode::PushConstant(value) => state.push(value.clone()),

        OpCode::OpenFrame => state.frames.push(Vec::new()),

        OpCode::CloseFrame => {
            let values = state.close_frame();
            state.push(Val::tuple(values));
        }

        OpCode::ResolveValue => {
            let reference = state.pop();
            let result = scope.resolve_value(&reference);
            if result.code != ResultCode::Ok {
                return Some(result);
            }
            state.push(result.value);
        }

        OpCode::ExpandValue => match state.pop() {
            Val::Tuple(items) | Val::List(items) => state.frame().extend(items.iter().cloned()),
            value => state.push(value),
        },

        OpCode::SetSource => {
            let source = state.pop();
            state.push(Val::qualified(source, Vec::new()));
        }

        OpCode::SelectIndex => {
            let index = state.pop();
            let value = state.pop();
            match select(value, Selector::Index(index)) {
                Ok(selected) => state.push(selected),
                Err(message) => return Some(EvalResult::error(message)),
            }
        }

        OpCode::SelectKeys => {
            let keys = match state.pop() {
                Val::Tuple(items) => items.as_ref().clone(),
                key => vec![key],
            };
            let value = state.pop();
            match select(value, Selector::Keys(keys)) {
                Ok(selected) => state.push(selected),
                Err(message) => return Some(EvalResult::error(message)),
            }
        }

        OpCode::EvaluateSentence => {
            let args = state.close_frame();
            if args.is_empty() {
                return None;
            }
            let command = match scope.resolve_command(&args[0]) {
                Ok(command) => command,
                Err(error) => return Some(error),
            };
            let result = command.execute(&args, scope);
            state.command = Some(command);
            state.result = result.clone();
            if !result.is_final_ok() {
                return Some(result);
            }
        }

        OpCode::PushResult => {
            let value = state.result.value.clone();
            state.push(value);
        }

        OpCode::JoinStrings => {
            let parts = match state.pop() {
                Val::Tuple(items) => items,
                value => Rc::new(vec![value]),
            };
            let mut joined = String::new();
            for part in parts.iter() {
                match part.to_text() {
                    Some(text) => joined.push_str(&text),
                    None => return Some(errors::value_has_no_text(part.type_name())),
                }
            }
            state.push(Val::from(joined));
        }
    }
    None
}

/// Qualified values accumulate selectors, anything else is selected now
fn select(value: Val, selector: Selector) -> Result<Val, String> {
    match &value {
        Val::Qualified(qualified) => Ok(qualified.with_selector(selector)),
        _ => selector.apply(&value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::stdlib::new_root_scope;

    #[test]
    fn test_constant_program() {
        let scope = new_root_scope();
        let mut program = Program::new();
        program.push(OpCode::PushConstant(Val::from("value")));

        let mut state = ProgramState::new();
        let result = execute(&program, &mut state, &scope);
        assert_eq!(result, EvalResult::ok("value"));
    }

    #[test]
    fn test_sentence_stops_on_non_ok() {
        let scope = new_root_scope();
        let mut program = Program::new();
        program.push(OpCode::OpenFrame);
        program.push(OpCode::PushConstant(Val::from("return")));
        program.push(OpCode::PushConstant(Val::from("early")));
        program.push(OpCode::EvaluateSentence);
        program.push(OpCode::OpenFrame);
        program.push(OpCode::PushConstant(Val::from("error")));
        program.push(OpCode::PushConstant(Val::from("unreachable")));
        program.push(OpCode::EvaluateSentence);

        let mut state = ProgramState::new();
        let result = execute(&program, &mut state, &scope);
        assert_eq!(result, EvalResult::ret("early"));
        assert!(state.command().is_some());
    }

    #[test]
    fn test_join_rejects_structured_values() {
        let scope = new_root_scope();
        let mut program = Program::new();
        program.push(OpCode::OpenFrame);
        program.push(OpCode::PushConstant(Val::from("a")));
        program.push(OpCode::PushConstant(Val::list(vec![])));
        program.push(OpCode::CloseFrame);
        program.push(OpCode::JoinStrings);

        let mut state = ProgramState::new();
        let result = execute(&program, &mut state, &scope);
        assert_eq!(
            result.message().as_deref(),
            Some("value of type list has no string representation")
        );
    }
}
