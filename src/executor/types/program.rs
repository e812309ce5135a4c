//! Compiled programs
//!
//! A program is an immutable list of opcodes working on a stack of frames.
//! Many processes may share one program.

use super::values::Val;

/// Opcode
#[derive(Debug, Clone, PartialEq)]
pub enum OpCode {
    /// Push nil onto the current frame
    PushNil,
    /// Push a constant onto the current frame
    PushConstant(Val),
    /// Start a new frame
    OpenFrame,
    /// Close the current frame and push its values as a tuple
    CloseFrame,
    /// Pop a name (or tuple of names) and push the variable value(s)
    ResolveValue,
    /// Pop a tuple or list and splice its items into the current frame
    ExpandValue,
    /// Pop a value and push it as the source of a qualified value
    SetSource,
    /// Pop an index and a value, push the selected value
    SelectIndex,
    /// Pop a tuple of keys and a value, push the selected value
    SelectKeys,
    /// Close the current frame and invoke it as a command sentence
    EvaluateSentence,
    /// Push the value of the last command result
    PushResult,
    /// Pop a tuple and push the concatenation of its items as strings
    JoinStrings,
}

/// Compiled script, tuple or argument list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub opcodes: Vec<OpCode>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, opcode: OpCode) {
        self.opcodes.push(opcode);
    }

    pub fn len(&self) -> usize {
        self.opcodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.opcodes.is_empty()
    }
}
