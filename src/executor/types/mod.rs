//! Type definitions for the executor
//!
//! This module contains all the core types used by the executor:
//! - AST nodes (Script, Sentence, Word)
//! - Runtime values (Val)
//! - Result envelope (EvalResult, ResultCode)
//! - Compiled programs (Program, OpCode)

pub mod ast;
pub mod program;
pub mod result;
pub mod values;

// Re-export all types for convenient access
pub use ast::{Script, SelectorNode, Sentence, Word};
pub use program::{OpCode, Program};
pub use result::{EvalResult, ResultCode, ResultData};
pub use values::{CommandValue, QualifiedValue, ScriptValue, Selector, Val};
