//! # Executor - Resumable Command Engine
//!
//! ## Core Principles
//!
//! 1. **Trampoline execution**: commands hand sub-programs back as
//!    continuations; the process steps them on its own frame stack, never
//!    through native recursion
//! 2. **Uniform results**: every evaluation yields an `EvalResult` carrying one
//!    of OK, RETURN, YIELD, ERROR, BREAK, CONTINUE
//! 3. **Cooperative suspension**: a YIELD anywhere suspends the whole process;
//!    `Process::yield_back` plus `Process::run` resumes it in place
//! 4. **Single-threaded**: scopes and commands are shared through `Rc` and
//!    mutated through `RefCell`

pub mod argspec;
pub mod command;
pub mod continuation;
pub mod errors;
pub mod exec_loop;
pub mod json;
pub mod process;
pub mod scope;
pub mod stdlib;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export commonly used items
pub use argspec::Argspec;
pub use command::{Builtin, Command, HelpOptions};
pub use continuation::{callable_boundary, ContinuationKind, ContinuationValue, DeferredValue};
pub use process::{Process, ProcessStatus};
pub use scope::{CapturedScope, Scope};
pub use stdlib::new_root_scope;
pub use types::{EvalResult, Program, ResultCode, Script, Val};
