pub mod cli;
pub mod compiler;
pub mod config;
pub mod executor;
pub mod parser;

use std::rc::Rc;

// Re-export main types
pub use executor::{new_root_scope, EvalResult, Process, ResultCode, Scope, Val};
pub use parser::{parse, ParseError};

/// Parse `source` and run it to completion in `scope`
///
/// Script-level failures come back as ERROR results; only syntax errors are
/// reported as `Err`. A top-level `yield` is an ERROR since nothing can resume
/// the process.
pub fn eval_source(scope: &Rc<Scope>, source: &str) -> Result<EvalResult, ParseError> {
    let script = parse(source)?;
    let script = executor::types::ScriptValue {
        script: Rc::new(script),
        source: Some(Rc::from(source)),
    };
    Ok(scope.execute_script(&script))
}
