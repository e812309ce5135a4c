//! Test helpers for executor tests
//!
//! Common utilities for parsing scripts and preparing processes

use std::rc::Rc;

use crate::executor::process::Process;
use crate::executor::scope::Scope;
use crate::executor::stdlib::new_root_scope;
use crate::executor::types::{EvalResult, ResultCode, Script, Val};

/// Parse source, round-trip the AST through JSON and prepare a process in `scope`
///
/// The round-trip makes every test also check that parsed scripts survive
/// serialization unchanged.
pub fn prepare(scope: &Rc<Scope>, source: &str) -> Process {
    let script = crate::parser::parse(source).expect("Parse failed");
    let json = serde_json::to_string(&script).expect("Script serialization failed");
    let script: Script = serde_json::from_str(&json).expect("Script deserialization failed");
    scope.prepare_process(scope.compile_script(&script))
}

/// Run source in `scope` until it terminates or suspends
pub fn eval_in(scope: &Rc<Scope>, source: &str) -> EvalResult {
    prepare(scope, source).run()
}

/// Run source in a fresh root scope
pub fn eval(source: &str) -> EvalResult {
    eval_in(&new_root_scope(), source)
}

/// Run source in a fresh root scope and expect an OK result
pub fn eval_ok(source: &str) -> Val {
    let result = eval(source);
    assert_eq!(
        result.code,
        ResultCode::Ok,
        "expected OK for {:?}, got {:?}",
        source,
        result
    );
    result.value
}
