//! Continuations and deferred values
//!
//! A command that needs a sub-program evaluated hands it back to the engine
//! instead of recursing:
//!
//! - **continuation**: evaluate `program` in `scope`; its terminal result becomes
//!   the command result, optionally post-processed by a callback. YIELD results
//!   bypass the callback, which stays attached to the suspended frame. Callable
//!   bodies are marked so that RETURN stops there and `tailcall` can replace
//!   them.
//! - **deferred value**: evaluate `program` in `scope`, then call the command's
//!   `resume` with the terminal result.

use std::rc::Rc;

use super::errors;
use super::scope::Scope;
use super::types::{EvalResult, Program, ResultCode, ResultData, Val};

/// Post-processing applied to a continuation's terminal result
pub type Callback = Rc<dyn Fn(EvalResult) -> EvalResult>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContinuationKind {
    Plain,
    /// Callable body: the result goes through `callable_boundary` before the
    /// callback
    Callable,
    /// Replaces the innermost enclosing callable body
    Tail,
}

pub struct ContinuationValue {
    pub scope: Rc<Scope>,
    pub program: Rc<Program>,
    pub callback: Option<Callback>,
    pub kind: ContinuationKind,
}

pub struct DeferredValue {
    pub scope: Rc<Scope>,
    pub program: Rc<Program>,
}

impl EvalResult {
    /// Tail call: the sub-program's result is the command result, verbatim
    pub fn continuation(scope: Rc<Scope>, program: Rc<Program>) -> Self {
        EvalResult::nil().with_data(ResultData::Continuation(Rc::new(ContinuationValue {
            scope,
            program,
            callback: None,
            kind: ContinuationKind::Plain,
        })))
    }

    /// Sub-program whose terminal result goes through `callback`
    pub fn continuation_with(
        scope: Rc<Scope>,
        program: Rc<Program>,
        callback: impl Fn(EvalResult) -> EvalResult + 'static,
    ) -> Self {
        EvalResult::nil().with_data(ResultData::Continuation(Rc::new(ContinuationValue {
            scope,
            program,
            callback: Some(Rc::new(callback)),
            kind: ContinuationKind::Plain,
        })))
    }

    /// Callable body; `guard` maps results that got through the boundary
    pub fn callable_body(scope: Rc<Scope>, program: Rc<Program>, guard: Option<Callback>) -> Self {
        EvalResult::nil().with_data(ResultData::Continuation(Rc::new(ContinuationValue {
            scope,
            program,
            callback: guard,
            kind: ContinuationKind::Callable,
        })))
    }

    /// `tailcall`: `program` takes over the enclosing callable body
    ///
    /// Outside any callable the result is returned from the whole program.
    pub fn tail_call(scope: Rc<Scope>, program: Rc<Program>) -> Self {
        EvalResult::nil().with_data(ResultData::Continuation(Rc::new(ContinuationValue {
            scope,
            program,
            callback: None,
            kind: ContinuationKind::Tail,
        })))
    }

    /// Sub-program whose terminal result goes to the command's `resume`
    pub fn deferred(scope: Rc<Scope>, program: Rc<Program>) -> Self {
        EvalResult::new(ResultCode::Yield, Val::Nil)
            .with_data(ResultData::Deferred(Rc::new(DeferredValue { scope, program })))
    }

    pub fn is_continuation(&self) -> bool {
        self.code == ResultCode::Ok && matches!(self.data, Some(ResultData::Continuation(_)))
    }

    pub fn is_deferred(&self) -> bool {
        self.code == ResultCode::Yield && matches!(self.data, Some(ResultData::Deferred(_)))
    }
}

/// Result mapping at a callable boundary (closure, proc, macro, ensemble,
/// coroutine top level, scoped body)
///
/// RETURN becomes OK, loop control codes become errors.
pub fn callable_boundary(result: EvalResult) -> EvalResult {
    match result.code {
        ResultCode::Return => EvalResult::ok(result.value),
        ResultCode::Break | ResultCode::Continue => errors::unexpected(result.code),
        _ => result,
    }
}

/// OK becomes RETURN
pub fn tail_return(result: EvalResult) -> EvalResult {
    match result.code {
        ResultCode::Ok => EvalResult::ret(result.value),
        _ => result,
    }
}

/// Like `callable_boundary` but RETURN is passed through
///
/// Used by scoped bodies that do not form a callable (e.g. `scope ... eval`).
pub fn loop_control_boundary(result: EvalResult) -> EvalResult {
    match result.code {
        ResultCode::Break | ResultCode::Continue => errors::unexpected(result.code),
        _ => result,
    }
}
