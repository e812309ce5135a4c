//! Result envelope and control codes
//!
//! Every command invocation returns an `EvalResult`. Exactly one code is
//! active per result; composite commands either pass non-OK codes through or
//! map them to a documented alternative.

use std::fmt;
use std::rc::Rc;

use super::values::Val;
use crate::executor::continuation::{ContinuationValue, DeferredValue};

/// Control code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultCode {
    Ok,
    Return,
    Yield,
    Error,
    Break,
    Continue,
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResultCode::Ok => "ok",
            ResultCode::Return => "return",
            ResultCode::Yield => "yield",
            ResultCode::Error => "error",
            ResultCode::Break => "break",
            ResultCode::Continue => "continue",
        };
        write!(f, "{}", name)
    }
}

/// Opaque resumption state attached to a result
///
/// Owned by the engine: commands build it through the `EvalResult`
/// constructors and never look inside.
#[derive(Clone)]
pub enum ResultData {
    /// OK: evaluate a sub-program before this result is final
    Continuation(Rc<ContinuationValue>),
    /// YIELD: evaluate a sub-program, then hand its result to the command's `resume`
    Deferred(Rc<DeferredValue>),
}

impl PartialEq for ResultData {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ResultData::Continuation(a), ResultData::Continuation(b)) => Rc::ptr_eq(a, b),
            (ResultData::Deferred(a), ResultData::Deferred(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for ResultData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultData::Continuation(_) => write!(f, "Continuation"),
            ResultData::Deferred(_) => write!(f, "Deferred"),
        }
    }
}

/// Result of evaluating a command, script or program
#[derive(Debug, Clone, PartialEq)]
pub struct EvalResult {
    pub code: ResultCode,
    pub value: Val,
    pub data: Option<ResultData>,
}

impl EvalResult {
    pub fn new(code: ResultCode, value: Val) -> Self {
        Self {
            code,
            value,
            data: None,
        }
    }

    pub fn ok(value: impl Into<Val>) -> Self {
        Self::new(ResultCode::Ok, value.into())
    }

    pub fn nil() -> Self {
        Self::new(ResultCode::Ok, Val::Nil)
    }

    pub fn ret(value: impl Into<Val>) -> Self {
        Self::new(ResultCode::Return, value.into())
    }

    pub fn yielded(value: impl Into<Val>) -> Self {
        Self::new(ResultCode::Yield, value.into())
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(ResultCode::Error, Val::from(message.into()))
    }

    pub fn brk() -> Self {
        Self::new(ResultCode::Break, Val::Nil)
    }

    pub fn cont() -> Self {
        Self::new(ResultCode::Continue, Val::Nil)
    }

    pub fn with_data(mut self, data: ResultData) -> Self {
        self.data = Some(data);
        self
    }

    /// OK with nothing left for the engine to do
    pub fn is_final_ok(&self) -> bool {
        self.code == ResultCode::Ok && self.data.is_none()
    }

    pub fn is_error(&self) -> bool {
        self.code == ResultCode::Error
    }

    /// Error message, for ERROR results
    pub fn message(&self) -> Option<String> {
        match self.code {
            ResultCode::Error => self.value.to_text(),
            _ => None,
        }
    }
}

impl From<Val> for EvalResult {
    fn from(value: Val) -> Self {
        EvalResult::ok(value)
    }
}
