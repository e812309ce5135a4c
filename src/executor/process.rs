//! Process trampoline
//!
//! A process runs a compiled program against a scope. Nested evaluation never
//! grows the native stack: a command that needs a sub-program returns a
//! continuation or deferred value, the process pushes a frame for it and keeps
//! stepping the innermost frame. When a frame's program terminates, its result
//! goes through the frame's pending mappings, innermost first, and flows back
//! to the frame below:
//!
//! - **Continuation**: the callback maps the result, which then becomes the
//!   pending command's result in the frame below.
//! - **Boundary**: callable body; RETURN ends here (see `callable_boundary`).
//! - **Deferred**: the pending command of the frame below gets the result
//!   through `Command::resume`.
//!
//! A frame whose program has nothing left to run but the pending command is
//! replaced by the continuation it returned: the new frame inherits its pending
//! mappings instead of stacking on top. Calls in tail position, including
//! `tailcall`, therefore run in constant depth. Scopes only link to their
//! parent weakly, so a replaced frame hands its scope over to the new frame
//! whenever the new scope still looks names up through it.
//!
//! A plain YIELD anywhere in the stack suspends the whole process with all
//! frames intact. `yield_back` replaces the value of the innermost pending
//! result and the next `run` re-enters that frame first, so nested
//! suspensions resume innermost-first.

use std::rc::Rc;

use tracing::{debug, trace, warn};

use super::continuation::{callable_boundary, tail_return, Callback, ContinuationKind, ContinuationValue};
use super::exec_loop::{execute, ProgramState};
use super::scope::Scope;
use super::types::{EvalResult, Program, ResultCode, ResultData, Val};

/// Default frame limit per process
pub const DEFAULT_MAX_DEPTH: usize = 10_000;

/* ===================== Frames ===================== */

enum FrameKind {
    /// Program the process was prepared with
    Root,
    /// Result goes to the pending command's `resume` in the frame below
    Deferred,
    /// Callable body
    Boundary,
    Continuation(Callback),
}

struct Frame {
    program: Rc<Program>,
    scope: Rc<Scope>,
    state: ProgramState,
    /// Outermost first
    pending: Vec<FrameKind>,
    /// Ancestors of `scope` whose frames were replaced
    keep: Vec<Rc<Scope>>,
}

impl Frame {
    fn new(program: Rc<Program>, scope: Rc<Scope>, pending: Vec<FrameKind>) -> Self {
        Frame {
            program,
            scope,
            state: ProgramState::new(),
            pending,
            keep: Vec::new(),
        }
    }

    /// Keep alive the scopes among `candidates` that this frame looks up through
    fn keep_ancestors(mut self, candidates: Vec<Rc<Scope>>) -> Self {
        if candidates.is_empty() {
            return self;
        }
        let mut next = self.scope.parent();
        while let Some(ancestor) = next {
            if candidates.iter().any(|scope| Rc::ptr_eq(scope, &ancestor)) {
                self.keep.push(Rc::clone(&ancestor));
            }
            next = ancestor.parent();
        }
        self
    }

    /// Scopes this frame keeps alive, its own included
    fn into_scopes(self) -> Vec<Rc<Scope>> {
        let mut scopes = self.keep;
        scopes.push(self.scope);
        scopes
    }

    /// Empty program holding mappings that still wait on `result`
    fn carrier(scope: Rc<Scope>, pending: Vec<FrameKind>, result: EvalResult) -> Self {
        let mut frame = Frame::new(Rc::new(Program::new()), scope, pending);
        frame.state.result = result;
        frame
    }

    fn execute(&mut self) -> EvalResult {
        execute(&self.program, &mut self.state, &self.scope)
    }

    fn is_done(&self) -> bool {
        self.state.is_done(&self.program)
    }

    /// Innermost mapping a `tailcall` may stop at, if any
    fn tail_anchor(&self) -> Option<(usize, bool)> {
        self.pending.iter().enumerate().rev().find_map(|(index, kind)| match kind {
            FrameKind::Boundary => Some((index, true)),
            FrameKind::Root | FrameKind::Deferred => Some((index, false)),
            FrameKind::Continuation(_) => None,
        })
    }
}

/// Mappings for a continuation frame, outermost first
fn continuation_kinds(continuation: &ContinuationValue) -> Vec<FrameKind> {
    let mut kinds = Vec::with_capacity(2);
    if let Some(callback) = &continuation.callback {
        kinds.push(FrameKind::Continuation(Rc::clone(callback)));
    }
    if continuation.kind == ContinuationKind::Callable {
        kinds.push(FrameKind::Boundary);
    }
    kinds
}

/// Append inner mappings; nested boundaries with nothing between collapse
fn extend_pending(pending: &mut Vec<FrameKind>, kinds: Vec<FrameKind>) {
    for kind in kinds {
        if matches!(kind, FrameKind::Boundary) && matches!(pending.last(), Some(FrameKind::Boundary)) {
            continue;
        }
        pending.push(kind);
    }
}

/* ===================== Process ===================== */

/// Lifecycle of a process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    /// Prepared, never run
    Fresh,
    /// Inside `run`
    Running,
    /// Last `run` returned YIELD
    Suspended,
    /// Last `run` returned a terminal code
    Terminated,
}

pub struct Process {
    frames: Vec<Frame>,
    status: ProcessStatus,
    max_depth: usize,
}

impl Process {
    pub fn new(program: Rc<Program>, scope: Rc<Scope>) -> Self {
        Process {
            frames: vec![Frame::new(program, scope, vec![FrameKind::Root])],
            status: ProcessStatus::Fresh,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    pub fn status(&self) -> ProcessStatus {
        self.status
    }

    pub fn is_suspended(&self) -> bool {
        self.status == ProcessStatus::Suspended
    }

    pub fn is_terminated(&self) -> bool {
        self.status == ProcessStatus::Terminated
    }

    /// Number of frames currently on the stack
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Supply the value the suspended point evaluates to
    pub fn yield_back(&mut self, value: Val) {
        if self.status != ProcessStatus::Suspended {
            warn!(status = ?self.status, "yield_back on a process that is not suspended");
            return;
        }
        if let Some(frame) = self.frames.last_mut() {
            frame.state.result.value = value;
        }
    }

    /// Run until the program terminates or suspends
    ///
    /// Only fresh and suspended processes can run; anything else returns an
    /// ERROR without touching the program.
    pub fn run(&mut self) -> EvalResult {
        match self.status {
            ProcessStatus::Fresh | ProcessStatus::Suspended => {}
            ProcessStatus::Terminated => {
                warn!("run called on a terminated process");
                return EvalResult::error("process has terminated");
            }
            ProcessStatus::Running => {
                warn!("run called on a running process");
                return EvalResult::error("process is already running");
            }
        }
        self.status = ProcessStatus::Running;

        let mut result = self.execute_top();
        loop {
            if let Some(data) = result.data.clone() {
                result = match self.push_frame(data) {
                    Ok(()) => self.execute_top(),
                    Err(error) => error,
                };
                continue;
            }

            if result.code == ResultCode::Yield {
                self.status = ProcessStatus::Suspended;
                debug!(depth = self.frames.len(), "process suspended");
                return result;
            }

            result = self.pop_frame(result);
            let Some(parent) = self.frames.last_mut() else {
                self.status = ProcessStatus::Terminated;
                debug!(code = %result.code, "process terminated");
                return result;
            };
            parent.state.result = result.clone();
            if result.is_final_ok() {
                result = parent.execute();
            }
        }
    }

    fn execute_top(&mut self) -> EvalResult {
        match self.frames.last_mut() {
            Some(frame) => frame.execute(),
            None => EvalResult::nil(),
        }
    }

    /// Step into the sub-program attached to a result
    fn push_frame(&mut self, data: ResultData) -> Result<(), EvalResult> {
        let continuation = match data {
            ResultData::Deferred(deferred) => {
                let frame = Frame::new(
                    Rc::clone(&deferred.program),
                    Rc::clone(&deferred.scope),
                    vec![FrameKind::Deferred],
                );
                return self.stack_frame(frame);
            }
            ResultData::Continuation(continuation) => continuation,
        };
        let program = Rc::clone(&continuation.program);
        let scope = Rc::clone(&continuation.scope);

        if continuation.kind == ContinuationKind::Tail {
            if let Some((pending, scopes)) = self.unwind_to_boundary() {
                trace!(depth = self.frames.len() + 1, "tail call");
                self.frames.push(Frame::new(program, scope, pending).keep_ancestors(scopes));
                return Ok(());
            }
            // No enclosing callable: return from the whole program
            let callback: Callback = Rc::new(tail_return);
            return self.stack_frame(Frame::new(program, scope, vec![FrameKind::Continuation(callback)]));
        }

        let kinds = continuation_kinds(&continuation);
        match self.frames.pop() {
            Some(mut top) if top.is_done() => {
                let mut pending = std::mem::take(&mut top.pending);
                extend_pending(&mut pending, kinds);
                let frame = Frame::new(program, scope, pending).keep_ancestors(top.into_scopes());
                self.frames.push(frame);
                trace!(depth = self.frames.len(), "frame replaced");
                Ok(())
            }
            top => {
                self.frames.extend(top);
                self.stack_frame(Frame::new(program, scope, kinds))
            }
        }
    }

    fn stack_frame(&mut self, frame: Frame) -> Result<(), EvalResult> {
        if self.frames.len() >= self.max_depth {
            warn!(max_depth = self.max_depth, "maximum call depth exceeded");
            return Err(EvalResult::error("maximum call depth exceeded"));
        }
        self.frames.push(frame);
        trace!(depth = self.frames.len(), "frame pushed");
        Ok(())
    }

    /// Drop every frame up to the innermost callable body and return the
    /// mappings of that body along with the scopes of the dropped frames;
    /// `None` when no callable encloses the top frame
    fn unwind_to_boundary(&mut self) -> Option<(Vec<FrameKind>, Vec<Rc<Scope>>)> {
        let (frame_index, (kind_index, is_boundary)) = self
            .frames
            .iter()
            .enumerate()
            .rev()
            .find_map(|(index, frame)| frame.tail_anchor().map(|anchor| (index, anchor)))?;
        if !is_boundary {
            return None;
        }
        let mut dropped = self.frames.drain(frame_index..);
        let mut target = dropped.next()?;
        let mut pending = std::mem::take(&mut target.pending);
        pending.truncate(kind_index + 1);
        let mut scopes = target.into_scopes();
        for frame in dropped {
            scopes.extend(frame.into_scopes());
        }
        Some((pending, scopes))
    }

    /// Pop a terminated frame and map its result through the pending mappings
    ///
    /// A mapping that produces another sub-program or a YIELD leaves the rest
    /// of the mappings on a carrier frame waiting for it.
    fn pop_frame(&mut self, mut result: EvalResult) -> EvalResult {
        let Some(frame) = self.frames.pop() else {
            return result;
        };
        trace!(depth = self.frames.len(), code = %result.code, "frame popped");
        let Frame {
            scope,
            mut pending,
            keep,
            ..
        } = frame;
        while let Some(kind) = pending.pop() {
            result = match kind {
                FrameKind::Root => result,
                FrameKind::Boundary => callable_boundary(result),
                FrameKind::Continuation(callback) => callback(result),
                FrameKind::Deferred => self.resume_pending(result),
            };
            let waiting = result.data.is_some() || result.code == ResultCode::Yield;
            if waiting && !pending.is_empty() {
                let mut carrier = Frame::carrier(scope, pending, result.clone());
                carrier.keep = keep;
                self.frames.push(carrier);
                return result;
            }
        }
        result
    }

    /// Hand a deferred result to the pending command of the top frame
    fn resume_pending(&self, result: EvalResult) -> EvalResult {
        match self.frames.last() {
            Some(parent) => match parent.state.command() {
                Some(command) => command.resume(result, &parent.scope),
                None => result,
            },
            None => result,
        }
    }
}
