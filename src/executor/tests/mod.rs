//! Engine tests
//!
//! Organized by feature area; per-command tests live next to each stdlib module

pub mod helpers;

mod coroutine_tests;
mod ensemble_tests;
mod namespace_tests;
mod scope_tests;
