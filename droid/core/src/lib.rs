//! ASCII-speaking Intcode runtime.
//!
//! [`engine::Engine`] wraps the `intcode` evaluator in a suspendable state
//! machine that assembles output into text lines and waits on an input queue.
//! [`driver::Driver`] pumps an engine on behalf of a [`driver::Strategy`]
//! that reads lines and decides what to type next.

use thiserror::Error;

pub mod config;
pub mod driver;
pub mod engine;

pub use config::{EngineConfig, TRACE_ENV};
pub use driver::{
    Driver, DriverEvent, DriverRunResult, PromptStrategy, ScriptedStrategy, Strategy,
    DEFAULT_PROMPT,
};
pub use engine::{Engine, Events, Fault, Status, Suspension, LINE_TERMINATOR};

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("engine already terminated ({0:?})")]
    Terminated(Status),
    #[error("program error: {0}")]
    Parse(#[from] intcode::ParseError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
