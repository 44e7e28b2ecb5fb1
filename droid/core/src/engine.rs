//! Suspendable execution engine.
//!
//! [`Engine::resume`] runs the machine until it has something to tell the
//! driver: it needs input, a text line is complete, a non-character value was
//! output, or the run ended. The driver reacts (queue input, print, inspect)
//! and calls `resume` again. Once `Halted` or `Faulted` is reported the engine
//! refuses to run further.

use crate::config::EngineConfig;
use crate::{CoreError, Result};
use intcode::{decode, eval::step, Memory, State, Step};
use serde::Serialize;
use std::collections::VecDeque;
use std::iter::FusedIterator;
use thiserror::Error;
use tracing::{debug, trace, warn};

pub const LINE_TERMINATOR: char = '\n';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Running,
    AwaitingInput,
    ProducingOutput,
    Halted,
    Faulted,
}

impl Status {
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Halted | Status::Faulted)
    }
}

/// Execution error pinned to the instruction that raised it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("fault at ip={ip}: {error}")]
pub struct Fault {
    pub ip: i64,
    pub error: intcode::Error,
}

/// Why [`Engine::resume`] returned control to the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Suspension {
    /// The input queue is empty. Queue at least one value and resume.
    AwaitingInput,
    /// A complete line, terminator included.
    LineReady(String),
    /// An output value with no character meaning.
    Value(i64),
    Halted,
    Faulted(Fault),
}

impl Suspension {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Suspension::Halted | Suspension::Faulted(_))
    }
}

pub struct Engine {
    config: EngineConfig,
    memory: Memory,
    state: State,
    input: VecDeque<i64>,
    line: String,
    status: Status,
    fault: Option<Fault>,
    steps: u64,
}

impl Engine {
    pub fn new(program: impl Into<Vec<i64>>) -> Self {
        Self::with_config(program, EngineConfig::default())
    }

    pub fn with_config(program: impl Into<Vec<i64>>, config: EngineConfig) -> Self {
        Self {
            config,
            memory: Memory::from_program(program),
            state: State::default(),
            input: VecDeque::new(),
            line: String::new(),
            status: Status::Running,
            fault: None,
            steps: 0,
        }
    }

    /// Load a program file in the comma-separated text format.
    pub fn from_file(path: impl AsRef<std::path::Path>, config: EngineConfig) -> Result<Self> {
        let program = intcode::load_program(path)?;
        Ok(Self::with_config(program, config))
    }

    pub fn push_input(&mut self, value: i64) {
        self.input.push_back(value);
    }

    /// Queue the character codes of `text`, adding a trailing newline if missing.
    pub fn push_line(&mut self, text: &str) {
        self.input.extend(text.chars().map(|c| c as i64));
        if !text.ends_with(LINE_TERMINATOR) {
            self.input.push_back(LINE_TERMINATOR as i64);
        }
    }

    pub fn pending_input(&self) -> usize {
        self.input.len()
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn fault(&self) -> Option<Fault> {
        self.fault
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Instructions retired so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Characters output since the last complete line.
    pub fn partial_line(&self) -> &str {
        &self.line
    }

    /// Drain an unterminated line, e.g. the tail printed right before halting.
    pub fn take_partial_line(&mut self) -> Option<String> {
        if self.line.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.line))
        }
    }

    /// Run until the next suspension event.
    ///
    /// Errors only when the engine already reported `Halted` or `Faulted`.
    /// Execution faults are returned as [`Suspension::Faulted`].
    pub fn resume(&mut self) -> Result<Suspension> {
        if self.status.is_terminal() {
            return Err(CoreError::Terminated(self.status));
        }
        self.status = Status::Running;

        loop {
            let ip = self.state.ip;
            if self.config.trace {
                self.trace_instruction(ip);
            }

            match step(&mut self.state, &mut self.memory, &mut self.input) {
                Ok(Step::Continue) => self.steps += 1,
                Ok(Step::Output(value)) => {
                    self.steps += 1;
                    if let Some(event) = self.emit(value) {
                        self.status = Status::ProducingOutput;
                        return Ok(event);
                    }
                }
                Ok(Step::NeedInput) => {
                    debug!(ip, steps = self.steps, "awaiting input");
                    self.status = Status::AwaitingInput;
                    return Ok(Suspension::AwaitingInput);
                }
                Ok(Step::Halt) => {
                    debug!(ip, steps = self.steps, "halted");
                    self.status = Status::Halted;
                    return Ok(Suspension::Halted);
                }
                Err(error) => {
                    let fault = Fault { ip, error };
                    warn!(%fault, steps = self.steps, "engine faulted");
                    self.status = Status::Faulted;
                    self.fault = Some(fault);
                    return Ok(Suspension::Faulted(fault));
                }
            }
        }
    }

    /// Pull-based view over the remaining suspension events.
    pub fn events(&mut self) -> Events<'_> {
        Events { engine: self }
    }

    fn emit(&mut self, value: i64) -> Option<Suspension> {
        let Some(ch) = u32::try_from(value).ok().and_then(char::from_u32) else {
            return Some(Suspension::Value(value));
        };
        self.line.push(ch);
        if ch == LINE_TERMINATOR {
            let line = std::mem::take(&mut self.line);
            trace!(line = line.trim_end(), "line ready");
            return Some(Suspension::LineReady(line));
        }
        None
    }

    fn trace_instruction(&self, ip: i64) {
        let Ok(word) = self.memory.read(ip) else {
            return;
        };
        match decode(word, ip) {
            Ok(instr) => trace!(
                ip,
                rb = self.state.relative_base,
                op = %instr.opcode,
                modes = ?instr.modes,
                "exec"
            ),
            Err(_) => trace!(ip, word, "exec undecodable"),
        }
    }
}

/// Iterator over suspension events, ending after `Halted` or `Faulted`.
///
/// `AwaitingInput` repeats for as long as the caller does not queue input
/// through [`Events::engine`].
pub struct Events<'a> {
    engine: &'a mut Engine,
}

impl Events<'_> {
    pub fn engine(&mut self) -> &mut Engine {
        self.engine
    }
}

impl Iterator for Events<'_> {
    type Item = Suspension;

    fn next(&mut self) -> Option<Suspension> {
        self.engine.resume().ok()
    }
}

impl FusedIterator for Events<'_> {}
