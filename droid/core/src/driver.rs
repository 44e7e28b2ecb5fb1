use crate::engine::{Engine, Fault, Suspension};
use crate::Result;
use std::collections::VecDeque;
use tracing::{debug, info};

/// Prompt line after which the droid program reads a command.
pub const DEFAULT_PROMPT: &str = "Command?\n";

/// Driver-side policy: watches output and decides what to type.
pub trait Strategy {
    fn on_line(&mut self, line: &str);

    fn on_value(&mut self, _value: i64) {}

    /// Next command to send, without the trailing newline. `None` ends the run.
    fn next_command(&mut self) -> Option<String>;
}

impl<S: Strategy + ?Sized> Strategy for &mut S {
    fn on_line(&mut self, line: &str) {
        (**self).on_line(line)
    }

    fn on_value(&mut self, value: i64) {
        (**self).on_value(value)
    }

    fn next_command(&mut self) -> Option<String> {
        (**self).next_command()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverEvent {
    Halted,
    Faulted(Fault),
    /// The strategy had nothing more to send; the engine is still waiting on input.
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverRunResult {
    pub event: DriverEvent,
    pub lines: usize,
    pub commands: usize,
    pub steps: u64,
}

pub struct Driver {
    engine: Engine,
}

impl Driver {
    pub fn new(engine: Engine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Pump the engine until it terminates or `strategy` runs out of commands.
    ///
    /// A stopped run can be continued later with another call, possibly with
    /// a different strategy.
    pub fn run<S: Strategy>(&mut self, mut strategy: S) -> Result<DriverRunResult> {
        let start_steps = self.engine.steps();
        let mut lines = 0usize;
        let mut commands = 0usize;

        let event = loop {
            match self.engine.resume()? {
                Suspension::LineReady(line) => {
                    lines += 1;
                    strategy.on_line(&line);
                }
                Suspension::Value(value) => strategy.on_value(value),
                Suspension::AwaitingInput => match strategy.next_command() {
                    Some(command) => {
                        debug!(command = command.as_str(), "sending command");
                        commands += 1;
                        self.engine.push_line(&command);
                    }
                    None => break DriverEvent::Stopped,
                },
                Suspension::Halted => {
                    if let Some(tail) = self.engine.take_partial_line() {
                        lines += 1;
                        strategy.on_line(&tail);
                    }
                    break DriverEvent::Halted;
                }
                Suspension::Faulted(fault) => break DriverEvent::Faulted(fault),
            }
        };

        let steps = self.engine.steps() - start_steps;
        info!(?event, lines, commands, steps, "driver run finished");
        Ok(DriverRunResult {
            event,
            lines,
            commands,
            steps,
        })
    }
}

/// Sends a fixed list of commands and records everything printed.
#[derive(Debug, Clone, Default)]
pub struct ScriptedStrategy {
    commands: VecDeque<String>,
    transcript: Vec<String>,
}

impl ScriptedStrategy {
    pub fn new<I, T>(commands: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            commands: commands.into_iter().map(Into::into).collect(),
            transcript: Vec::new(),
        }
    }

    /// One command per line; blank lines and `#` comments are skipped.
    pub fn from_script(text: &str) -> Self {
        Self::new(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#')),
        )
    }

    pub fn remaining(&self) -> usize {
        self.commands.len()
    }

    pub fn transcript(&self) -> &[String] {
        &self.transcript
    }
}

impl Strategy for ScriptedStrategy {
    fn on_line(&mut self, line: &str) {
        self.transcript.push(line.to_string());
    }

    fn on_value(&mut self, value: i64) {
        self.transcript.push(value.to_string());
    }

    fn next_command(&mut self) -> Option<String> {
        self.commands.pop_front()
    }
}

/// Only asks the inner strategy for a command right after a prompt line.
///
/// Input requests that do not follow the prompt end the run.
pub struct PromptStrategy<S> {
    inner: S,
    prompt: String,
    prompted: bool,
}

impl<S: Strategy> PromptStrategy<S> {
    pub fn new(inner: S) -> Self {
        Self::with_prompt(inner, DEFAULT_PROMPT)
    }

    pub fn with_prompt(inner: S, prompt: impl Into<String>) -> Self {
        Self {
            inner,
            prompt: prompt.into(),
            prompted: false,
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: Strategy> Strategy for PromptStrategy<S> {
    fn on_line(&mut self, line: &str) {
        if line == self.prompt {
            self.prompted = true;
        }
        self.inner.on_line(line);
    }

    fn on_value(&mut self, value: i64) {
        self.inner.on_value(value);
    }

    fn next_command(&mut self) -> Option<String> {
        if !std::mem::take(&mut self.prompted) {
            return None;
        }
        self.inner.next_command()
    }
}
