use crate::decode::{decode, Instr, Mode, Opcode};
use crate::memory::Bus;
use crate::state::State;
use std::collections::VecDeque;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Faults raised while executing a single instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    #[error("invalid address {0}")]
    InvalidAddress(i64),
    #[error("unknown opcode {opcode} at ip={ip}")]
    UnknownOpcode { opcode: i64, ip: i64 },
    #[error("invalid parameter mode {mode} at ip={ip}")]
    InvalidMode { mode: i64, ip: i64 },
    #[error("immediate-mode destination at ip={ip}")]
    ImmediateDestination { ip: i64 },
    #[error("integer overflow at ip={ip}")]
    Overflow { ip: i64 },
}

/// What a single [`step`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Instruction retired; keep going.
    Continue,
    /// Input instruction found the queue empty. Nothing changed.
    NeedInput,
    /// Output instruction retired with this value.
    Output(i64),
    /// Halt reached. The instruction pointer stays on the halt word.
    Halt,
}

struct Env<'a, B: Bus> {
    state: &'a mut State,
    bus: &'a mut B,
    instr: Instr,
}

impl<'a, B: Bus> Env<'a, B> {
    fn ip(&self) -> i64 {
        self.state.ip
    }

    fn overflow(&self) -> Error {
        Error::Overflow { ip: self.state.ip }
    }

    /// Effective address of parameter `param` (zero based).
    fn address(&self, param: usize) -> Result<i64> {
        let slot = self
            .ip()
            .checked_add(param as i64 + 1)
            .ok_or_else(|| self.overflow())?;
        match self.instr.mode(param) {
            Mode::Position => self.bus.load(slot),
            Mode::Immediate => Ok(slot),
            Mode::Relative => self
                .bus
                .load(slot)?
                .checked_add(self.state.relative_base)
                .ok_or_else(|| self.overflow()),
        }
    }

    fn read(&self, param: usize) -> Result<i64> {
        let addr = self.address(param)?;
        self.bus.load(addr)
    }

    fn write(&mut self, param: usize, value: i64) -> Result<()> {
        let addr = self.address(param)?;
        self.bus.store(addr, value)
    }

    fn advance(&mut self) -> Result<()> {
        self.state.ip = self
            .ip()
            .checked_add(self.instr.opcode.width())
            .ok_or_else(|| self.overflow())?;
        Ok(())
    }

    fn binary(&mut self, op: impl FnOnce(i64, i64) -> Option<i64>) -> Result<Step> {
        let a = self.read(0)?;
        let b = self.read(1)?;
        let value = op(a, b).ok_or_else(|| self.overflow())?;
        self.write(2, value)?;
        self.advance()?;
        Ok(Step::Continue)
    }

    fn jump(&mut self, taken: impl FnOnce(i64) -> bool) -> Result<Step> {
        let cond = self.read(0)?;
        if taken(cond) {
            self.state.ip = self.read(1)?;
        } else {
            self.advance()?;
        }
        Ok(Step::Continue)
    }
}

/// Fetch, decode and execute the instruction at `state.ip`.
///
/// A failing instruction leaves `state`, the bus and `input` untouched.
pub fn step<B: Bus>(state: &mut State, bus: &mut B, input: &mut VecDeque<i64>) -> Result<Step> {
    let word = bus.load(state.ip)?;
    let instr = decode(word, state.ip)?;
    let mut env = Env { state, bus, instr };

    match instr.opcode {
        Opcode::Add => env.binary(i64::checked_add),
        Opcode::Mul => env.binary(i64::checked_mul),
        Opcode::LessThan => env.binary(|a, b| Some((a < b) as i64)),
        Opcode::Equals => env.binary(|a, b| Some((a == b) as i64)),
        Opcode::Input => {
            let Some(&value) = input.front() else {
                return Ok(Step::NeedInput);
            };
            env.write(0, value)?;
            input.pop_front();
            env.advance()?;
            Ok(Step::Continue)
        }
        Opcode::Output => {
            let value = env.read(0)?;
            env.advance()?;
            Ok(Step::Output(value))
        }
        Opcode::JumpIfTrue => env.jump(|cond| cond != 0),
        Opcode::JumpIfFalse => env.jump(|cond| cond == 0),
        Opcode::AdjustBase => {
            let delta = env.read(0)?;
            let base = env
                .state
                .relative_base
                .checked_add(delta)
                .ok_or_else(|| env.overflow())?;
            env.state.relative_base = base;
            env.advance()?;
            Ok(Step::Continue)
        }
        Opcode::Halt => Ok(Step::Halt),
    }
}
