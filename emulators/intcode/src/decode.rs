//! Instruction word decoding.
//!
//! An instruction word carries the opcode in its two least significant
//! decimal digits and one addressing mode per parameter in the digits above,
//! lowest digit first: `1002` is `mul` with parameter modes
//! `[position, immediate, position]`.

use crate::eval::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MAX_PARAMS: usize = 3;

/// Parameter addressing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// The parameter holds an address.
    #[default]
    Position,
    /// The parameter is the value itself.
    Immediate,
    /// The parameter holds an address offset by the relative base.
    Relative,
}

impl Mode {
    fn from_digit(digit: i64, ip: i64) -> Result<Self> {
        match digit {
            0 => Ok(Mode::Position),
            1 => Ok(Mode::Immediate),
            2 => Ok(Mode::Relative),
            mode => Err(Error::InvalidMode { mode, ip }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Opcode {
    Add,
    Mul,
    Input,
    Output,
    JumpIfTrue,
    JumpIfFalse,
    LessThan,
    Equals,
    AdjustBase,
    Halt,
}

impl Opcode {
    pub fn from_code(code: i64) -> Option<Self> {
        Some(match code {
            1 => Opcode::Add,
            2 => Opcode::Mul,
            3 => Opcode::Input,
            4 => Opcode::Output,
            5 => Opcode::JumpIfTrue,
            6 => Opcode::JumpIfFalse,
            7 => Opcode::LessThan,
            8 => Opcode::Equals,
            9 => Opcode::AdjustBase,
            99 => Opcode::Halt,
            _ => return None,
        })
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Add => "add",
            Opcode::Mul => "mul",
            Opcode::Input => "in",
            Opcode::Output => "out",
            Opcode::JumpIfTrue => "jnz",
            Opcode::JumpIfFalse => "jz",
            Opcode::LessThan => "lt",
            Opcode::Equals => "eq",
            Opcode::AdjustBase => "arb",
            Opcode::Halt => "hlt",
        }
    }

    /// Number of parameters following the instruction word.
    pub fn arity(self) -> usize {
        match self {
            Opcode::Add | Opcode::Mul | Opcode::LessThan | Opcode::Equals => 3,
            Opcode::JumpIfTrue | Opcode::JumpIfFalse => 2,
            Opcode::Input | Opcode::Output | Opcode::AdjustBase => 1,
            Opcode::Halt => 0,
        }
    }

    /// Instruction width in words, including the instruction word.
    pub fn width(self) -> i64 {
        self.arity() as i64 + 1
    }

    /// Index of the parameter written by this instruction, if any.
    pub fn destination(self) -> Option<usize> {
        match self {
            Opcode::Add | Opcode::Mul | Opcode::LessThan | Opcode::Equals => Some(2),
            Opcode::Input => Some(0),
            _ => None,
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// A decoded instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instr {
    pub opcode: Opcode,
    pub modes: [Mode; MAX_PARAMS],
}

impl Instr {
    pub fn mode(&self, param: usize) -> Mode {
        self.modes[param]
    }
}

/// Decode the instruction word found at `ip`.
///
/// Rejects unknown opcodes, mode digits outside `0..=2` on parameters the
/// opcode uses, more mode digits than the instruction has room for, and
/// immediate-mode destinations. Digits for unused parameters are ignored.
pub fn decode(word: i64, ip: i64) -> Result<Instr> {
    if word < 0 {
        return Err(Error::UnknownOpcode { opcode: word, ip });
    }
    let code = word % 100;
    let opcode = Opcode::from_code(code).ok_or(Error::UnknownOpcode { opcode: code, ip })?;

    let mut rest = word / 100;
    let mut modes = [Mode::Position; MAX_PARAMS];
    for slot in modes.iter_mut().take(opcode.arity()) {
        *slot = Mode::from_digit(rest % 10, ip)?;
        rest /= 10;
    }
    rest /= 10i64.pow((MAX_PARAMS - opcode.arity()) as u32);
    if rest != 0 {
        return Err(Error::UnknownOpcode { opcode: word, ip });
    }

    if let Some(dst) = opcode.destination() {
        if modes[dst] == Mode::Immediate {
            return Err(Error::ImmediateDestination { ip });
        }
    }

    Ok(Instr { opcode, modes })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_opcode_and_modes() {
        let instr = decode(1002, 0).unwrap();
        assert_eq!(instr.opcode, Opcode::Mul);
        assert_eq!(
            instr.modes,
            [Mode::Position, Mode::Immediate, Mode::Position]
        );

        let instr = decode(21107, 0).unwrap();
        assert_eq!(instr.opcode, Opcode::LessThan);
        assert_eq!(
            instr.modes,
            [Mode::Immediate, Mode::Immediate, Mode::Relative]
        );
    }

    #[test]
    fn bare_opcodes_default_to_position() {
        let instr = decode(99, 0).unwrap();
        assert_eq!(instr.opcode, Opcode::Halt);
        assert_eq!(instr.modes, [Mode::Position; MAX_PARAMS]);
        assert_eq!(decode(204, 0).unwrap().mode(0), Mode::Relative);
    }

    #[test]
    fn rejects_unknown_opcodes() {
        assert!(matches!(
            decode(55, 7),
            Err(Error::UnknownOpcode { opcode: 55, ip: 7 })
        ));
        assert!(matches!(decode(0, 0), Err(Error::UnknownOpcode { .. })));
        assert!(matches!(decode(-1, 0), Err(Error::UnknownOpcode { .. })));
        assert!(matches!(decode(100_001, 0), Err(Error::UnknownOpcode { .. })));
    }

    #[test]
    fn rejects_bad_mode_digits() {
        assert!(matches!(
            decode(301, 4),
            Err(Error::InvalidMode { mode: 3, ip: 4 })
        ));
    }

    #[test]
    fn ignores_modes_of_unused_parameters() {
        let instr = decode(30004, 0).unwrap();
        assert_eq!(instr.opcode, Opcode::Output);
        assert_eq!(instr.mode(0), Mode::Position);
        assert_eq!(decode(90099, 0).unwrap().opcode, Opcode::Halt);
        // Parameter 2 of jz is used, so its digit is still checked.
        assert!(matches!(
            decode(5006, 1),
            Err(Error::InvalidMode { mode: 5, ip: 1 })
        ));
    }

    #[test]
    fn rejects_immediate_destinations() {
        assert!(matches!(
            decode(10001, 0),
            Err(Error::ImmediateDestination { ip: 0 })
        ));
        assert!(matches!(
            decode(103, 2),
            Err(Error::ImmediateDestination { ip: 2 })
        ));
        // Immediate sources are fine.
        assert!(decode(1101, 0).is_ok());
        assert!(decode(104, 0).is_ok());
    }

    #[test]
    fn widths_match_arity() {
        assert_eq!(Opcode::Add.width(), 4);
        assert_eq!(Opcode::JumpIfFalse.width(), 3);
        assert_eq!(Opcode::AdjustBase.width(), 2);
        assert_eq!(Opcode::Halt.width(), 1);
    }
}
