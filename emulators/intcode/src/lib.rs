pub mod decode;
pub mod eval;
pub mod memory;
pub mod program;
pub mod state;

pub use decode::{decode, Instr, Mode, Opcode};
pub use eval::{step, Error, Result, Step};
pub use memory::{Bus, Memory};
pub use program::{load_program, parse_program, ParseError};
pub use state::State;
