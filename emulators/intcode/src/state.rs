use serde::{Deserialize, Serialize};

/// Register file of the machine: instruction pointer and relative base.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    #[serde(default)]
    pub ip: i64,
    #[serde(default)]
    pub relative_base: i64,
}
