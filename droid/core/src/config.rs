use serde::{Deserialize, Serialize};
use std::env;

/// Set to anything but `0` to log every decoded instruction at `trace` level.
pub const TRACE_ENV: &str = "INTCODE_TRACE";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub trace: bool,
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self {
            trace: env::var(TRACE_ENV).is_ok_and(|value| !value.is_empty() && value != "0"),
        }
    }

    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }
}
