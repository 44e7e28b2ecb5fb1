use anyhow::bail;
use intcode::{eval::step, memory::Memory, state::State, Step};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::io::{self, Read};

const DEFAULT_MAX_STEPS: u64 = 10_000_000;

#[derive(Deserialize)]
struct Input {
    #[serde(default)]
    state: State,
    /// Initial memory image; `program` is accepted as an alias.
    #[serde(default, alias = "program")]
    memory: Vec<i64>,
    #[serde(default)]
    input: Vec<i64>,
    #[serde(default)]
    max_steps: Option<u64>,
}

#[derive(Serialize)]
#[serde(rename_all = "snake_case")]
enum Stop {
    NeedInput,
    Halt,
    MaxSteps,
    Fault(String),
}

#[derive(Serialize)]
struct Output {
    state: State,
    memory: Memory,
    outputs: Vec<i64>,
    unread_input: Vec<i64>,
    steps: u64,
    stop: Stop,
}

fn main() -> anyhow::Result<()> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    let input: Input = serde_json::from_str(&buffer)?;
    if input.memory.is_empty() {
        bail!("request carries no program");
    }

    let output = run(input);
    serde_json::to_writer(io::stdout(), &output)?;
    Ok(())
}

fn run(input: Input) -> Output {
    let mut state = input.state;
    let mut memory = Memory::from_program(input.memory);
    let mut queue: VecDeque<i64> = input.input.into();
    let max_steps = input.max_steps.unwrap_or(DEFAULT_MAX_STEPS);
    let mut outputs = Vec::new();
    let mut steps = 0u64;

    let stop = loop {
        if steps >= max_steps {
            break Stop::MaxSteps;
        }
        match step(&mut state, &mut memory, &mut queue) {
            Ok(Step::Continue) => {}
            Ok(Step::Output(value)) => outputs.push(value),
            Ok(Step::NeedInput) => break Stop::NeedInput,
            Ok(Step::Halt) => break Stop::Halt,
            Err(err) => break Stop::Fault(err.to_string()),
        }
        steps += 1;
    };

    Output {
        state,
        memory,
        outputs,
        unread_input: queue.into(),
        steps,
        stop,
    }
}
