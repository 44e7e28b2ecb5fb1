use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser};
use droid_core::{
    Driver, DriverEvent, Engine, EngineConfig, PromptStrategy, ScriptedStrategy, Status, Strategy,
};
use intcode::{Memory, State};
use serde::Serialize;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "droid")]
#[command(about = "Run an ASCII Intcode program and talk to it line by line", long_about = None)]
struct Args {
    /// Program file (comma-separated integers)
    program: PathBuf,

    /// Commands to send before falling back to stdin (one per line, `#` comments allowed)
    #[arg(long)]
    script: Option<PathBuf>,

    /// Engine configuration as JSON
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log every executed instruction (needs RUST_LOG=trace)
    #[arg(long, action = ArgAction::SetTrue)]
    trace: bool,

    /// Only send commands right after this prompt line is printed
    #[arg(long)]
    prompt: Option<String>,

    /// Stop instead of reading stdin once the script is exhausted
    #[arg(long, action = ArgAction::SetTrue)]
    no_interactive: bool,

    /// Write final registers and memory as JSON
    #[arg(long)]
    dump_state: Option<PathBuf>,
}

/// Prints program output and types scripted commands, then operator input.
struct Operator {
    script: ScriptedStrategy,
    interactive: bool,
    stdin: io::StdinLock<'static>,
}

impl Strategy for Operator {
    fn on_line(&mut self, line: &str) {
        print!("{line}");
    }

    fn on_value(&mut self, value: i64) {
        println!("{value}");
    }

    fn next_command(&mut self) -> Option<String> {
        if let Some(command) = self.script.next_command() {
            println!("> {command}");
            return Some(command);
        }
        if !self.interactive {
            return None;
        }
        read_command(&mut io::stdout(), &mut self.stdin)
    }
}

/// Flush pending output, then read one operator line. Any I/O failure ends input.
fn read_command(out: &mut impl Write, input: &mut impl BufRead) -> Option<String> {
    if let Err(err) = out.flush() {
        warn!(%err, "stdout flush failed; ending input");
        return None;
    }
    let mut line = String::new();
    match input.read_line(&mut line) {
        Ok(0) => None,
        Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
        Err(err) => {
            warn!(%err, "stdin read failed; ending input");
            None
        }
    }
}

#[derive(Serialize)]
struct Dump<'a> {
    status: Status,
    steps: u64,
    state: &'a State,
    memory: &'a Memory,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let mut config: EngineConfig = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => EngineConfig::from_env(),
    };
    if args.trace {
        config = config.with_trace(true);
    }

    let engine = Engine::from_file(&args.program, config)
        .with_context(|| format!("loading program {}", args.program.display()))?;

    let script = match &args.script {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading script {}", path.display()))?;
            ScriptedStrategy::from_script(&text)
        }
        None => ScriptedStrategy::default(),
    };
    let operator = Operator {
        script,
        interactive: !args.no_interactive,
        stdin: io::stdin().lock(),
    };

    let mut driver = Driver::new(engine);
    let result = match &args.prompt {
        Some(prompt) => {
            let prompt = if prompt.ends_with('\n') {
                prompt.clone()
            } else {
                format!("{prompt}\n")
            };
            driver.run(PromptStrategy::with_prompt(operator, prompt))?
        }
        None => driver.run(operator)?,
    };
    io::stdout().flush()?;

    if let Some(path) = &args.dump_state {
        let engine = driver.engine();
        let dump = Dump {
            status: engine.status(),
            steps: engine.steps(),
            state: engine.state(),
            memory: engine.memory(),
        };
        let file = fs::File::create(path)
            .with_context(|| format!("creating {}", path.display()))?;
        serde_json::to_writer_pretty(file, &dump)?;
    }

    match result.event {
        DriverEvent::Halted | DriverEvent::Stopped => Ok(()),
        DriverEvent::Faulted(fault) => bail!("program faulted after {} steps: {fault}", result.steps),
    }
}
