//! Run configuration
//!
//! Settings come from built-in defaults, then from `SEQ_*` environment
//! variables, then from the command line, each source overriding the
//! previous one.

use crate::tasks::TaskConfig;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;


/// Which driver a run goes through
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Generator,
    Async,
    Chain,
}
//
impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Generator => "generator",
            Mode::Async => "async",
            Mode::Chain => "chain",
        }
    }
}
//
impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "generator" => Ok(Mode::Generator),
            "async" => Ok(Mode::Async),
            "chain" => Ok(Mode::Chain),
            other => Err(format!(
                "unknown mode '{}'; expected generator, async or chain", other
            )),
        }
    }
}
//
impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}


/// Complete configuration of a run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub mode: Mode,
    pub tasks: TaskConfig,
}


/// What the command line asked for
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Run(Config),
    Help,
}


pub fn usage() -> &'static str {
    "\
usage: sequential_async_ops [run] --mode=<generator|async|chain> [OPTIONS]

Runs a fixed sequence of delayed operations one after another.

options:
  --mode=MODE       driver to use: generator, async or chain  [env: SEQ_MODE]
  --count=N         number of operations (default 5)          [env: SEQ_COUNT]
  --delay-ms=MS     delay of each operation (default 1000)    [env: SEQ_DELAY_MS]
  --fail-at=INDEX   make operation INDEX fail                 [env: SEQ_FAIL_AT]
  -h, --help        print this help

Diagnostics are logged to stderr, filtered by RUST_LOG (default: warn).
"
}


/// Parse command line arguments (without the program name), using `env` to
/// look up environment variables
pub fn parse_args<I, E>(args: I, env: E) -> Result<Command, String>
    where I: IntoIterator<Item = String>,
          E: Fn(&str) -> Option<String>
{
    let args = args.into_iter().collect::<Vec<_>>();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        return Ok(Command::Help);
    }

    let mut mode = env("SEQ_MODE").map(|v| v.parse::<Mode>()).transpose()?;
    let mut tasks = TaskConfig::default();
    if let Some(v) = env("SEQ_COUNT") {
        tasks.count = parse_number("SEQ_COUNT", &v)?;
    }
    if let Some(v) = env("SEQ_DELAY_MS") {
        tasks.delay = Duration::from_millis(parse_number("SEQ_DELAY_MS", &v)?);
    }
    if let Some(v) = env("SEQ_FAIL_AT") {
        tasks.fail_at = Some(parse_number("SEQ_FAIL_AT", &v)?);
    }

    // "run" is the only subcommand, and may be left out
    let mut i = usize::from(args.first().map_or(false, |a| a == "run"));
    while i < args.len() {
        // Accept both "--flag=value" and "--flag value"
        let (flag, inline) = match args[i].split_once('=') {
            Some((flag, value)) => (flag, Some(value.to_owned())),
            None => (args[i].as_str(), None),
        };
        let mut value = |what: &str| -> Result<String, String> {
            match inline.clone() {
                Some(v) => Ok(v),
                None => {
                    i += 1;
                    args.get(i)
                        .cloned()
                        .ok_or_else(|| format!("{} requires {}", flag, what))
                }
            }
        };
        match flag {
            "--mode" => mode = Some(value("MODE")?.parse()?),
            "--count" => tasks.count = parse_number(flag, &value("N")?)?,
            "--delay-ms" => {
                let ms = parse_number(flag, &value("MS")?)?;
                tasks.delay = Duration::from_millis(ms);
            }
            "--fail-at" => {
                tasks.fail_at = Some(parse_number(flag, &value("INDEX")?)?);
            }
            other => return Err(format!("unknown argument '{}'", other)),
        }
        i += 1;
    }

    let mode = mode.ok_or("--mode is required (generator, async or chain)")?;
    Ok(Command::Run(Config { mode, tasks }))
}


fn parse_number<N: FromStr>(name: &str, raw: &str) -> Result<N, String> {
    raw.trim()
       .parse()
       .map_err(|_| format!("{} must be a non-negative integer, got '{}'",
                            name, raw))
}
