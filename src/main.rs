//! Command-line entry point: runs one driver over the default task source

use log::{debug, error, info, warn};
use sequential_async_ops::config::{self, Command, Mode};
use sequential_async_ops::console::{Console, Stdout};
use sequential_async_ops::drivers::{chain, generator, linear, Outcome, Session};
use sequential_async_ops::tasks::TaskSource;
use std::process;
use std::sync::Arc;


fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}


fn main() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("warn")
    ).init();

    let config = match config::parse_args(std::env::args().skip(1), env_var) {
        Ok(Command::Run(config)) => config,
        Ok(Command::Help) => {
            print!("{}", config::usage());
            return;
        }
        Err(msg) => {
            eprintln!("error: {}", msg);
            eprintln!();
            eprint!("{}", config::usage());
            process::exit(2);
        }
    };
    if let Some(index) = config.tasks.fail_at {
        if index >= config.tasks.count {
            warn!("--fail-at={} is past the last operation, nothing will fail",
                  index);
        }
    }
    info!("running {} operations through the {} driver, {:?} apart",
          config.tasks.count, config.mode, config.tasks.delay);

    let console: Arc<dyn Console> = Arc::new(Stdout);
    let (session, mut monitor) = Session::new(console.clone());
    let result = match config.mode {
        Mode::Generator => {
            generator::run(TaskSource::results(&config.tasks), session)
        }
        Mode::Async => linear::run(TaskSource::results(&config.tasks), session),
        Mode::Chain => {
            chain::run(TaskSource::signals(&config.tasks, console), session)
        }
    };
    debug!("final progress: {:?}", monitor.latest());

    let code = match result {
        Ok(Outcome::Completed { .. }) => 0,
        Ok(Outcome::Cancelled { next_index }) => {
            warn!("stopped before operation {}", next_index);
            1
        }
        // The chain prints its failures itself
        Err(failure) if config.mode == Mode::Chain => {
            info!("chain handled: {}", failure);
            0
        }
        Err(failure) => {
            error!("{}", failure);
            eprintln!("error: {}", failure);
            1
        }
    };
    process::exit(code);
}
