//! Destinations for the lines printed by drivers
//!
//! Drivers print from whichever thread observes a result, which may be a
//! timer thread, so every console must be shareable across threads.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};


/// Line-oriented output sink
pub trait Console: Send + Sync {
    /// Print one full line
    fn line(&self, line: &str);
}


/// Console printing to the process' standard output
#[derive(Clone, Copy, Debug, Default)]
pub struct Stdout;
//
impl Console for Stdout {
    fn line(&self, line: &str) {
        let stdout = io::stdout();
        let mut lock = stdout.lock();
        // A closed stdout is not worth aborting a run over
        let _ = writeln!(lock, "{}", line).and_then(|()| lock.flush());
    }
}


/// Console recording lines in memory
#[derive(Clone, Debug, Default)]
pub struct Transcript {
    lines: Arc<Mutex<Vec<String>>>,
}
//
impl Transcript {
    pub fn new() -> Self {
        Transcript::default()
    }

    /// Copy of every line printed so far
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}
//
impl Console for Transcript {
    fn line(&self, line: &str) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.to_owned());
    }
}
