//! Polling-based monitoring of driver sessions
//!
//! A driver publishes a [`Progress`] snapshot after each transition of its
//! session. Monitoring code which does not need to synchronize with the
//! driver, but only to periodically look at where it stands, reads the latest
//! snapshot through a triple buffer. Neither side ever blocks the other.

use triple_buffer::{Input, Output, TripleBuffer};


/// Lifecycle of a driver session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// No operation was invoked yet
    Idle,
    Running,
    Completed,
    Failed,
    Cancelled,
}


/// Snapshot of a driver session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progress {
    /// Number of operations invoked so far
    pub invoked: usize,

    /// Number of operations whose result (or failure) was observed
    pub observed: usize,

    /// Operations invoked, but not observed yet
    pub in_flight: usize,

    /// Highest value `in_flight` ever reached during the session
    pub max_in_flight: usize,

    pub state: SessionState,
}
//
impl Default for Progress {
    fn default() -> Self {
        Progress {
            invoked: 0,
            observed: 0,
            in_flight: 0,
            max_in_flight: 0,
            state: SessionState::Idle,
        }
    }
}


/// Build a connected reporter/monitor pair
pub fn channel() -> (ProgressReporter, ProgressMonitor) {
    let initial = Progress::default();
    let (input, output) = TripleBuffer::new(&initial).split();
    (
        ProgressReporter { current: initial, input },
        ProgressMonitor { output },
    )
}


/// Driver-side interface, used to publish progress updates
pub struct ProgressReporter {
    /// Local copy of the last published snapshot
    current: Progress,

    /// New snapshots will be sent through this triple buffer
    input: Input<Progress>,
}
//
impl ProgressReporter {
    /// Record that an operation was invoked
    pub fn invoked(&mut self) {
        let p = &mut self.current;
        p.invoked += 1;
        p.in_flight += 1;
        p.max_in_flight = p.max_in_flight.max(p.in_flight);
        p.state = SessionState::Running;
        self.publish();
    }

    /// Record that the result of an in-flight operation was observed
    pub fn observed(&mut self) {
        let p = &mut self.current;
        debug_assert!(p.in_flight > 0);
        p.observed += 1;
        p.in_flight = p.in_flight.saturating_sub(1);
        self.publish();
    }

    /// Record the final state of the session
    pub fn finish(&mut self, state: SessionState) {
        self.current.state = state;
        self.publish();
    }

    /// Last published snapshot
    pub fn snapshot(&self) -> Progress {
        self.current
    }

    fn publish(&mut self) {
        self.input.write(self.current);
    }
}


/// Monitor-side interface, used to poll the latest snapshot
pub struct ProgressMonitor {
    /// Current progress will be read through this triple buffer
    output: Output<Progress>,
}
//
impl ProgressMonitor {
    /// Access the latest published snapshot
    pub fn latest(&mut self) -> Progress {
        *self.output.read()
    }
}
