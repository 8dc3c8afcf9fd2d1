//! Sequential drivers
//!
//! A driver takes a [`TaskSource`](crate::tasks::TaskSource), invokes its
//! factories one at a time, and never invokes a factory before the result of
//! the previous operation has been observed. Three interchangeable designs
//! are provided:
//!
//! - [`generator`]: the sequencing logic is an explicit coroutine, which
//!   yields every pending operation to a hand-rolled driving function that
//!   resumes it with the operation's result.
//! - [`linear`]: the same logic written as an `async fn`, where the compiler
//!   generates the suspension bookkeeping.
//! - [`chain`]: no suspension at all, a continuation chain is described up front
//!   and each link starts its operation once its predecessor has completed.
//!
//! All of them stop at the first failed operation and never print their
//! completion message in that case.

pub mod chain;
pub mod generator;
pub mod linear;

use crate::client::CancelToken;
use crate::console::Console;
use crate::progress::{self, ProgressMonitor, ProgressReporter, SessionState};
use crate::status::OperationFailure;
use log::{debug, info, warn};
use std::sync::Arc;


/// Completion message of the generator driver
pub const GENERATOR_DONE: &str =
    "Promises resolved sequentially with a generator";

/// Completion message of the linear driver
pub const ASYNC_DONE: &str = "Promises executed sequentially with async await";

/// Completion message of the chain driver
pub const CHAIN_DONE: &str = "Promises were executed sequentially";


/// How a driver run ended, when no operation failed
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Every operation was observed, and the message was printed
    Completed { message: &'static str },

    /// The run was stopped before invoking operation `next_index`
    Cancelled { next_index: usize },
}


/// Transient state of one driver run
pub struct Session {
    console: Arc<dyn Console>,
    cancel: CancelToken,
    progress: ProgressReporter,
}
//
impl Session {
    /// Start a session printing to `console`, along with a monitor which
    /// can follow the session's progress from anywhere
    pub fn new(console: Arc<dyn Console>) -> (Self, ProgressMonitor) {
        let (progress, monitor) = progress::channel();
        let session = Session {
            console,
            cancel: CancelToken::new(),
            progress,
        };
        (session, monitor)
    }

    /// Stop the session whenever `token` is triggered
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn console(&self) -> Arc<dyn Console> {
        self.console.clone()
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub(crate) fn print(&self, line: &str) {
        self.console.line(line);
    }

    pub(crate) fn invoked(&mut self, index: usize) {
        debug!("invoking operation {}", index);
        self.progress.invoked();
    }

    pub(crate) fn observed(&mut self, index: usize) {
        debug!("observed operation {}", index);
        self.progress.observed();
    }

    /// Record how the session ended and hand the outcome back
    pub(crate) fn settle(
        &mut self,
        outcome: Result<Outcome, OperationFailure>
    ) -> Result<Outcome, OperationFailure> {
        let state = match outcome {
            Ok(Outcome::Completed { .. }) => {
                info!("all {} operations completed",
                      self.progress.snapshot().observed);
                SessionState::Completed
            }
            Ok(Outcome::Cancelled { next_index }) => {
                info!("cancelled before operation {}", next_index);
                SessionState::Cancelled
            }
            Err(ref failure) => {
                warn!("aborting: {}", failure);
                SessionState::Failed
            }
        };
        self.progress.finish(state);
        outcome
    }
}


/// Unit tests
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Mode;
    use crate::console::Transcript;
    use crate::deferred::DeferredOperation;
    use crate::progress::{Progress, SessionState};
    use crate::tasks::{self, Factory, TaskConfig, TaskSource};
    use crate::timer;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const QUICK: Duration = Duration::from_millis(5);

    fn quick(count: usize, fail_at: Option<usize>) -> TaskConfig {
        TaskConfig { count, delay: QUICK, fail_at }
    }

    fn new_session() -> (Session, ProgressMonitor, Transcript) {
        let transcript = Transcript::new();
        let (session, monitor) = Session::new(Arc::new(transcript.clone()));
        (session, monitor, transcript)
    }

    fn result_lines(count: usize) -> Vec<String> {
        (0..count).map(tasks::result_message).collect()
    }

    /// Console which triggers a cancellation once it printed enough lines
    struct CancelAfter {
        transcript: Transcript,
        token: CancelToken,
        lines: usize,
    }
    //
    impl Console for CancelAfter {
        fn line(&self, line: &str) {
            self.transcript.line(line);
            if self.transcript.lines().len() == self.lines {
                self.token.cancel();
            }
        }
    }

    fn cancelling_session(lines: usize) -> (Session, Transcript) {
        let transcript = Transcript::new();
        let token = CancelToken::new();
        let console = CancelAfter {
            transcript: transcript.clone(),
            token: token.clone(),
            lines,
        };
        let (session, _) = Session::new(Arc::new(console));
        (session.with_cancel_token(token), transcript)
    }

    /// Task source which records how many operations overlap, resolving
    /// operation `index` with `make(index)`
    fn instrumented<T: Send + 'static>(count: usize,
                                       active: &Arc<AtomicUsize>,
                                       peak: &Arc<AtomicUsize>,
                                       make: fn(usize) -> T) -> TaskSource<T> {
        let factories = (0..count)
            .map(|index| -> Factory<T> {
                let active = active.clone();
                let peak = peak.clone();
                Box::new(move || -> DeferredOperation<T> {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    timer::after(index, QUICK, move || {
                        active.fetch_sub(1, Ordering::SeqCst);
                        Ok(make(index))
                    })
                })
            })
            .collect();
        TaskSource::from_factories(factories)
    }

    /// Lines printed by a full run of `count` operations through `mode`
    fn transcript_of(mode: Mode, count: usize) -> Vec<String> {
        let (session, _, transcript) = new_session();
        let tasks = quick(count, None);
        match mode {
            Mode::Generator => {
                generator::run(TaskSource::results(&tasks), session).unwrap();
            }
            Mode::Async => {
                linear::run(TaskSource::results(&tasks), session).unwrap();
            }
            Mode::Chain => {
                let tasks = TaskSource::signals(&tasks, session.console());
                chain::run(tasks, session).unwrap();
            }
        }
        transcript.lines()
    }

    /// Five one-shot timers through the generator driver
    #[test]
    fn generator_scenario() {
        let (session, mut monitor, transcript) = new_session();
        let outcome = generator::run(TaskSource::results(&quick(5, None)),
                                     session);
        assert_eq!(outcome, Ok(Outcome::Completed { message: GENERATOR_DONE }));

        let mut expected = result_lines(5);
        expected.push(GENERATOR_DONE.to_owned());
        assert_eq!(transcript.lines(), expected);
        assert_eq!(monitor.latest(), Progress {
            invoked: 5,
            observed: 5,
            in_flight: 0,
            max_in_flight: 1,
            state: SessionState::Completed,
        });
    }

    /// Five one-shot timers through the linear driver
    #[test]
    fn linear_scenario() {
        let (session, mut monitor, transcript) = new_session();
        let outcome = linear::run(TaskSource::results(&quick(5, None)),
                                  session);
        assert_eq!(outcome, Ok(Outcome::Completed { message: ASYNC_DONE }));

        let mut expected = result_lines(5);
        expected.push(ASYNC_DONE.to_owned());
        assert_eq!(transcript.lines(), expected);
        assert_eq!(monitor.latest().max_in_flight, 1);
        assert_eq!(monitor.latest().state, SessionState::Completed);
    }

    /// Five side-effecting timers through the chain driver
    #[test]
    fn chain_scenario() {
        let (session, mut monitor, transcript) = new_session();
        let tasks = TaskSource::signals(&quick(5, None), session.console());
        let outcome = chain::run(tasks, session);
        assert_eq!(outcome, Ok(Outcome::Completed { message: CHAIN_DONE }));
        assert_eq!(transcript.lines(), vec![
            "Resolving promise with id 0",
            "Resolving promise with id 1",
            "Resolving promise with id 2",
            "Resolving promise with id 3",
            "Resolving promise with id 4",
            CHAIN_DONE,
        ]);
        assert_eq!(monitor.latest().max_in_flight, 1);
    }

    /// A failing link skips the rest of the chain and gets printed
    #[test]
    fn chain_failure() {
        let (session, mut monitor, transcript) = new_session();
        let tasks = TaskSource::signals(&quick(5, Some(2)), session.console());
        let outcome = chain::run(tasks, session);
        let failure = OperationFailure::Injected { index: 2 };
        assert_eq!(outcome, Err(failure.clone()));
        assert_eq!(transcript.lines(), vec![
            "Resolving promise with id 0".to_owned(),
            "Resolving promise with id 1".to_owned(),
            failure.to_string(),
        ]);
        let progress = monitor.latest();
        assert_eq!(progress.invoked, 3);
        assert_eq!(progress.state, SessionState::Failed);
    }

    /// Failures abort the suspending drivers as well
    #[test]
    fn suspending_drivers_abort_on_failure() {
        for run in [generator::run, linear::run] {
            let (session, mut monitor, transcript) = new_session();
            let outcome = run(TaskSource::results(&quick(5, Some(2))), session);
            assert_eq!(outcome, Err(OperationFailure::Injected { index: 2 }));
            assert_eq!(transcript.lines(), result_lines(2));
            assert_eq!(monitor.latest().invoked, 3);
            assert_eq!(monitor.latest().state, SessionState::Failed);
        }
    }

    /// Both suspending drivers print the same results in the same order
    #[test]
    fn suspending_drivers_agree() {
        let (generator_session, _, generator_lines) = new_session();
        let (linear_session, _, linear_lines) = new_session();
        generator::run(TaskSource::results(&quick(4, None)), generator_session)
            .unwrap();
        linear::run(TaskSource::results(&quick(4, None)), linear_session)
            .unwrap();

        let mut generator_lines = generator_lines.lines();
        let mut linear_lines = linear_lines.lines();
        assert_eq!(generator_lines.pop().as_deref(), Some(GENERATOR_DONE));
        assert_eq!(linear_lines.pop().as_deref(), Some(ASYNC_DONE));
        assert_eq!(generator_lines, linear_lines);
    }

    /// No two operations are ever in flight at the same time
    #[test]
    fn one_operation_at_a_time() {
        for run in [generator::run, linear::run] {
            let active = Arc::new(AtomicUsize::new(0));
            let peak = Arc::new(AtomicUsize::new(0));
            let (session, _, transcript) = new_session();
            run(instrumented(6, &active, &peak, tasks::result_message), session)
                .unwrap();
            assert_eq!(peak.load(Ordering::SeqCst), 1);
            assert_eq!(transcript.lines().len(), 7);
        }

        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let (session, _, transcript) = new_session();
        chain::run(instrumented(6, &active, &peak, |_| ()), session).unwrap();
        assert_eq!(peak.load(Ordering::SeqCst), 1);
        assert_eq!(transcript.lines(), vec![CHAIN_DONE]);
    }

    /// Re-running a driver with a fresh task source gives the same lines
    #[test]
    fn rerun() {
        for mode in [Mode::Generator, Mode::Async, Mode::Chain] {
            let first = transcript_of(mode, 3);
            assert_eq!(first.len(), 4);
            assert_eq!(first, transcript_of(mode, 3));
        }
    }

    /// Empty task sources complete right away
    #[test]
    fn empty_source() {
        let (session, _, transcript) = new_session();
        assert_eq!(generator::run(TaskSource::results(&quick(0, None)), session),
                   Ok(Outcome::Completed { message: GENERATOR_DONE }));
        assert_eq!(transcript.lines(), vec![GENERATOR_DONE]);

        let (session, _, transcript) = new_session();
        let tasks = TaskSource::signals(&quick(0, None), session.console());
        assert_eq!(chain::run(tasks, session),
                   Ok(Outcome::Completed { message: CHAIN_DONE }));
        assert_eq!(transcript.lines(), vec![CHAIN_DONE]);
    }

    /// Cancellation stops every driver before its next operation
    #[test]
    fn cancellation() {
        for run in [generator::run, linear::run] {
            let (session, transcript) = cancelling_session(2);
            let outcome = run(TaskSource::results(&quick(5, None)), session);
            assert_eq!(outcome, Ok(Outcome::Cancelled { next_index: 2 }));
            assert_eq!(transcript.lines(), result_lines(2));
        }

        let (session, transcript) = cancelling_session(2);
        let tasks = TaskSource::signals(&quick(5, None), session.console());
        assert_eq!(chain::run(tasks, session),
                   Ok(Outcome::Cancelled { next_index: 2 }));
        assert_eq!(transcript.lines(), vec![
            "Resolving promise with id 0",
            "Resolving promise with id 1",
        ]);
    }
}
