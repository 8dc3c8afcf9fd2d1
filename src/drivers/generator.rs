//! Coroutine-based sequential driver
//!
//! The sequencing logic is written as a coroutine: a state machine which,
//! each time it is resumed, either yields the next pending operation or
//! completes with a final value. Only the driving function, [`execute`],
//! ever resumes it. That function attaches a continuation to every yielded
//! operation, and this continuation resumes the coroutine with the
//! operation's result, wherever that result happens to be published.
//!
//! ```text
//!               resume(None)
//!  AwaitingNext ------------> Suspended --resume(Some(Ok))--> AwaitingNext
//!       |                        |
//!       | (exhausted/cancelled)  | resume(Some(Err) | None)
//!       v                        v
//!      Done <--------------------+
//! ```

use super::{Outcome, Session, GENERATOR_DONE};
use crate::deferred::DeferredOperation;
use crate::status::OperationFailure;
use crate::tasks::{Factory, TaskSource};
use log::error;
use std::iter::Enumerate;
use std::mem;
use std::sync::mpsc;
use std::vec;


/// Result of resuming a coroutine
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step<Y, R> {
    /// The coroutine suspended itself, handing out a value
    Yielded(Y),

    /// The coroutine is done, and won't yield anything anymore
    Complete(R),
}


/// Computation which can be suspended and later resumed with a value
pub trait Coroutine {
    /// Values the coroutine is resumed with
    type Resume;

    /// Values the coroutine suspends itself with
    type Yield;

    /// Final value of the coroutine
    type Return;

    /// Run the coroutine until its next suspension point or its end
    ///
    /// Resuming a coroutine which is done hands out its final value again.
    ///
    fn resume(&mut self, input: Self::Resume) -> Step<Self::Yield, Self::Return>;
}


/// Where a [`SequenceRoutine`] stands
#[derive(Debug)]
enum RoutineState {
    /// Ready to invoke the next factory; values it is resumed with are
    /// ignored, like the first value sent into a fresh generator
    AwaitingNext,

    /// Waiting for the result of operation `index`
    Suspended { index: usize },

    Done(Result<Outcome, OperationFailure>),
}


/// Sequencing logic of the generator driver, as an explicit coroutine
///
/// Each yielded operation must have been observed before the routine is
/// resumed, which in turn is the only way for it to invoke the next factory.
///
pub struct SequenceRoutine {
    tasks: Enumerate<vec::IntoIter<Factory<String>>>,
    state: RoutineState,
    session: Session,

    /// Index of the next factory to invoke
    next_index: usize,

    /// Where to report the outcome if the routine is dropped before its end
    abandon_tx: Option<mpsc::Sender<Result<Outcome, OperationFailure>>>,
}
//
impl SequenceRoutine {
    pub fn new(tasks: TaskSource<String>, session: Session) -> Self {
        SequenceRoutine {
            tasks: tasks.into_iter().enumerate(),
            state: RoutineState::AwaitingNext,
            session,
            next_index: 0,
            abandon_tx: None,
        }
    }

    /// Invoke the next factory and suspend on its operation
    fn advance(&mut self) -> Step<DeferredOperation<String>, <Self as Coroutine>::Return> {
        if self.session.is_cancelled() {
            let next_index = self.next_index;
            return self.finish(Ok(Outcome::Cancelled { next_index }));
        }
        match self.tasks.next() {
            Some((index, factory)) => {
                let operation = factory();
                self.session.invoked(index);
                self.next_index = index + 1;
                self.state = RoutineState::Suspended { index };
                Step::Yielded(operation)
            }
            None => self.finish(Ok(Outcome::Completed { message: GENERATOR_DONE })),
        }
    }

    fn finish(
        &mut self,
        outcome: Result<Outcome, OperationFailure>
    ) -> Step<DeferredOperation<String>, <Self as Coroutine>::Return> {
        let outcome = self.session.settle(outcome);
        self.state = RoutineState::Done(outcome.clone());
        Step::Complete(outcome)
    }
}
//
impl Drop for SequenceRoutine {
    /// A routine dropped before its end reports the operation it was
    /// waiting for as abandoned
    fn drop(&mut self) {
        let index = match self.state {
            RoutineState::AwaitingNext => self.next_index,
            RoutineState::Suspended { index } => index,
            RoutineState::Done(_) => return,
        };
        error!("driver dropped while operation {} was outstanding", index);
        let outcome = self.session.settle(Err(OperationFailure::Abandoned { index }));
        if let Some(abandon_tx) = self.abandon_tx.take() {
            let _ = abandon_tx.send(outcome);
        }
    }
}
//
impl Coroutine for SequenceRoutine {
    type Resume = Option<Result<String, OperationFailure>>;
    type Yield = DeferredOperation<String>;
    type Return = Result<Outcome, OperationFailure>;

    fn resume(&mut self, input: Self::Resume) -> Step<Self::Yield, Self::Return> {
        match mem::replace(&mut self.state, RoutineState::AwaitingNext) {
            RoutineState::AwaitingNext => {}
            RoutineState::Suspended { index } => {
                self.session.observed(index);
                match input {
                    Some(Ok(line)) => self.session.print(&line),
                    Some(Err(failure)) => return self.finish(Err(failure)),
                    None => {
                        return self.finish(Err(
                            OperationFailure::Abandoned { index }
                        ));
                    }
                }
            }
            RoutineState::Done(outcome) => {
                self.state = RoutineState::Done(outcome.clone());
                return Step::Complete(outcome);
            }
        }
        self.advance()
    }
}


/// Drive a coroutine to completion, resuming it with the result of every
/// operation it yields, and hand its final value to `done`
///
/// Operations which are already final when yielded are fed back right away,
/// in a loop. Otherwise, this returns as soon as the coroutine is suspended,
/// and the rest of the work happens on whichever threads resolve the yielded
/// operations.
///
pub fn execute<C, T, F>(mut coroutine: C,
                        mut input: Option<Result<T, OperationFailure>>,
                        done: F)
    where C: Coroutine<Yield = DeferredOperation<T>,
                       Resume = Option<Result<T, OperationFailure>>>
             + Send + 'static,
          T: Send + 'static,
          F: FnOnce(C::Return) + Send + 'static
{
    loop {
        match coroutine.resume(input) {
            Step::Yielded(operation) => match operation.try_take() {
                Ok(result) => input = Some(result),
                Err(pending) => {
                    pending.then(move |result| {
                        execute(coroutine, Some(result), done)
                    });
                    return;
                }
            },
            Step::Complete(value) => return done(value),
        }
    }
}


/// Run every operation of `tasks` through a [`SequenceRoutine`], then print
/// the routine's completion message
pub fn run(tasks: TaskSource<String>,
           session: Session) -> Result<Outcome, OperationFailure> {
    let console = session.console();
    let (done_tx, done_rx) = mpsc::channel();
    let mut routine = SequenceRoutine::new(tasks, session);
    routine.abandon_tx = Some(done_tx.clone());

    execute(routine, None, move |outcome| {
        if let Ok(Outcome::Completed { message }) = &outcome {
            console.line(message);
        }
        // The receiver only goes away if run() itself is gone
        let _ = done_tx.send(outcome);
    });

    // The routine reports either through the completion callback, or on drop
    match done_rx.recv() {
        Ok(outcome) => outcome,
        Err(_) => panic!("generator driver vanished without reporting an outcome"),
    }
}
