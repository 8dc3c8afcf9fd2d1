//! Continuation-chain driver
//!
//! Rather than suspending in place, this driver describes the whole run as
//! a single future before anything executes. It starts from an already
//! resolved future, which [`TryFutureExt::and_then`] extends with the
//! stream of links, one per operation, drained by
//! [`TryStreamExt::try_for_each`]. A link only invokes its factory once the
//! previous link has completed, so operations still run one at a time.
//!
//! The chain has a single failure channel: the first failing link
//! short-circuits every link after it, straight to the terminal handler,
//! which prints the failure instead of the completion message.

use super::{Outcome, Session, CHAIN_DONE};
use crate::status::OperationFailure;
use crate::tasks::TaskSource;
use futures::executor::block_on;
use futures::future::{self, Either, FutureExt, TryFutureExt};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::cell::RefCell;
use std::rc::Rc;


/// Reasons for a link to skip the rest of the chain
#[derive(Debug)]
enum Interrupt {
    Cancelled { next_index: usize },
    Failed(OperationFailure),
}


/// Run every operation of `tasks` through a continuation chain
///
/// Operations are expected to carry their own side effects, the chain only
/// prints the completion message, or the failure which interrupted it.
///
pub fn run(tasks: TaskSource<()>,
           session: Session) -> Result<Outcome, OperationFailure> {
    let session = Rc::new(RefCell::new(session));

    // Links are polled one after another by a single stream adapter, so
    // the chain does not nest deeper as it grows
    let links_session = session.clone();
    let links = stream::iter(tasks.into_iter().enumerate())
        .map(Ok::<_, Interrupt>)
        .try_for_each(move |(index, factory)| {
            let link_session = links_session.clone();
            if link_session.borrow().is_cancelled() {
                let next_index = index;
                return Either::Left(
                    future::err(Interrupt::Cancelled { next_index })
                );
            }
            link_session.borrow_mut().invoked(index);
            Either::Right(factory().map(move |result| {
                link_session.borrow_mut().observed(index);
                result.map_err(Interrupt::Failed)
            }))
        });
    let chain = future::ok::<(), Interrupt>(()).and_then(move |()| links);

    let terminal = chain.map(move |result| {
        let mut state = session.borrow_mut();
        let outcome = match result {
            Ok(()) => {
                state.print(CHAIN_DONE);
                Ok(Outcome::Completed { message: CHAIN_DONE })
            }
            Err(Interrupt::Cancelled { next_index }) => {
                Ok(Outcome::Cancelled { next_index })
            }
            Err(Interrupt::Failed(failure)) => {
                state.print(&failure.to_string());
                Err(failure)
            }
        };
        state.settle(outcome)
    });
    block_on(terminal)
}


/// Unit tests
#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::Transcript;
    use crate::deferred::DeferredOperation;
    use crate::tasks::{signal_message, Factory, TaskConfig};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// Check that building the chain does not invoke anything
    #[test]
    fn links_start_in_order() {
        let invoked = Arc::new(AtomicUsize::new(0));
        let factories: Vec<Factory<()>> = (0..3)
            .map(|index| -> Factory<()> {
                let invoked = invoked.clone();
                Box::new(move || {
                    // Each link runs only after all of its predecessors
                    assert_eq!(invoked.fetch_add(1, Ordering::SeqCst), index);
                    let (resolver, operation) = DeferredOperation::new(index);
                    resolver.resolve(Ok(()));
                    operation
                })
            })
            .collect();
        let transcript = Transcript::new();
        let (session, _) = Session::new(Arc::new(transcript.clone()));

        let outcome = run(TaskSource::from_factories(factories), session);
        assert_eq!(outcome, Ok(Outcome::Completed { message: CHAIN_DONE }));
        assert_eq!(invoked.load(Ordering::SeqCst), 3);
        assert_eq!(transcript.lines(), vec![CHAIN_DONE]);
    }

    /// Check that long chains of already resolved operations run in bounded
    /// stack space
    #[test]
    fn long_ready_chain() {
        const LINKS: usize = 20_000;
        let factories: Vec<Factory<()>> = (0..LINKS)
            .map(|index| -> Factory<()> {
                Box::new(move || {
                    let (resolver, operation) = DeferredOperation::new(index);
                    resolver.resolve(Ok(()));
                    operation
                })
            })
            .collect();
        let transcript = Transcript::new();
        let (session, mut monitor) = Session::new(Arc::new(transcript.clone()));

        let outcome = run(TaskSource::from_factories(factories), session);
        assert_eq!(outcome, Ok(Outcome::Completed { message: CHAIN_DONE }));
        assert_eq!(monitor.latest().observed, LINKS);
        assert_eq!(transcript.lines(), vec![CHAIN_DONE]);
    }

    /// Check that long chains of zero-delay timers complete as well
    #[test]
    fn long_timer_chain() {
        let config = TaskConfig {
            count: 2_000,
            delay: Duration::ZERO,
            fail_at: None,
        };
        let transcript = Transcript::new();
        let (session, _) = Session::new(Arc::new(transcript.clone()));
        let tasks = TaskSource::signals(&config, session.console());

        let outcome = run(tasks, session);
        assert_eq!(outcome, Ok(Outcome::Completed { message: CHAIN_DONE }));
        let lines = transcript.lines();
        assert_eq!(lines.len(), 2_001);
        assert_eq!(lines[1_999], signal_message(1_999));
    }

    /// Check that a failure skips every later link
    #[test]
    fn failure_skips_later_links() {
        let factories: Vec<Factory<()>> = vec![
            Box::new(|| DeferredOperation::failed(
                OperationFailure::Abandoned { index: 0 }
            )),
            Box::new(|| -> DeferredOperation<()> {
                panic!("links after a failure must be skipped")
            }),
        ];
        let transcript = Transcript::new();
        let (session, _) = Session::new(Arc::new(transcript.clone()));

        let outcome = run(TaskSource::from_factories(factories), session);
        let failure = OperationFailure::Abandoned { index: 0 };
        assert_eq!(outcome, Err(failure.clone()));
        assert_eq!(transcript.lines(), vec![failure.to_string()]);
    }
}
