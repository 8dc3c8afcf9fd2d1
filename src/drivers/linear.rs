//! Linear sequential driver
//!
//! Same contract as the [`generator`](super::generator) driver, but the
//! sequencing logic is a plain `async fn`. Every `.await` is a suspension
//! point, and the compiler-generated state machine keeps track of where to
//! resume, so no hand-rolled driving function is needed.

use super::{Outcome, Session, ASYNC_DONE};
use crate::status::OperationFailure;
use crate::tasks::TaskSource;
use futures::executor::block_on;


/// Await every operation of `tasks` in order, printing each result, then
/// print the completion message
pub async fn run_sequentially(
    tasks: TaskSource<String>,
    session: &mut Session
) -> Result<Outcome, OperationFailure> {
    for (index, factory) in tasks.into_iter().enumerate() {
        if session.is_cancelled() {
            return session.settle(Ok(Outcome::Cancelled { next_index: index }));
        }
        session.invoked(index);
        let result = factory().await;
        session.observed(index);
        match result {
            Ok(line) => session.print(&line),
            Err(failure) => return session.settle(Err(failure)),
        }
    }
    session.print(ASYNC_DONE);
    session.settle(Ok(Outcome::Completed { message: ASYNC_DONE }))
}


/// Block the calling thread on [`run_sequentially`]
pub fn run(tasks: TaskSource<String>,
           mut session: Session) -> Result<Outcome, OperationFailure> {
    block_on(run_sequentially(tasks, &mut session))
}


/// Unit tests
#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::Transcript;
    use crate::deferred::DeferredOperation;
    use crate::tasks::{result_message, Factory};
    use std::sync::Arc;

    /// Check that operations which fail up front stop the run
    #[test]
    fn failed_up_front() {
        let factories: Vec<Factory<String>> = vec![
            Box::new(|| DeferredOperation::failed(OperationFailure::Timer {
                index: 0,
                reason: "no threads left".to_owned(),
            })),
            Box::new(|| -> DeferredOperation<String> {
                panic!("the second factory must not be invoked")
            }),
        ];
        let transcript = Transcript::new();
        let (session, mut monitor) = Session::new(Arc::new(transcript.clone()));

        let outcome = run(TaskSource::from_factories(factories), session);
        assert!(matches!(outcome, Err(OperationFailure::Timer { index: 0, .. })));
        assert!(transcript.lines().is_empty());
        assert_eq!(monitor.latest().invoked, 1);
    }

    /// Check that the async fn composes with other async code
    #[test]
    fn nested_await() {
        let transcript = Transcript::new();
        let (mut session, _) = Session::new(Arc::new(transcript.clone()));
        let factories: Vec<Factory<String>> = vec![
            Box::new(|| {
                let (resolver, operation) = DeferredOperation::new(0);
                resolver.resolve(Ok(result_message(0)));
                operation
            }),
        ];

        let outcome = block_on(async {
            run_sequentially(TaskSource::from_factories(factories), &mut session)
                .await
        });
        assert_eq!(outcome, Ok(Outcome::Completed { message: ASYNC_DONE }));
        assert_eq!(transcript.lines(), vec![result_message(0),
                                            ASYNC_DONE.to_owned()]);
    }
}
