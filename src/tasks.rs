//! Sources of deferred operations
//!
//! A [`TaskSource`] is an ordered list of factories. Nothing happens until a
//! driver invokes a factory, at which point the factory starts a timer and
//! hands back the corresponding [`DeferredOperation`].

use crate::console::Console;
use crate::deferred::DeferredOperation;
use crate::status::OperationFailure;
use crate::timer;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use std::vec;


/// Number of operations produced when nothing else is configured
pub const DEFAULT_COUNT: usize = 5;

/// Per-operation delay used when nothing else is configured
pub const DEFAULT_DELAY: Duration = Duration::from_secs(1);


/// Zero-argument callable which creates and starts one operation
pub type Factory<T> = Box<dyn FnOnce() -> DeferredOperation<T> + Send>;


/// Shape of the operations produced by a task source
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskConfig {
    /// Number of operations
    pub count: usize,

    /// Delay of every operation
    pub delay: Duration,

    /// Index of an operation which fails instead of resolving
    pub fail_at: Option<usize>,
}
//
impl Default for TaskConfig {
    fn default() -> Self {
        TaskConfig {
            count: DEFAULT_COUNT,
            delay: DEFAULT_DELAY,
            fail_at: None,
        }
    }
}


/// Line an operation of [`TaskSource::results`] resolves with
pub fn result_message(index: usize) -> String {
    format!("Promise resolves in {} second(s)", index)
}

/// Line printed by an operation of [`TaskSource::signals`] when it expires
pub fn signal_message(index: usize) -> String {
    format!("Resolving promise with id {}", index)
}


/// Ordered sequence of operation factories
pub struct TaskSource<T> {
    factories: Vec<Factory<T>>,
}
//
impl<T> TaskSource<T> {
    /// Build a task source out of arbitrary factories
    pub fn from_factories(factories: Vec<Factory<T>>) -> Self {
        TaskSource { factories }
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}
//
impl TaskSource<String> {
    /// Operations which resolve with a line mentioning their own index
    pub fn results(config: &TaskConfig) -> Self {
        let delay = config.delay;
        let fail_at = config.fail_at;
        let factories = (0..config.count)
            .map(|index| -> Factory<String> {
                Box::new(move || {
                    timer::after(index, delay, move || {
                        if fail_at == Some(index) {
                            return Err(OperationFailure::Injected { index });
                        }
                        Ok(result_message(index))
                    })
                })
            })
            .collect();
        TaskSource { factories }
    }
}
//
impl TaskSource<()> {
    /// Operations without a payload, which print a line identifying
    /// themselves right before they complete
    pub fn signals(config: &TaskConfig, console: Arc<dyn Console>) -> Self {
        let delay = config.delay;
        let fail_at = config.fail_at;
        let factories = (0..config.count)
            .map(|index| -> Factory<()> {
                let console = console.clone();
                Box::new(move || {
                    timer::after(index, delay, move || {
                        if fail_at == Some(index) {
                            return Err(OperationFailure::Injected { index });
                        }
                        console.line(&signal_message(index));
                        Ok(())
                    })
                })
            })
            .collect();
        TaskSource { factories }
    }
}
//
impl<T> IntoIterator for TaskSource<T> {
    type Item = Factory<T>;
    type IntoIter = vec::IntoIter<Factory<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.factories.into_iter()
    }
}
//
impl<T> fmt::Debug for TaskSource<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("TaskSource")
         .field("len", &self.factories.len())
         .finish()
    }
}
