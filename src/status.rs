//! Facilities to represent the status of deferred operations
//!
//! Every deferred operation is modeled as a small state machine. It starts in
//! a pending state when a factory creates it, moves to a running state once
//! its timer has been scheduled, and finally ends up in either a successful
//! or an unsuccessful final state, from which it never moves again.

use std::error::Error;
use std::fmt;


/// Representation of a deferred operation's status
///
/// Here are the possible state transitions:
///
/// - Pending -> Running / Error
/// - Running -> Done / Error
///
/// Once the operation is in either of the Done or Error states, its status
/// won't change anymore.
///
#[derive(Clone, Debug, PartialEq)]
pub enum OperationStatus<T> {
    /// The operation was created, but its timer has not started yet
    Pending,

    /// The timer is running
    Running,

    /// The operation resolved with a value
    Done(T),

    /// The operation failed instead of resolving
    Error(OperationFailure),
}
//
impl<T> OperationStatus<T> {
    /// Payload-free summary of this status
    pub fn kind(&self) -> StatusKind {
        match *self {
            OperationStatus::Pending => StatusKind::Pending,
            OperationStatus::Running => StatusKind::Running,
            OperationStatus::Done(_) => StatusKind::Done,
            OperationStatus::Error(_) => StatusKind::Error,
        }
    }

    /// Turn a final status into the operation's result, or hand the status
    /// back if it is not final yet
    pub fn into_result(self) -> Result<Result<T, OperationFailure>, Self> {
        match self {
            OperationStatus::Done(value) => Ok(Ok(value)),
            OperationStatus::Error(failure) => Ok(Err(failure)),
            other => Err(other),
        }
    }
}
//
impl<T> From<Result<T, OperationFailure>> for OperationStatus<T> {
    fn from(result: Result<T, OperationFailure>) -> Self {
        match result {
            Ok(value) => OperationStatus::Done(value),
            Err(failure) => OperationStatus::Error(failure),
        }
    }
}


/// Check if an operation status is final (i.e. won't change anymore)
pub fn is_final<T>(s: &OperationStatus<T>) -> bool {
    s.kind().is_final()
}


/// Status of an operation, stripped of its payload
///
/// This is what gets reported to monitoring code, which has no business
/// looking at operation results.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusKind {
    Pending,
    Running,
    Done,
    Error,
    /// The final result was already handed over to the client
    Consumed,
}
//
impl StatusKind {
    /// Check if this status won't change anymore
    pub fn is_final(self) -> bool {
        match self {
            StatusKind::Pending | StatusKind::Running => false,
            StatusKind::Done | StatusKind::Error | StatusKind::Consumed => true,
        }
    }
}


/// Reasons why a deferred operation may fail instead of resolving
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OperationFailure {
    /// The operation was configured to fail
    Injected { index: usize },

    /// The timer backing the operation could not be scheduled
    Timer { index: usize, reason: String },

    /// The operation was dropped, or its consumer was resumed, before a
    /// final status was reached
    Abandoned { index: usize },
}
//
impl OperationFailure {
    /// Index of the operation which failed
    pub fn index(&self) -> usize {
        match *self {
            OperationFailure::Injected { index }
            | OperationFailure::Timer { index, .. }
            | OperationFailure::Abandoned { index } => index,
        }
    }
}
//
impl fmt::Display for OperationFailure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            OperationFailure::Injected { index } => {
                write!(f, "operation {} failed: injected failure", index)
            }
            OperationFailure::Timer { index, ref reason } => {
                write!(f, "operation {} failed: cannot schedule timer ({})",
                       index, reason)
            }
            OperationFailure::Abandoned { index } => {
                write!(f, "operation {} failed: abandoned before completion",
                       index)
            }
        }
    }
}
//
impl Error for OperationFailure {}
