//! Sequential execution of deferred operations
//!
//! Picture a fixed list of operations which each take a while to complete,
//! say because they wait on a timer. They must run one after another: the
//! next one may only start once the result of the previous one has been
//! observed. There are many ways to express this, and this crate shows three
//! of them side by side, built on a common model of deferred operations.
//!
//! - A hand-rolled coroutine, resumed by a driving function every time the
//!   operation it is suspended on resolves ([`drivers::generator`])
//! - A plain `async fn` awaiting each operation in turn ([`drivers::linear`])
//! - A chain of continuations folded up front, each link starting its
//!   operation once its predecessor is done ([`drivers::chain`])
//!
//! All three print the same kind of output, stop at the first failure, can
//! be cancelled between operations, and publish their progress for
//! lock-free monitoring.

pub mod client;
pub mod config;
pub mod console;
pub mod deferred;
pub mod drivers;
pub mod progress;
pub mod server;
pub mod status;
pub mod tasks;
pub mod timer;
