//! Track which peers can supply which items, and pick the next peer to ask.
//!
//! When a peer announces that it holds some item (i.e. a block identified by its digest), the
//! announcement is recorded in a [RequestQueue]. When it is time to request the item, the peer
//! that announced it first (and has not been asked or disconnected since) is selected with
//! [RequestQueue::dequeue_best].
//!
//! # Indices
//!
//! The queue maintains two views of the same set of `(key, requester)` pairs:
//! - For each key, the requesters that announced it, oldest first.
//! - For each requester, the keys it is queued for.
//!
//! Both views stay consistent under any interleaving of operations and every operation costs
//! `O(1)` amortized per pair it touches:
//! - [RequestQueue::clear] drops a key that is no longer needed (i.e. it was obtained elsewhere).
//! - [RequestQueue::forget] drops a requester (i.e. the peer disconnected).
//!
//! A key is removed as soon as its last requester is removed. A requester is only removed by
//! [RequestQueue::forget], even if it has nothing queued.
//!
//! # Example
//!
//! ```rust
//! use commonware_inventory::{Config, Error, RequestQueue};
//!
//! let mut queue = RequestQueue::new(Config::default());
//! assert_eq!(queue.enqueue(100u64, 200u32), 1);
//! assert_eq!(queue.enqueue(100u64, 201u32), 1);
//! assert_eq!(queue.enqueue(101u64, 201u32), 2);
//!
//! // Peer 201 disconnects
//! queue.forget(&201);
//! assert!(!queue.contains(&101));
//!
//! assert_eq!(queue.dequeue_best(&100), Ok(200));
//! assert_eq!(queue.dequeue_best(&100), Err(Error::NotFound));
//! assert_eq!(queue.queued(&200), Some(0));
//! ```

use thiserror::Error;

mod config;
pub use config::{Config, Duplicate};
mod metrics;
mod queue;
pub use queue::RequestQueue;

/// Errors that can occur when interacting with a [RequestQueue].
#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("no requester queued for key")]
    NotFound,
}
