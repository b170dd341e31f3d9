/// Behavior of [crate::RequestQueue::enqueue] when the requester is already queued for the key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Duplicate {
    /// Leave the requester at its original position.
    #[default]
    Ignore,

    /// Move the requester to the tail of the queue, as if it announced the key for the first time.
    MoveToTail,
}

/// Configuration for a [crate::RequestQueue].
#[derive(Clone, Debug)]
pub struct Config {
    /// What to do when a requester re-announces a key it is already queued for.
    pub duplicate: Duplicate,

    /// Initial capacity of the key index (number of distinct keys expected).
    pub key_capacity: usize,

    /// Initial capacity of the requester index (number of peers expected).
    pub requester_capacity: usize,

    /// Initial capacity of the node arena (number of `(key, requester)` pairs expected).
    pub pending_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            duplicate: Duplicate::Ignore,
            key_capacity: 0,
            requester_capacity: 0,
            pending_capacity: 0,
        }
    }
}
