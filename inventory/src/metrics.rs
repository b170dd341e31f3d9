use prometheus_client::{
    metrics::{counter::Counter, gauge::Gauge},
    registry::Registry,
};

/// Metrics for a [crate::RequestQueue].
#[derive(Default)]
pub struct Metrics {
    /// Number of keys with at least one queued requester
    pub keys: Gauge,
    /// Number of registered requesters (including those with nothing queued)
    pub requesters: Gauge,
    /// Number of queued `(key, requester)` pairs
    pub pending: Gauge,
    /// Number of requesters appended to a queue
    pub enqueued: Counter,
    /// Number of enqueues for an already queued `(key, requester)` pair
    pub duplicates: Counter,
    /// Number of requesters returned by `dequeue_best`
    pub dequeued: Counter,
    /// Number of `dequeue_best` calls for a key with no queue
    pub misses: Counter,
    /// Number of keys dropped by `clear` or `retain`
    pub cleared: Counter,
    /// Number of registered requesters dropped by `forget`
    pub forgotten: Counter,
}

impl Metrics {
    /// Register all metrics in the provided registry.
    pub fn register(&self, registry: &mut Registry) {
        registry.register(
            "keys",
            "Number of keys with at least one queued requester",
            self.keys.clone(),
        );
        registry.register(
            "requesters",
            "Number of registered requesters",
            self.requesters.clone(),
        );
        registry.register(
            "pending",
            "Number of queued (key, requester) pairs",
            self.pending.clone(),
        );
        registry.register(
            "enqueued",
            "Number of requesters appended to a queue",
            self.enqueued.clone(),
        );
        registry.register(
            "duplicates",
            "Number of enqueues for an already queued pair",
            self.duplicates.clone(),
        );
        registry.register(
            "dequeued",
            "Number of requesters selected for a key",
            self.dequeued.clone(),
        );
        registry.register(
            "misses",
            "Number of selections for a key with no queue",
            self.misses.clone(),
        );
        registry.register("cleared", "Number of keys cleared", self.cleared.clone());
        registry.register(
            "forgotten",
            "Number of requesters forgotten",
            self.forgotten.clone(),
        );
    }
}
