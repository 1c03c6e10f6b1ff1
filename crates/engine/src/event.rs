//! Trace access events.
//!
//! An [`AccessEvent`] is one record of a replayed trace: a 64-bit key plus
//! the service latencies the trace observed for a cache hit and for a cache
//! miss on that key. The difference between the two penalties (the *delta*)
//! is the time saved per hit and drives every latency-aware policy in this
//! crate.

/// A single trace record: key, byte weight, and the observed service
/// penalties.
///
/// `delta()` may be negative, meaning servicing a miss is cheaper than a
/// hit; policies drop such entries on their next touch.
#[derive(Clone, Debug, PartialEq)]
pub struct AccessEvent {
    key: u64,
    weight: u32,
    hit_penalty: f64,
    miss_penalty: f64,
}

impl AccessEvent {
    /// Creates an event with the default weight of 1.
    pub fn new(key: u64, hit_penalty: f64, miss_penalty: f64) -> Self {
        Self {
            key,
            weight: 1,
            hit_penalty,
            miss_penalty,
        }
    }

    /// Creates an event carrying an explicit byte weight.
    pub fn with_weight(key: u64, weight: u32, hit_penalty: f64, miss_penalty: f64) -> Self {
        Self {
            key,
            weight,
            hit_penalty,
            miss_penalty,
        }
    }

    /// The 64-bit key identifying the cached object.
    pub fn key(&self) -> u64 {
        self.key
    }

    /// Byte cost of keeping this object resident.
    pub fn weight(&self) -> u32 {
        self.weight
    }

    /// Time to service this request when the object is resident.
    pub fn hit_penalty(&self) -> f64 {
        self.hit_penalty
    }

    /// Time to service this request when the object is absent.
    pub fn miss_penalty(&self) -> f64 {
        self.miss_penalty
    }

    /// The benefit of caching this object: time saved per hit.
    pub fn delta(&self) -> f64 {
        self.miss_penalty - self.hit_penalty
    }

    /// Folds a newly observed hit penalty into the event.
    ///
    /// Resident entries learn better latency estimates over time; the
    /// updated penalty changes `delta()` and therefore the entry's
    /// eviction bucket on its next touch.
    pub fn update_hit_penalty(&mut self, hit_penalty: f64) {
        self.hit_penalty = hit_penalty;
    }

    /// Replaces both penalties with newly observed values.
    pub fn update_penalties(&mut self, hit_penalty: f64, miss_penalty: f64) {
        self.hit_penalty = hit_penalty;
        self.miss_penalty = miss_penalty;
    }

    /// True when either penalty is NaN; such events are unrepresentable
    /// and dropped by every policy.
    pub fn has_nan_penalty(&self) -> bool {
        self.hit_penalty.is_nan() || self.miss_penalty.is_nan()
    }
}
