//! Benefit-bucketed eviction store.
//!
//! [`CraBlock`] clusters resident entries by their caching benefit (the
//! delta between miss and hit penalty) into a small set of ranked lists and
//! picks eviction victims by a rank that blends benefit with recency. It is
//! a building block: the segmented policies compose three of them, the
//! single-block policy wraps one.
//!
//! # Layout
//!
//! Entries live in a flat slot arena linked through `u32` indices. Slots
//! `0..=max_lists` are the circular sentinels, one per bucket; data slots
//! are allocated above them and recycled through a free list. Bucket 0
//! holds negative-delta entries and is always drained first; buckets
//! `1..=max_lists` partition the non-negative delta range linearly under
//! the current normalization. Within a bucket, the sentinel's `next` is the
//! least recently touched entry and its `prev` the most recent.

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;

use crate::event::AccessEvent;

/// A resident cache entry.
#[derive(Debug)]
pub struct Node {
    event: AccessEvent,
    weight: u32,
    last_op: u64,
    epoch: u64,
    list_index: usize,
}

impl Node {
    /// The trace event this entry was admitted with, including any learned
    /// penalty updates.
    pub fn event(&self) -> &AccessEvent {
        &self.event
    }

    /// The entry's byte weight at admission time.
    pub fn weight(&self) -> u32 {
        self.weight
    }
}

/// One arena slot: link words plus the payload for data slots.
///
/// Sentinels and free slots carry no node.
struct Slot {
    prev: u32,
    next: u32,
    node: Option<Node>,
}

/// Outcome of [`CraBlock::record`].
#[derive(Debug)]
pub enum RecordResult {
    /// The key was resident with a non-negative delta and was refreshed.
    Hit,
    /// The key was resident but its delta turned negative; the entry was
    /// discarded.
    Expired,
    /// The key was absent and has been handled as an insertion attempt.
    Miss {
        /// Keys evicted to make room, in eviction order.
        evicted: Vec<u64>,
        /// True when the admission arbiter turned the candidate away; the
        /// candidate was not inserted.
        rejected: bool,
    },
    /// The event's weight exceeds the block capacity; nothing changed.
    Dropped,
}

/// Outcome of touching a resident entry.
#[derive(Debug)]
pub enum AccessResult {
    /// The entry stays resident, re-bucketed and moved to its bucket's
    /// most-recent position.
    Retained,
    /// The entry's delta is negative; it was unlinked and returned.
    Removed(Node),
}

/// Benefit-bucketed, rank-evicting store over a bounded weight capacity.
pub struct CraBlock {
    slots: Vec<Slot>,
    free: Vec<u32>,
    index: FxHashMap<u64, u32>,
    active_lists: BTreeSet<usize>,
    list_sizes: Vec<usize>,
    capacity: u64,
    current_size: u64,
    curr_op: u64,
    req_count: u64,
    reset_epoch: u64,
    k: f64,
    max_lists: usize,
    bias: f64,
    factor: f64,
}

impl CraBlock {
    /// Creates an empty block.
    ///
    /// `k` is the rank exponent trading benefit against recency,
    /// `max_lists` the number of non-negative-delta buckets, and
    /// `capacity` the maximum total resident weight.
    pub fn new(k: f64, max_lists: usize, capacity: u64) -> Self {
        let slots = (0..=max_lists as u32)
            .map(|i| Slot {
                prev: i,
                next: i,
                node: None,
            })
            .collect();
        Self {
            slots,
            free: Vec::new(),
            index: FxHashMap::default(),
            active_lists: BTreeSet::new(),
            list_sizes: vec![0; max_lists + 1],
            capacity,
            current_size: 0,
            curr_op: 1,
            req_count: 0,
            reset_epoch: 0,
            k,
            max_lists,
            bias: 0.0,
            factor: 0.0,
        }
    }

    /// Installs the normalization published by the owning policy.
    ///
    /// Resident entries are not re-bucketed eagerly; each one picks up the
    /// new mapping on its next touch.
    pub fn set_normalization(&mut self, bias: f64, factor: f64) {
        self.bias = bias;
        self.factor = factor;
    }

    /// Number of resident entries.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// True when nothing is resident.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Sum of resident weights.
    pub fn current_size(&self) -> u64 {
        self.current_size
    }

    /// Maximum total resident weight.
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Number of non-negative-delta buckets.
    pub fn max_lists(&self) -> usize {
        self.max_lists
    }

    /// The operation counter's current value.
    pub fn current_op(&self) -> u64 {
        self.curr_op
    }

    /// True when `key` is resident.
    pub fn contains(&self, key: u64) -> bool {
        self.index.contains_key(&key)
    }

    /// The resident event for `key`, if any.
    pub fn event_of(&self, key: u64) -> Option<&AccessEvent> {
        self.index
            .get(&key)
            .map(|&slot| &self.slots[slot as usize].node.as_ref().unwrap().event)
    }

    /// Number of entries in bucket `list`.
    pub fn list_len(&self, list: usize) -> usize {
        self.list_sizes[list]
    }

    /// Bucket indices that currently hold entries, ascending.
    pub fn active_lists(&self) -> impl Iterator<Item = usize> + '_ {
        self.active_lists.iter().copied()
    }

    /// Maps a delta to its bucket under the current normalization.
    ///
    /// Negative deltas land in bucket 0. Non-negative deltas are scaled
    /// into `1..=max_lists`; when the normalization factor is still zero
    /// the scale collapses and everything lands in bucket 1.
    pub fn bucket_index(&self, delta: f64) -> usize {
        if delta < 0.0 {
            return 0;
        }
        let scaled = (delta - self.bias) / self.factor * (self.max_lists as f64 + 1.0);
        (scaled as i64).clamp(1, self.max_lists as i64) as usize
    }

    /// Folds a newly observed hit penalty into the resident entry.
    pub fn update_hit_penalty(&mut self, key: u64, hit_penalty: f64) {
        if let Some(&slot) = self.index.get(&key) {
            self.slots[slot as usize]
                .node
                .as_mut()
                .unwrap()
                .event
                .update_hit_penalty(hit_penalty);
        }
    }

    /// Counts a request landing on this block and ages the operation
    /// counter once per `capacity` requests.
    fn note_request(&mut self) {
        self.req_count += 1;
        if self.req_count > self.capacity {
            self.req_count = 0;
            self.curr_op >>= 1;
            self.reset_epoch += 1;
        }
    }

    /// Allocates a slot for `node`, reusing a freed one when available.
    fn alloc(&mut self, node: Node) -> u32 {
        if let Some(slot) = self.free.pop() {
            self.slots[slot as usize].node = Some(node);
            slot
        } else {
            self.slots.push(Slot {
                prev: 0,
                next: 0,
                node: Some(node),
            });
            (self.slots.len() - 1) as u32
        }
    }

    /// Links `slot` at the most-recent end of `list`.
    fn link_tail(&mut self, slot: u32, list: usize) {
        let sentinel = list as u32;
        let tail = self.slots[sentinel as usize].prev;
        self.slots[slot as usize].prev = tail;
        self.slots[slot as usize].next = sentinel;
        self.slots[tail as usize].next = slot;
        self.slots[sentinel as usize].prev = slot;
        self.slots[slot as usize].node.as_mut().unwrap().list_index = list;
        self.list_sizes[list] += 1;
        self.active_lists.insert(list);
    }

    /// Unlinks `slot` from its bucket.
    fn unlink(&mut self, slot: u32) {
        let list = self.slots[slot as usize].node.as_ref().unwrap().list_index;
        let prev = self.slots[slot as usize].prev;
        let next = self.slots[slot as usize].next;
        self.slots[prev as usize].next = next;
        self.slots[next as usize].prev = prev;
        self.list_sizes[list] -= 1;
        if self.list_sizes[list] == 0 {
            self.active_lists.remove(&list);
        }
    }

    /// Stamps `slot` with the current operation counter.
    fn touch(&mut self, slot: u32) {
        let op = self.curr_op;
        self.curr_op += 1;
        let epoch = self.reset_epoch;
        let node = self.slots[slot as usize].node.as_mut().unwrap();
        node.last_op = op;
        node.epoch = epoch;
    }

    /// Inserts a brand-new entry for `event` without any eviction.
    fn insert_new(&mut self, event: AccessEvent) {
        let key = event.key();
        let weight = event.weight();
        let bucket = self.bucket_index(event.delta());
        let node = Node {
            event,
            weight,
            last_op: 0,
            epoch: self.reset_epoch,
            list_index: bucket,
        };
        self.current_size += u64::from(weight);
        let slot = self.alloc(node);
        self.link_tail(slot, bucket);
        self.touch(slot);
        self.index.insert(key, slot);
    }

    /// Admits `event` as a fresh entry, counting the request.
    ///
    /// No capacity enforcement happens here; callers that bound the block
    /// by weight go through [`CraBlock::record`], callers that bound it by
    /// entry count (the segmented policies) evict through their own
    /// bookkeeping.
    pub fn insert_event(&mut self, event: AccessEvent) {
        self.note_request();
        self.insert_new(event);
    }

    /// Re-homes an entry that migrated from a sibling block.
    ///
    /// The event (with any learned penalties) and the weight survive the
    /// move; the entry is stamped with this block's operation counter and
    /// re-bucketed under this block's normalization.
    pub fn insert_node(&mut self, node: Node) {
        let key = node.event.key();
        let bucket = self.bucket_index(node.event.delta());
        self.current_size += u64::from(node.weight);
        let slot = self.alloc(node);
        self.link_tail(slot, bucket);
        self.touch(slot);
        self.index.insert(key, slot);
    }

    /// Unlinks `key` and returns its node for migration or disposal.
    pub fn remove(&mut self, key: u64) -> Option<Node> {
        let slot = self.index.remove(&key)?;
        self.unlink(slot);
        let node = self.slots[slot as usize].node.take().unwrap();
        self.free.push(slot);
        self.current_size -= u64::from(node.weight);
        Some(node)
    }

    /// Touches a resident entry, counting the request.
    ///
    /// A non-negative delta re-buckets the entry under the current
    /// normalization and moves it to its bucket's most-recent position. A
    /// negative delta unlinks the entry; keeping it can only lose time.
    pub fn on_access(&mut self, key: u64) -> AccessResult {
        self.note_request();
        let slot = *self
            .index
            .get(&key)
            .expect("on_access requires a resident key");
        self.access_slot(slot)
    }

    fn access_slot(&mut self, slot: u32) -> AccessResult {
        let (key, delta) = {
            let node = self.slots[slot as usize].node.as_ref().unwrap();
            (node.event.key(), node.event.delta())
        };
        if delta < 0.0 {
            self.index.remove(&key);
            self.unlink(slot);
            let node = self.slots[slot as usize].node.take().unwrap();
            self.free.push(slot);
            self.current_size -= u64::from(node.weight);
            return AccessResult::Removed(node);
        }
        let bucket = self.bucket_index(delta);
        self.unlink(slot);
        self.link_tail(slot, bucket);
        self.touch(slot);
        AccessResult::Retained
    }

    /// Returns the key of the best eviction candidate.
    ///
    /// Bucket 0 is drained oldest-first before anything else. Otherwise
    /// each active bucket nominates its least recently touched entry and
    /// the smallest rank wins:
    ///
    /// ```text
    /// age  = max(1, curr_op - last_op)
    /// rank = sign(delta) * |delta| ^ (age ^ -k)
    /// ```
    ///
    /// A fresh entry (age 1) is ranked by its full delta; a stale one has
    /// its rank flattened toward the sign of its delta, so old entries
    /// compete on recency rather than benefit. Rank ties go to the entry
    /// touched longest ago. Entries predating the last counter aging have
    /// their `last_op` halved before scoring.
    ///
    /// # Panics
    ///
    /// Panics when the block is empty; callers only evict from non-empty
    /// blocks, so an empty victim search is a bookkeeping bug.
    pub fn find_victim(&mut self) -> u64 {
        if self.active_lists.contains(&0) {
            let head = self.slots[0].next;
            return self.slots[head as usize].node.as_ref().unwrap().event.key();
        }

        let lists: Vec<usize> = self.active_lists.iter().copied().collect();
        let mut best: Option<(f64, u64, u64)> = None;
        for list in lists {
            let candidate = self.slots[list].next;
            {
                let reset_epoch = self.reset_epoch;
                let node = self.slots[candidate as usize].node.as_mut().unwrap();
                if node.epoch < reset_epoch {
                    node.last_op = (node.last_op >> 1).max(1);
                    node.epoch = reset_epoch;
                }
            }
            let node = self.slots[candidate as usize].node.as_ref().unwrap();
            let delta = node.event.delta();
            let age = self.curr_op.saturating_sub(node.last_op).max(1) as f64;
            let rank = delta.signum() * delta.abs().powf(age.powf(-self.k));
            let better = match best {
                None => true,
                Some((best_rank, best_last_op, _)) => {
                    rank < best_rank || (rank == best_rank && node.last_op < best_last_op)
                }
            };
            if better {
                best = Some((rank, node.last_op, node.event.key()));
            }
        }

        match best {
            Some((_, _, key)) => key,
            None => panic!(
                "victim search on empty block (size={}, capacity={})",
                self.current_size, self.capacity
            ),
        }
    }

    /// Replays one trace event against the block with admission always
    /// granted.
    pub fn record(&mut self, event: AccessEvent) -> RecordResult {
        self.record_with(event, |_, _| true)
    }

    /// Replays one trace event against the block.
    ///
    /// A resident key is refreshed with the event's penalties and touched.
    /// An absent key becomes an insertion: while the block is over
    /// capacity, `admit` arbitrates between the candidate and the current
    /// victim; a refused candidate is dropped, otherwise victims are
    /// evicted until the candidate fits.
    pub fn record_with(
        &mut self,
        event: AccessEvent,
        mut admit: impl FnMut(&AccessEvent, &AccessEvent) -> bool,
    ) -> RecordResult {
        self.note_request();

        if let Some(&slot) = self.index.get(&event.key()) {
            self.slots[slot as usize]
                .node
                .as_mut()
                .unwrap()
                .event
                .update_penalties(event.hit_penalty(), event.miss_penalty());
            return match self.access_slot(slot) {
                AccessResult::Retained => RecordResult::Hit,
                AccessResult::Removed(_) => RecordResult::Expired,
            };
        }

        let weight = u64::from(event.weight());
        if weight > self.capacity {
            return RecordResult::Dropped;
        }

        self.current_size += weight;
        let mut evicted = Vec::new();
        while self.current_size > self.capacity {
            let victim_key = self.find_victim();
            let victim = self.event_of(victim_key).unwrap();
            if admit(&event, victim) {
                self.remove(victim_key);
                evicted.push(victim_key);
            } else {
                self.current_size -= weight;
                return RecordResult::Miss {
                    evicted,
                    rejected: true,
                };
            }
        }
        self.current_size -= weight;
        self.insert_new(event);
        RecordResult::Miss {
            evicted,
            rejected: false,
        }
    }
}
