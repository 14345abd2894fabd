//! Concurrent Storage Engine for Perishable Orders
//!
//! This module implements the core of hotshelf: three bounded pools, the
//! freshness bookkeeping for every order they hold, and the operations an
//! orchestrator uses to place, relocate, evict and pick up orders.
//!
//! ## Design Decisions
//!
//! 1. **One lock per pool**: the heater, cooler and shelf are locked independently,
//!    so work on different pools never serializes.
//! 2. **Lazy decay**: freshness is settled only when an order is touched; no ticker.
//! 3. **State follows the order**: each pool's lock guards its members, the decay
//!    records of those members and (for the shelf) the expiry index.
//! 4. **Source-then-try-destination**: a move holds the shelf lock and only *tries*
//!    the destination lock, skipping the candidate if it is busy.
//! 5. **Single owner**: an id → pool map records where each tracked order lives.
//!    It is a leaf lock: taken only while already holding the pool lock(s) of the
//!    operation, held briefly, and never held while waiting on a pool lock.
//!
//! ## Concurrency Model
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     StorageEngine                           │
//! │  ┌──────────────┐  ┌──────────────┐  ┌───────────────────┐  │
//! │  │   HEATER     │  │   COOLER     │  │      SHELF        │  │
//! │  │   Mutex      │  │   Mutex      │  │      Mutex        │  │
//! │  │   members    │  │   members    │  │      members      │  │
//! │  │   decay      │  │   decay      │  │      decay        │  │
//! │  │              │  │              │  │      expiry index │  │
//! │  └──────▲───────┘  └──────▲───────┘  └─────────┬─────────┘  │
//! │         └──── try_lock ───┴──── move (holds) ──┘            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! A caller blocked on the shelf lock while holding the cooler lock cannot
//! deadlock against a move: the move never waits for the cooler.

use crate::model::{Admission, DiscardEvent, MoveEvent, Order, RemoveResult, StorageType, Temperature};
use crate::storage::clock::{Clock, SystemClock};
use crate::storage::config::{ConfigError, StorageConfig};
use crate::storage::decay::{decay_rate, Decay, DecayLedger};
use crate::storage::expiry::ExpiryIndex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace, warn};

/// Everything guarded by one pool's lock.
#[derive(Debug, Default)]
struct PoolState {
    /// Members in admission order
    members: VecDeque<Order>,
    /// Decay records of the members, keyed by order id
    decay: DecayLedger,
    /// Predicted expiries; only populated for the overflow pool
    expiry: ExpiryIndex,
}

impl PoolState {
    fn position(&self, id: &str) -> Option<usize> {
        self.members.iter().position(|order| order.id == id)
    }
}

/// A single pool: its capacity and its guarded state.
#[derive(Debug)]
struct Pool {
    capacity: usize,
    state: Mutex<PoolState>,
}

impl Pool {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(PoolState::default()),
        }
    }
}

/// The storage engine.
///
/// Holds the pool table, the decay ledger and the shelf expiry index, and
/// exposes the atomic operations an orchestrator builds its placement
/// policy from.
///
/// # Thread Safety
///
/// Wrap it in an `Arc` and share it between workers. Every operation locks
/// only the pool(s) it touches.
///
/// # Example
///
/// ```
/// use hotshelf::storage::{now_micros, StorageEngine};
/// use hotshelf::{Order, StorageType, Temperature};
///
/// let engine = StorageEngine::new();
/// let soup = Order::new("o1", "Soup", Temperature::Hot, 120, now_micros());
///
/// assert!(engine.try_add(StorageType::Heater, soup));
/// assert_eq!(engine.len(StorageType::Heater), 1);
///
/// let result = engine.remove_by_id(StorageType::Heater, "o1");
/// assert!(result.removed);
/// assert!(!result.expired);
/// ```
pub struct StorageEngine {
    /// Pools indexed by `StorageType::index`
    pools: [Pool; 3],

    /// Pool currently holding each tracked order
    owners: Mutex<HashMap<String, StorageType>>,

    /// Source of "now" for decay settlement
    clock: Arc<dyn Clock>,

    /// Statistics: successful admissions
    placed_count: AtomicU64,

    /// Statistics: admissions refused because the pool was full
    rejected_count: AtomicU64,

    /// Statistics: orders moved from the shelf to their ideal pool
    moved_count: AtomicU64,

    /// Statistics: orders evicted from the shelf
    discarded_count: AtomicU64,

    /// Statistics: orders removed by id
    removed_count: AtomicU64,

    /// Statistics: orders that were already spoiled when removed by id
    expired_count: AtomicU64,
}

impl std::fmt::Debug for StorageEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageEngine")
            .field("clock", &self.clock)
            .field("heater_capacity", &self.capacity(StorageType::Heater))
            .field("cooler_capacity", &self.capacity(StorageType::Cooler))
            .field("shelf_capacity", &self.capacity(StorageType::Shelf))
            .field("placed_count", &self.placed_count.load(Ordering::Relaxed))
            .finish()
    }
}

impl Default for StorageEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageEngine {
    /// Creates an engine with default capacities and the wall clock.
    pub fn new() -> Self {
        Self::build(StorageConfig::default(), Arc::new(SystemClock))
    }

    /// Creates an engine with custom capacities and the wall clock.
    pub fn with_config(config: StorageConfig) -> Result<Self, ConfigError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates an engine with custom capacities and time source.
    pub fn with_clock(config: StorageConfig, clock: Arc<dyn Clock>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config, clock))
    }

    fn build(config: StorageConfig, clock: Arc<dyn Clock>) -> Self {
        let pools = StorageType::ALL.map(|kind| Pool::new(config.capacity(kind)));

        Self {
            pools,
            owners: Mutex::new(HashMap::new()),
            clock,
            placed_count: AtomicU64::new(0),
            rejected_count: AtomicU64::new(0),
            moved_count: AtomicU64::new(0),
            discarded_count: AtomicU64::new(0),
            removed_count: AtomicU64::new(0),
            expired_count: AtomicU64::new(0),
        }
    }

    #[inline]
    fn pool(&self, kind: StorageType) -> &Pool {
        &self.pools[kind.index()]
    }

    /// Acquires a pool's lock, waiting if necessary.
    ///
    /// Pool state is only mutated after every fallible step of an operation,
    /// so a poisoned lock still guards consistent state and is recovered.
    fn lock(&self, kind: StorageType) -> MutexGuard<'_, PoolState> {
        self.pool(kind)
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Attempts a pool's lock without waiting. Poisoned counts as busy.
    fn try_lock(&self, kind: StorageType) -> Option<MutexGuard<'_, PoolState>> {
        self.pool(kind).state.try_lock().ok()
    }

    /// Acquires the ownership map. Callers already hold the pool lock(s) they
    /// mutate.
    fn owners(&self) -> MutexGuard<'_, HashMap<String, StorageType>> {
        self.owners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drops the ownership entry of `id` if `kind` still owns it.
    fn release(&self, id: &str, kind: StorageType) {
        let mut owners = self.owners();
        if owners.get(id) == Some(&kind) {
            owners.remove(id);
        }
    }

    /// Inserts an already-settled order into a locked pool.
    fn admit(&self, kind: StorageType, state: &mut PoolState, order: Order, decay: Decay, now: i64) {
        if kind.is_overflow() {
            let expires_at = decay.predicted_expiry(decay_rate(order.temp, kind), now);
            trace!(id = %order.id, expires_at, "Indexed shelf expiry");
            state.expiry.insert(order.id.clone(), expires_at);
        }
        state.decay.insert(order.id.clone(), decay);
        state.members.push_back(order);
    }

    /// Returns the configured capacity of a pool.
    #[inline]
    pub fn capacity(&self, kind: StorageType) -> usize {
        self.pool(kind).capacity
    }

    /// Reads the engine's clock.
    #[inline]
    pub fn now_micros(&self) -> i64 {
        self.clock.now_micros()
    }

    /// Returns the ideal pool for a temperature class.
    #[inline]
    pub fn ideal_for(&self, temp: Temperature) -> StorageType {
        temp.ideal_storage()
    }

    /// Attempts to admit `order` to `kind`.
    ///
    /// Returns `false` if the pool is full or the id is already tracked in
    /// any pool; nothing changes in that case. See [`try_admit`](Self::try_admit).
    pub fn try_add(&self, kind: StorageType, order: Order) -> bool {
        self.try_admit(kind, order).is_admitted()
    }

    /// Attempts to admit `order` to `kind`, reporting why it was refused.
    ///
    /// Starts the order's decay record at its placement time and charges the
    /// interval up to now at the rate of `kind`. On the shelf, the order is
    /// also indexed by predicted expiry.
    ///
    /// The id is claimed in the ownership map under the pool lock, so two
    /// concurrent admissions of the same id to different pools cannot both
    /// succeed.
    pub fn try_admit(&self, kind: StorageType, order: Order) -> Admission {
        let pool = self.pool(kind);
        let mut state = self.lock(kind);

        {
            let mut owners = self.owners();

            if let Some(&owner) = owners.get(&order.id) {
                warn!(id = %order.id, pool = %kind, owner = %owner, "Order already stored, admission refused");
                return Admission::AlreadyStored(owner);
            }

            if state.members.len() >= pool.capacity {
                self.rejected_count.fetch_add(1, Ordering::Relaxed);
                debug!(id = %order.id, pool = %kind, capacity = pool.capacity, "Pool full, admission refused");
                return Admission::Full;
            }

            owners.insert(order.id.clone(), kind);
        }

        let now = self.clock.now_micros();
        let decay = Decay::start(&order).settled(decay_rate(order.temp, kind), now);

        trace!(
            id = %order.id,
            pool = %kind,
            remaining_micros = decay.remaining_micros,
            "Order admitted"
        );

        self.admit(kind, &mut state, order, decay, now);
        self.placed_count.fetch_add(1, Ordering::Relaxed);
        Admission::Admitted
    }

    /// Moves the first shelf order whose ideal pool has room back to it.
    ///
    /// Candidates are scanned in shelf admission order. The destination lock is
    /// only tried, never waited on; a busy or full destination skips to the
    /// next candidate. Room-temperature orders are already in their ideal pool
    /// and are never candidates.
    ///
    /// # Returns
    ///
    /// The move performed, or `None` if no candidate could be relocated.
    pub fn try_move_one_from_overflow(&self) -> Option<MoveEvent> {
        let from = StorageType::OVERFLOW;
        let mut shelf = self.lock(from);

        for pos in 0..shelf.members.len() {
            let to = shelf.members[pos].ideal_storage();
            if to == from {
                continue;
            }

            let Some(mut dest) = self.try_lock(to) else {
                debug!(id = %shelf.members[pos].id, pool = %to, "Destination busy, skipping candidate");
                continue;
            };

            if dest.members.len() >= self.capacity(to) {
                continue;
            }

            let Some(order) = shelf.members.remove(pos) else {
                continue;
            };

            let now = self.clock.now_micros();
            shelf.expiry.remove(&order.id);
            let decay = shelf
                .decay
                .remove(&order.id)
                .unwrap_or_else(|| Decay::start(&order))
                .settled(decay_rate(order.temp, from), now);

            debug!(
                id = %order.id,
                from = %from,
                to = %to,
                remaining_micros = decay.remaining_micros,
                "Moved order off the shelf"
            );

            self.owners().insert(order.id.clone(), to);
            self.admit(to, &mut dest, order.clone(), decay, now);
            self.moved_count.fetch_add(1, Ordering::Relaxed);

            return Some(MoveEvent { order, from, to });
        }

        None
    }

    /// Evicts the shelf order with the earliest predicted expiry.
    ///
    /// The order is evicted whether or not it has actually spoiled yet.
    ///
    /// # Returns
    ///
    /// The eviction, or `None` if the shelf index is empty or pointed at an
    /// order that is no longer on the shelf.
    pub fn discard_min_from_overflow(&self) -> Option<DiscardEvent> {
        let from = StorageType::OVERFLOW;
        let mut shelf = self.lock(from);

        let (id, expires_at) = shelf.expiry.pop_min()?;

        let Some(order) = shelf.position(&id).and_then(|pos| shelf.members.remove(pos)) else {
            warn!(id = %id, expires_at, "Expiry index referenced an order not on the shelf");
            shelf.decay.remove(&id);
            self.release(&id, from);
            return None;
        };

        self.release(&id, from);
        let now = self.clock.now_micros();
        let decay = shelf
            .decay
            .remove(&id)
            .unwrap_or_else(|| Decay::start(&order))
            .settled(decay_rate(order.temp, from), now);

        debug!(
            id = %id,
            expires_at,
            remaining_micros = decay.remaining_micros,
            "Discarded soonest-to-expire shelf order"
        );

        self.discarded_count.fetch_add(1, Ordering::Relaxed);
        Some(DiscardEvent { order, from })
    }

    /// Removes an order by id and reports whether it had spoiled.
    ///
    /// Pools are small, so the member lookup is a linear scan.
    pub fn remove_by_id(&self, kind: StorageType, id: &str) -> RemoveResult {
        let mut state = self.lock(kind);

        let Some(order) = state.position(id).and_then(|pos| state.members.remove(pos)) else {
            trace!(id = %id, pool = %kind, "Order not found");
            return RemoveResult::NOT_FOUND;
        };

        self.release(id, kind);
        let now = self.clock.now_micros();
        state.expiry.remove(id);
        let decay = state
            .decay
            .remove(id)
            .unwrap_or_else(|| Decay::start(&order))
            .settled(decay_rate(order.temp, kind), now);

        let expired = decay.is_expired();
        self.removed_count.fetch_add(1, Ordering::Relaxed);
        if expired {
            self.expired_count.fetch_add(1, Ordering::Relaxed);
        }

        trace!(
            id = %id,
            pool = %kind,
            remaining_micros = decay.remaining_micros,
            expired,
            "Order removed"
        );

        RemoveResult::removed(expired)
    }

    /// Returns the number of orders in a pool.
    pub fn len(&self, kind: StorageType) -> usize {
        self.lock(kind).members.len()
    }

    /// Returns true if the pool holds no orders.
    pub fn is_empty(&self, kind: StorageType) -> bool {
        self.len(kind) == 0
    }

    /// Returns true if the pool is at capacity.
    pub fn is_full(&self, kind: StorageType) -> bool {
        self.len(kind) >= self.capacity(kind)
    }

    /// Checks whether a pool holds the order with this id.
    pub fn contains(&self, kind: StorageType, id: &str) -> bool {
        self.lock(kind).decay.get(id).is_some()
    }

    /// Returns the pool currently holding `id`.
    ///
    /// A snapshot: a concurrent move may relocate the order right after.
    pub fn location(&self, id: &str) -> Option<StorageType> {
        self.owners().get(id).copied()
    }

    /// Returns a snapshot of a pool's orders in admission order.
    pub fn orders(&self, kind: StorageType) -> Vec<Order> {
        self.lock(kind).members.iter().cloned().collect()
    }

    /// Returns the freshness an order would have if settled now.
    ///
    /// Read-only: the stored record is not advanced.
    pub fn remaining_micros(&self, kind: StorageType, id: &str) -> Option<i64> {
        let state = self.lock(kind);
        let order = state.members.iter().find(|order| order.id == id)?;
        let decay = state.decay.get(id)?;
        let now = self.clock.now_micros();
        Some(decay.settled(decay_rate(order.temp, kind), now).remaining_micros)
    }

    /// Returns the predicted expiry of a shelf order.
    pub fn predicted_expiry(&self, id: &str) -> Option<i64> {
        self.lock(StorageType::OVERFLOW).expiry.expiry_of(id)
    }

    /// Returns the total number of orders across all pools.
    pub fn total_len(&self) -> usize {
        StorageType::ALL.iter().map(|&kind| self.len(kind)).sum()
    }

    /// Returns engine statistics.
    pub fn stats(&self) -> StorageStats {
        StorageStats {
            orders: self.total_len() as u64,
            placed: self.placed_count.load(Ordering::Relaxed),
            rejected: self.rejected_count.load(Ordering::Relaxed),
            moved: self.moved_count.load(Ordering::Relaxed),
            discarded: self.discarded_count.load(Ordering::Relaxed),
            removed: self.removed_count.load(Ordering::Relaxed),
            expired_on_removal: self.expired_count.load(Ordering::Relaxed),
        }
    }
}

/// Engine statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StorageStats {
    /// Number of orders currently stored
    pub orders: u64,
    /// Successful admissions
    pub placed: u64,
    /// Admissions refused because the pool was full
    pub rejected: u64,
    /// Orders moved off the shelf
    pub moved: u64,
    /// Orders evicted from the shelf
    pub discarded: u64,
    /// Orders removed by id
    pub removed: u64,
    /// Orders removed by id after their freshness ran out
    pub expired_on_removal: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::clock::{now_micros, ManualClock};

    const SEC: i64 = 1_000_000;

    fn order(id: &str, temp: Temperature, freshness_secs: u32, placed_at: i64) -> Order {
        Order::new(id, "Dish", temp, freshness_secs, placed_at)
    }

    fn manual_engine(start: i64) -> (StorageEngine, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(start));
        let engine = StorageEngine::with_clock(StorageConfig::default(), clock.clone()).unwrap();
        (engine, clock)
    }

    #[test]
    fn test_heater_capacity() {
        let engine = StorageEngine::new();
        let now = now_micros();

        for i in 1..=6 {
            assert!(engine.try_add(StorageType::Heater, order(&format!("h{}", i), Temperature::Hot, 60, now)));
        }
        assert!(engine.is_full(StorageType::Heater));

        let before = engine.orders(StorageType::Heater);
        assert!(!engine.try_add(StorageType::Heater, order("hX", Temperature::Hot, 60, now)));
        assert_eq!(engine.orders(StorageType::Heater), before);
        assert!(!engine.contains(StorageType::Heater, "hX"));
        assert_eq!(engine.stats().rejected, 1);
    }

    #[test]
    fn test_configured_capacity() {
        let config = StorageConfig {
            heater_capacity: 1,
            cooler_capacity: 2,
            shelf_capacity: 3,
        };
        let engine = StorageEngine::with_config(config).unwrap();
        assert_eq!(engine.capacity(StorageType::Heater), 1);
        assert_eq!(engine.capacity(StorageType::Cooler), 2);
        assert_eq!(engine.capacity(StorageType::Shelf), 3);

        let now = now_micros();
        assert!(engine.try_add(StorageType::Heater, order("a", Temperature::Hot, 60, now)));
        assert!(!engine.try_add(StorageType::Heater, order("b", Temperature::Hot, 60, now)));

        assert!(StorageEngine::with_config(StorageConfig {
            shelf_capacity: 0,
            ..Default::default()
        })
        .is_err());
    }

    #[test]
    fn test_duplicate_admission_refused() {
        let (engine, _clock) = manual_engine(0);
        assert!(engine.try_add(StorageType::Cooler, order("c1", Temperature::Cold, 10, 0)));
        assert!(!engine.try_add(StorageType::Cooler, order("c1", Temperature::Cold, 10, 0)));
        assert_eq!(engine.len(StorageType::Cooler), 1);
    }

    #[test]
    fn test_admission_refused_when_tracked_elsewhere() {
        let (engine, clock) = manual_engine(0);
        assert!(engine.try_add(StorageType::Shelf, order("x", Temperature::Hot, 20, 0)));

        clock.advance(3 * SEC);
        assert_eq!(
            engine.try_admit(StorageType::Heater, order("x", Temperature::Hot, 20, 0)),
            Admission::AlreadyStored(StorageType::Shelf)
        );

        // one home, one record, still charged at the shelf rate
        assert!(engine.is_empty(StorageType::Heater));
        assert_eq!(engine.location("x"), Some(StorageType::Shelf));
        assert_eq!(engine.remaining_micros(StorageType::Shelf, "x"), Some(14 * SEC));
        assert_eq!(engine.stats().rejected, 0);

        // once it is gone the id can be stored again
        assert!(engine.remove_by_id(StorageType::Shelf, "x").removed);
        assert_eq!(engine.location("x"), None);
        assert!(engine.try_add(StorageType::Heater, order("x", Temperature::Hot, 20, 3 * SEC)));
        assert_eq!(engine.location("x"), Some(StorageType::Heater));
    }

    #[test]
    fn test_full_pool_reported_before_claiming_id() {
        let config = StorageConfig {
            heater_capacity: 1,
            ..Default::default()
        };
        let engine = StorageEngine::with_config(config).unwrap();
        let now = now_micros();

        assert!(engine.try_add(StorageType::Heater, order("a", Temperature::Hot, 60, now)));
        assert_eq!(
            engine.try_admit(StorageType::Heater, order("b", Temperature::Hot, 60, now)),
            Admission::Full
        );
        assert_eq!(engine.location("b"), None);
        assert!(engine.try_add(StorageType::Shelf, order("b", Temperature::Hot, 60, now)));
    }

    #[test]
    fn test_location_follows_order() {
        let (engine, _clock) = manual_engine(0);
        assert!(engine.try_add(StorageType::Shelf, order("c", Temperature::Cold, 20, 0)));
        assert!(engine.try_add(StorageType::Shelf, order("r", Temperature::Room, 5, 0)));
        assert_eq!(engine.location("c"), Some(StorageType::Shelf));

        assert!(engine.try_move_one_from_overflow().is_some());
        assert_eq!(engine.location("c"), Some(StorageType::Cooler));

        assert_eq!(engine.discard_min_from_overflow().map(|e| e.order.id), Some("r".to_string()));
        assert_eq!(engine.location("r"), None);
    }

    #[test]
    fn test_concurrent_same_id_admission() {
        use std::sync::Barrier;
        use std::thread;

        for _ in 0..200 {
            let engine = Arc::new(StorageEngine::new());
            let now = now_micros();
            for i in 0..5 {
                assert!(engine.try_add(StorageType::Heater, order(&format!("h{}", i), Temperature::Hot, 60, now)));
            }

            let barrier = Arc::new(Barrier::new(2));
            let workers: Vec<_> = (0..2)
                .map(|_| {
                    let engine = Arc::clone(&engine);
                    let barrier = Arc::clone(&barrier);
                    thread::spawn(move || {
                        barrier.wait();
                        let dup = order("dup", Temperature::Hot, 60, now);
                        engine.try_add(StorageType::Heater, dup.clone()) || engine.try_add(StorageType::Shelf, dup)
                    })
                })
                .collect();

            let admitted = workers
                .into_iter()
                .map(|worker| worker.join().unwrap())
                .filter(|&ok| ok)
                .count();
            let homes = StorageType::ALL
                .iter()
                .filter(|&&kind| engine.contains(kind, "dup"))
                .count();

            assert_eq!(admitted, 1);
            assert_eq!(homes, 1);
        }
    }

    #[test]
    fn test_expired_when_placed_on_shelf_in_the_past() {
        let engine = StorageEngine::new();
        // 3s budget, placed 2s ago, non-ideal shelf at rate 2 => ~4s consumed
        let yogurt = order("exp1", Temperature::Cold, 3, now_micros() - 2 * SEC);

        assert!(engine.try_add(StorageType::Shelf, yogurt));
        assert!(engine.remaining_micros(StorageType::Shelf, "exp1").unwrap() <= 0);

        let result = engine.remove_by_id(StorageType::Shelf, "exp1");
        assert_eq!(result, RemoveResult::removed(true));
        assert_eq!(engine.stats().expired_on_removal, 1);
    }

    #[test]
    fn test_not_expired_on_ideal_within_budget() {
        let engine = StorageEngine::new();
        // 5s budget, placed 3s ago, ideal heater at rate 1 => ~2s left
        let soup = order("hot1", Temperature::Hot, 5, now_micros() - 3 * SEC);

        assert!(engine.try_add(StorageType::Heater, soup));
        let result = engine.remove_by_id(StorageType::Heater, "hot1");
        assert!(result.removed);
        assert!(!result.expired);
    }

    #[test]
    fn test_ideal_rate_is_one() {
        let (engine, clock) = manual_engine(100 * SEC);
        assert!(engine.try_add(StorageType::Heater, order("h", Temperature::Hot, 10, 100 * SEC)));

        clock.advance(3 * SEC);
        assert_eq!(engine.remaining_micros(StorageType::Heater, "h"), Some(7 * SEC));

        clock.advance(7 * SEC);
        assert_eq!(engine.remaining_micros(StorageType::Heater, "h"), Some(0));
        assert_eq!(engine.remove_by_id(StorageType::Heater, "h"), RemoveResult::removed(true));
    }

    #[test]
    fn test_overflow_rate_is_two() {
        let (engine, clock) = manual_engine(0);
        assert!(engine.try_add(StorageType::Shelf, order("c", Temperature::Cold, 10, 0)));

        clock.advance(4 * SEC);
        assert_eq!(engine.remaining_micros(StorageType::Shelf, "c"), Some(2 * SEC));
        assert_eq!(engine.remove_by_id(StorageType::Shelf, "c"), RemoveResult::removed(false));
    }

    #[test]
    fn test_room_order_on_shelf_decays_at_one() {
        let (engine, clock) = manual_engine(0);
        assert!(engine.try_add(StorageType::Shelf, order("r", Temperature::Room, 10, 0)));
        assert_eq!(engine.predicted_expiry("r"), Some(10 * SEC));

        clock.advance(4 * SEC);
        assert_eq!(engine.remaining_micros(StorageType::Shelf, "r"), Some(6 * SEC));
    }

    #[test]
    fn test_decay_accrues_per_segment_across_move() {
        let (engine, clock) = manual_engine(0);
        assert!(engine.try_add(StorageType::Shelf, order("c", Temperature::Cold, 20, 0)));

        // 3s on the shelf at rate 2
        clock.advance(3 * SEC);
        let moved = engine.try_move_one_from_overflow().unwrap();
        assert_eq!(moved.to, StorageType::Cooler);
        assert_eq!(engine.remaining_micros(StorageType::Cooler, "c"), Some(14 * SEC));

        // 4s in the cooler at rate 1
        clock.advance(4 * SEC);
        assert_eq!(engine.remaining_micros(StorageType::Cooler, "c"), Some(10 * SEC));

        // peeking never advances the record
        clock.advance(SEC);
        assert_eq!(engine.remaining_micros(StorageType::Cooler, "c"), Some(9 * SEC));
        assert_eq!(engine.remaining_micros(StorageType::Cooler, "c"), Some(9 * SEC));
    }

    #[test]
    fn test_placement_interval_charged_at_target_rate() {
        let (engine, _clock) = manual_engine(5 * SEC);
        // Placed at t=0, admitted at t=5s: 5s are charged at the shelf rate
        assert!(engine.try_add(StorageType::Shelf, order("c", Temperature::Cold, 20, 0)));
        assert_eq!(engine.remaining_micros(StorageType::Shelf, "c"), Some(10 * SEC));
        // 10s left at rate 2 => 5s from now
        assert_eq!(engine.predicted_expiry("c"), Some(10 * SEC));
    }

    #[test]
    fn test_move_to_cooler_with_capacity() {
        let engine = StorageEngine::new();
        assert!(engine.try_add(StorageType::Shelf, order("c1", Temperature::Cold, 30, now_micros())));

        let event = engine.try_move_one_from_overflow().unwrap();
        assert_eq!(event.order.id, "c1");
        assert_eq!(event.from, StorageType::Shelf);
        assert_eq!(event.to, StorageType::Cooler);

        assert!(!engine.contains(StorageType::Shelf, "c1"));
        assert!(engine.predicted_expiry("c1").is_none());
        assert!(engine.remove_by_id(StorageType::Cooler, "c1").removed);
        assert_eq!(engine.stats().moved, 1);
    }

    #[test]
    fn test_no_move_when_cooler_full() {
        let engine = StorageEngine::new();
        let now = now_micros();
        for i in 1..=6 {
            assert!(engine.try_add(StorageType::Cooler, order(&format!("cc{}", i), Temperature::Cold, 60, now)));
        }
        assert!(engine.try_add(StorageType::Shelf, order("c-extra", Temperature::Cold, 60, now)));

        assert!(engine.try_move_one_from_overflow().is_none());
        assert!(engine.remove_by_id(StorageType::Shelf, "c-extra").removed);
    }

    #[test]
    fn test_move_skips_room_and_blocked_candidates() {
        let (engine, _clock) = manual_engine(0);
        for i in 1..=6 {
            assert!(engine.try_add(StorageType::Heater, order(&format!("h{}", i), Temperature::Hot, 60, 0)));
        }
        assert!(engine.try_add(StorageType::Shelf, order("room", Temperature::Room, 60, 0)));
        assert!(engine.try_add(StorageType::Shelf, order("hot", Temperature::Hot, 60, 0)));
        assert!(engine.try_add(StorageType::Shelf, order("cold", Temperature::Cold, 60, 0)));

        let event = engine.try_move_one_from_overflow().unwrap();
        assert_eq!(event.order.id, "cold");
        assert_eq!(engine.len(StorageType::Shelf), 2);

        // Only one move per call, and nothing else is movable now
        assert!(engine.try_move_one_from_overflow().is_none());
    }

    #[test]
    fn test_move_picks_first_in_admission_order() {
        let (engine, _clock) = manual_engine(0);
        assert!(engine.try_add(StorageType::Shelf, order("first", Temperature::Hot, 60, 0)));
        assert!(engine.try_add(StorageType::Shelf, order("second", Temperature::Cold, 5, 0)));

        let event = engine.try_move_one_from_overflow().unwrap();
        assert_eq!(event.order.id, "first");
        assert_eq!(event.to, StorageType::Heater);
    }

    #[test]
    fn test_move_skips_busy_destination() {
        let (engine, _clock) = manual_engine(0);
        assert!(engine.try_add(StorageType::Shelf, order("hot", Temperature::Hot, 60, 0)));
        assert!(engine.try_add(StorageType::Shelf, order("cold", Temperature::Cold, 60, 0)));

        let heater = engine.lock(StorageType::Heater);
        let event = engine.try_move_one_from_overflow().unwrap();
        drop(heater);

        assert_eq!(event.order.id, "cold");
        assert!(engine.contains(StorageType::Shelf, "hot"));
    }

    #[test]
    fn test_discard_soonest_expiry() {
        let engine = StorageEngine::new();
        let now = now_micros();
        let fast = order("fast", Temperature::Cold, 2, now - 2 * SEC);
        let slow = order("slow", Temperature::Cold, 20, now);

        assert!(engine.try_add(StorageType::Shelf, slow));
        assert!(engine.try_add(StorageType::Shelf, fast));

        let event = engine.discard_min_from_overflow().unwrap();
        assert_eq!(event.order.id, "fast");
        assert_eq!(event.from, StorageType::Shelf);
        assert!(!engine.contains(StorageType::Shelf, "fast"));

        assert!(engine.remove_by_id(StorageType::Shelf, "slow").removed);
        assert!(engine.discard_min_from_overflow().is_none());
    }

    #[test]
    fn test_discard_does_not_require_expiry() {
        let (engine, _clock) = manual_engine(0);
        assert!(engine.try_add(StorageType::Shelf, order("a", Temperature::Hot, 100, 0)));
        assert!(engine.try_add(StorageType::Shelf, order("b", Temperature::Room, 40, 0)));

        // a: 100s at rate 2 => 50s; b: 40s at rate 1 => 40s
        let event = engine.discard_min_from_overflow().unwrap();
        assert_eq!(event.order.id, "b");
        assert_eq!(engine.stats().discarded, 1);
    }

    #[test]
    fn test_discard_with_inconsistent_index() {
        let (engine, _clock) = manual_engine(0);
        assert!(engine.try_add(StorageType::Shelf, order("ghost", Temperature::Cold, 5, 0)));
        assert!(engine.try_add(StorageType::Shelf, order("real", Temperature::Cold, 50, 0)));

        {
            let mut shelf = engine.lock(StorageType::Shelf);
            let pos = shelf.position("ghost").unwrap();
            shelf.members.remove(pos);
        }

        assert!(engine.discard_min_from_overflow().is_none());
        assert!(!engine.contains(StorageType::Shelf, "ghost"));
        assert_eq!(engine.location("ghost"), None);
        // the next call is not affected
        assert_eq!(engine.discard_min_from_overflow().unwrap().order.id, "real");
    }

    #[test]
    fn test_reentering_shelf_gets_new_prediction() {
        let (engine, clock) = manual_engine(0);
        assert!(engine.try_add(StorageType::Shelf, order("c", Temperature::Cold, 20, 0)));
        assert_eq!(engine.predicted_expiry("c"), Some(10 * SEC));

        assert!(engine.remove_by_id(StorageType::Shelf, "c").removed);
        assert!(engine.predicted_expiry("c").is_none());

        clock.set(2 * SEC);
        assert!(engine.try_add(StorageType::Shelf, order("c", Temperature::Cold, 20, 2 * SEC)));
        assert_eq!(engine.predicted_expiry("c"), Some(12 * SEC));
    }

    #[test]
    fn test_remove_missing() {
        let engine = StorageEngine::new();
        assert_eq!(engine.remove_by_id(StorageType::Shelf, "missing"), RemoveResult::NOT_FOUND);
    }

    #[test]
    fn test_remove_clears_all_state() {
        let (engine, _clock) = manual_engine(0);
        assert!(engine.try_add(StorageType::Shelf, order("c", Temperature::Cold, 20, 0)));
        assert!(engine.remove_by_id(StorageType::Shelf, "c").removed);

        let shelf = engine.lock(StorageType::Shelf);
        assert!(shelf.members.is_empty());
        assert!(shelf.decay.is_empty());
        assert!(shelf.expiry.is_empty());
    }

    #[test]
    fn test_remove_from_wrong_pool() {
        let (engine, _clock) = manual_engine(0);
        assert!(engine.try_add(StorageType::Heater, order("h", Temperature::Hot, 20, 0)));
        assert_eq!(engine.remove_by_id(StorageType::Shelf, "h"), RemoveResult::NOT_FOUND);
        assert!(engine.contains(StorageType::Heater, "h"));
    }

    #[test]
    fn test_stats() {
        let (engine, _clock) = manual_engine(0);
        assert!(engine.try_add(StorageType::Shelf, order("a", Temperature::Cold, 20, 0)));
        assert!(engine.try_add(StorageType::Shelf, order("b", Temperature::Hot, 20, 0)));
        engine.try_move_one_from_overflow();
        engine.discard_min_from_overflow();

        let stats = engine.stats();
        assert_eq!(stats.placed, 2);
        assert_eq!(stats.moved, 1);
        assert_eq!(stats.discarded, 1);
        assert_eq!(stats.orders, 1);
    }

    #[test]
    fn test_concurrent_access() {
        use std::thread;

        let engine = Arc::new(StorageEngine::new());
        let mut handles = vec![];

        for i in 0..8 {
            let engine = Arc::clone(&engine);
            handles.push(thread::spawn(move || {
                let temp = Temperature::ALL[i % 3];
                for j in 0..200 {
                    let id = format!("o-{}-{}", i, j);
                    let placed = order(&id, temp, 60, now_micros());
                    let ideal = placed.ideal_storage();

                    let pool = if engine.try_add(ideal, placed.clone()) {
                        ideal
                    } else if engine.try_add(StorageType::Shelf, placed) {
                        StorageType::Shelf
                    } else {
                        engine.try_move_one_from_overflow();
                        engine.discard_min_from_overflow();
                        continue;
                    };

                    for kind in StorageType::ALL {
                        assert!(engine.len(kind) <= engine.capacity(kind));
                    }

                    if j % 2 == 0 {
                        engine.try_move_one_from_overflow();
                    } else {
                        engine.remove_by_id(pool, &id);
                    }
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        let owned = engine.owners().len();
        assert_eq!(owned, engine.total_len());

        for kind in StorageType::ALL {
            let state = engine.lock(kind);
            assert!(state.members.len() <= engine.capacity(kind));
            assert_eq!(state.members.len(), state.decay.len());
            if kind.is_overflow() {
                assert_eq!(state.members.len(), state.expiry.len());
            } else {
                assert!(state.expiry.is_empty());
            }
        }
    }

    #[test]
    fn test_membership_exclusive_under_moves() {
        use std::thread;

        let engine = Arc::new(StorageEngine::new());
        let now = now_micros();
        for i in 0..12 {
            let temp = if i % 2 == 0 { Temperature::Hot } else { Temperature::Cold };
            assert!(engine.try_add(StorageType::Shelf, order(&format!("s{}", i), temp, 600, now)));
        }

        let movers: Vec<_> = (0..4)
            .map(|_| {
                let engine = Arc::clone(&engine);
                thread::spawn(move || while engine.try_move_one_from_overflow().is_some() {})
            })
            .collect();
        for mover in movers {
            mover.join().unwrap();
        }

        assert_eq!(engine.total_len(), 12);
        assert_eq!(engine.len(StorageType::Heater), 6);
        assert_eq!(engine.len(StorageType::Cooler), 6);
        assert!(engine.is_empty(StorageType::Shelf));
        for i in 0..12 {
            let id = format!("s{}", i);
            let homes = StorageType::ALL
                .iter()
                .filter(|&&kind| engine.contains(kind, &id))
                .count();
            assert_eq!(homes, 1);
        }
    }
}
