//! Kitchen Action Ledger
//!
//! Every successful step the kitchen takes is reported as an [`Action`]:
//! one per placement, move, pickup and discard. Where those actions end up
//! is up to the [`ActionSink`]; this crate only ships an in-memory one.

use crate::model::StorageType;
use std::fmt;
use std::sync::{Mutex, PoisonError};

/// What happened to an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionType {
    /// Order placed into a pool
    Place,
    /// Order moved between pools
    Move,
    /// Order picked up while still fresh
    Pickup,
    /// Order thrown away (evicted, or spoiled at pickup)
    Discard,
}

impl ActionType {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionType::Place => "place",
            ActionType::Move => "move",
            ActionType::Pickup => "pickup",
            ActionType::Discard => "discard",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A timestamped ledger entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    /// When the action happened (microseconds since the Unix epoch)
    pub timestamp_micros: i64,
    /// Order id
    pub id: String,
    pub action: ActionType,
    /// Pool the action targeted: the destination of a place or move, the
    /// source of a pickup or discard
    pub target: StorageType,
}

impl Action {
    pub fn new(timestamp_micros: i64, id: impl Into<String>, action: ActionType, target: StorageType) -> Self {
        Self {
            timestamp_micros,
            id: id.into(),
            action,
            target,
        }
    }
}

/// Destination for kitchen actions.
pub trait ActionSink: Send + Sync {
    fn record(&self, action: Action);
}

/// Keeps every action in memory.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    actions: Mutex<Vec<Action>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all actions ordered by timestamp.
    pub fn actions(&self) -> Vec<Action> {
        let mut actions = self
            .actions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        actions.sort_by_key(|a| a.timestamp_micros);
        actions
    }

    /// Returns the actions with `start <= timestamp <= end`, ordered by timestamp.
    pub fn between(&self, start_micros: i64, end_micros: i64) -> Vec<Action> {
        self.actions()
            .into_iter()
            .filter(|a| a.timestamp_micros >= start_micros && a.timestamp_micros <= end_micros)
            .collect()
    }

    /// Returns the actions recorded for one order, in timestamp order.
    pub fn for_order(&self, id: &str) -> Vec<Action> {
        self.actions().into_iter().filter(|a| a.id == id).collect()
    }

    pub fn len(&self) -> usize {
        self.actions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ActionSink for MemoryLedger {
    fn record(&self, action: Action) {
        self.actions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(action);
    }
}
