//! Aggregation of streamed, repeating, unordered child updates into a
//! stable snapshot.
//!
//! The store offers no "every replica has answered" event, so a collection
//! is committed when one of these happens first:
//!
//! 1. every subscription reports [`SubscriptionEvent::Synced`] (when the
//!    store supports it and the config honours it),
//! 2. the [`Quiescence`] deadline passes,
//! 3. every subscription closes.
//!
//! Reducers ([`ComponentSet`], [`PageIndexSet`]) are plain data structures
//! so their merge rules can be tested without a runtime.

pub mod components;
pub mod index;

use std::time::Duration;

use futures::StreamExt;
use futures::stream::select_all;
use serde_json::Value;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::AggregationConfig;
use crate::logging::debug;
use crate::store::{Subscription, SubscriptionEvent};

pub use components::{ComponentSet, aggregate_components};
pub use index::{PageIndex, PageIndexSet, aggregate_index};

/// When a subscription is judged to have gone quiet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quiescence {
    /// Commit a fixed time after the subscription starts.
    Fixed(Duration),
    /// Commit after `idle` without a new or changed key, and never later
    /// than `max` after the subscription starts.
    Debounce { idle: Duration, max: Duration },
}

/// Why a collection was committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitReason {
    /// The store confirmed its snapshot was fully delivered.
    Synced,
    /// The quiescence deadline passed.
    Quiet,
    /// Every subscription closed (or none could be opened).
    Closed,
}

/// Result of one aggregation run.
#[derive(Debug, Clone, PartialEq)]
pub enum Aggregation<T> {
    Committed { value: T, reason: CommitReason },
    /// The caller's cancellation token fired before commit.
    Cancelled,
}

impl<T> Aggregation<T> {
    /// The committed value, if any.
    pub fn into_value(self) -> Option<T> {
        match self {
            Aggregation::Committed { value, .. } => Some(value),
            Aggregation::Cancelled => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Aggregation::Cancelled)
    }
}

/// Deadline tracker for one aggregation run.
#[derive(Debug, Clone)]
pub(crate) struct QuiescenceTimer {
    policy: Quiescence,
    started: Instant,
    deadline: Instant,
}

impl QuiescenceTimer {
    pub(crate) fn start(policy: Quiescence) -> Self {
        let started = Instant::now();
        let deadline = match policy {
            Quiescence::Fixed(window) => started + window,
            Quiescence::Debounce { idle, max } => started + idle.min(max),
        };
        Self {
            policy,
            started,
            deadline,
        }
    }

    /// Record that the snapshot changed.
    pub(crate) fn touch(&mut self) {
        if let Quiescence::Debounce { idle, max } = self.policy {
            self.deadline = (Instant::now() + idle).min(self.started + max);
        }
    }

    pub(crate) fn deadline(&self) -> Instant {
        self.deadline
    }
}

/// Drive `streams` until commit, feeding every child update to `offer`.
///
/// `offer` returns whether the update changed the snapshot; only changes
/// push a debounce deadline back. Returns `None` when cancelled. The
/// subscriptions are dropped (and so unregistered) before returning.
pub(crate) async fn collect<K, F>(
    streams: Vec<(K, Subscription)>,
    config: &AggregationConfig,
    cancel: &CancellationToken,
    mut offer: F,
) -> Option<CommitReason>
where
    K: Copy + Unpin,
    F: FnMut(K, String, Value) -> bool,
{
    let expected = streams.len();
    if expected == 0 {
        return Some(CommitReason::Closed);
    }

    let mut merged = select_all(
        streams
            .into_iter()
            .map(|(tag, subscription)| subscription.map(move |event| (tag, event))),
    );
    let mut timer = QuiescenceTimer::start(config.quiescence());
    let mut synced = 0usize;
    let mut updates = 0usize;

    let reason = loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => return None,

            _ = tokio::time::sleep_until(timer.deadline()) => break CommitReason::Quiet,

            event = merged.next() => match event {
                Some((tag, SubscriptionEvent::Child { key, value })) => {
                    updates += 1;
                    if offer(tag, key, value) {
                        timer.touch();
                    }
                }
                Some((_, SubscriptionEvent::Synced)) => {
                    synced += 1;
                    if config.use_sync_marker && synced >= expected {
                        break CommitReason::Synced;
                    }
                }
                None => break CommitReason::Closed,
            },
        }
    };

    debug!(?reason, updates, subscriptions = expected, "aggregation committed");
    Some(reason)
}
