//! Per-agent move countdowns on a shared simulation clock.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::trace;

use crate::types::EntityId;

#[derive(Clone, Debug)]
struct Timer {
    entity: EntityId,
    interval_ms: u64,
    remaining_ms: u64,
}

#[derive(Clone, Debug)]
pub struct Scheduler {
    timers: Vec<Timer>,
    variation_ms: u64,
    rng: StdRng,
    armed: bool,
}

impl Scheduler {
    pub fn new(variation_ms: u64, seed: u64) -> Self {
        Self {
            timers: Vec::new(),
            variation_ms,
            rng: StdRng::seed_from_u64(seed),
            armed: false,
        }
    }

    /// Adds an agent after every agent already registered.
    pub fn register(&mut self, entity: EntityId, interval_ms: u64) {
        if self.timers.iter().any(|timer| timer.entity == entity) {
            return;
        }
        let interval_ms = interval_ms.max(1);
        self.timers.push(Timer {
            entity,
            interval_ms,
            remaining_ms: if self.armed { interval_ms / 2 } else { 0 },
        });
    }

    pub fn unregister(&mut self, entity: EntityId) {
        self.timers.retain(|timer| timer.entity != entity);
    }

    /// Takes effect from the agent's next reset.
    pub fn set_interval(&mut self, entity: EntityId, interval_ms: u64) -> bool {
        match self.timers.iter_mut().find(|timer| timer.entity == entity) {
            Some(timer) => {
                timer.interval_ms = interval_ms.max(1);
                true
            }
            None => false,
        }
    }

    pub fn interval_of(&self, entity: EntityId) -> Option<u64> {
        self.timers
            .iter()
            .find(|timer| timer.entity == entity)
            .map(|timer| timer.interval_ms)
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Starts every countdown at half its interval.
    pub fn arm(&mut self) {
        for timer in &mut self.timers {
            timer.remaining_ms = timer.interval_ms / 2;
        }
        self.armed = true;
    }

    /// Drops every pending move.
    pub fn disarm(&mut self) {
        for timer in &mut self.timers {
            timer.remaining_ms = 0;
        }
        self.armed = false;
    }

    /// Advances the clock by `dt_ms` and returns the agents due to move, in
    /// registration order. An agent fires at most once per call.
    pub fn advance(&mut self, dt_ms: u64) -> Vec<EntityId> {
        if !self.armed {
            return Vec::new();
        }
        let mut due = Vec::new();
        for idx in 0..self.timers.len() {
            let remaining = self.timers[idx].remaining_ms.saturating_sub(dt_ms);
            if remaining > 0 {
                self.timers[idx].remaining_ms = remaining;
                continue;
            }
            let next = self.next_countdown(self.timers[idx].interval_ms);
            let timer = &mut self.timers[idx];
            timer.remaining_ms = next;
            trace!(entity = timer.entity.0, next_ms = next, "agent due");
            due.push(timer.entity);
        }
        due
    }

    fn next_countdown(&mut self, interval_ms: u64) -> u64 {
        if self.variation_ms == 0 {
            return interval_ms;
        }
        interval_ms + self.rng.random_range(0..=self.variation_ms)
    }
}
