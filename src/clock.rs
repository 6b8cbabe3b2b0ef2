// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Wall clock and fare identifier sources.
//!
//! Both are collaborators the engine consults but does not own. Swapping in
//! [`ManualClock`] and [`SequentialFareIds`] makes a run fully reproducible,
//! which is what replays and convergence checks rely on.

use crate::base::{FareId, FareTimestamp};
use chrono::{Local, TimeDelta};
use parking_lot::Mutex;
use rand::Rng;
use rand::distributions::Alphanumeric;
use std::sync::atomic::{AtomicU64, Ordering};

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> FareTimestamp;
}

/// Source of fresh fare identifiers.
pub trait FareIdGenerator: Send + Sync {
    fn next_id(&self) -> FareId;
}

/// Local wall clock, truncated to seconds.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> FareTimestamp {
        FareTimestamp::from_naive(Local::now().naive_local())
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<FareTimestamp>,
}

impl ManualClock {
    pub fn new(start: FareTimestamp) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, to: FareTimestamp) {
        *self.now.lock() = to;
    }

    pub fn advance(&self, by: TimeDelta) {
        let mut now = self.now.lock();
        *now = now.advanced_by(by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> FareTimestamp {
        *self.now.lock()
    }
}

/// Random alphanumeric identifiers.
///
/// 32 characters over a 62-symbol alphabet is about 190 bits, so
/// collisions are not a practical concern and no existence check is made
/// before a fare is written.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomFareIds;

impl RandomFareIds {
    pub const LENGTH: usize = 32;
}

impl FareIdGenerator for RandomFareIds {
    fn next_id(&self) -> FareId {
        let id: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(Self::LENGTH)
            .map(char::from)
            .collect();
        FareId(id)
    }
}

/// Deterministic identifiers `<prefix><n>`, starting at 1.
#[derive(Debug)]
pub struct SequentialFareIds {
    prefix: String,
    next: AtomicU64,
}

impl SequentialFareIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl FareIdGenerator for SequentialFareIds {
    fn next_id(&self) -> FareId {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        FareId(format!("{}{}", self.prefix, n))
    }
}
