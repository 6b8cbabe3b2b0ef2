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

//! World state access.
//!
//! The world state is the replicated key-value snapshot every entity lives
//! in. This crate only needs per-call atomicity from it: serializing
//! concurrent writers to the same key is the host's job.

use crate::canonical::CanonicalBytes;
use crate::error::{FareError, StoreError};
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::ops::Bound;

/// Key-value persistence consumed by the registry and the ledger.
pub trait WorldState: Send + Sync {
    /// Returns the value stored under `key`, if any.
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Stores `value` under `key`, replacing any previous value.
    fn put_state(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Removes `key`. Removing an absent key is not an error.
    fn delete_state(&self, key: &str) -> Result<(), StoreError>;

    /// Returns all entries in `[start, end)` in key order.
    ///
    /// An empty `start` or `end` leaves that side unbounded, so
    /// `get_state_by_range("", "")` is a full scan.
    fn get_state_by_range(&self, start: &str, end: &str)
    -> Result<Vec<(String, Vec<u8>)>, StoreError>;
}

/// Writes canonically encoded bytes.
pub(crate) fn put_canonical(
    state: &dyn WorldState,
    key: &str,
    bytes: &CanonicalBytes,
) -> Result<(), FareError> {
    state.put_state(key, bytes.as_bytes())?;
    Ok(())
}

/// Reads a key, treating an empty value the same as an absent one.
pub(crate) fn get_present(state: &dyn WorldState, key: &str) -> Result<Option<Vec<u8>>, FareError> {
    Ok(state.get_state(key)?.filter(|value| !value.is_empty()))
}

/// SHA-256 over the full ordered contents of a world state, hex encoded.
///
/// Each key and value is length-prefixed so that distinct states never
/// share a preimage. Two replicas that applied the same operations with
/// the same clock and fare ids produce the same digest.
pub fn state_digest(state: &dyn WorldState) -> Result<String, FareError> {
    let mut hasher = Sha256::new();
    for (key, value) in state.get_state_by_range("", "")? {
        hasher.update((key.len() as u64).to_be_bytes());
        hasher.update(key.as_bytes());
        hasher.update((value.len() as u64).to_be_bytes());
        hasher.update(&value);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// In-process world state backed by an ordered map.
#[derive(Debug, Default)]
pub struct MemoryWorldState {
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryWorldState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl WorldState for MemoryWorldState {
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn put_state(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        if key.is_empty() {
            return Err(StoreError("key must not be empty".to_string()));
        }
        self.entries.write().insert(key.to_owned(), value.to_vec());
        Ok(())
    }

    fn delete_state(&self, key: &str) -> Result<(), StoreError> {
        self.entries.write().remove(key);
        Ok(())
    }

    fn get_state_by_range(
        &self,
        start: &str,
        end: &str,
    ) -> Result<Vec<(String, Vec<u8>)>, StoreError> {
        let lower = if start.is_empty() {
            Bound::Unbounded
        } else {
            Bound::Included(start)
        };
        let upper = if end.is_empty() {
            Bound::Unbounded
        } else {
            Bound::Excluded(end)
        };
        if let (Bound::Included(s), Bound::Excluded(e)) = (lower, upper) {
            if s >= e {
                return Ok(Vec::new());
            }
        }

        let entries = self.entries.read();
        Ok(entries
            .range::<str, _>((lower, upper))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}
