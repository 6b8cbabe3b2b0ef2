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

//! Fare records and the append-only ledger that stores them.

use crate::base::{DocType, FareId, FareTimestamp, TransitId};
use crate::canonical::{CanonicalBytes, decode_document};
use crate::clock::FareIdGenerator;
use crate::error::FareError;
use crate::store::{self, WorldState};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// A single charge. Immutable once written.
///
/// There is no pointer back to the customer; ownership is only recorded
/// on the customer side through `LastTxnId`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Fare {
    #[serde(rename = "ID")]
    pub id: FareId,
    #[serde(rename = "Transit")]
    pub transit: TransitId,
    /// `"0"` for a free re-entry.
    #[serde(rename = "Amount")]
    pub amount: Decimal,
    /// Charge time, or the start of the open transfer window.
    #[serde(rename = "Timestamp")]
    pub timestamp: FareTimestamp,
    #[serde(rename = "docType")]
    pub doc_type: DocType,
}

impl Fare {
    pub fn new(id: FareId, transit: TransitId, amount: Decimal, timestamp: FareTimestamp) -> Self {
        Self {
            id,
            transit,
            amount,
            timestamp,
            doc_type: DocType::Fare,
        }
    }

    pub fn to_canonical(&self) -> Result<CanonicalBytes, FareError> {
        CanonicalBytes::new(&self.id.0, self)
    }
}

/// Append-only store of fares.
#[derive(Clone)]
pub struct FareLedger {
    state: Arc<dyn WorldState>,
    ids: Arc<dyn FareIdGenerator>,
}

impl FareLedger {
    pub fn new(state: Arc<dyn WorldState>, ids: Arc<dyn FareIdGenerator>) -> Self {
        Self { state, ids }
    }

    /// Loads a fare.
    ///
    /// # Errors
    ///
    /// - [`FareError::FareNotFound`] - the key is absent or holds an empty value.
    /// - [`FareError::WrongDocType`] - the key holds a non-fare document.
    pub fn get_fare(&self, id: &FareId) -> Result<Fare, FareError> {
        let bytes = store::get_present(self.state.as_ref(), &id.0)?
            .ok_or_else(|| FareError::FareNotFound(id.clone()))?;
        decode_document(&id.0, &bytes, DocType::Fare)
    }

    /// Writes a new fare under a freshly generated id.
    ///
    /// The id is not checked against existing keys.
    pub fn record_fare(
        &self,
        transit: &TransitId,
        amount: Decimal,
        timestamp: FareTimestamp,
    ) -> Result<Fare, FareError> {
        let fare = Fare::new(self.ids.next_id(), transit.clone(), amount, timestamp);
        self.put(&fare)?;
        info!(fare = %fare.id, transit = %transit, amount = %amount, %timestamp, "fare recorded");
        Ok(fare)
    }

    /// Persists a fare with a caller-chosen id. Used by seeding.
    pub(crate) fn put(&self, fare: &Fare) -> Result<(), FareError> {
        let bytes = fare.to_canonical()?;
        debug!(fare = %fare.id, bytes = bytes.as_bytes().len(), "writing fare");
        store::put_canonical(self.state.as_ref(), &fare.id.0, &bytes)
    }
}
