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

//! Customer records and the registry that persists them.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use fare_transfer::{CustomerId, CustomerRegistry, FareSchedule, MemoryWorldState, TransitId};
//!
//! let registry = CustomerRegistry::new(
//!     Arc::new(MemoryWorldState::new()),
//!     Arc::new(FareSchedule::builtin()),
//! );
//! let id = CustomerId::from("c1");
//! registry.enroll(&id, "Ann", "Lee", &TransitId::from("TTC")).unwrap();
//! assert!(registry.exists(&id).unwrap());
//! assert_eq!(registry.get(&id).unwrap().last_txn_id, None);
//! ```

use crate::base::{CustomerId, DocType, FareId, TransitId, empty_as_none};
use crate::canonical::{CanonicalBytes, decode_document};
use crate::error::FareError;
use crate::reader::{self, ListedRecord};
use crate::store::{self, WorldState};
use crate::transit::FareSchedule;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// A transit rider.
///
/// `last_txn_id` links to the most recent fare charged to this customer.
/// It is not cleared if that fare later disappears from the world state.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Customer {
    #[serde(rename = "ID")]
    pub id: CustomerId,
    #[serde(rename = "FirstName")]
    pub first_name: String,
    #[serde(rename = "LastName")]
    pub last_name: String,
    /// Home transit system.
    #[serde(rename = "TransitId")]
    pub transit_id: TransitId,
    #[serde(rename = "LastTxnId", with = "empty_as_none", default)]
    pub last_txn_id: Option<FareId>,
    #[serde(rename = "docType")]
    pub doc_type: DocType,
}

impl Customer {
    pub fn new(
        id: CustomerId,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        transit_id: TransitId,
    ) -> Self {
        Self {
            id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            transit_id,
            last_txn_id: None,
            doc_type: DocType::Customer,
        }
    }

    /// Canonical bytes as written to the world state.
    pub fn to_canonical(&self) -> Result<CanonicalBytes, FareError> {
        CanonicalBytes::new(&self.id.0, self)
    }
}

/// CRUD over customer documents.
#[derive(Clone)]
pub struct CustomerRegistry {
    state: Arc<dyn WorldState>,
    schedule: Arc<FareSchedule>,
}

impl CustomerRegistry {
    pub fn new(state: Arc<dyn WorldState>, schedule: Arc<FareSchedule>) -> Self {
        Self { state, schedule }
    }

    /// True iff a non-empty value is stored under `id`.
    ///
    /// This checks the key only. A fare stored under the same key counts.
    pub fn exists(&self, id: &CustomerId) -> Result<bool, FareError> {
        Ok(store::get_present(self.state.as_ref(), &id.0)?.is_some())
    }

    /// Loads a customer.
    ///
    /// # Errors
    ///
    /// - [`FareError::CustomerNotFound`] - nothing stored under `id`.
    /// - [`FareError::WrongDocType`] - the key holds a non-customer document.
    pub fn get(&self, id: &CustomerId) -> Result<Customer, FareError> {
        let bytes = store::get_present(self.state.as_ref(), &id.0)?
            .ok_or_else(|| FareError::CustomerNotFound(id.clone()))?;
        decode_document(&id.0, &bytes, DocType::Customer)
    }

    /// Creates a customer with no fare history.
    ///
    /// # Errors
    ///
    /// - [`FareError::AlreadyExists`] - the key is taken.
    /// - [`FareError::InvalidTransit`] - `primary_transit` is not in the schedule.
    pub fn enroll(
        &self,
        id: &CustomerId,
        first_name: &str,
        last_name: &str,
        primary_transit: &TransitId,
    ) -> Result<Customer, FareError> {
        if self.exists(id)? {
            return Err(FareError::AlreadyExists(id.clone()));
        }
        if !self.schedule.validate(primary_transit) {
            return Err(FareError::InvalidTransit(primary_transit.clone()));
        }

        let customer = Customer::new(id.clone(), first_name, last_name, primary_transit.clone());
        self.put(&customer)?;
        info!(customer = %id, transit = %primary_transit, "customer enrolled");
        Ok(customer)
    }

    /// Changes a customer's home transit system.
    ///
    /// Unlike [`enroll`](Self::enroll), `new_transit` is not checked against
    /// the schedule.
    pub fn update_primary_transit(
        &self,
        id: &CustomerId,
        new_transit: &TransitId,
    ) -> Result<Customer, FareError> {
        let mut customer = self.get(id)?;
        customer.transit_id = new_transit.clone();
        self.put(&customer)?;
        info!(customer = %id, transit = %new_transit, "primary transit updated");
        Ok(customer)
    }

    /// Removes a customer. Fares it references are left in place.
    pub fn delete(&self, id: &CustomerId) -> Result<(), FareError> {
        if !self.exists(id)? {
            return Err(FareError::CustomerNotFound(id.clone()));
        }
        self.state.delete_state(&id.0)?;
        info!(customer = %id, "customer deleted");
        Ok(())
    }

    /// Persists `customer` canonically under its id.
    pub fn put(&self, customer: &Customer) -> Result<(), FareError> {
        let bytes = customer.to_canonical()?;
        debug!(customer = %customer.id, bytes = bytes.as_bytes().len(), "writing customer");
        store::put_canonical(self.state.as_ref(), &customer.id.0, &bytes)
    }

    /// Every customer in key order, plus any undecodable values.
    pub fn list_all(&self) -> Result<Vec<ListedRecord>, FareError> {
        reader::list_customers(self.state.as_ref())
    }
}
