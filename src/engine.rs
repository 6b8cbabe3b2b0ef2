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

//! The fare-charging engine and the contract surface around it.

use crate::base::{CustomerId, FareId, FareTimestamp, TransitId};
use crate::clock::{Clock, FareIdGenerator, RandomFareIds, SystemClock};
use crate::customer::{Customer, CustomerRegistry};
use crate::error::FareError;
use crate::fare::{Fare, FareLedger};
use crate::reader::ListedRecord;
use crate::seed;
use crate::store::WorldState;
use crate::transit::FareSchedule;
use chrono::TimeDelta;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::debug;

/// How long after a charge a follow-up charge is discounted or waived.
pub const TRANSFER_WINDOW: TimeDelta = TimeDelta::minutes(120);

/// How a charge was priced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FareDecision {
    /// No open window; base fare at the current time.
    Full,
    /// Same system inside the window; free.
    ReEntry,
    /// Different system inside the window; transfer fare, window start kept.
    Transfer,
}

/// Prices a charge on `transit` at `now`, given the customer's previous fare.
///
/// Returns the decision, the amount and the timestamp to record. The
/// window is open while strictly less than [`TRANSFER_WINDOW`] has elapsed
/// since `previous`. Re-entry on the same system wins over a transfer.
/// A transfer keeps the previous fare's timestamp so that chained
/// transfers cannot stretch the window.
pub fn price_fare(
    schedule: &FareSchedule,
    transit: &TransitId,
    now: FareTimestamp,
    previous: Option<&Fare>,
) -> Result<(FareDecision, Decimal, FareTimestamp), FareError> {
    let base = schedule.base_fare(transit)?;

    let Some(previous) = previous else {
        return Ok((FareDecision::Full, base, now));
    };
    if now.since(previous.timestamp) >= TRANSFER_WINDOW {
        return Ok((FareDecision::Full, base, now));
    }

    if *transit == previous.transit {
        Ok((FareDecision::ReEntry, Decimal::ZERO, previous.timestamp))
    } else {
        let transfer = schedule.transfer_fare(transit)?;
        Ok((FareDecision::Transfer, transfer, previous.timestamp))
    }
}

/// Fare transfer contract.
///
/// Each method is one independent unit of work against the world state.
/// Nothing here locks: concurrent charges for one customer race, and the
/// last customer write wins.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use fare_transfer::{CustomerId, Engine, FareSchedule, MemoryWorldState, TransitId};
/// use rust_decimal_macros::dec;
///
/// let engine = Engine::new(Arc::new(MemoryWorldState::new()), FareSchedule::builtin());
/// let id = CustomerId::from("c1");
/// engine.enroll_customer(&id, "Ann", "Lee", &TransitId::from("TTC")).unwrap();
///
/// let first = engine.charge_fare(&id, &TransitId::from("TTC")).unwrap();
/// assert_eq!(first.amount, dec!(3.25));
///
/// let second = engine.charge_fare(&id, &TransitId::from("MI")).unwrap();
/// assert_eq!(second.amount, dec!(1.25));
/// assert_eq!(second.timestamp, first.timestamp);
/// ```
pub struct Engine {
    customers: CustomerRegistry,
    fares: FareLedger,
    schedule: Arc<FareSchedule>,
    clock: Arc<dyn Clock>,
}

impl Engine {
    /// Creates an engine on the wall clock with random fare ids.
    pub fn new(state: Arc<dyn WorldState>, schedule: FareSchedule) -> Self {
        Self::with_sources(state, schedule, Arc::new(SystemClock), Arc::new(RandomFareIds))
    }

    /// Creates an engine with explicit time and id sources.
    pub fn with_sources(
        state: Arc<dyn WorldState>,
        schedule: FareSchedule,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn FareIdGenerator>,
    ) -> Self {
        let schedule = Arc::new(schedule);
        Engine {
            customers: CustomerRegistry::new(Arc::clone(&state), Arc::clone(&schedule)),
            fares: FareLedger::new(state, ids),
            schedule,
            clock,
        }
    }

    /// Seeds the demo customers and their first fare.
    pub fn init_ledger(&self) -> Result<(), FareError> {
        seed::init_ledger(&self.customers, &self.fares, &self.schedule, self.clock.now())
    }

    pub fn enroll_customer(
        &self,
        id: &CustomerId,
        first_name: &str,
        last_name: &str,
        primary_transit: &TransitId,
    ) -> Result<Customer, FareError> {
        self.customers.enroll(id, first_name, last_name, primary_transit)
    }

    pub fn get_customer(&self, id: &CustomerId) -> Result<Customer, FareError> {
        self.customers.get(id)
    }

    pub fn get_customer_last_fare(&self, last_txn_id: &FareId) -> Result<Fare, FareError> {
        self.fares.get_fare(last_txn_id)
    }

    pub fn update_primary_transit(
        &self,
        id: &CustomerId,
        new_transit: &TransitId,
    ) -> Result<Customer, FareError> {
        self.customers.update_primary_transit(id, new_transit)
    }

    pub fn delete_customer(&self, id: &CustomerId) -> Result<(), FareError> {
        self.customers.delete(id)
    }

    pub fn customer_exists(&self, id: &CustomerId) -> Result<bool, FareError> {
        self.customers.exists(id)
    }

    pub fn get_all_customers(&self) -> Result<Vec<ListedRecord>, FareError> {
        self.customers.list_all()
    }

    /// Charges `customer` for boarding `transit`.
    ///
    /// | Previous fare | Same system | Charged | Timestamp |
    /// |---------------|-------------|---------|-----------|
    /// | none | - | base fare | now |
    /// | < 120 min ago | yes | 0 | previous |
    /// | < 120 min ago | no | transfer fare | previous |
    /// | >= 120 min ago | - | base fare | now |
    ///
    /// The new fare is written before the customer. If the customer write
    /// fails the fare stays behind unreferenced; it is never corrupted.
    ///
    /// # Errors
    ///
    /// - [`FareError::InvalidTransit`] - checked before the customer is read.
    /// - [`FareError::CustomerNotFound`] - no such customer.
    /// - [`FareError::FareNotFound`] - `LastTxnId` names a missing fare.
    /// - [`FareError::Store`] - a world state call failed.
    pub fn charge_fare(&self, customer: &CustomerId, transit: &TransitId) -> Result<Fare, FareError> {
        if !self.schedule.validate(transit) {
            return Err(FareError::InvalidTransit(transit.clone()));
        }

        let mut record = self.customers.get(customer)?;
        let now = self.clock.now();

        let previous = match &record.last_txn_id {
            Some(last_txn_id) => Some(self.fares.get_fare(last_txn_id)?),
            None => None,
        };

        let (decision, amount, timestamp) =
            price_fare(&self.schedule, transit, now, previous.as_ref())?;
        debug!(
            %customer,
            %transit,
            ?decision,
            %amount,
            previous = ?previous.as_ref().map(|fare| &fare.id),
            "fare priced"
        );

        let fare = self.fares.record_fare(transit, amount, timestamp)?;
        record.last_txn_id = Some(fare.id.clone());
        self.customers.put(&record)?;

        Ok(fare)
    }
}
