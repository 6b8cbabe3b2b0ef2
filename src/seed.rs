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

//! Demo fixture written by `InitLedger`.

use crate::base::{CustomerId, FareId, FareTimestamp, TransitId};
use crate::customer::{Customer, CustomerRegistry};
use crate::error::FareError;
use crate::fare::{Fare, FareLedger};
use crate::transit::FareSchedule;
use tracing::info;

/// Id of the fare attached to the first seeded customer.
pub const SEED_FARE_ID: &str = "fare1";

const CUSTOMERS: [(&str, &str, &str, &str, Option<&str>); 6] = [
    ("customer1", "Brad", "Pitt", "TTC", Some(SEED_FARE_ID)),
    ("customer2", "Olivia", "Lauren", "BT", None),
    ("customer3", "Max", "Lusignan", "MI", None),
    ("customer4", "Jin", "Yu", "YRT", None),
    ("customer5", "Adriana", "Joseph", "TTC", None),
    ("customer6", "Michael", "Brown", "MI", None),
];

/// The six seeded customers, in insertion order.
pub fn seed_customers() -> Vec<Customer> {
    CUSTOMERS
        .iter()
        .map(|&(id, first, last, transit, last_txn)| {
            let mut customer =
                Customer::new(CustomerId::from(id), first, last, TransitId::from(transit));
            customer.last_txn_id = last_txn.map(FareId::from);
            customer
        })
        .collect()
}

/// Writes the seed customers, then `fare1` charged on TTC at `now`.
///
/// Existing records under the same keys are overwritten.
pub(crate) fn init_ledger(
    customers: &CustomerRegistry,
    fares: &FareLedger,
    schedule: &FareSchedule,
    now: FareTimestamp,
) -> Result<(), FareError> {
    let seeded = seed_customers();
    for customer in &seeded {
        customers.put(customer)?;
    }

    let transit = TransitId::from("TTC");
    let fare = Fare::new(
        FareId::from(SEED_FARE_ID),
        transit.clone(),
        schedule.base_fare(&transit)?,
        now,
    );
    fares.put(&fare)?;

    info!(customers = seeded.len(), fare = %fare.id, "ledger initialized");
    Ok(())
}
