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

//! Static transit fare schedule.
//!
//! # Example
//!
//! ```
//! use fare_transfer::{FareSchedule, TransitId};
//! use rust_decimal_macros::dec;
//!
//! let schedule = FareSchedule::builtin();
//! let mi = TransitId::from("MI");
//! assert!(schedule.validate(&mi));
//! assert_eq!(schedule.base_fare(&mi).unwrap(), dec!(3.50));
//! assert_eq!(schedule.transfer_fare(&mi).unwrap(), dec!(1.25));
//! ```

use crate::base::TransitId;
use crate::error::FareError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fares for a single transit system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct TransitFares {
    /// Full fare charged when no transfer window is open.
    #[serde(rename = "Fare")]
    pub fare: Decimal,
    /// Connecting fare charged when arriving from another system.
    #[serde(rename = "TransferFare")]
    pub transfer_fare: Decimal,
}

/// Read-only lookup of transit systems and their fares.
///
/// Loaded once per process. Amounts keep their scale (`3.50` stays
/// `"3.50"` on the wire) so that fares render identically everywhere.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct FareSchedule {
    transits: BTreeMap<TransitId, TransitFares>,
}

impl FareSchedule {
    /// The Greater Toronto Area systems this ledger ships with.
    pub fn builtin() -> Self {
        let transits = [
            ("BT", dec!(3.25), dec!(1.25)),
            ("MI", dec!(3.50), dec!(1.25)),
            ("TTC", dec!(3.25), dec!(1.50)),
            ("YRT", dec!(4.25), dec!(1.25)),
        ]
        .into_iter()
        .map(|(id, fare, transfer_fare)| {
            (
                TransitId::from(id),
                TransitFares {
                    fare,
                    transfer_fare,
                },
            )
        })
        .collect();
        Self { transits }
    }

    /// Parses a table of the form `{"TTC": {"Fare": "3.25", "TransferFare": "1.50"}}`.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// True iff `transit` is a known transit system.
    pub fn validate(&self, transit: &TransitId) -> bool {
        self.transits.contains_key(transit)
    }

    /// Full fare for `transit`.
    pub fn base_fare(&self, transit: &TransitId) -> Result<Decimal, FareError> {
        self.lookup(transit).map(|fares| fares.fare)
    }

    /// Connecting fare for `transit`.
    pub fn transfer_fare(&self, transit: &TransitId) -> Result<Decimal, FareError> {
        self.lookup(transit).map(|fares| fares.transfer_fare)
    }

    pub fn transits(&self) -> impl Iterator<Item = &TransitId> {
        self.transits.keys()
    }

    fn lookup(&self, transit: &TransitId) -> Result<&TransitFares, FareError> {
        self.transits
            .get(transit)
            .ok_or_else(|| FareError::InvalidTransit(transit.clone()))
    }
}

impl Default for FareSchedule {
    fn default() -> Self {
        Self::builtin()
    }
}
