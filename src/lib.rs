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

//! # Fare Transfer
//!
//! This library records transit customers and the fares they are charged,
//! applying a discount when a rider boards a second transit system within
//! two hours of their previous charge.
//!
//! State lives in a replicated key-value world state. Independent replicas
//! executing the same operations must end up with byte-identical values, so
//! every document is written in canonical form.
//!
//! ## Core Components
//!
//! - [`Engine`]: Fare charging and the customer contract operations
//! - [`CustomerRegistry`]: Customer CRUD over the world state
//! - [`FareLedger`]: Append-only fare records
//! - [`FareSchedule`]: Static transit fares and transfer fares
//! - [`WorldState`]: The key-value store seam, with [`MemoryWorldState`] in process
//! - [`CanonicalBytes`]: Deterministic document encoding
//! - [`FareError`]: Error types for fare processing failures
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use fare_transfer::{CustomerId, Engine, FareSchedule, MemoryWorldState, TransitId};
//! use rust_decimal_macros::dec;
//!
//! let engine = Engine::new(Arc::new(MemoryWorldState::new()), FareSchedule::builtin());
//! let id = CustomerId::from("c1");
//! engine.enroll_customer(&id, "Ann", "Lee", &TransitId::from("MI")).unwrap();
//!
//! let fare = engine.charge_fare(&id, &TransitId::from("MI")).unwrap();
//! assert_eq!(fare.amount, dec!(3.50));
//! assert_eq!(engine.get_customer(&id).unwrap().last_txn_id, Some(fare.id));
//! ```
//!
//! ## Concurrency
//!
//! Operations are independent units of work and take no locks of their own.
//! Two concurrent charges for the same customer race; the host world state
//! is expected to serialize writers per key.

mod base;
pub mod canonical;
mod clock;
pub mod config;
mod customer;
mod engine;
pub mod error;
mod fare;
mod reader;
mod seed;
pub mod store;
mod transit;

pub use base::{CustomerId, DocType, FareId, FareTimestamp, TransitId};
pub use canonical::CanonicalBytes;
pub use clock::{Clock, FareIdGenerator, ManualClock, RandomFareIds, SequentialFareIds, SystemClock};
pub use config::Config;
pub use customer::{Customer, CustomerRegistry};
pub use engine::{Engine, FareDecision, TRANSFER_WINDOW, price_fare};
pub use error::{FareError, StoreError};
pub use fare::{Fare, FareLedger};
pub use reader::ListedRecord;
pub use seed::{SEED_FARE_ID, seed_customers};
pub use store::{MemoryWorldState, WorldState, state_digest};
pub use transit::{FareSchedule, TransitFares};
