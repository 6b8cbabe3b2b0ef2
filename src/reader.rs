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

//! Bulk listing over the shared keyspace.

use crate::base::DocType;
use crate::canonical::doc_type_of;
use crate::customer::Customer;
use crate::error::FareError;
use crate::store::WorldState;
use serde::{Serialize, Serializer};
use serde_json::Value;
use tracing::debug;

/// One entry of a customer listing.
///
/// Serializes untagged, so a listing renders as a JSON array of customer
/// objects interleaved with the text of any values that could not be
/// decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ListedRecord {
    Customer(Customer),
    /// A stored value passed through undecoded, byte for byte.
    ///
    /// Serialization renders it as UTF-8 text, replacing invalid sequences
    /// with U+FFFD. The bytes themselves are kept intact.
    Opaque(#[serde(serialize_with = "serialize_lossy")] Vec<u8>),
}

impl ListedRecord {
    pub fn as_customer(&self) -> Option<&Customer> {
        match self {
            ListedRecord::Customer(customer) => Some(customer),
            ListedRecord::Opaque(_) => None,
        }
    }
}

fn serialize_lossy<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&String::from_utf8_lossy(bytes))
}

/// Scans the whole world state in key order and keeps customers.
///
/// Values that do not decode as a JSON object are kept as
/// [`ListedRecord::Opaque`] rather than failing the listing. So are objects
/// tagged `customer` whose fields do not match. Objects with any other tag,
/// or none, are dropped.
pub fn list_customers(state: &dyn WorldState) -> Result<Vec<ListedRecord>, FareError> {
    let entries = state.get_state_by_range("", "")?;
    let mut records = Vec::new();

    for (key, bytes) in entries {
        let value = match serde_json::from_slice::<Value>(&bytes) {
            Ok(value @ Value::Object(_)) => value,
            Ok(_) => {
                debug!(%key, "passing through non-object JSON value");
                records.push(ListedRecord::Opaque(bytes));
                continue;
            }
            Err(_) => {
                debug!(%key, "passing through non-JSON value");
                records.push(ListedRecord::Opaque(bytes));
                continue;
            }
        };

        if doc_type_of(&value) != Some(DocType::Customer.as_str()) {
            continue;
        }

        match serde_json::from_value::<Customer>(value) {
            Ok(customer) => records.push(ListedRecord::Customer(customer)),
            Err(e) => {
                debug!(%key, error = %e, "passing through malformed customer");
                records.push(ListedRecord::Opaque(bytes));
            }
        }
    }

    Ok(records)
}
