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

//! Core identifier and time types shared by customers and fares.

use chrono::{NaiveDateTime, TimeDelta, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Unique identifier for a customer record.
///
/// Doubles as the customer's key in the world state.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct CustomerId(pub String);

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CustomerId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// Unique identifier for a fare record.
///
/// Generated at charge time and never reused. Also the fare's key in the
/// world state, so it shares a keyspace with [`CustomerId`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct FareId(pub String);

impl fmt::Display for FareId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for FareId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// Transit system identifier, e.g. `TTC` or `MI`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct TransitId(pub String);

impl fmt::Display for TransitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TransitId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// Discriminator tag stored in every document under `docType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocType {
    Customer,
    Fare,
}

impl DocType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::Customer => "customer",
            DocType::Fare => "fare",
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Charge time with second precision and no timezone offset.
///
/// Wire format is `YYYY-MM-DDTHH:MM:SS`. Every replica must render the
/// same instant to the same string, so sub-second components are dropped
/// at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FareTimestamp(NaiveDateTime);

impl FareTimestamp {
    pub const FORMAT: &'static str = "%Y-%m-%dT%H:%M:%S";

    /// Wraps a naive datetime, truncating sub-seconds.
    pub fn from_naive(dt: NaiveDateTime) -> Self {
        Self(dt.with_nanosecond(0).unwrap_or(dt))
    }

    /// Parses the `YYYY-MM-DDTHH:MM:SS` wire format.
    pub fn parse(s: &str) -> Result<Self, chrono::ParseError> {
        NaiveDateTime::parse_from_str(s, Self::FORMAT).map(Self::from_naive)
    }

    pub fn as_naive(&self) -> NaiveDateTime {
        self.0
    }

    /// Time elapsed from `earlier` until `self`. Negative when `earlier`
    /// lies in the future.
    pub fn since(&self, earlier: FareTimestamp) -> TimeDelta {
        self.0.signed_duration_since(earlier.0)
    }

    /// Returns a timestamp shifted forward by `delta`.
    pub fn advanced_by(&self, delta: TimeDelta) -> Self {
        Self::from_naive(self.0 + delta)
    }
}

impl fmt::Display for FareTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(Self::FORMAT))
    }
}

impl Serialize for FareTimestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FareTimestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        FareTimestamp::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter mapping `Option<FareId>` to the empty-string convention
/// used by `LastTxnId`.
pub(crate) mod empty_as_none {
    use super::FareId;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<FareId>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(id) => serializer.serialize_str(&id.0),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<FareId>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.filter(|id| !id.is_empty()).map(FareId))
    }
}
