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

//! Error types for fare processing.

use crate::base::{CustomerId, DocType, FareId, TransitId};
use thiserror::Error;

/// Failure reported by a [`WorldState`](crate::WorldState) backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct StoreError(pub String);

/// Fare processing errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FareError {
    /// No customer record is stored under the id
    #[error("The customer {0} does not exist")]
    CustomerNotFound(CustomerId),

    /// No fare record is stored under the id
    #[error("The fare {0} does not exist")]
    FareNotFound(FareId),

    /// Enrollment collided with an existing key
    #[error("The customer {0} already exists")]
    AlreadyExists(CustomerId),

    /// Transit id is not in the fare schedule
    #[error("Transit Id {0} does not exist")]
    InvalidTransit(TransitId),

    /// The stored document carries a different discriminator
    #[error("The record {key} is not a {expected} (docType {found:?})")]
    WrongDocType {
        key: String,
        expected: DocType,
        found: Option<String>,
    },

    /// Underlying world state call failed
    #[error("world state failure: {0}")]
    Store(#[from] StoreError),

    /// Stored bytes could not be encoded or decoded
    #[error("malformed record {key}: {reason}")]
    Codec { key: String, reason: String },
}

impl FareError {
    pub(crate) fn codec(key: impl Into<String>, reason: impl ToString) -> Self {
        FareError::Codec {
            key: key.into(),
            reason: reason.to_string(),
        }
    }
}
