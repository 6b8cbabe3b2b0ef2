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

//! Canonical document encoding.
//!
//! Every replica executing the same operation sequence must write
//! byte-identical values, otherwise their world state hashes diverge.
//! [`CanonicalBytes`] is the only form accepted by the write paths, and the
//! only way to build one is [`CanonicalBytes::new`], which renders the
//! record as JCS (RFC 8785): object keys sorted recursively, compact
//! separators, no trailing whitespace.
//!
//! Reads go through [`decode_document`], which checks the `docType`
//! discriminator before handing the value to the typed decoder. Customers
//! and fares share one keyspace, so a key lookup alone says nothing about
//! what kind of record comes back.

use crate::base::DocType;
use crate::error::FareError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Field holding the discriminator tag.
pub const DOC_TYPE_FIELD: &str = "docType";

/// Bytes produced by canonical encoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Encodes any serializable record canonically.
    ///
    /// # Errors
    ///
    /// Returns [`FareError::Codec`] if the record cannot be represented as
    /// JSON (e.g. a map with non-string keys). `key` only labels the error.
    pub fn new(key: &str, record: &impl Serialize) -> Result<Self, FareError> {
        let value = serde_json::to_value(record).map_err(|e| FareError::codec(key, e))?;
        let text = serde_jcs::to_string(&value).map_err(|e| FareError::codec(key, e))?;
        Ok(Self(text.into_bytes()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Reads the discriminator of a generic JSON document, if it has one.
pub fn doc_type_of(value: &Value) -> Option<&str> {
    value.get(DOC_TYPE_FIELD).and_then(Value::as_str)
}

/// Decodes a stored document, requiring its tag to match `expected`.
///
/// # Errors
///
/// - [`FareError::Codec`] - bytes are not JSON or miss required fields.
/// - [`FareError::WrongDocType`] - the document is tagged as something else.
pub fn decode_document<T: DeserializeOwned>(
    key: &str,
    bytes: &[u8],
    expected: DocType,
) -> Result<T, FareError> {
    let value: Value = serde_json::from_slice(bytes).map_err(|e| FareError::codec(key, e))?;

    let found = doc_type_of(&value);
    if found != Some(expected.as_str()) {
        return Err(FareError::WrongDocType {
            key: key.to_owned(),
            expected,
            found: found.map(str::to_owned),
        });
    }

    serde_json::from_value(value).map_err(|e| FareError::codec(key, e))
}
