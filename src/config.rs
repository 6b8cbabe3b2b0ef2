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

//! Runtime configuration.
//!
//! Loaded from a TOML file; every field is optional.
//!
//! ```toml
//! log = "fare_transfer=debug"
//! transit_table = "transits.json"
//! ```

use crate::transit::FareSchedule;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid transit table {path}: {source}")]
    TransitTable {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// `tracing_subscriber::EnvFilter` directive used when `FARE_TRANSFER_LOG` is unset.
    pub log: String,

    /// JSON fare table replacing the built-in schedule.
    pub transit_table: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log: "info".to_string(),
            transit_table: None,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// The configured fare schedule, or the built-in one.
    pub fn fare_schedule(&self) -> Result<FareSchedule, ConfigError> {
        let Some(path) = &self.transit_table else {
            return Ok(FareSchedule::builtin());
        };
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        FareSchedule::from_json(&raw).map_err(|source| ConfigError::TransitTable {
            path: path.clone(),
            source,
        })
    }
}
