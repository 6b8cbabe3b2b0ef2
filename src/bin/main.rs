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

use anyhow::Context;
use clap::Parser;
use csv::{ReaderBuilder, Trim, Writer};
use fare_transfer::{Config, CustomerId, Engine, MemoryWorldState, TransitId, state_digest};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Fare Transfer - Replay fare operations against a fresh world state
///
/// Reads operations from a CSV file, applies them in order and writes the
/// resulting customers to stdout. Logs go to stderr.
#[derive(Parser, Debug)]
#[command(name = "fare-transfer")]
#[command(about = "Applies customer and fare operations from a CSV", long_about = None)]
struct Args {
    /// Path to CSV file with operations
    ///
    /// Expected format: op,customer,transit,first_name,last_name
    /// Example: cargo run -- ops.csv > customers.csv
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// TOML configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Seed the demo customers before applying operations
    #[arg(long)]
    seed: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    init_tracing(&config);

    let schedule = config.fare_schedule()?;
    let state = Arc::new(MemoryWorldState::new());
    let engine = Engine::new(state.clone(), schedule);

    if args.seed {
        engine.init_ledger().context("seeding ledger")?;
    }

    let file = File::open(&args.input)
        .with_context(|| format!("opening '{}'", args.input.display()))?;
    let applied = process_operations(&engine, BufReader::new(file))
        .context("processing operations")?;

    write_customers(&engine, std::io::stdout()).context("writing output")?;

    let digest = state_digest(state.as_ref())?;
    info!(applied, keys = state.len(), %digest, "world state");
    Ok(())
}

/// `FARE_TRANSFER_LOG` wins over the configured filter.
fn init_tracing(config: &Config) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("FARE_TRANSFER_LOG")
                .unwrap_or_else(|_| EnvFilter::new(&config.log)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Raw CSV record matching the input format.
///
/// Fields: `op, customer, transit, first_name, last_name`
#[derive(Debug, Deserialize)]
struct CsvRecord {
    op: String,
    customer: String,
    #[serde(default)]
    transit: Option<String>,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Operation {
    Enroll {
        customer: CustomerId,
        first_name: String,
        last_name: String,
        transit: TransitId,
    },
    Charge {
        customer: CustomerId,
        transit: TransitId,
    },
    Update {
        customer: CustomerId,
        transit: TransitId,
    },
    Delete {
        customer: CustomerId,
    },
}

impl CsvRecord {
    /// Returns `None` for unknown ops or missing required fields.
    fn into_operation(self) -> Option<Operation> {
        let customer = CustomerId(self.customer);
        let transit = self.transit.map(TransitId);

        match self.op.to_lowercase().as_str() {
            "enroll" => Some(Operation::Enroll {
                customer,
                first_name: self.first_name?,
                last_name: self.last_name?,
                transit: transit?,
            }),
            "charge" => Some(Operation::Charge {
                customer,
                transit: transit?,
            }),
            "update" => Some(Operation::Update {
                customer,
                transit: transit?,
            }),
            "delete" => Some(Operation::Delete { customer }),
            _ => None,
        }
    }
}

fn apply(engine: &Engine, operation: &Operation) -> Result<(), fare_transfer::FareError> {
    match operation {
        Operation::Enroll {
            customer,
            first_name,
            last_name,
            transit,
        } => engine
            .enroll_customer(customer, first_name, last_name, transit)
            .map(drop),
        Operation::Charge { customer, transit } => engine.charge_fare(customer, transit).map(drop),
        Operation::Update { customer, transit } => {
            engine.update_primary_transit(customer, transit).map(drop)
        }
        Operation::Delete { customer } => engine.delete_customer(customer),
    }
}

/// Applies operations from a CSV reader, in order.
///
/// Malformed rows and failed operations are logged and skipped; each
/// operation stands alone.
///
/// # CSV Format
///
/// Expected columns: `op, customer, transit, first_name, last_name`
/// - `op`: enroll, charge, update or delete
/// - `customer`: Customer ID
/// - `transit`: Transit system (not needed for delete)
/// - `first_name`, `last_name`: Only needed for enroll
///
/// # Example
///
/// ```csv
/// op,customer,transit,first_name,last_name
/// enroll,c1,TTC,Ann,Lee
/// charge,c1,TTC
/// charge,c1,MI
/// ```
///
/// # Errors
///
/// Returns a CSV error if the reader fails. Returns the number of
/// operations applied successfully.
fn process_operations<R: Read>(engine: &Engine, reader: R) -> Result<usize, csv::Error> {
    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    let mut applied = 0;
    for (row, result) in rdr.deserialize::<CsvRecord>().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!(row, error = %e, "skipping malformed row");
                continue;
            }
        };

        let Some(operation) = record.into_operation() else {
            warn!(row, "skipping invalid operation record");
            continue;
        };

        match apply(engine, &operation) {
            Ok(()) => applied += 1,
            Err(e) => warn!(row, ?operation, error = %e, "operation failed"),
        }
    }

    Ok(applied)
}

/// Writes every customer as CSV.
///
/// Columns: `ID, FirstName, LastName, TransitId, LastTxnId, docType`.
/// Undecodable world state values are left out.
fn write_customers<W: Write>(engine: &Engine, writer: W) -> anyhow::Result<()> {
    let mut wtr = Writer::from_writer(writer);

    for record in engine.get_all_customers()? {
        match record.as_customer() {
            Some(customer) => wtr.serialize(customer)?,
            None => warn!("skipping undecodable record in output"),
        }
    }

    wtr.flush()?;
    Ok(())
}
