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

use clap::{Parser, ValueEnum};
use csv::{ReaderBuilder, Trim, Writer};
use gpu_rental_rs::{Allocator, Registry, RentalError, Requester, UnitId, UnitSpec};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// GPU Rental - Replay rent/return commands against an inventory
///
/// Reads commands from a CSV file, applies them in order and writes a report
/// to stdout. Log output goes to stderr and is controlled by `RUST_LOG`.
#[derive(Parser, Debug)]
#[command(name = "gpu-rental-rs")]
#[command(about = "A GPU rental broker that replays command CSVs", long_about = None)]
struct Args {
    /// Path to CSV file with rent/return commands
    ///
    /// Expected format: op,unit,hours,requester
    /// Example: cargo run -- commands.csv > rentals.csv
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Inventory CSV with columns id,name,price_per_hour
    ///
    /// The two built-in GPUs are used when omitted.
    #[arg(long, value_name = "FILE")]
    inventory: Option<PathBuf>,

    /// What to write to stdout once all commands are applied
    #[arg(long, value_enum, default_value_t = Report::History)]
    report: Report,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Report {
    /// Every rental in the ledger, oldest first
    History,
    /// Units still available
    Available,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("cannot open '{path}': {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("invalid inventory: {0}")]
    Inventory(#[from] RentalError),
}

fn main() {
    init_tracing();
    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Logs to stderr so stdout stays a clean CSV report.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run(args: &Args) -> Result<(), CliError> {
    let registry = match &args.inventory {
        Some(path) => load_inventory(BufReader::new(open(path)?))?,
        None => Registry::default(),
    };
    let allocator = Allocator::new(Arc::new(registry));

    let skipped = process_commands(&allocator, BufReader::new(open(&args.input)?))?;
    if !skipped.is_empty() {
        info!(skipped = skipped.len(), "some commands were not applied");
    }
    write_report(&allocator, args.report, std::io::stdout())?;
    Ok(())
}

fn open(path: &Path) -> Result<File, CliError> {
    File::open(path).map_err(|source| CliError::Open {
        path: path.to_path_buf(),
        source,
    })
}

/// Builds a registry from an inventory CSV.
///
/// Unlike command files, inventories are strict: a malformed row, a duplicate
/// ID or a negative price fails the whole load.
fn load_inventory<R: Read>(reader: R) -> Result<Registry, CliError> {
    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .has_headers(true)
        .from_reader(reader);

    let seed = rdr
        .deserialize::<UnitSpec>()
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Registry::new(seed)?)
}

/// Raw CSV record matching the command format.
///
/// Fields: `op, unit, hours, requester`
#[derive(Debug, Deserialize)]
struct CommandRecord {
    op: String,
    unit: u32,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    hours: Option<i64>,
    #[serde(default)]
    requester: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Rent {
        unit_id: UnitId,
        duration_hours: u32,
        requester: Requester,
    },
    Return {
        unit_id: UnitId,
    },
}

impl CommandRecord {
    const ANONYMOUS: &'static str = "anonymous";

    /// Converts a CSV record into a broker command.
    fn into_command(self) -> Result<Command, RentalError> {
        let unit_id = UnitId(self.unit);

        match self.op.to_lowercase().as_str() {
            "rent" => {
                let hours = self
                    .hours
                    .ok_or(RentalError::InvalidArgument("missing duration"))?;
                let duration_hours = u32::try_from(hours)
                    .ok()
                    .filter(|hours| *hours > 0)
                    .ok_or(RentalError::InvalidArgument("duration must be positive"))?;
                let requester = self
                    .requester
                    .filter(|r| !r.is_empty())
                    .map(Requester::from)
                    .unwrap_or_else(|| Requester::from(Self::ANONYMOUS));
                Ok(Command::Rent {
                    unit_id,
                    duration_hours,
                    requester,
                })
            }
            "return" => Ok(Command::Return { unit_id }),
            _ => Err(RentalError::InvalidArgument("unknown operation")),
        }
    }
}

/// A command row that was not applied.
#[derive(Debug, PartialEq, Eq)]
struct SkippedRow {
    /// 1-based line in the commands file, counting the header.
    line: u64,
    reason: String,
}

/// Applies commands from a CSV reader in file order.
///
/// Rows are streamed, so the file is never loaded whole. Malformed rows and
/// rejected commands are logged, skipped and reported back by line number.
///
/// # CSV Format
///
/// Expected columns: `op, unit, hours, requester`
/// - `op`: `rent` or `return`
/// - `unit`: Unit ID (u32)
/// - `hours`: Rental duration (required for rent)
/// - `requester`: Opaque caller identity (optional)
///
/// # Example
///
/// ```csv
/// op,unit,hours,requester
/// rent,1,2,alice
/// return,1,,
/// ```
///
/// # Errors
///
/// Returns a CSV error if the header cannot be read.
fn process_commands<R: Read>(
    allocator: &Allocator,
    reader: R,
) -> Result<Vec<SkippedRow>, csv::Error> {
    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();
    let mut skipped = Vec::new();

    for result in rdr.records() {
        let (line, parsed) = match result {
            Ok(row) => (
                row.position().map_or(0, |p| p.line()),
                row.deserialize::<CommandRecord>(Some(&headers)),
            ),
            Err(e) => (e.position().map_or(0, |p| p.line()), Err(e)),
        };

        let record = match parsed {
            Ok(record) => record,
            Err(e) => {
                warn!(line, error = %e, "skipping malformed row");
                skipped.push(SkippedRow {
                    line,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let outcome = record.into_command().and_then(|command| match command {
            Command::Rent {
                unit_id,
                duration_hours,
                requester,
            } => allocator.rent(unit_id, duration_hours, requester).map(|_| ()),
            Command::Return { unit_id } => allocator.return_unit(unit_id),
        });

        if let Err(e) = outcome {
            warn!(line, error = %e, "skipping command");
            skipped.push(SkippedRow {
                line,
                reason: e.to_string(),
            });
        }
    }

    Ok(skipped)
}

/// Writes the requested report as CSV.
///
/// # CSV Format
///
/// History columns: `rental_id, unit_id, requester, duration_hours, total_cost, created_at`
///
/// Available columns: `id, name, price_per_hour, state, rental`
///
/// # Errors
///
/// Returns a CSV error if writing fails.
fn write_report<W: Write>(
    allocator: &Allocator,
    report: Report,
    writer: W,
) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);

    match report {
        Report::History => {
            for record in allocator.history(&Requester::from(CommandRecord::ANONYMOUS)) {
                wtr.serialize(&record)?;
            }
        }
        Report::Available => {
            for unit in allocator.list_available() {
                wtr.serialize(&unit)?;
            }
        }
    }

    wtr.flush()?;
    Ok(())
}
