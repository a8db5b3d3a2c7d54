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

//! # GPU Rental
//!
//! This library provides a rental broker for a small inventory of GPUs: it
//! tracks which units are available, leases them exclusively, and records
//! every rental in an append-only ledger.
//!
//! ## Core Components
//!
//! - [`Registry`]: Authoritative set of units and their availability
//! - [`Allocator`]: Performs rent/return transitions and owns the [`Ledger`]
//! - [`RentalRecord`]: Immutable record of one committed rental
//! - [`RentalError`]: Error types for rejected requests
//!
//! ## Example
//!
//! ```
//! use gpu_rental_rs::{Allocator, RentalError, Requester, UnitId};
//! use rust_decimal_macros::dec;
//!
//! let allocator = Allocator::default();
//!
//! // Rent the GTX 1080 for two hours
//! let record = allocator.rent(UnitId(1), 2, Requester::from("alice")).unwrap();
//! assert_eq!(record.total_cost, dec!(10.0));
//!
//! // It is no longer listed, and cannot be rented twice
//! assert!(allocator.list_available().iter().all(|unit| unit.id != UnitId(1)));
//! assert_eq!(
//!     allocator.rent(UnitId(1), 1, Requester::from("bob")),
//!     Err(RentalError::Unavailable)
//! );
//!
//! allocator.return_unit(UnitId(1)).unwrap();
//! assert_eq!(allocator.return_unit(UnitId(1)), Err(RentalError::AlreadyAvailable));
//! ```
//!
//! ## Thread Safety
//!
//! Every unit has its own lock, so rentals of different units proceed in
//! parallel while concurrent rentals of the same unit are serialized: exactly
//! one of them wins.

mod allocator;
mod base;
pub mod error;
mod ledger;
mod registry;
mod rental;
pub mod unit;

pub use allocator::Allocator;
pub use base::{RentalId, Requester, UnitId};
pub use error::RentalError;
pub use ledger::{History, HistoryIter, Ledger};
pub use registry::{Registry, default_inventory};
pub use rental::RentalRecord;
pub use unit::{Unit, UnitSpec, UnitState};
