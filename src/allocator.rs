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

//! Rent and return processing.
//!
//! The [`Allocator`] is the only component that changes unit state. It owns the
//! rental [`Ledger`] and holds a shared handle to the [`Registry`].
//!
//! # Transitions
//!
//! - **Rent**: `Available` -> `Rented`, appending one ledger record.
//! - **Return**: `Rented` -> `Available`, leaving the ledger untouched.
//!
//! Renting a rented unit and returning an available one are both rejected.
//!
//! # Thread Safety
//!
//! Each transition runs inside the unit's own lock. The ledger append happens
//! inside that same critical section, so a record exists if and only if its
//! transition committed. Locks are always taken unit first, ledger second.

use crate::RentalError;
use crate::base::{Requester, UnitId};
use crate::ledger::{History, Ledger};
use crate::registry::Registry;
use crate::rental::RentalRecord;
use crate::unit::{Unit, UnitState};
use std::sync::Arc;
use tracing::{debug, info};

/// Brokers rentals over a shared registry.
///
/// # Invariants
///
/// - A unit is `Rented` iff its state names the ledger record that rented it.
/// - Every ledger record was appended by a committed rent.
/// - The ledger is append-only.
#[derive(Debug)]
pub struct Allocator {
    registry: Arc<Registry>,
    ledger: Ledger,
}

impl Allocator {
    /// Creates an allocator with an empty ledger over `registry`.
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            ledger: Ledger::new(),
        }
    }

    /// The registry this allocator mutates.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Units currently available, in insertion order.
    pub fn list_available(&self) -> Vec<Unit> {
        self.registry.list_available()
    }

    /// Looks up a unit by ID.
    pub fn get(&self, unit_id: UnitId) -> Result<Unit, RentalError> {
        self.registry.get(unit_id)
    }

    /// Rents a unit for `duration_hours`.
    ///
    /// On success the unit is `Rented` and the returned record is the newest
    /// entry in the ledger. On failure nothing changes.
    ///
    /// # Errors
    ///
    /// - [`RentalError::InvalidArgument`] - Zero duration, or the cost overflows.
    /// - [`RentalError::NotFound`] - No unit with this ID.
    /// - [`RentalError::Unavailable`] - The unit is already rented.
    pub fn rent(
        &self,
        unit_id: UnitId,
        duration_hours: u32,
        requester: Requester,
    ) -> Result<RentalRecord, RentalError> {
        if duration_hours == 0 {
            debug!(%unit_id, %requester, "rejecting rent with zero duration");
            return Err(RentalError::InvalidArgument("duration must be positive"));
        }

        let result = self.registry.update(unit_id, |unit| {
            if !unit.state().is_available() {
                return Err(RentalError::Unavailable);
            }
            let total_cost = unit.quote(duration_hours)?;

            let record = self
                .ledger
                .append(unit.id(), requester.clone(), duration_hours, total_cost);
            let previous = unit.set_state(UnitState::Rented(record.rental_id));
            assert_eq!(
                previous,
                UnitState::Available,
                "unit {} changed state inside its critical section",
                unit.id()
            );
            Ok(record)
        });

        match &result {
            Ok(record) => info!(
                %unit_id,
                rental_id = %record.rental_id,
                %requester,
                duration_hours,
                total_cost = %record.total_cost,
                "unit rented"
            ),
            Err(error) => debug!(%unit_id, %requester, %error, "rent rejected"),
        }
        result
    }

    /// Returns a rented unit to the pool.
    ///
    /// The rental record that covered the unit stays in the ledger as it was.
    ///
    /// # Errors
    ///
    /// - [`RentalError::NotFound`] - No unit with this ID.
    /// - [`RentalError::AlreadyAvailable`] - The unit is not rented.
    pub fn return_unit(&self, unit_id: UnitId) -> Result<(), RentalError> {
        let previous = self.registry.set_state(unit_id, UnitState::Available);

        match previous {
            Ok(UnitState::Rented(rental_id)) => {
                assert!(
                    self.ledger.get(rental_id).is_some_and(|r| r.unit_id == unit_id),
                    "unit {unit_id} was held by rental {rental_id} which the ledger does not record"
                );
                info!(%unit_id, %rental_id, "unit returned");
                Ok(())
            }
            // Overwriting Available with Available changed nothing.
            Ok(UnitState::Available) => {
                debug!(%unit_id, "return rejected: unit already available");
                Err(RentalError::AlreadyAvailable)
            }
            Err(error) => {
                debug!(%unit_id, %error, "return rejected");
                Err(error)
            }
        }
    }

    /// Every rental in commit order.
    ///
    /// The requester is accepted but not used to filter: the broker has no
    /// verified identities, so every caller sees the whole ledger.
    pub fn history(&self, requester: &Requester) -> History<'_> {
        let history = self.ledger.history();
        debug!(%requester, records = history.len(), "history requested");
        history
    }
}

impl Default for Allocator {
    fn default() -> Self {
        Self::new(Arc::new(Registry::default()))
    }
}
