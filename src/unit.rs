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

//! Rentable units.
//!
//! Each unit moves between two states. Renting takes it from `Available` to
//! `Rented`, returning takes it back, and no other transition exists.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use gpu_rental_rs::{UnitId, UnitSpec, UnitState};
//!
//! let spec = UnitSpec::new(UnitId(1), "NVIDIA GeForce GTX 1080", dec!(5.0));
//! assert_eq!(spec.price_per_hour, dec!(5.0));
//! assert!(UnitState::Available.is_available());
//! ```

use crate::RentalError;
use crate::base::{RentalId, UnitId};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::ser::{Serialize, SerializeStruct, Serializer};

/// Availability of a unit.
///
//  Available ──rent──► Rented(rental_id) ──return──► Available
//
/// A rented unit always carries the ID of the rental that holds it, so a unit
/// cannot be rented without exactly one open rental referencing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitState {
    Available,
    Rented(RentalId),
}

impl UnitState {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available)
    }

    /// The open rental holding the unit, if any.
    pub fn rental_id(&self) -> Option<RentalId> {
        match self {
            Self::Available => None,
            Self::Rented(rental_id) => Some(*rental_id),
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Rented(_) => "rented",
        }
    }
}

/// Seed description of a unit, as loaded from an inventory file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UnitSpec {
    pub id: UnitId,
    pub name: String,
    pub price_per_hour: Decimal,
}

impl UnitSpec {
    pub fn new(id: UnitId, name: impl Into<String>, price_per_hour: Decimal) -> Self {
        Self {
            id,
            name: name.into(),
            price_per_hour,
        }
    }
}

/// Point-in-time copy of a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    pub id: UnitId,
    pub name: String,
    pub price_per_hour: Decimal,
    pub state: UnitState,
}

impl Unit {
    pub fn is_available(&self) -> bool {
        self.state.is_available()
    }
}

impl Serialize for Unit {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Unit", 5)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("name", &self.name)?;
        // Unrounded, so price times hours always matches a record's total_cost.
        state.serialize_field("price_per_hour", &self.price_per_hour)?;
        state.serialize_field("state", self.state.as_str())?;
        state.serialize_field("rental", &self.state.rental_id())?;
        state.end()
    }
}

#[derive(Debug)]
pub(crate) struct UnitData {
    spec: UnitSpec,
    state: UnitState,
}

impl UnitData {
    fn new(spec: UnitSpec) -> Self {
        Self {
            spec,
            state: UnitState::Available,
        }
    }

    pub(crate) fn id(&self) -> UnitId {
        self.spec.id
    }

    pub(crate) fn state(&self) -> UnitState {
        self.state
    }

    /// Replaces the state, returning the previous one.
    pub(crate) fn set_state(&mut self, state: UnitState) -> UnitState {
        std::mem::replace(&mut self.state, state)
    }

    /// Cost of renting this unit for `duration_hours` at its current rate.
    pub(crate) fn quote(&self, duration_hours: u32) -> Result<Decimal, RentalError> {
        if duration_hours == 0 {
            return Err(RentalError::InvalidArgument("duration must be positive"));
        }
        Decimal::from(duration_hours)
            .checked_mul(self.spec.price_per_hour)
            .ok_or(RentalError::InvalidArgument("rental cost overflows"))
    }

    pub(crate) fn snapshot(&self) -> Unit {
        Unit {
            id: self.spec.id,
            name: self.spec.name.clone(),
            price_per_hour: self.spec.price_per_hour,
            state: self.state,
        }
    }
}

/// Registry slot for one unit.
///
/// The mutex is the critical section for every transition of the unit.
#[derive(Debug)]
pub(crate) struct UnitCell {
    inner: Mutex<UnitData>,
}

impl UnitCell {
    pub(crate) fn new(spec: UnitSpec) -> Self {
        Self {
            inner: Mutex::new(UnitData::new(spec)),
        }
    }

    pub(crate) fn snapshot(&self) -> Unit {
        self.inner.lock().snapshot()
    }

    pub(crate) fn is_available(&self) -> bool {
        self.inner.lock().state.is_available()
    }

    /// Runs `f` while holding the unit lock.
    pub(crate) fn with_lock<R>(&self, f: impl FnOnce(&mut UnitData) -> R) -> R {
        let mut data = self.inner.lock();
        f(&mut data)
    }
}
