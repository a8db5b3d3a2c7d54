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

//! Inventory registry.
//!
//! The [`Registry`] owns the authoritative set of units. Membership is fixed
//! at construction; only unit state changes afterwards, and only through the
//! allocator.
//!
//! # Thread Safety
//!
//! Units are indexed in a [`DashMap`] and each unit sits behind its own
//! mutex, so reads and transitions on different units never contend.

use crate::RentalError;
use crate::base::UnitId;
use crate::unit::{Unit, UnitCell, UnitData, UnitSpec, UnitState};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

/// The GPUs offered when no inventory is supplied.
pub fn default_inventory() -> Vec<UnitSpec> {
    vec![
        UnitSpec::new(UnitId(1), "NVIDIA GeForce GTX 1080", dec!(5.0)),
        UnitSpec::new(UnitId(2), "AMD Radeon RX 5700 XT", dec!(7.0)),
    ]
}

/// Authoritative set of rentable units.
///
/// # Invariants
///
/// - Unit IDs are unique.
/// - Prices are non-negative.
/// - A unit's state field is the single source of truth for availability.
#[derive(Debug)]
pub struct Registry {
    /// Units indexed by ID.
    units: DashMap<UnitId, Arc<UnitCell>>,
    /// The same units in insertion order.
    order: Vec<Arc<UnitCell>>,
}

impl Registry {
    /// Builds a registry from a seed set, keeping the seed's order.
    ///
    /// # Errors
    ///
    /// - [`RentalError::InvalidArgument`] - Duplicate unit ID or negative price.
    pub fn new(seed: impl IntoIterator<Item = UnitSpec>) -> Result<Self, RentalError> {
        let mut registry = Self::empty();
        for spec in seed {
            if spec.price_per_hour < Decimal::ZERO {
                return Err(RentalError::InvalidArgument("price must not be negative"));
            }
            registry.insert(spec)?;
        }
        Ok(registry)
    }

    fn empty() -> Self {
        Self {
            units: DashMap::new(),
            order: Vec::new(),
        }
    }

    fn insert(&mut self, spec: UnitSpec) -> Result<(), RentalError> {
        match self.units.entry(spec.id) {
            Entry::Occupied(_) => Err(RentalError::InvalidArgument("duplicate unit id")),
            Entry::Vacant(entry) => {
                let cell = Arc::new(UnitCell::new(spec));
                entry.insert(Arc::clone(&cell));
                self.order.push(cell);
                Ok(())
            }
        }
    }

    /// Units currently available, in insertion order.
    pub fn list_available(&self) -> Vec<Unit> {
        self.order
            .iter()
            .map(|cell| cell.snapshot())
            .filter(Unit::is_available)
            .collect()
    }

    /// Every unit regardless of state, in insertion order.
    pub fn units(&self) -> Vec<Unit> {
        self.order.iter().map(|cell| cell.snapshot()).collect()
    }

    /// Looks up a unit by ID.
    pub fn get(&self, unit_id: UnitId) -> Result<Unit, RentalError> {
        Ok(self.cell(unit_id)?.snapshot())
    }

    pub fn contains(&self, unit_id: UnitId) -> bool {
        self.units.contains_key(&unit_id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Number of units currently available.
    pub fn available_count(&self) -> usize {
        self.order.iter().filter(|cell| cell.is_available()).count()
    }

    /// Runs `f` inside the unit's critical section.
    ///
    /// The DashMap shard lock is released before the unit lock is taken.
    pub(crate) fn update<R>(
        &self,
        unit_id: UnitId,
        f: impl FnOnce(&mut UnitData) -> Result<R, RentalError>,
    ) -> Result<R, RentalError> {
        self.cell(unit_id)?.with_lock(f)
    }

    /// Overwrites a unit's state, returning the state it replaced.
    pub(crate) fn set_state(
        &self,
        unit_id: UnitId,
        state: UnitState,
    ) -> Result<UnitState, RentalError> {
        self.update(unit_id, |unit| Ok(unit.set_state(state)))
    }

    fn cell(&self, unit_id: UnitId) -> Result<Arc<UnitCell>, RentalError> {
        self.units
            .get(&unit_id)
            .map(|cell| Arc::clone(cell.value()))
            .ok_or(RentalError::NotFound)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(default_inventory()).expect("default inventory has unique ids")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::RentalId;

    #[test]
    fn default_registry_holds_two_available_gpus() {
        let registry = Registry::default();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.available_count(), 2);

        let ids: Vec<_> = registry.list_available().iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![UnitId(1), UnitId(2)]);
    }

    #[test]
    fn default_inventory_is_a_valid_seed() {
        let registry = Registry::new(default_inventory()).unwrap();
        assert_eq!(registry.units(), Registry::default().units());
    }

    #[test]
    fn new_rejects_duplicate_ids() {
        let seed = vec![
            UnitSpec::new(UnitId(1), "a", dec!(1.0)),
            UnitSpec::new(UnitId(1), "b", dec!(2.0)),
        ];
        assert_eq!(
            Registry::new(seed).err(),
            Some(RentalError::InvalidArgument("duplicate unit id"))
        );
    }

    #[test]
    fn new_rejects_negative_price() {
        let seed = vec![UnitSpec::new(UnitId(1), "a", dec!(-1.0))];
        assert_eq!(
            Registry::new(seed).err(),
            Some(RentalError::InvalidArgument("price must not be negative"))
        );
    }

    #[test]
    fn list_available_keeps_insertion_order() {
        let seed = vec![
            UnitSpec::new(UnitId(30), "c", dec!(1.0)),
            UnitSpec::new(UnitId(10), "a", dec!(1.0)),
            UnitSpec::new(UnitId(20), "b", dec!(1.0)),
        ];
        let registry = Registry::new(seed).unwrap();

        let ids: Vec<_> = registry.list_available().iter().map(|u| u.id.0).collect();
        assert_eq!(ids, vec![30, 10, 20]);
    }

    #[test]
    fn get_unknown_unit_is_not_found() {
        let registry = Registry::default();
        assert_eq!(registry.get(UnitId(99)), Err(RentalError::NotFound));
        assert!(!registry.contains(UnitId(99)));
    }

    #[test]
    fn set_state_hides_rented_unit_from_listing() {
        let registry = Registry::default();
        let previous = registry
            .set_state(UnitId(1), UnitState::Rented(RentalId(1)))
            .unwrap();

        assert_eq!(previous, UnitState::Available);
        let ids: Vec<_> = registry.list_available().iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![UnitId(2)]);
        assert_eq!(registry.units().len(), 2);
        assert!(!registry.get(UnitId(1)).unwrap().is_available());
    }

    #[test]
    fn set_state_unknown_unit_is_not_found() {
        let registry = Registry::default();
        assert_eq!(
            registry.set_state(UnitId(42), UnitState::Available),
            Err(RentalError::NotFound)
        );
    }

    #[test]
    fn update_error_leaves_unit_untouched() {
        let registry = Registry::default();
        let result: Result<(), _> = registry.update(UnitId(1), |_| Err(RentalError::Unavailable));

        assert_eq!(result, Err(RentalError::Unavailable));
        assert!(registry.get(UnitId(1)).unwrap().is_available());
    }
}
