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

//! Allocator public API integration tests.

use gpu_rental_rs::{
    Allocator, Registry, RentalError, RentalId, Requester, UnitId, UnitSpec, UnitState,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

fn make_allocator(prices: &[Decimal]) -> Allocator {
    let seed = prices
        .iter()
        .enumerate()
        .map(|(i, price)| UnitSpec::new(UnitId(i as u32 + 1), format!("gpu-{}", i + 1), *price));
    Allocator::new(Arc::new(Registry::new(seed).unwrap()))
}

fn available_ids(allocator: &Allocator) -> Vec<u32> {
    allocator.list_available().iter().map(|u| u.id.0).collect()
}

#[test]
fn end_to_end_rent_and_return() {
    let allocator = make_allocator(&[dec!(5.0)]);

    let record = allocator.rent(UnitId(1), 2, Requester::from("alice")).unwrap();
    assert_eq!(record.unit_id, UnitId(1));
    assert_eq!(record.duration_hours, 2);
    assert_eq!(record.total_cost, dec!(10.0));
    assert!(available_ids(&allocator).is_empty());

    let result = allocator.rent(UnitId(1), 1, Requester::from("bob"));
    assert_eq!(result, Err(RentalError::Unavailable));

    allocator.return_unit(UnitId(1)).unwrap();
    assert_eq!(available_ids(&allocator), vec![1]);

    let result = allocator.return_unit(UnitId(1));
    assert_eq!(result, Err(RentalError::AlreadyAvailable));
}

#[test]
fn cost_is_duration_times_rate() {
    let allocator = make_allocator(&[dec!(5.0)]);
    let record = allocator.rent(UnitId(1), 3, "alice".into()).unwrap();
    assert_eq!(record.total_cost, dec!(15.0));
}

#[test]
fn fractional_rates_are_exact() {
    let allocator = make_allocator(&[dec!(0.35)]);
    let record = allocator.rent(UnitId(1), 7, "alice".into()).unwrap();
    assert_eq!(record.total_cost, dec!(2.45));
}

#[test]
fn free_unit_costs_nothing() {
    let allocator = make_allocator(&[Decimal::ZERO]);
    let record = allocator.rent(UnitId(1), 24, "alice".into()).unwrap();
    assert_eq!(record.total_cost, Decimal::ZERO);
}

#[test]
fn zero_duration_is_invalid() {
    let allocator = make_allocator(&[dec!(5.0)]);
    let result = allocator.rent(UnitId(1), 0, "alice".into());

    assert_eq!(
        result,
        Err(RentalError::InvalidArgument("duration must be positive"))
    );
    assert_eq!(available_ids(&allocator), vec![1]);
    assert!(allocator.ledger().is_empty());
}

#[test]
fn zero_duration_on_unknown_unit_is_invalid() {
    let allocator = make_allocator(&[dec!(5.0)]);
    let result = allocator.rent(UnitId(42), 0, "alice".into());
    assert!(matches!(result, Err(RentalError::InvalidArgument(_))));
}

#[test]
fn rent_unknown_unit_is_not_found() {
    let allocator = make_allocator(&[dec!(5.0)]);
    assert_eq!(
        allocator.rent(UnitId(42), 1, "alice".into()),
        Err(RentalError::NotFound)
    );
}

#[test]
fn return_unknown_unit_is_not_found() {
    let allocator = make_allocator(&[dec!(5.0)]);
    assert_eq!(allocator.return_unit(UnitId(42)), Err(RentalError::NotFound));
}

#[test]
fn return_never_rented_unit_is_rejected() {
    let allocator = make_allocator(&[dec!(5.0)]);
    assert_eq!(
        allocator.return_unit(UnitId(1)),
        Err(RentalError::AlreadyAvailable)
    );
}

#[test]
fn second_return_is_rejected() {
    let allocator = make_allocator(&[dec!(5.0)]);
    allocator.rent(UnitId(1), 1, "alice".into()).unwrap();

    assert_eq!(allocator.return_unit(UnitId(1)), Ok(()));
    assert_eq!(
        allocator.return_unit(UnitId(1)),
        Err(RentalError::AlreadyAvailable)
    );
}

#[test]
fn units_are_independent() {
    let allocator = make_allocator(&[dec!(5.0), dec!(7.0), dec!(9.0)]);

    allocator.rent(UnitId(2), 1, "alice".into()).unwrap();
    assert_eq!(available_ids(&allocator), vec![1, 3]);

    allocator.rent(UnitId(1), 1, "bob".into()).unwrap();
    assert_eq!(available_ids(&allocator), vec![3]);

    allocator.return_unit(UnitId(2)).unwrap();
    assert_eq!(available_ids(&allocator), vec![2, 3]);
}

#[test]
fn get_reports_open_rental() {
    let allocator = make_allocator(&[dec!(5.0)]);
    let record = allocator.rent(UnitId(1), 1, "alice".into()).unwrap();

    let unit = allocator.get(UnitId(1)).unwrap();
    assert_eq!(unit.state, UnitState::Rented(record.rental_id));
    assert_eq!(allocator.get(UnitId(2)), Err(RentalError::NotFound));
}

#[test]
fn history_contains_every_rent_in_order() {
    let allocator = make_allocator(&[dec!(5.0), dec!(7.0)]);

    allocator.rent(UnitId(1), 1, "alice".into()).unwrap();
    allocator.rent(UnitId(2), 2, "bob".into()).unwrap();
    allocator.return_unit(UnitId(1)).unwrap();
    allocator.rent(UnitId(1), 3, "carol".into()).unwrap();

    let history: Vec<_> = allocator.history(&"alice".into()).into_iter().collect();
    let summary: Vec<_> = history
        .iter()
        .map(|r| (r.rental_id.0, r.unit_id.0, r.requester.as_str(), r.total_cost))
        .collect();

    assert_eq!(
        summary,
        vec![
            (1, 1, "alice", dec!(5.0)),
            (2, 2, "bob", dec!(14.0)),
            (3, 1, "carol", dec!(15.0)),
        ]
    );
}

#[test]
fn history_is_not_filtered_by_requester() {
    let allocator = make_allocator(&[dec!(5.0), dec!(7.0)]);
    allocator.rent(UnitId(1), 1, "alice".into()).unwrap();
    allocator.rent(UnitId(2), 1, "bob".into()).unwrap();

    assert_eq!(allocator.history(&"alice".into()).len(), 2);
    assert_eq!(allocator.history(&"mallory".into()).len(), 2);
}

#[test]
fn returns_do_not_change_history() {
    let allocator = make_allocator(&[dec!(5.0), dec!(7.0)]);
    allocator.rent(UnitId(1), 2, "alice".into()).unwrap();
    allocator.rent(UnitId(2), 3, "bob".into()).unwrap();

    let before: Vec<_> = allocator.history(&"alice".into()).into_iter().collect();
    allocator.return_unit(UnitId(1)).unwrap();
    allocator.return_unit(UnitId(2)).unwrap();
    let after: Vec<_> = allocator.history(&"alice".into()).into_iter().collect();

    assert_eq!(before, after);
}

#[test]
fn record_cost_is_frozen_at_rent_time() {
    let allocator = make_allocator(&[dec!(5.0)]);
    let record = allocator.rent(UnitId(1), 4, "alice".into()).unwrap();

    let stored = allocator.ledger().get(record.rental_id).unwrap();
    assert_eq!(stored.total_cost, dec!(20.0));
    assert_eq!(stored, record);
    assert_eq!(allocator.ledger().get(RentalId(2)), None);
}

#[test]
fn default_allocator_offers_builtin_gpus() {
    let allocator = Allocator::default();
    let units = allocator.list_available();

    assert_eq!(units.len(), 2);
    assert_eq!(units[0].name, "NVIDIA GeForce GTX 1080");
    assert_eq!(units[0].price_per_hour, dec!(5.0));
    assert_eq!(units[1].name, "AMD Radeon RX 5700 XT");
    assert_eq!(units[1].price_per_hour, dec!(7.0));
    assert_eq!(allocator.registry().len(), 2);
}
