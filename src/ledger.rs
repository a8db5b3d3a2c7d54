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

//! Append-only rental ledger.
//!
//! Records are stored in commit order and handed out through [`History`], a
//! bounded view that can be iterated any number of times.

use crate::base::{RentalId, Requester, UnitId};
use crate::rental::RentalRecord;
use chrono::Utc;
use parking_lot::RwLock;
use rust_decimal::Decimal;

/// A thread-safe, append-only sequence of rental records.
///
/// Appends take the write lock; reads share the read lock. Rental IDs are
/// assigned under the write lock, so ID order and storage order agree.
#[derive(Debug, Default)]
pub struct Ledger {
    records: RwLock<Vec<RentalRecord>>,
}

impl Ledger {
    /// Creates a new empty ledger.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }

    /// Appends a record stamped with the next rental ID and the current time.
    pub(crate) fn append(
        &self,
        unit_id: UnitId,
        requester: Requester,
        duration_hours: u32,
        total_cost: Decimal,
    ) -> RentalRecord {
        let mut records = self.records.write();
        let rental_id = RentalId(records.len() as u64 + 1);
        // Clamp to the previous timestamp so a clock step back cannot reorder history.
        let now = Utc::now();
        let created_at = records.last().map_or(now, |last| last.created_at.max(now));
        let record = RentalRecord {
            rental_id,
            unit_id,
            requester,
            duration_hours,
            total_cost,
            created_at,
        };
        records.push(record.clone());
        record
    }

    /// Number of records appended so far.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Looks up a record by rental ID.
    pub fn get(&self, rental_id: RentalId) -> Option<RentalRecord> {
        let index = usize::try_from(rental_id.0).ok()?.checked_sub(1)?;
        self.records.read().get(index).cloned()
    }

    /// View of every record committed before this call.
    pub fn history(&self) -> History<'_> {
        History {
            ledger: self,
            len: self.len(),
        }
    }
}

/// Lazy, finite view over a prefix of the ledger.
///
/// The view is fixed to the records that existed when it was taken. Records
/// appended later are not visible through it. Each call to [`History::iter`]
/// starts again from the oldest record.
#[derive(Debug, Clone, Copy)]
pub struct History<'a> {
    ledger: &'a Ledger,
    len: usize,
}

impl<'a> History<'a> {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterates records oldest first, cloning each one as it is reached.
    pub fn iter(&self) -> HistoryIter<'a> {
        HistoryIter {
            ledger: self.ledger,
            next: 0,
            len: self.len,
        }
    }
}

impl<'a> IntoIterator for History<'a> {
    type Item = RentalRecord;
    type IntoIter = HistoryIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a> IntoIterator for &History<'a> {
    type Item = RentalRecord;
    type IntoIter = HistoryIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator returned by [`History::iter`].
#[derive(Debug, Clone)]
pub struct HistoryIter<'a> {
    ledger: &'a Ledger,
    next: usize,
    len: usize,
}

impl Iterator for HistoryIter<'_> {
    type Item = RentalRecord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.len {
            return None;
        }
        // Records are never removed, so every index below `len` stays valid.
        let record = self.ledger.records.read()[self.next].clone();
        self.next += 1;
        Some(record)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for HistoryIter<'_> {}
