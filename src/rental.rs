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

//! Rental records.
//!
//! A record is written once, when a rent commits, and is never touched again.
//! Returning the unit does not close or amend it.

use crate::base::{RentalId, Requester, UnitId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One committed rent transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentalRecord {
    pub rental_id: RentalId,
    pub unit_id: UnitId,
    pub requester: Requester,
    pub duration_hours: u32,
    /// `duration_hours * price_per_hour`, frozen at rent time.
    pub total_cost: Decimal,
    pub created_at: DateTime<Utc>,
}
