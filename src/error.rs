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

//! Error types for rent and return requests.

use thiserror::Error;

/// Rental broker errors.
///
/// Every variant is an expected outcome of a request and leaves the registry
/// and ledger exactly as they were before the call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RentalError {
    /// Malformed input, such as a zero duration or a duplicate unit ID
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// Referenced unit does not exist
    #[error("unit not found")]
    NotFound,

    /// Unit is already rented
    #[error("unit not available for rent")]
    Unavailable,

    /// Unit is not rented, so there is nothing to return
    #[error("unit is already available")]
    AlreadyAvailable,
}
