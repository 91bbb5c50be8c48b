// -------------------------------------------------------------------------------------------------
//  Copyright (C) 2015-2025 Nautech Systems Pty Ltd. All rights reserved.
//  https://nautechsystems.io
//
//  Licensed under the GNU Lesser General Public License Version 3.0 (the "License");
//  You may not use this file except in compliance with the License.
//  You may obtain a copy of the License at https://www.gnu.org/licenses/lgpl-3.0.en.html
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.
// -------------------------------------------------------------------------------------------------

//! Error types for the MT5 adapter.

use thiserror::Error;

use crate::enums::ErrorCode;

/// The error type for all failures surfaced by this adapter.
///
/// With `raise_on_errors` disabled (the default) the query wrappers mirror the
/// terminal's native convention and return the absence-signal (`None` / empty
/// collection) instead; only the connection lifecycle produces these errors
/// unconditionally.
#[derive(Error, Debug)]
pub enum Mt5Error {
    #[error("terminal initialize failed: {code}: {message}")]
    ConnectionInitFailed { code: ErrorCode, message: String },

    #[error("real account trading has not been enabled for this session")]
    RealAccountDisabled,

    #[error("terminal auto-trading is disabled")]
    AutoTradingDisabled,

    #[error("{code}: {message}")]
    VendorCallFailed { code: ErrorCode, message: String },

    #[error("unsupported operation: {0}")]
    Unsupported(String),
}

impl Mt5Error {
    /// The stable error code carried by this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            Mt5Error::ConnectionInitFailed { code, .. } => *code,
            Mt5Error::RealAccountDisabled => ErrorCode::RealAccountDisabled,
            Mt5Error::AutoTradingDisabled => ErrorCode::AutoTradeDisabled,
            Mt5Error::VendorCallFailed { code, .. } => *code,
            Mt5Error::Unsupported(_) => ErrorCode::Unsupported,
        }
    }
}

pub type Mt5Result<T> = Result<T, Mt5Error>;
