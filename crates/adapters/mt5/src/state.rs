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

//! Adapter state consulted by every wrapped terminal call.
//!
//! The state is owned by the client and scoped to it — two clients never
//! share configuration. Sessions snapshot it on entry and restore it on exit,
//! which is what makes nested sessions safe.

use serde::{Deserialize, Serialize};

use crate::convert::ReturnMode;

/// Default ceiling on bar-count requests until a session caches the
/// terminal's own limit.
pub const DEFAULT_MAX_BARS: u32 = 100_000;

/// Cross-cutting behavior applied to every wrapped terminal call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdapterState {
    /// Emit a structured debug event (with latency) for every call.
    pub debug_logging: bool,
    /// Check `last_error` after each call and fail with a typed error when
    /// the result is the absence-signal.
    pub raise_on_errors: bool,
    /// Conversion strategy for [`crate::client::Session::render`].
    pub return_mode: ReturnMode,
    /// Ceiling on bar-count requests, cached from the terminal on connect.
    pub max_bars: u32,
}

impl Default for AdapterState {
    fn default() -> Self {
        Self {
            debug_logging: false,
            raise_on_errors: false,
            return_mode: ReturnMode::Raw,
            max_bars: DEFAULT_MAX_BARS,
        }
    }
}

/// Partial state applied on session entry; unset fields keep their prior
/// value.
#[derive(Debug, Clone, Copy, Default)]
pub struct StateOverrides {
    pub debug_logging: Option<bool>,
    pub raise_on_errors: Option<bool>,
    pub return_mode: Option<ReturnMode>,
    pub max_bars: Option<u32>,
}

impl AdapterState {
    /// An immutable copy of the current fields, for later restoration.
    pub fn snapshot(&self) -> Self {
        *self
    }

    /// Overwrites only the provided fields.
    pub fn apply(&mut self, overrides: &StateOverrides) {
        if let Some(v) = overrides.debug_logging {
            self.debug_logging = v;
        }
        if let Some(v) = overrides.raise_on_errors {
            self.raise_on_errors = v;
        }
        if let Some(v) = overrides.return_mode {
            self.return_mode = v;
        }
        if let Some(v) = overrides.max_bars {
            self.max_bars = v;
        }
    }

    /// Sets all fields back to the given snapshot.
    pub fn restore(&mut self, snapshot: AdapterState) {
        *self = snapshot;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let state = AdapterState::default();
        assert!(!state.debug_logging);
        assert!(!state.raise_on_errors);
        assert_eq!(state.return_mode, ReturnMode::Raw);
        assert_eq!(state.max_bars, DEFAULT_MAX_BARS);
    }

    #[test]
    fn apply_overwrites_only_provided_fields() {
        let mut state = AdapterState::default();
        state.apply(&StateOverrides {
            raise_on_errors: Some(true),
            ..Default::default()
        });
        assert!(state.raise_on_errors);
        assert!(!state.debug_logging);
        assert_eq!(state.max_bars, DEFAULT_MAX_BARS);
    }

    #[test]
    fn snapshot_restore_round_trip() {
        let mut state = AdapterState::default();
        let snapshot = state.snapshot();
        state.apply(&StateOverrides {
            debug_logging: Some(true),
            raise_on_errors: Some(true),
            return_mode: Some(ReturnMode::Native),
            max_bars: Some(5000),
        });
        assert_ne!(state, snapshot);
        state.restore(snapshot);
        assert_eq!(state, snapshot);
    }
}
