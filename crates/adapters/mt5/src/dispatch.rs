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

//! Uniform interception applied to every wrapped terminal call.
//!
//! One code path implements both cross-cutting behaviors the adapter state
//! enables: latency/debug logging and converting the terminal's
//! absence-signal into a typed error. Wrappers stay one-liners; they describe
//! the call and hand the actual invocation over as a closure.

use std::time::Instant;

use crate::enums::{ErrorCode, TradeRetcode};
use crate::error::{Mt5Error, Mt5Result};
use crate::models::{OrderSendResult, TradeRequest};
use crate::state::AdapterState;
use crate::terminal::TerminalApi;

/// How a wrapped call signals failure without an error channel.
///
/// The terminal reports "no result" in-band: `None` for single records,
/// an empty vector for collections, `false` for command-style calls.
/// Numeric scalars (the `*_total` counts and the calculators) have no
/// absence-signal at all; zero is a legitimate answer.
pub trait CallOutcome {
    fn is_absent(&self) -> bool;
}

impl<T> CallOutcome for Option<T> {
    fn is_absent(&self) -> bool {
        self.is_none()
    }
}

impl<T> CallOutcome for Vec<T> {
    fn is_absent(&self) -> bool {
        self.is_empty()
    }
}

impl CallOutcome for bool {
    fn is_absent(&self) -> bool {
        !*self
    }
}

macro_rules! never_absent {
    ($($ty:ty),+ $(,)?) => {
        $(impl CallOutcome for $ty {
            fn is_absent(&self) -> bool {
                false
            }
        })+
    };
}

never_absent!(u32, u64, i32, i64, f64);

/// Runs one terminal call with the interception the current state asks for.
///
/// `args` is the call's argument set as a JSON value, used verbatim in debug
/// events and appended to invalid-argument failures.
pub(crate) fn dispatch<A, T, F>(
    api: &mut A,
    state: &AdapterState,
    name: &'static str,
    args: &serde_json::Value,
    f: F,
) -> Mt5Result<T>
where
    A: TerminalApi,
    T: CallOutcome,
    F: FnOnce(&mut A) -> T,
{
    let started = state.debug_logging.then(Instant::now);
    let result = f(api);

    if let Some(started) = started {
        let latency_us = started.elapsed().as_micros() as u64;
        let (code, message) = api.last_error();
        if result.is_absent() {
            tracing::warn!(
                call = name,
                args = %args,
                latency_us,
                error_code = code,
                error = %message,
                "function_debugging"
            );
        } else {
            tracing::debug!(
                call = name,
                args = %args,
                latency_us,
                error_code = code,
                error = %message,
                "function_debugging"
            );
        }
    }

    if state.raise_on_errors && result.is_absent() {
        let (raw, description) = api.last_error();
        let code = ErrorCode::from_code(raw);
        if code != ErrorCode::Ok {
            let message = if code == ErrorCode::InvalidParams {
                format!("{description}: {name} called with {args}")
            } else {
                description
            };
            return Err(Mt5Error::VendorCallFailed { code, message });
        }
    }

    Ok(result)
}

/// Emits the two-sided order log: the request before the call, the response
/// (success or failure) after it.
pub(crate) fn log_order_request(request: &TradeRequest) {
    let type_name = request.order_type.name();
    match serde_json::to_value(request) {
        Ok(json) => tracing::info!(order_type = type_name, request = %json, "order_request"),
        Err(_) => tracing::info!(order_type = type_name, ?request, "order_request"),
    }
}

pub(crate) fn log_order_response(result: Option<&OrderSendResult>) {
    match result {
        Some(res) if res.retcode == TradeRetcode::Done as u32 => {
            tracing::info!(
                retcode = res.retcode,
                retcode_name = TradeRetcode::description(res.retcode),
                order = res.order,
                deal = res.deal,
                price = res.price,
                volume = res.volume,
                "order_response"
            );
        }
        Some(res) => {
            tracing::warn!(
                retcode = res.retcode,
                retcode_name = TradeRetcode::description(res.retcode),
                comment = %res.comment,
                "order_fail"
            );
        }
        None => tracing::warn!("order_fail"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockTerminal;

    #[test]
    fn absence_signals() {
        assert!(Option::<u32>::None.is_absent());
        assert!(!Some(0_u32).is_absent());
        assert!(Vec::<u32>::new().is_absent());
        assert!(!vec![1_u32].is_absent());
        assert!(false.is_absent());
        assert!(!true.is_absent());
        // Counts and calculators have no failure signal; zero is an answer.
        assert!(!0_u32.is_absent());
        assert!(!0.0_f64.is_absent());
    }

    #[test]
    #[tracing_test::traced_test]
    fn debug_event_carries_last_error() {
        let mut api = MockTerminal::default();
        api.set_last_error(ErrorCode::Ok.code(), "Success");
        let state = AdapterState {
            debug_logging: true,
            ..Default::default()
        };
        let out: Mt5Result<Option<u32>> =
            dispatch(&mut api, &state, "symbols_total", &serde_json::json!({}), |_| Some(3));
        assert!(matches!(out, Ok(Some(3))));
        assert!(logs_contain("function_debugging"));
        // The error pair is attached even when the call succeeded.
        assert!(logs_contain("Success"));
    }

    #[test]
    fn raising_disabled_passes_absence_through() {
        let mut api = MockTerminal::default();
        api.set_last_error(ErrorCode::NotFound.code(), "not found");
        let state = AdapterState::default();
        let out: Mt5Result<Option<u32>> =
            dispatch(&mut api, &state, "symbols_total", &serde_json::json!({}), |_| None);
        assert!(matches!(out, Ok(None)));
    }

    #[test]
    fn raising_converts_absence_into_typed_error() {
        let mut api = MockTerminal::default();
        api.set_last_error(ErrorCode::NotFound.code(), "not found");
        let state = AdapterState {
            raise_on_errors: true,
            ..Default::default()
        };
        let out: Mt5Result<Option<u32>> =
            dispatch(&mut api, &state, "symbol_info", &serde_json::json!({"symbol": "X"}), |_| {
                None
            });
        match out {
            Err(Mt5Error::VendorCallFailed { code, .. }) => {
                assert_eq!(code, ErrorCode::NotFound);
            }
            other => panic!("expected vendor failure, got {other:?}"),
        }
    }

    #[test]
    fn raising_spares_absence_when_last_error_is_ok() {
        let mut api = MockTerminal::default();
        api.set_last_error(ErrorCode::Ok.code(), "ok");
        let state = AdapterState {
            raise_on_errors: true,
            ..Default::default()
        };
        let out: Mt5Result<Vec<u32>> =
            dispatch(&mut api, &state, "orders_get", &serde_json::json!({}), |_| Vec::new());
        assert!(matches!(out, Ok(v) if v.is_empty()));
    }

    #[test]
    fn invalid_params_failure_carries_the_arguments() {
        let mut api = MockTerminal::default();
        api.set_last_error(ErrorCode::InvalidParams.code(), "invalid arguments");
        let state = AdapterState {
            raise_on_errors: true,
            ..Default::default()
        };
        let args = serde_json::json!({"symbol": "EURUSD", "count": -1});
        let out: Mt5Result<Option<u32>> =
            dispatch(&mut api, &state, "copy_rates", &args, |_| None);
        match out {
            Err(Mt5Error::VendorCallFailed { message, .. }) => {
                assert!(message.contains("copy_rates"));
                assert!(message.contains("EURUSD"));
            }
            other => panic!("expected vendor failure, got {other:?}"),
        }
    }
}
