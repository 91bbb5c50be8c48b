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

//! Connection lifecycle and the wrapped terminal call surface.
//!
//! [`Mt5Client`] owns the vendor binding and the adapter state; a
//! [`Session`] is the proof of an initialized connection and the only place
//! terminal calls can be made from. Dropping the session shuts the terminal
//! down and restores the state that was in effect before entry, on every exit
//! path, including gate failures during connect.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::convert::{convert, CallValue, Recordish, ReturnMode};
use crate::dispatch::{dispatch, log_order_request, log_order_response};
use crate::enums::{CopyTicks, ErrorCode, OrderType, Timeframe, MIN_TERMINAL_BUILD};
use crate::error::{Mt5Error, Mt5Result};
use crate::models::{
    AccountInfo, OrderCheckResult, OrderSendResult, Rate, SymbolInfo, TerminalInfo, Tick,
    TradeDeal, TradeOrder, TradePosition, TradeRequest,
};
use crate::state::{AdapterState, StateOverrides};
use crate::terminal::{HistorySelect, InitParams, RatesWindow, TerminalApi, TicketFilter};

use chrono::{DateTime, Utc};

/// Connection settings plus the session-scoped behavior switches.
///
/// The connection fields mirror [`InitParams`]; unset ones fall back to the
/// terminal's own defaults. The behavior switches overwrite the adapter state
/// for the lifetime of the session and are rolled back on exit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Mt5Config {
    pub path: Option<String>,
    pub login: Option<u64>,
    pub password: Option<String>,
    pub server: Option<String>,
    pub timeout_ms: Option<u32>,
    pub portable: Option<bool>,
    /// Fail connect when the terminal's auto-trading switch is off.
    pub ensure_trade_enabled: bool,
    /// Allow sessions against real (live) accounts. Off by default so a demo
    /// configuration pointed at the wrong login fails loudly.
    pub enable_real_trading: bool,
    pub debug_logging: bool,
    pub raise_on_errors: bool,
    pub return_mode: ReturnMode,
}

impl Mt5Config {
    fn init_params(&self) -> InitParams {
        InitParams {
            path: self.path.clone(),
            login: self.login,
            password: self.password.clone(),
            server: self.server.clone(),
            timeout_ms: self.timeout_ms,
            portable: self.portable,
        }
    }

    fn overrides(&self) -> StateOverrides {
        StateOverrides {
            debug_logging: Some(self.debug_logging),
            raise_on_errors: Some(self.raise_on_errors),
            return_mode: Some(self.return_mode),
            max_bars: None,
        }
    }
}

/// Owns one vendor binding and the state scoped to it.
///
/// Two clients never share state; there is no process-global configuration.
#[derive(Debug)]
pub struct Mt5Client<A: TerminalApi> {
    api: A,
    state: AdapterState,
}

impl<A: TerminalApi> Mt5Client<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            state: AdapterState::default(),
        }
    }

    pub fn state(&self) -> &AdapterState {
        &self.state
    }

    /// Consumes the client, returning the vendor binding.
    pub fn into_inner(self) -> A {
        self.api
    }

    /// Initializes the terminal and opens a session.
    ///
    /// On success the terminal's own bar limit is cached into the state. Any
    /// failure after initialization succeeds (account unavailable, real
    /// account not enabled, auto-trading off) still shuts the terminal down
    /// and restores the prior state before the error is returned.
    pub fn connect(&mut self, config: &Mt5Config) -> Mt5Result<Session<'_, A>> {
        let prior = self.state.snapshot();
        self.state.apply(&config.overrides());

        if !self.api.initialize(&config.init_params()) {
            let (raw, message) = self.api.last_error();
            // The vendor library can leave a half-open IPC pipe behind a
            // failed initialize.
            self.api.shutdown();
            self.state.restore(prior);
            return Err(Mt5Error::ConnectionInitFailed {
                code: ErrorCode::from_code(raw),
                message,
            });
        }

        let mut session = Session {
            client: self,
            prior,
            terminal: None,
        };
        session.startup_checks(config)?;
        tracing::debug!(
            login = config.login,
            server = config.server.as_deref(),
            "terminal connection opened"
        );
        Ok(session)
    }
}

/// An initialized terminal connection.
///
/// All wrapped calls live here. The session borrows the client mutably, so
/// the borrow checker enforces the single-connection discipline; nested
/// sessions are opened through [`Session::connect`].
#[derive(Debug)]
pub struct Session<'a, A: TerminalApi> {
    client: &'a mut Mt5Client<A>,
    prior: AdapterState,
    terminal: Option<TerminalInfo>,
}

impl<A: TerminalApi> Drop for Session<'_, A> {
    fn drop(&mut self) {
        self.client.api.shutdown();
        self.client.state.restore(self.prior);
        tracing::debug!("terminal connection closed");
    }
}

impl<'a, A: TerminalApi> Session<'a, A> {
    fn startup_checks(&mut self, config: &Mt5Config) -> Mt5Result<()> {
        let account = match self.client.api.account_info() {
            Some(account) => account,
            None => return Err(self.vendor_failure()),
        };
        if account.trade_mode == crate::enums::AccountTradeMode::Real
            && !config.enable_real_trading
        {
            return Err(Mt5Error::RealAccountDisabled);
        }

        let terminal = match self.client.api.terminal_info() {
            Some(terminal) => terminal,
            None => return Err(self.vendor_failure()),
        };
        if config.ensure_trade_enabled && !terminal.trade_allowed {
            return Err(Mt5Error::AutoTradingDisabled);
        }

        self.client.state.max_bars = terminal.maxbars;
        self.terminal = Some(terminal);
        Ok(())
    }

    fn vendor_failure(&mut self) -> Mt5Error {
        let (raw, message) = self.client.api.last_error();
        Mt5Error::VendorCallFailed {
            code: ErrorCode::from_code(raw),
            message,
        }
    }

    /// The terminal info captured when the session was opened.
    pub fn connected_terminal(&self) -> Option<&TerminalInfo> {
        self.terminal.as_ref()
    }

    /// Opens a nested session, re-initializing the terminal with new
    /// settings. The outer state is restored when the inner session drops.
    pub fn connect(&mut self, config: &Mt5Config) -> Mt5Result<Session<'_, A>> {
        self.client.connect(config)
    }

    // ---------------------------------------------------------------------
    // State switches, togglable mid-session
    // ---------------------------------------------------------------------

    pub fn state(&self) -> &AdapterState {
        &self.client.state
    }

    pub fn set_raise_on_errors(&mut self, enabled: bool) {
        self.client.state.raise_on_errors = enabled;
    }

    pub fn set_debug_logging(&mut self, enabled: bool) {
        self.client.state.debug_logging = enabled;
    }

    pub fn set_return_mode(&mut self, mode: ReturnMode) {
        self.client.state.return_mode = mode;
    }

    /// Applies the session's return mode to a response tree.
    pub fn render(&self, value: CallValue) -> CallValue {
        convert(self.client.state.return_mode, value)
    }

    /// Renders one record under the session's return mode.
    pub fn render_record<T: Recordish>(&self, record: &T) -> CallValue {
        self.render(record.to_call_value())
    }

    /// Renders a columnar slice (rates/ticks) under the session's return
    /// mode; raw and dict modes keep the series wrapper.
    pub fn render_series<T: Recordish>(&self, items: &[T]) -> CallValue {
        self.render(CallValue::series_of(items))
    }

    /// Renders a plain sequence of records under the session's return mode.
    pub fn render_list<T: Recordish>(&self, items: &[T]) -> CallValue {
        self.render(CallValue::list_of(items))
    }

    // ---------------------------------------------------------------------
    // Terminal and account
    // ---------------------------------------------------------------------

    /// Round-trip latency of a terminal-info call in milliseconds, paired
    /// with the terminal's own last trade-server ping in microseconds.
    pub fn ping(&mut self) -> Mt5Result<(f64, i64)> {
        let started = Instant::now();
        let terminal = self.client.api.terminal_info();
        let elapsed_ms = started.elapsed().as_secs_f64() * 1_000.0;
        match terminal {
            Some(terminal) => Ok((elapsed_ms, terminal.ping_last)),
            None => Err(self.vendor_failure()),
        }
    }

    pub fn version(&mut self) -> Mt5Result<Option<(u32, u32, String)>> {
        let client = &mut *self.client;
        dispatch(&mut client.api, &client.state, "version", &json!({}), |api| api.version())
    }

    pub fn account_info(&mut self) -> Mt5Result<Option<AccountInfo>> {
        let client = &mut *self.client;
        dispatch(&mut client.api, &client.state, "account_info", &json!({}), |api| {
            api.account_info()
        })
    }

    pub fn terminal_info(&mut self) -> Mt5Result<Option<TerminalInfo>> {
        let client = &mut *self.client;
        dispatch(&mut client.api, &client.state, "terminal_info", &json!({}), |api| {
            api.terminal_info()
        })
    }

    /// Switches the connected terminal to another trading account.
    pub fn login(
        &mut self,
        login: u64,
        password: &str,
        server: &str,
        timeout_ms: Option<u32>,
    ) -> Mt5Result<bool> {
        let client = &mut *self.client;
        let args = json!({"login": login, "server": server, "timeout_ms": timeout_ms});
        dispatch(&mut client.api, &client.state, "login", &args, |api| {
            api.login(login, password, server, timeout_ms)
        })
    }

    // ---------------------------------------------------------------------
    // Symbols
    // ---------------------------------------------------------------------

    pub fn symbols_total(&mut self) -> Mt5Result<Option<u32>> {
        let client = &mut *self.client;
        dispatch(&mut client.api, &client.state, "symbols_total", &json!({}), |api| {
            api.symbols_total()
        })
    }

    pub fn symbols_get(&mut self, group: Option<&str>) -> Mt5Result<Vec<SymbolInfo>> {
        self.symbols_get_where(group, |_| true)
    }

    /// Like [`Session::symbols_get`], with a caller-side predicate applied
    /// after the terminal's group filter.
    pub fn symbols_get_where(
        &mut self,
        group: Option<&str>,
        mut predicate: impl FnMut(&SymbolInfo) -> bool,
    ) -> Mt5Result<Vec<SymbolInfo>> {
        let client = &mut *self.client;
        let args = json!({"group": group});
        let result = dispatch(&mut client.api, &client.state, "symbols_get", &args, |api| {
            api.symbols_get(group)
        })?;
        match result {
            Some(symbols) => Ok(symbols.into_iter().filter(|s| predicate(s)).collect()),
            // An absent result with a clean last_error means the call itself
            // never reached a working terminal; diagnose the two known causes.
            None if self.client.state.raise_on_errors => {
                let build = self.terminal.as_ref().map_or(0, |t| t.build);
                if build < MIN_TERMINAL_BUILD {
                    Err(Mt5Error::VendorCallFailed {
                        code: ErrorCode::TerminalVersionOutdated,
                        message: format!(
                            "symbols_get requires terminal build {MIN_TERMINAL_BUILD} or newer (connected build is {build})"
                        ),
                    })
                } else {
                    Err(Mt5Error::VendorCallFailed {
                        code: ErrorCode::UnknownError,
                        message: "symbols_get returned no result. Is the terminal connected?"
                            .to_string(),
                    })
                }
            }
            None => Ok(Vec::new()),
        }
    }

    pub fn symbol_info(&mut self, symbol: &str) -> Mt5Result<Option<SymbolInfo>> {
        let client = &mut *self.client;
        let args = json!({"symbol": symbol});
        dispatch(&mut client.api, &client.state, "symbol_info", &args, |api| {
            api.symbol_info(symbol)
        })
    }

    pub fn symbol_info_tick(&mut self, symbol: &str) -> Mt5Result<Option<Tick>> {
        let client = &mut *self.client;
        let args = json!({"symbol": symbol});
        dispatch(&mut client.api, &client.state, "symbol_info_tick", &args, |api| {
            api.symbol_info_tick(symbol)
        })
    }

    /// Shows or hides a symbol in MarketWatch.
    pub fn symbol_select(&mut self, symbol: &str, enable: bool) -> Mt5Result<bool> {
        let client = &mut *self.client;
        let args = json!({"symbol": symbol, "enable": enable});
        dispatch(&mut client.api, &client.state, "symbol_select", &args, |api| {
            api.symbol_select(symbol, enable)
        })
    }

    // ---------------------------------------------------------------------
    // Rates and ticks
    // ---------------------------------------------------------------------

    /// Copies bars for a symbol/timeframe, clamping count-style windows to
    /// one below the terminal's own bar limit so the vendor call cannot fail
    /// on an over-sized request.
    pub fn copy_rates(
        &mut self,
        symbol: &str,
        timeframe: Timeframe,
        window: RatesWindow,
    ) -> Mt5Result<Vec<Rate>> {
        let limit = self.client.state.max_bars.saturating_sub(1);
        let window = match window {
            RatesWindow::From { from, count } => RatesWindow::From {
                from,
                count: count.min(limit),
            },
            RatesWindow::FromPos { start, count } => RatesWindow::FromPos {
                start,
                count: count.min(limit),
            },
            range @ RatesWindow::Range { .. } => range,
        };
        let client = &mut *self.client;
        let args = json!({"symbol": symbol, "timeframe": timeframe as i32, "window": &window});
        let rates = dispatch(&mut client.api, &client.state, "copy_rates", &args, |api| {
            api.copy_rates(symbol, timeframe, &window)
        })?;
        Ok(rates.unwrap_or_default())
    }

    pub fn copy_rates_from(
        &mut self,
        symbol: &str,
        timeframe: Timeframe,
        from: DateTime<Utc>,
        count: u32,
    ) -> Mt5Result<Vec<Rate>> {
        self.copy_rates(symbol, timeframe, RatesWindow::From { from, count })
    }

    pub fn copy_rates_from_pos(
        &mut self,
        symbol: &str,
        timeframe: Timeframe,
        start: u32,
        count: u32,
    ) -> Mt5Result<Vec<Rate>> {
        self.copy_rates(symbol, timeframe, RatesWindow::FromPos { start, count })
    }

    pub fn copy_rates_range(
        &mut self,
        symbol: &str,
        timeframe: Timeframe,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Mt5Result<Vec<Rate>> {
        self.copy_rates(symbol, timeframe, RatesWindow::Range { from, to })
    }

    pub fn copy_ticks_from(
        &mut self,
        symbol: &str,
        from: DateTime<Utc>,
        count: u32,
        flags: CopyTicks,
    ) -> Mt5Result<Vec<Tick>> {
        let client = &mut *self.client;
        let args = json!({"symbol": symbol, "from": from, "count": count, "flags": flags as i32});
        let ticks = dispatch(&mut client.api, &client.state, "copy_ticks_from", &args, |api| {
            api.copy_ticks_from(symbol, from, count, flags)
        })?;
        Ok(ticks.unwrap_or_default())
    }

    pub fn copy_ticks_range(
        &mut self,
        symbol: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        flags: CopyTicks,
    ) -> Mt5Result<Vec<Tick>> {
        let client = &mut *self.client;
        let args = json!({"symbol": symbol, "from": from, "to": to, "flags": flags as i32});
        let ticks = dispatch(&mut client.api, &client.state, "copy_ticks_range", &args, |api| {
            api.copy_ticks_range(symbol, from, to, flags)
        })?;
        Ok(ticks.unwrap_or_default())
    }

    // ---------------------------------------------------------------------
    // Orders and positions
    // ---------------------------------------------------------------------

    pub fn orders_total(&mut self) -> Mt5Result<Option<u32>> {
        let client = &mut *self.client;
        dispatch(&mut client.api, &client.state, "orders_total", &json!({}), |api| {
            api.orders_total()
        })
    }

    pub fn orders_get(&mut self, filter: &TicketFilter) -> Mt5Result<Vec<TradeOrder>> {
        let client = &mut *self.client;
        let args = json!({"filter": filter});
        let orders = dispatch(&mut client.api, &client.state, "orders_get", &args, |api| {
            api.orders_get(filter)
        })?;
        Ok(orders.unwrap_or_default())
    }

    /// Active orders matching a caller-side predicate.
    pub fn orders_get_where(
        &mut self,
        filter: &TicketFilter,
        mut predicate: impl FnMut(&TradeOrder) -> bool,
    ) -> Mt5Result<Vec<TradeOrder>> {
        let orders = self.orders_get(filter)?;
        Ok(orders.into_iter().filter(|o| predicate(o)).collect())
    }

    pub fn positions_total(&mut self) -> Mt5Result<Option<u32>> {
        let client = &mut *self.client;
        dispatch(&mut client.api, &client.state, "positions_total", &json!({}), |api| {
            api.positions_total()
        })
    }

    pub fn positions_get(&mut self, filter: &TicketFilter) -> Mt5Result<Vec<TradePosition>> {
        let client = &mut *self.client;
        let args = json!({"filter": filter});
        let positions = dispatch(&mut client.api, &client.state, "positions_get", &args, |api| {
            api.positions_get(filter)
        })?;
        Ok(positions.unwrap_or_default())
    }

    /// Open positions matching a caller-side predicate.
    pub fn positions_get_where(
        &mut self,
        filter: &TicketFilter,
        mut predicate: impl FnMut(&TradePosition) -> bool,
    ) -> Mt5Result<Vec<TradePosition>> {
        let positions = self.positions_get(filter)?;
        Ok(positions.into_iter().filter(|p| predicate(p)).collect())
    }

    // ---------------------------------------------------------------------
    // Trading history
    // ---------------------------------------------------------------------

    pub fn history_orders_total(
        &mut self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Mt5Result<Option<u32>> {
        let client = &mut *self.client;
        let args = json!({"from": from, "to": to});
        dispatch(&mut client.api, &client.state, "history_orders_total", &args, |api| {
            api.history_orders_total(from, to)
        })
    }

    pub fn history_orders_get(&mut self, select: &HistorySelect) -> Mt5Result<Vec<TradeOrder>> {
        let client = &mut *self.client;
        let args = json!({"select": select});
        let orders =
            dispatch(&mut client.api, &client.state, "history_orders_get", &args, |api| {
                api.history_orders_get(select)
            })?;
        Ok(orders.unwrap_or_default())
    }

    /// Historical orders matching a caller-side predicate.
    pub fn history_orders_get_where(
        &mut self,
        select: &HistorySelect,
        mut predicate: impl FnMut(&TradeOrder) -> bool,
    ) -> Mt5Result<Vec<TradeOrder>> {
        let orders = self.history_orders_get(select)?;
        Ok(orders.into_iter().filter(|o| predicate(o)).collect())
    }

    pub fn history_deals_total(
        &mut self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Mt5Result<Option<u32>> {
        let client = &mut *self.client;
        let args = json!({"from": from, "to": to});
        dispatch(&mut client.api, &client.state, "history_deals_total", &args, |api| {
            api.history_deals_total(from, to)
        })
    }

    pub fn history_deals_get(&mut self, select: &HistorySelect) -> Mt5Result<Vec<TradeDeal>> {
        let client = &mut *self.client;
        let args = json!({"select": select});
        let deals = dispatch(&mut client.api, &client.state, "history_deals_get", &args, |api| {
            api.history_deals_get(select)
        })?;
        Ok(deals.unwrap_or_default())
    }

    /// Historical deals matching a caller-side predicate.
    pub fn history_deals_get_where(
        &mut self,
        select: &HistorySelect,
        mut predicate: impl FnMut(&TradeDeal) -> bool,
    ) -> Mt5Result<Vec<TradeDeal>> {
        let deals = self.history_deals_get(select)?;
        Ok(deals.into_iter().filter(|d| predicate(d)).collect())
    }

    // ---------------------------------------------------------------------
    // Trading
    // ---------------------------------------------------------------------

    pub fn order_calc_margin(
        &mut self,
        order_type: OrderType,
        symbol: &str,
        volume: f64,
        price: f64,
    ) -> Mt5Result<Option<f64>> {
        let client = &mut *self.client;
        let args = json!({
            "type": order_type as i32, "symbol": symbol, "volume": volume, "price": price,
        });
        dispatch(&mut client.api, &client.state, "order_calc_margin", &args, |api| {
            api.order_calc_margin(order_type, symbol, volume, price)
        })
    }

    pub fn order_calc_profit(
        &mut self,
        order_type: OrderType,
        symbol: &str,
        volume: f64,
        price_open: f64,
        price_close: f64,
    ) -> Mt5Result<Option<f64>> {
        let client = &mut *self.client;
        let args = json!({
            "type": order_type as i32, "symbol": symbol, "volume": volume,
            "price_open": price_open, "price_close": price_close,
        });
        dispatch(&mut client.api, &client.state, "order_calc_profit", &args, |api| {
            api.order_calc_profit(order_type, symbol, volume, price_open, price_close)
        })
    }

    pub fn order_check(&mut self, request: &TradeRequest) -> Mt5Result<Option<OrderCheckResult>> {
        let client = &mut *self.client;
        let args = serde_json::to_value(request).unwrap_or_default();
        dispatch(&mut client.api, &client.state, "order_check", &args, |api| {
            api.order_check(request)
        })
    }

    /// Sends a trade request, logging both sides of the exchange.
    pub fn order_send(&mut self, request: &TradeRequest) -> Mt5Result<Option<OrderSendResult>> {
        log_order_request(request);
        let client = &mut *self.client;
        let args = serde_json::to_value(request).unwrap_or_default();
        let result = dispatch(&mut client.api, &client.state, "order_send", &args, |api| {
            api.order_send(request)
        });
        match &result {
            Ok(res) => log_order_response(res.as_ref()),
            Err(_) => log_order_response(None),
        }
        result
    }

    /// The terminal's most recent error. Reads the diagnostic channel
    /// directly; never intercepted, never raises.
    pub fn last_error(&mut self) -> (ErrorCode, String) {
        let (raw, message) = self.client.api.last_error();
        (ErrorCode::from_code(raw), message)
    }
}
