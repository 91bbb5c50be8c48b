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

//! An in-memory terminal for tests.
//!
//! [`MockTerminal`] implements [`TerminalApi`] over plain fields so tests can
//! stage any terminal behavior: unavailable accounts, failing initializes,
//! requote storms, empty history. It records every call name and counts
//! shutdowns, which is how the lifecycle tests verify teardown.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use crate::enums::{AccountTradeMode, CopyTicks, OrderType, PositionType, Timeframe};
use crate::models::{
    AccountInfo, OrderCheckResult, OrderSendResult, Rate, SymbolInfo, TerminalInfo, Tick,
    TradeDeal, TradeOrder, TradePosition, TradeRequest,
};
use crate::terminal::{HistorySelect, InitParams, RatesWindow, TerminalApi, TicketFilter};

/// A scriptable stand-in for the vendor terminal library.
#[derive(Debug)]
pub struct MockTerminal {
    pub initialize_ok: bool,
    pub login_ok: bool,
    pub account: Option<AccountInfo>,
    pub terminal: Option<TerminalInfo>,
    pub version: Option<(u32, u32, String)>,
    pub symbols: Vec<SymbolInfo>,
    /// When set, `symbols_get` returns the absence-signal regardless of the
    /// staged symbols.
    pub symbols_unavailable: bool,
    pub ticks: Vec<Tick>,
    pub rates: Vec<Rate>,
    pub orders: Vec<TradeOrder>,
    pub positions: Vec<TradePosition>,
    pub history_orders: Vec<TradeOrder>,
    pub deals: Vec<TradeDeal>,
    /// When set, the `history_*_get` calls return the absence-signal.
    pub history_unavailable: bool,
    pub margin: Option<f64>,
    pub profit: Option<f64>,
    pub check_result: Option<OrderCheckResult>,
    /// Staged `order_send` results, consumed front-first. When exhausted the
    /// mock answers with a done-result echoing the request.
    pub order_results: VecDeque<OrderSendResult>,
    last_error: (i32, String),
    /// The window of the most recent `copy_rates` call.
    pub last_rates_window: Option<RatesWindow>,
    pub shutdown_count: u32,
    pub calls: Vec<&'static str>,
}

impl Default for MockTerminal {
    fn default() -> Self {
        Self {
            initialize_ok: true,
            login_ok: true,
            account: Some(demo_account()),
            terminal: Some(connected_terminal()),
            version: Some((5, 2375, "11 Feb 2020".to_string())),
            symbols: Vec::new(),
            symbols_unavailable: false,
            ticks: Vec::new(),
            rates: Vec::new(),
            orders: Vec::new(),
            positions: Vec::new(),
            history_orders: Vec::new(),
            deals: Vec::new(),
            history_unavailable: false,
            margin: None,
            profit: None,
            check_result: None,
            order_results: VecDeque::new(),
            last_error: (1, "Success".to_string()),
            last_rates_window: None,
            shutdown_count: 0,
            calls: Vec::new(),
        }
    }
}

impl MockTerminal {
    pub fn set_last_error(&mut self, code: i32, message: impl Into<String>) {
        self.last_error = (code, message.into());
    }

    pub fn push_order_result(&mut self, result: OrderSendResult) {
        self.order_results.push_back(result);
    }

    pub fn called(&self, name: &str) -> usize {
        self.calls.iter().filter(|c| **c == name).count()
    }

    fn group_matches(group: Option<&str>, symbol: &str) -> bool {
        match group {
            // Wildcard-style group filter; only the substring form is
            // supported here.
            Some(pattern) => {
                let needle = pattern.trim_matches('*');
                needle.is_empty() || symbol.contains(needle)
            }
            None => true,
        }
    }
}

impl TerminalApi for MockTerminal {
    fn initialize(&mut self, _params: &InitParams) -> bool {
        self.calls.push("initialize");
        self.initialize_ok
    }

    fn shutdown(&mut self) {
        self.calls.push("shutdown");
        self.shutdown_count += 1;
    }

    fn login(
        &mut self,
        _login: u64,
        _password: &str,
        _server: &str,
        _timeout_ms: Option<u32>,
    ) -> bool {
        self.calls.push("login");
        self.login_ok
    }

    fn last_error(&mut self) -> (i32, String) {
        self.last_error.clone()
    }

    fn version(&mut self) -> Option<(u32, u32, String)> {
        self.calls.push("version");
        self.version.clone()
    }

    fn account_info(&mut self) -> Option<AccountInfo> {
        self.calls.push("account_info");
        self.account.clone()
    }

    fn terminal_info(&mut self) -> Option<TerminalInfo> {
        self.calls.push("terminal_info");
        self.terminal.clone()
    }

    fn symbols_total(&mut self) -> Option<u32> {
        self.calls.push("symbols_total");
        Some(self.symbols.len() as u32)
    }

    fn symbols_get(&mut self, group: Option<&str>) -> Option<Vec<SymbolInfo>> {
        self.calls.push("symbols_get");
        if self.symbols_unavailable {
            return None;
        }
        Some(
            self.symbols
                .iter()
                .filter(|s| Self::group_matches(group, &s.name))
                .cloned()
                .collect(),
        )
    }

    fn symbol_info(&mut self, symbol: &str) -> Option<SymbolInfo> {
        self.calls.push("symbol_info");
        self.symbols.iter().find(|s| s.name == symbol).cloned()
    }

    fn symbol_info_tick(&mut self, _symbol: &str) -> Option<Tick> {
        self.calls.push("symbol_info_tick");
        self.ticks.first().cloned()
    }

    fn symbol_select(&mut self, symbol: &str, _enable: bool) -> bool {
        self.calls.push("symbol_select");
        self.symbols.iter().any(|s| s.name == symbol)
    }

    fn copy_rates(
        &mut self,
        _symbol: &str,
        _timeframe: Timeframe,
        window: &RatesWindow,
    ) -> Option<Vec<Rate>> {
        self.calls.push("copy_rates");
        self.last_rates_window = Some(window.clone());
        let rates = match *window {
            RatesWindow::From { count, .. } | RatesWindow::FromPos { count, .. } => {
                self.rates.iter().take(count as usize).cloned().collect()
            }
            RatesWindow::Range { .. } => self.rates.clone(),
        };
        Some(rates)
    }

    fn copy_ticks_from(
        &mut self,
        _symbol: &str,
        _from: DateTime<Utc>,
        count: u32,
        _flags: CopyTicks,
    ) -> Option<Vec<Tick>> {
        self.calls.push("copy_ticks_from");
        Some(self.ticks.iter().take(count as usize).cloned().collect())
    }

    fn copy_ticks_range(
        &mut self,
        _symbol: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        _flags: CopyTicks,
    ) -> Option<Vec<Tick>> {
        self.calls.push("copy_ticks_range");
        Some(
            self.ticks
                .iter()
                .filter(|t| t.time >= from && t.time <= to)
                .cloned()
                .collect(),
        )
    }

    fn orders_total(&mut self) -> Option<u32> {
        self.calls.push("orders_total");
        Some(self.orders.len() as u32)
    }

    fn orders_get(&mut self, filter: &TicketFilter) -> Option<Vec<TradeOrder>> {
        self.calls.push("orders_get");
        Some(
            self.orders
                .iter()
                .filter(|o| match filter {
                    TicketFilter { ticket: Some(t), .. } => o.ticket == *t,
                    TicketFilter { group, symbol, .. } => {
                        Self::group_matches(group.as_deref(), &o.symbol)
                            && symbol.as_deref().map_or(true, |s| o.symbol == s)
                    }
                })
                .cloned()
                .collect(),
        )
    }

    fn positions_total(&mut self) -> Option<u32> {
        self.calls.push("positions_total");
        Some(self.positions.len() as u32)
    }

    fn positions_get(&mut self, filter: &TicketFilter) -> Option<Vec<TradePosition>> {
        self.calls.push("positions_get");
        Some(
            self.positions
                .iter()
                .filter(|p| match filter {
                    TicketFilter { ticket: Some(t), .. } => p.ticket == *t,
                    TicketFilter { group, symbol, .. } => {
                        Self::group_matches(group.as_deref(), &p.symbol)
                            && symbol.as_deref().map_or(true, |s| p.symbol == s)
                    }
                })
                .cloned()
                .collect(),
        )
    }

    fn history_orders_total(&mut self, _from: DateTime<Utc>, _to: DateTime<Utc>) -> Option<u32> {
        self.calls.push("history_orders_total");
        Some(self.history_orders.len() as u32)
    }

    fn history_orders_get(&mut self, select: &HistorySelect) -> Option<Vec<TradeOrder>> {
        self.calls.push("history_orders_get");
        if self.history_unavailable {
            return None;
        }
        Some(
            self.history_orders
                .iter()
                .filter(|o| match select {
                    HistorySelect::Range { from, to } => {
                        o.time_setup >= *from && o.time_setup <= *to
                    }
                    HistorySelect::Ticket(t) => o.ticket == *t,
                    HistorySelect::Position(p) => o.position_id == *p,
                })
                .cloned()
                .collect(),
        )
    }

    fn history_deals_total(&mut self, _from: DateTime<Utc>, _to: DateTime<Utc>) -> Option<u32> {
        self.calls.push("history_deals_total");
        Some(self.deals.len() as u32)
    }

    fn history_deals_get(&mut self, select: &HistorySelect) -> Option<Vec<TradeDeal>> {
        self.calls.push("history_deals_get");
        if self.history_unavailable {
            return None;
        }
        Some(
            self.deals
                .iter()
                .filter(|d| match select {
                    HistorySelect::Range { from, to } => d.time >= *from && d.time <= *to,
                    HistorySelect::Ticket(t) => d.order == *t,
                    HistorySelect::Position(p) => d.position_id == *p,
                })
                .cloned()
                .collect(),
        )
    }

    fn order_calc_margin(
        &mut self,
        _order_type: OrderType,
        _symbol: &str,
        _volume: f64,
        _price: f64,
    ) -> Option<f64> {
        self.calls.push("order_calc_margin");
        self.margin
    }

    fn order_calc_profit(
        &mut self,
        _order_type: OrderType,
        _symbol: &str,
        _volume: f64,
        _price_open: f64,
        _price_close: f64,
    ) -> Option<f64> {
        self.calls.push("order_calc_profit");
        self.profit
    }

    fn order_check(&mut self, request: &TradeRequest) -> Option<OrderCheckResult> {
        self.calls.push("order_check");
        self.check_result.clone().map(|mut res| {
            res.request = request.clone();
            res
        })
    }

    fn order_send(&mut self, request: &TradeRequest) -> Option<OrderSendResult> {
        self.calls.push("order_send");
        match self.order_results.pop_front() {
            Some(mut result) => {
                result.request = request.clone();
                Some(result)
            }
            None => Some(done_result(request)),
        }
    }
}

/// A demo account with trading enabled.
pub fn demo_account() -> AccountInfo {
    AccountInfo {
        login: 123_456,
        trade_mode: AccountTradeMode::Demo,
        leverage: 100,
        limit_orders: 200,
        trade_allowed: true,
        trade_expert: true,
        balance: 10_000.0,
        credit: 0.0,
        profit: 0.0,
        equity: 10_000.0,
        margin: 0.0,
        margin_free: 10_000.0,
        margin_level: 0.0,
        name: "Test Account".to_string(),
        server: "Broker-Demo".to_string(),
        currency: "USD".to_string(),
        company: "Test Broker".to_string(),
    }
}

/// The same account flagged as a real (live) account.
pub fn real_account() -> AccountInfo {
    AccountInfo {
        trade_mode: AccountTradeMode::Real,
        ..demo_account()
    }
}

/// A connected terminal with auto-trading on.
pub fn connected_terminal() -> TerminalInfo {
    TerminalInfo {
        community_connection: false,
        connected: true,
        trade_allowed: true,
        tradeapi_disabled: false,
        build: 2375,
        maxbars: 100_000,
        ping_last: 40_000,
        retransmission: 0.0,
        company: "MetaQuotes Software Corp.".to_string(),
        name: "MetaTrader 5".to_string(),
        path: "C:\\Program Files\\MetaTrader 5".to_string(),
    }
}

/// A liquid FX symbol.
pub fn eurusd() -> SymbolInfo {
    SymbolInfo {
        name: "EURUSD".to_string(),
        custom: false,
        select: true,
        visible: true,
        digits: 5,
        spread: 8,
        spread_float: true,
        point: 0.000_01,
        bid: 1.105_00,
        ask: 1.105_08,
        trade_tick_value: 1.0,
        trade_tick_size: 0.000_01,
        trade_contract_size: 100_000.0,
        trade_stops_level: 0,
        volume_min: 0.01,
        volume_max: 500.0,
        volume_step: 0.01,
        swap_long: -0.3,
        swap_short: -0.1,
        currency_base: "EUR".to_string(),
        currency_profit: "USD".to_string(),
        currency_margin: "EUR".to_string(),
        description: "Euro vs US Dollar".to_string(),
        path: "Forex\\EURUSD".to_string(),
    }
}

pub fn eurusd_tick() -> Tick {
    Tick {
        time: Utc::now(),
        bid: 1.105_00,
        ask: 1.105_08,
        last: 0.0,
        volume: 0,
        time_msc: Utc::now().timestamp_millis(),
        flags: 6,
        volume_real: 0.0,
    }
}

/// A long EURUSD position carrying the given magic number.
pub fn long_position(ticket: u64, magic: u64) -> TradePosition {
    TradePosition {
        ticket,
        time: Utc::now(),
        position_type: PositionType::Buy,
        magic,
        identifier: ticket,
        volume: 1.0,
        price_open: 1.100_00,
        sl: 0.0,
        tp: 0.0,
        price_current: 1.105_00,
        swap: 0.0,
        profit: 50.0,
        symbol: "EURUSD".to_string(),
        comment: String::new(),
    }
}

/// A successful order result echoing the request.
pub fn done_result(request: &TradeRequest) -> OrderSendResult {
    OrderSendResult {
        retcode: crate::enums::TradeRetcode::Done as u32,
        deal: 1,
        order: 1,
        volume: request.volume.unwrap_or(0.0),
        price: request.price.unwrap_or(0.0),
        bid: 1.105_00,
        ask: 1.105_08,
        comment: "Request executed".to_string(),
        request_id: 1,
        retcode_external: 0,
        request: request.clone(),
    }
}

/// An order result with the given retcode, for staging rejections.
pub fn result_with_retcode(retcode: u32) -> OrderSendResult {
    OrderSendResult {
        retcode,
        ..done_result(&TradeRequest::default())
    }
}
