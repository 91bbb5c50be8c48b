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

//! The seam to the MetaTrader 5 terminal library.
//!
//! [`TerminalApi`] mirrors the vendor call surface one-to-one, including its
//! error convention: a failed query returns the absence-signal (`None`, an
//! empty vector or `false`) and the diagnostic must be fetched separately via
//! [`TerminalApi::last_error`]. Everything the adapter adds (raising, logging,
//! state scoping) lives above this trait, so a fake implementation is enough
//! to exercise the whole crate.

use chrono::{DateTime, TimeDelta, Utc};

use crate::enums::{CopyTicks, Timeframe};
use crate::models::{
    AccountInfo, OrderCheckResult, OrderSendResult, Rate, SymbolInfo, TerminalInfo, Tick,
    TradeDeal, TradeOrder, TradePosition, TradeRequest,
};

/// Arguments for [`TerminalApi::initialize`]. Unset fields fall back to the
/// terminal's own defaults (last-used account, default install path).
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct InitParams {
    pub path: Option<String>,
    pub login: Option<u64>,
    pub password: Option<String>,
    pub server: Option<String>,
    pub timeout_ms: Option<u32>,
    pub portable: Option<bool>,
}

/// Narrows `orders_get`/`positions_get` style queries. At most one field is
/// honored; `ticket` wins over `group` wins over `symbol`.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct TicketFilter {
    pub symbol: Option<String>,
    pub group: Option<String>,
    pub ticket: Option<u64>,
}

impl TicketFilter {
    pub fn symbol(symbol: impl Into<String>) -> Self {
        Self {
            symbol: Some(symbol.into()),
            ..Default::default()
        }
    }

    pub fn group(group: impl Into<String>) -> Self {
        Self {
            group: Some(group.into()),
            ..Default::default()
        }
    }

    pub fn ticket(ticket: u64) -> Self {
        Self {
            ticket: Some(ticket),
            ..Default::default()
        }
    }
}

/// Selects trading history for the `history_*` calls.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub enum HistorySelect {
    /// Everything between the two instants.
    Range {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },
    /// A single order ticket.
    Ticket(u64),
    /// All entries belonging to one position.
    Position(u64),
}

/// 2000-01-01T00:00:00Z, the earliest instant terminals keep history for.
const HISTORY_EPOCH_SECS: i64 = 946_684_800;

impl Default for HistorySelect {
    /// The widest practical range: the start of the epoch the terminal
    /// actually stores data for, up to now.
    fn default() -> Self {
        HistorySelect::Range {
            from: DateTime::UNIX_EPOCH + TimeDelta::seconds(HISTORY_EPOCH_SECS),
            to: Utc::now(),
        }
    }
}

/// Position of the bar window requested from `copy_rates`.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub enum RatesWindow {
    /// `count` bars starting at the given instant.
    From { from: DateTime<Utc>, count: u32 },
    /// `count` bars starting `start` bars back from the present.
    FromPos { start: u32, count: u32 },
    /// All bars between the two instants.
    Range {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },
}

/// The raw MetaTrader 5 terminal call surface.
///
/// Methods take `&mut self` because the underlying library is a single
/// stateful connection; the adapter never shares one binding between threads.
pub trait TerminalApi {
    fn initialize(&mut self, params: &InitParams) -> bool;
    fn shutdown(&mut self);
    fn login(&mut self, login: u64, password: &str, server: &str, timeout_ms: Option<u32>)
        -> bool;

    /// The most recent error, as a `(code, description)` pair. Never fails.
    fn last_error(&mut self) -> (i32, String);

    fn version(&mut self) -> Option<(u32, u32, String)>;
    fn account_info(&mut self) -> Option<AccountInfo>;
    fn terminal_info(&mut self) -> Option<TerminalInfo>;

    fn symbols_total(&mut self) -> Option<u32>;
    fn symbols_get(&mut self, group: Option<&str>) -> Option<Vec<SymbolInfo>>;
    fn symbol_info(&mut self, symbol: &str) -> Option<SymbolInfo>;
    fn symbol_info_tick(&mut self, symbol: &str) -> Option<Tick>;
    fn symbol_select(&mut self, symbol: &str, enable: bool) -> bool;

    fn copy_rates(
        &mut self,
        symbol: &str,
        timeframe: Timeframe,
        window: &RatesWindow,
    ) -> Option<Vec<Rate>>;
    fn copy_ticks_from(
        &mut self,
        symbol: &str,
        from: DateTime<Utc>,
        count: u32,
        flags: CopyTicks,
    ) -> Option<Vec<Tick>>;
    fn copy_ticks_range(
        &mut self,
        symbol: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        flags: CopyTicks,
    ) -> Option<Vec<Tick>>;

    fn orders_total(&mut self) -> Option<u32>;
    fn orders_get(&mut self, filter: &TicketFilter) -> Option<Vec<TradeOrder>>;
    fn positions_total(&mut self) -> Option<u32>;
    fn positions_get(&mut self, filter: &TicketFilter) -> Option<Vec<TradePosition>>;

    fn history_orders_total(&mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Option<u32>;
    fn history_orders_get(&mut self, select: &HistorySelect) -> Option<Vec<TradeOrder>>;
    fn history_deals_total(&mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Option<u32>;
    fn history_deals_get(&mut self, select: &HistorySelect) -> Option<Vec<TradeDeal>>;

    fn order_calc_margin(
        &mut self,
        order_type: crate::enums::OrderType,
        symbol: &str,
        volume: f64,
        price: f64,
    ) -> Option<f64>;
    fn order_calc_profit(
        &mut self,
        order_type: crate::enums::OrderType,
        symbol: &str,
        volume: f64,
        price_open: f64,
        price_close: f64,
    ) -> Option<f64>;
    fn order_check(&mut self, request: &TradeRequest) -> Option<OrderCheckResult>;
    fn order_send(&mut self, request: &TradeRequest) -> Option<OrderSendResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_history_select_spans_terminal_epoch() {
        match HistorySelect::default() {
            HistorySelect::Range { from, to } => {
                assert_eq!(from.timestamp(), HISTORY_EPOCH_SECS);
                assert!(to > from);
            }
            other => panic!("expected range, got {other:?}"),
        }
    }

    #[test]
    fn ticket_filter_constructors() {
        assert_eq!(TicketFilter::symbol("EURUSD").symbol.as_deref(), Some("EURUSD"));
        assert_eq!(TicketFilter::group("*USD*").group.as_deref(), Some("*USD*"));
        assert_eq!(TicketFilter::ticket(42).ticket, Some(42));
    }
}
