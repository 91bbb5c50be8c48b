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

//! Symbol-scoped trading conveniences.
//!
//! [`Trade`] binds a symbol and a magic number and manages one position:
//! market entries priced off the live tick with a requote retry loop, and
//! stop modification by price or by tick count. Orders and positions are
//! matched on the magic number, so several `Trade` instances can share a
//! symbol without stepping on each other.

use crate::client::Session;
use crate::enums::{ErrorCode, OrderType, PositionType, TradeRetcode};
use crate::error::{Mt5Error, Mt5Result};
use crate::models::{OrderSendResult, TradePosition};
use crate::order::{require_raw_mode, Order};
use crate::terminal::{TerminalApi, TicketFilter};

/// Price basis for tick-distance stop calculations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PriceBasis {
    /// The position's open price.
    Open,
    /// The current bid/ask.
    Current,
    /// An explicit price.
    At(f64),
}

/// Attempts made against a moving market before giving up on
/// requote/price-off retcodes.
const MARKET_RETRIES: u32 = 10;

/// One symbol, one magic number, at most one managed position.
#[derive(Debug, Clone)]
pub struct Trade {
    pub symbol: String,
    pub magic: u64,
}

impl Trade {
    pub fn new(symbol: impl Into<String>, magic: u64) -> Self {
        Self {
            symbol: symbol.into(),
            magic,
        }
    }

    /// The position currently managed by this instance, if any.
    pub fn position<A: TerminalApi>(
        &self,
        session: &mut Session<'_, A>,
    ) -> Mt5Result<Option<TradePosition>> {
        let magic = self.magic;
        let positions = session.positions_get_where(
            &TicketFilter::symbol(self.symbol.clone()),
            |p| p.magic == magic,
        )?;
        Ok(positions.into_iter().next())
    }

    /// Market buy at the current ask, retrying while the market moves.
    pub fn buy<A: TerminalApi>(
        &self,
        session: &mut Session<'_, A>,
        volume: f64,
    ) -> Mt5Result<Option<OrderSendResult>> {
        self.market_entry(session, OrderType::Buy, volume)
    }

    /// Market sell at the current bid, retrying while the market moves.
    pub fn sell<A: TerminalApi>(
        &self,
        session: &mut Session<'_, A>,
        volume: f64,
    ) -> Mt5Result<Option<OrderSendResult>> {
        self.market_entry(session, OrderType::Sell, volume)
    }

    /// Closes the managed position at market, with the same retry loop.
    pub fn close<A: TerminalApi>(
        &self,
        session: &mut Session<'_, A>,
    ) -> Mt5Result<Option<OrderSendResult>> {
        require_raw_mode(session)?;
        let position = match self.position(session)? {
            Some(position) => position,
            None => return Ok(None),
        };
        let mut last = None;
        for _ in 0..MARKET_RETRIES {
            let order = Order::flatten(&position);
            let result = order.send(session)?;
            if !is_retryable(result.as_ref()) {
                return Ok(result);
            }
            last = result;
        }
        Ok(last)
    }

    fn market_entry<A: TerminalApi>(
        &self,
        session: &mut Session<'_, A>,
        order_type: OrderType,
        volume: f64,
    ) -> Mt5Result<Option<OrderSendResult>> {
        require_raw_mode(session)?;
        let mut last = None;
        for _ in 0..MARKET_RETRIES {
            let tick = match session.symbol_info_tick(&self.symbol)? {
                Some(tick) => tick,
                None => return Err(no_tick(&self.symbol)),
            };
            let price = match order_type {
                OrderType::Buy => tick.ask,
                _ => tick.bid,
            };
            let order = match order_type {
                OrderType::Buy => Order::buy(self.symbol.clone(), volume),
                _ => Order::sell(self.symbol.clone(), volume),
            }
            .magic(self.magic)
            .price(price);
            let result = order.send(session)?;
            if !is_retryable(result.as_ref()) {
                return Ok(result);
            }
            last = result;
        }
        Ok(last)
    }

    /// Moves the managed position's stops to exact prices, normalized to the
    /// symbol's tick size. Unset stops keep their current level.
    pub fn modify_sltp_by_price<A: TerminalApi>(
        &self,
        session: &mut Session<'_, A>,
        sl: Option<f64>,
        tp: Option<f64>,
    ) -> Mt5Result<Option<OrderSendResult>> {
        require_raw_mode(session)?;
        let position = match self.position(session)? {
            Some(position) => position,
            None => return Ok(None),
        };
        let tick_size = session
            .symbol_info(&self.symbol)?
            .map(|info| info.trade_tick_size)
            .unwrap_or(0.0);
        let sl = sl.map(|p| normalize_price(p, tick_size));
        let tp = tp.map(|p| normalize_price(p, tick_size));
        Order::modify_sltp(&position, sl, tp).send(session)
    }

    /// Moves the managed position's stops by a tick count from the chosen
    /// price basis. Counts are unsigned distances; the direction comes from
    /// the position side.
    pub fn modify_sltp_by_ticks<A: TerminalApi>(
        &self,
        session: &mut Session<'_, A>,
        sl_ticks: Option<u32>,
        tp_ticks: Option<u32>,
        basis: PriceBasis,
    ) -> Mt5Result<Option<OrderSendResult>> {
        require_raw_mode(session)?;
        let position = match self.position(session)? {
            Some(position) => position,
            None => return Ok(None),
        };
        let tick_size = session
            .symbol_info(&self.symbol)?
            .map(|info| info.trade_tick_size)
            .unwrap_or(0.0);
        let (bid, ask) = match basis {
            PriceBasis::At(price) => (price, price),
            PriceBasis::Open => (position.price_open, position.price_open),
            PriceBasis::Current => match session.symbol_info_tick(&self.symbol)? {
                Some(tick) => (tick.bid, tick.ask),
                None => return Err(no_tick(&self.symbol)),
            },
        };
        let (price, sl_sign, tp_sign) = match position.position_type {
            PositionType::Buy => (bid, -1.0, 1.0),
            PositionType::Sell => (ask, 1.0, -1.0),
        };
        let sl = sl_ticks.map(|t| price + sl_sign * f64::from(t) * tick_size);
        let tp = tp_ticks.map(|t| price + tp_sign * f64::from(t) * tick_size);
        Order::modify_sltp(&position, sl, tp).send(session)
    }
}

/// Requotes and price-off rejections are worth another attempt at a fresh
/// price; everything else is final.
fn is_retryable(result: Option<&OrderSendResult>) -> bool {
    result.is_some_and(|res| {
        res.retcode == TradeRetcode::Requote as u32 || res.retcode == TradeRetcode::PriceOff as u32
    })
}

fn no_tick(symbol: &str) -> Mt5Error {
    Mt5Error::VendorCallFailed {
        code: ErrorCode::NotFound,
        message: format!("no tick available for {symbol}"),
    }
}

/// Rounds a price onto the symbol's tick grid.
pub fn normalize_price(price: f64, tick_size: f64) -> f64 {
    if tick_size <= 0.0 {
        return price;
    }
    (price / tick_size).round() * tick_size
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_snaps_to_tick_grid() {
        assert!((normalize_price(1.23456, 0.0001) - 1.2346).abs() < 1e-9);
        assert!((normalize_price(1.23454, 0.0001) - 1.2345).abs() < 1e-9);
        // A zero tick size leaves the price alone.
        assert_eq!(normalize_price(1.23456, 0.0), 1.23456);
    }

    #[test]
    fn retry_classification() {
        let mut res = OrderSendResult {
            retcode: TradeRetcode::Requote as u32,
            deal: 0,
            order: 0,
            volume: 0.0,
            price: 0.0,
            bid: 0.0,
            ask: 0.0,
            comment: String::new(),
            request_id: 0,
            retcode_external: 0,
            request: Default::default(),
        };
        assert!(is_retryable(Some(&res)));
        res.retcode = TradeRetcode::PriceOff as u32;
        assert!(is_retryable(Some(&res)));
        res.retcode = TradeRetcode::Done as u32;
        assert!(!is_retryable(Some(&res)));
        res.retcode = TradeRetcode::NoMoney as u32;
        assert!(!is_retryable(Some(&res)));
        assert!(!is_retryable(None));
    }
}
