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

//! Trade-request construction helpers.
//!
//! [`Order`] builds a [`TradeRequest`] from intent ("flatten this position",
//! "buy at this limit") instead of raw fields, and can check or send itself
//! through a session. The helpers consume typed records, so they refuse to
//! run while the session converts results to plain shapes.

use crate::convert::ReturnMode;
use crate::enums::{OrderType, PositionType, TradeAction};
use crate::error::{Mt5Error, Mt5Result};
use crate::models::{OrderCheckResult, OrderSendResult, TradePosition, TradeRequest};
use crate::terminal::TerminalApi;

use crate::client::Session;

/// A trade request under construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    request: TradeRequest,
}

impl Order {
    /// Market buy.
    pub fn buy(symbol: impl Into<String>, volume: f64) -> Self {
        Self::market(OrderType::Buy, symbol, volume)
    }

    /// Market sell.
    pub fn sell(symbol: impl Into<String>, volume: f64) -> Self {
        Self::market(OrderType::Sell, symbol, volume)
    }

    pub fn buy_limit(symbol: impl Into<String>, volume: f64, price: f64) -> Self {
        Self::pending(OrderType::BuyLimit, symbol, volume, price)
    }

    pub fn sell_limit(symbol: impl Into<String>, volume: f64, price: f64) -> Self {
        Self::pending(OrderType::SellLimit, symbol, volume, price)
    }

    pub fn buy_stop(symbol: impl Into<String>, volume: f64, price: f64) -> Self {
        Self::pending(OrderType::BuyStop, symbol, volume, price)
    }

    pub fn sell_stop(symbol: impl Into<String>, volume: f64, price: f64) -> Self {
        Self::pending(OrderType::SellStop, symbol, volume, price)
    }

    fn market(order_type: OrderType, symbol: impl Into<String>, volume: f64) -> Self {
        Self {
            request: TradeRequest {
                action: TradeAction::Deal,
                order_type,
                symbol: symbol.into(),
                volume: Some(volume),
                ..Default::default()
            },
        }
    }

    fn pending(order_type: OrderType, symbol: impl Into<String>, volume: f64, price: f64) -> Self {
        Self {
            request: TradeRequest {
                action: TradeAction::Pending,
                order_type,
                symbol: symbol.into(),
                volume: Some(volume),
                price: Some(price),
                ..Default::default()
            },
        }
    }

    /// A market order in the opposite direction that closes the position.
    pub fn flatten(position: &TradePosition) -> Self {
        let held = match position.position_type {
            PositionType::Buy => OrderType::Buy,
            PositionType::Sell => OrderType::Sell,
        };
        let mut order = Self::market(held.opposite(), position.symbol.clone(), position.volume);
        order.request.position = Some(position.ticket);
        order.request.magic = Some(position.magic);
        order
    }

    /// A market order that closes the position and opens the same volume in
    /// the opposite direction.
    pub fn reverse(position: &TradePosition) -> Self {
        let mut order = Self::flatten(position);
        if let Some(volume) = order.request.volume.as_mut() {
            *volume *= 2.0;
        }
        order
    }

    /// A market order that moves the position's signed net volume to
    /// `new_net` (long positive, short negative).
    pub fn adjusted_net_position(position: &TradePosition, new_net: f64) -> Self {
        let current = match position.position_type {
            PositionType::Buy => position.volume,
            PositionType::Sell => -position.volume,
        };
        let delta = new_net - current;
        let order_type = if delta < 0.0 { OrderType::Sell } else { OrderType::Buy };
        let mut order = Self::market(order_type, position.symbol.clone(), delta.abs());
        order.request.magic = Some(position.magic);
        order.request.sl = Some(position.sl);
        order.request.tp = Some(position.tp);
        order
    }

    /// Modifies a position's stop-loss and take-profit; unset values keep
    /// the position's current levels.
    pub fn modify_sltp(position: &TradePosition, sl: Option<f64>, tp: Option<f64>) -> Self {
        Self {
            request: TradeRequest {
                action: TradeAction::Sltp,
                symbol: position.symbol.clone(),
                position: Some(position.ticket),
                sl: Some(sl.unwrap_or(position.sl)),
                tp: Some(tp.unwrap_or(position.tp)),
                ..Default::default()
            },
        }
    }

    /// Cancels a pending order by ticket.
    pub fn delete_pending(ticket: u64) -> Self {
        Self {
            request: TradeRequest {
                action: TradeAction::Remove,
                order: Some(ticket),
                ..Default::default()
            },
        }
    }

    // Chainable field overrides.

    pub fn magic(mut self, magic: u64) -> Self {
        self.request.magic = Some(magic);
        self
    }

    pub fn price(mut self, price: f64) -> Self {
        self.request.price = Some(price);
        self
    }

    pub fn sl(mut self, sl: f64) -> Self {
        self.request.sl = Some(sl);
        self
    }

    pub fn tp(mut self, tp: f64) -> Self {
        self.request.tp = Some(tp);
        self
    }

    pub fn deviation(mut self, deviation: u32) -> Self {
        self.request.deviation = Some(deviation);
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.request.comment = Some(comment.into());
        self
    }

    pub fn request(&self) -> &TradeRequest {
        &self.request
    }

    pub fn into_request(self) -> TradeRequest {
        self.request
    }

    /// Runs a funds-sufficiency check for this request.
    pub fn check<A: TerminalApi>(
        &self,
        session: &mut Session<'_, A>,
    ) -> Mt5Result<Option<OrderCheckResult>> {
        require_raw_mode(session)?;
        session.order_check(&self.request)
    }

    /// Sends this request. Market orders without an explicit price are
    /// priced off the current tick (ask for buys, bid for sells) first.
    pub fn send<A: TerminalApi>(
        &self,
        session: &mut Session<'_, A>,
    ) -> Mt5Result<Option<OrderSendResult>> {
        require_raw_mode(session)?;
        let mut request = self.request.clone();
        if request.action == TradeAction::Deal && request.price.is_none() {
            if let Some(tick) = session.symbol_info_tick(&request.symbol)? {
                request.price = Some(match request.order_type {
                    OrderType::Buy => tick.ask,
                    _ => tick.bid,
                });
            }
        }
        session.order_send(&request)
    }
}

pub(crate) fn require_raw_mode<A: TerminalApi>(session: &Session<'_, A>) -> Mt5Result<()> {
    if session.state().return_mode == ReturnMode::Raw {
        Ok(())
    } else {
        Err(Mt5Error::Unsupported(
            "trading helpers need raw typed results; the session is converting output".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::enums::OrderFilling;

    fn long_position() -> TradePosition {
        TradePosition {
            ticket: 101,
            time: Utc::now(),
            position_type: PositionType::Buy,
            magic: 7,
            identifier: 101,
            volume: 1.5,
            price_open: 1.1000,
            sl: 1.0900,
            tp: 1.1200,
            price_current: 1.1050,
            swap: 0.0,
            profit: 75.0,
            symbol: "EURUSD".to_string(),
            comment: String::new(),
        }
    }

    #[test]
    fn market_constructors() {
        let req = Order::buy("EURUSD", 0.1).request().clone();
        assert_eq!(req.action, TradeAction::Deal);
        assert_eq!(req.order_type, OrderType::Buy);
        assert_eq!(req.volume, Some(0.1));
        assert_eq!(req.price, None);

        let req = Order::sell_stop("EURUSD", 0.1, 1.0800).request().clone();
        assert_eq!(req.action, TradeAction::Pending);
        assert_eq!(req.order_type, OrderType::SellStop);
        assert_eq!(req.price, Some(1.0800));
    }

    #[test]
    fn flatten_opposes_the_position() {
        let req = Order::flatten(&long_position()).into_request();
        assert_eq!(req.order_type, OrderType::Sell);
        assert_eq!(req.volume, Some(1.5));
        assert_eq!(req.position, Some(101));
        assert_eq!(req.magic, Some(7));
    }

    #[test]
    fn reverse_doubles_the_volume() {
        let req = Order::reverse(&long_position()).into_request();
        assert_eq!(req.order_type, OrderType::Sell);
        assert_eq!(req.volume, Some(3.0));
    }

    #[test]
    fn adjusted_net_position_moves_long_to_short() {
        // Long 1.5, target -0.5: sell 2.0.
        let req = Order::adjusted_net_position(&long_position(), -0.5).into_request();
        assert_eq!(req.order_type, OrderType::Sell);
        assert_eq!(req.volume, Some(2.0));
        assert_eq!(req.sl, Some(1.0900));
    }

    #[test]
    fn modify_sltp_keeps_unset_levels() {
        let req = Order::modify_sltp(&long_position(), Some(1.0950), None).into_request();
        assert_eq!(req.action, TradeAction::Sltp);
        assert_eq!(req.sl, Some(1.0950));
        assert_eq!(req.tp, Some(1.1200));
        assert_eq!(req.position, Some(101));
    }

    #[test]
    fn delete_pending_targets_the_ticket() {
        let req = Order::delete_pending(55).into_request();
        assert_eq!(req.action, TradeAction::Remove);
        assert_eq!(req.order, Some(55));
    }

    #[test]
    fn chainable_overrides() {
        let req = Order::buy("EURUSD", 0.1)
            .magic(99)
            .deviation(5)
            .sl(1.08)
            .tp(1.12)
            .comment("entry")
            .into_request();
        assert_eq!(req.magic, Some(99));
        assert_eq!(req.deviation, Some(5));
        assert_eq!(req.comment.as_deref(), Some("entry"));
        assert_eq!(req.type_filling, Option::<OrderFilling>::None);
    }
}
