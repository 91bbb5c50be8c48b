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

//! Record types returned by the MetaTrader 5 terminal.
//!
//! These mirror the terminal's fixed-shape response records (`AccountInfo`,
//! `TerminalInfo`, `SymbolInfo`, ticks, rates, orders, positions, deals, and
//! the trade request/result structures). Every record implements
//! [`Recordish`](crate::convert::Recordish) so the conversion layer can
//! detect record shape by capability rather than by concrete type.

use chrono::{DateTime, Utc};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::convert::CallValue;
use crate::enums::{
    AccountTradeMode, DealEntry, OrderFilling, OrderTime, OrderType, PositionType, TradeAction,
};

macro_rules! impl_recordish {
    ($ty:ty { $($field:ident),+ $(,)? }) => {
        impl crate::convert::Recordish for $ty {
            fn record_fields(&self) -> Vec<(&'static str, CallValue)> {
                vec![$((stringify!($field), self.$field.clone().into())),+]
            }
        }
    };
}

macro_rules! impl_enum_value {
    ($($ty:ty),+ $(,)?) => {
        $(impl From<$ty> for CallValue {
            fn from(v: $ty) -> Self {
                CallValue::Int(v as i64)
            }
        })+
    };
}

impl_enum_value!(
    AccountTradeMode,
    DealEntry,
    OrderFilling,
    OrderTime,
    OrderType,
    PositionType,
    TradeAction,
);

/// Trading account information (`account_info`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub login: u64,
    pub trade_mode: AccountTradeMode,
    pub leverage: u32,
    pub limit_orders: u32,
    pub trade_allowed: bool,
    pub trade_expert: bool,
    pub balance: f64,
    pub credit: f64,
    pub profit: f64,
    pub equity: f64,
    pub margin: f64,
    pub margin_free: f64,
    pub margin_level: f64,
    pub name: String,
    pub server: String,
    pub currency: String,
    pub company: String,
}

impl_recordish!(AccountInfo {
    login,
    trade_mode,
    leverage,
    limit_orders,
    trade_allowed,
    trade_expert,
    balance,
    credit,
    profit,
    equity,
    margin,
    margin_free,
    margin_level,
    name,
    server,
    currency,
    company,
});

/// Terminal status and settings (`terminal_info`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminalInfo {
    pub community_connection: bool,
    pub connected: bool,
    pub trade_allowed: bool,
    pub tradeapi_disabled: bool,
    pub build: u32,
    /// Ceiling on the number of bars a single copy-rates call may return.
    pub maxbars: u32,
    /// Last known round-trip to the trade server, in microseconds.
    pub ping_last: i64,
    pub retransmission: f64,
    pub company: String,
    pub name: String,
    pub path: String,
}

impl_recordish!(TerminalInfo {
    community_connection,
    connected,
    trade_allowed,
    tradeapi_disabled,
    build,
    maxbars,
    ping_last,
    retransmission,
    company,
    name,
    path,
});

/// Financial instrument information (`symbol_info`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolInfo {
    pub name: String,
    pub custom: bool,
    pub select: bool,
    pub visible: bool,
    pub digits: u32,
    pub spread: i32,
    pub spread_float: bool,
    pub point: f64,
    pub bid: f64,
    pub ask: f64,
    pub trade_tick_value: f64,
    pub trade_tick_size: f64,
    pub trade_contract_size: f64,
    pub trade_stops_level: i32,
    pub volume_min: f64,
    pub volume_max: f64,
    pub volume_step: f64,
    pub swap_long: f64,
    pub swap_short: f64,
    pub currency_base: String,
    pub currency_profit: String,
    pub currency_margin: String,
    pub description: String,
    pub path: String,
}

impl_recordish!(SymbolInfo {
    name,
    custom,
    select,
    visible,
    digits,
    spread,
    spread_float,
    point,
    bid,
    ask,
    trade_tick_value,
    trade_tick_size,
    trade_contract_size,
    trade_stops_level,
    volume_min,
    volume_max,
    volume_step,
    swap_long,
    swap_short,
    currency_base,
    currency_profit,
    currency_margin,
    description,
    path,
});

/// A single price tick (`symbol_info_tick`, `copy_ticks_*`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub time: DateTime<Utc>,
    pub bid: f64,
    pub ask: f64,
    pub last: f64,
    pub volume: u64,
    pub time_msc: i64,
    /// Combination of `TICK_FLAG_*` bits describing what changed.
    pub flags: u32,
    pub volume_real: f64,
}

impl_recordish!(Tick {
    time,
    bid,
    ask,
    last,
    volume,
    time_msc,
    flags,
    volume_real,
});

/// One bar of price history (`copy_rates_*`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rate {
    pub time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub tick_volume: u64,
    pub spread: i32,
    pub real_volume: u64,
}

impl_recordish!(Rate {
    time,
    open,
    high,
    low,
    close,
    tick_volume,
    spread,
    real_volume,
});

/// An active or historical order (`orders_get`, `history_orders_get`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeOrder {
    pub ticket: u64,
    pub time_setup: DateTime<Utc>,
    pub time_done: Option<DateTime<Utc>>,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub state: i32,
    pub magic: u64,
    pub position_id: u64,
    pub volume_initial: f64,
    pub volume_current: f64,
    pub price_open: f64,
    pub sl: f64,
    pub tp: f64,
    pub price_current: f64,
    pub symbol: String,
    pub comment: String,
}

impl crate::convert::Recordish for TradeOrder {
    fn record_fields(&self) -> Vec<(&'static str, CallValue)> {
        vec![
            ("ticket", self.ticket.into()),
            ("time_setup", self.time_setup.into()),
            ("time_done", self.time_done.into()),
            ("type", self.order_type.into()),
            ("state", self.state.into()),
            ("magic", self.magic.into()),
            ("position_id", self.position_id.into()),
            ("volume_initial", self.volume_initial.into()),
            ("volume_current", self.volume_current.into()),
            ("price_open", self.price_open.into()),
            ("sl", self.sl.into()),
            ("tp", self.tp.into()),
            ("price_current", self.price_current.into()),
            ("symbol", self.symbol.clone().into()),
            ("comment", self.comment.clone().into()),
        ]
    }
}

/// An open position (`positions_get`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradePosition {
    pub ticket: u64,
    pub time: DateTime<Utc>,
    #[serde(rename = "type")]
    pub position_type: PositionType,
    pub magic: u64,
    pub identifier: u64,
    pub volume: f64,
    pub price_open: f64,
    pub sl: f64,
    pub tp: f64,
    pub price_current: f64,
    pub swap: f64,
    pub profit: f64,
    pub symbol: String,
    pub comment: String,
}

impl crate::convert::Recordish for TradePosition {
    fn record_fields(&self) -> Vec<(&'static str, CallValue)> {
        vec![
            ("ticket", self.ticket.into()),
            ("time", self.time.into()),
            ("type", self.position_type.into()),
            ("magic", self.magic.into()),
            ("identifier", self.identifier.into()),
            ("volume", self.volume.into()),
            ("price_open", self.price_open.into()),
            ("sl", self.sl.into()),
            ("tp", self.tp.into()),
            ("price_current", self.price_current.into()),
            ("swap", self.swap.into()),
            ("profit", self.profit.into()),
            ("symbol", self.symbol.clone().into()),
            ("comment", self.comment.clone().into()),
        ]
    }
}

/// An executed deal from trading history (`history_deals_get`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeDeal {
    pub ticket: u64,
    pub order: u64,
    pub time: DateTime<Utc>,
    #[serde(rename = "type")]
    pub deal_type: i32,
    pub entry: DealEntry,
    pub magic: u64,
    pub position_id: u64,
    pub volume: f64,
    pub price: f64,
    pub commission: f64,
    pub swap: f64,
    pub profit: f64,
    pub symbol: String,
    pub comment: String,
}

impl crate::convert::Recordish for TradeDeal {
    fn record_fields(&self) -> Vec<(&'static str, CallValue)> {
        vec![
            ("ticket", self.ticket.into()),
            ("order", self.order.into()),
            ("time", self.time.into()),
            ("type", self.deal_type.into()),
            ("entry", self.entry.into()),
            ("magic", self.magic.into()),
            ("position_id", self.position_id.into()),
            ("volume", self.volume.into()),
            ("price", self.price.into()),
            ("commission", self.commission.into()),
            ("swap", self.swap.into()),
            ("profit", self.profit.into()),
            ("symbol", self.symbol.clone().into()),
            ("comment", self.comment.clone().into()),
        ]
    }
}

/// A trade request (`MqlTradeRequest`), consumed by `order_check` and
/// `order_send`.
///
/// Use [`TradeRequest::builder`] or the [`Order`](crate::order::Order)
/// helpers to construct one; unset optional fields are simply omitted from
/// the request the terminal sees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[builder(setter(into, strip_option), default)]
pub struct TradeRequest {
    pub action: TradeAction,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magic: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stoplimit: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sl: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deviation: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_filling: Option<OrderFilling>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_time: Option<OrderTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_by: Option<u64>,
}

impl Default for TradeRequest {
    fn default() -> Self {
        Self {
            action: TradeAction::Deal,
            order_type: OrderType::Buy,
            symbol: String::new(),
            magic: None,
            order: None,
            volume: None,
            price: None,
            stoplimit: None,
            sl: None,
            tp: None,
            deviation: None,
            type_filling: None,
            type_time: None,
            expiration: None,
            comment: None,
            position: None,
            position_by: None,
        }
    }
}

impl TradeRequest {
    pub fn builder() -> TradeRequestBuilder {
        TradeRequestBuilder::default()
    }
}

impl crate::convert::Recordish for TradeRequest {
    fn record_fields(&self) -> Vec<(&'static str, CallValue)> {
        vec![
            ("action", self.action.into()),
            ("type", self.order_type.into()),
            ("symbol", self.symbol.clone().into()),
            ("magic", self.magic.into()),
            ("order", self.order.into()),
            ("volume", self.volume.into()),
            ("price", self.price.into()),
            ("stoplimit", self.stoplimit.into()),
            ("sl", self.sl.into()),
            ("tp", self.tp.into()),
            ("deviation", self.deviation.into()),
            ("type_filling", self.type_filling.into()),
            ("type_time", self.type_time.into()),
            ("expiration", self.expiration.into()),
            ("comment", self.comment.clone().into()),
            ("position", self.position.into()),
            ("position_by", self.position_by.into()),
        ]
    }
}

impl From<TradeRequest> for CallValue {
    fn from(req: TradeRequest) -> Self {
        use crate::convert::Recordish;
        req.to_call_value()
    }
}

/// Result of a funds-sufficiency check (`order_check`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCheckResult {
    pub retcode: u32,
    pub balance: f64,
    pub equity: f64,
    pub profit: f64,
    pub margin: f64,
    pub margin_free: f64,
    pub margin_level: f64,
    pub comment: String,
    pub request: TradeRequest,
}

impl_recordish!(OrderCheckResult {
    retcode,
    balance,
    equity,
    profit,
    margin,
    margin_free,
    margin_level,
    comment,
    request,
});

/// Result of an order placement (`order_send`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSendResult {
    pub retcode: u32,
    pub deal: u64,
    pub order: u64,
    pub volume: f64,
    pub price: f64,
    pub bid: f64,
    pub ask: f64,
    pub comment: String,
    pub request_id: u32,
    pub retcode_external: i32,
    pub request: TradeRequest,
}

impl_recordish!(OrderSendResult {
    retcode,
    deal,
    order,
    volume,
    price,
    bid,
    ask,
    comment,
    request_id,
    retcode_external,
    request,
});

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::Recordish;

    #[test]
    fn trade_request_builder() {
        let req = TradeRequest::builder()
            .action(TradeAction::Pending)
            .order_type(OrderType::BuyLimit)
            .symbol("EURUSD")
            .volume(0.1)
            .price(1.0950)
            .build()
            .unwrap();
        assert_eq!(req.action, TradeAction::Pending);
        assert_eq!(req.order_type, OrderType::BuyLimit);
        assert_eq!(req.symbol, "EURUSD");
        assert_eq!(req.volume, Some(0.1));
        assert_eq!(req.sl, None);
    }

    #[test]
    fn trade_request_serializes_type_field() {
        let req = TradeRequest::builder().symbol("EURUSD").build().unwrap();
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("type").is_some());
        assert!(json.get("order_type").is_none());
    }

    #[test]
    fn record_fields_follow_declaration_order() {
        let req = TradeRequest::default();
        let fields = req.record_fields();
        assert_eq!(fields[0].0, "action");
        assert_eq!(fields[1].0, "type");
        assert_eq!(fields[2].0, "symbol");
    }

    #[test]
    fn nested_request_keeps_record_shape() {
        let result = OrderSendResult {
            retcode: 10009,
            deal: 1,
            order: 2,
            volume: 1.0,
            price: 1.1,
            bid: 1.1,
            ask: 1.1,
            comment: String::new(),
            request_id: 7,
            retcode_external: 0,
            request: TradeRequest::default(),
        };
        let value = result.to_call_value();
        assert!(value.contains_record());
    }
}
