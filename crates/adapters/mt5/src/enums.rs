//! Enumerations mirroring the MetaTrader 5 terminal constants.

use serde::{Deserialize, Serialize};

/// Chart timeframes (`TIMEFRAME_*`).
///
/// The discriminants are the raw values the terminal uses: minute frames are
/// plain minute counts, hour frames carry the `0x4000` flag, weekly `0x8000`
/// and monthly `0xC000`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum Timeframe {
    M1 = 1,
    M2 = 2,
    M3 = 3,
    M4 = 4,
    M5 = 5,
    M6 = 6,
    M10 = 10,
    M12 = 12,
    M15 = 15,
    M20 = 20,
    M30 = 30,
    H1 = 1 | 0x4000,
    H2 = 2 | 0x4000,
    H3 = 3 | 0x4000,
    H4 = 4 | 0x4000,
    H6 = 6 | 0x4000,
    H8 = 8 | 0x4000,
    H12 = 12 | 0x4000,
    D1 = 24 | 0x4000,
    W1 = 1 | 0x8000,
    MN1 = 1 | 0xC000,
}

impl Timeframe {
    /// The number of seconds covered by one bar of this timeframe.
    pub fn period_seconds(self) -> u32 {
        let raw = self as i32;
        match raw & 0xC000 {
            0x8000 => 7 * 24 * 3600,
            0xC000 => 30 * 24 * 3600,
            0x4000 => (raw & 0x3FFF) as u32 * 3600,
            _ => raw as u32 * 60,
        }
    }

    /// Resolves a timeframe from a minute count (e.g. `60` -> `H1`).
    pub fn from_minutes(minutes: u32) -> Option<Self> {
        use Timeframe::*;
        let tf = match minutes {
            1 => M1,
            2 => M2,
            3 => M3,
            4 => M4,
            5 => M5,
            6 => M6,
            10 => M10,
            12 => M12,
            15 => M15,
            20 => M20,
            30 => M30,
            60 => H1,
            120 => H2,
            180 => H3,
            240 => H4,
            360 => H6,
            480 => H8,
            720 => H12,
            1440 => D1,
            10080 => W1,
            43200 => MN1,
            _ => return None,
        };
        Some(tf)
    }
}

/// Tick-copy flags for `copy_ticks_from`/`copy_ticks_range` (`COPY_TICKS_*`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum CopyTicks {
    All = -1,
    Info = 1,
    Trade = 2,
}

/// Order types (`ENUM_ORDER_TYPE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum OrderType {
    Buy = 0,
    Sell = 1,
    BuyLimit = 2,
    SellLimit = 3,
    BuyStop = 4,
    SellStop = 5,
    BuyStopLimit = 6,
    SellStopLimit = 7,
    CloseBy = 8,
}

impl OrderType {
    /// Uppercase terminal-style name, used in order logging.
    pub fn name(self) -> &'static str {
        match self {
            OrderType::Buy => "ORDER_TYPE_BUY",
            OrderType::Sell => "ORDER_TYPE_SELL",
            OrderType::BuyLimit => "ORDER_TYPE_BUY_LIMIT",
            OrderType::SellLimit => "ORDER_TYPE_SELL_LIMIT",
            OrderType::BuyStop => "ORDER_TYPE_BUY_STOP",
            OrderType::SellStop => "ORDER_TYPE_SELL_STOP",
            OrderType::BuyStopLimit => "ORDER_TYPE_BUY_STOP_LIMIT",
            OrderType::SellStopLimit => "ORDER_TYPE_SELL_STOP_LIMIT",
            OrderType::CloseBy => "ORDER_TYPE_CLOSE_BY",
        }
    }

    /// The opposite market direction, for flattening and reversing positions.
    pub fn opposite(self) -> Self {
        match self {
            OrderType::Buy => OrderType::Sell,
            OrderType::Sell => OrderType::Buy,
            other => other,
        }
    }
}

/// Trade request actions (`ENUM_TRADE_REQUEST_ACTIONS`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum TradeAction {
    Deal = 1,
    Pending = 5,
    Sltp = 6,
    Modify = 7,
    Remove = 8,
    CloseBy = 10,
}

/// Order filling policies (`ENUM_ORDER_TYPE_FILLING`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum OrderFilling {
    Fok = 0,
    Ioc = 1,
    Return = 2,
}

/// Order lifetime policies (`ENUM_ORDER_TYPE_TIME`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum OrderTime {
    Gtc = 0,
    Day = 1,
    Specified = 2,
    SpecifiedDay = 3,
}

/// Position direction (`ENUM_POSITION_TYPE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum PositionType {
    Buy = 0,
    Sell = 1,
}

/// Deal entry direction (`ENUM_DEAL_ENTRY`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum DealEntry {
    In = 0,
    Out = 1,
    InOut = 2,
    OutBy = 3,
}

/// Account trade mode (`ENUM_ACCOUNT_TRADE_MODE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum AccountTradeMode {
    Demo = 0,
    Contest = 1,
    Real = 2,
}

/// Trade server return codes (`TRADE_RETCODE_*`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum TradeRetcode {
    Requote = 10004,
    Reject = 10006,
    Cancel = 10007,
    Placed = 10008,
    Done = 10009,
    DonePartial = 10010,
    Error = 10011,
    Timeout = 10012,
    Invalid = 10013,
    InvalidVolume = 10014,
    InvalidPrice = 10015,
    InvalidStops = 10016,
    TradeDisabled = 10017,
    MarketClosed = 10018,
    NoMoney = 10019,
    PriceChanged = 10020,
    PriceOff = 10021,
    InvalidExpiration = 10022,
    OrderChanged = 10023,
    TooManyRequests = 10024,
    NoChanges = 10025,
    ServerDisablesAt = 10026,
    ClientDisablesAt = 10027,
    Locked = 10028,
    Frozen = 10029,
    InvalidFill = 10030,
    Connection = 10031,
    OnlyReal = 10032,
    LimitOrders = 10033,
    LimitVolume = 10034,
    InvalidOrder = 10035,
    PositionClosed = 10036,
    InvalidCloseVolume = 10038,
    CloseOrderExist = 10039,
    LimitPositions = 10040,
    RejectCancel = 10041,
    LongOnly = 10042,
    ShortOnly = 10043,
    CloseOnly = 10044,
    FifoClose = 10045,
}

impl TradeRetcode {
    pub fn from_code(code: u32) -> Option<Self> {
        use TradeRetcode::*;
        let rc = match code {
            10004 => Requote,
            10006 => Reject,
            10007 => Cancel,
            10008 => Placed,
            10009 => Done,
            10010 => DonePartial,
            10011 => Error,
            10012 => Timeout,
            10013 => Invalid,
            10014 => InvalidVolume,
            10015 => InvalidPrice,
            10016 => InvalidStops,
            10017 => TradeDisabled,
            10018 => MarketClosed,
            10019 => NoMoney,
            10020 => PriceChanged,
            10021 => PriceOff,
            10022 => InvalidExpiration,
            10023 => OrderChanged,
            10024 => TooManyRequests,
            10025 => NoChanges,
            10026 => ServerDisablesAt,
            10027 => ClientDisablesAt,
            10028 => Locked,
            10029 => Frozen,
            10030 => InvalidFill,
            10031 => Connection,
            10032 => OnlyReal,
            10033 => LimitOrders,
            10034 => LimitVolume,
            10035 => InvalidOrder,
            10036 => PositionClosed,
            10038 => InvalidCloseVolume,
            10039 => CloseOrderExist,
            10040 => LimitPositions,
            10041 => RejectCancel,
            10042 => LongOnly,
            10043 => ShortOnly,
            10044 => CloseOnly,
            10045 => FifoClose,
            _ => return None,
        };
        Some(rc)
    }

    fn name(self) -> &'static str {
        match self {
            TradeRetcode::Requote => "TRADE_RETCODE_REQUOTE",
            TradeRetcode::Reject => "TRADE_RETCODE_REJECT",
            TradeRetcode::Cancel => "TRADE_RETCODE_CANCEL",
            TradeRetcode::Placed => "TRADE_RETCODE_PLACED",
            TradeRetcode::Done => "TRADE_RETCODE_DONE",
            TradeRetcode::DonePartial => "TRADE_RETCODE_DONE_PARTIAL",
            TradeRetcode::Error => "TRADE_RETCODE_ERROR",
            TradeRetcode::Timeout => "TRADE_RETCODE_TIMEOUT",
            TradeRetcode::Invalid => "TRADE_RETCODE_INVALID",
            TradeRetcode::InvalidVolume => "TRADE_RETCODE_INVALID_VOLUME",
            TradeRetcode::InvalidPrice => "TRADE_RETCODE_INVALID_PRICE",
            TradeRetcode::InvalidStops => "TRADE_RETCODE_INVALID_STOPS",
            TradeRetcode::TradeDisabled => "TRADE_RETCODE_TRADE_DISABLED",
            TradeRetcode::MarketClosed => "TRADE_RETCODE_MARKET_CLOSED",
            TradeRetcode::NoMoney => "TRADE_RETCODE_NO_MONEY",
            TradeRetcode::PriceChanged => "TRADE_RETCODE_PRICE_CHANGED",
            TradeRetcode::PriceOff => "TRADE_RETCODE_PRICE_OFF",
            TradeRetcode::InvalidExpiration => "TRADE_RETCODE_INVALID_EXPIRATION",
            TradeRetcode::OrderChanged => "TRADE_RETCODE_ORDER_CHANGED",
            TradeRetcode::TooManyRequests => "TRADE_RETCODE_TOO_MANY_REQUESTS",
            TradeRetcode::NoChanges => "TRADE_RETCODE_NO_CHANGES",
            TradeRetcode::ServerDisablesAt => "TRADE_RETCODE_SERVER_DISABLES_AT",
            TradeRetcode::ClientDisablesAt => "TRADE_RETCODE_CLIENT_DISABLES_AT",
            TradeRetcode::Locked => "TRADE_RETCODE_LOCKED",
            TradeRetcode::Frozen => "TRADE_RETCODE_FROZEN",
            TradeRetcode::InvalidFill => "TRADE_RETCODE_INVALID_FILL",
            TradeRetcode::Connection => "TRADE_RETCODE_CONNECTION",
            TradeRetcode::OnlyReal => "TRADE_RETCODE_ONLY_REAL",
            TradeRetcode::LimitOrders => "TRADE_RETCODE_LIMIT_ORDERS",
            TradeRetcode::LimitVolume => "TRADE_RETCODE_LIMIT_VOLUME",
            TradeRetcode::InvalidOrder => "TRADE_RETCODE_INVALID_ORDER",
            TradeRetcode::PositionClosed => "TRADE_RETCODE_POSITION_CLOSED",
            TradeRetcode::InvalidCloseVolume => "TRADE_RETCODE_INVALID_CLOSE_VOLUME",
            TradeRetcode::CloseOrderExist => "TRADE_RETCODE_CLOSE_ORDER_EXIST",
            TradeRetcode::LimitPositions => "TRADE_RETCODE_LIMIT_POSITIONS",
            TradeRetcode::RejectCancel => "TRADE_RETCODE_REJECT_CANCEL",
            TradeRetcode::LongOnly => "TRADE_RETCODE_LONG_ONLY",
            TradeRetcode::ShortOnly => "TRADE_RETCODE_SHORT_ONLY",
            TradeRetcode::CloseOnly => "TRADE_RETCODE_CLOSE_ONLY",
            TradeRetcode::FifoClose => "TRADE_RETCODE_FIFO_CLOSE",
        }
    }

    /// Terminal-style retcode name, or a fallback for codes the enum does not
    /// cover.
    pub fn description(code: u32) -> &'static str {
        match Self::from_code(code) {
            Some(rc) => rc.name(),
            None => "Unknown Trade Retcode",
        }
    }
}

/// Last-error codes (`RES_*`).
///
/// Negative codes down to `-10005` come from the terminal library itself; the
/// `-200_000` range holds codes raised by this adapter only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum ErrorCode {
    Ok = 1,
    Fail = -1,
    InvalidParams = -2,
    NoMemory = -3,
    NotFound = -4,
    InvalidVersion = -5,
    AuthFailed = -6,
    Unsupported = -7,
    AutoTradingDisabled = -8,
    InternalFail = -10_000,
    InternalFailSend = -10_001,
    InternalFailRecv = -10_002,
    InternalFailInit = -10_003,
    InternalFailConn = -10_004,
    InternalFailTimeout = -10_005,
    // Adapter-defined codes
    AutoTradeDisabled = -200_000,
    RealAccountDisabled = -200_001,
    TerminalVersionOutdated = -200_002,
    UnknownError = -200_003,
}

impl ErrorCode {
    /// Maps a raw `last_error` code, falling back to `UnknownError` for codes
    /// the terminal documentation does not define.
    pub fn from_code(code: i32) -> Self {
        use ErrorCode::*;
        match code {
            1 => Ok,
            -1 => Fail,
            -2 => InvalidParams,
            -3 => NoMemory,
            -4 => NotFound,
            -5 => InvalidVersion,
            -6 => AuthFailed,
            -7 => Unsupported,
            -8 => AutoTradingDisabled,
            -10_000 => InternalFail,
            -10_001 => InternalFailSend,
            -10_002 => InternalFailRecv,
            -10_003 => InternalFailInit,
            -10_004 => InternalFailConn,
            -10_005 => InternalFailTimeout,
            -200_000 => AutoTradeDisabled,
            -200_001 => RealAccountDisabled,
            -200_002 => TerminalVersionOutdated,
            _ => UnknownError,
        }
    }

    pub fn code(self) -> i32 {
        self as i32
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?} ({})", self.code())
    }
}

/// Terminal builds older than this cannot serve `symbols_get`.
pub const MIN_TERMINAL_BUILD: u32 = 2375;

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(Timeframe::M1, 60)]
    #[case(Timeframe::M30, 1800)]
    #[case(Timeframe::H1, 3600)]
    #[case(Timeframe::H12, 43_200)]
    #[case(Timeframe::D1, 86_400)]
    #[case(Timeframe::W1, 604_800)]
    #[case(Timeframe::MN1, 2_592_000)]
    fn period_seconds(#[case] tf: Timeframe, #[case] seconds: u32) {
        assert_eq!(tf.period_seconds(), seconds);
    }

    #[test]
    fn timeframe_from_minutes() {
        assert_eq!(Timeframe::from_minutes(60), Some(Timeframe::H1));
        assert_eq!(Timeframe::from_minutes(1440), Some(Timeframe::D1));
        assert_eq!(Timeframe::from_minutes(7), None);
    }

    #[test]
    fn retcode_description() {
        assert_eq!(TradeRetcode::description(10009), "TRADE_RETCODE_DONE");
        assert_eq!(TradeRetcode::description(10004), "TRADE_RETCODE_REQUOTE");
        assert_eq!(TradeRetcode::description(1), "Unknown Trade Retcode");
    }

    #[test]
    fn error_code_round_trip() {
        assert_eq!(ErrorCode::from_code(1), ErrorCode::Ok);
        assert_eq!(ErrorCode::from_code(-2), ErrorCode::InvalidParams);
        assert_eq!(ErrorCode::from_code(-200_001), ErrorCode::RealAccountDisabled);
        assert_eq!(ErrorCode::from_code(12345), ErrorCode::UnknownError);
        assert_eq!(ErrorCode::RealAccountDisabled.code(), -200_001);
    }

    #[test]
    fn order_type_opposite() {
        assert_eq!(OrderType::Buy.opposite(), OrderType::Sell);
        assert_eq!(OrderType::Sell.opposite(), OrderType::Buy);
        assert_eq!(OrderType::BuyLimit.opposite(), OrderType::BuyLimit);
    }
}
