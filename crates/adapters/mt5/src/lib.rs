#![doc = include_str!("../README.md")]

pub mod client;
pub mod convert;
pub mod dispatch;
pub mod enums;
pub mod error;
pub mod models;
pub mod order;
pub mod state;
pub mod terminal;
pub mod testing;
pub mod trade;

pub use client::{Mt5Client, Mt5Config, Session};
pub use convert::{CallValue, Recordish, ReturnMode};
pub use enums::*;
pub use error::{Mt5Error, Mt5Result};
pub use models::*;
pub use order::Order;
pub use state::{AdapterState, StateOverrides, DEFAULT_MAX_BARS};
pub use terminal::{HistorySelect, InitParams, RatesWindow, TerminalApi, TicketFilter};
pub use trade::{PriceBasis, Trade};
