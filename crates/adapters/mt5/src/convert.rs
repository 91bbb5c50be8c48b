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

//! Result-shape conversion.
//!
//! The terminal returns fixed-field records, sequences of records, and
//! columnar series (rates/ticks). Callers who want plain data instead of the
//! typed records choose a [`ReturnMode`]: `Dict` flattens every record into a
//! plain mapping, series members included, while keeping the series wrapper;
//! `Native` additionally turns series into plain lists. Conversion is a
//! strategy applied to a [`CallValue`] tree, never inferred from ambient
//! state.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Output shape applied to converted results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnMode {
    /// No conversion; records keep their typed identity.
    #[default]
    Raw,
    /// Records become plain mappings everywhere; series wrappers are kept.
    Dict,
    /// Records become plain mappings and series become plain lists.
    Native,
}

/// Structural view of a terminal response value.
///
/// `Record` nodes retain record identity (named fields in declaration order);
/// `Map` and `List` are their converted plain forms. `Series` marks a
/// columnar array leaf as produced by the rates/ticks calls.
#[derive(Debug, Clone, PartialEq)]
pub enum CallValue {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    Record(Vec<(&'static str, CallValue)>),
    Map(BTreeMap<String, CallValue>),
    Series(Vec<CallValue>),
    List(Vec<CallValue>),
}

/// Capability trait for record-shaped terminal responses.
///
/// Detection is structural: anything that can enumerate its named fields is a
/// record, regardless of its concrete type.
pub trait Recordish {
    /// The record's fields, in declaration order.
    fn record_fields(&self) -> Vec<(&'static str, CallValue)>;

    fn to_call_value(&self) -> CallValue {
        CallValue::Record(self.record_fields())
    }
}

impl CallValue {
    /// Wraps a columnar slice of records (rates/ticks) as a series leaf.
    pub fn series_of<T: Recordish>(items: &[T]) -> CallValue {
        CallValue::Series(items.iter().map(Recordish::to_call_value).collect())
    }

    /// Wraps a plain sequence of records.
    pub fn list_of<T: Recordish>(items: &[T]) -> CallValue {
        CallValue::List(items.iter().map(Recordish::to_call_value).collect())
    }

    /// True if any node in the tree still has record identity.
    pub fn contains_record(&self) -> bool {
        match self {
            CallValue::Record(_) => true,
            CallValue::Map(m) => m.values().any(CallValue::contains_record),
            CallValue::Series(xs) | CallValue::List(xs) => {
                xs.iter().any(CallValue::contains_record)
            }
            _ => false,
        }
    }

    /// True if any node in the tree is a series leaf.
    pub fn contains_series(&self) -> bool {
        match self {
            CallValue::Series(_) => true,
            CallValue::Record(fields) => fields.iter().any(|(_, v)| v.contains_series()),
            CallValue::Map(m) => m.values().any(CallValue::contains_series),
            CallValue::List(xs) => xs.iter().any(CallValue::contains_series),
            _ => false,
        }
    }
}

/// Converts every record node into a plain mapping, recursively. Series
/// wrappers are kept but their members are converted too; after this no
/// record-shaped node remains anywhere in the tree.
pub fn dictify(value: CallValue) -> CallValue {
    match value {
        CallValue::Record(fields) => CallValue::Map(
            fields
                .into_iter()
                .map(|(name, v)| (name.to_string(), dictify(v)))
                .collect(),
        ),
        CallValue::Map(m) => {
            CallValue::Map(m.into_iter().map(|(k, v)| (k, dictify(v))).collect())
        }
        CallValue::Series(xs) => CallValue::Series(xs.into_iter().map(dictify).collect()),
        CallValue::List(xs) => CallValue::List(xs.into_iter().map(dictify).collect()),
        other => other,
    }
}

/// Converts the whole tree into plain mappings, lists and scalars.
pub fn make_native(value: CallValue) -> CallValue {
    match value {
        CallValue::Record(fields) => CallValue::Map(
            fields
                .into_iter()
                .map(|(name, v)| (name.to_string(), make_native(v)))
                .collect(),
        ),
        CallValue::Map(m) => {
            CallValue::Map(m.into_iter().map(|(k, v)| (k, make_native(v))).collect())
        }
        CallValue::Series(xs) | CallValue::List(xs) => {
            CallValue::List(xs.into_iter().map(make_native).collect())
        }
        other => other,
    }
}

/// Applies the given return mode to a response tree.
pub fn convert(mode: ReturnMode, value: CallValue) -> CallValue {
    match mode {
        ReturnMode::Raw => value,
        ReturnMode::Dict => dictify(value),
        ReturnMode::Native => make_native(value),
    }
}

impl From<bool> for CallValue {
    fn from(v: bool) -> Self {
        CallValue::Bool(v)
    }
}

impl From<i32> for CallValue {
    fn from(v: i32) -> Self {
        CallValue::Int(v.into())
    }
}

impl From<i64> for CallValue {
    fn from(v: i64) -> Self {
        CallValue::Int(v)
    }
}

impl From<u32> for CallValue {
    fn from(v: u32) -> Self {
        CallValue::UInt(v.into())
    }
}

impl From<u64> for CallValue {
    fn from(v: u64) -> Self {
        CallValue::UInt(v)
    }
}

impl From<f64> for CallValue {
    fn from(v: f64) -> Self {
        CallValue::Float(v)
    }
}

impl From<&str> for CallValue {
    fn from(v: &str) -> Self {
        CallValue::Str(v.to_string())
    }
}

impl From<String> for CallValue {
    fn from(v: String) -> Self {
        CallValue::Str(v)
    }
}

impl From<DateTime<Utc>> for CallValue {
    fn from(v: DateTime<Utc>) -> Self {
        CallValue::Int(v.timestamp())
    }
}

impl<T> From<Option<T>> for CallValue
where
    T: Into<CallValue>,
{
    fn from(v: Option<T>) -> Self {
        v.map_or(CallValue::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> CallValue {
        CallValue::Record(vec![
            ("ticket", CallValue::UInt(42)),
            (
                "request",
                CallValue::Record(vec![
                    ("symbol", CallValue::Str("EURUSD".into())),
                    ("volume", CallValue::Float(1.0)),
                ]),
            ),
            (
                "rates",
                CallValue::Series(vec![CallValue::Record(vec![(
                    "close",
                    CallValue::Float(1.1),
                )])]),
            ),
        ])
    }

    #[test]
    fn raw_is_identity() {
        let v = sample_record();
        assert_eq!(convert(ReturnMode::Raw, v.clone()), v);
    }

    #[test]
    fn dictify_removes_records_keeps_series() {
        let v = convert(ReturnMode::Dict, sample_record());
        // Every record node is gone, series members included; only the
        // series wrapper itself survives.
        match &v {
            CallValue::Map(m) => {
                assert!(matches!(m["request"], CallValue::Map(_)));
                match &m["rates"] {
                    CallValue::Series(items) => {
                        assert!(matches!(items[0], CallValue::Map(_)));
                    }
                    other => panic!("expected series, got {other:?}"),
                }
            }
            other => panic!("expected map, got {other:?}"),
        }
        assert!(!v.contains_record());
        assert!(v.contains_series());
    }

    #[test]
    fn dictify_reaches_series_members() {
        let v = convert(
            ReturnMode::Dict,
            CallValue::series_of(&[crate::testing::eurusd_tick()]),
        );
        assert!(!v.contains_record());
        match &v {
            CallValue::Series(items) => match &items[0] {
                CallValue::Map(m) => assert!(m.contains_key("bid")),
                other => panic!("expected map member, got {other:?}"),
            },
            other => panic!("expected series, got {other:?}"),
        }
    }

    #[test]
    fn make_native_removes_records_and_series() {
        let v = convert(ReturnMode::Native, sample_record());
        assert!(!v.contains_record());
        assert!(!v.contains_series());
        match &v {
            CallValue::Map(m) => match &m["rates"] {
                CallValue::List(items) => assert!(matches!(items[0], CallValue::Map(_))),
                other => panic!("expected list, got {other:?}"),
            },
            other => panic!("expected map, got {other:?}"),
        }
    }

    #[test]
    fn conversion_is_idempotent() {
        let dicted = convert(ReturnMode::Dict, sample_record());
        assert_eq!(convert(ReturnMode::Dict, dicted.clone()), dicted);
        let native = convert(ReturnMode::Native, sample_record());
        assert_eq!(convert(ReturnMode::Native, native.clone()), native);
    }

    #[test]
    fn option_conversion() {
        let some: CallValue = Some(3.5_f64).into();
        assert_eq!(some, CallValue::Float(3.5));
        let none: CallValue = Option::<f64>::None.into();
        assert_eq!(none, CallValue::Null);
    }
}
