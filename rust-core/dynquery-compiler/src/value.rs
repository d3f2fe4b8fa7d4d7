// SPDX-License-Identifier: PMPL-1.0-or-later
//! Typed filter values.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A filter argument converted to the declared type of its terminal property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum TypedValue {
    String(String),
    Integer(i32),
    Long(i64),
    Decimal(Decimal),
    Boolean(bool),
    Double(f64),
    Float(f32),
    Short(i16),
    Byte(i8),
    Char(char),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
    /// Value of a caller-registered or structurally converted type.
    Custom {
        type_name: String,
        value: serde_json::Value,
    },
    /// Set-membership operand.
    List(Vec<TypedValue>),
}

impl TypedValue {
    pub fn as_list(&self) -> Option<&[TypedValue]> {
        match self {
            TypedValue::List(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedValue::String(s) => write!(f, "'{}'", s),
            TypedValue::Integer(v) => write!(f, "{}", v),
            TypedValue::Long(v) => write!(f, "{}", v),
            TypedValue::Decimal(v) => write!(f, "{}", v),
            TypedValue::Boolean(v) => write!(f, "{}", v),
            TypedValue::Double(v) => write!(f, "{}", v),
            TypedValue::Float(v) => write!(f, "{}", v),
            TypedValue::Short(v) => write!(f, "{}", v),
            TypedValue::Byte(v) => write!(f, "{}", v),
            TypedValue::Char(c) => write!(f, "'{}'", c),
            TypedValue::Date(d) => write!(f, "{}", d),
            TypedValue::DateTime(dt) => {
                write!(f, "{}", dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            TypedValue::Custom { value, .. } => write!(f, "{}", value),
            TypedValue::List(items) => write_list(f, items),
        }
    }
}

/// Write `[a, b, c]`.
pub(crate) fn write_list(f: &mut fmt::Formatter<'_>, items: &[TypedValue]) -> fmt::Result {
    f.write_str("[")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    f.write_str("]")
}
