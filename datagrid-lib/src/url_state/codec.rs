//! Per-type encoding of state values into URL parameter strings.

use std::collections::BTreeMap;

use crate::query::ColumnFilter;
use crate::query::DateRange;
use crate::query::SortOrder;

/// A value that can live in a URL query parameter.
///
/// `decode(encode(v)) == Some(v)` must hold for every value.
pub trait UrlValue: Sized + Clone + PartialEq {
    /// Serializes the value into a parameter string.
    fn encode(&self) -> String;

    /// Parses a parameter string. Returns `None` for anything malformed.
    fn decode(raw: &str) -> Option<Self>;
}

macro_rules! decimal_url_value {
    ($($ty:ty),*) => {
        $(
            impl UrlValue for $ty {
                fn encode(&self) -> String {
                    self.to_string()
                }

                fn decode(raw: &str) -> Option<Self> {
                    raw.trim().parse().ok()
                }
            }
        )*
    };
}

decimal_url_value!(u32, u64, usize, i64);

impl UrlValue for bool {
    fn encode(&self) -> String {
        self.to_string()
    }

    fn decode(raw: &str) -> Option<Self> {
        raw.parse().ok()
    }
}

impl UrlValue for String {
    fn encode(&self) -> String {
        self.clone()
    }

    fn decode(raw: &str) -> Option<Self> {
        Some(raw.to_string())
    }
}

impl UrlValue for SortOrder {
    fn encode(&self) -> String {
        self.as_str().to_string()
    }

    fn decode(raw: &str) -> Option<Self> {
        SortOrder::parse(raw)
    }
}

// Structured values travel as JSON.
macro_rules! json_url_value {
    ($($ty:ty),*) => {
        $(
            impl UrlValue for $ty {
                fn encode(&self) -> String {
                    serde_json::to_string(self).unwrap_or_default()
                }

                fn decode(raw: &str) -> Option<Self> {
                    serde_json::from_str(raw).ok()
                }
            }
        )*
    };
}

json_url_value!(DateRange, Vec<ColumnFilter>, BTreeMap<String, bool>);
