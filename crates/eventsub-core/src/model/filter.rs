//! Event filters.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Remote filter object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    /// `None` or empty means all event types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub included_event_types: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_begins_with: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_ends_with: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_subject_case_sensitive: Option<bool>,
    /// Evaluated in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub advanced_filters: Vec<AdvancedFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_advanced_filtering_on_arrays: Option<bool>,
}

/// Advanced filter predicate over an event payload field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operatorType")]
pub enum AdvancedFilter {
    NumberIn { key: String, values: Vec<f64> },
    NumberNotIn { key: String, values: Vec<f64> },
    NumberLessThan { key: String, value: f64 },
    NumberGreaterThan { key: String, value: f64 },
    NumberLessThanOrEquals { key: String, value: f64 },
    NumberGreaterThanOrEquals { key: String, value: f64 },
    NumberInRange { key: String, values: Vec<[f64; 2]> },
    NumberNotInRange { key: String, values: Vec<[f64; 2]> },
    StringContains { key: String, values: Vec<String> },
    StringNotContains { key: String, values: Vec<String> },
    StringBeginsWith { key: String, values: Vec<String> },
    StringNotBeginsWith { key: String, values: Vec<String> },
    StringEndsWith { key: String, values: Vec<String> },
    StringNotEndsWith { key: String, values: Vec<String> },
    StringIn { key: String, values: Vec<String> },
    StringNotIn { key: String, values: Vec<String> },
    BoolEquals { key: String, value: bool },
    IsNullOrUndefined { key: String },
    IsNotNull { key: String },
}

impl AdvancedFilter {
    pub fn operator(&self) -> AdvancedFilterOperator {
        use AdvancedFilterOperator as Op;
        match self {
            Self::NumberIn { .. } => Op::NumberIn,
            Self::NumberNotIn { .. } => Op::NumberNotIn,
            Self::NumberLessThan { .. } => Op::NumberLessThan,
            Self::NumberGreaterThan { .. } => Op::NumberGreaterThan,
            Self::NumberLessThanOrEquals { .. } => Op::NumberLessThanOrEquals,
            Self::NumberGreaterThanOrEquals { .. } => Op::NumberGreaterThanOrEquals,
            Self::NumberInRange { .. } => Op::NumberInRange,
            Self::NumberNotInRange { .. } => Op::NumberNotInRange,
            Self::StringContains { .. } => Op::StringContains,
            Self::StringNotContains { .. } => Op::StringNotContains,
            Self::StringBeginsWith { .. } => Op::StringBeginsWith,
            Self::StringNotBeginsWith { .. } => Op::StringNotBeginsWith,
            Self::StringEndsWith { .. } => Op::StringEndsWith,
            Self::StringNotEndsWith { .. } => Op::StringNotEndsWith,
            Self::StringIn { .. } => Op::StringIn,
            Self::StringNotIn { .. } => Op::StringNotIn,
            Self::BoolEquals { .. } => Op::BoolEquals,
            Self::IsNullOrUndefined { .. } => Op::IsNullOrUndefined,
            Self::IsNotNull { .. } => Op::IsNotNull,
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Self::NumberIn { key, .. }
            | Self::NumberNotIn { key, .. }
            | Self::NumberLessThan { key, .. }
            | Self::NumberGreaterThan { key, .. }
            | Self::NumberLessThanOrEquals { key, .. }
            | Self::NumberGreaterThanOrEquals { key, .. }
            | Self::NumberInRange { key, .. }
            | Self::NumberNotInRange { key, .. }
            | Self::StringContains { key, .. }
            | Self::StringNotContains { key, .. }
            | Self::StringBeginsWith { key, .. }
            | Self::StringNotBeginsWith { key, .. }
            | Self::StringEndsWith { key, .. }
            | Self::StringNotEndsWith { key, .. }
            | Self::StringIn { key, .. }
            | Self::StringNotIn { key, .. }
            | Self::BoolEquals { key, .. }
            | Self::IsNullOrUndefined { key }
            | Self::IsNotNull { key } => key,
        }
    }
}

/// The closed set of advanced filter operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdvancedFilterOperator {
    NumberIn,
    NumberNotIn,
    NumberLessThan,
    NumberGreaterThan,
    NumberLessThanOrEquals,
    NumberGreaterThanOrEquals,
    NumberInRange,
    NumberNotInRange,
    StringContains,
    StringNotContains,
    StringBeginsWith,
    StringNotBeginsWith,
    StringEndsWith,
    StringNotEndsWith,
    StringIn,
    StringNotIn,
    BoolEquals,
    IsNullOrUndefined,
    IsNotNull,
}

impl AdvancedFilterOperator {
    pub const ALL: [Self; 19] = [
        Self::NumberIn,
        Self::NumberNotIn,
        Self::NumberLessThan,
        Self::NumberGreaterThan,
        Self::NumberLessThanOrEquals,
        Self::NumberGreaterThanOrEquals,
        Self::NumberInRange,
        Self::NumberNotInRange,
        Self::StringContains,
        Self::StringNotContains,
        Self::StringBeginsWith,
        Self::StringNotBeginsWith,
        Self::StringEndsWith,
        Self::StringNotEndsWith,
        Self::StringIn,
        Self::StringNotIn,
        Self::BoolEquals,
        Self::IsNullOrUndefined,
        Self::IsNotNull,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NumberIn => "NumberIn",
            Self::NumberNotIn => "NumberNotIn",
            Self::NumberLessThan => "NumberLessThan",
            Self::NumberGreaterThan => "NumberGreaterThan",
            Self::NumberLessThanOrEquals => "NumberLessThanOrEquals",
            Self::NumberGreaterThanOrEquals => "NumberGreaterThanOrEquals",
            Self::NumberInRange => "NumberInRange",
            Self::NumberNotInRange => "NumberNotInRange",
            Self::StringContains => "StringContains",
            Self::StringNotContains => "StringNotContains",
            Self::StringBeginsWith => "StringBeginsWith",
            Self::StringNotBeginsWith => "StringNotBeginsWith",
            Self::StringEndsWith => "StringEndsWith",
            Self::StringNotEndsWith => "StringNotEndsWith",
            Self::StringIn => "StringIn",
            Self::StringNotIn => "StringNotIn",
            Self::BoolEquals => "BoolEquals",
            Self::IsNullOrUndefined => "IsNullOrUndefined",
            Self::IsNotNull => "IsNotNull",
        }
    }
}

impl fmt::Display for AdvancedFilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdvancedFilterOperator {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| {
                CoreError::Validation(crate::ValidationError::new(
                    "advanced_filter.operator",
                    format!("unknown operator '{s}'"),
                ))
            })
    }
}
