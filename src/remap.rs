//! Project search filters and their translation to backend query parameters
//!
//! The explore page keeps its filters under short UI names (`team`,
//! `location`, `stale`, ...). The search endpoint expects different names
//! (`teamId`, `country`, `lastUpdatedTo`, ...). [`remap`] renames one into the
//! other through a [`TranslationTable`].

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// UI key of the "stale projects" toggle
pub const STALE_KEY: &str = "stale";

/// Backend key of the action filter
pub const ACTION_PARAM: &str = "action";

/// How far back the stale cutoff lies
const STALE_CUTOFF_MONTHS: u32 = 6;

// ============================================================================
// Values
// ============================================================================

/// A single filter value
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum FilterValue {
    Bool(bool),
    Int(i64),
    Text(String),
    List(Vec<String>),
}

impl FilterValue {
    /// Truthiness as the UI treats it: `false`, `0` and `""` are falsy,
    /// lists are always truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            FilterValue::Bool(b) => *b,
            FilterValue::Int(n) => *n != 0,
            FilterValue::Text(s) => !s.is_empty(),
            FilterValue::List(_) => true,
        }
    }

    /// Render as a URL query value. Lists are comma-joined.
    pub fn to_query_value(&self) -> String {
        match self {
            FilterValue::Bool(b) => b.to_string(),
            FilterValue::Int(n) => n.to_string(),
            FilterValue::Text(s) => s.clone(),
            FilterValue::List(items) => items.join(","),
        }
    }

    /// Parse a raw `key=value` CLI value: booleans, integers, comma lists, text.
    ///
    /// `None` when nothing is left to filter on (`""`, `","`).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "" => return None,
            "true" => return Some(FilterValue::Bool(true)),
            "false" => return Some(FilterValue::Bool(false)),
            _ => {}
        }
        if let Ok(n) = raw.parse::<i64>() {
            return Some(FilterValue::Int(n));
        }
        if raw.contains(',') {
            let items: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
            return (!items.is_empty()).then_some(FilterValue::List(items));
        }
        Some(FilterValue::Text(raw.to_string()))
    }

    /// Convert one JSON value of a UI filter state; `null` means absent.
    ///
    /// Numbers that are not `i64` keep their JSON rendering as text, list
    /// items are rendered the same way.
    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(b) => Some(FilterValue::Bool(b)),
            Value::Number(n) => Some(match n.as_i64() {
                Some(i) => FilterValue::Int(i),
                None => FilterValue::Text(n.to_string()),
            }),
            Value::String(s) => Some(FilterValue::Text(s)),
            Value::Array(items) => Some(FilterValue::List(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        Value::Null => None,
                        Value::String(s) => Some(s),
                        other => Some(other.to_string()),
                    })
                    .collect(),
            )),
            other @ Value::Object(_) => Some(FilterValue::Text(other.to_string())),
        }
    }
}

impl From<bool> for FilterValue {
    fn from(v: bool) -> Self {
        FilterValue::Bool(v)
    }
}

impl From<i64> for FilterValue {
    fn from(v: i64) -> Self {
        FilterValue::Int(v)
    }
}

impl From<i32> for FilterValue {
    fn from(v: i32) -> Self {
        FilterValue::Int(v.into())
    }
}

impl From<u32> for FilterValue {
    fn from(v: u32) -> Self {
        FilterValue::Int(v.into())
    }
}

impl From<&str> for FilterValue {
    fn from(v: &str) -> Self {
        FilterValue::Text(v.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(v: String) -> Self {
        FilterValue::Text(v)
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(v: Vec<String>) -> Self {
        FilterValue::List(v)
    }
}

impl From<Vec<&str>> for FilterValue {
    fn from(v: Vec<&str>) -> Self {
        FilterValue::List(v.into_iter().map(String::from).collect())
    }
}

// ============================================================================
// Filter state (UI names)
// ============================================================================

/// Filters as the explore page holds them, keyed by UI name.
///
/// Ordered so that two states with the same entries hash and compare equal
/// regardless of insertion order. Deserializes from any JSON object;
/// `null` entries are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct FilterState(BTreeMap<String, FilterValue>);

impl<'de> Deserialize<'de> for FilterState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, Value>::deserialize(deserializer)?;
        Ok(Self(
            raw.into_iter()
                .filter_map(|(key, value)| FilterValue::from_json(value).map(|v| (key, v)))
                .collect(),
        ))
    }
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FilterValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<FilterValue>> FromIterator<(K, V)> for FilterState {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

// ============================================================================
// Backend query (API names)
// ============================================================================

/// Filters under the names the search endpoint understands
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BackendQuery(BTreeMap<String, FilterValue>);

impl BackendQuery {
    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FilterValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// URL query pairs, in key order
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        self.0
            .iter()
            .map(|(k, v)| (k.clone(), v.to_query_value()))
            .collect()
    }
}

// ============================================================================
// Translation table
// ============================================================================

/// Static UI name → backend name mapping
#[derive(Debug, Clone, Copy)]
pub struct TranslationTable {
    entries: &'static [(&'static str, &'static str)],
}

/// Table used by the project search endpoint
pub const PROJECT_FILTERS: TranslationTable = TranslationTable {
    entries: &[
        ("difficulty", "difficulty"),
        ("campaign", "campaign"),
        ("team", "teamId"),
        ("organisation", "organisationName"),
        ("location", "country"),
        ("types", "mappingTypes"),
        ("exactTypes", "mappingTypesExact"),
        ("interests", "interests"),
        ("text", "textSearch"),
        ("page", "page"),
        ("orderBy", "orderBy"),
        ("orderByType", "orderByType"),
        ("createdByMe", "createdByMe"),
        ("managedByMe", "managedByMe"),
        ("favoritedByMe", "favoritedByMe"),
        ("mappedByMe", "mappedByMe"),
        ("status", "projectStatuses"),
        ("action", "action"),
        ("stale", "lastUpdatedTo"),
        ("createdFrom", "createdFrom"),
        ("basedOnMyInterests", "basedOnMyInterests"),
    ],
};

impl TranslationTable {
    pub const fn new(entries: &'static [(&'static str, &'static str)]) -> Self {
        Self { entries }
    }

    /// Backend name for a UI key, `None` when the key is not recognized
    pub fn backend_name(&self, ui_key: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(ui, _)| *ui == ui_key)
            .map(|(_, backend)| *backend)
    }

    pub fn entries(&self) -> &'static [(&'static str, &'static str)] {
        self.entries
    }
}

// ============================================================================
// Remapping
// ============================================================================

/// Cutoff date for the stale filter: `today` minus six months, `YYYY-MM-DD`.
///
/// Month subtraction clamps to the end of a shorter month
/// (2020-08-31 gives 2020-02-29).
pub fn stale_cutoff(today: NaiveDate) -> String {
    today
        .checked_sub_months(Months::new(STALE_CUTOFF_MONTHS))
        .unwrap_or(today)
        .format("%Y-%m-%d")
        .to_string()
}

/// Rename every recognized key of `filters` through `table`.
///
/// Unrecognized keys are dropped and absent keys stay absent. A truthy
/// `stale` value is always replaced by [`stale_cutoff`] of `today`; the value
/// the caller supplied only decides whether the filter is present.
pub fn remap(filters: &FilterState, table: &TranslationTable, today: NaiveDate) -> BackendQuery {
    let mut query = BackendQuery::default();
    for (ui_key, value) in filters.iter() {
        let Some(backend_key) = table.backend_name(ui_key) else {
            continue;
        };
        let value = if ui_key == STALE_KEY && value.is_truthy() {
            FilterValue::Text(stale_cutoff(today))
        } else {
            value.clone()
        };
        query.insert(backend_key, value);
    }
    query
}
