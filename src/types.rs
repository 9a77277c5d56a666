//! Core data types shared across the pipeline
//!
//! The upstream APIs are loose about encodings: numbers arrive as strings,
//! list fields arrive as JSON-encoded strings, ids arrive as numbers. The
//! deserializers in this module accept every variant seen in the wild.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Trade side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// +1 for buys, -1 for sells
    pub fn sign(&self) -> f64 {
        match self {
            Side::Buy => 1.0,
            Side::Sell => -1.0,
        }
    }

    pub fn opposite(&self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// A Gamma API event: a group of related markets
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(default, deserialize_with = "de_id")]
    pub id: String,
    #[serde(default, deserialize_with = "de_null_default")]
    pub title: String,
    #[serde(default, deserialize_with = "de_null_default")]
    pub slug: String,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "de_reported")]
    pub volume: Reported,
    #[serde(default, deserialize_with = "de_markets")]
    pub markets: Vec<Market>,
}

impl Event {
    /// Category label, `None` when missing or blank
    pub fn category_label(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    /// Top-level volume. Only a missing or null value falls back to the first
    /// market's volume; an unparseable one yields `None`.
    pub fn effective_volume(&self) -> Option<f64> {
        match self.volume {
            Reported::Value(v) => Some(v),
            Reported::Invalid => None,
            Reported::Missing => self.markets.first().and_then(Market::reported_volume),
        }
    }
}

/// A numeric field that keeps apart "not sent" and "sent but unreadable"
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Reported {
    /// Absent or null
    #[default]
    Missing,
    /// Present but not a finite number
    Invalid,
    Value(f64),
}

impl Reported {
    pub fn value(&self) -> Option<f64> {
        match self {
            Reported::Value(v) => Some(*v),
            _ => None,
        }
    }
}

impl Serialize for Reported {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.value().serialize(serializer)
    }
}

/// A binary (or multi-outcome) market inside an event
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Market {
    #[serde(default, deserialize_with = "de_id")]
    pub id: String,
    #[serde(default, deserialize_with = "de_null_default")]
    pub question: String,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub condition_id: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub end_date: Option<String>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub volume_num: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub volume: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub liquidity_num: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub liquidity: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub spread: Option<f64>,
    #[serde(default, deserialize_with = "de_string_list")]
    pub outcomes: Vec<String>,
    #[serde(default, deserialize_with = "de_string_list")]
    pub outcome_prices: Vec<String>,
    #[serde(default, deserialize_with = "de_string_list")]
    pub clob_token_ids: Vec<String>,
    #[serde(default, deserialize_with = "de_null_default")]
    pub active: bool,
    #[serde(default, deserialize_with = "de_null_default")]
    pub closed: bool,
}

impl Market {
    /// `volumeNum`, defaulting to zero, used to rank markets for download
    pub fn volume_or_zero(&self) -> f64 {
        self.volume_num.unwrap_or(0.0)
    }

    /// `volumeNum` when non-zero, otherwise `volume`
    pub fn reported_volume(&self) -> Option<f64> {
        match (self.volume_num, self.volume) {
            (Some(v), _) if v != 0.0 => Some(v),
            (_, Some(v)) => Some(v),
            _ => None,
        }
    }

    pub fn reported_liquidity(&self) -> Option<f64> {
        self.liquidity_num.or(self.liquidity)
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_date.as_deref().and_then(parse_iso_datetime)
    }

    /// Prices of every outcome named "Yes" (case-insensitive), restricted to [0, 1]
    pub fn yes_prices(&self) -> Vec<f64> {
        self.outcomes
            .iter()
            .enumerate()
            .filter(|(_, o)| o.trim().eq_ignore_ascii_case("yes"))
            .filter_map(|(i, _)| self.outcome_prices.get(i))
            .filter_map(|p| p.trim().parse::<f64>().ok())
            .filter(|p| (0.0..=1.0).contains(p))
            .collect()
    }

    pub fn yes_price(&self) -> Option<f64> {
        self.yes_prices().into_iter().next()
    }

    /// Question and description joined for text models
    pub fn text(&self) -> String {
        match &self.description {
            Some(d) if !d.is_empty() => format!("{} {}", self.question, d),
            _ => self.question.clone(),
        }
    }
}

/// A taker trade from the data API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    #[serde(default, deserialize_with = "de_null_default")]
    pub proxy_wallet: String,
    pub side: Side,
    #[serde(default, deserialize_with = "de_id")]
    pub asset: String,
    #[serde(default, deserialize_with = "de_null_default")]
    pub condition_id: String,
    pub size: Decimal,
    pub price: Decimal,
    #[serde(deserialize_with = "de_i64")]
    pub timestamp: i64,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub outcome: Option<String>,
    #[serde(default)]
    pub outcome_index: Option<u32>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub transaction_hash: Option<String>,
}

impl Trade {
    /// Cash value of the trade
    pub fn notional(&self) -> Decimal {
        self.size * self.price
    }

    pub fn notional_f64(&self) -> f64 {
        self.notional().to_f64().unwrap_or(0.0)
    }

    pub fn size_f64(&self) -> f64 {
        self.size.to_f64().unwrap_or(0.0)
    }

    pub fn price_f64(&self) -> f64 {
        self.price.to_f64().unwrap_or(0.0)
    }

    pub fn time(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.timestamp, 0).single()
    }
}

/// One point of a CLOB price history
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Unix seconds
    pub t: i64,
    /// Price in [0, 1]
    pub p: f64,
}

/// CLOB `prices-history` response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceHistory {
    #[serde(default, deserialize_with = "de_null_default")]
    pub history: Vec<PricePoint>,
}

impl PriceHistory {
    pub fn new(mut history: Vec<PricePoint>) -> Self {
        history.sort_by_key(|p| p.t);
        Self { history }
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// Last known price at or before `ts`; expects the history sorted by time
    pub fn price_at(&self, ts: i64) -> Option<f64> {
        let idx = self.history.partition_point(|p| p.t <= ts);
        if idx == 0 {
            None
        } else {
            Some(self.history[idx - 1].p)
        }
    }

    /// Price change from `from` to `to`, when both ends are covered
    pub fn change_between(&self, from: i64, to: i64) -> Option<f64> {
        Some(self.price_at(to)? - self.price_at(from)?)
    }

    /// Like [`change_between`](Self::change_between) but only when the history
    /// spans the whole interval
    pub fn covered_change(&self, from: i64, to: i64) -> Option<f64> {
        if self.first_time()? > from || self.last_time()? < to {
            return None;
        }
        self.change_between(from, to)
    }

    pub fn first_time(&self) -> Option<i64> {
        self.history.first().map(|p| p.t)
    }

    pub fn last_time(&self) -> Option<i64> {
        self.history.last().map(|p| p.t)
    }
}

/// Normalized market category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Politics,
    Sports,
    Crypto,
    Economics,
    Entertainment,
    SciTech,
    World,
    Other,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Politics,
        Category::Sports,
        Category::Crypto,
        Category::Economics,
        Category::Entertainment,
        Category::SciTech,
        Category::World,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Politics => "Politics",
            Category::Sports => "Sports",
            Category::Crypto => "Crypto",
            Category::Economics => "Economics",
            Category::Entertainment => "Entertainment",
            Category::SciTech => "Science & Tech",
            Category::World => "World",
            Category::Other => "Other",
        }
    }

    pub fn index(&self) -> usize {
        Category::ALL.iter().position(|c| c == self).unwrap_or(0)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a binary market's payoff can be hedged with an external instrument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionClass {
    /// No exogenous reference price replicates the payoff
    Naked,
    /// Payoff references a tradeable external asset (spot, futures, rates)
    Replicable,
}

impl fmt::Display for OptionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionClass::Naked => f.write_str("naked"),
            OptionClass::Replicable => f.write_str("replicable"),
        }
    }
}

/// Parse an ISO-8601 timestamp into UTC; naive timestamps are taken as UTC
pub fn parse_iso_datetime(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%:z"] {
        if let Ok(dt) = DateTime::parse_from_str(value, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

// ---------------------------------------------------------------------------
// Lenient deserializers
// ---------------------------------------------------------------------------

fn value_to_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn value_to_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn de_opt_f64<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(deserializer)?;
    Ok(value_to_f64(&v).filter(|x| x.is_finite()))
}

/// Null reads as the type's default
fn de_null_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn de_reported<'de, D>(deserializer: D) -> std::result::Result<Reported, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(deserializer)?;
    if v.is_null() {
        return Ok(Reported::Missing);
    }
    Ok(value_to_f64(&v)
        .filter(|x| x.is_finite())
        .map_or(Reported::Invalid, Reported::Value))
}

fn de_opt_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(deserializer)?;
    Ok(value_to_string(&v))
}

fn de_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(deserializer)?;
    Ok(value_to_string(&v).unwrap_or_default())
}

fn de_i64<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(deserializer)?;
    match &v {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .ok_or_else(|| serde::de::Error::custom("timestamp out of range")),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|e| serde::de::Error::custom(format!("invalid timestamp {:?}: {}", s, e))),
        other => Err(serde::de::Error::custom(format!("invalid timestamp: {}", other))),
    }
}

/// Accepts `["a","b"]`, `"[\"a\",\"b\"]"`, arrays of numbers, or null
fn de_string_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(deserializer)?;
    Ok(value_to_string_list(&v))
}

pub(crate) fn value_to_string_list(v: &Value) -> Vec<String> {
    match v {
        Value::Array(items) => items.iter().filter_map(value_to_string).collect(),
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(inner @ Value::Array(_)) => value_to_string_list(&inner),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// Keeps every market that parses; non-object entries are dropped
fn de_markets<'de, D>(deserializer: D) -> std::result::Result<Vec<Market>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(deserializer)?;
    match v {
        Value::Array(items) => Ok(items
            .into_iter()
            .filter(Value::is_object)
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect()),
        _ => Ok(Vec::new()),
    }
}
