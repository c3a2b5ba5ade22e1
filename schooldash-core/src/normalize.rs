//! Record normalizer - raw dataset entries to canonical records
//!
//! Input entries are loosely shaped JSON objects:
//!
//! ```text
//! { "year": 2020, "school": 5, "type": "公立", "category": "小学校",
//!   "population": { "teacher": 30,
//!                   "sutudent": { "data": [ { "type": "男", "population": 100 },
//!                                           { "type": "女", "population": null } ] } } }
//! ```
//!
//! Invariants enforced:
//! - Entries whose type AND category are both the total label are dropped
//!   (they duplicate the other rows)
//! - Null, missing, negative or non-numeric counts become 0
//! - `total_student` is recomputed, never read from input
//! - Output order follows input order

use crate::error::{json_kind, LoadError};
use crate::record::Record;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// Label values the normalizer matches against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentinels {
    /// Marks an aggregate "total" row in both type and category
    pub total: String,
    /// Gender type of the male student breakdown entry
    pub male: String,
    /// Gender type of the female student breakdown entry
    pub female: String,
}

impl Default for Sentinels {
    fn default() -> Self {
        Sentinels {
            total: "合計".to_string(),
            male: "男".to_string(),
            female: "女".to_string(),
        }
    }
}

/// Student breakdown keys, in lookup order. The first is the spelling used by
/// the published datasets.
const STUDENT_KEYS: &[&str] = &["sutudent", "student"];

/// Parse dataset text and normalize it.
///
/// A syntactically valid empty array yields `Ok(vec![])`; deciding whether
/// that is a usable dataset is up to the caller.
pub fn parse_dataset(text: &str, sentinels: &Sentinels) -> Result<Vec<Record>, LoadError> {
    let value: Value = serde_json::from_str(text)?;
    normalize_value(&value, sentinels)
}

/// Normalize an already parsed JSON document
pub fn normalize_value(value: &Value, sentinels: &Sentinels) -> Result<Vec<Record>, LoadError> {
    match value {
        Value::Array(entries) => Ok(normalize_entries(entries, sentinels)),
        other => Err(LoadError::Format(json_kind(other).to_string())),
    }
}

/// Normalize a sequence of raw entries, dropping duplicate total rows
pub fn normalize_entries(entries: &[Value], sentinels: &Sentinels) -> Vec<Record> {
    let records: Vec<Record> = entries
        .iter()
        .enumerate()
        .filter(|(_, entry)| !is_duplicate_total(entry, sentinels))
        .map(|(index, entry)| normalize_entry(index, entry, sentinels))
        .collect();

    debug!(
        input = entries.len(),
        output = records.len(),
        dropped = entries.len() - records.len(),
        "normalized dataset entries"
    );

    records
}

/// True when both `type` and `category` equal the total label
pub fn is_duplicate_total(entry: &Value, sentinels: &Sentinels) -> bool {
    let is_total =
        |key: &str| entry.get(key).and_then(Value::as_str) == Some(sentinels.total.as_str());
    is_total("type") && is_total("category")
}

fn normalize_entry(index: usize, entry: &Value, sentinels: &Sentinels) -> Record {
    if !entry.is_object() {
        warn!(index, kind = json_kind(entry), "dataset entry is not an object");
    }

    let population = entry.get("population");
    let male = student_count(population, &sentinels.male, index);
    let female = student_count(population, &sentinels.female, index);
    let teacher = count_value(population.and_then(|p| p.get("teacher")), "teacher", index);

    Record::new(
        year_value(entry.get("year"), index),
        count_value(entry.get("school"), "school", index),
        label_value(entry.get("type")),
        label_value(entry.get("category")),
        teacher,
        male,
        female,
    )
}

/// Locate the breakdown entry whose `type` is `gender` and read its count
fn student_count(population: Option<&Value>, gender: &str, index: usize) -> f64 {
    let breakdown = population.and_then(|p| {
        STUDENT_KEYS
            .iter()
            .find_map(|key| p.get(*key))
            .and_then(|s| s.get("data"))
            .and_then(Value::as_array)
    });

    let located = breakdown.and_then(|data| {
        data.iter()
            .find(|d| d.get("type").and_then(Value::as_str) == Some(gender))
    });

    count_value(located.and_then(|d| d.get("population")), gender, index)
}

/// Read a non-negative count, falling back to 0
fn count_value(value: Option<&Value>, field: &str, index: usize) -> f64 {
    match value {
        None | Some(Value::Null) => 0.0,
        Some(Value::Number(n)) => match n.as_f64() {
            Some(v) if v.is_finite() && v >= 0.0 => v,
            _ => {
                warn!(index, field, value = %n, "count is negative or out of range, using 0");
                0.0
            }
        },
        Some(other) => {
            warn!(index, field, kind = json_kind(other), "count is not a number, using 0");
            0.0
        }
    }
}

/// Read an integer year; integral numbers and numeric strings are accepted
fn year_value(value: Option<&Value>, index: usize) -> Option<i64> {
    let year = match value? {
        Value::Number(n) => n.as_i64().or_else(|| {
            // i64::MIN and i64::MAX + 1 are both exact powers of two as f64
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        Value::Null => return None,
        _ => None,
    };
    if year.is_none() {
        warn!(index, "year is not a usable integer, leaving it unset");
    }
    year
}

/// Labels are strings; numbers are kept in their textual form
fn label_value(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}
