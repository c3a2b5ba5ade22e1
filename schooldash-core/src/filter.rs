//! Filter engine - dropdown filters and free-text search
//!
//! Invariants enforced:
//! - Inputs are never mutated; every call returns a fresh Vec
//! - Relative record order is preserved
//! - An inactive filter (unset or empty) always passes

use crate::record::Record;
use serde::{Deserialize, Serialize};
use std::num::ParseIntError;

/// Active filter selections
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i64>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub install_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Free-text term, matched case-insensitively against every field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

/// A dropdown a filter-change event refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterField {
    Year,
    Type,
    Category,
}

impl FilterState {
    /// True when no filter and no search term is active
    pub fn is_empty(&self) -> bool {
        self.year.is_none()
            && active(&self.install_type).is_none()
            && active(&self.category).is_none()
            && active(&self.search).is_none()
    }

    /// Apply a dropdown change. An empty value clears the filter.
    ///
    /// A non-empty year that is not an integer is an error and leaves the
    /// state unchanged.
    pub fn set(&mut self, field: FilterField, value: &str) -> Result<(), ParseIntError> {
        let value = value.trim();
        let value = (!value.is_empty()).then(|| value.to_string());
        match field {
            FilterField::Year => self.year = value.map(|v| v.parse()).transpose()?,
            FilterField::Type => self.install_type = value,
            FilterField::Category => self.category = value,
        }
        Ok(())
    }

    /// Check the three exact-match filters against one record
    pub fn matches_dropdowns(&self, record: &Record) -> bool {
        self.year.map_or(true, |y| record.year == Some(y))
            && active(&self.install_type).map_or(true, |t| record.install_type == t)
            && active(&self.category).map_or(true, |c| record.category == c)
    }

    /// Check dropdown filters AND the search term against one record
    pub fn matches(&self, record: &Record) -> bool {
        self.matches_dropdowns(record)
            && active(&self.search).map_or(true, |term| matches_term(record, &term.to_lowercase()))
    }
}

/// Treat `Some("")` the same as `None`
fn active(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// `term` must already be lowercased
fn matches_term(record: &Record, term: &str) -> bool {
    record
        .field_strings()
        .iter()
        .any(|field| field.to_lowercase().contains(term))
}

/// Records passing the year, type and category filters.
///
/// The search term in `state` is ignored here; see [`apply`].
pub fn apply_filters(records: &[Record], state: &FilterState) -> Vec<Record> {
    records
        .iter()
        .filter(|r| state.matches_dropdowns(r))
        .cloned()
        .collect()
}

/// Records where any field's string form contains `term`, ignoring case.
/// An empty term matches everything.
pub fn apply_search(records: &[Record], term: &str) -> Vec<Record> {
    let term = term.to_lowercase();
    records
        .iter()
        .filter(|r| term.is_empty() || matches_term(r, &term))
        .cloned()
        .collect()
}

/// Records passing every active predicate: dropdowns AND search
pub fn apply(records: &[Record], state: &FilterState) -> Vec<Record> {
    records
        .iter()
        .filter(|r| state.matches(r))
        .cloned()
        .collect()
}

/// Option lists for the filter dropdowns
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterOptions {
    /// Distinct years, ascending
    pub years: Vec<i64>,
    /// Distinct installation types, first-seen order
    pub types: Vec<String>,
    /// Distinct categories, first-seen order
    pub categories: Vec<String>,
}

impl FilterOptions {
    /// Derive the option lists from the canonical record set
    pub fn from_records(records: &[Record]) -> Self {
        let mut years: Vec<i64> = records.iter().filter_map(|r| r.year).collect();
        years.sort_unstable();
        years.dedup();

        let mut types: Vec<String> = Vec::new();
        let mut categories: Vec<String> = Vec::new();
        for record in records {
            if !types.contains(&record.install_type) {
                types.push(record.install_type.clone());
            }
            if !categories.contains(&record.category) {
                categories.push(record.category.clone());
            }
        }

        FilterOptions {
            years,
            types,
            categories,
        }
    }
}
