//! Aggregation views - grouped sums over the filtered record set
//!
//! Computes derived aggregates without modifying record data.
//!
//! Global invariants enforced:
//! - Aggregates are strictly derived (never stored, always computed)
//! - Group order is first-seen order, except the year series (ascending)
//! - Percentages never divide by zero

use crate::record::Record;
use crate::trends::{compute_change_rates, ChangeRatePoint};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Headline totals for the summary cards
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SummaryTotals {
    pub schools: f64,
    pub teachers: f64,
    pub total_students: f64,
    pub male_students: f64,
    pub female_students: f64,
    /// Male share of all students, rounded to one decimal; 0 when there are no students
    pub male_percent: f64,
}

/// Male/female student split
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GenderSplit {
    pub male: f64,
    pub female: f64,
}

/// One group of a group-by-key sum
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupTotal {
    pub key: String,
    pub value: f64,
}

/// Per-year student sums
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct YearTotals {
    pub year: i64,
    pub male: f64,
    pub female: f64,
    pub total: f64,
}

/// What to group records by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    Category,
    Type,
    /// `"<type> - <category>"`
    TypeCategory,
}

impl GroupKey {
    fn of(self, record: &Record) -> String {
        match self {
            GroupKey::Category => record.category.clone(),
            GroupKey::Type => record.install_type.clone(),
            GroupKey::TypeCategory => record.type_category_key(),
        }
    }
}

/// Which quantity to sum within each group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupValue {
    TotalStudent,
    Teacher,
}

impl GroupValue {
    fn of(self, record: &Record) -> f64 {
        match self {
            GroupValue::TotalStudent => record.total_student,
            GroupValue::Teacher => record.teacher,
        }
    }
}

/// All views the dashboard renders, computed from one record set
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DashboardAggregates {
    pub summary: SummaryTotals,
    pub gender: GenderSplit,
    pub students_by_category: Vec<GroupTotal>,
    pub students_by_type: Vec<GroupTotal>,
    pub year_trend: Vec<YearTotals>,
    pub change_rates: Vec<ChangeRatePoint>,
    pub teachers_by_type_category: Vec<GroupTotal>,
}

impl DashboardAggregates {
    /// Compute every view for `records`
    pub fn compute(records: &[Record]) -> Self {
        let year_trend = compute_year_series(records);
        let change_rates = compute_change_rates(&year_trend);

        DashboardAggregates {
            summary: compute_summary(records),
            gender: compute_gender_split(records),
            students_by_category: group_sum(records, GroupKey::Category, GroupValue::TotalStudent),
            students_by_type: group_sum(records, GroupKey::Type, GroupValue::TotalStudent),
            year_trend,
            change_rates,
            teachers_by_type_category: group_sum(
                records,
                GroupKey::TypeCategory,
                GroupValue::Teacher,
            ),
        }
    }
}

/// Compute the summary card totals
pub fn compute_summary(records: &[Record]) -> SummaryTotals {
    let mut totals = SummaryTotals::default();
    for record in records {
        totals.schools += record.school;
        totals.teachers += record.teacher;
        totals.total_students += record.total_student;
        totals.male_students += record.male_student;
        totals.female_students += record.female_student;
    }
    totals.male_percent = percent_one_decimal(totals.male_students, totals.total_students);
    totals
}

/// `part / whole * 100`, rounded to one decimal place; 0 when `whole` is 0
pub fn percent_one_decimal(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        (part / whole * 1000.0).round() / 10.0
    } else {
        0.0
    }
}

/// Sum male and female students across all records
pub fn compute_gender_split(records: &[Record]) -> GenderSplit {
    records.iter().fold(GenderSplit::default(), |mut split, r| {
        split.male += r.male_student;
        split.female += r.female_student;
        split
    })
}

/// Sum `value` per `key`, groups in first-seen order
pub fn group_sum(records: &[Record], key: GroupKey, value: GroupValue) -> Vec<GroupTotal> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<GroupTotal> = Vec::new();

    for record in records {
        let group_key = key.of(record);
        match index.get(&group_key) {
            Some(&i) => groups[i].value += value.of(record),
            None => {
                index.insert(group_key.clone(), groups.len());
                groups.push(GroupTotal {
                    key: group_key,
                    value: value.of(record),
                });
            }
        }
    }

    groups
}

/// Per-year male/female/total sums, years ascending.
///
/// Records without a year are not part of any year.
pub fn compute_year_series(records: &[Record]) -> Vec<YearTotals> {
    let mut by_year: BTreeMap<i64, YearTotals> = BTreeMap::new();

    for record in records {
        let Some(year) = record.year else {
            continue;
        };
        let entry = by_year.entry(year).or_insert_with(|| YearTotals {
            year,
            ..Default::default()
        });
        entry.male += record.male_student;
        entry.female += record.female_student;
        entry.total += record.total_student;
    }

    by_year.into_values().collect()
}
