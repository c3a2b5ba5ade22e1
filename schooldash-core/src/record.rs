//! Canonical enrollment record
//!
//! Records are produced only by the normalizer and are immutable afterwards.
//! `total_student` is always `male_student + female_student`.

use serde::{Deserialize, Serialize};

/// One normalized row of school statistics
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Record {
    /// Fiscal year; `None` when the source entry had no usable year
    pub year: Option<i64>,
    /// Number of schools (a count, summed in aggregates)
    pub school: f64,
    /// Installation type (public, private, ...)
    #[serde(rename = "type")]
    pub install_type: String,
    /// School category (elementary, junior high, ...)
    pub category: String,
    pub teacher: f64,
    pub male_student: f64,
    pub female_student: f64,
    pub total_student: f64,
}

impl Record {
    /// Build a record, deriving `total_student` from the gendered counts
    pub fn new(
        year: Option<i64>,
        school: f64,
        install_type: impl Into<String>,
        category: impl Into<String>,
        teacher: f64,
        male_student: f64,
        female_student: f64,
    ) -> Self {
        Record {
            year,
            school,
            install_type: install_type.into(),
            category: category.into(),
            teacher,
            male_student,
            female_student,
            total_student: male_student + female_student,
        }
    }

    /// String form of every field, in declaration order.
    ///
    /// Free-text search matches against these. Numbers use their shortest
    /// decimal form (`100`, `12.5`); a missing year is the empty string.
    pub fn field_strings(&self) -> [String; 8] {
        [
            self.year.map(|y| y.to_string()).unwrap_or_default(),
            format_number(self.school),
            self.install_type.clone(),
            self.category.clone(),
            format_number(self.teacher),
            format_number(self.male_student),
            format_number(self.female_student),
            format_number(self.total_student),
        ]
    }

    /// Composite "type - category" key for the teacher-count breakdown
    pub fn type_category_key(&self) -> String {
        format!("{} - {}", self.install_type, self.category)
    }
}

/// Format a count without a trailing `.0` for whole numbers
pub fn format_number(value: f64) -> String {
    format!("{}", value)
}
