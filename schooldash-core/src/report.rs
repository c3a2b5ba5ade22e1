//! Reporting and output generation
//!
//! Presentation adapters only: every number shown here was computed by the
//! aggregator or paginator.
//!
//! Global invariants enforced:
//! - Deterministic output ordering
//! - Byte-for-byte identical output across runs

use crate::aggregates::GroupTotal;
use crate::config::ResolvedConfig;
use crate::session::DashboardView;
use anyhow::{Context, Result};

/// Render a dashboard view as JSON
pub fn render_json(view: &DashboardView) -> Result<String> {
    serde_json::to_string_pretty(view).context("failed to serialize dashboard view to JSON")
}

/// Render a dashboard view as plain text
pub fn render_text(view: &DashboardView, config: &ResolvedConfig) -> String {
    let mut output = String::new();
    let aggregates = &view.aggregates;
    let summary = &aggregates.summary;

    // Summary cards
    output.push_str("SUMMARY\n");
    output.push_str(&format!(
        "  {:<10} {}\n",
        "Schools",
        format_count(summary.schools)
    ));
    output.push_str(&format!(
        "  {:<10} {}\n",
        "Teachers",
        format_count(summary.teachers)
    ));
    output.push_str(&format!(
        "  {:<10} {}\n",
        "Students",
        format_count(summary.total_students)
    ));
    output.push_str(&format!(
        "  {:<10} {} {:.1}%\n",
        "Ratio", config.sentinels.male, summary.male_percent
    ));
    output.push('\n');

    output.push_str("STUDENTS BY GENDER\n");
    output.push_str(&format!(
        "  {:<20} {:>12}\n",
        config.sentinels.male,
        format_count(aggregates.gender.male)
    ));
    output.push_str(&format!(
        "  {:<20} {:>12}\n",
        config.sentinels.female,
        format_count(aggregates.gender.female)
    ));
    output.push('\n');

    render_groups(&mut output, "STUDENTS BY CATEGORY", &aggregates.students_by_category);
    render_groups(&mut output, "STUDENTS BY TYPE", &aggregates.students_by_type);

    if !aggregates.year_trend.is_empty() {
        output.push_str("YEAR TREND\n");
        output.push_str(&format!(
            "  {:<12} {:>12} {:>12}\n",
            "YEAR", config.sentinels.male, config.sentinels.female
        ));
        for point in &aggregates.year_trend {
            output.push_str(&format!(
                "  {:<12} {:>12} {:>12}\n",
                config.year_label(point.year),
                format_count(point.male),
                format_count(point.female)
            ));
        }
        output.push('\n');
    }

    if !aggregates.change_rates.is_empty() {
        output.push_str("YEAR-OVER-YEAR CHANGE\n");
        output.push_str(&format!(
            "  {:<12} {:>10} {:>10} {:>10}\n",
            "YEARS", config.sentinels.male, config.sentinels.female, "TOTAL"
        ));
        for point in &aggregates.change_rates {
            output.push_str(&format!(
                "  {:<12} {:>10} {:>10} {:>10}\n",
                point.label,
                point.male.display(),
                point.female.display(),
                point.total.display()
            ));
        }
        output.push('\n');
    }

    render_groups(
        &mut output,
        "TEACHERS BY TYPE AND CATEGORY",
        &aggregates.teachers_by_type_category,
    );

    // Table page
    output.push_str(&format!(
        "RECORDS (page {}, {} matching)\n",
        view.page.info(),
        view.page.total_records
    ));
    output.push_str(&format!(
        "  {:<10} {:<8} {:<10} {:>8} {:>8} {:>10} {:>10} {:>10}\n",
        "YEAR",
        "TYPE",
        "CATEGORY",
        "SCHOOLS",
        "TEACHERS",
        config.sentinels.male,
        config.sentinels.female,
        "TOTAL"
    ));
    for record in &view.page.records {
        let year = record
            .year
            .map(|y| config.year_label(y))
            .unwrap_or_else(|| "-".to_string());
        output.push_str(&format!(
            "  {:<10} {:<8} {:<10} {:>8} {:>8} {:>10} {:>10} {:>10}\n",
            year,
            truncate_or_pad(&record.install_type, 8),
            truncate_or_pad(&record.category, 10),
            crate::record::format_number(record.school),
            crate::record::format_number(record.teacher),
            format_count(record.male_student),
            format_count(record.female_student),
            format_count(record.total_student)
        ));
    }

    output
}

fn render_groups(output: &mut String, title: &str, groups: &[GroupTotal]) {
    if groups.is_empty() {
        return;
    }
    output.push_str(title);
    output.push('\n');
    for group in groups {
        output.push_str(&format!(
            "  {:<20} {:>12}\n",
            truncate_or_pad(&group.key, 20),
            format_count(group.value)
        ));
    }
    output.push('\n');
}

/// Format a count with thousands separators (`1,234,567`).
///
/// Fractional values keep up to three decimals.
pub fn format_count(value: f64) -> String {
    let negative = value < 0.0;
    let rounded = (value.abs() * 1000.0).round() / 1000.0;
    let whole = rounded.trunc() as u64;
    let fraction = rounded - rounded.trunc();

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if fraction > 0.0 {
        let fraction_str = format!("{:.3}", fraction);
        grouped.push_str(fraction_str.trim_start_matches('0').trim_end_matches('0'));
    }

    if negative {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Truncate or pad string to a fixed number of characters
fn truncate_or_pad(s: &str, width: usize) -> String {
    let len = s.chars().count();
    if len > width {
        let kept: String = s.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        format!("{:<width$}", s, width = width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::DashboardSession;
    use crate::trends::ChangeRate;

    fn view() -> (DashboardView, ResolvedConfig) {
        let config = ResolvedConfig::defaults().unwrap();
        let mut session = DashboardSession::new(config.clone());
        session
            .load_str(
                r#"[
                {"year": 2020, "school": 5, "type": "公立", "category": "小学校",
                 "population": {"teacher": 30, "sutudent": {"data": [
                    {"type": "男", "population": 1000}, {"type": "女", "population": 500}]}}},
                {"year": 2021, "school": 5, "type": "公立", "category": "小学校",
                 "population": {"teacher": 30, "sutudent": {"data": [
                    {"type": "男", "population": 0}, {"type": "女", "population": 600}]}}}
            ]"#,
            )
            .unwrap();
        (session.view().unwrap(), config)
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0.0), "0");
        assert_eq!(format_count(999.0), "999");
        assert_eq!(format_count(1000.0), "1,000");
        assert_eq!(format_count(1234567.0), "1,234,567");
        assert_eq!(format_count(12.5), "12.5");
        assert_eq!(format_count(-4200.0), "-4,200");
    }

    #[test]
    fn test_render_text_sections() {
        let (view, config) = view();
        let text = render_text(&view, &config);
        assert!(text.contains("SUMMARY"));
        assert!(text.contains("Students   2,100"));
        assert!(text.contains("2020年度"));
        assert!(text.contains("2020→2021"));
        assert!(text.contains("公立 - 小学校"));
        assert!(text.contains("RECORDS (page 1 / 1, 2 matching)"));
    }

    #[test]
    fn test_render_text_undefined_rate() {
        let (mut view, config) = view();
        let point = &mut view.aggregates.change_rates[0];
        point.male = ChangeRate::Undefined;
        point.female = ChangeRate::Undefined;
        point.total = ChangeRate::Undefined;
        let text = render_text(&view, &config);
        let line = text
            .lines()
            .find(|l| l.trim_start().starts_with("2020→2021"))
            .unwrap();
        assert!(!line.contains('%'));
        assert_eq!(line.matches(" -").count(), 3);
    }

    #[test]
    fn test_render_json_roundtrip_fields() {
        let (view, _) = view();
        let json = render_json(&view).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["loaded_records"], 2);
        assert_eq!(value["aggregates"]["summary"]["total_students"], 2100.0);
        assert_eq!(value["page"]["records"][0]["type"], "公立");
        assert_eq!(value["page"]["records"][0]["male_student"], 1000.0);
        assert_eq!(value["page"]["total_pages"], 1);
        assert_eq!(value["aggregates"]["year_trend"][1]["female"], 600.0);
        assert_eq!(value["aggregates"]["change_rates"][0]["prev_year"], 2020);
        assert_eq!(value["options"]["years"][0], 2020);
    }

    #[test]
    fn test_render_is_deterministic() {
        let (view, config) = view();
        assert_eq!(render_text(&view, &config), render_text(&view, &config));
        assert_eq!(render_json(&view).unwrap(), render_json(&view).unwrap());
    }

    #[test]
    fn test_truncate_or_pad_counts_chars() {
        assert_eq!(truncate_or_pad("小学校", 5), "小学校  ");
        assert_eq!(truncate_or_pad("abcdefgh", 6), "abc...");
    }
}
