//! HTML report generation
//!
//! Generates a self-contained HTML dashboard with embedded CSS. Charts are
//! drawn as CSS bars, so the report works offline and needs no JavaScript.

use crate::aggregates::GroupTotal;
use crate::config::ResolvedConfig;
use crate::report::format_count;
use crate::session::DashboardView;
use crate::trends::ChangeRate;

/// Render a dashboard view as an HTML page
pub fn render_html_dashboard(view: &DashboardView, config: &ResolvedConfig) -> String {
    let aggregates = &view.aggregates;
    let male = &config.sentinels.male;
    let female = &config.sentinels.female;

    let gender_groups = vec![
        GroupTotal {
            key: male.clone(),
            value: aggregates.gender.male,
        },
        GroupTotal {
            key: female.clone(),
            value: aggregates.gender.female,
        },
    ];

    format!(
        r#"<!DOCTYPE html>
<html lang="ja">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>School Statistics Dashboard</title>
    <style>{css}</style>
</head>
<body>
    <div class="container">
        {header}
        {summary}
        <div class="charts">
            {gender}
            {category}
            {install_type}
        </div>
        {trend}
        {change}
        {teachers}
        {table}
        {footer}
    </div>
</body>
</html>"#,
        css = inline_css(),
        header = render_header(view),
        summary = render_summary(view, config),
        gender = render_bar_chart("性別生徒数", &gender_groups),
        category = render_bar_chart("学校種別別生徒数", &aggregates.students_by_category),
        install_type = render_bar_chart("設置種別別生徒数", &aggregates.students_by_type),
        trend = render_year_trend(view, config),
        change = render_change_rates(view, config),
        teachers = render_bar_chart("教員数", &aggregates.teachers_by_type_category),
        table = render_table(view, config),
        footer = render_footer(),
    )
}

/// Inline CSS styles
fn inline_css() -> &'static str {
    r#"
* {
    box-sizing: border-box;
    margin: 0;
    padding: 0;
}

body {
    font-family: system-ui, -apple-system, 'Segoe UI', sans-serif;
    line-height: 1.6;
    color: #2d3748;
    background: #fff7fb;
}

.container {
    max-width: 1200px;
    margin: 0 auto;
    padding: 2rem;
}

header {
    margin-bottom: 2rem;
    padding-bottom: 1rem;
    border-bottom: 2px solid #ffd9ec;
}

header h1 {
    font-size: 1.75rem;
    font-weight: 700;
}

.status {
    color: #48bb78;
    font-size: 0.875rem;
}

.filters {
    color: #718096;
    font-size: 0.875rem;
}

.summary {
    display: grid;
    grid-template-columns: repeat(auto-fit, minmax(180px, 1fr));
    gap: 1rem;
    margin-bottom: 2rem;
}

.card {
    background: #ffffff;
    border-radius: 0.75rem;
    padding: 1rem 1.25rem;
    box-shadow: 0 1px 3px rgba(0, 0, 0, 0.08);
}

.card .label {
    color: #718096;
    font-size: 0.8rem;
}

.card .value {
    font-size: 1.5rem;
    font-weight: 700;
}

.charts {
    display: grid;
    grid-template-columns: repeat(auto-fit, minmax(320px, 1fr));
    gap: 1rem;
}

.section {
    background: #ffffff;
    border-radius: 0.75rem;
    padding: 1.25rem;
    margin-bottom: 1.5rem;
    box-shadow: 0 1px 3px rgba(0, 0, 0, 0.08);
}

.section h2 {
    font-size: 1.1rem;
    margin-bottom: 0.75rem;
}

.bar-row {
    display: grid;
    grid-template-columns: 10rem 1fr 6rem;
    align-items: center;
    gap: 0.5rem;
    font-size: 0.85rem;
    margin-bottom: 0.35rem;
}

.bar-track {
    background: #f7fafc;
    border-radius: 0.25rem;
    height: 0.9rem;
}

.bar {
    background: #ffb3d9;
    border-radius: 0.25rem;
    height: 100%;
}

.bar.female {
    background: #b3e5fc;
}

.num {
    text-align: right;
    font-variant-numeric: tabular-nums;
}

.negative {
    color: #e53e3e;
}

table {
    width: 100%;
    border-collapse: collapse;
    font-size: 0.85rem;
}

th, td {
    padding: 0.4rem 0.6rem;
    border-bottom: 1px solid #edf2f7;
    text-align: left;
}

th {
    background: #fdf2f8;
}

.page-info {
    margin-top: 0.75rem;
    color: #718096;
    font-size: 0.85rem;
}

footer {
    margin-top: 2rem;
    color: #a0aec0;
    font-size: 0.75rem;
    text-align: center;
}
"#
}

fn render_header(view: &DashboardView) -> String {
    let filter = &view.filter;
    let mut active = Vec::new();
    if let Some(year) = filter.year {
        active.push(format!("year={}", year));
    }
    if let Some(t) = filter.install_type.as_deref().filter(|t| !t.is_empty()) {
        active.push(format!("type={}", html_escape(t)));
    }
    if let Some(c) = filter.category.as_deref().filter(|c| !c.is_empty()) {
        active.push(format!("category={}", html_escape(c)));
    }
    if let Some(s) = filter.search.as_deref().filter(|s| !s.is_empty()) {
        active.push(format!("search=&quot;{}&quot;", html_escape(s)));
    }
    let filters = if active.is_empty() {
        String::new()
    } else {
        format!(r#"<p class="filters">{}</p>"#, active.join(" · "))
    };

    format!(
        r#"<header>
    <h1>学校統計ダッシュボード</h1>
    <p class="status">✓ {count}件のデータを読み込みました</p>
    {filters}
</header>"#,
        count = view.loaded_records,
        filters = filters,
    )
}

fn render_summary(view: &DashboardView, config: &ResolvedConfig) -> String {
    let summary = &view.aggregates.summary;
    let card = |label: &str, value: String| {
        format!(
            r#"<div class="card"><div class="label">{}</div><div class="value">{}</div></div>"#,
            label, value
        )
    };

    format!(
        r#"<section class="summary">
    {}
    {}
    {}
    {}
</section>"#,
        card("学校数", format_count(summary.schools)),
        card("教員数", format_count(summary.teachers)),
        card("生徒数（計）", format_count(summary.total_students)),
        card(
            "男女比",
            format!(
                "{} {:.1}%",
                html_escape(&config.sentinels.male),
                summary.male_percent
            )
        ),
    )
}

/// Horizontal bars scaled to the largest group
fn render_bar_chart(title: &str, groups: &[GroupTotal]) -> String {
    let max = groups.iter().map(|g| g.value).fold(0.0_f64, f64::max);
    let rows: String = groups
        .iter()
        .map(|g| bar_row(&g.key, g.value, max, ""))
        .collect();

    format!(
        r#"<section class="section">
    <h2>{title}</h2>
    {rows}
</section>"#,
        title = title,
        rows = rows,
    )
}

fn bar_row(label: &str, value: f64, max: f64, class: &str) -> String {
    let width = if max > 0.0 { value / max * 100.0 } else { 0.0 };
    format!(
        "<div class=\"bar-row\">\n\
         <span>{label}</span>\n\
         <div class=\"bar-track\"><div class=\"bar {class}\" style=\"width: {width:.1}%\"></div></div>\n\
         <span class=\"num\">{value}</span>\n\
         </div>\n",
        label = html_escape(label),
        class = class,
        width = width,
        value = format_count(value),
    )
}

fn render_year_trend(view: &DashboardView, config: &ResolvedConfig) -> String {
    let trend = &view.aggregates.year_trend;
    if trend.is_empty() {
        return String::new();
    }

    let max = trend
        .iter()
        .map(|p| p.male.max(p.female))
        .fold(0.0_f64, f64::max);
    let male = &config.sentinels.male;
    let female = &config.sentinels.female;

    let rows: String = trend
        .iter()
        .map(|p| {
            let year = config.year_label(p.year);
            format!(
                "{}{}",
                bar_row(&format!("{} {}", year, male), p.male, max, ""),
                bar_row(&format!("{} {}", year, female), p.female, max, "female"),
            )
        })
        .collect();

    format!(
        r#"<section class="section">
    <h2>年度別推移</h2>
    {rows}
</section>"#,
        rows = rows,
    )
}

fn render_change_rates(view: &DashboardView, config: &ResolvedConfig) -> String {
    let rates = &view.aggregates.change_rates;
    if rates.is_empty() {
        return String::new();
    }

    let rows: String = rates
        .iter()
        .map(|p| {
            format!(
                "<tr><td>{}</td>{}{}{}</tr>\n",
                html_escape(&p.label),
                rate_cell(p.male),
                rate_cell(p.female),
                rate_cell(p.total),
            )
        })
        .collect();

    format!(
        r#"<section class="section">
    <h2>前年度比変化率</h2>
    <table>
        <thead><tr><th>年度</th><th class="num">{male}生徒数変化率</th><th class="num">{female}生徒数変化率</th><th class="num">計の変化率</th></tr></thead>
        <tbody>
{rows}        </tbody>
    </table>
</section>"#,
        male = html_escape(&config.sentinels.male),
        female = html_escape(&config.sentinels.female),
        rows = rows,
    )
}

fn rate_cell(rate: ChangeRate) -> String {
    let class = match rate.value() {
        Some(v) if v < 0.0 => "num negative",
        _ => "num",
    };
    format!(r#"<td class="{}">{}</td>"#, class, rate.display())
}

fn render_table(view: &DashboardView, config: &ResolvedConfig) -> String {
    let rows: String = view
        .page
        .records
        .iter()
        .map(|r| {
            let year = r
                .year
                .map(|y| config.year_label(y))
                .unwrap_or_else(|| "-".to_string());
            format!(
                "<tr>\n\
                 <td>{year}</td>\n\
                 <td>{install_type}</td>\n\
                 <td>{category}</td>\n\
                 <td class=\"num\">{school}</td>\n\
                 <td class=\"num\">{teacher}</td>\n\
                 <td class=\"num\">{male}</td>\n\
                 <td class=\"num\">{female}</td>\n\
                 <td class=\"num\">{total}</td>\n\
                 </tr>\n",
                year = html_escape(&year),
                install_type = html_escape(&r.install_type),
                category = html_escape(&r.category),
                school = crate::record::format_number(r.school),
                teacher = crate::record::format_number(r.teacher),
                male = format_count(r.male_student),
                female = format_count(r.female_student),
                total = format_count(r.total_student),
            )
        })
        .collect();

    format!(
        r#"<section class="section">
    <h2>データ一覧</h2>
    <table>
        <thead><tr><th>年度</th><th>設置</th><th>種別</th><th class="num">学校数</th><th class="num">教員数</th><th class="num">{male}</th><th class="num">{female}</th><th class="num">計</th></tr></thead>
        <tbody>
{rows}        </tbody>
    </table>
    <p class="page-info">{info}（{total}件）</p>
</section>"#,
        male = html_escape(&config.sentinels.male),
        female = html_escape(&config.sentinels.female),
        rows = rows,
        info = view.page.info(),
        total = view.page.total_records,
    )
}

fn render_footer() -> String {
    r#"<footer>
    <p>Generated by schooldash</p>
</footer>"#
        .to_string()
}

/// Escape HTML special characters
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
