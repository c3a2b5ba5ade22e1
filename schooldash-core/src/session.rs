//! Dashboard session - owns the loaded dataset and the view state
//!
//! Global invariants enforced:
//! - A load is atomic: on any error the previous dataset and view state remain
//! - A successful load resets filters, search and the current page
//! - Every filter, search or page-size change resets the current page to 1
//! - The filtered set is always `filter::apply(canonical, filter_state)`

use crate::aggregates::DashboardAggregates;
use crate::config::ResolvedConfig;
use crate::error::LoadError;
use crate::filter::{self, FilterField, FilterOptions, FilterState};
use crate::normalize::parse_dataset;
use crate::paginate::{Page, Paginator};
use crate::record::Record;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// A user interaction that triggers one recomputation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardEvent {
    /// A dropdown changed; an empty value clears it
    Filter { field: FilterField, value: String },
    /// The search box changed
    Search(String),
    /// A different page size was selected
    PageSize(usize),
    NextPage,
    PrevPage,
    /// Jump to a page; clamped to the first and last page
    GoToPage(usize),
}

/// Outcome of a successful load
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadSummary {
    pub records: usize,
}

impl LoadSummary {
    /// Status line shown after loading
    pub fn status_message(&self) -> String {
        format!("✓ {}件のデータを読み込みました", self.records)
    }
}

/// Everything a presentation adapter needs to draw the dashboard
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardView {
    pub loaded_records: usize,
    pub filter: FilterState,
    pub options: FilterOptions,
    pub aggregates: DashboardAggregates,
    pub page: Page,
}

/// Session state for one dashboard
#[derive(Debug, Clone)]
pub struct DashboardSession {
    config: ResolvedConfig,
    records: Vec<Record>,
    options: FilterOptions,
    filter: FilterState,
    filtered: Vec<Record>,
    paginator: Paginator,
}

impl DashboardSession {
    /// An empty session using `config`
    pub fn new(config: ResolvedConfig) -> Self {
        let paginator = Paginator::new(config.page_size);
        DashboardSession {
            config,
            records: Vec::new(),
            options: FilterOptions::default(),
            filter: FilterState::default(),
            filtered: Vec::new(),
            paginator,
        }
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    /// True once a non-empty dataset has been loaded
    pub fn is_loaded(&self) -> bool {
        !self.records.is_empty()
    }

    /// The canonical record set
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// The records passing the current filter state
    pub fn filtered(&self) -> &[Record] {
        &self.filtered
    }

    pub fn filter_state(&self) -> &FilterState {
        &self.filter
    }

    pub fn options(&self) -> &FilterOptions {
        &self.options
    }

    pub fn paginator(&self) -> &Paginator {
        &self.paginator
    }

    /// Load dataset text, replacing the current dataset only on success
    pub fn load_str(&mut self, text: &str) -> Result<LoadSummary, LoadError> {
        let records = parse_dataset(text, &self.config.sentinels)?;
        if records.is_empty() {
            return Err(LoadError::EmptyDataset);
        }

        self.options = FilterOptions::from_records(&records);
        self.filtered = records.clone();
        self.records = records;
        self.filter = FilterState::default();
        self.paginator.reset();

        let summary = LoadSummary {
            records: self.records.len(),
        };
        info!(records = summary.records, "loaded dataset");
        Ok(summary)
    }

    /// Read and load a dataset file
    pub fn load_file(&mut self, path: &Path) -> Result<LoadSummary> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read dataset: {}", path.display()))?;
        let summary = self
            .load_str(&text)
            .with_context(|| format!("failed to load dataset: {}", path.display()))?;
        Ok(summary)
    }

    /// Apply one event and recompute the affected state
    pub fn handle(&mut self, event: DashboardEvent) -> Result<()> {
        debug!(?event, "handling dashboard event");
        match event {
            DashboardEvent::Filter { field, value } => {
                let trimmed = value.trim();
                // Year options are displayed with the suffix ("2020年度")
                let raw = match field {
                    FilterField::Year => trimmed
                        .strip_suffix(self.config.year_suffix.as_str())
                        .unwrap_or(trimmed),
                    _ => trimmed,
                };
                self.filter
                    .set(field, raw)
                    .with_context(|| format!("invalid year filter: {:?}", value))?;
                self.refilter();
            }
            DashboardEvent::Search(term) => {
                self.filter.search = Some(term).filter(|t| !t.is_empty());
                self.refilter();
            }
            DashboardEvent::PageSize(size) => {
                let size = self.config.check_page_size(size)?;
                self.paginator.set_page_size(size);
            }
            DashboardEvent::NextPage => {
                self.paginator.next_page(self.filtered.len());
            }
            DashboardEvent::PrevPage => {
                self.paginator.prev_page();
            }
            DashboardEvent::GoToPage(page) => {
                self.paginator.go_to_page(page, self.filtered.len());
            }
        }
        Ok(())
    }

    /// Replace the whole filter state at once
    pub fn set_filter_state(&mut self, state: FilterState) {
        self.filter = state;
        self.refilter();
    }

    fn refilter(&mut self) {
        self.filtered = filter::apply(&self.records, &self.filter);
        self.paginator.reset();
        debug!(
            total = self.records.len(),
            filtered = self.filtered.len(),
            "applied filters"
        );
    }

    /// Aggregates over the filtered records
    pub fn aggregates(&self) -> DashboardAggregates {
        DashboardAggregates::compute(&self.filtered)
    }

    /// The current table page
    pub fn page(&self) -> Page {
        self.paginator.page(&self.filtered)
    }

    /// Snapshot of everything to render; `None` before a dataset is loaded
    pub fn view(&self) -> Option<DashboardView> {
        if !self.is_loaded() {
            return None;
        }
        Some(DashboardView {
            loaded_records: self.records.len(),
            filter: self.filter.clone(),
            options: self.options.clone(),
            aggregates: self.aggregates(),
            page: self.page(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATASET: &str = r#"[
        {"year": 2020, "school": 5, "type": "公立", "category": "小学校",
         "population": {"teacher": 30, "sutudent": {"data": [
            {"type": "男", "population": 60}, {"type": "女", "population": 40}]}}},
        {"year": 2021, "school": 5, "type": "公立", "category": "小学校",
         "population": {"teacher": 31, "sutudent": {"data": [
            {"type": "男", "population": 90}, {"type": "女", "population": 60}]}}},
        {"year": 2021, "school": 2, "type": "私立", "category": "中学校",
         "population": {"teacher": 9, "sutudent": {"data": [
            {"type": "男", "population": 10}, {"type": "女", "population": 12}]}}},
        {"year": 2021, "school": 7, "type": "合計", "category": "合計",
         "population": {"teacher": 40, "sutudent": {"data": [
            {"type": "男", "population": 100}, {"type": "女", "population": 72}]}}}
    ]"#;

    fn session() -> DashboardSession {
        let mut session = DashboardSession::new(ResolvedConfig::defaults().unwrap());
        session.load_str(DATASET).unwrap();
        session
    }

    #[test]
    fn test_load_populates_state() {
        let session = session();
        assert!(session.is_loaded());
        assert_eq!(session.records().len(), 3);
        assert_eq!(session.filtered().len(), 3);
        assert_eq!(session.options().years, vec![2020, 2021]);
    }

    #[test]
    fn test_failed_load_keeps_previous_dataset() {
        let mut session = session();
        session
            .handle(DashboardEvent::Filter {
                field: FilterField::Type,
                value: "私立".to_string(),
            })
            .unwrap();

        assert!(matches!(session.load_str("{oops"), Err(LoadError::Parse(_))));
        assert!(matches!(session.load_str("{}"), Err(LoadError::Format(_))));
        assert_eq!(session.load_str("[]"), Err(LoadError::EmptyDataset));
        let totals_only = r#"[{"type": "合計", "category": "合計"}]"#;
        assert_eq!(session.load_str(totals_only), Err(LoadError::EmptyDataset));

        assert_eq!(session.records().len(), 3);
        assert_eq!(session.filtered().len(), 1);
        assert_eq!(session.filter_state().install_type.as_deref(), Some("私立"));
    }

    #[test]
    fn test_empty_first_load_leaves_session_unloaded() {
        let mut session = DashboardSession::new(ResolvedConfig::defaults().unwrap());
        assert!(session.load_str("[]").unwrap_err().is_soft());
        assert!(!session.is_loaded());
        assert!(session.view().is_none());
    }

    #[test]
    fn test_reload_resets_filters() {
        let mut session = session();
        session
            .handle(DashboardEvent::Search("私立".to_string()))
            .unwrap();
        assert_eq!(session.filtered().len(), 1);

        session.load_str(DATASET).unwrap();
        assert!(session.filter_state().is_empty());
        assert_eq!(session.filtered().len(), 3);
    }

    #[test]
    fn test_filter_and_search_compose() {
        let mut session = session();
        session
            .handle(DashboardEvent::Filter {
                field: FilterField::Year,
                value: "2021".to_string(),
            })
            .unwrap();
        assert_eq!(session.filtered().len(), 2);

        session
            .handle(DashboardEvent::Search("公立".to_string()))
            .unwrap();
        assert_eq!(session.filtered().len(), 1);

        session
            .handle(DashboardEvent::Search(String::new()))
            .unwrap();
        assert_eq!(session.filtered().len(), 2);
    }

    /// 30 public elementary rows, one per year from 1991
    fn paged_session() -> DashboardSession {
        let entries: Vec<String> = (1991..2021)
            .map(|year| {
                format!(
                    r#"{{"year": {}, "school": 1, "type": "公立", "category": "小学校",
                        "population": {{"teacher": 2, "sutudent": {{"data": [
                        {{"type": "男", "population": 3}}, {{"type": "女", "population": 4}}]}}}}}}"#,
                    year
                )
            })
            .collect();
        let mut session = DashboardSession::new(ResolvedConfig::defaults().unwrap());
        session
            .load_str(&format!("[{}]", entries.join(",")))
            .unwrap();
        session.handle(DashboardEvent::PageSize(10)).unwrap();
        session
    }

    #[test]
    fn test_events_reset_page() {
        let mut session = paged_session();
        assert_eq!(session.page().total_pages, 3);

        let resets = [
            DashboardEvent::Filter {
                field: FilterField::Type,
                value: "公立".to_string(),
            },
            DashboardEvent::Search("小学校".to_string()),
            DashboardEvent::PageSize(25),
        ];
        for event in resets {
            session.handle(DashboardEvent::NextPage).unwrap();
            assert_eq!(session.paginator().current_page(), 2);
            session.handle(event.clone()).unwrap();
            assert_eq!(
                session.paginator().current_page(),
                1,
                "{:?} should reset the page",
                event
            );
        }

        session.handle(DashboardEvent::NextPage).unwrap();
        session.set_filter_state(FilterState::default());
        assert_eq!(session.paginator().current_page(), 1);
    }

    #[test]
    fn test_go_to_page_clamps() {
        let mut session = paged_session();
        session.handle(DashboardEvent::GoToPage(usize::MAX)).unwrap();
        assert_eq!(session.paginator().current_page(), 3);
        assert_eq!(session.page().records.len(), 10);

        session.handle(DashboardEvent::GoToPage(0)).unwrap();
        assert_eq!(session.paginator().current_page(), 1);

        session.handle(DashboardEvent::GoToPage(2)).unwrap();
        assert_eq!(session.page().records[0].year, Some(2001));
    }

    #[test]
    fn test_year_filter_accepts_label_and_rejects_garbage() {
        let mut session = session();
        session
            .handle(DashboardEvent::Filter {
                field: FilterField::Year,
                value: "2020年度".to_string(),
            })
            .unwrap();
        assert_eq!(session.filtered().len(), 1);

        let err = session
            .handle(DashboardEvent::Filter {
                field: FilterField::Year,
                value: "2020x".to_string(),
            })
            .unwrap_err();
        assert!(err.to_string().contains("invalid year filter"));
        assert_eq!(session.filter_state().year, Some(2020));
        assert_eq!(session.filtered().len(), 1);
    }

    #[test]
    fn test_page_navigation_saturates() {
        let mut session = session();
        session.handle(DashboardEvent::PrevPage).unwrap();
        assert_eq!(session.paginator().current_page(), 1);
        session.handle(DashboardEvent::NextPage).unwrap();
        assert_eq!(session.paginator().current_page(), 1);
    }

    #[test]
    fn test_invalid_page_size_is_rejected() {
        let mut session = session();
        assert!(session.handle(DashboardEvent::PageSize(7)).is_err());
        assert_eq!(session.paginator().page_size(), 25);
    }

    #[test]
    fn test_view() {
        let view = session().view().unwrap();
        assert_eq!(view.loaded_records, 3);
        assert_eq!(view.page.records.len(), 3);
        assert_eq!(view.page.total_pages, 1);
        assert_eq!(view.aggregates.summary.total_students, 272.0);
        assert_eq!(view.aggregates.change_rates.len(), 1);
        // 2020: 100 students, 2021: 150 + 22 = 172
        let rate = view.aggregates.change_rates[0].total.value().unwrap();
        assert!((rate - 72.0).abs() < 1e-9);
    }

    #[test]
    fn test_status_message() {
        let summary = LoadSummary { records: 12 };
        assert_eq!(summary.status_message(), "✓ 12件のデータを読み込みました");
    }
}
