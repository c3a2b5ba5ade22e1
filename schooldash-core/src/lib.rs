//! schooldash core library - school enrollment statistics dashboard pipeline
//!
//! raw JSON → normalize → canonical records → filter → {aggregates, paginate} → report

// Global invariants enforced in this crate:
// - Canonical records are immutable once normalized
// - No global mutable state; all view state lives in a DashboardSession
// - No randomness, clocks, threads, or async
// - Aggregates and pages are derived on demand, never cached
// - Identical input yields byte-for-byte identical output

pub mod aggregates;
pub mod config;
pub mod error;
pub mod filter;
pub mod html;
pub mod normalize;
pub mod paginate;
pub mod record;
pub mod report;
pub mod session;
pub mod trends;

pub use aggregates::DashboardAggregates;
pub use config::ResolvedConfig;
pub use error::LoadError;
pub use filter::{FilterField, FilterOptions, FilterState};
pub use normalize::{parse_dataset, Sentinels};
pub use paginate::{Page, Paginator};
pub use record::Record;
pub use report::{render_json, render_text};
pub use session::{DashboardEvent, DashboardSession, DashboardView, LoadSummary};

use anyhow::Result;
use std::path::Path;

/// Load a dataset file, apply `events` in order, and return the resulting view
pub fn build_view(
    path: &Path,
    config: ResolvedConfig,
    events: impl IntoIterator<Item = DashboardEvent>,
) -> Result<DashboardView> {
    let mut session = DashboardSession::new(config);
    session.load_file(path)?;
    for event in events {
        session.handle(event)?;
    }
    session
        .view()
        .ok_or_else(|| anyhow::anyhow!("no dataset loaded: {}", path.display()))
}
