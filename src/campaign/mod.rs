//! Campaign execution: the per-row pipeline and the batch runner.
//!
//! Rows are processed strictly sequentially. A row's failure is recorded in
//! the result log and the run moves on; only configuration, input and
//! result-log errors end a run early.

mod pipeline;
mod runner;
mod types;

pub use pipeline::{RowPipeline, EMAIL_FIELDS, FALLBACK_SUBJECT, SECTOR_FIELDS};
pub use runner::CampaignRunner;
pub use types::{OutcomeEntry, RowDisposition, RowOutcome, RunOptions, RunSummary};
