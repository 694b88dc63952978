//! Row outcomes, run options and run summary

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

/// Terminal classification of a row that passed the sector filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    /// No recipient address in the row
    Skipped,
    /// Dry run: rendered and shown, not sent
    Previewed,
    /// Accepted by the transport
    Sent,
    /// Construction or delivery failed; holds the failure description
    Failed(String),
}

impl RowOutcome {
    /// Status column value in the result log
    pub fn status(&self) -> &'static str {
        match self {
            RowOutcome::Skipped => "skipped:no_email",
            RowOutcome::Previewed => "preview",
            RowOutcome::Sent => "sent",
            RowOutcome::Failed(_) => "error",
        }
    }

    /// Error column value; empty unless the row failed
    pub fn error_detail(&self) -> &str {
        match self {
            RowOutcome::Failed(detail) => detail,
            _ => "",
        }
    }

    pub fn is_sent(&self) -> bool {
        matches!(self, RowOutcome::Sent)
    }
}

/// One result log line. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomeEntry {
    pub timestamp: DateTime<Utc>,
    pub email: Option<String>,
    pub sector: Option<String>,
    pub outcome: RowOutcome,
}

impl OutcomeEntry {
    pub fn new(email: Option<&str>, sector: Option<&str>, outcome: RowOutcome) -> Self {
        Self {
            timestamp: Utc::now(),
            email: email.map(str::to_string),
            sector: sector.map(str::to_string),
            outcome,
        }
    }

    /// ISO-8601 UTC timestamp with microseconds
    pub fn timestamp_iso(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    /// Result log columns: timestamp, email, sector, status, error
    pub fn to_row(&self) -> [String; 5] {
        [
            self.timestamp_iso(),
            self.email.clone().unwrap_or_default(),
            self.sector.clone().unwrap_or_default(),
            self.outcome.status().to_string(),
            self.outcome.error_detail().to_string(),
        ]
    }
}

/// What the row pipeline did with one input record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowDisposition {
    /// Excluded by the sector filter: not counted, not logged
    Filtered,
    /// Counted as processed, to be logged
    Completed(OutcomeEntry),
}

/// Named options a campaign run honors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Preview instead of sending
    pub dry_run: bool,
    /// Sends per minute; 0 disables pacing
    pub rate_limit_per_minute: u32,
    /// Stop once this many rows were processed (post-filter)
    pub record_limit: Option<usize>,
    /// Only rows whose category normalizes to the same key
    pub sector_filter: Option<String>,
    /// Send bodies as HTML instead of plain text
    pub render_as_html: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            dry_run: true,
            rate_limit_per_minute: 0,
            record_limit: None,
            sector_filter: None,
            render_as_html: false,
        }
    }
}

/// Totals for a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub processed: usize,
    pub sent: usize,
    pub dry_run: bool,
    pub previewed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub filtered: usize,
}

impl RunSummary {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Self::default()
        }
    }

    /// Count a processed row
    pub fn record(&mut self, outcome: &RowOutcome) {
        self.processed += 1;
        match outcome {
            RowOutcome::Skipped => self.skipped += 1,
            RowOutcome::Previewed => self.previewed += 1,
            RowOutcome::Sent => self.sent += 1,
            RowOutcome::Failed(_) => self.failed += 1,
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Processed: {} | Sent: {} | Dry-run: {}",
            self.processed, self.sent, self.dry_run
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_strings() {
        assert_eq!(RowOutcome::Skipped.status(), "skipped:no_email");
        assert_eq!(RowOutcome::Previewed.status(), "preview");
        assert_eq!(RowOutcome::Sent.status(), "sent");
        assert_eq!(RowOutcome::Failed("boom".into()).status(), "error");
    }

    #[test]
    fn test_error_detail_only_for_failures() {
        assert_eq!(RowOutcome::Sent.error_detail(), "");
        assert_eq!(RowOutcome::Failed("boom".into()).error_detail(), "boom");
    }

    #[test]
    fn test_entry_row_columns() {
        let entry = OutcomeEntry::new(None, Some("Tech"), RowOutcome::Skipped);
        let row = entry.to_row();
        assert!(row[0].ends_with('Z'));
        assert!(DateTime::parse_from_rfc3339(&row[0]).is_ok());
        assert_eq!(row[1], "");
        assert_eq!(row[2], "Tech");
        assert_eq!(row[3], "skipped:no_email");
        assert_eq!(row[4], "");
    }

    #[test]
    fn test_summary_counts() {
        let mut summary = RunSummary::new(false);
        summary.record(&RowOutcome::Sent);
        summary.record(&RowOutcome::Failed("x".into()));
        summary.record(&RowOutcome::Skipped);
        assert_eq!(summary.processed, 3);
        assert_eq!(summary.sent, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.to_string(), "Processed: 3 | Sent: 1 | Dry-run: false");
    }

    #[test]
    fn test_default_options_are_dry_run() {
        let options = RunOptions::default();
        assert!(options.dry_run);
        assert_eq!(options.record_limit, None);
    }
}
