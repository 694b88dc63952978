//! Batch orchestration over a record source

use std::io::Write;
use std::sync::Arc;

use tracing::Instrument;
use uuid::Uuid;

use crate::config::SenderConfig;
use crate::error::{AppError, Result};
use crate::mailer::MailTransport;
use crate::metrics::CampaignMetrics;
use crate::ratelimit::SendPacer;
use crate::results::ResultLog;
use crate::template::{Record, TemplateSet};

use super::pipeline::RowPipeline;
use super::types::{RowDisposition, RunOptions, RunSummary};

/// Drives records through the row pipeline, in source order, one at a time.
///
/// Owns the running counters; the result log handle is borrowed for the run.
pub struct CampaignRunner {
    pipeline: RowPipeline,
    pacer: SendPacer,
    options: RunOptions,
}

impl CampaignRunner {
    /// Fails when send mode is requested without a transport
    pub fn new(
        templates: Arc<TemplateSet>,
        sender: SenderConfig,
        transport: Option<Arc<dyn MailTransport>>,
        options: RunOptions,
    ) -> Result<Self> {
        if !options.dry_run && transport.is_none() {
            return Err(AppError::MissingTransport(
                "send mode requires a mail transport".to_string(),
            ));
        }

        Ok(Self {
            pipeline: RowPipeline::new(templates, sender, transport, &options),
            pacer: SendPacer::per_minute(options.rate_limit_per_minute),
            options,
        })
    }

    /// Process every record and return the totals.
    ///
    /// The record limit is checked before each row is looked at, counting
    /// only rows that got past the sector filter. Delivery failures are logged
    /// as rows and do not stop the batch; input and log errors do.
    pub async fn run<I, W, P>(
        &self,
        records: I,
        log: &mut ResultLog<W>,
        preview: &mut P,
    ) -> Result<RunSummary>
    where
        I: IntoIterator<Item = Result<Record>>,
        W: Write,
        P: Write,
    {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "campaign.run",
            %run_id,
            dry_run = self.options.dry_run,
            sector_filter = self.options.sector_filter.as_deref().unwrap_or("")
        );

        self.run_inner(records, log, preview).instrument(span).await
    }

    async fn run_inner<I, W, P>(
        &self,
        records: I,
        log: &mut ResultLog<W>,
        preview: &mut P,
    ) -> Result<RunSummary>
    where
        I: IntoIterator<Item = Result<Record>>,
        W: Write,
        P: Write,
    {
        let mut summary = RunSummary::new(self.options.dry_run);
        tracing::info!(
            record_limit = ?self.options.record_limit,
            rate_limit_per_minute = self.options.rate_limit_per_minute,
            "Campaign started"
        );

        for (index, item) in records.into_iter().enumerate() {
            if let Some(limit) = self.options.record_limit {
                if summary.processed >= limit {
                    tracing::info!(limit, "Record limit reached");
                    break;
                }
            }

            let record = item?;

            match self.pipeline.process(index, &record, preview).await {
                RowDisposition::Filtered => {
                    summary.filtered += 1;
                    CampaignMetrics::record_filtered();
                }
                RowDisposition::Completed(entry) => {
                    log.append(&entry)?;
                    summary.record(&entry.outcome);
                    CampaignMetrics::record_outcome(&entry.outcome);

                    if entry.outcome.is_sent() {
                        self.pacer.pause().await;
                    }
                }
            }
        }

        tracing::info!(
            processed = summary.processed,
            sent = summary.sent,
            failed = summary.failed,
            skipped = summary.skipped,
            filtered = summary.filtered,
            "Campaign finished"
        );

        Ok(summary)
    }
}
