//! Per-row state machine.
//!
//! filter → address → category → render → preview | send. Each row that
//! passes the filter ends in exactly one [`RowOutcome`]; delivery failures
//! are captured as values and never escape the row.

use std::io::Write;
use std::sync::Arc;
use std::time::Instant;

use crate::config::SenderConfig;
use crate::mailer::{MailTransport, OutgoingMail};
use crate::metrics::CampaignMetrics;
use crate::template::{build_context, normalize_key, render_template, Record, RenderedTemplate, TemplateSet};

use super::types::{OutcomeEntry, RowDisposition, RowOutcome, RunOptions};

/// Recipient address columns, in precedence order
pub const EMAIL_FIELDS: [&str; 3] = ["Email", "email", "EMAIL"];

/// Category columns, in precedence order
pub const SECTOR_FIELDS: [&str; 5] = ["Sector", "sector", "SECTOR", "Categoria", "categoria"];

/// Subject used when the rendered subject is empty
pub const FALLBACK_SUBJECT: &str = "(no subject)";

pub struct RowPipeline {
    templates: Arc<TemplateSet>,
    sender: SenderConfig,
    transport: Option<Arc<dyn MailTransport>>,
    dry_run: bool,
    render_as_html: bool,
    filter_key: Option<String>,
}

impl RowPipeline {
    pub fn new(
        templates: Arc<TemplateSet>,
        sender: SenderConfig,
        transport: Option<Arc<dyn MailTransport>>,
        options: &RunOptions,
    ) -> Self {
        Self {
            templates,
            sender,
            transport,
            dry_run: options.dry_run,
            render_as_html: options.render_as_html,
            filter_key: options
                .sector_filter
                .as_deref()
                .map(normalize_key)
                .filter(|key| !key.is_empty()),
        }
    }

    /// Whether the row's category passes the sector filter
    pub fn accepts(&self, record: &Record) -> bool {
        match &self.filter_key {
            None => true,
            Some(wanted) => normalize_key(record.first_present(&SECTOR_FIELDS).unwrap_or("")) == *wanted,
        }
    }

    /// Resolve and render the template for a row
    pub fn render(&self, record: &Record, sector: Option<&str>) -> RenderedTemplate {
        let context = build_context(record);
        let template = self.templates.resolve(sector);
        let mut rendered = render_template(template, &context);
        if rendered.subject.is_empty() {
            rendered.subject = FALLBACK_SUBJECT.to_string();
        }
        rendered
    }

    /// Run one row through the state machine
    #[tracing::instrument(
        name = "campaign.row",
        skip(self, record, preview),
        fields(email = tracing::field::Empty, sector = tracing::field::Empty)
    )]
    pub async fn process<P: Write>(&self, index: usize, record: &Record, preview: &mut P) -> RowDisposition {
        if !self.accepts(record) {
            tracing::debug!("Row excluded by sector filter");
            return RowDisposition::Filtered;
        }

        let span = tracing::Span::current();
        let sector = record.first_present(&SECTOR_FIELDS);
        if let Some(sector) = sector {
            span.record("sector", sector);
        }

        let Some(email) = record.first_present(&EMAIL_FIELDS) else {
            tracing::debug!(sector = sector.unwrap_or(""), "Row has no email, skipping");
            return RowDisposition::Completed(OutcomeEntry::new(None, sector, RowOutcome::Skipped));
        };

        span.record("email", email);
        let rendered = self.render(record, sector);

        let outcome = if self.dry_run {
            write_preview(preview, email, &rendered);
            RowOutcome::Previewed
        } else {
            self.send(email, rendered).await
        };

        RowDisposition::Completed(OutcomeEntry::new(Some(email), sector, outcome))
    }

    async fn send(&self, email: &str, rendered: RenderedTemplate) -> RowOutcome {
        let Some(transport) = self.transport.as_ref() else {
            return RowOutcome::Failed("no mail transport configured".to_string());
        };

        let mail = OutgoingMail {
            from: self.sender.from.clone(),
            to: email.to_string(),
            subject: rendered.subject,
            body: rendered.body,
            reply_to: self.sender.reply_to.clone(),
            is_html: self.render_as_html,
        };

        let started = Instant::now();
        let result = transport.deliver(&mail).await;
        CampaignMetrics::observe_delivery(started.elapsed());

        match result {
            Ok(()) => {
                tracing::info!(to = %email, transport = transport.name(), "Email sent");
                RowOutcome::Sent
            }
            Err(e) => {
                tracing::warn!(to = %email, error = %e, "Email delivery failed");
                RowOutcome::Failed(e.to_string())
            }
        }
    }
}

fn write_preview<P: Write>(out: &mut P, email: &str, rendered: &RenderedTemplate) {
    if let Err(e) = try_write_preview(out, email, rendered) {
        tracing::warn!(error = %e, "Failed to write preview");
    }
}

fn try_write_preview<P: Write>(out: &mut P, email: &str, rendered: &RenderedTemplate) -> std::io::Result<()> {
    writeln!(out, "=== PREVIEW ===")?;
    writeln!(out, "To: {}", email)?;
    writeln!(out, "Subject: {}", rendered.subject)?;
    writeln!(out, "{}", rendered.body)?;
    writeln!(out, "===============")?;
    writeln!(out)?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mailer::DeliveryError;
    use crate::template::Template;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingTransport {
        delivered: Mutex<Vec<OutgoingMail>>,
        fail_for: Option<String>,
    }

    #[async_trait]
    impl MailTransport for RecordingTransport {
        async fn deliver(&self, mail: &OutgoingMail) -> Result<(), DeliveryError> {
            if self.fail_for.as_deref() == Some(mail.to.as_str()) {
                return Err(DeliveryError::Transport("550 mailbox unavailable".into()));
            }
            self.delivered.lock().unwrap().push(mail.clone());
            Ok(())
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    fn templates() -> Arc<TemplateSet> {
        Arc::new(
            TemplateSet::new(Template::new("", "Hello {Name}"))
                .with_sector("retail", Template::new("Retail for {name}", "Shop {Company}")),
        )
    }

    fn sender() -> SenderConfig {
        SenderConfig {
            from: "Lead Mailer <no-reply@example.com>".into(),
            reply_to: Some("sales@example.com".into()),
            inline_logo: None,
        }
    }

    fn pipeline(options: RunOptions, transport: Option<Arc<dyn MailTransport>>) -> RowPipeline {
        RowPipeline::new(templates(), sender(), transport, &options)
    }

    fn completed(disposition: RowDisposition) -> OutcomeEntry {
        match disposition {
            RowDisposition::Completed(entry) => entry,
            RowDisposition::Filtered => panic!("row was filtered"),
        }
    }

    #[tokio::test]
    async fn test_missing_email_is_skipped() {
        let pipeline = pipeline(RunOptions::default(), None);
        let record = Record::from_pairs([("Email", ""), ("Sector", "Tech")]);
        let entry = completed(pipeline.process(0, &record, &mut Vec::new()).await);
        assert_eq!(entry.outcome, RowOutcome::Skipped);
        assert_eq!(entry.email, None);
        assert_eq!(entry.sector.as_deref(), Some("Tech"));
    }

    #[tokio::test]
    async fn test_email_field_precedence() {
        let pipeline = pipeline(RunOptions::default(), None);
        let record = Record::from_pairs([("EMAIL", "upper@x.com"), ("email", "lower@x.com")]);
        let entry = completed(pipeline.process(0, &record, &mut Vec::new()).await);
        assert_eq!(entry.email.as_deref(), Some("lower@x.com"));
    }

    #[tokio::test]
    async fn test_category_falls_back_to_categoria() {
        let pipeline = pipeline(RunOptions::default(), None);
        let record = Record::from_pairs([("email", "a@x.com"), ("Sector", ""), ("categoria", "Retail")]);
        let entry = completed(pipeline.process(0, &record, &mut Vec::new()).await);
        assert_eq!(entry.sector.as_deref(), Some("Retail"));
    }

    #[tokio::test]
    async fn test_dry_run_previews_without_transport_call() {
        let transport = Arc::new(RecordingTransport::default());
        let pipeline = pipeline(RunOptions::default(), Some(transport.clone()));
        let record = Record::from_pairs([("Email", "a@x.com"), ("Sector", "Retail"), ("Name", "Ann"), ("Company", "Acme")]);

        let mut preview = Vec::new();
        let entry = completed(pipeline.process(0, &record, &mut preview).await);

        assert_eq!(entry.outcome, RowOutcome::Previewed);
        assert!(transport.delivered.lock().unwrap().is_empty());
        let shown = String::from_utf8(preview).unwrap();
        assert!(shown.contains("To: a@x.com"));
        assert!(shown.contains("Subject: Retail for Ann"));
        assert!(shown.contains("Shop Acme"));
    }

    #[tokio::test]
    async fn test_empty_subject_uses_fallback() {
        let pipeline = pipeline(RunOptions::default(), None);
        let record = Record::from_pairs([("Email", "a@x.com"), ("Name", "Ann")]);
        let rendered = pipeline.render(&record, None);
        assert_eq!(rendered.subject, FALLBACK_SUBJECT);
        assert_eq!(rendered.body, "Hello Ann");
    }

    #[tokio::test]
    async fn test_send_builds_mail_from_sender_and_options() {
        let transport = Arc::new(RecordingTransport::default());
        let options = RunOptions {
            dry_run: false,
            render_as_html: true,
            ..RunOptions::default()
        };
        let pipeline = pipeline(options, Some(transport.clone()));
        let record = Record::from_pairs([("Email", "a@x.com"), ("Sector", "RETAIL"), ("Name", "Ann")]);

        let entry = completed(pipeline.process(0, &record, &mut Vec::new()).await);
        assert_eq!(entry.outcome, RowOutcome::Sent);

        let delivered = transport.delivered.lock().unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].to, "a@x.com");
        assert_eq!(delivered[0].subject, "Retail for Ann");
        assert_eq!(delivered[0].reply_to.as_deref(), Some("sales@example.com"));
        assert!(delivered[0].is_html);
    }

    #[tokio::test]
    async fn test_delivery_failure_becomes_error_outcome() {
        let transport = Arc::new(RecordingTransport {
            fail_for: Some("bad@x.com".into()),
            ..RecordingTransport::default()
        });
        let options = RunOptions {
            dry_run: false,
            ..RunOptions::default()
        };
        let pipeline = pipeline(options, Some(transport));
        let record = Record::from_pairs([("Email", "bad@x.com")]);

        let entry = completed(pipeline.process(0, &record, &mut Vec::new()).await);
        match entry.outcome {
            RowOutcome::Failed(detail) => assert!(detail.contains("550")),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_sector_filter_is_normalized() {
        let options = RunOptions {
            sector_filter: Some(" Retail-Sales ".into()),
            ..RunOptions::default()
        };
        let pipeline = pipeline(options, None);

        let matching = Record::from_pairs([("Email", "a@x.com"), ("Sector", "retail sales")]);
        let other = Record::from_pairs([("Email", "b@x.com"), ("Sector", "Tech")]);
        let blank = Record::from_pairs([("Email", "c@x.com")]);

        assert!(pipeline.accepts(&matching));
        assert!(!pipeline.accepts(&other));
        assert!(!pipeline.accepts(&blank));
        assert_eq!(pipeline.process(1, &other, &mut Vec::new()).await, RowDisposition::Filtered);
    }

    #[tokio::test]
    async fn test_sector_filter_without_key_accepts_all() {
        let options = RunOptions {
            sector_filter: Some(" - ".into()),
            ..RunOptions::default()
        };
        let pipeline = pipeline(options, None);

        let tech = Record::from_pairs([("Email", "a@x.com"), ("Sector", "Tech")]);
        let blank = Record::from_pairs([("Email", "b@x.com")]);

        assert!(pipeline.accepts(&tech));
        assert!(pipeline.accepts(&blank));
        assert!(matches!(
            pipeline.process(0, &tech, &mut Vec::new()).await,
            RowDisposition::Completed(_)
        ));
    }
}
