use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use campaign_mailer::campaign::CampaignRunner;
use campaign_mailer::cli::Cli;
use campaign_mailer::config::Settings;
use campaign_mailer::error::AppError;
use campaign_mailer::mailer::{MailTransport, SmtpMailer};
use campaign_mailer::metrics::encode_metrics;
use campaign_mailer::records::RecordReader;
use campaign_mailer::results::ResultLog;
use campaign_mailer::telemetry::init_tracing;
use campaign_mailer::template::TemplateSet;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();

    // Load configuration
    let settings = Settings::new()?;
    let options = cli.run_options(&settings);
    let sender = settings.sender();
    tracing::info!(dry_run = options.dry_run, "Configuration loaded");

    // Transport problems are fatal, so check them before touching any row
    let transport: Option<Arc<dyn MailTransport>> = if options.dry_run {
        None
    } else {
        let smtp = settings.smtp()?;
        let mailer = SmtpMailer::new(&smtp, &sender).map_err(|e| AppError::InvalidValue {
            key: "SMTP_HOST".to_string(),
            message: e.to_string(),
        })?;
        Some(Arc::new(mailer))
    };

    let templates = Arc::new(TemplateSet::load(&cli.templates).map_err(AppError::from)?);
    let mut log = ResultLog::open_append(&cli.results)?;
    let records = RecordReader::open(&cli.csv)?;
    tracing::info!(
        path = %cli.csv.display(),
        columns = %records.headers().join(","),
        "Input opened"
    );

    let runner = CampaignRunner::new(templates, sender, transport, options)?;

    let mut stdout = std::io::stdout().lock();
    let summary = runner.run(records, &mut log, &mut stdout).await?;

    if cli.json {
        serde_json::to_writer(&mut stdout, &summary)?;
        writeln!(stdout)?;
    } else {
        writeln!(stdout, "{}", summary)?;
    }

    if let Some(path) = &cli.metrics_file {
        let text = encode_metrics()?;
        std::fs::write(path, text)
            .with_context(|| format!("failed to write metrics to {}", path.display()))?;
        tracing::info!(path = %path.display(), "Metrics written");
    }

    Ok(())
}
