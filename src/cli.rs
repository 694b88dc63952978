use std::path::PathBuf;

use clap::Parser;

use crate::campaign::RunOptions;
use crate::config::Settings;

pub const DEFAULT_TEMPLATES_PATH: &str = "config/templates.yaml";
pub const DEFAULT_RESULTS_PATH: &str = "logs/results.csv";

#[derive(Parser, Debug)]
#[command(
    name = "campaign-mailer",
    version,
    about = "Send templated emails to every row of a CSV file"
)]
pub struct Cli {
    #[arg(long, help = "Input CSV with one recipient per row")]
    pub csv: PathBuf,
    #[arg(long, default_value = DEFAULT_TEMPLATES_PATH, help = "Template YAML file")]
    pub templates: PathBuf,
    #[arg(long, conflicts_with = "send", help = "Preview messages instead of sending")]
    pub dry_run: bool,
    #[arg(long, help = "Send messages, overriding DRY_RUN")]
    pub send: bool,
    #[arg(long, help = "Sends per minute (0 disables pacing), overrides RATE_LIMIT_PER_MINUTE")]
    pub rate_limit: Option<u32>,
    #[arg(long, help = "Stop after this many processed rows")]
    pub limit: Option<usize>,
    #[arg(long, help = "Only process rows in this sector")]
    pub only_sector: Option<String>,
    #[arg(long, default_value_t = false, help = "Send bodies as HTML")]
    pub html: bool,
    #[arg(long, default_value = DEFAULT_RESULTS_PATH, help = "Append-only result log")]
    pub results: PathBuf,
    #[arg(long, help = "Print the run summary as JSON")]
    pub json: bool,
    #[arg(long, help = "Write Prometheus metrics to this file after the run")]
    pub metrics_file: Option<PathBuf>,
}

impl Cli {
    /// Command-line flags layered over environment settings
    pub fn run_options(&self, settings: &Settings) -> RunOptions {
        let dry_run = if self.send {
            false
        } else if self.dry_run {
            true
        } else {
            settings.dry_run()
        };

        RunOptions {
            dry_run,
            rate_limit_per_minute: self.rate_limit.unwrap_or(settings.rate_limit_per_minute),
            record_limit: self.limit,
            sector_filter: self
                .only_sector
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            render_as_html: self.html,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["campaign-mailer", "--csv", "leads.csv"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&[]);
        assert_eq!(cli.templates, PathBuf::from(DEFAULT_TEMPLATES_PATH));
        assert_eq!(cli.results, PathBuf::from(DEFAULT_RESULTS_PATH));

        let options = cli.run_options(&Settings::default());
        assert!(options.dry_run);
        assert_eq!(options.rate_limit_per_minute, 30);
        assert_eq!(options.record_limit, None);
        assert!(!options.render_as_html);
    }

    #[test]
    fn test_send_overrides_env_dry_run() {
        let settings = Settings {
            dry_run: Some("true".into()),
            ..Settings::default()
        };
        assert!(!parse(&["--send"]).run_options(&settings).dry_run);
    }

    #[test]
    fn test_dry_run_overrides_env() {
        let settings = Settings {
            dry_run: Some("false".into()),
            ..Settings::default()
        };
        assert!(!parse(&[]).run_options(&settings).dry_run);
        assert!(parse(&["--dry-run"]).run_options(&settings).dry_run);
    }

    #[test]
    fn test_dry_run_and_send_conflict() {
        let result = Cli::try_parse_from([
            "campaign-mailer",
            "--csv",
            "leads.csv",
            "--dry-run",
            "--send",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_csv_is_required() {
        assert!(Cli::try_parse_from(["campaign-mailer"]).is_err());
    }

    #[test]
    fn test_overrides() {
        let options = parse(&[
            "--rate-limit",
            "0",
            "--limit",
            "5",
            "--only-sector",
            " Tech ",
            "--html",
        ])
        .run_options(&Settings::default());

        assert_eq!(options.rate_limit_per_minute, 0);
        assert_eq!(options.record_limit, Some(5));
        assert_eq!(options.sector_filter.as_deref(), Some("Tech"));
        assert!(options.render_as_html);
    }
}
