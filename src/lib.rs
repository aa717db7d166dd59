pub mod classifier;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod github;
pub mod metrics;
pub mod querier;
pub mod report;
pub mod retry;
pub mod runner;
pub mod types;

use anyhow::Context;
use chrono::Utc;
use config::AppConfig;
use runner::OrgReportRunner;
use types::TimeWindow;

/// Runs the whole report for the configured organization and writes the CSV.
///
/// Progress lines go to stdout as each repository finishes.
pub async fn generate_report(config: &AppConfig) -> anyhow::Result<()> {
    let window = TimeWindow::trailing_days(config.window_days, Utc::now());
    let runner = OrgReportRunner::new(config)?;

    let rows = runner
        .run(&config.github_org, &window, |metrics| {
            if let Some(line) = report::progress_line(metrics) {
                println!("{line}");
            }
        })
        .await?;

    report::write_csv(&config.output_path, &rows)
        .with_context(|| format!("failed to write {}", config.output_path))?;
    println!("Wrote {} repositories to {}", rows.len(), config.output_path);

    Ok(())
}
