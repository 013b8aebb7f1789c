mod bootstrap;

use anyhow::{bail, Context, Result};
use iplog_core::settings::Settings;
use iplog_data::reader::expand_source_paths;
use iplog_runtime::orchestrator::ReportOrchestrator;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load();

    bootstrap::setup_logging(&settings.log_level)?;

    tracing::info!("iplog v{} starting", env!("CARGO_PKG_VERSION"));

    let window = settings.time_window()?;
    if window.is_truncated() {
        tracing::warn!(
            %window,
            "window extends past minute 59; minutes beyond the hour are never counted"
        );
    }

    let sources = expand_source_paths(&settings.paths);
    if sources.is_empty() {
        bail!("no log files found in the given paths");
    }
    tracing::info!("Processing {} source(s) with window {}", sources.len(), window);

    let mut orchestrator = ReportOrchestrator::new(window);
    let failed = orchestrator
        .accept_paths(&sources)
        .await
        .iter()
        .filter(|r| r.is_err())
        .count();

    if orchestrator.source_count() == 0 {
        bail!("none of the {} source(s) could be processed", sources.len());
    }
    if failed > 0 {
        tracing::warn!("{} of {} source(s) could not be processed", failed, sources.len());
    }

    let artifact = orchestrator
        .merged_report()
        .cloned()
        .context("no report was generated")?;

    if settings.stdout {
        println!("{}", artifact.csv);
    } else {
        let path = bootstrap::write_report(&settings.resolved_output_dir(), &artifact)?;
        tracing::info!(
            ips = artifact.report.entries().len(),
            total = artifact.report.total(),
            "Report written to {}",
            path.display()
        );
    }

    Ok(())
}
