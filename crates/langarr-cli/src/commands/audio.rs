use crate::lock::ProcessLock;
use crate::output::Output;
use crate::progress;
use color_eyre::Result;
use profile_sync_config::PathManager;
use serde_json::json;

pub async fn run_audio_scan(
    dry_run: bool,
    instance: Option<String>,
    output: &Output,
) -> Result<()> {
    tracing::debug!("Audio scan command started");

    let ctx = super::build_context(dry_run)?;
    let catalogs = super::filter_catalogs(&ctx.catalogs, instance.as_deref())?;

    let path_manager = PathManager::default();
    let _lock = ProcessLock::acquire(path_manager.lock_file())
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let spinner = progress::instance_spinner();
    spinner.set_message(format!(
        "Scanning audio tracks across {} instances",
        catalogs.len()
    ));
    let results = profile_sync_core::run_audio_scan(&catalogs).await;
    spinner.finish_and_clear();

    match output.format() {
        crate::output::OutputFormat::Human => {
            for (name, stats) in &results {
                output.info(&format!(
                    "  {}: {} tagged, {} skipped, {} total",
                    name, stats.tagged, stats.skipped, stats.total
                ));
            }
            let tagged: usize = results.iter().map(|(_, s)| s.tagged).sum();
            output.success(&format!(
                "Audio scan completed: {} items tagged across {} instances",
                tagged,
                results.len()
            ));
        }
        crate::output::OutputFormat::Json | crate::output::OutputFormat::JsonPretty => {
            let instances: Vec<_> = results
                .iter()
                .map(|(name, stats)| {
                    json!({
                        "instance": name,
                        "tagged": stats.tagged,
                        "skipped": stats.skipped,
                        "total": stats.total,
                    })
                })
                .collect();
            output.json(&json!({
                "success": true,
                "dry_run": dry_run || ctx.config.reconciler.dry_run,
                "instances": instances,
            }));
        }
    }

    Ok(())
}
