use crate::lock::ProcessLock;
use crate::output::Output;
use crate::progress;
use color_eyre::Result;
use profile_sync_config::PathManager;
use serde_json::json;

pub async fn run_sync(
    dry_run: bool,
    instance: Option<String>,
    no_intake: bool,
    output: &Output,
) -> Result<()> {
    tracing::debug!("Sync command started");

    let ctx = super::build_context(dry_run)?;
    let catalogs = super::filter_catalogs(&ctx.catalogs, instance.as_deref())?;

    let path_manager = PathManager::default();
    let _lock = ProcessLock::acquire(path_manager.lock_file())
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let spinner = progress::instance_spinner();

    if !no_intake {
        for intake in &ctx.intakes {
            spinner.set_message(format!("Processing intake requests ({})", intake.name()));
            intake.process_pending_requests().await;
        }
    }

    let mut results = Vec::new();
    let mut failed = 0usize;
    for (idx, catalog) in catalogs.iter().enumerate() {
        spinner.set_message(format!(
            "Syncing {} ({}/{})",
            catalog.name(),
            idx + 1,
            catalogs.len()
        ));
        match catalog.run_sync().await {
            Ok(stats) => results.push((catalog.name().to_string(), stats)),
            Err(e) => {
                output.error(&format!("[{}] Sync failed: {}", catalog.name(), e));
                failed += 1;
            }
        }
    }
    spinner.finish_and_clear();

    let updated: usize = results.iter().map(|(_, s)| s.updated).sum();
    let total: usize = results.iter().map(|(_, s)| s.total).sum();

    match output.format() {
        crate::output::OutputFormat::Human => {
            for (name, stats) in &results {
                output.info(&format!(
                    "  {}: {} updated, {} already correct, {} total",
                    name, stats.updated, stats.skipped, stats.total
                ));
            }
            let verb = if dry_run || ctx.config.reconciler.dry_run {
                "would update"
            } else {
                "updated"
            };
            output.success(&format!(
                "Sync completed: {} {} of {} items across {} instances ({} failed)",
                verb,
                updated,
                total,
                results.len(),
                failed
            ));
        }
        crate::output::OutputFormat::Json | crate::output::OutputFormat::JsonPretty => {
            let instances: Vec<_> = results
                .iter()
                .map(|(name, stats)| {
                    json!({
                        "instance": name,
                        "updated": stats.updated,
                        "skipped": stats.skipped,
                        "total": stats.total,
                    })
                })
                .collect();
            output.json(&json!({
                "success": failed == 0,
                "dry_run": dry_run || ctx.config.reconciler.dry_run,
                "failed_instances": failed,
                "instances": instances,
            }));
        }
    }

    Ok(())
}
