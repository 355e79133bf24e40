pub mod audio;
pub mod daemon;
pub mod sync;

use color_eyre::eyre::eyre;
use color_eyre::Result;
use profile_sync_config::{Config, PathManager};
use profile_sync_core::{CatalogInstance, IntakeInstance, ReconcilerConfig};
use profile_sync_models::ServiceKind;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Everything a command needs: the loaded config and the constructed
/// service instances.
pub struct AppContext {
    pub config: Config,
    pub catalogs: Vec<Arc<CatalogInstance>>,
    pub intakes: Vec<Arc<IntakeInstance>>,
}

/// Load and validate the configuration, then construct every enabled
/// instance. `dry_run_override` forces dry-run regardless of config.
pub fn build_context(dry_run_override: bool) -> Result<AppContext> {
    let path_manager = PathManager::default();
    let config_file = path_manager.config_file();

    if !config_file.exists() {
        return Err(eyre!("Configuration file not found: {}", config_file.display()));
    }

    let mut config = Config::load_from_file(&config_file)
        .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))?;
    config
        .validate()
        .map_err(|e| eyre!("Configuration validation failed: {}", e))?;
    info!("Loaded configuration from {}", config_file.display());

    if dry_run_override {
        config.reconciler.dry_run = true;
    }
    let reconciler = ReconcilerConfig::from(&config.reconciler);

    let mut movies = BTreeMap::new();
    for (name, settings) in &config.movies {
        if !settings.enabled {
            info!("Skipping disabled movies instance: {}", name);
            continue;
        }
        info!("Initializing movies instance: {}", name);
        let instance =
            CatalogInstance::from_config(name, ServiceKind::Movies, settings, reconciler.clone())
                .map_err(|e| eyre!("Failed to initialize movies instance '{}': {}", name, e))?;
        movies.insert(name.clone(), Arc::new(instance));
    }

    let mut series = BTreeMap::new();
    for (name, settings) in &config.series {
        if !settings.enabled {
            info!("Skipping disabled series instance: {}", name);
            continue;
        }
        info!("Initializing series instance: {}", name);
        let instance =
            CatalogInstance::from_config(name, ServiceKind::Series, settings, reconciler.clone())
                .map_err(|e| eyre!("Failed to initialize series instance '{}': {}", name, e))?;
        series.insert(name.clone(), Arc::new(instance));
    }

    let mut intakes = Vec::new();
    for (name, settings) in &config.intake {
        if !settings.enabled {
            info!("Skipping disabled intake instance: {}", name);
            continue;
        }
        info!("Initializing intake instance: {}", name);
        let instance =
            IntakeInstance::from_config(name, settings, &movies, &series, &reconciler)
                .map_err(|e| eyre!("Failed to initialize intake instance '{}': {}", name, e))?;
        intakes.push(Arc::new(instance));
    }

    let catalogs: Vec<Arc<CatalogInstance>> = movies
        .into_values()
        .chain(series.into_values())
        .collect();
    if catalogs.is_empty() {
        warn!("No enabled instances found in configuration!");
    }

    Ok(AppContext { config, catalogs, intakes })
}

/// Narrow the catalog list to one named instance, when requested.
pub fn filter_catalogs(
    catalogs: &[Arc<CatalogInstance>],
    instance: Option<&str>,
) -> Result<Vec<Arc<CatalogInstance>>> {
    match instance {
        None => Ok(catalogs.to_vec()),
        Some(name) => {
            let selected: Vec<_> = catalogs
                .iter()
                .filter(|c| c.name() == name)
                .cloned()
                .collect();
            if selected.is_empty() {
                let available: Vec<&str> = catalogs.iter().map(|c| c.name()).collect();
                return Err(eyre!(
                    "Instance '{}' is not configured/enabled (available: {})",
                    name,
                    available.join(", ")
                ));
            }
            Ok(selected)
        }
    }
}
