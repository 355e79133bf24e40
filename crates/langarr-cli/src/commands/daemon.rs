use crate::lock::ProcessLock;
use crate::output::Output;
use color_eyre::Result;
use langarr_webhook::WebhookState;
use profile_sync_config::PathManager;
use profile_sync_core::{run_once, CatalogInstance, IntakeInstance};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

pub struct Scheduler {
    interval: Duration,
    run_on_startup: bool,
    intakes: Vec<Arc<IntakeInstance>>,
    catalogs: Vec<Arc<CatalogInstance>>,
}

impl Scheduler {
    pub async fn start(&self) -> Result<()> {
        if self.run_on_startup {
            info!(operation = "scheduler_startup", "Running initial sync on startup");
            run_once(&self.intakes, &self.catalogs).await;
        }

        info!(
            operation = "scheduler_started",
            interval_hours = self.interval.as_secs() / 3600,
            "Scheduler started successfully"
        );

        loop {
            tokio::time::sleep(self.interval).await;

            info!(operation = "scheduled_sync_start", "Starting scheduled sync");
            let (successful, failed) = run_once(&self.intakes, &self.catalogs).await;
            info!(
                operation = "scheduled_sync_complete",
                successful = successful,
                failed = failed,
                "Scheduled sync completed"
            );
        }
    }
}

#[cfg(unix)]
fn daemonize() -> Result<()> {
    use nix::unistd::{fork, setsid, ForkResult};
    use std::fs::File;
    use std::os::unix::io::AsRawFd;

    // First fork
    match unsafe { fork()? } {
        ForkResult::Parent { child: _ } => {
            // Parent exits immediately
            std::process::exit(0);
        }
        ForkResult::Child => {
            // Child continues
        }
    }

    // Create a new session (detach from controlling terminal)
    setsid()?;

    // Second fork to ensure we're not a session leader
    match unsafe { fork()? } {
        ForkResult::Parent { child: _ } => {
            std::process::exit(0);
        }
        ForkResult::Child => {
            // Final daemon process continues
        }
    }

    // Change to root directory to avoid keeping mount points busy
    std::env::set_current_dir("/")?;

    // Close and redirect standard file descriptors
    let dev_null = File::open("/dev/null")?;
    let null_fd = dev_null.as_raw_fd();

    unsafe {
        libc::dup2(null_fd, libc::STDIN_FILENO);
        libc::dup2(null_fd, libc::STDOUT_FILENO);
        libc::dup2(null_fd, libc::STDERR_FILENO);
    }

    Ok(())
}

#[cfg(not(unix))]
fn daemonize() -> Result<()> {
    // On Windows, services should be used instead
    Err(color_eyre::eyre::eyre!(
        "Daemonization is only supported on Unix-like systems"
    ))
}

// Helper function to detect if we're running in a container
fn is_container() -> bool {
    use profile_sync_config::container_base_path;

    std::path::Path::new("/.dockerenv").exists()
        || container_base_path().exists()
        || std::fs::read_to_string("/proc/self/cgroup")
            .ok()
            .map(|s| s.contains("docker") || s.contains("containerd") || s.contains("podman"))
            .unwrap_or(false)
}

pub async fn run_daemon(
    interval_override: Option<u64>,
    no_startup_sync: bool,
    foreground: bool,
    output: &Output,
) -> Result<()> {
    let ctx = super::build_context(false)?;

    // In containers, always run in foreground to keep the container
    // alive; only daemonize outside one and when not asked to stay up
    // front.
    let should_daemonize = !foreground && !is_container();

    if should_daemonize {
        output.info("Starting daemon in background mode...");

        daemonize()?;

        let log_file = PathManager::default().daemon_log_file();
        info!(
            "Daemon running in background mode. Logs are being written to: {}",
            log_file.display()
        );
    } else if is_container() && !foreground {
        output.info("Running in foreground mode (container detected - daemonization disabled)");
    }

    let path_manager = PathManager::default();
    let _lock = ProcessLock::acquire(path_manager.lock_file())
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    // Webhook endpoint, sharing the same instances as the batch path.
    match ctx.config.webhook.as_ref().filter(|w| w.enabled) {
        Some(webhook) => {
            info!("Initializing webhook server on port {}", webhook.port);
            let state = WebhookState {
                auth_token: webhook.auth_token.clone(),
                intakes: Arc::new(ctx.intakes.clone()),
                catalogs: Arc::new(ctx.catalogs.clone()),
            };
            let bind_address = webhook.bind_address.clone();
            let port = webhook.port;
            tokio::spawn(async move {
                if let Err(e) = langarr_webhook::serve(state, &bind_address, port).await {
                    error!("Webhook server failed: {}", e);
                }
            });
        }
        None => info!("Webhook server disabled"),
    }

    let interval_hours = interval_override.unwrap_or(ctx.config.schedule.interval_hours);
    let run_on_startup = if no_startup_sync {
        false
    } else {
        ctx.config.schedule.run_on_startup
    };

    info!("Scheduling sync every {} hours", interval_hours);

    let scheduler = Scheduler {
        interval: Duration::from_secs(interval_hours * 3600),
        run_on_startup,
        intakes: ctx.intakes,
        catalogs: ctx.catalogs,
    };
    scheduler.start().await
}
