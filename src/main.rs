use anyhow::Result;
use dispatchmon::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        executable = %app_config.dispatcher.executable,
        "starting connectivity monitor"
    );
    if app_config.dispatcher.interfaces.is_empty() {
        tracing::warn!("no interfaces configured; the dispatcher will never start");
    }

    let (events_tx, _) =
        broadcast::channel::<models::MonitorEvent>(app_config.monitoring.broadcast_capacity);
    // Held open for the process lifetime; a presentation layer would clone it.
    let (_command_tx, command_rx) = mpsc::channel::<models::DispatcherCommand>(8);
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

    let prober = Arc::new(probe_repo::ProbeRepo::new(
        app_config.dispatcher.executable.clone(),
        app_config.probing.ping_count,
    ));
    let policy = iface_monitor::ProbePolicy {
        whitelisted_target: app_config.probing.whitelisted_target.clone(),
        not_whitelisted_target: app_config.probing.not_whitelisted_target.clone(),
        debounce: Duration::from_secs(app_config.probing.debounce_secs),
    };
    let monitors: Vec<_> = app_config
        .dispatcher
        .interfaces
        .iter()
        .map(|(name, weight)| {
            iface_monitor::InterfaceMonitor::new(name.clone(), *weight, policy.clone())
        })
        .collect();
    let dispatch = dispatcher::DispatchOrchestrator::new(
        app_config.dispatcher.executable.clone(),
        Duration::from_secs(app_config.dispatcher.spawn_settle_secs),
        Duration::from_secs(app_config.dispatcher.stop_grace_secs),
    );

    // Stand-in presentation consumer: log the event stream.
    let mut events_rx = events_tx.subscribe();
    tokio::spawn(async move {
        loop {
            match events_rx.recv().await {
                Ok(models::MonitorEvent::InterfacesUpdated { interfaces }) => {
                    match serde_json::to_string(&interfaces) {
                        Ok(json) => tracing::debug!(snapshot = %json, "interfaces updated"),
                        Err(e) => tracing::debug!(error = %e, "snapshot serialization failed"),
                    }
                }
                Ok(models::MonitorEvent::LevelsChanged) => {
                    tracing::info!("interface levels changed");
                }
                Ok(models::MonitorEvent::LogLine { text }) => {
                    tracing::info!(output = %text, "dispatcher output");
                }
                Ok(models::MonitorEvent::DispatcherStopped) => {
                    tracing::warn!("dispatch process stopped");
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "event consumer lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let worker_handle = worker::spawn(
        worker::WorkerDeps {
            prober,
            monitors,
            dispatcher: dispatch,
            events_tx: events_tx.clone(),
            command_rx,
            shutdown_rx,
        },
        worker::WorkerConfig {
            tick_interval_ms: app_config.monitoring.tick_interval_ms,
            autostart: app_config.dispatcher.autostart,
            stats_log_interval_secs: app_config.monitoring.stats_log_interval_secs,
        },
    );

    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => Some(s),
                Err(_) => None,
            };
        match sigterm.as_mut() {
            Some(sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            None => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    tracing::info!("Received shutdown signal");
    let _ = shutdown_tx.send(());
    let _ = worker_handle.await;

    Ok(())
}
