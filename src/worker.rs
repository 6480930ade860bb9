// Monitoring loop: ticks the interface monitors, recomputes the qualified
// set, and supervises the dispatch process. This task is the sole writer of
// interface and dispatcher state; presentation consumers talk to it through
// the event broadcast and the command queue.

use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{Duration, Instant, MissedTickBehavior, interval};
use tracing::Instrument;

use crate::dispatcher::DispatchOrchestrator;
use crate::iface_monitor::InterfaceMonitor;
use crate::models::{DispatcherCommand, InterfaceSnapshot, Level, MonitorEvent};
use crate::probe_repo::Prober;
use crate::process_controller::SpawnError;

/// Rate limit for "no receivers" logging (avoid a line per tick while no
/// presentation consumer is subscribed).
const NO_RECEIVERS_WARN_INTERVAL: Duration = Duration::from_secs(60);

/// Monitors, dispatcher, channels, and shutdown for the worker.
pub struct WorkerDeps<P> {
    pub prober: Arc<P>,
    pub monitors: Vec<InterfaceMonitor>,
    pub dispatcher: DispatchOrchestrator,
    pub events_tx: broadcast::Sender<MonitorEvent>,
    pub command_rx: mpsc::Receiver<DispatcherCommand>,
    pub shutdown_rx: oneshot::Receiver<()>,
}

pub struct WorkerConfig {
    pub tick_interval_ms: u64,
    /// Whether the dispatcher is meant to run before any Start command.
    pub autostart: bool,
    /// How often to log app stats (real seconds).
    pub stats_log_interval_secs: u64,
}

/// `<ip>/<weight>` for every interface currently at full access, in
/// configured iteration order.
pub fn dispatch_tokens(monitors: &[InterfaceMonitor]) -> Vec<String> {
    monitors
        .iter()
        .filter(|m| m.level() == Level::FullAccess)
        .filter_map(|m| m.ip().map(|ip| format!("{}/{}", ip, m.weight())))
        .collect()
}

fn snapshot(monitors: &[InterfaceMonitor]) -> Vec<InterfaceSnapshot> {
    monitors
        .iter()
        .map(|m| InterfaceSnapshot {
            name: m.name().to_string(),
            ip: m.ip().map(str::to_string),
            level: m.level(),
            weight: m.weight(),
            status: m.level().label().to_string(),
            color: m.level().color().to_string(),
        })
        .collect()
}

async fn apply_restart(dispatcher: &mut DispatchOrchestrator, tokens: &[String]) -> bool {
    match dispatcher.restart(tokens).await {
        Ok(running) => running,
        Err(SpawnError::ExitedEarly { status, output }) => {
            tracing::warn!(%status, output = %output, "dispatcher exited during startup");
            false
        }
        Err(e) => {
            tracing::warn!(error = %e, "dispatcher start failed");
            false
        }
    }
}

fn send_event(
    tx: &broadcast::Sender<MonitorEvent>,
    event: MonitorEvent,
    last_no_receivers_warn: &mut Option<Instant>,
) {
    if tx.send(event).is_err() {
        let should_warn =
            last_no_receivers_warn.is_none_or(|t| t.elapsed() >= NO_RECEIVERS_WARN_INTERVAL);
        if should_warn {
            tracing::debug!(
                operation = "broadcast_event",
                "no presentation consumers; event channel has no receivers"
            );
            *last_no_receivers_warn = Some(Instant::now());
        }
    }
}

pub fn spawn<P: Prober + 'static>(
    deps: WorkerDeps<P>,
    config: WorkerConfig,
) -> tokio::task::JoinHandle<()> {
    let WorkerDeps {
        prober,
        mut monitors,
        mut dispatcher,
        events_tx,
        mut command_rx,
        mut shutdown_rx,
    } = deps;
    let WorkerConfig {
        tick_interval_ms,
        autostart,
        stats_log_interval_secs,
    } = config;

    let worker_span = tracing::span!(tracing::Level::DEBUG, "worker", tick_interval_ms);
    let task = async move {
        let mut tick = interval(Duration::from_millis(tick_interval_ms));
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut stats_log_tick = interval(Duration::from_secs(stats_log_interval_secs));
        stats_log_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        // Run intent is what the user asked for; `dispatcher_live` is whether
        // we believe a process is actually up. They diverge when the qualified
        // set is empty or the child dies on its own.
        let mut intended_running = autostart;
        let mut dispatcher_live = false;
        let mut qualified: BTreeSet<String> = BTreeSet::new();
        let mut observed_output_lines = 0usize;
        let mut commands_open = true;
        let mut last_no_receivers_warn: Option<Instant> = None;

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    for monitor in monitors.iter_mut() {
                        // A failed probe degrades inside the monitor; it never
                        // prevents the sibling interfaces from updating.
                        monitor.update(prober.as_ref()).await;
                    }

                    let new_qualified: BTreeSet<String> = monitors
                        .iter()
                        .filter(|m| m.level() == Level::FullAccess)
                        .map(|m| m.name().to_string())
                        .collect();
                    let membership_changed = new_qualified != qualified;
                    let any_level_changed = monitors
                        .iter()
                        .any(|m| m.level() != m.previous_level());

                    if membership_changed {
                        send_event(&events_tx, MonitorEvent::LevelsChanged, &mut last_no_receivers_warn);
                        qualified = new_qualified;
                        if intended_running {
                            let tokens = dispatch_tokens(&monitors);
                            dispatcher_live = apply_restart(&mut dispatcher, &tokens).await;
                            observed_output_lines = 0;
                        }
                    } else if any_level_changed {
                        send_event(&events_tx, MonitorEvent::LevelsChanged, &mut last_no_receivers_warn);
                    }

                    send_event(
                        &events_tx,
                        MonitorEvent::InterfacesUpdated { interfaces: snapshot(&monitors) },
                        &mut last_no_receivers_warn,
                    );

                    if intended_running && dispatcher_live && !dispatcher.is_running() {
                        tracing::warn!("dispatch process exited on its own");
                        dispatcher_live = false;
                        send_event(&events_tx, MonitorEvent::DispatcherStopped, &mut last_no_receivers_warn);
                    }

                    if dispatcher_live && dispatcher.output_len() > observed_output_lines {
                        observed_output_lines = dispatcher.output_len();
                        if let Some(text) = dispatcher.output_snapshot() {
                            send_event(&events_tx, MonitorEvent::LogLine { text }, &mut last_no_receivers_warn);
                        }
                    }
                }
                command = command_rx.recv(), if commands_open => {
                    match command {
                        Some(DispatcherCommand::Start) => {
                            intended_running = true;
                            let tokens = dispatch_tokens(&monitors);
                            dispatcher_live = apply_restart(&mut dispatcher, &tokens).await;
                            observed_output_lines = 0;
                        }
                        Some(DispatcherCommand::Stop) => {
                            intended_running = false;
                            dispatcher.stop().await;
                            dispatcher_live = false;
                        }
                        None => {
                            tracing::debug!("command channel closed");
                            commands_open = false;
                        }
                    }
                }
                _ = &mut shutdown_rx => {
                    tracing::debug!("Worker shutting down");
                    break;
                }
                _ = stats_log_tick.tick() => {
                    tracing::info!(
                        qualified_interfaces = qualified.len(),
                        dispatcher_running = dispatcher_live,
                        "app stats"
                    );
                }
            }
        }

        // Cooperative shutdown: no more ticks, then stop the child in place.
        dispatcher.stop().await;
    };
    tokio::spawn(task.instrument(worker_span))
}
