use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use scout_logging::scout_warn;
use tokio_util::sync::CancellationToken;

use crate::bridge::{run_event_pump, Bridge, BridgeSettings, ChannelEventSink, HttpBridge};
use crate::types::{BridgeError, ClientCommand, EngineEvent};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub bridge: BridgeSettings,
    /// Interval of the watchdog's recurring check while armed.
    pub watchdog_tick: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bridge: BridgeSettings::default(),
            watchdog_tick: Duration::from_secs(1),
        }
    }
}

enum EngineCommand {
    Send(ClientCommand),
    ArmWatchdog,
    DisarmWatchdog,
}

/// Handle to the engine thread. Commands go in; backend events, watchdog
/// ticks, and delivery failures come out. Shareable across threads behind
/// an `Arc`; the receiver is guarded so one side can pump events while
/// another dispatches commands.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: Mutex<mpsc::Receiver<EngineEvent>>,
}

impl EngineHandle {
    pub fn new(config: EngineConfig) -> Result<Self, BridgeError> {
        let bridge = Arc::new(HttpBridge::new(config.bridge.clone())?);
        Ok(Self::with_bridge(bridge, config))
    }

    /// Start the engine over any bridge implementation (tests inject
    /// doubles here).
    pub fn with_bridge(bridge: Arc<dyn Bridge>, config: EngineConfig) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
            let pump_cancel = CancellationToken::new();
            let sink = Arc::new(ChannelEventSink::new(event_tx.clone()));
            runtime.spawn(run_event_pump(
                bridge.clone(),
                sink,
                pump_cancel.clone(),
                config.bridge.reconnect_delay,
            ));

            let mut watchdog: Option<CancellationToken> = None;
            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::Send(command) => {
                        let bridge = bridge.clone();
                        let event_tx = event_tx.clone();
                        runtime.spawn(async move {
                            if let Err(err) = bridge.send(command.clone()).await {
                                scout_warn!("command delivery failed: {}", err);
                                let _ = event_tx.send(EngineEvent::CommandFailed {
                                    command,
                                    message: err.to_string(),
                                });
                            }
                        });
                    }
                    EngineCommand::ArmWatchdog => {
                        // Re-arming replaces any previous ticker.
                        if let Some(token) = watchdog.take() {
                            token.cancel();
                        }
                        let token = CancellationToken::new();
                        runtime.spawn(run_watchdog(
                            config.watchdog_tick,
                            event_tx.clone(),
                            token.clone(),
                        ));
                        watchdog = Some(token);
                    }
                    EngineCommand::DisarmWatchdog => {
                        if let Some(token) = watchdog.take() {
                            token.cancel();
                        }
                    }
                }
            }

            // Handle dropped: tear every task down.
            pump_cancel.cancel();
            if let Some(token) = watchdog.take() {
                token.cancel();
            }
        });

        Self {
            cmd_tx,
            event_rx: Mutex::new(event_rx),
        }
    }

    pub fn send(&self, command: ClientCommand) {
        let _ = self.cmd_tx.send(EngineCommand::Send(command));
    }

    pub fn arm_watchdog(&self) {
        let _ = self.cmd_tx.send(EngineCommand::ArmWatchdog);
    }

    pub fn disarm_watchdog(&self) {
        let _ = self.cmd_tx.send(EngineCommand::DisarmWatchdog);
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        let rx = self.event_rx.lock().ok()?;
        rx.try_recv().ok()
    }
}

async fn run_watchdog(
    tick: Duration,
    event_tx: mpsc::Sender<EngineEvent>,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(tick);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = interval.tick() => {
                let tick = EngineEvent::WatchdogTick { now_ms: epoch_ms() };
                if event_tx.send(tick).is_err() {
                    return;
                }
            }
        }
    }
}

/// Milliseconds since the Unix epoch.
pub fn epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}
