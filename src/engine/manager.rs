use crate::capture::{FrameSource, SourceConfig};
use crate::display::DisplaySink;
use crate::engine::context::{CaptureOutcome, EngineContext};
use crate::engine::{Command, EngineConfig, EngineStatus};
use chrono::Utc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};

/// Engine counters
#[derive(Default)]
pub struct EngineStats {
    pub frames_captured: AtomicU64,
    pub frames_evicted: AtomicU64,
    pub frames_ignored: AtomicU64,
    pub frames_delivered: AtomicU64,
    pub source_errors: AtomicU64,
    pub start_time: Arc<Mutex<Option<chrono::DateTime<Utc>>>>,
}

/// Replay engine facade that owns the background tasks
///
/// Spawns one task pumping the capture source and one engine task that is
/// the sole writer of all engine state; the facade itself only exchanges
/// commands and status snapshots with them.
pub struct ReplayEngine {
    status: Arc<Mutex<EngineStatus>>,
    stats: Arc<EngineStats>,
    stop_signal: Arc<AtomicBool>,
    cmd_tx: Option<mpsc::Sender<Command>>,
}

impl Default for ReplayEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplayEngine {
    pub fn new() -> Self {
        Self {
            status: Arc::new(Mutex::new(EngineStatus::default())),
            stats: Arc::new(EngineStats::default()),
            stop_signal: Arc::new(AtomicBool::new(false)),
            cmd_tx: None,
        }
    }

    /// Start capture and the engine loop
    pub async fn start<S, K>(
        &mut self,
        mut source: S,
        sink: K,
        config: EngineConfig,
        source_config: SourceConfig,
    ) -> Result<(), String>
    where
        S: FrameSource + 'static,
        K: DisplaySink + 'static,
    {
        config.validate()?;
        if self.cmd_tx.is_some() {
            return Err("engine already running".to_string());
        }

        // Reset stats
        self.stats.frames_captured.store(0, Ordering::SeqCst);
        self.stats.frames_evicted.store(0, Ordering::SeqCst);
        self.stats.frames_ignored.store(0, Ordering::SeqCst);
        self.stats.frames_delivered.store(0, Ordering::SeqCst);
        self.stats.source_errors.store(0, Ordering::SeqCst);
        *self.stats.start_time.lock().await = Some(Utc::now());

        self.stop_signal.store(false, Ordering::SeqCst);

        source
            .connect(source_config)
            .await
            .map_err(|e| format!("Failed to connect source: {}", e))?;

        let (frame_tx, frame_rx) = mpsc::channel(1000);
        let (cmd_tx, cmd_rx) = mpsc::channel(32);
        self.cmd_tx = Some(cmd_tx);

        // Source pump: frames flow in at the source's own cadence
        let stats = self.stats.clone();
        let stop_signal = self.stop_signal.clone();
        tokio::spawn(async move {
            Self::run_source(source, frame_tx, stats, stop_signal).await;
        });

        // Engine loop: single writer of buffer, mode, cursor, scheduler
        let status = self.status.clone();
        let stats = self.stats.clone();
        let stop_signal = self.stop_signal.clone();
        tokio::spawn(async move {
            Self::run_engine(config, frame_rx, cmd_rx, sink, status, stats, stop_signal).await;
        });

        Ok(())
    }

    async fn run_source<S: FrameSource>(
        mut source: S,
        frame_tx: mpsc::Sender<crate::core::Frame>,
        stats: Arc<EngineStats>,
        stop_signal: Arc<AtomicBool>,
    ) {
        loop {
            if stop_signal.load(Ordering::SeqCst) {
                break;
            }

            match source.next_frame().await {
                Ok(Some(frame)) => {
                    if frame_tx.send(frame).await.is_err() {
                        break;
                    }
                }
                Ok(None) => {
                    // No frame ready, back off briefly
                    tokio::time::sleep(std::time::Duration::from_millis(1)).await;
                }
                Err(e) => {
                    stats.source_errors.fetch_add(1, Ordering::SeqCst);
                    warn!("source error: {}", e);
                    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                }
            }
        }

        if let Err(e) = source.disconnect().await {
            warn!("source disconnect failed: {}", e);
        }
        debug!("source pump stopped");
    }

    async fn run_engine<K: DisplaySink>(
        config: EngineConfig,
        mut frame_rx: mpsc::Receiver<crate::core::Frame>,
        mut cmd_rx: mpsc::Receiver<Command>,
        mut sink: K,
        status: Arc<Mutex<EngineStatus>>,
        stats: Arc<EngineStats>,
        stop_signal: Arc<AtomicBool>,
    ) {
        let mut ctx = EngineContext::new(config);
        *status.lock().await = ctx.status();

        loop {
            if stop_signal.load(Ordering::SeqCst) {
                break;
            }

            let deadline = ctx.deadline();
            tokio::select! {
                maybe_frame = frame_rx.recv() => {
                    match maybe_frame {
                        Some(frame) => {
                            match ctx.on_frame(frame) {
                                CaptureOutcome::Stored { evicted } => {
                                    stats.frames_captured.fetch_add(1, Ordering::SeqCst);
                                    if evicted {
                                        stats.frames_evicted.fetch_add(1, Ordering::SeqCst);
                                    }
                                }
                                CaptureOutcome::Ignored => {
                                    stats.frames_ignored.fetch_add(1, Ordering::SeqCst);
                                }
                            }
                            *status.lock().await = ctx.status();
                        }
                        None => break,
                    }
                }
                maybe_cmd = cmd_rx.recv() => {
                    match maybe_cmd {
                        Some(cmd) => {
                            debug!("command: {:?}", cmd);
                            if let Some(frame) = ctx.handle(cmd) {
                                sink.present(&frame);
                                stats.frames_delivered.fetch_add(1, Ordering::SeqCst);
                            }
                            *status.lock().await = ctx.status();
                        }
                        None => break,
                    }
                }
                _ = tokio::time::sleep_until(deadline.unwrap_or_else(tokio::time::Instant::now)),
                    if deadline.is_some() =>
                {
                    if let Some(frame) = ctx.tick() {
                        sink.present(&frame);
                        stats.frames_delivered.fetch_add(1, Ordering::SeqCst);
                    }
                    *status.lock().await = ctx.status();
                }
            }
        }
        debug!("engine loop stopped");
    }

    /// Send a command into the engine
    pub async fn command(&self, command: Command) -> Result<(), String> {
        match &self.cmd_tx {
            Some(tx) => tx
                .send(command)
                .await
                .map_err(|e| format!("Failed to send command: {}", e)),
            None => Err("engine not running".to_string()),
        }
    }

    /// Latest status snapshot
    pub async fn status(&self) -> EngineStatus {
        self.status.lock().await.clone()
    }

    /// Engine counters
    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    /// Stop the engine and source tasks
    pub async fn stop(&mut self) {
        self.stop_signal.store(true, Ordering::SeqCst);
        self.cmd_tx = None;
    }
}
