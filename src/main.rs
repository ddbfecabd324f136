mod capture;
mod core;
mod display;
mod engine;
mod playback;

use capture::{MockFrameSource, SourceConfig};
use display::ChannelSink;
use engine::{Command, EngineConfig, ReplayEngine};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

/// Persistent application settings
#[derive(Serialize, Deserialize)]
struct AppSettings {
    capture_fps: u32,
    buffer_secs: u32,
    min_frame_interval_ms: u64,
    speed_steps: Vec<f64>,
    frame_width: u32,
    frame_height: u32,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            capture_fps: 60,
            buffer_secs: 5,
            min_frame_interval_ms: 16,
            speed_steps: vec![0.1, 0.25, 0.5, 1.0, 2.0],
            frame_width: 320,
            frame_height: 180,
        }
    }
}

impl AppSettings {
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("rewind").join("settings.json"))
    }

    fn load() -> Self {
        if let Some(path) = Self::config_path() {
            if path.exists() {
                if let Ok(contents) = fs::read_to_string(&path) {
                    if let Ok(settings) = serde_json::from_str(&contents) {
                        return settings;
                    }
                }
            }
        }
        Self::default()
    }

    fn save(&self) {
        if let Some(path) = Self::config_path() {
            if let Some(parent) = path.parent() {
                let _ = fs::create_dir_all(parent);
            }
            if let Ok(json) = serde_json::to_string_pretty(self) {
                let _ = fs::write(&path, json);
            }
        }
    }

    fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            capture_fps: self.capture_fps,
            buffer_secs: self.buffer_secs,
            min_frame_interval: Duration::from_millis(self.min_frame_interval_ms),
            speed_steps: self.speed_steps.clone(),
        }
    }

    fn source_config(&self) -> SourceConfig {
        SourceConfig {
            fps: self.capture_fps,
            width: self.frame_width,
            height: self.frame_height,
        }
    }
}

fn print_help() {
    println!("commands:");
    println!("  m        toggle record/replay");
    println!("  p        pause/resume replay");
    println!("  s        cycle playback speed");
    println!("  l        set/complete/clear A-B loop point");
    println!("  k <0-1>  seek to fraction of the replay");
    println!("  .        step one frame forward");
    println!("  ,        step one frame back");
    println!("  i        show status");
    println!("  q        quit");
}

fn parse_command(line: &str) -> Option<Command> {
    let mut parts = line.split_whitespace();
    match parts.next()? {
        "m" => Some(Command::ToggleMode),
        "p" => Some(Command::TogglePause),
        "s" => Some(Command::CycleSpeed),
        "l" => Some(Command::ToggleLoopPoint),
        "." => Some(Command::StepForward),
        "," => Some(Command::StepBack),
        "k" => {
            let fraction: f64 = parts.next()?.parse().ok()?;
            Some(Command::SeekToFraction(fraction))
        }
        _ => None,
    }
}

async fn run() -> Result<()> {
    let settings = AppSettings::load();
    settings.save();

    let mut source = MockFrameSource::new("mock://capture");
    source.set_auto_generate(true);

    let (sink, mut frame_rx) = ChannelSink::new(16);

    let mut replay_engine = ReplayEngine::new();
    replay_engine
        .start(
            source,
            sink,
            settings.engine_config(),
            settings.source_config(),
        )
        .await
        .map_err(|e| anyhow::anyhow!(e))?;

    info!(
        "capturing at {} fps into a {}s buffer",
        settings.capture_fps, settings.buffer_secs
    );

    // Drain delivered frames to the terminal "display"
    tokio::spawn(async move {
        while let Some(frame) = frame_rx.recv().await {
            println!(
                "frame seq={} {}x{} captured_at={}",
                frame.seq,
                frame.width,
                frame.height,
                frame.captured_at.format("%H:%M:%S%.3f")
            );
        }
    });

    print_help();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }
        if line == "q" {
            break;
        }
        if line == "i" {
            println!("{}", replay_engine.status().await.status_text);
            continue;
        }

        match parse_command(&line) {
            Some(command) => {
                if let Err(e) = replay_engine.command(command).await {
                    eprintln!("command failed: {}", e);
                    break;
                }
                // Give the engine a beat to apply it, then echo the result
                tokio::time::sleep(Duration::from_millis(10)).await;
                println!("{}", replay_engine.status().await.status_text);
            }
            None => print_help(),
        }
    }

    replay_engine.stop().await;
    let stats = replay_engine.stats();
    println!(
        "captured {} frames ({} evicted), delivered {}",
        stats
            .frames_captured
            .load(std::sync::atomic::Ordering::SeqCst),
        stats
            .frames_evicted
            .load(std::sync::atomic::Ordering::SeqCst),
        stats
            .frames_delivered
            .load(std::sync::atomic::Ordering::SeqCst),
    );
    Ok(())
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Create tokio runtime for async operations
    let rt = tokio::runtime::Runtime::new().expect("Failed to create Tokio runtime");
    rt.block_on(run())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command("m"), Some(Command::ToggleMode));
        assert_eq!(parse_command("p"), Some(Command::TogglePause));
        assert_eq!(parse_command("k 0.5"), Some(Command::SeekToFraction(0.5)));
        assert_eq!(parse_command("k"), None);
        assert_eq!(parse_command("x"), None);
    }

    #[test]
    fn test_settings_engine_config_roundtrip() {
        let settings = AppSettings::default();
        let config = settings.engine_config();
        assert_eq!(config.buffer_capacity(), 300);
        assert!(config.validate().is_ok());
    }
}
