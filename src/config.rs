//! Run-wide settings and named timers.
//!
//! One `RunContext` is created at startup and handed to whatever needs
//! the output directory, the block layout or a timer.

use crate::error::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub output_dir: PathBuf,
    pub log_level: String,
    /// Zero lets rayon pick.
    pub num_threads: usize,
    /// Edge length of the blocks a multi-block field is split into.
    pub block_size: i32,
    pub envelope_width: i32,
    /// Work unit size for rayon chunked loops.
    pub chunk_size: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            output_dir: PathBuf::from("./tmp"),
            log_level: "info".to_string(),
            num_threads: 0,
            block_size: 64,
            envelope_width: 1,
            chunk_size: 1024,
        }
    }
}

impl RunConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: RunConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.block_size < 1 {
            return Err(LatticeError::Config(format!(
                "block_size must be positive, got {}",
                self.block_size
            )));
        }
        if self.envelope_width < 0 {
            return Err(LatticeError::Config(format!(
                "envelope_width must not be negative, got {}",
                self.envelope_width
            )));
        }
        if self.chunk_size == 0 {
            return Err(LatticeError::Config(
                "chunk_size must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Path of a file inside the output directory.
    pub fn output_file(&self, name: &str) -> PathBuf {
        let mut result = self.output_dir.clone();
        result.push(name);
        result
    }
}

#[derive(Debug, Default, Clone)]
pub struct Timer {
    started: Option<Instant>,
    accumulated: Duration,
}

impl Timer {
    pub fn start(&mut self) {
        if self.started.is_none() {
            self.started = Some(Instant::now());
        }
    }

    pub fn stop(&mut self) -> Duration {
        if let Some(start) = self.started.take() {
            self.accumulated += start.elapsed();
        }
        self.accumulated
    }

    pub fn restart(&mut self) {
        self.accumulated = Duration::ZERO;
        self.started = Some(Instant::now());
    }

    pub fn elapsed(&self) -> Duration {
        self.accumulated
            + self.started.map(|s| s.elapsed()).unwrap_or(Duration::ZERO)
    }

    pub fn is_running(&self) -> bool {
        self.started.is_some()
    }
}

/// Timers keyed by name, created on first use.
#[derive(Debug, Default, Clone)]
pub struct TimerRegistry {
    timers: HashMap<String, Timer>,
}

impl TimerRegistry {
    pub fn timer(&mut self, name: &str) -> &mut Timer {
        self.timers.entry(name.to_string()).or_default()
    }

    pub fn start(&mut self, name: &str) {
        self.timer(name).start();
    }

    pub fn stop(&mut self, name: &str) -> Duration {
        self.timer(name).stop()
    }

    pub fn elapsed(&self, name: &str) -> Option<Duration> {
        self.timers.get(name).map(|t| t.elapsed())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.timers.keys().map(|k| k.as_str())
    }
}

#[derive(Debug, Default)]
pub struct RunContext {
    pub config: RunConfig,
    pub timers: TimerRegistry,
}

impl RunContext {
    pub fn new(config: RunConfig) -> Self {
        RunContext {
            config,
            timers: TimerRegistry::default(),
        }
    }

    /// Create the output directory if it does not exist yet.
    pub fn prepare_output_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.config.output_dir)
            .map_err(|e| LatticeError::from(e).report())?;
        tracing::info!(
            "Ensured output directory exists: {}",
            self.config.output_dir.display()
        );
        Ok(())
    }
}
