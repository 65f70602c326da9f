//! Mixer statistics with bounded cycle history
//!
//! Stores recent mix cycles with automatic cleanup of old entries alongside
//! running counters for the whole session.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;

/// Maximum number of cycles kept in history
const MAX_HISTORY_SIZE: usize = 3000; // 60 seconds of 20ms cycles

/// A single mix cycle
#[derive(Debug, Clone)]
pub struct CycleRecord {
    /// When the cycle ran
    pub timestamp: DateTime<Utc>,
    /// Sources that contributed samples
    pub sources: usize,
    /// Longest sample set of the cycle
    pub sample_count: usize,
    /// Streams that received input
    pub streams: usize,
}

/// Running statistics calculated from recorded events
#[derive(Debug, Default, Clone, Serialize)]
pub struct RunningStats {
    /// Mix cycles run
    pub cycles: u64,
    /// Cycles where no source had audio
    pub empty_cycles: u64,
    /// Mixed frames handed to consumers
    pub frames_delivered: u64,
    /// Samples handed to consumers
    pub samples_delivered: u64,
    /// Reads that found nothing pending
    pub underruns: u64,
    /// Highest number of simultaneous contributing sources
    pub peak_sources: usize,
    /// When the last cycle ran
    pub last_cycle: Option<DateTime<Utc>>,
}

/// Statistics store for mixer activity
#[derive(Debug)]
pub struct StatsStore {
    /// Recent cycles, oldest first
    cycle_history: VecDeque<CycleRecord>,
    /// Maximum history size
    max_size: usize,
    /// Running statistics
    stats: RunningStats,
}

impl StatsStore {
    /// Create a new statistics store
    pub fn new() -> Self {
        Self::with_capacity(MAX_HISTORY_SIZE)
    }

    /// Create a store keeping at most `max_size` cycles of history
    pub fn with_capacity(max_size: usize) -> Self {
        let max_size = max_size.max(1);
        Self {
            cycle_history: VecDeque::with_capacity(max_size),
            max_size,
            stats: RunningStats::default(),
        }
    }

    /// Record a mix cycle
    ///
    /// # Arguments
    /// * `sources` - Sources that contributed samples
    /// * `sample_count` - Longest sample set of the cycle
    /// * `streams` - Streams that received input
    pub fn record_cycle(&mut self, sources: usize, sample_count: usize, streams: usize) {
        let now = Utc::now();

        if self.cycle_history.len() >= self.max_size {
            self.cycle_history.pop_front();
        }
        self.cycle_history.push_back(CycleRecord {
            timestamp: now,
            sources,
            sample_count,
            streams,
        });

        self.stats.cycles += 1;
        if sources == 0 {
            self.stats.empty_cycles += 1;
        }
        self.stats.peak_sources = self.stats.peak_sources.max(sources);
        self.stats.last_cycle = Some(now);
    }

    /// Record a frame of `samples` read by a consumer
    pub fn record_delivery(&mut self, samples: usize) {
        self.stats.frames_delivered += 1;
        self.stats.samples_delivered += samples as u64;
    }

    /// Record a read that found nothing pending
    pub fn record_underrun(&mut self) {
        self.stats.underruns += 1;
    }

    /// Get running statistics
    pub fn stats(&self) -> &RunningStats {
        &self.stats
    }

    /// Average number of contributing sources over the recorded history
    pub fn average_sources(&self) -> f64 {
        if self.cycle_history.is_empty() {
            return 0.0;
        }
        let sum: usize = self.cycle_history.iter().map(|c| c.sources).sum();
        sum as f64 / self.cycle_history.len() as f64
    }

    /// Clear all statistics
    pub fn reset(&mut self) {
        self.cycle_history.clear();
        self.stats = RunningStats::default();
    }
}

impl Default for StatsStore {
    fn default() -> Self {
        Self::new()
    }
}
