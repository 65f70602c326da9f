//! Conference mixer core
//!
//! Owns the registry of input sources and listener streams and runs one mix
//! cycle every time a source signals new audio.
//!
//! ## Registry discipline
//!
//! The registry is an immutable `Registry` value behind a single `Mutex`.
//! Writers (attach/detach, exclusion updates) clone it, modify the clone and
//! swap it in while holding the lock. A cycle only holds the lock long enough
//! to clone the `Arc`, then iterates that snapshot unlocked. A cycle therefore
//! sees a source or stream either fully registered or not at all, and a
//! stream added while a cycle runs gets data from the next cycle on.
//!
//! ## Threading
//!
//! There is no mixer thread. The cycle runs synchronously on whichever thread
//! called [`MixerCore::on_data_available`], including the transfer handlers
//! of every listener stream.

use super::format::{AudioFormat, FormatError};
use super::lock;
use super::source::{BufferedSource, InputSource, SampleSet, SourceId};
use super::stream::{ListenerStream, StreamId};
use crate::stats::store::{RunningStats, StatsStore};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

#[derive(Clone)]
struct OutputEntry {
    stream: Arc<ListenerStream>,
    excluded: Arc<HashSet<SourceId>>,
}

/// Snapshot of the attached sources and streams, in registration order
#[derive(Clone, Default)]
struct Registry {
    sources: Vec<Arc<dyn InputSource>>,
    outputs: Vec<OutputEntry>,
}

/// Outcome of one mix cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Sources that contributed samples
    pub contributing_sources: usize,
    /// Longest sample set of the cycle
    pub max_sample_count: usize,
    /// Streams that received input
    pub streams_fed: usize,
}

/// N-way conference mixer
pub struct MixerCore {
    format: AudioFormat,
    registry: Mutex<Arc<Registry>>,
    stopped: AtomicBool,
    stats: Mutex<StatsStore>,
    self_ref: Weak<MixerCore>,
}

impl MixerCore {
    /// Create a mixer producing `format`
    ///
    /// Fails if the format has no usable maximum sample value.
    ///
    /// # Example
    /// ```
    /// use confmix_core::audio::format::AudioFormat;
    /// use confmix_core::audio::mixer::MixerCore;
    ///
    /// assert!(MixerCore::new(AudioFormat::pcm16_mono()).is_ok());
    /// assert!(MixerCore::new(AudioFormat::linear(24, 1)).is_err());
    /// ```
    pub fn new(format: AudioFormat) -> Result<Arc<Self>, FormatError> {
        format.validate()?;
        tracing::info!(
            bits = format.sample_size_bits,
            channels = format.channels,
            "Mixer created"
        );

        Ok(Arc::new_cyclic(|self_ref| Self {
            format,
            registry: Mutex::new(Arc::new(Registry::default())),
            stopped: AtomicBool::new(false),
            stats: Mutex::new(StatsStore::new()),
            self_ref: self_ref.clone(),
        }))
    }

    /// Output format of every stream of this mixer
    pub fn format(&self) -> AudioFormat {
        self.format
    }

    fn snapshot(&self) -> Arc<Registry> {
        Arc::clone(&lock(&self.registry))
    }

    fn update_registry<R>(&self, f: impl FnOnce(&mut Registry) -> R) -> R {
        let mut current = lock(&self.registry);
        let mut next = Registry::clone(&current);
        let result = f(&mut next);
        *current = Arc::new(next);
        result
    }

    /// Attach an input source
    ///
    /// Returns `false` if a source with the same id is already attached.
    pub fn add_input_source(&self, source: Arc<dyn InputSource>) -> bool {
        let id = source.id();
        let added = self.update_registry(|registry| {
            if registry.sources.iter().any(|s| s.id() == id) {
                return false;
            }
            registry.sources.push(source);
            true
        });
        if added {
            tracing::debug!(source = %id, "Input source attached");
        }
        added
    }

    /// Detach an input source
    pub fn remove_input_source(&self, id: SourceId) -> bool {
        let removed = self.update_registry(|registry| {
            let before = registry.sources.len();
            registry.sources.retain(|s| s.id() != id);
            registry.sources.len() != before
        });
        if removed {
            tracing::debug!(source = %id, "Input source detached");
        }
        removed
    }

    /// Create a listener stream of this mixer that leaves `excluded` out of
    /// its mix
    ///
    /// The stream receives nothing until it is started.
    pub fn create_output_stream<I>(&self, excluded: I) -> Arc<ListenerStream>
    where
        I: IntoIterator<Item = SourceId>,
    {
        Arc::new(ListenerStream::new(
            self.self_ref.clone(),
            self.format,
            excluded.into_iter().collect(),
        ))
    }

    /// Register a listener stream for upcoming cycles
    ///
    /// Returns `false` if the stream is already registered.
    pub fn add_output_stream(&self, stream: &Arc<ListenerStream>) -> bool {
        let id = stream.id();
        let added = self.update_registry(|registry| {
            if registry.outputs.iter().any(|o| o.stream.id() == id) {
                return false;
            }
            registry.outputs.push(OutputEntry {
                stream: Arc::clone(stream),
                excluded: Arc::new(stream.excluded_sources()),
            });
            stream.mark_started(true);
            true
        });
        if added {
            tracing::debug!(stream = %id, "Output stream started");
        }
        added
    }

    /// Unregister a listener stream
    pub fn remove_output_stream(&self, id: StreamId) -> bool {
        let removed = self.update_registry(|registry| {
            let position = registry.outputs.iter().position(|o| o.stream.id() == id)?;
            let entry = registry.outputs.remove(position);
            entry.stream.mark_started(false);
            Some(())
        });
        if removed.is_some() {
            tracing::debug!(stream = %id, "Output stream stopped");
        }
        removed.is_some()
    }

    /// Replace the exclusion set of a listener stream
    ///
    /// Takes effect from the next cycle whether or not the stream is started.
    pub fn set_exclusions<I>(&self, stream: &ListenerStream, excluded: I)
    where
        I: IntoIterator<Item = SourceId>,
    {
        let excluded: HashSet<SourceId> = excluded.into_iter().collect();
        let id = stream.id();
        self.update_registry(|registry| {
            if let Some(entry) = registry.outputs.iter_mut().find(|o| o.stream.id() == id) {
                entry.excluded = Arc::new(excluded.clone());
            }
            stream.replace_excluded(excluded);
        });
    }

    /// Number of attached sources
    pub fn source_count(&self) -> usize {
        self.snapshot().sources.len()
    }

    /// Number of started streams
    pub fn output_count(&self) -> usize {
        self.snapshot().outputs.len()
    }

    /// Run one mix cycle
    ///
    /// Reads one sample set from every source in registration order and
    /// hands each started stream the sets it does not exclude. Sources with
    /// nothing to contribute are skipped. Does nothing once the mixer is
    /// stopped or when no source has audio.
    pub fn on_data_available(&self) -> CycleReport {
        if self.is_stopped() {
            tracing::trace!("Mixer stopped, ignoring push");
            return CycleReport::default();
        }

        let registry = self.snapshot();

        let inputs: Vec<(SourceId, SampleSet)> = registry
            .sources
            .iter()
            .filter_map(|source| {
                source
                    .read_samples()
                    .filter(|samples| !samples.is_empty())
                    .map(|samples| (source.id(), samples))
            })
            .collect();

        let max_sample_count = inputs.iter().map(|(_, s)| s.len()).max().unwrap_or(0);
        if inputs.is_empty() {
            lock(&self.stats).record_cycle(0, 0, 0);
            return CycleReport::default();
        }

        for output in &registry.outputs {
            let samples: Vec<SampleSet> = inputs
                .iter()
                .filter(|(id, _)| !output.excluded.contains(id))
                .map(|(_, samples)| Arc::clone(samples))
                .collect();
            output.stream.set_input_samples(samples, max_sample_count);
        }

        let report = CycleReport {
            contributing_sources: inputs.len(),
            max_sample_count,
            streams_fed: registry.outputs.len(),
        };
        lock(&self.stats).record_cycle(
            report.contributing_sources,
            report.max_sample_count,
            report.streams_fed,
        );
        tracing::trace!(
            sources = report.contributing_sources,
            samples = report.max_sample_count,
            streams = report.streams_fed,
            "Mix cycle"
        );
        report
    }

    /// Append samples to a buffered source and run a cycle
    pub fn push(&self, source: &BufferedSource, samples: &[i32]) -> CycleReport {
        source.push(samples);
        self.on_data_available()
    }

    /// Stop processing cycles; streams report end of stream
    pub fn stop(&self) {
        if !self.stopped.swap(true, Ordering::AcqRel) {
            tracing::info!("Mixer stopped");
        }
    }

    /// Whether the mixer has been stopped
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Running statistics
    pub fn stats(&self) -> RunningStats {
        lock(&self.stats).stats().clone()
    }

    /// Average number of contributing sources over recent cycles
    pub fn average_sources(&self) -> f64 {
        lock(&self.stats).average_sources()
    }

    /// Clear collected statistics
    pub fn reset_stats(&self) {
        lock(&self.stats).reset();
    }

    pub(crate) fn record_delivery(&self, samples: usize) {
        lock(&self.stats).record_delivery(samples);
    }

    pub(crate) fn record_underrun(&self) {
        lock(&self.stats).record_underrun();
    }
}

impl std::fmt::Debug for MixerCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.snapshot();
        f.debug_struct("MixerCore")
            .field("format", &self.format)
            .field("sources", &registry.sources.len())
            .field("outputs", &registry.outputs.len())
            .field("stopped", &self.is_stopped())
            .finish()
    }
}
