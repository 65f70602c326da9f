//! Input sources feeding the mixer
//!
//! A source hands the mixer at most one [`SampleSet`] per mix cycle. The
//! [`BufferedSource`] implementation decouples the capture/decode thread that
//! produces audio from the cycle that consumes it through a ring buffer.

use super::format::{decode, AudioFormat, FormatError};
use super::lock;
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::HeapRb;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Samples contributed by one source in one mix cycle
///
/// Shared between every listener stream of the cycle without copying.
pub type SampleSet = Arc<[i32]>;

/// Identity of an input source within a mixer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(u64);

static NEXT_SOURCE_ID: AtomicU64 = AtomicU64::new(1);

impl SourceId {
    /// Allocate a process-unique id
    pub fn next() -> Self {
        Self(NEXT_SOURCE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw id value
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "source-{}", self.0)
    }
}

/// A producer of per-cycle audio for the mixer
pub trait InputSource: Send + Sync {
    /// Identity used for listener exclusion
    fn id(&self) -> SourceId;

    /// Samples for the current cycle, or `None` when the source has nothing
    fn read_samples(&self) -> Option<SampleSet>;
}

/// Ring-buffered input source
///
/// Capture or decode threads [`push`](Self::push) samples; each mix cycle
/// drains up to `frame_samples` of them. Samples that do not fit into the
/// ring are dropped and counted.
///
/// # Example
/// ```
/// use confmix_core::audio::source::{BufferedSource, InputSource};
///
/// let source = BufferedSource::new(4, 16);
/// source.push(&[1, 2, 3, 4, 5, 6]);
///
/// assert_eq!(&*source.read_samples().unwrap(), &[1, 2, 3, 4]);
/// assert_eq!(&*source.read_samples().unwrap(), &[5, 6]);
/// assert!(source.read_samples().is_none());
/// ```
pub struct BufferedSource {
    id: SourceId,
    frame_samples: usize,
    producer: Mutex<ringbuf::HeapProd<i32>>,
    consumer: Mutex<ringbuf::HeapCons<i32>>,
    dropped: AtomicU64,
}

impl BufferedSource {
    /// Create a source handing out at most `frame_samples` per cycle from a
    /// ring of `capacity` samples
    pub fn new(frame_samples: usize, capacity: usize) -> Self {
        let (producer, consumer) = HeapRb::<i32>::new(capacity.max(1)).split();
        Self {
            id: SourceId::next(),
            frame_samples: frame_samples.max(1),
            producer: Mutex::new(producer),
            consumer: Mutex::new(consumer),
            dropped: AtomicU64::new(0),
        }
    }

    /// Append samples, returning how many were accepted
    pub fn push(&self, samples: &[i32]) -> usize {
        let accepted = lock(&self.producer).push_slice(samples);

        let dropped = samples.len() - accepted;
        if dropped > 0 {
            self.dropped.fetch_add(dropped as u64, Ordering::Relaxed);
            tracing::debug!(source = %self.id, dropped, "Source ring full, dropping samples");
        }
        accepted
    }

    /// Decode `bytes` in `format` and append the samples
    pub fn push_bytes(&self, bytes: &[u8], format: &AudioFormat) -> Result<usize, FormatError> {
        let samples = decode(bytes, format)?;
        Ok(self.push(&samples))
    }

    /// Samples waiting for the next cycles
    pub fn buffered(&self) -> usize {
        lock(&self.consumer).occupied_len()
    }

    /// Total samples dropped because the ring was full
    pub fn dropped_samples(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Maximum samples handed out per cycle
    pub fn frame_samples(&self) -> usize {
        self.frame_samples
    }
}

impl InputSource for BufferedSource {
    fn id(&self) -> SourceId {
        self.id
    }

    fn read_samples(&self) -> Option<SampleSet> {
        let mut frame = vec![0i32; self.frame_samples];
        let read = lock(&self.consumer).pop_slice(&mut frame);

        if read == 0 {
            return None;
        }
        frame.truncate(read);
        Some(frame.into())
    }
}

impl fmt::Debug for BufferedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferedSource")
            .field("id", &self.id)
            .field("frame_samples", &self.frame_samples)
            .field("dropped", &self.dropped_samples())
            .finish()
    }
}
