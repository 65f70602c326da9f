//! Personalised per-listener output streams
//!
//! Every conference participant reads the mix through its own
//! [`ListenerStream`]. The mixer core pushes the sample sets of a cycle into
//! the stream (already filtered by the listener's exclusion set) and the
//! stream mixes and encodes them when the consumer reads.
//!
//! ## Push model
//!
//! [`ListenerStream::set_input_samples`] keeps only the latest cycle and
//! notifies the registered [`TransferHandler`] on the producer's thread.
//! Handlers must return quickly: they run inside the mix cycle of whichever
//! source pushed audio. [`ChannelTransferHandler`] moves the wake-up onto a
//! bounded channel for consumers that prefer their own thread.

use super::format::{encode, AudioFormat, FormatError};
use super::lock;
use super::mixer::MixerCore;
use super::mixing::mix;
use super::source::{SampleSet, SourceId};
use crossbeam_channel::{Receiver, Sender, TrySendError};
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

/// Identity of a listener stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamId(u64);

static NEXT_STREAM_ID: AtomicU64 = AtomicU64::new(1);

impl StreamId {
    fn next() -> Self {
        Self(NEXT_STREAM_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw id value
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stream-{}", self.0)
    }
}

/// Receives "new data available" notifications from a listener stream
///
/// Called on the thread that ran the mix cycle. Implementations must not
/// block or perform long-running I/O.
pub trait TransferHandler: Send + Sync {
    fn transfer_data(&self, stream: &ListenerStream);
}

impl<F> TransferHandler for F
where
    F: Fn(&ListenerStream) + Send + Sync,
{
    fn transfer_data(&self, stream: &ListenerStream) {
        self(stream)
    }
}

/// Transfer handler forwarding notifications over a bounded channel
///
/// A full channel drops the notification instead of blocking the mix cycle.
/// Nothing is lost by that: the stream only ever holds the latest cycle, and
/// a queued notification already covers it.
#[derive(Debug, Clone)]
pub struct ChannelTransferHandler {
    tx: Sender<StreamId>,
}

impl ChannelTransferHandler {
    /// Create a handler and the receiving end of its queue
    pub fn bounded(capacity: usize) -> (Self, Receiver<StreamId>) {
        let (tx, rx) = crossbeam_channel::bounded(capacity.max(1));
        (Self { tx }, rx)
    }
}

impl TransferHandler for ChannelTransferHandler {
    fn transfer_data(&self, stream: &ListenerStream) {
        match self.tx.try_send(stream.id()) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                tracing::trace!(stream = %stream.id(), "Handoff queue full, notification coalesced");
            }
            Err(TrySendError::Disconnected(_)) => {
                tracing::debug!(stream = %stream.id(), "Handoff receiver gone");
            }
        }
    }
}

struct PendingInput {
    samples: Vec<SampleSet>,
    max_count: usize,
}

/// Output stream carrying the mix personalised for one listener
pub struct ListenerStream {
    id: StreamId,
    format: AudioFormat,
    core: Weak<MixerCore>,
    excluded: Mutex<HashSet<SourceId>>,
    pending: Mutex<Option<PendingInput>>,
    transfer_handler: Mutex<Option<Arc<dyn TransferHandler>>>,
    started: AtomicBool,
}

impl ListenerStream {
    pub(crate) fn new(
        core: Weak<MixerCore>,
        format: AudioFormat,
        excluded: HashSet<SourceId>,
    ) -> Self {
        Self {
            id: StreamId::next(),
            format,
            core,
            excluded: Mutex::new(excluded),
            pending: Mutex::new(None),
            transfer_handler: Mutex::new(None),
            started: AtomicBool::new(false),
        }
    }

    /// Stream identity
    pub fn id(&self) -> StreamId {
        self.id
    }

    /// Output format, fixed for the lifetime of the stream
    pub fn format(&self) -> AudioFormat {
        self.format
    }

    /// Sources left out of this listener's mix
    pub fn excluded_sources(&self) -> HashSet<SourceId> {
        lock(&self.excluded).clone()
    }

    pub(crate) fn replace_excluded(&self, excluded: HashSet<SourceId>) {
        *lock(&self.excluded) = excluded;
    }

    /// Whether the stream is registered with its mixer
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    pub(crate) fn mark_started(&self, started: bool) {
        self.started.store(started, Ordering::Release);
    }

    /// Whether the owning mixer has stopped or gone away
    pub fn end_of_stream(&self) -> bool {
        self.core
            .upgrade()
            .map(|core| core.is_stopped())
            .unwrap_or(true)
    }

    /// Register the handler notified when a cycle delivers new input
    pub fn set_transfer_handler<H>(&self, handler: H)
    where
        H: TransferHandler + 'static,
    {
        *lock(&self.transfer_handler) = Some(Arc::new(handler));
    }

    /// Remove the transfer handler
    pub fn clear_transfer_handler(&self) {
        *lock(&self.transfer_handler) = None;
    }

    /// Replace the pending input with the sample sets of a new cycle
    ///
    /// Unread input from an earlier cycle is discarded. If a transfer handler
    /// is registered it is invoked synchronously once the new input is in
    /// place.
    pub fn set_input_samples(&self, samples: Vec<SampleSet>, max_count: usize) {
        *lock(&self.pending) = Some(PendingInput { samples, max_count });

        let handler = lock(&self.transfer_handler).clone();
        if let Some(handler) = handler {
            handler.transfer_data(self);
        }
    }

    /// Whether input is waiting to be read
    pub fn has_pending(&self) -> bool {
        lock(&self.pending).is_some()
    }

    /// Take the pending input, mix it and encode it in the stream format
    ///
    /// # Returns
    /// * `Ok(Some(bytes))` - the encoded mix of the latest cycle
    /// * `Ok(None)` - nothing pending for this listener
    /// * `Err(_)` - the stream format cannot be encoded
    pub fn read(&self) -> Result<Option<Vec<u8>>, FormatError> {
        let pending = lock(&self.pending).take();

        let Some(PendingInput { samples, max_count }) = pending else {
            self.with_core(|core| core.record_underrun());
            return Ok(None);
        };
        if samples.is_empty() || max_count == 0 {
            self.with_core(|core| core.record_underrun());
            return Ok(None);
        }

        let mixed = mix(&samples, &self.format, max_count)?;
        let data = encode(&mixed, &self.format)?;

        self.with_core(|core| core.record_delivery(mixed.len()));
        Ok(Some(data))
    }

    /// Start receiving cycles from the owning mixer
    ///
    /// Returns `false` if the stream was already started or its mixer is gone.
    pub fn start(self: &Arc<Self>) -> bool {
        match self.core.upgrade() {
            Some(core) => core.add_output_stream(self),
            None => {
                tracing::warn!(stream = %self.id, "Cannot start stream, mixer dropped");
                false
            }
        }
    }

    /// Stop receiving cycles
    ///
    /// Returns `false` if the stream was not started.
    pub fn stop(&self) -> bool {
        match self.core.upgrade() {
            Some(core) => core.remove_output_stream(self.id),
            None => {
                self.mark_started(false);
                false
            }
        }
    }

    fn with_core(&self, f: impl FnOnce(&MixerCore)) {
        if let Some(core) = self.core.upgrade() {
            f(&core);
        }
    }
}

impl fmt::Debug for ListenerStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerStream")
            .field("id", &self.id)
            .field("format", &self.format)
            .field("started", &self.is_started())
            .finish()
    }
}
