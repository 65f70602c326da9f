//! Audio processing module
//!
//! This module contains the conference mixing pipeline:
//! - PCM format descriptors and byte conversion ([`format`])
//! - The additive soft mixing algorithm ([`mixing`])
//! - Input sources and ring-buffered capture ([`source`])
//! - Personalised per-listener output streams ([`stream`])
//! - The mixer core owning sources and listeners ([`mixer`])
//! - Integer test tone generation ([`signal`])

pub mod format;
pub mod mixer;
pub mod mixing;
pub mod signal;
pub mod source;
pub mod stream;

use std::sync::{Mutex, MutexGuard};

/// Lock a mutex, taking over the data of a poisoned one
///
/// Mixer state stays consistent across a panicking holder: every critical
/// section either swaps a whole value or performs a single ring operation.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
