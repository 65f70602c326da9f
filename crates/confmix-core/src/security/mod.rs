//! ZRTP security-event handling
//!
//! This module contains:
//! - Engine sub-codes and events (`codes`)
//! - Master and derived session bookkeeping (`session`)
//! - User-facing message texts (`messages`)
//! - The engine callback driving call security state (`callback`)

pub mod callback;
pub mod codes;
pub mod messages;
pub mod session;
