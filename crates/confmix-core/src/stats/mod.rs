//! Statistics module
//!
//! Bounded history and running counters of mixer activity.

pub mod store;
