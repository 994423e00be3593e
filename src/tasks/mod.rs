//! Background Tasks Module
//!
//! # Tasks
//! - TTL Cleanup: sweeps expired cache entries at the configured interval

mod cleanup;

pub use cleanup::spawn_cleanup_task;
