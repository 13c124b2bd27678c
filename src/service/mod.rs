//! Service Layer
//!
//! Async access to one engine from many tasks.

pub mod shared;

pub use shared::SharedEngine;
