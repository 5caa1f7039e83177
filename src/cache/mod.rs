//! Proximity-keyed result cache.

pub mod error;
pub mod proximity_cache;
pub mod store;
