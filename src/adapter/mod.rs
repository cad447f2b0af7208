//! Adapter Module
//!
//! Maps higher-level write intents onto conditional transactions against a
//! [`KeyValueStorage`](crate::store::KeyValueStorage) backend. The adapter
//! never implements concurrency control itself; races are decided entirely by
//! the store's compare-and-apply conditions.

pub mod config_storage;

pub use config_storage::{prefix_range_end, ConfigData, ConfigurationStorage};
