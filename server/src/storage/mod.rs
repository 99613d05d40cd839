//! Storage module
//!
//! Provides object storage for uploaded documents.

pub mod object_store;

pub use object_store::ObjectStore;
