//! Storage implementations for list resources

pub mod in_memory;

pub use in_memory::InMemoryStore;
