//! Fact memory implementations for cognitor.

mod document;
pub mod in_memory;
pub mod json_file;

pub use in_memory::InMemoryFacts;
pub use json_file::JsonFileMemory;
