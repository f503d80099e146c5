//! Storage Adapters
//!
//! Implementations of the SessionRepository port.
//!
//! ## Available Adapters
//!
//! - **FileSessionRepository** - One JSON file per session on disk
//! - **InMemorySessionRepository** - Sessions in memory (tests, ephemeral runs)
//!
//! ## Usage
//!
//! ```ignore
//! use adapters::storage::{FileSessionRepository, InMemorySessionRepository};
//!
//! let repository = FileSessionRepository::new("./data/sessions");
//! let repository = InMemorySessionRepository::new();
//! ```

mod file_session_repository;
mod in_memory_session_repository;

pub use file_session_repository::{FileSessionRepository, FORMAT_VERSION};
pub use in_memory_session_repository::InMemorySessionRepository;
