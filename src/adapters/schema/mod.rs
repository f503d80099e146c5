//! Schema sources.
//!
//! Built-in schemas cover all roles; a schema directory overrides them role
//! by role.

mod builtin;
mod file_loader;

pub use builtin::builtin_schemas;
pub use file_loader::FileSchemaLoader;
