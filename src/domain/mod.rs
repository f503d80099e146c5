//! Domain layer containing the interview logic and its types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (ids, timestamps, errors, state machine)
//! - `interview` - Roles, schemas, progress, classification policy and the engine
//!
//! Nothing in here performs I/O. External calls go through the traits in
//! [`crate::ports`].

pub mod foundation;
pub mod interview;
