//! Configuration side of the conduit dispatch engine: mapping-file
//! reading, directory loading with atomic reload, and diagnostics dumps.
//!
//! The split mirrors the runtime contract: `conduit-engine` owns the pure
//! match path, this crate owns everything that is allowed to touch the
//! filesystem and to fail.

pub mod dump;
pub mod loader;
pub mod mappings;
