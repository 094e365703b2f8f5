//! Core of the item-translation side of the proxy: decides which
//! target-protocol item definition to present for an origin-protocol item
//! stack, based on the stack's typed data components.
//!
//! The engine is deliberately free of I/O and protocol codecs. Configuration
//! loaders feed it [`definition::ItemDefinition`]s, the item-translation layer
//! feeds it [`predicate::ItemContext`]s, and it answers with the winning
//! definition (or none) in a deterministic total order.

pub mod definition;
pub mod ident;
pub mod predicate;
pub mod registry;
